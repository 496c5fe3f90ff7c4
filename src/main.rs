use clap::Parser;

use crate::{
    cli::{Cli, Command},
    commands::ImportOptions,
    config::Config,
    record::MetricsUpdate,
};

mod cli;
mod commands;
mod config;
mod logging;
mod reconcile;
mod record;
mod resolver;
mod source;
mod store;

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    logging::init(args.verbose, args.quiet);

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(output) = args.output {
        config.output = output;
    }

    match args.command {
        Command::Import {
            from,
            replace,
            no_metrics,
            homepage,
            policy,
        } => {
            if let Some(policy) = policy {
                config.policy = policy;
            }
            if no_metrics {
                config.recompute_metrics = false;
            }
            commands::import(
                &config,
                ImportOptions {
                    sources: &from,
                    replace,
                    homepage: homepage.as_deref(),
                },
            )
        }
        Command::Metrics {
            homepage,
            total,
            h_index,
            i10,
            write,
        } => {
            let manual = MetricsUpdate {
                total_citations: total,
                h_index,
                i10_index: i10,
            };
            commands::metrics(&config, homepage.as_deref(), manual, write)
        }
        Command::Clean => commands::clean(&config),
        Command::List => commands::list(&config),
        Command::Add(add) => commands::add(&config, add),
        Command::Edit(edit) => commands::edit(&config, edit),
        Command::Remove { title } => commands::remove(&config, &title),
    }
}
