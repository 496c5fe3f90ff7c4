use std::{fs, path::Path};

use anyhow::{Context, bail};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{error, info, warn};

use crate::{
    cli::{AddArgs, EditArgs, Source},
    config::Config,
    reconcile,
    record::{Links, MetricsUpdate, Publication, is_valid_year},
    resolver,
    source::scholar,
    store::{self, Profile, Snapshot},
};

pub struct ImportOptions<'a> {
    pub sources: &'a [Source],
    pub replace: bool,
    pub homepage: Option<&'a Path>,
}

pub fn import(config: &Config, opts: ImportOptions<'_>) -> anyhow::Result<()> {
    let mut snapshot = open(config)?;
    let mut publications = if opts.replace {
        Vec::new()
    } else {
        snapshot.publications.clone()
    };

    let pb = ProgressBar::new(opts.sources.len() as u64);
    pb.set_style(ProgressStyle::with_template("{spinner} [{pos}/{len}] {wide_msg}")?);

    let (mut ok, mut failed) = (0usize, 0usize);
    for src in opts.sources {
        let shown = src.path.display().to_string();
        pb.set_message(shown.clone());
        match read_batch(src) {
            Ok((_, batch)) if batch.is_empty() => {
                pb.suspend(|| warn!(path = %shown, "no publications found"));
                failed += 1;
            }
            Ok((kind, batch)) => {
                pb.suspend(|| info!(path = %shown, kind, count = batch.len(), "imported"));
                publications = reconcile::merge(&publications, &batch, config.policy);
                ok += 1;
            }
            Err(e) => {
                pb.suspend(|| error!("{shown}: {e:#}"));
                failed += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();
    print_summary(ok, failed);

    if ok == 0 {
        warn!("nothing imported; {} left untouched", config.output.display());
        return Ok(());
    }

    snapshot.publications = publications;
    if config.recompute_metrics {
        snapshot.metrics = reconcile::compute_metrics(&snapshot.publications);
    }
    if let Some(path) = opts.homepage {
        homepage_metrics(path)?.apply(&mut snapshot.metrics);
    }
    write(config, &mut snapshot)
}

/// Print metrics. Hand-set figures start from the stored ones, so anything
/// not given is kept; otherwise they are recomputed from the list, with a
/// profile page taking precedence when given.
pub fn metrics(
    config: &Config,
    homepage: Option<&Path>,
    manual: MetricsUpdate,
    persist: bool,
) -> anyhow::Result<()> {
    let mut snapshot = open(config)?;
    let metrics = if manual.is_empty() {
        let mut metrics = reconcile::compute_metrics(&snapshot.publications);
        if let Some(path) = homepage {
            homepage_metrics(path)?.apply(&mut metrics);
        }
        metrics
    } else {
        let mut metrics = snapshot.metrics;
        manual.apply(&mut metrics);
        metrics
    };

    println!("Total citations: {}", metrics.total_citations);
    println!("h-index: {}", metrics.h_index);
    println!("i10-index: {}", metrics.i10_index);

    if persist {
        snapshot.metrics = metrics;
        write(config, &mut snapshot)?;
    }
    Ok(())
}

pub fn clean(config: &Config) -> anyhow::Result<()> {
    let Some(mut snapshot) = load(config)? else {
        eprintln!("No publications to clean.");
        return Ok(());
    };
    let before = snapshot.publications.len();
    snapshot.publications = reconcile::validate_and_sort(&snapshot.publications);
    let after = snapshot.publications.len();
    eprintln!(
        "Cleaned {after} publications, removed {} invalid or duplicate entries",
        before - after
    );
    write(config, &mut snapshot)
}

pub fn list(config: &Config) -> anyhow::Result<()> {
    let snapshot = open(config)?;
    for p in &snapshot.publications {
        println!("{:<4}  {:>5}  {}", p.year, p.citations, p.title);
    }
    Ok(())
}

pub fn add(config: &Config, args: AddArgs) -> anyhow::Result<()> {
    let record = Publication {
        year: args.year.trim().to_string(),
        title: args.title.trim().to_string(),
        authors: args.authors,
        journal: args.journal,
        citations: args.citations,
        links: Links {
            paper: args.paper,
            code: args.code,
        },
    };
    if record.title.is_empty() || !record.has_valid_year() {
        bail!("a publication needs a title and a four-digit year");
    }

    let mut snapshot = open(config)?;
    let policy = args.policy.unwrap_or(config.policy);
    snapshot.publications = reconcile::merge(&snapshot.publications, &[record], policy);
    refresh_metrics(config, &mut snapshot);
    write(config, &mut snapshot)
}

pub fn edit(config: &Config, args: EditArgs) -> anyhow::Result<()> {
    if args.is_empty() {
        bail!("nothing to change; pass at least one field");
    }
    if let Some(year) = &args.year
        && !is_valid_year(year.trim())
    {
        bail!("year must be four digits, got {year:?}");
    }
    if args.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        bail!("a publication needs a title");
    }

    let mut snapshot = open(config)?;
    let changed = reconcile::update_title(&mut snapshot.publications, &args.target, |p| {
        if let Some(title) = &args.title {
            p.title = title.clone();
        }
        if let Some(year) = &args.year {
            p.year = year.clone();
        }
        if let Some(authors) = &args.authors {
            p.authors = authors.clone();
        }
        if let Some(journal) = &args.journal {
            p.journal = journal.clone();
        }
        if let Some(citations) = args.citations {
            p.citations = citations;
        }
        if let Some(paper) = &args.paper {
            p.links.paper = Some(paper.clone());
        }
        if let Some(code) = &args.code {
            p.links.code = Some(code.clone());
        }
    });
    if changed == 0 {
        bail!("no publication titled {:?}", args.target);
    }
    info!(changed, "edited publications");
    // Re-sorts after a year change; blank links become null.
    snapshot.publications = reconcile::validate_and_sort(&snapshot.publications);
    refresh_metrics(config, &mut snapshot);
    write(config, &mut snapshot)
}

pub fn remove(config: &Config, title: &str) -> anyhow::Result<()> {
    let mut snapshot = open(config)?;
    let removed = reconcile::remove_title(&mut snapshot.publications, title);
    if removed == 0 {
        bail!("no publication titled {title:?}");
    }
    info!(removed, "removed publications");
    refresh_metrics(config, &mut snapshot);
    write(config, &mut snapshot)
}

/// The stored snapshot, or a fresh one for the configured scholar.
fn open(config: &Config) -> anyhow::Result<Snapshot> {
    Ok(load(config)?.unwrap_or_else(|| {
        Snapshot::empty(Profile::for_scholar(&config.scholar_id, store::today()))
    }))
}

fn load(config: &Config) -> anyhow::Result<Option<Snapshot>> {
    let mut snapshot = store::load(&config.output)?;
    if let Some(s) = snapshot.as_mut() {
        s.adopt_scholar(&config.scholar_id);
    }
    Ok(snapshot)
}

fn write(config: &Config, snapshot: &mut Snapshot) -> anyhow::Result<()> {
    snapshot.touch(store::today());
    store::save(&config.output, snapshot)?;
    info!(
        path = %config.output.display(),
        publications = snapshot.publications.len(),
        "saved"
    );
    Ok(())
}

fn refresh_metrics(config: &Config, snapshot: &mut Snapshot) {
    if config.recompute_metrics {
        snapshot.metrics = reconcile::compute_metrics(&snapshot.publications);
    }
}

fn read_batch(src: &Source) -> anyhow::Result<(&'static str, Vec<Publication>)> {
    let text = fs::read_to_string(&src.path)
        .with_context(|| format!("failed to read {}", src.path.display()))?;
    let source = match src.kind {
        Some(kind) => resolver::by_name(kind)
            .with_context(|| format!("unknown source kind: {kind}"))?,
        None => resolver::detect(&text),
    };
    let batch = source
        .parse(&text)
        .with_context(|| format!("failed to import {} as {}", src.path.display(), source.name()))?;
    Ok((source.name(), batch))
}

fn homepage_metrics(path: &Path) -> anyhow::Result<MetricsUpdate> {
    let html = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let found = scholar::parse_homepage_metrics(&html);
    if found.is_empty() {
        bail!("no metrics found in {}", path.display());
    }
    info!(?found, "metrics from profile page");
    Ok(found)
}

fn print_summary(ok: usize, failed: usize) {
    eprintln!("{} {}  {} {}", "✓".green(), ok, "✗".red(), failed);
}
