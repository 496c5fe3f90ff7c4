use std::{path::PathBuf, str::FromStr};

use clap::{ArgAction, Parser, Subcommand};

use crate::{reconcile::MergePolicy, resolver};

#[derive(Parser, Debug)]
#[command(version, about = "Keep a website's publications.json in sync with your publication list", long_about = None)]
pub struct Cli {
    /// Configuration file [default: ./pubs.toml when present]
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Snapshot to read and rewrite [default: data/publications.json]
    #[arg(short, long, global = true, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// More log output (repeat for more)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Import publications from saved files and merge them into the snapshot
    Import {
        /// Files to import, optionally prefixed with a format (html:, bibtex:, text:, json:)
        #[arg(value_name = "SRC", required = true)]
        from: Vec<Source>,

        /// Start from an empty list instead of the stored one
        #[arg(long)]
        replace: bool,

        /// Keep the stored metrics instead of recomputing them
        #[arg(long)]
        no_metrics: bool,

        /// Saved Scholar profile page to take metrics from
        #[arg(long, value_name = "FILE")]
        homepage: Option<PathBuf>,

        /// Which side wins when both carry a value
        #[arg(long, value_enum)]
        policy: Option<MergePolicy>,
    },
    /// Show citation metrics for the stored list, or set them by hand
    Metrics {
        /// Saved Scholar profile page whose figures take precedence
        #[arg(long, value_name = "FILE", conflicts_with_all = ["total", "h_index", "i10"])]
        homepage: Option<PathBuf>,

        /// Set total citations; figures not given keep their stored value
        #[arg(long, value_name = "N")]
        total: Option<u64>,

        #[arg(long, value_name = "N")]
        h_index: Option<u32>,

        #[arg(long, value_name = "N")]
        i10: Option<u32>,

        /// Store the metrics in the snapshot
        #[arg(long)]
        write: bool,
    },
    /// Drop invalid entries and duplicates, and re-sort the stored list
    Clean,
    /// Print the stored publications, newest first
    List,
    /// Add one publication by hand (merged like any other import)
    Add(AddArgs),
    /// Change fields of a stored publication in place
    Edit(EditArgs),
    /// Remove publications by title (case and spacing are ignored)
    Remove {
        #[arg(value_name = "TITLE")]
        title: String,
    },
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,

    /// Four-digit publication year
    #[arg(long)]
    pub year: String,

    #[arg(long, default_value = "")]
    pub authors: String,

    /// Journal, conference or other venue
    #[arg(long, default_value = "")]
    pub journal: String,

    #[arg(long, default_value_t = 0)]
    pub citations: u32,

    /// Link to the paper
    #[arg(long, value_name = "URL")]
    pub paper: Option<String>,

    /// Link to the code
    #[arg(long, value_name = "URL")]
    pub code: Option<String>,

    #[arg(long, value_enum)]
    pub policy: Option<MergePolicy>,
}

/// Unlike `add`, given values replace the stored ones outright, so citation
/// counts can go down and venues can be corrected.
#[derive(clap::Args, Debug, Default)]
pub struct EditArgs {
    /// Title of the publication to change (case and spacing are ignored)
    #[arg(value_name = "TITLE")]
    pub target: String,

    /// New title
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub year: Option<String>,

    #[arg(long)]
    pub authors: Option<String>,

    #[arg(long)]
    pub journal: Option<String>,

    #[arg(long)]
    pub citations: Option<u32>,

    /// Link to the paper (an empty value clears it)
    #[arg(long, value_name = "URL")]
    pub paper: Option<String>,

    /// Link to the code (an empty value clears it)
    #[arg(long, value_name = "URL")]
    pub code: Option<String>,
}

impl EditArgs {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.year.is_none()
            && self.authors.is_none()
            && self.journal.is_none()
            && self.citations.is_none()
            && self.paper.is_none()
            && self.code.is_none()
    }
}

/// A file to import from. The format is either forced with a `kind:` prefix
/// or, more usually, guessed from the contents once the file is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Source {
    pub kind: Option<&'static str>,
    pub path: PathBuf,
}

impl FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // NOTE: We don't check that the file exists here. A missing file is reported per source at
        // import time, so one bad argument does not abort the others.
        if let Some((prefix, rest)) = s.split_once(':')
            && !rest.is_empty()
            && let Some(source) = resolver::by_name(prefix)
        {
            return Ok(Source {
                kind: Some(source.name()),
                path: PathBuf::from(rest),
            });
        }
        if s.is_empty() {
            return Err("empty source".to_string());
        }
        Ok(Source {
            kind: None,
            path: PathBuf::from(s),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_str_reads_kind_prefix() {
        let src = Source::from_str("bib:refs/mine.bib").expect("parse");
        assert_eq!(src.kind, Some("bibtex"));
        assert_eq!(src.path, PathBuf::from("refs/mine.bib"));
    }

    #[test]
    fn from_str_keeps_unknown_prefix_in_path() {
        let src = Source::from_str("C:notes.txt").expect("parse");
        assert_eq!(src.kind, None);
        assert_eq!(src.path, PathBuf::from("C:notes.txt"));
    }

    #[test]
    fn from_str_falls_back_to_plain_path() {
        proptest::proptest!(|(s in "[A-Za-z0-9._/-]{1,32}")| {
            let src = Source::from_str(&s).expect("parse");
            proptest::prop_assert_eq!(src.kind, None);
            proptest::prop_assert_eq!(src.path, PathBuf::from(&s));
        })
    }

    #[test]
    fn parses_import_command() {
        let cli = Cli::try_parse_from([
            "pubs", "-o", "out.json", "import", "html:pubs.txt", "refs.bib", "--policy",
            "incoming-wins", "--no-metrics",
        ])
        .expect("parse");
        assert_eq!(cli.output, Some(PathBuf::from("out.json")));
        match cli.command {
            Command::Import {
                from,
                no_metrics,
                policy,
                replace,
                ..
            } => {
                assert_eq!(from.len(), 2);
                assert_eq!(from[0].kind, Some("html"));
                assert!(no_metrics);
                assert!(!replace);
                assert_eq!(policy, Some(MergePolicy::IncomingWins));
            }
            other => panic!("expected import, got {other:?}"),
        }
    }

    #[test]
    fn parses_manual_metrics_and_rejects_mixing_with_homepage() {
        let cli = Cli::try_parse_from(["pubs", "metrics", "--h-index", "9", "--write"])
            .expect("parse");
        match cli.command {
            Command::Metrics {
                total,
                h_index,
                i10,
                write,
                ..
            } => {
                assert_eq!((total, h_index, i10), (None, Some(9), None));
                assert!(write);
            }
            other => panic!("expected metrics, got {other:?}"),
        }
        assert!(
            Cli::try_parse_from(["pubs", "metrics", "--homepage", "p.html", "--total", "3"])
                .is_err()
        );
    }

    #[test]
    fn parses_edit_command() {
        let cli = Cli::try_parse_from(["pubs", "edit", "Old Title", "--citations", "2", "--code", ""])
            .expect("parse");
        match cli.command {
            Command::Edit(args) => {
                assert_eq!(args.target, "Old Title");
                assert_eq!(args.citations, Some(2));
                assert_eq!(args.code.as_deref(), Some(""));
                assert!(args.year.is_none());
                assert!(!args.is_empty());
            }
            other => panic!("expected edit, got {other:?}"),
        }
    }

    #[test]
    fn import_needs_a_source() {
        assert!(Cli::try_parse_from(["pubs", "import"]).is_err());
    }
}
