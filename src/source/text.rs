use once_cell::sync::Lazy;
use regex::Regex;
use tracing::warn;

use crate::{
    record::{Publication, is_valid_year},
    source::PublicationSource,
};

/// Text copied out of a Scholar profile: repeating blocks of
///
/// ```text
/// title
/// authors
/// venue
/// citations<TAB>year      (or just the year)
/// ```
pub struct PlainText;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());

impl PublicationSource for PlainText {
    fn name(&self) -> &'static str {
        "text"
    }

    fn recognises(&self, _text: &str) -> bool {
        true
    }

    fn parse(&self, text: &str) -> anyhow::Result<Vec<Publication>> {
        let mut lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect();

        // "Title / Cited by / Year" column headers from a copied table.
        if lines
            .first()
            .is_some_and(|l| l.to_lowercase().starts_with("title"))
        {
            lines.drain(..lines.len().min(3));
        }

        Ok(lines
            .chunks_exact(4)
            .filter_map(|block| {
                let (citations, year) = parse_tail(block[3])?;
                Some(Publication {
                    year,
                    title: block[0].to_string(),
                    authors: block[1].to_string(),
                    journal: block[2].to_string(),
                    citations,
                    ..Default::default()
                })
            })
            .collect())
    }
}

/// The last line of a block: `"12\t2020"`, `"2020"`, or anything with a year in it.
/// A citation count that is present but not a number drops the block.
fn parse_tail(tail: &str) -> Option<(u32, String)> {
    if let Some((cites, year)) = tail.split_once('\t') {
        let year = year.trim();
        if is_valid_year(year) {
            let cites = cites.trim();
            if cites.is_empty() {
                return Some((0, year.to_string()));
            }
            return match cites.parse() {
                Ok(n) => Some((n, year.to_string())),
                Err(_) => {
                    warn!(tail, "skipping publication: citation count {cites:?} is not a non-negative integer");
                    None
                }
            };
        }
    }
    YEAR_RE.find(tail).map(|m| (0, m.as_str().to_string()))
}
