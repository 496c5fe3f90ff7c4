use anyhow::anyhow;
use biblatex::{Bibliography, ChunksExt, Entry};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{
    record::{Links, Publication},
    source::{PublicationSource, normalize_ws},
};

/// A `.bib` file, BibTeX or BibLaTeX flavoured.
pub struct Bibtex;

static ENTRY_START_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^\s*@[A-Za-z]+\s*\{").unwrap());
static AND_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+and\s+").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());

impl PublicationSource for Bibtex {
    fn name(&self) -> &'static str {
        "bibtex"
    }

    fn recognises(&self, text: &str) -> bool {
        ENTRY_START_RE.is_match(text)
    }

    fn parse(&self, text: &str) -> anyhow::Result<Vec<Publication>> {
        let bib =
            Bibliography::parse(text).map_err(|e| anyhow!("failed to parse BibTeX: {e}"))?;
        Ok(bib.iter().filter_map(to_publication).collect())
    }
}

fn field(entry: &Entry, key: &str) -> Option<String> {
    entry
        .get(key)
        .map(|chunks| normalize_ws(&chunks.format_verbatim()))
        .filter(|s| !s.is_empty())
}

/// Authors as "Given Family, Given Family", the way Scholar lists them.
fn authors(entry: &Entry) -> String {
    match entry.author() {
        Ok(people) => people
            .iter()
            .map(|p| {
                [p.given_name.as_str(), p.prefix.as_str(), p.name.as_str(), p.suffix.as_str()]
                    .iter()
                    .filter(|part| !part.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|name| !name.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        // Unparseable name lists are kept verbatim.
        Err(_) => field(entry, "author")
            .map(|a| AND_RE.replace_all(&a, ", ").into_owned())
            .unwrap_or_default(),
    }
}

fn to_publication(entry: &Entry) -> Option<Publication> {
    let title = field(entry, "title")?;
    let year = field(entry, "year")
        .or_else(|| field(entry, "date"))
        .and_then(|y| YEAR_RE.find(&y).map(|m| m.as_str().to_string()))?;

    let authors = authors(entry);
    let journal = field(entry, "journal")
        .or_else(|| field(entry, "journaltitle"))
        .or_else(|| field(entry, "booktitle"))
        .unwrap_or_default();
    let paper = field(entry, "url")
        .or_else(|| field(entry, "doi").map(|doi| format!("https://doi.org/{doi}")));

    Some(Publication {
        year,
        title,
        authors,
        journal,
        citations: 0,
        links: Links { paper, code: None },
    })
}
