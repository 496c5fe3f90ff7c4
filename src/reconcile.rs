//! Merging publication batches into one de-duplicated list, and the citation
//! metrics derived from it.
//!
//! Records are keyed by [`normalize_title`]. Every fold walks a list in order
//! and treats the earlier occurrence of a key as the "prior" side, so
//! duplicates inside a single batch are resolved with the same rules as
//! duplicates across batches.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::record::{MetricsSummary, Publication};

/// Which side wins when both records carry a descriptive field.
///
/// Citation counts ignore the policy and always take the maximum.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MergePolicy {
    /// Keep what is already stored; only fill gaps from the new batch.
    #[default]
    PriorWins,
    /// Overwrite stored values with any non-empty value from the new batch.
    IncomingWins,
}

/// Lowercase, collapse whitespace runs, trim. Only ever used as a lookup key.
pub fn normalize_title(title: &str) -> String {
    title
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Merge `incoming` into `prior`.
///
/// Prior entries that the batch does not mention are kept as they are; new
/// titles are appended. The result is validated and sorted newest first.
pub fn merge(
    prior: &[Publication],
    incoming: &[Publication],
    policy: MergePolicy,
) -> Vec<Publication> {
    let mut out = Vec::with_capacity(prior.len() + incoming.len());
    let mut index = HashMap::new();
    fold(&mut out, &mut index, prior, policy);
    fold(&mut out, &mut index, incoming, policy);
    finish(out)
}

/// Collapse duplicate titles, drop invalid records and sort.
pub fn validate_and_sort(records: &[Publication]) -> Vec<Publication> {
    merge(records, &[], MergePolicy::default())
}

/// Remove every record whose normalized title equals that of `title`.
/// Returns how many were removed.
pub fn remove_title(records: &mut Vec<Publication>, title: &str) -> usize {
    let key = normalize_title(title);
    if key.is_empty() {
        return 0;
    }
    let before = records.len();
    records.retain(|p| normalize_title(&p.title) != key);
    before - records.len()
}

/// Apply `change` to every record whose normalized title equals that of
/// `title`. Returns how many were changed.
pub fn update_title(
    records: &mut [Publication],
    title: &str,
    mut change: impl FnMut(&mut Publication),
) -> usize {
    let key = normalize_title(title);
    if key.is_empty() {
        return 0;
    }
    let mut changed = 0;
    for p in records.iter_mut().filter(|p| normalize_title(&p.title) == key) {
        change(p);
        changed += 1;
    }
    changed
}

pub fn compute_metrics(records: &[Publication]) -> MetricsSummary {
    let mut counts: Vec<u32> = records.iter().map(|p| p.citations).collect();
    counts.sort_unstable_by(|a, b| b.cmp(a));

    let h_index = counts
        .iter()
        .enumerate()
        .take_while(|&(i, &c)| c as usize > i)
        .count();

    MetricsSummary {
        total_citations: counts.iter().map(|&c| u64::from(c)).sum(),
        h_index: h_index as u32,
        i10_index: counts.iter().filter(|&&c| c >= 10).count() as u32,
    }
}

fn fold(
    out: &mut Vec<Publication>,
    index: &mut HashMap<String, usize>,
    records: &[Publication],
    policy: MergePolicy,
) {
    for record in records {
        let key = normalize_title(&record.title);
        if key.is_empty() {
            debug!("skipping record without a title");
            continue;
        }
        match index.get(&key) {
            Some(&i) => absorb(&mut out[i], record.clone(), policy),
            None => {
                index.insert(key, out.len());
                out.push(record.clone());
            }
        }
    }
}

fn absorb(cur: &mut Publication, new: Publication, policy: MergePolicy) {
    let new_year_ok = new.has_valid_year();
    cur.citations = cur.citations.max(new.citations);
    match policy {
        MergePolicy::PriorWins => {
            fill(&mut cur.authors, new.authors);
            fill(&mut cur.journal, new.journal);
            if !cur.has_valid_year() && new_year_ok {
                cur.year = new.year;
            }
            fill_link(&mut cur.links.paper, new.links.paper);
            fill_link(&mut cur.links.code, new.links.code);
        }
        MergePolicy::IncomingWins => {
            prefer(&mut cur.title, new.title);
            prefer(&mut cur.authors, new.authors);
            prefer(&mut cur.journal, new.journal);
            if new_year_ok {
                cur.year = new.year;
            }
            prefer_link(&mut cur.links.paper, new.links.paper);
            prefer_link(&mut cur.links.code, new.links.code);
        }
    }
}

fn fill(cur: &mut String, new: String) {
    if cur.trim().is_empty() && !new.trim().is_empty() {
        *cur = new;
    }
}

fn prefer(cur: &mut String, new: String) {
    if !new.trim().is_empty() {
        *cur = new;
    }
}

fn is_blank(link: &Option<String>) -> bool {
    link.as_deref().is_none_or(|s| s.trim().is_empty())
}

fn fill_link(cur: &mut Option<String>, new: Option<String>) {
    if is_blank(cur) && !is_blank(&new) {
        *cur = new;
    }
}

fn prefer_link(cur: &mut Option<String>, new: Option<String>) {
    if !is_blank(&new) {
        *cur = new;
    }
}

fn finish(records: Vec<Publication>) -> Vec<Publication> {
    let mut out: Vec<Publication> = records
        .into_iter()
        .filter_map(|mut p| {
            p.title = p.title.trim().to_string();
            p.year = p.year.trim().to_string();
            if p.title.is_empty() || !p.has_valid_year() {
                debug!(title = %p.title, year = %p.year, "dropping invalid record");
                return None;
            }
            p.authors = p.authors.trim().to_string();
            p.journal = p.journal.trim().to_string();
            for link in [&mut p.links.paper, &mut p.links.code] {
                if is_blank(link) {
                    *link = None;
                }
            }
            Some(p)
        })
        .collect();
    // Four-digit strings order the same way as the numbers they spell.
    out.sort_by(|a, b| b.year.cmp(&a.year));
    out
}
