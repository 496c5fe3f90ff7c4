//! Reading and writing the `publications.json` snapshot the website renders.

use std::{fs, io, path::Path};

use anyhow::Context;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::record::{MetricsSummary, Publication};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub scholar_id: String,
    pub scholar_url: String,
    pub last_updated: String,
}

/// The whole persisted document. Field order is what the site expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Snapshot {
    pub profile: Profile,
    pub publications: Vec<Publication>,
    pub metrics: MetricsSummary,
}

impl Profile {
    pub fn for_scholar(scholar_id: &str, today: NaiveDate) -> Self {
        Profile {
            scholar_id: scholar_id.to_string(),
            scholar_url: scholar_url(scholar_id),
            last_updated: format_date(today),
        }
    }
}

impl Snapshot {
    pub fn empty(profile: Profile) -> Self {
        Snapshot {
            profile,
            publications: Vec::new(),
            metrics: MetricsSummary::default(),
        }
    }

    /// Lenient read of a parsed document. Whatever cannot be understood is
    /// logged and replaced by its default rather than failing the load.
    pub fn from_value(value: &Value) -> Self {
        let profile = match value.get("profile") {
            None | Some(Value::Null) => Profile::default(),
            Some(p) => serde_json::from_value(p.clone()).unwrap_or_else(|e| {
                warn!("ignoring unreadable profile: {e}");
                Profile::default()
            }),
        };
        let metrics = match value.get("metrics") {
            None | Some(Value::Null) => MetricsSummary::default(),
            Some(m) => serde_json::from_value(m.clone()).unwrap_or_else(|e| {
                warn!("ignoring unreadable metrics: {e}");
                MetricsSummary::default()
            }),
        };
        Snapshot {
            profile,
            publications: publications_from_value(value.get("publications")),
            metrics,
        }
    }

    /// Fill in the scholar id when the stored profile has none.
    pub fn adopt_scholar(&mut self, scholar_id: &str) {
        if !scholar_id.is_empty() && self.profile.scholar_id.is_empty() {
            self.profile.scholar_id = scholar_id.to_string();
        }
        if self.profile.scholar_url.is_empty() && !self.profile.scholar_id.is_empty() {
            self.profile.scholar_url = scholar_url(&self.profile.scholar_id);
        }
    }

    pub fn touch(&mut self, today: NaiveDate) {
        self.profile.last_updated = format_date(today);
    }
}

/// Coerce a `publications` array, skipping (and reporting) broken entries.
pub fn publications_from_value(value: Option<&Value>) -> Vec<Publication> {
    let items = match value {
        None | Some(Value::Null) => return Vec::new(),
        Some(Value::Array(items)) => items,
        Some(_) => {
            warn!("`publications` is not an array; ignoring it");
            return Vec::new();
        }
    };
    items
        .iter()
        .enumerate()
        .filter_map(|(i, item)| match Publication::from_value(item) {
            Ok(p) => Some(p),
            Err(e) => {
                let title = item.get("title").and_then(Value::as_str).unwrap_or("?");
                warn!(index = i, title, "skipping publication: {e}");
                None
            }
        })
        .collect()
}

/// Load the snapshot at `path`. A missing file is not an error: it just
/// means there is no prior state yet.
pub fn load(path: &Path) -> anyhow::Result<Option<Snapshot>> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no snapshot yet");
            return Ok(None);
        }
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    let value: Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON; refusing to overwrite it", path.display()))?;
    Ok(Some(Snapshot::from_value(&value)))
}

pub fn save(path: &Path, snapshot: &Snapshot) -> anyhow::Result<()> {
    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }
    let mut body = serde_json::to_string_pretty(snapshot)?;
    body.push('\n');
    fs::write(path, body).with_context(|| format!("failed to write {}", path.display()))?;
    debug!(path = %path.display(), count = snapshot.publications.len(), "snapshot written");
    Ok(())
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn scholar_url(scholar_id: &str) -> String {
    let mut url = Url::parse("https://scholar.google.com/citations").unwrap();
    url.query_pairs_mut()
        .append_pair("hl", "en")
        .append_pair("user", scholar_id)
        .append_pair("view_op", "list_works")
        .append_pair("sortby", "pubdate");
    url.into()
}
