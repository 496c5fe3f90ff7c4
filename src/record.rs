use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One entry of the publication list, in the exact shape the website reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub year: String,
    pub title: String,
    pub authors: String,
    pub journal: String,
    pub citations: u32,
    pub links: Links,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    pub paper: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSummary {
    pub total_citations: u64,
    pub h_index: u32,
    pub i10_index: u32,
}

/// Metrics to overwrite, each optional: read off a profile page (where
/// Scholar may hide part of the box) or typed in by hand.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsUpdate {
    pub total_citations: Option<u64>,
    pub h_index: Option<u32>,
    pub i10_index: Option<u32>,
}

impl MetricsUpdate {
    pub fn is_empty(&self) -> bool {
        self.total_citations.is_none() && self.h_index.is_none() && self.i10_index.is_none()
    }

    /// Overwrite the values of `metrics` that are set here.
    pub fn apply(&self, metrics: &mut MetricsSummary) {
        if let Some(v) = self.total_citations {
            metrics.total_citations = v;
        }
        if let Some(v) = self.h_index {
            metrics.h_index = v;
        }
        if let Some(v) = self.i10_index {
            metrics.i10_index = v;
        }
    }
}

/// Why a loosely-typed JSON value could not become a [`Publication`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordError {
    #[error("expected an object, found {0}")]
    NotAnObject(&'static str),

    #[error("citation count {0} is not a non-negative integer")]
    BadCitations(String),

    #[error("field `{field}` has unexpected type {found}")]
    BadField {
        field: &'static str,
        found: &'static str,
    },
}

impl Publication {
    /// Whether `year` is exactly four ASCII digits.
    pub fn has_valid_year(&self) -> bool {
        is_valid_year(&self.year)
    }

    /// Build a record from one element of a `publications` array.
    ///
    /// Missing fields fall back to their defaults. Only values that are
    /// present but cannot be coerced are reported.
    pub fn from_value(value: &Value) -> Result<Self, RecordError> {
        let obj = value
            .as_object()
            .ok_or_else(|| RecordError::NotAnObject(type_name(value)))?;

        let links = match obj.get("links") {
            None | Some(Value::Null) => Links::default(),
            Some(Value::Object(l)) => Links {
                paper: opt_string(l.get("paper"), "links.paper")?,
                code: opt_string(l.get("code"), "links.code")?,
            },
            Some(other) => {
                return Err(RecordError::BadField {
                    field: "links",
                    found: type_name(other),
                });
            }
        };

        Ok(Publication {
            year: year_string(obj.get("year"))?,
            title: string(obj.get("title"), "title")?,
            authors: string(obj.get("authors"), "authors")?,
            journal: string(obj.get("journal"), "journal")?,
            citations: citations(obj.get("citations"))?,
            links,
        })
    }
}

pub fn is_valid_year(year: &str) -> bool {
    year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit())
}

fn type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn string(v: Option<&Value>, field: &'static str) -> Result<String, RecordError> {
    Ok(opt_string(v, field)?.unwrap_or_default())
}

fn opt_string(v: Option<&Value>, field: &'static str) -> Result<Option<String>, RecordError> {
    match v {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(RecordError::BadField {
            field,
            found: type_name(other),
        }),
    }
}

// Exports sometimes carry the year as a bare number.
fn year_string(v: Option<&Value>) -> Result<String, RecordError> {
    match v {
        Some(Value::Number(n)) => Ok(n.to_string()),
        other => string(other, "year"),
    }
}

fn citations(v: Option<&Value>) -> Result<u32, RecordError> {
    match v {
        None | Some(Value::Null) => Ok(0),
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|c| u32::try_from(c).ok())
            .ok_or_else(|| RecordError::BadCitations(n.to_string())),
        Some(Value::String(s)) => {
            let t = s.trim();
            if t.is_empty() {
                return Ok(0);
            }
            t.parse::<u32>()
                .map_err(|_| RecordError::BadCitations(format!("{s:?}")))
        }
        Some(other) => Err(RecordError::BadField {
            field: "citations",
            found: type_name(other),
        }),
    }
}
