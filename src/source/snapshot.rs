use anyhow::Context;
use serde_json::Value;

use crate::{record::Publication, source::PublicationSource, store};

/// Another `publications.json`, e.g. one kept by hand or by an older run.
pub struct SnapshotJson;

impl PublicationSource for SnapshotJson {
    fn name(&self) -> &'static str {
        "json"
    }

    fn recognises(&self, text: &str) -> bool {
        text.trim_start().starts_with('{') && text.contains("\"publications\"")
    }

    fn parse(&self, text: &str) -> anyhow::Result<Vec<Publication>> {
        let value: Value = serde_json::from_str(text).context("invalid JSON")?;
        Ok(store::publications_from_value(value.get("publications")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_publications_array() {
        let text = r#"{
            "profile": {},
            "publications": [
                { "year": "2020", "title": "A", "citations": 2 },
                { "year": "2019", "title": "B", "citations": -1 }
            ]
        }"#;
        assert!(SnapshotJson.recognises(text));
        let pubs = SnapshotJson.parse(text).unwrap();
        assert_eq!(pubs.len(), 1);
        assert_eq!(pubs[0].title, "A");
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(SnapshotJson.parse("{ \"publications\": [").is_err());
    }
}
