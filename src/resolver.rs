use crate::source::{
    PublicationSource, bibtex::Bibtex, scholar::ScholarHtml, snapshot::SnapshotJson,
    text::PlainText,
};

/// Sources to try, in order.
///
/// NOTE: Ordering is important here, as it signifies priority. If two sources recognise the same
/// input, the first one in this list wins. Plain text accepts anything, so it must stay last.
static SOURCES: &[&dyn PublicationSource] = &[&ScholarHtml, &SnapshotJson, &Bibtex, &PlainText];

/// Extra spellings accepted for `kind:` prefixes.
static ALIASES: &[(&str, &str)] = &[("bib", "bibtex"), ("txt", "text"), ("htm", "html")];

/// Guess which source understands `text`.
pub fn detect(text: &str) -> &'static dyn PublicationSource {
    SOURCES
        .iter()
        .copied()
        .find(|s| s.recognises(text))
        .unwrap_or(&PlainText)
}

/// Look a source up by the name a user typed.
pub fn by_name(name: &str) -> Option<&'static dyn PublicationSource> {
    let name = name.to_ascii_lowercase();
    let canonical = ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, c)| *c)
        .unwrap_or(name.as_str());
    SOURCES.iter().copied().find(|s| s.name() == canonical)
}
