use crate::record::Publication;

pub mod bibtex;
pub mod scholar;
pub mod snapshot;
pub mod text;

/// Something that turns the contents of a saved file into publication records.
///
/// Implementations only extract; de-duplication and validation happen in
/// [`crate::reconcile`].
pub trait PublicationSource: Sync {
    /// Name accepted as a `kind:` prefix on the command line.
    fn name(&self) -> &'static str;

    /// Cheap sniff used when the user did not force a kind.
    fn recognises(&self, text: &str) -> bool;

    fn parse(&self, text: &str) -> anyhow::Result<Vec<Publication>>;
}

/// Collapse whitespace runs into single spaces and trim.
pub(crate) fn normalize_ws(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
