//! Saved Google Scholar pages: the publication table ("list works" view, or
//! just the rows of it) and the citation-statistics box of a profile page.
//!
//! Scholar's markup is stable enough that matching on its class names with a
//! handful of regexes is all that is needed.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

use crate::{
    record::{Links, MetricsUpdate, Publication},
    source::{PublicationSource, normalize_ws},
};

pub struct ScholarHtml;

impl PublicationSource for ScholarHtml {
    fn name(&self) -> &'static str {
        "html"
    }

    fn recognises(&self, text: &str) -> bool {
        text.contains("gsc_a_tr") || text.contains("gsc_a_at")
    }

    fn parse(&self, text: &str) -> anyhow::Result<Vec<Publication>> {
        Ok(ROW_RE
            .captures_iter(text)
            .filter_map(|c| c.get(1))
            .filter_map(|m| parse_row(m.as_str()))
            .collect())
    }
}

/// Read total citations, h-index and i10-index off a saved profile page.
pub fn parse_homepage_metrics(html: &str) -> MetricsUpdate {
    let cells: Vec<Option<u64>> = STAT_CELL_RE
        .captures_iter(html)
        .filter_map(|c| c.get(1))
        .map(|m| first_number(&text_of(m.as_str())))
        .collect();

    // The full box has "All" and "Since <year>" columns; only "All" is wanted.
    let picks: &[usize] = if cells.len() >= 6 { &[0, 2, 4] } else { &[0, 1, 2] };
    let pick = |i: usize| picks.get(i).and_then(|&j| cells.get(j).copied().flatten());

    let mut found = MetricsUpdate {
        total_citations: pick(0),
        h_index: pick(1).and_then(|v| u32::try_from(v).ok()),
        i10_index: pick(2).and_then(|v| u32::try_from(v).ok()),
    };

    if found.is_empty() {
        let text = text_of(html);
        found = MetricsUpdate {
            total_citations: grab(&CITATIONS_TEXT_RE, &text),
            h_index: grab(&H_INDEX_TEXT_RE, &text).and_then(|v| u32::try_from(v).ok()),
            i10_index: grab(&I10_TEXT_RE, &text).and_then(|v| u32::try_from(v).ok()),
        };
    }
    found
}

// ----------------------------
// Row extraction
// ----------------------------

static SCHOLAR_BASE: Lazy<Url> = Lazy::new(|| Url::parse("https://scholar.google.com/").unwrap());

static ROW_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<tr\b[^>]*\bclass\s*=\s*["'][^"']*\bgsc_a_tr\b[^"']*["'][^>]*>(.*?)</tr>"#)
        .unwrap()
});
static TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b([^>]*\bclass\s*=\s*["'][^"']*\bgsc_a_at\b[^"']*["'][^>]*)>(.*?)</a>"#)
        .unwrap()
});
static GRAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<div\b[^>]*\bclass\s*=\s*["'][^"']*\bgs_gray\b[^"']*["'][^>]*>(.*?)</div>"#)
        .unwrap()
});
static OPH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<span\b[^>]*\bclass\s*=\s*["'][^"']*\bgs_oph\b[^"']*["'][^>]*>.*?</span>"#)
        .unwrap()
});
static YEAR_CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<span\b[^>]*\bclass\s*=\s*["'][^"']*\bgsc_a_h\b[^"']*["'][^>]*>(.*?)</span>"#)
        .unwrap()
});
static CITES_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*\bclass\s*=\s*["'][^"']*\bgsc_a_ac\b[^"']*["'][^>]*>(.*?)</a>"#)
        .unwrap()
});
static STAT_CELL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)<td\b[^>]*\bclass\s*=\s*["'][^"']*\bgsc_rsb_std\b[^"']*["'][^>]*>(.*?)</td>"#)
        .unwrap()
});
static ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    // Attribute pairs: key="value" or key='value' (no backreferences in Rust regex)
    Regex::new(r#"(?i)([a-zA-Z_:\-]+)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").unwrap());
static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}").unwrap());
static NUMBER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());
static CITATIONS_TEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Citations\s*(\d+)").unwrap());
static H_INDEX_TEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)h-index\s*(\d+)").unwrap());
static I10_TEXT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)i10-index\s*(\d+)").unwrap());

fn parse_row(row: &str) -> Option<Publication> {
    let title_caps = TITLE_RE.captures(row)?;
    let title = text_of(title_caps.get(2)?.as_str());
    let paper = title_caps
        .get(1)
        .and_then(|attrs| attr(attrs.as_str(), "href"))
        .and_then(|href| SCHOLAR_BASE.join(&unescape(&href)).ok())
        .map(String::from);

    let mut gray = GRAY_RE.captures_iter(row).filter_map(|c| c.get(1));
    let authors = gray.next().map(|m| text_of(m.as_str())).unwrap_or_default();
    let journal = gray
        .next()
        .map(|m| text_of(&OPH_RE.replace_all(m.as_str(), "")))
        .unwrap_or_default();

    let year = YEAR_CELL_RE
        .captures(row)
        .and_then(|c| c.get(1))
        .and_then(|m| YEAR_RE.find(&text_of(m.as_str())).map(|y| y.as_str().to_string()))?;

    let citations = CITES_RE
        .captures(row)
        .and_then(|c| c.get(1))
        .and_then(|m| first_number(&text_of(m.as_str())))
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0);

    if title.is_empty() {
        return None;
    }
    Some(Publication {
        year,
        title,
        authors,
        journal,
        citations,
        links: Links { paper, code: None },
    })
}

fn attr(tag_attrs: &str, name: &str) -> Option<String> {
    ATTR_RE.captures_iter(tag_attrs).find_map(|cap| {
        if cap[1].eq_ignore_ascii_case(name) {
            cap.get(2).or_else(|| cap.get(3)).map(|m| m.as_str().to_string())
        } else {
            None
        }
    })
}

/// Visible text of an HTML fragment.
fn text_of(fragment: &str) -> String {
    normalize_ws(&unescape(&TAG_RE.replace_all(fragment, " ")))
}

// quick-xml only knows the XML entities, so map the one HTML entity Scholar
// actually emits before handing it over.
fn unescape(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let s = s.replace("&nbsp;", " ");
    match quick_xml::escape::unescape(&s) {
        Ok(u) => Cow::Owned(u.into_owned()),
        Err(_) => Cow::Owned(s),
    }
}

fn grab(re: &Regex, text: &str) -> Option<u64> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn first_number(s: &str) -> Option<u64> {
    NUMBER_RE.find(s).and_then(|m| m.as_str().parse().ok())
}
