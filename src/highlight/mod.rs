use regex::{Regex, RegexBuilder};
use tracing::warn;

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// The literal, case-insensitive pattern for `query`, or `None` when the
/// query is empty. Filtering and highlighting both match with it, so they
/// agree on what counts as a match.
pub fn query_pattern(query: &str) -> Option<Regex> {
    if query.is_empty() {
        return None;
    }
    match RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            warn!(error = %e, "query pattern rejected, matching without it");
            None
        }
    }
}

/// Wraps literal, case-insensitive occurrences of the query in `<mark>`.
///
/// Build one per render cycle and reuse it for every cell.
#[derive(Clone, Debug, Default)]
pub struct Highlighter {
    pattern: Option<Regex>,
}

impl Highlighter {
    pub fn new(query: &str) -> Self {
        Self {
            pattern: query_pattern(query),
        }
    }

    pub fn is_active(&self) -> bool {
        self.pattern.is_some()
    }

    /// Returns `text` as HTML. Without an active query this is only the
    /// escaped text.
    pub fn highlight(&self, text: &str) -> String {
        let Some(re) = self.pattern.as_ref() else {
            return escape_html(text);
        };
        let mut out = String::with_capacity(text.len() + 16);
        let mut last = 0;
        for m in re.find_iter(text) {
            if m.start() == m.end() {
                continue;
            }
            out.push_str(&escape_html(&text[last..m.start()]));
            out.push_str("<mark>");
            out.push_str(&escape_html(m.as_str()));
            out.push_str("</mark>");
            last = m.end();
        }
        out.push_str(&escape_html(&text[last..]));
        out
    }
}
