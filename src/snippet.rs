//! Share text for an article when the reader has not selected anything.
//!
//! The first `<p>` element found while walking the page's sections in order
//! is turned into plain text and offered for sharing.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use tracing::{debug, info};

// `.` in the paragraph body stops at any line terminator, not only `\n`
static PARAGRAPH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<p>([^\n\r\x{85}\x{2028}\x{2029}]+)</p>").expect("valid regex")
});
static TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static LINE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)<br\s*/?>").expect("valid regex"));
static ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("valid regex")
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub id: u32,
    pub content: String,
}

impl Section {
    pub fn new<S: Into<String>>(id: u32, content: S) -> Self {
        Self {
            id,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub sections: Vec<Section>,
}

impl Page {
    pub fn new<S: Into<String>>(title: S, sections: Vec<Section>) -> Self {
        Self {
            title: title.into(),
            sections,
        }
    }
}

/// Inner HTML of the first paragraph in section order.
pub fn first_paragraph_html(page: &Page) -> Option<&str> {
    page.sections.iter().find_map(|section| {
        PARAGRAPH
            .captures(&section.content)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    })
}

/// Plain text of the first paragraph, or an empty string if there is none.
pub fn first_paragraph_text(page: &Page) -> String {
    first_paragraph_html(page)
        .map(html_to_text)
        .unwrap_or_default()
}

/// Strip markup and decode character references.
pub fn html_to_text(html: &str) -> String {
    let with_breaks = LINE_BREAK.replace_all(html, "\n");
    let stripped = TAG.replace_all(&with_breaks, "");
    let decoded = ENTITY.replace_all(&stripped, |caps: &Captures| {
        decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string())
    });

    decoded
        .split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

fn decode_entity(name: &str) -> Option<String> {
    if let Some(num) = name.strip_prefix('#') {
        let code = match num.strip_prefix(&['x', 'X'][..]) {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => num.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }

    let c = match name {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => '\u{a0}',
        "ndash" => '\u{2013}',
        "mdash" => '\u{2014}',
        "hellip" => '\u{2026}',
        "copy" => '\u{a9}',
        "reg" => '\u{ae}',
        "deg" => '\u{b0}',
        "middot" => '\u{b7}',
        _ => return None,
    };
    Some(c.to_string())
}

/// Analytics sink for share actions.
pub trait ShareFunnel {
    fn log_share_tap(&self, selected_text: Option<&str>);
}

/// Records share taps as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingFunnel;

impl ShareFunnel for TracingFunnel {
    fn log_share_tap(&self, selected_text: Option<&str>) {
        info!(
            selection_len = selected_text.map(str::len).unwrap_or(0),
            has_selection = selected_text.is_some(),
            "share tap"
        );
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareSnippet {
    pub title: String,
    pub text: String,
    pub is_first_paragraph: bool,
}

/// Shares the first paragraph of the current page.
#[derive(Debug)]
pub struct NoTextSelectedShare<F = TracingFunnel> {
    funnel: F,
}

impl Default for NoTextSelectedShare<TracingFunnel> {
    fn default() -> Self {
        Self::new(TracingFunnel)
    }
}

impl<F: ShareFunnel> NoTextSelectedShare<F> {
    pub fn new(funnel: F) -> Self {
        Self { funnel }
    }

    pub fn funnel(&self) -> &F {
        &self.funnel
    }

    /// Build the snippet for `page`; `None` when no page is showing.
    pub fn share(&self, page: Option<&Page>) -> Option<ShareSnippet> {
        let page = page?;

        self.funnel.log_share_tap(None);

        let text = first_paragraph_text(page);
        debug!(title = %page.title, len = text.len(), "sharing first paragraph");

        Some(ShareSnippet {
            title: page.title.clone(),
            text,
            is_first_paragraph: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingFunnel {
        taps: Mutex<Vec<Option<String>>>,
    }

    impl ShareFunnel for RecordingFunnel {
        fn log_share_tap(&self, selected_text: Option<&str>) {
            self.taps.lock().push(selected_text.map(str::to_string));
        }
    }

    fn page() -> Page {
        Page::new(
            "Rust",
            vec![
                Section::new(0, "<div class=\"hatnote\">Not to be confused with rust.</div>"),
                Section::new(
                    1,
                    "<table></table>\n<p><b>Rust</b> is a <a href=\"/wiki/Language\">language</a> &amp; toolchain.</p>\n<p>Second.</p>",
                ),
                Section::new(2, "<p>Later section.</p>"),
            ],
        )
    }

    #[test]
    fn test_first_paragraph_skips_sections_without_one() {
        let page = page();
        assert_eq!(
            first_paragraph_html(&page),
            Some("<b>Rust</b> is a <a href=\"/wiki/Language\">language</a> &amp; toolchain.")
        );
        assert_eq!(first_paragraph_text(&page), "Rust is a language & toolchain.");
    }

    #[test]
    fn test_paragraph_match_is_greedy_within_a_line() {
        let page = Page::new("T", vec![Section::new(0, "<p>one</p><p>two</p>")]);
        assert_eq!(first_paragraph_html(&page), Some("one</p><p>two"));
        assert_eq!(first_paragraph_text(&page), "onetwo");
    }

    #[test]
    fn test_paragraph_stops_at_any_line_terminator() {
        for sep in ["\r", "\u{85}", "\u{2028}", "\u{2029}"] {
            let content = format!("<p>one</p>{}<p>two</p>", sep);
            let page = Page::new("T", vec![Section::new(0, content)]);
            assert_eq!(first_paragraph_html(&page), Some("one"));
        }

        let crlf = Page::new("T", vec![Section::new(0, "<p>first</p>\r\n<p>second</p>")]);
        assert_eq!(first_paragraph_text(&crlf), "first");
    }

    #[test]
    fn test_no_paragraph_gives_empty_text() {
        let page = Page::new("Empty", vec![Section::new(0, "<div>nothing</div>")]);
        assert_eq!(first_paragraph_html(&page), None);
        assert_eq!(first_paragraph_text(&page), "");

        let empty = Page::new("Blank", vec![]);
        assert_eq!(first_paragraph_text(&empty), "");
    }

    #[test]
    fn test_html_to_text_entities() {
        assert_eq!(html_to_text("a &lt;b&gt; &quot;c&quot;"), "a <b> \"c\"");
        assert_eq!(html_to_text("caf&#233; &#x263A;"), "caf\u{e9} \u{263a}");
        assert_eq!(html_to_text("1&ndash;2"), "1\u{2013}2");
        assert_eq!(html_to_text("&bogus; stays"), "&bogus; stays");
        assert_eq!(html_to_text("&#xD800;"), "&#xD800;");
    }

    #[test]
    fn test_html_to_text_whitespace_and_breaks() {
        assert_eq!(html_to_text("  a   <i>b</i>\t c "), "a b c");
        assert_eq!(html_to_text("line one<br/>line   two<BR>three"), "line one\nline two\nthree");
    }

    #[test]
    fn test_share_without_page() {
        let share = NoTextSelectedShare::new(RecordingFunnel::default());
        assert_eq!(share.share(None), None);
        assert!(share.funnel().taps.lock().is_empty());
    }

    #[test]
    fn test_share_logs_tap_and_builds_snippet() {
        let share = NoTextSelectedShare::new(RecordingFunnel::default());
        let page = page();

        let snippet = share.share(Some(&page)).unwrap();

        assert_eq!(snippet.title, "Rust");
        assert_eq!(snippet.text, "Rust is a language & toolchain.");
        assert!(snippet.is_first_paragraph);
        assert_eq!(*share.funnel().taps.lock(), vec![None]);
    }

    #[test]
    fn test_default_share_uses_tracing_funnel() {
        let share = NoTextSelectedShare::default();
        let page = Page::new("X", vec![Section::new(0, "<p>x</p>")]);
        assert_eq!(share.share(Some(&page)).unwrap().text, "x");
    }
}
