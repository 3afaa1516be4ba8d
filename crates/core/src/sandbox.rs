//! Theme sandbox code injection.
//!
//! Fixes are spliced into a copy of a theme file as delimited blocks:
//!
//! ```text
//! <!-- ghost-cro:begin sticky-cart -->
//! <style data-ghost-cro="sticky-cart">
//! ...
//! </style>
//! <!-- ghost-cro:end sticky-cart -->
//! ```
//!
//! Injecting an id that is already present replaces the block in place, so
//! repeated runs are idempotent. New blocks go before the first anchor that
//! matches, falling back to the end of the file.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{1,64}$").expect("Invalid regex"));

static MARKER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<!--\s*ghost-cro:inject\s*-->").expect("Invalid regex"));

static HEAD_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</head\s*>").expect("Invalid regex"));

static CONTENT_FOR_LAYOUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{-?\s*content_for_layout\s*-?\}\}").expect("Invalid regex")
});

static MAIN_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</main\s*>").expect("Invalid regex"));

static BODY_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</body\s*>").expect("Invalid regex"));

static HTML_CLOSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</html\s*>").expect("Invalid regex"));

const MARKER_PREFIX: &str = "<!-- ghost-cro:";

/// Errors from sandbox injection.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SandboxError {
    #[error("invalid injection id {0:?}: expected 1-64 of [A-Za-z0-9_-]")]
    InvalidId(String),

    #[error("injection content must not contain ghost-cro markers")]
    NestedMarker,

    #[error("block {0} has a begin marker but no end marker")]
    UnterminatedBlock(String),
}

/// Kind of code being injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionKind {
    Liquid,
    Css,
    Js,
}

/// A fix to splice into a theme file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injection {
    pub id: String,
    pub kind: InjectionKind,
    pub content: String,
}

/// Where an injection landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InjectionOutcome {
    /// An existing block with the same id was replaced.
    Replaced,
    /// Before an explicit `<!-- ghost-cro:inject -->` marker.
    Marker,
    HeadClose,
    ContentForLayout,
    MainClose,
    BodyClose,
    HtmlClose,
    /// No anchor matched; appended at the end.
    Appended,
}

impl fmt::Display for InjectionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Replaced => "replaced existing block",
            Self::Marker => "before inject marker",
            Self::HeadClose => "before </head>",
            Self::ContentForLayout => "before {{ content_for_layout }}",
            Self::MainClose => "before </main>",
            Self::BodyClose => "before </body>",
            Self::HtmlClose => "before </html>",
            Self::Appended => "appended at end",
        };
        f.write_str(s)
    }
}

/// Updated source plus where the block went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Injected {
    pub source: String,
    pub outcome: InjectionOutcome,
}

fn validate_id(id: &str) -> Result<(), SandboxError> {
    if ID_RE.is_match(id) {
        Ok(())
    } else {
        Err(SandboxError::InvalidId(id.to_string()))
    }
}

fn begin_marker(id: &str) -> String {
    format!("<!-- ghost-cro:begin {id} -->")
}

fn end_marker(id: &str) -> String {
    format!("<!-- ghost-cro:end {id} -->")
}

impl Injection {
    /// Render the delimited block, without a trailing newline.
    #[must_use]
    pub fn render(&self) -> String {
        let id = &self.id;
        let content = self.content.trim_end_matches(['\n', '\r']);
        let body = match self.kind {
            InjectionKind::Liquid => content.to_string(),
            InjectionKind::Css => {
                format!("<style data-ghost-cro=\"{id}\">\n{content}\n</style>")
            }
            InjectionKind::Js => {
                format!("<script data-ghost-cro=\"{id}\">\n{content}\n</script>")
            }
        };
        format!("{}\n{body}\n{}", begin_marker(id), end_marker(id))
    }

    fn anchors(&self) -> Vec<(&'static Regex, InjectionOutcome)> {
        let mut anchors: Vec<(&'static Regex, InjectionOutcome)> =
            vec![(&*MARKER_RE, InjectionOutcome::Marker)];
        match self.kind {
            InjectionKind::Css => anchors.push((&*HEAD_CLOSE_RE, InjectionOutcome::HeadClose)),
            InjectionKind::Liquid => {
                anchors.push((&*CONTENT_FOR_LAYOUT_RE, InjectionOutcome::ContentForLayout));
            }
            InjectionKind::Js => {}
        }
        anchors.extend([
            (&*MAIN_CLOSE_RE, InjectionOutcome::MainClose),
            (&*BODY_CLOSE_RE, InjectionOutcome::BodyClose),
            (&*HTML_CLOSE_RE, InjectionOutcome::HtmlClose),
        ]);
        anchors
    }
}

/// Byte range of an existing block for `id`, including one trailing newline.
fn find_block(source: &str, id: &str) -> Result<Option<(usize, usize)>, SandboxError> {
    let begin = begin_marker(id);
    let Some(start) = source.find(&begin) else {
        return Ok(None);
    };
    let end = end_marker(id);
    let search_from = start + begin.len();
    let Some(offset) = source[search_from..].find(&end) else {
        return Err(SandboxError::UnterminatedBlock(id.to_string()));
    };
    let mut stop = search_from + offset + end.len();
    if source[stop..].starts_with('\n') {
        stop += 1;
    }
    Ok(Some((start, stop)))
}

/// Splice `injection` into `source`.
///
/// # Errors
///
/// Returns an error if the id is invalid, the content contains ghost-cro
/// markers, or an existing block for the id is unterminated.
pub fn inject(source: &str, injection: &Injection) -> Result<Injected, SandboxError> {
    validate_id(&injection.id)?;
    if injection.content.contains(MARKER_PREFIX) {
        return Err(SandboxError::NestedMarker);
    }

    let block = injection.render();

    if let Some((start, stop)) = find_block(source, &injection.id)? {
        let trailing = if source[..stop].ends_with('\n') { "\n" } else { "" };
        let mut out = String::with_capacity(source.len() + block.len());
        out.push_str(&source[..start]);
        out.push_str(&block);
        out.push_str(trailing);
        out.push_str(&source[stop..]);
        return Ok(Injected {
            source: out,
            outcome: InjectionOutcome::Replaced,
        });
    }

    for (anchor, outcome) in injection.anchors() {
        if let Some(m) = anchor.find(source) {
            let at = m.start();
            let mut out = String::with_capacity(source.len() + block.len() + 1);
            out.push_str(&source[..at]);
            out.push_str(&block);
            out.push('\n');
            out.push_str(&source[at..]);
            return Ok(Injected {
                source: out,
                outcome,
            });
        }
    }

    let mut out = String::with_capacity(source.len() + block.len() + 2);
    out.push_str(source);
    if !source.is_empty() && !source.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(&block);
    out.push('\n');
    Ok(Injected {
        source: out,
        outcome: InjectionOutcome::Appended,
    })
}

/// Strip a previously injected block. Returns `source` unchanged when absent.
///
/// # Errors
///
/// Returns an error if the id is invalid or the block is unterminated.
pub fn remove(source: &str, id: &str) -> Result<String, SandboxError> {
    validate_id(id)?;
    Ok(match find_block(source, id)? {
        Some((start, stop)) => format!("{}{}", &source[..start], &source[stop..]),
        None => source.to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const LAYOUT: &str = "<html>\n<head>\n<title>x</title>\n</head>\n<body>\n<main>\n{{ content_for_layout }}\n</main>\n</body>\n</html>\n";

    fn injection(id: &str, kind: InjectionKind, content: &str) -> Injection {
        Injection {
            id: id.to_string(),
            kind,
            content: content.to_string(),
        }
    }

    #[test]
    fn css_goes_before_head_close() {
        let fix = injection("badge", InjectionKind::Css, ".badge { color: red; }");
        let out = inject(LAYOUT, &fix).unwrap();
        assert_eq!(out.outcome, InjectionOutcome::HeadClose);
        let block = out.source.find("<!-- ghost-cro:begin badge -->").unwrap();
        assert!(block < out.source.find("</head>").unwrap());
        assert!(out.source.contains("<style data-ghost-cro=\"badge\">"));
    }

    #[test]
    fn liquid_goes_before_content_for_layout() {
        let fix = injection("trust", InjectionKind::Liquid, "{% render 'trust-badges' %}");
        let out = inject(LAYOUT, &fix).unwrap();
        assert_eq!(out.outcome, InjectionOutcome::ContentForLayout);
    }

    #[test]
    fn js_goes_before_main_close() {
        let fix = injection("sticky", InjectionKind::Js, "console.log(1);");
        let out = inject(LAYOUT, &fix).unwrap();
        assert_eq!(out.outcome, InjectionOutcome::MainClose);
        assert!(out.source.contains("<script data-ghost-cro=\"sticky\">"));
    }

    #[test]
    fn explicit_marker_wins() {
        let source = "<body>\n<!-- ghost-cro:inject -->\n</body>";
        let fix = injection("a", InjectionKind::Css, "a{}");
        let out = inject(source, &fix).unwrap();
        assert_eq!(out.outcome, InjectionOutcome::Marker);
    }

    #[test]
    fn falls_through_anchor_chain() {
        let fix = injection("a", InjectionKind::Js, "x()");
        assert_eq!(
            inject("<body></body>", &fix).unwrap().outcome,
            InjectionOutcome::BodyClose
        );
        assert_eq!(
            inject("<html></html>", &fix).unwrap().outcome,
            InjectionOutcome::HtmlClose
        );
        let appended = inject("plain text", &fix).unwrap();
        assert_eq!(appended.outcome, InjectionOutcome::Appended);
        assert!(appended.source.starts_with("plain text\n<!-- ghost-cro:begin a -->"));
    }

    #[test]
    fn reinjecting_replaces_in_place() {
        let first = inject(LAYOUT, &injection("a", InjectionKind::Css, "a{color:red}")).unwrap();
        let second =
            inject(&first.source, &injection("a", InjectionKind::Css, "a{color:blue}")).unwrap();
        assert_eq!(second.outcome, InjectionOutcome::Replaced);
        assert!(second.source.contains("a{color:blue}"));
        assert!(!second.source.contains("a{color:red}"));
        assert_eq!(second.source.matches("ghost-cro:begin a ").count(), 1);
        assert_eq!(second.source.len(), first.source.len() + 1);
    }

    #[test]
    fn remove_restores_original() {
        let fix = injection("a", InjectionKind::Js, "x()");
        let injected = inject(LAYOUT, &fix).unwrap();
        assert_eq!(remove(&injected.source, "a").unwrap(), LAYOUT);
        assert_eq!(remove(LAYOUT, "missing").unwrap(), LAYOUT);
    }

    #[test]
    fn rejects_bad_ids_and_nested_markers() {
        let bad = injection("has space", InjectionKind::Css, "");
        assert!(matches!(inject(LAYOUT, &bad), Err(SandboxError::InvalidId(_))));
        let long = injection(&"x".repeat(65), InjectionKind::Css, "");
        assert!(matches!(inject(LAYOUT, &long), Err(SandboxError::InvalidId(_))));
        let nested = injection("a", InjectionKind::Liquid, "<!-- ghost-cro:end a -->");
        assert_eq!(inject(LAYOUT, &nested), Err(SandboxError::NestedMarker));
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let source = "<!-- ghost-cro:begin a -->\nstuff";
        assert_eq!(
            remove(source, "a"),
            Err(SandboxError::UnterminatedBlock("a".to_string()))
        );
    }
}
