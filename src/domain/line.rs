//! Line classification and the document model.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^ *//").expect("valid comment regex"));
static ENTRY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^    \{.*\},").expect("valid entry regex"));

/// What a single line of the preload list is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineKind {
    Blank,
    Comment,
    /// A one-line `    { ... },` object.
    Entry,
    /// Anything else; passed through verbatim.
    Unknown,
}

impl fmt::Display for LineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LineKind::Blank => "blank",
            LineKind::Comment => "comment",
            LineKind::Entry => "entry",
            LineKind::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Classify one line. First matching rule wins; total and deterministic.
pub fn classify(line: &str) -> LineKind {
    if line.is_empty() {
        LineKind::Blank
    } else if COMMENT_RE.is_match(line) {
        LineKind::Comment
    } else if ENTRY_RE.is_match(line) {
        LineKind::Entry
    } else {
        LineKind::Unknown
    }
}

/// One record of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// 1-based line number
    pub number: usize,
    pub content: &'a str,
    pub kind: LineKind,
}

/// The preload list as an ordered sequence of classified lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document<'a> {
    lines: Vec<Line<'a>>,
}

impl<'a> Document<'a> {
    /// Split on line boundaries and classify every line.
    pub fn parse(text: &'a str) -> Self {
        let lines = text
            .lines()
            .enumerate()
            .map(|(i, content)| Line {
                number: i + 1,
                content,
                kind: classify(content),
            })
            .collect();
        Self { lines }
    }

    pub fn lines(&self) -> &[Line<'a>] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn count(&self, kind: LineKind) -> usize {
        self.lines.iter().filter(|l| l.kind == kind).count()
    }
}

/// Join output lines the way the list is stored on disk: `\n`-separated with
/// a trailing newline.
pub fn render<I, S>(lines: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out = String::new();
    for line in lines {
        out.push_str(line.as_ref());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", LineKind::Blank)]
    #[case("// header", LineKind::Comment)]
    #[case("    // END OF 1-YEAR BULK HSTS ENTRIES", LineKind::Comment)]
    #[case(
        r#"    { "name": "a.example", "policy": "bulk-1-year", "mode": "force-https", "include_subdomains": true },"#,
        LineKind::Entry
    )]
    #[case(r#"    { "name": "last.example" }"#, LineKind::Unknown)]
    #[case(r#"      { "name": "deeper.example" },"#, LineKind::Unknown)]
    #[case("  \"entries\": [", LineKind::Unknown)]
    #[case(" ", LineKind::Unknown)]
    fn test_classify(#[case] line: &str, #[case] expected: LineKind) {
        assert_eq!(classify(line), expected);
    }

    #[test]
    fn test_document_parse_numbers_lines_from_one() {
        let doc = Document::parse("{\n// c\n\n}\n");
        assert_eq!(doc.len(), 4);
        assert_eq!(doc.lines()[1].number, 2);
        assert_eq!(doc.lines()[1].kind, LineKind::Comment);
        assert_eq!(doc.count(LineKind::Blank), 1);
    }

    #[test]
    fn test_render_appends_trailing_newline() {
        assert_eq!(render(["a", "b"]), "a\nb\n");
        assert_eq!(render(Vec::<String>::new()), "");
    }
}
