//! Post-merge validation: structural round trip, duplicates, domain sanity.

use std::collections::{BTreeSet, HashMap};
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info, trace};

use crate::domain::entry::Entry;
use crate::domain::error::{StructureError, ValidationError};
use crate::domain::line::{classify, LineKind};

/// Lowercase labels of letters, digits and hyphens, joined by single dots.
static DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9-]+(\.[a-z0-9-]+)*$").expect("valid domain regex")
});

/// Domains that must never be bulk-managed.
pub fn default_deny_list() -> Vec<String> {
    vec![
        "google.com".to_string(),
        "gmail.com".to_string(),
        "hstspreload.org".to_string(),
    ]
}

/// The parsed preload list; only `entries` is of interest.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PreloadList {
    pub entries: Vec<Entry>,
}

/// Drop comment lines and parse the rest as one JSON object.
pub fn parse_without_comments(text: &str) -> Result<PreloadList, StructureError> {
    let stripped = text
        .lines()
        .filter(|line| classify(line) != LineKind::Comment)
        .collect::<Vec<_>>()
        .join("\n");
    let list: PreloadList = serde_json::from_str(&stripped)
        .map_err(|e| StructureError::InvalidDocument(e.to_string()))?;
    debug!("parsed {} entries", list.entries.len());
    Ok(list)
}

/// Names that occur on more than one entry.
pub fn find_duplicates(entries: &[Entry]) -> BTreeSet<String> {
    let mut seen: HashMap<&str, usize> = HashMap::new();
    for entry in entries {
        *seen.entry(entry.name.as_str()).or_default() += 1;
    }
    seen.into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Check every domain against the character policy and the deny-list.
///
/// Returns the number of domains checked.
pub fn sanity_check<'a, I>(domains: I, deny_list: &[String]) -> Result<usize, ValidationError>
where
    I: IntoIterator<Item = &'a str>,
{
    info!("Sanity checking domains...");
    let mut checked = 0;
    for domain in domains {
        trace!("Checking: {}", domain);
        if !DOMAIN_RE.is_match(domain) {
            return Err(ValidationError::MalformedDomain(domain.to_string()));
        }
        if deny_list.iter().any(|denied| denied == domain) {
            return Err(ValidationError::DeniedDomain(domain.to_string()));
        }
        checked += 1;
    }
    Ok(checked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_without_comments_ignores_comment_lines() {
        let text = r#"// header
{
  // the entries
  "entries": [
    { "name": "a.example", "mode": "force-https" },
    // trailing note
    { "name": "b.example" }
  ]
}
"#;
        let list = parse_without_comments(text).unwrap();
        assert_eq!(list.entries.len(), 2);
        assert_eq!(list.entries[1].name, "b.example");
    }

    #[test]
    fn test_parse_without_comments_rejects_trailing_comma() {
        let text = "{\n  \"entries\": [\n    { \"name\": \"a.example\" },\n  ]\n}\n";
        assert!(matches!(
            parse_without_comments(text),
            Err(StructureError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_parse_without_comments_requires_entries() {
        assert!(parse_without_comments("{}").is_err());
    }

    fn named(name: &str) -> Entry {
        crate::domain::entry::EntryTemplate::default().entry(name)
    }

    #[test]
    fn test_find_duplicates_reports_each_name_once() {
        let entries = vec![
            named("dup.example"),
            named("a.example"),
            named("dup.example"),
            named("dup.example"),
        ];
        let dupes = find_duplicates(&entries);
        assert_eq!(dupes.into_iter().collect::<Vec<_>>(), vec!["dup.example"]);
    }

    #[rstest]
    #[case("example.com")]
    #[case("a-b.c0.example")]
    #[case("xn--bcher-kva.example")]
    fn test_sanity_check_accepts(#[case] domain: &str) {
        assert_eq!(sanity_check([domain], &default_deny_list()), Ok(1));
    }

    #[rstest]
    #[case("bad..domain")]
    #[case("Upper.example")]
    #[case("under_score.example")]
    #[case(".leading.example")]
    #[case("trailing.example.")]
    #[case("")]
    fn test_sanity_check_rejects_malformed(#[case] domain: &str) {
        assert_eq!(
            sanity_check([domain], &default_deny_list()),
            Err(ValidationError::MalformedDomain(domain.to_string()))
        );
    }

    #[test]
    fn test_sanity_check_rejects_denied() {
        assert_eq!(
            sanity_check(["ok.example", "gmail.com"], &default_deny_list()),
            Err(ValidationError::DeniedDomain("gmail.com".to_string()))
        );
    }
}
