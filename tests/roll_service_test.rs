//! Tests for RollService
//!
//! A roll reads the list, removes pending removals, inserts clean pending
//! additions before the insertion marker and writes the rejected additions.
//! Nothing is written when any step fails.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use rstest::rstest;
use tempfile::TempDir;

use hstsroll::application::services::{RemovalSource, RollRequest, RollService};
use hstsroll::application::ApplicationError;
use hstsroll::config::Settings;
use hstsroll::domain::{DomainError, Rejection, StructureError, ValidationError};
use hstsroll::infrastructure::traits::{FetchError, PreloadSource, RealFileSystem};

const MARKER: &str = "    // END OF 1-YEAR BULK HSTS ENTRIES";

/// Scripted remote source; records which queues were asked for.
#[derive(Default)]
struct FakeSource {
    removals: Vec<String>,
    automated: Vec<String>,
    fail: bool,
    calls: Mutex<Vec<&'static str>>,
}

impl PreloadSource for FakeSource {
    fn preload_list(&self) -> Result<String, FetchError> {
        Err(FetchError::new("fake://list", "not scripted"))
    }

    fn pending_removals(&self) -> Result<Vec<String>, FetchError> {
        self.calls.lock().unwrap().push("pending_removals");
        if self.fail {
            return Err(FetchError::new("fake://pending-removal", "503"));
        }
        Ok(self.removals.clone())
    }

    fn pending_automated_removals(&self) -> Result<Vec<String>, FetchError> {
        self.calls.lock().unwrap().push("pending_automated_removals");
        Ok(self.automated.clone())
    }
}

fn bulk_entry(name: &str) -> String {
    format!(
        r#"    {{ "name": "{name}", "policy": "bulk-1-year", "mode": "force-https", "include_subdomains": true }},"#
    )
}

/// A list with all four bulk bands; `one_year` entries go into the 1-year band.
fn preload_list(one_year: &[&str]) -> String {
    let mut lines = vec![
        "{".to_string(),
        "  // Hand-maintained header comment".to_string(),
        "  \"entries\": [".to_string(),
        "    // Manual entries".to_string(),
        r#"    { "name": "manual.example", "policy": "custom", "mode": "force-https" },"#.to_string(),
        "".to_string(),
        "    // START OF LEGACY 18-WEEK BULK HSTS ENTRIES".to_string(),
        bulk_entry("legacy.example").replace("bulk-1-year", "bulk-legacy"),
        "    // END OF LEGACY 18-WEEK BULK HSTS ENTRIES".to_string(),
        "    // START OF 18-WEEK BULK HSTS ENTRIES".to_string(),
        "    // END OF 18-WEEK BULK HSTS ENTRIES".to_string(),
        "    // START OF 1-YEAR BULK HSTS ENTRIES".to_string(),
    ];
    lines.extend(one_year.iter().map(|name| bulk_entry(name)));
    lines.extend([
        MARKER.to_string(),
        "    // START OF 1-YEAR BULK SUBDOMAIN HSTS ENTRIES".to_string(),
        "    // END OF 1-YEAR BULK SUBDOMAIN HSTS ENTRIES".to_string(),
        r#"    { "name": "last.example", "mode": "force-https" }"#.to_string(),
        "  ]".to_string(),
        "}".to_string(),
    ]);
    let mut text = lines.join("\n");
    text.push('\n');
    text
}

fn pending_scan(clean: &[&str], rejected: &[(&str, &str)]) -> String {
    let mut records: Vec<serde_json::Value> = clean
        .iter()
        .map(|d| serde_json::json!({ "domain": d, "issues": { "errors": [], "warnings": [] } }))
        .collect();
    records.extend(rejected.iter().map(|(d, code)| {
        serde_json::json!({
            "domain": d,
            "issues": { "errors": [{ "code": code, "summary": "s", "message": "m" }], "warnings": [] }
        })
    }));
    serde_json::to_string_pretty(&records).unwrap()
}

struct Fixture {
    _temp: TempDir,
    list: PathBuf,
    scan: PathBuf,
    rejected: PathBuf,
}

fn setup(list: &str, scan: &str) -> Fixture {
    let temp = TempDir::new().unwrap();
    let list_path = temp.path().join("transport_security_state_static.json");
    let scan_path = temp.path().join("pending.json");
    fs::write(&list_path, list).unwrap();
    fs::write(&scan_path, scan).unwrap();
    Fixture {
        list: list_path,
        scan: scan_path,
        rejected: temp.path().join("rejected.json"),
        _temp: temp,
    }
}

fn service(source: Arc<FakeSource>) -> RollService {
    RollService::new(
        Arc::new(RealFileSystem),
        source,
        Arc::new(Settings::default()),
    )
}

fn request(fx: &Fixture, removals: RemovalSource) -> RollRequest {
    RollRequest {
        list_path: fx.list.clone(),
        pending_scan_path: fx.scan.clone(),
        rejected_path: fx.rejected.clone(),
        removals,
    }
}

fn removal_file(dir: &Path, domains: &[&str]) -> PathBuf {
    let path = dir.join("removals.json");
    fs::write(&path, serde_json::to_string(domains).unwrap()).unwrap();
    path
}

// ============================================================
// roll() tests
// ============================================================

#[test]
fn given_removal_and_additions_when_roll_then_drops_and_inserts_sorted_before_marker() {
    // Arrange
    let fx = setup(
        &preload_list(&["keep.example", "old.example"]),
        &pending_scan(&["new.example", "mid.example"], &[]),
    );
    let source = Arc::new(FakeSource {
        removals: vec!["old.example".into()],
        ..Default::default()
    });

    // Act
    let report = service(source)
        .roll(&request(&fx, RemovalSource::Fetch { automated: false }))
        .unwrap();

    // Assert
    assert_eq!(report.removed, 1);
    assert_eq!(report.inserted, 2);
    assert!(report.is_clean());

    let rolled = fs::read_to_string(&fx.list).unwrap();
    assert!(!rolled.contains("old.example"));
    let expected = [
        bulk_entry("keep.example"),
        bulk_entry("mid.example"),
        bulk_entry("new.example"),
        MARKER.to_string(),
    ]
    .join("\n");
    assert!(rolled.contains(&expected), "unexpected output:\n{rolled}");
}

#[test]
fn given_roll_when_done_then_non_entry_lines_are_untouched() {
    let original = preload_list(&["old.example"]);
    let fx = setup(&original, &pending_scan(&["new.example"], &[]));

    service(Arc::new(FakeSource::default()))
        .roll(&request(&fx, RemovalSource::Skip))
        .unwrap();

    let rolled = fs::read_to_string(&fx.list).unwrap();
    let non_entries = |text: &str| -> Vec<String> {
        text.lines()
            .filter(|l| !l.starts_with("    {"))
            .map(String::from)
            .collect()
    };
    assert_eq!(non_entries(&rolled), non_entries(&original));
}

#[test]
fn given_malformed_addition_when_roll_then_aborts_before_any_write() {
    // Arrange
    let original = preload_list(&["keep.example"]);
    let fx = setup(&original, &pending_scan(&["bad..domain"], &[]));

    // Act
    let err = service(Arc::new(FakeSource::default()))
        .roll(&request(&fx, RemovalSource::Skip))
        .unwrap_err();

    // Assert
    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Validation(ValidationError::MalformedDomain(ref d)))
            if d == "bad..domain"
    ));
    assert_eq!(fs::read_to_string(&fx.list).unwrap(), original);
    assert!(!fx.rejected.exists());
}

#[test]
fn given_denied_addition_when_roll_then_aborts() {
    let fx = setup(&preload_list(&[]), &pending_scan(&["google.com"], &[]));

    let err = service(Arc::new(FakeSource::default()))
        .roll(&request(&fx, RemovalSource::Skip))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Validation(ValidationError::DeniedDomain(_)))
    ));
}

#[test]
fn given_duplicate_entries_when_roll_then_reports_once_and_succeeds() {
    let fx = setup(
        &preload_list(&["dup.example", "dup.example", "other.example"]),
        &pending_scan(&[], &[]),
    );

    let report = service(Arc::new(FakeSource::default()))
        .roll(&request(&fx, RemovalSource::Skip))
        .unwrap();

    assert_eq!(report.duplicates, vec!["dup.example".to_string()]);
    assert!(!report.is_clean());
    let rolled = fs::read_to_string(&fx.list).unwrap();
    assert_eq!(rolled.matches("dup.example").count(), 2);
}

#[test]
fn given_rolled_list_when_rolled_again_with_nothing_then_unchanged() {
    let fx = setup(
        &preload_list(&["a.example", "old.example"]),
        &pending_scan(&["z.example"], &[]),
    );
    let removals = removal_file(fx.list.parent().unwrap(), &["old.example"]);
    let svc = service(Arc::new(FakeSource::default()));
    svc.roll(&request(&fx, RemovalSource::File(removals)))
        .unwrap();
    let first = fs::read_to_string(&fx.list).unwrap();

    fs::write(&fx.scan, "[]").unwrap();
    let report = svc.roll(&request(&fx, RemovalSource::Skip)).unwrap();

    assert_eq!(report.removed, 0);
    assert_eq!(report.inserted, 0);
    assert_eq!(fs::read_to_string(&fx.list).unwrap(), first);
}

#[test]
fn given_entry_count_when_roll_then_count_is_input_minus_removed_plus_added() {
    let fx = setup(
        &preload_list(&["a.example", "b.example", "c.example"]),
        &pending_scan(&["d.example", "e.example"], &[]),
    );
    let removals = removal_file(fx.list.parent().unwrap(), &["b.example", "c.example"]);
    let count = |text: &str| text.lines().filter(|l| l.starts_with("    {")).count();
    let before = count(&fs::read_to_string(&fx.list).unwrap());

    let report = service(Arc::new(FakeSource::default()))
        .roll(&request(&fx, RemovalSource::File(removals)))
        .unwrap();

    let after = count(&fs::read_to_string(&fx.list).unwrap());
    assert_eq!(after, before - report.removed + report.inserted);
    assert_eq!(after, before);
}

#[test]
fn given_rejected_pending_additions_when_roll_then_writes_rejections_file() {
    let fx = setup(
        &preload_list(&[]),
        &pending_scan(
            &["ok.example"],
            &[("nohsts.example", "header.missing"), ("redir.example", "redirects.http")],
        ),
    );

    let report = service(Arc::new(FakeSource::default()))
        .roll(&request(&fx, RemovalSource::Skip))
        .unwrap();

    assert_eq!(report.rejected, 2);
    let content = fs::read_to_string(&fx.rejected).unwrap();
    assert!(content.starts_with("[\n  {"), "not indented: {content}");
    assert!(content.ends_with("]\n"));
    let rejections: Vec<Rejection> = serde_json::from_str(&content).unwrap();
    assert_eq!(
        rejections,
        vec![
            Rejection {
                domain: "nohsts.example".into(),
                errors: vec!["header.missing".into()],
            },
            Rejection {
                domain: "redir.example".into(),
                errors: vec!["redirects.http".into()],
            },
        ]
    );
}

#[test]
fn given_removal_not_in_list_when_roll_then_reported_as_unmatched() {
    let fx = setup(&preload_list(&["a.example"]), &pending_scan(&[], &[]));
    let removals = removal_file(fx.list.parent().unwrap(), &["a.example", "ghost.example"]);

    let report = service(Arc::new(FakeSource::default()))
        .roll(&request(&fx, RemovalSource::File(removals)))
        .unwrap();

    assert_eq!(report.removed, 1);
    assert_eq!(report.unmatched_removals, vec!["ghost.example".to_string()]);
}

#[rstest]
#[case(true, 2, vec!["pending_removals", "pending_automated_removals"])]
#[case(false, 1, vec!["pending_removals"])]
fn given_fetch_source_when_roll_then_queues_are_unioned(
    #[case] automated: bool,
    #[case] expected_removed: usize,
    #[case] expected_calls: Vec<&str>,
) {
    let fx = setup(
        &preload_list(&["owner.example", "auto.example", "keep.example"]),
        &pending_scan(&[], &[]),
    );
    let source = Arc::new(FakeSource {
        removals: vec!["owner.example".into()],
        automated: vec!["auto.example".into()],
        ..Default::default()
    });

    let report = service(Arc::clone(&source))
        .roll(&request(&fx, RemovalSource::Fetch { automated }))
        .unwrap();

    assert_eq!(report.removed, expected_removed);
    assert_eq!(*source.calls.lock().unwrap(), expected_calls);
}

#[test]
fn given_fetch_failure_when_roll_then_fetch_error_and_no_write() {
    let original = preload_list(&["a.example"]);
    let fx = setup(&original, &pending_scan(&["b.example"], &[]));
    let source = Arc::new(FakeSource {
        fail: true,
        ..Default::default()
    });

    let err = service(source)
        .roll(&request(&fx, RemovalSource::Fetch { automated: true }))
        .unwrap_err();

    assert!(matches!(err, ApplicationError::Fetch(_)));
    assert_eq!(fs::read_to_string(&fx.list).unwrap(), original);
}

#[test]
fn given_list_without_insertion_marker_when_adding_then_structure_error() {
    let list = preload_list(&["a.example"]).replace(MARKER, "    // END OF SOMETHING ELSE");
    let fx = setup(&list, &pending_scan(&["b.example"], &[]));

    let err = service(Arc::new(FakeSource::default()))
        .roll(&request(&fx, RemovalSource::Skip))
        .unwrap_err();

    assert!(matches!(
        err,
        ApplicationError::Domain(DomainError::Structure(
            StructureError::InsertionMarkerMissing(_)
        ))
    ));
    assert_eq!(fs::read_to_string(&fx.list).unwrap(), list);
}

#[test]
fn given_missing_list_file_when_roll_then_operation_failed_names_path() {
    let temp = TempDir::new().unwrap();
    let fx = Fixture {
        list: temp.path().join("missing.json"),
        scan: temp.path().join("pending.json"),
        rejected: temp.path().join("rejected.json"),
        _temp: temp,
    };

    let err = service(Arc::new(FakeSource::default()))
        .roll(&request(&fx, RemovalSource::Skip))
        .unwrap_err();

    assert!(err.to_string().contains("missing.json"), "{err}");
}

#[test]
fn given_unwritable_rejections_path_when_roll_then_list_is_unchanged() {
    // Arrange
    let original = preload_list(&["old.example"]);
    let mut fx = setup(&original, &pending_scan(&["new.example"], &[("x.example", "header.missing")]));
    fx.rejected = fx.list.parent().unwrap().join("missing-dir").join("rejected.json");
    let removals = removal_file(fx.list.parent().unwrap(), &["old.example"]);

    // Act
    let err = service(Arc::new(FakeSource::default()))
        .roll(&request(&fx, RemovalSource::File(removals)))
        .unwrap_err();

    // Assert
    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    assert_eq!(fs::read_to_string(&fx.list).unwrap(), original);
    assert!(!fx.rejected.exists());
}
