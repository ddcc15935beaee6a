// tests/integration_batch.rs - Batch scanning, discovery, config and multi-fix sessions
use leakguard_core::batch::scan_files;
use leakguard_core::config::Config;
use leakguard_core::discovery::discover;
use leakguard_core::session::{fix_source, FixOptions};
use leakguard_core::{scan_source, LeakType, Severity};
use std::fs;
use tempfile::TempDir;

const CLOCK: &str = "export default function Clock() {\n  const id = setInterval(tick, 1000);\n  return <time />;\n}\n";
const CLEAN: &str = "export function Quiet() {\n  useEffect(() => {\n    const id = setInterval(tick, 1000);\n    return () => clearInterval(id);\n  }, []);\n  return null;\n}\n";

fn project() -> TempDir {
    let d = tempfile::tempdir().unwrap();
    fs::create_dir_all(d.path().join("src/widgets")).unwrap();
    fs::create_dir_all(d.path().join("node_modules/lib")).unwrap();
    fs::write(d.path().join("src/Clock.tsx"), CLOCK).unwrap();
    fs::write(d.path().join("src/widgets/Quiet.jsx"), CLEAN).unwrap();
    fs::write(d.path().join("node_modules/lib/index.js"), CLOCK).unwrap();
    d
}

#[test]
fn test_scan_directory_skips_pruned_dirs() {
    let d = project();
    let files = discover(&[d.path().to_path_buf()], &Config::new()).unwrap();
    assert_eq!(files.len(), 2);
    let report = scan_files(&files);
    assert_eq!(report.files_scanned, 2);
    assert_eq!(report.findings.len(), 1);
    assert_eq!(report.findings[0].leak_type, LeakType::UnregisteredInterval);
    assert_eq!(report.findings[0].severity, Severity::Critical);
    assert!(report.findings[0].file.ends_with("Clock.tsx"));
}

#[test]
fn test_batch_continues_past_unreadable_file() {
    let d = project();
    let mut files = vec![d.path().join("src/Missing.tsx")];
    files.extend(discover(&[d.path().join("src")], &Config::new()).unwrap());
    let report = scan_files(&files);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.findings.len(), 1);
}

#[test]
fn test_config_file_drives_discovery() {
    let d = project();
    let config_path = d.path().join("leakguard.toml");
    fs::write(&config_path, "[scan]\nextensions = [\"jsx\"]\nmin_severity = \"medium\"\n").unwrap();
    let config = Config::load_from(&config_path).unwrap();
    let files = discover(&[d.path().to_path_buf()], &config).unwrap();
    assert_eq!(files.len(), 1);
    assert!(files[0].ends_with("src/widgets/Quiet.jsx"));
    assert_eq!(config.scan.min_severity, Severity::Medium);
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let d = tempfile::tempdir().unwrap();
    let config = Config::load_from(&d.path().join("leakguard.toml")).unwrap();
    assert_eq!(config.fix.max_passes, 32);
    assert!(!config.fix.include_manual_review);
}

#[test]
fn test_session_fixes_file_until_clean() {
    let src = "function Live({ url }) {\n  const es = new EventSource(url);\n  useEffect(() => {\n    const id = setInterval(ping, 1000);\n  }, []);\n  return <ul />;\n}\n";
    let session = fix_source(src, "Live.tsx", &FixOptions::default()).unwrap();
    assert_eq!(session.applied.len(), 2);
    assert!(scan_source(&session.source, "Live.tsx").unwrap().is_empty());
    for fix in &session.applied {
        assert!(fix.confidence >= 0.9);
        assert!(!fix.requires_manual_review);
    }
}

#[test]
fn test_scanning_is_idempotent() {
    let first = scan_source(CLOCK, "Clock.tsx").unwrap();
    let second = scan_source(CLOCK, "Clock.tsx").unwrap();
    assert_eq!(first, second);
}
