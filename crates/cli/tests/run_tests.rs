// Integration tests driving the binary end to end against temp directories.
//
// Run with: cargo test -p apcrecon-cli --test run_tests -- --nocapture

use std::fs;
use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

fn apcrecon() -> Command {
    Command::new(env!("CARGO_BIN_EXE_apcrecon"))
}

const RCUK_ONLY_CONFIG: &str = r#"
name = "cli test"

[funders.rcuk]
file        = "rcuk.csv"
amount      = "Amount"
invoice     = "Ref 5"
ticket_ref  = "Description"
paydate     = "Posted"
total_apc   = "RCUK APC Amount"
total_other = "RCUK Other Amount"

[lookup.map]
"OA-1000" = "5000"

[output]
master    = "reconciled.csv"
debug_dir = "debug"
"#;

const RCUK_CSV: &str = "\
Tran,SOF,Amount,Posted,Ref 5,Description
EBDU,JUDB,100.00,01-APR-2025,INV-001,OA-1000 first
EBDU,JUDB,50.00,02-APR-2025,INV-002,OA 1000 second
EBDU,JUDB,75.00,03-APR-2025,INV-003,OA-9999 unknown ref
EBDU,JUDB,20.00,04-APR-2025,INV-004,no reference at all
";

fn write_rcuk_fixture(dir: &Path) {
    fs::write(dir.join("payments.toml"), RCUK_ONLY_CONFIG).unwrap();
    fs::write(dir.join("rcuk.csv"), RCUK_CSV).unwrap();
}

/// Parse a CSV file into (header, rows keyed by the first column).
fn read_csv_by_first_column(
    path: &Path,
) -> (Vec<String>, std::collections::HashMap<String, Vec<String>>) {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .unwrap();
    let header: Vec<String> = reader.headers().unwrap().iter().map(String::from).collect();
    let mut rows = std::collections::HashMap::new();
    for record in reader.records() {
        let record = record.unwrap();
        let fields: Vec<String> = record.iter().map(String::from).collect();
        rows.insert(fields[0].clone(), fields);
    }
    (header, rows)
}

// ===========================================================================
// apcrecon run
// ===========================================================================

#[test]
fn run_writes_master_and_debug_files() {
    let dir = TempDir::new().unwrap();
    write_rcuk_fixture(dir.path());

    let output = apcrecon()
        .args(["run", dir.path().join("payments.toml").to_str().unwrap()])
        .output()
        .expect("apcrecon run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let master_path = dir.path().join("reconciled.csv");
    assert!(master_path.exists(), "master CSV should be written");

    let (header, rows) = read_csv_by_first_column(&master_path);
    assert_eq!(header[0], "ticket");
    let ticket = rows.get("5000").expect("ticket 5000 in master");
    let total_idx = header.iter().position(|h| h == "RCUK APC Amount").unwrap();
    assert_eq!(ticket[total_idx], "150");
    let ref_idx = header.iter().position(|h| h == "Ref 5").unwrap();
    assert_eq!(ticket[ref_idx], "INV-001 %&% INV-002");

    // Both unmatched rows land in one debug file, behind the header.
    let unmatched = dir.path().join("debug/unmatched_rcuk.csv");
    assert!(unmatched.exists());
    let contents = fs::read_to_string(&unmatched).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("Tran,"));
    assert!(contents.contains("OA-9999 unknown ref"));
    assert!(contents.contains("no reference at all"));

    // No wrong-fund or non-qualifying rows, so those files never appear.
    assert!(!dir.path().join("debug/non_judb_rcuk.csv").exists());
    assert!(!dir.path().join("debug/non_ebdu_rcuk.csv").exists());

    // The failed OA lookup is warned about on stderr.
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("OA-9999"), "stderr: {stderr}");
    assert!(stderr.contains("wrote"), "stderr: {stderr}");
}

#[test]
fn run_json_prints_reports_on_stdout() {
    let dir = TempDir::new().unwrap();
    write_rcuk_fixture(dir.path());

    let output = apcrecon()
        .args([
            "run",
            dir.path().join("payments.toml").to_str().unwrap(),
            "--json",
        ])
        .output()
        .expect("apcrecon run --json");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let reports: serde_json::Value = serde_json::from_str(stdout.trim()).unwrap();
    let reports = reports.as_array().expect("JSON array of run reports");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0]["meta"]["funder"], "rcuk");
    assert_eq!(reports[0]["summary"]["rows"], 4);
    assert_eq!(reports[0]["summary"]["accepted"], 2);
    assert_eq!(reports[0]["summary"]["unmatched"], 2);
}

#[test]
fn run_output_writes_report_file() {
    let dir = TempDir::new().unwrap();
    write_rcuk_fixture(dir.path());

    let report_path = dir.path().join("reports.json");
    let output = apcrecon()
        .args([
            "run",
            dir.path().join("payments.toml").to_str().unwrap(),
            "--output",
            report_path.to_str().unwrap(),
        ])
        .output()
        .expect("apcrecon run --output");
    assert!(output.status.success());
    // Nothing on stdout without --json.
    assert!(output.stdout.is_empty());

    let reports: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(reports[0]["meta"]["source"], "rcuk.csv");
    assert_eq!(reports[0]["rejected"].as_array().unwrap().len(), 2);
}

#[test]
fn run_processes_rcuk_before_coaf_into_one_master() {
    let dir = TempDir::new().unwrap();
    let config = format!(
        r#"{RCUK_ONLY_CONFIG}
[funders.coaf]
file        = "coaf.csv"
amount      = "Burdened Cost"
invoice     = "Invoice"
ticket_ref  = "Comment"
paydate     = "GL Posting Date"
total_apc   = "COAF APC Amount"
total_other = "COAF Other Amount"
"#
    );
    fs::write(dir.path().join("payments.toml"), config).unwrap();
    fs::write(dir.path().join("rcuk.csv"), RCUK_CSV).unwrap();
    fs::write(
        dir.path().join("coaf.csv"),
        "Burdened Cost,Invoice,Comment,GL Posting Date\n\
         120.00,C-100,OA-1000 coaf share,15-APR-2025\n",
    )
    .unwrap();

    let output = apcrecon()
        .args(["run", dir.path().join("payments.toml").to_str().unwrap()])
        .output()
        .expect("apcrecon run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    // Summaries arrive in funder order.
    let stderr = String::from_utf8_lossy(&output.stderr);
    let rcuk_at = stderr.find("[RCUK]").expect("RCUK summary line");
    let coaf_at = stderr.find("[COAF]").expect("COAF summary line");
    assert!(rcuk_at < coaf_at, "stderr: {stderr}");

    let (header, rows) = read_csv_by_first_column(&dir.path().join("reconciled.csv"));
    let ticket = rows.get("5000").expect("shared ticket in master");
    let rcuk_idx = header.iter().position(|h| h == "RCUK APC Amount").unwrap();
    let coaf_idx = header.iter().position(|h| h == "COAF APC Amount").unwrap();
    assert_eq!(ticket[rcuk_idx], "150");
    assert_eq!(ticket[coaf_idx], "120");
}

#[test]
fn run_single_funder_with_flag() {
    let dir = TempDir::new().unwrap();
    write_rcuk_fixture(dir.path());

    let output = apcrecon()
        .args([
            "run",
            dir.path().join("payments.toml").to_str().unwrap(),
            "--funder",
            "rcuk",
        ])
        .output()
        .expect("apcrecon run --funder rcuk");
    assert!(output.status.success());
    assert!(dir.path().join("reconciled.csv").exists());
}

#[test]
fn run_unconfigured_funder_is_usage_error() {
    let dir = TempDir::new().unwrap();
    write_rcuk_fixture(dir.path());

    let output = apcrecon()
        .args([
            "run",
            dir.path().join("payments.toml").to_str().unwrap(),
            "--funder",
            "coaf",
        ])
        .output()
        .expect("apcrecon run --funder coaf");
    assert_eq!(output.status.code(), Some(2));

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
    assert!(stderr.contains("[funders.coaf]"), "stderr: {stderr}");
}

#[test]
fn run_missing_input_file_is_runtime_error() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("payments.toml"), RCUK_ONLY_CONFIG).unwrap();
    // rcuk.csv deliberately absent.

    let output = apcrecon()
        .args(["run", dir.path().join("payments.toml").to_str().unwrap()])
        .output()
        .expect("apcrecon run");
    assert_eq!(output.status.code(), Some(4));
    assert!(String::from_utf8_lossy(&output.stderr).contains("rcuk.csv"));
}

#[test]
fn run_decodes_windows_1252_exports() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("payments.toml"), RCUK_ONLY_CONFIG).unwrap();
    let mut csv_bytes = b"Tran,SOF,Amount,Posted,Ref 5,Description\n".to_vec();
    csv_bytes.extend_from_slice(b"EBDU,JUDB,100.00,01-APR-2025,INV-001,caf\xE9 OA-1000\n");
    fs::write(dir.path().join("rcuk.csv"), &csv_bytes).unwrap();

    let output = apcrecon()
        .args(["run", dir.path().join("payments.toml").to_str().unwrap()])
        .output()
        .expect("apcrecon run");
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let master = fs::read_to_string(dir.path().join("reconciled.csv")).unwrap();
    assert!(master.contains("café OA-1000"), "master: {master}");
}

// ===========================================================================
// apcrecon validate
// ===========================================================================

#[test]
fn validate_accepts_good_config() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("payments.toml"), RCUK_ONLY_CONFIG).unwrap();

    let output = apcrecon()
        .args([
            "validate",
            dir.path().join("payments.toml").to_str().unwrap(),
        ])
        .output()
        .expect("apcrecon validate");
    assert!(output.status.success());

    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("valid: 'cli test' (funders: rcuk)"), "stderr: {stderr}");
}

#[test]
fn validate_rejects_bad_config_with_exit_code_3() {
    let dir = TempDir::new().unwrap();
    let broken = RCUK_ONLY_CONFIG.replace(
        r#"total_other = "RCUK Other Amount""#,
        r#"total_other = "RCUK APC Amount""#,
    );
    fs::write(dir.path().join("payments.toml"), broken).unwrap();

    let output = apcrecon()
        .args([
            "validate",
            dir.path().join("payments.toml").to_str().unwrap(),
        ])
        .output()
        .expect("apcrecon validate");
    assert_eq!(output.status.code(), Some(3));
    assert!(String::from_utf8_lossy(&output.stderr).contains("total_apc"));
}
