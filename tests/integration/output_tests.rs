use dupecmp::duplicates::DuplicateFinder;
use dupecmp::error::ExitCode;
use dupecmp::output::{CsvOutput, JsonOutput, TextOutput};
use std::fs;
use tempfile::{tempdir, TempDir};

fn scan_fixture() -> (TempDir, Vec<dupecmp::duplicates::DuplicateGroup>, dupecmp::duplicates::ScanSummary) {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a1"), b"first set").unwrap();
    fs::write(dir.path().join("a2"), b"first set").unwrap();
    fs::write(dir.path().join("b1"), b"second set, longer").unwrap();
    fs::write(dir.path().join("b2"), b"second set, longer").unwrap();
    fs::write(dir.path().join("b3"), b"second set, longer").unwrap();
    fs::write(dir.path().join("lone"), b"no twin").unwrap();

    let (groups, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&[dir.path()])
        .unwrap();
    (dir, groups, summary)
}

#[test]
fn test_text_output_layout() {
    let (_dir, groups, _) = scan_fixture();

    let mut output = TextOutput::new(Vec::new());
    for group in &groups {
        output.write_group(group).unwrap();
    }
    let text = String::from_utf8(output.finish().unwrap()).unwrap();

    let blocks: Vec<&str> = text.trim_matches('\n').split("\n\n").collect();
    assert_eq!(blocks.len(), 2);
    // larger files first
    assert_eq!(blocks[0].lines().count(), 3);
    assert_eq!(blocks[1].lines().count(), 2);
    assert!(text.starts_with('\n'));
    assert!(text.ends_with("\n\n"));
}

#[test]
fn test_json_output_round_trips_through_serde_json() {
    let (_dir, groups, summary) = scan_fixture();

    let output = JsonOutput::new(&groups, &summary, ExitCode::from_summary(&summary));
    let value: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();

    assert_eq!(value["duplicates"].as_array().unwrap().len(), 2);
    assert_eq!(value["duplicates"][0]["size"], 18);
    assert_eq!(value["summary"]["total_files"], 6);
    assert_eq!(value["summary"]["duplicate_files"], 3);
    assert_eq!(value["summary"]["exit_code"], 0);
}

#[test]
fn test_csv_output_rows() {
    let (_dir, groups, _) = scan_fixture();

    let csv = CsvOutput::new(&groups).to_string().unwrap();
    let mut reader = csv::Reader::from_reader(csv.as_bytes());
    let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();

    assert_eq!(rows.len(), 5);
    assert_eq!(rows.iter().filter(|r| &r[0] == "1").count(), 3);
    assert_eq!(rows.iter().filter(|r| &r[0] == "2").count(), 2);
    assert!(rows.iter().all(|r| &r[3] != "unknown"));
}
