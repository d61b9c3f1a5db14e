//! File loader tests: CVE index directories, CVE definitions, overrides

use std::fs;
use std::path::Path;
use threatflow_refdata::{
    CveDefinitions, CveIndex, MappingOverrides, ReferenceDataError, StrideCategory,
};

fn write_cve_db(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    fs::write(
        dir.join("CVE-2021.jsonl"),
        r#"{"CVE-2021-44228": {"CWE": ["502"], "CAPEC": ["153", "242"], "TECHNIQUES": []}}"#,
    )
    .unwrap();
    fs::write(
        dir.join("CVE-2022.jsonl"),
        r#"{"CVE-2022-5678": {"CWE": ["89"], "CAPEC": ["7"], "TECHNIQUES": []}}"#,
    )
    .unwrap();
    fs::write(
        dir.join("CVE-2023.jsonl"),
        concat!(
            r#"{"CVE-2023-1234": {"CWE": ["22"], "CAPEC": ["126"], "TECHNIQUES": []}}"#,
            "\n{broken\n"
        ),
    )
    .unwrap();
    fs::write(dir.join("README.txt"), "not a database file").unwrap();
}

#[test]
fn index_loads_every_jsonl_file() {
    let root = tempfile::tempdir().unwrap();
    let db = root.path().join("cve2capec");
    write_cve_db(&db);

    let index = CveIndex::load_dir(&db).unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(
        index.capecs_for("CVE-2021-44228"),
        ["CAPEC-153", "CAPEC-242"]
    );
    assert_eq!(index.capecs_for("CVE-2022-5678"), ["CAPEC-7"]);
    assert_eq!(index.capecs_for("CVE-2023-1234"), ["CAPEC-126"]);
}

#[test]
fn later_files_replace_earlier_mappings() {
    let root = tempfile::tempdir().unwrap();
    let db = root.path().join("db");
    fs::create_dir_all(&db).unwrap();
    fs::write(db.join("a.jsonl"), r#"{"CVE-2021-0001": {"CAPEC": ["1"]}}"#).unwrap();
    fs::write(db.join("b.jsonl"), r#"{"CVE-2021-0001": {"CAPEC": ["2"]}}"#).unwrap();

    let index = CveIndex::load_dir(&db).unwrap();
    assert_eq!(index.capecs_for("CVE-2021-0001"), ["CAPEC-2"]);
}

#[test]
fn missing_index_directory_is_empty() {
    let root = tempfile::tempdir().unwrap();
    let index = CveIndex::load_dir(root.path().join("absent")).unwrap();
    assert!(index.is_empty());
}

#[test]
fn definitions_load_from_file() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("cve_definitions.yml");
    fs::write(
        &path,
        r#"
WebServer:
  - CVE-2021-44228
  - CVE-2023-1234
"DatabaseServer ":
  - CVE-2022-5678
"#,
    )
    .unwrap();

    let defs = CveDefinitions::load(&path).unwrap();
    assert_eq!(defs.len(), 2);
    assert_eq!(
        defs.cves_for("WebServer"),
        ["CVE-2021-44228", "CVE-2023-1234"]
    );
    assert_eq!(defs.cves_for("DatabaseServer"), ["CVE-2022-5678"]);
}

#[test]
fn missing_default_definitions_are_empty() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("cve_definitions.yml");
    assert!(CveDefinitions::load_or_default(&path).unwrap().is_empty());
    assert!(matches!(
        CveDefinitions::load(&path),
        Err(ReferenceDataError::Io { .. })
    ));
}

#[test]
fn malformed_definitions_file_is_an_error() {
    let root = tempfile::tempdir().unwrap();
    let path = root.path().join("cve_definitions.yml");
    fs::write(&path, "WebServer: [CVE-2021-44228\n").unwrap();
    assert!(matches!(
        CveDefinitions::load_or_default(&path),
        Err(ReferenceDataError::Parse { .. })
    ));
}

#[test]
fn overrides_load_from_json_and_yaml() {
    let root = tempfile::tempdir().unwrap();
    let json = root.path().join("overrides.json");
    fs::write(
        &json,
        r#"{
            "repudiation": [
                {"id": "T1000", "name": "Custom Technique", "tactics": ["initial_access"]}
            ]
        }"#,
    )
    .unwrap();
    let yaml = root.path().join("overrides.yaml");
    fs::write(
        &yaml,
        r"
repudiation:
  - id: T1000
    name: Custom Technique
    tactics: [initial_access]
",
    )
    .unwrap();

    let from_json = MappingOverrides::load(&json).unwrap();
    let from_yaml = MappingOverrides::load(&yaml).unwrap();
    assert_eq!(from_json, from_yaml);
    assert_eq!(
        from_json.for_category(StrideCategory::Repudiation)[0].id,
        "T1000"
    );
}
