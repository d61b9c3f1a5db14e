//! CVE bridges
//!
//! - [`CveIndex`]: CVE id → CAPEC ids, loaded from a directory of JSON-lines
//!   files (one object per line, `{"CVE-2021-44228": {"CAPEC": ["153"]}}`)
//! - [`CveDefinitions`]: target name → declared CVE ids, loaded from YAML
//!
//! Missing sources degrade to empty tables with a warning; nothing here is
//! fatal except a malformed definitions document.

use crate::error::ReferenceDataError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

static CVE_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^CVE-\d{4}-\d{4,}$").expect("valid regex"));

/// Canonical CVE id, or `None` if the input is not one
#[must_use]
pub fn normalize_cve(raw: &str) -> Option<String> {
    let candidate = raw.trim().to_ascii_uppercase();
    CVE_ID.is_match(&candidate).then_some(candidate)
}

/// Canonical CAPEC id: bare numbers gain the `CAPEC-` prefix
#[must_use]
pub fn capec_id(raw: &str) -> String {
    let raw = raw.trim();
    match raw.get(..6) {
        Some(prefix) if prefix.eq_ignore_ascii_case("CAPEC-") => format!("CAPEC-{}", &raw[6..]),
        _ => format!("CAPEC-{raw}"),
    }
}

/// Push items not already present, keeping first-seen order
fn extend_unique(target: &mut Vec<String>, items: impl IntoIterator<Item = String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// One decoded JSON-lines record
#[derive(Debug, Deserialize)]
struct CveRecord {
    #[serde(rename = "CAPEC", default)]
    capec: Vec<serde_json::Value>,
}

/// CVE → CAPEC lookup table
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CveIndex {
    entries: BTreeMap<String, Vec<String>>,
}

impl CveIndex {
    /// Create empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a CVE to CAPEC ids, replacing any previous mapping
    ///
    /// An empty CAPEC list leaves the index untouched.
    pub fn insert<I, S>(&mut self, cve: &str, capecs: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut ids = Vec::new();
        extend_unique(&mut ids, capecs.into_iter().map(|c| capec_id(c.as_ref())));
        if !ids.is_empty() {
            self.entries.insert(cve.trim().to_string(), ids);
        }
    }

    /// Builder-style insert
    #[must_use]
    pub fn with<I, S>(mut self, cve: &str, capecs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert(cve, capecs);
        self
    }

    /// CAPEC ids for a CVE, in declared order
    #[must_use]
    pub fn capecs_for(&self, cve: &str) -> &[String] {
        self.entries.get(cve.trim()).map_or(&[], Vec::as_slice)
    }

    /// Number of mapped CVEs
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if no CVE is mapped
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Merge JSON-lines text into the index
    ///
    /// Lines that fail to decode are skipped with a warning. Returns the
    /// number of records merged.
    pub fn merge_jsonl(&mut self, text: &str, origin: &str) -> usize {
        let mut merged = 0;
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match serde_json::from_str::<BTreeMap<String, CveRecord>>(line) {
                Ok(records) => {
                    for (cve, record) in records {
                        let ids: Vec<String> = record
                            .capec
                            .iter()
                            .filter_map(|value| match value {
                                serde_json::Value::String(s) => Some(s.clone()),
                                serde_json::Value::Number(n) => Some(n.to_string()),
                                _ => None,
                            })
                            .collect();
                        if !ids.is_empty() {
                            self.insert(&cve, ids);
                            merged += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("Could not decode line in {}: {} ({})", origin, line, e);
                }
            }
        }
        merged
    }

    /// Load every `*.jsonl` file in a directory, in sorted path order
    ///
    /// A missing directory yields an empty index. Unreadable files are
    /// skipped with a warning.
    ///
    /// # Errors
    /// Returns [`ReferenceDataError::Io`] if the directory exists but cannot
    /// be listed
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self, ReferenceDataError> {
        let dir = dir.as_ref();
        let mut index = Self::new();
        if !dir.is_dir() {
            tracing::warn!(
                "CVE to CAPEC directory not found at {}; CVEs cannot be mapped",
                dir.display()
            );
            return Ok(index);
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| ReferenceDataError::io(dir, e))?
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "jsonl"))
            .collect();
        files.sort();

        for path in files {
            match std::fs::read_to_string(&path) {
                Ok(text) => {
                    index.merge_jsonl(&text, &path.display().to_string());
                }
                Err(e) => tracing::warn!("Skipping unreadable {}: {}", path.display(), e),
            }
        }

        tracing::info!("Loaded {} CVE to CAPEC mappings", index.len());
        Ok(index)
    }
}

/// Declared CVEs per target name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CveDefinitions {
    by_target: BTreeMap<String, Vec<String>>,
}

impl CveDefinitions {
    /// Create empty definitions
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare CVEs on a target
    ///
    /// Target names are trimmed. Ids that are not CVE identifiers are dropped
    /// with a warning.
    pub fn insert<I, S>(&mut self, target: &str, cves: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let target = target.trim();
        let valid = cves.into_iter().filter_map(|raw| {
            let raw = raw.as_ref();
            let id = normalize_cve(raw);
            if id.is_none() {
                tracing::warn!("Ignoring invalid CVE id '{}' declared on '{}'", raw, target);
            }
            id
        });
        let entry = self.by_target.entry(target.to_string()).or_default();
        extend_unique(entry, valid);
    }

    /// Builder-style insert
    #[must_use]
    pub fn with<I, S>(mut self, target: &str, cves: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.insert(target, cves);
        self
    }

    /// CVEs declared on a target
    #[must_use]
    pub fn cves_for(&self, target: &str) -> &[String] {
        self.by_target.get(target.trim()).map_or(&[], Vec::as_slice)
    }

    /// Iterate targets and their CVEs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.by_target
            .iter()
            .map(|(target, cves)| (target.as_str(), cves.as_slice()))
    }

    /// Number of targets with declarations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_target.len()
    }

    /// Check if nothing is declared
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_target.is_empty()
    }

    /// Parse a YAML mapping of target name to CVE list
    ///
    /// # Errors
    /// Returns [`ReferenceDataError::Parse`] for malformed YAML
    pub fn from_yaml_str(yaml: &str, origin: &str) -> Result<Self, ReferenceDataError> {
        let raw: Option<BTreeMap<String, Option<Vec<String>>>> =
            serde_yaml::from_str(yaml).map_err(|e| ReferenceDataError::parse(origin, e))?;
        let mut definitions = Self::new();
        for (target, cves) in raw.unwrap_or_default() {
            definitions.insert(&target, cves.unwrap_or_default());
        }
        Ok(definitions)
    }

    /// Load definitions from an explicit path
    ///
    /// # Errors
    /// Returns [`ReferenceDataError::Io`] if the file cannot be read, or
    /// [`ReferenceDataError::Parse`] for malformed YAML
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ReferenceDataError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ReferenceDataError::io(path, e))?;
        Self::from_yaml_str(&text, &path.display().to_string())
    }

    /// Load definitions from a default location that may not exist
    ///
    /// # Errors
    /// Same as [`CveDefinitions::load`], except a missing file yields empty
    /// definitions
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ReferenceDataError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::warn!(
                "Default CVE definitions file not found at {}; CVE bridging disabled",
                path.display()
            );
            return Ok(Self::new());
        }
        Self::load(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cve_ids_are_validated() {
        assert_eq!(
            normalize_cve(" cve-2021-44228 "),
            Some("CVE-2021-44228".to_string())
        );
        assert_eq!(normalize_cve("CVE-2021-123"), None);
        assert_eq!(normalize_cve("GHSA-xxxx"), None);
    }

    #[test]
    fn capec_ids_are_prefixed_once() {
        assert_eq!(capec_id("153"), "CAPEC-153");
        assert_eq!(capec_id("CAPEC-153"), "CAPEC-153");
        assert_eq!(capec_id("capec-7"), "CAPEC-7");
    }

    #[test]
    fn jsonl_merge_prefixes_and_skips_bad_lines() {
        let mut index = CveIndex::new();
        let text = concat!(
            r#"{"CVE-2021-44228": {"CWE": ["502"], "CAPEC": ["153", "242"], "TECHNIQUES": []}}"#,
            "\n",
            "not json\n",
            r#"{"CVE-2022-0001": {"CAPEC": []}}"#,
            "\n",
            r#"{"CVE-2022-5678": {"CAPEC": [7]}}"#,
        );
        assert_eq!(index.merge_jsonl(text, "inline"), 2);
        assert_eq!(
            index.capecs_for("CVE-2021-44228"),
            ["CAPEC-153", "CAPEC-242"]
        );
        assert_eq!(index.capecs_for("CVE-2022-5678"), ["CAPEC-7"]);
        assert!(index.capecs_for("CVE-2022-0001").is_empty());
        assert!(index.capecs_for("NON_EXISTENT_CVE").is_empty());
    }

    #[test]
    fn definitions_trim_targets_and_drop_invalid_ids() {
        let yaml = r#"
WebServer:
  - CVE-2021-44228
  - CVE-2023-1234
"DatabaseServer ":
  - CVE-2022-5678
  - bogus
"#;
        let defs = CveDefinitions::from_yaml_str(yaml, "inline").unwrap();
        assert_eq!(
            defs.cves_for("WebServer"),
            ["CVE-2021-44228", "CVE-2023-1234"]
        );
        assert_eq!(defs.cves_for("  DatabaseServer  "), ["CVE-2022-5678"]);
        assert!(defs.cves_for("NonExistentEquipment").is_empty());
    }

    #[test]
    fn empty_definitions_document() {
        assert!(CveDefinitions::from_yaml_str("", "inline").unwrap().is_empty());
        let defs = CveDefinitions::from_yaml_str("WebServer:\n", "inline").unwrap();
        assert!(defs.cves_for("WebServer").is_empty());
    }

    #[test]
    fn malformed_definitions_are_parse_errors() {
        let err = CveDefinitions::from_yaml_str("WebServer: [CVE-2021-44228\n", "inline")
            .unwrap_err();
        assert!(matches!(err, ReferenceDataError::Parse { .. }));
    }
}
