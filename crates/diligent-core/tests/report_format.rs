//! Wire format of report.json and catalog files.

use diligent_core::{
    read_report_json, write_report_json, AnalysisItem, OsChecks, OsFamily, Report,
};
use serde_json::{json, Value};

fn flagged_tree() -> Report {
    let mut child = AnalysisItem::new("Who owns port 4444?", "lsof -i :4444");
    child.flagged = true;
    child.description = "nc is listening".to_string();
    child.alert = Some("Possible reverse shell".to_string());
    child.raw_output = Some("nc 123 root".to_string());

    let mut root = AnalysisItem::new("Identify unusual connections.", "netstat -an");
    root.flagged = true;
    root.description = "Unexpected listener".to_string();
    root.raw_output = Some("tcp4 *.4444 LISTEN".to_string());
    root.follow_ups.push(child);

    let mut clean = AnalysisItem::new("Check encryption.", "fdesetup status");
    clean.description = "FileVault is On.".to_string();
    clean.raw_output = Some("FileVault is On.".to_string());

    Report::new(vec![root, clean])
}

#[test]
fn test_report_field_names() {
    let value = serde_json::to_value(flagged_tree()).unwrap();
    let root = &value["items"][0];

    assert_eq!(root["prompt"], "Identify unusual connections.");
    assert_eq!(root["command"], "netstat -an");
    assert_eq!(root["flagged"], true);
    assert_eq!(root["description"], "Unexpected listener");
    assert_eq!(root["raw_output"], "tcp4 *.4444 LISTEN");
    assert_eq!(root["follow_ups"][0]["alert"], "Possible reverse shell");
}

#[test]
fn test_empty_optional_fields_are_omitted() {
    let value = serde_json::to_value(flagged_tree()).unwrap();
    let clean = value["items"][1].as_object().unwrap();

    assert!(!clean.contains_key("alert"));
    assert!(!clean.contains_key("follow_ups"));
    assert_eq!(clean["flagged"], false);
}

#[test]
fn test_legacy_description_key_is_accepted() {
    let raw = json!({
        "items": [{
            "prompt": "p",
            "command": "c",
            "flagged": true,
            "analysis_description": "old name"
        }]
    });

    let report: Report = serde_json::from_value(raw).unwrap();
    assert_eq!(report.items[0].description, "old name");

    let written = serde_json::to_value(&report).unwrap();
    assert_eq!(written["items"][0]["description"], "old name");
    assert!(written["items"][0].get("analysis_description").is_none());
}

#[test]
fn test_report_file_roundtrip_preserves_tree() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.json");
    let report = flagged_tree();

    write_report_json(&path, &report).unwrap();
    let back = read_report_json(&path).unwrap();

    assert_eq!(back, report);
    assert_eq!(back.max_depth(), 1);
    assert_eq!(back.flagged_count(), 2);
    assert_eq!(back.alerts(), vec!["Possible reverse shell"]);
}

#[test]
fn test_catalog_file_uses_os_keys() {
    let raw = r#"{
        "macOS": [{"command": "fdesetup status", "prompt": "Check FileVault."}],
        "linux": [
            {"command": "last -n 5", "prompt": "Recent logins."},
            {"command": "", "prompt": "Placeholder with no command."}
        ]
    }"#;

    let catalog = OsChecks::from_json(raw).unwrap();
    assert_eq!(catalog.for_os(OsFamily::MacOs).len(), 1);
    assert_eq!(catalog.for_os(OsFamily::Linux).len(), 2);
    assert!(catalog.for_os(OsFamily::Windows).is_empty());

    let value: Value = serde_json::to_value(&catalog).unwrap();
    assert_eq!(value["macOS"][0]["command"], "fdesetup status");
}
