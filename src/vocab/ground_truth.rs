
use std::path::Path;

use anyhow::{bail, Context};
use serde_json::Value;

/// Load the ground-truth item names (e.g. a dumped catalog API response).
///
/// The file must hold a JSON list of strings; order and duplicates are kept as-is.
pub fn load_ground_truth(path: &Path) -> anyhow::Result<Vec<String>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read ground truth {}", path.display()))?;
    parse_ground_truth(&raw).with_context(|| format!("invalid ground truth {}", path.display()))
}

pub fn parse_ground_truth(raw: &str) -> anyhow::Result<Vec<String>> {
    let value: Value = serde_json::from_str(raw).context("malformed JSON")?;
    let Value::Array(entries) = value else {
        bail!("expected a JSON list of item names, got {}", json_kind(&value));
    };

    let mut items = Vec::with_capacity(entries.len());
    for (idx, entry) in entries.into_iter().enumerate() {
        match entry {
            Value::String(s) => items.push(s),
            other => bail!("item #{idx} is {}, expected a string", json_kind(&other)),
        }
    }

    log::debug!("Parsed {} ground-truth items", items.len());
    Ok(items)
}

fn json_kind(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_keeps_order_and_duplicates() {
        let items = parse_ground_truth(r#"["Rückenschmerzen", "Kopfschmerzen", "Kopfschmerzen"]"#).unwrap();
        assert_eq!(items, vec!["Rückenschmerzen", "Kopfschmerzen", "Kopfschmerzen"]);
    }

    #[test]
    fn test_parse_empty_list() {
        assert!(parse_ground_truth("[]").unwrap().is_empty());
    }

    #[test]
    fn test_parse_rejects_non_list() {
        let err = parse_ground_truth(r#"{"items": []}"#).unwrap_err();
        assert!(format!("{err:#}").contains("an object"));
    }

    #[test]
    fn test_parse_rejects_non_string_entry() {
        let err = parse_ground_truth(r#"["ok", 3]"#).unwrap_err();
        assert!(format!("{err:#}").contains("item #1"));
    }

    #[test]
    fn test_load_missing_file_names_path() {
        let err = load_ground_truth(Path::new("/nonexistent/ground_truth_entities.json")).unwrap_err();
        assert!(format!("{err:#}").contains("ground_truth_entities.json"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ground_truth_entities.json");
        std::fs::write(&path, r#"["Haarsprechstunde"]"#).unwrap();
        assert_eq!(load_ground_truth(&path).unwrap(), vec!["Haarsprechstunde"]);
    }
}
