
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use serde::Deserialize;

// Rasa-style NLU file:
//
// nlu:
//   - synonym: Kopfweh
//     examples: |
//       - Kopfschmerzen
//       - Schädelschmerzen
#[derive(Debug, Deserialize)]
struct SynonymFile {
    nlu: Vec<SynonymRecord>,
}

#[derive(Debug, Deserialize)]
struct SynonymRecord {
    synonym: String,
    examples: String,
}

/// Key-items and their synonym phrases, in file order.
#[derive(Debug, Clone, Default)]
pub struct SynonymDictionary {
    map: IndexMap<String, Vec<String>>,
}

impl SynonymDictionary {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read synonyms {}", path.display()))?;
        Self::from_yaml_str(&raw).with_context(|| format!("invalid synonyms file {}", path.display()))
    }

    pub fn from_yaml_str(raw: &str) -> anyhow::Result<Self> {
        let file: SynonymFile = serde_yaml::from_str(raw).context("malformed synonyms YAML")?;

        let mut map = IndexMap::with_capacity(file.nlu.len());
        for record in file.nlu {
            // A repeated key keeps its first position, last examples win.
            map.insert(record.synonym, parse_examples(&record.examples));
        }

        log::debug!("Parsed {} synonym entries", map.len());
        Ok(Self { map })
    }

    pub fn get(&self, key_item: &str) -> Option<&[String]> {
        self.map.get(key_item).map(Vec::as_slice)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Split a newline-separated examples block into phrases, dropping bullet markers and blanks.
fn parse_examples(examples: &str) -> Vec<String> {
    examples
        .split('\n')
        .map(|line| line.trim_start_matches(['-', ' ']).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
nlu:
  - synonym: Kopfweh
    examples: |
      - Kopfschmerzen
      - Schädelschmerzen
  - synonym: Haarsprechstunde
    examples: |
      - Haarausfall

      -   Haarberatung
"#;

    #[test]
    fn test_from_yaml_str_strips_bullets_and_blanks() {
        let dict = SynonymDictionary::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.get("Kopfweh").unwrap(), ["Kopfschmerzen", "Schädelschmerzen"]);
        assert_eq!(dict.get("Haarsprechstunde").unwrap(), ["Haarausfall", "Haarberatung"]);
        assert!(dict.get("Rückenschmerzen").is_none());
    }

    #[test]
    fn test_keys_in_file_order() {
        let dict = SynonymDictionary::from_yaml_str(SAMPLE).unwrap();
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["Kopfweh", "Haarsprechstunde"]);
    }

    #[test]
    fn test_duplicate_key_last_examples_win() {
        let raw = "nlu:\n  - synonym: a\n    examples: \"- x\"\n  - synonym: b\n    examples: \"- y\"\n  - synonym: a\n    examples: \"- z\"\n";
        let dict = SynonymDictionary::from_yaml_str(raw).unwrap();
        assert_eq!(dict.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(dict.get("a").unwrap(), ["z"]);
    }

    #[test]
    fn test_missing_required_key_is_error() {
        let raw = "nlu:\n  - intent: greet\n    examples: \"- hallo\"\n";
        assert!(SynonymDictionary::from_yaml_str(raw).is_err());
        assert!(SynonymDictionary::from_yaml_str("version: \"3.1\"\n").is_err());
    }

    #[test]
    fn test_parse_examples_inline_hyphen_kept() {
        assert_eq!(parse_examples("- Hals-Nasen-Ohren\n"), vec!["Hals-Nasen-Ohren"]);
    }

    #[test]
    fn test_load_missing_file() {
        let err = SynonymDictionary::load(Path::new("/nonexistent/synonyms.yml")).unwrap_err();
        assert!(format!("{err:#}").contains("synonyms.yml"));
    }
}
