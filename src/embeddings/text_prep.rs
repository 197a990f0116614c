// text_prep.rs: Builds the strings that get embedded.

use crate::config;

/// Join every synonym of a key-item into a single cluster text, embedded as one unit.
///
/// Phrases are joined verbatim; an empty list yields an empty string, which the cluster pass
/// refuses to embed.
pub fn synonym_cluster_text<S: AsRef<str>>(synonyms: &[S]) -> String {
    synonyms
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(config::matching::CLUSTER_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synonym_cluster_text_space_joined() {
        let syns = vec!["Kopfschmerzen".to_string(), "Schädelschmerzen".to_string()];
        assert_eq!(synonym_cluster_text(&syns), "Kopfschmerzen Schädelschmerzen");
    }

    #[test]
    fn test_synonym_cluster_text_empty() {
        let syns: Vec<String> = vec![];
        assert_eq!(synonym_cluster_text(&syns), "");
        assert_eq!(synonym_cluster_text(&["einzeln"]), "einzeln");
    }
}
