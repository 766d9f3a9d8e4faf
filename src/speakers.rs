//! Speaker registry
//!
//! Maps human-readable `"speaker:style"` names to the numeric ids the
//! synthesis engine expects. Built once from the engine's speaker catalog
//! and read-only afterwards.

use crate::speech::SpeechService;
use crate::{Result, VvError};
use log::{debug, info};
use serde::Deserialize;
use std::collections::HashMap;

/// Numeric voice id assigned by the engine
pub type SpeakerId = u32;

/// One entry of the engine's speaker catalog
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Speaker {
    pub name: String,
    pub styles: Vec<Style>,
}

/// A speaking style of a [`Speaker`]
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Style {
    pub name: String,
    pub id: SpeakerId,
}

/// Immutable snapshot of speaker name to id mappings
#[derive(Debug, Clone, Default)]
pub struct SpeakerRegistry {
    ids: HashMap<String, SpeakerId>,
}

impl SpeakerRegistry {
    /// Fetch the catalog from the engine and build the registry
    ///
    /// Any failure is reported as [`VvError::ServiceUnavailable`].
    pub async fn load(service: &dyn SpeechService) -> Result<Self> {
        debug!("Fetching speaker catalog");
        let catalog = service.speakers().await.map_err(|e| match e {
            VvError::ServiceUnavailable(reason) => VvError::ServiceUnavailable(reason),
            other => VvError::ServiceUnavailable(other.to_string()),
        })?;

        let registry = Self::from_catalog(catalog);
        info!("Loaded {} speaker styles", registry.len());
        Ok(registry)
    }

    /// Build a registry from an already fetched catalog
    ///
    /// A name listed twice keeps the id seen last.
    pub fn from_catalog(catalog: impl IntoIterator<Item = Speaker>) -> Self {
        let mut ids = HashMap::new();
        for speaker in catalog {
            for style in speaker.styles {
                ids.insert(format!("{}:{}", speaker.name, style.name), style.id);
            }
        }
        Self { ids }
    }

    /// Look up the id for a `"speaker:style"` name
    pub fn resolve(&self, name: &str) -> Option<SpeakerId> {
        self.ids.get(name).copied()
    }

    /// All entries ordered by id, then name
    pub fn entries(&self) -> Vec<(&str, SpeakerId)> {
        let mut entries: Vec<_> = self.ids.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        entries.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        entries
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn speaker(name: &str, styles: &[(&str, SpeakerId)]) -> Speaker {
        Speaker {
            name: name.to_string(),
            styles: styles
                .iter()
                .map(|&(name, id)| Style {
                    name: name.to_string(),
                    id,
                })
                .collect(),
        }
    }

    #[test]
    fn test_keys_join_speaker_and_style() {
        let registry = SpeakerRegistry::from_catalog(vec![
            speaker("ずんだもん", &[("ノーマル", 3), ("あまあま", 1)]),
            speaker("四国めたん", &[("ノーマル", 2)]),
        ]);

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.resolve("ずんだもん:ノーマル"), Some(3));
        assert_eq!(registry.resolve("ずんだもん:あまあま"), Some(1));
        assert_eq!(registry.resolve("四国めたん:ノーマル"), Some(2));
        assert_eq!(registry.resolve("四国めたん"), None);
        assert_eq!(registry.resolve(""), None);
    }

    #[test]
    fn test_duplicate_name_last_wins() {
        let registry = SpeakerRegistry::from_catalog(vec![
            speaker("Alice", &[("Normal", 1)]),
            speaker("Alice", &[("Normal", 7)]),
        ]);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve("Alice:Normal"), Some(7));
    }

    #[test]
    fn test_entries_sorted_by_id() {
        let registry = SpeakerRegistry::from_catalog(vec![
            speaker("B", &[("x", 5)]),
            speaker("A", &[("y", 2), ("z", 9)]),
        ]);
        let entries = registry.entries();
        assert_eq!(entries, vec![("A:y", 2), ("B:x", 5), ("A:z", 9)]);
    }

    #[test]
    fn test_catalog_deserializes_and_ignores_extra_fields() {
        let json = r#"[
            {"name": "ずんだもん", "speaker_uuid": "abc", "version": "0.14.0",
             "styles": [{"name": "ノーマル", "id": 3, "type": "talk"}]}
        ]"#;
        let catalog: Vec<Speaker> = serde_json::from_str(json).unwrap();
        let registry = SpeakerRegistry::from_catalog(catalog);
        assert_eq!(registry.resolve("ずんだもん:ノーマル"), Some(3));
    }

    #[test]
    fn test_empty_registry() {
        let registry = SpeakerRegistry::default();
        assert!(registry.is_empty());
        assert_eq!(registry.resolve("ずんだもん:ノーマル"), None);
    }
}
