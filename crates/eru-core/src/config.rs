//! Engine configuration
//!
//! Loaded once at startup from JSON. Every field is optional and defaults
//! to the tables bundled with the extension:
//!
//! ```json
//! {
//!   "excludedDomains": ["youtube.com", "youtu.be"],
//!   "excludedUrlMarkers": ["youtube"],
//!   "ruleCategories": { "1": "Display", "8": "Affiliate" },
//!   "resourceLabels": { "script": "Script" }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classify::{Classifier, DEFAULT_RESOURCE_LABELS, DEFAULT_RULE_CATEGORIES};
use crate::error::ConfigError;
use crate::exclusion::{ExclusionSet, DEFAULT_EXCLUDED_DOMAINS, DEFAULT_EXCLUDED_URL_MARKERS};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    pub excluded_domains: Vec<String>,
    /// Substrings that exclude a blocked request by its URL alone
    pub excluded_url_markers: Vec<String>,
    pub rule_categories: BTreeMap<u32, String>,
    pub resource_labels: BTreeMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            excluded_domains: DEFAULT_EXCLUDED_DOMAINS.iter().map(|d| d.to_string()).collect(),
            excluded_url_markers: DEFAULT_EXCLUDED_URL_MARKERS.iter().map(|m| m.to_string()).collect(),
            rule_categories: DEFAULT_RULE_CATEGORIES
                .iter()
                .map(|&(id, category)| (id, category.to_string()))
                .collect(),
            resource_labels: DEFAULT_RESOURCE_LABELS
                .iter()
                .map(|&(kind, label)| (kind.to_string(), label.to_string()))
                .collect(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON config. Absent fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read and parse a JSON config file.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_json(&text)?;
        log::debug!(
            "Loaded config from '{}': {} excluded domains, {} rule categories",
            path.display(),
            config.excluded_domains.len(),
            config.rule_categories.len()
        );
        Ok(config)
    }

    pub fn exclusion_set(&self) -> ExclusionSet {
        ExclusionSet::new(&self.excluded_domains).with_url_markers(&self.excluded_url_markers)
    }

    pub fn classifier(&self) -> Classifier {
        Classifier::new(
            self.rule_categories.iter().map(|(id, c)| (*id, c.clone())),
            self.resource_labels.iter().map(|(t, l)| (t.clone(), l.clone())),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_builtin_tables() {
        let config = EngineConfig::default();
        assert_eq!(config.exclusion_set(), ExclusionSet::default());
        assert_eq!(config.classifier(), Classifier::default());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(r#"{"ruleCategories": {"1": "Popunder", "41": "Crypto"}}"#).unwrap();
        assert_eq!(config.excluded_domains.len(), DEFAULT_EXCLUDED_DOMAINS.len());
        assert!(config.exclusion_set().excludes_request_url("https://youtube.com/embed"));
        let classifier = config.classifier();
        assert_eq!(classifier.category_for(Some(1)), "Popunder");
        assert_eq!(classifier.category_for(Some(41)), "Crypto");
        assert_eq!(classifier.category_for(Some(2)), "Other");
        assert_eq!(classifier.method_for(Some("script")), "Script");
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(EngineConfig::from_json("{"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            EngineConfig::from_json(r#"{"ruleCategories": {"abc": "X"}}"#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let err = EngineConfig::load(std::path::Path::new("/nonexistent/eru.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
