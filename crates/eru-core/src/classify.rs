//! Rule id and resource type lookup tables
//!
//! The category table is owned by whoever ships the declarative rule list;
//! it arrives as configuration (see [`crate::config::EngineConfig`]) and the
//! built-in defaults only mirror the rule list bundled with the extension.

use std::collections::HashMap;

/// Category used for rule ids with no table entry.
pub const DEFAULT_CATEGORY: &str = "Other";

/// Resource type assumed when a match does not report one.
pub const DEFAULT_RESOURCE_TYPE: &str = "other";

/// Category of the bundled rule list, indexed by rule id.
pub const DEFAULT_RULE_CATEGORIES: &[(u32, &str)] = &[
    (1, "Display"), (2, "Display"), (3, "Display"), (4, "Display"), (5, "Display"),
    (6, "Programmatic"), (7, "Programmatic"), (8, "Affiliate"), (9, "Retargeting"),
    (10, "Native"), (11, "Native"), (12, "Native"), (13, "Display"), (14, "Retargeting"),
    (15, "Programmatic"), (16, "Programmatic"), (17, "Programmatic"), (18, "Programmatic"),
    (19, "Analytics"), (20, "Tracking"), (21, "Verification"), (22, "Verification"),
    (23, "Social"), (24, "Social"), (25, "Social"), (26, "Social"), (27, "Programmatic"),
    (28, "Display"), (29, "Analytics"), (30, "Tracking"), (31, "Social"), (32, "Social"),
    (33, "Tracking"), (34, "Programmatic"), (35, "Programmatic"), (36, "Programmatic"),
    (37, "Programmatic"), (38, "Display"), (39, "Display"), (40, "Display"),
];

/// Human-readable method labels for browser resource types.
pub const DEFAULT_RESOURCE_LABELS: &[(&str, &str)] = &[
    ("script", "Script"),
    ("image", "Banner/Image"),
    ("xmlhttprequest", "XHR/Tracking"),
    ("sub_frame", "Iframe/Embed"),
    ("other", "Other"),
    ("media", "Video/Audio"),
];

/// Maps rule ids to ad categories and resource types to method labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classifier {
    rule_categories: HashMap<u32, String>,
    resource_labels: HashMap<String, String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_RULE_CATEGORIES.iter().map(|&(id, c)| (id, c.to_string())),
            DEFAULT_RESOURCE_LABELS.iter().map(|&(t, l)| (t.to_string(), l.to_string())),
        )
    }
}

impl Classifier {
    pub fn new<R, L>(rule_categories: R, resource_labels: L) -> Self
    where
        R: IntoIterator<Item = (u32, String)>,
        L: IntoIterator<Item = (String, String)>,
    {
        Self {
            rule_categories: rule_categories.into_iter().collect(),
            resource_labels: resource_labels.into_iter().collect(),
        }
    }

    /// Ad category for a matched rule, `Other` when unmapped or absent.
    pub fn category_for(&self, rule_id: Option<i64>) -> &str {
        rule_id
            .and_then(|id| u32::try_from(id).ok())
            .and_then(|id| self.rule_categories.get(&id))
            .map(String::as_str)
            .unwrap_or(DEFAULT_CATEGORY)
    }

    /// Method label for a resource type. Unmapped types pass through as-is.
    pub fn method_for<'a>(&'a self, resource_type: Option<&'a str>) -> &'a str {
        let resource_type = resource_type
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_RESOURCE_TYPE);
        self.resource_labels
            .get(resource_type)
            .map(String::as_str)
            .unwrap_or(resource_type)
    }

    pub fn rule_count(&self) -> usize {
        self.rule_categories.len()
    }
}
