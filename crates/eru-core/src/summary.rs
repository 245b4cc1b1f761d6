//! Aggregations for the popup and admin panel

use serde::Serialize;

use crate::error::HostEnvironmentError;
use crate::types::{Counts, ProtectedSites, StatsRecord};

/// Rows per ranked list in the admin panel.
pub const DEFAULT_TOP_LIMIT: usize = 10;

/// One row of a ranked list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedEntry {
    pub label: String,
    pub value: u64,
}

/// Everything the admin panel renders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSummary {
    pub total_blocked: u64,
    pub protected_count: usize,
    pub category_count: usize,
    pub last_reset: u64,
    pub top_sites: Vec<RankedEntry>,
    pub protected_sites: Vec<RankedEntry>,
    pub ad_types: Vec<RankedEntry>,
    pub block_methods: Vec<RankedEntry>,
}

impl AdminSummary {
    pub fn build(stats: &StatsRecord, protected: &ProtectedSites, limit: usize) -> Self {
        Self {
            total_blocked: stats.total_blocked,
            protected_count: protected.len(),
            category_count: stats.by_category.len(),
            last_reset: stats.last_reset,
            top_sites: top_entries(&stats.by_domain, limit),
            protected_sites: top_entries(protected, limit),
            ad_types: top_entries(&stats.by_category, limit),
            block_methods: top_entries(&stats.by_method, limit),
        }
    }
}

/// Highest counts first, ties broken by label.
pub fn top_entries(counts: &Counts, limit: usize) -> Vec<RankedEntry> {
    let mut entries: Vec<(&String, &u64)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
    entries
        .into_iter()
        .take(limit)
        .map(|(label, value)| RankedEntry {
            label: label.clone(),
            value: *value,
        })
        .collect()
}

/// Format a counter with thousands separators (`1234567` -> `1,234,567`).
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

/// The admin panel needs host storage; without it the user opened the page
/// directly and must be told how to reach it.
pub fn check_host_environment(storage_available: bool) -> Result<(), HostEnvironmentError> {
    if storage_available {
        Ok(())
    } else {
        Err(HostEnvironmentError {
            title: "Open from extension",
            message: "This admin panel must be opened from the extension popup. \
                      Click the Eru Ad Blocker icon, then Open Admin Panel.",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Increment;

    fn counts(entries: &[(&str, u64)]) -> Counts {
        entries.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_top_entries_order_and_limit() {
        let ranked = top_entries(&counts(&[("b.com", 3), ("a.com", 3), ("c.com", 9), ("d.com", 1)]), 3);
        let labels: Vec<_> = ranked.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["c.com", "a.com", "b.com"]);
        assert!(top_entries(&Counts::new(), 10).is_empty());
    }

    #[test]
    fn test_build_summary() {
        let mut stats = StatsRecord::empty(99);
        stats.apply(&Increment {
            domain: "foo.com".into(),
            category: "Display".into(),
            method: "Script".into(),
            count: 2,
        });
        stats.apply(&Increment {
            domain: "bar.com".into(),
            category: "Native".into(),
            method: "Element/CSS".into(),
            count: 5,
        });
        let protected = counts(&[("foo.com", 1)]);

        let summary = AdminSummary::build(&stats, &protected, DEFAULT_TOP_LIMIT);
        assert_eq!(summary.total_blocked, 7);
        assert_eq!(summary.protected_count, 1);
        assert_eq!(summary.category_count, 2);
        assert_eq!(summary.top_sites[0], RankedEntry { label: "bar.com".into(), value: 5 });

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["blockMethods"][0]["label"], "Element/CSS");
        assert_eq!(value["lastReset"], 99);
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(1234567), "1,234,567");
    }

    #[test]
    fn test_host_environment() {
        assert!(check_host_environment(true).is_ok());
        let err = check_host_environment(false).unwrap_err();
        assert_eq!(err.title, "Open from extension");
        assert!(err.to_string().starts_with("Open from extension: "));
    }
}
