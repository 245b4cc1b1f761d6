//! Core type definitions for Eru
//!
//! These types map directly to the persisted storage layout and to the
//! event payloads the host platform hands to the producers. Field names on
//! the wire are camelCase to stay compatible with records written by the
//! extension's JavaScript side.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// =============================================================================
// Scheme Masks
// =============================================================================

bitflags::bitflags! {
    /// URL scheme mask. Schemes other than http(s) map to the empty mask.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SchemeMask: u8 {
        const HTTP = 1 << 0;
        const HTTPS = 1 << 1;
        /// Schemes a tab navigation must use to count as protected
        const WEB = Self::HTTP.bits() | Self::HTTPS.bits();
    }
}

// =============================================================================
// Storage Keys
// =============================================================================

/// Top-level keys in the durable key-value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StorageKey {
    /// The aggregate block statistics record
    Stats,
    /// The protected-sites map
    Protected,
}

impl StorageKey {
    pub const ALL: [StorageKey; 2] = [StorageKey::Stats, StorageKey::Protected];

    pub fn as_str(self) -> &'static str {
        match self {
            StorageKey::Stats => "stats",
            StorageKey::Protected => "protected",
        }
    }
}

// =============================================================================
// Stats Record
// =============================================================================

/// Mapping from a label (host, category, method) to a counter.
pub type Counts = BTreeMap<String, u64>;

/// Hosts the extension has intercepted traffic for, with activation counts.
pub type ProtectedSites = Counts;

/// The persisted aggregate of every block event.
///
/// `total_blocked` is not required to equal the sum of any breakdown; the
/// breakdowns are only guaranteed to move together with the total for the
/// same event.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StatsRecord {
    #[serde(deserialize_with = "lenient::counter")]
    pub total_blocked: u64,
    #[serde(deserialize_with = "lenient::counts")]
    pub by_domain: Counts,
    /// Ad category breakdown, stored as `byType`.
    #[serde(rename = "byType", deserialize_with = "lenient::counts")]
    pub by_category: Counts,
    /// Detection method breakdown, stored as `byRule`.
    #[serde(rename = "byRule", deserialize_with = "lenient::counts")]
    pub by_method: Counts,
    /// Milliseconds since the Unix epoch.
    #[serde(deserialize_with = "lenient::counter")]
    pub last_reset: u64,
}

impl StatsRecord {
    /// A zeroed record stamped with the given reset time.
    pub fn empty(now_ms: u64) -> Self {
        Self {
            last_reset: now_ms,
            ..Self::default()
        }
    }

    /// Apply all four counters of one increment.
    pub fn apply(&mut self, inc: &Increment) {
        self.total_blocked = self.total_blocked.saturating_add(inc.count);
        bump(&mut self.by_domain, &inc.domain, inc.count);
        bump(&mut self.by_category, &inc.category, inc.count);
        bump(&mut self.by_method, &inc.method, inc.count);
    }

    /// True when every counter and mapping is empty.
    pub fn is_zeroed(&self) -> bool {
        self.total_blocked == 0
            && self.by_domain.is_empty()
            && self.by_category.is_empty()
            && self.by_method.is_empty()
    }
}

/// Increment a counter, creating the key on first occurrence.
pub fn bump(counts: &mut Counts, key: &str, by: u64) {
    match counts.get_mut(key) {
        Some(value) => *value = value.saturating_add(by),
        None => {
            counts.insert(key.to_string(), by);
        }
    }
}

/// One already-filtered, already-normalized block event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increment {
    /// Normalized host key
    pub domain: String,
    /// Ad category label
    pub category: String,
    /// Detection method label
    pub method: String,
    pub count: u64,
}

// =============================================================================
// Inbound Event Contracts
// =============================================================================

/// A declarative rule match reported by the host platform.
///
/// Every field is optional and `request` or `rule` may be null; a match with
/// nothing usable still counts under the `direct` domain and the `Other`
/// category. Fields of the wrong type still fail the whole event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleMatchInfo {
    #[serde(deserialize_with = "lenient::or_default")]
    pub request: MatchedRequest,
    #[serde(deserialize_with = "lenient::or_default")]
    pub rule: MatchedRule,
}

/// Request half of a rule match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchedRequest {
    /// Origin of the document that issued the request
    pub initiator: Option<String>,
    pub url: Option<String>,
    /// Browser resource type (`script`, `image`, ...)
    #[serde(rename = "type")]
    pub resource_type: Option<String>,
}

/// Rule half of a rule match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchedRule {
    #[serde(rename = "ruleId")]
    pub rule_id: Option<i64>,
}

/// Message tag the content script uses for ad element reports.
pub const AD_STATS_MESSAGE: &str = "AD_STATS";

/// Ad element report sent from a page to the background context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub domain: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ad_type: Option<String>,
}

impl ContentMessage {
    pub fn ad_stats(domain: impl Into<String>, count: u64, ad_type: impl Into<String>) -> Self {
        Self {
            kind: AD_STATS_MESSAGE.to_string(),
            domain: domain.into(),
            count: Some(count),
            ad_type: Some(ad_type.into()),
        }
    }
}

/// Tab navigation status carried by a tab update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabChangeInfo {
    pub status: Option<String>,
}

/// The subset of tab state the tab producer needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabInfo {
    pub url: Option<String>,
}

/// Status value of a finished navigation.
pub const TAB_STATUS_COMPLETE: &str = "complete";

// =============================================================================
// Lenient Deserialization
// =============================================================================

fn as_count(value: &serde_json::Value) -> Option<u64> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        _ => None,
    }
}

/// Read a `{label: count}` object, skipping entries that are not
/// non-negative numbers. Anything other than an object yields an empty map.
pub fn counts_from_value(value: &serde_json::Value) -> Counts {
    let mut counts = Counts::new();
    if let serde_json::Value::Object(map) = value {
        for (key, value) in map {
            if let Some(count) = as_count(value) {
                counts.insert(key.clone(), count);
            }
        }
    }
    counts
}

/// Stored records may have been written by older builds or by hand; missing,
/// null or non-numeric values degrade to zero instead of failing the read.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use super::{as_count, counts_from_value, Counts};

    pub fn counter<'de, D: Deserializer<'de>>(de: D) -> Result<u64, D::Error> {
        let value = Value::deserialize(de)?;
        Ok(as_count(&value).unwrap_or(0))
    }

    pub fn counts<'de, D: Deserializer<'de>>(de: D) -> Result<Counts, D::Error> {
        let value = Value::deserialize(de)?;
        Ok(counts_from_value(&value))
    }

    pub fn or_default<'de, D, T>(de: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: Deserialize<'de> + Default,
    {
        Ok(Option::<T>::deserialize(de)?.unwrap_or_default())
    }
}
