use std::sync::Arc;

use log::debug;
use serde_json::Value;

use crate::bus::{BrowserEvent, EventHandler, HandlerReply};
use crate::exclusion::ExclusionSet;
use crate::store::{Completion, StatsSink};
use crate::types::{Increment, AD_STATS_MESSAGE};
use crate::url::{normalize_host, DIRECT_DOMAIN};

/// Category used when a report carries no `adType`.
pub const DEFAULT_AD_TYPE: &str = "Element";

/// Method label for every page-level element detection.
pub const ELEMENT_METHOD: &str = "Element/CSS";

/// Merges `AD_STATS` reports sent by content scripts.
///
/// The runtime message channel expects an answer; a valid report returns a
/// completion and the caller must keep the channel open until it resolves.
pub struct MessageProducer<S> {
    sink: S,
    exclusions: Arc<ExclusionSet>,
}

impl<S: StatsSink> MessageProducer<S> {
    pub fn new(sink: S, exclusions: Arc<ExclusionSet>) -> Self {
        Self { sink, exclusions }
    }

    /// Validate a raw runtime message. Anything that is not a well-formed,
    /// non-excluded `AD_STATS` report yields None.
    pub fn parse(&self, message: &Value) -> Option<Increment> {
        if message.get("type").and_then(Value::as_str) != Some(AD_STATS_MESSAGE) {
            return None;
        }

        let domain = message
            .get("domain")
            .and_then(Value::as_str)
            .filter(|d| !d.is_empty())?;
        if self.exclusions.contains_in(domain) {
            debug!("Skipping ad report from excluded domain '{}'", domain);
            return None;
        }

        // Missing, null and zero counts all report one element, as content
        // scripts have always sent them. Negative or non-numeric counts are
        // rejected.
        let count = match message.get("count") {
            None | Some(Value::Null) => 1,
            Some(value) => value
                .as_u64()
                .or_else(|| value.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))?
                .max(1),
        };

        let category = message
            .get("adType")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_AD_TYPE);

        Some(Increment {
            domain: normalize_host(domain).unwrap_or_else(|| DIRECT_DOMAIN.to_string()),
            category: category.to_string(),
            method: ELEMENT_METHOD.to_string(),
            count,
        })
    }

    /// Handle a runtime message. None means the message is not ours and
    /// the channel can be released immediately.
    pub fn on_message(&self, message: &Value) -> Option<Completion> {
        let inc = self.parse(message)?;
        Some(self.sink.submit_block(inc))
    }
}

impl<S: StatsSink> EventHandler for MessageProducer<S> {
    fn name(&self) -> &'static str {
        "message"
    }

    fn handle(&self, event: &BrowserEvent) -> HandlerReply {
        match event {
            BrowserEvent::Message { payload } => match self.on_message(payload) {
                Some(completion) => HandlerReply::Async(completion),
                None => HandlerReply::Ignored,
            },
            _ => HandlerReply::Ignored,
        }
    }
}
