use std::sync::Arc;

use log::debug;

use crate::bus::{BrowserEvent, EventHandler, HandlerReply};
use crate::classify::Classifier;
use crate::exclusion::ExclusionSet;
use crate::store::{Completion, StatsSink};
use crate::types::{Increment, RuleMatchInfo};
use crate::url::derive_domain;

/// Counts one block per declarative rule match.
pub struct RuleMatchProducer<S> {
    sink: S,
    exclusions: Arc<ExclusionSet>,
    classifier: Arc<Classifier>,
}

impl<S: StatsSink> RuleMatchProducer<S> {
    pub fn new(sink: S, exclusions: Arc<ExclusionSet>, classifier: Arc<Classifier>) -> Self {
        Self {
            sink,
            exclusions,
            classifier,
        }
    }

    /// Turn a match into an increment, or None if the initiator contains an
    /// excluded domain or the request URL carries an excluded URL marker.
    pub fn classify(&self, info: &RuleMatchInfo) -> Option<Increment> {
        let initiator = info.request.initiator.as_deref().unwrap_or("");
        let url = info.request.url.as_deref().unwrap_or("");
        if self.exclusions.contains_in(initiator) || self.exclusions.excludes_request_url(url) {
            return None;
        }

        Some(Increment {
            domain: derive_domain(Some(initiator), Some(url)),
            category: self.classifier.category_for(info.rule.rule_id).to_string(),
            method: self
                .classifier
                .method_for(info.request.resource_type.as_deref())
                .to_string(),
            count: 1,
        })
    }

    pub fn on_rule_matched(&self, info: &RuleMatchInfo) -> Completion {
        match self.classify(info) {
            Some(inc) => self.sink.submit_block(inc),
            None => {
                debug!("Skipping rule match from excluded domain");
                Completion::Ready(false)
            }
        }
    }
}

impl<S: StatsSink> EventHandler for RuleMatchProducer<S> {
    fn name(&self) -> &'static str {
        "rule-match"
    }

    fn handle(&self, event: &BrowserEvent) -> HandlerReply {
        match event {
            BrowserEvent::RuleMatched(info) => HandlerReply::Handled(self.on_rule_matched(info)),
            _ => HandlerReply::Ignored,
        }
    }
}
