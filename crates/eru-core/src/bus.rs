//! Typed event dispatcher
//!
//! Producers register as handlers instead of hooking the host platform's
//! listener APIs directly. The bindings (or a replay tool) translate raw
//! platform callbacks into [`BrowserEvent`]s and dispatch them here.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::classify::Classifier;
use crate::exclusion::ExclusionSet;
use crate::producers::{MessageProducer, RuleMatchProducer, TabProducer};
use crate::store::{Completion, StatsSink};
use crate::types::{RuleMatchInfo, TabChangeInfo, TabInfo};

/// Every host platform event the producers care about.
///
/// Tagged with an `event` field so event logs can be stored as NDJSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum BrowserEvent {
    /// A declarative network rule matched a request
    RuleMatched(RuleMatchInfo),
    /// A runtime message from another execution context
    Message { payload: Value },
    /// A tab changed state
    TabUpdated {
        #[serde(rename = "tabId", default)]
        tab_id: i32,
        #[serde(rename = "changeInfo", default)]
        change_info: TabChangeInfo,
        #[serde(default)]
        tab: TabInfo,
    },
}

/// What a handler did with an event.
#[derive(Debug)]
pub enum HandlerReply {
    /// Not for this handler
    Ignored,
    /// Fire-and-forget write submitted
    Handled(Completion),
    /// The sender is waiting for a reply; keep its channel open until the
    /// completion resolves
    Async(Completion),
}

pub trait EventHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn handle(&self, event: &BrowserEvent) -> HandlerReply;
}

/// Result of dispatching one event to every handler.
#[derive(Debug, Default)]
pub struct Dispatch {
    handled: usize,
    keep_channel_open: bool,
    completions: Vec<Completion>,
}

impl Dispatch {
    /// True if any handler will answer asynchronously.
    pub fn keep_channel_open(&self) -> bool {
        self.keep_channel_open
    }

    pub fn handled(&self) -> usize {
        self.handled
    }

    /// Wait for every submitted write. True if at least one write was
    /// submitted and all of them were applied.
    pub fn wait(self) -> bool {
        let mut any = false;
        let mut all = true;
        for completion in self.completions {
            any = true;
            all &= completion.wait();
        }
        any && all
    }
}

#[derive(Default)]
pub struct EventBus {
    handlers: Vec<Box<dyn EventHandler>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bus with the three standard producers writing into `sink`.
    pub fn with_producers<S>(sink: S, exclusions: Arc<ExclusionSet>, classifier: Arc<Classifier>) -> Self
    where
        S: StatsSink + Clone + 'static,
    {
        let mut bus = Self::new();
        bus.register(RuleMatchProducer::new(sink.clone(), Arc::clone(&exclusions), classifier))
            .register(MessageProducer::new(sink.clone(), Arc::clone(&exclusions)))
            .register(TabProducer::new(sink, exclusions));
        bus
    }

    pub fn register<H: EventHandler + 'static>(&mut self, handler: H) -> &mut Self {
        log::debug!("Registered {} handler", handler.name());
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn dispatch(&self, event: &BrowserEvent) -> Dispatch {
        let mut dispatch = Dispatch::default();
        for handler in &self.handlers {
            match handler.handle(event) {
                HandlerReply::Ignored => {}
                HandlerReply::Handled(completion) => {
                    dispatch.handled += 1;
                    dispatch.completions.push(completion);
                }
                HandlerReply::Async(completion) => {
                    dispatch.handled += 1;
                    dispatch.keep_channel_open = true;
                    dispatch.completions.push(completion);
                }
            }
        }
        dispatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBackend, StatsStore};
    use serde_json::json;

    fn setup() -> (Arc<StatsStore<MemoryBackend>>, EventBus) {
        let exclusions = Arc::new(ExclusionSet::default());
        let store = Arc::new(StatsStore::new(MemoryBackend::new(), Arc::clone(&exclusions)));
        let bus = EventBus::with_producers(Arc::clone(&store), exclusions, Arc::new(Classifier::default()));
        (store, bus)
    }

    fn parse(line: &str) -> BrowserEvent {
        serde_json::from_str(line).unwrap()
    }

    #[test]
    fn test_event_wire_format() {
        let event = parse(r#"{"event": "ruleMatched", "request": {"initiator": "https://www.foo.com", "type": "script"}, "rule": {"ruleId": 1}}"#);
        assert!(matches!(&event, BrowserEvent::RuleMatched(info) if info.rule.rule_id == Some(1)));

        let event = parse(r#"{"event": "tabUpdated", "tabId": 4, "changeInfo": {"status": "complete"}, "tab": {"url": "https://a.com"}}"#);
        assert!(matches!(event, BrowserEvent::TabUpdated { tab_id: 4, .. }));

        let event = parse(r#"{"event": "message", "payload": {"type": "AD_STATS", "domain": "a.com"}}"#);
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["event"], "message");
        assert_eq!(value["payload"]["domain"], "a.com");
    }

    #[test]
    fn test_dispatch_routes_each_event() {
        let (store, bus) = setup();
        assert_eq!(bus.len(), 3);

        let rule = bus.dispatch(&parse(r#"{"event": "ruleMatched", "request": {"initiator": "https://www.foo.com", "type": "script"}, "rule": {"ruleId": 1}}"#));
        assert_eq!(rule.handled(), 1);
        assert!(!rule.keep_channel_open());
        assert!(rule.wait());

        let message = bus.dispatch(&BrowserEvent::Message {
            payload: json!({"type": "AD_STATS", "domain": "www.bar.com", "count": 3, "adType": "Native"}),
        });
        assert!(message.keep_channel_open());
        assert!(message.wait());

        let tab = bus.dispatch(&parse(r#"{"event": "tabUpdated", "tabId": 1, "changeInfo": {"status": "complete"}, "tab": {"url": "https://news.example.com/a"}}"#));
        assert!(tab.wait());

        let record = store.read();
        assert_eq!(record.total_blocked, 4);
        assert_eq!(record.by_domain["foo.com"], 1);
        assert_eq!(record.by_domain["bar.com"], 3);
        assert_eq!(store.read_protected()["news.example.com"], 1);
    }

    #[test]
    fn test_foreign_message_releases_channel() {
        let (store, bus) = setup();
        let dispatch = bus.dispatch(&BrowserEvent::Message { payload: json!({"type": "GET_SETTINGS"}) });
        assert!(!dispatch.keep_channel_open());
        assert_eq!(dispatch.handled(), 0);
        assert!(!dispatch.wait());
        assert!(store.read().is_zeroed());
    }
}
