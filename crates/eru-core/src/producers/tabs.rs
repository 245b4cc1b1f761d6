use std::sync::Arc;

use log::trace;

use crate::bus::{BrowserEvent, EventHandler, HandlerReply};
use crate::exclusion::ExclusionSet;
use crate::store::{Completion, StatsSink};
use crate::types::{SchemeMask, TabChangeInfo, TabInfo, TAB_STATUS_COMPLETE};
use crate::url::{extract_scheme, host_from_url};

/// Records which hosts the blocker is actively protecting.
pub struct TabProducer<S> {
    sink: S,
    exclusions: Arc<ExclusionSet>,
}

impl<S: StatsSink> TabProducer<S> {
    pub fn new(sink: S, exclusions: Arc<ExclusionSet>) -> Self {
        Self { sink, exclusions }
    }

    /// The host a finished http(s) navigation counts for, if any.
    pub fn protected_host(&self, change: &TabChangeInfo, tab: &TabInfo) -> Option<String> {
        if change.status.as_deref() != Some(TAB_STATUS_COMPLETE) {
            return None;
        }
        let url = tab.url.as_deref()?;
        if !extract_scheme(url).is_some_and(|scheme| SchemeMask::WEB.intersects(scheme)) {
            return None;
        }
        let host = host_from_url(url)?;
        if self.exclusions.matches_exact(&host) {
            return None;
        }
        Some(host)
    }

    pub fn on_tab_updated(&self, tab_id: i32, change: &TabChangeInfo, tab: &TabInfo) -> Completion {
        match self.protected_host(change, tab) {
            Some(host) => {
                trace!("Tab {} completed on {}", tab_id, host);
                self.sink.submit_visit(host)
            }
            None => Completion::Ready(false),
        }
    }
}

impl<S: StatsSink> EventHandler for TabProducer<S> {
    fn name(&self) -> &'static str {
        "tab-lifecycle"
    }

    fn handle(&self, event: &BrowserEvent) -> HandlerReply {
        match event {
            BrowserEvent::TabUpdated { tab_id, change_info, tab } => {
                HandlerReply::Handled(self.on_tab_updated(*tab_id, change_info, tab))
            }
            _ => HandlerReply::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryBackend, StatsStore};

    fn setup() -> (Arc<StatsStore<MemoryBackend>>, TabProducer<Arc<StatsStore<MemoryBackend>>>) {
        let exclusions = Arc::new(ExclusionSet::default());
        let store = Arc::new(StatsStore::new(MemoryBackend::new(), Arc::clone(&exclusions)));
        let producer = TabProducer::new(Arc::clone(&store), exclusions);
        (store, producer)
    }

    fn complete() -> TabChangeInfo {
        TabChangeInfo {
            status: Some("complete".to_string()),
        }
    }

    fn tab(url: &str) -> TabInfo {
        TabInfo {
            url: Some(url.to_string()),
        }
    }

    #[test]
    fn test_completed_navigation_counts() {
        let (store, producer) = setup();
        assert!(producer.on_tab_updated(1, &complete(), &tab("https://news.example.com/a")).wait());
        assert!(producer.on_tab_updated(2, &complete(), &tab("http://www.news.example.com/b")).wait());
        assert_eq!(store.read_protected()["news.example.com"], 2);
    }

    #[test]
    fn test_excluded_host_unchanged() {
        let (store, producer) = setup();
        assert!(!producer.on_tab_updated(1, &complete(), &tab("https://youtube.com/watch?v=x")).wait());
        assert!(!producer.on_tab_updated(1, &complete(), &tab("https://www.youtube.com/watch?v=x")).wait());
        assert!(store.read_protected().is_empty());
    }

    #[test]
    fn test_ignored_navigations() {
        let (store, producer) = setup();
        let loading = TabChangeInfo {
            status: Some("loading".to_string()),
        };
        assert!(producer.protected_host(&loading, &tab("https://example.com")).is_none());
        assert!(producer.protected_host(&TabChangeInfo::default(), &tab("https://example.com")).is_none());
        assert!(producer.protected_host(&complete(), &TabInfo::default()).is_none());
        assert!(producer.protected_host(&complete(), &tab("chrome://extensions")).is_none());
        assert!(producer.protected_host(&complete(), &tab("file:///home/user/a.html")).is_none());
        assert!(producer.protected_host(&complete(), &tab("ftp://files.example.com/a")).is_none());
        assert!(producer.protected_host(&complete(), &tab("wss://live.example.com/feed")).is_none());
        assert!(producer.protected_host(&complete(), &tab("HTTP://plain.example.com/")).is_some());
        assert!(producer.protected_host(&complete(), &tab("not a url")).is_none());
        producer.on_tab_updated(3, &loading, &tab("https://example.com"));
        assert!(store.read_protected().is_empty());
    }
}
