//! Eru Core Library
//!
//! This crate provides the statistics aggregation core for the Eru ad blocker.
//! The host platform does the actual blocking with declarative network rules;
//! this crate counts what was blocked and where.
//!
//! # Architecture
//!
//! Three independent producers (network rule matches, content script reports,
//! tab navigations) feed a single [`StatsStore`]. Every event goes through the
//! same pipeline:
//!
//! ```text
//! raw event -> exclusion filter -> host normalization -> classification
//!           -> store merge (one batched write) -> change notification
//! ```
//!
//! The store performs each read-modify-write inside one critical section and
//! persists the whole record in one write, so readers never observe a
//! half-applied event. With the `native` feature a [`WriteQueue`] can funnel
//! all producers through a single writer thread.
//!
//! # Modules
//!
//! - `url`: Host extraction and normalization without a full URL parser
//! - `exclusion`: Domains that must never be counted
//! - `classify`: Rule id and resource type lookup tables
//! - `config`: Engine configuration loaded from JSON
//! - `store`: Storage backends and the stats store
//! - `notify`: Change notification fan-out
//! - `queue`: Single-writer coordinator (native only)
//! - `producers`: Rule match, runtime message and tab lifecycle producers
//! - `bus`: Typed event dispatcher the producers register against
//! - `detect`: Page-level ad element detection
//! - `summary`: Aggregations for the admin panel and popup
//! - `types`: Shared type definitions

pub mod bus;
pub mod classify;
pub mod config;
pub mod detect;
pub mod error;
pub mod exclusion;
pub mod notify;
pub mod producers;
#[cfg(feature = "native")]
pub mod queue;
pub mod store;
pub mod summary;
pub mod types;
pub mod url;

// Re-export commonly used types
pub use bus::{BrowserEvent, Dispatch, EventBus, EventHandler, HandlerReply};
pub use classify::Classifier;
pub use config::EngineConfig;
pub use error::{ConfigError, HostEnvironmentError, StoreError};
pub use exclusion::ExclusionSet;
pub use notify::{ChangeEvent, Notifier, StorageChange, SubscriptionId};
pub use producers::{MessageProducer, RuleMatchProducer, TabProducer};
#[cfg(feature = "native")]
pub use queue::{QueueHandle, WriteQueue};
pub use summary::{AdminSummary, RankedEntry};
pub use store::{Completion, MemoryBackend, StatsSink, StatsStore, StorageBackend};
#[cfg(feature = "native")]
pub use store::FileBackend;
pub use types::{Increment, ProtectedSites, StatsRecord, StorageKey};
pub use url::{derive_domain, normalize_host, DIRECT_DOMAIN};
