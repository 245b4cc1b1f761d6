//! Event producers
//!
//! Each producer turns one kind of host platform event into store writes.
//! All of them filter excluded domains before touching anything, tolerate
//! missing fields, and never fail the surrounding dispatch.

mod message;
mod rule_match;
mod tabs;

pub use message::{MessageProducer, DEFAULT_AD_TYPE, ELEMENT_METHOD};
pub use rule_match::RuleMatchProducer;
pub use tabs::TabProducer;
