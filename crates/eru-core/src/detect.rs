//! Page-level ad element detection
//!
//! Content scripts cannot see network rule matches, so they count elements
//! that look like ad slots and report the total to the background context.
//! The DOM is abstracted behind [`ElementCounter`] so the same logic runs
//! against a live document in the bindings and a fake in tests.

use log::debug;

use crate::exclusion::ExclusionSet;
use crate::producers::DEFAULT_AD_TYPE;
use crate::types::ContentMessage;
use crate::url::normalize_host;

/// Selector patterns that identify ad containers.
pub const AD_SELECTORS: &[&str] = &[
    "[id*=\"google_ads\"]",
    "[class*=\"adsbygoogle\"]",
    "[id*=\"ad-container\"]",
    "[class*=\"ad-container\"]",
    "[data-ad]",
    "[id*=\"ad-\"]",
    "ins.adsbygoogle",
    ".advertisement",
    "[class*=\"ad-slot\"]",
    "iframe[src*=\"doubleclick\"]",
    "iframe[src*=\"googlesyndication\"]",
];

/// Delay before the second scan, which catches late-loading ads.
pub const RESCAN_DELAY_MS: i32 = 2000;

/// Something that can count elements matching a CSS selector.
pub trait ElementCounter {
    type Error: std::fmt::Display;

    fn count_matching(&self, selector: &str) -> Result<usize, Self::Error>;
}

/// Total matches across every selector. A selector that fails to evaluate
/// contributes nothing and does not stop the others.
pub fn count_ad_elements<C: ElementCounter>(counter: &C) -> usize {
    AD_SELECTORS
        .iter()
        .map(|selector| match counter.count_matching(selector) {
            Ok(count) => count,
            Err(e) => {
                debug!("Selector '{}' failed: {}", selector, e);
                0
            }
        })
        .sum()
}

/// Run one scan for a page. Returns the single report to send, or None
/// when the page is excluded, has no usable host, or has no ad elements.
pub fn scan_page<C: ElementCounter>(hostname: &str, counter: &C, exclusions: &ExclusionSet) -> Option<ContentMessage> {
    if exclusions.matches_host(hostname) {
        return None;
    }
    let domain = normalize_host(hostname)?;
    let count = count_ad_elements(counter);
    if count == 0 {
        return None;
    }
    Some(ContentMessage::ad_stats(domain, count as u64, DEFAULT_AD_TYPE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct FakeDom {
        counts: HashMap<&'static str, Result<usize, String>>,
    }

    impl ElementCounter for FakeDom {
        type Error = String;

        fn count_matching(&self, selector: &str) -> Result<usize, String> {
            self.counts.get(selector).cloned().unwrap_or(Ok(0))
        }
    }

    fn dom(entries: &[(&'static str, Result<usize, String>)]) -> FakeDom {
        FakeDom {
            counts: entries.iter().cloned().collect(),
        }
    }

    #[test]
    fn test_counts_across_selectors() {
        let page = dom(&[("ins.adsbygoogle", Ok(2)), (".advertisement", Ok(1)), ("[data-ad]", Ok(4))]);
        assert_eq!(count_ad_elements(&page), 7);
    }

    #[test]
    fn test_failing_selector_is_isolated() {
        let page = dom(&[("[data-ad]", Err("SyntaxError".into())), (".advertisement", Ok(3))]);
        assert_eq!(count_ad_elements(&page), 3);
    }

    #[test]
    fn test_scan_emits_one_report() {
        let page = dom(&[("ins.adsbygoogle", Ok(2)), (".advertisement", Ok(1))]);
        let report = scan_page("www.bar.com", &page, &ExclusionSet::default()).unwrap();
        assert_eq!(report, ContentMessage::ad_stats("bar.com", 3, "Element"));
    }

    #[test]
    fn test_scan_skips_excluded_and_empty_pages() {
        let page = dom(&[("[data-ad]", Ok(5))]);
        let exclusions = ExclusionSet::default();
        assert!(scan_page("music.youtube.com", &page, &exclusions).is_none());
        assert!(scan_page("chatgpt.com", &page, &exclusions).is_none());
        assert!(scan_page("", &page, &exclusions).is_none());
        assert!(scan_page("clean.org", &dom(&[]), &exclusions).is_none());
    }
}
