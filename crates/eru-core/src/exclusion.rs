//! Domains that must never be counted or tracked
//!
//! The set is built once at startup and shared read-only by every producer.
//! Filtering happens before any counter is touched, so an excluded event has
//! no observable effect on persisted state.

/// Video and chat platforms the blocker deliberately leaves alone.
pub const DEFAULT_EXCLUDED_DOMAINS: &[&str] = &[
    "youtube.com",
    "www.youtube.com",
    "m.youtube.com",
    "youtu.be",
    "openai.com",
    "chat.openai.com",
    "chatgpt.com",
    "www.chatgpt.com",
];

/// Substrings that exclude a blocked request by its own URL, whatever page
/// issued it.
pub const DEFAULT_EXCLUDED_URL_MARKERS: &[&str] = &["youtube"];

/// Immutable denylist of domains, plus the narrower list of markers checked
/// against blocked request URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    entries: Vec<String>,
    url_markers: Vec<String>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new(DEFAULT_EXCLUDED_DOMAINS.iter().copied())
            .with_url_markers(DEFAULT_EXCLUDED_URL_MARKERS.iter().copied())
    }
}

fn clean_entries<I, S>(entries: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for entry in entries {
        let entry = entry.as_ref().trim().to_ascii_lowercase();
        if !entry.is_empty() && !out.contains(&entry) {
            out.push(entry);
        }
    }
    out
}

impl ExclusionSet {
    /// Build a set from raw entries, with no URL markers. Entries are
    /// trimmed and lowercased; blanks and duplicates are dropped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: clean_entries(entries),
            url_markers: Vec::new(),
        }
    }

    /// Replace the request URL markers, cleaned like the domain entries.
    pub fn with_url_markers<I, S>(mut self, markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.url_markers = clean_entries(markers);
        self
    }

    /// An empty set that excludes nothing.
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            url_markers: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Free-text containment: true if the candidate (a URL, initiator or
    /// host) contains any entry. Used on raw event fields.
    pub fn contains_in(&self, candidate: &str) -> bool {
        if candidate.is_empty() {
            return false;
        }
        let candidate = candidate.to_ascii_lowercase();
        self.entries.iter().any(|entry| candidate.contains(entry.as_str()))
    }

    /// True if a blocked request URL contains any URL marker. Domain entries
    /// are not consulted, so third-party requests to an excluded domain made
    /// from an ordinary page still count.
    pub fn excludes_request_url(&self, url: &str) -> bool {
        if url.is_empty() {
            return false;
        }
        let url = url.to_ascii_lowercase();
        self.url_markers.iter().any(|marker| url.contains(marker.as_str()))
    }

    /// Exact match against a normalized host.
    pub fn matches_exact(&self, host: &str) -> bool {
        self.entries.iter().any(|entry| entry.eq_ignore_ascii_case(host))
    }

    /// Exact or subdomain match against a host (`music.youtube.com` matches
    /// `youtube.com`, `notyoutube.com` does not).
    pub fn matches_host(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.entries.iter().any(|entry| {
            host == *entry
                || (host.len() > entry.len()
                    && host.ends_with(entry.as_str())
                    && host.as_bytes()[host.len() - entry.len() - 1] == b'.')
        })
    }
}
