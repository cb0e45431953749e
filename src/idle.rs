//! Network quiescence detection
//!
//! A page counts as idle once the document has finished loading, web fonts
//! are settled, no request is in flight and none has completed for a quiet
//! window. In-flight requests are counted from DevTools network events by
//! [`InFlightRequests`]; the rest is sampled by polling. [`IdleTracker`]
//! holds the state between samples so the rule can be tested without a
//! browser.

use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Quiet window used by the print pipeline.
pub const NETWORK_IDLE_WINDOW: Duration = Duration::from_millis(500);

/// Script returning a JSON-encoded [`PageActivity`].
pub const PAGE_ACTIVITY_SCRIPT: &str = r#"
(function() {
    var fontsReady = !document.fonts || document.fonts.status === 'loaded';
    return JSON.stringify({
        ready: document.readyState === 'complete' && fontsReady,
        resources: performance.getEntriesByType('resource').length
    });
})()
"#;

/// One sample of page loading state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PageActivity {
    /// Document loaded and fonts settled
    pub ready: bool,
    /// Number of resources that have finished loading
    pub resources: usize,
    /// Requests started but not yet finished or failed
    #[serde(default)]
    pub in_flight: usize,
}

/// Request ids seen in `requestWillBeSent` without a matching
/// `loadingFinished` or `loadingFailed`.
#[derive(Debug, Default)]
pub struct InFlightRequests {
    pending: Mutex<HashSet<String>>,
}

impl InFlightRequests {
    pub fn started(&self, request_id: &str) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(request_id.to_string());
        }
    }

    pub fn settled(&self, request_id: &str) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(request_id);
        }
    }

    pub fn count(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[derive(Debug)]
pub struct IdleTracker {
    quiet_window: Duration,
    last_resources: Option<usize>,
    quiet_since: Option<Instant>,
}

impl IdleTracker {
    pub fn new(quiet_window: Duration) -> Self {
        Self {
            quiet_window,
            last_resources: None,
            quiet_since: None,
        }
    }

    /// Feed a sample taken at `now`; returns true once the page is idle.
    pub fn observe(&mut self, sample: PageActivity, now: Instant) -> bool {
        if !sample.ready || sample.in_flight > 0 {
            self.last_resources = None;
            self.quiet_since = None;
            return false;
        }

        if self.last_resources != Some(sample.resources) {
            self.last_resources = Some(sample.resources);
            self.quiet_since = Some(now);
            return false;
        }

        match self.quiet_since {
            Some(since) => now.duration_since(since) >= self.quiet_window,
            None => {
                self.quiet_since = Some(now);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(resources: usize) -> PageActivity {
        PageActivity {
            ready: true,
            resources,
            in_flight: 0,
        }
    }

    fn fetching(resources: usize, in_flight: usize) -> PageActivity {
        PageActivity {
            ready: true,
            resources,
            in_flight,
        }
    }

    #[test]
    fn idle_after_quiet_window() {
        let start = Instant::now();
        let mut t = IdleTracker::new(Duration::from_millis(500));

        assert!(!t.observe(ready(2), start));
        assert!(!t.observe(ready(2), start + Duration::from_millis(300)));
        assert!(t.observe(ready(2), start + Duration::from_millis(500)));
    }

    #[test]
    fn new_resource_restarts_window() {
        let start = Instant::now();
        let mut t = IdleTracker::new(Duration::from_millis(500));

        assert!(!t.observe(ready(1), start));
        assert!(!t.observe(ready(2), start + Duration::from_millis(400)));
        assert!(!t.observe(ready(2), start + Duration::from_millis(800)));
        assert!(t.observe(ready(2), start + Duration::from_millis(900)));
    }

    #[test]
    fn loading_page_is_never_idle() {
        let start = Instant::now();
        let mut t = IdleTracker::new(Duration::from_millis(100));
        let loading = PageActivity {
            ready: false,
            resources: 0,
            in_flight: 0,
        };

        for step in 0..10 {
            assert!(!t.observe(loading, start + Duration::from_millis(step * 100)));
        }
        assert!(!t.observe(ready(0), start + Duration::from_secs(2)));
        assert!(t.observe(ready(0), start + Duration::from_millis(2100)));
    }

    #[test]
    fn pending_request_blocks_idle() {
        let start = Instant::now();
        let mut t = IdleTracker::new(Duration::from_millis(500));

        // A fetch started after load keeps the resource count unchanged.
        for step in 0..20 {
            assert!(!t.observe(fetching(3, 1), start + Duration::from_millis(step * 100)));
        }
        assert!(!t.observe(ready(4), start + Duration::from_millis(2000)));
        assert!(!t.observe(ready(4), start + Duration::from_millis(2400)));
        assert!(t.observe(ready(4), start + Duration::from_millis(2500)));
    }

    #[test]
    fn in_flight_requests_are_counted_by_id() {
        let requests = InFlightRequests::default();
        requests.started("1");
        requests.started("2");
        // Redirects reuse the request id.
        requests.started("2");
        assert_eq!(requests.count(), 2);

        requests.settled("1");
        requests.settled("unknown");
        assert_eq!(requests.count(), 1);

        requests.settled("2");
        assert_eq!(requests.count(), 0);
    }

    #[test]
    fn parses_script_payload() {
        let sample: PageActivity = serde_json::from_str(r#"{"ready":true,"resources":3}"#).unwrap();
        assert_eq!(sample, ready(3));
    }
}
