//! Chrome DevTools Protocol print engine

use crate::idle::{IdleTracker, InFlightRequests, PageActivity, NETWORK_IDLE_WINDOW, PAGE_ACTIVITY_SCRIPT};
use crate::{EngineInstallation, Error, PageGeometry, PrintEngine, RenderConfig, Result};
use headless_chrome::browser::tab::Tab;
use headless_chrome::protocol::cdp::types::Event;
use headless_chrome::protocol::cdp::Network;
use headless_chrome::types::PrintToPdfOptions;
use headless_chrome::{Browser, LaunchOptions};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

// Keeps the DevTools connection open a little past the render deadline.
const BROWSER_IDLE_GRACE: Duration = Duration::from_secs(1);

/// Headless Chrome print engine (uses the `headless_chrome` crate)
///
/// Each instance launches its own browser process with a single tab. The
/// process is killed when the engine is closed or dropped.
pub struct CdpEngine {
    browser: Browser,
    tab: Arc<Tab>,
    requests: Arc<InFlightRequests>,
    deadline: Instant,
    timeout: Duration,
}

impl CdpEngine {
    fn page_activity(&self) -> Result<PageActivity> {
        let eval = self
            .tab
            .evaluate(PAGE_ACTIVITY_SCRIPT, false)
            .map_err(|e| Error::RenderEngine(format!("Failed to sample page activity: {}", e)))?;

        let raw = match eval.value {
            Some(serde_json::Value::String(s)) => s,
            Some(other) => other.to_string(),
            None => return Err(Error::RenderEngine("No value returned from activity probe".into())),
        };

        let mut activity: PageActivity = serde_json::from_str(&raw)
            .map_err(|e| Error::RenderEngine(format!("Unexpected activity probe result '{}': {}", raw, e)))?;
        activity.in_flight = self.requests.count();
        Ok(activity)
    }

    /// Time left before the deadline, or `Timeout` if none is.
    fn remaining(&self) -> Result<Duration> {
        let left = self.deadline.saturating_duration_since(Instant::now());
        if left.is_zero() {
            return Err(Error::Timeout(self.timeout_ms()));
        }
        Ok(left)
    }

    fn timeout_ms(&self) -> u64 {
        u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX)
    }

    /// Count requests from the Network domain so idleness can require
    /// nothing in flight.
    fn track_requests(tab: &Tab, requests: &Arc<InFlightRequests>) -> Result<()> {
        let sink = Arc::clone(requests);
        tab.add_event_listener(Arc::new(move |event: &Event| match event {
            Event::NetworkRequestWillBeSent(ev) => sink.started(&ev.params.request_id),
            Event::NetworkLoadingFinished(ev) => sink.settled(&ev.params.request_id),
            Event::NetworkLoadingFailed(ev) => sink.settled(&ev.params.request_id),
            _ => {}
        }))
        .map_err(|e| Error::RenderEngine(format!("Failed to listen for network events: {}", e)))?;

        tab.call_method(Network::Enable {
            max_total_buffer_size: None,
            max_resource_buffer_size: None,
            max_post_data_size: None,
            report_direct_socket_traffic: None,
            enable_durable_messages: None,
        })
        .map_err(|e| Error::RenderEngine(format!("Failed to enable network events: {}", e)))?;
        Ok(())
    }
}

impl PrintEngine for CdpEngine {
    fn launch(installation: &EngineInstallation, config: &RenderConfig, deadline: Instant) -> Result<Self> {
        let timeout = deadline.saturating_duration_since(Instant::now());

        let mut args: Vec<&OsStr> = Vec::new();
        if config.disable_sandbox {
            args.push(OsStr::new("--disable-dev-shm-usage"));
            args.push(OsStr::new("--disable-gpu"));
        }

        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(!config.disable_sandbox)
            .path(Some(installation.executable().to_path_buf()))
            .window_size(Some((config.window.width, config.window.height)))
            .idle_browser_timeout(timeout + BROWSER_IDLE_GRACE)
            .args(args)
            .build()
            .map_err(|e| Error::RenderEngine(format!("Failed to build launch options: {}", e)))?;

        let browser = Browser::new(launch_options)
            .map_err(|e| Error::RenderEngine(format!("Failed to launch browser: {}", e)))?;
        log::debug!("Launched browser (pid {:?})", browser.get_process_id());

        let tab = browser
            .new_tab()
            .map_err(|e| Error::RenderEngine(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(timeout);

        let requests = Arc::new(InFlightRequests::default());
        Self::track_requests(&tab, &requests)?;

        Ok(Self {
            browser,
            tab,
            requests,
            deadline,
            timeout,
        })
    }

    fn load_url(&mut self, url: &str) -> Result<()> {
        self.tab.set_default_timeout(self.remaining()?);
        self.tab
            .navigate_to(url)
            .map_err(|e| Error::RenderEngine(format!("Navigation failed: {}", e)))?;

        if let Err(e) = self.tab.wait_until_navigated() {
            // A wait cut short by the deadline is a timeout.
            self.remaining()?;
            return Err(Error::RenderEngine(format!("Wait for navigation failed: {}", e)));
        }

        let mut tracker = IdleTracker::new(NETWORK_IDLE_WINDOW);
        loop {
            let activity = self.page_activity()?;
            if tracker.observe(activity, Instant::now()) {
                log::debug!("Network idle after loading {} resources", activity.resources);
                return Ok(());
            }
            self.remaining()?;
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    fn print_pdf(&mut self, geometry: &PageGeometry) -> Result<Vec<u8>> {
        self.tab.set_default_timeout(self.remaining()?);
        let (paper_width, paper_height) = geometry.size_inches();

        let options = PrintToPdfOptions {
            print_background: Some(true),
            prefer_css_page_size: Some(true),
            paper_width: Some(paper_width),
            paper_height: Some(paper_height),
            margin_top: Some(0.0),
            margin_bottom: Some(0.0),
            margin_left: Some(0.0),
            margin_right: Some(0.0),
            ..Default::default()
        };

        let pdf = self
            .tab
            .print_to_pdf(Some(options))
            .map_err(|e| Error::RenderEngine(format!("Print to PDF failed: {}", e)))?;
        log::debug!("Printed {} bytes at {}", pdf.len(), geometry);
        Ok(pdf)
    }

    fn close(self) -> Result<()> {
        // Dropping the browser kills and reaps the Chrome process.
        let pid = self.browser.get_process_id();
        drop(self.tab);
        drop(self.browser);

        match pid {
            Some(pid) if process_alive(pid) => {
                Err(Error::RenderEngine(format!("Browser process {} still running after close", pid)))
            }
            _ => {
                log::debug!("Closed browser (pid {:?})", pid);
                Ok(())
            }
        }
    }
}

#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{}", pid)).exists()
}

// Without procfs the reaped child cannot be checked.
#[cfg(not(target_os = "linux"))]
fn process_alive(_pid: u32) -> bool {
    false
}
