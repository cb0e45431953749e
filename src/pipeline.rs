//! The HTML-to-PDF rendering pipeline
//!
//! A render composes the document, writes it into a fresh [`Workspace`],
//! launches a dedicated [`PrintEngine`], loads the document, prints it and
//! releases everything again. The engine is closed and the workspace removed
//! on every path out of a render; failures while releasing them are logged
//! as [`CleanupWarning`](crate::CleanupWarning)s and never replace the
//! render's own result.

use crate::document::{compose, ComposedDocument};
use crate::workspace::Workspace;
use crate::{
    CleanupWarning, EngineInstallation, Error, PdfBytes, PrintEngine, RenderConfig, RenderProfile, Result,
    StyleAssets,
};
use std::time::{Duration, Instant};

/// Renders HTML fragments to PDF. One browser process per call.
#[derive(Debug, Clone)]
pub struct Renderer {
    installation: EngineInstallation,
    config: RenderConfig,
    assets: StyleAssets,
}

impl Renderer {
    /// Build a renderer from a located browser and a configuration.
    pub fn new(installation: EngineInstallation, config: RenderConfig) -> Result<Self> {
        let assets = config.style_assets()?;
        Ok(Self {
            installation,
            config,
            assets,
        })
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn installation(&self) -> &EngineInstallation {
        &self.installation
    }

    /// Compose the document without printing it.
    ///
    /// Passing the result to [`Renderer::render_document`] prints exactly the
    /// previewed HTML with the previewed profile's page geometry.
    pub fn preview(&self, fragment: &str, profile: RenderProfile) -> Result<ComposedDocument> {
        compose(fragment, profile, &self.assets)
    }

    /// Render a fragment with headless Chrome.
    #[cfg(feature = "cdp")]
    pub fn render(&self, fragment: &str, profile: RenderProfile) -> Result<PdfBytes> {
        self.render_using::<crate::cdp::CdpEngine>(fragment, profile, None)
    }

    /// Render a fragment, giving up at `deadline`.
    #[cfg(feature = "cdp")]
    pub fn render_with_deadline(&self, fragment: &str, profile: RenderProfile, deadline: Instant) -> Result<PdfBytes> {
        self.render_using::<crate::cdp::CdpEngine>(fragment, profile, Some(deadline))
    }

    /// Print an already composed document with headless Chrome.
    #[cfg(feature = "cdp")]
    pub fn render_document(&self, doc: &ComposedDocument) -> Result<PdfBytes> {
        self.render_document_using::<crate::cdp::CdpEngine>(doc, None)
    }

    /// Render a fragment with an arbitrary engine backend.
    pub fn render_using<E: PrintEngine>(
        &self,
        fragment: &str,
        profile: RenderProfile,
        deadline: Option<Instant>,
    ) -> Result<PdfBytes> {
        let doc = self.preview(fragment, profile)?;
        self.render_document_using::<E>(&doc, deadline)
    }

    /// Print a composed document with an arbitrary engine backend.
    pub fn render_document_using<E: PrintEngine>(
        &self,
        doc: &ComposedDocument,
        deadline: Option<Instant>,
    ) -> Result<PdfBytes> {
        let started = Instant::now();
        let timeout = effective_timeout(self.config.timeout(), deadline, started)?;
        let deadline = started + timeout;
        log::debug!(
            "Rendering {} document {} (timeout {}ms)",
            doc.profile().stylesheet_name,
            &doc.fingerprint()[..12],
            timeout.as_millis()
        );

        let workspace = match &self.config.temp_root {
            Some(root) => Workspace::create_in(root)?,
            None => Workspace::create()?,
        };

        let outcome = workspace
            .write_document(doc)
            .and_then(|url| self.print_once::<E>(&url, doc.profile(), deadline, timeout));

        if let Some(warning) = workspace.close() {
            warning.report();
        }

        let bytes = outcome?;
        if bytes.is_empty() {
            return Err(Error::RenderEngine("Engine produced an empty PDF".into()));
        }
        log::info!("Rendered {} ({} bytes)", doc.profile().page_geometry, bytes.len());
        Ok(PdfBytes::new(bytes))
    }

    fn print_once<E: PrintEngine>(
        &self,
        url: &str,
        profile: &RenderProfile,
        deadline: Instant,
        timeout: Duration,
    ) -> Result<Vec<u8>> {
        let mut engine = E::launch(&self.installation, &self.config, deadline)?;

        let printed = check_deadline(deadline, timeout)
            .and_then(|()| engine.load_url(url))
            .and_then(|()| check_deadline(deadline, timeout))
            .and_then(|()| engine.print_pdf(&profile.page_geometry))
            .and_then(|bytes| check_deadline(deadline, timeout).map(|()| bytes));

        if let Err(e) = engine.close() {
            CleanupWarning::new("engine", e.to_string()).report();
        }

        printed
    }
}

/// Fails with [`Error::Timeout`] once `deadline` has passed.
fn check_deadline(deadline: Instant, timeout: Duration) -> Result<()> {
    if Instant::now() >= deadline {
        return Err(Error::Timeout(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)));
    }
    Ok(())
}

/// The smaller of the configured timeout and the time left until `deadline`.
fn effective_timeout(configured: Duration, deadline: Option<Instant>, now: Instant) -> Result<Duration> {
    let Some(deadline) = deadline else {
        return Ok(configured);
    };
    let remaining = deadline.saturating_duration_since(now);
    if remaining.is_zero() {
        return Err(Error::Timeout(0));
    }
    Ok(configured.min(remaining))
}
