//! Nirnay: multi-format HTML to PDF
//!
//! Turns a pasted HTML body fragment into a PDF in one of three formats
//! (A4 document, 1200×1500 poster, 16:9 slides). Layout and printing are
//! delegated to headless Chrome; this crate resolves the format, composes the
//! document, drives the browser and guarantees that every per-render
//! resource is released.
//!
//! # Features
//!
//! - **CDP Backend** (default): prints through Chrome DevTools Protocol via headless Chrome
//! - **Explicit setup**: [`EngineInstallation::ensure`] locates the browser once at startup
//! - **Scoped resources**: the temporary document and the browser process never outlive a render
//!
//! # Example
//!
//! ```no_run
//! use nirnay::{EngineInstallation, Preset, RenderConfig, Renderer};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RenderConfig {
//!     timeout_ms: 20000,
//!     ..Default::default()
//! };
//!
//! let installation = EngineInstallation::ensure(&config)?;
//! let renderer = Renderer::new(installation, config)?;
//! let pdf = renderer.render("<h1>Quarterly report</h1>", Preset::Document.profile())?;
//! pdf.write_to(nirnay::DOWNLOAD_FILE_NAME)?;
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

pub mod error;
pub use error::{CleanupWarning, Error, Result};

pub mod assets;
pub mod document;
pub mod idle;
pub mod inspect;
pub mod install;
pub mod pipeline;
pub mod profile;
pub mod workspace;

#[cfg(feature = "cdp")]
pub mod cdp;

// Async-friendly facade (worker thread per render)
#[cfg(feature = "cdp")]
pub mod async_api;

pub use assets::StyleAssets;
pub use document::{compose, ComposedDocument};
pub use install::EngineInstallation;
pub use pipeline::Renderer;
pub use profile::{resolve, PageGeometry, PaperFormat, Preset, RenderProfile};

#[cfg(feature = "cdp")]
pub use async_api::AsyncRenderer;

/// File name offered for the downloaded PDF.
pub const DOWNLOAD_FILE_NAME: &str = "nirnay_output.pdf";

/// MIME type of the produced payload.
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Configuration for the rendering pipeline
///
/// The defaults target container environments: the Chrome sandbox is
/// disabled and stylesheets come from the copies bundled into the crate.
///
/// # Examples
///
/// ```
/// let cfg = nirnay::RenderConfig::default();
/// assert_eq!(cfg.timeout_ms, 30000);
/// assert!(cfg.disable_sandbox);
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Upper bound for page load and print, in milliseconds
    pub timeout_ms: u64,
    /// Explicit Chrome/Chromium executable, skipping discovery
    pub chrome_path: Option<PathBuf>,
    /// Launch Chrome with `--no-sandbox` and container-friendly flags
    pub disable_sandbox: bool,
    /// Static-assets directory holding `base.css`, `a4.css`, `poster.css`, `slides.css`
    pub assets_dir: Option<PathBuf>,
    /// Browser window size used while laying out the document
    pub window: Viewport,
    /// Where per-render workspaces are created (system temp dir when unset)
    pub temp_root: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            chrome_path: None,
            disable_sandbox: true,
            assets_dir: None,
            window: Viewport::default(),
            temp_root: None,
        }
    }
}

impl RenderConfig {
    /// Load a configuration from a JSON file. Missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| Error::ConfigError(format!("{}: {}", path.display(), e)))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Resolve the stylesheet source this configuration points at.
    pub fn style_assets(&self) -> Result<StyleAssets> {
        match &self.assets_dir {
            Some(dir) => StyleAssets::directory(dir),
            None => Ok(StyleAssets::Bundled),
        }
    }
}

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// A produced PDF.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfBytes {
    bytes: Vec<u8>,
}

impl PdfBytes {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn file_name(&self) -> &'static str {
        DOWNLOAD_FILE_NAME
    }

    pub fn mime_type(&self) -> &'static str {
        PDF_MIME_TYPE
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

impl AsRef<[u8]> for PdfBytes {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

/// A disposable browser instance that can load one document and print it.
///
/// Implementations own their browser process exclusively; the pipeline
/// creates one per render and always calls [`PrintEngine::close`].
pub trait PrintEngine {
    /// Launch a fresh engine. Every later wait ends at `deadline`.
    fn launch(installation: &EngineInstallation, config: &RenderConfig, deadline: Instant) -> Result<Self>
    where
        Self: Sized;

    /// Load a URL and block until the network has gone quiet, failing with
    /// [`Error::Timeout`] once the deadline passes
    fn load_url(&mut self, url: &str) -> Result<()>;

    /// Print the loaded page with backgrounds on, CSS `@page` sizes preferred
    /// and `geometry` as the fallback paper size. The print call gets
    /// whatever time is left before the deadline.
    fn print_pdf(&mut self, geometry: &PageGeometry) -> Result<Vec<u8>>;

    /// Shut the engine down and release its process
    fn close(self) -> Result<()>;
}
