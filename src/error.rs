//! Error types for the rendering pipeline

use thiserror::Error;

/// Result type alias for rendering operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while composing or rendering a document
#[derive(Error, Debug)]
pub enum Error {
    /// The HTML fragment was empty or whitespace-only
    #[error("Please paste HTML first: the fragment is empty")]
    EmptyInput,

    /// The browser engine failed to launch, load the document, or print it
    #[error("Render engine failed: {0}")]
    RenderEngine(String),

    /// The engine did not finish before the deadline. Part of the engine
    /// failure class alongside [`Error::RenderEngine`], see
    /// [`Error::is_engine_failure`].
    #[error("Operation timed out after {0}ms")]
    Timeout(u64),

    /// No usable Chrome/Chromium binary could be located
    #[error("Browser engine not installed: {0}")]
    EngineNotInstalled(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    /// The produced bytes could not be read back as a PDF
    #[error("PDF inspection failed: {0}")]
    PdfInspect(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error belongs to the engine failure class (launch,
    /// navigation, print, or deadline expiry).
    pub fn is_engine_failure(&self) -> bool {
        matches!(self, Error::RenderEngine(_) | Error::Timeout(_))
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::PdfInspect(err.to_string())
    }
}

/// A resource that could not be released after a render.
///
/// Cleanup problems never replace the primary result of a render; they are
/// reported through `log::warn!` and otherwise dropped.
#[derive(Debug)]
pub struct CleanupWarning {
    /// What was being released ("workspace", "engine")
    pub resource: &'static str,
    pub detail: String,
}

impl CleanupWarning {
    pub fn new(resource: &'static str, detail: impl Into<String>) -> Self {
        Self {
            resource,
            detail: detail.into(),
        }
    }

    /// Emit the warning through the `log` facade.
    pub fn report(&self) {
        log::warn!("Failed to release {}: {}", self.resource, self.detail);
    }
}

impl std::fmt::Display for CleanupWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "failed to release {}: {}", self.resource, self.detail)
    }
}
