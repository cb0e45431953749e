//! Stylesheet lookup
//!
//! Documents reference four stylesheets by name: the shared `base` sheet and
//! one per output format (`a4`, `poster`, `slides`). They come either from
//! the copies bundled into the binary or from a static-assets directory on
//! disk. Either way the href is absolute, so a composed document renders the
//! same in a preview and from the render workspace.

use crate::{Error, Result};
use base64::Engine as Base64Engine;
use std::path::{Path, PathBuf};
use url::Url;

/// Name of the stylesheet shared by every format.
pub const BASE_STYLESHEET: &str = "base";

/// Every stylesheet a document may reference.
pub const STYLESHEET_NAMES: [&str; 4] = [BASE_STYLESHEET, "a4", "poster", "slides"];

/// Look up the bundled copy of a stylesheet.
pub fn bundled_css(name: &str) -> Option<&'static str> {
    match name {
        "base" => Some(include_str!("../assets/styles/base.css")),
        "a4" => Some(include_str!("../assets/styles/a4.css")),
        "poster" => Some(include_str!("../assets/styles/poster.css")),
        "slides" => Some(include_str!("../assets/styles/slides.css")),
        _ => None,
    }
}

/// Where stylesheets are loaded from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StyleAssets {
    /// Stylesheets compiled into the crate, linked as `data:` URLs
    #[default]
    Bundled,
    /// A directory holding `<name>.css` files, linked as `file://` URLs
    Directory(PathBuf),
}

impl StyleAssets {
    /// Use a static-assets directory. Every known stylesheet must be present.
    pub fn directory(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let dir = dir.canonicalize().map_err(|e| {
            Error::ConfigError(format!("Stylesheet directory {} is not accessible: {}", dir.display(), e))
        })?;

        let missing: Vec<&str> = STYLESHEET_NAMES
            .iter()
            .copied()
            .filter(|name| !dir.join(format!("{}.css", name)).is_file())
            .collect();
        if !missing.is_empty() {
            return Err(Error::ConfigError(format!(
                "Stylesheet directory {} is missing: {}",
                dir.display(),
                missing.join(", ")
            )));
        }

        Ok(StyleAssets::Directory(dir))
    }

    /// Resolve a stylesheet name to an href reachable from any document.
    pub fn href(&self, name: &str) -> Result<String> {
        match self {
            StyleAssets::Bundled => {
                let css = bundled_css(name)
                    .ok_or_else(|| Error::ConfigError(format!("No bundled stylesheet named '{}'", name)))?;
                let encoded = Base64Engine::encode(&base64::engine::general_purpose::STANDARD, css);
                Ok(format!("data:text/css;base64,{}", encoded))
            }
            StyleAssets::Directory(dir) => {
                let path = dir.join(format!("{}.css", name));
                Url::from_file_path(&path)
                    .map(String::from)
                    .map_err(|_| Error::ConfigError(format!("Cannot address {} as a file URL", path.display())))
            }
        }
    }
}
