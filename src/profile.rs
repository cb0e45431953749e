//! Output presets and the profiles they resolve to
//!
//! A [`Preset`] is the user-facing choice of output format. Resolving it
//! yields a [`RenderProfile`]: the stylesheet to link into the document and
//! the page geometry to hand to the print engine.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// CSS pixels per inch, as used by the print engine.
pub const CSS_PX_PER_INCH: f64 = 96.0;

/// PDF points per inch.
pub const PT_PER_INCH: f64 = 72.0;

/// The closed set of output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// A4 document
    Document,
    /// 1200×1500 px poster
    Poster,
    /// 16:9 slide (1280×720 px)
    Slide,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Document, Preset::Poster, Preset::Slide];

    /// Label shown in the format selector.
    pub fn label(self) -> &'static str {
        match self {
            Preset::Document => "A4",
            Preset::Poster => "Poster (1200×1500)",
            Preset::Slide => "PPT (16:9)",
        }
    }

    /// Shorthand for `resolve(self)`.
    pub fn profile(self) -> RenderProfile {
        resolve(self)
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if let Some(preset) = Preset::ALL.into_iter().find(|p| p.label() == trimmed) {
            return Ok(preset);
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "a4" | "document" | "doc" => Ok(Preset::Document),
            "poster" => Ok(Preset::Poster),
            "slide" | "slides" | "ppt" => Ok(Preset::Slide),
            other => Err(Error::ConfigError(format!(
                "unknown preset '{}' (expected a4, poster or slide)",
                other
            ))),
        }
    }
}

/// Named paper sizes the print engine knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaperFormat {
    A4,
}

impl PaperFormat {
    pub fn name(self) -> &'static str {
        match self {
            PaperFormat::A4 => "A4",
        }
    }

    /// Width and height in inches, from Chrome's paper table.
    pub fn size_inches(self) -> (f64, f64) {
        match self {
            PaperFormat::A4 => (8.27, 11.7),
        }
    }
}

/// Page geometry handed to the print engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PageGeometry {
    /// A named paper size, resolved by the engine
    Named { format: PaperFormat },
    /// An explicit pixel box
    Box { width_px: u32, height_px: u32 },
}

impl PageGeometry {
    /// Paper width and height in inches, the unit the DevTools print call expects.
    pub fn size_inches(&self) -> (f64, f64) {
        match *self {
            PageGeometry::Named { format } => format.size_inches(),
            PageGeometry::Box { width_px, height_px } => (
                f64::from(width_px) / CSS_PX_PER_INCH,
                f64::from(height_px) / CSS_PX_PER_INCH,
            ),
        }
    }

    /// Expected page size in PDF points.
    pub fn size_points(&self) -> (f64, f64) {
        let (w, h) = self.size_inches();
        (w * PT_PER_INCH, h * PT_PER_INCH)
    }
}

impl fmt::Display for PageGeometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageGeometry::Named { format } => f.write_str(format.name()),
            PageGeometry::Box { width_px, height_px } => write!(f, "{}x{}px", width_px, height_px),
        }
    }
}

/// Stylesheet and page geometry for one preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RenderProfile {
    /// Stylesheet identifier, without the `.css` extension
    pub stylesheet_name: &'static str,
    pub page_geometry: PageGeometry,
}

/// Map a preset to its render profile.
pub fn resolve(preset: Preset) -> RenderProfile {
    match preset {
        Preset::Document => RenderProfile {
            stylesheet_name: "a4",
            page_geometry: PageGeometry::Named {
                format: PaperFormat::A4,
            },
        },
        Preset::Poster => RenderProfile {
            stylesheet_name: "poster",
            page_geometry: PageGeometry::Box {
                width_px: 1200,
                height_px: 1500,
            },
        },
        Preset::Slide => RenderProfile {
            stylesheet_name: "slides",
            page_geometry: PageGeometry::Box {
                width_px: 1280,
                height_px: 720,
            },
        },
    }
}
