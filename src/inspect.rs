//! Page geometry of produced PDFs
//!
//! Used by the CLI to summarise what was written and by the tests to check
//! that a render honoured its profile.

use crate::profile::PageGeometry;
use crate::{Error, Result};
use lopdf::{Document as LoDocument, Object as LoObject, ObjectId as LoObjectId};

/// Tolerance, in points, when comparing a page box against a geometry.
pub const PAGE_SIZE_TOLERANCE_PT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct PdfSummary {
    pub pdf_version: String,
    pub page_count: usize,
    /// Width and height of the first page in points
    pub page_size_pt: (f64, f64),
}

impl PdfSummary {
    /// Whether the first page matches `geometry` within the tolerance.
    pub fn matches(&self, geometry: &PageGeometry) -> bool {
        let (w, h) = geometry.size_points();
        let (pw, ph) = self.page_size_pt;
        (pw - w).abs() <= PAGE_SIZE_TOLERANCE_PT && (ph - h).abs() <= PAGE_SIZE_TOLERANCE_PT
    }
}

/// Read page count and first-page size from PDF bytes.
pub fn inspect(bytes: &[u8]) -> Result<PdfSummary> {
    let pdf = LoDocument::load_mem(bytes)?;
    let pages = pdf.get_pages();
    let first = pages
        .values()
        .next()
        .copied()
        .ok_or_else(|| Error::PdfInspect("document has no pages".into()))?;

    Ok(PdfSummary {
        pdf_version: pdf.version.clone(),
        page_count: pages.len(),
        page_size_pt: page_size(&pdf, first)?,
    })
}

// MediaBox may live on any ancestor in the page tree.
fn page_size(pdf: &LoDocument, mut id: LoObjectId) -> Result<(f64, f64)> {
    loop {
        let dict = pdf.get_object(id)?.as_dict()?;
        if let Ok(arr) = dict.get(b"MediaBox").and_then(LoObject::as_array) {
            if let Some(size) = media_box_size(pdf, arr) {
                return Ok(size);
            }
        }
        id = match dict.get(b"Parent").and_then(LoObject::as_reference) {
            Ok(parent) => parent,
            Err(_) => return Err(Error::PdfInspect("page has no MediaBox".into())),
        };
    }
}

fn media_box_size(pdf: &LoDocument, arr: &[LoObject]) -> Option<(f64, f64)> {
    if arr.len() < 4 {
        return None;
    }
    let mut coords = [0f64; 4];
    for (slot, obj) in coords.iter_mut().zip(arr) {
        *slot = number(pdf, obj)?;
    }
    Some(((coords[2] - coords[0]).abs(), (coords[3] - coords[1]).abs()))
}

fn number(pdf: &LoDocument, obj: &LoObject) -> Option<f64> {
    match obj {
        LoObject::Integer(v) => Some(*v as f64),
        LoObject::Real(v) => Some(f64::from(*v)),
        LoObject::Reference(id) => number(pdf, pdf.get_object(*id).ok()?),
        _ => None,
    }
}
