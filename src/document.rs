//! Document composition
//!
//! The fragment a user pastes is body content only. [`compose`] wraps it in
//! a fixed document shell: doctype, charset, the base stylesheet, the
//! profile's stylesheet and a margin/padding reset.
//!
//! # Trust boundary
//!
//! The fragment is inserted verbatim. Nothing is escaped or sanitized, so
//! scripts and external references in the fragment run and load inside the
//! headless browser exactly as written. Only feed this operator-supplied
//! markup.

use crate::assets::{StyleAssets, BASE_STYLESHEET};
use crate::profile::RenderProfile;
use crate::{Error, Result};
use sha2::{Digest, Sha256};

/// Reset applied after both stylesheets.
pub const RESET_RULE: &str = "html, body { margin: 0; padding: 0; }";

/// A complete HTML document ready for preview or printing.
///
/// The profile travels with the HTML, so printing a composed document always
/// uses the geometry of the stylesheet it was composed with.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedDocument {
    html: String,
    profile: RenderProfile,
    fingerprint: String,
}

impl ComposedDocument {
    pub fn html(&self) -> &str {
        &self.html
    }

    pub fn profile(&self) -> &RenderProfile {
        &self.profile
    }

    /// Hex-encoded SHA-256 of the HTML.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn into_html(self) -> String {
        self.html
    }
}

/// Reject empty and whitespace-only fragments.
pub fn validate_fragment(fragment: &str) -> Result<()> {
    if fragment.trim().is_empty() {
        return Err(Error::EmptyInput);
    }
    Ok(())
}

/// Wrap a body fragment in the document shell for `profile`.
pub fn compose(fragment: &str, profile: RenderProfile, assets: &StyleAssets) -> Result<ComposedDocument> {
    validate_fragment(fragment)?;

    let base_href = assets.href(BASE_STYLESHEET)?;
    let profile_href = assets.href(profile.stylesheet_name)?;

    let html = format!(
        r#"<!doctype html>
<html>
<head>
<meta charset="utf-8">
<link rel="stylesheet" href="{base_href}">
<link rel="stylesheet" href="{profile_href}">
<style>{reset}</style>
</head>
<body>
{fragment}
</body>
</html>
"#,
        base_href = base_href,
        profile_href = profile_href,
        reset = RESET_RULE,
        fragment = fragment,
    );

    let fingerprint = hex::encode(Sha256::digest(html.as_bytes()));
    log::debug!(
        "Composed {} document ({} bytes, sha256 {})",
        profile.stylesheet_name,
        html.len(),
        &fingerprint[..12]
    );

    Ok(ComposedDocument {
        html,
        profile,
        fingerprint,
    })
}
