//! Whole-file asset loading.

use std::path::Path;

use anyhow::{Context as _, Result};

/// Reads a UTF-8 text asset (shader source, model description, ...) in full.
///
/// Open/read failures and non-UTF-8 content are returned with the path
/// attached.
pub fn load_text_asset(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read asset {}", path.display()))?;

    let text = String::from_utf8(bytes)
        .with_context(|| format!("asset {} is not valid UTF-8", path.display()))?;

    log::debug!("loaded asset {} ({} bytes)", path.display(), text.len());
    Ok(text)
}
