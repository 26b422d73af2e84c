//! Non-interactive upload, segment and recolor.

use std::path::Path;

use anyhow::{bail, Result};
use carmod_core::{DisplayImage, Studio, TokenStore, Transport};
use tracing::info;

/// Run the recolor pipeline on one local photo and return the variant URL.
///
/// Uses whatever session the studio already has; an anonymous run is fine.
pub fn recolor_file<T: Transport, S: TokenStore>(
    studio: &mut Studio<T, S>,
    file: &Path,
    dh: i32,
    ds: f64,
    dv: f64,
) -> Result<String> {
    studio.upload_image(file);
    fail_on_alert(studio)?;
    studio.segment();
    fail_on_alert(studio)?;
    studio.set_adjustment(dh, ds, dv);
    studio.recolor();
    fail_on_alert(studio)?;

    match studio.display_image() {
        Some(DisplayImage::Remote(url)) if studio.pipeline().variant_path.is_some() => {
            info!(%url, "recolored");
            Ok(url)
        }
        _ => bail!("backend returned no variant for {}", file.display()),
    }
}

fn fail_on_alert<T: Transport, S: TokenStore>(studio: &mut Studio<T, S>) -> Result<()> {
    let alerts = studio.take_alerts();
    if alerts.is_empty() {
        Ok(())
    } else {
        bail!(alerts.join("; "))
    }
}
