//! Bitmap encoding: `DynamicImage` → bytes in the configured page format.
//!
//! PNG is the default because it is lossless — rendered text stays crisp
//! through the turn animation's scaling. JPEG is offered for hosts that keep
//! every page resident and would rather trade crispness for a 5–10× smaller
//! working set. JPEG cannot carry an alpha channel, so rasters are flattened
//! to RGB before encoding.

use crate::config::PageImageFormat;
use image::DynamicImage;
use std::io::Cursor;
use tracing::debug;

/// Encode a rasterised page into the configured bitmap format.
pub fn encode_page(
    img: &DynamicImage,
    format: PageImageFormat,
) -> Result<Vec<u8>, image::ImageError> {
    let mut buf = Vec::new();
    match format {
        PageImageFormat::Png => {
            img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        }
        PageImageFormat::Jpeg { quality } => {
            let rgb = img.to_rgb8();
            let mut encoder =
                image::codecs::jpeg::JpegEncoder::new_with_quality(Cursor::new(&mut buf), quality);
            encoder.encode_image(&rgb)?;
        }
    }
    debug!("Encoded page bitmap → {} bytes ({})", buf.len(), format.mime_type());
    Ok(buf)
}
