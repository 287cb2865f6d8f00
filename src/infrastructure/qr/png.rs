//! QR code rendered to PNG with tiny-skia

use qrcode::bits::Bits;
use qrcode::types::QrError;
use qrcode::{EcLevel, QrCode, Version};
use tiny_skia::{Color, Paint, Pixmap, Rect, Transform};

use crate::application::ports::{ErrorCorrection, QrImage, QrOptions, QrRenderer, RenderError};

/// Renders square, black-on-white module grids
#[derive(Debug, Default, Clone, Copy)]
pub struct QrPngRenderer;

impl QrPngRenderer {
    pub fn new() -> Self {
        Self
    }
}

fn ec_level(level: ErrorCorrection) -> EcLevel {
    match level {
        ErrorCorrection::Low => EcLevel::L,
        ErrorCorrection::Medium => EcLevel::M,
        ErrorCorrection::Quartile => EcLevel::Q,
        ErrorCorrection::High => EcLevel::H,
    }
}

/// Encode `data` as a single byte-mode segment. Automatic segmentation
/// splits base64 into mixed runs that hold less than byte mode does.
fn byte_mode_code(data: &str, options: &QrOptions) -> Result<QrCode, QrError> {
    let ec = ec_level(options.error_correction);
    let mut bits = Bits::new(Version::Normal(options.version as i16));
    bits.push_byte_data(data.as_bytes())?;
    bits.push_terminator(ec)?;
    QrCode::with_bits(bits, ec)
}

impl QrRenderer for QrPngRenderer {
    fn render(&self, data: &str, options: &QrOptions) -> Result<QrImage, RenderError> {
        if !(1..=40).contains(&options.version) {
            return Err(RenderError::InvalidOptions(format!(
                "version must be between 1 and 40, got {}",
                options.version
            )));
        }

        let code = byte_mode_code(data, options).map_err(|e| RenderError::DataTooLong {
            version: options.version,
            message: e.to_string(),
        })?;

        let width = code.width() as u32;
        let modules = width + 2 * options.margin;
        let size = options.image_size;
        if size < modules {
            return Err(RenderError::InvalidOptions(format!(
                "image size {}px is smaller than {} modules",
                size, modules
            )));
        }

        let mut pixmap = Pixmap::new(size, size)
            .ok_or_else(|| RenderError::Image(format!("cannot allocate {}x{} image", size, size)))?;
        pixmap.fill(Color::WHITE);

        let mut paint = Paint::default();
        paint.set_color(Color::BLACK);
        paint.anti_alias = false;

        // Module edges snap to whole pixels so neighbours never overlap or gap
        let scale = size as f32 / modules as f32;
        let edge = |i: u32| (i as f32 * scale).floor();

        for y in 0..width {
            for x in 0..width {
                if code[(x as usize, y as usize)] != qrcode::Color::Dark {
                    continue;
                }
                let (col, row) = (x + options.margin, y + options.margin);
                if let Some(rect) =
                    Rect::from_ltrb(edge(col), edge(row), edge(col + 1), edge(row + 1))
                {
                    pixmap.fill_rect(rect, &paint, Transform::identity(), None);
                }
            }
        }

        let png = pixmap
            .encode_png()
            .map_err(|e| RenderError::Image(e.to_string()))?;
        log::debug!("Rendered {}x{} QR ({} modules) as {} bytes", size, size, width, png.len());

        Ok(QrImage::from_png(png))
    }
}
