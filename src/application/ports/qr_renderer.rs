//! QR renderer port interface

use thiserror::Error;

use crate::domain::config::AppConfig;

/// QR error correction levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCorrection {
    #[default]
    Low,
    Medium,
    Quartile,
    High,
}

/// Rendering options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QrOptions {
    pub error_correction: ErrorCorrection,
    /// Symbol version, 1..=40
    pub version: u8,
    /// Image edge length in pixels
    pub image_size: u32,
    /// Quiet zone in modules
    pub margin: u32,
}

impl QrOptions {
    /// Options taken from configuration; version and level stay fixed
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            image_size: config.image_size_or_default(),
            margin: config.margin_or_default(),
            ..Self::default()
        }
    }
}

impl Default for QrOptions {
    fn default() -> Self {
        Self {
            error_correction: ErrorCorrection::Low,
            version: 40,
            image_size: 512,
            margin: 1,
        }
    }
}

/// A rendered QR image
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrImage {
    png: Vec<u8>,
}

impl QrImage {
    pub fn from_png(png: Vec<u8>) -> Self {
        Self { png }
    }

    pub fn png(&self) -> &[u8] {
        &self.png
    }

    /// `data:image/png;base64,...` form of the image
    pub fn to_data_uri(&self) -> String {
        use base64::Engine;
        format!(
            "data:image/png;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.png)
        )
    }
}

/// Rendering errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("Data does not fit a version {version} QR code: {message}")]
    DataTooLong { version: u8, message: String },

    #[error("Invalid QR options: {0}")]
    InvalidOptions(String),

    #[error("Failed to encode image: {0}")]
    Image(String),
}

/// Port for turning text into a QR image
pub trait QrRenderer: Send + Sync {
    fn render(&self, data: &str, options: &QrOptions) -> Result<QrImage, RenderError>;
}
