//! CLI argument definitions using Clap

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// audio-qr - record a short voice clip into a single QR code
#[derive(Parser, Debug)]
#[command(name = "audio-qr")]
#[command(version)]
#[command(about = "Record a short voice clip and encode it into a single QR code")]
#[command(long_about = None)]
pub struct Cli {
    /// Capture duration (e.g., 2.5s, 1600ms); at most 10s
    #[arg(short = 'd', long, value_name = "TIME")]
    pub duration: Option<String>,

    /// Skip the ffmpeg transcode path and record with the native encoder
    #[arg(long)]
    pub prefer_native: bool,

    /// Where to write the QR code PNG
    #[arg(short = 'o', long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Also print the image as a data URI on stdout
    #[arg(long)]
    pub data_uri: bool,

    /// Show progress logs on stderr
    #[arg(short = 'v', long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Encode an existing compressed audio file into a QR code
    Encode {
        /// Audio file (ogg, opus, webm, mp4, m4a)
        file: PathBuf,
    },
    /// Show detected capabilities and the capture path that would be used
    Probe {
        /// Print the profile as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config action subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Create config file with defaults
    Init,
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// Config value
        value: String,
    },
    /// Get a config value
    Get {
        /// Config key
        key: String,
    },
    /// List all config values
    List,
    /// Show config file path
    Path,
}

/// Valid config keys
pub const VALID_CONFIG_KEYS: &[&str] = &[
    "duration",
    "payload_limit",
    "prefer_quality",
    "output",
    "qr.image_size",
    "qr.margin",
    "engine.ffmpeg_path",
];

/// Check if a config key is valid
pub fn is_valid_config_key(key: &str) -> bool {
    VALID_CONFIG_KEYS.contains(&key)
}
