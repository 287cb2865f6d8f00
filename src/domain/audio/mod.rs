//! Audio domain module

mod audio_blob;
mod encoding;
pub mod pcm;

pub use audio_blob::{AudioBlob, AudioEncoding, AudioMimeType};
pub use encoding::CompressedEncoding;
