//! Transcode domain module

mod recipe;

pub use recipe::{FilterSpec, TranscodeRecipe};
