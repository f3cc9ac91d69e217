//! Core library for the avkit media utilities.
//! Each module backs one of the command line tools; they share only the
//! timestamp conventions and the external process runner.

pub mod chapters;
pub mod error;
pub mod srt;
pub mod sync;
pub mod timestamp;
pub mod tool;
pub mod tracks;

pub use error::{Error, Result};
