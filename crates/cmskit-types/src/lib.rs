#![forbid(unsafe_code)]
#![doc = "Common error types and constants for cmskit."]

pub mod error;

pub use error::*;
