//! Webpforge-Common: Shared error type and path utilities.
//!
//! This crate provides common functionality used across webpforge:
//!
//! - **Error Handling**: The pipeline error type, tagged with the step that failed
//! - **Path Utilities**: Case-insensitive extension matching against allow-lists
//!
//! # Examples
//!
//! ```
//! use webpforge_common::{Error, Result, Step};
//! use webpforge_common::paths::has_extension_in;
//! use std::path::Path;
//!
//! assert!(has_extension_in(Path::new("Photo.JPG"), &["jpg", "png"]));
//!
//! fn example() -> Result<()> {
//!     Err(Error::decode("hero.png", "invalid PNG signature"))
//! }
//! assert_eq!(example().unwrap_err().step(), Step::Transcode);
//! ```

pub mod error;
pub mod paths;

pub use error::{Error, Result, Step};
