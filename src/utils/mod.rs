//! Utility functions shared across the crate.
//!
//! ## Modules
//!
//! - [`app_data`] - Configuration file and app data directory (XDG-compliant)
//! - [`encoding`] - Bounds-checked little-endian reads and writes
//! - [`progress`] - Progress bars, no-op without the `progress` feature
//! - [`text`] - Case folding and character sets
//! - [`timestamp`] - Episode tags and subtitle timestamps
//!
//! ```no_run
//! use vvsearch::utils::{episode_number, timestamp_to_seconds};
//!
//! assert_eq!(episode_number("[P12] title"), Some(12));
//! assert_eq!(timestamp_to_seconds("5m30s"), Some(330));
//! ```

pub mod app_data;
pub mod encoding;
pub mod progress;
pub mod text;
pub mod timestamp;

pub use app_data::*;
pub use encoding::*;
pub use progress::*;
pub use text::*;
pub use timestamp::*;
