//! Utility functions module
//!
//! Size and duration formatting/parsing plus small text helpers shared by
//! the workspace and the terminal screens.

pub mod text;
pub mod units;

// Re-export commonly used functions
pub use text::truncate_title;
pub use units::{format_bytes, parse_bytes, format_duration, parse_duration};
