//! dj-core
//!
//! The central domain logic and interface definitions for Daybook.

pub mod dates;
pub mod error;
pub mod models;
pub mod service;
pub mod stats;
pub mod text;
pub mod traits;

// Re-exporting for easier access in other crates
pub use dates::{Clock, FixedClock, SystemClock};
pub use error::*;
pub use models::*;
pub use service::{EntryService, Neighbours, TodayStatus};
pub use traits::*;
