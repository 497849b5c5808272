//! notice-writer/crates/nb-core/src/lib.rs
//!
//! The central domain logic and port definitions for the notice writer.

pub mod composer;
pub mod error;
pub mod models;
pub mod resize;
pub mod separator;
pub mod traits;

// Re-exporting for easier access in other crates
pub use composer::*;
pub use error::*;
pub use models::*;
pub use resize::*;
pub use separator::*;
pub use traits::*;
