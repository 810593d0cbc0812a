//! # Librarian Configuration Module
//!
//! Constants for the template format, archive layout, and execution limits
//! live in [`constants`]. Per-instance settings are carried by
//! [`crate::librarian::LibrarianConfig`].
//!
//! ## Module Organization
//!
//! - [`constants`]: All fixed configuration values with dependency documentation

pub mod constants;
pub use constants::*;
