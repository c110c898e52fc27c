//! # GE Slacker Events
//!
//! This crate defines the change notifications a session publishes to its display
//! collaborators. A table or chart subscribes once and re-renders on each event,
//! instead of wiring callbacks into the session.
//!
//! As a Layer 0 crate, it depends only on `core-types`.

// Declare the modules that make up this crate.
pub mod messages;

// Re-export the core types to provide a clean public API.
pub use messages::{FilterField, SessionEvent};
