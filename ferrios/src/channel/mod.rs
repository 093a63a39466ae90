//! Channel layer for pattern matching and PTY operations.
//!
//! This module handles the interactive shell session, including
//! pattern-based prompt detection, timing-based completion and ANSI
//! stripping.

mod buffer;
pub mod patterns;
mod pty;

pub use buffer::PatternBuffer;
pub use pty::{PtyChannel, PtyConfig};
