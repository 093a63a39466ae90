//! Cisco IOS platform support.

mod parser;
pub mod patterns;
mod platform;

pub use parser::IosParser;
pub use platform::platform;
