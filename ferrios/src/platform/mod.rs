//! Platform definitions.
//!
//! A platform bundles everything vendor-specific about a device family:
//! prompt patterns and privilege levels, the error signatures used to
//! classify responses, session setup commands and the output parser.

mod definition;
mod privilege_level;
mod registry;
pub mod vendors;

pub use definition::{PlatformDefinition, Transition};
pub use privilege_level::PrivilegeLevel;
pub use registry::PlatformRegistry;
