//! Runtime discovery, loading and boot

mod boot;
pub mod jni;
mod loader;
mod locator;

pub use boot::*;
pub use loader::*;
pub use locator::*;
