//! Launcher options: classification of the command line and assembly of
//! the runtime invocation

mod classifier;
mod classpath;
mod command;
mod list;
mod memory;
mod quote;

pub use classifier::*;
pub use classpath::*;
pub use command::*;
pub use list::*;
pub use memory::*;
pub use quote::*;
