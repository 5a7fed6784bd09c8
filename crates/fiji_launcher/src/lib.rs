//! Fiji Launcher
//!
//! A native launcher that finds a Java runtime, turns its command line into
//! runtime and application options, and boots the runtime in-process. When
//! no runtime can be loaded it replaces itself with an external `java`.
//!
//! # Overview
//!
//! - [`paths`] locates the installation from the launcher's own path
//! - [`runtime`] finds, loads and boots the runtime
//! - [`options`] classifies the arguments and assembles the command line
//! - [`staging`] merges updates staged below `update/`
//! - [`retry`] restarts with a smaller heap when the runtime runs out of
//!   memory
//! - [`platform`] hides what differs between Unix, macOS and Windows
//!
//! # Example settings file
//!
//! Bundle variables live in `launcher.yaml` at the installation root:
//!
//! ```yaml
//! heap: 2g
//! allowMultiple: true
//! JVMOptions: "-Xss4m -Dswing.aatext=true"
//! DefaultArguments: "-port9"
//! classPathOrder: sorted
//! ```

pub mod buffer;
pub mod config;
pub mod context;
pub mod error;
pub mod launcher;
pub mod options;
pub mod paths;
pub mod platform;
pub mod retry;
pub mod runtime;
pub mod staging;

pub use config::{Settings, SettingsError};
pub use context::{LaunchContext, LaunchFlags};
pub use error::LaunchError;
pub use launcher::{utf8_arguments, Launcher, Plan};
pub use options::{LaunchCommand, Scan};
pub use platform::Platform;
