//! Installation settings: bundle variables and engine option files

mod settings;

pub use settings::*;
