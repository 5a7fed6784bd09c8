//! Bundle variables and the `jvm.cfg` engine options file

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// File below the installation root holding bundle variables
pub const SETTINGS_FILE: &str = "launcher.yaml";

/// File below the installation root holding extra engine options
pub const ENGINE_OPTIONS_FILE: &str = "jvm.cfg";

/// Key/value lookup for bundle variables.
///
/// Application bundles expose their launcher settings as flat string
/// variables; anything that can answer such lookups can configure a launch.
pub trait BundleVariables {
    /// Value of `key`, if the bundle defines it
    fn variable(&self, key: &str) -> Option<String>;
}

impl BundleVariables for BTreeMap<String, String> {
    fn variable(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Bundle variable values can be strings, booleans or numbers
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BundleValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl BundleValue {
    /// String representation as a bundle reader would report it
    pub fn as_string(&self) -> String {
        match self {
            BundleValue::Bool(b) => b.to_string(),
            BundleValue::Int(i) => i.to_string(),
            BundleValue::Float(f) => f.to_string(),
            BundleValue::String(s) => s.clone(),
        }
    }
}

/// Order in which archives found in a directory join the class path
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClassPathOrder {
    /// As the directory listing returns them
    #[default]
    Listing,
    /// Sorted by file name
    Sorted,
}

/// Settings read from the installation root
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// Bundle variables from `launcher.yaml`
    variables: BTreeMap<String, BundleValue>,

    /// Contents of `jvm.cfg`, empty when absent
    engine_options: String,
}

impl Settings {
    /// Load settings from an installation root.
    ///
    /// A missing settings file or options file yields empty settings; a
    /// file that exists but cannot be read or parsed is an error.
    pub fn load(install_root: &Path) -> Result<Self, SettingsError> {
        let mut settings = match read_optional(&install_root.join(SETTINGS_FILE))? {
            Some(content) => Self::from_yaml(&content)?,
            None => Self::default(),
        };
        settings.engine_options =
            read_optional(&install_root.join(ENGINE_OPTIONS_FILE))?.unwrap_or_default();
        Ok(settings)
    }

    /// Parse bundle variables from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self, SettingsError> {
        // An empty document is a valid, empty settings file
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let variables: BTreeMap<String, BundleValue> =
            serde_yaml::from_str(content).map_err(SettingsError::Parse)?;
        Ok(Self {
            variables,
            engine_options: String::new(),
        })
    }

    /// Replace the engine options text
    pub fn with_engine_options(mut self, text: impl Into<String>) -> Self {
        self.engine_options = text.into();
        self
    }

    /// Explicit heap amount, from `heap`, `mem` or `memory` in that order
    pub fn heap(&self) -> Option<String> {
        ["heap", "mem", "memory"]
            .iter()
            .find_map(|key| self.variable(key))
    }

    /// Whether the external runtime should be used instead of loading one
    pub fn use_system_runtime(&self) -> bool {
        self.variable("system")
            .map(|value| leading_integer(&value) > 0)
            .unwrap_or(false)
    }

    /// Extension directories
    pub fn ext(&self) -> Option<String> {
        self.variable("ext")
    }

    /// Whether multiple instances may run side by side
    pub fn allow_multiple(&self) -> Option<bool> {
        self.variable("allowMultiple").map(|value| parse_bool(&value))
    }

    /// Engine options declared as a bundle variable
    pub fn jvm_options(&self) -> Option<String> {
        self.variable("JVMOptions")
    }

    /// Application arguments prepended to every launch
    pub fn default_arguments(&self) -> Option<String> {
        self.variable("DefaultArguments")
    }

    /// Order of archives on the class path
    pub fn class_path_order(&self) -> ClassPathOrder {
        match self.variable("classPathOrder").as_deref() {
            Some("sorted") => ClassPathOrder::Sorted,
            _ => ClassPathOrder::Listing,
        }
    }

    /// Contents of the engine options file
    pub fn engine_options(&self) -> &str {
        &self.engine_options
    }
}

impl BundleVariables for Settings {
    fn variable(&self, key: &str) -> Option<String> {
        self.variables.get(key).map(BundleValue::as_string)
    }
}

/// Parse a boolean the way bundle readers do: everything except `0` and
/// the spellings of `false` is true.
pub fn parse_bool(value: &str) -> bool {
    !matches!(value, "0" | "false" | "False" | "FALSE")
}

/// Value of the leading decimal integer in `value`, 0 when there is none
fn leading_integer(value: &str) -> i64 {
    let trimmed = value.trim_start();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().map(|n| sign * n).unwrap_or(0)
}

fn read_optional(path: &Path) -> Result<Option<String>, SettingsError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(SettingsError::Io {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Errors that can occur when loading settings
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read settings file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file: {0}")]
    Parse(#[source] serde_yaml::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bundle_variables() {
        let yaml = r#"
heap: 512m
system: 1
allowMultiple: false
JVMOptions: "-Dfoo=bar -Xss4m"
classPathOrder: sorted
"#;
        let settings = Settings::from_yaml(yaml).unwrap();
        assert_eq!(settings.heap().as_deref(), Some("512m"));
        assert!(settings.use_system_runtime());
        assert_eq!(settings.allow_multiple(), Some(false));
        assert_eq!(settings.jvm_options().as_deref(), Some("-Dfoo=bar -Xss4m"));
        assert_eq!(settings.class_path_order(), ClassPathOrder::Sorted);
        assert_eq!(settings.default_arguments(), None);
    }

    #[test]
    fn test_heap_key_precedence() {
        let settings = Settings::from_yaml("memory: 2g\nmem: 1g\n").unwrap();
        assert_eq!(settings.heap().as_deref(), Some("1g"));
    }

    #[test]
    fn test_system_requires_positive_integer() {
        for (value, expected) in [("0", false), ("2", true), ("yes", false), ("-1", false)] {
            let settings = Settings::from_yaml(&format!("system: \"{value}\"\n")).unwrap();
            assert_eq!(settings.use_system_runtime(), expected, "system: {value}");
        }
    }

    #[test]
    fn test_parse_bool() {
        assert!(!parse_bool("0"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("False"));
        assert!(!parse_bool("FALSE"));
        assert!(parse_bool("fAlse"));
        assert!(parse_bool("1"));
        assert!(parse_bool(""));
    }

    #[test]
    fn test_load_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.heap(), None);
        assert_eq!(settings.engine_options(), "");
    }

    #[test]
    fn test_load_engine_options_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(ENGINE_OPTIONS_FILE), "-Xss2m\n-Dx=\"a b\"\n").unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.engine_options(), "-Xss2m\n-Dx=\"a b\"\n");
    }

    #[test]
    fn test_malformed_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "heap: [unclosed\n").unwrap();
        assert!(matches!(
            Settings::load(dir.path()),
            Err(SettingsError::Parse(_))
        ));
    }
}
