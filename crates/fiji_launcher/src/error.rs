//! Fatal launcher errors

use std::path::PathBuf;

use crate::config::SettingsError;

/// Column of the first character of the offending text in an unclosed-quote
/// diagnostic, i.e. the length of `"Unclosed quote: "`.
const UNCLOSED_QUOTE_PREFIX: usize = 16;

/// Errors that terminate the launcher.
///
/// Every variant is reported on stderr and the process exits with status 1.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("Could not get PATH")]
    PathUnset,

    #[error("Could not find {0} in PATH")]
    NotInPath(String),

    #[error("Too long path: {0}")]
    PathTooLong(String),

    #[error("Could not get current working directory: {0}")]
    WorkingDirectory(#[source] std::io::Error),

    #[error("Could not switch to {}: {source}", .path.display())]
    ChangeDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid symlink: {}: {source}", .path.display())]
    Symlink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not get absolute path for executable {0}")]
    NoParentDirectory(String),

    #[error(
        "Unclosed quote: {text}\n{caret:>width$}",
        caret = "^",
        width = UNCLOSED_QUOTE_PREFIX + .column + 1
    )]
    UnclosedQuote {
        text: String,
        /// Character offset of the opening quote
        column: usize,
    },

    #[error("Argument is not valid UTF-8: {0}")]
    NonUtf8Argument(String),

    #[error("Option {0} needs an argument!")]
    MissingValue(String),

    #[error("Heap size too large: {0}")]
    HeapTooLarge(String),

    #[error("Failed to open: {}: {source}", .path.display())]
    ClassPath {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Could not create directory: {}: {source}", .path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not remove old version of {}. Please remove it manually!", .path.display())]
    RemoveOldVersion {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not move {} to {}: {source}", .from.display(), .to.display())]
    Move {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("--headless without a parameter?")]
    HeadlessWithoutParameter,

    #[error("Out of memory!")]
    OutOfMemory,

    #[error("Could not find {0}")]
    MainClassNotFound(String),

    #[error("Could not find main method of {0}")]
    MainMethodNotFound(String),

    #[error("Failed to create {0} option array")]
    OptionArray(String),

    #[error("Option contains a NUL byte: {0}")]
    NulInOption(String),

    #[error("Could not launch {command}: {source}")]
    Exec {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unclosed_quote_caret_points_at_quote() {
        let err = LaunchError::UnclosedQuote {
            text: "\"abc".to_string(),
            column: 0,
        };
        let message = err.to_string();
        let lines: Vec<&str> = message.lines().collect();
        assert_eq!(lines[0], "Unclosed quote: \"abc");
        let caret = lines[1].find('^').unwrap();
        assert_eq!(&lines[0][caret..caret + 1], "\"");
    }

    #[test]
    fn test_caret_aligns_after_multibyte_text() {
        let err = LaunchError::UnclosedQuote {
            text: "Größe \"abc".to_string(),
            column: 6,
        };
        let message = err.to_string();
        let lines: Vec<&str> = message.lines().collect();
        let caret = lines[1].find('^').unwrap();
        assert_eq!(lines[0].chars().nth(caret), Some('"'));
    }

    #[test]
    fn test_missing_value_message() {
        let err = LaunchError::MissingValue("--heap".to_string());
        assert_eq!(err.to_string(), "Option --heap needs an argument!");
    }
}
