//! Ordered option sequences

use std::fmt;

/// Ordered, duplicate-preserving list of options
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionList {
    options: Vec<String>,
}

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an option
    pub fn push(&mut self, option: impl Into<String>) {
        self.options.push(option.into());
    }

    /// Insert an option before all others
    pub fn prepend(&mut self, option: impl Into<String>) {
        self.options.insert(0, option.into());
    }

    /// Append every option of `other`, in order
    pub fn append(&mut self, other: &OptionList) {
        self.options.extend(other.options.iter().cloned());
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.options.iter()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.options
    }
}

impl<S: Into<String>> Extend<S> for OptionList {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.options.extend(iter.into_iter().map(Into::into));
    }
}

impl<S: Into<String>> FromIterator<S> for OptionList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            options: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a OptionList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.options.iter()
    }
}

impl fmt::Display for OptionList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.options.join(" "))
    }
}
