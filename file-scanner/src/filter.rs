//! Extension filters used to select scan matches.

use std::fs::FileType;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// A set of file name suffixes, or no filter at all.
///
/// An absent filter matches every entry, directories included. A present
/// filter only ever matches regular files, and an empty one matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Option<Vec<String>>", into = "Option<Vec<String>>")]
pub struct ExtensionFilter(Option<Vec<String>>);

impl ExtensionFilter {
    /// Filter that matches every file and directory.
    pub fn any() -> Self {
        Self(None)
    }

    /// Filter that matches files whose name ends with one of `extensions`.
    ///
    /// Empty suffixes are dropped; they would otherwise match every file.
    pub fn extensions<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(Some(
            extensions
                .into_iter()
                .map(Into::into)
                .filter(|ext| !ext.is_empty())
                .collect(),
        ))
    }

    /// Whether this filter matches everything.
    pub fn is_any(&self) -> bool {
        self.0.is_none()
    }

    /// The configured suffixes, if any.
    pub fn suffixes(&self) -> Option<&[String]> {
        self.0.as_deref()
    }

    /// Check a directory entry against the filter.
    pub fn matches(&self, path: &Path, file_type: FileType) -> bool {
        let Some(suffixes) = &self.0 else {
            return true;
        };

        if file_type.is_dir() {
            return false;
        }

        let Some(name) = path.file_name() else {
            return false;
        };
        let name = name.to_string_lossy();

        suffixes.iter().any(|suffix| name.ends_with(suffix.as_str()))
    }
}

impl From<Option<Vec<String>>> for ExtensionFilter {
    fn from(extensions: Option<Vec<String>>) -> Self {
        match extensions {
            Some(extensions) => Self::extensions(extensions),
            None => Self::any(),
        }
    }
}

impl From<ExtensionFilter> for Option<Vec<String>> {
    fn from(filter: ExtensionFilter) -> Self {
        filter.0
    }
}

impl From<Vec<String>> for ExtensionFilter {
    fn from(extensions: Vec<String>) -> Self {
        Self::extensions(extensions)
    }
}
