//! Library configuration via `libris.toml`
//!
//! A missing file means defaults. `write_default_if_missing` drops a
//! commented default file next to the data so operators can edit it and
//! restart.

use libris_core::{LibrisError, LibrisResult};
use libris_search::SearchSettings;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Config file name
pub const CONFIG_FILE_NAME: &str = "libris.toml";

/// Library configuration loaded from `libris.toml`.
///
/// # Example
///
/// ```toml
/// reindex_on_startup = true
///
/// [search]
/// phrase_slop = 2
/// fuzzy_max_edits = 1
/// fuzzy_prefix_length = 3
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Rebuild the index from the record store when opening a non-empty store
    #[serde(default = "default_reindex_on_startup")]
    pub reindex_on_startup: bool,
    /// Maximum documents per entity type in the index; unbounded when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_capacity: Option<usize>,
    /// Query tuning
    #[serde(default)]
    pub search: SearchSettings,
}

fn default_reindex_on_startup() -> bool {
    true
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            reindex_on_startup: default_reindex_on_startup(),
            index_capacity: None,
            search: SearchSettings::default(),
        }
    }
}

impl LibraryConfig {
    /// Check every value; invalid settings are `Config` errors
    pub fn validate(&self) -> LibrisResult<()> {
        if self.index_capacity == Some(0) {
            return Err(LibrisError::config("index_capacity must be at least 1"));
        }
        self.search.validate()
    }

    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Libris library configuration
#
# Rebuild the search index from the record store at startup when the
# store already holds authors or books (default: true).
reindex_on_startup = true

# Maximum indexed documents per entity type (default: unbounded).
# index_capacity = 100000

[search]
# Words allowed between or around the words of a phrase query.
phrase_slop = 2
# Edit distance of fuzzy queries (at most 2).
fuzzy_max_edits = 1
# Leading characters a fuzzy match must reproduce exactly.
fuzzy_prefix_length = 3
# Positions between the titles embedded in an author document.
position_increment_gap = 100
# BM25 parameters.
bm25_k1 = 1.2
bm25_b = 0.75
"#
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// `Io` if the file cannot be read, `Config` if it does not parse or
    /// holds invalid values.
    pub fn from_file(path: &Path) -> LibrisResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: LibraryConfig = toml::from_str(&content).map_err(|e| {
            LibrisError::config(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> LibrisResult<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Write the default config file if it does not already exist.
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> LibrisResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> LibrisResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| LibrisError::config(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
