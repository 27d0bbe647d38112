//! Configuration for the Akte engine
//!
//! Compile-time limits and marker literals live here as constants.
//! [`AssemblyConfig`] carries the values that may be tuned per deployment,
//! either through the builder methods or from environment variables.
//!
//! # Environment variables
//!
//! | Variable                     | Default |
//! |------------------------------|---------|
//! | `AKTE_MAX_NESTING_DEPTH`     | `5`     |
//! | `AKTE_BASE_NUMBERING_ID`     | `1000`  |
//! | `AKTE_REMOVE_ARTICLE_MARKER` | `^`     |
//! | `AKTE_REMOVE_BLOCK_MARKER`   | `#`     |

/// Maximum number of passes when resolving `[[Key]]` tokens inside a
/// conditional result.
///
/// Caps expansion length so a value that reintroduces its own token
/// (`A = "[[A]]"`) terminates.
pub const MAX_NESTING_DEPTH: usize = 5;

/// Tolerance for numeric equality in condition comparisons.
pub const NUMERIC_EPSILON: f64 = 1e-4;

/// Numbering instance id used for the first legal article sequence.
///
/// Restarted sequences get ids allocated above this value.
pub const BASE_NUMBERING_ID: u32 = 1000;

/// Abstract numbering definition id of the legal article list.
pub const LEGAL_ABSTRACT_NUMBERING_ID: u32 = 1000;

/// Maximum size in bytes of a conditional placeholder rule file (1 MB).
pub const MAX_RULES_SIZE: usize = 1_000_000;

/// Block text that removes the enclosing article.
pub const REMOVE_ARTICLE_MARKER: &str = "^";

/// Block text that removes the block itself.
pub const REMOVE_BLOCK_MARKER: &str = "#";

/// Runtime configuration for a [`DocumentAssembler`](crate::pipeline::DocumentAssembler).
#[derive(Debug, Clone, PartialEq)]
pub struct AssemblyConfig {
    /// Pass limit for nested placeholder resolution
    pub max_nesting_depth: usize,
    /// First numbering instance id of every assembly session
    pub base_numbering_id: u32,
    /// Marker removing the enclosing article
    pub remove_article_marker: String,
    /// Marker removing the marked block
    pub remove_block_marker: String,
}

impl Default for AssemblyConfig {
    fn default() -> Self {
        Self {
            max_nesting_depth: MAX_NESTING_DEPTH,
            base_numbering_id: BASE_NUMBERING_ID,
            remove_article_marker: REMOVE_ARTICLE_MARKER.to_string(),
            remove_block_marker: REMOVE_BLOCK_MARKER.to_string(),
        }
    }
}

impl AssemblyConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the environment, falling back to defaults
    /// for unset or unparseable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let max_nesting_depth = std::env::var("AKTE_MAX_NESTING_DEPTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_nesting_depth);

        let base_numbering_id = std::env::var("AKTE_BASE_NUMBERING_ID")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.base_numbering_id);

        let remove_article_marker = std::env::var("AKTE_REMOVE_ARTICLE_MARKER")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.remove_article_marker);

        let remove_block_marker = std::env::var("AKTE_REMOVE_BLOCK_MARKER")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.remove_block_marker);

        Self {
            max_nesting_depth,
            base_numbering_id,
            remove_article_marker,
            remove_block_marker,
        }
    }

    /// Set the nested placeholder pass limit.
    pub fn with_max_nesting_depth(mut self, depth: usize) -> Self {
        self.max_nesting_depth = depth;
        self
    }

    /// Set the base numbering instance id.
    pub fn with_base_numbering_id(mut self, id: u32) -> Self {
        self.base_numbering_id = id;
        self
    }

    /// Set both removal markers.
    pub fn with_removal_markers(
        mut self,
        remove_article: impl Into<String>,
        remove_block: impl Into<String>,
    ) -> Self {
        self.remove_article_marker = remove_article.into();
        self.remove_block_marker = remove_block.into();
        self
    }
}
