//! Typed records for the prompt store.
//!
//! All documents cross the store boundary as these explicit types; partial
//! updates list the fields they overwrite instead of passing loose maps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Use Case Category
// ============================================================================

/// Closed set of prompt categories.
///
/// The wire names (`code-gen`, `text-gen`, `data-analysis`, `creative`,
/// `general`) are what gets stored and what clients pass to the search tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UseCase {
    CodeGen,
    TextGen,
    DataAnalysis,
    Creative,
    General,
}

impl UseCase {
    /// All categories, in canonical listing order.
    pub const ALL: [UseCase; 5] = [
        UseCase::CodeGen,
        UseCase::TextGen,
        UseCase::DataAnalysis,
        UseCase::Creative,
        UseCase::General,
    ];

    /// Wire name of this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            UseCase::CodeGen => "code-gen",
            UseCase::TextGen => "text-gen",
            UseCase::DataAnalysis => "data-analysis",
            UseCase::Creative => "creative",
            UseCase::General => "general",
        }
    }

    /// Parse an exact wire name.
    pub fn parse(value: &str) -> Option<UseCase> {
        Self::ALL.iter().copied().find(|uc| uc.as_str() == value)
    }

    /// Parse a category label produced by the language model.
    ///
    /// Models occasionally spell the category differently than the wire name
    /// (`code-generation`, `Code Gen`, ...). Anything unrecognized lands in
    /// `General` so stored categories always come from the closed set.
    pub fn from_model_label(label: &str) -> UseCase {
        let normalized: String = label
            .trim()
            .chars()
            .map(|c| match c {
                ' ' | '_' => '-',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        match normalized.as_str() {
            "code-gen" | "code-generation" | "codegen" | "code" | "coding" => UseCase::CodeGen,
            "text-gen" | "text-generation" | "textgen" | "text" | "writing" => UseCase::TextGen,
            "data-analysis" | "data" | "analysis" | "analytics" => UseCase::DataAnalysis,
            "creative" | "creative-writing" => UseCase::Creative,
            _ => UseCase::General,
        }
    }

    /// Comma-separated list of valid wire names, for error messages and
    /// schema descriptions.
    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|uc| uc.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Stored Records
// ============================================================================

/// A stored prompt with its full versioning metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRecord {
    /// Store-assigned id, opaque to callers.
    pub id: String,
    pub use_case: UseCase,
    /// Searchable description of what the prompt does; this is the text the
    /// embedding is computed from.
    pub summary: String,
    /// The reusable markdown prompt body.
    pub prompt_template: String,
    /// How the prompt was derived and used.
    pub history: String,
    /// Embedding of `summary`. `None` only for records written before an
    /// embedding was generated.
    pub embedding: Option<Vec<f32>>,
    pub last_updated: DateTime<Utc>,
    /// Successful mutations applied since creation.
    pub num_updates: i64,
    /// Append-only change descriptions, oldest first.
    pub changelog: Vec<String>,
    pub created_by: Option<String>,
}

/// Payload for creating a new prompt.
///
/// The store fills in the id, timestamps, and empty versioning metadata.
#[derive(Debug, Clone)]
pub struct NewPrompt {
    pub use_case: UseCase,
    pub summary: String,
    pub prompt_template: String,
    pub history: String,
    pub embedding: Vec<f32>,
    pub created_by: Option<String>,
}

/// A partial update: only the populated fields are overwritten, absent
/// fields are left untouched. Every patch carries a changelog entry and
/// bumps the update counter.
#[derive(Debug, Clone, Default)]
pub struct PromptPatch {
    pub use_case: Option<UseCase>,
    pub summary: Option<String>,
    pub prompt_template: Option<String>,
    pub history: Option<String>,
    pub embedding: Option<Vec<f32>>,
    pub changelog_entry: String,
}

/// A similarity search result.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub id: String,
    pub use_case: UseCase,
    pub summary: String,
    /// Similarity score reported by the search index, or the neutral
    /// sentinel when results are unranked.
    pub score: f64,
    pub last_updated: DateTime<Utc>,
}
