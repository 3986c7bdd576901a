//! Input adapters: everything that turns user input into an [`ActivityTable`].
//!
//! [`ActivityTable`]: crate::activity::ActivityTable

pub mod defaults;
pub mod localized;
pub mod natural_language;
pub mod tabular;

pub use defaults::{CATEGORIES, Category, EXAMPLE_PROMPT, default_project};
pub use natural_language::{Extraction, ExtractionSource, NaturalLanguageExtractor};
pub use tabular::{Ingested, TabularImport, TabularImporter, TabularLayout};

use std::path::PathBuf;

const TABULAR_EXTENSIONS: [&str; 3] = [".csv", ".xlsx", ".xls"];

/// A raw user entry, classified by shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    TabularFile(PathBuf),
    Text(String),
}

impl Input {
    /// Entries ending in a spreadsheet or CSV extension are file paths,
    /// anything else is a project description. `ejemplo` / `example` stand
    /// for the demo sentence.
    pub fn detect(entry: &str) -> Self {
        let trimmed = entry.trim();
        let lowered = trimmed.to_lowercase();

        if lowered == "ejemplo" || lowered == "example" {
            return Input::Text(EXAMPLE_PROMPT.to_string());
        }
        if TABULAR_EXTENSIONS.iter().any(|ext| lowered.ends_with(ext)) {
            return Input::TabularFile(PathBuf::from(trimmed));
        }
        Input::Text(trimmed.to_string())
    }
}
