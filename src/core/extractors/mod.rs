//! Symbol extractors turning source text into the document model.
//!
//! Python goes through an exact tree-sitter grammar; every other language is
//! approximated with regular expressions. Both produce the same
//! [`ModuleInfo`] shape.

mod generic;
mod python;

pub use generic::GenericExtractor;
pub use python::PythonExtractor;

use super::classifier::LanguageLabel;
use super::model::ModuleInfo;

/// Shared capability of every extraction strategy
pub trait SymbolExtractor {
    /// Build the document model for `code`. Never fails: problems are
    /// carried inside the returned model.
    fn extract(&mut self, code: &str, language: LanguageLabel) -> ModuleInfo;

    /// Short name used in logs
    fn strategy_name(&self) -> &str;
}
