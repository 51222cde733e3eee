//! Language-agnostic document model shared by every extractor.
//!
//! A [`ModuleInfo`] is built fresh for each extraction call, handed to the
//! renderer and dropped. Descriptions are never absent: missing docstrings are
//! replaced by fixed placeholder text through [`describe`] when the model is
//! populated.

use serde::Serialize;
use thiserror::Error;

/// Return text used when no annotation exists or it cannot be printed.
pub const VARIES: &str = "varies";

/// Base-class text used when a base expression cannot be printed.
pub const UNKNOWN_BASE: &str = "unknown";

/// Parameter names treated as a method receiver.
const RECEIVER_NAMES: &[&str] = &["self", "cls"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Module,
    Class,
    Function,
    Method,
}

impl SymbolKind {
    /// Placeholder substituted when a symbol of this kind has no documentation
    pub fn placeholder(self) -> &'static str {
        match self {
            SymbolKind::Module => "No module-level description provided.",
            SymbolKind::Class => "No class docstring provided.",
            SymbolKind::Function => "No function docstring provided.",
            SymbolKind::Method => "No method docstring provided.",
        }
    }
}

/// Normalize optional documentation into the text stored in the model.
pub fn describe(doc: Option<String>, kind: SymbolKind) -> String {
    match doc {
        Some(text) if !text.trim().is_empty() => text,
        _ => kind.placeholder().to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParameterInfo {
    pub name: String,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FunctionInfo {
    pub name: String,
    pub kind: SymbolKind,
    /// Every declared parameter in declaration order, receiver included
    pub parameters: Vec<ParameterInfo>,
    pub returns: String,
    pub description: String,
}

impl FunctionInfo {
    pub fn new(
        name: impl Into<String>,
        kind: SymbolKind,
        parameters: Vec<ParameterInfo>,
        returns: Option<String>,
        doc: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            parameters,
            returns: returns.unwrap_or_else(|| VARIES.to_string()),
            description: describe(doc, kind),
        }
    }

    /// Parameters shown to readers.
    ///
    /// A method's leading `self`/`cls` receiver is hidden; functions show
    /// every parameter.
    pub fn display_parameters(&self) -> Vec<&str> {
        let skip = match (self.kind, self.parameters.first()) {
            (SymbolKind::Method, Some(first)) if RECEIVER_NAMES.contains(&first.name.as_str()) => 1,
            _ => 0,
        };

        self.parameters[skip..].iter().map(|p| p.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassInfo {
    pub name: String,
    pub bases: Vec<String>,
    pub description: String,
    pub methods: Vec<FunctionInfo>,
}

impl ClassInfo {
    pub fn new(
        name: impl Into<String>,
        bases: Vec<String>,
        doc: Option<String>,
        methods: Vec<FunctionInfo>,
    ) -> Self {
        Self {
            name: name.into(),
            bases,
            description: describe(doc, SymbolKind::Class),
            methods,
        }
    }
}

/// Position and message of the first syntax error in a primary-language source.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct ParseDiagnostic {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleInfo {
    pub description: String,
    pub classes: Vec<ClassInfo>,
    pub functions: Vec<FunctionInfo>,
    pub diagnostic: Option<ParseDiagnostic>,
}

impl ModuleInfo {
    pub fn new(doc: Option<String>, classes: Vec<ClassInfo>, functions: Vec<FunctionInfo>) -> Self {
        Self {
            description: describe(doc, SymbolKind::Module),
            classes,
            functions,
            diagnostic: None,
        }
    }

    /// Model for a source that failed to parse: the message replaces the
    /// description and no symbols are carried.
    pub fn from_diagnostic(diagnostic: ParseDiagnostic) -> Self {
        Self {
            description: diagnostic.message.clone(),
            classes: Vec::new(),
            functions: Vec::new(),
            diagnostic: Some(diagnostic),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.functions.is_empty()
    }

    /// Number of classes plus top-level functions
    pub fn symbol_count(&self) -> usize {
        self.classes.len() + self.functions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(names: &[&str]) -> Vec<ParameterInfo> {
        names.iter().map(|n| ParameterInfo::new(*n)).collect()
    }

    #[test]
    fn test_missing_docs_get_kind_placeholder() {
        let function = FunctionInfo::new("add", SymbolKind::Function, vec![], None, None);
        assert_eq!(function.description, "No function docstring provided.");
        assert_eq!(function.returns, VARIES);

        let class = ClassInfo::new("Foo", vec![], Some("   ".to_string()), vec![]);
        assert_eq!(class.description, "No class docstring provided.");

        let module = ModuleInfo::new(None, vec![], vec![]);
        assert_eq!(module.description, "No module-level description provided.");
        assert!(module.is_empty());
    }

    #[test]
    fn test_method_hides_leading_receiver_only() {
        let method = FunctionInfo::new(
            "greet",
            SymbolKind::Method,
            params(&["self", "name", "self"]),
            None,
            None,
        );
        assert_eq!(method.display_parameters(), vec!["name", "self"]);
        assert_eq!(method.parameters.len(), 3);

        let class_method =
            FunctionInfo::new("build", SymbolKind::Method, params(&["cls", "x"]), None, None);
        assert_eq!(class_method.display_parameters(), vec!["x"]);
    }

    #[test]
    fn test_function_displays_every_parameter() {
        let function =
            FunctionInfo::new("f", SymbolKind::Function, params(&["self", "a"]), None, None);
        assert_eq!(function.display_parameters(), vec!["self", "a"]);
    }

    #[test]
    fn test_diagnostic_replaces_description() {
        let module = ModuleInfo::from_diagnostic(ParseDiagnostic {
            message: "invalid syntax (line 1, column 11)".to_string(),
            line: 1,
            column: 11,
        });
        assert_eq!(module.description, "invalid syntax (line 1, column 11)");
        assert!(module.is_empty());
        assert!(module.diagnostic.is_some());
    }
}
