use indexmap::IndexMap;
use tracing::debug;
use tree_sitter::{Node, Parser};

use crate::core::classifier::LanguageLabel;
use crate::core::model::{
    ClassInfo, FunctionInfo, ModuleInfo, ParameterInfo, ParseDiagnostic, SymbolKind, UNKNOWN_BASE,
};
use crate::error::{CodedocError, Result};
use super::SymbolExtractor;

/// Python extractor backed by the tree-sitter Python grammar
pub struct PythonExtractor {
    parser: Parser,
}

impl PythonExtractor {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let python_language = tree_sitter_python::language();
        parser
            .set_language(&python_language)
            .map_err(|e| CodedocError::Parser(format!("Failed to set Python language: {}", e)))?;

        Ok(Self { parser })
    }

    /// Parse `code` and build its document model.
    ///
    /// Only direct children of the module and direct children of each class
    /// body are inspected. Any syntax error aborts extraction with a
    /// diagnostic pointing at the first offending node.
    pub fn extract_primary(&mut self, code: &str) -> std::result::Result<ModuleInfo, ParseDiagnostic> {
        let tree = self.parser.parse(code, None).ok_or_else(|| ParseDiagnostic {
            message: "parser produced no syntax tree".to_string(),
            line: 1,
            column: 1,
        })?;

        let root = tree.root_node();
        if root.has_error() {
            return Err(first_syntax_error(root));
        }

        let description = leading_docstring(root, code);

        // Keyed by name: a redefinition replaces the earlier class in place.
        let mut classes: IndexMap<String, ClassInfo> = IndexMap::new();
        let mut functions = Vec::new();

        let mut cursor = root.walk();
        for child in root.named_children(&mut cursor) {
            let definition = unwrap_decorated(child);
            match definition.kind() {
                "class_definition" => {
                    if let Some(class) = self.parse_class(definition, code) {
                        classes.insert(class.name.clone(), class);
                    }
                }
                "function_definition" => {
                    if let Some(function) = self.parse_function(definition, code, SymbolKind::Function) {
                        functions.push(function);
                    }
                }
                _ => {}
            }
        }

        debug!(
            "Extracted {} classes and {} functions from Python source",
            classes.len(),
            functions.len()
        );

        Ok(ModuleInfo::new(description, classes.into_values().collect(), functions))
    }

    fn parse_class(&self, node: Node, source: &str) -> Option<ClassInfo> {
        let name = node_text(node.child_by_field_name("name")?, source);

        let mut bases = Vec::new();
        if let Some(superclasses) = node.child_by_field_name("superclasses") {
            let mut cursor = superclasses.walk();
            for base in superclasses.named_children(&mut cursor) {
                if matches!(base.kind(), "keyword_argument" | "comment") {
                    continue;
                }
                let text = printable(base, source)
                    .or_else(|| bare_identifier(base, source))
                    .unwrap_or_else(|| UNKNOWN_BASE.to_string());
                bases.push(text);
            }
        }

        let mut methods = Vec::new();
        if let Some(body) = node.child_by_field_name("body") {
            let mut cursor = body.walk();
            for child in body.named_children(&mut cursor) {
                let definition = unwrap_decorated(child);
                if definition.kind() == "function_definition" {
                    if let Some(method) = self.parse_function(definition, source, SymbolKind::Method) {
                        methods.push(method);
                    }
                }
            }
        }

        let docs = node
            .child_by_field_name("body")
            .and_then(|body| leading_docstring(body, source));

        Some(ClassInfo::new(name, bases, docs, methods))
    }

    fn parse_function(&self, node: Node, source: &str, kind: SymbolKind) -> Option<FunctionInfo> {
        let name = node_text(node.child_by_field_name("name")?, source);

        let parameters = node
            .child_by_field_name("parameters")
            .map(|params| parameter_names(params, source))
            .unwrap_or_default();

        let returns = node
            .child_by_field_name("return_type")
            .and_then(|annotation| printable(annotation, source));

        let docs = node
            .child_by_field_name("body")
            .and_then(|body| leading_docstring(body, source));

        Some(FunctionInfo::new(name, kind, parameters, returns, docs))
    }
}

impl SymbolExtractor for PythonExtractor {
    fn extract(&mut self, code: &str, _language: LanguageLabel) -> ModuleInfo {
        match self.extract_primary(code) {
            Ok(module) => module,
            Err(diagnostic) => {
                debug!("Python parse failed: {}", diagnostic);
                ModuleInfo::from_diagnostic(diagnostic)
            }
        }
    }

    fn strategy_name(&self) -> &str {
        "python-ast"
    }
}

/// Extract text content of a node
fn node_text(node: Node, source: &str) -> String {
    source[node.byte_range()].to_string()
}

/// Decorators are ignored: a decorated definition stands for what it wraps.
fn unwrap_decorated(node: Node<'_>) -> Node<'_> {
    if node.kind() == "decorated_definition" {
        node.child_by_field_name("definition").unwrap_or(node)
    } else {
        node
    }
}

/// Single-line source text of an expression, or `None` when it cannot be printed
fn printable(node: Node, source: &str) -> Option<String> {
    if node.is_missing() || node.has_error() {
        return None;
    }

    let text = node_text(node, source)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn bare_identifier(node: Node, source: &str) -> Option<String> {
    if node.kind() == "identifier" {
        return Some(node_text(node, source));
    }

    let mut cursor = node.walk();
    let identifier = node
        .named_children(&mut cursor)
        .find(|child| child.kind() == "identifier");
    identifier.map(|child| node_text(child, source))
}

/// Names of every declared parameter, in order
fn parameter_names(params: Node, source: &str) -> Vec<ParameterInfo> {
    let mut cursor = params.walk();
    params
        .named_children(&mut cursor)
        .filter_map(|param| match param.kind() {
            "identifier" | "list_splat_pattern" | "dictionary_splat_pattern" | "tuple_pattern" => {
                Some(node_text(param, source))
            }
            "default_parameter" | "typed_default_parameter" => param
                .child_by_field_name("name")
                .map(|name| node_text(name, source)),
            "typed_parameter" => param.named_child(0).map(|name| node_text(name, source)),
            // comments and the bare `*` / `/` separators
            _ => None,
        })
        .map(ParameterInfo::new)
        .collect()
}

/// Docstring of a module or block: its first statement, when that statement
/// is a lone string literal.
fn leading_docstring(block: Node, source: &str) -> Option<String> {
    let mut cursor = block.walk();
    let first = block
        .named_children(&mut cursor)
        .find(|child| child.kind() != "comment")?;

    if first.kind() != "expression_statement" || first.named_child_count() != 1 {
        return None;
    }

    let literal = first.named_child(0)?;
    let value = match literal.kind() {
        "string" => string_literal_value(&node_text(literal, source))?,
        // Adjacent literals join into one docstring: "a" "b" is "ab"
        "concatenated_string" => {
            let mut cursor = literal.walk();
            let parts = literal
                .named_children(&mut cursor)
                .filter(|part| part.kind() == "string")
                .map(|part| string_literal_value(&node_text(part, source)))
                .collect::<Option<Vec<String>>>()?;
            parts.concat()
        }
        _ => return None,
    };

    clean_docstring(&value)
}

/// Strip prefix and quotes from a string literal. Bytes and f-strings are
/// not documentation.
fn string_literal_value(raw: &str) -> Option<String> {
    let prefix_len = raw.find(|c: char| c == '"' || c == '\'')?;
    let prefix = raw[..prefix_len].to_ascii_lowercase();
    if prefix.contains('b') || prefix.contains('f') {
        return None;
    }

    let body = &raw[prefix_len..];
    let content = ["\"\"\"", "'''", "\"", "'"].into_iter().find_map(|quote| {
        (body.len() >= 2 * quote.len() && body.starts_with(quote) && body.ends_with(quote))
            .then(|| &body[quote.len()..body.len() - quote.len()])
    })?;

    if prefix.contains('r') {
        Some(content.to_string())
    } else {
        Some(unescape(content))
    }
}

/// Resolve backslash escapes of a non-raw literal. Unrecognized escapes keep
/// their backslash.
fn unescape(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let Some(next) = chars.next() else {
            out.push('\\');
            break;
        };

        match next {
            // line continuation
            '\n' => {}
            '\\' | '\'' | '"' => out.push(next),
            'a' => out.push('\u{07}'),
            'b' => out.push('\u{08}'),
            'f' => out.push('\u{0C}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'v' => out.push('\u{0B}'),
            '0'..='7' => {
                let mut digits = String::from(next);
                while digits.len() < 3 {
                    match chars.peek() {
                        Some(&d) if ('0'..='7').contains(&d) => {
                            digits.push(d);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                match u32::from_str_radix(&digits, 8).ok().and_then(char::from_u32) {
                    Some(ch) => out.push(ch),
                    None => {
                        out.push('\\');
                        out.push_str(&digits);
                    }
                }
            }
            'x' | 'u' | 'U' => {
                let width = match next {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars
                    .clone()
                    .take(width)
                    .take_while(|d| d.is_ascii_hexdigit())
                    .collect();
                let decoded = if digits.len() == width {
                    u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
                } else {
                    None
                };
                match decoded {
                    Some(ch) => {
                        out.push(ch);
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    None => {
                        out.push('\\');
                        out.push(next);
                    }
                }
            }
            other => {
                out.push('\\');
                out.push(other);
            }
        }
    }

    out
}

/// Normalize docstring indentation the way `inspect.cleandoc` does: the first
/// line is left-trimmed, the rest lose their common margin, and blank lines
/// at either end are dropped.
fn clean_docstring(text: &str) -> Option<String> {
    let expanded = text.replace('\t', "        ");
    let lines: Vec<&str> = expanded.lines().collect();

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let cleaned: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                line.trim()
            } else if line.trim().is_empty() {
                ""
            } else {
                line.get(margin..).unwrap_or_else(|| line.trim_start()).trim_end()
            }
        })
        .collect();

    let start = cleaned.iter().position(|line| !line.is_empty())?;
    let end = cleaned.iter().rposition(|line| !line.is_empty())?;

    Some(cleaned[start..=end].join("\n"))
}

fn first_syntax_error(root: Node) -> ParseDiagnostic {
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if node.is_error() || node.is_missing() {
            let position = node.start_position();
            let (line, column) = (position.row + 1, position.column + 1);
            let message = if node.is_missing() {
                format!("missing \"{}\" (line {}, column {})", node.kind(), line, column)
            } else {
                format!("invalid syntax (line {}, column {})", line, column)
            };
            return ParseDiagnostic { message, line, column };
        }

        // Push in reverse so the leftmost child is examined first.
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }

    ParseDiagnostic {
        message: "invalid syntax".to_string(),
        line: 1,
        column: 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#""""Utilities for greeting people."""

import os


class Base:
    pass


class Greeter(Base, mixins.Loggable, metaclass=Meta):
    """Say hello.

    Longer text.
    """

    def __init__(self, name: str, loud=False):
        self.name = name

    @property
    def title(self) -> str:
        """Formatted title."""
        return self.name.title()

    async def fetch(self, *args, **kwargs) -> Optional[dict]:
        pass

    class Inner:
        def hidden(self):
            pass


def helper(x, *, flag: bool = True):
    def nested():
        pass
    return x


if __name__ == "__main__":
    def not_top_level():
        pass
"#;

    fn names(params: &[ParameterInfo]) -> Vec<&str> {
        params.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_simple_function() {
        let mut extractor = PythonExtractor::new().unwrap();
        let module = extractor.extract_primary("def add(a, b):\n    return a + b").unwrap();

        assert_eq!(module.description, "No module-level description provided.");
        assert!(module.classes.is_empty());
        assert_eq!(module.functions.len(), 1);

        let add = &module.functions[0];
        assert_eq!(add.name, "add");
        assert_eq!(names(&add.parameters), vec!["a", "b"]);
        assert_eq!(add.returns, "varies");
        assert_eq!(add.description, "No function docstring provided.");
    }

    #[test]
    fn test_module_classes_and_methods() {
        let mut extractor = PythonExtractor::new().unwrap();
        let module = extractor.extract_primary(SAMPLE).unwrap();

        assert_eq!(module.description, "Utilities for greeting people.");

        let class_names: Vec<&str> = module.classes.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(class_names, vec!["Base", "Greeter"]);

        let base = &module.classes[0];
        assert!(base.bases.is_empty());
        assert!(base.methods.is_empty());
        assert_eq!(base.description, "No class docstring provided.");

        let greeter = &module.classes[1];
        assert_eq!(greeter.bases, vec!["Base", "mixins.Loggable"]);
        assert_eq!(greeter.description, "Say hello.\n\nLonger text.");

        let method_names: Vec<&str> = greeter.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(method_names, vec!["__init__", "title", "fetch"]);

        let init = &greeter.methods[0];
        assert_eq!(init.kind, SymbolKind::Method);
        assert_eq!(names(&init.parameters), vec!["self", "name", "loud"]);
        assert_eq!(init.display_parameters(), vec!["name", "loud"]);
        assert_eq!(init.returns, "varies");
        assert_eq!(init.description, "No method docstring provided.");

        let title = &greeter.methods[1];
        assert_eq!(title.returns, "str");
        assert_eq!(title.description, "Formatted title.");

        let fetch = &greeter.methods[2];
        assert_eq!(names(&fetch.parameters), vec!["self", "*args", "**kwargs"]);
        assert_eq!(fetch.returns, "Optional[dict]");
    }

    #[test]
    fn test_only_top_level_functions_are_collected() {
        let mut extractor = PythonExtractor::new().unwrap();
        let module = extractor.extract_primary(SAMPLE).unwrap();

        let function_names: Vec<&str> = module.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(function_names, vec!["helper"]);
        assert_eq!(names(&module.functions[0].parameters), vec!["x", "flag"]);
    }

    #[test]
    fn test_redefined_class_keeps_first_position() {
        let code = "class A:\n    def one(self):\n        pass\n\n\
                    class B:\n    pass\n\n\
                    class A:\n    def two(self):\n        pass\n";
        let mut extractor = PythonExtractor::new().unwrap();
        let module = extractor.extract_primary(code).unwrap();

        assert_eq!(module.classes.len(), 2);
        assert_eq!(module.classes[0].name, "A");
        assert_eq!(module.classes[0].methods[0].name, "two");
        assert_eq!(module.classes[1].name, "B");
    }

    #[test]
    fn test_decorated_class_is_collected() {
        let code = "@dataclass\nclass Point:\n    \"\"\"A point.\"\"\"\n    x: int\n";
        let mut extractor = PythonExtractor::new().unwrap();
        let module = extractor.extract_primary(code).unwrap();

        assert_eq!(module.classes.len(), 1);
        assert_eq!(module.classes[0].name, "Point");
        assert_eq!(module.classes[0].description, "A point.");
    }

    #[test]
    fn test_docstring_after_comment() {
        let code = "# header comment\n'''Real doc.'''\n";
        let mut extractor = PythonExtractor::new().unwrap();
        let module = extractor.extract_primary(code).unwrap();
        assert_eq!(module.description, "Real doc.");
    }

    #[test]
    fn test_bytes_literal_is_not_a_docstring() {
        let code = "b\"not documentation\"\n";
        let mut extractor = PythonExtractor::new().unwrap();
        let module = extractor.extract_primary(code).unwrap();
        assert_eq!(module.description, "No module-level description provided.");
    }

    #[test]
    fn test_syntax_error_yields_diagnostic() {
        let mut extractor = PythonExtractor::new().unwrap();
        let diagnostic = extractor.extract_primary("def broken(:").unwrap_err();
        assert_eq!(diagnostic.line, 1);
        assert!(!diagnostic.message.is_empty());
        assert!(diagnostic.message.contains("line 1"));

        let module = extractor.extract("def broken(:", LanguageLabel::Python);
        assert_eq!(module.diagnostic.as_ref(), Some(&diagnostic));
        assert_eq!(module.description, diagnostic.message);
        assert!(module.is_empty());
    }

    #[test]
    fn test_empty_source() {
        let mut extractor = PythonExtractor::new().unwrap();
        let module = extractor.extract("", LanguageLabel::Python);
        assert_eq!(module.description, "No module-level description provided.");
        assert!(module.is_empty());
        assert!(module.diagnostic.is_none());
    }

    #[test]
    fn test_clean_docstring_dedents() {
        assert_eq!(
            clean_docstring("\n    First.\n\n      Indented.\n    ").as_deref(),
            Some("First.\n\n  Indented.")
        );
        assert_eq!(clean_docstring("   \n  "), None);
    }

    #[test]
    fn test_concatenated_docstring_is_joined() {
        let code = "def f():\n    \"first \" 'second'\n    return 1\n";
        let mut extractor = PythonExtractor::new().unwrap();
        let module = extractor.extract_primary(code).unwrap();
        assert_eq!(module.functions[0].description, "first second");

        let mixed = "\"plain\" f\"{x}\"\n";
        let module = extractor.extract_primary(mixed).unwrap();
        assert_eq!(module.description, "No module-level description provided.");
    }

    #[test]
    fn test_docstring_escapes_are_resolved() {
        let code = "\"\"\"Line one\\nstill one\"\"\"\n";
        let mut extractor = PythonExtractor::new().unwrap();
        let module = extractor.extract_primary(code).unwrap();
        assert_eq!(module.description, "Line one\nstill one");

        let raw = "r\"\"\"Keep \\n raw\"\"\"\n";
        let module = extractor.extract_primary(raw).unwrap();
        assert_eq!(module.description, "Keep \\n raw");
    }

    #[test]
    fn test_unescape_sequences() {
        assert_eq!(unescape(r"tab\there"), "tab\there");
        assert_eq!(unescape(r"it\'s \x41é\101"), "it's A\u{e9}A");
        assert_eq!(unescape(r"keep \d and \xZZ"), r"keep \d and \xZZ");
        assert_eq!(unescape("joined \\\nline"), "joined line");
    }

    #[test]
    fn test_string_literal_prefixes() {
        assert_eq!(string_literal_value("r'''raw'''").as_deref(), Some("raw"));
        assert_eq!(string_literal_value("\"plain\"").as_deref(), Some("plain"));
        assert_eq!(string_literal_value("f\"{x}\""), None);
    }
}
