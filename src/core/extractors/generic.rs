use regex::Regex;
use tracing::debug;

use crate::core::classifier::LanguageLabel;
use crate::core::model::{ClassInfo, FunctionInfo, ModuleInfo, ParameterInfo, SymbolKind};
use super::SymbolExtractor;

/// Best-effort extractor for languages without an exact grammar.
///
/// Matches are approximate: anything shaped like `name(params) {` counts as a
/// function, control-flow statements included, and classes never own
/// methods.
pub struct GenericExtractor {
    class_pattern: Regex,
    function_pattern: Regex,
    arrow_pattern: Regex,
}

impl GenericExtractor {
    pub fn new() -> Self {
        Self {
            class_pattern: Regex::new(r"\bclass\s+([A-Za-z_][A-Za-z0-9_]*)")
                .expect("Invalid class regex"),
            function_pattern: Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\s*\(([^)]*)\)\s*\{")
                .expect("Invalid function regex"),
            arrow_pattern: Regex::new(
                r"\b([A-Za-z_][A-Za-z0-9_]*)\s*=\s*(?:async\s*)?\(([^)]*)\)\s*=>",
            )
            .expect("Invalid arrow function regex"),
        }
    }

    /// Approximate the classes and functions of `code`
    pub fn extract_generic(&self, code: &str, language: LanguageLabel) -> ModuleInfo {
        let classes: Vec<ClassInfo> = self
            .class_pattern
            .captures_iter(code)
            .map(|caps| ClassInfo::new(&caps[1], Vec::new(), None, Vec::new()))
            .collect();

        let mut hits: Vec<(usize, FunctionInfo)> = self
            .function_pattern
            .captures_iter(code)
            .chain(self.arrow_pattern.captures_iter(code))
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let function = FunctionInfo::new(
                    &caps[1],
                    SymbolKind::Function,
                    split_parameters(&caps[2]),
                    None,
                    None,
                );
                Some((whole.start(), function))
            })
            .collect();
        hits.sort_by_key(|(start, _)| *start);

        let functions: Vec<FunctionInfo> = hits.into_iter().map(|(_, function)| function).collect();

        debug!(
            "Heuristic extraction for {}: {} classes, {} functions",
            language,
            classes.len(),
            functions.len()
        );

        ModuleInfo::new(leading_comment(code), classes, functions)
    }
}

impl Default for GenericExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolExtractor for GenericExtractor {
    fn extract(&mut self, code: &str, language: LanguageLabel) -> ModuleInfo {
        self.extract_generic(code, language)
    }

    fn strategy_name(&self) -> &str {
        "heuristic"
    }
}

fn split_parameters(list: &str) -> Vec<ParameterInfo> {
    list.split(',')
        .map(str::trim)
        .filter(|param| !param.is_empty())
        .map(ParameterInfo::new)
        .collect()
}

/// File-level comment block preceding the first line of code
fn leading_comment(code: &str) -> Option<String> {
    let mut doc_lines = Vec::new();
    let mut in_block = false;

    for line in code.lines() {
        let trimmed = line.trim();

        if in_block {
            let done = trimmed.ends_with("*/");
            let content = trimmed.trim_end_matches("*/").trim_start_matches('*').trim();
            if !content.is_empty() {
                doc_lines.push(content.to_string());
            }
            if done {
                break;
            }
        } else if trimmed.starts_with("/*") {
            let content = trimmed.trim_start_matches("/*").trim_start_matches('*');
            if let Some(single) = content.trim_end().strip_suffix("*/") {
                let single = single.trim();
                if !single.is_empty() {
                    doc_lines.push(single.to_string());
                }
                break;
            }
            if !content.trim().is_empty() {
                doc_lines.push(content.trim().to_string());
            }
            in_block = true;
        } else if trimmed.starts_with("//") {
            let content = trimmed.trim_start_matches('/').trim();
            if !content.is_empty() {
                doc_lines.push(content.to_string());
            }
        } else if trimmed == "#" || trimmed.starts_with("# ") {
            let content = trimmed.trim_start_matches('#').trim();
            if !content.is_empty() {
                doc_lines.push(content.to_string());
            }
        } else if trimmed.is_empty() || is_preamble(trimmed) {
            continue;
        } else {
            // Hit code, stop looking for file-level docs
            break;
        }
    }

    if doc_lines.is_empty() {
        None
    } else {
        Some(doc_lines.join(" "))
    }
}

fn is_preamble(line: &str) -> bool {
    const PREFIXES: &[&str] = &["import ", "package ", "use ", "using ", "require", "<?php", "#!"];
    PREFIXES.iter().any(|prefix| line.starts_with(prefix))
}
