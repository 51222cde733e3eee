//! Deterministic rendering of a [`ModuleInfo`] into markdown and notes.
//!
//! Markdown goes through a Tera template (built in, or `module.md` from the
//! configured template directory). Notes are assembled line by line. Nothing
//! here reads the clock: a generation timestamp only appears when the caller
//! supplies one in [`SourceMeta`].

use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::config::TemplateConfig;
use crate::error::Result;
use super::classifier::LanguageLabel;
use super::model::{ClassInfo, FunctionInfo, ModuleInfo};

const TEMPLATE_NAME: &str = "module.md";
const DEFAULT_TEMPLATE: &str = include_str!("templates/module.md");

/// Last line of every notes file
pub const COMPLETION_MARKER: &str = "Static analysis completed.";

/// Notes line used when neither classes nor functions were found
pub const NO_ITEMS: &str = "No items detected; empty analysis result.";

/// Rendered outputs for one source text
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedDoc {
    pub markdown: String,
    pub notes: String,
}

/// Facts about the source that appear in the notes header
#[derive(Debug, Clone, Default)]
pub struct SourceMeta<'a> {
    pub source_hint: Option<&'a str>,
    pub char_count: usize,
    pub line_count: usize,
    pub generated_at: Option<&'a str>,
}

impl<'a> SourceMeta<'a> {
    pub fn new(code: &str, source_hint: Option<&'a str>) -> Self {
        Self {
            source_hint: source_hint.filter(|hint| !hint.is_empty()),
            char_count: code.chars().count(),
            line_count: code.lines().count(),
            generated_at: None,
        }
    }

    pub fn generated_at(mut self, timestamp: &'a str) -> Self {
        self.generated_at = Some(timestamp);
        self
    }
}

#[derive(Serialize)]
struct DocumentView<'a> {
    title: &'a str,
    fence: &'a str,
    description: &'a str,
    parse_error: Option<&'a str>,
    classes: Vec<ClassView<'a>>,
    functions: Vec<SymbolView<'a>>,
}

#[derive(Serialize)]
struct ClassView<'a> {
    name: &'a str,
    bases: String,
    description: &'a str,
    example: Option<String>,
    methods: Vec<SymbolView<'a>>,
}

#[derive(Serialize)]
struct SymbolView<'a> {
    header: String,
    description: &'a str,
    params: Vec<&'a str>,
    returns: &'a str,
    example: String,
}

pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new(config: &TemplateConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        let custom = config
            .template_dir
            .as_ref()
            .map(|dir| dir.join(TEMPLATE_NAME))
            .filter(|path| path.is_file());

        match custom {
            Some(path) => {
                debug!("Using markdown template {}", path.display());
                tera.add_template_file(&path, Some(TEMPLATE_NAME))?;
            }
            None => tera.add_raw_template(TEMPLATE_NAME, DEFAULT_TEMPLATE)?,
        }

        Ok(Self { tera })
    }

    /// Render `module` into markdown and notes.
    ///
    /// Identical inputs always give byte-identical output.
    pub fn render(
        &self,
        module: &ModuleInfo,
        language: LanguageLabel,
        meta: &SourceMeta,
    ) -> Result<RenderedDoc> {
        let markdown = self.render_markdown(module, language)?;
        let notes = render_notes(module, language, meta);
        Ok(RenderedDoc { markdown, notes })
    }

    fn render_markdown(&self, module: &ModuleInfo, language: LanguageLabel) -> Result<String> {
        let view = DocumentView {
            title: language.display_name(),
            fence: fence_for(language),
            description: &module.description,
            parse_error: module.diagnostic.as_ref().map(|d| d.message.as_str()),
            classes: module
                .classes
                .iter()
                .map(|class| class_view(class, language))
                .collect(),
            functions: module
                .functions
                .iter()
                .map(|function| function_view(function, language))
                .collect(),
        };

        let context = Context::from_serialize(&view)?;
        Ok(self.tera.render(TEMPLATE_NAME, &context)?)
    }
}

fn fence_for(language: LanguageLabel) -> &'static str {
    match language {
        LanguageLabel::Unknown => "",
        other => other.name(),
    }
}

fn joined_or_none(items: &[impl AsRef<str>]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items.iter().map(|item| item.as_ref()).collect::<Vec<_>>().join(", ")
    }
}

fn placeholders(count: usize) -> String {
    vec!["..."; count].join(", ")
}

fn class_view(class: &ClassInfo, language: LanguageLabel) -> ClassView<'_> {
    let example = if language.is_primary() {
        None
    } else {
        Some(format!("{0} instance = new {0}();", class.name))
    };

    ClassView {
        name: &class.name,
        bases: joined_or_none(&class.bases),
        description: &class.description,
        example,
        methods: class
            .methods
            .iter()
            .map(|method| method_view(method, &class.name, language))
            .collect(),
    }
}

fn method_view<'a>(method: &'a FunctionInfo, owner: &str, language: LanguageLabel) -> SymbolView<'a> {
    let params = method.display_parameters();
    let args = placeholders(params.len());
    let example = if language.is_primary() {
        format!(
            "# Example usage of {name}()\ninstance = {owner}(...)\nresult = instance.{name}({args})\nprint(result)",
            name = method.name,
        )
    } else {
        format!("instance.{}({});", method.name, args)
    };

    symbol_view(method, params, example)
}

fn function_view(function: &FunctionInfo, language: LanguageLabel) -> SymbolView<'_> {
    let params = function.display_parameters();
    let args = placeholders(params.len());
    let example = if language.is_primary() {
        format!(
            "# Example usage of {name}()\nresult = {name}({args})\nprint(result)",
            name = function.name,
        )
    } else {
        format!("{}({});", function.name, args)
    };

    symbol_view(function, params, example)
}

fn symbol_view<'a>(function: &'a FunctionInfo, params: Vec<&'a str>, example: String) -> SymbolView<'a> {
    SymbolView {
        header: format!("{}({})", function.name, params.join(", ")),
        description: &function.description,
        params,
        returns: &function.returns,
        example,
    }
}

fn render_notes(module: &ModuleInfo, language: LanguageLabel, meta: &SourceMeta) -> String {
    let mut lines = vec![
        format!("Detected Language: {}", language.name()),
        format!("Source hint: {}", meta.source_hint.unwrap_or("N/A")),
        format!("Character count: {}", meta.char_count),
        format!("Line count: {}", meta.line_count),
    ];
    if let Some(timestamp) = meta.generated_at {
        lines.push(format!("Generated at: {}", timestamp));
    }
    lines.push(String::new());

    lines.extend(symbol_notes(module, language));
    lines.push(COMPLETION_MARKER.to_string());

    lines.join("\n")
}

fn symbol_notes(module: &ModuleInfo, language: LanguageLabel) -> Vec<String> {
    if let Some(diagnostic) = &module.diagnostic {
        return vec![
            format!("{} parse error.", language.display_name()),
            diagnostic.message.clone(),
        ];
    }

    // The heuristic path still reports each empty category on its own line.
    if module.is_empty() && language.is_primary() {
        return vec![NO_ITEMS.to_string()];
    }

    let suffix = if language.is_primary() { "" } else { " (generic parsing)" };
    let mut lines = Vec::new();

    if module.classes.is_empty() {
        lines.push(format!("No classes detected{}.", suffix));
    }
    for class in &module.classes {
        lines.push(format!(
            "- Class: {} | Inherits: {}",
            class.name,
            joined_or_none(&class.bases)
        ));
        if class.methods.is_empty() {
            lines.push("  - No methods detected.".to_string());
        }
        for method in &class.methods {
            lines.push(format!(
                "  - Method: {} | Params: {} | Returns: {}",
                method.name,
                joined_or_none(&method.display_parameters()),
                method.returns
            ));
        }
    }

    if module.functions.is_empty() {
        lines.push(format!("No functions detected{}.", suffix));
    }
    for function in &module.functions {
        lines.push(format!(
            "- Function: {} | Params: {} | Returns: {}",
            function.name,
            joined_or_none(&function.display_parameters()),
            function.returns
        ));
    }

    lines
}
