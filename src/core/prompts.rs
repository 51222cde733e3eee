//! Refactoring prompts built from a located source file.

use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};
use tracing::debug;

use crate::config::TemplateConfig;
use crate::error::Result;

const REFACTOR_TEMPLATE: &str = "refactor.md";
const HEALTH_AUDIT_TEMPLATE: &str = "health_audit.md";

const DEFAULT_REFACTOR: &str = include_str!("templates/refactor.md");
const DEFAULT_HEALTH_AUDIT: &str = include_str!("templates/health_audit.md");

const DEFAULT_REFACTOR_RULES: &str = "Apply SOLID, OOPS, and Clean Code standards.";
const DEFAULT_AUDIT_RULES: &str = "Apply standard high-quality optimizations.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    /// Plain refactoring request
    Refactor,
    /// Health report with a score, followed by optimized code
    HealthAudit,
}

#[derive(Serialize)]
struct PromptView<'a> {
    file_name: String,
    extension: String,
    project_path: String,
    rules: &'a str,
    code: &'a str,
}

pub struct PromptBuilder {
    tera: Tera,
}

impl PromptBuilder {
    pub fn new(config: &TemplateConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.autoescape_on(vec![]);

        for (name, builtin) in [
            (REFACTOR_TEMPLATE, DEFAULT_REFACTOR),
            (HEALTH_AUDIT_TEMPLATE, DEFAULT_HEALTH_AUDIT),
        ] {
            let custom = config
                .template_dir
                .as_ref()
                .map(|dir| dir.join(name))
                .filter(|path| path.is_file());

            match custom {
                Some(path) => {
                    debug!("Using prompt template {}", path.display());
                    tera.add_template_file(&path, Some(name))?;
                }
                None => tera.add_raw_template(name, builtin)?,
            }
        }

        Ok(Self { tera })
    }

    /// Prompt for `code`, read from `relative_path` under the project root.
    /// Blank `rules` fall back to the default for `kind`.
    pub fn build(
        &self,
        kind: PromptKind,
        relative_path: &Path,
        code: &str,
        rules: Option<&str>,
    ) -> Result<String> {
        let (template, default_rules) = match kind {
            PromptKind::Refactor => (REFACTOR_TEMPLATE, DEFAULT_REFACTOR_RULES),
            PromptKind::HealthAudit => (HEALTH_AUDIT_TEMPLATE, DEFAULT_AUDIT_RULES),
        };

        let view = PromptView {
            file_name: relative_path
                .file_name()
                .map(|name| name.to_string_lossy().to_string())
                .unwrap_or_default(),
            extension: relative_path
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
                .unwrap_or_default(),
            project_path: relative_path.display().to_string(),
            rules: rules.map(str::trim).filter(|r| !r.is_empty()).unwrap_or(default_rules),
            code,
        };

        let context = Context::from_serialize(&view)?;
        Ok(self.tera.render(template, &context)?)
    }
}
