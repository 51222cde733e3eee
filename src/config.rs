use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CodedocError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project configuration
    pub project: ProjectConfig,

    /// Source parsing limits and documentable file types
    pub parsing: ParsingConfig,

    /// Where rendered documentation and notes are written
    pub output: OutputConfig,

    /// Template customization
    pub templates: TemplateConfig,

    /// Secret and impact scanner settings
    pub scanning: ScanConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name
    pub name: String,

    /// Root directory walked by the scanners
    pub root: PathBuf,

    /// Directory names skipped while walking the project tree
    pub ignore_dirs: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsingConfig {
    /// File extensions considered documentable by `scan`
    pub documentable_extensions: Vec<String>,

    /// Maximum file size to document (in bytes)
    pub max_file_size: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Documentation output directory
    pub docs_dir: PathBuf,

    /// Generated notes output directory
    pub notes_dir: PathBuf,

    /// Free-text file holding manually added notes
    pub manual_notes_file: PathBuf,

    /// chrono format string used in generated file names
    pub timestamp_format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Directory holding `module.md`, `refactor.md` or `health_audit.md`
    /// overrides for the built-in templates
    pub template_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Extensions inspected by the secret scanner
    pub secret_extensions: Vec<String>,

    /// Extensions inspected by the impact scanner
    pub impact_extensions: Vec<String>,

    /// Extensions inspected by targeted and uncommitted audits
    #[serde(default = "default_guardian_extensions")]
    pub guardian_extensions: Vec<String>,

    /// Number of findings listed in a secret report
    pub max_findings: usize,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_guardian_extensions() -> Vec<String> {
    strings(&["ts", "tsx", "js", "py", "java", "cs", "cpp", "env"])
}

impl Default for Config {
    fn default() -> Self {
        Self {
            project: ProjectConfig {
                name: "Unnamed Project".to_string(),
                root: PathBuf::from("."),
                ignore_dirs: strings(&[
                    "node_modules",
                    ".git",
                    "__pycache__",
                    "venv",
                    ".env",
                    "dist",
                    "build",
                    "target",
                ]),
            },
            parsing: ParsingConfig {
                documentable_extensions: strings(&["py", "js", "ts", "java", "cpp", "cs"]),
                max_file_size: 1024 * 1024, // 1MB
            },
            output: OutputConfig {
                docs_dir: PathBuf::from("documentation"),
                notes_dir: PathBuf::from("documentation_notes"),
                manual_notes_file: PathBuf::from("notes.txt"),
                timestamp_format: "%Y-%m-%d_%H-%M-%S".to_string(),
            },
            templates: TemplateConfig { template_dir: None },
            scanning: ScanConfig {
                secret_extensions: strings(&[
                    "ts", "tsx", "js", "py", "java", "cs", "cpp", "h", "env", "yaml", "yml",
                ]),
                impact_extensions: strings(&["ts", "tsx", "js", "py", "java", "cs", "cpp", "h"]),
                guardian_extensions: default_guardian_extensions(),
                max_findings: 15,
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&content).map_err(|e| CodedocError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content =
            toml::to_string_pretty(self).map_err(|e| CodedocError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                let candidates = ["Codedoc.toml", "codedoc.toml", ".codedoc.toml"];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}
