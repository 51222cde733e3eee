use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::CodedocError;
use super::{
    classify_from_extension, AuditTarget, FileLookup, GenericExtractor, LanguageClassifier,
    LanguageLabel, ModuleInfo, NotesStore, OutputStore, ProjectScanner, PromptBuilder, PromptKind,
    PythonExtractor, RenderedDoc, Renderer, SourceMeta, SymbolExtractor,
};

/// Outcome of documenting one source text in memory
#[derive(Debug, Clone, Serialize)]
pub struct Documentation {
    pub language: LanguageLabel,
    pub module: ModuleInfo,
    pub rendered: RenderedDoc,
}

/// Paths written by a persisted documentation run
#[derive(Debug, Clone, Serialize)]
pub struct SavedDocumentation {
    pub status: &'static str,
    pub doc: PathBuf,
    pub notes: PathBuf,
    pub language: String,
}

/// Main orchestration engine: classify, extract, render, persist
pub struct Engine {
    config: Config,
    classifier: LanguageClassifier,
    python: PythonExtractor,
    generic: GenericExtractor,
    renderer: Renderer,
    prompts: PromptBuilder,
    outputs: OutputStore,
    notes: NotesStore,
    scanner: ProjectScanner,
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;

        debug!("Loaded configuration: {:?}", config);

        Self::with_config(config)
    }

    pub fn with_config(config: Config) -> Result<Self> {
        let python = PythonExtractor::new()?;
        let renderer = Renderer::new(&config.templates)?;
        let prompts = PromptBuilder::new(&config.templates)?;

        Ok(Self {
            classifier: LanguageClassifier::new(),
            python,
            generic: GenericExtractor::new(),
            renderer,
            prompts,
            outputs: OutputStore::new(&config.output),
            notes: NotesStore::new(&config.output),
            scanner: ProjectScanner::new(&config),
            config,
        })
    }

    /// Extension first when a path is given, content otherwise
    pub fn resolve_language(&self, code: &str, path: Option<&Path>) -> LanguageLabel {
        match path.map(classify_from_extension) {
            Some(label) if label != LanguageLabel::Unknown => label,
            _ => self.classifier.classify(code),
        }
    }

    /// Classify, extract and render `code` without touching the filesystem
    pub fn document(
        &mut self,
        code: &str,
        source_hint: Option<&str>,
        path: Option<&Path>,
        generated_at: Option<&str>,
    ) -> Result<Documentation> {
        let language = self.resolve_language(code, path);

        let extractor: &mut dyn SymbolExtractor = if language.is_primary() {
            &mut self.python
        } else {
            &mut self.generic
        };
        debug!("Extracting {} with {} strategy", language, extractor.strategy_name());
        let module = extractor.extract(code, language);

        if let Some(diagnostic) = &module.diagnostic {
            warn!("{} source did not parse: {}", language.display_name(), diagnostic);
        } else {
            debug!("Extracted {} symbols", module.symbol_count());
        }

        let mut meta = SourceMeta::new(code, source_hint);
        if let Some(timestamp) = generated_at {
            meta = meta.generated_at(timestamp);
        }
        let rendered = self.renderer.render(&module, language, &meta)?;

        Ok(Documentation {
            language,
            module,
            rendered,
        })
    }

    /// Document `code` and write `documentation_{language}_{timestamp}.md`
    /// plus the matching notes file
    pub async fn generate_documentation(
        &mut self,
        code: &str,
        source_hint: Option<&str>,
    ) -> Result<SavedDocumentation> {
        let timestamp = self.timestamp();
        let documentation = self.document(code, source_hint, None, Some(timestamp.as_str()))?;
        let stem = format!("{}_{}", documentation.language.name(), timestamp);

        self.save(documentation, &stem).await
    }

    /// Read a source file for documentation: refuses missing files and files
    /// above `parsing.max_file_size`, decodes invalid UTF-8 lossily
    pub async fn read_source(&self, path: &Path) -> Result<String> {
        if !path.is_file() {
            return Err(CodedocError::NotFound(path.to_path_buf()).into());
        }

        let size = tokio::fs::metadata(path).await?.len();
        let limit = self.config.parsing.max_file_size;
        if size > limit {
            return Err(CodedocError::FileTooLarge {
                path: path.to_path_buf(),
                size,
                limit,
            }
            .into());
        }

        let bytes = tokio::fs::read(path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Document a file on disk, named after its basename. The notes header
    /// records `source_hint`, or the path when no hint is given.
    pub async fn generate_from_path(
        &mut self,
        path: &Path,
        source_hint: Option<&str>,
    ) -> Result<SavedDocumentation> {
        let code = self.read_source(path).await?;
        let hint = source_hint
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());

        let timestamp = self.timestamp();
        let documentation = self.document(&code, Some(hint.as_str()), Some(path), Some(timestamp.as_str()))?;

        let basename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let stem = format!("{}_{}_{}", basename, documentation.language.name(), timestamp);

        self.save(documentation, &stem).await
    }

    async fn save(&self, documentation: Documentation, stem: &str) -> Result<SavedDocumentation> {
        let saved = self.outputs.persist(&documentation.rendered, stem).await?;

        info!("Documentation written to {}", saved.doc.display());
        info!("Notes written to {}", saved.notes.display());

        Ok(SavedDocumentation {
            status: "success",
            doc: saved.doc,
            notes: saved.notes,
            language: documentation.language.name().to_string(),
        })
    }

    fn timestamp(&self) -> String {
        chrono::Local::now()
            .format(&self.config.output.timestamp_format)
            .to_string()
    }

    /// Write a default configuration file into `path` (or the current directory)
    pub async fn init(&self, path: Option<PathBuf>) -> Result<PathBuf> {
        let target_dir = path.unwrap_or_else(|| PathBuf::from("."));
        info!("Initializing codedoc in: {}", target_dir.display());

        tokio::fs::create_dir_all(&target_dir).await?;
        let config_path = target_dir.join("codedoc.toml");
        if config_path.exists() {
            warn!("{} already exists, leaving it untouched", config_path.display());
        } else {
            Config::default().save(&config_path)?;
        }

        Ok(config_path)
    }

    pub async fn add_note(&self, note: &str) -> Result<()> {
        self.notes.add_note(note).await?;
        info!("Note added");
        Ok(())
    }

    pub async fn manual_notes(&self) -> Result<String> {
        Ok(self
            .notes
            .read_manual()
            .await?
            .unwrap_or_else(|| "No manual notes found.".to_string()))
    }

    pub async fn latest_notes(&self) -> Result<String> {
        Ok(match self.notes.latest_notes().await? {
            Some(latest) if latest.content.is_empty() => {
                format!("Latest notes file {} is empty.", latest.file_name)
            }
            Some(latest) => format!("Latest Notes from {}:\n\n{}", latest.file_name, latest.content),
            None => "No auto-generated documentation notes found.".to_string(),
        })
    }

    /// Final line of the newest generated notes, usually the completion marker
    pub async fn latest_note_line(&self) -> Result<String> {
        Ok(self
            .notes
            .latest_line()
            .await?
            .unwrap_or_else(|| "No auto-generated documentation notes found.".to_string()))
    }

    fn project_root(&self, root: Option<PathBuf>) -> PathBuf {
        root.unwrap_or_else(|| self.config.project.root.clone())
    }

    /// Relative paths of every documentable file in the project
    pub fn scan(&self, root: Option<PathBuf>) -> Result<Vec<PathBuf>> {
        let root = self.project_root(root);
        info!("Scanning {} for documentable files", root.display());

        let files = self.scanner.documentable_files(&root)?;
        info!("Found {} documentable files", files.len());
        Ok(files)
    }

    /// Secret audit of the project. Without a target the full rule table
    /// runs over every scannable file; with one, the guardian rules run
    /// over just the targeted files.
    pub fn audit(&self, root: Option<PathBuf>, target: Option<AuditTarget>) -> Result<String> {
        let root = self.project_root(root);

        let Some(target) = target else {
            info!("Auditing {} for hardcoded secrets", root.display());
            let findings = self.scanner.scan_secrets(&root)?;
            if !findings.is_empty() {
                warn!("Found {} potential secrets", findings.len());
            }
            return Ok(self.scanner.secret_report(&findings));
        };

        info!("Guardian scan of {} ({:?})", root.display(), target);
        let findings = self.scanner.guardian_scan(&root, &target)?;
        if !findings.is_empty() {
            warn!("Found {} potential secrets", findings.len());
        }
        Ok(self.scanner.guardian_report(&findings))
    }

    pub fn impact(&self, file: &Path, symbol: Option<&str>, root: Option<PathBuf>) -> Result<String> {
        let root = self.project_root(root);
        let report = self.scanner.predict_impact(&root, file, symbol)?;
        debug!("Impact query `{}` matched {} lines", report.query, report.hits.len());
        Ok(self.scanner.impact_report(&report))
    }

    /// Find `file` by basename anywhere in the project and build a
    /// refactoring prompt around its contents. Several matches produce a
    /// question listing them instead of a prompt.
    pub async fn refactor(
        &self,
        file: &Path,
        rules: Option<&str>,
        kind: PromptKind,
        root: Option<PathBuf>,
    ) -> Result<String> {
        let root = self.project_root(root);

        let relative = match self.scanner.locate(&root, file)? {
            FileLookup::Unique(relative) => relative,
            FileLookup::Ambiguous(matches) => {
                let listed: Vec<String> = matches
                    .iter()
                    .map(|path| format!("- {}", path.display()))
                    .collect();
                return Ok(format!(
                    "Multiple matches found. Which one should I refactor?\n{}",
                    listed.join("\n")
                ));
            }
            FileLookup::NotFound => {
                return Err(CodedocError::NotFound(root.join(file)).into());
            }
        };

        debug!("Resolved {} to {}", file.display(), relative.display());
        let code = self.read_source(&root.join(&relative)).await?;
        Ok(self.prompts.build(kind, &relative, &code, rules)?)
    }
}
