use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use anyhow::Result;
use tokio::io::AsyncReadExt;

use crate::core::{AuditTarget, Documentation, Engine, PromptKind};

#[derive(Parser)]
#[command(name = "codedoc")]
#[command(about = "Markdown documentation and analysis notes straight from source code")]
#[command(version)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write a default codedoc.toml
    Init {
        /// Target directory (defaults to current directory)
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Document a file, an inline snippet, or stdin
    Document {
        /// Source file to document
        #[arg(short, long, conflicts_with = "code")]
        file: Option<PathBuf>,

        /// Inline source text
        #[arg(long)]
        code: Option<String>,

        /// Label recorded in the notes header
        #[arg(long)]
        source_hint: Option<String>,

        /// Print markdown and notes instead of writing files
        #[arg(long)]
        print: bool,

        /// Emit JSON: the saved paths, or the full analysis with --print
        #[arg(long)]
        json: bool,
    },

    /// List documentable files in the project
    Scan {
        /// Project root (defaults to the configured root)
        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Append a manual note
    Note {
        text: String,
    },

    /// Show generated or manual notes
    Notes {
        #[arg(long, value_enum, default_value_t = NoteSource::Latest)]
        source: NoteSource,
    },

    /// Search the project for hardcoded secrets
    Audit {
        #[arg(short, long)]
        root: Option<PathBuf>,

        /// Guardian scan of one file or directory
        #[arg(long, conflicts_with = "uncommitted")]
        path: Option<PathBuf>,

        /// Guardian scan of new and modified files in the git working tree
        #[arg(long)]
        uncommitted: bool,

        /// Guardian scan of the whole project
        #[arg(long, conflicts_with_all = ["path", "uncommitted"])]
        guardian: bool,
    },

    /// Build a refactoring prompt for a file found anywhere in the project
    Refactor {
        /// File name, matched against basenames ignoring case
        file: PathBuf,

        /// Rules to apply instead of the defaults
        #[arg(long)]
        rules: Option<String>,

        /// Ask for a scored health report before the optimized code
        #[arg(long)]
        health: bool,

        #[arg(short, long)]
        root: Option<PathBuf>,
    },

    /// Show where a file or symbol is referenced
    Impact {
        /// File whose stem is searched when no symbol is given
        file: PathBuf,

        #[arg(long)]
        symbol: Option<String>,

        #[arg(short, long)]
        root: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum NoteSource {
    /// Newest generated notes file
    Latest,
    /// Last line of the newest generated notes file
    Last,
    /// Manually added notes
    Manual,
}

impl Cli {
    pub async fn execute(self, mut engine: Engine) -> Result<()> {
        match self.command {
            Commands::Init { path } => {
                let config_path = engine.init(path).await?;
                println!("Configuration at {}", config_path.display());
                Ok(())
            }
            Commands::Document { file, code, source_hint, print, json } => {
                let saved = match (file, code) {
                    (Some(file), _) if !print => {
                        engine.generate_from_path(&file, source_hint.as_deref()).await?
                    }
                    (Some(file), _) => {
                        let code = engine.read_source(&file).await?;
                        let hint = source_hint.unwrap_or_else(|| file.display().to_string());
                        let doc = engine.document(&code, Some(hint.as_str()), Some(file.as_path()), None)?;
                        return print_documentation(&doc, json);
                    }
                    (None, code) => {
                        let code = match code {
                            Some(code) => code,
                            None => {
                                let mut buffer = String::new();
                                tokio::io::stdin().read_to_string(&mut buffer).await?;
                                buffer
                            }
                        };

                        if print {
                            let doc = engine.document(&code, source_hint.as_deref(), None, None)?;
                            return print_documentation(&doc, json);
                        }
                        engine.generate_documentation(&code, source_hint.as_deref()).await?
                    }
                };

                if json {
                    println!("{}", serde_json::to_string_pretty(&saved)?);
                } else {
                    println!("Documentation saved to {}", saved.doc.display());
                    println!("Notes saved to {}", saved.notes.display());
                }
                Ok(())
            }
            Commands::Scan { root } => {
                for file in engine.scan(root)? {
                    println!("{}", file.display());
                }
                Ok(())
            }
            Commands::Note { text } => {
                engine.add_note(&text).await
            }
            Commands::Notes { source } => {
                let text = match source {
                    NoteSource::Latest => engine.latest_notes().await?,
                    NoteSource::Last => engine.latest_note_line().await?,
                    NoteSource::Manual => engine.manual_notes().await?,
                };
                println!("{}", text);
                Ok(())
            }
            Commands::Audit { root, path, uncommitted, guardian } => {
                let target = match (path, uncommitted) {
                    (Some(path), _) => Some(AuditTarget::Path(path)),
                    (None, true) => Some(AuditTarget::Uncommitted),
                    (None, false) if guardian => Some(AuditTarget::Project),
                    (None, false) => None,
                };
                println!("{}", engine.audit(root, target)?);
                Ok(())
            }
            Commands::Refactor { file, rules, health, root } => {
                let kind = if health { PromptKind::HealthAudit } else { PromptKind::Refactor };
                println!("{}", engine.refactor(&file, rules.as_deref(), kind, root).await?);
                Ok(())
            }
            Commands::Impact { file, symbol, root } => {
                println!("{}", engine.impact(&file, symbol.as_deref(), root)?);
                Ok(())
            }
        }
    }
}

fn print_documentation(doc: &Documentation, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(doc)?);
    } else {
        println!("{}", doc.rendered.markdown);
        println!("---");
        println!("{}", doc.rendered.notes);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_arguments() {
        let cli = Cli::try_parse_from([
            "codedoc",
            "--verbose",
            "document",
            "--code",
            "def f(): pass",
            "--source-hint",
            "snippet",
            "--json",
        ])
        .unwrap();

        assert!(cli.verbose);
        match cli.command {
            Commands::Document { file, code, source_hint, print, json } => {
                assert!(file.is_none());
                assert_eq!(code.as_deref(), Some("def f(): pass"));
                assert_eq!(source_hint.as_deref(), Some("snippet"));
                assert!(!print);
                assert!(json);
            }
            _ => panic!("expected document command"),
        }
    }

    #[test]
    fn test_file_and_code_conflict() {
        let result = Cli::try_parse_from(["codedoc", "document", "--file", "a.py", "--code", "x"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_notes_source_defaults_to_latest() {
        let cli = Cli::try_parse_from(["codedoc", "notes"]).unwrap();
        assert!(matches!(cli.command, Commands::Notes { source: NoteSource::Latest }));

        let cli = Cli::try_parse_from(["codedoc", "notes", "--source", "manual"]).unwrap();
        assert!(matches!(cli.command, Commands::Notes { source: NoteSource::Manual }));
    }

    #[test]
    fn test_impact_arguments() {
        let cli = Cli::try_parse_from([
            "codedoc", "impact", "src/app.py", "--symbol", "compute", "--root", "proj",
        ])
        .unwrap();

        match cli.command {
            Commands::Impact { file, symbol, root } => {
                assert_eq!(file, PathBuf::from("src/app.py"));
                assert_eq!(symbol.as_deref(), Some("compute"));
                assert_eq!(root, Some(PathBuf::from("proj")));
            }
            _ => panic!("expected impact command"),
        }
    }

    #[test]
    fn test_audit_target_flags() {
        let cli = Cli::try_parse_from(["codedoc", "audit", "--path", "src/app.py"]).unwrap();
        match cli.command {
            Commands::Audit { path, uncommitted, guardian, .. } => {
                assert_eq!(path, Some(PathBuf::from("src/app.py")));
                assert!(!uncommitted);
                assert!(!guardian);
            }
            _ => panic!("expected audit command"),
        }

        let cli = Cli::try_parse_from(["codedoc", "audit", "--uncommitted"]).unwrap();
        assert!(matches!(cli.command, Commands::Audit { uncommitted: true, .. }));

        assert!(Cli::try_parse_from(["codedoc", "audit", "--path", "a", "--uncommitted"]).is_err());
        assert!(Cli::try_parse_from(["codedoc", "audit", "--guardian", "--uncommitted"]).is_err());
    }

    #[test]
    fn test_refactor_arguments() {
        let cli = Cli::try_parse_from([
            "codedoc", "refactor", "User.py", "--rules", "Keep it small.", "--health",
        ])
        .unwrap();

        match cli.command {
            Commands::Refactor { file, rules, health, root } => {
                assert_eq!(file, PathBuf::from("User.py"));
                assert_eq!(rules.as_deref(), Some("Keep it small."));
                assert!(health);
                assert!(root.is_none());
            }
            _ => panic!("expected refactor command"),
        }
    }

    fn engine_in(dir: &std::path::Path) -> Engine {
        let mut config = crate::config::Config::default();
        config.project.root = dir.to_path_buf();
        config.output.docs_dir = dir.join("documentation");
        config.output.notes_dir = dir.join("documentation_notes");
        config.output.manual_notes_file = dir.join("notes.txt");
        Engine::with_config(config).unwrap()
    }

    #[tokio::test]
    async fn test_print_accepts_non_utf8_file() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("legacy.py");
        std::fs::write(&source, b"def greet():\n    return '\xff\xfe'\n").unwrap();

        let cli = Cli::try_parse_from([
            "codedoc",
            "document",
            "--file",
            source.to_str().unwrap(),
            "--print",
        ])
        .unwrap();

        cli.execute(engine_in(temp.path())).await.unwrap();
        assert!(!temp.path().join("documentation").exists());
    }

    #[tokio::test]
    async fn test_document_file_passes_source_hint() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("tool.py");
        std::fs::write(&source, "def run():\n    pass\n").unwrap();

        let cli = Cli::try_parse_from([
            "codedoc",
            "document",
            "--file",
            source.to_str().unwrap(),
            "--source-hint",
            "nightly build",
        ])
        .unwrap();
        cli.execute(engine_in(temp.path())).await.unwrap();

        let notes_dir = temp.path().join("documentation_notes");
        let notes: Vec<_> = std::fs::read_dir(&notes_dir).unwrap().collect();
        assert_eq!(notes.len(), 1);
        let content = std::fs::read_to_string(notes[0].as_ref().unwrap().path()).unwrap();
        assert!(content.contains("Source hint: nightly build"));
    }
}
