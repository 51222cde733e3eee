mod classifier;
mod engine;
mod extractors;
mod model;
mod prompts;
mod render;
mod scanner;
mod store;

pub use classifier::{classify_from_extension, LanguageClassifier, LanguageLabel};
pub use extractors::{GenericExtractor, PythonExtractor, SymbolExtractor};
pub use model::ModuleInfo;
pub use prompts::{PromptBuilder, PromptKind};
pub use render::{RenderedDoc, Renderer, SourceMeta};
pub use scanner::{AuditTarget, FileLookup, ProjectScanner};
pub use store::{NotesStore, OutputStore};

// Export the main engine
pub use engine::{Documentation, Engine};
