//! Language classification from file suffixes and from source text shape.

use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Languages documented through the heuristic extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GenericLanguage {
    JavaScript,
    TypeScript,
    Java,
    Go,
    Cpp,
    C,
    CSharp,
    Php,
    Ruby,
    Rust,
    Swift,
    Kotlin,
    Scala,
}

impl GenericLanguage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::TypeScript => "typescript",
            Self::Java => "java",
            Self::Go => "go",
            Self::Cpp => "cpp",
            Self::C => "c",
            Self::CSharp => "csharp",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Rust => "rust",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
            Self::Scala => "scala",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::JavaScript => "JavaScript",
            Self::TypeScript => "TypeScript",
            Self::Java => "Java",
            Self::Go => "Go",
            Self::Cpp => "C++",
            Self::C => "C",
            Self::CSharp => "C#",
            Self::Php => "PHP",
            Self::Ruby => "Ruby",
            Self::Rust => "Rust",
            Self::Swift => "Swift",
            Self::Kotlin => "Kotlin",
            Self::Scala => "Scala",
        }
    }
}

/// Result of classification, resolved once per source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageLabel {
    /// The primary language, parsed with an exact grammar
    Python,
    /// A recognised language handled by the heuristic extractor
    Generic(GenericLanguage),
    Unknown,
}

impl LanguageLabel {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Python => "python",
            Self::Generic(lang) => lang.name(),
            Self::Unknown => "unknown",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Python => "Python",
            Self::Generic(lang) => lang.display_name(),
            Self::Unknown => "Unknown",
        }
    }

    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Python)
    }

    /// Map a file suffix through the fixed extension table
    pub fn from_extension(ext: &str) -> Self {
        use GenericLanguage::*;

        let generic = match ext.to_lowercase().as_str() {
            "py" => return Self::Python,
            "js" => JavaScript,
            "ts" => TypeScript,
            "java" => Java,
            "go" => Go,
            "cpp" => Cpp,
            "c" => C,
            "cs" => CSharp,
            "php" => Php,
            "rb" => Ruby,
            "rs" => Rust,
            "swift" => Swift,
            "kt" => Kotlin,
            "scala" => Scala,
            _ => return Self::Unknown,
        };

        Self::Generic(generic)
    }
}

impl fmt::Display for LanguageLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Label a path by its suffix; unmapped or missing suffixes give `Unknown`.
pub fn classify_from_extension<P: AsRef<Path>>(path: P) -> LanguageLabel {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(LanguageLabel::from_extension)
        .unwrap_or(LanguageLabel::Unknown)
}

/// One lexical hint: every match of `pattern` adds `weight` to `label`.
struct LexicalRule {
    label: LanguageLabel,
    pattern: Regex,
    weight: u32,
}

/// Best score needed before a guess is trusted
const MIN_CONFIDENCE: u32 = 2;

/// Cap on how many matches of one rule count towards a score
const MAX_HITS_PER_RULE: usize = 3;

/// Content-based classifier used when no file path is available
pub struct LanguageClassifier {
    rules: Vec<LexicalRule>,
}

impl LanguageClassifier {
    pub fn new() -> Self {
        use GenericLanguage::*;
        use LanguageLabel::{Generic, Python};

        let table: &[(LanguageLabel, &str, u32)] = &[
            (Python, r"(?m)^#!.*\bpython", 5),
            (Python, r"(?m)^[ \t]*(?:async[ \t]+)?def[ \t]+\w+[ \t]*\(.*:[ \t]*(?:#.*)?$", 3),
            (Python, r"(?m)^[ \t]*class[ \t]+\w+[ \t]*(?:\([^)]*\))?[ \t]*:[ \t]*$", 3),
            (Python, r"(?m)^[ \t]*(?:from[ \t]+[\w.]+[ \t]+import[ \t]|import[ \t]+[\w.]+[ \t]*$)", 1),
            (Python, r"\bself\.\w+", 1),
            (Python, r"\belif\b", 2),
            (Python, r#"__name__\s*==\s*['"]__main__['"]"#, 3),
            (Generic(JavaScript), r"(?m)^#!.*\bnode", 5),
            (Generic(JavaScript), r"\bfunction\b\s*\w*\s*\(", 2),
            (Generic(JavaScript), r"\b(?:const|let|var)\s+\w+\s*=", 1),
            (Generic(JavaScript), r"\bconsole\.\w+\(", 2),
            (Generic(JavaScript), r#"\brequire\(\s*['"]"#, 2),
            (Generic(JavaScript), r#"(?m)^\s*(?:import\s.*\sfrom\s+['"]|export\s+(?:default|const|function|class)\b)"#, 2),
            (Generic(TypeScript), r"(?m)^\s*(?:export\s+)?interface\s+\w+\s*\{", 3),
            (Generic(TypeScript), r"\w\s*:\s*(?:string|number|boolean|any|unknown)\b", 3),
            (Generic(Java), r"\bpublic\s+(?:static\s+)?(?:final\s+)?(?:class|interface|void)\b", 2),
            (Generic(Java), r"\bSystem\.out\.", 3),
            (Generic(Java), r"(?m)^\s*import\s+java\.", 3),
            (Generic(Java), r"(?m)^\s*package\s+[\w.]+;", 3),
            (Generic(CSharp), r"(?m)^\s*using\s+System\b", 3),
            (Generic(CSharp), r"\bnamespace\s+[\w.]+\s*[{;]?", 2),
            (Generic(CSharp), r"\bConsole\.Write", 3),
            (Generic(Go), r"(?m)^\s*package\s+\w+\s*$", 3),
            (Generic(Go), r"\bfunc\s+(?:\([^)]*\)\s*)?\w+\s*\(", 2),
            (Generic(Go), r"\bfmt\.\w+\(", 2),
            (Generic(Go), r":=", 1),
            (Generic(Rust), r"\bfn\s+\w+\s*[<(]", 3),
            (Generic(Rust), r"\blet\s+mut\b", 2),
            (Generic(Rust), r"(?m)^\s*(?:pub\s+)?(?:struct|enum|trait|impl)\b", 2),
            (Generic(Rust), r"(?m)^\s*use\s+\w+(?:::\w+)+", 2),
            (Generic(Rust), r"\bprintln!\(", 2),
            (Generic(C), r#"(?m)^\s*#include\s*[<"]"#, 2),
            (Generic(C), r"\bint\s+main\s*\(", 2),
            (Generic(C), r"\bprintf\s*\(", 1),
            (Generic(C), r"\bmalloc\s*\(", 1),
            (Generic(Cpp), r"\bstd::", 3),
            (Generic(Cpp), r"(?m)^\s*#include\s*<(?:iostream|vector|string|map|memory)>", 3),
            (Generic(Cpp), r"\btemplate\s*<", 2),
            (Generic(Cpp), r"\bcout\s*<<", 2),
            (Generic(Php), r"<\?php", 5),
            (Generic(Php), r"\$\w+\s*=", 1),
            (Generic(Ruby), r"(?m)^[ \t]*def[ \t]+\w+[?!]?[ \t]*(?:\([^)]*\))?[ \t]*$", 2),
            (Generic(Ruby), r"(?m)^[ \t]*end[ \t]*$", 2),
            (Generic(Ruby), r#"(?m)^\s*require\s+['"]"#, 2),
            (Generic(Ruby), r"\bputs\b", 2),
            (Generic(Ruby), r"\battr_(?:accessor|reader|writer)\b", 3),
            (Generic(Swift), r"(?m)^\s*import\s+(?:UIKit|Foundation|SwiftUI)\b", 3),
            (Generic(Swift), r"\bguard\s+let\b", 3),
            (Generic(Swift), r"\bfunc\s+\w+\s*\([^)]*\)\s*->", 2),
            (Generic(Kotlin), r"\bfun\s+\w+\s*\(", 3),
            (Generic(Kotlin), r"\bval\s+\w+\s*[:=]", 2),
            (Generic(Scala), r"\bcase\s+class\b", 3),
            (Generic(Scala), r"\bdef\s+\w+\s*\([^)]*\)\s*:\s*\w+\s*=", 3),
            (Generic(Scala), r"\bobject\s+\w+\s*(?:extends\b[^{]*)?\{", 2),
        ];

        let rules = table
            .iter()
            .map(|(label, pattern, weight)| LexicalRule {
                label: *label,
                pattern: Regex::new(pattern).expect("Invalid lexical rule regex"),
                weight: *weight,
            })
            .collect();

        Self { rules }
    }

    /// Guess the language of `code` from its lexical shape.
    ///
    /// Returns `Unknown` for blank input, when no language reaches the
    /// confidence threshold, or when the best score is tied.
    pub fn classify(&self, code: &str) -> LanguageLabel {
        if code.trim().is_empty() {
            return LanguageLabel::Unknown;
        }

        let mut scores: Vec<(LanguageLabel, u32)> = Vec::new();
        for rule in &self.rules {
            let hits = rule.pattern.find_iter(code).take(MAX_HITS_PER_RULE).count() as u32;
            if hits == 0 {
                continue;
            }
            match scores.iter_mut().find(|(label, _)| *label == rule.label) {
                Some((_, score)) => *score += hits * rule.weight,
                None => scores.push((rule.label, hits * rule.weight)),
            }
        }

        scores.sort_by(|a, b| b.1.cmp(&a.1));
        debug!("Lexical scores: {:?}", scores);

        match scores.as_slice() {
            [(label, best), rest @ ..]
                if *best >= MIN_CONFIDENCE && rest.first().map_or(true, |(_, next)| next < best) =>
            {
                *label
            }
            _ => LanguageLabel::Unknown,
        }
    }
}

impl Default for LanguageClassifier {
    fn default() -> Self {
        Self::new()
    }
}
