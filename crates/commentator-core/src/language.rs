//! Source language classification by file extension.

use std::path::Path;

use serde::Serialize;

/// Languages recognized by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Language {
    JavaScript,
    TypeScript,
    C,
    Cpp,
    CSharp,
    Swift,
    Python,
    Rust,
    Sql,
    Css,
    Php,
    Ruby,
    Kotlin,
    Go,
    R,
    Java,
}

impl Language {
    /// Map a bare extension (no dot) to a language. Matching is
    /// case-sensitive.
    pub fn from_extension(ext: &str) -> Option<Language> {
        let language = match ext {
            "js" => Language::JavaScript,
            "ts" => Language::TypeScript,
            "c" | "h" => Language::C,
            "cpp" | "hpp" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "swift" => Language::Swift,
            "py" => Language::Python,
            "rs" => Language::Rust,
            "sql" => Language::Sql,
            "css" => Language::Css,
            "php" => Language::Php,
            "rb" => Language::Ruby,
            "kt" => Language::Kotlin,
            "go" => Language::Go,
            "r" => Language::R,
            "java" => Language::Java,
            _ => return None,
        };
        Some(language)
    }

    /// Classify a file by the extension of its name.
    pub fn of_path(path: &Path) -> Option<Language> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Language::from_extension)
    }

    /// Human-readable name, as used in generation prompts.
    pub fn label(&self) -> &'static str {
        match self {
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::CSharp => "C#",
            Language::Swift => "Swift",
            Language::Python => "Python",
            Language::Rust => "Rust",
            Language::Sql => "SQL",
            Language::Css => "CSS",
            Language::Php => "PHP",
            Language::Ruby => "Ruby",
            Language::Kotlin => "Kotlin",
            Language::Go => "Go",
            Language::R => "R",
            Language::Java => "Java",
        }
    }
}

/// Language label for a file name, or `""` if the extension is unknown.
pub fn classify(file_name: &str) -> &'static str {
    Language::of_path(Path::new(file_name))
        .map(|l| l.label())
        .unwrap_or_default()
}
