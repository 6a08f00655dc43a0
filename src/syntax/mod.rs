//! Language detection, the classification signal that decides whether a
//! printable file opens in code view.

use regex::{Regex, RegexBuilder};
use std::path::Path;

/// Identifies the language of a file from its name and a decoded sample.
pub trait LanguageDetector {
    fn detect_language(&self, filename: &str, sample: &str) -> Option<String>;
}

impl<F> LanguageDetector for F
where
    F: Fn(&str, &str) -> Option<String>,
{
    fn detect_language(&self, filename: &str, sample: &str) -> Option<String> {
        self(filename, sample)
    }
}

/// Detector that never recognises anything; everything opens as binary
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLanguage;

impl LanguageDetector for NoLanguage {
    fn detect_language(&self, _filename: &str, _sample: &str) -> Option<String> {
        None
    }
}

const EXTENSIONS: &[(&str, &str)] = &[
    ("rs", "Rust"),
    ("py", "Python"),
    ("pyw", "Python"),
    ("js", "JavaScript"),
    ("mjs", "JavaScript"),
    ("jsx", "JavaScript"),
    ("ts", "TypeScript"),
    ("tsx", "TypeScript"),
    ("html", "HTML"),
    ("htm", "HTML"),
    ("css", "CSS"),
    ("c", "C"),
    ("h", "C"),
    ("cpp", "C++"),
    ("cc", "C++"),
    ("cxx", "C++"),
    ("hpp", "C++"),
    ("hh", "C++"),
    ("java", "Java"),
    ("pl", "Perl"),
    ("pm", "Perl"),
    ("php", "PHP"),
    ("rb", "Ruby"),
    ("sh", "Bash"),
    ("bash", "Bash"),
    ("zsh", "Bash"),
    ("cs", "C#"),
    ("go", "Go"),
    ("json", "JSON"),
    ("toml", "TOML"),
    ("yaml", "YAML"),
    ("yml", "YAML"),
    ("xml", "XML"),
    ("md", "Markdown"),
    ("sql", "SQL"),
    ("ini", "INI"),
    ("cfg", "INI"),
    ("txt", "Text only"),
];

const FILENAMES: &[(&str, &str)] = &[
    ("Makefile", "Makefile"),
    ("makefile", "Makefile"),
    ("Dockerfile", "Docker"),
    ("CMakeLists.txt", "CMake"),
];

/// First matching content pattern wins
const CONTENT_PATTERNS: &[(&str, &str)] = &[
    (r#"^\s*(def|class|import|from|if __name__ == ['"]__main__['"])"#, "Python"),
    (r"^\s*(function|const|let|var|document\.|window\.|=>)", "JavaScript"),
    (r"<html|<!DOCTYPE html|<body|<script|<div", "HTML"),
    (r"^\s*(\.|#|@media|body\s*\{|html\s*\{)", "CSS"),
    (r"^\s*(package|import\s+java|public\s+class)", "Java"),
    (r"^\s*(module|use\s+strict|package)", "Perl"),
    (r"^\s*(<\?php|namespace|use\s+[\w\\]+;)", "PHP"),
    (r"^\s*(require|module|def\s+\w+\s*\(|class\s+\w+\s*<)", "Ruby"),
    (r"^\s*(#!\s*/bin/bash|function\s+\w+\s*\(\))", "Bash"),
    (r"^\s*(module|fn\s+\w+|pub\s+struct)", "Rust"),
    (r"^\s*(using\s+System|namespace\s+\w+|public\s+class)", "C#"),
];

const C_PATTERN: &str = r"^\s*(#include|int\s+main|void\s+main|struct\s+\w+\s*\{)";
const CPP_PATTERN: &str = r"^\s*(class\s+\w+|namespace\s+\w+|template\s*<)";

/// Extension table first, then content heuristics.
pub struct Highlighter {
    patterns: Vec<(Regex, &'static str)>,
    c: Option<Regex>,
    cpp: Option<Regex>,
}

impl Highlighter {
    pub fn new() -> Self {
        let patterns = CONTENT_PATTERNS
            .iter()
            .filter_map(|(pattern, language)| multiline(pattern).map(|re| (re, *language)))
            .collect();

        Self {
            patterns,
            c: multiline(C_PATTERN),
            cpp: multiline(CPP_PATTERN),
        }
    }

    fn by_filename(filename: &str) -> Option<&'static str> {
        let path = Path::new(filename);
        let name = path.file_name()?.to_str()?;

        if let Some((_, language)) = FILENAMES.iter().find(|(known, _)| *known == name) {
            return Some(*language);
        }

        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        EXTENSIONS
            .iter()
            .find(|(known, _)| *known == extension)
            .map(|(_, language)| *language)
    }

    fn by_content(&self, sample: &str) -> Option<&'static str> {
        if let Some((_, language)) = self.patterns.iter().find(|(re, _)| re.is_match(sample)) {
            return Some(*language);
        }

        let is_c = self.c.as_ref().is_some_and(|re| re.is_match(sample));
        if !is_c {
            return None;
        }

        if self.cpp.as_ref().is_some_and(|re| re.is_match(sample)) {
            Some("C++")
        } else {
            Some("C")
        }
    }
}

impl LanguageDetector for Highlighter {
    fn detect_language(&self, filename: &str, sample: &str) -> Option<String> {
        Self::by_filename(filename)
            .or_else(|| self.by_content(sample))
            .map(str::to_string)
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::new()
    }
}

fn multiline(pattern: &str) -> Option<Regex> {
    match RegexBuilder::new(pattern).multi_line(true).build() {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::warn!("skipping language pattern {:?}: {}", pattern, e);
            None
        }
    }
}
