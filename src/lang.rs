// src/lang.rs
use std::path::Path;
use tree_sitter::Language;

/// Grammar used to parse a source unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lang {
    TypeScript,
    Tsx,
}

impl Lang {
    #[must_use]
    pub fn from_ext(ext: &str) -> Option<Self> {
        match ext {
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            // Plain JS in component code routinely carries JSX.
            "tsx" | "jsx" | "js" | "mjs" | "cjs" => Some(Self::Tsx),
            _ => None,
        }
    }

    /// Picks the grammar for a file name, falling back to TSX for unknown extensions.
    #[must_use]
    pub fn from_file_name(file_name: &str) -> Self {
        Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_ext)
            .unwrap_or(Self::Tsx)
    }

    #[must_use]
    pub fn grammar(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::language_typescript(),
            Self::Tsx => tree_sitter_typescript::language_tsx(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_grammar_by_extension() {
        assert_eq!(Lang::from_file_name("src/api.ts"), Lang::TypeScript);
        assert_eq!(Lang::from_file_name("src/App.tsx"), Lang::Tsx);
        assert_eq!(Lang::from_file_name("src/App.jsx"), Lang::Tsx);
        assert_eq!(Lang::from_file_name("legacy.js"), Lang::Tsx);
    }

    #[test]
    fn unknown_extension_falls_back_to_tsx() {
        assert_eq!(Lang::from_file_name("README"), Lang::Tsx);
        assert_eq!(Lang::from_ext("rs"), None);
    }
}
