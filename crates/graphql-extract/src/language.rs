use std::path::Path;

/// Source languages that can carry GraphQL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// Raw GraphQL files (.graphql, .gql)
    GraphQL,
    /// TypeScript (.ts, .tsx, .mts, .cts)
    TypeScript,
    /// JavaScript (.js, .jsx, .mjs, .cjs)
    JavaScript,
}

impl Language {
    /// Detect language from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?;

        match extension {
            "graphql" | "gql" => Some(Self::GraphQL),
            "ts" | "tsx" | "mts" | "cts" => Some(Self::TypeScript),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            _ => None,
        }
    }

    /// GraphQL is embedded in template literals rather than being the whole file
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        matches!(self, Self::TypeScript | Self::JavaScript)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_language_from_path() {
        assert_eq!(
            Language::from_path(&PathBuf::from("schema.graphql")),
            Some(Language::GraphQL)
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("component.tsx")),
            Some(Language::TypeScript)
        );
        assert_eq!(
            Language::from_path(&PathBuf::from("module.mjs")),
            Some(Language::JavaScript)
        );
        assert_eq!(Language::from_path(&PathBuf::from("README.md")), None);
        assert_eq!(Language::from_path(&PathBuf::from("Makefile")), None);
    }

    #[test]
    fn test_is_embedded() {
        assert!(!Language::GraphQL.is_embedded());
        assert!(Language::TypeScript.is_embedded());
        assert!(Language::JavaScript.is_embedded());
    }
}
