use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Key under `extensions` that holds the type generator settings
pub const TYPEGEN_EXTENSION: &str = "typegen";

/// Top-level GraphQL configuration.
/// Either a single project or multiple named projects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GraphQLConfig {
    /// Single project configuration
    Single(ProjectConfig),
    /// Multi-project configuration
    Multi {
        projects: HashMap<String, ProjectConfig>,
    },
}

impl GraphQLConfig {
    /// Get all projects, sorted by name so that callers iterate deterministically.
    /// For single project configs, yields a single item with name "default".
    #[must_use]
    pub fn projects(&self) -> Vec<(&str, &ProjectConfig)> {
        match self {
            Self::Single(config) => vec![("default", config)],
            Self::Multi { projects } => {
                let mut all: Vec<_> = projects
                    .iter()
                    .map(|(name, config)| (name.as_str(), config))
                    .collect();
                all.sort_by(|a, b| a.0.cmp(b.0));
                all
            }
        }
    }

    /// Get a specific project by name.
    /// For single project configs, returns the project if name is "default".
    #[must_use]
    pub fn get_project(&self, name: &str) -> Option<&ProjectConfig> {
        match self {
            Self::Single(config) if name == "default" => Some(config),
            Self::Single(_) => None,
            Self::Multi { projects } => projects.get(name),
        }
    }

    #[must_use]
    pub const fn is_multi_project(&self) -> bool {
        matches!(self, Self::Multi { .. })
    }
}

/// Configuration for a single GraphQL project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectConfig {
    /// Schema source(s)
    pub schema: SchemaConfig,

    /// Source files that may contain embedded GraphQL literals
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documents: Option<DocumentsConfig>,

    /// Tool-specific extensions
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extensions: Option<HashMap<String, serde_json::Value>>,
}

impl ProjectConfig {
    /// Read the `extensions.typegen` block, falling back to defaults when absent
    pub fn typegen(&self) -> Result<TypegenConfig> {
        let Some(value) = self
            .extensions
            .as_ref()
            .and_then(|extensions| extensions.get(TYPEGEN_EXTENSION))
        else {
            return Ok(TypegenConfig::default());
        };

        let config: TypegenConfig = serde_json::from_value(value.clone())?;
        if config.tag.trim().is_empty() {
            return Err(ConfigError::Validation(
                "typegen tag must not be empty".to_string(),
            ));
        }
        if !config.output_extension.starts_with('.') {
            return Err(ConfigError::Validation(format!(
                "typegen outputExtension must start with '.', got '{}'",
                config.output_extension
            )));
        }

        Ok(config)
    }
}

/// Settings for generating declaration modules from embedded literals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TypegenConfig {
    /// Template tag that marks a literal as GraphQL (e.g. "gql")
    pub tag: String,

    /// Extension of generated files, including the leading dot
    pub output_extension: String,

    /// TypeScript type to use for each custom scalar
    pub scalars: BTreeMap<String, String>,
}

impl Default for TypegenConfig {
    fn default() -> Self {
        Self {
            tag: "gql".to_string(),
            output_extension: ".ts".to_string(),
            scalars: BTreeMap::new(),
        }
    }
}

/// Schema source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SchemaConfig {
    /// Single file path or glob pattern
    Path(String),
    /// Multiple file paths or glob patterns
    Paths(Vec<String>),
}

impl SchemaConfig {
    #[must_use]
    pub fn paths(&self) -> Vec<&str> {
        match self {
            Self::Path(path) => vec![path.as_str()],
            Self::Paths(paths) => paths.iter().map(String::as_str).collect(),
        }
    }
}

/// Documents source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentsConfig {
    /// Single pattern
    Pattern(String),
    /// Multiple patterns
    Patterns(Vec<String>),
}

impl DocumentsConfig {
    #[must_use]
    pub fn patterns(&self) -> Vec<&str> {
        match self {
            Self::Pattern(pattern) => vec![pattern.as_str()],
            Self::Patterns(patterns) => patterns.iter().map(String::as_str).collect(),
        }
    }
}
