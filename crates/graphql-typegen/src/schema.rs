use crate::{Result, TypegenError};
use apollo_compiler::ast::{self, OperationType};
use apollo_compiler::schema::{ExtendedType, FieldDefinition};
use apollo_compiler::validation::Valid;
use apollo_compiler::{Node, Schema};
use graphql_config::SchemaConfig;
use std::path::{Path, PathBuf};

/// Loads SDL files named by the project configuration and builds a validated schema
pub struct SchemaLoader {
    config: SchemaConfig,
    base_path: Option<PathBuf>,
}

impl SchemaLoader {
    #[must_use]
    pub const fn new(config: SchemaConfig) -> Self {
        Self {
            config,
            base_path: None,
        }
    }

    #[must_use]
    pub fn with_base_path(mut self, path: impl AsRef<Path>) -> Self {
        self.base_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Every schema file the configuration resolves to, in a stable order
    pub fn paths(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for path in self.config.paths() {
            if path.starts_with("http://") || path.starts_with("https://") {
                return Err(TypegenError::SchemaLoad(format!(
                    "Remote schemas are not supported: {path}"
                )));
            }
            files.extend(self.expand(path)?);
        }

        if files.is_empty() {
            return Err(TypegenError::SchemaLoad(
                "No schema files found".to_string(),
            ));
        }

        Ok(files)
    }

    fn expand(&self, pattern: &str) -> Result<Vec<PathBuf>> {
        let pattern = self.base_path.as_ref().map_or_else(
            || pattern.to_string(),
            |base| base.join(pattern).display().to_string(),
        );

        let entries = glob::glob(&pattern).map_err(|e| {
            TypegenError::SchemaLoad(format!("Invalid glob pattern '{pattern}': {e}"))
        })?;

        let mut files = Vec::new();
        for entry in entries {
            let path =
                entry.map_err(|e| TypegenError::SchemaLoad(format!("Glob error: {e}")))?;
            files.push(path);
        }

        if files.is_empty() {
            return Err(TypegenError::SchemaLoad(format!(
                "No files matched pattern: {pattern}"
            )));
        }

        files.sort();
        Ok(files)
    }

    /// Read every schema file
    pub async fn load_sources(&self) -> Result<Vec<(PathBuf, String)>> {
        let mut sources = Vec::new();
        for path in self.paths()? {
            let content = tokio::fs::read_to_string(&path).await?;
            sources.push((path, content));
        }
        Ok(sources)
    }

    /// Read, parse and validate the schema
    pub async fn load(&self) -> Result<Valid<Schema>> {
        let sources = self.load_sources().await?;
        tracing::debug!(files = sources.len(), "Loaded schema sources");
        build_schema(&sources)
    }
}

/// Parse and validate a schema made of one or more SDL sources
pub fn build_schema(sources: &[(PathBuf, String)]) -> Result<Valid<Schema>> {
    let mut builder = Schema::builder();
    for (path, content) in sources {
        builder = builder.parse(content.as_str(), path);
    }

    let schema = builder
        .build()
        .map_err(|e| TypegenError::SchemaParse(e.errors.to_string()))?;
    schema
        .validate()
        .map_err(|e| TypegenError::SchemaParse(e.errors.to_string()))
}

/// Parse and validate a single SDL string
pub fn parse_schema(source: &str, path: impl AsRef<Path>) -> Result<Valid<Schema>> {
    build_schema(&[(path.as_ref().to_path_buf(), source.to_string())])
}

/// Fields of an object or interface type; empty for anything else
pub(crate) fn type_fields<'s>(schema: &'s Schema, type_name: &str) -> Vec<&'s Node<FieldDefinition>> {
    match schema.types.get(type_name) {
        Some(ExtendedType::Object(object)) => object.fields.values().map(|f| &f.node).collect(),
        Some(ExtendedType::Interface(interface)) => {
            interface.fields.values().map(|f| &f.node).collect()
        }
        _ => Vec::new(),
    }
}

pub(crate) fn type_description(ty: &ExtendedType) -> Option<&Node<str>> {
    match ty {
        ExtendedType::Scalar(def) => def.description.as_ref(),
        ExtendedType::Object(def) => def.description.as_ref(),
        ExtendedType::Interface(def) => def.description.as_ref(),
        ExtendedType::Union(def) => def.description.as_ref(),
        ExtendedType::Enum(def) => def.description.as_ref(),
        ExtendedType::InputObject(def) => def.description.as_ref(),
    }
}

/// Root type name of an operation kind, defaulting to the conventional name
pub(crate) fn root_type_name(schema: &Schema, operation_type: OperationType) -> String {
    schema.root_operation(operation_type).map_or_else(
        || {
            match operation_type {
                OperationType::Query => "Query",
                OperationType::Mutation => "Mutation",
                OperationType::Subscription => "Subscription",
            }
            .to_string()
        },
        ToString::to_string,
    )
}

/// Trimmed description text, `None` when absent or blank
pub(crate) fn description_text(description: Option<&Node<str>>) -> Option<String> {
    description
        .map(|text| {
            let text: &str = text;
            text.trim().to_string()
        })
        .filter(|text| !text.is_empty())
}

/// Reason given to `@deprecated`, if the directive is present
pub(crate) fn deprecation_reason(directives: &ast::DirectiveList) -> Option<String> {
    let directive = directives.get("deprecated")?;
    let reason = directive
        .arguments
        .iter()
        .find(|argument| argument.name.as_str() == "reason")
        .and_then(|argument| argument.value.as_str())
        .unwrap_or("No longer supported");
    Some(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_single_local_file() {
        let temp_dir = tempdir().unwrap();
        let schema_path = temp_dir.path().join("schema.graphql");
        fs::write(&schema_path, "type Query { hello: String }").unwrap();

        let config = SchemaConfig::Path(schema_path.display().to_string());
        let schema = SchemaLoader::new(config).load().await.unwrap();

        assert!(schema.get_object("Query").is_some());
    }

    #[tokio::test]
    async fn test_load_multiple_files_with_glob() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("schema1.graphql"),
            "type Query { user: User }",
        )
        .unwrap();
        fs::write(
            temp_dir.path().join("schema2.graphql"),
            "type User { id: ID! }",
        )
        .unwrap();

        let config = SchemaConfig::Path("*.graphql".to_string());
        let loader = SchemaLoader::new(config).with_base_path(temp_dir.path());
        assert_eq!(loader.paths().unwrap().len(), 2);

        let schema = loader.load().await.unwrap();
        assert!(schema.get_object("User").is_some());
    }

    #[tokio::test]
    async fn test_invalid_schema_is_reported() {
        let temp_dir = tempdir().unwrap();
        fs::write(
            temp_dir.path().join("schema.graphql"),
            "type Query { user: Missing }",
        )
        .unwrap();

        let config = SchemaConfig::Path("schema.graphql".to_string());
        let err = SchemaLoader::new(config)
            .with_base_path(temp_dir.path())
            .load()
            .await
            .unwrap_err();

        assert!(matches!(err, TypegenError::SchemaParse(_)));
    }

    #[test]
    fn test_remote_schema_is_rejected() {
        let config = SchemaConfig::Path("https://example.com/graphql".to_string());
        let err = SchemaLoader::new(config).paths().unwrap_err();
        assert!(matches!(err, TypegenError::SchemaLoad(_)));
    }

    #[test]
    fn test_missing_files() {
        let temp_dir = tempdir().unwrap();
        let config = SchemaConfig::Path("nothing/*.graphql".to_string());
        let err = SchemaLoader::new(config)
            .with_base_path(temp_dir.path())
            .paths()
            .unwrap_err();
        assert!(err.to_string().contains("No files matched pattern"));
    }
}
