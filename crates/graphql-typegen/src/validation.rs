use crate::classify::{classify, Classification};
use crate::diagnostics::locate_diagnostics;
use crate::{ExtractionResult, LocatedError};
use apollo_compiler::ast;
use apollo_compiler::validation::Valid;
use apollo_compiler::{ExecutableDocument, Schema};
use std::collections::BTreeSet;

/// Validates extracted literals against a schema.
///
/// Spreads of fragments defined in other literals are resolved against the
/// fragment literals registered with [`Validator::with_fragments`]. Their
/// text is appended after the literal being validated, so offsets into the
/// literal stay unchanged and errors inside the appended text are dropped.
pub struct Validator<'a> {
    schema: &'a Valid<Schema>,
    fragments: Vec<(String, &'a ExtractionResult)>,
}

impl<'a> Validator<'a> {
    #[must_use]
    pub const fn new(schema: &'a Valid<Schema>) -> Self {
        Self {
            schema,
            fragments: Vec::new(),
        }
    }

    /// Register every single-fragment literal among `results`
    #[must_use]
    pub fn with_fragments(mut self, results: &'a [ExtractionResult]) -> Self {
        for result in results {
            if let Some(document) = &result.document {
                if let Classification::Fragment { name } = classify(document) {
                    self.fragments.push((name, result));
                }
            }
        }
        self
    }

    /// Syntax errors when the literal did not parse, validation errors
    /// otherwise
    #[must_use]
    pub fn validate(&self, result: &ExtractionResult) -> Vec<LocatedError> {
        let Some(document) = &result.document else {
            return result.parse_errors.clone();
        };

        let is_fragment_only = matches!(classify(document), Classification::Fragment { .. });
        let text = self.with_external_fragments(result, document);

        let Err(with_errors) =
            ExecutableDocument::parse_and_validate(self.schema, text.as_str(), &result.file_name)
        else {
            return Vec::new();
        };

        locate_diagnostics(
            &with_errors.errors,
            &text,
            result.text.len(),
            &result.resolver,
            &result.file_name,
            &result.source,
        )
        .into_iter()
        .filter(|error| !(is_fragment_only && is_unused_fragment_message(&error.message)))
        .collect()
    }

    fn with_external_fragments(&self, result: &ExtractionResult, document: &ast::Document) -> String {
        let mut text = result.text.clone();
        let mut defined = defined_fragments(document);
        let mut pending: Vec<String> = spread_fragments(document).into_iter().collect();

        while let Some(name) = pending.pop() {
            if defined.contains(&name) {
                continue;
            }

            let Some((_, fragment)) = self.fragments.iter().find(|(fragment_name, fragment)| {
                *fragment_name == name && !is_same_literal(fragment, result)
            }) else {
                continue;
            };

            text.push('\n');
            text.push_str(&fragment.text);
            defined.insert(name);

            if let Some(fragment_document) = &fragment.document {
                pending.extend(spread_fragments(fragment_document));
            }
        }

        text
    }
}

fn is_same_literal(a: &ExtractionResult, b: &ExtractionResult) -> bool {
    a.file_name == b.file_name && a.literal == b.literal
}

fn is_unused_fragment_message(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("unused") || message.contains("never used") || message.contains("must be used")
}

fn defined_fragments(document: &ast::Document) -> BTreeSet<String> {
    document
        .definitions
        .iter()
        .filter_map(|definition| match definition {
            ast::Definition::FragmentDefinition(fragment) => Some(fragment.name.to_string()),
            _ => None,
        })
        .collect()
}

/// Names of all fragments spread anywhere in `document`
pub(crate) fn spread_fragments(document: &ast::Document) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for definition in &document.definitions {
        match definition {
            ast::Definition::OperationDefinition(operation) => {
                collect_spreads(&operation.selection_set, &mut names);
            }
            ast::Definition::FragmentDefinition(fragment) => {
                collect_spreads(&fragment.selection_set, &mut names);
            }
            _ => {}
        }
    }
    names
}

fn collect_spreads(selections: &[ast::Selection], names: &mut BTreeSet<String>) {
    for selection in selections {
        match selection {
            ast::Selection::Field(field) => collect_spreads(&field.selection_set, names),
            ast::Selection::FragmentSpread(spread) => {
                names.insert(spread.fragment_name.to_string());
            }
            ast::Selection::InlineFragment(inline) => {
                collect_spreads(&inline.selection_set, names);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_schema, Extractor};
    use graphql_extract::{ExtractConfig, Language};
    use std::path::Path;

    const SCHEMA: &str = r"
        type Query {
            user(id: ID!): User
            users: [User!]!
        }

        type User {
            id: ID!
            name: String
        }
    ";

    fn extract(source: &str) -> Vec<ExtractionResult> {
        Extractor::new(ExtractConfig::default())
            .extract_source(Path::new("a.ts"), source, Language::TypeScript)
            .unwrap()
    }

    #[test]
    fn test_valid_literal_has_no_errors() {
        let schema = parse_schema(SCHEMA, "schema.graphql").unwrap();
        let results = extract("const q = gql`query Q { users { id name } }`;");

        let errors = Validator::new(&schema).validate(&results[0]);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_unknown_field_is_located_in_source() {
        let schema = parse_schema(SCHEMA, "schema.graphql").unwrap();
        let source = "const q = gql`query Q { users { id email } }`;";
        let results = extract(source);

        let errors = Validator::new(&schema).validate(&results[0]);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("email"), "{}", errors[0].message);
        assert_eq!(errors[0].start, source.find("email").unwrap());
    }

    #[test]
    fn test_parse_errors_are_returned_as_is() {
        let schema = parse_schema(SCHEMA, "schema.graphql").unwrap();
        let results = extract("const q = gql`query Q {`;");

        let errors = Validator::new(&schema).validate(&results[0]);
        assert_eq!(errors, results[0].parse_errors);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_fragment_only_literal_is_not_unused() {
        let schema = parse_schema(SCHEMA, "schema.graphql").unwrap();
        let results = extract("const f = gql`fragment UserFields on User { id }`;");

        let errors = Validator::new(&schema).validate(&results[0]);
        assert!(errors.is_empty(), "{errors:?}");
    }

    #[test]
    fn test_spread_of_fragment_from_other_literal() {
        let schema = parse_schema(SCHEMA, "schema.graphql").unwrap();
        let results = extract(
            "const f = gql`fragment UserFields on User { id name }`;\n\
             const q = gql`query Q { users { ...UserFields } }`;",
        );

        let errors = Validator::new(&schema)
            .with_fragments(&results)
            .validate(&results[1]);
        assert!(errors.is_empty(), "{errors:?}");

        let errors = Validator::new(&schema).validate(&results[1]);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_spread_names() {
        let document = ast::Document::parse(
            "query Q { a { ...A ... on B { ...B } } } fragment F on T { ...C }",
            "q.graphql",
        )
        .unwrap();

        let names: Vec<_> = spread_fragments(&document).into_iter().collect();
        assert_eq!(names, vec!["A", "B", "C"]);
    }
}
