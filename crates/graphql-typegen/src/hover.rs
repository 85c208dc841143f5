#![allow(clippy::format_push_string)]

use crate::completion::type_kind;
use crate::schema::{
    deprecation_reason, description_text, root_type_name, type_description, type_fields,
};
use apollo_compiler::ast::OperationType;
use apollo_compiler::Schema;
use apollo_parser::{
    cst::{self, CstNode},
    Parser, SyntaxNode,
};
use std::ops::Range;

/// Information to display when hovering over a GraphQL element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverInfo {
    /// Markdown formatted content to display
    pub contents: String,
    /// Byte range of the hovered name in the document
    pub range: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
enum ElementType {
    Field {
        field_name: String,
        parent_type: String,
    },
    TypeReference {
        type_name: String,
    },
    Argument {
        arg_name: String,
        field_name: String,
        parent_type: String,
    },
    Directive {
        directive_name: String,
    },
}

/// Quick info from schema descriptions
pub struct HoverProvider<'a> {
    schema: &'a Schema,
}

impl<'a> HoverProvider<'a> {
    #[must_use]
    pub const fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    /// Hover for the name at `offset` (a byte offset into `source`)
    #[must_use]
    pub fn hover(&self, source: &str, offset: usize) -> Option<HoverInfo> {
        let tree = Parser::new(source).parse();

        // Partial trees give unreliable parent types
        if tree.errors().count() > 0 {
            return None;
        }

        let doc = tree.document();
        let (element, range) = self.find_element_at_position(&doc, offset)?;
        let contents = self.generate_hover_content(element)?;
        Some(HoverInfo { contents, range })
    }

    fn find_element_at_position(
        &self,
        doc: &cst::Document,
        byte_offset: usize,
    ) -> Option<(ElementType, Range<usize>)> {
        for definition in doc.definitions() {
            match definition {
                cst::Definition::OperationDefinition(op) => {
                    if let Some(found) = Self::check_directives(op.directives(), byte_offset) {
                        return Some(found);
                    }

                    let operation_type = op.operation_type().map_or(OperationType::Query, |ty| {
                        if ty.mutation_token().is_some() {
                            OperationType::Mutation
                        } else if ty.subscription_token().is_some() {
                            OperationType::Subscription
                        } else {
                            OperationType::Query
                        }
                    });

                    if let Some(selection_set) = op.selection_set() {
                        let root = root_type_name(self.schema, operation_type);
                        if let Some(found) =
                            self.check_selection_set(&selection_set, byte_offset, &root)
                        {
                            return Some(found);
                        }
                    }
                }
                cst::Definition::FragmentDefinition(frag) => {
                    let type_condition = frag
                        .type_condition()
                        .and_then(|tc| tc.named_type())
                        .and_then(|nt| nt.name());

                    if let Some(name) = &type_condition {
                        if let Some(range) = name_range(name.syntax(), byte_offset) {
                            return Some((
                                ElementType::TypeReference {
                                    type_name: name.text().to_string(),
                                },
                                range,
                            ));
                        }
                    }

                    if let Some(found) = Self::check_directives(frag.directives(), byte_offset) {
                        return Some(found);
                    }

                    if let (Some(name), Some(selection_set)) = (type_condition, frag.selection_set())
                    {
                        let type_name = name.text().to_string();
                        if let Some(found) =
                            self.check_selection_set(&selection_set, byte_offset, &type_name)
                        {
                            return Some(found);
                        }
                    }
                }
                _ => {}
            }
        }

        None
    }

    fn check_selection_set(
        &self,
        selection_set: &cst::SelectionSet,
        byte_offset: usize,
        parent_type: &str,
    ) -> Option<(ElementType, Range<usize>)> {
        for selection in selection_set.selections() {
            match selection {
                cst::Selection::Field(field) => {
                    let Some(name) = field.name() else {
                        continue;
                    };
                    let field_name = name.text().to_string();

                    if let Some(range) = name_range(name.syntax(), byte_offset) {
                        return Some((
                            ElementType::Field {
                                field_name,
                                parent_type: parent_type.to_string(),
                            },
                            range,
                        ));
                    }

                    if let Some(arguments) = field.arguments() {
                        for arg in arguments.arguments() {
                            let Some(arg_name) = arg.name() else {
                                continue;
                            };
                            if let Some(range) = name_range(arg_name.syntax(), byte_offset) {
                                return Some((
                                    ElementType::Argument {
                                        arg_name: arg_name.text().to_string(),
                                        field_name,
                                        parent_type: parent_type.to_string(),
                                    },
                                    range,
                                ));
                            }
                        }
                    }

                    if let Some(found) = Self::check_directives(field.directives(), byte_offset) {
                        return Some(found);
                    }

                    if let Some(nested) = field.selection_set() {
                        let Ok(definition) =
                            self.schema.type_field(parent_type, field_name.as_str())
                        else {
                            continue;
                        };
                        let nested_type = definition.ty.inner_named_type().to_string();
                        if let Some(found) = self.check_selection_set(&nested, byte_offset, &nested_type)
                        {
                            return Some(found);
                        }
                    }
                }
                cst::Selection::FragmentSpread(spread) => {
                    if let Some(found) = Self::check_directives(spread.directives(), byte_offset) {
                        return Some(found);
                    }
                }
                cst::Selection::InlineFragment(inline_frag) => {
                    let type_condition = inline_frag
                        .type_condition()
                        .and_then(|tc| tc.named_type())
                        .and_then(|nt| nt.name());

                    if let Some(name) = &type_condition {
                        if let Some(range) = name_range(name.syntax(), byte_offset) {
                            return Some((
                                ElementType::TypeReference {
                                    type_name: name.text().to_string(),
                                },
                                range,
                            ));
                        }
                    }

                    if let Some(found) =
                        Self::check_directives(inline_frag.directives(), byte_offset)
                    {
                        return Some(found);
                    }

                    if let Some(nested) = inline_frag.selection_set() {
                        let type_name = type_condition
                            .map_or_else(|| parent_type.to_string(), |n| n.text().to_string());
                        if let Some(found) = self.check_selection_set(&nested, byte_offset, &type_name)
                        {
                            return Some(found);
                        }
                    }
                }
            }
        }

        None
    }

    fn check_directives(
        directives: Option<cst::Directives>,
        byte_offset: usize,
    ) -> Option<(ElementType, Range<usize>)> {
        directives?.directives().find_map(|directive| {
            let name = directive.name()?;
            let range = name_range(name.syntax(), byte_offset)?;
            Some((
                ElementType::Directive {
                    directive_name: name.text().to_string(),
                },
                range,
            ))
        })
    }

    fn generate_hover_content(&self, element: ElementType) -> Option<String> {
        match element {
            ElementType::Field {
                field_name,
                parent_type,
            } => self.generate_field_hover(&field_name, &parent_type),
            ElementType::TypeReference { type_name } => self.generate_type_hover(&type_name),
            ElementType::Argument {
                arg_name,
                field_name,
                parent_type,
            } => self.generate_argument_hover(&arg_name, &field_name, &parent_type),
            ElementType::Directive { directive_name } => {
                self.generate_directive_hover(&directive_name)
            }
        }
    }

    fn generate_field_hover(&self, field_name: &str, parent_type: &str) -> Option<String> {
        if field_name == "__typename" {
            return Some(format!(
                "### Field: `__typename`\n**Type:** `String!`\n\nName of the concrete type of `{parent_type}`"
            ));
        }

        let field = self.schema.type_field(parent_type, field_name).ok()?;

        let mut content = format!("### Field: `{field_name}`\n");
        content.push_str(&format!("**Type:** `{}`\n\n", field.ty));

        if let Some(description) = description_text(field.description.as_ref()) {
            content.push_str(&description);
            content.push_str("\n\n");
        }

        if let Some(reason) = deprecation_reason(&field.directives) {
            content.push_str(&format!("⚠️ **Deprecated:** {reason}\n\n"));
        }

        if !field.arguments.is_empty() {
            content.push_str("**Arguments:**\n");
            for arg in &field.arguments {
                content.push_str(&format!("- `{}`: `{}`", arg.name, arg.ty));
                if let Some(default) = &arg.default_value {
                    content.push_str(&format!(" = `{default}`"));
                }
                if let Some(desc) = description_text(arg.description.as_ref()) {
                    content.push_str(&format!(" - {desc}"));
                }
                content.push('\n');
            }
            content.push('\n');
        }

        content.push_str(&format!("**Defined in:** `{parent_type}` type"));
        Some(content)
    }

    fn generate_type_hover(&self, type_name: &str) -> Option<String> {
        let ty = self.schema.types.get(type_name)?;

        let mut content = format!("### Type: `{type_name}`\n**Kind:** {}\n\n", type_kind(ty));

        if let Some(description) = description_text(type_description(ty)) {
            content.push_str(&description);
            content.push_str("\n\n");
        }

        let fields = type_fields(self.schema, type_name);
        if !fields.is_empty() {
            content.push_str("**Fields:**\n");
            for field in fields.iter().take(10) {
                content.push_str(&format!("- `{}`: `{}`", field.name, field.ty));
                if deprecation_reason(&field.directives).is_some() {
                    content.push_str(" ⚠️");
                }
                content.push('\n');
            }
            if fields.len() > 10 {
                content.push_str(&format!("- ... and {} more\n", fields.len() - 10));
            }
        }

        Some(content)
    }

    fn generate_argument_hover(
        &self,
        arg_name: &str,
        field_name: &str,
        parent_type: &str,
    ) -> Option<String> {
        let field = self.schema.type_field(parent_type, field_name).ok()?;
        let arg = field.arguments.iter().find(|arg| arg.name.as_str() == arg_name)?;

        let mut content = format!("### Argument: `{arg_name}`\n");
        content.push_str(&format!("**Type:** `{}`\n\n", arg.ty));

        if let Some(description) = description_text(arg.description.as_ref()) {
            content.push_str(&description);
            content.push_str("\n\n");
        }

        if let Some(default) = &arg.default_value {
            content.push_str(&format!("**Default value:** `{default}`\n\n"));
        }

        let required = arg.ty.is_non_null() && arg.default_value.is_none();
        content.push_str(&format!(
            "**Required:** {}\n\n",
            if required { "Yes" } else { "No" }
        ));

        content.push_str(&format!(
            "**Defined in:** `{parent_type}.{field_name}` field"
        ));
        Some(content)
    }

    fn generate_directive_hover(&self, directive_name: &str) -> Option<String> {
        let directive = self.schema.directive_definitions.get(directive_name)?;

        let mut content = format!("### Directive: `@{directive_name}`\n\n");

        if let Some(description) = description_text(directive.description.as_ref()) {
            content.push_str(&description);
            content.push_str("\n\n");
        }

        if !directive.arguments.is_empty() {
            content.push_str("**Arguments:**\n");
            for arg in &directive.arguments {
                content.push_str(&format!("- `{}`: `{}`\n", arg.name, arg.ty));
            }
        }

        Some(content)
    }
}

/// Range of a name node when `offset` falls on it
fn name_range(node: &SyntaxNode, offset: usize) -> Option<Range<usize>> {
    let range = node.text_range();
    let start: usize = range.start().into();
    let end: usize = range.end().into();
    (offset >= start && offset < end).then_some(start..end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_schema;

    fn create_test_schema() -> apollo_compiler::validation::Valid<Schema> {
        parse_schema(
            r#"
            type Query {
                "Fetch a user by ID"
                user(
                    "The user ID"
                    id: ID!
                    limit: Int = 10
                ): User
                search: [SearchResult!]!
            }

            "A user in the system"
            type User {
                id: ID!
                "User's display name"
                name: String!
                email: String @deprecated(reason: "Use emailAddress instead")
                emailAddress: String
            }

            type Post {
                id: ID!
            }

            union SearchResult = User | Post
            "#,
            "schema.graphql",
        )
        .unwrap()
    }

    fn hover_at_marker(source_with_marker: &str) -> Option<HoverInfo> {
        let schema = create_test_schema();
        let offset = source_with_marker.find('|').unwrap();
        let source = source_with_marker.replace('|', "");
        HoverProvider::new(&schema).hover(&source, offset)
    }

    #[test]
    fn test_hover_on_field() {
        let info = hover_at_marker("query GetUser($id: ID!) { user(id: $id) { na|me } }").unwrap();

        assert!(info.contents.contains("Field: `name`"));
        assert!(info.contents.contains("String!"));
        assert!(info.contents.contains("User's display name"));
        assert!(info.contents.contains("**Defined in:** `User` type"));
        assert_eq!(info.range, 42..46);
    }

    #[test]
    fn test_hover_on_deprecated_field() {
        let info = hover_at_marker("query Q { user(id: 1) { |email } }").unwrap();

        assert!(info.contents.contains("Field: `email`"));
        assert!(info.contents.contains("Deprecated"));
        assert!(info.contents.contains("Use emailAddress instead"));
    }

    #[test]
    fn test_hover_on_field_with_arguments() {
        let info = hover_at_marker("query Q { us|er(id: 1) { id } }").unwrap();

        assert!(info.contents.contains("Fetch a user by ID"));
        assert!(info.contents.contains("**Arguments:**"));
        assert!(info.contents.contains("- `id`: `ID!` - The user ID"));
        assert!(info.contents.contains("- `limit`: `Int` = `10`"));
    }

    #[test]
    fn test_hover_on_argument() {
        let info = hover_at_marker("query Q { user(i|d: 1) { id } }").unwrap();

        assert!(info.contents.contains("Argument: `id`"));
        assert!(info.contents.contains("The user ID"));
        assert!(info.contents.contains("**Required:** Yes"));
        assert!(info.contents.contains("`Query.user` field"));
    }

    #[test]
    fn test_hover_on_type_condition() {
        let info = hover_at_marker("fragment F on Us|er { id }").unwrap();
        assert!(info.contents.contains("Type: `User`"));
        assert!(info.contents.contains("**Kind:** Object"));
        assert!(info.contents.contains("A user in the system"));
        assert!(info.contents.contains("- `email`: `String` ⚠️"));

        let info = hover_at_marker("query Q { search { ... on P|ost { id } } }").unwrap();
        assert!(info.contents.contains("Type: `Post`"));
    }

    #[test]
    fn test_hover_inside_inline_fragment() {
        let info = hover_at_marker("query Q { search { ... on User { |emailAddress } } }").unwrap();
        assert!(info.contents.contains("**Defined in:** `User` type"));
    }

    #[test]
    fn test_hover_on_directive() {
        let info = hover_at_marker("query Q($b: Boolean!) { user(id: 1) @sk|ip(if: $b) { id } }").unwrap();
        assert!(info.contents.contains("Directive: `@skip`"));
        assert!(info.contents.contains("- `if`: `Boolean!`"));
    }

    #[test]
    fn test_no_hover_on_syntax_error() {
        assert!(hover_at_marker("query Q { user(id: 1) { na|me }").is_none());
    }

    #[test]
    fn test_no_hover_on_unknown_field() {
        assert!(hover_at_marker("query Q { user(id: 1) { unkn|own } }").is_none());
    }
}
