use crate::schema::{
    deprecation_reason, description_text, root_type_name, type_description, type_fields,
};
use apollo_compiler::ast::{DirectiveLocation, OperationType};
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::Schema;
use apollo_parser::{
    cst::{self, CstNode},
    Parser,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionItemKind {
    Field,
    Type,
    Fragment,
    Directive,
    Argument,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionItem {
    pub label: String,
    pub kind: CompletionItemKind,
    pub detail: Option<String>,
    pub documentation: Option<String>,
    pub deprecated: bool,
    pub insert_text: Option<String>,
}

impl CompletionItem {
    #[must_use]
    pub fn new(label: impl Into<String>, kind: CompletionItemKind) -> Self {
        Self {
            label: label.into(),
            kind,
            detail: None,
            documentation: None,
            deprecated: false,
            insert_text: None,
        }
    }

    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    #[must_use]
    pub fn with_documentation(mut self, documentation: Option<String>) -> Self {
        self.documentation = documentation;
        self
    }
}

/// A fragment that can be spread from other literals
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentCandidate {
    pub name: String,
    pub type_condition: String,
}

#[derive(Debug, Clone, PartialEq)]
enum CompletionContext {
    FieldSelection {
        parent_type: String,
        already_selected_fields: Vec<String>,
        is_in_alias: bool,
    },
    FragmentSpread,
    TypeCondition,
    Directive,
    Argument {
        parent_type: String,
        field_name: String,
    },
}

/// Schema-driven completion inside one GraphQL document.
///
/// Offsets are byte offsets into the document text.
pub struct CompletionProvider<'a> {
    schema: &'a Schema,
    fragments: &'a [FragmentCandidate],
}

impl<'a> CompletionProvider<'a> {
    #[must_use]
    pub const fn new(schema: &'a Schema, fragments: &'a [FragmentCandidate]) -> Self {
        Self { schema, fragments }
    }

    /// Candidates at `offset`, or `None` when the cursor is outside every
    /// operation and fragment
    #[must_use]
    pub fn complete(&self, source: &str, offset: usize) -> Option<Vec<CompletionItem>> {
        let tree = Parser::new(source).parse();
        let doc = tree.document();

        let context = doc
            .definitions()
            .find_map(|def| self.check_definition_for_context(&def, offset, source))?;

        let context = if text_before(source, offset).ends_with('@') {
            CompletionContext::Directive
        } else {
            context
        };

        Some(self.generate_completions(context))
    }

    fn check_definition_for_context(
        &self,
        def: &cst::Definition,
        byte_offset: usize,
        source: &str,
    ) -> Option<CompletionContext> {
        match def {
            cst::Definition::OperationDefinition(op) => {
                self.check_operation_for_context(op, byte_offset, source)
            }
            cst::Definition::FragmentDefinition(frag) => {
                self.check_fragment_for_context(frag, byte_offset, source)
            }
            _ => None,
        }
    }

    fn check_operation_for_context(
        &self,
        op: &cst::OperationDefinition,
        byte_offset: usize,
        source: &str,
    ) -> Option<CompletionContext> {
        if !contains(op.syntax(), byte_offset) {
            return None;
        }

        if let Some(directives) = op.directives() {
            if contains(directives.syntax(), byte_offset) {
                return Some(CompletionContext::Directive);
            }
        }

        let selection_set = op.selection_set()?;
        let operation_type = op.operation_type().map_or(OperationType::Query, |op_type| {
            if op_type.mutation_token().is_some() {
                OperationType::Mutation
            } else if op_type.subscription_token().is_some() {
                OperationType::Subscription
            } else {
                OperationType::Query
            }
        });
        let root = root_type_name(self.schema, operation_type);

        self.check_selection_set_for_context(&selection_set, byte_offset, source, &root)
    }

    fn check_fragment_for_context(
        &self,
        frag: &cst::FragmentDefinition,
        byte_offset: usize,
        source: &str,
    ) -> Option<CompletionContext> {
        if !contains(frag.syntax(), byte_offset) {
            return None;
        }

        let before_selection_set = frag.selection_set().map_or(true, |selection_set| {
            byte_offset < usize::from(selection_set.syntax().text_range().start())
        });
        if before_selection_set && follows_on_keyword(source, byte_offset) {
            return Some(CompletionContext::TypeCondition);
        }
        if let Some(type_cond) = frag.type_condition() {
            if contains(type_cond.syntax(), byte_offset) {
                return Some(CompletionContext::TypeCondition);
            }
        }

        if let Some(directives) = frag.directives() {
            if contains(directives.syntax(), byte_offset) {
                return Some(CompletionContext::Directive);
            }
        }

        let type_name = frag.type_condition()?.named_type()?.name()?.text().to_string();
        let selection_set = frag.selection_set()?;
        self.check_selection_set_for_context(&selection_set, byte_offset, source, &type_name)
    }

    fn check_selection_set_for_context(
        &self,
        selection_set: &cst::SelectionSet,
        byte_offset: usize,
        source: &str,
        parent_type: &str,
    ) -> Option<CompletionContext> {
        if !contains(selection_set.syntax(), byte_offset) {
            return None;
        }

        // Fields other than the one under the cursor
        let already_selected_fields: Vec<String> = selection_set
            .selections()
            .filter_map(|selection| match selection {
                cst::Selection::Field(field) if !contains(field.syntax(), byte_offset) => {
                    field.name().map(|name| name.text().to_string())
                }
                _ => None,
            })
            .collect();

        for selection in selection_set.selections() {
            match selection {
                cst::Selection::Field(field) => {
                    if !contains(field.syntax(), byte_offset) {
                        continue;
                    }

                    if let Some(context) =
                        self.check_field_for_context(&field, byte_offset, source, parent_type)
                    {
                        return Some(context);
                    }

                    // On the field name itself
                    let has_alias = field.alias().is_some();
                    let should_filter = !has_alias && field.name().is_some();
                    return Some(CompletionContext::FieldSelection {
                        parent_type: parent_type.to_string(),
                        already_selected_fields: if should_filter {
                            already_selected_fields
                        } else {
                            Vec::new()
                        },
                        is_in_alias: has_alias,
                    });
                }
                cst::Selection::FragmentSpread(spread) => {
                    if contains(spread.syntax(), byte_offset) {
                        if let Some(directives) = spread.directives() {
                            if contains(directives.syntax(), byte_offset) {
                                return Some(CompletionContext::Directive);
                            }
                        }
                        return Some(CompletionContext::FragmentSpread);
                    }
                }
                cst::Selection::InlineFragment(inline_frag) => {
                    if let Some(context) = self.check_inline_fragment_for_context(
                        &inline_frag,
                        byte_offset,
                        source,
                        parent_type,
                    ) {
                        return Some(context);
                    }
                }
            }
        }

        // Top level of the selection set. A trailing `on` or dots mean the
        // user is typing a spread or an inline fragment, not a field.
        if follows_on_keyword(source, byte_offset) {
            return Some(CompletionContext::TypeCondition);
        }
        if text_before(source, byte_offset).trim_end().ends_with('.') {
            return Some(CompletionContext::FragmentSpread);
        }

        // `alias: ` leaves a field node without a name that ends before the cursor
        for selection in selection_set.selections() {
            if let cst::Selection::Field(field) = selection {
                if field.alias().is_some() && field.name().is_none() {
                    let field_end: usize = field.syntax().text_range().end().into();
                    if byte_offset >= field_end && byte_offset <= field_end + 10 {
                        return Some(CompletionContext::FieldSelection {
                            parent_type: parent_type.to_string(),
                            already_selected_fields: Vec::new(),
                            is_in_alias: true,
                        });
                    }
                }
            }
        }

        Some(CompletionContext::FieldSelection {
            parent_type: parent_type.to_string(),
            already_selected_fields,
            is_in_alias: false,
        })
    }

    fn check_field_for_context(
        &self,
        field: &cst::Field,
        byte_offset: usize,
        source: &str,
        parent_type: &str,
    ) -> Option<CompletionContext> {
        let field_name = field.name()?.text().to_string();

        if let Some(arguments) = field.arguments() {
            if contains(arguments.syntax(), byte_offset) {
                return Some(CompletionContext::Argument {
                    parent_type: parent_type.to_string(),
                    field_name: field_name.clone(),
                });
            }
        }

        if let Some(directives) = field.directives() {
            if contains(directives.syntax(), byte_offset) {
                return Some(CompletionContext::Directive);
            }
        }

        let selection_set = field.selection_set()?;
        let field_type = self
            .schema
            .type_field(parent_type, field_name.as_str())
            .ok()?
            .ty
            .inner_named_type()
            .to_string();

        self.check_selection_set_for_context(&selection_set, byte_offset, source, &field_type)
    }

    fn check_inline_fragment_for_context(
        &self,
        inline_frag: &cst::InlineFragment,
        byte_offset: usize,
        source: &str,
        parent_type: &str,
    ) -> Option<CompletionContext> {
        if !contains(inline_frag.syntax(), byte_offset) {
            return None;
        }

        if let Some(type_cond) = inline_frag.type_condition() {
            if contains(type_cond.syntax(), byte_offset) {
                return Some(CompletionContext::TypeCondition);
            }
        }

        if let Some(directives) = inline_frag.directives() {
            if contains(directives.syntax(), byte_offset) {
                return Some(CompletionContext::Directive);
            }
        }

        let type_name = match inline_frag.type_condition() {
            Some(type_cond) => type_cond.named_type()?.name()?.text().to_string(),
            None => parent_type.to_string(),
        };

        let selection_set = inline_frag.selection_set()?;
        self.check_selection_set_for_context(&selection_set, byte_offset, source, &type_name)
    }

    fn generate_completions(&self, context: CompletionContext) -> Vec<CompletionItem> {
        match context {
            CompletionContext::FieldSelection {
                parent_type,
                already_selected_fields,
                is_in_alias,
            } => self.complete_fields(&parent_type, &already_selected_fields, is_in_alias),
            CompletionContext::FragmentSpread => self.complete_fragments(),
            CompletionContext::TypeCondition => self.complete_types(),
            CompletionContext::Directive => self.complete_directives(),
            CompletionContext::Argument {
                parent_type,
                field_name,
            } => self.complete_arguments(&parent_type, &field_name),
        }
    }

    fn complete_fields(
        &self,
        parent_type: &str,
        already_selected_fields: &[String],
        is_in_alias: bool,
    ) -> Vec<CompletionItem> {
        let mut items: Vec<CompletionItem> = type_fields(self.schema, parent_type)
            .into_iter()
            .filter(|field| {
                is_in_alias || !already_selected_fields.iter().any(|name| name == field.name.as_str())
            })
            .map(|field| {
                let mut item = CompletionItem::new(field.name.as_str(), CompletionItemKind::Field)
                    .with_detail(field.ty.to_string())
                    .with_documentation(description_text(field.description.as_ref()));
                item.deprecated = deprecation_reason(&field.directives).is_some();
                item
            })
            .collect();

        let is_composite = matches!(
            self.schema.types.get(parent_type),
            Some(ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_))
        );
        if is_composite && !already_selected_fields.iter().any(|name| name == "__typename") {
            items.push(CompletionItem::new("__typename", CompletionItemKind::Field).with_detail("String!"));
        }

        items
    }

    fn complete_fragments(&self) -> Vec<CompletionItem> {
        self.fragments
            .iter()
            .map(|fragment| {
                CompletionItem::new(fragment.name.as_str(), CompletionItemKind::Fragment)
                    .with_detail(format!("on {}", fragment.type_condition))
            })
            .collect()
    }

    fn complete_types(&self) -> Vec<CompletionItem> {
        self.schema
            .types
            .iter()
            .filter(|(name, ty)| {
                !name.starts_with("__")
                    && matches!(
                        ty,
                        ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_)
                    )
            })
            .map(|(name, ty)| {
                CompletionItem::new(name.as_str(), CompletionItemKind::Type)
                    .with_detail(type_kind(ty))
                    .with_documentation(description_text(type_description(ty)))
            })
            .collect()
    }

    fn complete_directives(&self) -> Vec<CompletionItem> {
        self.schema
            .directive_definitions
            .values()
            .filter(|directive| directive.locations.iter().any(is_executable_location))
            .map(|directive| {
                let mut item = CompletionItem::new(directive.name.as_str(), CompletionItemKind::Directive)
                    .with_documentation(description_text(directive.description.as_ref()));
                item.insert_text = Some(format!("@{}", directive.name));
                item
            })
            .collect()
    }

    fn complete_arguments(&self, parent_type: &str, field_name: &str) -> Vec<CompletionItem> {
        let Ok(field) = self.schema.type_field(parent_type, field_name) else {
            return Vec::new();
        };

        field
            .arguments
            .iter()
            .map(|arg| {
                CompletionItem::new(arg.name.as_str(), CompletionItemKind::Argument)
                    .with_detail(arg.ty.to_string())
                    .with_documentation(description_text(arg.description.as_ref()))
            })
            .collect()
    }
}

pub(crate) fn type_kind(ty: &ExtendedType) -> &'static str {
    match ty {
        ExtendedType::Scalar(_) => "Scalar",
        ExtendedType::Object(_) => "Object",
        ExtendedType::Interface(_) => "Interface",
        ExtendedType::Union(_) => "Union",
        ExtendedType::Enum(_) => "Enum",
        ExtendedType::InputObject(_) => "Input Object",
    }
}

fn is_executable_location(location: &DirectiveLocation) -> bool {
    matches!(
        location,
        DirectiveLocation::Query
            | DirectiveLocation::Mutation
            | DirectiveLocation::Subscription
            | DirectiveLocation::Field
            | DirectiveLocation::FragmentDefinition
            | DirectiveLocation::FragmentSpread
            | DirectiveLocation::InlineFragment
            | DirectiveLocation::VariableDefinition
    )
}

fn text_before(source: &str, offset: usize) -> &str {
    source.get(offset.saturating_sub(16)..offset).unwrap_or_default()
}

/// The cursor sits after a standalone `on`, as in `... on ` or `fragment F on `
fn follows_on_keyword(source: &str, offset: usize) -> bool {
    text_before(source, offset)
        .trim_end()
        .strip_suffix("on")
        .is_some_and(|rest| rest.is_empty() || rest.ends_with([' ', '\t', '\n', '.']))
}

/// Inclusive at both ends, so a cursor right after a node still counts
fn contains(node: &apollo_parser::SyntaxNode, offset: usize) -> bool {
    let range = node.text_range();
    let start: usize = range.start().into();
    let end: usize = range.end().into();
    offset >= start && offset <= end
}
