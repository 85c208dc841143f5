use super::{node_range, CodegenError, CompileError, DocumentCompiler};
use crate::module::{Keyword, Module, Property, TsType, TypeAlias};
use crate::schema::description_text as description;
use apollo_compiler::ast::{self, OperationType, Selection};
use apollo_compiler::schema::ExtendedType;
use apollo_compiler::validation::Valid;
use apollo_compiler::{Node, Schema};
use heck::ToUpperCamelCase;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::ops::Range;

const HEADER: [&str; 2] = [
    "eslint-disable",
    "This is an autogenerated file. Do not edit this file directly!",
];

/// Emits TypeScript type aliases for operations and fragments.
///
/// Each operation yields `<Name><Kind>` for its result and
/// `<Name><Kind>Variables` for its variables; each fragment yields
/// `<Name>Fragment`. Input objects used by variables get an alias of their
/// own.
#[derive(Debug, Clone, Default)]
pub struct TypeScriptCompiler {
    scalars: BTreeMap<String, String>,
}

impl TypeScriptCompiler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// TypeScript types for custom scalars; unmapped scalars become `unknown`
    #[must_use]
    pub fn with_scalars(mut self, scalars: BTreeMap<String, String>) -> Self {
        self.scalars = scalars;
        self
    }

    fn scalar(&self, name: &str) -> TsType {
        match name {
            "ID" | "String" => TsType::Keyword(Keyword::String),
            "Int" | "Float" => TsType::Keyword(Keyword::Number),
            "Boolean" => TsType::Keyword(Keyword::Boolean),
            _ => self
                .scalars
                .get(name)
                .map_or(TsType::Keyword(Keyword::Unknown), |ty| TsType::from_source(ty)),
        }
    }
}

impl DocumentCompiler for TypeScriptCompiler {
    fn compile(
        &self,
        document: &ast::Document,
        schema: &Valid<Schema>,
    ) -> Result<Module, CompileError> {
        let fragments = document
            .definitions
            .iter()
            .filter_map(|definition| match definition {
                ast::Definition::FragmentDefinition(fragment) => {
                    Some((fragment.name.as_str(), fragment))
                }
                _ => None,
            })
            .collect();

        let mut compilation = Compilation {
            compiler: self,
            schema,
            fragments,
            pending_inputs: VecDeque::new(),
            queued_inputs: HashSet::new(),
        };

        let mut module = Module {
            leading_comments: HEADER.iter().map(ToString::to_string).collect(),
            aliases: Vec::new(),
        };

        for definition in &document.definitions {
            match definition {
                ast::Definition::OperationDefinition(operation) => {
                    module.aliases.extend(compilation.operation(operation)?);
                }
                ast::Definition::FragmentDefinition(fragment) => {
                    module.aliases.push(compilation.fragment(fragment)?);
                }
                _ => {}
            }
        }

        module.aliases.extend(compilation.input_objects()?);
        Ok(module)
    }
}

struct Compilation<'a> {
    compiler: &'a TypeScriptCompiler,
    schema: &'a Schema,
    fragments: HashMap<&'a str, &'a Node<ast::FragmentDefinition>>,
    pending_inputs: VecDeque<String>,
    queued_inputs: HashSet<String>,
}

/// Every field selected under one response key
struct FieldGroup<'a> {
    key: &'a str,
    /// The first selection; names the schema field
    field: &'a Node<ast::Field>,
    selections: Vec<&'a [Selection]>,
    /// Optional only when every selection carries `@include` or `@skip`
    conditional: bool,
}

impl<'a> FieldGroup<'a> {
    fn new(key: &'a str, field: &'a Node<ast::Field>) -> Self {
        Self {
            key,
            field,
            selections: vec![field.selection_set.as_slice()],
            conditional: is_conditional(field),
        }
    }

    fn merge(&mut self, field: &'a Node<ast::Field>) {
        self.selections.push(field.selection_set.as_slice());
        self.conditional &= is_conditional(field);
    }
}

fn is_conditional(field: &ast::Field) -> bool {
    field.directives.get("include").is_some() || field.directives.get("skip").is_some()
}

fn with_suffix(name: &str, suffix: &str) -> String {
    let name = name.to_upper_camel_case();
    if name.ends_with(suffix) {
        name
    } else {
        format!("{name}{suffix}")
    }
}

const fn operation_keyword(operation_type: OperationType) -> &'static str {
    match operation_type {
        OperationType::Query => "query",
        OperationType::Mutation => "mutation",
        OperationType::Subscription => "subscription",
    }
}

impl<'a> Compilation<'a> {
    fn operation(
        &mut self,
        operation: &'a Node<ast::OperationDefinition>,
    ) -> Result<Vec<TypeAlias>, CompileError> {
        let schema = self.schema;
        let keyword = operation_keyword(operation.operation_type);
        let root = schema
            .root_operation(operation.operation_type)
            .ok_or_else(|| {
                CodegenError::at(
                    operation,
                    format!("Schema does not define a {keyword} root type."),
                )
            })?;

        let base_name = operation
            .name
            .as_ref()
            .map_or_else(|| "Anonymous".to_string(), ToString::to_string);
        let alias_name = with_suffix(&base_name, &keyword.to_upper_camel_case());

        let result = self.selection_set(
            root.as_str(),
            &[operation.selection_set.as_slice()],
            &mut Vec::new(),
        )?;

        let mut variables = Vec::new();
        for variable in &operation.variables {
            let at = if variable.ty.location().is_some() {
                node_range(&variable.ty)
            } else {
                node_range(variable)
            };
            let ty = self
                .input_type(&variable.ty)
                .map_err(|message| CodegenError::new(message, at))?;
            let mut property = Property::new(variable.name.as_str(), ty);
            if !variable.ty.is_non_null() || variable.default_value.is_some() {
                property = property.optional();
            }
            variables.push(property);
        }

        Ok(vec![
            TypeAlias {
                name: alias_name.clone(),
                doc: None,
                ty: result,
            },
            TypeAlias {
                name: format!("{alias_name}Variables"),
                doc: None,
                ty: TsType::Object(variables),
            },
        ])
    }

    fn fragment(
        &mut self,
        fragment: &'a Node<ast::FragmentDefinition>,
    ) -> Result<TypeAlias, CompileError> {
        let condition = fragment.type_condition.as_str();
        if !self.schema.types.contains_key(condition) {
            return Err(CodegenError::at(fragment, format!("Unknown type \"{condition}\".")).into());
        }

        let mut visiting = vec![fragment.name.as_str()];
        let ty = self.selection_set(
            condition,
            &[fragment.selection_set.as_slice()],
            &mut visiting,
        )?;

        Ok(TypeAlias {
            name: with_suffix(fragment.name.as_str(), "Fragment"),
            doc: None,
            ty,
        })
    }

    /// The object type for selections on `parent`. `sets` are merged: fields
    /// sharing a response key become one property. Selections guarded by a
    /// narrower type condition become a union of branches, intersected with
    /// the fields every object gets.
    fn selection_set(
        &mut self,
        parent: &str,
        sets: &[&'a [Selection]],
        visiting: &mut Vec<&'a str>,
    ) -> Result<TsType, CompileError> {
        let mut fields = Vec::new();
        let mut branches = Vec::new();
        for selections in sets.iter().copied() {
            self.collect(parent, selections, &mut fields, &mut branches, visiting)?;
        }

        let mut properties = Vec::with_capacity(fields.len());
        for group in &fields {
            properties.push(self.field(parent, group, visiting)?);
        }

        let base = TsType::Object(properties);
        if branches.is_empty() {
            return Ok(base);
        }

        branches.push(TsType::Object(Vec::new()));
        Ok(TsType::Intersection(vec![base, TsType::Union(branches)]))
    }

    fn collect(
        &mut self,
        parent: &str,
        selections: &'a [Selection],
        fields: &mut Vec<FieldGroup<'a>>,
        branches: &mut Vec<TsType>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<(), CompileError> {
        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    let key = field.alias.as_ref().unwrap_or(&field.name).as_str();
                    match fields.iter_mut().find(|group| group.key == key) {
                        Some(group) => group.merge(field),
                        None => fields.push(FieldGroup::new(key, field)),
                    }
                }
                Selection::InlineFragment(inline) => {
                    let condition = inline.type_condition.as_ref().map(|name| name.as_str());
                    self.narrowed(
                        parent,
                        condition,
                        &inline.selection_set,
                        node_range(inline),
                        fields,
                        branches,
                        visiting,
                    )?;
                }
                Selection::FragmentSpread(spread) => {
                    let name = spread.fragment_name.as_str();
                    let Some(fragment) = self.fragments.get(name).copied() else {
                        return Err(CodegenError::at(
                            spread,
                            format!("Fragment \"{name}\" is not defined in this document."),
                        )
                        .into());
                    };
                    if visiting.contains(&name) {
                        return Err(CodegenError::at(
                            spread,
                            format!("Fragment \"{name}\" spreads itself."),
                        )
                        .into());
                    }

                    visiting.push(fragment.name.as_str());
                    self.narrowed(
                        parent,
                        Some(fragment.type_condition.as_str()),
                        &fragment.selection_set,
                        node_range(spread),
                        fields,
                        branches,
                        visiting,
                    )?;
                    visiting.pop();
                }
            }
        }

        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn narrowed(
        &mut self,
        parent: &str,
        condition: Option<&str>,
        selections: &'a [Selection],
        at: Range<usize>,
        fields: &mut Vec<FieldGroup<'a>>,
        branches: &mut Vec<TsType>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<(), CompileError> {
        let Some(condition) = condition.filter(|condition| *condition != parent) else {
            return self.collect(parent, selections, fields, branches, visiting);
        };

        if !self.schema.types.contains_key(condition) {
            return Err(CodegenError::new(format!("Unknown type \"{condition}\"."), at).into());
        }

        // `... on Node` inside an object that implements Node always applies
        let always_applies = matches!(self.schema.types.get(parent), Some(ExtendedType::Object(_)))
            && self.schema.is_subtype(condition, parent);
        if always_applies {
            return self.collect(parent, selections, fields, branches, visiting);
        }

        branches.push(self.selection_set(condition, &[selections], visiting)?);
        Ok(())
    }

    fn field(
        &mut self,
        parent: &str,
        group: &FieldGroup<'a>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<Property, CompileError> {
        let field = group.field;

        if field.name.as_str() == "__typename" {
            let ty = if matches!(self.schema.types.get(parent), Some(ExtendedType::Object(_))) {
                TsType::StringLiteral(parent.to_string())
            } else {
                TsType::Keyword(Keyword::String)
            };
            return Ok(Property::new(group.key, ty));
        }

        let schema = self.schema;
        let definition = schema
            .type_field(parent, field.name.as_str())
            .map_err(|_| {
                CodegenError::at(
                    field,
                    format!("Cannot query field \"{}\" on type \"{parent}\".", field.name),
                )
            })?;

        let ty = self.output_type(&definition.ty, group, visiting)?;
        let mut property =
            Property::new(group.key, ty).with_doc(description(definition.description.as_ref()));
        if group.conditional {
            property = property.optional();
        }
        Ok(property)
    }

    fn output_type(
        &mut self,
        ty: &ast::Type,
        group: &FieldGroup<'a>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<TsType, CompileError> {
        Ok(match ty {
            ast::Type::NonNullNamed(name) => self.named_output(name.as_str(), group, visiting)?,
            ast::Type::Named(name) => {
                TsType::nullable(self.named_output(name.as_str(), group, visiting)?)
            }
            ast::Type::NonNullList(item) => {
                TsType::Array(Box::new(self.output_type(item, group, visiting)?))
            }
            ast::Type::List(item) => TsType::nullable(TsType::Array(Box::new(
                self.output_type(item, group, visiting)?,
            ))),
        })
    }

    fn named_output(
        &mut self,
        name: &str,
        group: &FieldGroup<'a>,
        visiting: &mut Vec<&'a str>,
    ) -> Result<TsType, CompileError> {
        let field = group.field;
        let schema = self.schema;
        let Some(definition) = schema.types.get(name) else {
            return Err(CompileError::Internal(format!(
                "Type \"{name}\" of field \"{}\" is missing from the schema",
                field.name
            )));
        };

        let has_selection = group.selections.iter().any(|selections| !selections.is_empty());
        match definition {
            ExtendedType::Scalar(_) | ExtendedType::Enum(_) => {
                if has_selection {
                    return Err(CodegenError::at(
                        field,
                        format!(
                            "Field \"{}\" must not have a selection since type \"{name}\" has no subfields.",
                            field.name
                        ),
                    )
                    .into());
                }
                Ok(self.leaf(name, definition))
            }
            ExtendedType::Object(_) | ExtendedType::Interface(_) | ExtendedType::Union(_) => {
                if !has_selection {
                    return Err(CodegenError::at(
                        field,
                        format!(
                            "Field \"{}\" of type \"{name}\" must have a selection of subfields.",
                            field.name
                        ),
                    )
                    .into());
                }
                self.selection_set(name, &group.selections, visiting)
            }
            ExtendedType::InputObject(_) => Err(CompileError::Internal(format!(
                "Field \"{}\" has input type \"{name}\" in an output position",
                field.name
            ))),
        }
    }

    fn leaf(&self, name: &str, definition: &ExtendedType) -> TsType {
        match definition {
            ExtendedType::Enum(enum_type) => TsType::Union(
                enum_type
                    .values
                    .keys()
                    .map(|value| TsType::StringLiteral(value.to_string()))
                    .collect(),
            ),
            _ => self.compiler.scalar(name),
        }
    }

    /// The type of a variable or input field. Errors are plain messages so the
    /// caller decides how they are located.
    fn input_type(&mut self, ty: &ast::Type) -> Result<TsType, String> {
        Ok(match ty {
            ast::Type::NonNullNamed(name) => self.named_input(name.as_str())?,
            ast::Type::Named(name) => TsType::nullable(self.named_input(name.as_str())?),
            ast::Type::NonNullList(item) => TsType::Array(Box::new(self.input_type(item)?)),
            ast::Type::List(item) => {
                TsType::nullable(TsType::Array(Box::new(self.input_type(item)?)))
            }
        })
    }

    fn named_input(&mut self, name: &str) -> Result<TsType, String> {
        match self.schema.types.get(name) {
            None => Err(format!("Unknown type \"{name}\".")),
            Some(definition @ (ExtendedType::Scalar(_) | ExtendedType::Enum(_))) => {
                Ok(self.leaf(name, definition))
            }
            Some(ExtendedType::InputObject(_)) => {
                if self.queued_inputs.insert(name.to_string()) {
                    self.pending_inputs.push_back(name.to_string());
                }
                Ok(TsType::Reference(name.to_string()))
            }
            Some(_) => Err(format!("Type \"{name}\" is not an input type.")),
        }
    }

    /// Aliases for every input object reached from a variable, in discovery order
    fn input_objects(&mut self) -> Result<Vec<TypeAlias>, CompileError> {
        let mut aliases = Vec::new();

        let schema = self.schema;
        while let Some(name) = self.pending_inputs.pop_front() {
            let Some(ExtendedType::InputObject(input)) = schema.types.get(name.as_str())
            else {
                return Err(CompileError::Internal(format!(
                    "Input object \"{name}\" is missing from the schema"
                )));
            };

            let mut properties = Vec::new();
            for (field_name, field) in &input.fields {
                let ty = self.input_type(&field.ty).map_err(|message| {
                    CompileError::Internal(format!("{name}.{field_name}: {message}"))
                })?;
                let mut property = Property::new(field_name.as_str(), ty)
                    .with_doc(description(field.description.as_ref()));
                if !field.ty.is_non_null() || field.default_value.is_some() {
                    property = property.optional();
                }
                properties.push(property);
            }

            aliases.push(TypeAlias {
                doc: description(input.description.as_ref()),
                name,
                ty: TsType::Object(properties),
            });
        }

        Ok(aliases)
    }
}
