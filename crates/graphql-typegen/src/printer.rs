use crate::module::{Module, Property, TsType, TypeAlias};
use std::fmt::Write;

const INDENT: &str = "  ";

/// Serialises a [`Module`] to TypeScript source.
///
/// Output is deterministic: two-space indentation, LF line endings and a
/// trailing newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct ModulePrinter;

impl ModulePrinter {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    #[must_use]
    pub fn print(&self, module: &Module) -> String {
        let mut out = String::new();

        for comment in &module.leading_comments {
            let _ = writeln!(out, "/* {comment} */");
        }

        for alias in &module.aliases {
            Self::print_alias(&mut out, alias);
        }

        out
    }

    fn print_alias(out: &mut String, alias: &TypeAlias) {
        Self::print_doc(out, alias.doc.as_deref(), 0);
        let _ = write!(out, "export type {} = ", alias.name);
        Self::print_type(out, &alias.ty, 0);
        out.push_str(";\n");
    }

    fn print_doc(out: &mut String, doc: Option<&str>, level: usize) {
        let Some(doc) = doc else {
            return;
        };
        let indent = INDENT.repeat(level);
        let doc = doc.replace("*/", "*\\/");

        if doc.contains('\n') {
            let _ = writeln!(out, "{indent}/**");
            for line in doc.lines() {
                if line.is_empty() {
                    let _ = writeln!(out, "{indent} *");
                } else {
                    let _ = writeln!(out, "{indent} * {line}");
                }
            }
            let _ = writeln!(out, "{indent} */");
        } else {
            let _ = writeln!(out, "{indent}/** {doc} */");
        }
    }

    fn print_type(out: &mut String, ty: &TsType, level: usize) {
        match ty {
            TsType::Keyword(keyword) => out.push_str(keyword.as_str()),
            TsType::StringLiteral(value) => {
                out.push('"');
                for ch in value.chars() {
                    match ch {
                        '"' => out.push_str("\\\""),
                        '\\' => out.push_str("\\\\"),
                        _ => out.push(ch),
                    }
                }
                out.push('"');
            }
            TsType::Reference(name) => out.push_str(name),
            TsType::Array(item) => {
                let wrap = matches!(**item, TsType::Union(_) | TsType::Intersection(_));
                if wrap {
                    out.push('(');
                }
                Self::print_type(out, item, level);
                if wrap {
                    out.push(')');
                }
                out.push_str("[]");
            }
            TsType::Object(properties) => Self::print_object(out, properties, level),
            TsType::Union(members) => {
                for (idx, member) in members.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(" | ");
                    }
                    Self::print_type(out, member, level);
                }
            }
            TsType::Intersection(members) => {
                for (idx, member) in members.iter().enumerate() {
                    if idx > 0 {
                        out.push_str(" & ");
                    }
                    let wrap = matches!(member, TsType::Union(_));
                    if wrap {
                        out.push('(');
                    }
                    Self::print_type(out, member, level);
                    if wrap {
                        out.push(')');
                    }
                }
            }
        }
    }

    fn print_object(out: &mut String, properties: &[Property], level: usize) {
        if properties.is_empty() {
            out.push_str("{}");
            return;
        }

        out.push_str("{\n");
        for property in properties {
            Self::print_doc(out, property.doc.as_deref(), level + 1);
            let _ = write!(
                out,
                "{}{}{}: ",
                INDENT.repeat(level + 1),
                property.name,
                if property.optional { "?" } else { "" }
            );
            Self::print_type(out, &property.ty, level + 1);
            out.push_str(";\n");
        }
        let _ = write!(out, "{}}}", INDENT.repeat(level));
    }
}
