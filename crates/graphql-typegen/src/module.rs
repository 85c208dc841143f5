//! A small TypeScript declaration AST, produced by document compilers and
//! serialised by [`crate::ModulePrinter`].

/// A generated declaration module
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Module {
    /// Block comments emitted before any declaration
    pub leading_comments: Vec<String>,
    pub aliases: Vec<TypeAlias>,
}

/// `export type Name = ...;`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeAlias {
    pub name: String,
    pub doc: Option<String>,
    pub ty: TsType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    String,
    Number,
    Boolean,
    Null,
    Unknown,
    Any,
}

impl Keyword {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Unknown => "unknown",
            Self::Any => "any",
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "string" => Some(Self::String),
            "number" => Some(Self::Number),
            "boolean" => Some(Self::Boolean),
            "null" => Some(Self::Null),
            "unknown" => Some(Self::Unknown),
            "any" => Some(Self::Any),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TsType {
    Keyword(Keyword),
    /// `"value"`
    StringLiteral(String),
    /// A named type, printed verbatim
    Reference(String),
    Array(Box<TsType>),
    Object(Vec<Property>),
    Union(Vec<TsType>),
    Intersection(Vec<TsType>),
}

impl TsType {
    /// `ty | null`
    #[must_use]
    pub fn nullable(ty: Self) -> Self {
        match ty {
            Self::Union(mut members) => {
                members.push(Self::Keyword(Keyword::Null));
                Self::Union(members)
            }
            ty => Self::Union(vec![ty, Self::Keyword(Keyword::Null)]),
        }
    }

    /// A TypeScript type written by the user, e.g. in a scalar mapping
    #[must_use]
    pub fn from_source(source: &str) -> Self {
        Keyword::from_name(source.trim())
            .map_or_else(|| Self::Reference(source.trim().to_string()), Self::Keyword)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub optional: bool,
    pub ty: TsType,
    pub doc: Option<String>,
}

impl Property {
    pub fn new(name: impl Into<String>, ty: TsType) -> Self {
        Self {
            name: name.into(),
            optional: false,
            ty,
            doc: None,
        }
    }

    #[must_use]
    pub const fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn with_doc(mut self, doc: Option<String>) -> Self {
        self.doc = doc;
        self
    }
}
