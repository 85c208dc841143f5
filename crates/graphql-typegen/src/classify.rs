use apollo_compiler::ast::{Definition, Document};

/// What a parsed literal contains, as far as output naming is concerned
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// A single operation; anonymous operations have no name
    Operation { name: Option<String> },
    /// A single fragment
    Fragment { name: String },
    /// More than one executable definition
    Complex,
    /// No executable definition at all
    Empty,
}

impl Classification {
    /// The name the generated file is derived from
    #[must_use]
    pub fn output_name(&self) -> Option<&str> {
        match self {
            Self::Operation { name } => name.as_deref(),
            Self::Fragment { name } => Some(name),
            Self::Complex | Self::Empty => None,
        }
    }
}

/// Classify a document by its executable definitions. Type system
/// definitions are ignored.
#[must_use]
pub fn classify(document: &Document) -> Classification {
    let mut executable = document.definitions.iter().filter(|definition| {
        matches!(
            definition,
            Definition::OperationDefinition(_) | Definition::FragmentDefinition(_)
        )
    });

    let Some(first) = executable.next() else {
        return Classification::Empty;
    };
    if executable.next().is_some() {
        return Classification::Complex;
    }

    match first {
        Definition::OperationDefinition(operation) => Classification::Operation {
            name: operation.name.as_ref().map(ToString::to_string),
        },
        Definition::FragmentDefinition(fragment) => Classification::Fragment {
            name: fragment.name.to_string(),
        },
        _ => Classification::Empty,
    }
}
