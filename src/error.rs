//! Error and diagnostic types shared by the schema models and the engines.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Duplicate {kind} name: {name}")]
    DuplicateName { kind: &'static str, name: String },
    #[error("Type mismatch: expected {expected} schema, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Precondition violated: {0}")]
    PreconditionViolation(String),
    #[error("Unresolved reference to `{name}` in {context}")]
    UnresolvedReference { context: String, name: String },
}

pub type Result<T, E = ModelError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A relationship with an unset multiplicity; no FK or junction was emitted.
    UnclassifiableRelationship,
    /// A weak relationship whose participants carry no weak entity with a natural key.
    OrphanWeakRelationship,
    /// An ARM relation without `pathfd(...) -> self`.
    MissingNaturalKey,
    /// A fully foreign identifier referencing more than two relations.
    UnsupportedArity,
    /// A foreign key kept only as a plain attribute of a recovered relationship.
    UnmappedForeignKey,
    /// A relationship whose foreign key column was already placed by another one.
    SharedForeignKey,
}

impl DiagnosticKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnclassifiableRelationship => "unclassifiable relationship",
            Self::OrphanWeakRelationship => "orphan weak relationship",
            Self::MissingNaturalKey => "missing natural key",
            Self::UnsupportedArity => "unsupported arity",
            Self::UnmappedForeignKey => "unmapped foreign key",
            Self::SharedForeignKey => "shared foreign key",
        }
    }
}

/// A recovered, warning-level problem found during a transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub subject: String,
    pub message: String,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`: {}", self.kind.as_str(), self.subject, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = ModelError::UnresolvedReference {
            context: "relationship Works".into(),
            name: "Dept".into(),
        };
        assert_eq!(err.to_string(), "Unresolved reference to `Dept` in relationship Works");

        let err = ModelError::TypeMismatch {
            expected: "EER",
            found: "ARM",
        };
        assert_eq!(err.to_string(), "Type mismatch: expected EER schema, found ARM");
    }

    #[test]
    fn test_diagnostic_display() {
        let d = Diagnostic::new(
            DiagnosticKind::UnclassifiableRelationship,
            "Works",
            "multiplicity of Department is unset",
        );
        assert_eq!(
            d.to_string(),
            "unclassifiable relationship `Works`: multiplicity of Department is unset"
        );
    }
}
