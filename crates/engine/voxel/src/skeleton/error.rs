use crate::matrix::MatrixError;
use thiserror::Error;

/// Skeleton grammar and hierarchy errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkeletonError {
    #[error("no root null: exactly one N marker must have no parent")]
    NoRoot,

    #[error("multiple roots: '{first}' and '{second}' both have no parent")]
    MultipleRoots { first: String, second: String },

    #[error("marker '{marker}' in node '{node}' has no parent")]
    MissingParent { marker: String, node: String },

    #[error("marker '{marker}' refers to unknown parent '{parent}'")]
    UnresolvedParent { marker: String, parent: String },

    #[error("parent chain of marker '{marker}' loops back on itself")]
    ParentCycle { marker: String },

    #[error("bone '{bone}' has no end marker '{end}'")]
    MissingEndMarker { bone: String, end: String },

    #[error("bone '{bone}' has zero length")]
    DegenerateBone { bone: String },

    #[error("marker '{name}' defined by both '{first}' and '{second}'")]
    DuplicateMarker {
        name: String,
        first: String,
        second: String,
    },

    #[error("node '{node}' has an empty marker segment")]
    EmptySegment { node: String },

    #[error(transparent)]
    Matrix(#[from] MatrixError),
}
