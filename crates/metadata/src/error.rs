use crate::types::{NodeId, PropertyKind};
use thiserror::Error;

/// Result type for metadata graph operations
pub type Result<T> = std::result::Result<T, MetadataError>;

/// Errors that stop a metadata compilation run
#[derive(Error, Debug)]
pub enum MetadataError {
    /// `insert_type` was called with a selector other than `typedef`
    #[error("Unsupported type selector: {0}")]
    UnsupportedSelector(String),

    /// Kind string is not one of `static`, `dynamic`, `controls`
    #[error("Invalid kind: {0}")]
    InvalidKind(String),

    /// A scalar record field carried an unrecognised value
    #[error("Invalid value for '{field}': {value}")]
    InvalidField { field: &'static str, value: String },

    /// Property name is not of the form `outer.section[.namespace...].name`
    #[error("Invalid property name: {0}")]
    InvalidName(String),

    /// Entry without a recognised type (strict mode only)
    #[error("Entry '{0}' has no recognised type")]
    UnknownType(String),

    /// Second entry with the same kind and name
    #[error("Duplicate {kind} entry: {name}")]
    DuplicateEntry { kind: PropertyKind, name: String },

    /// Structural edges were read before `construct_graph()` ran
    #[error("Metadata graph has not been constructed")]
    NotConstructed,

    /// Records were inserted after the last `construct_graph()`
    #[error("Metadata graph is stale; re-run construct_graph()")]
    GraphStale,

    /// Merge requested for a clone whose target never resolved
    #[error("Clone '{0}' has no resolved target entry")]
    UnresolvedClone(String),

    /// Enum value id is neither decimal nor `0x` hexadecimal
    #[error("Invalid id '{id}' for enum value {value}")]
    InvalidEnumId { value: String, id: String },

    /// Node handle points at a different node type than the operation needs
    #[error("Node {id} is not a {expected}")]
    UnexpectedNode { id: NodeId, expected: &'static str },

    /// Invalid build configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MetadataError {
    /// Create an invalid field error
    pub fn invalid_field(field: &'static str, value: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            value: value.into(),
        }
    }

    /// Create an unexpected node error
    pub fn unexpected_node(id: NodeId, expected: &'static str) -> Self {
        Self::UnexpectedNode { id, expected }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
