use crate::error::MetadataError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable handle to a node owned by [`crate::Metadata`]
///
/// Handles are never reused: pruned or replaced nodes keep their slot so
/// outstanding ids stay valid (they simply become unreachable from the root).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// The root node, i.e. the `Metadata` object itself
    pub const ROOT: NodeId = NodeId(0);

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Which request/result/characteristics bucket a property lives in
///
/// Variant order is the canonical section order: controls, static, dynamic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Per-request parameters
    Controls,

    /// Fixed device capabilities
    Static,

    /// Per-frame results
    Dynamic,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 3] = [Self::Controls, Self::Static, Self::Dynamic];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Controls => "controls",
            Self::Static => "static",
            Self::Dynamic => "dynamic",
        }
    }
}

impl FromStr for PropertyKind {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "controls" => Ok(Self::Controls),
            "static" => Ok(Self::Static),
            "dynamic" => Ok(Self::Dynamic),
            other => Err(MetadataError::InvalidKind(other.to_string())),
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar type of a property's elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    Byte,
    Int32,
    Float,
    Int64,
    Double,
    Rational,
}

impl ValueType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Int32 => "int32",
            Self::Float => "float",
            Self::Int64 => "int64",
            Self::Double => "double",
            Self::Rational => "rational",
        }
    }
}

impl FromStr for ValueType {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "byte" => Ok(Self::Byte),
            "int32" => Ok(Self::Int32),
            "float" => Ok(Self::Float),
            "int64" => Ok(Self::Int64),
            "double" => Ok(Self::Double),
            "rational" => Ok(Self::Rational),
            other => Err(MetadataError::invalid_field("type", other)),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shape of a multi-valued property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    Array,
    Tuple,
}

impl FromStr for Container {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "array" => Ok(Self::Array),
            "tuple" => Ok(Self::Tuple),
            other => Err(MetadataError::invalid_field("container", other)),
        }
    }
}

/// Who may see a property in generated code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    System,
    Hidden,
    Public,
}

impl FromStr for Visibility {
    type Err = MetadataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Self::System),
            "hidden" => Ok(Self::Hidden),
            "public" => Ok(Self::Public),
            other => Err(MetadataError::invalid_field("visibility", other)),
        }
    }
}
