use crate::error::{MetadataError, Result};
use crate::metadata::Metadata;
use crate::node::NodeData;
use crate::types::NodeId;
use once_cell::sync::Lazy;
use regex::Regex;

static HEX_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^0x[0-9a-f]+$").expect("hex id pattern"));

/// Enumeration attached to a property
#[derive(Debug, Clone)]
pub struct Enum {
    /// Name of the owning property
    pub name: String,
    /// Values in document order; order defines implicit ids
    pub values: Vec<NodeId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub name: String,
    /// Explicit id exactly as written (`5`, `0x10`)
    pub id: Option<String>,
    pub optional: bool,
    pub notes: Option<String>,
}

impl EnumValue {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            id: None,
            optional: false,
            notes: None,
        }
    }
}

/// Effective value of `values[index]` with C enum semantics.
///
/// Walks back to the nearest value with an explicit id (the value itself
/// included) and adds the distance walked; the base is 0 when no earlier
/// value has an id. Hex bases produce hex output.
pub fn calculate_value_string(values: &[&EnumValue], index: usize) -> Result<String> {
    let mut base_index = index;
    let mut offset: i128 = 0;
    while base_index > 0 && values.get(base_index).is_some_and(|v| v.id.is_none()) {
        base_index -= 1;
        offset += 1;
    }

    let base = values.get(base_index).and_then(|v| v.id.as_deref().map(|id| (v, id)));
    let invalid = |value: &EnumValue, id: &str| MetadataError::InvalidEnumId {
        value: value.name.clone(),
        id: id.to_string(),
    };
    let (base_value, hex) = match base {
        Some((value, id)) => (parse_id(id).ok_or_else(|| invalid(value, id))?, HEX_ID.is_match(id)),
        None => (0, false),
    };

    let effective = base_value.checked_add(offset).filter(|&v| in_id_range(v));
    match (effective, base) {
        (Some(effective), _) if hex => Ok(format!("0x{effective:X}")),
        (Some(effective), _) => Ok(effective.to_string()),
        (None, Some((value, id))) => Err(invalid(value, id)),
        (None, None) => Err(MetadataError::InvalidEnumId {
            value: String::new(),
            id: offset.to_string(),
        }),
    }
}

/// Explicit ids may use the full signed and unsigned 64-bit ranges
fn in_id_range(value: i128) -> bool {
    (i128::from(i64::MIN)..=i128::from(u64::MAX)).contains(&value)
}

fn parse_id(id: &str) -> Option<i128> {
    let id = id.trim();
    let (negative, digits) = match id.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, id),
    };
    let value = if let Some(hex) = digits.strip_prefix("0x").or_else(|| digits.strip_prefix("0X")) {
        i128::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = digits.strip_prefix("0o").or_else(|| digits.strip_prefix("0O")) {
        i128::from_str_radix(oct, 8).ok()?
    } else if let Some(bin) = digits.strip_prefix("0b").or_else(|| digits.strip_prefix("0B")) {
        i128::from_str_radix(bin, 2).ok()?
    } else {
        digits.parse::<i128>().ok()?
    };
    let value = if negative { -value } else { value };
    in_id_range(value).then_some(value)
}

impl Metadata {
    /// Effective value of an enum value node, formatted like its base id
    pub fn enum_value_string(&self, value: NodeId) -> Result<String> {
        let parent = self
            .node(value)
            .parent()
            .ok_or_else(|| MetadataError::unexpected_node(value, "enum value"))?;
        let enumeration = self
            .enumeration(parent)
            .ok_or_else(|| MetadataError::unexpected_node(parent, "enum"))?;

        let siblings: Vec<&EnumValue> = enumeration
            .values
            .iter()
            .filter_map(|&id| match &self.node(id).data {
                NodeData::EnumValue(v) => Some(v),
                _ => None,
            })
            .collect();
        let index = enumeration
            .values
            .iter()
            .position(|&id| id == value)
            .ok_or_else(|| MetadataError::unexpected_node(value, "enum value"))?;

        calculate_value_string(&siblings, index)
    }
}
