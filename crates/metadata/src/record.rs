//! Flat records handed over by the document reader, in document order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One `<entry>` as produced by the schema reader
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryRecord {
    /// Fully qualified dotted name
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: Option<String>,
    pub kind: String,
    pub container: Option<String>,
    pub container_sizes: Vec<String>,
    pub tuple_values: Vec<String>,
    /// Whether the entry carries an enumeration
    #[serde(rename = "enum")]
    pub enumeration: bool,
    pub enum_values: Vec<String>,
    /// Value name -> explicit id as written
    pub enum_ids: BTreeMap<String, String>,
    /// Names of optional values
    pub enum_optionals: Vec<String>,
    /// Value name -> notes
    pub enum_notes: BTreeMap<String, String>,
    pub description: Option<String>,
    pub range: Option<String>,
    pub units: Option<String>,
    pub notes: Option<String>,
    pub tag_ids: Vec<String>,
    pub type_notes: Option<String>,
    pub type_name: Option<String>,
    pub visibility: Option<String>,
    pub optional: bool,
}

impl EntryRecord {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn value_type(mut self, value_type: impl Into<String>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    #[must_use]
    pub fn container(mut self, container: impl Into<String>, sizes: &[&str]) -> Self {
        self.container = Some(container.into());
        self.container_sizes = sizes.iter().map(|s| (*s).to_string()).collect();
        self
    }

    /// Attach an enumeration; `(name, explicit id)` pairs in document order
    #[must_use]
    pub fn enum_values(mut self, values: &[(&str, Option<&str>)]) -> Self {
        self.enumeration = true;
        for (name, id) in values {
            self.enum_values.push((*name).to_string());
            if let Some(id) = id {
                self.enum_ids.insert((*name).to_string(), (*id).to_string());
            }
        }
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    #[must_use]
    pub fn tag(mut self, tag_id: impl Into<String>) -> Self {
        self.tag_ids.push(tag_id.into());
        self
    }

    #[must_use]
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn visibility(mut self, visibility: impl Into<String>) -> Self {
        self.visibility = Some(visibility.into());
        self
    }
}

/// One `<clone>`: an entry record plus the kind it clones from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CloneRecord {
    #[serde(flatten)]
    pub entry: EntryRecord,
    pub target_kind: String,
}

impl CloneRecord {
    pub fn new(entry: EntryRecord, target_kind: impl Into<String>) -> Self {
        Self {
            entry,
            target_kind: target_kind.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedefRecord {
    pub name: String,
    #[serde(default = "default_selector")]
    pub selector: String,
    /// Language name -> fully qualified type name
    #[serde(default)]
    pub languages: BTreeMap<String, String>,
}

fn default_selector() -> String {
    "typedef".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Entry or clone, tagged so document order survives serialization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "record", rename_all = "lowercase")]
pub enum PropertyRecord {
    Entry(EntryRecord),
    Clone(CloneRecord),
}

/// Everything the schema reader extracts from one definitions document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataDocument {
    pub tags: Vec<TagRecord>,
    pub types: Vec<TypedefRecord>,
    pub sections: Vec<SectionRecord>,
    pub properties: Vec<PropertyRecord>,
}

impl MetadataDocument {
    pub fn from_json_str(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}
