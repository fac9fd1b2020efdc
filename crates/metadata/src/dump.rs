//! Serializable snapshot of the built tree, for tooling that wants JSON.

use crate::entry::{EntryVariant, Property};
use crate::error::Result;
use crate::metadata::Metadata;
use crate::node::{Members, NodeData};
use crate::types::{Container, NodeId, PropertyKind, ValueType, Visibility};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum TreeDump {
    Metadata {
        outer_namespaces: Vec<TreeDump>,
        tags: Vec<TagDump>,
        types: Vec<TypedefDump>,
    },
    OuterNamespace {
        name: String,
        sections: Vec<TreeDump>,
    },
    Section {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        kinds: Vec<TreeDump>,
    },
    Kind {
        name: PropertyKind,
        namespaces: Vec<TreeDump>,
        entries: Vec<PropertyDump>,
    },
    InnerNamespace {
        name: String,
        namespaces: Vec<TreeDump>,
        entries: Vec<PropertyDump>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagDump {
    pub id: String,
    pub description: String,
    pub entries: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypedefDump {
    pub name: String,
    pub languages: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyDump {
    pub name: String,
    pub kind: PropertyKind,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container: Option<Container>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub container_sizes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    pub optional: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub typedef: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<EnumValueDump>,
    /// Target kind, for clones
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clone_of: Option<PropertyKind>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unresolved: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValueDump {
    pub name: String,
    pub value: String,
    pub optional: bool,
}

impl Metadata {
    /// Snapshot the constructed tree
    pub fn dump(&self) -> Result<TreeDump> {
        let outer_namespaces = self
            .outer_namespaces()?
            .iter()
            .map(|&id| self.dump_node(id))
            .collect::<Result<Vec<_>>>()?;

        let tags = self
            .tags()
            .iter()
            .filter_map(|&id| self.tag(id))
            .map(|t| TagDump {
                id: t.id.clone(),
                description: t.description.clone(),
                entries: t.entries.iter().map(|&e| self.node(e).name().to_string()).collect(),
            })
            .collect();
        let types = self
            .types()
            .iter()
            .filter_map(|&id| self.typedef(id))
            .map(|t| TypedefDump {
                name: t.name.clone(),
                languages: t.languages.clone(),
            })
            .collect();

        Ok(TreeDump::Metadata {
            outer_namespaces,
            tags,
            types,
        })
    }

    fn dump_node(&self, id: NodeId) -> Result<TreeDump> {
        let dump_all = |ids: &[NodeId]| ids.iter().map(|&c| self.dump_node(c)).collect::<Result<Vec<_>>>();
        Ok(match &self.node(id).data {
            NodeData::OuterNamespace(n) => TreeDump::OuterNamespace {
                name: n.name.clone(),
                sections: dump_all(&n.sections)?,
            },
            NodeData::Section(s) => TreeDump::Section {
                name: s.name.clone(),
                description: s.description.clone(),
                kinds: dump_all(&s.kinds)?,
            },
            NodeData::Kind(k) => {
                let (namespaces, entries) = self.dump_members(&k.members)?;
                TreeDump::Kind {
                    name: k.name,
                    namespaces,
                    entries,
                }
            }
            NodeData::InnerNamespace(n) => {
                let (namespaces, entries) = self.dump_members(&n.members)?;
                TreeDump::InnerNamespace {
                    name: n.name.clone(),
                    namespaces,
                    entries,
                }
            }
            _ => return Err(crate::MetadataError::unexpected_node(id, "container")),
        })
    }

    fn dump_members(&self, members: &Members) -> Result<(Vec<TreeDump>, Vec<PropertyDump>)> {
        let namespaces = members
            .namespaces
            .iter()
            .map(|&id| self.dump_node(id))
            .collect::<Result<Vec<_>>>()?;
        let entries = members
            .entries
            .iter()
            .filter_map(|&id| self.property(id))
            .map(|p| self.dump_property(p))
            .collect::<Result<Vec<_>>>()?;
        Ok((namespaces, entries))
    }

    fn dump_property(&self, property: &Property) -> Result<PropertyDump> {
        let enum_values = match property.enumeration.and_then(|e| self.enumeration(e)) {
            Some(enumeration) => enumeration
                .values
                .iter()
                .filter_map(|&id| self.enum_value(id).map(|v| (id, v)))
                .map(|(id, v)| {
                    Ok(EnumValueDump {
                        name: v.name.clone(),
                        value: self.enum_value_string(id)?,
                        optional: v.optional,
                    })
                })
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        let (clone_of, unresolved) = match &property.variant {
            EntryVariant::Entry => (None, false),
            EntryVariant::Clone(c) => (Some(c.target_kind), c.entry.is_none()),
        };

        Ok(PropertyDump {
            name: property.name.clone(),
            kind: property.kind,
            value_type: property.value_type,
            container: property.container,
            container_sizes: property.container_sizes.clone(),
            visibility: property.visibility,
            optional: property.optional,
            tags: property.tags.iter().map(|&t| self.node(t).name().to_string()).collect(),
            typedef: property.typedef.map(|t| self.node(t).name().to_string()),
            enum_values,
            clone_of,
            unresolved,
        })
    }
}
