//! Synthetic read-only groupings over the built tree.
//!
//! Views reference real nodes but are never linked into the tree: the
//! children they list keep their real parents.

use crate::entry::MergedEntry;
use crate::error::{MetadataError, Result};
use crate::metadata::Metadata;
use crate::node::NodeData;
use crate::types::{NodeId, PropertyKind};

/// Namespaces and entries gathered from one or more real containers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerView {
    pub name: String,
    /// Set when the view stands for a single kind name
    pub kind: Option<PropertyKind>,
    pub parent: Option<NodeId>,
    pub namespaces: Vec<NodeId>,
    pub entries: Vec<NodeId>,
}

/// A container whose children were deduplicated by name
#[derive(Debug, Clone, PartialEq)]
pub struct CombinedView {
    pub name: String,
    pub kind: Option<PropertyKind>,
    pub parent: Option<NodeId>,
    /// Same-named namespaces folded together; combine again to go deeper
    pub namespaces: Vec<ContainerView>,
    /// Merge view of the first entry seen under each name
    pub entries: Vec<MergedEntry>,
}

impl ContainerView {
    /// Fold same-named namespaces and entries of this view
    pub fn combine_children_by_name(&self, metadata: &Metadata) -> Result<CombinedView> {
        metadata.combine_members(self, self.parent)
    }

    pub fn merged_entries(&self, metadata: &Metadata) -> Result<Vec<MergedEntry>> {
        self.entries.iter().map(|&e| metadata.merge(e)).collect()
    }
}

impl Metadata {
    /// A kind or inner namespace node as a view
    pub fn container_view(&self, id: NodeId) -> Result<ContainerView> {
        let node = self.node(id);
        let (name, kind, members) = match &node.data {
            NodeData::Kind(k) => (k.name.as_str().to_string(), Some(k.name), &k.members),
            NodeData::InnerNamespace(n) => (n.name.clone(), None, &n.members),
            _ => return Err(MetadataError::unexpected_node(id, "kind or inner namespace")),
        };
        Ok(ContainerView {
            name,
            kind,
            parent: node.parent(),
            namespaces: members.namespaces.clone(),
            entries: members.entries.clone(),
        })
    }

    /// One view per kind name in a section, folding the blocks split by
    /// document adjacency back together in encounter order
    pub fn merged_kinds(&self, section: NodeId) -> Result<Vec<ContainerView>> {
        let kinds = &self
            .section(section)
            .ok_or_else(|| MetadataError::unexpected_node(section, "section"))?
            .kinds;

        let mut merged: Vec<ContainerView> = Vec::new();
        for &id in kinds {
            let Some(kind) = self.kind(id) else {
                continue;
            };
            let index = match merged.iter().position(|v| v.kind == Some(kind.name)) {
                Some(index) => index,
                None => {
                    merged.push(ContainerView {
                        name: kind.name.as_str().to_string(),
                        kind: Some(kind.name),
                        parent: Some(section),
                        namespaces: Vec::new(),
                        entries: Vec::new(),
                    });
                    merged.len() - 1
                }
            };
            merged[index].namespaces.extend(&kind.members.namespaces);
            merged[index].entries.extend(&kind.members.entries);
        }
        Ok(merged)
    }

    /// Everything in a section as one kind-less view, concatenated without
    /// deduplication
    pub fn combine_kinds_into_single_node(&self, section: NodeId) -> Result<ContainerView> {
        let kinds = &self
            .section(section)
            .ok_or_else(|| MetadataError::unexpected_node(section, "section"))?
            .kinds;

        let mut combined = ContainerView {
            name: "combined".to_string(),
            kind: None,
            parent: Some(section),
            namespaces: Vec::new(),
            entries: Vec::new(),
        };
        for kind in kinds.iter().filter_map(|&k| self.kind(k)) {
            combined.namespaces.extend(&kind.members.namespaces);
            combined.entries.extend(&kind.members.entries);
        }
        Ok(combined)
    }

    /// Fold a kind's or inner namespace's same-named children.
    ///
    /// Not recursive: the returned namespace views must be combined again
    /// to collapse deeper levels. Later same-named entries are dropped.
    pub fn combine_children_by_name(&self, container: NodeId) -> Result<CombinedView> {
        let view = self.container_view(container)?;
        self.combine_members(&view, Some(container))
    }

    pub(crate) fn combine_members(&self, view: &ContainerView, owner: Option<NodeId>) -> Result<CombinedView> {
        let mut namespaces: Vec<ContainerView> = Vec::new();
        for &id in &view.namespaces {
            let Some(ns) = self.inner_namespace(id) else {
                continue;
            };
            let index = match namespaces.iter().position(|v| v.name == ns.name) {
                Some(index) => index,
                None => {
                    namespaces.push(ContainerView {
                        name: ns.name.clone(),
                        kind: None,
                        parent: owner,
                        namespaces: Vec::new(),
                        entries: Vec::new(),
                    });
                    namespaces.len() - 1
                }
            };
            namespaces[index].namespaces.extend(&ns.members.namespaces);
            namespaces[index].entries.extend(&ns.members.entries);
        }

        let mut seen: Vec<&str> = Vec::new();
        let mut entries = Vec::new();
        for &id in &view.entries {
            let name = self.node(id).name();
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            entries.push(self.merge(id)?);
        }

        Ok(CombinedView {
            name: view.name.clone(),
            kind: view.kind,
            parent: view.parent,
            namespaces,
            entries,
        })
    }
}
