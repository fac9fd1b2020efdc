use crate::entry::Property;
use crate::enums::{Enum, EnumValue};
use crate::metadata::Metadata;
use crate::types::{NodeId, PropertyKind};
use std::collections::BTreeMap;

/// A node in the metadata tree
///
/// `parent` is a non-owning back edge; ownership lives in the arena held by
/// [`Metadata`].
#[derive(Debug, Clone)]
pub struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) data: NodeData,
}

/// Payload of a tree node
#[derive(Debug, Clone)]
pub enum NodeData {
    /// The `Metadata` object itself
    Root(Root),
    OuterNamespace(OuterNamespace),
    Section(Section),
    Kind(Kind),
    InnerNamespace(InnerNamespace),
    /// An entry or a clone
    Property(Property),
    Enum(Enum),
    EnumValue(EnumValue),
    Tag(Tag),
    Typedef(Typedef),
}

#[derive(Debug, Clone, Default)]
pub struct Root {
    pub outer_namespaces: Vec<NodeId>,
    pub tags: Vec<NodeId>,
    pub types: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct OuterNamespace {
    pub name: String,
    pub sections: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Section {
    pub name: String,
    pub description: Option<String>,
    /// Kinds in document order; the same kind may appear more than once
    pub kinds: Vec<NodeId>,
}

/// Children shared by [`Kind`] and [`InnerNamespace`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Members {
    pub namespaces: Vec<NodeId>,
    pub entries: Vec<NodeId>,
}

#[derive(Debug, Clone)]
pub struct Kind {
    pub name: PropertyKind,
    pub members: Members,
}

#[derive(Debug, Clone)]
pub struct InnerNamespace {
    pub name: String,
    pub members: Members,
}

/// Cross-cutting label attachable to many entries
#[derive(Debug, Clone)]
pub struct Tag {
    pub id: String,
    pub description: String,
    /// Back edges to tagged entries and clones
    pub entries: Vec<NodeId>,
}

/// Alias mapping a metadata type to language-specific class names
#[derive(Debug, Clone)]
pub struct Typedef {
    pub name: String,
    /// Language name -> fully qualified type name
    pub languages: BTreeMap<String, String>,
    /// Back edges to entries using this typedef
    pub entries: Vec<NodeId>,
}

impl Node {
    pub(crate) const fn new(parent: Option<NodeId>, data: NodeData) -> Self {
        Self { parent, data }
    }

    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    #[must_use]
    pub const fn data(&self) -> &NodeData {
        &self.data
    }

    /// Node name; properties report their fully qualified dotted name
    #[must_use]
    pub fn name(&self) -> &str {
        match &self.data {
            NodeData::Root(_) => "",
            NodeData::OuterNamespace(n) => &n.name,
            NodeData::Section(s) => &s.name,
            NodeData::Kind(k) => k.name.as_str(),
            NodeData::InnerNamespace(n) => &n.name,
            NodeData::Property(p) => &p.name,
            NodeData::Enum(e) => &e.name,
            NodeData::EnumValue(v) => &v.name,
            NodeData::Tag(t) => &t.id,
            NodeData::Typedef(t) => &t.name,
        }
    }

    /// Direct children in traversal order
    #[must_use]
    pub fn children(&self) -> Vec<NodeId> {
        match &self.data {
            NodeData::Root(r) => r
                .outer_namespaces
                .iter()
                .chain(&r.tags)
                .chain(&r.types)
                .copied()
                .collect(),
            NodeData::OuterNamespace(n) => n.sections.clone(),
            NodeData::Section(s) => s.kinds.clone(),
            NodeData::Kind(Kind { members, .. })
            | NodeData::InnerNamespace(InnerNamespace { members, .. }) => members
                .namespaces
                .iter()
                .chain(&members.entries)
                .copied()
                .collect(),
            NodeData::Property(p) => p.enumeration.into_iter().collect(),
            NodeData::Enum(e) => e.values.clone(),
            NodeData::EnumValue(_) | NodeData::Tag(_) | NodeData::Typedef(_) => Vec::new(),
        }
    }

    /// Namespace/entry children of a kind or inner namespace
    #[must_use]
    pub const fn members(&self) -> Option<&Members> {
        match &self.data {
            NodeData::Kind(Kind { members, .. })
            | NodeData::InnerNamespace(InnerNamespace { members, .. }) => Some(members),
            _ => None,
        }
    }

    pub(crate) fn members_mut(&mut self) -> Option<&mut Members> {
        match &mut self.data {
            NodeData::Kind(Kind { members, .. })
            | NodeData::InnerNamespace(InnerNamespace { members, .. }) => Some(members),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_property(&self) -> Option<&Property> {
        match &self.data {
            NodeData::Property(p) => Some(p),
            _ => None,
        }
    }

    #[must_use]
    pub const fn is_property(&self) -> bool {
        matches!(self.data, NodeData::Property(_))
    }

    #[must_use]
    pub fn is_clone(&self) -> bool {
        self.as_property().is_some_and(Property::is_clone)
    }

    #[must_use]
    pub const fn is_section(&self) -> bool {
        matches!(self.data, NodeData::Section(_))
    }

    #[must_use]
    pub const fn is_kind(&self) -> bool {
        matches!(self.data, NodeData::Kind(_))
    }

    #[must_use]
    pub const fn is_inner_namespace(&self) -> bool {
        matches!(self.data, NodeData::InnerNamespace(_))
    }

    #[must_use]
    pub const fn is_enum_value(&self) -> bool {
        matches!(self.data, NodeData::EnumValue(_))
    }
}

/// Lazy pre-order search over a subtree
///
/// Each call to [`Metadata::find_all`] builds a fresh iterator, so searches
/// can be restarted freely.
pub struct FindAll<'a, P> {
    metadata: &'a Metadata,
    stack: Vec<NodeId>,
    pred: P,
}

impl<P> Iterator for FindAll<'_, P>
where
    P: FnMut(&Node) -> bool,
{
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.stack.pop() {
            let node = self.metadata.get(id)?;
            self.stack.extend(node.children().into_iter().rev());
            if (self.pred)(node) {
                return Some(id);
            }
        }
        None
    }
}

/// Lazy closest-first walk over a node's ancestors
pub struct FindParents<'a, P> {
    metadata: &'a Metadata,
    next: Option<NodeId>,
    pred: P,
}

impl<P> Iterator for FindParents<'_, P>
where
    P: FnMut(&Node) -> bool,
{
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some(id) = self.next {
            let node = self.metadata.get(id)?;
            self.next = node.parent;
            if (self.pred)(node) {
                return Some(id);
            }
        }
        None
    }
}

impl Metadata {
    /// All nodes under `start` (inclusive) matching `pred`, in pre-order
    pub fn find_all<P>(&self, start: NodeId, pred: P) -> FindAll<'_, P>
    where
        P: FnMut(&Node) -> bool,
    {
        FindAll {
            metadata: self,
            stack: vec![start],
            pred,
        }
    }

    pub fn find_first<P>(&self, start: NodeId, pred: P) -> Option<NodeId>
    where
        P: FnMut(&Node) -> bool,
    {
        self.find_all(start, pred).next()
    }

    /// Ancestors of `start` (exclusive) matching `pred`, closest first
    pub fn find_parents<P>(&self, start: NodeId, pred: P) -> FindParents<'_, P>
    where
        P: FnMut(&Node) -> bool,
    {
        FindParents {
            metadata: self,
            next: self.get(start).and_then(Node::parent),
            pred,
        }
    }

    pub fn find_parent_first<P>(&self, start: NodeId, pred: P) -> Option<NodeId>
    where
        P: FnMut(&Node) -> bool,
    {
        self.find_parents(start, pred).next()
    }

    /// Check that every child reachable from `start` points back at its parent.
    ///
    /// Logs one warning per mismatch and keeps going; returns `true` when the
    /// subtree is consistent.
    pub fn validate_tree(&self, start: NodeId) -> bool {
        let mut consistent = true;
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            let Some(node) = self.get(id) else {
                continue;
            };
            for child in node.children() {
                let Some(child_node) = self.get(child) else {
                    consistent = false;
                    continue;
                };
                if child_node.parent != Some(id) {
                    consistent = false;
                    if self.config().diagnostics.warns() {
                        log::warn!(
                            "Node '{}' ({}) doesn't match the parent (expected: '{}' {}, actual: {:?})",
                            child_node.name(),
                            child,
                            node.name(),
                            id,
                            child_node.parent
                        );
                    }
                }
                stack.push(child);
            }
        }
        consistent
    }

    /// Sort the immediate children of `id` in place.
    ///
    /// Sections order kinds controls, static, dynamic (stable, so split
    /// kinds keep their relative order); containers sort by name; enum
    /// values keep their positional order since it defines implicit ids.
    pub fn sort_children(&mut self, id: NodeId) {
        let Some(node) = self.nodes.get(id.0) else {
            return;
        };
        let by_name = |ids: &[NodeId]| -> Vec<NodeId> {
            let mut sorted = ids.to_vec();
            sorted.sort_by(|a, b| self.nodes[a.0].name().cmp(self.nodes[b.0].name()));
            sorted
        };
        let sorted = match &node.data {
            NodeData::Root(r) => SortedChildren::Root(
                by_name(&r.outer_namespaces),
                by_name(&r.tags),
                by_name(&r.types),
            ),
            NodeData::OuterNamespace(n) => SortedChildren::Flat(by_name(&n.sections)),
            NodeData::Section(s) => {
                let mut kinds = s.kinds.clone();
                kinds.sort_by_key(|k| match &self.nodes[k.0].data {
                    NodeData::Kind(kind) => kind.name,
                    _ => PropertyKind::Dynamic,
                });
                SortedChildren::Flat(kinds)
            }
            NodeData::Kind(Kind { members, .. })
            | NodeData::InnerNamespace(InnerNamespace { members, .. }) => SortedChildren::Members(Members {
                namespaces: by_name(&members.namespaces),
                entries: by_name(&members.entries),
            }),
            _ => return,
        };

        match (&mut self.nodes[id.0].data, sorted) {
            (NodeData::Root(r), SortedChildren::Root(ons, tags, types)) => {
                r.outer_namespaces = ons;
                r.tags = tags;
                r.types = types;
            }
            (NodeData::OuterNamespace(n), SortedChildren::Flat(sections)) => n.sections = sections,
            (NodeData::Section(s), SortedChildren::Flat(kinds)) => s.kinds = kinds,
            (NodeData::Kind(Kind { members, .. }), SortedChildren::Members(sorted))
            | (NodeData::InnerNamespace(InnerNamespace { members, .. }), SortedChildren::Members(sorted)) => {
                *members = sorted;
            }
            _ => {}
        }
    }

    /// Sort every container in the tree, top-down
    pub fn sort_tree(&mut self) {
        let ids: Vec<NodeId> = self.find_all(NodeId::ROOT, |_| true).collect();
        for id in ids {
            self.sort_children(id);
        }
    }
}

enum SortedChildren {
    Root(Vec<NodeId>, Vec<NodeId>, Vec<NodeId>),
    Flat(Vec<NodeId>),
    Members(Members),
}
