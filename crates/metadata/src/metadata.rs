use crate::config::BuildConfig;
use crate::entry::{CloneRef, EntryVariant, Property};
use crate::enums::{Enum, EnumValue};
use crate::error::{MetadataError, Result};
use crate::node::{InnerNamespace, Kind, Node, NodeData, OuterNamespace, Root, Section, Tag, Typedef};
use crate::record::{CloneRecord, EntryRecord, MetadataDocument, PropertyRecord};
use crate::types::{Container, NodeId, PropertyKind, ValueType, Visibility};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum GraphState {
    Unbuilt,
    Built,
    Stale,
}

/// Root of a metadata compilation run
///
/// Owns every node in a single arena. Records are inserted flat, in
/// document order; [`Metadata::construct_graph`] then wires them into the
/// outer namespace / section / kind / inner namespace tree.
#[derive(Debug, Clone)]
pub struct Metadata {
    pub(crate) nodes: Vec<Node>,
    pub(crate) config: BuildConfig,
    pub(crate) entries: Vec<NodeId>,
    pub(crate) clones: Vec<NodeId>,
    /// Entries and clones in insertion order
    pub(crate) ordered: Vec<NodeId>,
    /// kind -> name -> entry or clone
    pub(crate) entry_map: HashMap<PropertyKind, HashMap<String, NodeId>>,
    pub(crate) section_descriptions: HashMap<String, String>,
    pub(crate) state: GraphState,
}

impl Default for Metadata {
    fn default() -> Self {
        Self::new()
    }
}

impl Metadata {
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::new(None, NodeData::Root(Root::default()))],
            config: BuildConfig::default(),
            entries: Vec::new(),
            clones: Vec::new(),
            ordered: Vec::new(),
            entry_map: HashMap::new(),
            section_descriptions: HashMap::new(),
            state: GraphState::Unbuilt,
        }
    }

    pub fn with_config(config: BuildConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            ..Self::new()
        })
    }

    /// Insert a whole document, build the graph and prune if configured
    pub fn from_document(document: MetadataDocument, config: BuildConfig) -> Result<Self> {
        let mut metadata = Self::with_config(config)?;
        for tag in document.tags {
            metadata.insert_tag(tag.id, tag.description);
        }
        for ty in document.types {
            metadata.insert_type(ty.name, &ty.selector, ty.languages)?;
        }
        for section in document.sections {
            if let Some(description) = section.description {
                metadata.describe_section(section.name, description);
            }
        }
        for record in document.properties {
            match record {
                PropertyRecord::Entry(entry) => metadata.insert_entry(entry)?,
                PropertyRecord::Clone(clone) => metadata.insert_clone(clone)?,
            };
        }

        metadata.construct_graph();
        if metadata.config.prune_unresolved_clones {
            metadata.prune_clones();
        }
        Ok(metadata)
    }

    #[must_use]
    pub const fn config(&self) -> &BuildConfig {
        &self.config
    }

    /// Whether `construct_graph()` has run since the last insertion
    #[must_use]
    pub fn is_constructed(&self) -> bool {
        self.state == GraphState::Built
    }

    pub(crate) fn ensure_constructed(&self) -> Result<()> {
        match self.state {
            GraphState::Built => Ok(()),
            GraphState::Unbuilt => Err(MetadataError::NotConstructed),
            GraphState::Stale => Err(MetadataError::GraphStale),
        }
    }

    /// Node by handle.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this `Metadata`.
    #[must_use]
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    #[must_use]
    pub fn property(&self, id: NodeId) -> Option<&Property> {
        self.get(id).and_then(Node::as_property)
    }

    #[must_use]
    pub fn outer_namespace(&self, id: NodeId) -> Option<&OuterNamespace> {
        match &self.get(id)?.data {
            NodeData::OuterNamespace(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn section(&self, id: NodeId) -> Option<&Section> {
        match &self.get(id)?.data {
            NodeData::Section(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn kind(&self, id: NodeId) -> Option<&Kind> {
        match &self.get(id)?.data {
            NodeData::Kind(k) => Some(k),
            _ => None,
        }
    }

    #[must_use]
    pub fn inner_namespace(&self, id: NodeId) -> Option<&InnerNamespace> {
        match &self.get(id)?.data {
            NodeData::InnerNamespace(n) => Some(n),
            _ => None,
        }
    }

    #[must_use]
    pub fn enumeration(&self, id: NodeId) -> Option<&Enum> {
        match &self.get(id)?.data {
            NodeData::Enum(e) => Some(e),
            _ => None,
        }
    }

    #[must_use]
    pub fn enum_value(&self, id: NodeId) -> Option<&EnumValue> {
        match &self.get(id)?.data {
            NodeData::EnumValue(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn tag(&self, id: NodeId) -> Option<&Tag> {
        match &self.get(id)?.data {
            NodeData::Tag(t) => Some(t),
            _ => None,
        }
    }

    #[must_use]
    pub fn typedef(&self, id: NodeId) -> Option<&Typedef> {
        match &self.get(id)?.data {
            NodeData::Typedef(t) => Some(t),
            _ => None,
        }
    }

    pub(crate) fn root(&self) -> &Root {
        match &self.nodes[0].data {
            NodeData::Root(r) => r,
            _ => unreachable!("slot 0 always holds the root"),
        }
    }

    pub(crate) fn root_mut(&mut self) -> &mut Root {
        match &mut self.nodes[0].data {
            NodeData::Root(r) => r,
            _ => unreachable!("slot 0 always holds the root"),
        }
    }

    /// Outer namespaces of the constructed tree
    pub fn outer_namespaces(&self) -> Result<&[NodeId]> {
        self.ensure_constructed()?;
        Ok(&self.root().outer_namespaces)
    }

    #[must_use]
    pub fn tags(&self) -> &[NodeId] {
        &self.root().tags
    }

    #[must_use]
    pub fn types(&self) -> &[NodeId] {
        &self.root().types
    }

    /// Raw entries in insertion order
    #[must_use]
    pub fn entries(&self) -> &[NodeId] {
        &self.entries
    }

    /// Raw clones in insertion order
    #[must_use]
    pub fn clones(&self) -> &[NodeId] {
        &self.clones
    }

    /// Entries and clones in insertion order
    #[must_use]
    pub fn properties(&self) -> &[NodeId] {
        &self.ordered
    }

    /// Entry or clone registered under `(kind, name)`
    #[must_use]
    pub fn find_entry(&self, kind: PropertyKind, name: &str) -> Option<NodeId> {
        self.entry_map.get(&kind)?.get(name).copied()
    }

    pub(crate) fn alloc(&mut self, parent: Option<NodeId>, data: NodeData) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::new(parent, data));
        id
    }

    fn mark_dirty(&mut self) {
        if self.state == GraphState::Built {
            self.state = GraphState::Stale;
        }
    }

    /// Insert an entry record
    pub fn insert_entry(&mut self, record: EntryRecord) -> Result<NodeId> {
        self.insert_property(record, EntryVariant::Entry)
    }

    /// Insert a clone record; its target is resolved during construction, so
    /// the target entry may be inserted before or after it
    pub fn insert_clone(&mut self, record: CloneRecord) -> Result<NodeId> {
        let target_kind: PropertyKind = record.target_kind.parse()?;
        let id = self.insert_property(
            record.entry,
            EntryVariant::Clone(CloneRef {
                target_kind,
                entry: None,
            }),
        )?;
        self.clones.push(id);
        Ok(id)
    }

    /// Insert a tag; repeated ids keep the first description
    pub fn insert_tag(&mut self, id: impl Into<String>, description: impl Into<String>) -> NodeId {
        let id = id.into();
        if let Some(existing) = self.tags().iter().copied().find(|&t| self.node(t).name() == id) {
            return existing;
        }
        let node = self.alloc(
            Some(NodeId::ROOT),
            NodeData::Tag(Tag {
                id,
                description: description.into(),
                entries: Vec::new(),
            }),
        );
        self.root_mut().tags.push(node);
        self.mark_dirty();
        node
    }

    /// Insert a typedef; only the `typedef` selector is supported
    pub fn insert_type(
        &mut self,
        name: impl Into<String>,
        selector: &str,
        languages: BTreeMap<String, String>,
    ) -> Result<NodeId> {
        if selector != "typedef" {
            return Err(MetadataError::UnsupportedSelector(selector.to_string()));
        }
        let name = name.into();
        if let Some(existing) = self.types().iter().copied().find(|&t| self.node(t).name() == name) {
            return Ok(existing);
        }
        let node = self.alloc(
            Some(NodeId::ROOT),
            NodeData::Typedef(Typedef {
                name,
                languages,
                entries: Vec::new(),
            }),
        );
        self.root_mut().types.push(node);
        self.mark_dirty();
        Ok(node)
    }

    /// Attach a description to every section with this name
    pub fn describe_section(&mut self, name: impl Into<String>, description: impl Into<String>) {
        self.section_descriptions.insert(name.into(), description.into());
        self.mark_dirty();
    }

    fn insert_property(&mut self, record: EntryRecord, variant: EntryVariant) -> Result<NodeId> {
        let components: Vec<&str> = record.name.split('.').collect();
        if components.len() < 3 || components.iter().any(|c| c.is_empty()) {
            return Err(MetadataError::InvalidName(record.name));
        }

        let kind: PropertyKind = record.kind.parse()?;
        let is_clone = matches!(variant, EntryVariant::Clone(_));
        let value_type = if is_clone {
            None
        } else {
            self.parse_value_type(&record)?
        };
        let container = record.container.as_deref().map(str::parse::<Container>).transpose()?;
        let visibility = record.visibility.as_deref().map(str::parse::<Visibility>).transpose()?;

        let existing = self.find_entry(kind, &record.name);
        if let Some(existing) = existing {
            if !self.config.allow_duplicate_entries {
                return Err(MetadataError::DuplicateEntry {
                    kind,
                    name: record.name,
                });
            }
            if self.config.diagnostics.warns() {
                log::warn!(
                    "Duplicate {} entry '{}' replaces {} in the name lookup",
                    kind,
                    record.name,
                    existing
                );
            }
        }

        let id = self.alloc(
            None,
            NodeData::Property(Property {
                name: record.name.clone(),
                kind,
                value_type,
                container,
                container_sizes: record.container_sizes,
                tuple_values: record.tuple_values,
                enumeration: None,
                description: record.description,
                range: record.range,
                units: record.units,
                notes: record.notes,
                type_notes: record.type_notes,
                tag_ids: record.tag_ids,
                type_name: record.type_name,
                visibility,
                optional: record.optional,
                tags: Vec::new(),
                typedef: None,
                variant,
            }),
        );

        if record.enumeration {
            let enum_id = self.alloc(
                Some(id),
                NodeData::Enum(Enum {
                    name: record.name.clone(),
                    values: Vec::new(),
                }),
            );
            let mut values = Vec::with_capacity(record.enum_values.len());
            for value in &record.enum_values {
                let value_id = self.alloc(
                    Some(enum_id),
                    NodeData::EnumValue(EnumValue {
                        name: value.clone(),
                        id: record.enum_ids.get(value).cloned(),
                        optional: record.enum_optionals.contains(value),
                        notes: record.enum_notes.get(value).cloned(),
                    }),
                );
                values.push(value_id);
            }
            if let NodeData::Enum(e) = &mut self.nodes[enum_id.0].data {
                e.values = values;
            }
            if let NodeData::Property(p) = &mut self.nodes[id.0].data {
                p.enumeration = Some(enum_id);
            }
        }

        self.entry_map.entry(kind).or_default().insert(record.name, id);
        if !is_clone {
            self.entries.push(id);
        }
        self.ordered.push(id);
        self.mark_dirty();
        Ok(id)
    }

    fn parse_value_type(&self, record: &EntryRecord) -> Result<Option<ValueType>> {
        let parsed = record.value_type.as_deref().map(str::parse::<ValueType>);
        match parsed {
            Some(Ok(value_type)) => Ok(Some(value_type)),
            _ if self.config.strict_types => Err(MetadataError::UnknownType(record.name.clone())),
            other => {
                if self.config.diagnostics.warns() {
                    match other {
                        Some(Err(_)) => log::warn!(
                            "Entry '{}' has unrecognised type '{}'",
                            record.name,
                            record.value_type.as_deref().unwrap_or_default()
                        ),
                        _ => log::warn!("Entry '{}' has no type", record.name),
                    }
                }
                Ok(None)
            }
        }
    }

    /// Remove clones whose target never resolved.
    ///
    /// Only meaningful once the graph has been constructed: before that no
    /// clone has a resolved target, so the call does nothing. Returns the
    /// pruned clones, which stay allocated but unreachable.
    pub fn prune_clones(&mut self) -> Vec<NodeId> {
        if self.state != GraphState::Built {
            if self.config.diagnostics.warns() {
                log::warn!("prune_clones() called before construct_graph(); nothing pruned");
            }
            return Vec::new();
        }

        let doomed: Vec<NodeId> = self
            .clones
            .iter()
            .copied()
            .filter(|&id| {
                self.property(id)
                    .and_then(Property::clone_ref)
                    .is_some_and(|c| c.entry.is_none())
            })
            .collect();

        for &id in &doomed {
            let Some(property) = self.property(id) else {
                continue;
            };
            let (kind, name) = (property.kind, property.name.clone());
            let back_edges: Vec<NodeId> = property.tags.iter().copied().chain(property.typedef).collect();

            if let Some(parent) = self.nodes[id.0].parent.take() {
                if let Some(members) = self.nodes[parent.0].members_mut() {
                    members.entries.retain(|&e| e != id);
                }
            }
            for holder in back_edges {
                match &mut self.nodes[holder.0].data {
                    NodeData::Tag(t) => t.entries.retain(|&e| e != id),
                    NodeData::Typedef(t) => t.entries.retain(|&e| e != id),
                    _ => {}
                }
            }
            self.clones.retain(|&c| c != id);
            self.ordered.retain(|&c| c != id);
            if let Some(by_name) = self.entry_map.get_mut(&kind) {
                if by_name.get(&name) == Some(&id) {
                    by_name.remove(&name);
                }
            }
            if self.config.diagnostics.debugs() {
                log::debug!("Pruned unresolved {} clone '{}'", kind, name);
            }
        }

        doomed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DiagnosticLevel;

    #[test]
    fn insert_tag_keeps_first_description() {
        let mut md = Metadata::new();
        let first = md.insert_tag("BC", "Backwards compatibility");
        let second = md.insert_tag("BC", "Something else");
        assert_eq!(first, second);
        assert_eq!(md.tags().len(), 1);
        assert_eq!(md.tag(first).unwrap().description, "Backwards compatibility");
    }

    #[test]
    fn insert_type_rejects_other_selectors() {
        let mut md = Metadata::new();
        let err = md.insert_type("rect", "enum", BTreeMap::new()).unwrap_err();
        assert!(matches!(err, MetadataError::UnsupportedSelector(s) if s == "enum"));

        let a = md.insert_type("rect", "typedef", BTreeMap::new()).unwrap();
        let b = md.insert_type("rect", "typedef", BTreeMap::new()).unwrap();
        assert_eq!(a, b);
        assert_eq!(md.types().len(), 1);
    }

    #[test]
    fn duplicate_entries_rejected_by_default() {
        let mut md = Metadata::new();
        md.insert_entry(EntryRecord::new("android.a.b", "static").value_type("byte"))
            .unwrap();
        let err = md
            .insert_entry(EntryRecord::new("android.a.b", "static").value_type("byte"))
            .unwrap_err();
        assert!(matches!(err, MetadataError::DuplicateEntry { kind: PropertyKind::Static, .. }));

        // Same name under another kind is a different property
        md.insert_entry(EntryRecord::new("android.a.b", "dynamic").value_type("byte"))
            .unwrap();
    }

    #[test]
    fn duplicate_entries_allowed_when_configured() {
        let config = BuildConfig {
            allow_duplicate_entries: true,
            diagnostics: DiagnosticLevel::Quiet,
            ..Default::default()
        };
        let mut md = Metadata::with_config(config).unwrap();
        md.insert_entry(EntryRecord::new("android.a.b", "static").value_type("byte"))
            .unwrap();
        let second = md
            .insert_entry(EntryRecord::new("android.a.b", "static").value_type("int32"))
            .unwrap();
        assert_eq!(md.properties().len(), 2);
        assert_eq!(md.find_entry(PropertyKind::Static, "android.a.b"), Some(second));
    }

    #[test]
    fn missing_type_is_soft_unless_strict() {
        let mut md = Metadata::new();
        let id = md.insert_entry(EntryRecord::new("android.a.b", "static")).unwrap();
        assert_eq!(md.property(id).unwrap().value_type, None);

        let mut strict = Metadata::with_config(BuildConfig::strict()).unwrap();
        let err = strict
            .insert_entry(EntryRecord::new("android.a.b", "static").value_type("quaternion"))
            .unwrap_err();
        assert!(matches!(err, MetadataError::UnknownType(_)));
    }

    #[test]
    fn rejects_short_names_and_bad_fields() {
        let mut md = Metadata::new();
        assert!(matches!(
            md.insert_entry(EntryRecord::new("android.lens", "static")),
            Err(MetadataError::InvalidName(_))
        ));
        assert!(matches!(
            md.insert_entry(EntryRecord::new("android.lens.x", "request")),
            Err(MetadataError::InvalidKind(_))
        ));
        assert!(matches!(
            md.insert_entry(EntryRecord::new("android.lens.x", "static").visibility("secret")),
            Err(MetadataError::InvalidField { field: "visibility", .. })
        ));
    }

    #[test]
    fn enum_children_are_owned_by_the_entry() {
        let mut md = Metadata::new();
        let id = md
            .insert_entry(
                EntryRecord::new("android.lens.facing", "static")
                    .value_type("byte")
                    .enum_values(&[("FRONT", None), ("BACK", Some("1"))]),
            )
            .unwrap();
        let enum_id = md.property(id).unwrap().enumeration.unwrap();
        assert_eq!(md.node(enum_id).parent(), Some(id));
        let values = &md.enumeration(enum_id).unwrap().values;
        assert_eq!(md.enum_value(values[1]).unwrap().id.as_deref(), Some("1"));
        assert_eq!(md.node(values[0]).parent(), Some(enum_id));
    }

    #[test]
    fn insertion_after_construction_makes_graph_stale() {
        let mut md = Metadata::new();
        md.insert_entry(EntryRecord::new("android.a.b", "static").value_type("byte"))
            .unwrap();
        assert!(matches!(md.outer_namespaces(), Err(MetadataError::NotConstructed)));
        md.construct_graph();
        assert!(md.outer_namespaces().is_ok());
        md.insert_entry(EntryRecord::new("android.a.c", "static").value_type("byte"))
            .unwrap();
        assert!(matches!(md.outer_namespaces(), Err(MetadataError::GraphStale)));
        md.construct_graph();
        assert!(md.is_constructed());
    }

    #[test]
    fn prune_before_construction_is_a_no_op() {
        let mut md = Metadata::with_config(BuildConfig::lenient()).unwrap();
        md.insert_clone(CloneRecord::new(EntryRecord::new("android.a.b", "dynamic"), "static"))
            .unwrap();
        assert!(md.prune_clones().is_empty());
        assert_eq!(md.clones().len(), 1);
    }
}
