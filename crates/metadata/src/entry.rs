use crate::error::{MetadataError, Result};
use crate::metadata::Metadata;
use crate::types::{Container, NodeId, PropertyKind, ValueType, Visibility};

/// Dotted-name helpers shared by everything that names a property
pub trait PropertyName {
    /// Fully qualified dotted name, e.g. `android.lens.info.shading`
    fn full_name(&self) -> &str;

    fn name_as_list(&self) -> Vec<&str> {
        self.full_name().split('.').collect()
    }

    /// First component, e.g. `android`
    fn outer_namespace(&self) -> &str {
        self.full_name().split('.').next().unwrap_or_default()
    }

    /// Second component, e.g. `lens`
    fn section(&self) -> &str {
        self.full_name().split('.').nth(1).unwrap_or_default()
    }

    /// Components strictly between the section and the leaf name
    fn inner_namespace_list(&self) -> Vec<&str> {
        let parts = self.name_as_list();
        if parts.len() > 3 {
            parts[2..parts.len() - 1].to_vec()
        } else {
            Vec::new()
        }
    }

    /// Last component, e.g. `shading`
    fn name_minimal(&self) -> &str {
        self.full_name().rsplit('.').next().unwrap_or_default()
    }

    /// Everything but the last component, e.g. `android.lens.info`
    fn path_without_name(&self) -> &str {
        self.full_name()
            .rsplit_once('.')
            .map_or("", |(path, _)| path)
    }
}

/// Whether a property defines itself or re-exposes another kind's entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryVariant {
    Entry,
    Clone(CloneRef),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloneRef {
    /// Kind of the entry being cloned
    pub target_kind: PropertyKind,

    /// Resolved target; `None` until construction, or when it never resolves
    pub entry: Option<NodeId>,
}

/// A metadata property definition: an entry or a clone
///
/// Value attributes are fixed at insertion; `tags`, `typedef` and the clone
/// target are filled in by [`Metadata::construct_graph`].
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub kind: PropertyKind,
    /// Always `None` for clones; the target's type applies
    pub value_type: Option<ValueType>,
    pub container: Option<Container>,
    pub container_sizes: Vec<String>,
    pub tuple_values: Vec<String>,
    pub enumeration: Option<NodeId>,
    pub description: Option<String>,
    pub range: Option<String>,
    pub units: Option<String>,
    pub notes: Option<String>,
    pub type_notes: Option<String>,
    pub tag_ids: Vec<String>,
    /// Name of the typedef this property refers to
    pub type_name: Option<String>,
    pub visibility: Option<Visibility>,
    pub optional: bool,
    pub tags: Vec<NodeId>,
    pub typedef: Option<NodeId>,
    pub variant: EntryVariant,
}

impl Property {
    #[must_use]
    pub const fn is_clone(&self) -> bool {
        matches!(self.variant, EntryVariant::Clone(_))
    }

    #[must_use]
    pub const fn clone_ref(&self) -> Option<&CloneRef> {
        match &self.variant {
            EntryVariant::Clone(c) => Some(c),
            EntryVariant::Entry => None,
        }
    }

    /// Resolved target entry of a clone
    #[must_use]
    pub fn target(&self) -> Option<NodeId> {
        self.clone_ref().and_then(|c| c.entry)
    }
}

impl PropertyName for Property {
    fn full_name(&self) -> &str {
        &self.name
    }
}

/// Flattened read-only view of an entry, or of a clone over its target
///
/// Documentation fields prefer the clone's own override; structural fields
/// always come from the target entry. Built fresh by every
/// [`Metadata::merge`] call and never stored in the graph.
#[derive(Debug, Clone, PartialEq)]
pub struct MergedEntry {
    /// The entry or clone this view was built from
    pub source: NodeId,
    pub parent: Option<NodeId>,
    pub name: String,
    pub kind: PropertyKind,
    pub value_type: Option<ValueType>,
    pub container: Option<Container>,
    pub container_sizes: Vec<String>,
    pub tuple_values: Vec<String>,
    pub enumeration: Option<NodeId>,
    pub type_notes: Option<String>,
    pub visibility: Option<Visibility>,
    pub optional: bool,
    pub typedef: Option<NodeId>,
    pub description: Option<String>,
    pub units: Option<String>,
    pub range: Option<String>,
    pub notes: Option<String>,
    pub tags: Vec<NodeId>,
}

impl PropertyName for MergedEntry {
    fn full_name(&self) -> &str {
        &self.name
    }
}

impl Metadata {
    /// Merge view of an entry or clone.
    ///
    /// Fails for clones whose target never resolved, and before the graph
    /// has been constructed.
    pub fn merge(&self, id: NodeId) -> Result<MergedEntry> {
        self.ensure_constructed()?;
        let own = self
            .property(id)
            .ok_or_else(|| MetadataError::unexpected_node(id, "property"))?;
        let own_parent = self.node(id).parent();

        let (base, base_parent) = match &own.variant {
            EntryVariant::Entry => (own, own_parent),
            EntryVariant::Clone(clone) => {
                let target = clone
                    .entry
                    .ok_or_else(|| MetadataError::UnresolvedClone(own.name.clone()))?;
                let base = self
                    .property(target)
                    .ok_or_else(|| MetadataError::unexpected_node(target, "property"))?;
                (base, self.node(target).parent())
            }
        };

        // An empty override counts as absent
        let distinct = |mine: &Option<String>, theirs: &Option<String>| {
            mine.clone()
                .filter(|s| !s.is_empty())
                .or_else(|| theirs.clone())
        };

        Ok(MergedEntry {
            source: id,
            parent: base_parent,
            name: base.name.clone(),
            kind: own.kind,
            value_type: base.value_type,
            container: base.container,
            container_sizes: base.container_sizes.clone(),
            tuple_values: base.tuple_values.clone(),
            enumeration: base.enumeration,
            type_notes: base.type_notes.clone(),
            visibility: base.visibility,
            optional: base.optional,
            typedef: base.typedef,
            description: distinct(&own.description, &base.description),
            units: distinct(&own.units, &base.units),
            range: distinct(&own.range, &base.range),
            notes: distinct(&own.notes, &base.notes),
            tags: if own.tags.is_empty() {
                base.tags.clone()
            } else {
                own.tags.clone()
            },
        })
    }

    /// Merge views of a kind's or inner namespace's direct entries
    pub fn merged_entries(&self, container: NodeId) -> Result<Vec<MergedEntry>> {
        let members = self
            .node(container)
            .members()
            .ok_or_else(|| MetadataError::unexpected_node(container, "kind or inner namespace"))?;
        members.entries.iter().map(|&e| self.merge(e)).collect()
    }

    /// Clones whose resolved target is `entry`, in document order
    #[must_use]
    pub fn clones_of(&self, entry: NodeId) -> Vec<NodeId> {
        self.clones()
            .iter()
            .copied()
            .filter(|&c| self.property(c).and_then(Property::target) == Some(entry))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CloneRecord, EntryRecord};

    struct Name(&'static str);

    impl PropertyName for Name {
        fn full_name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn name_helpers_split_dotted_names() {
        let name = Name("android.lens.info.shading.map");
        assert_eq!(name.outer_namespace(), "android");
        assert_eq!(name.section(), "lens");
        assert_eq!(name.inner_namespace_list(), vec!["info", "shading"]);
        assert_eq!(name.name_minimal(), "map");
        assert_eq!(name.path_without_name(), "android.lens.info.shading");

        let short = Name("android.lens.facing");
        assert!(short.inner_namespace_list().is_empty());
    }

    #[test]
    fn clone_overrides_documentation_only() {
        let mut md = Metadata::new();
        let entry = md
            .insert_entry(
                EntryRecord::new("android.flash.mode", "static")
                    .value_type("byte")
                    .description("Flash firing mode")
                    .units("none"),
            )
            .unwrap();
        let clone = md
            .insert_clone(CloneRecord::new(
                EntryRecord::new("android.flash.mode", "controls").description("Requested mode"),
                "static",
            ))
            .unwrap();
        md.construct_graph();

        let merged = md.merge(clone).unwrap();
        assert_eq!(merged.source, clone);
        assert_eq!(merged.kind, PropertyKind::Controls);
        assert_eq!(merged.value_type, Some(ValueType::Byte));
        assert_eq!(merged.description.as_deref(), Some("Requested mode"));
        assert_eq!(merged.units.as_deref(), Some("none"));
        assert_eq!(merged.parent, md.node(entry).parent());
        assert_eq!(md.clones_of(entry), vec![clone]);
    }

    #[test]
    fn empty_clone_override_falls_back_to_target() {
        let mut md = Metadata::new();
        md.insert_entry(
            EntryRecord::new("android.flash.mode", "static")
                .value_type("byte")
                .description("Flash firing mode"),
        )
        .unwrap();
        let clone = md
            .insert_clone(CloneRecord::new(
                EntryRecord::new("android.flash.mode", "dynamic")
                    .description("")
                    .units(""),
                "static",
            ))
            .unwrap();
        md.construct_graph();

        let merged = md.merge(clone).unwrap();
        assert_eq!(merged.description.as_deref(), Some("Flash firing mode"));
        assert_eq!(merged.units, None);
    }

    #[test]
    fn merge_requires_construction() {
        let mut md = Metadata::new();
        let entry = md
            .insert_entry(EntryRecord::new("android.flash.mode", "static").value_type("byte"))
            .unwrap();
        assert!(matches!(md.merge(entry), Err(MetadataError::NotConstructed)));
    }

    #[test]
    fn merge_of_unresolved_clone_fails() {
        let mut md = Metadata::new();
        let clone = md
            .insert_clone(CloneRecord::new(EntryRecord::new("android.flash.state", "dynamic"), "static"))
            .unwrap();
        md.construct_graph();
        assert!(matches!(md.merge(clone), Err(MetadataError::UnresolvedClone(name)) if name == "android.flash.state"));
    }
}
