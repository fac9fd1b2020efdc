use crate::entry::{EntryVariant, Property, PropertyName};
use crate::metadata::{GraphState, Metadata};
use crate::node::{InnerNamespace, Kind, Members, NodeData, OuterNamespace, Section};
use crate::types::{NodeId, PropertyKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Node counts of the reachable tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphStats {
    pub outer_namespaces: usize,
    pub sections: usize,
    pub kinds: usize,
    pub inner_namespaces: usize,
    pub entries: usize,
    pub clones: usize,
    pub unresolved_clones: usize,
    pub tags: usize,
    pub typedefs: usize,
}

/// A container together with the records routed into it this pass
struct Bucket {
    node: NodeId,
    leafs: Vec<NodeId>,
}

impl Metadata {
    /// Wire the inserted records into the tree.
    ///
    /// Passes run to completion in order: tags, typedefs, clone targets,
    /// then outer namespaces → sections → kinds → inner namespaces →
    /// entries. Existing containers are reused, so calling this again after
    /// more insertions refreshes the tree in place and calling it twice in
    /// a row changes nothing.
    pub fn construct_graph(&mut self) -> GraphStats {
        self.construct_tags();
        self.construct_types();
        self.construct_clones();
        self.construct_outer_namespaces();
        self.state = GraphState::Built;

        if self.config.validate_tree && !self.validate_tree(NodeId::ROOT) && self.config.diagnostics.warns() {
            log::warn!("Metadata tree failed parent/child validation");
        }

        let stats = self.stats();
        if self.config.diagnostics.informs() {
            log::info!(
                "Built metadata graph: {} sections, {} entries, {} clones ({} unresolved)",
                stats.sections,
                stats.entries,
                stats.clones,
                stats.unresolved_clones
            );
        }
        stats
    }

    /// Count the nodes reachable from the root
    #[must_use]
    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            tags: self.tags().len(),
            typedefs: self.types().len(),
            ..Default::default()
        };
        for id in self.find_all(NodeId::ROOT, |_| true) {
            match &self.node(id).data {
                NodeData::OuterNamespace(_) => stats.outer_namespaces += 1,
                NodeData::Section(_) => stats.sections += 1,
                NodeData::Kind(_) => stats.kinds += 1,
                NodeData::InnerNamespace(_) => stats.inner_namespaces += 1,
                NodeData::Property(p) => match &p.variant {
                    EntryVariant::Entry => stats.entries += 1,
                    EntryVariant::Clone(c) => {
                        stats.clones += 1;
                        if c.entry.is_none() {
                            stats.unresolved_clones += 1;
                        }
                    }
                },
                _ => {}
            }
        }
        stats
    }

    fn construct_tags(&mut self) {
        let index: HashMap<String, NodeId> = self
            .tags()
            .iter()
            .map(|&t| (self.node(t).name().to_string(), t))
            .collect();

        for id in self.ordered.clone() {
            let Some(property) = self.property(id) else {
                continue;
            };
            let mut resolved = Vec::new();
            for tag_id in &property.tag_ids {
                match index.get(tag_id) {
                    Some(&tag) if !resolved.contains(&tag) => resolved.push(tag),
                    Some(_) => {}
                    None if self.config.diagnostics.warns() => {
                        log::warn!("Entry '{}' references unknown tag '{}'", property.name, tag_id);
                    }
                    None => {}
                }
            }

            for &tag in &resolved {
                if let NodeData::Tag(t) = &mut self.nodes[tag.0].data {
                    if !t.entries.contains(&id) {
                        t.entries.push(id);
                    }
                }
            }
            if let NodeData::Property(p) = &mut self.nodes[id.0].data {
                p.tags = resolved;
            }
        }
    }

    fn construct_types(&mut self) {
        let index: HashMap<String, NodeId> = self
            .types()
            .iter()
            .map(|&t| (self.node(t).name().to_string(), t))
            .collect();

        for id in self.ordered.clone() {
            let Some(property) = self.property(id) else {
                continue;
            };
            let typedef = match property.type_name.as_deref() {
                Some(name) => {
                    let found = index.get(name).copied();
                    if found.is_none() && self.config.diagnostics.warns() {
                        log::warn!("Entry '{}' references unknown typedef '{}'", property.name, name);
                    }
                    found
                }
                None => None,
            };

            if let Some(typedef) = typedef {
                if let NodeData::Typedef(t) = &mut self.nodes[typedef.0].data {
                    if !t.entries.contains(&id) {
                        t.entries.push(id);
                    }
                }
            }
            if let NodeData::Property(p) = &mut self.nodes[id.0].data {
                p.typedef = typedef;
            }
        }
    }

    fn construct_clones(&mut self) {
        for id in self.clones.clone() {
            let Some(property) = self.property(id) else {
                continue;
            };
            let Some(clone) = property.clone_ref() else {
                continue;
            };
            let target = self
                .find_entry(clone.target_kind, &property.name)
                .filter(|&target| target != id);
            if target.is_none() && self.config.diagnostics.warns() {
                log::warn!(
                    "Clone '{}' ({}) has no {} entry to clone",
                    property.name,
                    property.kind,
                    clone.target_kind
                );
            }

            if let NodeData::Property(Property {
                variant: EntryVariant::Clone(clone),
                ..
            }) = &mut self.nodes[id.0].data
            {
                clone.entry = target;
            }
        }
    }

    fn construct_outer_namespaces(&mut self) {
        let existing = self.root().outer_namespaces.clone();
        let leafs = self.ordered.clone();
        let buckets = self.bucket_by_name(
            NodeId::ROOT,
            &existing,
            &leafs,
            |p| Some(p.outer_namespace().to_string()),
            |name| {
                NodeData::OuterNamespace(OuterNamespace {
                    name,
                    sections: Vec::new(),
                })
            },
        );

        let mut kept = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            if bucket.leafs.is_empty() {
                self.detach(bucket.node);
                continue;
            }
            self.construct_sections(bucket.node, &bucket.leafs);
            kept.push(bucket.node);
        }
        self.root_mut().outer_namespaces = kept;
    }

    fn construct_sections(&mut self, outer: NodeId, leafs: &[NodeId]) {
        let existing = self
            .outer_namespace(outer)
            .map(|n| n.sections.clone())
            .unwrap_or_default();
        let buckets = self.bucket_by_name(
            outer,
            &existing,
            leafs,
            |p| Some(p.section().to_string()),
            |name| {
                NodeData::Section(Section {
                    name,
                    description: None,
                    kinds: Vec::new(),
                })
            },
        );

        let mut kept = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            if bucket.leafs.is_empty() {
                self.detach(bucket.node);
                continue;
            }
            let description = self
                .section_descriptions
                .get(self.node(bucket.node).name())
                .cloned();
            if let (Some(description), NodeData::Section(section)) =
                (description, &mut self.nodes[bucket.node.0].data)
            {
                section.description = Some(description);
            }
            self.construct_kinds(bucket.node, &bucket.leafs);
            kept.push(bucket.node);
        }
        if let NodeData::OuterNamespace(n) = &mut self.nodes[outer.0].data {
            n.sections = kept;
        }
    }

    /// Group a section's records into kinds by run length.
    ///
    /// `dynamic, dynamic, static, dynamic` yields three kinds, keeping
    /// document order stable when an entry of an existing kind is appended
    /// after another kind's block. Each run reuses the first unclaimed
    /// existing block of its kind, so blocks survive `sort_tree()`; the
    /// section's kind list itself returns to document order.
    fn construct_kinds(&mut self, section: NodeId, leafs: &[NodeId]) {
        let mut runs: Vec<(PropertyKind, Vec<NodeId>)> = Vec::new();
        for &leaf in leafs {
            let Some(kind) = self.property(leaf).map(|p| p.kind) else {
                continue;
            };
            match runs.last_mut() {
                Some((current, group)) if *current == kind => group.push(leaf),
                _ => runs.push((kind, vec![leaf])),
            }
        }

        let existing = self.section(section).map(|s| s.kinds.clone()).unwrap_or_default();
        let mut unclaimed = existing.clone();
        let mut kinds = Vec::with_capacity(runs.len());
        for (name, group) in runs {
            let reusable = unclaimed
                .iter()
                .position(|&k| self.kind(k).is_some_and(|kind| kind.name == name));
            let node = match reusable {
                Some(index) => unclaimed.remove(index),
                None => self.alloc(
                    Some(section),
                    NodeData::Kind(Kind {
                        name,
                        members: Members::default(),
                    }),
                ),
            };
            self.construct_inner_namespaces(node, &group, 0);
            self.construct_entries(node, &group, 0);
            kinds.push(node);
        }

        for stale in existing.into_iter().filter(|k| !kinds.contains(k)) {
            self.detach(stale);
        }
        if self.config.diagnostics.debugs() {
            log::debug!(
                "Section '{}': {} kind blocks",
                self.node(section).name(),
                kinds.len()
            );
        }
        if let NodeData::Section(s) = &mut self.nodes[section.0].data {
            s.kinds = kinds;
        }
    }

    /// Build inner namespaces of a kind or inner namespace at `depth`
    fn construct_inner_namespaces(&mut self, container: NodeId, leafs: &[NodeId], depth: usize) {
        let existing = self
            .node(container)
            .members()
            .map(|m| m.namespaces.clone())
            .unwrap_or_default();
        let buckets = self.bucket_by_name(
            container,
            &existing,
            leafs,
            |p| p.inner_namespace_list().get(depth).map(|s| (*s).to_string()),
            |name| {
                NodeData::InnerNamespace(InnerNamespace {
                    name,
                    members: Members::default(),
                })
            },
        );

        let mut kept = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            if bucket.leafs.is_empty() {
                self.detach(bucket.node);
                continue;
            }
            self.construct_inner_namespaces(bucket.node, &bucket.leafs, depth + 1);
            self.construct_entries(bucket.node, &bucket.leafs, depth + 1);
            kept.push(bucket.node);
        }
        if let Some(members) = self.nodes[container.0].members_mut() {
            members.namespaces = kept;
        }
    }

    /// Link records living exactly at `depth` as direct entries of `container`
    fn construct_entries(&mut self, container: NodeId, leafs: &[NodeId], depth: usize) {
        let here: Vec<NodeId> = leafs
            .iter()
            .copied()
            .filter(|&leaf| {
                self.property(leaf)
                    .is_some_and(|p| p.inner_namespace_list().len() == depth)
            })
            .collect();
        let existing = self
            .node(container)
            .members()
            .map(|m| m.entries.clone())
            .unwrap_or_default();

        let mut linked: Vec<NodeId> = Vec::with_capacity(here.len());
        for id in existing
            .iter()
            .copied()
            .filter(|e| here.contains(e))
            .chain(here.iter().copied())
        {
            let name = self.node(id).name();
            if !linked.iter().any(|&l| self.node(l).name() == name) {
                linked.push(id);
            }
        }

        for &id in &linked {
            let previous = self.nodes[id.0].parent;
            if previous == Some(container) {
                continue;
            }
            if let Some(old) = previous {
                if self.config.diagnostics.warns() {
                    log::warn!(
                        "Entry '{}' has changed parent from '{}' ({}) to '{}' ({})",
                        self.node(id).name(),
                        self.node(old).name(),
                        old,
                        self.node(container).name(),
                        container
                    );
                }
                if let Some(members) = self.nodes[old.0].members_mut() {
                    members.entries.retain(|&e| e != id);
                }
            }
            self.nodes[id.0].parent = Some(container);
        }

        if let Some(members) = self.nodes[container.0].members_mut() {
            members.entries = linked;
        }
    }

    /// Route each leaf into the child container named by `key`, reusing
    /// `existing` children by name and creating the missing ones under `parent`
    fn bucket_by_name<K>(
        &mut self,
        parent: NodeId,
        existing: &[NodeId],
        leafs: &[NodeId],
        key: K,
        make: fn(String) -> NodeData,
    ) -> Vec<Bucket>
    where
        K: Fn(&Property) -> Option<String>,
    {
        let mut buckets: Vec<Bucket> = existing
            .iter()
            .map(|&node| Bucket {
                node,
                leafs: Vec::new(),
            })
            .collect();

        for &leaf in leafs {
            let Some(name) = self.property(leaf).and_then(|p| key(p)) else {
                continue;
            };
            let position = buckets
                .iter()
                .position(|b| self.node(b.node).name() == name);
            let index = match position {
                Some(index) => index,
                None => {
                    let node = self.alloc(Some(parent), make(name));
                    buckets.push(Bucket {
                        node,
                        leafs: Vec::new(),
                    });
                    buckets.len() - 1
                }
            };
            if !buckets[index].leafs.contains(&leaf) {
                buckets[index].leafs.push(leaf);
            }
        }
        buckets
    }

    /// Cut a container that no longer receives records out of the tree
    fn detach(&mut self, id: NodeId) {
        if self.config.diagnostics.debugs() {
            log::debug!("Dropping empty container '{}' ({})", self.node(id).name(), id);
        }
        self.nodes[id.0].parent = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CloneRecord, EntryRecord};

    fn entry(name: &str, kind: &str) -> EntryRecord {
        EntryRecord::new(name, kind).value_type("int32")
    }

    fn kind_blocks(md: &Metadata, section: NodeId) -> Vec<(PropertyKind, usize)> {
        md.section(section)
            .unwrap()
            .kinds
            .iter()
            .map(|&k| {
                let kind = md.kind(k).unwrap();
                (kind.name, kind.members.entries.len() + kind.members.namespaces.len())
            })
            .collect()
    }

    #[test]
    fn kinds_split_on_adjacency() {
        let mut md = Metadata::new();
        md.insert_entry(entry("android.s.a", "dynamic")).unwrap();
        md.insert_entry(entry("android.s.b", "dynamic")).unwrap();
        md.insert_entry(entry("android.s.c", "static")).unwrap();
        md.insert_entry(entry("android.s.d", "static")).unwrap();
        md.insert_entry(entry("android.s.e", "dynamic")).unwrap();
        md.construct_graph();

        let section = md.find_first(NodeId::ROOT, |n| n.is_section()).unwrap();
        assert_eq!(
            kind_blocks(&md, section),
            vec![
                (PropertyKind::Dynamic, 2),
                (PropertyKind::Static, 2),
                (PropertyKind::Dynamic, 1)
            ]
        );
    }

    #[test]
    fn second_construction_is_a_no_op() {
        let mut md = Metadata::new();
        md.insert_entry(entry("android.s.x.a", "static")).unwrap();
        md.insert_entry(entry("android.s.b", "dynamic")).unwrap();
        let first = md.construct_graph();
        let before: Vec<_> = md
            .find_all(NodeId::ROOT, |_| true)
            .map(|id| (id, md.node(id).parent()))
            .collect();

        let second = md.construct_graph();
        let after: Vec<_> = md
            .find_all(NodeId::ROOT, |_| true)
            .map(|id| (id, md.node(id).parent()))
            .collect();
        assert_eq!(first, second);
        assert_eq!(before, after);
    }

    #[test]
    fn appended_entry_joins_existing_containers() {
        let mut md = Metadata::new();
        md.insert_entry(entry("android.s.x.a", "static")).unwrap();
        md.construct_graph();
        let ins = md.find_first(NodeId::ROOT, |n| n.is_inner_namespace()).unwrap();

        let added = md.insert_entry(entry("android.s.x.b", "static")).unwrap();
        md.construct_graph();
        assert_eq!(md.node(added).parent(), Some(ins));
        assert_eq!(md.inner_namespace(ins).unwrap().members.entries.len(), 2);
        assert!(md.validate_tree(NodeId::ROOT));
    }

    #[test]
    fn pruning_merges_split_blocks_and_moves_entries() {
        let mut md = Metadata::with_config(crate::BuildConfig {
            diagnostics: crate::DiagnosticLevel::Quiet,
            ..Default::default()
        })
        .unwrap();
        let a = md.insert_entry(entry("android.s.a", "dynamic")).unwrap();
        md.insert_clone(CloneRecord::new(EntryRecord::new("android.s.x", "static"), "controls"))
            .unwrap();
        let b = md.insert_entry(entry("android.s.b", "dynamic")).unwrap();
        md.construct_graph();

        let section = md.find_first(NodeId::ROOT, |n| n.is_section()).unwrap();
        let blocks = md.section(section).unwrap().kinds.clone();
        assert_eq!(blocks.len(), 3);
        let (first, second) = (blocks[0], blocks[2]);
        assert_eq!(md.node(b).parent(), Some(second));

        assert_eq!(md.prune_clones().len(), 1);
        md.construct_graph();

        assert_eq!(md.section(section).unwrap().kinds, vec![first]);
        assert_eq!(md.node(a).parent(), Some(first));
        assert_eq!(md.node(b).parent(), Some(first));
        assert_eq!(md.kind(first).unwrap().members.entries, vec![a, b]);
        assert!(md.kind(second).unwrap().members.entries.is_empty());
        assert_eq!(md.node(second).parent(), None);
        assert!(md.validate_tree(NodeId::ROOT));
    }

    #[test]
    fn sorted_kind_blocks_survive_reconstruction() {
        let mut md = Metadata::new();
        md.insert_entry(entry("android.s.b", "dynamic")).unwrap();
        md.insert_entry(entry("android.s.a", "static")).unwrap();
        md.construct_graph();
        let section = md.find_first(NodeId::ROOT, |n| n.is_section()).unwrap();
        let blocks = md.section(section).unwrap().kinds.clone();

        md.sort_tree();
        let sorted = md.section(section).unwrap().kinds.clone();
        assert_eq!(sorted, vec![blocks[1], blocks[0]]);

        let parents: Vec<_> = md.properties().iter().map(|&p| md.node(p).parent()).collect();
        md.construct_graph();
        let after: Vec<_> = md.properties().iter().map(|&p| md.node(p).parent()).collect();
        assert_eq!(after, parents);
        assert_eq!(md.section(section).unwrap().kinds, blocks);
        assert!(md.validate_tree(NodeId::ROOT));
    }

    #[test]
    fn clone_resolves_regardless_of_insert_order() {
        let mut md = Metadata::new();
        let clone = md
            .insert_clone(CloneRecord::new(EntryRecord::new("android.s.a", "controls"), "static"))
            .unwrap();
        let target = md.insert_entry(entry("android.s.a", "static")).unwrap();
        md.construct_graph();
        assert_eq!(md.property(clone).unwrap().target(), Some(target));
    }

    #[test]
    fn tags_and_typedefs_get_back_edges() {
        let mut md = Metadata::new();
        let tag = md.insert_tag("BC", "");
        let ty = md
            .insert_type("rectangle", "typedef", [("java".to_string(), "android.graphics.Rect".to_string())].into())
            .unwrap();
        let id = md
            .insert_entry(entry("android.s.crop", "controls").tag("BC").tag("BC").tag("MISSING").type_name("rectangle"))
            .unwrap();
        md.construct_graph();
        md.construct_graph();

        let property = md.property(id).unwrap();
        assert_eq!(property.tags, vec![tag]);
        assert_eq!(property.typedef, Some(ty));
        assert_eq!(md.tag(tag).unwrap().entries, vec![id]);
        assert_eq!(md.typedef(ty).unwrap().entries, vec![id]);
    }

    #[test]
    fn section_description_applied() {
        let mut md = Metadata::new();
        md.describe_section("lens", "Lens properties");
        md.insert_entry(entry("android.lens.focalLength", "static")).unwrap();
        md.construct_graph();
        let section = md.find_first(NodeId::ROOT, |n| n.is_section()).unwrap();
        assert_eq!(md.section(section).unwrap().description.as_deref(), Some("Lens properties"));
    }
}
