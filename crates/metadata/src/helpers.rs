//! Naming and lookup helpers for code generators.

use crate::entry::MergedEntry;
use crate::error::{MetadataError, Result};
use crate::metadata::Metadata;
use crate::node::NodeData;
use crate::types::{Container, NodeId, PropertyKind, ValueType};

/// Which child list of a kind view to read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    Namespaces,
    Entries,
}

/// C symbol for a dotted name: `android.lens.facing` -> `ANDROID_LENS_FACING`
#[must_use]
pub fn csym(name: &str) -> String {
    name.to_uppercase().replace('.', "_")
}

/// C type enumerator for a scalar type: `int32` -> `TYPE_INT32`
#[must_use]
pub fn ctype_enum(value_type: ValueType) -> String {
    format!("TYPE_{}", value_type.as_str().to_uppercase())
}

/// Dotted path from the outer namespace down to `node`, skipping kinds.
///
/// Properties already carry their full path and return it unchanged.
#[must_use]
pub fn path_name(metadata: &Metadata, node: NodeId) -> String {
    let this = metadata.node(node);
    if this.is_property() {
        return this.name().to_string();
    }
    let mut parts: Vec<&str> = metadata
        .find_parents(node, |n| {
            !n.is_kind() && !matches!(n.data(), NodeData::Root(_))
        })
        .map(|id| metadata.node(id).name())
        .collect();
    parts.reverse();
    parts.push(this.name());
    parts.join(".")
}

fn java_primitive(value_type: ValueType) -> &'static str {
    match value_type {
        ValueType::Byte => "byte",
        ValueType::Int32 => "int",
        ValueType::Int64 => "long",
        ValueType::Float => "float",
        ValueType::Double => "double",
        ValueType::Rational => "Rational",
    }
}

/// Java type of an entry: the typedef's `java` mapping when present,
/// otherwise the primitive (enums are `int`) with `[]` for arrays
#[must_use]
pub fn jtype_unboxed(metadata: &Metadata, entry: &MergedEntry) -> Option<String> {
    let mapped = entry
        .typedef
        .and_then(|t| metadata.typedef(t))
        .and_then(|t| t.languages.get("java"));
    if let Some(java) = mapped {
        return Some(java.clone());
    }

    let value_type = if entry.enumeration.is_some() {
        ValueType::Int32
    } else {
        entry.value_type?
    };
    let mut java = java_primitive(value_type).to_string();
    if entry.container == Some(Container::Array) {
        java.push_str("[]");
    }
    Some(java)
}

/// Boxed Java type, for generics
#[must_use]
pub fn jtype_boxed(metadata: &Metadata, entry: &MergedEntry) -> Option<String> {
    let unboxed = jtype_unboxed(metadata, entry)?;
    let boxed = match unboxed.as_str() {
        "byte" => "Byte",
        "int" => "Integer",
        "long" => "Long",
        "float" => "Float",
        "double" => "Double",
        _ => return Some(unboxed),
    };
    Some(boxed.to_string())
}

/// Java constant for an enum value: `LENS_FACING_FRONT`
#[must_use]
pub fn jenum_value(metadata: &Metadata, value: NodeId) -> Option<String> {
    let enum_value = metadata.enum_value(value)?;
    let enumeration = metadata.enumeration(metadata.node(value).parent()?)?;
    let cname = csym(&enumeration.name);
    let tail = cname.split_once('_').map_or(cname.as_str(), |(_, rest)| rest);
    Some(format!("{tail}_{}", enum_value.name))
}

/// Effective value of an enum value, decimal or hex like its base id
pub fn enum_calculate_value_string(metadata: &Metadata, value: NodeId) -> Result<String> {
    metadata.enum_value_string(value)
}

/// Whether any property under `node` carries an enumeration
#[must_use]
pub fn has_descendants_with_enums(metadata: &Metadata, node: NodeId) -> bool {
    metadata
        .find_first(node, |n| n.as_property().is_some_and(|p| p.enumeration.is_some()))
        .is_some()
}

/// Namespaces or entries of every kind in a section, kind by kind
pub fn children_by_throwing_away_kind(metadata: &Metadata, section: NodeId, member: Member) -> Result<Vec<NodeId>> {
    Ok(metadata
        .merged_kinds(section)?
        .into_iter()
        .flat_map(|view| match member {
            Member::Namespaces => view.namespaces,
            Member::Entries => view.entries,
        })
        .collect())
}

/// Namespaces or entries of one kind in a section; empty when absent
pub fn children_by_filtering_kind(
    metadata: &Metadata,
    section: NodeId,
    kind: PropertyKind,
    member: Member,
) -> Result<Vec<NodeId>> {
    let view = metadata
        .merged_kinds(section)?
        .into_iter()
        .find(|view| view.kind == Some(kind));
    Ok(match (view, member) {
        (Some(view), Member::Namespaces) => view.namespaces,
        (Some(view), Member::Entries) => view.entries,
        (None, _) => Vec::new(),
    })
}

/// Look up a section by outer namespace and name
pub fn find_section(metadata: &Metadata, outer: &str, section: &str) -> Result<NodeId> {
    metadata
        .outer_namespaces()?
        .iter()
        .filter(|&&ons| metadata.node(ons).name() == outer)
        .flat_map(|&ons| metadata.node(ons).children())
        .find(|&sec| metadata.node(sec).name() == section)
        .ok_or_else(|| MetadataError::InvalidName(format!("{outer}.{section}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EntryRecord;

    fn sample() -> Metadata {
        let mut md = Metadata::new();
        md.insert_type(
            "streamConfigurationMap",
            "typedef",
            [(
                "java".to_string(),
                "android.hardware.camera2.params.StreamConfigurationMap".to_string(),
            )]
            .into(),
        )
        .unwrap();
        md.insert_entry(
            EntryRecord::new("android.lens.facing", "static")
                .value_type("byte")
                .enum_values(&[("FRONT", None), ("BACK", None)]),
        )
        .unwrap();
        md.insert_entry(
            EntryRecord::new("android.lens.info.shading", "static")
                .value_type("float")
                .container("array", &["3", "3"]),
        )
        .unwrap();
        md.insert_entry(
            EntryRecord::new("android.lens.state", "dynamic").value_type("int32"),
        )
        .unwrap();
        md.insert_entry(
            EntryRecord::new("android.scaler.streamConfigurationMap", "static")
                .value_type("int32")
                .container("array", &["n", "4"])
                .type_name("streamConfigurationMap"),
        )
        .unwrap();
        md.construct_graph();
        md
    }

    #[test]
    fn symbol_names() {
        assert_eq!(csym("android.lens.facing"), "ANDROID_LENS_FACING");
        assert_eq!(ctype_enum(ValueType::Rational), "TYPE_RATIONAL");
    }

    #[test]
    fn path_names_skip_kinds() {
        let md = sample();
        let info = md.find_first(NodeId::ROOT, |n| n.is_inner_namespace()).unwrap();
        assert_eq!(path_name(&md, info), "android.lens.info");
        let section = find_section(&md, "android", "lens").unwrap();
        assert_eq!(path_name(&md, section), "android.lens");
    }

    #[test]
    fn java_types() {
        let md = sample();
        let facing = md.find_entry(PropertyKind::Static, "android.lens.facing").unwrap();
        let shading = md.find_entry(PropertyKind::Static, "android.lens.info.shading").unwrap();
        let map = md.find_entry(PropertyKind::Static, "android.scaler.streamConfigurationMap").unwrap();

        assert_eq!(jtype_unboxed(&md, &md.merge(facing).unwrap()).as_deref(), Some("int"));
        assert_eq!(jtype_boxed(&md, &md.merge(facing).unwrap()).as_deref(), Some("Integer"));
        assert_eq!(jtype_unboxed(&md, &md.merge(shading).unwrap()).as_deref(), Some("float[]"));
        assert_eq!(
            jtype_unboxed(&md, &md.merge(map).unwrap()).as_deref(),
            Some("android.hardware.camera2.params.StreamConfigurationMap")
        );
    }

    #[test]
    fn enum_constants() {
        let md = sample();
        let facing = md.find_entry(PropertyKind::Static, "android.lens.facing").unwrap();
        let enum_id = md.property(facing).unwrap().enumeration.unwrap();
        let back = md.enumeration(enum_id).unwrap().values[1];
        assert_eq!(jenum_value(&md, back).as_deref(), Some("LENS_FACING_BACK"));
        assert_eq!(enum_calculate_value_string(&md, back).unwrap(), "1");
        assert!(has_descendants_with_enums(&md, NodeId::ROOT));
    }

    #[test]
    fn kind_filtering() {
        let md = sample();
        let lens = find_section(&md, "android", "lens").unwrap();
        let all = children_by_throwing_away_kind(&md, lens, Member::Entries).unwrap();
        assert_eq!(all.len(), 2);
        let namespaces = children_by_throwing_away_kind(&md, lens, Member::Namespaces).unwrap();
        assert_eq!(namespaces.len(), 1);

        let dynamic = children_by_filtering_kind(&md, lens, PropertyKind::Dynamic, Member::Entries).unwrap();
        assert_eq!(md.node(dynamic[0]).name(), "android.lens.state");
        assert!(children_by_filtering_kind(&md, lens, PropertyKind::Controls, Member::Entries)
            .unwrap()
            .is_empty());
    }
}
