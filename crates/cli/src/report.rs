use anyhow::Result;
use camera_metadata::{GraphStats, Members, Metadata, Property};
use std::fmt::Write as _;

const INDENT: &str = "  ";

pub fn render_tree(metadata: &Metadata) -> Result<String> {
    let mut out = String::new();
    for &ons in metadata.outer_namespaces()? {
        let Some(outer) = metadata.outer_namespace(ons) else {
            continue;
        };
        writeln!(out, "{}", outer.name)?;
        for &sid in &outer.sections {
            let Some(section) = metadata.section(sid) else {
                continue;
            };
            writeln!(out, "{INDENT}{}", section.name)?;
            for &kid in &section.kinds {
                let Some(kind) = metadata.kind(kid) else {
                    continue;
                };
                writeln!(out, "{}{}", INDENT.repeat(2), kind.name)?;
                render_members(metadata, &kind.members, 3, &mut out)?;
            }
        }
    }
    Ok(out)
}

fn render_members(metadata: &Metadata, members: &Members, depth: usize, out: &mut String) -> Result<()> {
    let pad = INDENT.repeat(depth);
    for &id in &members.entries {
        if let Some(property) = metadata.property(id) {
            writeln!(out, "{pad}{}", describe_property(metadata, property))?;
        }
    }
    for &id in &members.namespaces {
        if let Some(ns) = metadata.inner_namespace(id) {
            writeln!(out, "{pad}{}", ns.name)?;
            render_members(metadata, &ns.members, depth + 1, out)?;
        }
    }
    Ok(())
}

fn describe_property(metadata: &Metadata, property: &Property) -> String {
    if let Some(clone) = property.clone_ref() {
        return match clone.entry {
            Some(_) => format!("{} -> {}", property.name, clone.target_kind),
            None => format!("{} -> {} (unresolved)", property.name, clone.target_kind),
        };
    }

    let mut shape = property
        .value_type
        .map_or_else(|| "?".to_string(), |t| t.as_str().to_string());
    if !property.container_sizes.is_empty() {
        let _ = write!(shape, "[{}]", property.container_sizes.join(", "));
    }
    if property.enumeration.is_some() {
        shape.push_str(", enum");
    }
    if let Some(typedef) = property.typedef {
        let _ = write!(shape, ", {}", metadata.node(typedef).name());
    }
    format!("{} ({shape})", property.name)
}

pub fn render_stats(stats: &GraphStats) -> String {
    let rows = [
        ("outer_namespaces", stats.outer_namespaces),
        ("sections", stats.sections),
        ("kinds", stats.kinds),
        ("inner_namespaces", stats.inner_namespaces),
        ("entries", stats.entries),
        ("clones", stats.clones),
        ("unresolved_clones", stats.unresolved_clones),
        ("tags", stats.tags),
        ("typedefs", stats.typedefs),
    ];

    let mut md = String::new();
    md.push_str("| node | count |\n");
    md.push_str("|---|---:|\n");
    for (name, count) in rows {
        md.push_str(&format!("| `{name}` | `{count}` |\n"));
    }
    md
}
