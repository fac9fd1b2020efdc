//! # Camera Metadata
//!
//! Typed, cross-referenced object graph for camera metadata property
//! definitions, built from the flat records of a definitions document and
//! consumed read-only by header, Java and documentation generators.
//!
//! ## Architecture
//!
//! ```text
//! Flat records (document order)
//!     │
//!     ├──> Metadata::insert_* (entries, clones, tags, typedefs)
//!     │
//!     ├──> construct_graph()
//!     │      ├─ Resolve tag ids and typedef names
//!     │      ├─ Resolve clone targets (kind, name)
//!     │      ├─ Bucket by outer namespace, then section
//!     │      ├─ Split sections into kind blocks by adjacency
//!     │      └─ Bucket inner namespaces, link entries
//!     │
//!     └──> Read-only traversal
//!            ├─ find_all / find_first / find_parents
//!            ├─ merge(), merged_kinds(), combine_children_by_name()
//!            └─ helpers (csym, jtype, enum values), JSON dump
//! ```
//!
//! ## Example
//!
//! ```rust
//! use camera_metadata::{CloneRecord, EntryRecord, Metadata, PropertyKind};
//!
//! let mut metadata = Metadata::new();
//! metadata
//!     .insert_entry(EntryRecord::new("android.lens.facing", "static").value_type("byte"))
//!     .unwrap();
//! metadata
//!     .insert_clone(CloneRecord::new(
//!         EntryRecord::new("android.lens.facing", "dynamic"),
//!         "static",
//!     ))
//!     .unwrap();
//! metadata.construct_graph();
//!
//! let clone = metadata.find_entry(PropertyKind::Dynamic, "android.lens.facing").unwrap();
//! let merged = metadata.merge(clone).unwrap();
//! assert_eq!(merged.value_type.unwrap().as_str(), "byte");
//! ```

mod builder;
mod config;
mod dump;
mod entry;
mod enums;
mod error;
pub mod helpers;
mod metadata;
mod node;
mod record;
mod types;
mod views;

pub use builder::GraphStats;
pub use config::{BuildConfig, DiagnosticLevel};
pub use dump::{EnumValueDump, PropertyDump, TagDump, TreeDump, TypedefDump};
pub use entry::{CloneRef, EntryVariant, MergedEntry, Property, PropertyName};
pub use enums::{calculate_value_string, Enum, EnumValue};
pub use error::{MetadataError, Result};
pub use metadata::Metadata;
pub use node::{
    FindAll, FindParents, InnerNamespace, Kind, Members, Node, NodeData, OuterNamespace, Root,
    Section, Tag, Typedef,
};
pub use record::{
    CloneRecord, EntryRecord, MetadataDocument, PropertyRecord, SectionRecord, TagRecord,
    TypedefRecord,
};
pub use types::{Container, NodeId, PropertyKind, ValueType, Visibility};
pub use views::{CombinedView, ContainerView};
