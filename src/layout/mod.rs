//! On-disk interchange layout: `base_dir/org/space/name.extension`

pub mod descriptor;
pub mod error;
pub mod manifest;
pub mod tree;

pub use descriptor::FileDescriptor;
pub use error::*;
pub use manifest::{ServiceKeyManifest, ServiceManifest, MANIFEST_EXTENSION};
pub use tree::{discover_manifests, discover_orgs, discover_spaces, ensure_dir, is_empty_dir};
