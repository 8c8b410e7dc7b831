//! Ordered source-tree traversal.
//!
//! Walks `<config_dir>/schema` and yields every `.sql` file as a
//! [`SourceFile`] with a forward-slash, config-relative path. Within a
//! directory the config node's `order` entries come first (in the given
//! sequence), then the remaining files lexicographically, then the
//! remaining subdirectories lexicographically. The operator owns making
//! this order respect cross-table dependencies.

use crate::config::{Project, SchemaNode};
use crate::error::{Error, Result};
use crate::parser::SourceFile;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Collect the ordered list of source files for a project.
pub fn collect_sources(project: &Project) -> Result<Vec<SourceFile>> {
    if !project.schema_dir.is_dir() {
        return Err(Error::ConfigInvalid(format!(
            "schema directory not found: {}",
            project.schema_dir.display()
        )));
    }
    let mut out = Vec::new();
    visit_dir(
        &project.schema_dir,
        Some(&project.config.schema),
        "schema",
        &mut out,
    )?;
    Ok(out)
}

fn visit_dir(
    dir: &Path,
    node: Option<&SchemaNode>,
    rel: &str,
    out: &mut Vec<SourceFile>,
) -> Result<()> {
    let mut files = BTreeMap::new();
    let mut dirs = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();
        if path.is_dir() {
            dirs.insert(name, path);
        } else if name.ends_with(".sql") {
            files.insert(name, path);
        }
    }

    let mut ordered: Vec<String> = Vec::new();
    if let Some(order) = node.and_then(|n| n.order.as_ref()) {
        for name in order {
            if !files.contains_key(name) && !dirs.contains_key(name) {
                return Err(Error::ConfigInvalid(format!(
                    "order entry `{name}` under `{rel}` matches nothing on disk"
                )));
            }
            ordered.push(name.clone());
        }
    }
    let extra_files: Vec<String> = files
        .keys()
        .filter(|n| !ordered.contains(*n))
        .cloned()
        .collect();
    ordered.extend(extra_files);
    let extra_dirs: Vec<String> = dirs
        .keys()
        .filter(|n| !ordered.contains(*n))
        .cloned()
        .collect();
    ordered.extend(extra_dirs);

    for name in ordered {
        let rel_child = format!("{rel}/{name}");
        if let Some(path) = files.get(&name) {
            let text = fs::read_to_string(path)?;
            out.push(SourceFile {
                path: rel_child,
                text,
            });
        } else if let Some(path) = dirs.get(&name) {
            visit_dir(path, node.and_then(|n| n.child(&name)), &rel_child, out)?;
        }
    }
    Ok(())
}
