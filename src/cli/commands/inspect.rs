//! CLI command for printing a container's directory tree

use std::path::Path;

use crate::formats::rmhg;

pub fn execute(source: &Path, json: bool) -> anyhow::Result<()> {
    let data = std::fs::read(source)?;
    let nodes = rmhg::inspect_bytes(&data)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&nodes)?);
    } else {
        println!("{} ({:#x} bytes)", source.display(), data.len());
        print!("{}", rmhg::render_tree(&nodes));
    }

    Ok(())
}
