//! CLI command for the container type check

use std::path::Path;

use crate::formats::rmhg;

pub fn execute(source: &Path) -> anyhow::Result<()> {
    let data = std::fs::read(source)?;
    if rmhg::check_rmhg_bytes(&data) {
        println!("{}: RSL container", source.display());
        Ok(())
    } else {
        // a failed check is a result for scripted callers, surfaced as a
        // non-zero exit status
        anyhow::bail!("{}: not an RSL container", source.display());
    }
}
