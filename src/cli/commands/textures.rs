//! CLI command for scanning a file for GCT0 texture records

use std::path::Path;

use crate::formats::gct0;
use crate::scene::PlaceholderPixelDecoder;

pub fn execute(source: &Path, dump: Option<&Path>) -> anyhow::Result<()> {
    let data = std::fs::read(source)?;
    let found = gct0::scan_textures(&data, &PlaceholderPixelDecoder);

    if found.is_empty() {
        println!("no GCT0 records found");
        return Ok(());
    }

    for scanned in &found {
        println!(
            "{:#10x}  {:>4}x{:<4} format {:#04x}  {}",
            scanned.offset,
            scanned.header.width,
            scanned.header.height,
            scanned.header.format,
            scanned.texture.name
        );
    }

    if let Some(dir) = dump {
        std::fs::create_dir_all(dir)?;
        for scanned in &found {
            let path = dir.join(format!("{}.png", scanned.texture.name));
            scanned.texture.image.save(&path)?;
            println!("wrote {}", path.display());
        }
    }

    Ok(())
}
