use std::{env, path::PathBuf};

use anyhow::{Context, Result};
use fs_extra::{copy_items, dir::CopyOptions};

/// Copies `assets/` (card model and page textures) next to the build output.
fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=assets/");

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR")?);
    if !manifest_dir.join("assets").exists() {
        return Ok(());
    }

    let out_dir = env::var("OUT_DIR")?;
    let options = CopyOptions {
        overwrite: true,
        ..CopyOptions::new()
    };
    copy_items(&[manifest_dir.join("assets")], &out_dir, &options)
        .with_context(|| format!("failed to copy the assets into {out_dir}"))?;
    Ok(())
}
