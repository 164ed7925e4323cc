use std::fs::File;
use std::path::{Path, PathBuf};
use std::{env, io};

use flate2::write::GzEncoder;
use flate2::Compression;

/// Packs `res/` into `$OUT_DIR/res.tar.gz` for `blogfront-admin bootstrap`.
fn pack_resources(res_dir: &Path, out_dir: &Path) -> io::Result<()> {
    let archive = File::create(out_dir.join("res.tar.gz"))?;
    let enc = GzEncoder::new(archive, Compression::default());
    let mut tar = tar::Builder::new(enc);
    tar.append_dir_all(".", res_dir)?;
    tar.into_inner()?.finish()?;
    Ok(())
}

fn main() -> io::Result<()> {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").map_err(io::Error::other)?;
    let out_dir = env::var("OUT_DIR").map_err(io::Error::other)?;
    let res_dir = PathBuf::from(manifest_dir).join("res");

    println!("cargo:rerun-if-changed=res");
    pack_resources(&res_dir, Path::new(&out_dir))
}
