use std::io;
use std::path::Path;

use flate2::read::GzDecoder;
use tar::Archive;

/// Templates and public assets, packed by the build script.
const RES_ARCHIVE: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/res.tar.gz"));

pub fn decompress_files(output: &Path) -> io::Result<()> {
    let tar = GzDecoder::new(RES_ARCHIVE);
    let mut archive = Archive::new(tar);
    archive.unpack(output)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::*;

    #[test]
    fn test_uncompress() {
        let out_path = env::temp_dir().join(format!("blogfront-res-{}", std::process::id()));
        fs::create_dir_all(&out_path).unwrap();

        decompress_files(&out_path).unwrap();
        assert!(out_path.join("template").join("list.tpl").exists());
        assert!(out_path.join("public").join("placeholder.svg").exists());

        fs::remove_dir_all(&out_path).unwrap();
    }
}
