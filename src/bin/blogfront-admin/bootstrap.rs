use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::{fs, io};

use anyhow::{bail, Context, Result};
use lazy_static::lazy_static;
use regex::Regex;

use crate::decompress::decompress_files;
use crate::BootstrapArgs;

lazy_static! {
    static ref RES_PATH: Regex = Regex::new(r#"res/(\w+)"#).unwrap();
}

fn get_sample_cfg() -> &'static str {
    include_str!("../../../blogfront.toml")
}

fn write_blogfront_cfg(out_dir: &Path) -> io::Result<()> {
    let file = File::create(out_dir.join("blogfront.toml"))?;
    let mut writer = BufWriter::new(file);

    let sample_cfg = replace_paths(out_dir, get_sample_cfg());
    writer.write_all(sample_cfg.as_bytes())?;

    writer.flush()
}

/// Points every `res/<dir>` entry of the sample configuration at `prefix`.
fn replace_paths(prefix: &Path, config_data: &str) -> String {
    let prefix = prefix.display().to_string();
    let prefix = prefix.trim_end_matches('/');

    RES_PATH
        .replace_all(config_data, |captures: &regex::Captures| format!("{}/{}", prefix, &captures[1]))
        .to_string()
}

pub fn bootstrap_cmd(args: BootstrapArgs) -> Result<()> {
    let out_path = fs::canonicalize(&args.out_dir)
        .with_context(|| format!("Error converting path to absolute: {}", args.out_dir))?;

    if !out_path.is_dir() {
        bail!("Output path must be a directory: {}", out_path.display());
    }

    decompress_files(&out_path).context("Error bootstrapping")?;
    write_blogfront_cfg(&out_path).context("Error writing Blogfront configuration")?;

    println!("Site created in {}", out_path.display());
    println!("Run: blogfront --config-path {}", out_path.join("blogfront.toml").display());
    Ok(())
}
