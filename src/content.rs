use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::{fs, io};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentFormat {
    Markdown,
    Html,
}

/// Article body loaded from disk, ready to be sent as record content.
pub struct ContentFile {
    pub file_path: PathBuf,
    pub format: ContentFormat,
    pub raw_content: String,
}

impl ContentFile {
    pub fn from_file(file_path: &Path) -> io::Result<ContentFile> {
        let format = match Self::guess_type(file_path) {
            None => return Err(io::Error::new(
                ErrorKind::Unsupported,
                format!("Could not guess the type of the file {}", file_path.display()))),
            Some(format) => format,
        };

        let raw_content = fs::read_to_string(file_path)?;

        Ok(ContentFile {
            file_path: file_path.to_path_buf(),
            format,
            raw_content,
        })
    }

    /// Content as HTML. Markdown is rendered, HTML is passed through.
    pub fn to_html(&self) -> String {
        match self.format {
            ContentFormat::Markdown => markdown::to_html(&self.raw_content),
            ContentFormat::Html => self.raw_content.clone(),
        }
    }

    fn guess_type(file_name: &Path) -> Option<ContentFormat> {
        let ext = file_name.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "md" | "markdown" => Some(ContentFormat::Markdown),
            "html" | "htm" => Some(ContentFormat::Html),
            _ => None,
        }
    }
}
