use futures::StreamExt;
use lazy_static::lazy_static;
use ntex::http::header;
use ntex_multipart::{Field, Multipart};
use regex::Regex;

use crate::editor::{BlogForm, ImageUpload};

/// Largest accepted image upload.
const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

lazy_static! {
    static ref DISPOSITION_NAME: Regex = Regex::new(r#"(?:^|;)\s*name="?([^";]*)"?"#).unwrap();
    static ref DISPOSITION_FILE_NAME: Regex = Regex::new(r#";\s*filename="?([^";]*)"?"#).unwrap();
}

/// Editor submission as posted by the browser.
#[derive(Debug, Default)]
pub struct EditorInput {
    pub form: BlogForm,
    /// Image already stored for the record, echoed back by the form.
    pub current_image: Option<String>,
    pub clear_image: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum FormError {
    #[error("malformed multipart body: {0}")]
    Multipart(String),
    #[error("image is larger than {} bytes", MAX_IMAGE_BYTES)]
    TooLarge,
}

fn disposition(field: &Field) -> (Option<String>, Option<String>) {
    let Some(value) = field.headers().get(header::CONTENT_DISPOSITION).and_then(|v| v.to_str().ok()) else {
        return (None, None);
    };

    let capture = |re: &Regex| re.captures(value).and_then(|c| c.get(1)).map(|m| m.as_str().to_string());
    (capture(&DISPOSITION_NAME), capture(&DISPOSITION_FILE_NAME))
}

async fn read_field(field: &mut Field, limit: usize) -> Result<Vec<u8>, FormError> {
    let mut data = vec![];
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| FormError::Multipart(e.to_string()))?;
        if data.len() + chunk.len() > limit {
            return Err(FormError::TooLarge);
        }
        data.extend_from_slice(&chunk);
    }
    Ok(data)
}

/// Tags arrive either comma separated (browser form) or as a JSON array
/// (API style clients).
fn read_tags(input: &mut BlogForm, value: &str) {
    let value = value.trim();
    if value.starts_with('[') {
        if let Ok(tags) = serde_json::from_str::<Vec<String>>(value) {
            for tag in tags {
                input.tags.add(&tag);
            }
            return;
        }
    }
    input.tags.extend_from_list(value);
}

pub async fn read_blog_form(mut payload: Multipart) -> Result<EditorInput, FormError> {
    let mut input = EditorInput::default();

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| FormError::Multipart(e.to_string()))?;
        let (name, file_name) = disposition(&field);
        let Some(name) = name else {
            // Drain unnamed parts
            read_field(&mut field, MAX_IMAGE_BYTES).await?;
            continue;
        };

        if name == "image" {
            let data = read_field(&mut field, MAX_IMAGE_BYTES).await?;
            let file_name = file_name.unwrap_or_default();
            // Browsers send an empty part when no file was picked
            if data.is_empty() || file_name.is_empty() {
                continue;
            }
            input.form.image = Some(ImageUpload {
                file_name,
                content_type: field.headers()
                    .get(header::CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("application/octet-stream")
                    .to_string(),
                data,
            });
            continue;
        }

        let data = read_field(&mut field, MAX_IMAGE_BYTES).await?;
        let value = String::from_utf8_lossy(&data).into_owned();
        match name.as_str() {
            "title" => input.form.title = value,
            "description" => input.form.description = value,
            "content" => input.form.content = value,
            "category" => input.form.category = value,
            "price" => input.form.price = value,
            "affiliateLink" => input.form.affiliate_link = value,
            "tags" => read_tags(&mut input.form, &value),
            "currentImage" if !value.trim().is_empty() => input.current_image = Some(value),
            "clearImage" => input.clear_image = value == "on",
            _ => {}
        }
    }

    Ok(input)
}
