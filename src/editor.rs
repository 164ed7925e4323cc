use std::fmt::{Display, Formatter};

use reqwest::multipart::{Form, Part};
use reqwest::Url;
use spdlog::{info, warn};

use crate::api::{BlogWriter, Error};
use crate::model::{BlogRecord, Category};
use crate::notice::Notice;
use crate::session::{Session, TokenStore};

pub const LISTING_PATH: &str = "/dashboard/blogs";

/// Ordered tags, kept free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagSet(Vec<String>);

impl TagSet {
    /// Adds a trimmed tag. Blank input and tags already present are rejected.
    pub fn add(&mut self, input: &str) -> bool {
        let tag = input.trim();
        if tag.is_empty() || self.0.iter().any(|t| t == tag) {
            return false;
        }
        self.0.push(tag.to_string());
        true
    }

    pub fn remove(&mut self, tag: &str) -> bool {
        let before = self.0.len();
        self.0.retain(|t| t != tag);
        self.0.len() != before
    }

    /// Adds every comma separated entry of `list`.
    pub fn extend_from_list(&mut self, list: &str) {
        for tag in list.split(',') {
            self.add(tag);
        }
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "[]".to_string())
    }
}

impl<S: AsRef<str>> FromIterator<S> for TagSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut tags = TagSet::default();
        for tag in iter {
            tags.add(tag.as_ref());
        }
        tags
    }
}

/// Newly selected image file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Editor input exactly as typed by the user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlogForm {
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: String,
    pub price: String,
    pub affiliate_link: String,
    pub tags: TagSet,
    pub image: Option<ImageUpload>,
}

impl BlogForm {
    /// Prefills the form from a stored record. No image is selected, so the
    /// stored one stays untouched unless the user picks a new file.
    pub fn from_record(record: &BlogRecord) -> Self {
        BlogForm {
            title: record.title.clone(),
            description: record.description.clone(),
            content: record.content.clone(),
            category: record.category.clone(),
            price: record.price.map(format_price).unwrap_or_default(),
            affiliate_link: record.affiliate_link.clone().unwrap_or_default(),
            tags: record.tags.iter().collect(),
            image: None,
        }
    }

    pub fn validate(&self) -> Result<BlogDraft, ValidationError> {
        let required = [
            (Field::Title, &self.title),
            (Field::Description, &self.description),
            (Field::Content, &self.content),
            (Field::Category, &self.category),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ValidationError::new(field, "is required"));
            }
        }

        let category = Category::parse(&self.category)
            .ok_or_else(|| ValidationError::new(Field::Category, "is not a known category"))?;

        let price = match self.price.trim() {
            "" => None,
            p => match p.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => Some(v),
                _ => return Err(ValidationError::new(Field::Price, "must be a non-negative number")),
            },
        };

        let affiliate_link = match self.affiliate_link.trim() {
            "" => None,
            link => match Url::parse(link) {
                Ok(url) if url.scheme() == "http" || url.scheme() == "https" => Some(link.to_string()),
                _ => return Err(ValidationError::new(Field::AffiliateLink, "must be an http(s) URL")),
            },
        };

        Ok(BlogDraft {
            title: self.title.trim().to_string(),
            description: self.description.trim().to_string(),
            content: self.content.clone(),
            category,
            price,
            affiliate_link,
            tags: self.tags.clone(),
            image: self.image.clone(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Description,
    Content,
    Category,
    Price,
    AffiliateLink,
}

impl Field {
    /// Name of the form control.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Title => "title",
            Field::Description => "description",
            Field::Content => "content",
            Field::Category => "category",
            Field::Price => "price",
            Field::AffiliateLink => "affiliateLink",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: Field,
    pub reason: &'static str,
}

impl ValidationError {
    fn new(field: Field, reason: &'static str) -> Self {
        ValidationError { field, reason }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field.name(), self.reason)
    }
}

/// A form that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct BlogDraft {
    pub title: String,
    pub description: String,
    pub content: String,
    pub category: Category,
    pub price: Option<f64>,
    pub affiliate_link: Option<String>,
    pub tags: TagSet,
    pub image: Option<ImageUpload>,
}

impl BlogDraft {
    pub fn to_submission(&self) -> Submission {
        let fields = vec![
            ("title", self.title.clone()),
            ("description", self.description.clone()),
            ("content", self.content.clone()),
            ("category", self.category.name().to_string()),
            ("price", self.price.map(format_price).unwrap_or_default()),
            ("affiliateLink", self.affiliate_link.clone().unwrap_or_default()),
            ("tags", self.tags.to_json()),
        ];

        Submission {
            fields,
            image: self.image.clone(),
        }
    }
}

/// Multipart body of a create or update request.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    fields: Vec<(&'static str, String)>,
    image: Option<ImageUpload>,
}

impl Submission {
    pub fn fields(&self) -> &[(&'static str, String)] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }

    pub fn image(&self) -> Option<&ImageUpload> {
        self.image.as_ref()
    }

    pub fn to_form(&self) -> Form {
        let mut form = Form::new();
        for (name, value) in self.fields.iter() {
            form = form.text(*name, value.clone());
        }

        if let Some(ref image) = self.image {
            let part = Part::bytes(image.data.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)
                .unwrap_or_else(|_| {
                    Part::bytes(image.data.clone()).file_name(image.file_name.clone())
                });
            form = form.part("image", part);
        }

        form
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorMode {
    Create,
    Update(String),
}

impl EditorMode {
    pub fn from_id(id: Option<&str>) -> Self {
        match id {
            Some(id) if !id.is_empty() => EditorMode::Update(id.to_string()),
            _ => EditorMode::Create,
        }
    }

    pub fn is_editing(&self) -> bool {
        matches!(self, EditorMode::Update(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("invalid form: {0}")]
    Validation(ValidationError),

    #[error("not logged in")]
    NoSession,

    #[error(transparent)]
    Api(#[from] Error),
}

impl EditorError {
    /// Notice shown to the user. Validation errors are reported next to
    /// the field instead.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            EditorError::Validation(_) => None,
            EditorError::NoSession => Some(Notice::error("Please log in again")),
            EditorError::Api(e) => Some(Notice::error(e.server_message().unwrap_or("Error saving blog"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub notice: Notice,
    pub redirect: &'static str,
    pub blog: Option<BlogRecord>,
}

pub struct RecordEditor {
    pub mode: EditorMode,
    pub form: BlogForm,
    /// Image currently stored for the record, for display only.
    pub preview: Option<String>,
}

impl RecordEditor {
    pub fn create() -> Self {
        RecordEditor {
            mode: EditorMode::Create,
            form: BlogForm::default(),
            preview: None,
        }
    }

    pub fn edit(record: &BlogRecord) -> Self {
        RecordEditor {
            mode: EditorMode::Update(record.id.clone()),
            form: BlogForm::from_record(record),
            preview: record.image.clone(),
        }
    }

    /// Forgets the preview. Nothing is sent for it: the server keeps the
    /// stored image until a new one is uploaded.
    pub fn clear_preview(&mut self) {
        self.preview = None;
        self.form.image = None;
    }

    /// Validates, then creates or updates the record. The form is left
    /// untouched so a failed attempt can be retried.
    pub async fn submit<S, W>(&self, writer: &W, session: &Session<S>) -> Result<SubmitOutcome, EditorError>
    where
        S: TokenStore,
        W: BlogWriter + ?Sized,
    {
        let draft = self.form.validate().map_err(EditorError::Validation)?;
        let token = session.token().ok_or(EditorError::NoSession)?;
        let submission = draft.to_submission();

        let result = match self.mode {
            EditorMode::Create => writer.create_blog(token, &submission).await,
            EditorMode::Update(ref id) => writer.update_blog(token, id, &submission).await,
        };

        match result {
            Ok(blog) => {
                let verb = if self.mode.is_editing() { "updated" } else { "created" };
                info!("Blog {}: {}", verb, draft.title);
                Ok(SubmitOutcome {
                    notice: Notice::success(format!("Blog {} successfully!", verb)),
                    redirect: LISTING_PATH,
                    blog,
                })
            }
            Err(e) => {
                warn!("Error saving blog {}: {}", draft.title, e);
                Err(EditorError::Api(e))
            }
        }
    }
}

/// `12` for whole amounts, `12.5`/`12.99` otherwise.
pub fn format_price(price: f64) -> String {
    if price.fract() == 0.0 {
        format!("{:.0}", price)
    } else {
        let s = format!("{:.2}", price);
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}
