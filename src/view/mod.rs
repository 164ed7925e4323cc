use std::io;
use std::io::ErrorKind;

use ramhorns::Template;

use crate::api::encode_segment;
use crate::model::{BlogRecord, Category};
use crate::notice::Notice;
use crate::text_utils::format_date;

pub mod dashboard_renderer;
pub mod editor_renderer;
pub mod list_renderer;
pub mod page_renderer;
pub mod post_renderer;

pub const PLACEHOLDER_IMAGE: &str = "/public/placeholder.svg";

/// Tags shown on a card. The detail page shows all of them.
const CARD_TAG_COUNT: usize = 3;

pub(crate) fn compile<'a>(src: &'a str, what: &str) -> io::Result<Template<'a>> {
    match Template::new(src) {
        Ok(x) => Ok(x),
        Err(e) => Err(io::Error::new(ErrorKind::InvalidInput, format!("Error parsing {} template: {}", what, e))),
    }
}

#[derive(ramhorns::Content)]
pub struct ViewNotice {
    level: &'static str,
    message: String,
}

impl From<&Notice> for ViewNotice {
    fn from(notice: &Notice) -> Self {
        ViewNotice {
            level: notice.level.as_str(),
            message: notice.message.clone(),
        }
    }
}

pub(crate) fn view_notice(notice: Option<&Notice>) -> Option<ViewNotice> {
    notice.map(ViewNotice::from)
}

#[derive(ramhorns::Content)]
pub struct ViewTag {
    tag: String,
}

#[derive(ramhorns::Content)]
pub struct ViewCategory {
    name: &'static str,
    slug: &'static str,
    link: String,
    selected: bool,
}

impl ViewCategory {
    pub fn new(category: Category, selected: bool) -> Self {
        ViewCategory {
            name: category.name(),
            slug: category.slug(),
            link: format!("/category/{}", category.slug()),
            selected,
        }
    }
}

/// Header shared by every page.
#[derive(ramhorns::Content)]
pub struct Nav {
    logged_in: bool,
    categories: Vec<ViewCategory>,
}

impl Nav {
    pub fn new(logged_in: bool) -> Self {
        Nav {
            logged_in,
            categories: Category::ALL.iter().map(|c| ViewCategory::new(*c, false)).collect(),
        }
    }
}

/// A record as shown in listings.
#[derive(ramhorns::Content)]
pub struct BlogCard {
    id: String,
    link: String,
    title: String,
    description: String,
    category: String,
    image: String,
    date: String,
    has_date: bool,
    price: String,
    has_price: bool,
    affiliate_link: String,
    has_affiliate_link: bool,
    tags: Vec<ViewTag>,
}

impl BlogCard {
    pub fn from_record(blog: &BlogRecord) -> Self {
        Self::with_tag_limit(blog, CARD_TAG_COUNT)
    }

    pub(crate) fn with_tag_limit(blog: &BlogRecord, max_tags: usize) -> Self {
        BlogCard {
            id: blog.id.clone(),
            link: format!("/blog/{}", encode_segment(&blog.slug)),
            title: blog.title.clone(),
            description: blog.description.clone(),
            category: blog.category.clone(),
            image: blog.image.clone().unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string()),
            date: blog.created_at.as_ref().map(format_date).unwrap_or_default(),
            has_date: blog.created_at.is_some(),
            price: blog.price.map(crate::editor::format_price).unwrap_or_default(),
            has_price: blog.price.is_some(),
            affiliate_link: blog.affiliate_link.clone().unwrap_or_default(),
            has_affiliate_link: blog.affiliate_link.is_some(),
            tags: blog.tags.iter().take(max_tags).map(|t| ViewTag { tag: t.clone() }).collect(),
        }
    }
}
