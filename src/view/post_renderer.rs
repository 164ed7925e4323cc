use std::io;

use ramhorns::Template;

use crate::editor::format_price;
use crate::model::{category_slug, BlogRecord};
use crate::notice::Notice;
use crate::text_utils::format_date;
use crate::view::{compile, view_notice, BlogCard, Nav, ViewNotice, ViewTag, PLACEHOLDER_IMAGE};

#[derive(ramhorns::Content)]
struct ViewItem<'a> {
    nav: Nav,
    notice: Option<ViewNotice>,
    title: &'a str,
    description: &'a str,
    post_content: &'a str,
    category: &'a str,
    category_link: String,
    image: &'a str,
    date: String,
    has_date: bool,
    tags: Vec<ViewTag>,
    has_tags: bool,
    affiliate_link: &'a str,
    has_affiliate_link: bool,
    buy_label: String,
    related: Vec<BlogCard>,
    has_related: bool,
}

pub struct PostRenderer<'a> {
    pub template: Template<'a>,
}

fn buy_label(price: Option<f64>) -> String {
    match price {
        Some(p) => format!("Buy Now - ${}", format_price(p)),
        None => "Buy Now".to_string(),
    }
}

impl PostRenderer<'_> {
    pub fn new(view_tpl_src: &str) -> io::Result<PostRenderer> {
        let template = compile(view_tpl_src, "blog view")?;

        Ok(PostRenderer {
            template,
        })
    }

    /// Renders a record. `content` is trusted HTML and must be emitted with
    /// triple braces.
    pub fn render(&self, blog: &BlogRecord, related: &[BlogRecord], notice: Option<&Notice>, logged_in: bool) -> String {
        let tags: Vec<ViewTag> = blog.tags.iter().map(|t| ViewTag { tag: t.clone() }).collect();
        let related: Vec<BlogCard> = related.iter().map(BlogCard::from_record).collect();

        self.template.render(&ViewItem {
            nav: Nav::new(logged_in),
            notice: view_notice(notice),
            title: &blog.title,
            description: &blog.description,
            post_content: &blog.content,
            category: &blog.category,
            category_link: format!("/category/{}", category_slug(&blog.category)),
            image: blog.image.as_deref().unwrap_or(PLACEHOLDER_IMAGE),
            date: blog.created_at.as_ref().map(format_date).unwrap_or_default(),
            has_date: blog.created_at.is_some(),
            has_tags: !tags.is_empty(),
            tags,
            affiliate_link: blog.affiliate_link.as_deref().unwrap_or_default(),
            has_affiliate_link: blog.affiliate_link.is_some(),
            buy_label: buy_label(blog.price),
            has_related: !related.is_empty(),
            related,
        })
    }
}
