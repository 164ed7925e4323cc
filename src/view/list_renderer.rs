use std::io;

use ramhorns::Template;

use crate::fetcher::ViewState;
use crate::model::{BlogRecord, Category};
use crate::notice::Notice;
use crate::text_utils::category_title;
use crate::view::{compile, view_notice, BlogCard, Nav, ViewNotice};

/// Which listing page is being rendered.
pub enum ListKind<'a> {
    /// Home page, optionally filtered by the `?category=` selector.
    Home { category: Option<&'a str> },
    Category { segment: &'a str },
    Search { query: Option<&'a str> },
}

#[derive(ramhorns::Content)]
struct FilterItem {
    name: &'static str,
    link: String,
    selected: bool,
}

#[derive(ramhorns::Content)]
struct ListPage<'a> {
    nav: Nav,
    notice: Option<ViewNotice>,
    page_title: String,
    heading: String,
    show_featured: bool,
    featured: Vec<BlogCard>,
    show_filter: bool,
    filter: Vec<FilterItem>,
    show_search: bool,
    query: &'a str,
    show_count: bool,
    count_label: String,
    blogs: Vec<BlogCard>,
    empty: bool,
    empty_message: String,
}

pub struct ListRenderer<'a> {
    pub template: Template<'a>,
    pub featured_count: usize,
}

fn post_count(count: usize) -> String {
    if count == 1 {
        "1 post".to_string()
    } else {
        format!("{} posts", count)
    }
}

fn home_filter(selected: Option<Category>) -> Vec<FilterItem> {
    let mut filter = vec![FilterItem {
        name: "All",
        link: "/".to_string(),
        selected: selected.is_none(),
    }];
    for category in Category::ALL {
        filter.push(FilterItem {
            name: category.name(),
            link: format!("/?category={}", category.slug()),
            selected: selected == Some(category),
        });
    }
    filter
}

impl ListRenderer<'_> {
    pub fn new(list_tpl_src: &str, featured_count: usize) -> io::Result<ListRenderer> {
        let template = compile(list_tpl_src, "list")?;

        Ok(ListRenderer {
            template,
            featured_count,
        })
    }

    pub fn render(&self, kind: &ListKind, state: &ViewState<Vec<BlogRecord>>, notice: Option<&Notice>, logged_in: bool) -> String {
        let blogs: &[BlogRecord] = state.populated().map(|b| b.as_slice()).unwrap_or(&[]);
        let cards: Vec<BlogCard> = blogs.iter().map(BlogCard::from_record).collect();
        let count = cards.len();

        let mut page = ListPage {
            nav: Nav::new(logged_in),
            notice: view_notice(notice),
            page_title: String::new(),
            heading: String::new(),
            show_featured: false,
            featured: vec![],
            show_filter: false,
            filter: vec![],
            show_search: false,
            query: "",
            show_count: true,
            count_label: post_count(count),
            blogs: cards,
            empty: count == 0,
            empty_message: String::new(),
        };

        match *kind {
            ListKind::Home { category } => {
                let heading = match category {
                    None => "Latest Reviews".to_string(),
                    Some(c) => format!("{} Reviews", category_title(c)),
                };
                page.page_title = "Home".to_string();
                page.heading = heading;
                page.featured = blogs.iter().take(self.featured_count).map(BlogCard::from_record).collect();
                page.show_featured = !page.featured.is_empty();
                page.show_filter = true;
                page.filter = home_filter(category.and_then(Category::parse));
                page.empty_message = "No blogs found in this category.".to_string();
            }
            ListKind::Category { segment } => {
                let title = category_title(segment);
                page.page_title = title.clone();
                page.heading = format!("{} Reviews", title);
                page.empty_message = format!("No blogs found in the {} category.", title);
            }
            ListKind::Search { query } => {
                page.page_title = "Search".to_string();
                page.heading = "Search Results".to_string();
                page.show_search = true;
                match query {
                    Some(q) => {
                        page.query = q;
                        page.count_label = format!("Found {} results for \"{}\"", count, q);
                        page.empty_message = format!("No results found for \"{}\".", q);
                    }
                    None => {
                        page.show_count = false;
                        page.empty_message = "Enter a search term to find blogs.".to_string();
                    }
                }
            }
        }

        self.template.render(&page)
    }
}
