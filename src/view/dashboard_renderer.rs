use std::io;

use ramhorns::Template;

use crate::api::encode_segment;
use crate::fetcher::ViewState;
use crate::model::{BlogRecord, DashboardStats};
use crate::notice::Notice;
use crate::text_utils::format_date;
use crate::view::{compile, view_notice, Nav, ViewNotice};

#[derive(ramhorns::Content)]
struct Overview {
    total_blogs: String,
    total_views: String,
    total_categories: String,
}

#[derive(ramhorns::Content)]
struct AdminRow {
    title: String,
    category: String,
    date: String,
    view_link: String,
    edit_link: String,
    delete_action: String,
}

impl AdminRow {
    fn from_record(blog: &BlogRecord) -> Self {
        let id = encode_segment(&blog.id);
        AdminRow {
            title: blog.title.clone(),
            category: blog.category.clone(),
            date: blog.created_at.as_ref().map(format_date).unwrap_or_default(),
            view_link: format!("/blog/{}", encode_segment(&blog.slug)),
            edit_link: format!("/dashboard/blogs/edit/{}", id),
            delete_action: format!("/dashboard/blogs/delete/{}", id),
        }
    }
}

#[derive(ramhorns::Content)]
struct Listing {
    rows: Vec<AdminRow>,
    empty: bool,
}

#[derive(ramhorns::Content)]
struct DashboardPage {
    nav: Nav,
    notice: Option<ViewNotice>,
    overview: Option<Overview>,
    listing: Option<Listing>,
}

/// Admin pages: the stats overview and the record listing share one
/// template, each filling its own section.
pub struct DashboardRenderer<'a> {
    pub template: Template<'a>,
}

impl DashboardRenderer<'_> {
    pub fn new(tpl_src: &str) -> io::Result<DashboardRenderer> {
        let template = compile(tpl_src, "dashboard")?;
        Ok(DashboardRenderer { template })
    }

    pub fn render_overview(&self, stats: &DashboardStats, notice: Option<&Notice>) -> String {
        self.template.render(&DashboardPage {
            nav: Nav::new(true),
            notice: view_notice(notice),
            overview: Some(Overview {
                total_blogs: stats.total_blogs.to_string(),
                total_views: stats.total_views.to_string(),
                total_categories: stats.total_categories.to_string(),
            }),
            listing: None,
        })
    }

    pub fn render_blogs(&self, state: &ViewState<Vec<BlogRecord>>, notice: Option<&Notice>) -> String {
        let rows: Vec<AdminRow> = state.populated()
            .map(|blogs| blogs.iter().map(AdminRow::from_record).collect())
            .unwrap_or_default();

        self.template.render(&DashboardPage {
            nav: Nav::new(true),
            notice: view_notice(notice),
            overview: None,
            listing: Some(Listing {
                empty: rows.is_empty(),
                rows,
            }),
        })
    }
}
