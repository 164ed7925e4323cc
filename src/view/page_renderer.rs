use std::io;

use ramhorns::Template;

use crate::notice::Notice;
use crate::view::{compile, view_notice, Nav, ViewNotice};

#[derive(ramhorns::Content)]
struct LoginPage<'a> {
    nav: Nav,
    notice: Option<ViewNotice>,
    email: &'a str,
}

#[derive(ramhorns::Content)]
struct NotFoundPage<'a> {
    nav: Nav,
    notice: Option<ViewNotice>,
    message: &'a str,
}

/// Single-purpose pages: login and not-found.
pub struct PageRenderer<'a> {
    pub template: Template<'a>,
}

impl PageRenderer<'_> {
    pub fn new(tpl_src: &str) -> io::Result<PageRenderer> {
        let template = compile(tpl_src, "page")?;
        Ok(PageRenderer { template })
    }

    pub fn render_login(&self, email: &str, notice: Option<&Notice>) -> String {
        self.template.render(&LoginPage {
            nav: Nav::new(false),
            notice: view_notice(notice),
            email,
        })
    }

    pub fn render_not_found(&self, message: &str, notice: Option<&Notice>, logged_in: bool) -> String {
        self.template.render(&NotFoundPage {
            nav: Nav::new(logged_in),
            notice: view_notice(notice),
            message,
        })
    }
}
