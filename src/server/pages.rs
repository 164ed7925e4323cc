use ntex::http::StatusCode;
use ntex::web;
use ntex::web::{HttpRequest, HttpResponse};
use spdlog::warn;

use crate::fetcher::{FetchParams, ResourceFetcher, ViewState};
use crate::model::{category_slug, BlogRecord};
use crate::notice::Notice;
use crate::server::{not_found_page, query_string, respond, AppData, AppState};
use crate::view::list_renderer::{ListKind, ListRenderer};
use crate::view::post_renderer::PostRenderer;

async fn load_list(state: &AppState, params: FetchParams) -> (ViewState<Vec<BlogRecord>>, Option<Notice>) {
    let mut fetcher: ResourceFetcher<FetchParams, Vec<BlogRecord>> = ResourceFetcher::new("Error fetching blogs");
    let api = &state.api;
    fetcher.load(params, |p| async move { p.fetch_list(api).await }).await;
    let notice = fetcher.take_notice();
    (fetcher.into_state(), notice)
}

fn render_list(state: &AppState, kind: ListKind<'_>, view: &ViewState<Vec<BlogRecord>>, notice: Option<&Notice>, logged_in: bool) -> HttpResponse {
    let page = state.template("list.tpl").and_then(|src| {
        let renderer = ListRenderer::new(&src, state.config.defaults.featured_count)?;
        Ok(renderer.render(&kind, view, notice, logged_in))
    });
    respond(StatusCode::OK, page, None)
}

/// Other records of the same category, without the one being shown.
async fn related_blogs(state: &AppState, blog: &BlogRecord) -> Vec<BlogRecord> {
    if blog.category.trim().is_empty() {
        return vec![];
    }

    match state.related.blogs_by_category(&category_slug(&blog.category)).await {
        Ok(blogs) => blogs.into_iter()
            .filter(|b| b.id != blog.id)
            .take(state.config.defaults.related_count)
            .collect(),
        Err(e) => {
            warn!("Error fetching related blogs for {}: {}", blog.slug, e);
            vec![]
        }
    }
}

#[web::get("/")]
pub(super) async fn index(req: HttpRequest, state: AppData) -> HttpResponse {
    let qs = query_string(&req);
    let category = qs.get_category();
    let params = match category {
        Some(c) => FetchParams::Category(c.to_string()),
        None => FetchParams::All,
    };

    let (view, notice) = load_list(&state, params).await;
    let notice = notice.or_else(|| qs.get_notice());
    let logged_in = state.session(&req).has_session();
    render_list(&state, ListKind::Home { category }, &view, notice.as_ref(), logged_in)
}

#[web::get("/category/{category}")]
pub(super) async fn category_page(req: HttpRequest, path: web::types::Path<String>, state: AppData) -> HttpResponse {
    let segment = path.into_inner();
    let (view, notice) = load_list(&state, FetchParams::Category(segment.clone())).await;
    let notice = notice.or_else(|| query_string(&req).get_notice());
    let logged_in = state.session(&req).has_session();
    render_list(&state, ListKind::Category { segment: &segment }, &view, notice.as_ref(), logged_in)
}

#[web::get("/search")]
pub(super) async fn search(req: HttpRequest, state: AppData) -> HttpResponse {
    let qs = query_string(&req);
    let query = qs.get_query();
    let (view, notice) = match query {
        Some(q) => load_list(&state, FetchParams::Search(q.to_string())).await,
        None => (ViewState::Empty, None),
    };

    let notice = notice.or_else(|| qs.get_notice());
    let logged_in = state.session(&req).has_session();
    render_list(&state, ListKind::Search { query }, &view, notice.as_ref(), logged_in)
}

#[web::get("/blog/{slug}")]
pub(super) async fn blog_detail(req: HttpRequest, path: web::types::Path<String>, state: AppData) -> HttpResponse {
    let slug = path.into_inner();
    let logged_in = state.session(&req).has_session();

    let mut fetcher: ResourceFetcher<FetchParams, BlogRecord> = ResourceFetcher::new("Error fetching blog");
    let api = &state.api;
    fetcher.load(FetchParams::Slug(slug), |p| async move { p.fetch_one(api).await }).await;
    let notice = fetcher.take_notice().or_else(|| query_string(&req).get_notice());

    let Some(blog) = fetcher.state().populated() else {
        return not_found_page(&state, "Blog not found", notice.as_ref(), logged_in);
    };

    let related = related_blogs(&state, blog).await;
    let page = state.template("blog.tpl").and_then(|src| {
        let renderer = PostRenderer::new(&src)?;
        Ok(renderer.render(blog, &related, notice.as_ref(), logged_in))
    });
    respond(StatusCode::OK, page, None)
}

#[cfg(test)]
mod tests {
    use ntex::web::test::{call_service, init_service, read_body, TestRequest};
    use ntex::web::App;

    use super::*;
    use crate::server::configure;
    use crate::server::test_state::{app_state, UNREACHABLE_API};

    #[ntex::test]
    async fn missing_blog_renders_not_found() {
        let app = init_service(App::new().state(app_state(UNREACHABLE_API)).configure(configure)).await;
        let req = TestRequest::get().uri("/blog/some-review").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let body = read_body(resp).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("Blog not found"));
        assert!(body.contains("Error fetching blog"));
    }

    #[ntex::test]
    async fn home_marks_selected_category() {
        let app = init_service(App::new().state(app_state(UNREACHABLE_API)).configure(configure)).await;
        let req = TestRequest::get().uri("/?category=gaming").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body = read_body(resp).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("Gaming Reviews"));
        assert!(body.contains("pill pill-selected\" href=\"/?category=gaming\">Gaming"));
    }

    #[ntex::test]
    async fn unknown_home_filter_skips_network() {
        let app = init_service(App::new().state(app_state(UNREACHABLE_API)).configure(configure)).await;
        let req = TestRequest::get().uri("/?category=toasters").to_request();
        let body = read_body(call_service(&app, req).await).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("Toasters Reviews"));
        assert!(!body.contains("Error fetching blogs"));
    }
}
