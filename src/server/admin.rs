use ntex::http::StatusCode;
use ntex::web;
use ntex::web::{HttpRequest, HttpResponse};
use ntex_multipart::Multipart;
use serde::Deserialize;
use spdlog::{info, warn};

use crate::api::Credentials;
use crate::editor::{EditorError, EditorMode, RecordEditor, ValidationError, LISTING_PATH};
use crate::fetcher::{FetchParams, ResourceFetcher};
use crate::guard::{GuardState, RouteGuard};
use crate::model::{BlogRecord, DashboardStats};
use crate::notice::Notice;
use crate::server::{not_found_page, query_string, read_blog_form, redirect, respond, AppData, AppState, CookieTokenStore};
use crate::session::Session;
use crate::view::dashboard_renderer::DashboardRenderer;
use crate::view::editor_renderer::EditorRenderer;
use crate::view::page_renderer::PageRenderer;

const LOGIN_PATH: &str = "/login";
const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Deserialize)]
pub(super) struct LoginForm {
    email: String,
    password: String,
}

/// Runs the route guard for an admin page. Anything but an authorized
/// session becomes a redirect to the login page.
async fn authorize(req: &HttpRequest, state: &AppState) -> Result<Session<CookieTokenStore>, HttpResponse> {
    let mut session = state.session(req);
    let mut guard = RouteGuard::new();
    match guard.check(&mut session, &state.api).await {
        GuardState::Authorized => Ok(session),
        _ => Err(redirect(LOGIN_PATH, Some(session.store()))),
    }
}

fn render_login(state: &AppState, email: &str, notice: Option<&Notice>, status: StatusCode) -> HttpResponse {
    let page = state.template("login.tpl").and_then(|src| {
        let renderer = PageRenderer::new(&src)?;
        Ok(renderer.render_login(email, notice))
    });
    respond(status, page, None)
}

fn render_editor(state: &AppState, editor: &RecordEditor, error: Option<&ValidationError>, notice: Option<&Notice>, status: StatusCode) -> HttpResponse {
    let page = state.template("editor.tpl").and_then(|src| {
        let renderer = EditorRenderer::new(&src)?;
        Ok(renderer.render(editor, error, notice))
    });
    respond(status, page, None)
}

async fn submit(state: &AppState, editor: RecordEditor, session: &Session<CookieTokenStore>) -> HttpResponse {
    match editor.submit(&state.api, session).await {
        Ok(outcome) => redirect(&outcome.notice.attach_to(outcome.redirect), None),
        Err(EditorError::Validation(e)) => render_editor(state, &editor, Some(&e), None, StatusCode::BAD_REQUEST),
        Err(e) => {
            let notice = e.notice();
            render_editor(state, &editor, None, notice.as_ref(), StatusCode::OK)
        }
    }
}

#[web::get("/login")]
pub(super) async fn login_page(req: HttpRequest, state: AppData) -> HttpResponse {
    if state.session(&req).has_session() {
        return redirect(DASHBOARD_PATH, None);
    }

    let notice = query_string(&req).get_notice();
    render_login(&state, "", notice.as_ref(), StatusCode::OK)
}

#[web::post("/login")]
pub(super) async fn login_submit(req: HttpRequest, form: web::types::Form<LoginForm>, state: AppData) -> HttpResponse {
    let form = form.into_inner();
    let credentials = Credentials {
        email: form.email.trim().to_string(),
        password: form.password,
    };

    match state.api.login(&credentials).await {
        Ok(token) => {
            let mut session = state.session(&req);
            if let Err(e) = session.set_session(&token) {
                warn!("Error storing session: {}", e);
            }
            info!("Admin logged in: {}", credentials.email);
            redirect(DASHBOARD_PATH, Some(session.store()))
        }
        Err(e) => {
            warn!("Login failed for {}: {}", credentials.email, e);
            let notice = Notice::error(e.server_message().unwrap_or("Login failed"));
            render_login(&state, &credentials.email, Some(&notice), StatusCode::UNAUTHORIZED)
        }
    }
}

#[web::get("/logout")]
pub(super) async fn logout(req: HttpRequest, state: AppData) -> HttpResponse {
    let mut session = state.session(&req);
    if let Err(e) = session.clear_session() {
        warn!("Error clearing session: {}", e);
    }
    redirect("/", Some(session.store()))
}

#[web::get("/dashboard")]
pub(super) async fn dashboard(req: HttpRequest, state: AppData) -> HttpResponse {
    let session = match authorize(&req, &state).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    let token = session.token().unwrap_or_default();

    let mut notice = query_string(&req).get_notice();
    let stats = match state.api.admin_stats(token).await {
        Ok(stats) => stats,
        Err(e) => {
            warn!("Error fetching stats: {}", e);
            notice = Some(Notice::error("Error fetching stats"));
            DashboardStats::default()
        }
    };

    let page = state.template("dashboard.tpl").and_then(|src| {
        let renderer = DashboardRenderer::new(&src)?;
        Ok(renderer.render_overview(&stats, notice.as_ref()))
    });
    respond(StatusCode::OK, page, Some(session.store()))
}

#[web::get("/dashboard/blogs")]
pub(super) async fn dashboard_blogs(req: HttpRequest, state: AppData) -> HttpResponse {
    let session = match authorize(&req, &state).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    let token = session.token().unwrap_or_default();

    let mut fetcher: ResourceFetcher<FetchParams, Vec<BlogRecord>> = ResourceFetcher::new("Error fetching blogs");
    let api = &state.api;
    fetcher.load(FetchParams::All, |_| async move { api.admin_blogs(token).await }).await;
    let notice = fetcher.take_notice().or_else(|| query_string(&req).get_notice());

    let page = state.template("dashboard.tpl").and_then(|src| {
        let renderer = DashboardRenderer::new(&src)?;
        Ok(renderer.render_blogs(fetcher.state(), notice.as_ref()))
    });
    respond(StatusCode::OK, page, Some(session.store()))
}

#[web::get("/dashboard/blogs/new")]
pub(super) async fn new_blog(req: HttpRequest, state: AppData) -> HttpResponse {
    if let Err(resp) = authorize(&req, &state).await {
        return resp;
    }

    let notice = query_string(&req).get_notice();
    render_editor(&state, &RecordEditor::create(), None, notice.as_ref(), StatusCode::OK)
}

#[web::post("/dashboard/blogs/new")]
pub(super) async fn create_blog(req: HttpRequest, payload: Multipart, state: AppData) -> HttpResponse {
    let session = match authorize(&req, &state).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    let input = match read_blog_form(payload).await {
        Ok(input) => input,
        Err(e) => {
            warn!("Error reading blog form: {}", e);
            return HttpResponse::BadRequest().body(e.to_string());
        }
    };

    let editor = RecordEditor {
        mode: EditorMode::Create,
        form: input.form,
        preview: None,
    };
    submit(&state, editor, &session).await
}

#[web::get("/dashboard/blogs/edit/{id}")]
pub(super) async fn edit_blog(req: HttpRequest, path: web::types::Path<String>, state: AppData) -> HttpResponse {
    let session = match authorize(&req, &state).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    let token = session.token().unwrap_or_default();
    let id = path.into_inner();

    match state.api.admin_blog(token, &id).await {
        Ok(record) => {
            let notice = query_string(&req).get_notice();
            render_editor(&state, &RecordEditor::edit(&record), None, notice.as_ref(), StatusCode::OK)
        }
        Err(e) if e.is_not_found() => not_found_page(&state, "Blog not found", None, true),
        Err(e) => {
            warn!("Error fetching blog {}: {}", id, e);
            redirect(&Notice::error("Error fetching blog").attach_to(LISTING_PATH), None)
        }
    }
}

#[web::post("/dashboard/blogs/edit/{id}")]
pub(super) async fn update_blog(req: HttpRequest, path: web::types::Path<String>, payload: Multipart, state: AppData) -> HttpResponse {
    let session = match authorize(&req, &state).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };

    let input = match read_blog_form(payload).await {
        Ok(input) => input,
        Err(e) => {
            warn!("Error reading blog form: {}", e);
            return HttpResponse::BadRequest().body(e.to_string());
        }
    };

    let mut editor = RecordEditor {
        mode: EditorMode::Update(path.into_inner()),
        form: input.form,
        preview: input.current_image,
    };
    // A file picked after clearing replaces the stored image
    if input.clear_image && editor.form.image.is_none() {
        editor.clear_preview();
    }
    submit(&state, editor, &session).await
}

#[web::post("/dashboard/blogs/delete/{id}")]
pub(super) async fn delete_blog(req: HttpRequest, path: web::types::Path<String>, state: AppData) -> HttpResponse {
    let session = match authorize(&req, &state).await {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    let token = session.token().unwrap_or_default();
    let id = path.into_inner();

    let notice = match state.api.delete_blog(token, &id).await {
        Ok(message) => {
            info!("Blog deleted: {}", id);
            Notice::success(message.unwrap_or_else(|| "Blog deleted successfully!".to_string()))
        }
        Err(e) => {
            warn!("Error deleting blog {}: {}", id, e);
            Notice::error(e.server_message().unwrap_or("Error deleting blog"))
        }
    };
    redirect(&notice.attach_to(LISTING_PATH), None)
}

#[cfg(test)]
mod tests {
    use ntex::http::header;
    use ntex::web::test::{call_service, init_service, read_body, TestRequest};
    use ntex::web::App;

    use super::*;
    use crate::server::configure;
    use crate::server::test_state::{app_state, UNREACHABLE_API};

    #[ntex::test]
    async fn editor_pages_are_guarded() {
        let app = init_service(App::new().state(app_state(UNREACHABLE_API)).configure(configure)).await;

        for uri in ["/dashboard/blogs/new", "/dashboard/blogs/edit/abc"] {
            let resp = call_service(&app, TestRequest::get().uri(uri).to_request()).await;
            assert_eq!(resp.status(), StatusCode::SEE_OTHER);
            assert_eq!(resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(), "/login");
        }

        let req = TestRequest::post().uri("/dashboard/blogs/delete/abc").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(), "/login");
    }

    #[ntex::test]
    async fn failed_login_keeps_email() {
        let app = init_service(App::new().state(app_state(UNREACHABLE_API)).configure(configure)).await;
        let req = TestRequest::post()
            .uri("/login")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .set_payload("email=admin%40example.com&password=secret")
            .to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert!(resp.headers().get(header::SET_COOKIE).is_none());

        let body = read_body(resp).await;
        let body = String::from_utf8_lossy(&body);
        assert!(body.contains("Login failed"));
        assert!(body.contains("value=\"admin@example.com\""));
    }

    #[ntex::test]
    async fn login_page_with_session_goes_to_dashboard() {
        let app = init_service(App::new().state(app_state(UNREACHABLE_API)).configure(configure)).await;
        let req = TestRequest::get().uri("/login").header(header::COOKIE, "token=abc").to_request();
        let resp = call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SEE_OTHER);
        assert_eq!(resp.headers().get(header::LOCATION).unwrap().to_str().unwrap(), "/dashboard");
    }
}
