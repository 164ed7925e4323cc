use std::io::ErrorKind;
use std::sync::Arc;
use std::{fs, io};

use ntex::http::{header, StatusCode};
use ntex::web;
use ntex::web::{HttpRequest, HttpResponse};
use ntex_files::NamedFile;
use spdlog::{error, info};

use crate::api::{self, ApiClient};
use crate::config::{Api, Config};
use crate::notice::Notice;
use crate::query_string::QueryString;
use crate::session::Session;
use crate::view::page_renderer::PageRenderer;

pub use cookie_store::CookieTokenStore;
pub use form::{read_blog_form, EditorInput, FormError};

mod admin;
mod cookie_store;
mod form;
mod pages;

type AppData = web::types::State<Arc<AppState>>;

pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    /// Client for related posts, which may live on another host.
    pub related: ApiClient,
}

fn client_for(base_url: &str, api: &Api) -> Result<ApiClient, api::Error> {
    let mut builder = ApiClient::builder(base_url);
    if let Some(timeout) = api.timeout() {
        builder = builder.timeout(timeout);
    }
    builder.build()
}

impl AppState {
    pub fn new(config: Config) -> Result<Self, api::Error> {
        let api = client_for(&config.api.base_url, &config.api)?;
        let related = client_for(config.api.related_base_url(), &config.api)?;
        Ok(AppState { config, api, related })
    }

    pub fn session(&self, req: &HttpRequest) -> Session<CookieTokenStore> {
        Session::open(CookieTokenStore::from_request(req, &self.config.session))
    }

    fn template(&self, name: &str) -> io::Result<String> {
        let path = self.config.paths.template_dir.join(name);
        fs::read_to_string(&path)
            .map_err(|e| io::Error::new(e.kind(), format!("Error reading template {}: {}", path.display(), e)))
    }
}

fn query_string(req: &HttpRequest) -> QueryString {
    QueryString::from(req.uri().query().unwrap_or(""))
}

fn respond(status: StatusCode, page: io::Result<String>, store: Option<&CookieTokenStore>) -> HttpResponse {
    match page {
        Ok(body) => {
            let mut builder = HttpResponse::build(status);
            builder.content_type("text/html; charset=utf-8");
            if let Some(store) = store {
                store.apply(&mut builder);
            }
            builder.body(body)
        }
        Err(e) => {
            error!("Error rendering page: {}", e);
            HttpResponse::InternalServerError()
                .body(format!("Error rendering page: {}", e))
        }
    }
}

/// 303 so a POST is followed by a GET.
fn redirect(location: &str, store: Option<&CookieTokenStore>) -> HttpResponse {
    let mut builder = HttpResponse::build(StatusCode::SEE_OTHER);
    builder.header(header::LOCATION, location);
    if let Some(store) = store {
        store.apply(&mut builder);
    }
    builder.finish()
}

fn not_found_page(state: &AppState, message: &str, notice: Option<&Notice>, logged_in: bool) -> HttpResponse {
    let page = state.template("not_found.tpl").and_then(|src| {
        let renderer = PageRenderer::new(&src)?;
        Ok(renderer.render_not_found(message, notice, logged_in))
    });
    respond(StatusCode::NOT_FOUND, page, None)
}

pub async fn not_found(req: HttpRequest, state: AppData) -> HttpResponse {
    let logged_in = state.session(&req).has_session();
    not_found_page(&state, "Page not found", None, logged_in)
}

#[web::get("/public/{file_name}")]
async fn public_files(path: web::types::Path<String>, state: AppData) -> Result<NamedFile, web::Error> {
    if path.contains("..") {
        return Err(web::error::ErrorUnauthorized("Access forbidden").into());
    }

    let file_path = state.config.paths.public_dir.join(path.into_inner());

    Ok(NamedFile::open(file_path)?)
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(pages::index)
        .service(pages::blog_detail)
        .service(pages::category_page)
        .service(pages::search)
        .service(admin::login_page)
        .service(admin::login_submit)
        .service(admin::logout)
        .service(admin::dashboard)
        .service(admin::dashboard_blogs)
        .service(admin::new_blog)
        .service(admin::create_blog)
        .service(admin::edit_blog)
        .service(admin::update_blog)
        .service(admin::delete_blog)
        .service(public_files);
}

pub async fn server_run(config: Config) -> io::Result<()> {
    let bind_addr = config.server.address.clone();
    let bind_port = config.server.port;
    info!("Using API at {}", config.api.base_url);

    let app_state = match AppState::new(config) {
        Ok(state) => Arc::new(state),
        Err(e) => return Err(io::Error::new(ErrorKind::InvalidInput, e.to_string())),
    };

    web::HttpServer::new(move || {
        web::App::new()
            .state(app_state.clone())
            .configure(configure)
            .default_service(web::route().to(not_found))
    })
        .bind((bind_addr, bind_port))?
        .run()
        .await
}
