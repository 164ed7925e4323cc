use std::io;

use ntex::http::{header, ResponseBuilder};
use ntex::web::HttpRequest;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};

use crate::config::SessionCookie;
use crate::session::TokenStore;

/// Characters not allowed in a cookie value.
const COOKIE_VALUE: &AsciiSet = &CONTROLS
    .add(b' ').add(b'"').add(b',').add(b';').add(b'\\').add(b'%');

#[derive(Debug, Clone, PartialEq, Eq)]
enum CookieChange {
    Set(String),
    Remove,
}

/// Token store backed by the request's `Cookie` header. Changes are kept
/// until the response is built and then written as `Set-Cookie`.
#[derive(Debug)]
pub struct CookieTokenStore {
    name: String,
    max_age_secs: u64,
    secure: bool,
    token: Option<String>,
    change: Option<CookieChange>,
}

impl CookieTokenStore {
    pub fn new(settings: &SessionCookie, token: Option<String>) -> Self {
        CookieTokenStore {
            name: settings.cookie_name.clone(),
            max_age_secs: u64::from(settings.max_age_days) * 24 * 60 * 60,
            secure: settings.secure,
            token,
            change: None,
        }
    }

    pub fn from_request(req: &HttpRequest, settings: &SessionCookie) -> Self {
        let token = req.headers()
            .get(header::COOKIE)
            .and_then(|value| value.to_str().ok())
            .and_then(|cookies| find_cookie(cookies, &settings.cookie_name));

        Self::new(settings, token)
    }

    /// `Set-Cookie` value for the pending change, if any.
    pub fn set_cookie(&self) -> Option<String> {
        let change = self.change.as_ref()?;
        let (value, max_age) = match change {
            CookieChange::Set(token) => (utf8_percent_encode(token, COOKIE_VALUE).to_string(), self.max_age_secs),
            CookieChange::Remove => (String::new(), 0),
        };

        let mut cookie = format!("{}={}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax", self.name, value, max_age);
        if self.secure {
            cookie.push_str("; Secure");
        }
        Some(cookie)
    }

    pub fn apply(&self, builder: &mut ResponseBuilder) {
        if let Some(cookie) = self.set_cookie() {
            builder.header(header::SET_COOKIE, cookie);
        }
    }
}

fn find_cookie(cookies: &str, name: &str) -> Option<String> {
    cookies.split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| percent_decode_str(value.trim_matches('"')).decode_utf8_lossy().into_owned())
        .filter(|value| !value.is_empty())
}

impl TokenStore for CookieTokenStore {
    fn load(&self) -> Option<String> {
        self.token.clone()
    }

    fn save(&mut self, token: &str) -> io::Result<()> {
        self.token = Some(token.to_string());
        self.change = Some(CookieChange::Set(token.to_string()));
        Ok(())
    }

    fn remove(&mut self) -> io::Result<()> {
        self.token = None;
        self.change = Some(CookieChange::Remove);
        Ok(())
    }
}
