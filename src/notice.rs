use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Error,
}

impl NoticeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoticeLevel::Success => "success",
            NoticeLevel::Error => "error",
        }
    }
}

/// Transient message shown once to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Notice { level: NoticeLevel::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Notice { level: NoticeLevel::Error, message: message.into() }
    }

    /// `notice=...&level=...`, to carry the notice across a redirect.
    pub fn to_query(&self) -> String {
        #[derive(Serialize)]
        struct Params<'a> {
            notice: &'a str,
            level: NoticeLevel,
        }

        serde_urlencoded::to_string(Params { notice: &self.message, level: self.level })
            .unwrap_or_default()
    }

    /// Appends the notice to a location, keeping any existing query.
    pub fn attach_to(&self, location: &str) -> String {
        let sep = if location.contains('?') { '&' } else { '?' };
        format!("{}{}{}", location, sep, self.to_query())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_query() {
        let notice = Notice::success("Blog created successfully!");
        assert_eq!(notice.to_query(), "notice=Blog+created+successfully%21&level=success");
    }

    #[test]
    fn test_attach_to() {
        let notice = Notice::error("Oops");
        assert_eq!(notice.attach_to("/dashboard/blogs"), "/dashboard/blogs?notice=Oops&level=error");
        assert_eq!(notice.attach_to("/?category=gaming"), "/?category=gaming&notice=Oops&level=error");
    }
}
