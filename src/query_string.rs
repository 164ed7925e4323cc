use std::collections::HashMap;

use crate::notice::{Notice, NoticeLevel};

#[derive(PartialEq, Debug)]
pub struct QueryString {
    items: HashMap<String, String>,
}

impl QueryString {
    pub fn from(buf: &str) -> Self {
        let vs: Vec<(String, String)> = serde_urlencoded::from_str(buf).unwrap_or_else(|_| vec![]);
        let items: HashMap<String, String> = vs.into_iter().collect();

        QueryString {
            items,
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(|s| s.as_str())
    }

    /// Search term, trimmed. Blank means no search.
    pub fn get_query(&self) -> Option<&str> {
        self.get("q").map(str::trim).filter(|q| !q.is_empty())
    }

    /// Category filter of the home page. `All` or blank means no filter.
    pub fn get_category(&self) -> Option<&str> {
        self.get("category")
            .map(str::trim)
            .filter(|c| !c.is_empty() && !c.eq_ignore_ascii_case("all"))
    }

    pub fn get_notice(&self) -> Option<Notice> {
        let message = self.get("notice").filter(|m| !m.is_empty())?;
        let level = match self.get("level") {
            Some("success") => NoticeLevel::Success,
            _ => NoticeLevel::Error,
        };
        Some(Notice { level, message: message.to_string() })
    }
}
