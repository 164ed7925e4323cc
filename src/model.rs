use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// A blog entry as served by the API. Most entries review a product and may
/// carry a price and an affiliate link.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub affiliate_link: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_blank_as_none")]
    pub image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_date")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Counters shown on the dashboard overview.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DashboardStats {
    pub total_blogs: u64,
    pub total_views: u64,
    pub total_categories: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Mobiles,
    Electronics,
    Fashion,
    HomeAppliances,
    Gaming,
    Accessories,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Mobiles,
        Category::Electronics,
        Category::Fashion,
        Category::HomeAppliances,
        Category::Gaming,
        Category::Accessories,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Category::Mobiles => "Mobiles",
            Category::Electronics => "Electronics",
            Category::Fashion => "Fashion",
            Category::HomeAppliances => "Home Appliances",
            Category::Gaming => "Gaming",
            Category::Accessories => "Accessories",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            Category::Mobiles => "mobiles",
            Category::Electronics => "electronics",
            Category::Fashion => "fashion",
            Category::HomeAppliances => "home-appliances",
            Category::Gaming => "gaming",
            Category::Accessories => "accessories",
        }
    }

    /// Accepts either the display name or the slug, ignoring case.
    pub fn parse(value: &str) -> Option<Category> {
        let value = value.trim();
        Self::ALL.into_iter().find(|c| {
            c.slug().eq_ignore_ascii_case(value) || c.name().eq_ignore_ascii_case(value)
        })
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::parse(s).ok_or_else(|| format!("Unknown category: {}", s))
    }
}

/// Slug used by the category endpoint for a stored category value.
pub fn category_slug(category: &str) -> String {
    match Category::parse(category) {
        Some(c) => c.slug().to_string(),
        None => category.trim().to_lowercase().replace(' ', "-"),
    }
}

// Forms post the price as text, so the API may hand back a number, a numeric
// string, an empty string or null. Anything unreadable counts as no price so
// one bad record does not sink a whole listing.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawPrice {
        Number(f64),
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<RawPrice>::deserialize(deserializer)? {
        Some(RawPrice::Number(n)) if n.is_finite() => Some(n),
        Some(RawPrice::Text(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    })
}

/// RFC 3339 timestamps. Unparsable dates are dropped.
fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDate {
        Text(String),
        Other(IgnoredAny),
    }

    Ok(match Option::<RawDate>::deserialize(deserializer)? {
        Some(RawDate::Text(s)) => DateTime::parse_from_rfc3339(s.trim()).ok().map(|d| d.with_timezone(&Utc)),
        _ => None,
    })
}

fn deserialize_blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_record() {
        let json = r#"{
            "_id": "65f1c0",
            "slug": "pixel-9-review",
            "title": "Pixel 9 review",
            "description": "A phone",
            "content": "<p>Great</p>",
            "category": "Mobiles",
            "price": "699.00",
            "affiliateLink": "",
            "tags": ["android", "google"],
            "createdAt": "2024-01-02T03:04:05.000Z"
        }"#;
        let blog: BlogRecord = serde_json::from_str(json).unwrap();
        assert_eq!(blog.id, "65f1c0");
        assert_eq!(blog.price, Some(699.0));
        assert_eq!(blog.affiliate_link, None);
        assert_eq!(blog.image, None);
        assert_eq!(blog.tags, vec!["android", "google"]);
        assert!(blog.created_at.is_some());
    }

    #[test]
    fn test_price_variants() {
        let blog: BlogRecord = serde_json::from_str(r#"{"_id":"1","slug":"a","title":"A","price":12.5}"#).unwrap();
        assert_eq!(blog.price, Some(12.5));
        let blog: BlogRecord = serde_json::from_str(r#"{"_id":"1","slug":"a","title":"A","price":null}"#).unwrap();
        assert_eq!(blog.price, None);
        let blog: BlogRecord = serde_json::from_str(r#"{"_id":"1","slug":"a","title":"A","price":"cheap"}"#).unwrap();
        assert_eq!(blog.price, None);
        let blog: BlogRecord = serde_json::from_str(r#"{"_id":"1","slug":"a","title":"A","price":{"amount":3}}"#).unwrap();
        assert_eq!(blog.price, None);
    }

    #[test]
    fn test_bad_fields_keep_listing() {
        let json = r#"[
            {"_id":"1","slug":"a","title":"A","price":"n/a","createdAt":"yesterday"},
            {"_id":"2","slug":"b","title":"B","price":"19.99","createdAt":"2024-01-02T03:04:05.000Z"},
            {"_id":"3","slug":"c","title":"C","createdAt":1704164645}
        ]"#;
        let blogs: Vec<BlogRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(blogs.len(), 3);
        assert_eq!(blogs[0].price, None);
        assert_eq!(blogs[0].created_at, None);
        assert_eq!(blogs[1].price, Some(19.99));
        assert_eq!(blogs[1].created_at.map(|d| d.timestamp()), Some(1704164645));
        assert_eq!(blogs[2].created_at, None);
    }

    #[test]
    fn test_category_parse() {
        assert_eq!(Category::parse("home-appliances"), Some(Category::HomeAppliances));
        assert_eq!(Category::parse("Home Appliances"), Some(Category::HomeAppliances));
        assert_eq!(Category::parse("GAMING"), Some(Category::Gaming));
        assert_eq!(Category::parse("toasters"), None);
        assert_eq!(Category::parse(""), None);
    }

    #[test]
    fn test_category_slug() {
        assert_eq!(category_slug("Home Appliances"), "home-appliances");
        assert_eq!(category_slug("Garden Tools"), "garden-tools");
    }

    #[test]
    fn test_stats_defaults() {
        let stats: DashboardStats = serde_json::from_str(r#"{"totalBlogs": 4}"#).unwrap();
        assert_eq!(stats, DashboardStats { total_blogs: 4, total_views: 0, total_categories: 0 });
    }
}
