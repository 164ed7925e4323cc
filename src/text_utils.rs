use chrono::{DateTime, Utc};

use crate::model::Category;

/// Long US style date, e.g. `January 2, 2024`.
pub fn format_date(date_time: &DateTime<Utc>) -> String {
    date_time.format("%B %-d, %Y").to_string()
}

/// Heading for a category route segment: `home-appliances` becomes
/// `Home Appliances`. Unknown segments are title-cased word by word.
pub fn category_title(segment: &str) -> String {
    if let Some(category) = Category::parse(segment) {
        return category.name().to_string();
    }

    segment
        .split(['-', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
