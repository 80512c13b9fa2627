//! Public listings derived from the content document.

use std::cmp::{Ordering, Reverse};

use chrono::{DateTime, NaiveDate};

use super::model::{Article, MediaItem};

/// Maximum number of articles shown in the public "Scientific Articles" list.
pub const FEATURED_ARTICLE_LIMIT: usize = 6;

/// Parse an article/media date. Accepts `YYYY-MM-DD` and RFC 3339.
pub fn parse_content_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

/// Featured articles, newest `publishDate` first, at most six.
///
/// Articles whose date does not parse come after every dated article and keep
/// their relative order.
pub fn featured_articles(articles: &[Article]) -> Vec<&Article> {
    let mut featured: Vec<&Article> = articles.iter().filter(|a| a.featured).collect();
    featured.sort_by_key(|a| match parse_content_date(&a.publish_date) {
        Some(date) => (false, Reverse(date)),
        None => (true, Reverse(NaiveDate::MIN)),
    });
    featured.truncate(FEATURED_ARTICLE_LIMIT);
    featured
}

/// Media items in display order: featured first, then descending `order`.
/// Ties keep their position in the document.
pub fn ordered_media(items: &[MediaItem]) -> Vec<&MediaItem> {
    let mut sorted: Vec<&MediaItem> = items.iter().collect();
    sorted.sort_by(|a, b| match (a.featured, b.featured) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => b.order.cmp(&a.order),
    });
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(id: &str, date: &str, featured: bool) -> Article {
        Article {
            id: id.to_string(),
            title: id.to_string(),
            publish_date: date.to_string(),
            featured,
            ..Default::default()
        }
    }

    fn media(id: &str, featured: bool, order: i64) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            featured,
            order,
            ..Default::default()
        }
    }

    fn article_ids(items: &[&Article]) -> Vec<String> {
        items.iter().map(|a| a.id.clone()).collect()
    }

    fn media_ids(items: &[&MediaItem]) -> Vec<String> {
        items.iter().map(|m| m.id.clone()).collect()
    }

    #[test]
    fn featured_articles_sorted_newest_first_and_capped() {
        let articles: Vec<Article> = (1..=9)
            .map(|d| article(&format!("a{d}"), &format!("2024-01-0{d}"), true))
            .chain([article("hidden", "2030-01-01", false)])
            .collect();

        let listed = featured_articles(&articles);
        assert_eq!(listed.len(), FEATURED_ARTICLE_LIMIT);
        assert_eq!(
            article_ids(&listed),
            vec!["a9", "a8", "a7", "a6", "a5", "a4"]
        );
    }

    #[test]
    fn undated_articles_come_last() {
        let articles = vec![
            article("bad", "someday", true),
            article("old", "2020-05-01", true),
            article("new", "2024-05-01T10:00:00Z", true),
        ];
        let listed = featured_articles(&articles);
        assert_eq!(article_ids(&listed), vec!["new", "old", "bad"]);
    }

    #[test]
    fn media_featured_first_then_order_desc_stable() {
        let items = vec![
            media("m1", false, 2),
            media("m2", true, 1),
            media("m3", false, 5),
            media("m4", false, 2),
            media("m5", true, 9),
        ];
        let ordered = ordered_media(&items);
        assert_eq!(
            media_ids(&ordered),
            vec!["m5", "m2", "m3", "m1", "m4"]
        );
    }
}
