//! Submit-time normalization of the edited document.
//!
//! Entirely blank repeatable entries are dropped everywhere. An entry that
//! has some content but lacks its key field blocks the submit with a
//! [`ValidationError`] addressed by the entry's dotted path, counted in the
//! list as it was before any entry was dropped.

use std::collections::HashSet;

use thiserror::Error;

use crate::content::listing::parse_content_date;
use crate::content::model::{
    Article, ContentDocument, Department, Doctor, FaqEntry, MediaItem, MenuItem, Service,
    TeamFeature, WhyChooseFeature,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationKind {
    #[error("is required")]
    Required,
    #[error("{0:?} is not a valid date")]
    InvalidDate(String),
    #[error("duplicate id {0:?}")]
    DuplicateId(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path} {kind}")]
pub struct ValidationError {
    pub path: String,
    pub kind: ValidationKind,
}

impl ValidationError {
    fn required(path: String) -> Self {
        Self {
            path,
            kind: ValidationKind::Required,
        }
    }
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn blank_opt(s: &Option<String>) -> bool {
    s.as_deref().map_or(true, blank)
}

/// Check every non-blank entry for its key field, then drop blank entries.
fn retain_filled<T>(
    items: &mut Vec<T>,
    section: &str,
    key: &str,
    is_blank: impl Fn(&T) -> bool,
    key_missing: impl Fn(&T) -> bool,
) -> Result<(), ValidationError> {
    if let Some(i) = items
        .iter()
        .position(|item| !is_blank(item) && key_missing(item))
    {
        return Err(ValidationError::required(format!("{section}.{i}.{key}")));
    }
    items.retain(|item| !is_blank(item));
    Ok(())
}

fn service_blank(s: &Service) -> bool {
    blank(&s.title) && blank(&s.description) && s.icon.is_none() && blank_opt(&s.image)
}

fn department_blank(d: &Department) -> bool {
    blank(&d.title) && d.icon.is_none() && blank_opt(&d.description) && blank_opt(&d.image)
}

fn feature_blank(f: &WhyChooseFeature) -> bool {
    blank(&f.title) && blank(&f.description) && f.icon.is_none()
}

fn faq_blank(q: &FaqEntry) -> bool {
    blank(&q.question) && blank(&q.answer)
}

fn menu_blank(m: &MenuItem) -> bool {
    blank(&m.label) && blank(&m.href)
}

fn team_blank(t: &TeamFeature) -> bool {
    blank(&t.title) && blank(&t.description)
}

fn doctor_unnamed(d: &Doctor) -> bool {
    blank(&d.name)
}

/// Article fields the editor pre-fills (id, author, date, category,
/// featured) do not count as content.
fn article_blank(a: &Article) -> bool {
    blank(&a.title)
        && blank(&a.excerpt)
        && blank(&a.content)
        && blank_opt(&a.image)
        && blank_opt(&a.video)
}

fn media_blank(m: &MediaItem) -> bool {
    blank(&m.title)
        && blank(&m.description)
        && blank(&m.content)
        && blank(&m.media)
        && blank_opt(&m.location)
        && m.images.as_ref().map_or(true, |imgs| imgs.iter().all(|i| blank(i)))
}

fn check_ids<'a>(
    section: &str,
    ids: impl Iterator<Item = (usize, &'a str)>,
) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for (i, id) in ids {
        if blank(id) {
            return Err(ValidationError::required(format!("{section}.{i}.id")));
        }
        if !seen.insert(id) {
            return Err(ValidationError {
                path: format!("{section}.{i}.id"),
                kind: ValidationKind::DuplicateId(id.to_string()),
            });
        }
    }
    Ok(())
}

fn normalize_articles(articles: &mut Vec<Article>) -> Result<(), ValidationError> {
    let filled = || {
        articles
            .iter()
            .enumerate()
            .filter(|(_, a)| !article_blank(a))
    };
    for (i, article) in filled() {
        if blank(&article.title) {
            return Err(ValidationError::required(format!("articles.{i}.title")));
        }
        if parse_content_date(&article.publish_date).is_none() {
            return Err(ValidationError {
                path: format!("articles.{i}.publishDate"),
                kind: ValidationKind::InvalidDate(article.publish_date.clone()),
            });
        }
    }
    check_ids("articles", filled().map(|(i, a)| (i, a.id.as_str())))?;
    articles.retain(|a| !article_blank(a));
    Ok(())
}

fn normalize_media(media: &mut Vec<MediaItem>) -> Result<(), ValidationError> {
    let filled = || media.iter().enumerate().filter(|(_, m)| !media_blank(m));
    if let Some((i, _)) = filled().find(|(_, m)| blank(&m.title)) {
        return Err(ValidationError::required(format!("media.{i}.title")));
    }
    check_ids("media", filled().map(|(i, m)| (i, m.id.as_str())))?;
    media.retain(|m| !media_blank(m));
    for item in media.iter_mut() {
        if let Some(images) = item.images.as_mut() {
            images.retain(|url| !blank(url));
        }
    }
    Ok(())
}

/// Normalize `doc` in place for saving.
///
/// On error `doc` may be partly normalized; callers validate a copy.
pub fn normalize(doc: &mut ContentDocument) -> Result<(), ValidationError> {
    doc.contact.phones.retain(|p| !blank(p));
    doc.doctors.members.retain(|d| !doctor_unnamed(d));
    doc.gallery.images.retain(|url| !blank(url));
    doc.team.features.retain(|t| !team_blank(t));

    retain_filled(
        &mut doc.navigation.menu_items,
        "navigation.menuItems",
        "label",
        menu_blank,
        |m| blank(&m.label),
    )?;
    retain_filled(
        &mut doc.why_choose.features,
        "whyChoose.features",
        "title",
        feature_blank,
        |f| blank(&f.title),
    )?;
    retain_filled(
        &mut doc.services.items,
        "services.items",
        "title",
        service_blank,
        |s| blank(&s.title),
    )?;
    retain_filled(
        &mut doc.departments.items,
        "departments.items",
        "title",
        department_blank,
        |d| blank(&d.title),
    )?;
    retain_filled(
        &mut doc.faq.questions,
        "faq.questions",
        "question",
        faq_blank,
        |q| blank(&q.question),
    )?;
    normalize_articles(&mut doc.articles)?;
    normalize_media(&mut doc.media)?;
    Ok(())
}
