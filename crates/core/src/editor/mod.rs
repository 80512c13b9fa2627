//! An editing session over the content document.
//!
//! The session loads the whole document once, lets the caller edit it in
//! memory, and submits a normalized full replacement back to the store.

pub mod field;
pub mod validate;

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::analytics::AnalyticsAggregator;
use crate::clock::{Clock, SystemClock};
use crate::content::model::{
    Article, ArticleCategory, ContentDocument, Department, Doctor, FaqEntry, MediaItem, MediaKind,
    MediaType, Service, TeamFeature,
};
use crate::content::store::{to_pretty_json, ContentStore, StoreError};
use crate::upload::{MediaUploader, UploadFile};

pub use field::{MediaField, MissingEntry, UnknownField};
pub use validate::{normalize, ValidationError, ValidationKind};

/// File name offered when the document has to be saved by hand.
pub const DOWNLOAD_FILE_NAME: &str = "content.json";

/// Author pre-filled on new articles.
pub const DEFAULT_AUTHOR: &str = "Dr Zeineb Belkhiria";

#[derive(Debug, thiserror::Error)]
pub enum EditorError {
    #[error("content could not be loaded: {0}")]
    Load(#[source] StoreError),

    #[error("invalid content: {0}")]
    Validation(#[from] ValidationError),

    #[error("{group} has no entry {index} (length {len})")]
    IndexOutOfRange {
        group: Group,
        index: usize,
        len: usize,
    },

    #[error("could not serialize content: {0}")]
    Export(#[source] StoreError),
}

impl From<MissingEntry> for EditorError {
    fn from(m: MissingEntry) -> Self {
        EditorError::IndexOutOfRange {
            group: m.group,
            index: m.index,
            len: m.len,
        }
    }
}

/// The repeatable lists of the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Group {
    Phones,
    Doctors,
    Services,
    Departments,
    Faq,
    Gallery,
    TeamFeatures,
    Articles,
    Media,
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Group::Phones => "contact.phones",
            Group::Doctors => "doctors.members",
            Group::Services => "services.items",
            Group::Departments => "departments.items",
            Group::Faq => "faq.questions",
            Group::Gallery => "gallery.images",
            Group::TeamFeatures => "team.features",
            Group::Articles => "articles",
            Group::Media => "media",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

/// A banner message for the person editing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// A document the user can save by hand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    pub file_name: &'static str,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    Saved,
    /// The store failed; the edits are still in the session and the
    /// document is offered as a file instead.
    DownloadOffered(Download),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The uploader stored the file; the field holds its URL.
    Stored(String),
    /// The upload failed; the field holds a `data:` preview that only lives
    /// in this session.
    Preview,
}

pub struct ContentEditor {
    store: ContentStore,
    clock: Arc<dyn Clock>,
    analytics: Option<Arc<AnalyticsAggregator>>,
    doc: ContentDocument,
    /// Article ids present at load or at the last successful save.
    known_articles: HashSet<String>,
    transient: HashSet<MediaField>,
    notices: Vec<Notice>,
}

impl ContentEditor {
    /// Load the current document. Without a document there is nothing to
    /// edit, so any load failure ends the session.
    pub async fn open(store: ContentStore) -> Result<Self, EditorError> {
        Self::open_with_clock(store, Arc::new(SystemClock)).await
    }

    pub async fn open_with_clock(
        store: ContentStore,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, EditorError> {
        let doc = match store.load().await {
            Ok(doc) => doc,
            Err(e) => {
                tracing::error!(error = %e, "editor could not load content");
                return Err(EditorError::Load(e));
            }
        };
        let known_articles = doc.articles.iter().map(|a| a.id.clone()).collect();
        Ok(Self {
            store,
            clock,
            analytics: None,
            doc,
            known_articles,
            transient: HashSet::new(),
            notices: Vec::new(),
        })
    }

    /// Report uploads and newly published articles to `analytics`.
    pub fn with_analytics(mut self, analytics: Arc<AnalyticsAggregator>) -> Self {
        self.analytics = Some(analytics);
        self
    }

    pub fn document(&self) -> &ContentDocument {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut ContentDocument {
        &mut self.doc
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    /// Fields currently holding a session-only preview instead of a stored URL.
    pub fn transient_fields(&self) -> impl Iterator<Item = &MediaField> {
        self.transient.iter()
    }

    pub fn is_transient(&self, field: &MediaField) -> bool {
        self.transient.contains(field)
    }

    fn notify(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.notices.push(Notice {
            level,
            message: message.into(),
        });
    }

    pub fn len(&self, group: Group) -> usize {
        let doc = &self.doc;
        match group {
            Group::Phones => doc.contact.phones.len(),
            Group::Doctors => doc.doctors.members.len(),
            Group::Services => doc.services.items.len(),
            Group::Departments => doc.departments.items.len(),
            Group::Faq => doc.faq.questions.len(),
            Group::Gallery => doc.gallery.images.len(),
            Group::TeamFeatures => doc.team.features.len(),
            Group::Articles => doc.articles.len(),
            Group::Media => doc.media.len(),
        }
    }

    fn today(&self) -> String {
        self.clock.now().date_naive().format("%Y-%m-%d").to_string()
    }

    /// `<prefix>-<millis>`, bumped by a millisecond until no entry uses it.
    fn fresh_id(&self, prefix: &str, taken: impl Fn(&str) -> bool) -> String {
        let mut millis = self.clock.now_millis();
        loop {
            let id = format!("{prefix}-{millis}");
            if !taken(&id) {
                return id;
            }
            millis += 1;
        }
    }

    fn fresh_article_id(&self) -> String {
        self.fresh_id("article", |id| self.doc.articles.iter().any(|a| a.id == id))
    }

    fn fresh_media_id(&self) -> String {
        self.fresh_id("media", |id| self.doc.media.iter().any(|m| m.id == id))
    }

    pub fn blank_article(&self) -> Article {
        Article {
            id: self.fresh_article_id(),
            author: DEFAULT_AUTHOR.to_string(),
            publish_date: self.today(),
            category: ArticleCategory::Technologie,
            featured: true,
            ..Default::default()
        }
    }

    pub fn blank_media(&self) -> MediaItem {
        MediaItem {
            id: self.fresh_media_id(),
            kind: MediaKind::Interview,
            date: self.today(),
            media_type: MediaType::Image,
            images: Some(Vec::new()),
            featured: false,
            order: self.doc.media.len() as i64 + 1,
            ..Default::default()
        }
    }

    /// Append an empty entry to `group` and return its index.
    pub fn append_blank(&mut self, group: Group) -> usize {
        match group {
            Group::Phones => self.push_phone(String::new()),
            Group::Doctors => self.push_doctor(Doctor::default()),
            Group::Services => self.push_service(Service::default()),
            Group::Departments => self.push_department(Department::default()),
            Group::Faq => self.push_faq(FaqEntry::default()),
            Group::Gallery => self.push_gallery_image(String::new()),
            Group::TeamFeatures => self.push_team_feature(TeamFeature::default()),
            Group::Articles => {
                let article = self.blank_article();
                self.push_article(article)
            }
            Group::Media => {
                let item = self.blank_media();
                self.push_media(item)
            }
        }
    }

    pub fn push_phone(&mut self, phone: String) -> usize {
        self.doc.contact.phones.push(phone);
        self.doc.contact.phones.len() - 1
    }

    pub fn push_doctor(&mut self, doctor: Doctor) -> usize {
        self.doc.doctors.members.push(doctor);
        self.doc.doctors.members.len() - 1
    }

    pub fn push_service(&mut self, service: Service) -> usize {
        self.doc.services.items.push(service);
        self.doc.services.items.len() - 1
    }

    pub fn push_department(&mut self, department: Department) -> usize {
        self.doc.departments.items.push(department);
        self.doc.departments.items.len() - 1
    }

    pub fn push_faq(&mut self, entry: FaqEntry) -> usize {
        self.doc.faq.questions.push(entry);
        self.doc.faq.questions.len() - 1
    }

    pub fn push_gallery_image(&mut self, url: String) -> usize {
        self.doc.gallery.images.push(url);
        self.doc.gallery.images.len() - 1
    }

    pub fn push_team_feature(&mut self, feature: TeamFeature) -> usize {
        self.doc.team.features.push(feature);
        self.doc.team.features.len() - 1
    }

    /// Append an article; an empty id is replaced by a fresh one.
    pub fn push_article(&mut self, mut article: Article) -> usize {
        if article.id.trim().is_empty() {
            article.id = self.fresh_article_id();
        }
        self.doc.articles.push(article);
        self.doc.articles.len() - 1
    }

    /// Append a media item; an empty id is replaced by a fresh one and an
    /// unset order places it last.
    pub fn push_media(&mut self, mut item: MediaItem) -> usize {
        if item.id.trim().is_empty() {
            item.id = self.fresh_media_id();
        }
        if item.order == 0 {
            item.order = self.doc.media.len() as i64 + 1;
        }
        self.doc.media.push(item);
        self.doc.media.len() - 1
    }

    /// Remove entry `index` of `group`, shifting later entries down. Media
    /// `order` values are left as they are.
    pub fn remove_at(&mut self, group: Group, index: usize) -> Result<(), EditorError> {
        let len = self.len(group);
        if index >= len {
            return Err(EditorError::IndexOutOfRange { group, index, len });
        }
        let doc = &mut self.doc;
        match group {
            Group::Phones => drop(doc.contact.phones.remove(index)),
            Group::Doctors => drop(doc.doctors.members.remove(index)),
            Group::Services => drop(doc.services.items.remove(index)),
            Group::Departments => drop(doc.departments.items.remove(index)),
            Group::Faq => drop(doc.faq.questions.remove(index)),
            Group::Gallery => drop(doc.gallery.images.remove(index)),
            Group::TeamFeatures => drop(doc.team.features.remove(index)),
            Group::Articles => drop(doc.articles.remove(index)),
            Group::Media => drop(doc.media.remove(index)),
        }
        self.transient = self
            .transient
            .iter()
            .filter_map(|f| f.after_removal(group, index))
            .collect();
        Ok(())
    }

    /// The in-memory document as a pretty JSON download, available at any
    /// time regardless of the store.
    pub fn export(&self) -> Result<Download, EditorError> {
        Ok(Download {
            file_name: DOWNLOAD_FILE_NAME,
            bytes: to_pretty_json(&self.doc).map_err(EditorError::Export)?,
        })
    }

    /// Normalize and save the whole document.
    ///
    /// Validation failures block the submit before the store is touched.
    /// A store failure keeps the edits and offers a download instead.
    pub async fn submit(&mut self) -> Result<SubmitOutcome, EditorError> {
        let mut normalized = self.doc.clone();
        if let Err(e) = normalize(&mut normalized) {
            self.notify(NoticeLevel::Error, format!("Cannot save: {e}"));
            return Err(e.into());
        }
        if !self.transient.is_empty() {
            self.notify(
                NoticeLevel::Warning,
                format!(
                    "{} field(s) still hold a temporary preview; replace them with a permanent URL",
                    self.transient.len()
                ),
            );
        }

        if let Err(e) = self.store.save(&normalized).await {
            tracing::warn!(error = %e, "content save failed, offering download");
            let bytes = to_pretty_json(&normalized).map_err(EditorError::Export)?;
            self.adopt(normalized);
            self.notify(
                NoticeLevel::Warning,
                format!("Saving failed; download {DOWNLOAD_FILE_NAME} and replace it manually."),
            );
            return Ok(SubmitOutcome::DownloadOffered(Download {
                file_name: DOWNLOAD_FILE_NAME,
                bytes,
            }));
        }

        self.report_new_articles(&normalized).await;
        self.known_articles = normalized.articles.iter().map(|a| a.id.clone()).collect();
        self.adopt(normalized);
        self.notify(
            NoticeLevel::Success,
            "Content saved. Changes are live immediately.",
        );
        Ok(SubmitOutcome::Saved)
    }

    /// Replace the session document with its normalized form. Dropped
    /// entries shift indices, so transient markers are re-found by their
    /// preview values.
    fn adopt(&mut self, normalized: ContentDocument) {
        let previews: HashSet<&str> = self
            .transient
            .iter()
            .filter_map(|f| f.value(&self.doc))
            .collect();
        self.transient = MediaField::all_in(&normalized)
            .into_iter()
            .filter(|f| f.value(&normalized).is_some_and(|v| previews.contains(v)))
            .collect();
        self.doc = normalized;
    }

    async fn report_new_articles(&self, saved: &ContentDocument) {
        let Some(analytics) = &self.analytics else {
            return;
        };
        for article in saved
            .articles
            .iter()
            .filter(|a| a.featured && !self.known_articles.contains(&a.id))
        {
            if let Err(e) = analytics.track_new_article(&article.title).await {
                tracing::warn!(error = %e, article = %article.id, "could not record new article");
            }
        }
    }

    /// Upload `file` and put the resulting URL into `field`.
    ///
    /// An unreachable field is an error and nothing is uploaded. A failed
    /// upload is not: the field gets an inline preview, is marked transient
    /// and a warning notice is raised.
    pub async fn attach_upload(
        &mut self,
        field: &MediaField,
        uploader: &dyn MediaUploader,
        file: UploadFile,
    ) -> Result<AttachOutcome, EditorError> {
        field.slot(&mut self.doc)?;

        match uploader.upload_file(&file).await {
            Ok(stored) => {
                *field.slot(&mut self.doc)? = stored.url.clone();
                self.transient.remove(field);
                if let Some(analytics) = &self.analytics {
                    if let Err(e) = analytics.track_media_upload(&stored.file_name).await {
                        tracing::warn!(error = %e, "could not record media upload");
                    }
                }
                self.notify(NoticeLevel::Success, "File uploaded.");
                Ok(AttachOutcome::Stored(stored.url))
            }
            Err(e) => {
                tracing::warn!(field = %field, error = %e, "upload failed, using inline preview");
                *field.slot(&mut self.doc)? = preview_url(&file);
                self.transient.insert(field.clone());
                self.notify(
                    NoticeLevel::Warning,
                    format!("Upload failed ({e}); using a temporary preview. Save a permanent URL later."),
                );
                Ok(AttachOutcome::Preview)
            }
        }
    }
}

fn preview_url(file: &UploadFile) -> String {
    let mime = if file.content_type.trim().is_empty() {
        "application/octet-stream"
    } else {
        file.content_type.trim()
    };
    format!("data:{mime};base64,{}", STANDARD.encode(&file.bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::ActivityKind;
    use crate::clock::ManualClock;
    use crate::content::backends::MemoryBackend;
    use crate::upload::{StoredUpload, UploadError};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    const T0: i64 = 1_717_000_000_000;

    fn clock() -> Arc<ManualClock> {
        Arc::new(ManualClock::new(Utc.timestamp_millis_opt(T0).unwrap()))
    }

    fn seeded_backend() -> Arc<MemoryBackend> {
        let doc = serde_json::json!({
            "site": {"title": "Belvédère Imaging Center"},
            "contact": {"email": "contact@bic.tn", "phones": ["+216 71 000 000"]},
            "doctors": {"members": [{"name": "Dr A"}, {"name": "Dr B"}]},
            "articles": [{
                "id": "article-1",
                "title": "IRM 3T",
                "publishDate": "2024-01-10",
                "featured": true
            }]
        });
        Arc::new(MemoryBackend::with_bytes(serde_json::to_vec(&doc).unwrap()))
    }

    async fn editor(backend: Arc<MemoryBackend>) -> ContentEditor {
        ContentEditor::open_with_clock(ContentStore::new(backend), clock())
            .await
            .unwrap()
    }

    struct FixedUploader(Result<&'static str, ()>);

    #[async_trait]
    impl MediaUploader for FixedUploader {
        async fn upload_file(&self, file: &UploadFile) -> Result<StoredUpload, UploadError> {
            match self.0 {
                Ok(name) => Ok(StoredUpload {
                    url: format!("/uploads/{name}"),
                    file_name: name.to_string(),
                    size: file.bytes.len() as u64,
                    content_type: "image/png",
                }),
                Err(()) => Err(UploadError::Persistence("disk full".into())),
            }
        }
    }

    fn png() -> UploadFile {
        UploadFile {
            bytes: vec![0x89, b'P', b'N', b'G'],
            file_name: "dr.png".into(),
            content_type: "image/png".into(),
        }
    }

    #[tokio::test]
    async fn load_failure_is_fatal() {
        let store = ContentStore::new(Arc::new(MemoryBackend::new()));
        let err = ContentEditor::open(store).await.err().unwrap();
        assert!(matches!(err, EditorError::Load(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn edit_submit_and_reload() {
        let backend = seeded_backend();
        let mut editor = editor(backend.clone()).await;
        editor.document_mut().hero.title = "Bienvenue".into();
        editor.append_blank(Group::Phones);

        assert_eq!(editor.submit().await.unwrap(), SubmitOutcome::Saved);
        let notices = editor.drain_notices();
        assert_eq!(notices[0].level, NoticeLevel::Success);
        assert!(editor.notices().is_empty());

        let reloaded = ContentStore::new(backend).load().await.unwrap();
        assert_eq!(reloaded.hero.title, "Bienvenue");
        assert_eq!(reloaded.contact.phones, vec!["+216 71 000 000"]);
        assert_eq!(reloaded.site.title, "Belvédère Imaging Center");
    }

    #[tokio::test]
    async fn blank_entries_get_fresh_ids_and_defaults() {
        let mut editor = editor(seeded_backend()).await;
        let a = editor.append_blank(Group::Articles);
        let b = editor.append_blank(Group::Articles);
        let article = &editor.document().articles[a];
        assert_eq!(article.id, format!("article-{T0}"));
        assert_eq!(editor.document().articles[b].id, format!("article-{}", T0 + 1));
        assert_eq!(article.publish_date, "2024-05-29");
        assert_eq!(article.category, ArticleCategory::Technologie);
        assert!(article.featured);

        editor.append_blank(Group::Media);
        let m = editor.append_blank(Group::Media);
        let media = &editor.document().media[m];
        assert_eq!(media.order, 2);
        assert_eq!(media.kind, MediaKind::Interview);
        assert_eq!(media.media_type, MediaType::Image);
        assert_eq!(editor.len(Group::Media), 2);
    }

    #[tokio::test]
    async fn remove_shifts_down_without_renumbering() {
        let mut editor = editor(seeded_backend()).await;
        for _ in 0..3 {
            editor.append_blank(Group::Media);
        }
        editor.remove_at(Group::Media, 0).unwrap();
        let orders: Vec<_> = editor.document().media.iter().map(|m| m.order).collect();
        assert_eq!(orders, vec![2, 3]);

        editor.remove_at(Group::Doctors, 0).unwrap();
        assert_eq!(editor.document().doctors.members[0].name, "Dr B");

        let err = editor.remove_at(Group::Faq, 0).unwrap_err();
        assert!(matches!(
            err,
            EditorError::IndexOutOfRange {
                group: Group::Faq,
                index: 0,
                len: 0
            }
        ));
    }

    #[tokio::test]
    async fn validation_blocks_submit_before_the_store() {
        let backend = seeded_backend();
        let mut editor = editor(backend.clone()).await;
        editor.push_service(Service {
            description: "sans titre".into(),
            ..Default::default()
        });
        backend.set_unavailable(true);

        let err = editor.submit().await.unwrap_err();
        match err {
            EditorError::Validation(v) => assert_eq!(v.path, "services.items.0.title"),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(editor.notices()[0].level, NoticeLevel::Error);
        assert_eq!(editor.len(Group::Services), 1);
    }

    #[tokio::test]
    async fn store_failure_offers_download_and_keeps_edits() {
        let backend = seeded_backend();
        let mut editor = editor(backend.clone()).await;
        editor.document_mut().hero.title = "Nouveau".into();
        backend.set_unavailable(true);

        let outcome = editor.submit().await.unwrap();
        let SubmitOutcome::DownloadOffered(download) = outcome else {
            panic!("expected a download");
        };
        assert_eq!(download.file_name, "content.json");
        let offered: ContentDocument = serde_json::from_slice(&download.bytes).unwrap();
        assert_eq!(offered.hero.title, "Nouveau");
        assert_eq!(editor.document().hero.title, "Nouveau");
        assert_eq!(editor.drain_notices()[0].level, NoticeLevel::Warning);

        backend.set_unavailable(false);
        assert_eq!(editor.submit().await.unwrap(), SubmitOutcome::Saved);
    }

    #[tokio::test]
    async fn export_is_always_available() {
        let editor = editor(seeded_backend()).await;
        let download = editor.export().unwrap();
        assert!(String::from_utf8(download.bytes).unwrap().contains("IRM 3T"));
    }

    #[tokio::test]
    async fn only_newly_added_featured_articles_are_reported() {
        let analytics = Arc::new(AnalyticsAggregator::in_memory());
        let mut editor = editor(seeded_backend()).await.with_analytics(analytics.clone());
        let i = editor.append_blank(Group::Articles);
        editor.document_mut().articles[i].title = "Scanner faible dose".into();
        editor.push_article(Article {
            title: "Brouillon".into(),
            publish_date: "2024-05-01".into(),
            featured: false,
            ..Default::default()
        });

        editor.submit().await.unwrap();
        editor.submit().await.unwrap();

        let log = analytics.counters().await.unwrap().activity_log;
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, ActivityKind::Article);
        assert_eq!(log[0].action, "Article published: \"Scanner faible dose\"");
    }

    #[tokio::test]
    async fn successful_upload_sets_url_and_tracks() {
        let analytics = Arc::new(AnalyticsAggregator::in_memory());
        let mut editor = editor(seeded_backend()).await.with_analytics(analytics.clone());
        let field: MediaField = "doctors.members.1.image".parse().unwrap();

        let outcome = editor
            .attach_upload(&field, &FixedUploader(Ok("dr_1.png")), png())
            .await
            .unwrap();
        assert_eq!(outcome, AttachOutcome::Stored("/uploads/dr_1.png".into()));
        assert_eq!(editor.document().doctors.members[1].image, "/uploads/dr_1.png");
        assert!(!editor.is_transient(&field));
        assert_eq!(analytics.counters().await.unwrap().media_upload_count, 1);
    }

    #[tokio::test]
    async fn failed_upload_falls_back_to_preview() {
        let mut editor = editor(seeded_backend()).await;
        let field = MediaField::HeroBackground;

        let outcome = editor
            .attach_upload(&field, &FixedUploader(Err(())), png())
            .await
            .unwrap();
        assert_eq!(outcome, AttachOutcome::Preview);
        assert_eq!(
            editor.document().hero.background_image,
            "data:image/png;base64,iVBORw=="
        );
        assert!(editor.is_transient(&field));
        assert_eq!(editor.drain_notices()[0].level, NoticeLevel::Warning);

        editor
            .attach_upload(&field, &FixedUploader(Ok("hero.png")), png())
            .await
            .unwrap();
        assert!(!editor.is_transient(&field));
    }

    #[tokio::test]
    async fn upload_to_missing_entry_is_rejected_up_front() {
        let mut editor = editor(seeded_backend()).await;
        let err = editor
            .attach_upload(&MediaField::ArticleImage(5), &FixedUploader(Ok("x.png")), png())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EditorError::IndexOutOfRange {
                group: Group::Articles,
                index: 5,
                len: 1
            }
        ));
    }

    #[tokio::test]
    async fn transient_markers_follow_removals() {
        let mut editor = editor(seeded_backend()).await;
        editor.append_blank(Group::Gallery);
        editor.append_blank(Group::Gallery);
        editor
            .attach_upload(&MediaField::GalleryImage(1), &FixedUploader(Err(())), png())
            .await
            .unwrap();

        editor.remove_at(Group::Gallery, 0).unwrap();
        assert!(editor.is_transient(&MediaField::GalleryImage(0)));
        editor.remove_at(Group::Gallery, 0).unwrap();
        assert_eq!(editor.transient_fields().count(), 0);
    }

    #[tokio::test]
    async fn transient_markers_follow_entries_dropped_on_submit() {
        let mut editor = editor(seeded_backend()).await;
        editor.append_blank(Group::Gallery);
        editor.append_blank(Group::Gallery);
        editor
            .attach_upload(&MediaField::GalleryImage(1), &FixedUploader(Err(())), png())
            .await
            .unwrap();

        assert_eq!(editor.submit().await.unwrap(), SubmitOutcome::Saved);
        assert_eq!(
            editor.document().gallery.images,
            vec!["data:image/png;base64,iVBORw==".to_string()]
        );
        assert!(editor.is_transient(&MediaField::GalleryImage(0)));
        assert!(!editor.is_transient(&MediaField::GalleryImage(1)));

        editor
            .attach_upload(&MediaField::GalleryImage(0), &FixedUploader(Ok("g.png")), png())
            .await
            .unwrap();
        assert_eq!(editor.transient_fields().count(), 0);
    }
}
