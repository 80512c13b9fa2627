use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::icon::{self, Icon};

/// The single site content document edited by the admin panel.
///
/// Every section has a default so readers never deal with missing sections.
/// Top-level keys this schema does not know about are kept in `extra` and
/// written back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentDocument {
    pub site: Site,
    pub contact: Contact,
    pub navigation: Navigation,
    pub hero: Hero,
    pub why_choose: WhyChoose,
    pub services: Services,
    pub doctors: Doctors,
    pub gallery: Gallery,
    pub contact_info: ContactInfo,
    pub appointment: Appointment,
    pub business_hours: BusinessHours,
    pub departments: Departments,
    pub faq: Faq,
    pub team: Team,
    pub footer: Footer,
    pub articles: Vec<Article>,
    pub media: Vec<MediaItem>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Site {
    pub title: String,
    pub subtitle: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favicon: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Contact {
    pub email: String,
    pub phones: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Navigation {
    pub logo: String,
    pub menu_items: Vec<MenuItem>,
    pub cta_button: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MenuItem {
    pub label: String,
    pub href: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Hero {
    pub title: String,
    pub subtitle: String,
    pub background_image: String,
    pub cta_buttons: CtaButtons,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtaButtons {
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhyChoose {
    pub title: String,
    pub description: String,
    pub image: String,
    pub features: Vec<WhyChooseFeature>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhyChooseFeature {
    pub title: String,
    pub description: String,
    #[serde(
        deserialize_with = "icon::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon: Option<Icon>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Services {
    pub title: String,
    pub subtitle: String,
    pub items: Vec<Service>,
}

/// A service card. Order in `Services::items` is display order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Service {
    pub title: String,
    pub description: String,
    #[serde(
        deserialize_with = "icon::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon: Option<Icon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Doctors {
    pub title: String,
    pub subtitle: String,
    pub members: Vec<Doctor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Doctor {
    pub name: String,
    pub specialty: String,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Gallery {
    pub title: String,
    pub subtitle: String,
    /// Image URLs.
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactInfo {
    pub title: String,
    pub subtitle: String,
    pub address: AddressBlock,
    pub email: LabeledValue,
    pub phone: LabeledValue,
    pub form: ContactForm,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AddressBlock {
    pub title: String,
    pub line1: String,
    pub line2: String,
    pub line3: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabeledValue {
    pub title: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactForm {
    pub fields: ContactFormFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactFormFields {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Appointment {
    pub title: String,
    pub subtitle: String,
    pub form: AppointmentForm,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppointmentForm {
    pub submit_text: String,
    pub fields: AppointmentFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppointmentFields {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub date: String,
    pub time: String,
    pub department: String,
    pub doctor: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessHours {
    pub weekdays: OpeningHours,
    pub saturday: OpeningHours,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpeningHours {
    pub days: String,
    pub hours: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Departments {
    pub title: String,
    pub subtitle: String,
    pub featured: FeaturedDepartment,
    pub items: Vec<Department>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeaturedDepartment {
    pub title: String,
    pub description: String,
    pub image: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Department {
    pub title: String,
    #[serde(
        deserialize_with = "icon::lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub icon: Option<Icon>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Faq {
    pub title: String,
    pub subtitle: String,
    pub questions: Vec<FaqEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaqEntry {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Team {
    pub title: String,
    pub subtitle: String,
    pub video: String,
    pub features: Vec<TeamFeature>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamFeature {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Footer {
    pub company_info: CompanyInfo,
    pub blog: FooterBlog,
    pub social_links: SocialLinks,
    pub copyright: String,
    pub credits: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CompanyInfo {
    pub name: String,
    pub full_name: String,
    pub address: PostalAddress,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostalAddress {
    pub line1: String,
    pub line2: String,
    pub line3: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FooterBlog {
    pub title: String,
    pub description: String,
    pub placeholder: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SocialLinks {
    pub facebook: String,
    pub linkedin: String,
    pub instagram: String,
    pub twitter: String,
}

/// A scientific article.
///
/// `id` is assigned once when the article is created (`article-<millis>`) and
/// is unique within the document. Only `featured` articles are listed
/// publicly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Article {
    pub id: String,
    pub title: String,
    pub excerpt: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub video: Option<String>,
    pub author: String,
    /// Date string, `YYYY-MM-DD`.
    pub publish_date: String,
    pub category: ArticleCategory,
    pub featured: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArticleCategory {
    #[default]
    Technologie,
    Innovation,
    Technique,
    Organisation,
    #[serde(rename = "Qualité")]
    Qualite,
    Recherche,
}

/// A media appearance: interview, conference, campaign, ...
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MediaItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub content: String,
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// YouTube link or URL of an uploaded video/image.
    pub media: String,
    pub media_type: MediaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    pub featured: bool,
    pub order: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Interview,
    Conference,
    Workshop,
    Campaign,
    Course,
    Seminar,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Youtube,
    Video,
    #[default]
    Image,
}
