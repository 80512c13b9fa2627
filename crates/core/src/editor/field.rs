use std::fmt;
use std::str::FromStr;

use crate::content::model::ContentDocument;

use super::Group;

/// A document slot that holds a media URL and can receive an upload.
///
/// Parsed from and displayed as the dotted path used by the form, e.g.
/// `hero.backgroundImage`, `doctors.members.2.image` or `media.0.images.1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaField {
    SiteLogo,
    SiteFavicon,
    HeroBackground,
    WhyChooseImage,
    FeaturedDepartmentImage,
    TeamVideo,
    ServiceImage(usize),
    DoctorImage(usize),
    GalleryImage(usize),
    DepartmentImage(usize),
    ArticleImage(usize),
    ArticleVideo(usize),
    MediaSource(usize),
    MediaImage(usize, usize),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a media field: {0:?}")]
pub struct UnknownField(pub String);

impl FromStr for MediaField {
    type Err = UnknownField;

    fn from_str(path: &str) -> Result<Self, Self::Err> {
        fn index(path: &str, raw: &str) -> Result<usize, UnknownField> {
            raw.parse().map_err(|_| UnknownField(path.to_string()))
        }

        let parts: Vec<&str> = path.split('.').collect();
        let field = match parts.as_slice() {
            ["site", "logo"] => MediaField::SiteLogo,
            ["site", "favicon"] => MediaField::SiteFavicon,
            ["hero", "backgroundImage"] => MediaField::HeroBackground,
            ["whyChoose", "image"] => MediaField::WhyChooseImage,
            ["departments", "featured", "image"] => MediaField::FeaturedDepartmentImage,
            ["team", "video"] => MediaField::TeamVideo,
            ["services", "items", i, "image"] => MediaField::ServiceImage(index(path, i)?),
            ["doctors", "members", i, "image"] => MediaField::DoctorImage(index(path, i)?),
            ["gallery", "images", i] => MediaField::GalleryImage(index(path, i)?),
            ["departments", "items", i, "image"] => MediaField::DepartmentImage(index(path, i)?),
            ["articles", i, "image"] => MediaField::ArticleImage(index(path, i)?),
            ["articles", i, "video"] => MediaField::ArticleVideo(index(path, i)?),
            ["media", i, "media"] => MediaField::MediaSource(index(path, i)?),
            ["media", i, "images", j] => MediaField::MediaImage(index(path, i)?, index(path, j)?),
            _ => return Err(UnknownField(path.to_string())),
        };
        Ok(field)
    }
}

impl fmt::Display for MediaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaField::SiteLogo => f.write_str("site.logo"),
            MediaField::SiteFavicon => f.write_str("site.favicon"),
            MediaField::HeroBackground => f.write_str("hero.backgroundImage"),
            MediaField::WhyChooseImage => f.write_str("whyChoose.image"),
            MediaField::FeaturedDepartmentImage => f.write_str("departments.featured.image"),
            MediaField::TeamVideo => f.write_str("team.video"),
            MediaField::ServiceImage(i) => write!(f, "services.items.{i}.image"),
            MediaField::DoctorImage(i) => write!(f, "doctors.members.{i}.image"),
            MediaField::GalleryImage(i) => write!(f, "gallery.images.{i}"),
            MediaField::DepartmentImage(i) => write!(f, "departments.items.{i}.image"),
            MediaField::ArticleImage(i) => write!(f, "articles.{i}.image"),
            MediaField::ArticleVideo(i) => write!(f, "articles.{i}.video"),
            MediaField::MediaSource(i) => write!(f, "media.{i}.media"),
            MediaField::MediaImage(i, j) => write!(f, "media.{i}.images.{j}"),
        }
    }
}

/// Why a slot could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MissingEntry {
    pub group: Group,
    pub index: usize,
    pub len: usize,
}

impl MediaField {
    /// The repeatable entry this field lives in, if any.
    pub fn entry(&self) -> Option<(Group, usize)> {
        match *self {
            MediaField::ServiceImage(i) => Some((Group::Services, i)),
            MediaField::DoctorImage(i) => Some((Group::Doctors, i)),
            MediaField::GalleryImage(i) => Some((Group::Gallery, i)),
            MediaField::DepartmentImage(i) => Some((Group::Departments, i)),
            MediaField::ArticleImage(i) | MediaField::ArticleVideo(i) => {
                Some((Group::Articles, i))
            }
            MediaField::MediaSource(i) | MediaField::MediaImage(i, _) => Some((Group::Media, i)),
            _ => None,
        }
    }

    /// The same field after entry `removed` of `group` was deleted: `None`
    /// when the field belonged to that entry, shifted down when it came
    /// after it.
    pub fn after_removal(&self, group: Group, removed: usize) -> Option<MediaField> {
        let Some((g, i)) = self.entry() else {
            return Some(self.clone());
        };
        if g != group || i < removed {
            return Some(self.clone());
        }
        if i == removed {
            return None;
        }
        let i = i - 1;
        Some(match *self {
            MediaField::ServiceImage(_) => MediaField::ServiceImage(i),
            MediaField::DoctorImage(_) => MediaField::DoctorImage(i),
            MediaField::GalleryImage(_) => MediaField::GalleryImage(i),
            MediaField::DepartmentImage(_) => MediaField::DepartmentImage(i),
            MediaField::ArticleImage(_) => MediaField::ArticleImage(i),
            MediaField::ArticleVideo(_) => MediaField::ArticleVideo(i),
            MediaField::MediaSource(_) => MediaField::MediaSource(i),
            MediaField::MediaImage(_, j) => MediaField::MediaImage(i, j),
            ref other => other.clone(),
        })
    }

    /// The current value of the slot, if the slot exists and is set.
    pub fn value<'a>(&self, doc: &'a ContentDocument) -> Option<&'a str> {
        let value = match *self {
            MediaField::SiteLogo => doc.site.logo.as_deref()?,
            MediaField::SiteFavicon => doc.site.favicon.as_deref()?,
            MediaField::HeroBackground => &doc.hero.background_image,
            MediaField::WhyChooseImage => &doc.why_choose.image,
            MediaField::FeaturedDepartmentImage => &doc.departments.featured.image,
            MediaField::TeamVideo => &doc.team.video,
            MediaField::ServiceImage(i) => doc.services.items.get(i)?.image.as_deref()?,
            MediaField::DoctorImage(i) => &doc.doctors.members.get(i)?.image,
            MediaField::GalleryImage(i) => doc.gallery.images.get(i)?,
            MediaField::DepartmentImage(i) => doc.departments.items.get(i)?.image.as_deref()?,
            MediaField::ArticleImage(i) => doc.articles.get(i)?.image.as_deref()?,
            MediaField::ArticleVideo(i) => doc.articles.get(i)?.video.as_deref()?,
            MediaField::MediaSource(i) => &doc.media.get(i)?.media,
            MediaField::MediaImage(i, j) => doc.media.get(i)?.images.as_ref()?.get(j)?,
        };
        Some(value)
    }

    /// Every media field that exists in `doc`.
    pub fn all_in(doc: &ContentDocument) -> Vec<MediaField> {
        let mut fields = vec![
            MediaField::SiteLogo,
            MediaField::SiteFavicon,
            MediaField::HeroBackground,
            MediaField::WhyChooseImage,
            MediaField::FeaturedDepartmentImage,
            MediaField::TeamVideo,
        ];
        fields.extend((0..doc.services.items.len()).map(MediaField::ServiceImage));
        fields.extend((0..doc.doctors.members.len()).map(MediaField::DoctorImage));
        fields.extend((0..doc.gallery.images.len()).map(MediaField::GalleryImage));
        fields.extend((0..doc.departments.items.len()).map(MediaField::DepartmentImage));
        for i in 0..doc.articles.len() {
            fields.push(MediaField::ArticleImage(i));
            fields.push(MediaField::ArticleVideo(i));
        }
        for (i, item) in doc.media.iter().enumerate() {
            fields.push(MediaField::MediaSource(i));
            let images = item.images.as_ref().map_or(0, Vec::len);
            fields.extend((0..images).map(|j| MediaField::MediaImage(i, j)));
        }
        fields
    }

    /// Borrow the URL slot in `doc`.
    ///
    /// Gallery images and media images may address one past the end, which
    /// appends an empty slot.
    pub fn slot<'a>(&self, doc: &'a mut ContentDocument) -> Result<&'a mut String, MissingEntry> {
        fn at<T>(items: &mut [T], group: Group, index: usize) -> Result<&mut T, MissingEntry> {
            let len = items.len();
            items.get_mut(index).ok_or(MissingEntry { group, index, len })
        }
        fn appendable(
            items: &mut Vec<String>,
            group: Group,
            index: usize,
        ) -> Result<&mut String, MissingEntry> {
            if index == items.len() {
                items.push(String::new());
            }
            at(items, group, index)
        }

        let slot = match *self {
            MediaField::SiteLogo => doc.site.logo.get_or_insert_with(String::new),
            MediaField::SiteFavicon => doc.site.favicon.get_or_insert_with(String::new),
            MediaField::HeroBackground => &mut doc.hero.background_image,
            MediaField::WhyChooseImage => &mut doc.why_choose.image,
            MediaField::FeaturedDepartmentImage => &mut doc.departments.featured.image,
            MediaField::TeamVideo => &mut doc.team.video,
            MediaField::ServiceImage(i) => at(&mut doc.services.items, Group::Services, i)?
                .image
                .get_or_insert_with(String::new),
            MediaField::DoctorImage(i) => {
                &mut at(&mut doc.doctors.members, Group::Doctors, i)?.image
            }
            MediaField::GalleryImage(i) => appendable(&mut doc.gallery.images, Group::Gallery, i)?,
            MediaField::DepartmentImage(i) => {
                at(&mut doc.departments.items, Group::Departments, i)?
                    .image
                    .get_or_insert_with(String::new)
            }
            MediaField::ArticleImage(i) => at(&mut doc.articles, Group::Articles, i)?
                .image
                .get_or_insert_with(String::new),
            MediaField::ArticleVideo(i) => at(&mut doc.articles, Group::Articles, i)?
                .video
                .get_or_insert_with(String::new),
            MediaField::MediaSource(i) => &mut at(&mut doc.media, Group::Media, i)?.media,
            MediaField::MediaImage(i, j) => {
                let item = at(&mut doc.media, Group::Media, i)?;
                appendable(item.images.get_or_insert_with(Vec::new), Group::Media, j)?
            }
        };
        Ok(slot)
    }
}
