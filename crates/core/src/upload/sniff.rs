//! Content sniffing: identify image and video files by their leading bytes
//! instead of trusting the client-declared content type.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaCategory {
    Image,
    Video,
}

impl MediaCategory {
    /// Category of a declared MIME type (`image/*` or `video/*`), ignoring
    /// parameters and case.
    pub fn of_declared(mime: &str) -> Option<MediaCategory> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        let (top, sub) = essence.split_once('/')?;
        if sub.is_empty() {
            return None;
        }
        match top {
            "image" => Some(MediaCategory::Image),
            "video" => Some(MediaCategory::Video),
            _ => None,
        }
    }
}

/// A recognized file signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature {
    pub category: MediaCategory,
    pub mime: &'static str,
}

const fn image(mime: &'static str) -> Signature {
    Signature {
        category: MediaCategory::Image,
        mime,
    }
}

const fn video(mime: &'static str) -> Signature {
    Signature {
        category: MediaCategory::Video,
        mime,
    }
}

/// Identify `bytes` as a known image or video format.
pub fn sniff(bytes: &[u8]) -> Option<Signature> {
    let starts = |prefix: &[u8]| bytes.starts_with(prefix);

    if starts(&[0xFF, 0xD8, 0xFF]) {
        return Some(image("image/jpeg"));
    }
    if starts(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some(image("image/png"));
    }
    if starts(b"GIF87a") || starts(b"GIF89a") {
        return Some(image("image/gif"));
    }
    if starts(b"RIFF") && bytes.len() >= 12 {
        return match &bytes[8..12] {
            b"WEBP" => Some(image("image/webp")),
            b"AVI " => Some(video("video/x-msvideo")),
            _ => None,
        };
    }
    if starts(b"II*\0") || starts(b"MM\0*") {
        return Some(image("image/tiff"));
    }
    if starts(&[0x00, 0x00, 0x01, 0x00]) {
        return Some(image("image/x-icon"));
    }
    if starts(b"BM") && bytes.len() >= 14 {
        return Some(image("image/bmp"));
    }
    if bytes.len() >= 12 && &bytes[4..8] == b"ftyp" {
        return Some(iso_media(&bytes[8..12]));
    }
    if starts(&[0x1A, 0x45, 0xDF, 0xA3]) {
        return Some(video("video/webm"));
    }
    if starts(b"OggS") {
        return Some(video("video/ogg"));
    }
    if starts(b"FLV\x01") {
        return Some(video("video/x-flv"));
    }
    if starts(&[0x00, 0x00, 0x01, 0xBA]) || starts(&[0x00, 0x00, 0x01, 0xB3]) {
        return Some(video("video/mpeg"));
    }
    None
}

/// ISO base media files (`ftyp` box): still images for AVIF/HEIF brands,
/// video for everything else.
fn iso_media(brand: &[u8]) -> Signature {
    match brand {
        b"avif" | b"avis" => image("image/avif"),
        b"heic" | b"heix" | b"hevc" | b"heim" | b"heis" | b"mif1" | b"msf1" => {
            image("image/heic")
        }
        b"qt  " => video("video/quicktime"),
        b"3gp4" | b"3gp5" | b"3gp6" | b"3g2a" => video("video/3gpp"),
        _ => video("video/mp4"),
    }
}
