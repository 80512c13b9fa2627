//! Stored file names for uploads.
//!
//! `<sanitized stem>_<millis><extension>`, where every character outside
//! `[A-Za-z0-9-_]` becomes `_` and a missing extension becomes `.bin`.

pub const DEFAULT_EXTENSION: &str = ".bin";

const FALLBACK_STEM: &str = "file";

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

/// Replace every character outside `[A-Za-z0-9-_]` with `_`.
pub fn sanitize(raw: &str) -> String {
    raw.chars().map(|c| if is_safe(c) { c } else { '_' }).collect()
}

/// Split an uploaded file name into stem and extension (with its dot).
///
/// Directory components are ignored. A leading dot does not start an
/// extension (`.env` has none) and neither does a trailing one.
pub fn split_name(original: &str) -> (&str, Option<&str>) {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original);
    match base.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < base.len() => (&base[..idx], Some(&base[idx..])),
        Some(idx) if idx > 0 => (&base[..idx], None),
        _ => (base, None),
    }
}

/// Build the stored file name for `original` uploaded at `millis`.
pub fn stored_name(original: &str, millis: i64) -> String {
    let (stem, ext) = split_name(original);
    let mut base = sanitize(stem);
    if base.is_empty() {
        base.push_str(FALLBACK_STEM);
    }
    let ext = match ext {
        Some(ext) => format!(".{}", sanitize(&ext[1..])),
        None => DEFAULT_EXTENSION.to_string(),
    };
    format!("{base}_{millis}{ext}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn only_safe_chars(name: &str) -> bool {
        name.chars().all(|c| is_safe(c) || c == '.')
    }

    #[test]
    fn keeps_extension_case_and_replaces_unsafe_chars() {
        let name = stored_name("Étude Résultats.PDF", 1_700_000_000_123);
        assert_eq!(name, "_tude_R_sultats_1700000000123.PDF");
        assert!(only_safe_chars(&name));
    }

    #[test]
    fn missing_extension_defaults_to_bin() {
        assert_eq!(stored_name("scan", 5), "scan_5.bin");
        assert_eq!(stored_name(".env", 5), "_env_5.bin");
        assert_eq!(stored_name("trailing.", 5), "trailing_5.bin");
    }

    #[test]
    fn directory_components_are_dropped() {
        assert_eq!(stored_name("../../etc/passwd", 7), "passwd_7.bin");
        assert_eq!(stored_name("C:\\Users\\me\\photo.jpg", 7), "photo_7.jpg");
    }

    #[test]
    fn only_last_dot_starts_the_extension() {
        assert_eq!(stored_name("irm.coupe.3d.webp", 9), "irm_coupe_3d_9.webp");
    }

    #[test]
    fn empty_stem_gets_placeholder() {
        assert_eq!(stored_name("", 1), "file_1.bin");
    }

    #[test]
    fn many_names_stay_safe() {
        for original in [
            "photo (1).jpeg",
            "vidéo été 2024.mp4",
            "a\u{0}b.png",
            "名前.gif",
            "x y z",
            "tab\tname.webm",
        ] {
            let name = stored_name(original, 42);
            assert!(only_safe_chars(&name), "{original:?} -> {name:?}");
            match split_name(original).1 {
                Some(ext) => assert!(name.ends_with(&format!(".{}", sanitize(&ext[1..])))),
                None => assert!(name.ends_with(DEFAULT_EXTENSION)),
            }
        }
    }
}
