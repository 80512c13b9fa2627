//! Fill-missing-with-default merge for stored content documents.
//!
//! The typed default skeleton (`ContentDocument::default()`) is the single
//! place where every section's default lives. A stored document is merged
//! over it before deserialization, so a document written by an older editor
//! that lacks whole sections still loads.

use serde_json::Value;

use super::model::ContentDocument;

/// Recursively fill keys that are absent or `null` in `stored` from
/// `defaults`.
///
/// Objects are merged key by key. Arrays and scalars present in `stored` are
/// kept as they are, even when empty. Keys that only exist in `stored` are
/// kept.
pub fn fill_missing(stored: Value, defaults: &Value) -> Value {
    match (stored, defaults) {
        (Value::Null, default) => default.clone(),
        (Value::Object(mut map), Value::Object(default_map)) => {
            for (key, default_value) in default_map {
                match map.get_mut(key) {
                    Some(existing) => {
                        let current = existing.take();
                        *existing = fill_missing(current, default_value);
                    }
                    None => {
                        map.insert(key.clone(), default_value.clone());
                    }
                }
            }
            Value::Object(map)
        }
        (stored, _) => stored,
    }
}

/// The default skeleton as JSON: all-empty strings and sequences.
pub fn default_skeleton() -> Value {
    serde_json::to_value(ContentDocument::default()).unwrap_or(Value::Null)
}

/// Merge a raw stored document with the default skeleton and decode it.
pub fn merge_with_defaults(raw: Value) -> Result<ContentDocument, serde_json::Error> {
    let merged = fill_missing(raw, &default_skeleton());
    serde_json::from_value(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_sections_are_filled() {
        let doc = merge_with_defaults(json!({"site": {"title": "BIC"}})).unwrap();
        assert_eq!(doc.site.title, "BIC");
        assert_eq!(doc.site.subtitle, "");
        assert!(doc.contact.phones.is_empty());
        assert!(doc.articles.is_empty());
        assert_eq!(doc.footer.company_info.address.line1, "");
    }

    #[test]
    fn null_is_treated_as_missing() {
        let merged = fill_missing(
            json!({"departments": null, "faq": {"title": null}}),
            &json!({"departments": {"title": ""}, "faq": {"title": "", "questions": []}}),
        );
        assert_eq!(
            merged,
            json!({"departments": {"title": ""}, "faq": {"title": "", "questions": []}})
        );
    }

    #[test]
    fn stored_arrays_and_scalars_win() {
        let merged = fill_missing(
            json!({"contact": {"phones": [], "email": "a@b.tn"}}),
            &json!({"contact": {"phones": ["x"], "email": ""}}),
        );
        assert_eq!(merged, json!({"contact": {"phones": [], "email": "a@b.tn"}}));
    }

    #[test]
    fn unknown_keys_are_kept() {
        let merged = fill_missing(json!({"seo": {"metaTitle": "t"}}), &json!({"site": {}}));
        assert_eq!(merged, json!({"seo": {"metaTitle": "t"}, "site": {}}));
    }

    #[test]
    fn wrong_types_fail_to_decode() {
        assert!(merge_with_defaults(json!({"contact": {"phones": "71 000 000"}})).is_err());
    }
}
