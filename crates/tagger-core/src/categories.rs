//! Structured encoding of the `Categories` attribute
//!
//! `Categories` persists as a single string wrapping an ordered tag list:
//! `<Categories><Category Assigned="1">tag</Category>...</Categories>`.
//! The `Assigned` number is a 1-based position recomputed at every write,
//! not a stable identifier.

/// Encode an ordered tag list into the stored `Categories` form.
pub fn encode_categories<'a, I>(tags: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut encoded = String::from("<Categories>");
    for (index, tag) in tags.into_iter().enumerate() {
        encoded.push_str(&format!(
            "<Category Assigned=\"{}\">{}</Category>",
            index + 1,
            tag
        ));
    }
    encoded.push_str("</Categories>");
    encoded
}

/// Decode a stored `Categories` value back into its flat tag list,
/// ignoring the position numbers.
///
/// A value with no `<Category>` entries at all is treated as one bare tag;
/// stores written by other tools sometimes hold the tag text directly.
pub fn decode_categories(value: &str) -> Vec<String> {
    let mut tags = Vec::new();
    let mut found_entry = false;

    let mut rest = value;
    while let Some(start) = rest.find("<Category") {
        let after_open = &rest[start..];
        let Some(open_end) = after_open.find('>') else {
            break;
        };
        let body = &after_open[open_end + 1..];
        let Some(close) = body.find("</Category>") else {
            break;
        };
        found_entry = true;
        let tag = &body[..close];
        if !tag.is_empty() {
            tags.push(tag.to_string());
        }
        rest = &body[close + "</Category>".len()..];
    }

    if !found_entry {
        let bare = value.trim();
        if !bare.is_empty() && !bare.starts_with("<Categories") {
            tags.push(bare.to_string());
        }
    }

    tags
}
