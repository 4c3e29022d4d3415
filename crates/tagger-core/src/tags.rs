//! Decoding of tag-list responses from the language model
//!
//! The tagger and translator stages both request strict JSON, but models
//! answer in two shapes: a bare array of strings or an object with a `tags`
//! array. The response is decoded exactly once here; any other valid JSON
//! shape yields an empty list, and invalid JSON is a malformed response.

use image_tagger_common::TagFailure;
use serde::Deserialize;

/// Accepted response shapes, tried in order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TagResponse {
    Object { tags: Vec<String> },
    Array(Vec<String>),
    Other(serde_json::Value),
}

/// Decode a raw model response into a tag list.
pub fn decode_tags(raw: &str) -> Result<Vec<String>, TagFailure> {
    match serde_json::from_str::<TagResponse>(raw) {
        Ok(TagResponse::Object { tags }) => Ok(tags),
        Ok(TagResponse::Array(tags)) => Ok(tags),
        Ok(TagResponse::Other(_)) => Ok(Vec::new()),
        Err(err) => Err(TagFailure::Malformed(err.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_with_tags_array() {
        let tags = decode_tags(r#"{"tags": ["lake", "frog"]}"#).unwrap();
        assert_eq!(tags, vec!["lake", "frog"]);
    }

    #[test]
    fn test_bare_array_parses_identically() {
        let tags = decode_tags(r#"["lake", "frog"]"#).unwrap();
        assert_eq!(tags, vec!["lake", "frog"]);
    }

    #[test]
    fn test_other_shapes_yield_empty_list() {
        assert!(decode_tags(r#"{"keywords": ["lake"]}"#).unwrap().is_empty());
        assert!(decode_tags("42").unwrap().is_empty());
        assert!(decode_tags(r#""just a string""#).unwrap().is_empty());
        // Mixed-type arrays do not match the accepted shapes either.
        assert!(decode_tags(r#"["lake", 5]"#).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_json_is_malformed() {
        let err = decode_tags("here are your tags: lake, frog").unwrap_err();
        assert!(matches!(err, TagFailure::Malformed(_)));
    }

    #[test]
    fn test_empty_array_is_ok_but_empty() {
        assert!(decode_tags("[]").unwrap().is_empty());
        assert!(decode_tags(r#"{"tags": []}"#).unwrap().is_empty());
    }
}
