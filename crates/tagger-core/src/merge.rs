//! Tag merge engine
//!
//! Folds newly produced tags into each managed attribute's current values
//! and writes the replacement set through the metadata store. The attribute
//! loop is fail-fast: the first failed write stops the merge, later
//! attributes are not attempted, and the failing attribute is reported.

use crate::categories::{decode_categories, encode_categories};
use crate::services::MetadataStore;
use image_tagger_common::{Attribute, StageError};
use std::collections::HashSet;
use std::path::Path;
use tracing::{debug, info};

/// Order a merged tag set for writing.
///
/// Tags prefixed with `People` come first and keep their original casing;
/// every other tag follows, case-folded to lowercase. Within each group the
/// order is first-seen: `existing` in store order, then `fresh` in
/// generation order. Duplicates compare post-normalization, so a re-tagged
/// word differing only in case collapses to one entry.
pub fn order_tags(existing: &[String], fresh: &[String]) -> Vec<String> {
    let mut ordered = Vec::new();
    let mut seen = HashSet::new();

    for tag in existing.iter().chain(fresh) {
        if tag.starts_with("People") && seen.insert(tag.clone()) {
            ordered.push(tag.clone());
        }
    }

    for tag in existing.iter().chain(fresh) {
        if tag.starts_with("People") {
            continue;
        }
        let lowered = tag.to_lowercase();
        if seen.insert(lowered.clone()) {
            ordered.push(lowered);
        }
    }

    ordered
}

/// Compute the replacement value set for one attribute.
///
/// `Categories` is fully regenerated: its current values are decoded back
/// into bare tags, unioned with the new tags, and re-encoded as a single
/// string with fresh positions. Every other attribute is the ordered union
/// of its current values and the new tags.
pub fn merge_attribute(attribute: Attribute, current: &[String], tags: &[String]) -> Vec<String> {
    if attribute.is_structured() {
        let prior: Vec<String> = current
            .iter()
            .flat_map(|value| decode_categories(value))
            .collect();
        let ordered = order_tags(&prior, tags);
        vec![encode_categories(ordered.iter().map(String::as_str))]
    } else {
        order_tags(current, tags)
    }
}

/// Merge and write every managed attribute, in order.
///
/// A read or write failure on any attribute aborts the remaining ones;
/// writes already committed stay committed. With `dry_run` set the merge
/// still reads and computes every replacement set but writes nothing.
pub async fn apply_tags(
    store: &dyn MetadataStore,
    path: &Path,
    tags: &[String],
    dry_run: bool,
) -> Result<(), StageError> {
    for attribute in Attribute::MANAGED {
        let current = store
            .get_attribute(path, attribute)
            .await
            .map_err(|source| StageError::Apply { attribute, source })?;

        let values = merge_attribute(attribute, &current, tags);

        if dry_run {
            info!("dry-run: would write {attribute} = {values:?}");
            continue;
        }

        debug!("writing {attribute} ({} values)", values.len());
        store
            .replace_attribute(path, attribute, &values)
            .await
            .map_err(|source| StageError::Apply { attribute, source })?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_people_tags_lead_in_seen_order() {
        let ordered = order_tags(
            &tags(&["zebra", "People|Ann Smith"]),
            &tags(&["apple", "People|Bob"]),
        );
        assert_eq!(
            ordered,
            tags(&["People|Ann Smith", "People|Bob", "zebra", "apple"])
        );
    }

    #[test]
    fn test_people_tags_keep_casing() {
        let ordered = order_tags(&tags(&["People|Ann"]), &tags(&["Sunset"]));
        assert_eq!(ordered, tags(&["People|Ann", "sunset"]));
    }

    #[test]
    fn test_union_drops_duplicates() {
        let ordered = order_tags(&tags(&["cat", "dog"]), &tags(&["dog", "bird"]));
        assert_eq!(ordered, tags(&["cat", "dog", "bird"]));
    }

    #[test]
    fn test_duplicates_compare_after_lowercasing() {
        let ordered = order_tags(&tags(&["Cat"]), &tags(&["cat", "CAT", "dog"]));
        assert_eq!(ordered, tags(&["cat", "dog"]));
    }

    #[test]
    fn test_empty_fresh_set_still_normalizes() {
        // An empty new tag set is not a no-op: existing values are still
        // re-cased and deduplicated.
        let ordered = order_tags(&tags(&["Cat", "cat", "Dog"]), &[]);
        assert_eq!(ordered, tags(&["cat", "dog"]));
    }

    #[test]
    fn test_merge_flat_attribute() {
        let merged = merge_attribute(
            Attribute::Keywords,
            &tags(&["cat", "dog"]),
            &tags(&["dog", "bird"]),
        );
        assert_eq!(merged, tags(&["cat", "dog", "bird"]));
    }

    #[test]
    fn test_merge_categories_regenerates_encoding() {
        let current = vec![
            "<Categories><Category Assigned=\"1\">cat</Category></Categories>".to_string(),
        ];
        let merged = merge_attribute(Attribute::Categories, &current, &tags(&["bird"]));
        assert_eq!(
            merged,
            vec![concat!(
                "<Categories>",
                "<Category Assigned=\"1\">cat</Category>",
                "<Category Assigned=\"2\">bird</Category>",
                "</Categories>"
            )
            .to_string()]
        );
    }

    #[test]
    fn test_merge_categories_is_always_a_single_value() {
        let merged = merge_attribute(Attribute::Categories, &[], &[]);
        assert_eq!(merged, vec!["<Categories></Categories>".to_string()]);
    }
}
