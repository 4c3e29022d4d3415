//! Common types shared across the image tagging pipeline
//!
//! Defines the managed metadata attributes, the pipeline stage names, and the
//! per-image error taxonomy used for failure reporting.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Metadata attributes managed by the tagging pipeline.
///
/// `Categories` is structurally distinct: its stored form is a single encoded
/// string rather than a flat list of tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Keywords,
    Subject,
    TagsList,
    CatalogSets,
    LastKeywordXmp,
    HierarchicalSubject,
    Categories,
}

impl Attribute {
    /// All managed attributes, in write order. The apply stage walks this
    /// list front to back and stops at the first write failure.
    pub const MANAGED: [Attribute; 7] = [
        Attribute::Keywords,
        Attribute::Subject,
        Attribute::TagsList,
        Attribute::CatalogSets,
        Attribute::LastKeywordXmp,
        Attribute::HierarchicalSubject,
        Attribute::Categories,
    ];

    /// The attribute name as the metadata tool spells it.
    pub fn tool_name(&self) -> &'static str {
        match self {
            Attribute::Keywords => "Keywords",
            Attribute::Subject => "Subject",
            Attribute::TagsList => "TagsList",
            Attribute::CatalogSets => "CatalogSets",
            Attribute::LastKeywordXmp => "LastKeywordXMP",
            Attribute::HierarchicalSubject => "HierarchicalSubject",
            Attribute::Categories => "Categories",
        }
    }

    /// Whether the stored value is a single encoded string instead of a
    /// flat list of tags.
    pub fn is_structured(&self) -> bool {
        matches!(self, Attribute::Categories)
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tool_name())
    }
}

/// One step of the per-image pipeline, used for failure attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Optimize,
    Describe,
    Generate,
    Translate,
    Apply,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Optimize => "optimize",
            Stage::Describe => "describe",
            Stage::Generate => "generate",
            Stage::Translate => "translate",
            Stage::Apply => "apply",
        };
        f.write_str(name)
    }
}

/// Why a tag-producing inference stage yielded no usable tag list.
#[derive(Debug, Error)]
pub enum TagFailure {
    #[error("model returned no response")]
    Absent,

    #[error("response was not valid JSON: {0}")]
    Malformed(String),

    #[error("model returned an empty tag list")]
    Empty,
}

/// Failure signal from the metadata store adapter.
///
/// Distinct from an attribute simply being absent: an absent attribute reads
/// back as an empty value list, never as this error.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Per-image pipeline failure. Local and non-fatal to the overall run: one
/// image failing never stops processing of subsequent images.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to optimize image: {0}")]
    Optimize(String),

    #[error("vision model produced no description")]
    Describe,

    #[error("tag generation failed: {0}")]
    Generate(#[source] TagFailure),

    #[error("tag translation failed: {0}")]
    Translate(#[source] TagFailure),

    #[error("failed to write attribute {attribute}: {source}")]
    Apply {
        attribute: Attribute,
        #[source]
        source: StoreError,
    },
}

impl StageError {
    /// The stage this failure occurred in.
    pub fn stage(&self) -> Stage {
        match self {
            StageError::Optimize(_) => Stage::Optimize,
            StageError::Describe => Stage::Describe,
            StageError::Generate(_) => Stage::Generate,
            StageError::Translate(_) => Stage::Translate,
            StageError::Apply { .. } => Stage::Apply,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_managed_attribute_order() {
        // Categories must come last so that every flat attribute is written
        // before the structured one.
        assert_eq!(Attribute::MANAGED.len(), 7);
        assert_eq!(Attribute::MANAGED[0], Attribute::Keywords);
        assert_eq!(Attribute::MANAGED[6], Attribute::Categories);
    }

    #[test]
    fn test_tool_name_spelling() {
        assert_eq!(Attribute::LastKeywordXmp.tool_name(), "LastKeywordXMP");
        assert_eq!(Attribute::TagsList.tool_name(), "TagsList");
    }

    #[test]
    fn test_only_categories_is_structured() {
        for attr in Attribute::MANAGED {
            assert_eq!(attr.is_structured(), attr == Attribute::Categories);
        }
    }

    #[test]
    fn test_stage_attribution() {
        let err = StageError::Apply {
            attribute: Attribute::Subject,
            source: StoreError("exit status 1".to_string()),
        };
        assert_eq!(err.stage(), Stage::Apply);
        assert!(err.to_string().contains("Subject"));
    }
}
