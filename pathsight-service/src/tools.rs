//! Capability types for the function-dispatch protocol.
//!
//! This module contains:
//! - The closed set of capability names
//! - The invocation method split between the analysis services
//! - The normalized capability result type
//! - Submodules for the registry and the remote client

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

pub mod client;
pub mod registry;

pub use client::{AnalysisClient, AnalysisError};
pub use registry::{CapabilityMetadata, CapabilityRegistry};

/// All capability names as an exhaustive enum.
///
/// The string form is derived via strum, so the name the LLM is prompted
/// with, the registry key, and the config endpoint key can never drift apart.
/// Adding a capability requires:
/// 1. Add variant here
/// 2. Register metadata in `registry.rs` (compile error if missing due to
///    exhaustive match)
/// 3. Add a default endpoint in `config.rs` and a line to the chat system
///    prompt
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, EnumIter, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CapabilityName {
    /// Cancer subtype classification (Conch)
    GetCancerSubtype,
    /// Morphology similarity search (Virchow)
    GetBestImage,
    /// Image segmentation (MedSAM)
    GetSegmentationRun,
}

/// HTTP method used to invoke an analysis service.
///
/// Segmentation runs mutate service-side state (they write the segmented
/// output back to storage), so they go over POST; classification and
/// similarity lookups are reads and go over GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationMethod {
    Get,
    Post,
}

/// Normalized outcome of a capability invocation.
///
/// Handlers never fail across the dispatcher boundary: every failure mode is
/// folded into an error-flavored `raw_text` so the interpretation pass can
/// still run and explain what happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityResult {
    pub raw_text: String,
    pub is_error: bool,
}

impl CapabilityResult {
    pub fn ok(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            is_error: false,
        }
    }

    pub fn error(raw_text: impl Into<String>) -> Self {
        Self {
            raw_text: raw_text.into(),
            is_error: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_capability_name_string_conversion() {
        assert_eq!(
            CapabilityName::GetCancerSubtype.to_string(),
            "get_cancer_subtype"
        );
        assert_eq!(CapabilityName::GetBestImage.to_string(), "get_best_image");
        assert_eq!(
            CapabilityName::GetSegmentationRun.to_string(),
            "get_segmentation_run"
        );
    }

    #[test]
    fn test_capability_name_from_string() {
        assert_eq!(
            CapabilityName::from_str("get_cancer_subtype").unwrap(),
            CapabilityName::GetCancerSubtype
        );
        assert!(CapabilityName::from_str("get_weather").is_err());
    }

    #[test]
    fn test_capability_name_matching_is_case_sensitive() {
        assert!(CapabilityName::from_str("Get_Cancer_Subtype").is_err());
        assert!(CapabilityName::from_str("GET_CANCER_SUBTYPE").is_err());
    }
}
