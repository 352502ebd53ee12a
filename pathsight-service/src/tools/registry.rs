//! Immutable capability registry.
//!
//! Built once at startup from configuration and shared by reference into the
//! dispatcher. There is no aliasing and no fuzzy matching: the LLM is
//! prompted with the exact names, and an unrecognized name is a normal miss,
//! not an error.

use std::collections::HashMap;
use std::str::FromStr;

use strum::IntoEnumIterator;

use crate::config::AnalysisConfig;
use crate::error::{ServiceError, ServiceResult};

use super::{CapabilityName, InvocationMethod};

/// Metadata for a registered capability.
#[derive(Debug, Clone)]
pub struct CapabilityMetadata {
    pub name: CapabilityName,

    /// HTTP method the analysis service expects.
    pub method: InvocationMethod,

    /// Endpoint base URL of the backing service.
    pub endpoint: String,

    /// Argument count for direct invocation endpoints. The directive grammar
    /// itself always carries a single argument string.
    pub arity: usize,

    pub description: &'static str,
}

/// Registry of all capabilities, keyed by name.
pub struct CapabilityRegistry {
    capabilities: HashMap<CapabilityName, CapabilityMetadata>,
}

impl CapabilityRegistry {
    /// Build the registry from configuration. Every capability must have an
    /// endpoint; a partial registry would turn LLM-triggered calls into
    /// unexplained misses.
    pub fn from_config(config: &AnalysisConfig) -> ServiceResult<Self> {
        let mut capabilities = HashMap::new();

        for name in CapabilityName::iter() {
            let endpoint = config
                .endpoints
                .get(&name)
                .cloned()
                .ok_or_else(|| ServiceError::Config {
                    message: format!("no analysis endpoint configured for {}", name),
                })?;
            capabilities.insert(name, metadata_for(name, endpoint));
        }

        Ok(Self { capabilities })
    }

    /// Exact, case-sensitive lookup by string name.
    pub fn resolve(&self, name: &str) -> Option<&CapabilityMetadata> {
        CapabilityName::from_str(name)
            .ok()
            .and_then(|n| self.capabilities.get(&n))
    }

    /// Lookup by enum variant.
    pub fn get(&self, name: CapabilityName) -> Option<&CapabilityMetadata> {
        self.capabilities.get(&name)
    }

    /// Number of registered capabilities
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

fn metadata_for(name: CapabilityName, endpoint: String) -> CapabilityMetadata {
    match name {
        CapabilityName::GetCancerSubtype => CapabilityMetadata {
            name,
            method: InvocationMethod::Get,
            endpoint,
            arity: 1,
            description: "Classifies the subtype of cancer shown in an image",
        },
        CapabilityName::GetBestImage => CapabilityMetadata {
            name,
            method: InvocationMethod::Get,
            endpoint,
            arity: 1,
            description: "Finds the stored image most similar to the uploaded image by morphology",
        },
        CapabilityName::GetSegmentationRun => CapabilityMetadata {
            name,
            method: InvocationMethod::Post,
            endpoint,
            arity: 1,
            description: "Segments the image and stores the segmented output",
        },
    }
}
