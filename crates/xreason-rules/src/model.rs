//! Ruleset registry data models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ruleset lifecycle status.
///
/// `Deprecated` and `Revoked` are terminal; `Revoked` is reachable from
/// any non-terminal state administratively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulesetStatus {
    Draft,
    PendingReview,
    Approved,
    Active,
    Deprecated,
    Revoked,
}

impl RulesetStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, RulesetStatus::Deprecated | RulesetStatus::Revoked)
    }

    /// Whether the lifecycle state machine permits `self -> next`
    pub fn can_transition_to(self, next: RulesetStatus) -> bool {
        if next == RulesetStatus::Revoked {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (RulesetStatus::Draft, RulesetStatus::PendingReview)
                | (RulesetStatus::PendingReview, RulesetStatus::Approved)
                | (RulesetStatus::Approved, RulesetStatus::Active)
                | (RulesetStatus::Active, RulesetStatus::Deprecated)
        )
    }
}

impl std::fmt::Display for RulesetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RulesetStatus::Draft => "draft",
            RulesetStatus::PendingReview => "pending_review",
            RulesetStatus::Approved => "approved",
            RulesetStatus::Active => "active",
            RulesetStatus::Deprecated => "deprecated",
            RulesetStatus::Revoked => "revoked",
        };
        write!(f, "{name}")
    }
}

/// Where a ruleset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RulesetSource {
    Internal,
    Partner,
    ThirdParty,
    Community,
    Certified,
}

impl std::fmt::Display for RulesetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            RulesetSource::Internal => "internal",
            RulesetSource::Partner => "partner",
            RulesetSource::ThirdParty => "third_party",
            RulesetSource::Community => "community",
            RulesetSource::Certified => "certified",
        };
        write!(f, "{name}")
    }
}

/// Digital signature scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureType {
    RsaPssSha256,
}

/// How much a signer is trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrustLevel {
    Full,
    DomainSpecific,
}

/// An entity whose signatures the registry accepts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrustedSigner {
    pub name: String,
    pub organization: String,
    pub trust_level: TrustLevel,
    /// Domains this signer may sign for; `"*"` means any
    pub allowed_domains: Vec<String>,
    pub certification_required: bool,
}

impl TrustedSigner {
    pub fn may_sign_domain(&self, domain: &str) -> bool {
        self.allowed_domains
            .iter()
            .any(|d| d == "*" || d.eq_ignore_ascii_case(domain))
    }
}

/// One changelog line of a ruleset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub version: String,
    pub date: DateTime<Utc>,
    pub changes: String,
    pub author: String,
}

/// Ruleset metadata. Part of the signed canonical content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesetMetadata {
    pub id: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub author: String,
    pub organization: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: RulesetStatus,
    pub source: RulesetSource,
    pub compliance_frameworks: Vec<String>,
    pub domain: String,
    pub tags: Vec<String>,
    pub dependencies: Vec<String>,
    pub changelog: Vec<ChangelogEntry>,
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub support_contact: Option<String>,
}

/// Digital signature over a ruleset's canonical content
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesetSignature {
    pub signature_id: String,
    pub signer_id: String,
    pub signer_name: String,
    pub signature_type: SignatureType,
    /// Base64-encoded RSA-PSS signature over the SHA-256 content digest
    pub signature_value: String,
    /// SHA-256 fingerprint of the signer's DER-encoded public key
    pub public_key_fingerprint: String,
    pub signed_at: DateTime<Utc>,
}

/// Complete signed ruleset package
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedRuleset {
    pub metadata: RulesetMetadata,
    /// Open rule bundle; the registry treats it as opaque signed content
    pub rules: serde_json::Value,
    pub signature: RulesetSignature,
    /// SHA-256 hex digest of the canonical content; redundant with the
    /// signature by design, checked independently on every retrieval
    pub integrity_hash: String,
    pub size_bytes: usize,
    pub download_count: u64,
    pub last_verified: Option<DateTime<Utc>>,
}

/// Outcome of a verification sweep over one ruleset
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub valid: bool,
    pub errors: Vec<String>,
}

/// Listing entry with a freshly recomputed signature check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesetSummary {
    pub id: String,
    pub name: String,
    pub version: String,
    pub domain: String,
    pub status: RulesetStatus,
    pub source: RulesetSource,
    pub compliance_frameworks: Vec<String>,
    pub author: String,
    pub organization: String,
    pub created_at: DateTime<Utc>,
    pub signature_valid: bool,
    pub download_count: u64,
    pub size_bytes: usize,
}

/// AND-combined listing filters
#[derive(Debug, Clone, Default)]
pub struct RulesetFilter {
    pub domain: Option<String>,
    pub compliance_framework: Option<String>,
    pub source: Option<RulesetSource>,
    pub status: Option<RulesetStatus>,
}

impl RulesetFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    pub fn with_compliance_framework(mut self, framework: &str) -> Self {
        self.compliance_framework = Some(framework.to_string());
        self
    }

    pub fn with_source(mut self, source: RulesetSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_status(mut self, status: RulesetStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub(crate) fn matches(&self, metadata: &RulesetMetadata) -> bool {
        if let Some(domain) = &self.domain {
            if &metadata.domain != domain {
                return false;
            }
        }
        if let Some(framework) = &self.compliance_framework {
            if !metadata.compliance_frameworks.contains(framework) {
                return false;
            }
        }
        if let Some(source) = self.source {
            if metadata.source != source {
                return false;
            }
        }
        if let Some(status) = self.status {
            if metadata.status != status {
                return false;
            }
        }
        true
    }
}

/// A ruleset submitted for registration
#[derive(Debug, Clone)]
pub struct RulesetSubmission {
    pub name: String,
    pub version: String,
    pub rules: serde_json::Value,
    pub author: String,
    pub organization: String,
    pub domain: String,
    pub compliance_frameworks: Vec<String>,
    pub source: RulesetSource,
    pub description: String,
    pub tags: Vec<String>,
    pub dependencies: Vec<String>,
    pub license: String,
    pub signer_id: String,
}

impl RulesetSubmission {
    pub fn new(name: &str, version: &str, domain: &str, rules: serde_json::Value) -> Self {
        Self {
            name: name.to_string(),
            version: version.to_string(),
            rules,
            author: String::new(),
            organization: String::new(),
            domain: domain.to_string(),
            compliance_frameworks: Vec::new(),
            source: RulesetSource::Internal,
            description: String::new(),
            tags: Vec::new(),
            dependencies: Vec::new(),
            license: "Proprietary".to_string(),
            signer_id: crate::registry::REGISTRY_SIGNER.to_string(),
        }
    }

    pub fn with_author(mut self, author: &str, organization: &str) -> Self {
        self.author = author.to_string();
        self.organization = organization.to_string();
        self
    }

    pub fn with_compliance_frameworks(mut self, frameworks: &[&str]) -> Self {
        self.compliance_frameworks = frameworks.iter().map(|f| f.to_string()).collect();
        self
    }

    pub fn with_source(mut self, source: RulesetSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = description.to_string();
        self
    }

    pub fn with_tags(mut self, tags: &[&str]) -> Self {
        self.tags = tags.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_dependencies(mut self, dependencies: &[&str]) -> Self {
        self.dependencies = dependencies.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn with_license(mut self, license: &str) -> Self {
        self.license = license.to_string();
        self
    }

    pub fn with_signer(mut self, signer_id: &str) -> Self {
        self.signer_id = signer_id.to_string();
        self
    }
}

/// Registry-wide status and metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryStatus {
    pub total_rulesets: usize,
    pub valid_signatures: usize,
    /// Percentage of rulesets with a valid signature (100.0 when empty)
    pub signature_integrity: f64,
    pub status_distribution: std::collections::HashMap<String, usize>,
    pub source_distribution: std::collections::HashMap<String, usize>,
    pub trusted_signers: usize,
    pub verification_results: std::collections::HashMap<String, VerificationReport>,
    pub last_updated: DateTime<Utc>,
}
