//! # XReason Rules
//!
//! Signed, tamper-evident ruleset registry. Rulesets are sealed with a
//! SHA-256 integrity hash and an RSA-PSS signature over the same
//! canonical content, tied to a trust table of authorized signers, and
//! verified again on every retrieval.

pub mod builtin;
pub mod canonical;
pub mod model;
pub mod registry;

pub use model::{
    ChangelogEntry, RegistryStatus, RulesetFilter, RulesetMetadata, RulesetSignature,
    RulesetSource, RulesetStatus, RulesetSubmission, RulesetSummary, SignatureType, SignedRuleset,
    TrustLevel, TrustedSigner, VerificationReport,
};
pub use registry::{RegistryError, RulesetRegistry, REGISTRY_SIGNER};
