//! Signed ruleset registry
//!
//! Every ruleset carries a SHA-256 integrity hash and an RSA-PSS
//! signature over the same canonical content. Retrieval is
//! verify-then-serve: a ruleset that fails any check is never handed
//! out, and the refusal is audited as a security violation.

use std::collections::HashMap;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::Utc;
use rsa::pkcs8::EncodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{Pss, RsaPrivateKey, RsaPublicKey};
use serde_json::json;
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use xreason_audit::{AuditEvent, AuditEventType, AuditOutcome, AuditSink, RiskLevel, TracingAuditSink};

use crate::canonical;
use crate::model::{
    ChangelogEntry, RegistryStatus, RulesetFilter, RulesetMetadata, RulesetSignature,
    RulesetStatus, RulesetSubmission, RulesetSummary, SignatureType, SignedRuleset, TrustLevel,
    TrustedSigner, VerificationReport,
};

/// Signer id the registry signs its own rulesets with
pub const REGISTRY_SIGNER: &str = "xreason_registry";

const RSA_KEY_BITS: usize = 2048;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("unknown signer: {0}")]
    UnknownSigner(String),

    #[error("signer '{signer}' is not authorized for domain '{domain}'")]
    SignerNotAuthorized { signer: String, domain: String },

    #[error("ruleset '{0}' is already registered")]
    DuplicateRuleset(String),

    #[error("ruleset not found: {0}")]
    NotFound(String),

    #[error("verification failed for '{ruleset_id}': {}", errors.join("; "))]
    VerificationFailed {
        ruleset_id: String,
        errors: Vec<String>,
    },

    #[error("invalid status transition: {from} -> {to}")]
    InvalidTransition {
        from: RulesetStatus,
        to: RulesetStatus,
    },

    #[error("no signing key held for signer '{0}'")]
    SigningKeyUnavailable(String),

    #[error("crypto failure: {0}")]
    Crypto(String),
}

/// Central store of signed rulesets, signer keys and trust policy
pub struct RulesetRegistry {
    rulesets: HashMap<String, SignedRuleset>,
    signing_keys: HashMap<String, RsaPrivateKey>,
    public_keys: HashMap<String, RsaPublicKey>,
    trusted_signers: HashMap<String, TrustedSigner>,
    audit: Arc<dyn AuditSink>,
}

impl RulesetRegistry {
    /// Registry with default trust policy, a fresh registry signing key
    /// and the built-in compliance rulesets installed.
    pub fn new() -> Result<Self, RegistryError> {
        Self::with_sink(Arc::new(TracingAuditSink))
    }

    pub fn with_sink(audit: Arc<dyn AuditSink>) -> Result<Self, RegistryError> {
        let mut registry = Self {
            rulesets: HashMap::new(),
            signing_keys: HashMap::new(),
            public_keys: HashMap::new(),
            trusted_signers: HashMap::new(),
            audit,
        };
        registry.install_default_signers();
        registry.generate_signer_key(REGISTRY_SIGNER)?;
        crate::builtin::register_builtin_rulesets(&mut registry)?;
        info!(
            rulesets = registry.rulesets.len(),
            signers = registry.trusted_signers.len(),
            "ruleset registry initialized"
        );
        Ok(registry)
    }

    /// Empty registry without the built-in rulesets, for tests and
    /// custom deployments.
    pub fn bare(audit: Arc<dyn AuditSink>) -> Result<Self, RegistryError> {
        let mut registry = Self {
            rulesets: HashMap::new(),
            signing_keys: HashMap::new(),
            public_keys: HashMap::new(),
            trusted_signers: HashMap::new(),
            audit,
        };
        registry.install_default_signers();
        registry.generate_signer_key(REGISTRY_SIGNER)?;
        Ok(registry)
    }

    fn install_default_signers(&mut self) {
        self.trusted_signers.insert(
            REGISTRY_SIGNER.to_string(),
            TrustedSigner {
                name: "XReason Registry".to_string(),
                organization: "XReason".to_string(),
                trust_level: TrustLevel::Full,
                allowed_domains: vec!["*".to_string()],
                certification_required: false,
            },
        );
        self.trusted_signers.insert(
            "healthcare_authority".to_string(),
            TrustedSigner {
                name: "Healthcare Compliance Authority".to_string(),
                organization: "Healthcare Standards Institute".to_string(),
                trust_level: TrustLevel::DomainSpecific,
                allowed_domains: vec![
                    "healthcare".to_string(),
                    "medical".to_string(),
                    "hipaa".to_string(),
                ],
                certification_required: true,
            },
        );
        self.trusted_signers.insert(
            "financial_authority".to_string(),
            TrustedSigner {
                name: "Financial Compliance Authority".to_string(),
                organization: "Financial Standards Board".to_string(),
                trust_level: TrustLevel::DomainSpecific,
                allowed_domains: vec![
                    "finance".to_string(),
                    "banking".to_string(),
                    "sox".to_string(),
                ],
                certification_required: true,
            },
        );
    }

    /// Register a signer in the trust table. Does not mint a key;
    /// call [`generate_signer_key`](Self::generate_signer_key) for that.
    pub fn add_trusted_signer(&mut self, signer_id: &str, signer: TrustedSigner) {
        self.trusted_signers.insert(signer_id.to_string(), signer);
    }

    /// Generate a fresh RSA keypair for a trusted signer, replacing any
    /// previous one.
    pub fn generate_signer_key(&mut self, signer_id: &str) -> Result<(), RegistryError> {
        if !self.trusted_signers.contains_key(signer_id) {
            return Err(RegistryError::UnknownSigner(signer_id.to_string()));
        }
        let private_key = RsaPrivateKey::new(&mut rand::thread_rng(), RSA_KEY_BITS)
            .map_err(|e| RegistryError::Crypto(e.to_string()))?;
        let public_key = RsaPublicKey::from(&private_key);
        let rotated = self.signing_keys.contains_key(signer_id);
        self.signing_keys.insert(signer_id.to_string(), private_key);
        self.public_keys.insert(signer_id.to_string(), public_key);

        self.audit.log_event(
            AuditEvent::new(AuditEventType::KeyRotation, "generate_signer_key", AuditOutcome::Success)
                .with_details(json!({"signer_id": signer_id, "rotated": rotated, "key_bits": RSA_KEY_BITS}))
                .with_risk_level(RiskLevel::High),
        );
        Ok(())
    }

    /// Register a new signed ruleset. Rejects duplicate ids; the same
    /// name must be re-registered under a new version.
    pub fn register_ruleset(
        &mut self,
        submission: RulesetSubmission,
    ) -> Result<String, RegistryError> {
        let ruleset_id = format!(
            "{}_{}_{}",
            submission.domain,
            submission.name.to_lowercase().replace(' ', "_"),
            submission.version
        );
        if self.rulesets.contains_key(&ruleset_id) {
            return Err(RegistryError::DuplicateRuleset(ruleset_id));
        }

        let signer = self
            .trusted_signers
            .get(&submission.signer_id)
            .ok_or_else(|| RegistryError::UnknownSigner(submission.signer_id.clone()))?;
        if !signer.may_sign_domain(&submission.domain) {
            return Err(RegistryError::SignerNotAuthorized {
                signer: submission.signer_id.clone(),
                domain: submission.domain.clone(),
            });
        }

        let now = Utc::now();
        let metadata = RulesetMetadata {
            id: ruleset_id.clone(),
            name: submission.name,
            version: submission.version.clone(),
            description: submission.description,
            author: submission.author,
            organization: submission.organization,
            created_at: now,
            updated_at: now,
            status: RulesetStatus::Draft,
            source: submission.source,
            compliance_frameworks: submission.compliance_frameworks,
            domain: submission.domain,
            tags: submission.tags,
            dependencies: submission.dependencies,
            changelog: vec![ChangelogEntry {
                version: submission.version,
                date: now,
                changes: "Initial ruleset registration".to_string(),
                author: signer.name.clone(),
            }],
            license: submission.license,
            documentation_url: None,
            support_contact: None,
        };

        let ruleset = self.seal(metadata, submission.rules, &submission.signer_id)?;
        let frameworks: Vec<String> = ruleset.metadata.compliance_frameworks.clone();

        debug!(ruleset_id = %ruleset_id, size_bytes = ruleset.size_bytes, "ruleset sealed");
        self.rulesets.insert(ruleset_id.clone(), ruleset);

        let framework_refs: Vec<&str> = frameworks.iter().map(String::as_str).collect();
        self.audit.log_event(
            AuditEvent::new(AuditEventType::RulesetModify, "register_ruleset", AuditOutcome::Success)
                .with_details(json!({"ruleset_id": ruleset_id}))
                .with_frameworks(&framework_refs)
                .with_risk_level(RiskLevel::Medium),
        );
        Ok(ruleset_id)
    }

    /// Sign metadata and rules into a sealed package.
    fn seal(
        &self,
        metadata: RulesetMetadata,
        rules: serde_json::Value,
        signer_id: &str,
    ) -> Result<SignedRuleset, RegistryError> {
        let signing_key = self
            .signing_keys
            .get(signer_id)
            .ok_or_else(|| RegistryError::SigningKeyUnavailable(signer_id.to_string()))?;
        let signer = self
            .trusted_signers
            .get(signer_id)
            .ok_or_else(|| RegistryError::UnknownSigner(signer_id.to_string()))?;

        let content = Self::signed_content(&metadata, &rules)?;
        let digest = canonical::canonical_digest(&content);
        let integrity_hash = canonical::canonical_digest_hex(&content);
        let size_bytes = canonical::canonical_string(&content).len();

        let signature_bytes = signing_key
            .sign_with_rng(&mut rand::thread_rng(), pss_max_salt(signing_key), &digest)
            .map_err(|e| RegistryError::Crypto(e.to_string()))?;

        let public_key = RsaPublicKey::from(signing_key);
        let fingerprint = key_fingerprint(&public_key)?;

        Ok(SignedRuleset {
            metadata,
            rules,
            signature: RulesetSignature {
                signature_id: Uuid::new_v4().to_string(),
                signer_id: signer_id.to_string(),
                signer_name: signer.name.clone(),
                signature_type: SignatureType::RsaPssSha256,
                signature_value: BASE64.encode(signature_bytes),
                public_key_fingerprint: fingerprint,
                signed_at: Utc::now(),
            },
            integrity_hash,
            size_bytes,
            download_count: 0,
            last_verified: None,
        })
    }

    /// The exact JSON value that hashes and signatures cover.
    fn signed_content(
        metadata: &RulesetMetadata,
        rules: &serde_json::Value,
    ) -> Result<serde_json::Value, RegistryError> {
        let metadata_value =
            serde_json::to_value(metadata).map_err(|e| RegistryError::Crypto(e.to_string()))?;
        Ok(json!({"metadata": metadata_value, "rules": rules}))
    }

    /// Run every check against one ruleset without touching its state.
    ///
    /// Check order: content integrity, then signer trust, then the
    /// signature itself. All failures are collected rather than
    /// short-circuited so the report names everything wrong at once.
    fn check(&self, ruleset: &SignedRuleset) -> VerificationReport {
        let mut errors = Vec::new();

        match Self::signed_content(&ruleset.metadata, &ruleset.rules) {
            Ok(content) => {
                if canonical::canonical_digest_hex(&content) != ruleset.integrity_hash {
                    errors.push("integrity hash mismatch".to_string());
                }

                let signer_id = &ruleset.signature.signer_id;
                match self.trusted_signers.get(signer_id) {
                    None => errors.push(format!("untrusted signer: {signer_id}")),
                    Some(signer) => {
                        if !signer.may_sign_domain(&ruleset.metadata.domain) {
                            errors.push(format!(
                                "signer '{signer_id}' is not authorized for domain '{}'",
                                ruleset.metadata.domain
                            ));
                        }
                    }
                }

                match self.public_keys.get(signer_id) {
                    None => errors.push(format!("no public key held for signer '{signer_id}'")),
                    Some(public_key) => match key_fingerprint(public_key) {
                        Err(e) => errors.push(format!("fingerprint computation failed: {e}")),
                        Ok(fingerprint) => {
                            if fingerprint != ruleset.signature.public_key_fingerprint {
                                errors.push("public key fingerprint mismatch".to_string());
                            }
                            match BASE64.decode(&ruleset.signature.signature_value) {
                                Err(_) => errors.push("malformed signature encoding".to_string()),
                                Ok(signature_bytes) => {
                                    let digest = canonical::canonical_digest(&content);
                                    if public_key
                                        .verify(pss_max_salt(public_key), &digest, &signature_bytes)
                                        .is_err()
                                    {
                                        errors.push("signature verification failed".to_string());
                                    }
                                }
                            }
                        }
                    },
                }
            }
            Err(e) => errors.push(format!("content serialization failed: {e}")),
        }

        VerificationReport {
            valid: errors.is_empty(),
            errors,
        }
    }

    /// Verify one ruleset, recording the verification time on success.
    pub fn verify_ruleset(&mut self, ruleset_id: &str) -> Result<VerificationReport, RegistryError> {
        let ruleset = self
            .rulesets
            .get(ruleset_id)
            .ok_or_else(|| RegistryError::NotFound(ruleset_id.to_string()))?;
        let report = self.check(ruleset);
        if report.valid {
            if let Some(ruleset) = self.rulesets.get_mut(ruleset_id) {
                ruleset.last_verified = Some(Utc::now());
            }
        } else {
            warn!(ruleset_id, errors = ?report.errors, "ruleset verification failed");
        }
        Ok(report)
    }

    /// Verify-then-serve retrieval. Serving increments the download
    /// count; a failed verification blocks the ruleset and is audited.
    pub fn get_ruleset(&mut self, ruleset_id: &str) -> Result<SignedRuleset, RegistryError> {
        let report = self.verify_ruleset(ruleset_id)?;
        if !report.valid {
            self.audit.log_event(
                AuditEvent::new(
                    AuditEventType::SecurityViolation,
                    "get_ruleset",
                    AuditOutcome::Blocked,
                )
                .with_details(json!({"ruleset_id": ruleset_id, "errors": report.errors}))
                .with_risk_level(RiskLevel::Critical),
            );
            return Err(RegistryError::VerificationFailed {
                ruleset_id: ruleset_id.to_string(),
                errors: report.errors,
            });
        }

        let ruleset = self
            .rulesets
            .get_mut(ruleset_id)
            .ok_or_else(|| RegistryError::NotFound(ruleset_id.to_string()))?;
        ruleset.download_count += 1;
        let served = ruleset.clone();

        self.audit.log_event(
            AuditEvent::new(AuditEventType::RulesetAccess, "get_ruleset", AuditOutcome::Success)
                .with_details(json!({
                    "ruleset_id": ruleset_id,
                    "download_count": served.download_count,
                })),
        );
        Ok(served)
    }

    /// List rulesets matching all given filters, each with a freshly
    /// recomputed signature check. Passing entries get their
    /// `last_verified` timestamp refreshed, same as retrieval.
    pub fn list_rulesets(&mut self, filter: &RulesetFilter) -> Vec<RulesetSummary> {
        let now = Utc::now();
        let checked: Vec<(String, bool)> = self
            .rulesets
            .values()
            .filter(|ruleset| filter.matches(&ruleset.metadata))
            .map(|ruleset| (ruleset.metadata.id.clone(), self.check(ruleset).valid))
            .collect();
        for (id, valid) in &checked {
            if *valid {
                if let Some(ruleset) = self.rulesets.get_mut(id) {
                    ruleset.last_verified = Some(now);
                }
            }
        }

        let mut summaries: Vec<RulesetSummary> = checked
            .into_iter()
            .filter_map(|(id, valid)| self.rulesets.get(&id).map(|r| (r, valid)))
            .map(|(ruleset, signature_valid)| RulesetSummary {
                id: ruleset.metadata.id.clone(),
                name: ruleset.metadata.name.clone(),
                version: ruleset.metadata.version.clone(),
                domain: ruleset.metadata.domain.clone(),
                status: ruleset.metadata.status,
                source: ruleset.metadata.source,
                compliance_frameworks: ruleset.metadata.compliance_frameworks.clone(),
                author: ruleset.metadata.author.clone(),
                organization: ruleset.metadata.organization.clone(),
                created_at: ruleset.metadata.created_at,
                signature_valid,
                download_count: ruleset.download_count,
                size_bytes: ruleset.size_bytes,
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    /// Advance a ruleset through its lifecycle. The status lives inside
    /// the signed content, so a legal transition re-signs the package
    /// with the original signer's current key.
    pub fn transition_status(
        &mut self,
        ruleset_id: &str,
        next: RulesetStatus,
    ) -> Result<(), RegistryError> {
        let ruleset = self
            .rulesets
            .get(ruleset_id)
            .ok_or_else(|| RegistryError::NotFound(ruleset_id.to_string()))?;
        let from = ruleset.metadata.status;
        if !from.can_transition_to(next) {
            return Err(RegistryError::InvalidTransition { from, to: next });
        }

        let signer_id = ruleset.signature.signer_id.clone();
        if !self.signing_keys.contains_key(&signer_id) {
            return Err(RegistryError::SigningKeyUnavailable(signer_id));
        }

        let mut metadata = ruleset.metadata.clone();
        let rules = ruleset.rules.clone();
        let download_count = ruleset.download_count;
        let now = Utc::now();
        metadata.status = next;
        metadata.updated_at = now;
        metadata.changelog.push(ChangelogEntry {
            version: metadata.version.clone(),
            date: now,
            changes: format!("Status changed from {from} to {next}"),
            author: ruleset.signature.signer_name.clone(),
        });

        let mut resealed = self.seal(metadata, rules, &signer_id)?;
        resealed.download_count = download_count;
        self.rulesets.insert(ruleset_id.to_string(), resealed);

        info!(ruleset_id, %from, to = %next, "ruleset status transitioned");
        self.audit.log_event(
            AuditEvent::new(
                AuditEventType::RulesetModify,
                "transition_status",
                AuditOutcome::Success,
            )
            .with_details(json!({
                "ruleset_id": ruleset_id,
                "from": from.to_string(),
                "to": next.to_string(),
            }))
            .with_risk_level(RiskLevel::Medium),
        );
        Ok(())
    }

    /// Registry-wide health report: verification sweep over every
    /// ruleset plus status and source distributions.
    pub fn registry_status(&mut self) -> RegistryStatus {
        let ids: Vec<String> = self.rulesets.keys().cloned().collect();
        let mut verification_results = HashMap::new();
        let mut valid_signatures = 0;
        for id in &ids {
            if let Ok(report) = self.verify_ruleset(id) {
                if report.valid {
                    valid_signatures += 1;
                }
                verification_results.insert(id.clone(), report);
            }
        }

        let total = self.rulesets.len();
        let mut status_distribution: HashMap<String, usize> = HashMap::new();
        let mut source_distribution: HashMap<String, usize> = HashMap::new();
        for ruleset in self.rulesets.values() {
            *status_distribution
                .entry(ruleset.metadata.status.to_string())
                .or_insert(0) += 1;
            *source_distribution
                .entry(ruleset.metadata.source.to_string())
                .or_insert(0) += 1;
        }

        RegistryStatus {
            total_rulesets: total,
            valid_signatures,
            signature_integrity: if total == 0 {
                100.0
            } else {
                valid_signatures as f64 / total as f64 * 100.0
            },
            status_distribution,
            source_distribution,
            trusted_signers: self.trusted_signers.len(),
            verification_results,
            last_updated: Utc::now(),
        }
    }

    pub fn ruleset_count(&self) -> usize {
        self.rulesets.len()
    }

    pub fn contains(&self, ruleset_id: &str) -> bool {
        self.rulesets.contains_key(ruleset_id)
    }
}

/// PSS scheme with the salt filling every byte the encoding leaves
/// after the SHA-256 hash (emLen - hLen - 2). Verification is strict:
/// signatures produced with a shorter salt do not verify.
fn pss_max_salt(key: &impl PublicKeyParts) -> Pss {
    Pss::new_with_salt::<Sha256>(key.size() - Sha256::output_size() - 2)
}

/// SHA-256 hex fingerprint of a DER-encoded public key
fn key_fingerprint(public_key: &RsaPublicKey) -> Result<String, RegistryError> {
    let der = public_key
        .to_public_key_der()
        .map_err(|e| RegistryError::Crypto(e.to_string()))?;
    Ok(format!("{:x}", Sha256::digest(der.as_bytes())))
}
