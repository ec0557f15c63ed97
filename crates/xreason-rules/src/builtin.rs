//! Built-in compliance rulesets shipped with the registry

use serde_json::json;

use crate::model::{RulesetSource, RulesetSubmission};
use crate::registry::{RegistryError, RulesetRegistry};

/// Register the internal HIPAA, financial and GDPR rulesets, signed by
/// the registry's own key.
pub fn register_builtin_rulesets(registry: &mut RulesetRegistry) -> Result<(), RegistryError> {
    let bundles = [
        (
            "HIPAA Compliance Rules",
            "healthcare",
            vec!["hipaa"],
            "Technical safeguard checks for protected health information",
            hipaa_rules(),
        ),
        (
            "Financial Analysis Rules",
            "finance",
            vec!["sox", "basel_iii"],
            "Core financial ratio and margin validations",
            financial_rules(),
        ),
        (
            "GDPR Compliance Rules",
            "legal",
            vec!["gdpr"],
            "Data protection and security-of-processing checks",
            gdpr_rules(),
        ),
    ];

    for (name, domain, frameworks, description, rules) in bundles {
        let id = registry.register_ruleset(
            RulesetSubmission::new(name, "1.0.0", domain, rules)
                .with_author("XReason System", "XReason")
                .with_compliance_frameworks(&frameworks)
                .with_source(RulesetSource::Internal)
                .with_description(description),
        )?;
        tracing::debug!(ruleset_id = %id, "built-in ruleset registered");
    }
    Ok(())
}

fn hipaa_rules() -> serde_json::Value {
    json!({
        "rules": [
            {
                "id": "hipaa_164_312_a_1",
                "type": "access_control",
                "description": "Unique user identification requirement",
                "condition": "user_access_request",
                "validation": "unique_user_id_required",
                "weight": 1.0
            },
            {
                "id": "hipaa_164_312_e_1",
                "type": "transmission_security",
                "description": "Transmission security for ePHI",
                "condition": "data_transmission",
                "validation": "encryption_required",
                "weight": 1.0
            }
        ],
        "metadata": {
            "framework": "HIPAA",
            "version": "1.0.0",
            "last_updated": "2024-01-15"
        }
    })
}

fn financial_rules() -> serde_json::Value {
    json!({
        "rules": [
            {
                "id": "debt_to_equity_ratio",
                "type": "financial_metric",
                "description": "Calculate debt-to-equity ratio",
                "formula": "total_debt / total_equity",
                "validation": "ratio_calculation",
                "weight": 0.9
            },
            {
                "id": "profit_margin_check",
                "type": "financial_metric",
                "description": "Calculate profit margin",
                "formula": "(revenue - costs) / revenue",
                "validation": "percentage_calculation",
                "weight": 0.8
            }
        ],
        "metadata": {
            "framework": "Financial Analysis",
            "version": "1.0.0",
            "last_updated": "2024-01-15"
        }
    })
}

fn gdpr_rules() -> serde_json::Value {
    json!({
        "rules": [
            {
                "id": "gdpr_article_25",
                "type": "data_protection",
                "description": "Data protection by design and by default",
                "condition": "data_processing",
                "validation": "privacy_by_design_check",
                "weight": 1.0
            },
            {
                "id": "gdpr_article_32",
                "type": "security_processing",
                "description": "Security of processing",
                "condition": "data_processing",
                "validation": "security_measures_check",
                "weight": 1.0
            }
        ],
        "metadata": {
            "framework": "GDPR",
            "version": "1.0.0",
            "last_updated": "2024-01-15"
        }
    })
}
