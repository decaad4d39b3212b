//! TOML-driven access policy.
//!
//! `TomlAccessPolicy` implements `AccessPolicy` from clinic-core:
//!
//! 1. Iterate rules in declaration order.
//! 2. The first rule whose `role`, `action` and `table` patterns match
//!    decides the verdict.
//! 3. If no rule matched, deny with "denied by default".

use std::path::Path;

use tracing::{debug, warn};

use clinic_contracts::{
    error::ClinicResult,
    policy::{AccessContext, AccessVerdict},
};
use clinic_core::traits::AccessPolicy;

use crate::{
    config::ClinicConfig,
    rule::{AccessRule, RuleVerdict},
};

#[derive(Debug, Clone)]
pub struct TomlAccessPolicy {
    rules: Vec<AccessRule>,
}

impl TomlAccessPolicy {
    pub fn new(rules: Vec<AccessRule>) -> Self {
        Self { rules }
    }

    /// Parse a TOML document and keep only its `[[rules]]`.
    pub fn from_toml_str(s: &str) -> ClinicResult<Self> {
        Ok(Self::new(ClinicConfig::from_toml_str(s)?.rules))
    }

    pub fn from_file(path: &Path) -> ClinicResult<Self> {
        Ok(Self::new(ClinicConfig::from_file(path)?.rules))
    }

    pub fn rules(&self) -> &[AccessRule] {
        &self.rules
    }
}

impl AccessPolicy for TomlAccessPolicy {
    fn evaluate(&self, ctx: &AccessContext) -> ClinicResult<AccessVerdict> {
        debug!(
            role = %ctx.role,
            action = %ctx.action,
            table = %ctx.table,
            "evaluating access"
        );

        let Some(rule) = self
            .rules
            .iter()
            .find(|r| r.matches(&ctx.role, &ctx.action, &ctx.table))
        else {
            warn!(
                role = %ctx.role,
                action = %ctx.action,
                table = %ctx.table,
                "no access rule matched; denying by default"
            );
            return Ok(AccessVerdict::Deny {
                reason: format!(
                    "denied by default: no rule lets '{}' {} on '{}'",
                    ctx.role, ctx.action, ctx.table
                ),
            });
        };

        debug!(rule_id = %rule.id, "rule matched");

        Ok(match rule.verdict {
            RuleVerdict::Allow => AccessVerdict::Allow,
            RuleVerdict::Deny => AccessVerdict::Deny {
                reason: rule
                    .deny_reason
                    .clone()
                    .unwrap_or_else(|| format!("denied by rule '{}'", rule.id)),
            },
        })
    }
}
