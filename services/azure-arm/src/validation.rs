use azauth_core::{Error, Result};

/// Collects every problem with a method's configuration so that all of them
/// are reported in one error.
#[derive(Debug)]
pub(crate) struct Validation {
    when: &'static str,
    errors: Vec<String>,
}

impl Validation {
    /// `when` completes "A <field> must be configured when ...".
    pub(crate) fn new(when: &'static str) -> Self {
        Self {
            when,
            errors: Vec::new(),
        }
    }

    /// Record `field` as missing when `value` is empty.
    pub(crate) fn require(&mut self, value: &str, field: &str) -> &mut Self {
        if value.trim().is_empty() {
            self.errors
                .push(format!("A {field} must be configured when {}.", self.when));
        }
        self
    }

    /// Record `message` unless `ok` holds.
    pub(crate) fn check(&mut self, ok: bool, message: impl Into<String>) -> &mut Self {
        if !ok {
            self.errors.push(message.into());
        }
        self
    }

    /// Check that one to three auxiliary tenants are configured.
    pub(crate) fn require_auxiliary_tenants(&mut self, tenants: &[String]) -> &mut Self {
        let when = self.when;
        self.check(
            !tenants.is_empty(),
            format!("At least one Auxiliary Tenant ID must be configured when {when}."),
        )
        .check(
            tenants.len() <= crate::constants::MAX_AUXILIARY_TENANTS,
            format!(
                "No more than {} Auxiliary Tenant IDs can be configured when {when}.",
                crate::constants::MAX_AUXILIARY_TENANTS
            ),
        )
    }

    pub(crate) fn finish(&self) -> Result<()> {
        match self.errors.len() {
            0 => Ok(()),
            n => {
                let header = if n == 1 {
                    "1 error occurred:".to_string()
                } else {
                    format!("{n} errors occurred:")
                };
                let lines: Vec<String> = self.errors.iter().map(|e| format!("\t* {e}")).collect();
                Err(Error::config_invalid(format!(
                    "{header}\n{}",
                    lines.join("\n")
                )))
            }
        }
    }
}
