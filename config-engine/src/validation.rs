// Configuration validation
use crate::error::{ConfigError, Result};

/// Settings that can check their own invariants after loading.
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Fail with a validation error naming `field` unless `condition` holds.
pub fn ensure(condition: bool, field: &str, message: &str) -> Result<()> {
    if condition {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!("{field}: {message}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_reports_field() {
        assert!(ensure(true, "gate.min_ratio", "must be positive").is_ok());

        let err = ensure(false, "gate.min_ratio", "must be positive").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Configuration validation failed: gate.min_ratio: must be positive"
        );
    }
}
