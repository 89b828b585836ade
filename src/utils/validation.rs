//! Validation utilities

use bigdecimal::BigDecimal;

use crate::types::*;

/// Validate that an amount is not negative
pub fn validate_amount(amount: &BigDecimal) -> StoreResult<()> {
    if *amount < BigDecimal::from(0) {
        Err(StoreError::Validation(
            "Amount cannot be negative".to_string(),
        ))
    } else {
        Ok(())
    }
}

/// Validate that a user ID is usable as a hash field value
pub fn validate_user_id(user_id: &str) -> StoreResult<()> {
    if user_id.trim().is_empty() {
        return Err(StoreError::Validation(
            "User ID cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validate an identifier that becomes part of a store key
pub fn validate_key_id(id: &str) -> StoreResult<()> {
    if id.trim().is_empty() {
        return Err(StoreError::Validation(
            "Identifier cannot be empty".to_string(),
        ));
    }

    // a stray space or newline would silently create a different key
    if id.chars().any(char::is_whitespace) {
        return Err(StoreError::Validation(format!(
            "Identifier '{id}' cannot contain whitespace"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(&BigDecimal::from(0)).is_ok());
        assert!(validate_amount(&BigDecimal::from_str("20000.50").unwrap()).is_ok());
        assert!(validate_amount(&BigDecimal::from(-1)).is_err());
    }

    #[test]
    fn test_validate_user_id() {
        assert!(validate_user_id("user-1").is_ok());
        assert!(validate_user_id("   ").is_err());
        assert!(validate_user_id(&"x".repeat(500)).is_ok());
    }

    #[test]
    fn test_validate_key_id() {
        assert!(validate_key_id("2307191028187690012").is_ok());
        assert!(validate_key_id("").is_err());
        assert!(validate_key_id("12 34").is_err());
    }
}
