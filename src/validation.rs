use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),
}

/// Check that `address` is a 20-byte `0x` hex address and return it lowercased,
/// the form the node reports in transactions.
pub fn normalize_address(address: &str) -> Result<String, ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    let digits = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .ok_or_else(|| ValidationError::InvalidAddress(address.to_string()))?;

    if digits.len() != 40 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidAddress(address.to_string()));
    }

    Ok(format!("0x{}", digits.to_lowercase()))
}
