//! Mailbox credential validation.

/// Validation error for mailbox credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Address is empty.
    EmptyAddress,
    /// Address format is invalid.
    InvalidAddress,
    /// Password is empty.
    EmptyPassword,
    /// Password is shorter than the service accepts.
    ShortPassword,
    /// Password and confirmation differ.
    PasswordMismatch,
}

impl ValidationError {
    /// Get human-readable error message.
    #[must_use]
    pub const fn message(&self) -> &'static str {
        match self {
            Self::EmptyAddress => "Address is required",
            Self::InvalidAddress => "Invalid address format",
            Self::EmptyPassword => "Password is required",
            Self::ShortPassword => "Password must be at least 6 characters",
            Self::PasswordMismatch => "Passwords do not match",
        }
    }

    /// Get the field name this error relates to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmptyAddress | Self::InvalidAddress => "address",
            Self::EmptyPassword | Self::ShortPassword | Self::PasswordMismatch => "password",
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ValidationError {}

/// Result of validating credentials.
pub type ValidationResult = Result<(), Vec<ValidationError>>;

/// Shortest password the service accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

/// Validate credentials for a new mailbox.
///
/// `confirmation` is checked only when given.
///
/// # Errors
///
/// Returns every problem found.
pub fn validate_new_account(
    address: &str,
    password: &str,
    confirmation: Option<&str>,
) -> ValidationResult {
    let mut errors = Vec::new();

    if address.trim().is_empty() {
        errors.push(ValidationError::EmptyAddress);
    } else if !is_valid_address(address) {
        errors.push(ValidationError::InvalidAddress);
    }

    if password.is_empty() {
        errors.push(ValidationError::EmptyPassword);
    } else if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(ValidationError::ShortPassword);
    }

    if confirmation.is_some_and(|c| c != password) {
        errors.push(ValidationError::PasswordMismatch);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate login credentials.
///
/// # Errors
///
/// Returns every problem found. Password length is not checked.
pub fn validate_login(address: &str, password: &str) -> ValidationResult {
    let mut errors = Vec::new();

    if address.trim().is_empty() {
        errors.push(ValidationError::EmptyAddress);
    } else if !is_valid_address(address) {
        errors.push(ValidationError::InvalidAddress);
    }
    if password.is_empty() {
        errors.push(ValidationError::EmptyPassword);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Basic address validation.
fn is_valid_address(address: &str) -> bool {
    let Some((local, domain)) = address.trim().split_once('@') else {
        return false;
    };

    if local.is_empty() || domain.contains('@') {
        return false;
    }
    if local.chars().any(char::is_whitespace) {
        return false;
    }

    // Domain needs at least one dot and no empty labels
    domain.contains('.') && domain.split('.').all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_address() {
        assert!(is_valid_address("user@mail.gw"));
        assert!(is_valid_address("a.b@sub.example.com"));
    }

    #[test]
    fn test_invalid_address() {
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("user"));
        assert!(!is_valid_address("@mail.gw"));
        assert!(!is_valid_address("user@"));
        assert!(!is_valid_address("user@mailgw"));
        assert!(!is_valid_address("user@@mail.gw"));
        assert!(!is_valid_address("us er@mail.gw"));
        assert!(!is_valid_address("user@mail..gw"));
    }

    #[test]
    fn test_new_account_collects_all_errors() {
        assert_eq!(
            validate_new_account("", "", None),
            Err(vec![ValidationError::EmptyAddress, ValidationError::EmptyPassword])
        );
        assert_eq!(
            validate_new_account("me@mail.gw", "abc", Some("abd")),
            Err(vec![ValidationError::ShortPassword, ValidationError::PasswordMismatch])
        );
        assert_eq!(validate_new_account("me@mail.gw", "s3cret!", Some("s3cret!")), Ok(()));
    }

    #[test]
    fn test_login_skips_length() {
        assert_eq!(validate_login("me@mail.gw", "abc"), Ok(()));
        assert_eq!(
            validate_login("me", ""),
            Err(vec![ValidationError::InvalidAddress, ValidationError::EmptyPassword])
        );
    }

    #[test]
    fn test_field_names() {
        assert_eq!(ValidationError::InvalidAddress.field(), "address");
        assert_eq!(ValidationError::PasswordMismatch.field(), "password");
    }
}
