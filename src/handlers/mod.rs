pub mod petition_image;
pub mod petitions;
pub mod support_tiers;
pub mod supporters;
pub mod user_image;
pub mod users;

use crate::error::ApiError;

/// Shape checks shared by the user endpoints. These replace the JSON-schema
/// validation layer of a framework stack: serde enforces types and presence,
/// these enforce the value rules.
pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    let ok = email.len() <= 256
        && match email.split_once('@') {
            Some((local, host)) => !local.is_empty() && host.contains('.') && !host.starts_with('.'),
            None => false,
        };
    if !ok {
        return Err(ApiError::bad_request("email must be a valid email address"));
    }
    Ok(())
}

pub(crate) fn validate_name(value: &str, field: &str) -> Result<(), ApiError> {
    if value.is_empty() || value.len() > 64 {
        return Err(ApiError::bad_request(format!(
            "{} must be between 1 and 64 characters",
            field
        )));
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.len() < 6 || password.len() > 64 {
        return Err(ApiError::bad_request(
            "password must be between 6 and 64 characters",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_addresses_and_rejects_malformed_ones() {
        assert!(validate_email("a@b.com").is_ok());
        assert!(validate_email("first.last@mail.example.org").is_ok());
        assert!(validate_email("missing-at.example.com").is_err());
        assert!(validate_email("@nolocal.com").is_err());
        assert!(validate_email("nohost@").is_err());
        assert!(validate_email("nodot@host").is_err());
    }

    #[test]
    fn name_and_password_bounds() {
        assert!(validate_name("Aroha", "firstName").is_ok());
        assert!(validate_name("", "firstName").is_err());
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
    }
}
