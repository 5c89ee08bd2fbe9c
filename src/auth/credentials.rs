//! Login and registration input, with client-side validation.

use serde::Serialize;
use thiserror::Error;

/// Rejections raised before any request leaves the device.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was left empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// The email address is not plausibly valid.
    #[error("invalid email address: {0}")]
    InvalidEmail(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Terms and conditions were not accepted.
    #[error("terms and conditions must be accepted")]
    TermsNotAccepted,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Plausibility check only; the server is the authority on addresses.
fn check_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() {
        return Err(ValidationError::MissingField("email"));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ValidationError::InvalidEmail(email.to_string()))
    }
}

/// Credentials sent to the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoginRequest {
    /// Normalized (trimmed, lowercased) email.
    #[serde(rename = "correo")]
    pub email: String,
    /// Password, sent as typed.
    pub password: String,
}

impl LoginRequest {
    /// Build a request, normalizing the email.
    pub fn new(email: impl AsRef<str>, password: impl Into<String>) -> Self {
        Self {
            email: normalize_email(email.as_ref()),
            password: password.into(),
        }
    }

    /// Check the request before sending it.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_email(&self.email)?;
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        Ok(())
    }
}

/// Registration form as filled in by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub accepts_terms: bool,
}

impl RegisterForm {
    /// Validate the form and produce the request body.
    ///
    /// Checks run in the order the form shows them: required fields, email
    /// shape, password confirmation, terms.
    pub fn validate(&self) -> Result<RegisterRequest, ValidationError> {
        let email = normalize_email(&self.email);

        if email.is_empty() {
            return Err(ValidationError::MissingField("email"));
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingField("password"));
        }
        if self.confirm_password.is_empty() {
            return Err(ValidationError::MissingField("confirm_password"));
        }
        check_email(&email)?;
        if self.password != self.confirm_password {
            return Err(ValidationError::PasswordMismatch);
        }
        if !self.accepts_terms {
            return Err(ValidationError::TermsNotAccepted);
        }

        Ok(RegisterRequest {
            email,
            password: self.password.clone(),
        })
    }
}

/// Body sent to the register endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegisterRequest {
    #[serde(rename = "correo")]
    pub email: String,
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(email: &str, password: &str, confirm: &str, terms: bool) -> RegisterForm {
        RegisterForm {
            email: email.into(),
            password: password.into(),
            confirm_password: confirm.into(),
            accepts_terms: terms,
        }
    }

    #[test]
    fn test_login_normalizes_email() {
        let req = LoginRequest::new("  Usuario@Ejemplo.COM ", "password123");
        assert_eq!(req.email, "usuario@ejemplo.com");
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_login_rejects_bad_input() {
        assert_eq!(
            LoginRequest::new("", "x").validate(),
            Err(ValidationError::MissingField("email"))
        );
        assert_eq!(
            LoginRequest::new("a@b.co", "").validate(),
            Err(ValidationError::MissingField("password"))
        );
        assert!(matches!(
            LoginRequest::new("no-at-sign", "x").validate(),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            LoginRequest::new("a@nodot", "x").validate(),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            LoginRequest::new("a@@b.co", "x").validate(),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_login_wire_format() {
        let req = LoginRequest::new("a@b.co", "secret");
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["correo"], "a@b.co");
        assert_eq!(json["password"], "secret");
    }

    #[test]
    fn test_register_valid() {
        let req = form("Docente@Escuela.mx", "pw1", "pw1", true)
            .validate()
            .unwrap();
        assert_eq!(req.email, "docente@escuela.mx");
        assert_eq!(req.password, "pw1");
    }

    #[test]
    fn test_register_missing_fields() {
        assert_eq!(
            form("", "a", "a", true).validate(),
            Err(ValidationError::MissingField("email"))
        );
        assert_eq!(
            form("a@b.co", "", "a", true).validate(),
            Err(ValidationError::MissingField("password"))
        );
        assert_eq!(
            form("a@b.co", "a", "", true).validate(),
            Err(ValidationError::MissingField("confirm_password"))
        );
    }

    #[test]
    fn test_register_check_order() {
        // Mismatch is reported before terms.
        assert_eq!(
            form("a@b.co", "a", "b", false).validate(),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            form("a@b.co", "a", "a", false).validate(),
            Err(ValidationError::TermsNotAccepted)
        );
    }
}
