// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request payload validation.

use std::sync::LazyLock;

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use authgate_common::{FieldError, Role};
use regex::Regex;
use serde::{de::DeserializeOwned, Deserialize};
use thiserror::Error;

use crate::auth::{Credentials, NewUser};
use crate::error::AppError;

const MAX_NAME_LENGTH: usize = 255;
const MIN_PASSWORD_LENGTH: usize = 6;
const MAX_PASSWORD_LENGTH: usize = 128;
const MAX_EMAIL_LENGTH: usize = 255;

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").expect("email regex compiles")
});

/// A single failed field check
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("Invalid name: {0}")]
    InvalidName(String),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),
}

impl ValidationError {
    /// Name of the offending field
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::Missing(field) => field,
            ValidationError::InvalidName(_) => "name",
            ValidationError::InvalidEmail(_) => "email",
            ValidationError::InvalidPassword(_) => "password",
            ValidationError::InvalidRole(_) => "role",
        }
    }

    /// Message without the field prefix
    pub fn message(&self) -> String {
        match self {
            ValidationError::Missing(_) => "Required".to_string(),
            ValidationError::InvalidName(msg)
            | ValidationError::InvalidEmail(msg)
            | ValidationError::InvalidPassword(msg)
            | ValidationError::InvalidRole(msg) => msg.clone(),
        }
    }
}

impl From<ValidationError> for FieldError {
    fn from(err: ValidationError) -> Self {
        FieldError {
            field: err.field().to_string(),
            message: err.message(),
        }
    }
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a display name, returning it trimmed
pub fn validate_name(name: &str) -> ValidationResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ValidationError::InvalidName(
            "Name must not be empty".to_string(),
        ));
    }

    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::InvalidName(format!(
            "Name must be at most {MAX_NAME_LENGTH} characters"
        )));
    }

    Ok(name.to_string())
}

/// Validate an email address, returning it trimmed and lower-cased
pub fn validate_email(email: &str) -> ValidationResult<String> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "Email address cannot be empty".to_string(),
        ));
    }

    if email.len() > MAX_EMAIL_LENGTH {
        return Err(ValidationError::InvalidEmail(format!(
            "Email address cannot exceed {MAX_EMAIL_LENGTH} characters"
        )));
    }

    if !EMAIL_REGEX.is_match(&email) {
        return Err(ValidationError::InvalidEmail(
            "Invalid email address".to_string(),
        ));
    }

    Ok(email)
}

/// Validate a new password
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if len > MAX_PASSWORD_LENGTH {
        return Err(ValidationError::InvalidPassword(format!(
            "Password cannot exceed {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Validate an optional role name
pub fn validate_role(role: Option<&str>) -> ValidationResult<Option<Role>> {
    match role {
        None => Ok(None),
        Some(name) => name.parse().map(Some).map_err(|_| {
            ValidationError::InvalidRole("Role must be one of: user, admin".to_string())
        }),
    }
}

/// A type built from a raw JSON payload after every field check passes
pub trait Validate: Sized {
    type Raw: DeserializeOwned;

    /// Collects every failed check rather than stopping at the first
    fn validate(raw: Self::Raw) -> Result<Self, Vec<FieldError>>;
}

/// Raw body of `POST /signup`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupPayload {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub password: Option<String>,
}

/// Raw body of `POST /signin`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SigninPayload {
    pub email: Option<String>,
    pub password: Option<String>,
}

fn required<'a>(
    value: Option<&'a str>,
    field: &'static str,
    errors: &mut Vec<FieldError>,
) -> Option<&'a str> {
    if value.is_none() {
        errors.push(ValidationError::Missing(field).into());
    }
    value
}

fn check<T>(result: ValidationResult<T>, errors: &mut Vec<FieldError>) -> Option<T> {
    result.map_err(|e| errors.push(e.into())).ok()
}

impl Validate for NewUser {
    type Raw = SignupPayload;

    fn validate(raw: SignupPayload) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let name = required(raw.name.as_deref(), "name", &mut errors)
            .and_then(|n| check(validate_name(n), &mut errors));
        let email = required(raw.email.as_deref(), "email", &mut errors)
            .and_then(|e| check(validate_email(e), &mut errors));
        let password = required(raw.password.as_deref(), "password", &mut errors)
            .and_then(|p| check(validate_password(p), &mut errors));
        let role = check(validate_role(raw.role.as_deref()), &mut errors);

        match (name, email, password, role) {
            (Some(name), Some(email), Some(()), Some(role)) if errors.is_empty() => Ok(NewUser {
                name,
                email,
                role,
                password: raw.password.unwrap_or_default(),
            }),
            _ => Err(errors),
        }
    }
}

impl Validate for Credentials {
    type Raw = SigninPayload;

    fn validate(raw: SigninPayload) -> Result<Self, Vec<FieldError>> {
        let mut errors = Vec::new();

        let email = required(raw.email.as_deref(), "email", &mut errors)
            .and_then(|e| check(validate_email(e), &mut errors));
        let password = match raw.password {
            Some(p) if !p.is_empty() => Some(p),
            Some(_) => {
                errors.push(
                    ValidationError::InvalidPassword("Password is required".to_string()).into(),
                );
                None
            }
            None => {
                errors.push(ValidationError::Missing("password").into());
                None
            }
        };

        match (email, password) {
            (Some(email), Some(password)) if errors.is_empty() => {
                Ok(Credentials { email, password })
            }
            _ => Err(errors),
        }
    }
}

/// JSON extractor that deserializes `T::Raw` and validates it into `T`
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(raw) = Json::<T::Raw>::from_request(req, state)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "JSON parsing failed");
                AppError::Validation(vec![FieldError {
                    field: "body".to_string(),
                    message: e.body_text(),
                }])
            })?;

        T::validate(raw).map(ValidatedJson).map_err(|details| {
            let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
            tracing::warn!(?fields, "Validation failed");
            AppError::Validation(details)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signup(
        name: Option<&str>,
        email: Option<&str>,
        role: Option<&str>,
        password: Option<&str>,
    ) -> SignupPayload {
        SignupPayload {
            name: name.map(String::from),
            email: email.map(String::from),
            role: role.map(String::from),
            password: password.map(String::from),
        }
    }

    fn fields(errors: &[FieldError]) -> Vec<&str> {
        errors.iter().map(|e| e.field.as_str()).collect()
    }

    #[test]
    fn test_validate_email() {
        assert_eq!(validate_email("a@x.com").unwrap(), "a@x.com");
        assert_eq!(validate_email("  Ada@Example.COM ").unwrap(), "ada@example.com");
        assert!(validate_email("user.name+tag@example.co.uk").is_ok());

        assert!(matches!(validate_email(""), Err(ValidationError::InvalidEmail(_))));
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(validate_email("test@"), Err(ValidationError::InvalidEmail(_))));
        assert!(matches!(validate_email("test@example"), Err(ValidationError::InvalidEmail(_))));

        let long = format!("{}@x.com", "a".repeat(250));
        assert!(matches!(validate_email(&long), Err(ValidationError::InvalidEmail(_))));
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("A").unwrap(), "A");
        assert_eq!(validate_name("  Ada Lovelace ").unwrap(), "Ada Lovelace");
        assert!(validate_name("   ").is_err());
        assert!(validate_name(&"a".repeat(256)).is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("secret12").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"a".repeat(129)).is_err());
    }

    #[test]
    fn test_validate_role() {
        assert_eq!(validate_role(None).unwrap(), None);
        assert_eq!(validate_role(Some("admin")).unwrap(), Some(Role::Admin));
        assert_eq!(validate_role(Some("user")).unwrap(), Some(Role::User));
        assert!(validate_role(Some("superuser")).is_err());
        assert!(validate_role(Some("guest")).is_err());
    }

    #[test]
    fn test_signup_payload_valid() {
        let payload = signup(Some("A"), Some("A@X.com"), None, Some("secret12"));
        let user = NewUser::validate(payload).unwrap();
        assert_eq!(user.name, "A");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.role, None);
        assert_eq!(user.password, "secret12");
    }

    #[test]
    fn test_signup_payload_collects_every_error() {
        let payload = signup(None, Some("nope"), Some("root"), Some("123"));
        let errors = NewUser::validate(payload).unwrap_err();
        assert_eq!(fields(&errors), vec!["name", "email", "password", "role"]);
    }

    #[test]
    fn test_signup_payload_missing_everything() {
        let errors = NewUser::validate(SignupPayload::default()).unwrap_err();
        assert_eq!(fields(&errors), vec!["name", "email", "password"]);
        assert!(errors.iter().all(|e| e.message == "Required"));
    }

    #[test]
    fn test_signin_payload() {
        let creds = Credentials::validate(SigninPayload {
            email: Some(" A@x.com".into()),
            password: Some("x".into()),
        })
        .unwrap();
        assert_eq!(creds.email, "a@x.com");

        let errors = Credentials::validate(SigninPayload {
            email: Some("a@x.com".into()),
            password: Some(String::new()),
        })
        .unwrap_err();
        assert_eq!(fields(&errors), vec!["password"]);

        let errors = Credentials::validate(SigninPayload::default()).unwrap_err();
        assert_eq!(fields(&errors), vec!["email", "password"]);
    }
}
