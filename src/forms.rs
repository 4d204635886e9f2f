//! Login and registration forms.
//!
//! Field rules are declared with `validator`; messages for a field are shown
//! next to it, form-wide messages (CSRF failures, bad credentials, failed
//! commits) above the form.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};
use subtle::ConstantTimeEq;
use validator::{Validate, ValidationError, ValidationErrors};

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "Passwords must match";
pub const CSRF_MISSING_MESSAGE: &str = "The CSRF token is missing.";
pub const CSRF_SESSION_MISSING_MESSAGE: &str = "The CSRF session token is missing.";
pub const CSRF_INVALID_MESSAGE: &str = "The CSRF token is invalid.";

/// Reject empty (or whitespace-only) input.
fn required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("required");
        error.message = Some(REQUIRED_MESSAGE.into());
        return Err(error);
    }
    Ok(())
}

/// Treat a blank optional field as absent.
fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.trim().is_empty()))
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct LoginForm {
    #[serde(default)]
    #[validate(custom(function = "required"))]
    pub username: String,
    #[serde(default)]
    #[validate(custom(function = "required"))]
    pub password: String,
    /// Checkbox; browsers send it only when ticked.
    #[serde(default)]
    pub remember_me: Option<String>,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

impl LoginForm {
    pub fn remember(&self) -> bool {
        match self.remember_me.as_deref() {
            Some(value) => !matches!(
                value.to_ascii_lowercase().as_str(),
                "" | "false" | "off" | "0" | "no"
            ),
            None => false,
        }
    }
}

#[derive(Debug, Default, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterForm {
    #[serde(default)]
    #[validate(
        custom(function = "required"),
        length(min = 3, max = 80, message = "Field must be between 3 and 80 characters long.")
    )]
    pub username: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    #[validate(
        email(message = "Invalid email address."),
        length(max = 120, message = "Field cannot be longer than 120 characters.")
    )]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(
        custom(function = "required"),
        length(min = 6, message = "Field must be at least 6 characters long.")
    )]
    pub password: String,
    #[serde(default)]
    #[validate(
        custom(function = "required"),
        must_match(other = "password", message = "Passwords must match")
    )]
    pub password2: String,
    #[serde(default)]
    pub csrf_token: Option<String>,
}

/// A form posted by the browser.
pub trait SubmittedForm: Validate {
    /// Field names in declaration order.
    const FIELDS: &'static [&'static str];

    fn submitted_csrf_token(&self) -> Option<&str>;
}

impl SubmittedForm for LoginForm {
    const FIELDS: &'static [&'static str] = &["username", "password"];

    fn submitted_csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }
}

impl SubmittedForm for RegisterForm {
    const FIELDS: &'static [&'static str] = &["username", "email", "password", "password2"];

    fn submitted_csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }
}

/// Messages collected while validating a submission.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<&'static str, String>,
    form: Vec<String>,
}

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.form.is_empty()
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn form(&self) -> &[String] {
        &self.form
    }

    /// Record a message for `name`, keeping an earlier one if present.
    pub fn add_field(&mut self, name: &'static str, message: impl Into<String>) {
        self.fields.entry(name).or_insert_with(|| message.into());
    }

    pub fn add_form(&mut self, message: impl Into<String>) {
        self.form.push(message.into());
    }

    fn from_validation(errors: &ValidationErrors, fields: &[&'static str]) -> Self {
        let mut collected = FormErrors::default();
        let by_field = errors.field_errors();

        for name in fields {
            if let Some(field_errors) = by_field.get(*name) {
                if let Some(message) = first_message(field_errors) {
                    collected.add_field(name, message);
                }
            }
        }
        collected
    }
}

/// "Required" wins over every other failure on the same field.
fn first_message(errors: &[ValidationError]) -> Option<String> {
    let error = errors
        .iter()
        .find(|e| e.code == "required")
        .or_else(|| errors.first())?;

    Some(match &error.message {
        Some(message) => message.to_string(),
        None => format!("Invalid value ({}).", error.code),
    })
}

/// Compare the submitted anti-forgery token with the session's.
pub fn check_csrf(session_token: Option<&str>, submitted: Option<&str>) -> Result<(), &'static str> {
    let submitted = match submitted {
        Some(token) if !token.is_empty() => token,
        _ => return Err(CSRF_MISSING_MESSAGE),
    };
    let Some(expected) = session_token else {
        return Err(CSRF_SESSION_MISSING_MESSAGE);
    };
    if !bool::from(submitted.as_bytes().ct_eq(expected.as_bytes())) {
        return Err(CSRF_INVALID_MESSAGE);
    }
    Ok(())
}

/// Run the CSRF check (when enabled) and the field rules of `form`.
pub fn validate_on_submit<F: SubmittedForm>(
    form: &F,
    csrf_enabled: bool,
    session_token: Option<&str>,
) -> FormErrors {
    let mut errors = match form.validate() {
        Ok(()) => FormErrors::default(),
        Err(validation) => FormErrors::from_validation(&validation, F::FIELDS),
    };

    if csrf_enabled {
        if let Err(message) = check_csrf(session_token, form.submitted_csrf_token()) {
            errors.add_form(message);
        }
    }
    errors
}
