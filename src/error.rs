//! Error handler for unifyr.

use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::crypto::CryptoError;
use crate::database::StorageError;

pub type Result<T> = std::result::Result<T, Error>;

/// Enum representing every failure a user action can end with.
#[derive(Debug, Error)]
pub enum Error {
    #[error("validation error occurred")]
    Validation(#[from] ValidationErrors),

    #[error("this email is reserved for admin use only")]
    EmailReserved,
    #[error("email already registered, please login instead")]
    EmailTaken,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("password must contain at least {min_length} characters")]
    WeakPassword { min_length: usize },
    #[error("passwords do not match")]
    PasswordMismatch,
    #[error("current password is incorrect")]
    IncorrectCurrentPassword,
    #[error("user not found")]
    UserNotFound,
    #[error("no active session")]
    NotAuthenticated,
    #[error("admin role required")]
    Forbidden,

    #[error("order {0} not found")]
    OrderNotFound(String),
    #[error("unknown service category {0:?}")]
    UnknownCategory(String),
    #[error("price must be a non-negative amount")]
    InvalidPrice,
    #[error("invalid profile picture, {0}")]
    InvalidAvatar(&'static str),

    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("internal error, {details}")]
    Internal {
        details: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl Error {
    pub fn internal<E>(details: &str, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Internal {
            details: details.to_owned(),
            source: Some(Box::new(err)),
        }
    }
}

/// How a failure is surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Next to the offending form field.
    Inline,
    /// General message above the form.
    Banner,
    /// Blocking alert.
    Alert,
}

/// Structure for detailed user feedback.
#[derive(Debug, Serialize)]
pub struct Feedback {
    pub severity: Severity,
    pub title: String,
    pub detail: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl Feedback {
    /// Update feedback severity.
    pub fn severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Update `title` field.
    pub fn title(mut self, title: &str) -> Self {
        self.title = title.into();
        self
    }

    /// Add detailed message.
    pub fn details(mut self, description: &str) -> Self {
        self.detail = description.into();
        self
    }

    /// Automatically add errors field.
    pub fn errors(mut self, errors: &ValidationErrors) -> Self {
        self.errors = parse_validation_errors(errors);
        self
    }

    /// Single field error, used when a domain check is reported inline.
    fn field(mut self, field: &str, message: String) -> Self {
        self.errors = vec![FieldError {
            field: field.to_owned(),
            message,
        }];
        self
    }
}

impl Default for Feedback {
    fn default() -> Self {
        Self {
            severity: Severity::Alert,
            title: "Something went wrong.".to_owned(),
            detail: String::default(),
            errors: Vec::new(),
        }
    }
}

/// Message attached to one form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

fn parse_validation_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut fields = errors
        .field_errors()
        .iter()
        .flat_map(|(field, issues)| {
            issues.iter().map(move |issue| FieldError {
                field: field.to_string(),
                message: issue
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| issue.code.to_string()),
            })
        })
        .collect::<Vec<_>>();
    // HashMap order is random.
    fields.sort_by(|a, b| a.field.cmp(&b.field));
    fields
}

impl From<&Error> for Feedback {
    fn from(err: &Error) -> Self {
        let inline = Feedback::default()
            .severity(Severity::Inline)
            .title("There were validation errors with your input.")
            .details(&err.to_string());
        let banner = Feedback::default()
            .severity(Severity::Banner)
            .title("Authentication failed.")
            .details(&err.to_string());

        match err {
            Error::Validation(errors) => inline.errors(errors),
            Error::EmailReserved | Error::EmailTaken => {
                inline.field("email", err.to_string())
            },
            Error::WeakPassword { .. } => {
                inline.field("newPassword", err.to_string())
            },
            Error::PasswordMismatch => {
                inline.field("confirmPassword", err.to_string())
            },
            Error::InvalidAvatar(_) => {
                inline.field("profilePicture", err.to_string())
            },
            Error::InvalidPrice => inline.field("price", err.to_string()),
            Error::UnknownCategory(_) => {
                inline.field("service", err.to_string())
            },

            Error::InvalidCredentials
            | Error::IncorrectCurrentPassword
            | Error::UserNotFound => banner,
            Error::NotAuthenticated | Error::Forbidden => {
                banner.title("Access denied.")
            },

            Error::OrderNotFound(_) => Feedback::default()
                .title("Order not found.")
                .details(&err.to_string()),
            Error::Internal { details, source } => {
                tracing::error!(err = ?source, %details, "action failed");
                Feedback::default()
            },
            Error::Storage(_) | Error::Crypto(_) => {
                tracing::error!(error = %err, "action failed");
                Feedback::default().details(&err.to_string())
            },
        }
    }
}
