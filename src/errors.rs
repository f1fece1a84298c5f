use sea_orm::error::DbErr;
use serde::Serialize;

/// Error returned by every data operation in the crate.
///
/// The presentation layer shows [`ServiceError::user_message`] to the user and
/// may branch on [`ServiceError::kind`]. A failed operation never leaves a
/// partial write behind.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Line {index} is out of range for a cart of {len} line(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

/// Stable error category, independent of the message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[strum(serialize = "database")]
    Database,
    #[strum(serialize = "validation")]
    Validation,
    #[strum(serialize = "not_found")]
    NotFound,
    #[strum(serialize = "conflict")]
    Conflict,
    #[strum(serialize = "index")]
    Index,
    #[strum(serialize = "insufficient_stock")]
    InsufficientStock,
    #[strum(serialize = "internal")]
    Internal,
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(first_validation_message(&err))
    }
}

/// Picks the first field message so the user sees one actionable sentence.
fn first_validation_message(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| *field);

    fields
        .into_iter()
        .find_map(|(field, errs)| {
            errs.first().map(|e| match &e.message {
                Some(message) => message.to_string(),
                None => format!("{} is invalid", field),
            })
        })
        .unwrap_or_else(|| errors.to_string())
}

impl ServiceError {
    pub fn validation(message: impl Into<String>) -> Self {
        ServiceError::ValidationError(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ServiceError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ServiceError::Conflict(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::DatabaseError(_) => ErrorKind::Database,
            Self::ValidationError(_) => ErrorKind::Validation,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::IndexOutOfRange { .. } => ErrorKind::Index,
            Self::InsufficientStock(_) => ErrorKind::InsufficientStock,
            Self::InternalError(_) => ErrorKind::Internal,
        }
    }

    /// Message suitable for a dialog box or terminal line.
    /// Engine errors are reported generically; the detail goes to the log.
    pub fn user_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "A database error occurred".to_string(),
            Self::InternalError(_) => "An internal error occurred".to_string(),
            Self::ValidationError(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::InsufficientStock(msg) => msg.clone(),
            Self::IndexOutOfRange { .. } => self.to_string(),
        }
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Form {
        #[validate(length(min = 1, message = "First name is required"))]
        first_name: String,
    }

    #[test]
    fn validation_errors_surface_the_field_message() {
        let err: ServiceError = Form {
            first_name: String::new(),
        }
        .validate()
        .unwrap_err()
        .into();

        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.user_message(), "First name is required");
    }

    #[test]
    fn database_errors_hide_engine_details() {
        let err = ServiceError::from(DbErr::Custom("disk I/O error".into()));
        assert_eq!(err.kind(), ErrorKind::Database);
        assert_eq!(err.user_message(), "A database error occurred");
        assert!(err.to_string().contains("disk I/O error"));
    }

    #[test]
    fn index_errors_report_bounds() {
        let err = ServiceError::IndexOutOfRange { index: 3, len: 2 };
        assert_eq!(err.kind().to_string(), "index");
        assert_eq!(
            err.user_message(),
            "Line 3 is out of range for a cart of 2 line(s)"
        );
    }
}
