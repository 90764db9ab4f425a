//! Store error type

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("An entry already exists for {application_name} on {date}")]
    Conflict {
        date: String,
        application_name: String,
    },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// Classify a failed entry write: a unique-index violation on
    /// `(date, application_name)` is a conflict, anything else a database error
    pub fn from_entry_write(err: sqlx::Error, date: &str, application_name: &str) -> Self {
        let unique_violation = matches!(
            &err,
            sqlx::Error::Database(db_err) if db_err.is_unique_violation()
        );

        if unique_violation {
            StoreError::Conflict {
                date: date.to_string(),
                application_name: application_name.to_string(),
            }
        } else {
            StoreError::Database(err)
        }
    }
}
