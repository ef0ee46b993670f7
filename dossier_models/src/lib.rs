pub mod content;
pub mod document;
pub mod person;
pub mod prelude;

#[cfg(any(test, feature = "testing"))]
pub mod fixtures;

// Export all models at crate root
pub use content::Content;
pub use document::Document;
pub use person::Person;

use database::DatabaseError;

use diesel::result::DatabaseErrorKind;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unique constraint violation of \"{constraint}\"")]
    UniqueViolation { constraint: String },
    #[error("foreign key constraint violation of \"{constraint}\"")]
    ForeignKeyViolation { constraint: String },
    #[error(transparent)]
    DatabaseError(#[from] DatabaseError),
}

impl From<diesel::result::Error> for Error {
    fn from(e: diesel::result::Error) -> Self {
        match &e {
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, inner) => {
                match inner.constraint_name() {
                    Some(constraint) => Self::UniqueViolation {
                        constraint: constraint.to_owned(),
                    },
                    // PostgreSQL always names the constraint, but falling back to the
                    // generic error is still semantically correct
                    None => Self::DatabaseError(e.into()),
                }
            }
            diesel::result::Error::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, inner) => {
                match inner.constraint_name() {
                    Some(constraint) => Self::ForeignKeyViolation {
                        constraint: constraint.to_owned(),
                    },
                    None => Self::DatabaseError(e.into()),
                }
            }
            _ => Self::DatabaseError(e.into()),
        }
    }
}
