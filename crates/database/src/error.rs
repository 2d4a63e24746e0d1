use model::SchedulerError;

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("not found")]
    NotFound,
    #[error("conflict: {0}")]
    Conflict(String),
    #[error(transparent)]
    Other(#[from] sqlx::Error),
}

impl From<DatabaseError> for SchedulerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound => SchedulerError::NotFound("not found".to_owned()),
            DatabaseError::Conflict(message) => SchedulerError::Conflict(message),
            DatabaseError::Other(why) => SchedulerError::Internal(why.to_string()),
        }
    }
}

pub fn convert_sqlx_error(why: sqlx::Error) -> DatabaseError {
    match why {
        sqlx::Error::RowNotFound => DatabaseError::NotFound,
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            DatabaseError::Conflict(db_err.message().to_owned())
        }
        other => DatabaseError::Other(other),
    }
}
