//! Translation of pool and Diesel failures into [`AppError`].
//!
//! Driver text is kept only under the `db_error` detail key, which the HTTP
//! adapter strips outside debug mode. Messages stay generic.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use tracing::debug;

use crate::domain::{AppError, ErrorKind};

use super::pool::PoolError;

/// Detail key carrying raw driver output.
pub const DB_ERROR_DETAIL: &str = "db_error";

/// Map a pool failure to a retryable `DB_CONNECTION_ERROR`.
pub fn map_pool_error(error: PoolError) -> AppError {
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    debug!(%message, "database pool failure");
    AppError::new(ErrorKind::DbConnectionError, "database connection error")
        .with_detail(DB_ERROR_DETAIL, message)
        .with_retryable(true)
}

/// Map a Diesel failure onto the error taxonomy.
///
/// | Diesel error                  | Kind                   | Retryable |
/// |-------------------------------|------------------------|-----------|
/// | `NotFound`                    | `RECORD_NOT_FOUND`     | no        |
/// | unique violation              | `DUPLICATE_RECORD`     | no        |
/// | closed connection             | `DB_CONNECTION_ERROR`  | yes       |
/// | serialization failure         | `DB_TRANSACTION_ERROR` | yes       |
/// | anything else                 | `DB_ERROR`             | no        |
pub fn map_diesel_error(error: DieselError) -> AppError {
    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(error = ?error, "diesel operation failed"),
    }

    let raw = error.to_string();
    let mapped = match &error {
        DieselError::NotFound => return AppError::not_found("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
            let duplicate = AppError::new(ErrorKind::DuplicateRecord, "record already exists");
            match info.constraint_name() {
                Some(constraint) => duplicate.with_detail("constraint", constraint),
                None => duplicate,
            }
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            AppError::new(ErrorKind::DbConnectionError, "database connection error")
                .with_retryable(true)
        }
        DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, _) => {
            AppError::new(ErrorKind::DbTransactionError, "database transaction conflict")
                .with_retryable(true)
        }
        _ => AppError::new(ErrorKind::DbError, "database error"),
    };
    mapped.with_detail(DB_ERROR_DETAIL, raw)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use rstest::rstest;

    fn database_error(kind: DatabaseErrorKind, message: &str) -> DieselError {
        DieselError::DatabaseError(kind, Box::new(message.to_owned()))
    }

    #[rstest]
    #[case(PoolError::checkout("timed out waiting for connection"))]
    #[case(PoolError::build("invalid connection string"))]
    fn pool_errors_are_retryable_connection_failures(#[case] error: PoolError) {
        let mapped = map_pool_error(error);
        assert_eq!(mapped.kind(), ErrorKind::DbConnectionError);
        assert_eq!(mapped.status_code(), 503);
        assert!(mapped.is_retryable());
        assert!(mapped.details().contains_key(DB_ERROR_DETAIL));
        assert_eq!(mapped.message(), "database connection error");
    }

    #[rstest]
    fn not_found_carries_no_driver_detail() {
        let mapped = map_diesel_error(DieselError::NotFound);
        assert_eq!(mapped.kind(), ErrorKind::RecordNotFound);
        assert!(mapped.details().is_empty());
    }

    #[derive(Clone, Default)]
    struct CapturedLog(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLog {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0
                .lock()
                .expect("log buffer lock")
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[rstest]
    fn other_diesel_errors_log_the_variant() {
        let log = CapturedLog::default();
        let writer = log.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let mapped = tracing::subscriber::with_default(subscriber, || {
            map_diesel_error(DieselError::RollbackTransaction)
        });

        assert_eq!(mapped.kind(), ErrorKind::DbError);
        assert!(mapped.details().contains_key(DB_ERROR_DETAIL));
        let output = String::from_utf8(log.0.lock().expect("log buffer lock").clone())
            .expect("utf8 log");
        assert!(output.contains("error=RollbackTransaction"), "{output}");
    }

    #[rstest]
    #[case(DatabaseErrorKind::UniqueViolation, ErrorKind::DuplicateRecord, false)]
    #[case(DatabaseErrorKind::ClosedConnection, ErrorKind::DbConnectionError, true)]
    #[case(DatabaseErrorKind::SerializationFailure, ErrorKind::DbTransactionError, true)]
    #[case(DatabaseErrorKind::ForeignKeyViolation, ErrorKind::DbError, false)]
    #[case(DatabaseErrorKind::CheckViolation, ErrorKind::DbError, false)]
    fn database_errors_map_by_kind(
        #[case] kind: DatabaseErrorKind,
        #[case] expected: ErrorKind,
        #[case] retryable: bool,
    ) {
        let mapped = map_diesel_error(database_error(kind, "violates something"));
        assert_eq!(mapped.kind(), expected);
        assert_eq!(mapped.is_retryable(), retryable);
        assert_eq!(
            mapped.details().get(DB_ERROR_DETAIL).and_then(|v| v.as_str()),
            Some("violates something")
        );
        assert!(!mapped.message().contains("violates"));
    }
}
