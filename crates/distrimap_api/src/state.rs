//! Shared application state.
//!
//! # Responsibility
//! - Own the single store connection and the validated server config.
//! - Run store work on the blocking pool so request tasks never block.
//!
//! # Invariants
//! - Every store access goes through `with_directory`, one request at a time.
//! - The directory schema is checked once, when the state is built.
//! - The connection is closed explicitly by `close` or on the last drop.

use crate::config::ServerConfig;
use crate::error::ApiResult;
use distrimap_core::db::{ensure_directory_schema, DbResult};
use distrimap_core::{DirectoryService, RepoResult, SqliteDistributeurRepository};
use log::{info, warn};
use parking_lot::Mutex;
use rusqlite::Connection;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    store: Arc<Mutex<Connection>>,
    config: Arc<ServerConfig>,
    started_at: Instant,
}

impl AppState {
    /// Wraps an opened, migrated connection.
    ///
    /// # Errors
    /// - `DbError::MissingTable`/`MissingColumn` when the directory schema is
    ///   incomplete.
    pub fn try_new(conn: Connection, config: ServerConfig) -> DbResult<Self> {
        ensure_directory_schema(&conn)?;
        Ok(Self {
            store: Arc::new(Mutex::new(conn)),
            config: Arc::new(config),
            started_at: Instant::now(),
        })
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    /// Runs `operation` against a directory service on the blocking pool.
    ///
    /// # Errors
    /// - Repository errors map through `ApiError::from`.
    /// - A panicked or cancelled store task becomes `ApiError::Internal`.
    pub async fn with_directory<T, F>(&self, operation: F) -> ApiResult<T>
    where
        T: Send + 'static,
        F: for<'conn> FnOnce(
                &mut DirectoryService<SqliteDistributeurRepository<'conn>>,
            ) -> RepoResult<T>
            + Send
            + 'static,
    {
        let store = Arc::clone(&self.store);
        let result = tokio::task::spawn_blocking(move || {
            let mut conn = store.lock();
            let repo = SqliteDistributeurRepository::from_verified(&mut conn);
            let mut service = DirectoryService::new(repo);
            operation(&mut service)
        })
        .await?;
        Ok(result?)
    }

    /// Closes the store connection if no request still holds it.
    ///
    /// # Errors
    /// - Returns the SQLite error raised while closing.
    pub fn close(self) -> Result<(), rusqlite::Error> {
        match Arc::try_unwrap(self.store) {
            Ok(store) => {
                store.into_inner().close().map_err(|(_, err)| err)?;
                info!("event=db_close module=api status=ok");
                Ok(())
            }
            Err(_) => {
                warn!("event=db_close module=api status=deferred reason=store_still_shared");
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::AppState;
    use crate::config::ServerConfig;
    use crate::error::ApiError;
    use distrimap_core::db::{open_db_in_memory, DbError};
    use distrimap_core::RepoError;
    use rusqlite::Connection;
    use uuid::Uuid;

    #[tokio::test]
    async fn with_directory_runs_store_work_and_maps_errors() {
        let state =
            AppState::try_new(open_db_in_memory().unwrap(), ServerConfig::default()).unwrap();

        let villes = state
            .with_directory(|directory| directory.villes())
            .await
            .unwrap();
        assert!(villes.is_empty());

        let missing = Uuid::new_v4();
        let err = state
            .with_directory(move |directory| directory.delete(missing))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(id) if id == missing));

        let err = state
            .with_directory(|_| -> Result<(), RepoError> {
                Err(RepoError::InvalidData("broken row".to_string()))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn close_succeeds_when_state_is_unshared() {
        let state =
            AppState::try_new(open_db_in_memory().unwrap(), ServerConfig::default()).unwrap();
        state.close().unwrap();
    }

    #[test]
    fn try_new_rejects_connection_without_directory_schema() {
        let conn = Connection::open_in_memory().unwrap();
        let err = AppState::try_new(conn, ServerConfig::default())
            .err()
            .expect("unmigrated connection must be rejected");
        assert!(matches!(err, DbError::MissingTable("distributeurs")));
    }
}
