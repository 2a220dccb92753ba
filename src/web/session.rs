use super::{AppError, AppState};
use crate::models::SessionData;
use crate::storage::{SessionStorage, SessionToken, StorageError};
use crate::store::TodoStore;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Runs a storage call on the blocking pool so disk and SQLite work never
/// stalls a runtime worker.
async fn blocking<T, F>(storage: &Arc<dyn SessionStorage>, func: F) -> Result<T, AppError>
where
    T: Send + 'static,
    F: FnOnce(&dyn SessionStorage) -> Result<T, StorageError> + Send + 'static,
{
    let storage = Arc::clone(storage);
    let result = tokio::task::spawn_blocking(move || func(storage.as_ref()))
        .await
        .map_err(|e| AppError::Internal(format!("Storage task failed: {}", e)))?;
    Ok(result?)
}

/// Sessions last written before this instant have expired. `None` when the
/// age reaches past the start of the calendar.
pub fn expiry_cutoff(max_age: Duration) -> Option<DateTime<Utc>> {
    let age = chrono::Duration::from_std(max_age).ok()?;
    Utc::now().checked_sub_signed(age)
}

/// Drops every expired session. Returns how many were removed.
pub async fn prune_expired(app: &AppState) -> Result<usize, AppError> {
    let Some(cutoff) = expiry_cutoff(app.max_age) else {
        return Ok(0);
    };
    blocking(&app.storage, move |storage| storage.prune_before(cutoff)).await
}

/// Prunes expired sessions now and then once per `every`.
pub fn spawn_pruner(app: AppState, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            match prune_expired(&app).await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "pruned expired sessions"),
                Err(e) => tracing::warn!(error = %e, "session pruning failed"),
            }
        }
    })
}

/// The store of one request, loaded from and written back to session storage.
///
/// Nothing is written unless the store reports a modification; a session
/// that ends up empty is deleted rather than saved.
pub struct Session {
    token: Option<SessionToken>,
    store: TodoStore,
}

impl Session {
    fn fresh() -> Self {
        Self {
            token: None,
            store: TodoStore::default(),
        }
    }

    pub async fn load(app: &AppState, jar: &CookieJar) -> Result<Self, AppError> {
        let token = jar
            .get(&app.cookie_name)
            .and_then(|cookie| SessionToken::parse(cookie.value().trim_matches('"')));
        let Some(token) = token else {
            return Ok(Self::fresh());
        };

        let lookup = token.clone();
        let Some(data) = blocking(&app.storage, move |storage| storage.load(&lookup)).await?
        else {
            tracing::debug!("unknown session token, starting a new session");
            return Ok(Self::fresh());
        };

        if is_expired(&data, app.max_age) {
            tracing::debug!(updated_at = %data.updated_at, "session expired");
            blocking(&app.storage, move |storage| storage.delete(&token)).await?;
            return Ok(Self::fresh());
        }

        Ok(Self {
            token: Some(token),
            store: TodoStore::new(data),
        })
    }

    pub fn store(&self) -> &TodoStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut TodoStore {
        &mut self.store
    }

    pub async fn commit(self, app: &AppState, response: Response) -> Result<Response, AppError> {
        if !self.store.is_modified() {
            return Ok(response);
        }

        let mut data = self.store.into_data();
        data.updated_at = Utc::now();

        match self.token {
            Some(token) if data.is_empty() => {
                tracing::debug!("session emptied, removing it");
                blocking(&app.storage, move |storage| storage.delete(&token)).await?;
                Ok(response)
            }
            Some(token) => {
                blocking(&app.storage, move |storage| storage.save(&token, &data)).await?;
                Ok(response)
            }
            None if data.is_empty() => Ok(response),
            None => {
                let token = SessionToken::generate();
                let value = token.to_string();
                blocking(&app.storage, move |storage| storage.save(&token, &data)).await?;
                let cookie = Cookie::build((app.cookie_name.to_string(), value))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax);
                tracing::debug!("started new session");
                Ok((CookieJar::new().add(cookie), response).into_response())
            }
        }
    }
}

fn is_expired(data: &SessionData, max_age: Duration) -> bool {
    expiry_cutoff(max_age).is_some_and(|cutoff| data.updated_at < cutoff)
}
