use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use matchum_core::foods::FoodTable;
use matchum_core::regression::{self, LoadedModel};
use matchum_core::session::SessionContext;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::AppError;
use crate::gemini::GeminiClient;

/// A shared read-only component that may have failed to load. Views that
/// need it answer 503 instead of taking the process down.
#[derive(Debug)]
pub enum Component<T> {
    Ready(Arc<T>),
    Unavailable(Arc<str>),
}

impl<T> Clone for Component<T> {
    fn clone(&self) -> Self {
        match self {
            Component::Ready(value) => Component::Ready(Arc::clone(value)),
            Component::Unavailable(reason) => Component::Unavailable(Arc::clone(reason)),
        }
    }
}

impl<T> Component<T> {
    pub fn ready(value: T) -> Self {
        Component::Ready(Arc::new(value))
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        let reason: String = reason.into();
        Component::Unavailable(Arc::from(reason))
    }

    pub fn get(&self) -> Result<&T, AppError> {
        match self {
            Component::Ready(value) => Ok(value.as_ref()),
            Component::Unavailable(reason) => Err(AppError::Unavailable {
                message: reason.to_string(),
            }),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Component::Ready(_))
    }
}

#[derive(Debug, Clone)]
struct SessionEntry {
    context: SessionContext,
    last_seen: DateTime<Utc>,
}

/// In-memory sessions keyed by id. Entries idle longer than `ttl` are
/// dropped whenever a new session is created.
#[derive(Debug, Clone)]
pub struct SessionStore {
    inner: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn create(&self) -> (Uuid, DateTime<Utc>) {
        let now = Utc::now();
        let id = Uuid::now_v7();
        let mut sessions = self.inner.write().await;

        let before = sessions.len();
        sessions.retain(|_, entry| now - entry.last_seen <= self.ttl);
        let pruned = before - sessions.len();
        if pruned > 0 {
            tracing::debug!(pruned, "Pruned idle sessions");
        }

        sessions.insert(
            id,
            SessionEntry {
                context: SessionContext::default(),
                last_seen: now,
            },
        );
        (id, now + self.ttl)
    }

    /// Run `f` against the session under the write lock and refresh its
    /// idle timer. `None` when the session does not exist or has expired.
    pub async fn with_session<R>(
        &self,
        id: Uuid,
        f: impl FnOnce(&mut SessionContext) -> R,
    ) -> Option<R> {
        let now = Utc::now();
        let mut sessions = self.inner.write().await;
        let expired = sessions
            .get(&id)
            .map(|entry| now - entry.last_seen > self.ttl)?;
        if expired {
            sessions.remove(&id);
            return None;
        }
        let entry = sessions.get_mut(&id)?;
        entry.last_seen = now;
        Some(f(&mut entry.context))
    }
}

#[cfg(test)]
impl SessionStore {
    pub async fn snapshot(&self, id: Uuid) -> Option<SessionContext> {
        self.with_session(id, |context| context.clone()).await
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}

#[derive(Clone)]
pub struct AppState {
    pub foods: Component<FoodTable>,
    pub calorie_model: Component<LoadedModel>,
    pub gemini: Component<GeminiClient>,
    pub sessions: SessionStore,
}

impl AppState {
    /// Load every component named by `config`. Failures are logged and
    /// leave only the affected views disabled.
    pub fn load(config: &AppConfig) -> Self {
        let foods = match FoodTable::from_path(&config.food_table_path) {
            Ok(table) => {
                tracing::info!(
                    path = %config.food_table_path.display(),
                    foods = table.len(),
                    "Loaded food table"
                );
                Component::ready(table)
            }
            Err(err) => {
                tracing::error!(
                    path = %config.food_table_path.display(),
                    error = %err,
                    "Food table unavailable, food views disabled"
                );
                Component::unavailable(format!("음식 데이터를 불러올 수 없습니다: {err}"))
            }
        };

        let calorie_model =
            match regression::load_or_bootstrap(&config.calorie_model_path, config.bootstrap_model)
            {
                Ok(model) => {
                    tracing::info!(
                        path = %config.calorie_model_path.display(),
                        provisional = model.is_provisional(),
                        "Loaded calorie model"
                    );
                    Component::ready(model)
                }
                Err(err) => {
                    tracing::error!(
                        path = %config.calorie_model_path.display(),
                        error = %err,
                        "Calorie model unavailable, analyzer disabled"
                    );
                    Component::unavailable(err.to_string())
                }
            };

        let gemini = match GeminiClient::from_config(&config.gemini) {
            Some(client) => {
                tracing::info!(model = client.model(), "Gemini client configured");
                Component::ready(client)
            }
            None => {
                tracing::warn!("GEMINI_API_KEY not set, AI views disabled");
                Component::unavailable(
                    "GEMINI_API_KEY가 설정되지 않았습니다. .env 파일을 확인해주세요.",
                )
            }
        };

        Self {
            foods,
            calorie_model,
            gemini,
            sessions: SessionStore::new(Duration::minutes(config.session_ttl_minutes)),
        }
    }
}
