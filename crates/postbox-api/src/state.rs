use std::sync::Arc;

use postbox_db::Store;

use crate::error::ApiError;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: Arc<dyn Store>,
}

impl AppStateInner {
    pub fn new(store: Arc<dyn Store>) -> AppState {
        Arc::new(Self { store })
    }
}

/// Runs a store call on the blocking pool so SQLite never stalls the async workers.
pub(crate) async fn run_blocking<F, T>(state: &AppState, f: F) -> Result<T, ApiError>
where
    F: FnOnce(&dyn Store) -> anyhow::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let store = state.store.clone();
    let out = tokio::task::spawn_blocking(move || f(store.as_ref())).await??;
    Ok(out)
}
