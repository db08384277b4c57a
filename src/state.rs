use std::sync::Arc;

use crate::{db::DbPool, notify::Notifier};

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub notifier: Arc<dyn Notifier>,
}
