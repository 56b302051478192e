use std::sync::Arc;

use crate::config::Config;
use crate::db::connection::DbPool;
use crate::services::attendance_cache::AttendanceCacheTrait;
use crate::services::notifier::FlagNotifierTrait;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Config,
    pub cache: Arc<dyn AttendanceCacheTrait>,
    pub notifier: Arc<dyn FlagNotifierTrait>,
}

impl AppState {
    pub fn new(
        pool: DbPool,
        config: Config,
        cache: Arc<dyn AttendanceCacheTrait>,
        notifier: Arc<dyn FlagNotifierTrait>,
    ) -> Self {
        Self {
            pool,
            config,
            cache,
            notifier,
        }
    }
}
