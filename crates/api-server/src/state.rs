//! Application state

use std::sync::Arc;

use tm_core::task::{FileTaskStore, TaskService};
use tm_core::RequestContext;

use crate::config::Config;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    service: TaskService,
    config: Config,
    /// Root of every request context; cancelled on shutdown
    shutdown: RequestContext,
}

impl AppState {
    /// Load the task file named in `config` and build the state
    pub async fn new(config: Config, shutdown: RequestContext) -> tm_core::Result<Self> {
        let storage = Arc::new(FileTaskStore::new(&config.tasks_file));
        let service = TaskService::init(&shutdown, storage).await?;
        Ok(Self::from_service(service, config, shutdown))
    }

    pub fn from_service(service: TaskService, config: Config, shutdown: RequestContext) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                service,
                config,
                shutdown,
            }),
        }
    }

    pub fn service(&self) -> &TaskService {
        &self.inner.service
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn shutdown(&self) -> &RequestContext {
        &self.inner.shutdown
    }
}
