use std::{fs::read_to_string, sync::Arc};

use tracing::warn;

use crate::{
    config::Config,
    database::{MemoryStore, RedisStore, ReportStore},
    render::REPORT_TEMPLATE,
};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ReportStore>,
    pub template: String,
}

impl AppState {
    pub async fn new() -> Arc<Self> {
        let config = Config::load();

        let store: Arc<dyn ReportStore> = match &config.redis_url {
            Some(redis_url) => Arc::new(RedisStore::connect(redis_url).await),
            None => {
                warn!("REDIS_URL not set, reports are stored in process memory");
                Arc::new(MemoryStore::new())
            }
        };

        Arc::new(Self::with_store(config, store))
    }

    /// Builds state around an arbitrary store. Tests drive the production
    /// router through this with a `MemoryStore`.
    pub fn with_store(config: Config, store: Arc<dyn ReportStore>) -> Self {
        let template = load_template(config.template_path.as_deref());

        Self {
            config,
            store,
            template,
        }
    }
}

fn load_template(path: Option<&str>) -> String {
    let Some(path) = path else {
        return REPORT_TEMPLATE.to_string();
    };

    match read_to_string(path) {
        Ok(template) => template,
        Err(e) => {
            warn!("Failed to read report template from {path}: {e}");
            REPORT_TEMPLATE.to_string()
        }
    }
}
