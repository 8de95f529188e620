use crate::domain::{PageBounds, PageRequest, SocialResult};
use crate::infra::app_config::{AppConfig, load_config};
use crate::infra::db::Database;
use crate::utils::MediaResolver;

/// Everything a handler needs: storage, limits, and media URL resolution.
pub struct AppState {
    pub db: Database,
    pub config: AppConfig,
    pub media: MediaResolver,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        let media = MediaResolver::new(config.storage_base_url.clone());
        Self { db, config, media }
    }

    /// Load the config file and open the configured database.
    pub fn open() -> anyhow::Result<Self> {
        let config = load_config();
        let db = Database::open()?;
        Ok(Self::new(db, config))
    }

    pub fn in_memory() -> anyhow::Result<Self> {
        Ok(Self::new(Database::open_in_memory()?, AppConfig::default()))
    }

    pub fn page_bounds(&self, request: &PageRequest) -> SocialResult<PageBounds> {
        request.bounds(self.config.default_page_size, self.config.max_page_size)
    }
}
