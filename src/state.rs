use std::sync::Arc;
use std::time::Duration;

use crate::access::RouteTable;
use crate::config::AppConfig;
use crate::database::DatabaseManager;
use crate::realtime::ChangeFeed;
use crate::roles::RoleCache;
use crate::services::{
    BillingProvider, BulletinService, Directory, ExpenseService, FormLayoutService, MetricsService, PgDirectory,
    TeamService,
};

/// Everything a request handler needs, built once at bootstrap.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseManager,
    pub directory: Arc<dyn Directory>,
    pub billing: Arc<dyn BillingProvider>,
    pub role_cache: Arc<RoleCache>,
    pub routes: Arc<RouteTable>,
    pub feed: ChangeFeed,
}

impl AppState {
    pub fn new(config: AppConfig, db: DatabaseManager, billing: Arc<dyn BillingProvider>) -> Self {
        let directory: Arc<dyn Directory> = Arc::new(PgDirectory::new(db.pool().clone()));
        let role_cache = Arc::new(RoleCache::new(Duration::from_secs(config.security.role_cache_ttl_secs)));
        let feed = ChangeFeed::new(config.api.realtime_buffer);

        Self {
            config: Arc::new(config),
            db,
            directory,
            billing,
            role_cache,
            routes: Arc::new(RouteTable::default_routes()),
            feed,
        }
    }

    pub fn with_directory(mut self, directory: Arc<dyn Directory>) -> Self {
        self.directory = directory;
        self
    }

    pub fn teams(&self) -> TeamService {
        TeamService::new(self.db.pool().clone(), self.feed.clone())
    }

    pub fn bulletins(&self) -> BulletinService {
        BulletinService::new(self.db.pool().clone(), self.feed.clone())
    }

    pub fn metrics(&self) -> MetricsService {
        MetricsService::new(self.db.pool().clone(), self.feed.clone())
    }

    pub fn expenses(&self) -> ExpenseService {
        ExpenseService::new(self.db.pool().clone(), self.feed.clone())
    }

    pub fn form_layouts(&self) -> FormLayoutService {
        FormLayoutService::new(self.db.pool().clone(), self.feed.clone())
    }
}
