use crate::common::artifacts::ArtifactStore;
use crate::config::settings::AppConfig;
use crate::infrastructure::db::pool::DbPool;
use crate::infrastructure::queue::rabbitmq::RabbitMqService;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub queue: RabbitMqService,
    pub artifacts: ArtifactStore,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DbPool,
        queue: RabbitMqService,
        artifacts: ArtifactStore,
    ) -> Self {
        Self {
            config,
            db,
            queue,
            artifacts,
        }
    }
}
