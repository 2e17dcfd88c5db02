use crate::config::Config;
use crate::gateway::TriviaGateway;
use crate::memory::InMemoryGateway;
use crate::mysql::MySqlGateway;
use crate::quiz::{RandomSource, SeededRandom, ThreadRandom};
use sqlx::mysql::MySqlPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn TriviaGateway>,
    pub random: Arc<dyn RandomSource>,
}

impl AppState {
    pub fn new(gateway: Arc<dyn TriviaGateway>, random: Arc<dyn RandomSource>) -> Self {
        Self { gateway, random }
    }

    pub fn in_memory(gateway: InMemoryGateway, seed: Option<u64>) -> Self {
        Self::new(Arc::new(gateway), random_source(seed))
    }
}

fn random_source(seed: Option<u64>) -> Arc<dyn RandomSource> {
    match seed {
        Some(seed) => Arc::new(SeededRandom::new(seed)),
        None => Arc::new(ThreadRandom),
    }
}

// An unreachable database falls back to the seeded in-memory store.
pub async fn build_state(config: &Config) -> anyhow::Result<AppState> {
    let random = random_source(config.random_seed);

    let Some(db_url) = config.database_url.as_deref() else {
        info!("no DATABASE_URL configured, serving from in-memory store");
        return Ok(AppState::new(Arc::new(InMemoryGateway::seeded()), random));
    };

    match MySqlPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(db_url)
        .await
    {
        Ok(pool) => {
            sqlx::migrate!("./migrations").run(&pool).await?;
            info!("mysql connected and migrations applied");
            Ok(AppState::new(Arc::new(MySqlGateway::new(pool)), random))
        }
        Err(err) => {
            warn!(
                "mysql is unavailable ({}), backend continues in local in-memory mode",
                err
            );
            Ok(AppState::new(Arc::new(InMemoryGateway::seeded()), random))
        }
    }
}
