use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::engagement_service::EngagementService;
use application::post_store::PostStore;
use application::profile_service::ProfileService;
use application::tag_deriver::{TagClassifier, TagDeriver};
use data::post_repository::DynPostRepository;
use data::profile_repository::DynProfileRepository;
use data::repositories::memory::post_repository::MemoryPostRepository;
use data::repositories::memory::profile_repository::MemoryProfileRepository;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::profile_repository::PostgresProfileRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::gemini::GeminiClassifier;
use infrastructure::identity::JwtIdentityVerifier;
use infrastructure::logging::init_logging;
use infrastructure::settings::{Settings, StorageBackend};
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level, settings.log_format)?;
    info!(service = "api.bollocks.social", "initiating service");

    let (posts, profiles) = build_repositories(&settings).await?;
    let tags = build_tag_deriver(&settings)?;

    let engagement = EngagementService::new(
        PostStore::new(posts, settings.like_toggle_max_attempts),
        tags,
    );
    let identity = JwtIdentityVerifier::new(
        &settings.jwt_secret,
        settings.jwt_issuer.as_deref(),
        settings.jwt_audience.as_deref(),
    );

    let state = AppState::new(
        Arc::new(engagement),
        Arc::new(ProfileService::new(profiles)),
        Arc::new(identity),
    );

    server::run_http(&settings, state).await
}

async fn build_repositories(
    settings: &Settings,
) -> Result<(DynPostRepository, DynProfileRepository)> {
    match settings.storage_backend {
        StorageBackend::Postgres => {
            let database_url = settings
                .database_url
                .as_deref()
                .context("DATABASE_URL is required for the postgres storage backend")?;
            let pool = create_pool(database_url, settings.database_max_connections).await?;
            run_migrations(&pool).await?;
            info!(backend = "postgres", "storage ready");
            let posts: DynPostRepository = Arc::new(PostgresPostRepository::new(pool.clone()));
            let profiles: DynProfileRepository = Arc::new(PostgresProfileRepository::new(pool));
            Ok((posts, profiles))
        }
        StorageBackend::Memory => {
            info!(backend = "memory", "storage ready, data is not persisted");
            let posts: DynPostRepository = Arc::new(MemoryPostRepository::new());
            let profiles: DynProfileRepository = Arc::new(MemoryProfileRepository::new());
            Ok((posts, profiles))
        }
    }
}

fn build_tag_deriver(settings: &Settings) -> Result<TagDeriver> {
    let timeout = Duration::from_millis(settings.gemini_timeout_ms);
    let classifier = GeminiClassifier::from_settings(
        settings.gemini_api_key.as_deref(),
        &settings.gemini_base_url,
        &settings.gemini_model,
        timeout,
    )
    .context("failed to build Gemini client")?;

    match classifier {
        Some(classifier) => {
            info!(model = %settings.gemini_model, "AI tag classifier enabled");
            let classifier: Arc<dyn TagClassifier> = Arc::new(classifier);
            Ok(TagDeriver::new(Some(classifier), timeout))
        }
        None => {
            info!("GEMINI_API_KEY not set, tags come from hashtags only");
            Ok(TagDeriver::hashtags_only())
        }
    }
}
