use std::sync::Arc;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use adaptive_coach::api::{self, AppState};
use adaptive_coach::config::{OnboardingConfig, PlanConfig, ProgressionConfig, ServerConfig};
use adaptive_coach::llm::{LlmConfig, create_provider};
use adaptive_coach::store::{Database, LibSqlBackend};

/// Stderr logging, plus a daily-rolling file when `log_dir` is set.
/// The returned guard must live until shutdown so buffered lines flush.
fn init_tracing(config: &ServerConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "adaptive-coach.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(writer),
                )
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let server_config = ServerConfig::from_env().context("Invalid server configuration")?;
    let _log_guard = init_tracing(&server_config);

    let llm_config = LlmConfig::from_env();
    let onboarding = OnboardingConfig::from_env();
    let plans = PlanConfig::from_env();
    let progression = ProgressionConfig::from_env();

    eprintln!("🏋️ Adaptive Coach v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", llm_config.model);
    eprintln!("   API: http://{}", server_config.bind_addr);
    eprintln!("   Database: {}", server_config.db_path.display());

    let llm = create_provider(&llm_config).context("Failed to create LLM provider")?;

    // ── Database ─────────────────────────────────────────────────────────
    let db: Arc<dyn Database> = Arc::new(
        LibSqlBackend::new_local(&server_config.db_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to open database at {}",
                    server_config.db_path.display()
                )
            })?,
    );

    let state = AppState::new(db, llm)
        .with_onboarding(onboarding)
        .with_plans(plans)
        .with_progression(progression);
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(server_config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", server_config.bind_addr))?;
    tracing::info!(addr = %server_config.bind_addr, "Coach API started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await
        .context("Server error")?;

    Ok(())
}
