//! Trackwell CLI
//!
//! Fetches a fresh snapshot from the remote record store and prints today's
//! summaries for each activity kind. Mostly a smoke-test harness for the
//! engine; the real consumers are the screen layers.
//!
//! The bearer token comes from `TRACKWELL_TOKEN` (or a `.env` file); the API
//! location from the layered configuration (`TW__API__BASE_URL`, config
//! files, defaults).

use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use trackwell_client::{
    api::HttpRecordStore,
    config::AppConfig,
    session::Session,
    sync::{CancelToken, SyncController},
};
use trackwell_shared::decode::DecodeOptions;
use trackwell_shared::record::ActivityKind;
use trackwell_shared::summary::{summarize, trend};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        base_url = %config.api.base_url,
        "Starting Trackwell client"
    );

    let session = Arc::new(match std::env::var("TRACKWELL_TOKEN") {
        Ok(token) => Session::with_token(token),
        Err(_) => {
            anyhow::bail!("TRACKWELL_TOKEN is not set; sign in and export a bearer token")
        }
    });

    let decode = DecodeOptions {
        negative_values: config.engine.negative_values,
    };
    let store = HttpRecordStore::new(&config.api, session, decode)?;
    let controller = SyncController::new(store);

    let snapshot = controller.refresh(&CancelToken::never()).await?;
    let today = Local::now().date_naive();

    for kind in [
        ActivityKind::WaterIntake,
        ActivityKind::Weight,
        ActivityKind::Exercise,
    ] {
        let records = snapshot.records(kind);
        let goal = match kind {
            ActivityKind::WaterIntake => snapshot.water_goal,
            _ => 0.0,
        };

        let summary = summarize(records, kind, today, goal, &Local);
        println!("{}: {} entries today", kind, summary.entries.len());
        if summary.goal_set {
            println!("  {}", summary.progress_line(kind.default_unit()));
        } else {
            println!(
                "  {} {} (no goal set)",
                trackwell_shared::format::format_amount(summary.total_value),
                kind.default_unit()
            );
        }

        if kind == ActivityKind::Weight {
            if let Some(t) = trend(records) {
                println!(
                    "  trend: {:.1} -> {:.1} kg ({:+.1} kg, {:+.1}%)",
                    t.start, t.current, t.change, t.change_percent
                );
            }
        }
    }

    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if AppConfig::is_production() {
            "trackwell_client=info".into()
        } else {
            "trackwell_client=debug,trackwell_shared=debug".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
