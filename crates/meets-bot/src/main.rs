use std::sync::Arc;

use meets_bot::{google_dialog, telegram_from_env, UpdateProcessor};
use meets_dialog::MeetsConfig;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("meets_bot=info".parse()?)
                .add_directive("meets_dialog=info".parse()?),
        )
        .with_target(false)
        .init();

    let meets = MeetsConfig::from_env()?;
    let (client, sender) = telegram_from_env()?;
    let dialog = google_dialog(&meets)?;

    match client.get_me().await {
        Ok(me) => info!(
            "Connected as @{} ({})",
            me.username.as_deref().unwrap_or("?"),
            me.id
        ),
        Err(e) => warn!("getMe failed: {}", e),
    }

    info!(
        "Serving chat {} thread {:?} in {}",
        meets.forum_chat_id, meets.meets_thread_id, meets.timezone
    );

    let processor = UpdateProcessor::new(client, Arc::new(dialog), Arc::new(sender), meets);
    processor.announce_start().await;

    processor
        .run_with_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await;

    Ok(())
}
