use meeting_core::SystemClock;
use meets_bot::telegram_from_env;
use meets_dialog::{deliver, MeetsConfig, Reply};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("meets_digest=info".parse()?),
        )
        .with_target(false)
        .init();

    let meets = MeetsConfig::from_env()?;
    let google = google_workspace::GoogleConfig::from_env(meets.timezone)?;
    let gateways = google_workspace::GoogleGateways::connect(&google)?;
    let (_client, sender) = telegram_from_env()?;

    let cards = meets_digest::daily_cards(&gateways.calendar, &SystemClock::new(meets.timezone)).await?;
    let replies: Vec<Reply> = cards
        .into_iter()
        .map(|card| Reply::new(meets.meets_conversation(), card))
        .collect();

    let delivered = deliver(&sender, &replies).await;
    if delivered < replies.len() {
        return Err(format!("delivered {} of {} cards", delivered, replies.len()).into());
    }

    info!("Daily report sent ({} cards)", delivered);
    Ok(())
}
