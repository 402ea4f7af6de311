//! Permanently scrub PII from users who requested deletion more than 30 days ago.
//!
//! Takes no arguments. Progress goes to stdout, logs to stderr.

use anyhow::Context;
use securemed::{
    accounts::PgUserStore,
    config::DatabaseConfig,
    logging, retention,
    state::connect,
};
use time::OffsetDateTime;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    logging::init("securemed=info,sqlx=warn", std::io::stderr);

    let database = DatabaseConfig::from_env()?;
    let store = PgUserStore::new(connect(&database).await?);

    let mut stdout = std::io::stdout();
    let report = retention::run(&store, OffsetDateTime::now_utc(), &mut stdout)
        .await
        .context("scrub run aborted")?;

    if !report.is_clean() {
        anyhow::bail!(
            "{} of {} users could not be scrubbed",
            report.failed.len(),
            report.scrubbed + report.failed.len()
        );
    }
    Ok(())
}
