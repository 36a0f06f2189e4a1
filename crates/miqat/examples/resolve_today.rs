//! Prints today's schedule for the configured location.
//!
//! ```sh
//! MIQAT_LATITUDE=33.9114 MIQAT_LONGITUDE=-84.2614 MIQAT_TIMEZONE=America/New_York \
//! MIQAT_METHOD=isna RUST_LOG=miqat_core=debug cargo run --example resolve_today
//! ```

use anyhow::Result;
use miqat::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let engine = PrayerEngine::new(EngineConfig::from_env());
    let location = engine.config().default_location;
    let today = chrono::Utc::now().with_timezone(&location.timezone).date_naive();

    let schedule = engine.resolve_default(today).await?;
    println!(
        "{} ({}) at {:.4}, {:.4} via {}",
        schedule.date(),
        schedule.hijri(),
        location.lat,
        location.lng,
        schedule.source_layer()
    );
    for slot in schedule.slots() {
        let iqamah = slot.iqamah.map(|t| t.format("%H:%M").to_string()).unwrap_or_default();
        println!("  {:<8} {}  {}", slot.prayer, slot.adhan.format("%H:%M"), iqamah);
    }
    if let Some(tarawih) = schedule.tarawih() {
        println!("  Tarawih  {}", tarawih.format("%H:%M"));
    }
    println!("  Qibla    {:.1}°", schedule.qibla_bearing_degrees());
    Ok(())
}
