use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use click_sentinel::backend::HttpBackend;
use click_sentinel::config::Config;
use click_sentinel::features::DeviceProfile;
use click_sentinel::signals::InteractionEvent;
use click_sentinel::widget::{AdOrientation, AdWidget};
use rand::Rng;
use std::path::PathBuf;
use tokio::time::{sleep, Duration};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "click-sentinel",
    about = "Simulate an ad-widget interaction session against the demo classifier"
)]
struct Args {
    /// Path to a TOML config file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of clicks to send
    #[arg(long, default_value_t = 3)]
    clicks: u32,

    /// Fire clicks back-to-back to trip the spam detector
    #[arg(long)]
    burst: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("click_sentinel=info,info")
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => {
            let config = Config::load(path)?;
            info!("configuration loaded from {:?}", path);
            config
        }
        None => Config::default(),
    };

    let backend = HttpBackend::new(config.classifier_url.clone(), config.log_url.clone());
    let mut widget = AdWidget::mount(
        &config,
        "ad1",
        AdOrientation::Horizontal,
        DeviceProfile::default(),
    );

    info!(
        "simulating {} click(s) against {} ({})",
        args.clicks,
        config.classifier_url,
        if args.burst { "burst" } else { "paced" }
    );

    let mut rng = rand::thread_rng();

    for n in 1..=args.clicks {
        // Organic-looking interaction between clicks
        for _ in 0..rng.gen_range(2..8) {
            widget.handle_event(InteractionEvent::PointerMove);
        }
        if rng.gen_bool(0.5) {
            widget.handle_event(InteractionEvent::Scroll {
                scroll_y: rng.gen_range(0.0..2000.0),
                doc_height: 2400.0,
            });
        }
        widget.handle_event(InteractionEvent::Tick {
            now_ms: Utc::now().timestamp_millis() as u64,
        });

        widget.press_down();
        if !args.burst {
            sleep(Duration::from_millis(rng.gen_range(40..140))).await;
        }

        let resolution = widget.click(&backend).await;
        info!("click {}: {:?}", n, resolution.notification);

        if !args.burst {
            sleep(Duration::from_millis(rng.gen_range(600..1200))).await;
        }
    }

    let ui = widget.ui_state();
    info!(
        "session done: flagged={} signals={:?}",
        ui.flagged,
        widget.signals()
    );
    widget.unmount();

    Ok(())
}
