use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::runtime::Handle;
use tracing::{info, warn};

use truerng::app::context::AppContext;
use truerng::app::true_rng::TrueRng;
use truerng::domain::model::AppConfig;
use truerng::infra::{
    alert::LogAlert,
    config::{ConfigLoader, CONFIG_PATH_ENV},
    logging::{init_logging, BootError},
    metrics::MetricsSnapshot,
    random::MutexRng,
    random_org::RandomOrgClient,
    system_clock::SystemClock,
};
use truerng::ports::random_source::RandomSource;

#[derive(Parser)]
#[command(author, version, about = "True-random draws backed by random.org")]
struct Args {
    /// Path to config.toml (defaults to TRUERNG_CONFIG or res/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Draw numbers, one per line.
    Draw {
        #[arg(short = 'n', long, default_value_t = 10)]
        count: usize,
        /// Wait for any in-flight refill before each draw.
        #[arg(long)]
        wait: bool,
    },
    /// Validate the config (schema + ranges).
    Validate,
    /// Run one refill and print the random.org quota counters.
    Usage,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), BootError> {
    let args = Args::parse();
    let cfg_path = pick_config_path(args.config);
    let cfg = ConfigLoader::load(&cfg_path).await?;

    let command = args.command.unwrap_or(Command::Draw { count: 10, wait: false });
    if let Command::Validate = command {
        println!("ok: config validated at {}", cfg_path.display());
        return Ok(());
    }

    init_logging(&cfg.log_level)?;
    info!(
        config = %cfg_path.display(),
        endpoint = %cfg.random_org.endpoint,
        enabled = cfg.cache.enabled,
        max_cached_numbers = cfg.cache.capacity_target,
        update_point = cfg.cache.refill_threshold,
        "Loaded config"
    );

    let client = Arc::new(RandomOrgClient::from_config(&cfg.random_org)?);
    let rng = build_rng(&cfg, Arc::clone(&client));

    match command {
        Command::Draw { count, wait } => {
            rng.request_refill();
            for _ in 0..count {
                if wait {
                    rng.refill_settled().await;
                }
                let before = rng.metrics();
                let value = rng.draw();
                println!("{value:.5}\t{}", origin(&before, &rng.metrics()));
                tokio::task::yield_now().await;
            }
            let m = rng.metrics();
            info!(
                pool_draws = m.pool_draws,
                fallback_draws = m.fallback_draws,
                refills_ok = m.refills_ok,
                refills_failed = m.refills_failed,
                pool_len = rng.pool_len(),
                "Done"
            );
        }
        Command::Usage => {
            if !rng.request_refill() {
                warn!("refill not issued; check random_org.api_key and cache.enabled");
            }
            rng.refill_settled().await;
            let usage = client.usage();
            println!("bits_used: {}", show(usage.bits_used));
            println!("bits_left: {}", show(usage.bits_left));
            println!("requests_left: {}", show(usage.requests_left));
            println!("advisory_delay_ms: {}", show(usage.advisory_delay_ms));
            println!("completion_time: {}", show(usage.completion_time));
        }
        Command::Validate => {}
    }

    Ok(())
}

fn build_rng(cfg: &AppConfig, client: Arc<RandomOrgClient>) -> TrueRng {
    let source: Arc<dyn RandomSource> = client;
    let ctx = AppContext::new(
        Arc::new(SystemClock),
        Arc::new(MutexRng::new()),
        Arc::new(LogAlert),
    )
    .with_settings(cfg.cache)
    .with_source(source);
    TrueRng::new(ctx, Handle::current())
}

fn origin(before: &MetricsSnapshot, after: &MetricsSnapshot) -> &'static str {
    if after.pool_draws > before.pool_draws {
        "pool"
    } else if after.custom_draws > before.custom_draws {
        "custom"
    } else {
        "fallback"
    }
}

fn show<T: std::fmt::Display>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_else(|| "unknown".to_string())
}

fn pick_config_path(arg: Option<PathBuf>) -> PathBuf {
    if let Some(p) = arg {
        return p;
    }
    if let Ok(p) = std::env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(p);
    }
    PathBuf::from("res/config.toml")
}
