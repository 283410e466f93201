//! refurrm-server binary.
//!
//! Reads `config.toml` (or the path given with `--config`), opens the local
//! SQLite store, registers the operator account and serves the dashboard API
//! over HTTP.
//!
//! # Password hash generation
//!
//! To generate the argon2 PHC string for `auth_password_hash` in config.toml:
//!
//! ```
//! cargo run -p refurrm-server -- --hash-password
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use refurrm_core::{auction::Auction, backend::RescueBackend};
use refurrm_server::{AppState, ServerConfig, gateway::HttpGateway};
use refurrm_store_sqlite::SqliteStore;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "ReFURRM rescue dashboard server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// JSON file with an array of auction listings to load before serving.
  #[arg(long, value_name = "JSON")]
  seed_auctions: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  if cli.hash_password {
    let password = read_password()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("REFURRM"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let store_path = expand_tilde(&server_cfg.store_path);
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  if let Some(path) = &cli.seed_auctions {
    let count = seed_auctions(&store, path).await?;
    tracing::info!(count, "seeded auction listings from {path:?}");
  }

  let operator = store
    .register_user(&server_cfg.auth_email)
    .await
    .context("failed to register operator account")?;
  tracing::info!(user_id = %operator.user_id, email = %operator.email, "operator account ready");

  let gateway = HttpGateway::new(
    &server_cfg.payment_gateway_url,
    &server_cfg.payment_gateway_key,
    server_cfg.collaborator_timeout(),
  )
  .context("failed to build payment gateway client")?;

  let address = format!("{}:{}", server_cfg.host, server_cfg.port);
  let app = refurrm_server::router(AppState::new(store, gateway, server_cfg));

  tracing::info!("Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

async fn seed_auctions(store: &SqliteStore, path: &Path) -> anyhow::Result<usize> {
  let raw = tokio::fs::read_to_string(path)
    .await
    .with_context(|| format!("failed to read {path:?}"))?;
  let auctions: Vec<Auction> =
    serde_json::from_str(&raw).with_context(|| format!("failed to parse {path:?}"))?;

  let count = auctions.len();
  for auction in auctions {
    store
      .add_auction(auction)
      .await
      .context("failed to store auction listing")?;
  }
  Ok(count)
}

/// Read a password from stdin.
fn read_password() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  io::stdin().lock().read_line(&mut line)?;
  Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
