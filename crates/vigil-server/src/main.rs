//! vigil server binary.
//!
//! Reads `config.toml` (or the path specified with `--config`), opens the
//! SQLite store, and serves the JSON API over HTTP.
//!
//! # Helper modes
//!
//! Generate the argon2 PHC string for an account's `password_hash`:
//!
//! ```
//! cargo run -p vigil-server --bin server -- --hash-password
//! ```
//!
//! Generate a fresh `encryption_key`:
//!
//! ```
//! cargo run -p vigil-server --bin server -- --generate-key
//! ```

use std::{
  path::{Path, PathBuf},
  sync::Arc,
};

use anyhow::Context as _;
use argon2::{Argon2, PasswordHasher, password_hash::SaltString};
use clap::Parser;
use rand_core::OsRng;
use tokio::net::TcpListener;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use vigil_core::{Engine, cipher::Cipher};
use vigil_crypto::{AesGcmCipher, VaultKey};
use vigil_server::{ServerConfig, auth::AuthConfig, mail::Outbox};
use vigil_store_sqlite::SqliteStore;

#[derive(Parser)]
#[command(author, version, about = "Vigil legacy release server")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "config.toml")]
  config: PathBuf,

  /// Print the argon2 hash for a password entered on stdin and exit.
  #[arg(long)]
  hash_password: bool,

  /// Print a new random vault key (base64) and exit.
  #[arg(long)]
  generate_key: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Helper mode: hash a password and exit.
  if cli.hash_password {
    let password = rpassword_or_stdin()?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
      .hash_password(password.as_bytes(), &salt)
      .map_err(|e| anyhow::anyhow!("argon2 error: {e}"))?
      .to_string();
    println!("{hash}");
    return Ok(());
  }

  // Helper mode: print a vault key and exit.
  if cli.generate_key {
    println!("{}", VaultKey::generate().to_base64());
    return Ok(());
  }

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("VIGIL").separator("__"))
    .build()
    .context("failed to read config file")?;

  let server_cfg: ServerConfig = settings
    .try_deserialize()
    .context("failed to deserialise ServerConfig")?;

  let auth = AuthConfig::new(server_cfg.accounts.clone());
  if auth.is_empty() {
    tracing::warn!("no accounts configured; every API request will be rejected");
  }

  let key = VaultKey::from_base64(&server_cfg.encryption_key)
    .context("encryption_key must be the base64 encoding of 32 bytes")?;
  let cipher: Arc<dyn Cipher> = Arc::new(AesGcmCipher::new(&key));
  drop(key);

  let mailer = Outbox::from_config(&server_cfg.mail).context("invalid mail configuration")?;

  // Expand `~` in store path.
  let store_path = expand_tilde(&server_cfg.store_path);

  // Open SQLite store.
  let store = SqliteStore::open(&store_path)
    .await
    .with_context(|| format!("failed to open store at {store_path:?}"))?;

  let engine = Arc::new(Engine::new(
    Arc::new(store),
    cipher,
    mailer,
    server_cfg.engine_config(),
  ));

  let app = vigil_server::router(engine, Arc::new(auth));
  let address = format!("{}:{}", server_cfg.host, server_cfg.port);

  tracing::info!(mail = ?server_cfg.mail.mode, "Listening on http://{address}");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app).await.context("server error")?;

  Ok(())
}

/// Read a password from stdin (no echo).
fn rpassword_or_stdin() -> anyhow::Result<String> {
  use std::io::{self, BufRead, Write};
  let stdin = io::stdin();
  print!("Password: ");
  io::stdout().flush().ok();
  let mut line = String::new();
  stdin.lock().read_line(&mut line)?;
  Ok(
    line
      .trim_end_matches('\n')
      .trim_end_matches('\r')
      .to_string(),
  )
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
