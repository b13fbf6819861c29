use std::io::{self, Read};
use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::sha256_hex;
use crate::config::AppConfig;
use crate::error::{Result, SpooldexError};
use crate::web;

/// Install the global tracing subscriber. `RUST_LOG` wins over the default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("spooldex=info"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .try_init();
}

pub fn handle_serve(
    config_path: Option<PathBuf>,
    data_file: Option<PathBuf>,
    bind: Option<String>,
) -> Result<()> {
    let mut config = AppConfig::load(config_path.as_deref())?;
    if let Some(data_file) = data_file {
        config.data_file = data_file;
    }
    if let Some(bind) = bind {
        config.bind = bind;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(web::serve(config))
}

pub fn handle_hash_password(password: Option<String>, stdin: bool) -> Result<()> {
    let password = if stdin {
        let mut input = String::new();
        io::stdin().read_to_string(&mut input)?;
        // Drop the trailing newline from `echo secret | spooldex hash-password --stdin`.
        input.trim_end_matches(&['\r', '\n'][..]).to_string()
    } else {
        password.ok_or_else(|| {
            SpooldexError::Config("provide a password or use --stdin".to_string())
        })?
    };

    println!("{}", sha256_hex(&password));
    Ok(())
}
