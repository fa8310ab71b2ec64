// Entrypoint for the CLI application.
// - Keeps `main` small: init logging, build the API client once, hand
//   it to the UI loop.
// - Missing configuration is the only fatal error path.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use refshelf_cli::{api::ApiClient, ops::RecordManager, ui::main_menu};

fn main() -> Result<()> {
    // `RUST_LOG` overrides the default filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("refshelf_cli=info")),
        )
        .init();

    // Create the API client from `.env.local` / process environment.
    // See `api::ApiClient::from_env`.
    let api = ApiClient::from_env()?;

    // Start the interactive menu. This call blocks until the user exits.
    main_menu(&RecordManager::new(api))
}
