use clap::Parser;
use snafu::ResultExt;
use tracing_subscriber::EnvFilter;

use maddy::app::{AppError, ChatApp, RuntimeSnafu, SaveSettingsSnafu};
use maddy::cli::Cli;
use maddy::settings::SettingsStore;

/// Reads chat lines from stdin and prints the transcript to stdout.
///
/// Logs go to stderr and are filtered with `RUST_LOG` (default `info`).
fn main() -> Result<(), AppError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = match &cli.config {
        Some(path) => SettingsStore::new(path.clone()),
        None => SettingsStore::load(),
    };

    let settings = cli.apply(&store.settings());
    if cli.save_settings {
        store.update(settings).context(SaveSettingsSnafu {
            stage: "save-cli-settings",
        })?;
    } else {
        store.replace(settings);
    }
    let settings = store.settings();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context(RuntimeSnafu {
            stage: "build-current-thread-runtime",
        })?;

    runtime.block_on(async {
        let mut app = ChatApp::connect(&settings)?;
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut stdout = std::io::stdout();
        app.run(stdin, &mut stdout).await
    })
}
