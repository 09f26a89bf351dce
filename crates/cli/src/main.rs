use anyhow::Context;
use bookstore_kernel::settings::Settings;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bookstore", version, about = "Book store API server and tooling")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server until interrupted
    Serve {
        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Apply pending schema migrations and exit
    Migrate,
    /// Print the resolved configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut settings = Settings::load().context("failed to load book store settings")?;

    match cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        Command::Migrate => {
            bookstore_telemetry::init(&settings.telemetry)?;
            let applied = bookstore_app::migrate(&settings).await?;
            println!("applied {applied} migration(s)");
        }
        Command::Serve { port } => {
            if let Some(port) = port {
                settings.server.port = port;
            }
            bookstore_telemetry::init(&settings.telemetry)?;
            tracing::info!(env = ?settings.environment, "starting book store");
            bookstore_app::serve(settings).await?;
        }
    }

    Ok(())
}
