use anyhow::Context;
use bookshelf_app::books::BookRepo;
use bookshelf_kernel::settings::Settings;
use clap::{Parser, Subcommand};

/// Administrative entrypoint for the bookshelf service
#[derive(Debug, Parser)]
#[command(name = "bookshelf", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP service (default)
    Serve,
    /// Apply pending migrations and exit
    Migrate,
    /// Print the number of stored books
    Count,
    /// Delete every stored book
    Reset {
        /// Required confirmation; nothing is deleted without it
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let settings = Settings::load().with_context(|| "failed to load bookshelf settings")?;
    bookshelf_telemetry::init(&settings.telemetry)?;

    tracing::info!(env = ?settings.environment, command = ?cli.command, "bookshelf cli");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => bookshelf_app::serve(settings).await,
        Command::Migrate => {
            let (pool, _registry) = bookshelf_app::prepare(&settings).await?;
            pool.close().await;
            Ok(())
        }
        Command::Count => {
            let (pool, _registry) = bookshelf_app::prepare(&settings).await?;
            let count = BookRepo::new(pool.clone()).count().await?;
            println!("{count}");
            pool.close().await;
            Ok(())
        }
        Command::Reset { yes } => {
            if !yes {
                anyhow::bail!("refusing to delete all books without --yes");
            }
            let (pool, _registry) = bookshelf_app::prepare(&settings).await?;
            let deleted = BookRepo::new(pool.clone()).delete_all().await?;
            println!("deleted {deleted} books");
            pool.close().await;
            Ok(())
        }
    }
}
