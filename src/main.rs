use clap::Parser;
use clock::SystemClock;
use compute::Ledger;
use session::Session;
use tracing_subscriber::EnvFilter;

mod clock;
mod compute;
mod data;
mod read;
mod report;
mod session;
mod validate;
mod write;

/// Ledger of accounts with transfers scheduled for later execution.
#[derive(Parser, Debug)]
#[command(name = "deferred-payments")]
#[command(version)]
struct Cli {
    /// Log filter (trace, debug, info, warn, error, or a full directive).
    #[arg(long, env = "LEDGER_LOG", default_value = "warn")]
    log_level: String,

    /// Start with an empty ledger instead of the sample accounts.
    #[arg(long)]
    empty: bool,
}

fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    // stdout belongs to the interactive prompt
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&cli.log_level)?)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut ledger = if cli.empty {
        Ledger::new()
    } else {
        Ledger::seeded()?
    };
    let mut session = Session::new(&mut ledger, std::io::stdin().lock(), std::io::stdout(), SystemClock);
    session.run()?;
    Ok(())
}
