use clap::Parser;

/// Harbor — a desktop shell hosting isolated remote web sessions.
#[derive(Parser, Debug)]
#[command(name = "harbor", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Directory for the persisted state snapshot.
    #[arg(long)]
    pub state_dir: Option<String>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
