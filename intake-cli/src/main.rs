use anyhow::Result;
use clap::{Parser, Subcommand};

mod client;
mod commands;
mod output;

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Encrypted applicant registration client")]
#[command(version)]
struct Cli {
    /// Output format
    #[arg(long, global = true)]
    json: bool,

    /// Server URL
    #[arg(long, global = true, env = "INTAKE_SERVER")]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the server's public key
    Key,
    /// Encrypt a JSON record and register it
    Register(commands::register::RegisterArgs),
    /// Manage stored records
    Records {
        #[command(subcommand)]
        action: commands::records::RecordsCommand,
    },
    /// Recompute the predicted level of every record
    PredictAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let ctx = commands::Context {
        json_output: cli.json,
        server_override: cli.server,
    };

    match cli.command {
        Commands::Key => commands::key::run(&ctx).await,
        Commands::Register(args) => commands::register::run(args, &ctx).await,
        Commands::Records { action } => commands::records::run(action, &ctx).await,
        Commands::PredictAll => commands::predict::run(&ctx).await,
    }
}
