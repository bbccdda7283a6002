use clap::Parser;
use fadebot::adapter::inbound::cli::command::{Cli, Commands};
use fadebot::adapter::inbound::cli::output::{self, OutputConfig};
use fadebot::adapter::inbound::cli::{check, run};

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    output::configure(OutputConfig {
        json: cli.json,
        quiet: cli.quiet,
    });

    let result: anyhow::Result<()> = match &cli.command {
        Commands::Run(args) => run::execute(args).await.map_err(Into::into),
        Commands::Check(arg) => check::execute(&arg.config).map_err(Into::into),
    };

    if let Err(e) = result {
        output::error(&format!("{e:#}"));
        std::process::exit(1);
    }
}
