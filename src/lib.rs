pub mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::serve::ServeCommand;

/// Demo site exercising Azure Blob Storage and Azure Cosmos DB with managed identities.
#[derive(Parser, Debug)]
#[clap(name = "sampleweb", version)]
pub struct SampleWebApp {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Serve(ServeCommand),
}

impl SampleWebApp {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Serve(cmd) => cmd.run().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        SampleWebApp::command().debug_assert();
    }
}
