use clap::{Parser, Subcommand};

use peony_client::config::ClientConfig;

mod cart;
mod checkout;

#[derive(Debug, Parser)]
#[command(name = "peony-client", about = "Peony buyer CLI", long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) config: ClientConfig,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Cart(cart::CartCommand),
    Checkout(checkout::CheckoutCommand),
}

impl Cli {
    pub(crate) async fn run(self) -> Result<(), String> {
        let api = self.config.api();

        match self.command {
            Commands::Cart(command) => cart::run(api, command).await,
            Commands::Checkout(command) => checkout::run(api, command).await,
        }
    }
}
