//! `terraform-provider-morpheus` binary.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

use std::process;

use anyhow::Context;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "terraform-provider-morpheus",
    version,
    about = "Terraform provider for the Morpheus cloud management platform"
)]
struct Cli {
    /// Start in reattach mode for use with a debugger.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    terraform_provider_morpheus::launch(cli.debug, morpheus_plugin::serve)
        .await
        .context("failed to serve provider")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_flag() {
        assert!(!Cli::try_parse_from(["terraform-provider-morpheus"]).unwrap().debug);
        assert!(
            Cli::try_parse_from(["terraform-provider-morpheus", "--debug"])
                .unwrap()
                .debug
        );
    }

    #[test]
    fn rejects_unknown_arguments() {
        assert!(Cli::try_parse_from(["terraform-provider-morpheus", "serve"]).is_err());
    }
}
