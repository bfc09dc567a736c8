//! Command line arguments
//!
//! Flags take precedence over the matching environment variables.

use clap::Parser;

use crate::config::Config;

/// Keyhole command line arguments
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "keyhole")]
#[command(about = "Credential-hiding proxy for chat-completion APIs")]
pub struct Args {
    /// Port to run the server on (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Host to run the server on (overrides HOST)
    #[arg(long)]
    pub host: Option<String>,
}

impl Args {
    /// Apply any flags given on the command line to a loaded config
    pub fn apply(self, config: &mut Config) {
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(host) = self.host {
            config.host = host;
        }
    }
}
