//! docdrop entry point.

mod app;
mod config;
mod files;
mod interactive;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Upload PDF files and submit them with a short form
#[derive(Parser)]
#[command(name = "docdrop", version)]
struct Cli {
    /// Configuration file (defaults to ~/.config/docdrop/config.toml)
    #[arg(long, global = true, env = "DOCDROP_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the mock backend until Ctrl-C
    Serve {
        /// Port to listen on (overrides [mock].port)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Upload files and submit them in one go
    Send {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Print the uploaded file list as JSON
        #[arg(long)]
        json: bool,
        /// Start a mock backend in-process instead of using server_url
        #[arg(long)]
        embedded: bool,
        /// PDF files to upload
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Interactive upload session
    Session {
        /// Start a mock backend in-process instead of using server_url
        #[arg(long)]
        embedded: bool,
        /// Files to add when the session starts
        files: Vec<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = config::Config::load(cli.config.as_deref())?;
    tracing::debug!(server_url = %config.server_url, "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async move {
        match cli.command {
            Commands::Serve { port } => app::serve(&config, port).await,
            Commands::Send {
                title,
                description,
                json,
                embedded,
                files,
            } => {
                let args = app::SendArgs {
                    title,
                    description,
                    json,
                    embedded,
                    files,
                };
                app::send(&config, args).await
            }
            Commands::Session { embedded, files } => {
                interactive::run(&config, files, embedded).await
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn send_requires_files() {
        let base = ["docdrop", "send", "--title", "t", "--description", "d"];
        assert!(Cli::try_parse_from(base).is_err());

        let args = base.into_iter().chain(["a.pdf", "b.pdf"]);
        let parsed = Cli::try_parse_from(args).unwrap();
        match parsed.command {
            Commands::Send { files, json, .. } => {
                assert_eq!(files.len(), 2);
                assert!(!json);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn global_config_flag() {
        let args = ["docdrop", "serve", "--port", "4000"];
        let args = args.into_iter().chain(["--config", "/tmp/c.toml"]);
        let parsed = Cli::try_parse_from(args).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("/tmp/c.toml")));
        let Commands::Serve { port } = parsed.command else {
            panic!("expected serve");
        };
        assert_eq!(port, Some(4000));
    }
}
