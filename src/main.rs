use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

use boundary_provider::codegen::{self, DataSourceTarget, Swagger};
use boundary_provider::{init_logging, serve_with_options, BoundaryProvider, ProviderService, ServeOptions};

#[derive(Parser, Debug)]
#[command(name = "boundary-provider", version, about = "Boundary infrastructure provider")]
struct Cli {
    /// Log level used when RUST_LOG is unset.
    #[arg(long, global = true, env = "BOUNDARY_PROVIDER_LOG", default_value = "info")]
    log_level: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the gRPC server and print the handshake line (default).
    Serve {
        /// Address to listen on. Port 0 picks a free port.
        #[arg(long, default_value = "127.0.0.1:0")]
        listen: SocketAddr,
        /// Seconds in-flight requests may run after SIGTERM or SIGINT.
        #[arg(long, default_value_t = 30)]
        shutdown_timeout_secs: u64,
    },
    /// Print the provider schema as JSON.
    Schema,
    /// Generate data source modules from a Swagger document.
    Generate {
        /// Swagger 2.0 JSON document of the controller API.
        #[arg(long)]
        swagger: PathBuf,
        /// Directory that receives the generated modules.
        #[arg(long, default_value = "src/datasources/generated")]
        out: PathBuf,
        /// Data source to generate as `name=/v1/path`. Repeatable.
        #[arg(long = "data-source")]
        data_sources: Vec<DataSourceTarget>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match cli.command.unwrap_or(Command::Serve {
        listen: SocketAddr::from(([127, 0, 0, 1], 0)),
        shutdown_timeout_secs: 30,
    }) {
        Command::Serve {
            listen,
            shutdown_timeout_secs,
        } => {
            let options = ServeOptions::new()
                .with_addr(listen)
                .with_shutdown_timeout(Duration::from_secs(shutdown_timeout_secs));
            serve_with_options(BoundaryProvider::new(), options).await
        },
        Command::Schema => {
            let schema = BoundaryProvider::new().schema();
            println!("{}", serde_json::to_string_pretty(&schema)?);
            Ok(())
        },
        Command::Generate {
            swagger,
            out,
            data_sources,
        } => {
            let document = Swagger::from_path(&swagger)?;
            let targets = if data_sources.is_empty() {
                codegen::default_targets()
            } else {
                data_sources
            };
            let written = codegen::generate(&document, &targets, &out)?;
            info!(files = written.len(), out = %out.display(), "Generation complete");
            Ok(())
        },
    }
}
