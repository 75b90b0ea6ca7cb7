use anyhow::Result;
use clap::Parser;
use pinrender::application::{ServerConfig, serve};
use pinrender::presentation::cli::{Cli, Commands, ServeCommand, render, request};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before clap parses env vars)
    let _ = dotenvy::dotenv();

    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve(cmd) => run_server(cmd).await,
        Commands::Render(cmd) => render::run(cmd).await,
        Commands::Request(cmd) => request::run(cmd).await,
    }
}

async fn run_server(command: ServeCommand) -> Result<()> {
    if command.disable_cors {
        tracing::info!("CORS headers disabled");
    }

    let config = ServerConfig {
        bind_address: command.bind_address,
        render_key: command.render_key,
        renderer: command.renderer.into(),
        allow_any_origin: !command.disable_cors,
    };

    serve(config).await
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("RUST_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    // Logs go to stderr so `render` and `request` output stays clean.
    let registry = tracing_subscriber::registry().with(env_filter);

    if use_json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}
