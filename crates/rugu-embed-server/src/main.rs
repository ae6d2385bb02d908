use anyhow::{Context, Result};
use clap::Parser;
use std::future::IntoFuture;
use std::net::IpAddr;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod server;
use server::config::ModelArgs;
use server::state::ServerState;
use server::utils;
use server::utils::port_in_range;
use server::{init_router, RouterArgs};

#[derive(Debug, Parser)]
#[command(version, about = "OpenAI compatible embeddings server")]
pub struct App {
    #[clap(flatten)]
    pub model_args: ModelArgs,

    #[clap(flatten)]
    pub router_args: RouterArgs,

    #[arg(value_parser = port_in_range)]
    #[clap(short, long, env = "RUGU_EMBED_PORT", default_value = "8765")]
    pub port: u16,

    #[clap(long, env = "RUGU_EMBED_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,
}

fn main() -> Result<ExitCode> {
    let args = App::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                eprintln!("No environment variables found that can initialize tracing_subscriber::EnvFilter. Using defaults.");

                // axum logs rejections from built-in extractors with the `axum::rejection`
                // target, at `TRACE` level. `axum::rejection=trace` enables showing those events
                "rugu_embed=debug,rugu_embed_server=debug,tower_http=debug,axum::rejection=trace"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    // A model load still running when the server stops is abandoned, not awaited.
    utils::block_on_then_shutdown(runtime, serve(args), utils::SHUTDOWN_GRACE)
}

async fn serve(args: App) -> Result<ExitCode> {
    let state = Arc::new(ServerState::new(&args.model_args));
    let router = init_router(state.clone(), &args.router_args);

    let listener = TcpListener::bind((args.host, args.port))
        .await
        .with_context(|| format!("Failed to bind {}:{}", args.host, args.port))?;
    tracing::info!("listening on {}", listener.local_addr()?);

    // Requests are answered while the model loads; embeddings get 503 until it is ready.
    let server = axum::serve(listener, router)
        .with_graceful_shutdown(utils::shutdown_signal())
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result?;
            if !state.model.is_ready() {
                tracing::info!("Stopped before model {} finished loading", state.model.name());
            }
            state.model.shutdown();
            return Ok(ExitCode::SUCCESS);
        }
        result = state.model.load(args.model_args.clone()) => {
            if let Err(err) = result {
                tracing::error!("Model failed to load: {err:#}");
                return Err(err.context("Startup failed"));
            }
        }
    }

    server.await?;
    state.model.shutdown();

    Ok(ExitCode::SUCCESS)
}
