//! Streaming chat terminal client
//!
//! Each line read from stdin is typed into the input field and submitted with
//! the Enter key; the reply is printed as it streams in.

use mimalloc::MiMalloc;

/// Global allocator for improved performance (M-MIMALLOC-APPS).
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context;
use dotenvy::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use stream_chat::config::{AppConfig, LoggingConfig};
use stream_chat::controls::{Control, Key};
use stream_chat::renderer::StreamingChatRenderer;
use stream_chat::terminal::TerminalView;
use stream_chat::transport::HttpTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (if present)
    let _ = dotenv();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging)?;

    let endpoint = config.endpoint_url()?;
    info!(
        name: "config.loaded",
        endpoint = %endpoint,
        typing_label = %config.ui.typing_label,
        "Configuration loaded"
    );

    let transport = HttpTransport::new(endpoint)?;
    let mut renderer =
        StreamingChatRenderer::new(transport).with_typing_label(config.ui.typing_label.clone());

    let view = Arc::new(Mutex::new(TerminalView::stdout(&config.ui)));
    renderer.transcript_mut().subscribe(Arc::clone(&view));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        renderer.input_mut().set_value(line);
        if let Some(outcome) = renderer.handle_control(Control::KeyPressed(Key::Enter)).await {
            info!(name: "chat.submit.settled", outcome = ?outcome, "Submission settled");
            view.lock().unwrap_or_else(PoisonError::into_inner).finish()?;
        }
    }

    info!(name: "chat.closed", entries = renderer.transcript().len(), "Input closed");
    Ok(())
}

/// Initialize tracing (M-LOG-STRUCTURED). Logs go to stderr so they never
/// interleave with the transcript on stdout.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.filter))
        .context("Invalid log filter")?;

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()?;
    }
    Ok(())
}
