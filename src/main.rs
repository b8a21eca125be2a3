use tracing_subscriber::EnvFilter;

use snakeshift::arbiter::ModeArbiter;
use snakeshift::config::{DEFAULT_LISTEN_ADDR, DEFAULT_SERVER_URL};
use snakeshift::error::Result;
use snakeshift::net::channel::RemoteChannel;
use snakeshift::net::server::GameServer;
use snakeshift::ui;

fn main() -> Result<()> {
    // stderr, so the terminal client keeps stdout to itself
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        Some("server") => {
            let addr = args.next().unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_owned());
            let rt = tokio::runtime::Runtime::new().expect("tokio runtime");
            rt.block_on(async {
                let server = GameServer::bind(&addr).await?;
                tracing::info!("listening on {addr}");
                server.serve().await
            })
        }
        other => {
            let url = match other {
                Some("client") | None => args.next(),
                Some(url) => Some(url.to_owned()),
            }
            .unwrap_or_else(|| DEFAULT_SERVER_URL.to_owned());
            // one logical timeline: channel task, arbiter and ui all
            // cooperate on a single thread
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .expect("tokio runtime");
            rt.block_on(async {
                let (channel, events) = RemoteChannel::connect(url);
                let arbiter = ModeArbiter::new(channel, events);
                ui::run(arbiter).await
            })
        }
    }
}
