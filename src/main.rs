use bt_client::command::CommandExecutor;
use bt_client::connection::{ClientConfig, ClientEvent, Supervisor, TransportMode};
use bt_client::transport::{LinkAdapter, RfcommAdapter, RfcommConfig, TcpAdapter};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Persistent Bluetooth client driven by START / WRITE <payload> / STOP lines on stdin
#[derive(Debug, Parser)]
#[command(name = "bt-client", version)]
struct Args {
    /// Peer address (XX:XX:XX:XX:XX:XX)
    #[arg(long, env = "BT_CLIENT_ADDRESS")]
    address: String,

    /// Link backend
    #[arg(long, value_enum, env = "BT_CLIENT_MODE", default_value = "rfcomm")]
    mode: TransportMode,

    /// Fixed RFCOMM channel (resolved through the serial port profile when omitted)
    #[arg(long, env = "BT_CLIENT_CHANNEL")]
    channel: Option<u8>,

    /// TCP endpoint used in tcp-simulation mode
    #[arg(long, env = "BT_CLIENT_TCP_ADDRESS", default_value = "127.0.0.1:9000")]
    tcp_address: String,

    /// Pause between failed connect attempts in milliseconds
    #[arg(long, env = "BT_CLIENT_RETRY_MS", default_value_t = 500)]
    retry_ms: u64,

    /// Bound the write queue (unbounded when omitted)
    #[arg(long, env = "BT_CLIENT_QUEUE_CAPACITY")]
    queue_capacity: Option<usize>,

    /// Issue START immediately instead of waiting for it on stdin
    #[arg(long)]
    autostart: bool,
}

impl Args {
    fn config(&self) -> ClientConfig {
        ClientConfig {
            address: self.address.clone(),
            mode: self.mode,
            rfcomm: RfcommConfig {
                channel: self.channel,
                ..Default::default()
            },
            tcp_address: self.tcp_address.clone(),
            retry_interval: Duration::from_millis(self.retry_ms),
            write_queue_capacity: self.queue_capacity,
        }
    }
}

async fn build_adapter(config: &ClientConfig) -> Option<Arc<dyn LinkAdapter>> {
    match config.mode {
        TransportMode::Rfcomm => match RfcommAdapter::default_adapter(config.rfcomm.clone()).await {
            Ok(adapter) => Some(Arc::new(adapter) as Arc<dyn LinkAdapter>),
            Err(e) => {
                warn!("No Bluetooth adapter: {:#}", e);
                None
            }
        },
        TransportMode::TcpSimulation => {
            Some(Arc::new(TcpAdapter::new(config.tcp_address.clone())) as Arc<dyn LinkAdapter>)
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let args = Args::parse();
    let config = args.config();

    info!("Bluetooth client starting");
    info!("  Peer: {}", config.address);
    info!("  Mode: {:?}", config.mode);

    let adapter = build_adapter(&config).await;
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<ClientEvent>();
    let supervisor = Supervisor::new(config, adapter, Arc::new(event_tx));
    let executor = CommandExecutor::new(supervisor.clone());

    if args.autostart {
        supervisor.start();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    // Main event loop
    loop {
        tokio::select! {
            Some(event) = event_rx.recv() => handle_event(event),

            line = lines.next_line(), if stdin_open => match line {
                Ok(Some(line)) => {
                    if let Err(e) = executor.execute_line(&line) {
                        error!("Command failed: {}", e);
                    }
                }
                Ok(None) => {
                    debug!("stdin closed");
                    stdin_open = false;
                }
                Err(e) => {
                    error!("Failed to read command: {}", e);
                    stdin_open = false;
                }
            },

            _ = supervisor.terminated() => {
                error!("Supervisor terminated");
                break;
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping");
                supervisor.stop();
                break;
            }
        }
    }

    // Flush whatever the workers posted on the way down
    while let Ok(event) = event_rx.try_recv() {
        handle_event(event);
    }
    Ok(())
}

fn handle_event(event: ClientEvent) {
    match event {
        ClientEvent::Status(state) => info!("Status: {}", state),
        ClientEvent::Error { kind, context } => {
            let context = context.unwrap_or_default();
            if kind.is_fatal() {
                error!("Error: {} {}", kind, context);
            } else {
                warn!("Error: {} {}", kind, context);
            }
        }
        ClientEvent::Message(frame) => {
            // Frames are the program's output
            println!("{}", frame);
        }
    }
}
