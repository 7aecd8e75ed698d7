//! Relay listener.
//!
//! Accepts inbound connections and serves each one on its own task.

use crate::metrics::MetricsCollector;
use crate::relay::Relay;
use crate::server::handler::{handle_request, RelayContext};
use crate::util::RequestId;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, instrument, warn};

/// Listener that runs the relay for every inbound request.
pub struct RelayListener {
    relay: Arc<Relay>,
    listener: TcpListener,
    metrics: MetricsCollector,
}

impl RelayListener {
    /// Bind the listen address. Failure here is fatal to startup.
    pub async fn bind(
        address: SocketAddr,
        relay: Arc<Relay>,
        metrics: MetricsCollector,
    ) -> std::io::Result<Self> {
        let listener = TcpListener::bind(address).await?;

        let settings = relay.settings();
        info!(
            listen = %listener.local_addr()?,
            upstream = %settings.target,
            timeout_ms = settings.timeout.as_millis(),
            connection_reuse = ?settings.connection_reuse,
            parse_payload = settings.parse_payload,
            "relay listener bound"
        );

        Ok(Self {
            relay,
            listener,
            metrics,
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Run the listener, accepting connections until shutdown.
    #[instrument(skip_all)]
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        info!("relay listener starting");

        loop {
            tokio::select! {
                accept_result = self.listener.accept() => {
                    match accept_result {
                        Ok((stream, addr)) => {
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!(error = %e, "failed to accept connection");
                        }
                    }
                }

                _ = shutdown.recv() => {
                    info!("relay listener shutting down");
                    break;
                }
            }
        }
    }

    /// Serve one connection; keep-alive lets it carry several requests.
    fn handle_connection(&self, stream: TcpStream, client_addr: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            warn!(error = %e, "failed to set TCP_NODELAY on client connection");
        }

        self.metrics.connection_accepted();

        let ctx = RelayContext {
            client_addr,
            connection_id: RequestId::new(),
            metrics: self.metrics.clone(),
        };
        let relay = Arc::clone(&self.relay);

        tokio::spawn(async move {
            let start_time = Instant::now();
            let connection_id = ctx.connection_id.clone();

            let io = TokioIo::new(stream);
            let service = service_fn(move |req| {
                let relay = Arc::clone(&relay);
                let ctx = ctx.clone();
                async move { handle_request(req, &relay, &ctx).await }
            });

            let result = http1::Builder::new()
                .keep_alive(true)
                .serve_connection(io, service)
                .await;

            let duration = start_time.elapsed();
            match result {
                Ok(()) => debug!(
                    client = %client_addr,
                    connection_id = %connection_id,
                    duration_ms = duration.as_millis(),
                    "connection completed"
                ),
                Err(e) => warn!(
                    client = %client_addr,
                    connection_id = %connection_id,
                    duration_ms = duration.as_millis(),
                    error = %e,
                    "connection handling failed"
                ),
            }
        });
    }
}
