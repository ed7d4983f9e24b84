//! Mock price infrastructure for integration testing.
//!
//! Provides a tiny local HTTP quote server plus a `PriceSource`
//! descriptor pointed at it — deterministic end-to-end coverage of the
//! aggregator's network path with no external dependencies.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use updown::sources::PriceSource;

/// Spawn a one-endpoint HTTP server answering every request with the
/// given status and JSON body. Returns the endpoint URL.
pub async fn spawn_quote_server(status: u16, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                // Drain the request head; the content never matters.
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;

                let reason = if status == 200 { "OK" } else { "Error" };
                let response = format!(
                    "HTTP/1.1 {status} {reason}\r\n\
                     content-type: application/json\r\n\
                     content-length: {}\r\n\
                     connection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{addr}/quote")
}

/// Source descriptor reading `{"price": <number>}` from a test server.
pub struct TestSource {
    name: &'static str,
    endpoint: String,
}

impl TestSource {
    pub fn new(name: &'static str, endpoint: String) -> Self {
        Self { name, endpoint }
    }
}

impl PriceSource for TestSource {
    fn name(&self) -> &str {
        self.name
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn extract(&self, payload: &serde_json::Value) -> Option<f64> {
        payload.get("price").and_then(|v| v.as_f64())
    }
}

/// Source pointing at a closed local port: connections are refused
/// immediately, standing in for an unreachable provider.
pub struct UnreachableSource;

impl PriceSource for UnreachableSource {
    fn name(&self) -> &str {
        "unreachable"
    }

    fn endpoint(&self) -> &str {
        "http://127.0.0.1:9/quote"
    }

    fn extract(&self, _payload: &serde_json::Value) -> Option<f64> {
        None
    }
}
