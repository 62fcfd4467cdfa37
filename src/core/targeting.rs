use crate::domain::model::Target;
use crate::utils::error::Result;
use std::net::SocketAddr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;

/// Receives vision targets from the driver station.
///
/// The driver station connects over TCP and sends one JSON array of targets
/// per line. Only the most recent batch matters to the control loop, so
/// batches are published through a watch channel: a slow consumer simply
/// sees the latest value.
pub struct TargetServer {
    listener: TcpListener,
    sender: watch::Sender<Vec<Target>>,
}

impl TargetServer {
    /// Binds the listener and returns the server along with the receiving
    /// side of the target channel.
    pub async fn bind(address: &str) -> Result<(Self, watch::Receiver<Vec<Target>>)> {
        let listener = TcpListener::bind(address).await?;
        let (sender, receiver) = watch::channel(Vec::new());
        Ok((Self { listener, sender }, receiver))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts driver station connections until the task is dropped.
    pub async fn serve(self) -> Result<()> {
        tracing::info!("Listening for driver station connections");
        loop {
            let (stream, peer) = self.listener.accept().await?;
            tracing::info!(%peer, "Driver station connected");
            let sender = self.sender.clone();
            tokio::spawn(async move {
                handle_connection(stream, sender).await;
                tracing::info!(%peer, "Driver station disconnected");
            });
        }
    }
}

async fn handle_connection(stream: TcpStream, sender: watch::Sender<Vec<Target>>) {
    let mut lines = BufReader::new(stream).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Error reading from target stream: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<Vec<Target>>(line.trim()) {
            Ok(targets) => {
                // A lone no-targets marker clears the current targets
                let batch = if targets.len() == 1 && targets[0].no_targets {
                    tracing::debug!("No targets flag, clearing targets");
                    Vec::new()
                } else {
                    targets
                };
                if sender.send(batch).is_err() {
                    break;
                }
            }
            Err(e) => {
                tracing::warn!("Discarding unparseable target batch: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Side;
    use tokio::io::AsyncWriteExt;

    async fn start_server() -> (SocketAddr, watch::Receiver<Vec<Target>>) {
        let (server, receiver) = TargetServer::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();
        tokio::spawn(server.serve());
        (addr, receiver)
    }

    #[tokio::test]
    async fn test_receives_target_batch() {
        let (addr, mut receiver) = start_server().await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"[{\"side\":1,\"distance\":10.5,\"angle\":-3.0,\"is_hot\":true,\"confidence\":92.0}]\n")
            .await
            .unwrap();

        receiver.changed().await.unwrap();
        let targets = receiver.borrow_and_update().clone();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].side, Side::Right);
        assert_eq!(targets[0].distance, 10.5);
        assert!(targets[0].is_hot);
    }

    #[tokio::test]
    async fn test_no_targets_marker_clears_batch() {
        let (addr, mut receiver) = start_server().await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"[{\"distance\":5.0}]\n[{\"no_targets\":true}]\n")
            .await
            .unwrap();

        // Wait until the clearing batch arrives
        loop {
            receiver.changed().await.unwrap();
            let targets = receiver.borrow_and_update().clone();
            if targets.is_empty() {
                break;
            }
            assert_eq!(targets[0].distance, 5.0);
        }
    }

    #[tokio::test]
    async fn test_bad_json_is_skipped() {
        let (addr, mut receiver) = start_server().await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"this is not json\n[{\"distance\":2.5}]\n")
            .await
            .unwrap();

        receiver.changed().await.unwrap();
        let targets = receiver.borrow_and_update().clone();
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].distance, 2.5);
    }

    #[tokio::test]
    async fn test_latest_batch_wins() {
        let (addr, mut receiver) = start_server().await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        for distance in [1.0, 2.0, 3.0] {
            let line = format!("[{{\"distance\":{}}}]\n", distance);
            stream.write_all(line.as_bytes()).await.unwrap();
        }
        stream.flush().await.unwrap();

        // The watch channel only retains the newest batch; wait for it
        loop {
            receiver.changed().await.unwrap();
            let targets = receiver.borrow_and_update().clone();
            if targets.first().map(|t| t.distance) == Some(3.0) {
                break;
            }
        }
    }
}
