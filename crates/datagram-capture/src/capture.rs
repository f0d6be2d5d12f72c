//! UDP Capture Loop

use crate::CaptureError;
use measurement_engine::EngineControl;
use serde::{Deserialize, Serialize};
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use telemetry_codec::{BatchDiagnostics, FrameDecoder};
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Largest accepted datagram payload; longer transport units are truncated
pub const MAX_DATAGRAM_BYTES: usize = 8192;

/// Upper bound on datagrams drained into one batch
const MAX_BATCH_DATAGRAMS: usize = 64;

/// Interval at which an idle capture loop re-checks the stop flag
const STOP_POLL: Duration = Duration::from_millis(200);

/// Capture configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Local address of the telemetry socket
    pub bind_addr: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:4592".to_string(),
        }
    }
}

/// Instrument-facing UDP listener.
pub struct DatagramCapture {
    socket: UdpSocket,
}

impl DatagramCapture {
    /// Bind the telemetry socket
    pub async fn bind(config: &CaptureConfig) -> Result<Self, CaptureError> {
        let socket = UdpSocket::bind(&config.bind_addr).await?;
        info!("listening for telemetry on {}", socket.local_addr()?);
        Ok(Self { socket })
    }

    /// Address the socket actually bound to
    pub fn local_addr(&self) -> Result<SocketAddr, CaptureError> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive one decode batch: await the first datagram, then drain
    /// whatever else is already pending.
    ///
    /// Each buffer is capped at [`MAX_DATAGRAM_BYTES`]; the tail of a longer
    /// transport unit is discarded by the socket read.
    pub async fn next_batch(&self) -> Result<Vec<Vec<u8>>, CaptureError> {
        let mut buf = [0u8; MAX_DATAGRAM_BYTES];
        let (len, _peer) = self.socket.recv_from(&mut buf).await?;
        let mut batch = vec![buf[..len].to_vec()];

        while batch.len() < MAX_BATCH_DATAGRAMS {
            match self.socket.try_recv_from(&mut buf) {
                Ok((len, _peer)) => batch.push(buf[..len].to_vec()),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }
        debug!("assembled batch of {} datagrams", batch.len());
        Ok(batch)
    }

    /// Feed batches into the decoder until a stop is requested, forwarding
    /// each batch's diagnostics to the display channel.
    pub async fn run(
        self,
        decoder: FrameDecoder,
        diagnostics_tx: mpsc::UnboundedSender<BatchDiagnostics>,
        control: Arc<EngineControl>,
    ) -> Result<(), CaptureError> {
        while !control.stop_requested() {
            let batch = tokio::select! {
                batch = self.next_batch() => batch?,
                _ = tokio::time::sleep(STOP_POLL) => continue,
            };
            let diagnostics = decoder.decode(&batch);
            let _ = diagnostics_tx.send(diagnostics);
        }
        info!("capture loop stopped");
        Ok(())
    }
}
