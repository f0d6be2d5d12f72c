//! Coilscan Telemetry Pipeline Daemon
//!
//! Wires the decode path (UDP capture -> frame decoder -> shared buffer)
//! to the consumer loop (chunk consumer -> measurement tables -> CSV
//! storage) and hosts the display collaborator as a logging task.

mod config;

pub use config::{load_config, PipelineConfig};

use anyhow::{anyhow, Context as _};
use channel_buffer::ChannelBuffer;
use datagram_capture::DatagramCapture;
use measurement_engine::{ChunkConsumer, EngineControl, EngineEvent};
use std::sync::Arc;
use storage::MeasurementWriter;
use telemetry_codec::{BatchDiagnostics, FrameDecoder};
use tokio::sync::mpsc;
use tracing::{debug, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging
pub fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Run the pipeline until ctrl-c.
pub async fn run(config: PipelineConfig) -> anyhow::Result<()> {
    let buffer = Arc::new(ChannelBuffer::new());
    let control = Arc::new(EngineControl::new(Arc::clone(&buffer)));

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (table_tx, mut table_rx) = mpsc::unbounded_channel();
    let (diagnostics_tx, mut diagnostics_rx) = mpsc::unbounded_channel::<BatchDiagnostics>();

    // Consumer loop on its own thread; the buffer wait is blocking.
    let consumer = ChunkConsumer::new(
        Arc::clone(&buffer),
        Arc::clone(&control),
        config.engine.clone(),
        event_tx,
        table_tx,
    );
    let consumer_thread = std::thread::Builder::new()
        .name("chunk-consumer".to_string())
        .spawn(move || consumer.run())
        .context("failed to spawn consumer thread")?;

    // Storage collaborator: drains finished tables into the CSV file.
    let mut writer = MeasurementWriter::create(config.storage.clone())
        .context("failed to initialise measurement storage")?;
    let storage_task = tokio::spawn(async move {
        while let Some(table) = table_rx.recv().await {
            if let Err(e) = writer.append_table(&table) {
                warn!("failed to persist measurement table: {e}");
            }
        }
        info!("storage task finished after {} frames", writer.frames_written());
    });

    // Display collaborator: engine events and batch diagnostics are logged.
    let engine_display_task = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            match event {
                EngineEvent::AutosyncUpdated(state) => info!("autosync: {state}"),
                EngineEvent::FrequencyUpdated(frequency) => info!("frequency: {frequency}"),
            }
        }
    });
    let buffer_for_depth = Arc::clone(&buffer);
    let codec_display_task = tokio::spawn(async move {
        while let Some(diagnostics) = diagnostics_rx.recv().await {
            info!(
                "batch: {} records, over-range: {}, ADC mode: {}",
                diagnostics.records,
                if diagnostics.over_range { "YES" } else { "NO" },
                diagnostics.adc_mode
            );
            debug!("encoded line: {}", diagnostics.encoded_line);
            debug!("queue depth: {}", buffer_for_depth.depth());
        }
    });

    // Transport collaborator feeding the decoder.
    let capture = DatagramCapture::bind(&config.capture).await?;
    let decoder = FrameDecoder::new(Arc::clone(&buffer));
    let capture_task = tokio::spawn(capture.run(decoder, diagnostics_tx, Arc::clone(&control)));

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    control.request_stop();

    if let Err(e) = capture_task.await? {
        warn!("capture loop ended with error: {e}");
    }
    consumer_thread
        .join()
        .map_err(|_| anyhow!("consumer thread panicked"))?;
    // The consumer dropped its senders; the collaborator tasks drain and end.
    storage_task.await?;
    engine_display_task.await?;
    codec_display_task.await?;

    info!("pipeline stopped");
    Ok(())
}
