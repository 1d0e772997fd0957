use crate::capture::{CaptureError, CaptureSession};
use crate::flow::FlowRecord;
use crate::layers::{DecodeState, LayerType};
use anyhow::{Context, Result};
use std::io::Write;
use std::time::Instant;
use tracing::{info, trace, warn};


#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames: usize,
    pub records: usize,
    pub read_errors: usize,
    pub decode_errors: usize,
}

/// Turns frames from a capture session into one text line each.
///
/// The session, the decode buffers and the sink are owned here and used from
/// a single thread, so each record is copied out before the next frame is
/// decoded.
pub struct Sniffer<S, W> {
    session: S,
    out: W,
    state: DecodeState,
    stats: CaptureStats,
}

impl<S: CaptureSession, W: Write> Sniffer<S, W> {
    pub fn new(session: S, out: W) -> Self {
        Self {
            session,
            out,
            state: DecodeState::new(),
            stats: CaptureStats::default(),
        }
    }

    /// Reads until the session runs dry, which a live interface never does.
    /// Read and decode failures are logged and skipped; only a failing sink
    /// ends the loop early.
    pub fn run(&mut self) -> Result<CaptureStats> {
        let start_time = Instant::now();
        let Self {
            session,
            out,
            state,
            stats,
        } = self;

        loop {
            match session.read_frame() {
                Ok(frame) => {
                    stats.frames += 1;
                    trace!(
                        len = frame.data.len(),
                        original_len = frame.meta.original_len,
                        ts = frame.meta.timestamp,
                        "Frame received"
                    );
                    let record = decode_frame(state, stats, frame.data);
                    writeln!(out, "{record}")
                        .and_then(|_| out.flush())
                        .context("Failed to write flow record")?;
                    stats.records += 1;
                }
                Err(CaptureError::Timeout) => {
                    trace!("Read timed out; polling again");
                }
                Err(CaptureError::EndOfCapture) => break,
                Err(e) => {
                    stats.read_errors += 1;
                    warn!(error = %e, "Error reading packet data; continuing");
                }
            }
        }

        info!(
            frames = stats.frames,
            records = stats.records,
            read_errors = stats.read_errors,
            decode_errors = stats.decode_errors,
            elapsed_ms = start_time.elapsed().as_millis(),
            "Capture finished"
        );
        Ok(*stats)
    }

    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    pub fn into_inner(self) -> (S, W) {
        (self.session, self.out)
    }
}

/// Decodes into the shared buffers and copies the record out. A decode fault
/// still yields whatever the layers before it provided.
fn decode_frame(state: &mut DecodeState, stats: &mut CaptureStats, data: &[u8]) -> FlowRecord {
    if let Err(err) = state.decode(data) {
        stats.decode_errors += 1;
        warn!(error = %err, layers = ?state.layers(), "Failed to decode frame; emitting partial record");
    }

    if state.contains(LayerType::TLS) && !state.tls().is_client_hello() {
        trace!(
            record_type = ?state.tls().record_type,
            version = state.tls().version_name(),
            "Filter let through a TLS record that is not a ClientHello"
        );
    }

    FlowRecord::extract(state)
}
