use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub mod devices;
pub mod live;
pub mod replay;


pub use devices::{DeviceAddress, DeviceInfo, list_devices};
pub use live::LiveSession;
pub use replay::ReplaySession;

/// Largest frame kept by a live capture unless configured otherwise.
pub const DEFAULT_SNAPLEN: i32 = 1600;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("device name is required")]
    MissingDevice,
    #[error("pcap error: {0}")]
    Pcap(#[from] pcap::Error),
    #[error("failed to open capture file {path:?}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("capture file error: {0}")]
    Replay(String),
    #[error("read timed out")]
    Timeout,
    #[error("end of capture")]
    EndOfCapture,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameMeta {
    /// Seconds since the epoch.
    pub timestamp: f64,
    pub captured_len: u32,
    pub original_len: u32,
}

/// One link-layer frame, borrowed from the session until the next read.
#[derive(Debug)]
pub struct Frame<'a> {
    pub data: &'a [u8],
    pub meta: FrameMeta,
}

/// A source of Ethernet frames with a BPF filter already applied.
///
/// Dropping the session releases the underlying handle.
pub trait CaptureSession {
    fn install_filter(&mut self, expression: &str) -> Result<(), CaptureError>;

    /// Blocks until the next frame passing the filter is available.
    fn read_frame(&mut self) -> Result<Frame<'_>, CaptureError>;
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub device: String,
    pub snaplen: i32,
    pub promiscuous: bool,
    /// `None` blocks until a frame arrives.
    pub read_timeout: Option<Duration>,
    pub immediate: bool,
}

impl SessionConfig {
    pub fn new(device: impl Into<String>) -> Result<Self, CaptureError> {
        let device = device.into();
        if device.trim().is_empty() {
            return Err(CaptureError::MissingDevice);
        }
        Ok(Self {
            device,
            snaplen: DEFAULT_SNAPLEN,
            promiscuous: false,
            read_timeout: None,
            immediate: true,
        })
    }

    /// libpcap reads a zero timeout as "wait forever".
    pub fn timeout_ms(&self) -> i32 {
        self.read_timeout
            .map(|t| i32::try_from(t.as_millis()).unwrap_or(i32::MAX).max(1))
            .unwrap_or(0)
    }
}
