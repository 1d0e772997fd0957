use super::{CaptureError, CaptureSession, Frame, FrameMeta, SessionConfig};
use pcap::{Active, Capture};
use tracing::{debug, info};

/// A libpcap handle on a network interface.
pub struct LiveSession {
    cap: Capture<Active>,
}

impl LiveSession {
    pub fn open(config: &SessionConfig) -> Result<Self, CaptureError> {
        if config.device.trim().is_empty() {
            return Err(CaptureError::MissingDevice);
        }

        let cap = Capture::from_device(config.device.as_str())?
            .snaplen(config.snaplen)
            .promisc(config.promiscuous)
            .timeout(config.timeout_ms())
            .immediate_mode(config.immediate)
            .open()?;

        info!(
            device = %config.device,
            snaplen = config.snaplen,
            promiscuous = config.promiscuous,
            timeout_ms = config.timeout_ms(),
            linktype = ?cap.get_datalink(),
            "Opened live capture"
        );

        Ok(Self { cap })
    }
}

impl CaptureSession for LiveSession {
    fn install_filter(&mut self, expression: &str) -> Result<(), CaptureError> {
        self.cap.filter(expression, true)?;
        debug!(filter = expression, "Installed BPF filter");
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame<'_>, CaptureError> {
        match self.cap.next_packet() {
            Ok(packet) => {
                let header = packet.header;
                let timestamp =
                    header.ts.tv_sec as f64 + header.ts.tv_usec as f64 / 1_000_000.0;
                Ok(Frame {
                    data: packet.data,
                    meta: FrameMeta {
                        timestamp,
                        captured_len: header.caplen,
                        original_len: header.len,
                    },
                })
            }
            Err(pcap::Error::TimeoutExpired) => Err(CaptureError::Timeout),
            Err(pcap::Error::NoMorePackets) => Err(CaptureError::EndOfCapture),
            Err(e) => Err(e.into()),
        }
    }
}
