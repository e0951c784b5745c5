//! Core types and the capture device abstraction.

use std::time::Duration;

use crate::error::Result;

/// Pixel format representation (e.g. YUYV).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FourCC(pub [u8; 4]);

impl FourCC {
    /// Create a new `FourCC` from a 4-byte array.
    #[must_use]
    pub const fn new(code: &[u8; 4]) -> Self {
        Self(*code)
    }

    /// YUYV pixel format (4:2:2 packed), the only source format this crate
    /// captures.
    pub const YUYV: Self = Self::new(b"YUYV");
}

impl std::fmt::Display for FourCC {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{}", char::from(byte))?;
        }
        Ok(())
    }
}

impl From<v4l::FourCC> for FourCC {
    fn from(fourcc: v4l::FourCC) -> Self {
        Self(fourcc.repr)
    }
}

impl From<FourCC> for v4l::FourCC {
    fn from(fourcc: FourCC) -> Self {
        Self::new(&fourcc.0)
    }
}

/// Video format specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Format {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Pixel format.
    pub fourcc: FourCC,
    /// Bytes per line (stride).
    pub stride: u32,
    /// Total frame size in bytes.
    pub size: u32,
}

impl Format {
    /// Create a new format specification.
    #[must_use]
    pub const fn new(width: u32, height: u32, fourcc: FourCC) -> Self {
        let stride = width * 2; // YUYV is 2 bytes per pixel
        let size = stride * height;
        Self {
            width,
            height,
            fourcc,
            stride,
            size,
        }
    }
}

/// Device capability flags queried at open time.
#[derive(Debug, Clone, Default)]
pub struct DeviceCapabilities {
    /// Driver name.
    pub driver: String,
    /// Card/device name.
    pub card: String,
    /// Bus information.
    pub bus_info: String,
    /// Whether the device can capture video.
    pub can_capture: bool,
    /// Whether the device supports streaming.
    pub can_stream: bool,
}

/// Metadata for a captured frame.
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    /// Frame sequence number.
    pub sequence: u32,
    /// Capture timestamp.
    pub timestamp: Duration,
    /// Actual bytes used in the frame buffer.
    pub bytes_used: u32,
}

/// Transient view over one dequeued buffer's packed YUYV bytes.
///
/// Borrows the backend's mapped memory; consumed synchronously during
/// conversion and never stored.
#[derive(Debug)]
pub struct RawFrame<'a> {
    /// Packed luma/chroma samples, 2 bytes per pixel.
    pub data: &'a [u8],
    /// Kernel-reported metadata for this frame.
    pub metadata: FrameMetadata,
}

/// Abstraction over a capture device and its kernel buffer ring.
///
/// [`CaptureSession`](crate::session::CaptureSession) drives these operations
/// in lifecycle order: `open`, `negotiate_format`, `stream_on`, then repeated
/// `dequeue`/`requeue`, and finally `stream_off`. Implemented by the V4L2
/// backend and by the in-tree mock, so the session state machine is testable
/// without hardware.
pub trait CaptureDevice: Sized {
    /// How to locate the device (e.g. a `/dev/videoN` index).
    type Config;

    /// Open the device and query its capabilities.
    fn open(config: &Self::Config) -> Result<Self>;

    /// Capabilities reported at open time.
    fn capabilities(&self) -> &DeviceCapabilities;

    /// Negotiate a capture format, requesting `frame_rate` frames per second
    /// best-effort. The driver must honor the format exactly; a frame-rate
    /// adjustment is not an error.
    fn negotiate_format(&mut self, format: &Format, frame_rate: u32) -> Result<Format>;

    /// Allocate, map and enqueue `buffer_count` kernel buffers, then start
    /// streaming. Dequeues block for at most `timeout` afterwards.
    fn stream_on(&mut self, buffer_count: u32, timeout: Duration) -> Result<()>;

    /// Wait for a filled buffer, bounded by the stream timeout, and dequeue
    /// it.
    fn dequeue(&mut self) -> Result<RawFrame<'_>>;

    /// Return the most recently dequeued buffer to the kernel capture queue.
    fn requeue(&mut self) -> Result<()>;

    /// Stop streaming. Mapped buffers stay allocated until the device is
    /// dropped, which unmaps the ring and closes the handle.
    fn stream_off(&mut self) -> Result<()>;
}
