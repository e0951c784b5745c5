//! Capture session lifecycle: open, arm, acquire frames, stop.

use std::time::Duration;

use tracing::{debug, warn};

use crate::convert::{yuyv_to_rgba, Rgba};
use crate::device::V4L2Device;
use crate::error::{CaptureError, ConvertError, Result};
use crate::traits::{CaptureDevice, Format, FourCC, FrameMetadata};

/// Number of kernel buffers in the capture ring.
pub const BUFFER_COUNT: u32 = 4;

/// Bounded wait for a filled buffer in [`CaptureSession::acquire_frame`].
pub const FRAME_WAIT: Duration = Duration::from_secs(2);

/// Capture session over the V4L2 hardware backend, located by device index.
pub type V4l2Session = CaptureSession<V4L2Device>;

/// One capture session over one device.
///
/// The session is either *closed* (no device held) or *armed* (device open,
/// format negotiated, ring mapped and queued, streaming on). `start` moves
/// closed to armed and rolls back fully on any failure; `stop` moves armed to
/// closed and is idempotent. Sessions are plain owned values: construct one
/// per device, no global state. Not internally synchronized; callers
/// serialize access.
pub struct CaptureSession<D: CaptureDevice> {
    config: D::Config,
    device: Option<D>,
    format: Option<Format>,
}

impl<D: CaptureDevice> CaptureSession<D> {
    /// Create a closed session for the device located by `config`.
    pub const fn new(config: D::Config) -> Self {
        Self {
            config,
            device: None,
            format: None,
        }
    }

    /// Whether the session is armed and ready to acquire frames.
    pub const fn is_armed(&self) -> bool {
        self.device.is_some()
    }

    /// The negotiated format, when armed.
    pub const fn format(&self) -> Option<&Format> {
        self.format.as_ref()
    }

    /// Open the device, negotiate `width`x`height` YUYV at `frame_rate` and
    /// arm the buffer ring.
    ///
    /// On success the session is armed. On any failure the partially
    /// initialized device is dropped, which unmaps whatever was mapped and
    /// closes the handle, and the session stays closed. Starting an armed
    /// session restarts it.
    pub fn start(&mut self, width: u32, height: u32, frame_rate: u32) -> Result<()> {
        if self.device.is_some() {
            debug!("restarting armed session");
            self.stop();
        }

        let mut device = D::open(&self.config)?;
        debug!(
            card = %device.capabilities().card,
            driver = %device.capabilities().driver,
            "opened capture device"
        );

        let requested = Format::new(width, height, FourCC::YUYV);
        // Failures past this point drop `device`, rolling back to closed.
        let format = device.negotiate_format(&requested, frame_rate)?;
        device.stream_on(BUFFER_COUNT, FRAME_WAIT)?;

        debug!(width, height, frame_rate, "session armed");
        self.format = Some(format);
        self.device = Some(device);
        Ok(())
    }

    /// Acquire the next frame and convert it into `out` as RGBA.
    ///
    /// Blocks for at most [`FRAME_WAIT`] until the kernel fills a buffer,
    /// dequeues it, converts it into the first `width * height` pixels of
    /// `out`, and requeues the buffer. Returns the kernel's metadata for the
    /// frame. `width` and `height` should match the negotiated format.
    ///
    /// On failure `out` is untouched, with one exception: a
    /// [`CaptureError::Requeue`] error is raised *after* conversion, so the
    /// frame in `out` is complete and usable even though the error reports
    /// that a ring slot was not returned to the kernel. No failure changes
    /// the armed state.
    pub fn acquire_frame(
        &mut self,
        out: &mut [Rgba],
        width: u32,
        height: u32,
    ) -> Result<FrameMetadata> {
        let device = self.device.as_mut().ok_or(CaptureError::NotOpen)?;

        // Reject impossible requests before a buffer leaves the ring.
        if width % 2 != 0 {
            return Err(ConvertError::OddWidth(width).into());
        }
        let pixels = width as usize * height as usize;
        if out.len() < pixels {
            return Err(ConvertError::OutputTooSmall {
                required: pixels,
                actual: out.len(),
            }
            .into());
        }

        let raw = device.dequeue()?;
        let metadata = raw.metadata.clone();
        let converted = yuyv_to_rgba(raw.data, out, width, height);

        // The buffer goes back to the kernel even when conversion failed;
        // otherwise the ring would drain one slot per bad frame.
        let requeued = device.requeue();
        converted?;
        requeued?;

        Ok(metadata)
    }

    /// Stop streaming and release every capture resource.
    ///
    /// Idempotent: a closed session is left untouched. A stream-off failure
    /// is logged and cleanup continues; the device drop unmaps the ring and
    /// closes the handle regardless. Afterwards the session is closed and
    /// `start` may be called again.
    pub fn stop(&mut self) {
        let Some(mut device) = self.device.take() else {
            return;
        };

        if let Err(err) = device.stream_off() {
            warn!("stream-off failed, releasing buffers anyway: {err}");
        }
        drop(device);
        self.format = None;
        debug!("session closed");
    }
}

impl<D: CaptureDevice> Drop for CaptureSession<D> {
    fn drop(&mut self) {
        self.stop();
    }
}
