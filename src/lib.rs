//! videocap: V4L2 frame capture with YUYV to RGBA conversion.
//!
//! A [`session::CaptureSession`] owns the full device lifecycle: open, format
//! negotiation, the mmap buffer ring, streaming, and teardown. Each acquired
//! frame is converted into a caller-owned RGBA pixel slice by the pure
//! [`convert::yuyv_to_rgba`] routine. The session is generic over the
//! [`traits::CaptureDevice`] seam, so the state machine runs unchanged
//! against real hardware or the in-tree mock.

pub mod convert;
pub mod device;
pub mod error;
pub mod session;
pub mod shell;
pub mod traits;
pub mod validation;

#[cfg(test)]
pub mod mock;

pub use convert::{yuyv_to_rgba, Rgba};
pub use device::V4L2Device;
pub use error::{CaptureError, ConvertError, Result};
pub use session::{CaptureSession, V4l2Session, BUFFER_COUNT, FRAME_WAIT};
pub use traits::{CaptureDevice, DeviceCapabilities, Format, FourCC, FrameMetadata, RawFrame};
