//! Error types for capture and conversion operations.

use thiserror::Error;

/// Error raised by the YUYV to RGBA converter.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConvertError {
    /// Width must be even: YUYV stores pixels in pairs sharing chroma.
    #[error("frame width {0} is odd; YUYV carries pixels in chroma-sharing pairs")]
    OddWidth(u32),
    /// The raw payload holds fewer bytes than width * height * 2.
    #[error("raw frame is {actual} bytes, need {required}")]
    InputTooShort {
        /// Bytes needed for the requested dimensions.
        required: usize,
        /// Bytes actually supplied.
        actual: usize,
    },
    /// The output slice holds fewer pixels than width * height.
    #[error("output holds {actual} pixels, need {required}")]
    OutputTooSmall {
        /// Pixels needed for the requested dimensions.
        required: usize,
        /// Pixels actually supplied.
        actual: usize,
    },
}

/// Error raised by the capture session or a device backend.
///
/// Every lifecycle step surfaces its own variant so callers can branch on
/// the exact failure instead of scraping diagnostic text.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// The device could not be opened or lacks capture capability.
    #[error("failed to open capture device: {0}")]
    DeviceOpen(String),
    /// The driver rejected or altered the requested capture format.
    #[error("format negotiation failed: {0}")]
    FormatNegotiation(String),
    /// The kernel could not allocate the requested buffer ring.
    #[error("buffer allocation failed: {0}")]
    BufferAllocation(String),
    /// Mapping a granted buffer into the process address space failed.
    #[error("failed to map capture buffer {index}: {reason}")]
    BufferMap {
        /// Ring slot that failed to map.
        index: u32,
        /// Underlying failure description.
        reason: String,
    },
    /// Handing a mapped buffer to the kernel capture queue failed.
    #[error("failed to enqueue capture buffer {index}: {reason}")]
    Enqueue {
        /// Ring slot that failed to enqueue.
        index: u32,
        /// Underlying failure description.
        reason: String,
    },
    /// The device refused to start streaming.
    #[error("failed to start streaming: {0}")]
    StreamOn(String),
    /// An operation that requires an armed session found none.
    #[error("capture session is not armed")]
    NotOpen,
    /// Waiting for buffer readiness failed outright.
    #[error("error while waiting for a filled buffer: {0}")]
    Wait(String),
    /// The bounded wait for a filled buffer expired.
    #[error("timed out waiting for a filled buffer")]
    FrameTimeout,
    /// Retrieving a filled buffer from the kernel failed.
    #[error("failed to dequeue a filled buffer: {0}")]
    Dequeue(String),
    /// Returning a consumed buffer to the kernel queue failed.
    ///
    /// The frame converted before the requeue attempt is still valid;
    /// only future buffer availability degrades.
    #[error("failed to requeue capture buffer {index}: {reason}")]
    Requeue {
        /// Ring slot that failed to requeue.
        index: u32,
        /// Underlying failure description.
        reason: String,
    },
    /// The device refused to stop streaming. Cleanup continues regardless.
    #[error("failed to stop streaming: {0}")]
    StreamOff(String),
    /// Pixel conversion rejected the request.
    #[error(transparent)]
    Convert(#[from] ConvertError),
}

/// Result type for capture operations.
pub type Result<T> = std::result::Result<T, CaptureError>;
