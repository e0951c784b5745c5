//! V4L2 hardware backend using the v4l crate.

use std::time::Duration;

use tracing::{debug, warn};
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::{CaptureStream as V4lCaptureStream, Stream as V4lStream};
use v4l::video::capture::Parameters;
use v4l::video::Capture;
use v4l::Device;

use crate::error::{CaptureError, Result};
use crate::traits::{CaptureDevice, DeviceCapabilities, Format, FourCC, FrameMetadata, RawFrame};

/// V4L2 capture device with its mmap buffer ring.
///
/// The ring lives in `stream`; the v4l arena holds the mappings and releases
/// them on drop, so dropping a `V4L2Device` always unmaps before the handle
/// closes.
pub struct V4L2Device {
    device: Device,
    capabilities: DeviceCapabilities,
    stream: Option<Stream<'static>>,
}

impl CaptureDevice for V4L2Device {
    type Config = u32;

    /// Open `/dev/video{index}` and verify it can capture and stream.
    fn open(index: &u32) -> Result<Self> {
        let device = Device::new(*index as usize)
            .map_err(|err| CaptureError::DeviceOpen(err.to_string()))?;

        let caps = device
            .query_caps()
            .map_err(|err| CaptureError::DeviceOpen(err.to_string()))?;

        let capabilities = DeviceCapabilities {
            driver: caps.driver,
            card: caps.card,
            bus_info: caps.bus,
            can_capture: caps
                .capabilities
                .contains(v4l::capability::Flags::VIDEO_CAPTURE),
            can_stream: caps.capabilities.contains(v4l::capability::Flags::STREAMING),
        };

        if !capabilities.can_capture || !capabilities.can_stream {
            return Err(CaptureError::DeviceOpen(format!(
                "device {index} ({}) does not support streaming capture",
                capabilities.card
            )));
        }

        Ok(Self {
            device,
            capabilities,
            stream: None,
        })
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn negotiate_format(&mut self, format: &Format, frame_rate: u32) -> Result<Format> {
        let mut fmt = self
            .device
            .format()
            .map_err(|err| CaptureError::FormatNegotiation(err.to_string()))?;

        fmt.width = format.width;
        fmt.height = format.height;
        fmt.fourcc = format.fourcc.into();

        let fmt = self
            .device
            .set_format(&fmt)
            .map_err(|err| CaptureError::FormatNegotiation(err.to_string()))?;

        let actual = Format {
            width: fmt.width,
            height: fmt.height,
            fourcc: FourCC::from(fmt.fourcc),
            stride: fmt.stride,
            size: fmt.size,
        };

        // A silently adjusted format would make the converter misread the
        // payload, so treat any deviation as a rejection.
        if actual.fourcc != format.fourcc
            || actual.width != format.width
            || actual.height != format.height
        {
            return Err(CaptureError::FormatNegotiation(format!(
                "requested {}x{} {}, driver selected {}x{} {}",
                format.width, format.height, format.fourcc, actual.width, actual.height,
                actual.fourcc
            )));
        }

        // Frame rate is best-effort: drivers may clamp or ignore it.
        match self.device.set_params(&Parameters::with_fps(frame_rate)) {
            Ok(_) => debug!(frame_rate, "streaming parameters set"),
            Err(err) => warn!("driver ignored frame rate request: {err}"),
        }

        Ok(actual)
    }

    fn stream_on(&mut self, buffer_count: u32, timeout: Duration) -> Result<()> {
        // with_buffers performs REQBUFS, QUERYBUF and mmap for the whole ring;
        // a failure anywhere surfaces here and nothing stays mapped.
        let mut stream = Stream::with_buffers(&self.device, Type::VideoCapture, buffer_count)
            .map_err(|err| CaptureError::BufferAllocation(err.to_string()))?;

        stream.set_timeout(timeout);

        // start() enqueues every mapped buffer and issues STREAMON.
        V4lStream::start(&mut stream).map_err(|err| CaptureError::StreamOn(err.to_string()))?;

        self.stream = Some(stream);
        Ok(())
    }

    fn dequeue(&mut self) -> Result<RawFrame<'_>> {
        let stream = self.stream.as_mut().ok_or(CaptureError::NotOpen)?;

        let (data, meta) = stream.next().map_err(|err| match err.kind() {
            std::io::ErrorKind::TimedOut => CaptureError::FrameTimeout,
            std::io::ErrorKind::Interrupted => CaptureError::Wait(err.to_string()),
            _ => CaptureError::Dequeue(err.to_string()),
        })?;

        // Safe conversions: V4L2 timestamps are always non-negative in practice
        #[allow(clippy::cast_sign_loss)]
        let secs = meta.timestamp.sec.max(0) as u64;
        #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
        let nanos = (meta.timestamp.usec.max(0) as u32).saturating_mul(1000);

        Ok(RawFrame {
            data,
            metadata: FrameMetadata {
                sequence: meta.sequence,
                timestamp: Duration::new(secs, nanos),
                bytes_used: meta.bytesused,
            },
        })
    }

    /// The v4l arena returns the previously dequeued buffer to the kernel at
    /// the start of the next dequeue, so the requeue itself cannot fail here.
    /// One buffer still transitions filled to available per acquire cycle.
    fn requeue(&mut self) -> Result<()> {
        if self.stream.is_some() {
            Ok(())
        } else {
            Err(CaptureError::NotOpen)
        }
    }

    fn stream_off(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            // Dropping the stream afterwards unmaps the whole ring.
            V4lStream::stop(&mut stream)
                .map_err(|err| CaptureError::StreamOff(err.to_string()))?;
        }
        Ok(())
    }
}
