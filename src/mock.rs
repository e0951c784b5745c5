//! Mock capture backend for testing the session lifecycle without hardware.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::error::{CaptureError, Result};
use crate::traits::{CaptureDevice, DeviceCapabilities, Format, FrameMetadata, RawFrame};

/// Failure switches, one per lifecycle step the session drives.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailureInjection {
    /// Fail `open`.
    pub open: bool,
    /// Fail `negotiate_format`.
    pub negotiate: bool,
    /// Fail ring allocation in `stream_on`.
    pub allocate: bool,
    /// Fail mapping the second buffer in `stream_on`.
    pub map: bool,
    /// Fail enqueueing the third buffer in `stream_on`.
    pub enqueue: bool,
    /// Fail the final stream-on step.
    pub stream_on: bool,
    /// Time out instead of producing a frame.
    pub wait_timeout: bool,
    /// Fail buffer readiness outright.
    pub wait_error: bool,
    /// Fail `dequeue` after a successful wait.
    pub dequeue: bool,
    /// Fail `requeue`.
    pub requeue: bool,
    /// Fail `stream_off`.
    pub stream_off: bool,
}

/// Observations recorded by the mock for post-mortem assertions, shared with
/// the test through `Rc` so they survive the device being dropped.
#[derive(Debug, Default)]
pub struct Probe {
    /// Successful opens.
    pub opened: u32,
    /// Devices dropped.
    pub dropped: u32,
    /// Whether streaming was still on when the device was dropped.
    pub streaming_at_drop: bool,
    /// Buffers still mapped when the device was dropped. Drop unmaps them,
    /// mirroring the RAII arena of the real backend.
    pub mapped_at_drop: u32,
    /// Total dequeue attempts, including injected failures.
    pub dequeue_attempts: u32,
}

/// Configuration for constructing a [`MockDevice`].
#[derive(Debug, Clone, Default)]
pub struct MockConfig {
    /// Pattern used to synthesize frame payloads.
    pub pattern: TestPattern,
    /// Which lifecycle steps should fail.
    pub fail: FailureInjection,
    /// Shared observation record.
    pub probe: Rc<RefCell<Probe>>,
}

/// Test pattern types for mock frame generation.
#[derive(Debug, Clone, Copy, Default)]
pub enum TestPattern {
    /// Eight vertical color bars.
    #[default]
    ColorBars,
    /// Horizontal luma gradient, dark to light.
    Gradient,
    /// Solid color with the given Y, U, V values.
    Solid(u8, u8, u8),
}

#[derive(Debug, Clone, Copy)]
struct RingSlot {
    mapped: bool,
    queued: bool,
}

/// Mock capture device with an explicit buffer ring.
#[derive(Debug)]
pub struct MockDevice {
    config: MockConfig,
    capabilities: DeviceCapabilities,
    format: Format,
    ring: Vec<RingSlot>,
    streaming: bool,
    last_dequeued: Option<usize>,
    frame_count: u32,
    payload: Vec<u8>,
}

impl MockDevice {
    /// Buffers currently mapped.
    pub fn mapped_count(&self) -> usize {
        self.ring.iter().filter(|slot| slot.mapped).count()
    }

    /// Buffers currently queued for the kernel to fill.
    pub fn queued_count(&self) -> usize {
        self.ring.iter().filter(|slot| slot.queued).count()
    }

    /// Whether streaming is on.
    pub const fn is_streaming(&self) -> bool {
        self.streaming
    }
}

impl CaptureDevice for MockDevice {
    type Config = MockConfig;

    fn open(config: &MockConfig) -> Result<Self> {
        if config.fail.open {
            return Err(CaptureError::DeviceOpen("injected open failure".to_owned()));
        }
        config.probe.borrow_mut().opened += 1;

        Ok(Self {
            config: config.clone(),
            capabilities: DeviceCapabilities {
                driver: "mock".to_owned(),
                card: "Mock Camera".to_owned(),
                bus_info: "mock:0".to_owned(),
                can_capture: true,
                can_stream: true,
            },
            format: Format::new(0, 0, crate::traits::FourCC::YUYV),
            ring: Vec::new(),
            streaming: false,
            last_dequeued: None,
            frame_count: 0,
            payload: Vec::new(),
        })
    }

    fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    fn negotiate_format(&mut self, format: &Format, _frame_rate: u32) -> Result<Format> {
        if self.config.fail.negotiate {
            return Err(CaptureError::FormatNegotiation(
                "injected negotiation failure".to_owned(),
            ));
        }
        self.format = format.clone();
        Ok(format.clone())
    }

    fn stream_on(&mut self, buffer_count: u32, _timeout: Duration) -> Result<()> {
        if self.config.fail.allocate {
            return Err(CaptureError::BufferAllocation(
                "injected allocation failure".to_owned(),
            ));
        }

        for index in 0..buffer_count {
            if self.config.fail.map && index == 1 {
                return Err(CaptureError::BufferMap {
                    index,
                    reason: "injected map failure".to_owned(),
                });
            }
            self.ring.push(RingSlot {
                mapped: true,
                queued: false,
            });
        }

        for index in 0..buffer_count {
            if self.config.fail.enqueue && index == 2 {
                return Err(CaptureError::Enqueue {
                    index,
                    reason: "injected enqueue failure".to_owned(),
                });
            }
            if let Some(slot) = self.ring.get_mut(index as usize) {
                slot.queued = true;
            }
        }

        if self.config.fail.stream_on {
            return Err(CaptureError::StreamOn(
                "injected stream-on failure".to_owned(),
            ));
        }

        self.payload = generate_frame(&self.format, self.config.pattern);
        self.streaming = true;
        Ok(())
    }

    fn dequeue(&mut self) -> Result<RawFrame<'_>> {
        self.config.probe.borrow_mut().dequeue_attempts += 1;

        if !self.streaming {
            return Err(CaptureError::NotOpen);
        }
        if self.config.fail.wait_timeout {
            return Err(CaptureError::FrameTimeout);
        }
        if self.config.fail.wait_error {
            return Err(CaptureError::Wait("injected wait failure".to_owned()));
        }
        if self.config.fail.dequeue {
            return Err(CaptureError::Dequeue(
                "injected dequeue failure".to_owned(),
            ));
        }

        let index = self
            .ring
            .iter()
            .position(|slot| slot.queued)
            .ok_or_else(|| CaptureError::Dequeue("no queued buffer".to_owned()))?;
        if let Some(slot) = self.ring.get_mut(index) {
            slot.queued = false;
        }
        self.last_dequeued = Some(index);

        let sequence = self.frame_count;
        self.frame_count += 1;

        Ok(RawFrame {
            data: &self.payload,
            metadata: FrameMetadata {
                sequence,
                timestamp: Duration::from_millis(u64::from(sequence) * 33), // ~30fps
                bytes_used: self.format.size,
            },
        })
    }

    fn requeue(&mut self) -> Result<()> {
        let index = self.last_dequeued.take().ok_or(CaptureError::NotOpen)?;
        if self.config.fail.requeue {
            #[allow(clippy::cast_possible_truncation)]
            return Err(CaptureError::Requeue {
                index: index as u32,
                reason: "injected requeue failure".to_owned(),
            });
        }
        if let Some(slot) = self.ring.get_mut(index) {
            slot.queued = true;
        }
        Ok(())
    }

    fn stream_off(&mut self) -> Result<()> {
        if self.config.fail.stream_off {
            return Err(CaptureError::StreamOff(
                "injected stream-off failure".to_owned(),
            ));
        }
        self.streaming = false;
        Ok(())
    }
}

impl Drop for MockDevice {
    fn drop(&mut self) {
        let mut probe = self.config.probe.borrow_mut();
        probe.dropped += 1;
        probe.streaming_at_drop = self.streaming;
        #[allow(clippy::cast_possible_truncation)]
        {
            probe.mapped_at_drop = self.ring.iter().filter(|slot| slot.mapped).count() as u32;
        }
        // Drop unmaps everything, like the real arena.
        self.ring.clear();
    }
}

/// Generate a YUYV payload for the given pattern.
pub fn generate_frame(format: &Format, pattern: TestPattern) -> Vec<u8> {
    let mut data = vec![0u8; (format.width * format.height * 2) as usize];

    match pattern {
        TestPattern::ColorBars => fill_color_bars(&mut data, format.width),
        TestPattern::Gradient => fill_gradient(&mut data, format.width),
        TestPattern::Solid(y, u, v) => fill_solid(&mut data, y, u, v),
    }

    data
}

/// Studio-range YUV values for eight vertical bars:
/// white, yellow, cyan, green, magenta, red, blue, black.
const BAR_YUV: [(u8, u8, u8); 8] = [
    (235, 128, 128),
    (210, 16, 146),
    (170, 166, 16),
    (145, 54, 34),
    (106, 202, 222),
    (81, 90, 240),
    (41, 240, 110),
    (16, 128, 128),
];

fn fill_color_bars(data: &mut [u8], width: u32) {
    let bar_width = (width / 8).max(1);
    let pairs_per_row = (width / 2) as usize;

    for (i, group) in data.chunks_exact_mut(4).enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let x = ((i % pairs_per_row) * 2) as u32;
        let bar = (x / bar_width).min(7) as usize;
        let (y, u, v) = BAR_YUV[bar];
        group.copy_from_slice(&[y, u, y, v]);
    }
}

fn fill_gradient(data: &mut [u8], width: u32) {
    let pairs_per_row = (width / 2) as usize;

    for (i, group) in data.chunks_exact_mut(4).enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let x = ((i % pairs_per_row) * 2) as u32;
        #[allow(clippy::cast_possible_truncation)]
        let y = ((x * 255) / width) as u8;
        group.copy_from_slice(&[y, 128, y, 128]);
    }
}

fn fill_solid(data: &mut [u8], y: u8, u: u8, v: u8) {
    for group in data.chunks_exact_mut(4) {
        group.copy_from_slice(&[y, u, y, v]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::FourCC;

    #[test]
    fn open_reports_mock_capabilities() {
        let device = MockDevice::open(&MockConfig::default()).expect("open failed");
        assert_eq!(device.capabilities().driver, "mock");
        assert!(device.capabilities().can_capture);
        assert!(device.capabilities().can_stream);
    }

    #[test]
    fn ring_transitions_one_buffer_per_cycle() {
        let config = MockConfig::default();
        let mut device = MockDevice::open(&config).expect("open failed");
        let format = Format::new(64, 32, FourCC::YUYV);
        device.negotiate_format(&format, 30).expect("negotiate failed");
        device
            .stream_on(4, Duration::from_secs(2))
            .expect("stream_on failed");

        assert_eq!(device.mapped_count(), 4);
        assert_eq!(device.queued_count(), 4);

        let sequence = device.dequeue().expect("dequeue failed").metadata.sequence;
        assert_eq!(sequence, 0);
        assert_eq!(device.queued_count(), 3);

        device.requeue().expect("requeue failed");
        assert_eq!(device.queued_count(), 4);
    }

    #[test]
    fn color_bars_start_white_and_end_black() {
        let format = Format::new(640, 480, FourCC::YUYV);
        let data = generate_frame(&format, TestPattern::ColorBars);

        assert_eq!(data.len(), (640 * 480 * 2) as usize);
        assert_eq!(data[0], 235);
        // last pair of the first row sits in the black bar
        assert_eq!(data[638 * 2], 16);
    }

    #[test]
    fn gradient_rises_left_to_right() {
        let format = Format::new(640, 480, FourCC::YUYV);
        let data = generate_frame(&format, TestPattern::Gradient);

        assert!(data[0] < 10);
        let last_row = (479 * 640 * 2) as usize;
        assert!(data[last_row + 638 * 2] > 200);
    }

    #[test]
    fn solid_fills_every_group() {
        let format = Format::new(64, 64, FourCC::YUYV);
        let data = generate_frame(&format, TestPattern::Solid(128, 64, 192));

        assert_eq!(&data[..4], &[128, 64, 128, 192]);
        assert_eq!(&data[data.len() - 4..], &[128, 64, 128, 192]);
    }

    #[test]
    fn drop_records_ring_state() {
        let config = MockConfig::default();
        {
            let mut device = MockDevice::open(&config).expect("open failed");
            let format = Format::new(64, 32, FourCC::YUYV);
            device.negotiate_format(&format, 30).expect("negotiate failed");
            device
                .stream_on(4, Duration::from_secs(2))
                .expect("stream_on failed");
        }
        let probe = config.probe.borrow();
        assert_eq!(probe.dropped, 1);
        assert_eq!(probe.mapped_at_drop, 4);
    }
}
