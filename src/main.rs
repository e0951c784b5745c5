//! Demo binary: arm a capture session, grab a few frames, stop.

use videocap::{Rgba, V4l2Session};

const WIDTH: u32 = 640;
const HEIGHT: u32 = 480;
const FRAME_RATE: u32 = 30;
const FRAME_COUNT: u32 = 60;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> videocap::Result<()> {
    let mut session = V4l2Session::new(0);
    session.start(WIDTH, HEIGHT, FRAME_RATE)?;

    if let Some(format) = session.format() {
        println!(
            "Capturing {}x{} {} ({} bytes per frame)",
            format.width, format.height, format.fourcc, format.size
        );
    }

    let mut pixels = vec![Rgba::default(); (WIDTH * HEIGHT) as usize];
    for _ in 0..FRAME_COUNT {
        let meta = session.acquire_frame(&mut pixels, WIDTH, HEIGHT)?;
        println!(
            "Frame {}: {} bytes used, timestamp: {:?}",
            meta.sequence, meta.bytes_used, meta.timestamp
        );
    }

    session.stop();
    Ok(())
}
