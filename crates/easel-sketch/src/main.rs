mod doodle;
mod text;

use anyhow::Result;
use easel_engine::compositor::CompositorConfig;
use easel_engine::device::GpuInit;
use easel_engine::logging::{init_logging, LoggingConfig};
use easel_engine::window::{Runtime, RuntimeConfig};
use winit::dpi::LogicalSize;

use doodle::Doodle;

const DEFAULT_SIZE: (f64, f64) = (800.0, 600.0);

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let (width, height) = std::env::var("EASEL_SIZE")
        .ok()
        .and_then(|s| {
            let size = parse_size(&s);
            if size.is_none() {
                log::warn!("ignoring EASEL_SIZE={s:?}; expected WIDTHxHEIGHT");
            }
            size
        })
        .unwrap_or(DEFAULT_SIZE);

    let config = RuntimeConfig {
        title: "easel".to_string(),
        initial_size: LogicalSize::new(width, height),
    };

    Runtime::run(
        config,
        GpuInit::default(),
        CompositorConfig::default(),
        Doodle::new(text::TextPainter::from_system_font()),
    )
}

/// Parses `"1024x768"`. Both dimensions must be positive.
fn parse_size(s: &str) -> Option<(f64, f64)> {
    let (w, h) = s.trim().split_once(['x', 'X'])?;
    let w: u32 = w.trim().parse().ok()?;
    let h: u32 = h.trim().parse().ok()?;
    (w > 0 && h > 0).then_some((w as f64, h as f64))
}
