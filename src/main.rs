use std::error::Error;
use std::time::Duration;

use clap::Parser;
use log::info;

use cubestory::{Cube, CubeConfig};

mod graphics;
mod vertex;
mod widget;

use widget::{CubeWidget, Layout, WheelLock};

/// Swipe through an endless stack of stories on a turning cube
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Number of stories, 0 for an endless sequence
    #[arg(short = 'n', long, default_value_t = 12)]
    items: u64,

    /// Story shown first
    #[arg(short, long, default_value_t = 0)]
    start: i64,

    /// Length of a turn in milliseconds
    #[arg(long, default_value_t = 300)]
    duration_ms: u64,

    /// Scale of the cube half way between two faces
    #[arg(long, default_value_t = 0.95)]
    min_scale: f64,

    /// Ignore mouse drags
    #[arg(long)]
    no_gestures: bool,

    /// Keep the mouse wheel active while the cube turns
    #[arg(long)]
    no_scroll_lock: bool,

    /// Show the debug overlay
    #[arg(short, long)]
    debug: bool,
}

fn story_label(index: i64) -> String {
    format!("story {}", index + 1)
}

/// Main function
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    let (cols, rows) = termsize::get()
        .map(|size| (size.cols, size.rows))
        .unwrap_or((80, 24));
    let layout = Layout::new(cols, rows);
    let (width, height) = layout.pane_size();

    let config = CubeConfig {
        initial_index: args.start,
        width,
        height,
        perspective: width * 3.0,
        scale_range: (1.0, args.min_scale),
        lock_scrolling: !args.no_scroll_lock,
        enable_gestures: !args.no_gestures,
        transition: Duration::from_millis(args.duration_ms),
        ..CubeConfig::default()
    };
    info!("starting at story {} with {:?}", args.start, config);

    let items = args.items;
    let wheel = WheelLock::default();
    let cube = Cube::new(config, |index, _active, _rotation| Some(story_label(index)))?
        .with_has_next(move |index| items == 0 || index + 1 < items as i64)
        .on_index_change(|index| info!("turning to story {index}"))
        .with_scroll_lock(wheel.clone());

    CubeWidget::new(cube, layout, wheel, args.debug).run()?;

    Ok(())
}
