use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sync::{Summary, SyncController};
use tools::{
    SessionSource, filter_from_args, open_session, parse_record_id, parse_sequence,
    parse_time_mode, simulate, style_from_json,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless driver for the synchronized space-time cubes")]
struct Args {
    /// JSON config file (every field optional)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Dataset rows (JSON array of sheet rows)
    #[arg(long)]
    data: PathBuf,

    /// Node layout positions for the network cube
    #[arg(long)]
    layout: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load, optionally filter/style/select, and print the resulting state
    Summary {
        #[command(flatten)]
        view: ViewArgs,
    },

    /// Run a transition sequence on the render clock and print the final state
    Simulate {
        #[command(flatten)]
        view: ViewArgs,

        /// Comma-separated layouts: stc, jp, si, ani
        #[arg(long, default_value = "stc,si,stc")]
        sequence: String,

        /// Seconds each layout is held before the next one starts
        #[arg(long, default_value_t = 5.0)]
        hold: f64,

        /// Render ticks per second
        #[arg(long, default_value_t = 60)]
        fps: u32,
    },
}

#[derive(clap::Args, Debug)]
struct ViewArgs {
    /// Category_1 to keep (empty keeps all)
    #[arg(long)]
    category: Option<String>,

    /// Start of the date interval
    #[arg(long)]
    start: Option<String>,

    /// End of the date interval
    #[arg(long)]
    end: Option<String>,

    /// aggregated | absolute
    #[arg(long)]
    time: Option<String>,

    /// Style command JSON, e.g. '{"numSlices": 5}'
    #[arg(long)]
    style: Option<String>,

    /// Record id to highlight
    #[arg(long)]
    highlight: Option<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

fn real_main() -> Result<(), String> {
    let args = Args::parse();
    let source = SessionSource {
        config: args.config.as_deref(),
        data: Some(args.data.as_path()),
        layout: args.layout.as_deref(),
    };
    let mut controller = open_session(&source)?;

    match args.command {
        Command::Summary { view } => {
            apply_view_args(&mut controller, &view)?;
        }
        Command::Simulate {
            view,
            sequence,
            hold,
            fps,
        } => {
            apply_view_args(&mut controller, &view)?;
            let sequence = parse_sequence(&sequence)?;
            let frames = simulate(&mut controller, &sequence, hold, fps);
            info!(frames, steps = sequence.len(), "simulation finished");
        }
    }

    let summary = Summary::of(&controller);
    let json = serde_json::to_string_pretty(&summary).map_err(|e| format!("serialize: {e}"))?;
    println!("{json}");
    Ok(())
}

fn apply_view_args(controller: &mut SyncController, view: &ViewArgs) -> Result<(), String> {
    if let Some(style) = &view.style {
        controller.apply_style(style_from_json(style)?);
    }
    if let Some(mode) = &view.time {
        controller.set_time_mode(parse_time_mode(mode)?);
    }
    if let Some(filter) = filter_from_args(
        view.category.as_deref(),
        view.start.as_deref(),
        view.end.as_deref(),
    )? {
        controller.filter(filter);
    }
    if let Some(id) = &view.highlight {
        controller.highlight(Some(parse_record_id(id)?));
    }
    Ok(())
}
