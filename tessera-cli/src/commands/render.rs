//! `tessera render`: paint a multi-resolution image at a given scale.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tiny_skia::{Pixmap, Transform};
use tracing::info;

use tessera::config::RenderConfig;
use tessera::geom::ViewRect;
use tessera::multires::{
    BuildOutcome, FallbackLoader, FileLoader, InterpretationKind, MultiResStatsSnapshot,
    MultiResolutionNode, PreserveAspectRatio, ViewportSpec,
};

use super::common::{parse_candidate, working_dir_base};
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Candidate resource as locator[@min:max] (repeatable, in preference order)
    #[arg(long = "candidate", value_name = "LOCATOR", required = true)]
    candidates: Vec<String>,

    /// Width of the image bounds in user units
    #[arg(long, default_value_t = 100.0)]
    width: f32,

    /// Height of the image bounds in user units
    #[arg(long, default_value_t = 100.0)]
    height: f32,

    /// Uniform paint scale
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    /// preserveAspectRatio value, e.g. "xMinYMin slice"
    #[arg(long, default_value = "xMidYMid meet")]
    aspect: PreserveAspectRatio,

    /// Clip content overflowing the bounds
    #[arg(long)]
    clip: bool,

    /// PNG file to write
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct RenderReport {
    effective_width: f64,
    selected: Option<usize>,
    locator: Option<String>,
    interpretation: Option<InterpretationKind>,
    from_cache: bool,
    failures: Vec<String>,
    stats: MultiResStatsSnapshot,
    output: String,
}

pub fn run(args: RenderArgs, config: &RenderConfig) -> Result<(), CliError> {
    if !(args.scale > 0.0 && args.scale.is_finite()) {
        return Err(CliError::Usage(format!("Invalid scale {}", args.scale)));
    }

    let base = working_dir_base()?;
    let candidates = args
        .candidates
        .iter()
        .map(|c| parse_candidate(c, &base))
        .collect::<Result<Vec<_>, _>>()?;

    let loader = FallbackLoader::new().with(FileLoader::new());
    let node = MultiResolutionNode::new(
        ViewRect::from_size(args.width, args.height),
        candidates,
        Arc::new(loader),
    )
    .with_viewport(ViewportSpec {
        preserve_aspect_ratio: args.aspect,
        overflow_hidden: args.clip,
        clip_offsets: None,
    })
    .with_cache_policy(config.multires.cache_policy());

    let canvas_w = (args.width * args.scale).ceil().max(1.0) as u32;
    let canvas_h = (args.height * args.scale).ceil().max(1.0) as u32;
    let mut pixmap = Pixmap::new(canvas_w, canvas_h)
        .ok_or_else(|| CliError::Usage(format!("Invalid canvas {}×{}", canvas_w, canvas_h)))?;
    let transform = Transform::from_scale(args.scale, args.scale);

    let selected = node.select(&transform);
    let outcome = selected.and_then(|index| node.build(index));

    let mut report = RenderReport {
        effective_width: node.effective_width(&transform),
        selected,
        locator: selected.map(|i| node.candidates()[i].locator.to_string()),
        interpretation: None,
        from_cache: false,
        failures: Vec::new(),
        stats: MultiResStatsSnapshot::default(),
        output: args.output.display().to_string(),
    };
    match &outcome {
        Some(BuildOutcome::Cached(scene)) => {
            report.interpretation = Some(scene.kind());
            report.from_cache = true;
        }
        Some(BuildOutcome::Built { node: scene, rejected }) => {
            report.interpretation = Some(scene.kind());
            report.failures = rejected.iter().map(ToString::to_string).collect();
        }
        Some(BuildOutcome::Failed { attempts, .. }) => {
            report.failures = attempts.iter().map(ToString::to_string).collect();
        }
        None => {}
    }

    if outcome.as_ref().and_then(BuildOutcome::node).is_some() {
        node.primitive_paint(&mut pixmap.as_mut(), transform);
    }
    pixmap
        .save_png(&args.output)
        .map_err(|e| CliError::Output(e.to_string()))?;
    info!(path = %args.output.display(), "Wrote rendered image");

    report.stats = node.stats().snapshot();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &RenderReport) {
    println!("Effective width: {:.1}", report.effective_width);
    match (&report.selected, &report.locator) {
        (Some(index), Some(locator)) => println!("Selected:        #{} {}", index, locator),
        _ => println!("Selected:        (none)"),
    }
    match report.interpretation {
        Some(kind) if report.from_cache => println!("Interpretation:  {} (cached)", kind),
        Some(kind) => println!("Interpretation:  {}", kind),
        None => println!("Interpretation:  (nothing painted)"),
    }
    for failure in &report.failures {
        println!("  rejected: {}", failure);
    }
    println!("Stats:           {}", report.stats);
    println!("Output:          {}", report.output);
}
