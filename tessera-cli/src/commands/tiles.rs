//! `tessera tiles`: tile an image through the shared cache.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use image::{DynamicImage, GrayImage, RgbaImage};
use serde::Serialize;
use tracing::info;

use tessera::cache::{SharedTileCache, TileCache};
use tessera::config::{format_size, RenderConfig};
use tessera::tile::{
    CachingTileNode, ImageSource, PixelLayout, SharedTileStore, Tile, TileSource,
    TileStatsSnapshot,
};

use super::common::parse_rect;
use crate::error::CliError;

#[derive(Debug, Args)]
pub struct TilesArgs {
    /// Input image (PNG or JPEG)
    image: PathBuf,

    /// Tile width and height in pixels (overrides config)
    #[arg(long, value_name = "PIXELS")]
    tile_size: Option<u32>,

    /// Region to invalidate after warming, as x,y,w,h (repeatable)
    #[arg(long, value_name = "RECT")]
    invalidate: Vec<String>,

    /// Reassemble the image from its tiles and write it here
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Serialize)]
struct TilesReport {
    image: String,
    width: i32,
    height: i32,
    tile_width: i32,
    tile_height: i32,
    tiles: usize,
    warmed: u64,
    invalidated: usize,
    stats: TileStatsSnapshot,
    cache_entries: u64,
    cache_bytes: u64,
}

pub fn run(args: TilesArgs, config: &RenderConfig) -> Result<(), CliError> {
    let regions = args
        .invalidate
        .iter()
        .map(|r| parse_rect(r))
        .collect::<Result<Vec<_>, _>>()?;

    let (tile_width, tile_height) = match args.tile_size {
        Some(0) => return Err(CliError::Usage("Tile size must be positive".to_string())),
        Some(size) => (size, size),
        None => (config.tiles.tile_width, config.tiles.tile_height),
    };

    let cache = Arc::new(SharedTileCache::new(config.eviction_policy()));
    let source = ImageSource::open(&args.image)?;
    let node = CachingTileNode::with_tile_size(
        source,
        tile_width,
        tile_height,
        Box::new(SharedTileStore::new(cache.clone())),
    )?;

    let warmed = node.warm()?;
    info!(tiles = warmed, image = %args.image.display(), "Warmed tile grid");

    let invalidated: usize = regions
        .iter()
        .map(|rect| node.invalidate_region(rect))
        .sum();

    if let Some(output) = &args.output {
        let mut dest = Tile::new(node.bounds(), node.layout());
        node.copy_into(&mut dest)?;
        to_image(dest)?.save(output)?;
        info!(path = %output.display(), "Wrote reassembled image");
    }

    cache.gc();
    let geometry = node.geometry();
    let bounds = geometry.bounds();
    let report = TilesReport {
        image: args.image.display().to_string(),
        width: bounds.width,
        height: bounds.height,
        tile_width: geometry.tile_width(),
        tile_height: geometry.tile_height(),
        tiles: geometry.tile_count(),
        warmed,
        invalidated,
        stats: node.stats().snapshot(),
        cache_entries: cache.entry_count(),
        cache_bytes: cache.size_bytes(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn to_image(tile: Tile) -> Result<DynamicImage, CliError> {
    let (width, height, layout) = (tile.width(), tile.height(), tile.layout());
    let data = tile.data().to_vec();
    let image = match layout {
        PixelLayout::Rgba8 => RgbaImage::from_raw(width, height, data).map(DynamicImage::ImageRgba8),
        PixelLayout::Gray8 => GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8),
    };
    image.ok_or_else(|| CliError::Output(format!("tile buffer does not match {}×{}", width, height)))
}

fn print_report(report: &TilesReport) {
    println!("Image: {} ({}×{})", report.image, report.width, report.height);
    println!(
        "  Grid:        {} tiles of {}×{}",
        report.tiles, report.tile_width, report.tile_height
    );
    println!("  Warmed:      {}", report.warmed);
    println!("  Invalidated: {}", report.invalidated);
    println!("  Stats:       {}", report.stats);
    println!(
        "  Cache:       {} entries, {}",
        report.cache_entries,
        format_size(report.cache_bytes)
    );
}
