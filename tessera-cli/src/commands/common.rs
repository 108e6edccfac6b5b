//! Common types and utilities shared across CLI commands.

use std::path::{Path, PathBuf};

use tessera::config::{config_file_path, RenderConfig};
use tessera::geom::PixelRect;
use tessera::multires::{resolve_locator, Candidate};
use url::Url;

use crate::error::CliError;

/// Config file to read and write: the `--config` override or the default.
pub fn config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf).unwrap_or_else(config_file_path)
}

/// Load configuration, using defaults when the file does not exist.
pub fn load_config(path: Option<&Path>) -> Result<RenderConfig, CliError> {
    Ok(RenderConfig::load_from(&config_path(path))?)
}

/// Parse `x,y,width,height` into a pixel rectangle.
pub fn parse_rect(value: &str) -> Result<PixelRect, CliError> {
    let parts: Vec<i32> = value
        .split(',')
        .map(|p| p.trim().parse::<i32>())
        .collect::<Result<_, _>>()
        .map_err(|_| CliError::Usage(format!("Invalid rectangle '{}', expected x,y,w,h", value)))?;

    match parts.as_slice() {
        [x, y, w, h] => Ok(PixelRect::new(*x, *y, *w, *h)),
        _ => Err(CliError::Usage(format!(
            "Invalid rectangle '{}', expected x,y,w,h",
            value
        ))),
    }
}

/// Base URL for relative locators given on the command line.
pub fn working_dir_base() -> Result<Url, CliError> {
    let cwd = std::env::current_dir()?;
    Url::from_directory_path(&cwd)
        .map_err(|_| CliError::Usage(format!("Cannot use '{}' as a base URL", cwd.display())))
}

/// Parse `locator[@min:max]`, where either bound may be empty.
///
/// Relative locators are resolved against `base`.
pub fn parse_candidate(value: &str, base: &Url) -> Result<Candidate, CliError> {
    let (locator, range) = match value.rsplit_once('@') {
        Some((locator, range)) if range.contains(':') => (locator, Some(range)),
        _ => (value, None),
    };
    let locator = resolve_locator(base, locator)?;

    let Some(range) = range else {
        return Ok(Candidate::new(locator));
    };
    let (min, max) = range
        .split_once(':')
        .ok_or_else(|| CliError::Usage(format!("Invalid width range '{}'", range)))?;
    Ok(Candidate::with_range(
        locator,
        parse_bound(min)?,
        parse_bound(max)?,
    ))
}

fn parse_bound(value: &str) -> Result<Option<f64>, CliError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|w| w.is_finite() && *w >= 0.0)
        .map(Some)
        .ok_or_else(|| CliError::Usage(format!("Invalid width bound '{}'", value)))
}
