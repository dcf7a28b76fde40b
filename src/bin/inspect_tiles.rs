//! Print point counts, elevation ranges and coverage of elevation tiles.
//!
//! Usage: `inspect_tiles <TILE_OR_DIR>...`

use anyhow::{bail, Context};
use std::path::PathBuf;

use relief::ingest::{summarize, JsonTile, PointSource, TileSet};

fn main() -> anyhow::Result<()> {
    let paths: Vec<PathBuf> = std::env::args_os().skip(1).map(PathBuf::from).collect();
    if paths.is_empty() {
        bail!("usage: inspect_tiles <TILE_OR_DIR>...");
    }

    let mut tiles = Vec::new();
    for path in &paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = std::fs::read_dir(path)
                .with_context(|| format!("reading directory {}", path.display()))?
                .filter_map(|e| e.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            entries.sort();
            tiles.extend(entries);
        } else {
            tiles.push(path.clone());
        }
    }

    println!("Inspecting {} tiles", tiles.len());
    println!();

    for tile in &tiles {
        match JsonTile::new(tile).fetch_all() {
            Ok(samples) => match summarize(&samples) {
                Some(s) => println!(
                    "  {}: {} points, {:.1}m to {:.1}m, lat {:.4}..{:.4}, lon {:.4}..{:.4}",
                    tile.display(),
                    s.points,
                    s.min_elevation,
                    s.max_elevation,
                    s.min_lat,
                    s.max_lat,
                    s.min_lon,
                    s.max_lon
                ),
                None => println!("  {}: empty", tile.display()),
            },
            Err(e) => println!("  {}: unreadable ({})", tile.display(), e),
        }
    }

    let merged = TileSet::from_paths(&paths)?.fetch_all()?;
    println!();
    match summarize(&merged) {
        Some(s) => {
            println!("=== MERGED ===");
            println!("Total points: {}", s.points);
            println!("Elevation range: {:.1}m to {:.1}m", s.min_elevation, s.max_elevation);
            println!(
                "Coverage: {:.4}..{:.4} lat, {:.4}..{:.4} lon",
                s.min_lat, s.max_lat, s.min_lon, s.max_lon
            );
        }
        None => println!("No points found"),
    }

    Ok(())
}
