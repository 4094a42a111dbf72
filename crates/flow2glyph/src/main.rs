mod manifest;
mod obj;

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    time::Instant,
};

use flowglyph::{
    build_batches, prototype, read_table_file, GlyphBatches, GlyphParams, GlyphPart, Mesh,
    ParseOptions, Prototypes, DENSITY_SCALE,
};

use manifest::{BatchEntry, Manifest, DEFAULT_ALPHA};

/// `flow2glyph` - turn a flow-field measurement table into temperature-banded
/// arrow meshes.
///
/// Each accepted row becomes one arrow (shaft + head) placed at its
/// measurement location and oriented along its velocity. Arrows of the same
/// temperature band are merged, so at most 14 OBJ files are written, together
/// with a `manifest.json` describing materials and placement.
#[derive(Parser, Debug, Clone)]
#[command(name = "flow2glyph", version, about, long_about = None)]
struct Args {
    /// Comma-separated flow table; the first non-blank line is a header.
    #[arg(long, env = "FLOW_TABLE_PATH")]
    input: PathBuf,

    #[arg(long, default_value = "glyphs")]
    output_dir: PathBuf,

    /// OBJ mesh for the arrow shaft, pointing down +Z. A unit cylinder is
    /// generated when omitted.
    #[arg(long, env = "FLOW_SHAFT_OBJ")]
    shaft: Option<PathBuf>,

    /// OBJ mesh for the arrow head, pointing down +Z. A unit cone is
    /// generated when omitted.
    #[arg(long, env = "FLOW_HEAD_OBJ")]
    head: Option<PathBuf>,

    /// Segments around generated prototypes.
    #[arg(long, default_value_t = 16)]
    segments: u32,

    #[arg(long, default_value_t = 1.0)]
    length_multiplier: f32,

    #[arg(long, default_value_t = 0.1)]
    thickness_multiplier: f32,

    #[arg(long, default_value_t = 1.0)]
    head_scale: f32,

    /// Batch size hint; reserved for chunked building, currently unused.
    #[arg(long, default_value_t = 500)]
    batch_size: usize,

    /// Keep every Nth data row (1 keeps all). Use it to thin dense tables.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    stride: u32,

    /// Material transparency written to the manifest (1.0 = opaque).
    #[arg(long, default_value_t = DEFAULT_ALPHA)]
    alpha: f32,

    /// Replace a previous build in the output directory.
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl Args {
    fn glyph_params(&self) -> GlyphParams {
        GlyphParams {
            length_multiplier: self.length_multiplier,
            thickness_multiplier: self.thickness_multiplier,
            head_scale: self.head_scale,
            density_scale: DENSITY_SCALE,
            batch_size_hint: self.batch_size,
        }
    }
}

fn load_prototype(path: Option<&Path>, part: GlyphPart, segments: u32) -> Result<Mesh> {
    match path {
        Some(path) => {
            debug!("Loading {} prototype from {}", part, path.display());
            let file = File::open(path)
                .with_context(|| format!("Cannot open {} prototype {}", part, path.display()))?;
            obj::read_obj(file)
                .with_context(|| format!("Cannot parse {} prototype {}", part, path.display()))
        }
        None => {
            debug!("Generating {} prototype ({} segments)", part, segments);
            Ok(match part {
                GlyphPart::Shaft => prototype::cylinder(segments),
                GlyphPart::Head => prototype::cone(segments),
            })
        }
    }
}

/// Remove batch OBJ files left by an earlier build, returning how many went.
fn clear_previous_batches(output_dir: &Path) -> Result<usize> {
    let mut removed = 0;

    for entry in fs::read_dir(output_dir)
        .with_context(|| format!("Cannot list {}", output_dir.display()))?
    {
        let path = entry?.path();
        let is_batch = path.extension().is_some_and(|ext| ext == "obj")
            && path.file_name().and_then(|n| n.to_str()).is_some_and(|n| {
                n.starts_with("ArrowShaftBatch_") || n.starts_with("ArrowHeadBatch_")
            });

        if is_batch && path.is_file() {
            fs::remove_file(&path)
                .with_context(|| format!("Cannot remove {}", path.display()))?;
            removed += 1;
        }
    }

    Ok(removed)
}

/// Write every batch as `<object name>.obj` and collect manifest entries.
fn export_batches(batches: &GlyphBatches, output_dir: &Path) -> Result<Vec<BatchEntry>> {
    let mut entries = Vec::with_capacity(batches.len());

    for (key, combined) in batches.iter() {
        let name = key.object_name();
        let file_name = format!("{name}.obj");
        let out_path = output_dir.join(&file_name);

        let mut writer = BufWriter::new(
            File::create(&out_path)
                .with_context(|| format!("Cannot create {}", out_path.display()))?,
        );
        obj::write_obj(&mut writer, &name, &combined.mesh)?;
        debug!("Wrote {}", out_path.display());

        entries.push(BatchEntry::new(key, combined, file_name));
    }

    Ok(entries)
}

fn run(args: &Args) -> Result<()> {
    let started = Instant::now();
    let params = args.glyph_params();

    // ---------------------------------------------------------------------
    // Prototypes first: a bad mesh should fail before the table is read.
    // ---------------------------------------------------------------------
    let prototypes = Prototypes::new(
        load_prototype(args.shaft.as_deref(), GlyphPart::Shaft, args.segments)?,
        load_prototype(args.head.as_deref(), GlyphPart::Head, args.segments)?,
    )?;

    // ---------------------------------------------------------------------
    // Parse the table
    // ---------------------------------------------------------------------
    info!("Reading {}", args.input.display());
    let options = ParseOptions {
        stride: args.stride as usize,
    };
    let table = read_table_file(&args.input, &options)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;

    // ---------------------------------------------------------------------
    // Build and export
    // ---------------------------------------------------------------------
    let batches = build_batches(&table.samples, &prototypes, &params);
    if batches.is_empty() {
        warn!(
            "{}: no usable samples ({} data rows, {} dropped)",
            args.input.display(),
            table.summary.data_rows,
            table.summary.dropped()
        );
    }

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("Cannot create {}", args.output_dir.display()))?;

    let manifest_path = args.output_dir.join("manifest.json");
    if manifest_path.exists() && !args.overwrite {
        bail!(
            "{} already holds a build (pass --overwrite to replace it)",
            args.output_dir.display()
        );
    }

    let removed = clear_previous_batches(&args.output_dir)?;
    if removed > 0 {
        debug!("Removed {} batch files from a previous build", removed);
    }

    let mut manifest = Manifest::new(
        args.input.display().to_string(),
        table.summary,
        params,
        args.alpha,
    );
    manifest.batches = export_batches(&batches, &args.output_dir)?;

    let writer = BufWriter::new(
        File::create(&manifest_path)
            .with_context(|| format!("Cannot create {}", manifest_path.display()))?,
    );
    serde_json::to_writer_pretty(writer, &manifest)?;

    info!(
        "OK {} -> {} ({} samples, {} batches, {} verts) in {:.2?}",
        args.input.display(),
        args.output_dir.display(),
        table.samples.len(),
        batches.len(),
        batches.total_vertices(),
        started.elapsed()
    );

    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging; default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    run(&args)
}
