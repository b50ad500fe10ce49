//! hepcube CLI
//!
//! Projects data cubes and post-processes the resulting histograms.
#![allow(clippy::uninlined_format_args, clippy::too_many_lines)]

use clap::{Parser, Subcommand, ValueEnum};
use log::{info, warn};

use hepcube_algorithms::{
    fold_min_max_all, fold_min_max_values, normalize_matrix, rebin_2d, rebin_asymmetric,
    transpose, MinMax, NormalizationDirection, ProjectionRequest, RebinOptions,
};
use hepcube_core::{AxisRange, DataCube, Projection, Restrictions};
use hepcube_io::{
    read_cube_json, read_histogram1d_json, read_histogram2d_json, write_histogram_json,
    BinningConfig, DirectoryStore, HistogramSink, WriteMode,
};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    HepcubeIo(#[from] hepcube_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] hepcube_core::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Usage(String),
}

/// Matrix lines to normalize.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum Direction {
    /// Each fixed-y row
    Rows,
    /// Each fixed-x column
    Columns,
}

impl From<Direction> for NormalizationDirection {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Rows => NormalizationDirection::Rows,
            Direction::Columns => NormalizationDirection::Columns,
        }
    }
}

/// Axis restriction `AXIS=LOW-HIGH` in 0-based bin indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RestrictionArg {
    axis: usize,
    range: AxisRange,
}

fn parse_restriction(value: &str) -> std::result::Result<RestrictionArg, String> {
    let (axis, range) = value
        .split_once('=')
        .ok_or_else(|| format!("expected AXIS=LOW-HIGH, got {value:?}"))?;
    let (low, high) = range
        .split_once('-')
        .ok_or_else(|| format!("expected LOW-HIGH bin range, got {range:?}"))?;
    let parse = |text: &str| {
        text.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid bin index {text:?}: {e}"))
    };
    Ok(RestrictionArg {
        axis: parse(axis)?,
        range: AxisRange::new(parse(low)?, parse(high)?),
    })
}

/// Edge list given inline or by name from a binning file.
#[derive(clap::Args, Debug, Clone, Default)]
struct EdgeArgs {
    /// New bin edges, comma separated
    #[arg(long, value_delimiter = ',', num_args = 1..)]
    edges: Vec<f64>,

    /// Binning file with named edge lists
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name of the edge list in the binning file
    #[arg(long, requires = "config")]
    binning: Option<String>,
}

impl EdgeArgs {
    fn resolve(&self) -> Result<Option<Vec<f64>>> {
        if !self.edges.is_empty() {
            return Ok(Some(self.edges.clone()));
        }
        match (&self.config, &self.binning) {
            (Some(path), Some(name)) => {
                let config = BinningConfig::from_file(path)?;
                Ok(Some(config.binning(name)?.edges().to_vec()))
            }
            _ => Ok(None),
        }
    }
}

/// Sparse histogram cube projection and rebinning.
#[derive(Parser, Debug)]
#[command(name = "hepcube")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the axes and contents of a cube file
    Info {
        /// Input cube (JSON)
        input: PathBuf,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Project a cube onto one or two axes and store the result
    Project {
        /// Input cube (JSON)
        input: PathBuf,

        /// Axis to keep; give twice for a 2-D projection
        #[arg(short, long = "axis", required = true, num_args = 1..=2)]
        axes: Vec<usize>,

        /// Restrict an axis to a bin range, AXIS=LOW-HIGH (repeatable)
        #[arg(short, long = "restrict", value_parser = parse_restriction)]
        restrictions: Vec<RestrictionArg>,

        /// Divide by bin width (1-D) or bin area (2-D)
        #[arg(long)]
        normalize: bool,

        /// Rebin a 1-D projection onto these edges
        #[command(flatten)]
        rebin: EdgeArgs,

        /// Output store: a directory, or an .h5 file with the hdf5 feature
        #[arg(short, long)]
        output: PathBuf,

        /// Folder inside the store
        #[arg(long, default_value = "projections")]
        folder: String,

        /// Keep existing store content instead of recreating it
        #[arg(long)]
        update: bool,
    },

    /// Rebin a 1-D or 2-D histogram
    Rebin {
        /// Input histogram (JSON)
        input: PathBuf,

        /// Output histogram (JSON)
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        x: EdgeArgs,

        /// New y edges; makes the input a 2-D histogram
        #[arg(long, value_delimiter = ',', num_args = 1..)]
        y_edges: Vec<f64>,

        /// Treat 2-D content as a density (undo and redo bin area)
        #[arg(long)]
        density: bool,
    },

    /// Normalize rows or columns of a 2-D histogram
    Normalize {
        /// Input histogram (JSON)
        input: PathBuf,

        /// Output histogram (JSON)
        #[arg(short, long)]
        output: PathBuf,

        /// Lines to normalize
        #[arg(short, long, value_enum, default_value = "rows")]
        direction: Direction,

        /// Target sum of every line
        #[arg(short, long, default_value = "1.0")]
        target: f64,
    },

    /// Swap the axes of a 2-D histogram
    Transpose {
        /// Input histogram (JSON)
        input: PathBuf,

        /// Output histogram (JSON)
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Common drawing range of several 1-D histograms
    MinMax {
        /// Input histograms (JSON)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Lower end of the x range to scan
        #[arg(long, requires = "high")]
        low: Option<f64>,

        /// Upper end of the x range to scan
        #[arg(long, requires = "low")]
        high: Option<f64>,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn restrictions_from(args: &[RestrictionArg]) -> Restrictions {
    args.iter().fold(Restrictions::none(), |restrictions, arg| {
        restrictions.with_range(arg.axis, arg.range)
    })
}

fn open_store(output: &Path, update: bool) -> Result<Box<dyn HistogramSink>> {
    let mode = if update {
        WriteMode::Update
    } else {
        WriteMode::Recreate
    };
    let is_hdf5 = output
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| matches!(ext.to_lowercase().as_str(), "h5" | "hdf5"));

    if is_hdf5 {
        #[cfg(feature = "hdf5")]
        {
            return Ok(Box::new(hepcube_io::Hdf5HistogramStore::open(output, mode)?));
        }
        #[cfg(not(feature = "hdf5"))]
        {
            return Err(CliError::Usage(format!(
                "{} looks like an HDF5 file but hepcube was built without the hdf5 feature",
                output.display()
            )));
        }
    }
    Ok(Box::new(DirectoryStore::open(output, mode)?))
}

fn print_info(cube: &DataCube, as_json: bool) -> Result<()> {
    if as_json {
        let axes: Vec<_> = cube
            .axes()
            .iter()
            .map(|axis| {
                serde_json::json!({
                    "bins": axis.n_bins(),
                    "min": axis.min(),
                    "max": axis.max(),
                    "uniform": axis.is_uniform(),
                })
            })
            .collect();
        let summary = serde_json::json!({
            "name": cube.name(),
            "axes": axes,
            "filled_cells": cube.filled_cells(),
            "total_bins": cube.total_bins(),
            "integral": cube.integral(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Cube: {}", cube.name());
    for (index, axis) in cube.axes().iter().enumerate() {
        println!(
            "  axis {}: {} bins in [{}, {}){}",
            index,
            axis.n_bins(),
            axis.min(),
            axis.max(),
            if axis.is_uniform() { ", uniform" } else { "" }
        );
    }
    println!(
        "Filled cells: {} of {}",
        cube.filled_cells(),
        cube.total_bins()
    );
    println!("Integral: {}", cube.integral());
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Info { input, json } => {
            let cube = read_cube_json(&input)?;
            print_info(&cube, json)?;
        }

        Commands::Project {
            input,
            axes,
            restrictions,
            normalize,
            rebin,
            output,
            folder,
            update,
        } => {
            let cube = read_cube_json(&input)?;
            let request = ProjectionRequest {
                keep_axes: axes,
                restrictions: restrictions_from(&restrictions),
                normalize_to_bin_width: normalize,
            };
            let projection = request.run(&cube).ok_or_else(|| {
                CliError::Usage(format!(
                    "cannot project {} onto axes {:?} with restrictions {:?}",
                    cube.name(),
                    request.keep_axes,
                    request.signature()
                ))
            })?;

            let projection = match (rebin.resolve()?, projection) {
                (Some(edges), Projection::OneD(hist)) => {
                    Projection::OneD(rebin_asymmetric(&hist, &edges))
                }
                (Some(_), Projection::TwoD(hist)) => {
                    warn!("ignoring rebin edges for 2-D projection {}", hist.name());
                    Projection::TwoD(hist)
                }
                (None, projection) => projection,
            };

            let mut store = open_store(&output, update)?;
            store.put_projection(&folder, &projection)?;
            info!(
                "wrote {} to {} ({})",
                projection.name(),
                output.display(),
                folder
            );
        }

        Commands::Rebin {
            input,
            output,
            x,
            y_edges,
            density,
        } => {
            let x_edges = x
                .resolve()?
                .ok_or_else(|| CliError::Usage("no rebin edges given".to_string()))?;
            if y_edges.is_empty() {
                let hist = read_histogram1d_json(&input)?;
                write_histogram_json(&output, &rebin_asymmetric(&hist, &x_edges))?;
            } else {
                let hist = read_histogram2d_json(&input)?;
                let options = if density {
                    RebinOptions::density()
                } else {
                    RebinOptions::default()
                };
                write_histogram_json(&output, &rebin_2d(&hist, &x_edges, &y_edges, options))?;
            }
        }

        Commands::Normalize {
            input,
            output,
            direction,
            target,
        } => {
            let mut hist = read_histogram2d_json(&input)?;
            normalize_matrix(&mut hist, target, direction.into());
            write_histogram_json(&output, &hist)?;
        }

        Commands::Transpose { input, output } => {
            let hist = read_histogram2d_json(&input)?;
            write_histogram_json(&output, &transpose(&hist))?;
        }

        Commands::MinMax { inputs, low, high } => {
            let mut range = MinMax::EMPTY;
            for path in &inputs {
                let hist = read_histogram1d_json(path)?;
                range = match (low, high) {
                    (Some(low), Some(high)) => fold_min_max_values(&hist, low, high, range),
                    _ => fold_min_max_all(&hist, range),
                };
            }
            if range.is_empty() {
                return Err(CliError::Usage("no bins in the requested range".to_string()));
            }
            println!("min: {}", range.min);
            println!("max: {}", range.max);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_restriction() {
        assert_eq!(
            parse_restriction("2=1-3").unwrap(),
            RestrictionArg {
                axis: 2,
                range: AxisRange::new(1, 3),
            }
        );
        assert!(parse_restriction("2:1-3").is_err());
        assert!(parse_restriction("2=1").is_err());
        assert!(parse_restriction("x=1-3").is_err());
    }

    #[test]
    fn test_project_arguments() {
        let cli = Cli::try_parse_from([
            "hepcube", "project", "cube.json", "-a", "1", "-a", "0", "-r", "2=1-1", "-r",
            "3=0-4", "--normalize", "-o", "out",
        ])
        .unwrap();
        let Commands::Project {
            axes,
            restrictions,
            normalize,
            ..
        } = cli.command
        else {
            panic!("expected project command");
        };
        assert_eq!(axes, vec![1, 0]);
        assert!(normalize);
        assert_eq!(restrictions_from(&restrictions).signature(), "_2=1-1_3=0-4");
    }

    #[test]
    fn test_rebin_edges_are_comma_separated() {
        let cli = Cli::try_parse_from([
            "hepcube", "rebin", "h.json", "-o", "r.json", "--edges", "0,2,4",
        ])
        .unwrap();
        let Commands::Rebin { x, y_edges, .. } = cli.command else {
            panic!("expected rebin command");
        };
        assert_eq!(x.resolve().unwrap(), Some(vec![0.0, 2.0, 4.0]));
        assert!(y_edges.is_empty());
    }

    #[test]
    fn test_min_max_range_needs_both_ends() {
        assert!(Cli::try_parse_from(["hepcube", "min-max", "a.json", "--low", "1"]).is_err());
    }
}
