//! TraceTUI - Terminal Chromatogram Viewer
//!
//! A terminal-based viewer and editor for Sanger sequencing traces.
//!
//! ## Usage
//!
//! ```bash
//! tracetui <file.ab1>                       # interactive viewer
//! tracetui <file.ab1> -o out.fasta --trim   # quality-trim and export
//! tracetui <file.ab1> -o - --fastq          # FASTQ to stdout
//! tracetui <file.ab1> --tags                # dump the tag directory
//! ```
//!
//! ## Navigation (Vim-style)
//!
//! - `h/l`: previous/next base, `+`/`-`/`=`: zoom
//! - `/`: search, `r<base>`: replace, `u`: undo
//! - `:trim`: quality trim
//! - `:q`: Quit
//! - `?` or `:h`: Help

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::{Builder, Env, Target};
use log::{info, warn};

use tracetui::abif::AbifFile;
use tracetui::chromatogram::Chromatogram;
use tracetui::config::ViewerConfig;
use tracetui::controller::run_app;
use tracetui::export::{write_fasta, write_fastq, write_tag_table};
use tracetui::model::AppState;
use tracetui::trim::{find_trim_points, DEFAULT_LOWER_THRESHOLD, DEFAULT_UPPER_THRESHOLD};

/// TraceTUI - A Vim-style terminal viewer for Sanger chromatograms (.ab1)
///
/// When run without -o/--output, opens an interactive TUI viewer.
/// With -o/--output, runs in CLI mode and writes the read to a file (or stdout with "-").
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// ABIF chromatogram to display
    file: PathBuf,

    /// Output file (enables CLI mode). Use "-" for stdout.
    #[arg(short = 'o', long = "output")]
    output: Option<String>,

    /// Write FASTQ (Phred+33) instead of FASTA
    #[arg(long = "fastq", requires = "output")]
    fastq: bool,

    /// Quality-trim the read before writing it
    #[arg(short = 't', long = "trim", requires = "output")]
    trim: bool,

    /// Window average that starts the kept region
    #[arg(long = "upper", default_value_t = DEFAULT_UPPER_THRESHOLD)]
    upper: f64,

    /// Window average that ends the kept region
    #[arg(long = "lower", default_value_t = DEFAULT_LOWER_THRESHOLD)]
    lower: f64,

    /// Trace samples kept beyond the outermost peaks when trimming
    #[arg(long = "padding", default_value_t = 10)]
    padding: usize,

    /// Print the tag directory and exit
    #[arg(long = "tags", conflicts_with = "output")]
    tags: bool,

    /// Draw with plain ASCII characters only
    #[arg(long = "ascii")]
    ascii: bool,

    /// Default log filter (RUST_LOG overrides it)
    #[arg(long = "log-level", default_value = "info")]
    log_level: String,
}

/// Sets up logging. The TUI owns the terminal, so in viewer mode logs go to
/// a uniquely named file in the temp directory, whose path is returned.
fn init_logging(to_file: bool, level: &str) -> Result<Option<PathBuf>> {
    let mut builder = Builder::from_env(Env::default().default_filter_or(level));
    if !to_file {
        builder.target(Target::Stderr).init();
        return Ok(None);
    }
    let path = std::env::temp_dir().join(format!("tracetui-{:08x}.log", rand::random::<u32>()));
    let file = File::create(&path)
        .with_context(|| format!("Cannot create log file {}", path.display()))?;
    builder.target(Target::Pipe(Box::new(file))).init();
    Ok(Some(path))
}

/// Name used for the exported record: the sample name, else the file stem.
fn read_id(model: &Chromatogram, path: &Path) -> String {
    model
        .metadata()
        .sample_name()
        .filter(|s| !s.trim().is_empty())
        .map(|s| s.trim().replace(char::is_whitespace, "_"))
        .or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()))
        .unwrap_or_else(|| "read".to_string())
}

/// Runs CLI mode: decode the file, optionally trim, and write the read.
fn run_cli_mode(args: &Args, output: &str) -> Result<()> {
    let file = AbifFile::open(&args.file)
        .with_context(|| format!("Cannot decode {}", args.file.display()))?;
    let mut model = Chromatogram::from_abif(&file)?;

    if args.trim {
        match find_trim_points(model.quality_scores(), args.upper, args.lower) {
            Some(points) if points.passed => {
                model.apply_trim(points.start, points.end, args.padding)?;
            }
            _ => {
                warn!("No region reaches quality {}; writing the untrimmed read", args.upper);
                eprintln!("Warning: no region reaches quality {}; read left untrimmed", args.upper);
            }
        }
    }

    let id = read_id(&model, &args.file);
    let snapshot = model.snapshot();
    let mut out: Box<dyn Write> = if output == "-" {
        Box::new(BufWriter::new(io::stdout().lock()))
    } else {
        let file = File::create(output).with_context(|| format!("Cannot create {}", output))?;
        Box::new(BufWriter::new(file))
    };
    if args.fastq {
        write_fastq(&mut out, &id, &snapshot)?;
    } else {
        write_fasta(&mut out, &id, &snapshot)?;
    }
    out.flush()?;

    if output != "-" {
        eprintln!("Wrote {} ({} bases) to {}", id, snapshot.sequence.len(), output);
    }
    info!("Exported {} bases to {}", snapshot.sequence.len(), output);
    Ok(())
}

fn run_tags_mode(path: &Path) -> Result<()> {
    let file = AbifFile::open(path).with_context(|| format!("Cannot decode {}", path.display()))?;
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    write_tag_table(&mut handle, &file)?;
    for warning in file.warnings() {
        eprintln!("Warning: {}", warning);
    }
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if !(0.0..=100.0).contains(&args.upper) || !(0.0..=100.0).contains(&args.lower) {
        anyhow::bail!("Quality thresholds must be between 0 and 100");
    }

    let tui = args.output.is_none() && !args.tags;
    let log_path = init_logging(tui, &args.log_level)?;

    // Tag dump
    if args.tags {
        return run_tags_mode(&args.file);
    }

    // CLI mode: output to file/stdout
    if let Some(output) = &args.output {
        return run_cli_mode(&args, output);
    }

    let bytes = fs::read(&args.file)
        .with_context(|| format!("Cannot read {}", args.file.display()))?;
    let model = Chromatogram::load(bytes)
        .with_context(|| format!("Cannot decode {}", args.file.display()))?;
    let file_name = args
        .file
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let config = ViewerConfig {
        upper_threshold: args.upper,
        lower_threshold: args.lower,
        trim_padding: args.padding,
        ascii: args.ascii,
        ..ViewerConfig::default()
    };

    let result = run_app(AppState::new(model, file_name, config));
    if let Some(path) = log_path {
        eprintln!("Log written to {}", path.display());
    }
    result
}
