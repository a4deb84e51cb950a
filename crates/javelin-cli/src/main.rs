use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use javelin_classfile::Indexer;
use javelin_codec::{IndexReader, IndexWriter, CURRENT_VERSION};
use tracing::{debug, warn};
use zip::ZipArchive;

#[derive(Parser)]
#[command(name = "javelin", version, about = "Javelin CLI (class-file annotation indexing)")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index class files, directories, and jars into an index file
    Index(IndexArgs),
    /// Print summary statistics for an index file
    Info(InfoArgs),
}

#[derive(Args)]
struct IndexArgs {
    /// Class files, directories, or jar files to index
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
    /// Where to write the index
    #[arg(short, long, default_value = "javelin.idx")]
    output: PathBuf,
    /// Index format version to write
    #[arg(long, default_value_t = CURRENT_VERSION)]
    format_version: u8,
}

#[derive(Args)]
struct InfoArgs {
    /// Index file to inspect
    path: PathBuf,
    /// Also list the indexed class names
    #[arg(long)]
    classes: bool,
}

fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            2
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Command::Index(args) => {
            let mut indexer = Indexer::default();
            let mut stats = BatchStats::default();
            for input in &args.inputs {
                add_input(&mut indexer, input, &mut stats)?;
            }
            let index = indexer.complete();

            let file = File::create(&args.output)
                .with_context(|| format!("failed to create {}", args.output.display()))?;
            let bytes = IndexWriter::new(BufWriter::new(file))
                .write(&index, args.format_version)
                .with_context(|| format!("failed to write {}", args.output.display()))?;

            println!(
                "indexed {} classes ({} pre-generics skipped, {} failed) into {} ({} bytes)",
                stats.indexed,
                stats.skipped,
                stats.failed,
                args.output.display(),
                bytes
            );
            Ok(0)
        }
        Command::Info(args) => {
            let file = File::open(&args.path)
                .with_context(|| format!("failed to open {}", args.path.display()))?;
            let index = IndexReader::new(BufReader::new(file))
                .read()
                .with_context(|| format!("failed to read {}", args.path.display()))?;

            println!("classes: {}", index.class_count());
            println!("annotation names: {}", index.annotation_name_count());
            println!("subclass entries: {}", index.subclass_entry_count());
            println!("implementor entries: {}", index.implementor_entry_count());
            if args.classes {
                let mut names: Vec<String> =
                    index.classes().map(|c| c.name.to_string()).collect();
                names.sort();
                for name in names {
                    println!("  {name}");
                }
            }
            Ok(0)
        }
    }
}

#[derive(Default)]
struct BatchStats {
    indexed: usize,
    skipped: usize,
    failed: usize,
}

fn add_input(indexer: &mut Indexer, input: &Path, stats: &mut BatchStats) -> Result<()> {
    if input.is_dir() {
        return add_directory(indexer, input, stats);
    }
    match input.extension().and_then(OsStr::to_str) {
        Some("jar") | Some("zip") => add_jar(indexer, input, stats),
        Some("class") => {
            let data = std::fs::read(input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            add_class(indexer, &data, &input.display().to_string(), stats);
            Ok(())
        }
        _ => anyhow::bail!("unsupported input {}", input.display()),
    }
}

fn add_directory(indexer: &mut Indexer, dir: &Path, stats: &mut BatchStats) -> Result<()> {
    for entry in walkdir::WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(std::result::Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension() != Some(OsStr::new("class")) {
            continue;
        }
        let data = std::fs::read(entry.path())
            .with_context(|| format!("failed to read {}", entry.path().display()))?;
        add_class(indexer, &data, &entry.path().display().to_string(), stats);
    }
    Ok(())
}

fn add_jar(indexer: &mut Indexer, path: &Path, stats: &mut BatchStats) -> Result<()> {
    let file =
        File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut zip = ZipArchive::new(file)
        .with_context(|| format!("failed to read zip {}", path.display()))?;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .with_context(|| format!("failed to read entry {} of {}", i, path.display()))?;
        if !entry.name().ends_with(".class") {
            continue;
        }
        let mut data = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut data).with_context(|| {
            format!("failed to read {} from {}", entry.name(), path.display())
        })?;
        let origin = format!("{}!{}", path.display(), entry.name());
        add_class(indexer, &data, &origin, stats);
    }
    Ok(())
}

/// One bad class file never fails the batch.
fn add_class(indexer: &mut Indexer, data: &[u8], origin: &str, stats: &mut BatchStats) {
    match indexer.index(data) {
        Ok(Some(_)) => stats.indexed += 1,
        Ok(None) => {
            debug!(origin, "skipped pre-generics class file");
            stats.skipped += 1;
        }
        Err(err) => {
            warn!(origin, error = %err, "failed to index class file");
            stats.failed += 1;
        }
    }
}
