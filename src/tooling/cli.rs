//! CLI Tooling
//!
//! Command-line interface for packing, inspecting, verifying and reading archives.
//! Every command returns its report as a string; the binary prints it.

use crate::archive::{write_archive, ArchiveReader, LoadedArchive};
use crate::config::{BackendKind, ConfigLoader, PackConfig};
use crate::error::PackError;
use crate::export::{pack_graphs, ExportOptions, GraphOutput};
use crate::logging::LoggingConfig;
use crate::manifest::ManifestExtractor;
use crate::store::MemoryBlockstore;
use crate::tree::reader::{read_file, resolve_path};
use clap::{Parser, Subcommand};
use comfy_table::Table;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// dagcar - content-addressed archives of file trees
#[derive(Parser)]
#[command(name = "dagcar")]
#[command(about = "Pack file trees into verifiable content-addressed archives")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path (layered over the user config file)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long, global = true)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr, both)
    #[arg(long, global = true)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// Apply the logging flags over a configured logging section.
    pub fn logging_overrides(&self, base: &LoggingConfig) -> LoggingConfig {
        let mut logging = base.clone();
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }
        if let Some(format) = &self.log_format {
            logging.format = format.clone();
        }
        if let Some(output) = &self.log_output {
            logging.output = output.clone();
        }
        if let Some(file) = &self.log_file {
            logging.file = Some(file.clone());
        }
        logging
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pack every file under SOURCE into one or more archives
    Pack {
        /// Directory to pack
        source: PathBuf,
        /// Directory the archives and manifest index are written to
        #[arg(long)]
        out_dir: PathBuf,
        /// Maximum content bytes per archive; larger sources are split
        #[arg(long)]
        slice_size: Option<u64>,
        /// Copy each file here before ingesting it
        #[arg(long)]
        scratch: Option<PathBuf>,
        /// Reference leaf bytes in the source files instead of copying them
        #[arg(long)]
        no_copy: bool,
        /// Block store backend (memory, disk)
        #[arg(long, value_parser = ["memory", "disk"])]
        store: Option<String>,
        /// Chunk size in bytes
        #[arg(long)]
        chunk_size: Option<usize>,
        /// Maximum links per file node
        #[arg(long)]
        max_links: Option<usize>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Print the manifest of an archive
    Manifest {
        archive: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Check every block digest and that the whole tree is present
    Verify {
        archive: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Write the content of one file in an archive
    Cat {
        archive: PathBuf,
        /// Slash-separated path inside the archive
        path: String,
        /// Write here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

/// CLI context holding the resolved configuration.
pub struct CliContext {
    config: PackConfig,
}

impl CliContext {
    /// Load configuration from `config_path` (if given) over the standard sources.
    pub fn new(config_path: Option<PathBuf>) -> Result<Self, PackError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load()?,
        };
        Ok(Self { config })
    }

    pub fn with_config(config: PackConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PackConfig {
        &self.config
    }

    /// Execute a CLI command
    pub fn execute(&self, command: &Commands) -> Result<String, PackError> {
        match command {
            Commands::Pack {
                source,
                out_dir,
                slice_size,
                scratch,
                no_copy,
                store,
                chunk_size,
                max_links,
                format,
            } => {
                let mut config = self.config.clone();
                if let Some(size) = chunk_size {
                    config.chunking.chunk_size = *size;
                }
                if let Some(links) = max_links {
                    config.chunking.max_links = *links;
                }
                match store.as_deref() {
                    Some("disk") => config.store.backend = BackendKind::Disk,
                    Some("memory") => {
                        config.store.backend = BackendKind::Memory;
                        config.store.path = None;
                    }
                    _ => {}
                }
                config.store.no_copy |= *no_copy;
                config.validate()?;

                let mut options = ExportOptions::new(source);
                options.scratch_dir = scratch.clone();
                options.params = config.params();
                options.backend = config.backend();
                options.no_copy = config.store.no_copy;

                let outputs = pack_graphs(out_dir, *slice_size, &options)?;
                info!(graphs = outputs.len(), out_dir = %out_dir.display(), "Pack complete");
                format_pack_report(&outputs, format)
            }
            Commands::Manifest { archive, format } => {
                let (store, loaded) = load_archive(archive)?;
                let manifest = ManifestExtractor::new(&store).build(&loaded.root()?)?;
                if format == "json" {
                    to_json(&manifest)
                } else {
                    Ok(manifest.render_text())
                }
            }
            Commands::Verify { archive, format } => {
                let (store, loaded) = load_archive(archive)?;
                let root = loaded.root()?;
                // Re-walking the tree fails on the first block the archive is missing.
                let walked = write_archive(&store, &root, std::io::sink())?;
                format_verify_report(&loaded, walked.blocks, format)
            }
            Commands::Cat {
                archive,
                path,
                output,
            } => {
                let (store, loaded) = load_archive(archive)?;
                let cid = resolve_path(&store, &loaded.root()?, path)?;
                match output {
                    Some(target) => {
                        let mut out = BufWriter::new(File::create(target)?);
                        let written = read_file(&store, &cid, &mut out)?;
                        out.flush()?;
                        Ok(format!("Wrote {} bytes to {}", written, target.display()))
                    }
                    None => {
                        let stdout = std::io::stdout();
                        let mut out = stdout.lock();
                        read_file(&store, &cid, &mut out)?;
                        out.flush()?;
                        Ok(String::new())
                    }
                }
            }
        }
    }
}

fn load_archive(path: &Path) -> Result<(MemoryBlockstore, LoadedArchive), PackError> {
    let file = File::open(path).map_err(|e| PackError::SourceUnavailable {
        path: path.to_path_buf(),
        source: e,
    })?;
    let store = MemoryBlockstore::new();
    let loaded = ArchiveReader::new(BufReader::new(file))?.load_into(&store)?;
    Ok((store, loaded))
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, PackError> {
    serde_json::to_string_pretty(value).map_err(|e| PackError::Io(e.into()))
}

fn format_pack_report(outputs: &[GraphOutput], format: &str) -> Result<String, PackError> {
    if format == "json" {
        let rows: Vec<serde_json::Value> = outputs
            .iter()
            .map(|o| {
                serde_json::json!({
                    "index": o.index,
                    "root": o.root.to_string(),
                    "archive": o.archive,
                    "files": o.files,
                    "bytes": o.bytes,
                })
            })
            .collect();
        return to_json(&rows);
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Graph", "Root", "Files", "Bytes", "Archive"]);
    for o in outputs {
        table.add_row(vec![
            o.index.to_string(),
            o.root.to_string(),
            o.files.to_string(),
            o.bytes.to_string(),
            o.archive.display().to_string(),
        ]);
    }
    Ok(table.to_string())
}

fn format_verify_report(
    loaded: &LoadedArchive,
    reachable: u64,
    format: &str,
) -> Result<String, PackError> {
    let root = loaded
        .roots
        .first()
        .map(|r| r.to_string())
        .unwrap_or_default();
    if format == "json" {
        return to_json(&serde_json::json!({
            "root": root,
            "blocks": loaded.blocks,
            "reachable": reachable,
            "block_bytes": loaded.block_bytes,
            "ok": true,
        }));
    }
    let mut table = Table::new();
    table.load_preset(comfy_table::presets::UTF8_FULL);
    table.set_header(vec!["Root", "Blocks", "Reachable", "Block Bytes", "Status"]);
    table.add_row(vec![
        root,
        loaded.blocks.to_string(),
        reachable.to_string(),
        loaded.block_bytes.to_string(),
        "OK".to_string(),
    ]);
    Ok(table.to_string())
}
