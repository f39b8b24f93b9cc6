use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use vvsearch::engine::{SearchEngine, Snapshot};
use vvsearch::error::TransportError;
use vvsearch::index::{load_corpus_with_progress, SearchPage};
use vvsearch::output::{print_json, print_page, SearchResponse};
use vvsearch::sprite::{
    pack_frames, FileRangeFetcher, FrameFetcher, FrameKey, FrameOutcome, FrameRange, RangeFetcher,
};
use vvsearch::utils::{get_config_path, AppConfig};

#[derive(Parser)]
#[command(name = "vvsearch")]
#[command(about = "Approximate subtitle search with sprite frame retrieval")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the app data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the subtitle corpus
    Search {
        /// Query terms (all must match)
        #[arg(required = true, trailing_var_arg = true)]
        query: Vec<String>,

        /// Corpus directory or record file
        #[arg(short, long)]
        corpus: Option<PathBuf>,

        /// Minimum match ratio (0-100)
        #[arg(long)]
        min_ratio: Option<f64>,

        /// Minimum record similarity (0-1)
        #[arg(long)]
        min_similarity: Option<f64>,

        /// Keep only the best N results
        #[arg(long)]
        max_results: Option<usize>,

        /// Page number (1-based)
        #[arg(short, long, default_value_t = 1)]
        page: usize,

        /// Hits per page
        #[arg(long)]
        page_size: Option<usize>,

        /// Print JSON instead of colored text
        #[arg(long)]
        json: bool,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,

        /// Fetch the frame of every hit on the page into this directory
        #[arg(long)]
        frames_out: Option<PathBuf>,

        /// Sprite directory or base URL
        #[arg(long)]
        source: Option<String>,
    },
    /// Fetch a single frame
    Frame {
        /// Episode folder id
        folder: u32,

        /// Frame number (seconds)
        frame: u32,

        /// Output file (defaults to frame_<folder>_<frame>.webp)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Sprite directory or base URL
        #[arg(long)]
        source: Option<String>,
    },
    /// Pack frame folders into sprite blobs and indexes
    Pack {
        /// Directory of numeric episode folders
        frames_dir: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,

        #[arg(long)]
        grid_width: Option<u32>,

        #[arg(long)]
        grid_height: Option<u32>,

        /// Folders per group
        #[arg(long)]
        group_size: Option<u32>,

        /// Hide progress bars
        #[arg(short, long)]
        quiet: bool,
    },
    /// Show the header and frame table of a sprite index
    Inspect {
        /// Index file
        path: PathBuf,
    },
    /// Show corpus and character index statistics
    Stats {
        /// Corpus directory or record file
        #[arg(short, long)]
        corpus: Option<PathBuf>,
    },
    /// Show the effective configuration
    Config {
        /// Write the defaults to the config file
        #[arg(long)]
        init: bool,
    },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    match cli.command {
        Commands::Search {
            query,
            corpus,
            min_ratio,
            min_similarity,
            max_results,
            page,
            page_size,
            json,
            no_color,
            frames_out,
            source,
        } => {
            let query = query.join(" ");
            let mut options = config.search_options();
            options.page = page;
            options.max_results = max_results;
            if let Some(r) = min_ratio {
                options.min_ratio = r;
            }
            if let Some(s) = min_similarity {
                options.min_similarity = s;
            }
            if let Some(size) = page_size {
                options.page_size = size;
            }

            let corpus = corpus_path(corpus, &config)?;
            let engine = SearchEngine::with_corpus(load_corpus_with_progress(&corpus, json)?);

            let result = match engine.search(&query, &options) {
                Ok(result) => result,
                Err(e) if json => {
                    print_json(&SearchResponse::error(e.to_string()))?;
                    std::process::exit(1);
                }
                Err(e) => return Err(e.into()),
            };

            if json {
                print_json(&SearchResponse::from_page(&query, &result, &options))?;
            } else {
                print_page(&query, &result, &options, !no_color)?;
            }

            if let Some(dir) = frames_out {
                let source = sprite_source(source, &config)?;
                save_hit_frames(&result, &dir, &source, &config)?;
            }
        }
        Commands::Frame {
            folder,
            frame,
            out,
            source,
        } => {
            let source = sprite_source(source, &config)?;
            let fetcher = frame_fetcher(&source, &config)?;
            let key = FrameKey::new(folder, frame);

            let runtime = tokio::runtime::Runtime::new()?;
            match runtime.block_on(fetcher.fetch_frame(key))? {
                Some(bytes) => {
                    let out = out.unwrap_or_else(|| PathBuf::from(frame_file_name(key)));
                    fs::write(&out, &bytes).with_context(|| format!("Failed to write {}", out.display()))?;
                    println!("Wrote {} ({} bytes)", out.display(), bytes.len());
                }
                None => bail!("frame {} not found", key),
            }
        }
        Commands::Pack {
            frames_dir,
            out,
            grid_width,
            grid_height,
            group_size,
            quiet,
        } => {
            let mut options = config.pack_options();
            if let Some(w) = grid_width {
                options.grid_width = w;
            }
            if let Some(h) = grid_height {
                options.grid_height = h;
            }
            if let Some(g) = group_size {
                options.group_size = g;
            }

            let summary = pack_frames(&frames_dir, &out, &options, quiet)?;
            println!(
                "Packed {} frames from {} folders into {} groups ({})",
                summary.frames,
                summary.folders,
                summary.groups,
                vvsearch::index::stats::format_size(summary.bytes)
            );
        }
        Commands::Inspect { path } => {
            vvsearch::index::stats::inspect_sprite_index(&path)?;
        }
        Commands::Stats { corpus } => {
            let corpus = corpus_path(corpus, &config)?;
            let snapshot = Snapshot::build(load_corpus_with_progress(&corpus, false)?);
            vvsearch::index::stats::show_stats(&corpus, &snapshot);
        }
        Commands::Config { init } => {
            let path = match cli.config {
                Some(path) => path,
                None => get_config_path()?,
            };
            if init {
                config.save_to(&path)?;
                println!("Wrote {}", path.display());
            }
            println!("Config file: {}", path.display());
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}

fn corpus_path(flag: Option<PathBuf>, config: &AppConfig) -> Result<PathBuf> {
    flag.or_else(|| config.corpus_path.clone())
        .context("No corpus given: pass --corpus or set corpus_path in the config file")
}

fn sprite_source(flag: Option<String>, config: &AppConfig) -> Result<String> {
    flag.or_else(|| config.sprite_source.clone())
        .context("No sprite source given: pass --source or set sprite_source in the config file")
}

fn frame_file_name(key: FrameKey) -> String {
    format!("frame_{}_{}.webp", key.folder_id, key.frame_num)
}

/// Transport chosen from the sprite source string
enum Transport {
    File(FileRangeFetcher),
    #[cfg(feature = "http")]
    Http(vvsearch::sprite::HttpRangeFetcher),
}

impl RangeFetcher for Transport {
    async fn fetch_range(&self, resource: &str, range: FrameRange) -> Result<Vec<u8>, TransportError> {
        match self {
            Transport::File(f) => f.fetch_range(resource, range).await,
            #[cfg(feature = "http")]
            Transport::Http(h) => h.fetch_range(resource, range).await,
        }
    }
}

fn frame_fetcher(source: &str, config: &AppConfig) -> Result<FrameFetcher<Transport>> {
    let is_url = source.starts_with("http://") || source.starts_with("https://");

    let transport = if is_url {
        #[cfg(feature = "http")]
        {
            Transport::Http(vvsearch::sprite::HttpRangeFetcher::new(source))
        }
        #[cfg(not(feature = "http"))]
        {
            bail!("HTTP sprite sources need the `http` feature")
        }
    } else {
        let dir = Path::new(source);
        if !dir.is_dir() {
            bail!("Sprite directory not found: {}", dir.display());
        }
        Transport::File(FileRangeFetcher::new(dir))
    };

    Ok(FrameFetcher::new(transport, config.resource_layout()).with_frame_cache(config.frame_cache_size))
}

/// Fetch the frame behind every hit on a page and write them to `dir`
fn save_hit_frames(page: &SearchPage, dir: &Path, source: &str, config: &AppConfig) -> Result<()> {
    let keys: BTreeSet<FrameKey> = page.hits.iter().filter_map(FrameKey::from_hit).collect();
    let skipped = page.hits.len() - page.hits.iter().filter(|h| FrameKey::from_hit(h).is_some()).count();
    if skipped > 0 {
        log::warn!("{} hits have no episode number or timestamp", skipped);
    }
    if keys.is_empty() {
        return Ok(());
    }

    fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let fetcher = frame_fetcher(source, config)?;
    let runtime = tokio::runtime::Runtime::new()?;
    let results = runtime.block_on(fetcher.fetch_frames(keys, config.fetch_concurrency));

    let (mut saved, mut missing, mut failed) = (0, 0, 0);
    for (key, outcome) in results {
        match outcome {
            FrameOutcome::Found(bytes) => {
                let path = dir.join(frame_file_name(key));
                fs::write(&path, bytes).with_context(|| format!("Failed to write {}", path.display()))?;
                saved += 1;
            }
            FrameOutcome::NotFound => missing += 1,
            FrameOutcome::Failed(_) => failed += 1,
        }
    }

    eprintln!(
        "Frames: {} saved, {} not found, {} failed -> {}",
        saved,
        missing,
        failed,
        dir.display()
    );
    Ok(())
}
