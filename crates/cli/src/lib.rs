use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use semalign_aligner::{stitch_all, AlignerError};
use semalign_embedder::{
    create_embedder, Embedder, EmbeddingError, EmbeddingMode, EmbedLimits, OllamaConfig,
    DEFAULT_CACHE_CAPACITY,
};
use semalign_pipeline::{align_sequences, AlignOptions, PipelineError};
use semalign_protocol::fixture::parse_pairs_text;
use semalign_protocol::{
    serialize_json, serialize_json_pretty, AlignmentInput, AlignmentMode, AlignmentReport,
    ErrorEnvelope, StitchRequest,
};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

mod profile;
mod report;

pub use profile::AlignProfile;

/// Gap penalty used by `semalign align` when neither a flag nor a profile sets one
pub const CLI_DEFAULT_GAP_PENALTY: f64 = 0.8;

const VECTOR_PREVIEW: usize = 8;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "semalign")]
#[command(about = "Align two token sequences by semantic similarity", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for results)
    #[arg(long, global = true)]
    quiet: bool,

    /// Override embedding backend (defaults to SEMALIGN_EMBED_MODE, then ollama)
    #[arg(long, global = true, value_enum)]
    embed_mode: Option<EmbedMode>,

    /// Override embedding model id (SEMALIGN_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Override Ollama endpoint (SEMALIGN_OLLAMA_URL)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Alignment profile (JSON or TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Align two token sequences
    Align(AlignArgs),

    /// Stitch pre-computed chunk alignments into one
    Stitch(StitchArgs),

    /// Print embedding vectors for tokens
    Embed(EmbedArgs),
}

#[derive(Args)]
struct AlignArgs {
    /// Input file, or `-` for stdin
    #[arg(long, short)]
    input: PathBuf,

    /// Input format
    #[arg(long, value_enum, default_value_t = InputFormat::Json)]
    format: InputFormat,

    /// Align in windows of this many indices
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Indices shared by consecutive windows
    #[arg(long)]
    overlap_size: Option<usize>,

    /// Cost of leaving one token unpaired
    #[arg(long)]
    gap_penalty: Option<f64>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct StitchArgs {
    /// Stitch request file, or `-` for stdin
    #[arg(long, short)]
    input: PathBuf,

    /// Overrides the request's overlap_size
    #[arg(long)]
    overlap_size: Option<usize>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct EmbedArgs {
    /// Tokens to embed
    #[arg(required = true)]
    tokens: Vec<String>,

    /// Output JSON format
    #[arg(long)]
    json: bool,
}

#[derive(Copy, Clone, ValueEnum)]
enum EmbedMode {
    Ollama,
    Stub,
}

impl EmbedMode {
    const fn as_domain(self) -> EmbeddingMode {
        match self {
            EmbedMode::Ollama => EmbeddingMode::Ollama,
            EmbedMode::Stub => EmbeddingMode::Stub,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    /// `{"left": [...], "right": [...]}` or `[[left, right], ...]`
    Json,
    /// One `left , right` line per row
    Pairs,
}

/// Embedding backend after flags, profile and environment are applied
struct Backend {
    mode: EmbeddingMode,
    ollama: OllamaConfig,
}

impl Backend {
    fn resolve(cli: &Cli, profile: &AlignProfile) -> Result<Self> {
        let mode = match cli.embed_mode {
            Some(mode) => mode.as_domain(),
            None => EmbeddingMode::from_env()?,
        };

        let mut ollama = OllamaConfig::from_env();
        if let Some(model) = cli.model.clone().or_else(|| profile.model.clone()) {
            ollama.model = model;
        }
        if let Some(endpoint) = cli.endpoint.clone().or_else(|| profile.endpoint.clone()) {
            ollama.endpoint = endpoint;
        }
        if let Some(max_retries) = profile.max_retries {
            ollama.max_retries = max_retries;
        }

        Ok(Self { mode, ollama })
    }

    fn build(self) -> Result<Arc<dyn Embedder>> {
        Ok(create_embedder(self.mode, self.ollama, DEFAULT_CACHE_CAPACITY)?)
    }
}

/// Flags override the profile; the profile overrides environment defaults
fn resolve_align_options(args: &AlignArgs, profile: &AlignProfile) -> AlignOptions {
    let limits = EmbedLimits::from_env();
    AlignOptions {
        gap_penalty: args
            .gap_penalty
            .or(profile.gap_penalty)
            .unwrap_or(CLI_DEFAULT_GAP_PENALTY),
        chunk_size: args.chunk_size.or(profile.chunk_size),
        overlap_size: args.overlap_size.or(profile.overlap_size),
        embed_concurrency: profile.embed_concurrency.unwrap_or(limits.concurrency),
        embed_batch_size: profile.embed_batch_size.unwrap_or(limits.batch_size),
        embed_timeout: profile.embed_timeout_ms.map(Duration::from_millis),
    }
}

fn read_input(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read stdin")?;
        return Ok(raw);
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Stable code for the error envelope, taken from the first typed cause
fn error_code(err: &anyhow::Error) -> &'static str {
    for cause in err.chain() {
        if let Some(err) = cause.downcast_ref::<PipelineError>() {
            return err.code();
        }
        if let Some(err) = cause.downcast_ref::<AlignerError>() {
            return match err {
                AlignerError::InvalidInput(_) => "invalid_input",
                AlignerError::Invariant(_) => "alignment_invariant",
            };
        }
        if cause.is::<EmbeddingError>() {
            return "embedding_failed";
        }
        if cause.is::<serde_json::Error>() || cause.is::<toml::de::Error>() {
            return "invalid_input";
        }
        if cause.is::<io::Error>() {
            return "io_error";
        }
    }
    "internal"
}

fn error_envelope(err: &anyhow::Error) -> ErrorEnvelope {
    let code = error_code(err);
    let envelope = ErrorEnvelope::new(code, format!("{err:#}"));
    match code {
        "embedding_failed" => envelope.with_hint(
            "check that the embedding backend is reachable, or set SEMALIGN_EMBED_MODE=stub",
        ),
        "alignment_invariant" => {
            envelope.with_hint("retry without --chunk-size or with a larger --overlap-size")
        }
        _ => envelope,
    }
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    let json_output = match &cli.command {
        Commands::Align(args) => args.json,
        Commands::Stitch(args) => args.json,
        Commands::Embed(args) => args.json,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    // HTTP client internals are noise unless debugging the backend
    if !cli.verbose {
        builder.filter_module("reqwest", log::LevelFilter::Off);
        builder.filter_module("hyper", log::LevelFilter::Off);
        builder.filter_module("hyper_util", log::LevelFilter::Off);
    }
    builder.target(env_logger::Target::Stderr).init();

    if let Err(err) = run(&cli).await {
        if json_output {
            print_stdout(&serialize_json(&error_envelope(&err))?)?;
            std::process::exit(1);
        }
        return Err(err);
    }
    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    let profile = match &cli.config {
        Some(path) => AlignProfile::load(path)?,
        None => AlignProfile::default(),
    };

    match &cli.command {
        Commands::Align(args) => run_align(cli, args, &profile).await,
        Commands::Stitch(args) => run_stitch(args, &profile),
        Commands::Embed(args) => run_embed(cli, args, &profile).await,
    }
}

async fn run_align(cli: &Cli, args: &AlignArgs, profile: &AlignProfile) -> Result<()> {
    let raw = read_input(&args.input)?;
    let input = match args.format {
        InputFormat::Json => serde_json::from_str::<AlignmentInput>(&raw)
            .with_context(|| format!("Invalid alignment input {}", args.input.display()))?,
        InputFormat::Pairs => parse_pairs_text(&raw),
    };
    let (left, right) = input.into_sides();

    let options = resolve_align_options(args, profile);
    // Sizing errors surface before a backend is contacted
    options.validate()?;
    let embedder = Backend::resolve(cli, profile)?.build()?;
    let model = embedder.model_id().to_string();

    let rows = align_sequences(&left, &right, &options, embedder).await?;

    let chunker = options.chunker_config();
    let mut out = AlignmentReport::new(
        if chunker.is_some() {
            AlignmentMode::Chunked
        } else {
            AlignmentMode::SingleShot
        },
        rows,
    );
    out.model = Some(model);
    out.gap_penalty = Some(options.gap_penalty);
    out.chunk_size = options.chunk_size;
    out.overlap_size = chunker.map(|config| config.resolved_overlap());
    log::info!("{}", report::render_summary(&out.stats));

    if args.json {
        print_stdout(&serialize_json_pretty(&out)?)?;
    } else {
        print_stdout(&report::render_table(&out.rows))?;
    }
    Ok(())
}

fn run_stitch(args: &StitchArgs, profile: &AlignProfile) -> Result<()> {
    let raw = read_input(&args.input)?;
    let request: StitchRequest = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid stitch request {}", args.input.display()))?;
    let overlap_size = args
        .overlap_size
        .or(request.overlap_size)
        .or(profile.overlap_size)
        .ok_or_else(|| AlignerError::invalid_input("stitching requires overlap_size"))?;

    let rows = stitch_all(&request.chunks, overlap_size)?;

    let mut out = AlignmentReport::new(AlignmentMode::Stitch, rows);
    out.overlap_size = Some(overlap_size);
    log::info!(
        "Stitched {} chunks: {}",
        request.chunks.len(),
        report::render_summary(&out.stats)
    );

    if args.json {
        print_stdout(&serialize_json_pretty(&out)?)?;
    } else {
        print_stdout(&report::render_table(&out.rows))?;
    }
    Ok(())
}

async fn run_embed(cli: &Cli, args: &EmbedArgs, profile: &AlignProfile) -> Result<()> {
    let embedder = Backend::resolve(cli, profile)?.build()?;
    let vectors = embedder.embed_batch(&args.tokens).await?;

    if args.json {
        let embeddings: Vec<serde_json::Value> = args
            .tokens
            .iter()
            .zip(&vectors)
            .map(|(token, vector)| serde_json::json!({ "token": token, "vector": vector }))
            .collect();
        let body = serde_json::json!({
            "model": embedder.model_id(),
            "dimension": vectors.first().map_or(0, Vec::len),
            "embeddings": embeddings,
        });
        print_stdout(&serialize_json_pretty(&body)?)?;
    } else {
        let lines: Vec<String> = args
            .tokens
            .iter()
            .zip(&vectors)
            .map(|(token, vector)| report::render_vector(token, vector, VECTOR_PREVIEW))
            .collect();
        print_stdout(&lines.join("\n"))?;
    }
    Ok(())
}
