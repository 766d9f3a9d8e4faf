//! vvscript main entry point
//!
//! Startup order matters: the speaker catalog is fetched before the script
//! is read, so an unreachable engine fails fast. The output file is only
//! written once every utterance has been synthesized.

use anyhow::{bail, Context};
use clap::Parser;
use log::{debug, error, info};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::time::Duration;
use vvscript::config::Config;
use vvscript::speech::create_service;
use vvscript::{Pipeline, ScriptParser, SpeakerRegistry};

/// Render a speaker-annotated script to one WAV file
#[derive(Parser, Debug)]
#[command(name = "vvscript", version, about)]
struct Cli {
    /// Script file: one utterance per line, `# speaker:style` switches voice
    file: Option<PathBuf>,

    /// Output WAV file
    #[arg(short, long, default_value = "test.wav")]
    output: PathBuf,

    /// Engine address (host:port or URL); overrides VVCLI_ENDPOINT
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Maximum concurrent synthesis requests
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Per-request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Config file (default: ~/.vvscript.cfg)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print available speakers and exit
    #[arg(long)]
    list_speakers: bool,

    /// Debug logging to vvscript.log
    #[arg(short, long)]
    debug: bool,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logger
    if cli.debug {
        use std::fs::OpenOptions;
        match OpenOptions::new()
            .create(true)
            .append(true)
            .open("vvscript.log")
        {
            Ok(log_file) => {
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .target(env_logger::Target::Pipe(Box::new(log_file)))
                    .init();
            }
            Err(e) => {
                eprintln!("Warning: Failed to open vvscript.log for debug logging: {}", e);
                eprintln!("Continuing with logging to stderr...");
                env_logger::Builder::new()
                    .filter_level(log::LevelFilter::Debug)
                    .init();
            }
        }
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Info)
            .parse_default_env()
            .init();
    }
    debug!("vvscript version {} starting", vvscript::VERSION);

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to start async runtime: {}", e);
            process::exit(1);
        }
    };

    let debug_mode = cli.debug;
    if let Err(e) = runtime.block_on(run(cli)) {
        error!("Fatal error: {:#}", e);
        // Debug logging goes to the log file; still tell the user
        if debug_mode {
            eprintln!("Error: {:#}", e);
        }
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("loading configuration")?;

    if let Some(endpoint) = &cli.endpoint {
        config.set_endpoint(endpoint)?;
    }
    if let Some(jobs) = cli.jobs {
        config.set_max_concurrency(jobs)?;
    }
    if let Some(secs) = cli.timeout {
        config.set_request_timeout(Duration::from_secs(secs))?;
    }
    debug!("Configuration: {:?}", config);

    let service = create_service(&config)?;
    let registry = SpeakerRegistry::load(service.as_ref())
        .await
        .context("fetching speaker catalog")?;

    if cli.list_speakers {
        for (name, id) in registry.entries() {
            println!("{}\t{}", name, id);
        }
        return Ok(());
    }

    let Some(file) = &cli.file else {
        bail!("no script file given (see --help)");
    };

    let script = std::fs::read_to_string(file)
        .with_context(|| format!("reading script {}", file.display()))?;
    let parser = ScriptParser::with_default_speaker(config.default_speaker());

    let pipeline = Pipeline::new(service, Arc::new(registry), config.max_concurrency());
    let voice = pipeline
        .render(&parser, &script, &cli.output)
        .await
        .with_context(|| format!("rendering {}", cli.output.display()))?;

    info!(
        "Output: {} ({} bytes, {:.2} s at {} Hz)",
        cli.output.display(),
        voice.byte_len(),
        voice.duration().as_secs_f64(),
        voice.spec().sample_rate
    );
    Ok(())
}
