use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, ValueEnum};
use strum::VariantNames;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use crate::config::{Config, DEFAULT_RESULT_BUFFER};
use crate::secret::BaseSeed;
use crate::types::{FailurePolicy, Network};
use crate::ui::display::{print_banner, show_summary};
use crate::ui::progress::{Hidden, Live, Progress, ProgressBar};
use crate::worker::Worker;

/// How progress is drawn on standard error.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum ProgressMode {
    /// Fixed-width text bar.
    #[default]
    Bar,

    /// Animated bar with rate and ETA.
    Live,

    /// No progress output.
    None,
}

#[derive(Parser)]
#[command(name = "addrmint", version = "26.1.0", about = "Generate deterministic blockchain addresses in bulk, in order, across all cores.")]
pub struct App {
    /// Network to generate addresses for (ethereum, bitcoin, solana)
    #[arg(short, long)]
    network: String,

    /// Number of addresses to generate
    #[arg(short, long, default_value_t = 1)]
    count: u64,

    /// Base seed; 0 draws a random one
    #[arg(short, long, default_value_t = 0, allow_negative_numbers = true)]
    seed: i64,

    /// Number of workers (defaults to the available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Job queue capacity (defaults to twice the worker count)
    #[arg(long)]
    queue_capacity: Option<usize>,

    /// Result channel capacity
    #[arg(long, default_value_t = DEFAULT_RESULT_BUFFER)]
    output_buffer: usize,

    /// Output file (defaults to standard output)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Prefix every address with the first 6 hex characters of its SHA-256
    #[arg(long)]
    generate_hash: bool,

    /// Skip failed items and report them at the end instead of aborting
    #[arg(long)]
    keep_going: bool,

    /// Maximum number of items submitted but not yet written
    #[arg(long)]
    window: Option<usize>,

    /// Progress display
    #[arg(long, value_enum, default_value_t = ProgressMode::Bar)]
    progress: ProgressMode,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

impl App {
    pub fn init() -> Result<Self> {
        let app = Self::parse();

        let level = if app.quiet { LevelFilter::WARN } else { LevelFilter::INFO };
        let subscriber = tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).with_file(true).with_line_number(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;

        Ok(app)
    }

    pub async fn execute(self) -> Result<()> {
        let network = Network::from_str(&self.network.to_lowercase())
            .map_err(|_| anyhow!("unsupported network {:?}, expected one of: {}", self.network, Network::VARIANTS.join(", ")))?;

        let seed = if self.seed == 0 {
            info!("using a random base seed");
            BaseSeed::random()?
        } else {
            info!("using the base seed given on the command line");
            BaseSeed::from_int(self.seed)
        };

        let policy = if self.keep_going { FailurePolicy::Collect } else { FailurePolicy::FailFast };
        let mut config =
            Config::new(self.count, seed, network).with_result_buffer(self.output_buffer).with_hash_prefix(self.generate_hash).with_policy(policy);
        if let Some(workers) = self.workers {
            config = config.with_workers(workers);
        }
        if let Some(capacity) = self.queue_capacity {
            config = config.with_queue_capacity(capacity);
        }
        if let Some(window) = self.window {
            config = config.with_max_in_flight(window);
        }

        let output = self.open_output().await?;

        if !self.quiet {
            print_banner();
        }
        info!(count = self.count, %network, workers = config.effective_workers(), "generating addresses");

        let progress: Arc<dyn Progress> = match self.progress {
            ProgressMode::Bar => Arc::new(ProgressBar::stderr(self.count)),
            ProgressMode::Live => Arc::new(Live::new(self.count)?),
            ProgressMode::None => Arc::new(Hidden),
        };

        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupt received, stopping");
                interrupt.cancel();
            }
        });

        let summary = Worker::new(config)?.with_progress(progress).with_cancellation(cancel).process(output).await?;

        if !self.quiet {
            show_summary(&summary);
        }

        if summary.cancelled {
            bail!("interrupted after writing {} of {} addresses", summary.emitted, self.count);
        }

        if !summary.failures.is_empty() {
            for failure in &summary.failures {
                warn!("{failure}");
            }
            bail!("{} of {} jobs failed", summary.failures.len(), self.count);
        }

        Ok(())
    }

    async fn open_output(&self) -> Result<Box<dyn AsyncWrite + Unpin + Send>> {
        match &self.output {
            Some(path) => {
                let file = tokio::fs::File::create(path).await.with_context(|| format!("failed to create output file: {}", path.display()))?;
                info!(path = %path.display(), "writing addresses to file");
                Ok(Box::new(file))
            }
            None => Ok(Box::new(tokio::io::stdout())),
        }
    }
}
