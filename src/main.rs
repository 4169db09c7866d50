use clap::{Parser, Subcommand};
use rdalle::{
    logger::{self, LoggerConfig},
    output, Config, DownloadOutcome, GenerationRequest, ImageSize, OpenAiClient, ResponseFormat,
    MAX_IMAGES,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "rdalle", version)]
#[command(about = "Generate images with DALL-E and download them")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit log lines as JSON
    #[arg(long, global = true)]
    log_json: bool,

    /// Also append log lines to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate images from a text description
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
struct GenerateArgs {
    /// What the images should show
    description: String,

    /// Number of images to request
    #[arg(short = 'n', long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=MAX_IMAGES as i64))]
    count: u8,

    #[arg(long, value_enum)]
    size: Option<ImageSize>,

    #[arg(long, value_enum)]
    format: Option<ResponseFormat>,

    /// Opaque end-user id forwarded to the API
    #[arg(long)]
    user: Option<String>,

    /// Directory the run folder is created in (default: DALLE_OUTPUT_DIR or .)
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Maximum simultaneous downloads
    #[arg(long)]
    concurrency: Option<usize>,

    #[arg(long)]
    no_progress: bool,
}

impl GenerateArgs {
    fn to_request(&self) -> GenerationRequest {
        let mut request = GenerationRequest::new(self.description.clone()).with_count(self.count);
        if let Some(size) = self.size {
            request = request.with_size(size);
        }
        if let Some(format) = self.format {
            request = request.with_response_format(format);
        }
        if let Some(user) = &self.user {
            request = request.with_user(user.clone());
        }
        request
    }

    fn apply(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.output_dir {
            config = config.with_output_root(dir.clone());
        }
        if let Some(concurrency) = self.concurrency {
            config = config.with_concurrency(concurrency);
        }
        config.with_progress(!self.no_progress)
    }
}

impl Cli {
    fn logger_config(&self) -> LoggerConfig {
        let config = match (self.log_json, self.verbose) {
            (true, true) => LoggerConfig::json().with_level(logger::LogLevel::Debug),
            (true, false) => LoggerConfig::json(),
            (false, true) => LoggerConfig::verbose(),
            (false, false) => LoggerConfig::default(),
        };
        match &self.log_file {
            Some(path) => config.with_file_output(path.clone()),
            None => config,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_config(cli.logger_config()) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    if dotenv_loaded {
        log::debug!(".env file loaded");
    }

    let result = match cli.command {
        Command::Generate(args) => generate(args).await,
    };
    ExitCode::from(exit_status(&result))
}

/// Logs a failed run once, by its display message, and maps it to a process
/// exit status.
fn exit_status(result: &rdalle::Result<()>) -> u8 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            log::error!("{}", e);
            1
        }
    }
}

async fn generate(args: GenerateArgs) -> rdalle::Result<()> {
    let config = args.apply(Config::from_env()?);
    logger::log_run_info(&config);

    let client = OpenAiClient::new(&config)?;

    let dir = output::create_run_dir(&config.output_root)?;
    log::info!("📁 Output directory: {}", dir.display());

    log::info!("🎨 Generating image(s) for \"{}\"", args.description);
    let mut generation_timer = logger::timer("Generation request");
    let result = client.image().generate(&args.to_request()).await?;
    generation_timer.stop();

    let outcomes = if result.is_empty() {
        log::warn!("The API returned no images");
        Vec::new()
    } else {
        let cancel = CancellationToken::new();
        let ctrl_c = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Interrupted, cancelling remaining downloads");
                ctrl_c.cancel();
            }
        });

        client
            .downloader()
            .download_all(&result.images, &dir, &cancel)
            .await
    };

    print!("{}", summary(&dir, &outcomes));
    Ok(())
}

fn summary(dir: &Path, outcomes: &[DownloadOutcome]) -> String {
    let saved = outcomes.iter().filter(|o| o.is_saved()).count();
    let mut text = format!(
        "{}\nsaved {} of {} image(s)\n",
        dir.display(),
        saved,
        outcomes.len()
    );
    for outcome in outcomes {
        if let DownloadOutcome::Failed { source, reason, .. } = outcome {
            text.push_str(&format!("  failed: {} ({})\n", source, reason));
        }
    }
    text
}
