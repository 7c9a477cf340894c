use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use detect_lens_lib::config::API_URL_ENV;
use detect_lens_lib::models::ui_types::DownloadButton;
use detect_lens_lib::{
    AnalysisController, AnalysisOutcome, ApiConfig, DetectionApi, HttpDetectionApi,
    ModelDownload, RasterSurface,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "detect-lens", about = "Send images to a detection service and draw the result")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Detection service base URL
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,

    /// Use the hosted production service instead of the local one
    #[arg(long, global = true)]
    production: bool,

    /// TOML file overriding configuration values
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the detection service is reachable
    Health,
    /// Analyze one or more images
    Analyze(AnalyzeArgs),
    /// Download the detection model weights
    DownloadModel(DownloadArgs),
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Images to analyze, in order
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory for rendered results
    #[arg(short, long, default_value = ".")]
    out: PathBuf,
}

#[derive(Args)]
struct DownloadArgs {
    /// Directory to save the model into
    #[arg(short, long, default_value = ".")]
    out: PathBuf,
}

fn load_config(cli: &Cli) -> Result<ApiConfig> {
    // clap already folded the environment variable into `api_url`
    let mut config = ApiConfig::resolve(None, None, cli.production);
    if let Some(path) = &cli.config {
        config = config
            .load_toml(path)
            .with_context(|| format!("loading config {}", path.display()))?;
    }
    if let Some(url) = &cli.api_url {
        config.base_url = url.clone();
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = load_config(&cli)?;
    tracing::info!(api_url = %config.base_url, "Using detection service");

    match &cli.command {
        Commands::Health => run_health(config).await,
        Commands::Analyze(args) => run_analyze(config, args).await,
        Commands::DownloadModel(args) => run_download(config, args).await,
    }
}

async fn run_health(config: ApiConfig) -> Result<()> {
    let api = HttpDetectionApi::new(config);
    let report = api.check_health().await;
    println!("{}", report.badge());
    Ok(())
}

async fn run_analyze(config: ApiConfig, args: &AnalyzeArgs) -> Result<()> {
    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("creating {}", args.out.display()))?;

    let api = HttpDetectionApi::new(config.clone());
    // The badge is informational; analysis does not wait for it.
    let health = tokio::spawn({
        let api = api.clone();
        async move {
            let report = api.fetch_health().await;
            println!("{}", report.badge());
            report
        }
    });
    let mut controller = AnalysisController::new(api, RasterSurface::new(), config);

    let mut failures = 0usize;
    for path in &args.files {
        println!("\n{}", path.display());
        match analyze_one(&mut controller, path, &args.out).await {
            Ok(()) => {}
            Err(e) => {
                failures += 1;
                println!("  {:#}", e);
            }
        }
        controller.dismiss_error();
        controller.reset();
    }

    match health.await {
        Ok(report) => {
            controller.record_health(report);
        }
        Err(e) => tracing::warn!(error = %e, "Health check task failed"),
    }

    let stats = controller.stats().view();
    println!(
        "\nAnalyses: {}  Avg confidence: {}  Avg time: {}",
        stats.total_analyses, stats.avg_confidence, stats.avg_time
    );
    if failures > 0 {
        anyhow::bail!("{} of {} images failed", failures, args.files.len());
    }
    Ok(())
}

async fn analyze_one(
    controller: &mut AnalysisController<HttpDetectionApi, RasterSurface>,
    path: &Path,
    out_dir: &Path,
) -> Result<()> {
    controller.select_path(path).await?;
    let outcome = controller.analyze().await?;
    print_outcome(&outcome);

    let stem = path
        .file_stem()
        .unwrap_or_default()
        .to_string_lossy()
        .into_owned();
    let image_path = out_dir.join(format!("{}.result.png", stem));
    let labels_path = out_dir.join(format!("{}.labels.json", stem));

    let surface = controller.surface();
    surface
        .canvas()
        .save(&image_path)
        .with_context(|| format!("writing {}", image_path.display()))?;

    let sidecar = serde_json::json!({
        "view": outcome.view,
        "render": outcome.render,
        "labels": surface.annotations(),
    });
    std::fs::write(&labels_path, serde_json::to_string_pretty(&sidecar)?)
        .with_context(|| format!("writing {}", labels_path.display()))?;

    println!("  saved {}", image_path.display());
    Ok(())
}

fn print_outcome(outcome: &AnalysisOutcome) {
    let view = &outcome.view;
    println!("  {} {} ({})", view.emoji, view.status, view.confidence_text);
    if !view.message.is_empty() {
        println!("  {}", view.message);
    }
    println!(
        "  class: {}  priority: {}  detections: {}  time: {}",
        view.details.class_name,
        view.details.priority,
        view.details.num_detections,
        view.details.processing_time
    );
}

async fn run_download(config: ApiConfig, args: &DownloadArgs) -> Result<()> {
    let mut download = ModelDownload::new(config.download_revert);
    let api = HttpDetectionApi::new(config);

    println!("{}", DownloadButton::Downloading.label());
    let path = download
        .download(&api, &args.out, &mut |progress| {
            tracing::debug!(progress, "Download progress");
        })
        .await;
    println!("{}", download.button().label());
    let path = path?;
    println!("{}", path.display());
    Ok(())
}
