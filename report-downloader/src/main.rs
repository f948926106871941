use tower::ServiceExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use error::AppError;
use report_downloader::{DownloadRequest, DownloaderConfig, DownloaderService};

/// Parsed command line
#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    from: Option<String>,
    to: Option<String>,
    help: bool,
}

fn parse_args(args: &[String]) -> Result<CliArgs, AppError> {
    let mut cli = CliArgs::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--from" if i + 1 < args.len() => {
                cli.from = Some(args[i + 1].clone());
                i += 2;
            }
            "--to" if i + 1 < args.len() => {
                cli.to = Some(args[i + 1].clone());
                i += 2;
            }
            "--help" | "-h" => {
                cli.help = true;
                i += 1;
            }
            other => {
                return Err(AppError::Validation(format!("unexpected argument: {}", other)));
            }
        }
    }

    if cli.from.is_some() != cli.to.is_some() {
        return Err(AppError::Validation(
            "--from and --to must be given together".to_string(),
        ));
    }
    Ok(cli)
}

fn print_help() {
    println!("Analytics Report Downloader - export tweet activity reports as CSV");
    println!();
    println!("Usage:");
    println!("  report-downloader                              Download the default period");
    println!("  report-downloader --from MM/DD/YYYY --to MM/DD/YYYY");
    println!("                                                 Download a date range in 91-day batches");
    println!();
    println!("Environment Variables:");
    println!("  ANALYTICS_USERNAME       Account name (required)");
    println!("  ANALYTICS_PASSWORD       Account password (required)");
    println!("  DOWNLOAD_PATH            Folder reports are saved into (default: current dir)");
    println!("  PROXY                    HOST:PORT proxy for the browser");
    println!("  SHOW_BROWSER             Show the browser window (true/false)");
    println!("  VIRTUAL_DISPLAY          Run the browser inside Xvfb (true/false)");
    println!("  CHROME_PATH              Chrome/Chromium executable");
    println!("  DOWNLOAD_TIMEOUT_SECS    Give up waiting for a report after N seconds");
    println!("  POLL_INTERVAL_MS         Download folder poll interval (default: 500)");
    println!("  BATCH_BOUNDARY           overshoot (default) or clamp");
    println!("  PACING                   off disables the random delays");
    println!("  ACTION_DELAY_MS          Delay between actions, MIN-MAX (default: 4000-9000)");
    println!("  STEP_DELAY_MS            Delay between calendar steps, MIN-MAX (default: 300-800)");
    println!("  LOGIN_URL                Login page URL");
    println!("  ANALYTICS_URL            Analytics site base URL");
    println!("  RUST_LOG                 Log filter (default: report_downloader=info,report_calendar=info)");
}

fn credentials() -> Result<(String, String), AppError> {
    let username = std::env::var("ANALYTICS_USERNAME")
        .map_err(|_| AppError::Config("ANALYTICS_USERNAME is not set".to_string()))?;
    let password = std::env::var("ANALYTICS_PASSWORD")
        .map_err(|_| AppError::Config("ANALYTICS_PASSWORD is not set".to_string()))?;
    Ok((username, password))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "report_downloader=info,report_calendar=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let cli = parse_args(&args)?;
    if cli.help {
        print_help();
        return Ok(());
    }

    // Load configuration
    let config = DownloaderConfig::from_env();
    tracing::info!("Starting Analytics Report Downloader v{}", config.version);
    tracing::info!("Reports go to {}", config.download_path.display());

    let (username, password) = credentials()?;
    let mut request = DownloadRequest::new(username, password);
    if let (Some(from), Some(to)) = (&cli.from, &cli.to) {
        request = request.with_date_range(from, to)?;
    }

    let report = DownloaderService::new(config).oneshot(request).await?;

    for path in &report.reports {
        println!("{}", path.display());
    }
    println!("{}", serde_json::to_string_pretty(&report.job)?);

    if !report.is_success() {
        let reason = report.job.last_error.as_deref().unwrap_or("unknown error");
        return Err(format!("job {} failed: {}", report.job.job_id, reason).into());
    }
    Ok(())
}
