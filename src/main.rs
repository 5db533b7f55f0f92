use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;

use eyre::{Result, bail};
use log::{info, warn};

use ytsum::config::{Config, Settings};
use ytsum::pipeline::Pipeline;
use ytsum::summarize::{API_KEY_ENV, GeminiModel, TextGenerator, api_key_from_env};
use ytsum::transcript::TranscriptFetcher;
use ytsum::youtube::CaptionClient;

mod cli;
mod ui;

use cli::Cli;
use ui::TerminalUi;

fn setup_logging() -> Result<()> {
    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)?;
    let log_file = log_dir.join("ytsum.log");

    let target = Box::new(std::fs::OpenOptions::new().create(true).append(true).open(&log_file)?);

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized: {}", log_file.display());
    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ytsum")
        .join("logs")
}

fn build_after_help() -> String {
    let key_line = match api_key_from_env() {
        Some(_) => format!("  \x1b[32m✅\x1b[0m {API_KEY_ENV}"),
        None => format!("  \x1b[31m❌\x1b[0m {API_KEY_ENV}  (not set — needed for summaries)"),
    };

    format!(
        "\nENVIRONMENT:\n{key_line}\n\nConfig is read from: {}\nLogs are written to: {}",
        ytsum::config::config_path().display(),
        log_dir().join("ytsum.log").display()
    )
}

/// Run one submission through the pipeline; true when a summary was shown
async fn submit<F, G>(pipeline: &Pipeline<F, G>, ui: &mut TerminalUi, url: &str) -> bool
where
    F: TranscriptFetcher,
    G: TextGenerator,
{
    let result = pipeline.submit(url, &mut *ui).await;
    if let Err(e) = &result {
        warn!("Submission for {url:?} failed: {e}");
    }
    ui.show(&result);
    result.is_ok()
}

/// Non-empty, trimmed lines of piped input; at least one is required
fn read_urls(input: impl BufRead) -> Result<Vec<String>> {
    let urls = input
        .lines()
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();

    if urls.is_empty() {
        bail!("no YouTube URL provided\n\nUsage: ytsum <URL>\n       echo <URL> | ytsum");
    }
    Ok(urls)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    setup_logging()?;

    let after_help = build_after_help();
    let cmd = <Cli as clap::CommandFactory>::command().after_help(after_help);
    let matches = cmd.get_matches();
    let cli = <Cli as clap::FromArgMatches>::from_arg_matches(&matches)?;

    // Load config file (non-fatal if missing/invalid)
    let config = Config::load().unwrap_or_default();

    let api_key = api_key_from_env();
    if api_key.is_none() {
        warn!("{API_KEY_ENV} not set");
        ui::startup_error(&format!(
            "Google API key not found. Please set the {API_KEY_ENV} environment variable."
        ));
    }

    let settings = Settings::resolve(&config, cli.model.as_deref(), &cli.lang, api_key);

    if cli.verbose {
        let config_path = ytsum::config::config_path();
        if config_path.exists() {
            eprintln!("Config: {}", config_path.display());
        }
        eprintln!("Model: {}", settings.model.model);
        let chain = settings
            .strategies
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(" → ");
        eprintln!("Transcript languages: {chain}");
    }

    let client = reqwest::Client::new();
    let pipeline = Pipeline::new(
        CaptionClient::new(client.clone()),
        GeminiModel::new(client, settings.model),
        settings.strategies,
    );

    let mut ui = TerminalUi::new(cli.verbose);

    // Single URL from the command line
    if let Some(ref url) = cli.url {
        let ok = submit(&pipeline, &mut ui, url).await;
        return Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE });
    }

    // Interactive form
    if io::stdin().is_terminal() {
        ui::header();
        while let Some(url) = ui.prompt_url()? {
            submit(&pipeline, &mut ui, &url).await;
        }
        return Ok(ExitCode::SUCCESS);
    }

    // One URL per line on piped stdin
    let urls = read_urls(io::stdin().lock())?;
    let mut failed = false;
    for url in &urls {
        failed |= !submit(&pipeline, &mut ui, url).await;
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_urls_skips_blank_lines() {
        let input = Cursor::new("  https://youtu.be/xyz789  \n\n\nhttps://youtube.com/watch?v=abc123\n");
        assert_eq!(
            read_urls(input).unwrap(),
            vec!["https://youtu.be/xyz789", "https://youtube.com/watch?v=abc123"]
        );
    }

    #[test]
    fn test_read_urls_requires_one_url() {
        let err = read_urls(Cursor::new("\n   \n")).unwrap_err();
        assert!(err.to_string().contains("Usage: ytsum <URL>"));
        assert!(read_urls(Cursor::new("")).is_err());
    }
}
