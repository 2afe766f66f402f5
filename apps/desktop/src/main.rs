use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    execute, load_settings, platform_speech_engine, ClientSettings, DocumentSession,
    HttpExtractionClient, SessionRequest, SpeechEngine,
};
use shared::domain::{page_count_label, PageToken};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "vocal-pdf", about = "Read PDF pages aloud through the extraction service")]
struct Args {
    /// Extraction service base url; overrides vocal_pdf.toml and the environment.
    #[arg(long, global = true)]
    base_url: Option<String>,
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print how many pages the service finds in FILE.
    Pages { file: PathBuf },
    /// Print the extracted text of one page.
    Preview {
        file: PathBuf,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },
    /// Read one page aloud and wait until it has been spoken.
    Speak {
        file: PathBuf,
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,
    },
}

fn resolve_settings(args: &Args) -> ClientSettings {
    let mut settings = load_settings();
    if let Some(base_url) = &args.base_url {
        settings.base_url = base_url.clone();
    }
    if let Some(timeout_secs) = args.timeout_secs {
        settings.request_timeout_secs = Some(timeout_secs);
    }
    settings
}

/// Runs `request` and turns a raised alert into an error.
async fn drive<S: SpeechEngine>(
    session: &mut DocumentSession<S>,
    client: &HttpExtractionClient,
    request: Option<SessionRequest>,
) -> Result<()> {
    if let Some(request) = request {
        tracing::debug!(request = request.name(), ticket = %request.ticket(), "running request");
        session.complete(execute(client, request).await);
    }
    match session.dismiss_alert() {
        Some(alert) => Err(anyhow!(alert)),
        None => Ok(()),
    }
}

async fn open_and_count<S: SpeechEngine>(
    session: &mut DocumentSession<S>,
    client: &HttpExtractionClient,
    file: &Path,
) -> Result<u32> {
    let request = session.begin_file_selection(Some(file));
    drive(session, client, request)
        .await
        .with_context(|| format!("could not open '{}'", file.display()))?;

    let request = session.analyze();
    drive(session, client, request).await?;
    Ok(session.page_count())
}

async fn load_page<S: SpeechEngine>(
    session: &mut DocumentSession<S>,
    client: &HttpExtractionClient,
    file: &Path,
    page: u32,
) -> Result<()> {
    open_and_count(session, client, file).await?;
    let request = session
        .select_page(PageToken::Page(page))
        .with_context(|| format!("'{}' has no page {page}", file.display()))?;
    drive(session, client, request).await
}

async fn speak_page(client: &HttpExtractionClient, file: &Path, page: u32) -> Result<()> {
    let (finished_tx, mut finished_rx) = mpsc::unbounded_channel();
    let engine = platform_speech_engine(Box::new(move |utterance| {
        let _ = finished_tx.send(utterance);
    }));
    let mut session = DocumentSession::new(engine);

    load_page(&mut session, client, file, page).await?;
    if session.preview_text().is_empty() {
        bail!("page {page} has no extractable text");
    }

    session.start_speech();
    if let Some(alert) = session.dismiss_alert() {
        bail!(alert);
    }
    eprintln!("Reading page {page} of {}; press Ctrl+C to stop", file.display());

    while session.is_playing() {
        tokio::select! {
            finished = finished_rx.recv() => match finished {
                Some(utterance) => session.utterance_finished(utterance),
                None => session.stop_speech(),
            },
            _ = tokio::signal::ctrl_c() => session.stop_speech(),
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = resolve_settings(&args);
    let client =
        HttpExtractionClient::new(&settings).context("failed to configure extraction client")?;
    tracing::info!(base_url = %settings.base_url, "using extraction service");

    match args.command {
        Command::Pages { file } => {
            let mut session = DocumentSession::new(client_core::UnavailableSpeechEngine::new(
                "speech is not used by this command",
            ));
            let page_count = open_and_count(&mut session, &client, &file).await?;
            println!("{}", page_count_label(page_count));
        }
        Command::Preview { file, page } => {
            let mut session = DocumentSession::new(client_core::UnavailableSpeechEngine::new(
                "speech is not used by this command",
            ));
            load_page(&mut session, &client, &file, page).await?;
            println!("{}", session.preview_text());
        }
        Command::Speak { file, page } => speak_page(&client, &file, page).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_flags_override_loaded_settings() {
        let args = Args::parse_from([
            "vocal-pdf",
            "--base-url",
            "http://127.0.0.1:5000",
            "--timeout-secs",
            "7",
            "pages",
            "report.pdf",
        ]);
        let settings = resolve_settings(&args);
        assert_eq!(settings.base_url, "http://127.0.0.1:5000");
        assert_eq!(settings.request_timeout_secs, Some(7));
    }

    #[test]
    fn page_zero_is_rejected_by_the_parser() {
        let parsed = Args::try_parse_from(["vocal-pdf", "preview", "report.pdf", "--page", "0"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn global_flags_are_accepted_after_the_subcommand() {
        let args = Args::parse_from([
            "vocal-pdf",
            "speak",
            "report.pdf",
            "--page",
            "2",
            "--base-url",
            "http://localhost:9000",
        ]);
        assert_eq!(args.base_url.as_deref(), Some("http://localhost:9000"));
        assert!(matches!(args.command, Command::Speak { page: 2, .. }));
    }
}
