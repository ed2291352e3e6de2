use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use recap_core::{
    Analyzer, AnalyzerConfig, ChatSummarizer, DEFAULT_MAX_WORDS, GoogleTranslateClient, Progress,
    Provider, Stage, SummarizerConfig, TARGET_LANGUAGE, YoutubeTranscriptClient,
};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let whole = d.as_secs();
        format!("{}m {}s", whole / 60, whole % 60)
    }
}

/// CLI wrapper for Provider enum (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliProvider {
    #[default]
    Gemini,
    Openai,
    Grok,
}

impl From<CliProvider> for Provider {
    fn from(cli: CliProvider) -> Self {
        match cli {
            CliProvider::Gemini => Provider::Gemini,
            CliProvider::Openai => Provider::Openai,
            CliProvider::Grok => Provider::Grok,
        }
    }
}

#[derive(Parser)]
#[command(name = "recap")]
#[command(about = "Summarize a YouTube video from its transcript with AI")]
struct Cli {
    /// Video URL
    url: String,

    /// AI provider for the summary
    #[arg(short, long, env = "RECAP_PROVIDER", default_value = "gemini")]
    provider: CliProvider,

    /// Model name, defaults to the provider's
    #[arg(short, long, env = "RECAP_MODEL")]
    model: Option<String>,

    /// API key, defaults to the provider's environment variable
    #[arg(long, env = "RECAP_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Words of transcript sent to the model
    #[arg(long, default_value_t = DEFAULT_MAX_WORDS)]
    max_words: usize,

    /// Deadline for each external call
    #[arg(long, default_value_t = 120)]
    timeout_secs: u64,

    /// Print the whole analysis as JSON
    #[arg(long)]
    json: bool,
}

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn stage_message(stage: Stage, provider: Provider) -> String {
    match stage {
        Stage::Transcript => "Fetching transcript...".to_string(),
        Stage::Translation => format!("Translating to {}...", TARGET_LANGUAGE),
        Stage::Summarization => format!("Summarizing with {}...", provider.name()),
    }
}

/// Turns pipeline progress into one spinner per stage.
struct StageReporter {
    provider: Provider,
    quiet: bool,
    spinner: Option<ProgressBar>,
    started: Instant,
}

impl StageReporter {
    fn new(provider: Provider, quiet: bool) -> Self {
        Self {
            provider,
            quiet,
            spinner: None,
            started: Instant::now(),
        }
    }

    fn on_progress(&mut self, progress: Progress) {
        if self.quiet {
            return;
        }
        match progress {
            Progress::Started(stage) => {
                self.started = Instant::now();
                self.spinner = Some(create_spinner(&stage_message(stage, self.provider)));
            }
            Progress::TranscriptFetched {
                language_code,
                words,
            } => self.finish(format!(
                "Transcript: {} words, {}",
                words,
                style(language_code).yellow()
            )),
            Progress::Translated { language } => {
                self.finish(format!("Translated: {}", style(language).yellow()))
            }
            Progress::Truncated { words } => println!(
                "{} Prompt: {} words",
                style("✓").green().bold(),
                words
            ),
            Progress::Summarized => {
                self.finish(format!("Summary generated ({})", self.provider.name()))
            }
        }
    }

    fn finish(&mut self, msg: String) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_with_message(format!(
                "{} {} {}",
                style("✓").green().bold(),
                msg,
                style(format!("[{}]", format_duration(self.started.elapsed()))).dim()
            ));
        }
    }

    fn abandon(&mut self) {
        if let Some(spinner) = self.spinner.take() {
            spinner.finish_and_clear();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let provider: Provider = cli.provider.into();

    // Validate API key early
    let api_key = match provider.resolve_api_key(cli.api_key) {
        Ok(key) => key,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            std::process::exit(1);
        }
    };

    let client = reqwest::Client::builder()
        .build()
        .context("failed to build HTTP client")?;
    let analyzer = Analyzer::new(
        Arc::new(YoutubeTranscriptClient::new(client.clone())),
        Arc::new(GoogleTranslateClient::new(client.clone())),
        Arc::new(ChatSummarizer::new(
            client,
            SummarizerConfig::new(provider, cli.model, api_key),
        )),
        AnalyzerConfig {
            max_words: cli.max_words,
            target_language: TARGET_LANGUAGE.to_string(),
            upstream_timeout: Duration::from_secs(cli.timeout_secs),
        },
    );

    if !cli.json {
        println!(
            "\n{}  {}\n",
            style("recap").cyan().bold(),
            style("Video Summarizer").dim()
        );
        println!("{}", style("─".repeat(60)).dim());
    }

    let total_start = Instant::now();
    let mut reporter = StageReporter::new(provider, cli.json);
    let result = analyzer
        .analyze_observed(&cli.url, &mut |progress: Progress| reporter.on_progress(progress))
        .await;

    let analysis = match result {
        Ok(analysis) => analysis,
        Err(failure) => {
            reporter.abandon();
            warn!(kind = failure.kind(), error = %failure, "analysis failed");
            eprintln!("{} {}", style("Error:").red().bold(), failure);
            std::process::exit(1);
        }
    };

    debug!(
        video_id = %analysis.video_id,
        language = %analysis.language,
        summary_chars = analysis.summary.len(),
        elapsed = ?total_start.elapsed(),
        "analysis finished"
    );

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    println!(
        "\n{} {}\n",
        style("Total time:").dim(),
        style(format_duration(total_start.elapsed())).cyan().bold()
    );
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", analysis.summary);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_are_compact() {
        assert_eq!(format_duration(Duration::from_millis(1500)), "1.5s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m 5s");
        assert_eq!(format_duration(Duration::from_millis(119_600)), "1m 59s");
        assert_eq!(format_duration(Duration::from_secs(3600)), "60m 0s");
    }

    #[test]
    fn cli_defaults_to_gemini_and_word_budget() {
        let cli = Cli::try_parse_from(["recap", "https://youtu.be/abc"]).unwrap();
        assert_eq!(cli.url, "https://youtu.be/abc");
        assert_eq!(Provider::from(cli.provider), Provider::Gemini);
        assert_eq!(cli.max_words, 5000);
        assert_eq!(cli.timeout_secs, 120);
        assert!(!cli.json);
    }

    #[test]
    fn stage_messages_name_the_provider() {
        assert_eq!(
            stage_message(Stage::Summarization, Provider::Grok),
            "Summarizing with Grok..."
        );
        assert_eq!(
            stage_message(Stage::Translation, Provider::Gemini),
            "Translating to en..."
        );
    }

    #[test]
    fn quiet_reporter_draws_nothing() {
        let mut reporter = StageReporter::new(Provider::Gemini, true);
        reporter.on_progress(Progress::Started(Stage::Transcript));
        assert!(reporter.spinner.is_none());
    }
}
