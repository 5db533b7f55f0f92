use std::time::Duration;

use console::style;
use dialoguer::Input;
use eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};

use ytsum::output::{render_attempt, render_error, render_summary};
use ytsum::pipeline::{Observer, Stage, Summary};
use ytsum::transcript::FailedAttempt;

fn create_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(spinner_style) = ProgressStyle::default_spinner()
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
        .template("{spinner:.cyan} {msg}")
    {
        pb.set_style(spinner_style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn header() {
    println!(
        "{} {}",
        style("VideoTranscript AI").cyan().bold(),
        style("YouTube summaries").dim()
    );
    println!("{}", style("─".repeat(60)).dim());
}

pub fn startup_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Terminal form: one URL input, spinners while a submission runs
pub struct TerminalUi {
    verbose: bool,
    stage: Stage,
    spinner: Option<ProgressBar>,
}

impl TerminalUi {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            stage: Stage::Idle,
            spinner: None,
        }
    }

    /// Ask for a URL; `None` once the user submits an empty line
    pub fn prompt_url(&self) -> Result<Option<String>> {
        let input: String = Input::new()
            .with_prompt("Enter the YouTube video URL (empty to quit)")
            .allow_empty(true)
            .interact_text()?;
        let input = input.trim().to_string();
        Ok((!input.is_empty()).then_some(input))
    }

    /// Print the outcome of a submission and reset to idle
    pub fn show(&mut self, result: &ytsum::Result<Summary>) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_and_clear();
        }
        match result {
            Ok(summary) => println!("\n{}\n", render_summary(summary, self.verbose)),
            Err(e) => eprintln!("{}", style(render_error(e)).red()),
        }
        self.stage = Stage::Idle;
    }

    fn complete(&mut self, done: &str) {
        if let Some(pb) = self.spinner.take() {
            pb.finish_with_message(format!("{} {}", style("✓").green().bold(), done));
        }
    }
}

impl Observer for TerminalUi {
    fn on_stage(&mut self, stage: Stage) {
        log::debug!("Stage {} -> {}", self.stage, stage);
        match stage {
            Stage::Idle => {}
            Stage::ExtractingId => self.spinner = Some(create_spinner("Extracting video ID...")),
            Stage::FetchingTranscript => {
                self.complete("Video ID extracted");
                self.spinner = Some(create_spinner("Extracting video transcript..."));
            }
            Stage::GeneratingSummary => {
                self.complete("Transcript extracted");
                self.spinner = Some(create_spinner("Generating summary..."));
            }
            Stage::Displaying => self.complete("Summary generated"),
            Stage::InvalidUrl | Stage::TranscriptError => {
                if let Some(pb) = self.spinner.take() {
                    pb.finish_and_clear();
                }
            }
        }
        self.stage = stage;
    }

    fn on_attempt_failed(&mut self, attempt: &FailedAttempt) {
        let line = format!("{}", style(render_attempt(attempt)).yellow());
        match &self.spinner {
            Some(pb) => pb.println(line),
            None => eprintln!("{line}"),
        }
    }
}
