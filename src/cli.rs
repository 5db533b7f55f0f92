use clap::Parser;

#[derive(Parser)]
#[command(
    name = "ytsum",
    about = "Summarize a YouTube video from its transcript",
    version = env!("GIT_DESCRIBE"),
)]
pub struct Cli {
    /// YouTube video URL (prompts for one, or reads stdin lines, if omitted)
    pub url: Option<String>,

    /// Gemini model used for the summary
    #[arg(short, long)]
    pub model: Option<String>,

    /// Preferred transcript language; repeat for several. Any language is tried afterwards
    #[arg(short, long = "lang", value_name = "LANG")]
    pub lang: Vec<String>,

    /// Show transcript language, model and config details
    #[arg(short, long)]
    pub verbose: bool,
}
