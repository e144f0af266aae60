//! Command-line arguments

use std::path::PathBuf;

use clap::Parser;

#[derive(Debug, Parser)]
#[command(
    name = "studydesk",
    version,
    about = "Terminal study workspace for lecture summaries and quizzes"
)]
pub struct Cli {
    /// Use an in-memory backend instead of the configured server
    #[arg(long)]
    pub offline: bool,

    /// Files uploaded for summarization at start-up
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}
