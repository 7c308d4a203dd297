use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "csave")]
#[command(about = "Interactive tape backup of ZFS datasets")]
#[command(version)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Specify configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
