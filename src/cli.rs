use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "audioparams")]
#[command(about = "Audio encoding parameter panel with ffmpeg argument preview", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Selection state file (overrides config)
    #[arg(long, global = true, value_name = "FILE")]
    pub state: Option<PathBuf>,

    /// Codec catalog to use instead of the configured one
    #[arg(long, global = true, value_name = "FILE")]
    pub catalog: Option<PathBuf>,

    /// Verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List codecs, encoders, rate-control modes and parameters
    Codecs,

    /// Show the visible controls for the stored selection
    Show {
        /// Print controls as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change a selection field (acodec, aencoder, ratecontrol, ratevalue, vol, custom)
    Set {
        field: String,
        /// New value; numeric fields take a slider position between 0 and 1
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Change a detail parameter of the selected encoder
    Detail {
        parameter: String,
        /// Combo item value, slider position, or slider text like "128 kbps"
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Print the ffmpeg audio arguments for the stored selection
    Args,

    /// Restore the default selection
    Reset,

    /// Show config status and location, or create default config if missing
    InitConfig,
}

pub fn parse() -> Cli {
    Cli::parse()
}
