use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "photoframe")]
#[command(about = "Google Photos library client for a photo frame", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Whose cache entries to use
    #[arg(short, long, global = true, env = "PHOTOFRAME_USER", default_value = "default")]
    pub user: String,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the albums owned by the user
    Albums,

    /// Show the photos currently selected for the frame
    Queue,

    /// Load the photos of an album into the frame
    LoadAlbum {
        /// Album id
        id: String,

        /// How many photos to load, negative for all of them
        #[arg(short, long, allow_negative_numbers = true)]
        photos: Option<i64>,
    },

    /// Run a JSON payload through a model and print what it keeps
    Convert {
        #[arg(value_enum)]
        model: ConvertTarget,

        /// Payload file, stdin when omitted
        file: Option<PathBuf>,
    },

    /// Store an access token for the Photos Library API
    Login {
        #[arg(short, long)]
        token: String,

        /// Token lifetime in seconds
        #[arg(long)]
        expires_in: Option<u64>,
    },

    /// Forget the stored token and every cached entry
    Logout,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConvertTarget {
    Album,
    AlbumResponse,
    MediaItem,
    MediaSearch,
}
