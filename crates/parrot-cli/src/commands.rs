//! Commands enum and nested subcommands.

use std::path::PathBuf;

use clap::Subcommand;
use parrot_core::{GapSound, NoiseKind};

/// Available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Generate a material from a content file and synthesize its audio
    Generate {
        /// JSON file with `title`, `originalText` and `chunks`
        #[arg(long)]
        content: PathBuf,
        /// Voice to synthesize with (overrides the default speaker)
        #[arg(long)]
        speaker: Option<String>,
        /// Content language (overrides the configured language)
        #[arg(long)]
        language: Option<String>,
    },

    /// List stored materials
    List,

    /// Delete a material and its cached audio
    Delete {
        /// Material ID
        id: String,
    },

    /// Import materials from a JSON export or a single material file
    Import {
        /// File to import
        file: PathBuf,
    },

    /// Export materials to a JSON file
    Export {
        /// Material ID to export (repeatable; all materials when omitted)
        #[arg(long = "id")]
        ids: Vec<String>,
        /// Output file
        #[arg(long)]
        out: PathBuf,
    },

    /// Compress a material into a shareable string
    Pack {
        /// Material ID
        id: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Store a material from a packed string file
    Unpack {
        /// File holding the packed string
        file: PathBuf,
    },

    /// Inspect or clear the caches
    Cache {
        #[command(subcommand)]
        command: CacheCommand,
    },

    /// Play a material on the default audio device
    Play {
        /// Material ID
        id: String,
        /// Start at this chunk index
        #[arg(long, default_value_t = 0)]
        from: usize,
    },

    /// View or change settings
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
}

/// Cache command variants.
#[derive(Subcommand)]
pub enum CacheCommand {
    /// Show entry counts and sizes
    Stats,
    /// Remove cached entries
    Clear {
        /// Only the audio cache
        #[arg(long, conflicts_with = "text")]
        audio: bool,
        /// Only the text cache
        #[arg(long)]
        text: bool,
    },
}

/// Settings command variants.
#[derive(Subcommand)]
pub enum SettingsCommand {
    /// Show all current settings
    Show,
    /// Update settings
    Set(SettingsArgs),
}

/// Settings fields settable from the command line.
#[derive(clap::Args, Debug, Default)]
pub struct SettingsArgs {
    /// Default voice
    #[arg(long)]
    pub default_speaker: Option<String>,
    /// Synthesis speed (0.5-2.0)
    #[arg(long)]
    pub speed: Option<f32>,
    /// Content language
    #[arg(long)]
    pub language: Option<String>,
    /// Forced aligner model
    #[arg(long)]
    pub aligner_model: Option<String>,
    /// Pause after each chunk in seconds (0-30)
    #[arg(long)]
    pub gap_seconds: Option<f64>,
    /// Sound at the start of the pause (none|beep)
    #[arg(long)]
    pub gap_sound: Option<GapSound>,
    /// Playback rate (0.25-4.0)
    #[arg(long)]
    pub playback_rate: Option<f32>,
    /// Background noise (off|white|gaussian|custom)
    #[arg(long)]
    pub noise_kind: Option<NoiseKind>,
    /// Background noise intensity (0-1)
    #[arg(long)]
    pub noise_intensity: Option<f32>,
    /// Audio file for custom noise
    #[arg(long)]
    pub noise_file: Option<String>,
    /// Audio cache entry cap
    #[arg(long)]
    pub cache_max_entries: Option<u32>,
    /// Entries kept after eviction (below the cap)
    #[arg(long)]
    pub cache_evict_to: Option<u32>,
}
