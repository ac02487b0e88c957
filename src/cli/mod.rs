use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod check;
mod config;
mod demo;
mod dump;
mod generate;
mod profile;

pub use profile::Profile;

/// ncgen - declarative gridded-file generator
#[derive(Parser)]
#[command(name = "ncgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Container write profile for trading speed against size.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ProfileArg {
    /// Prioritize speed over compression
    Fast,
    /// Balance between speed and compression
    #[default]
    Balanced,
    /// Maximum compression, slower writes
    MaxCompression,
}

impl From<ProfileArg> for Profile {
    fn from(arg: ProfileArg) -> Self {
        match arg {
            ProfileArg::Fast => Profile::Fast,
            ProfileArg::Balanced => Profile::Balanced,
            ProfileArg::MaxCompression => Profile::MaxCompression,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a configuration (and data) into a container file
    Generate {
        /// Configuration file (.toml or .json)
        #[arg(value_name = "CONFIG")]
        config: PathBuf,

        /// Output container path
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,

        /// JSON document with the data arrays
        #[arg(short = 'd', long, value_name = "FILE")]
        data: Option<PathBuf>,

        /// Overwrite an existing output file
        #[arg(long)]
        clobber: bool,

        /// Write profile (fast, balanced, max-compression)
        #[arg(short = 'p', long, value_enum)]
        profile: Option<ProfileArg>,

        /// Load settings from a TOML file
        #[arg(long, value_name = "FILE")]
        settings: Option<PathBuf>,

        /// Do not stamp history/date_created/date_modified
        #[arg(long)]
        no_provenance: bool,

        /// Leave variables over unlimited dimensions empty when no data is given
        #[arg(long)]
        defer_unlimited: bool,

        // === Advanced tuning flags (hidden from --help) ===
        /// Compression level for ZSTD (1-22, default: profile-dependent)
        #[arg(short = 'c', long, hide = true)]
        compression_level: Option<i32>,
    },

    /// Print the structure of a container file
    Dump {
        /// Container file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print the ncdump-style header
        #[arg(short = 'H', long = "verbose-dump")]
        verbose_dump: bool,

        /// Print the description as JSON instead
        #[arg(long)]
        json: bool,
    },

    /// Load and validate a configuration without writing anything
    Check {
        /// Configuration file (.toml or .json)
        #[arg(value_name = "CONFIG")]
        config: PathBuf,
    },

    /// Write the bundled demo files
    Demo {
        /// Output directory
        #[arg(value_name = "DIR", default_value = "ncgen_demo")]
        output: PathBuf,

        /// Write profile (fast, balanced, max-compression)
        #[arg(short = 'p', long, default_value = "balanced", value_enum)]
        profile: ProfileArg,
    },
}

impl Cli {
    pub fn verbosity(&self) -> u8 {
        self.verbose
    }
}

pub fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();
}

pub fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Generate {
            config,
            output,
            data,
            clobber,
            profile,
            settings,
            no_provenance,
            defer_unlimited,
            compression_level,
        } => generate::run(generate::GenerateArgs {
            config,
            output,
            data,
            clobber,
            profile: profile.map(Profile::from),
            settings,
            no_provenance,
            defer_unlimited,
            compression_level,
        }),
        Commands::Dump {
            file,
            verbose_dump,
            json,
        } => dump::run(file, verbose_dump, json),
        Commands::Check { config } => check::run(config),
        Commands::Demo { output, profile } => demo::run(output, Profile::from(profile)),
    }
}
