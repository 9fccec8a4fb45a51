mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};
use goldsrc::prelude::*;
use thiserror::Error;

/// Inspect and edit texture archives, and preview how maps resolve against them.
#[derive(Debug, Clone, Parser)]
#[command(name = "wad-explorer", author, version)]
pub struct Args {
    /// Settings file.
    #[arg(long, default_value = "conf.ini", value_hint = ValueHint::FilePath)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Action {
    /// List the entries of an archive.
    Info {
        #[arg(value_hint = ValueHint::FilePath)]
        wad: PathBuf,
    },
    /// List textures whose name contains a query.
    Search {
        #[arg(value_hint = ValueHint::FilePath)]
        wad: PathBuf,
        query: String,
    },
    /// Append the textures of other archives, skipping names already present.
    Merge {
        #[arg(value_hint = ValueHint::FilePath)]
        wad: PathBuf,
        #[arg(required = true, value_hint = ValueHint::FilePath)]
        others: Vec<PathBuf>,
        /// Defaults to overwriting the first archive.
        #[arg(long, short, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    /// Rename one texture.
    Rename {
        #[arg(value_hint = ValueHint::FilePath)]
        wad: PathBuf,
        old: String,
        new: String,
        #[arg(long, short, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    /// Remove one texture.
    Remove {
        #[arg(value_hint = ValueHint::FilePath)]
        wad: PathBuf,
        name: String,
        #[arg(long, short, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
    },
    /// Decode a texture and describe its colours.
    Palette {
        #[arg(value_hint = ValueHint::FilePath)]
        wad: PathBuf,
        name: String,
    },
    /// Build a map against the archive it names and summarise the result.
    Map {
        /// Directory holding the map and its archives.
        #[arg(value_hint = ValueHint::DirPath)]
        dir: PathBuf,
        map: String,
    },
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Format(#[from] FormatError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("no texture named `{0}`")]
    NoTexture(String),
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    log::debug!("{args:?}");

    let settings = Settings::load_or_default(&args.config);

    if let Err(e) = commands::run(args.action, settings) {
        log::error!("{e}");
        std::process::exit(1);
    }
}
