//! Command-line interface for ustar

use clap::Parser;
use std::fmt;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ustar")]
#[command(about = "Pack files and directories into a USTAR archive, or unpack one", long_about = None)]
pub struct Cli {
    /// Mode letters: exactly one of `c` (create) or `x` (extract),
    /// plus optional `v` (echo paths) and `l` (dump headers)
    #[arg(value_parser = Mode::parse)]
    pub mode: Mode,

    /// Archive file to create or extract
    pub archive: PathBuf,

    /// Files or directories to pack (create mode)
    pub inputs: Vec<String>,

    /// TOML configuration file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Resolve inputs (create) or place entries (extract) relative to DIR
    #[arg(short = 'C', long = "directory", value_name = "DIR", default_value = ".")]
    pub directory: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Create,
    Extract,
}

/// Parsed mode string
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mode {
    pub action: Action,
    pub verbose: bool,
    pub log_headers: bool,
}

impl Mode {
    pub fn parse(letters: &str) -> Result<Self, ModeError> {
        let mut action = None;
        let mut verbose = false;
        let mut log_headers = false;

        for letter in letters.chars() {
            match letter {
                'c' | 'x' => {
                    let next = if letter == 'c' { Action::Create } else { Action::Extract };
                    if action.replace(next).is_some() {
                        return Err(ModeError::ConflictingActions);
                    }
                }
                'v' => verbose = true,
                'l' => log_headers = true,
                other => return Err(ModeError::UnknownLetter(other)),
            }
        }

        let action = action.ok_or(ModeError::MissingAction)?;
        Ok(Self {
            action,
            verbose,
            log_headers,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeError {
    MissingAction,
    ConflictingActions,
    UnknownLetter(char),
}

impl fmt::Display for ModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModeError::MissingAction => write!(f, "mode needs one of 'c' or 'x'"),
            ModeError::ConflictingActions => write!(f, "mode takes only one of 'c' or 'x'"),
            ModeError::UnknownLetter(c) => write!(f, "unknown mode letter '{}'", c),
        }
    }
}

impl std::error::Error for ModeError {}
