//! Command-line argument definitions for the clickgraph CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Arguments control input/output paths, the simulated
//! container size, simulated clicks, configuration file selection, and
//! logging verbosity.

use std::{fmt, str::FromStr};

use clap::Parser;

/// Command-line arguments for the clickgraph tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input DOT file
    #[arg(help = "Path to the input file")]
    pub input: String,

    /// Path to the output SVG file
    #[arg(short, long, default_value = "out.svg")]
    pub output: String,

    /// Width of the simulated container
    #[arg(long, default_value_t = 800.0)]
    pub width: f32,

    /// Height of the simulated container
    #[arg(long, default_value_t = 600.0)]
    pub height: f32,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Click to simulate after rendering, as `X,Y` in container coordinates (repeatable)
    #[arg(long = "click", value_name = "X,Y")]
    pub clicks: Vec<ClickPoint>,

    /// Node information table (TOML) driving a declaration viewer
    #[arg(long)]
    pub info: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,
}

/// A click position given on the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClickPoint {
    pub x: f32,
    pub y: f32,
}

impl FromStr for ClickPoint {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (x, y) = s
            .split_once(',')
            .ok_or_else(|| format!("expected `X,Y`, found `{s}`"))?;
        let coordinate = |value: &str| {
            value
                .trim()
                .parse::<f32>()
                .map_err(|err| format!("invalid coordinate `{}`: {err}", value.trim()))
        };
        Ok(Self {
            x: coordinate(x)?,
            y: coordinate(y)?,
        })
    }
}

impl fmt::Display for ClickPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}
