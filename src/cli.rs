//! CLI command definitions using clap.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// gridwire - session-aware REST grids
#[derive(Parser, Debug)]
#[command(name = "gridwire")]
#[command(version)]
#[command(about = "Fetch REST resources and plan virtualized grid views over them")]
#[command(
    long_about = "gridwire sends tenant-scoped, token-renewing requests to a REST backend, keeps per-view list state, and computes which rows or cards a grid should render."
)]
pub struct Cli {
    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send a GET request and print the JSON body
    Get {
        /// Absolute URL or path relative to the base URL
        target: String,
    },

    /// Load a list view and print its render plan
    View(ViewArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct ViewArgs {
    /// List endpoint, absolute or relative to the base URL
    pub target: String,

    /// Column filter as field=value (repeatable)
    #[arg(short, long = "filter", value_name = "FIELD=VALUE")]
    pub filters: Vec<String>,

    /// Sort as field or field:desc (repeatable, in priority order)
    #[arg(short, long = "sort", value_name = "FIELD[:DIR]")]
    pub sort: Vec<String>,

    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,

    /// 0-based page index
    #[arg(short, long)]
    pub page: Option<u64>,

    /// Rows per page
    #[arg(long)]
    pub page_size: Option<u64>,

    /// Display mode (table or card)
    #[arg(short, long)]
    pub mode: Option<String>,

    /// Vertical scroll offset in pixels
    #[arg(long, default_value_t = 0.0)]
    pub scroll_top: f64,

    /// Viewport height in pixels
    #[arg(long)]
    pub viewport_height: Option<f64>,

    /// Viewport width in pixels
    #[arg(long)]
    pub viewport_width: Option<f64>,

    /// Send the endpoint unchanged, without list parameters
    #[arg(long, default_value_t = false)]
    pub no_filter: bool,
}
