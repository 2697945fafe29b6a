use crate::build::Direction;
use crate::rotation::Rotation;
use crate::session::DEFAULT_OUTPUT;
use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pdfbuild")]
#[command(about = "Assemble a new PDF from pages of existing PDFs and images")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server with an interactive build session
    Mcp,

    /// List the PDFs and images in a folder
    Scan {
        /// Folder to browse
        folder: PathBuf,
    },

    /// Show page count and page geometry of a PDF or image
    Pages {
        /// Source file to inspect
        path: PathBuf,
    },

    /// Print the pages a range selects
    Resolve {
        /// Page ranges (e.g., "All", "1,3-5")
        range: String,

        #[command(flatten)]
        target: ResolveTarget,
    },

    /// Append a selection to a project's build list
    Add {
        /// Project file (JSON); created if missing
        project: PathBuf,

        /// PDF or image to take pages from
        path: PathBuf,

        /// Page ranges (e.g., "1,3-5")
        #[arg(short, long, default_value = "All")]
        range: String,

        /// Clockwise rotation in degrees
        #[arg(long, default_value = "0", value_parser = parse_rotation)]
        rotate: Rotation,
    },

    /// Show a project's build list
    List {
        /// Project file (JSON)
        project: PathBuf,
    },

    /// Move a build entry up or down
    Move {
        /// Project file (JSON)
        project: PathBuf,

        /// Entry position (1-based)
        index: usize,

        /// "up" or "down"
        direction: Direction,
    },

    /// Remove a build entry
    Remove {
        /// Project file (JSON)
        project: PathBuf,

        /// Entry position (1-based)
        index: usize,
    },

    /// Remove every build entry
    Clear {
        /// Project file (JSON)
        project: PathBuf,
    },

    /// Assemble a project's build list into one PDF
    Export {
        /// Project file (JSON)
        project: PathBuf,

        /// Output file
        #[arg(short, long, default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },
}

fn parse_rotation(s: &str) -> Result<Rotation, String> {
    let degrees: i64 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number of degrees", s))?;
    Rotation::from_degrees(degrees).map_err(|e| e.to_string())
}

#[derive(Args)]
#[group(required = true, multiple = false)]
pub struct ResolveTarget {
    /// Resolve against this many pages
    #[arg(short, long)]
    pub count: Option<usize>,

    /// Resolve against the page count of this source
    #[arg(short, long)]
    pub source: Option<PathBuf>,
}
