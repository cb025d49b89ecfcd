//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Arterial tree growth viewer: topology, branch attributes, picking and rendering of step files
#[derive(Parser, Debug)]
#[command(name = "vasctree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Dataset directory (default: config `data_dir`)
    #[arg(short = 'd', long, global = true, value_hint = ValueHint::DirPath)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Which step to act on.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct StepArg {
    /// Step number (default: first step)
    #[arg(short, long)]
    pub step: Option<u32>,

    /// Read this VTK file instead of a dataset step
    #[arg(short, long, value_hint = ValueHint::FilePath, conflicts_with = "step")]
    pub file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize one step: root, branches, bifurcations, depth
    Info {
        #[command(flatten)]
        step: StepArg,
    },

    /// List branches in breadth-first order
    Branches {
        #[command(flatten)]
        step: StepArg,
        /// Only the first N branches
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Print the tree hierarchy
    Tree {
        #[command(flatten)]
        step: StepArg,
        /// Stop descending below this depth
        #[arg(long)]
        max_depth: Option<usize>,
    },

    /// Pick the branch hit by a ray
    Pick {
        #[command(flatten)]
        step: StepArg,
        /// Ray origin "x,y,z"
        #[arg(long, value_parser = parse_vec3, requires = "dir", conflicts_with = "screen", allow_hyphen_values = true)]
        origin: Option<[f64; 3]>,
        /// Ray direction "x,y,z"
        #[arg(long, value_parser = parse_vec3, requires = "origin", allow_hyphen_values = true)]
        dir: Option<[f64; 3]>,
        /// Window pixel "x,y" through the framed default camera
        #[arg(long, value_parser = parse_vec2)]
        screen: Option<[f64; 2]>,
    },

    /// List the steps found in the dataset directory
    Steps,

    /// Run the reveal animation headless and report progress
    Play {
        /// First step (default: first step)
        #[arg(short, long)]
        step: Option<u32>,
        /// Simulated seconds per tick
        #[arg(long, default_value_t = 0.1)]
        dt: f64,
        /// Stop after this many ticks
        #[arg(long, default_value_t = 10_000)]
        max_ticks: usize,
    },

    /// Render one step to SVG
    Render {
        #[command(flatten)]
        step: StepArg,
        /// Output file
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: PathBuf,
        /// Show only the first N branches
        #[arg(short = 'n', long)]
        reveal: Option<usize>,
        /// Highlight this branch
        #[arg(long)]
        select: Option<usize>,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Show config file locations
    Path,
    /// Create config file template
    Init {
        /// Create in global location (~/.config/vasctree/) instead of the dataset directory
        #[arg(short, long)]
        global: bool,
    },
}

fn parse_floats<const N: usize>(s: &str) -> Result<[f64; N], String> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != N {
        return Err(format!("expected {N} comma-separated numbers, got '{s}'"));
    }
    let mut out = [0.0; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| format!("invalid number '{part}'"))?;
    }
    Ok(out)
}

fn parse_vec3(s: &str) -> Result<[f64; 3], String> {
    parse_floats(s)
}

fn parse_vec2(s: &str) -> Result<[f64; 2], String> {
    parse_floats(s)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_three_numbers_when_parsing_vec3_then_ok() {
        assert_eq!(parse_vec3("0.5, 0, -4").unwrap(), [0.5, 0.0, -4.0]);
    }

    #[test]
    fn given_wrong_arity_when_parsing_then_error() {
        assert!(parse_vec3("1,2").is_err());
        assert!(parse_vec2("1,x").is_err());
    }

    #[test]
    fn given_pick_with_origin_only_when_parsing_then_rejected() {
        let result = Cli::try_parse_from(["vasctree", "pick", "--origin", "0,0,1"]);

        assert!(result.is_err());
    }

    #[test]
    fn given_repeated_verbose_when_parsing_then_counted() {
        let cli = Cli::try_parse_from(["vasctree", "-vv", "steps"]).unwrap();

        assert_eq!(cli.verbose, 2);
    }
}
