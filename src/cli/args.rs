//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Keep a page in sync with its server: navigate, mount and follow live updates
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: search upward for pagesync.toml)
    #[arg(short = 'C', long, global = true, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Reconcile one HTML file against another and print the result
    #[command(visible_alias = "m")]
    Morph {
        /// Markup standing in for the live page
        #[arg(value_hint = clap::ValueHint::FilePath)]
        live: PathBuf,

        /// Markup the live page should end up matching
        #[arg(value_hint = clap::ValueHint::FilePath)]
        target: PathBuf,

        /// Apply the update as a server push (pinned and protected state kept)
        #[arg(short, long)]
        push: bool,
    },

    /// Navigate to a page once and print the mounted document
    #[command(visible_alias = "o")]
    Open {
        /// Page URL (relative URLs resolve against `[site] origin`)
        #[arg(value_hint = clap::ValueHint::Url)]
        url: String,
    },

    /// Open a page and follow its live session until Ctrl+C
    #[command(visible_alias = "w")]
    Watch {
        /// Page URL (relative URLs resolve against `[site] origin`)
        #[arg(value_hint = clap::ValueHint::Url)]
        url: String,

        /// Reload the page whenever the server comes back instead of streaming
        #[arg(short, long)]
        reload: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_morph() {
        let cli = Cli::parse_from(["pagesync", "morph", "a.html", "b.html", "--push"]);
        let Commands::Morph { live, target, push } = cli.command else {
            panic!("expected morph");
        };
        assert_eq!(live, PathBuf::from("a.html"));
        assert_eq!(target, PathBuf::from("b.html"));
        assert!(push);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_parse_watch_with_globals() {
        let cli = Cli::parse_from(["pagesync", "w", "/docs", "-r", "-v", "-C", "site.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("site.toml")));
        assert!(matches!(cli.command, Commands::Watch { reload: true, .. }));
    }
}
