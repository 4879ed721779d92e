//! CLI argument definitions for gatewatch.
//!
//! Uses `clap` v4 derive macros. The tool is a single-purpose batch
//! analyser, so the interface is flat -- no subcommands.

use std::path::PathBuf;

use clap::Parser;

/// Gatewatch -- SSH break-in detector for syslog archives.
///
/// Streams a (gzip-compressed) syslog file through a parallel detection
/// pipeline and writes detected break-ins to `Breakins.txt` and a
/// throughput record to `ExecTime.txt` in the output directory.
#[derive(Parser, Debug)]
#[command(name = "gatewatch")]
#[command(version, about, long_about = None)]
pub struct GatewatchCli {
    /// Path to the input log file (gzip or plain text syslog).
    pub input: PathBuf,

    /// Number of consecutive failures per remote host that makes a
    /// user a suspect.
    #[arg(short = 'a', long, default_value_t = 5)]
    pub attempts: u32,

    /// Detection window in seconds, used both for the failure burst
    /// and for suspect/login matching.
    #[arg(short = 's', long, default_value_t = 60.0)]
    pub seconds: f64,

    /// Parser parallelism width.
    #[arg(short = 'p', long, default_value_t = 8)]
    pub parallelism: usize,

    /// Year to apply to syslog timestamps (the format carries none).
    #[arg(long, default_value_t = 2011)]
    pub year: i32,

    /// Directory for Breakins.txt and ExecTime.txt.
    #[arg(short = 'o', long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        GatewatchCli::command().debug_assert();
    }

    #[test]
    fn defaults_match_detection_parameters() {
        let cli = GatewatchCli::parse_from(["gatewatch", "messages.gz"]);
        assert_eq!(cli.attempts, 5);
        assert_eq!(cli.seconds, 60.0);
        assert_eq!(cli.parallelism, 8);
        assert_eq!(cli.year, 2011);
        assert_eq!(cli.output_dir, PathBuf::from("."));
    }

    #[test]
    fn overrides_are_parsed() {
        let cli = GatewatchCli::parse_from([
            "gatewatch",
            "auth.log",
            "--attempts",
            "3",
            "--seconds",
            "30",
            "-p",
            "4",
            "--year",
            "2024",
            "-o",
            "/tmp/out",
        ]);
        assert_eq!(cli.attempts, 3);
        assert_eq!(cli.seconds, 30.0);
        assert_eq!(cli.parallelism, 4);
        assert_eq!(cli.year, 2024);
        assert_eq!(cli.output_dir, PathBuf::from("/tmp/out"));
    }
}
