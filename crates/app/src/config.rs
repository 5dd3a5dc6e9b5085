//! Command line parsing and output location rules

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H:%M:%S";
const CACHE_SUBDIR: &str = "sct";

/// Select a screen region with the mouse and save it as a PNG
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "sct", version, about)]
pub struct Cli {
    /// File name without extension [default: current date and time]
    #[arg(short, long)]
    pub name: Option<String>,

    /// Output directory [default: home directory]
    #[arg(short, long, value_name = "DIR")]
    pub path: Option<PathBuf>,

    /// Save the file to the output directory
    #[arg(short, long)]
    pub save: bool,

    /// Copy the image to the clipboard (needs xclip)
    #[arg(short, long)]
    pub clipboard: bool,

    /// Give up waiting for a selection after this many seconds
    #[arg(short, long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// X display to connect to [default: $DISPLAY]
    #[arg(short, long, value_name = "NAME")]
    pub display: Option<String>,
}

/// Resolved settings for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub filename: String,
    pub output_dir: PathBuf,
    pub save: bool,
    pub clipboard: bool,
    pub timeout: Option<Duration>,
    pub display: Option<String>,
}

impl Config {
    pub fn from_cli(cli: Cli) -> Result<Self> {
        Self::resolve(cli, Local::now(), dirs::home_dir(), dirs::cache_dir())
    }

    /// Apply defaults against an explicit clock and directory layout
    pub fn resolve(
        cli: Cli,
        now: DateTime<Local>,
        home: Option<PathBuf>,
        cache: Option<PathBuf>,
    ) -> Result<Self> {
        let filename = match cli.name {
            Some(name) => {
                if name.trim().is_empty() {
                    bail!("file name must not be empty");
                }
                if name.contains('/') {
                    bail!("file name {:?} must not contain '/', use --path for the directory", name);
                }
                name
            }
            None => now.format(TIMESTAMP_FORMAT).to_string(),
        };

        let keep_file = cli.save || !cli.clipboard;
        let output_dir = if keep_file {
            match cli.path {
                Some(path) => path,
                None => home.context("cannot determine home directory, pass --path")?,
            }
        } else {
            cache
                .map(|dir| dir.join(CACHE_SUBDIR))
                .context("cannot determine cache directory for clipboard image")?
        };

        let timeout = match cli.timeout {
            Some(0) => bail!("--timeout must be at least one second"),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(Self {
            filename,
            output_dir,
            save: keep_file,
            clipboard: cli.clipboard,
            timeout,
            display: cli.display,
        })
    }

    /// Full path of the PNG this session writes
    pub fn destination(&self) -> PathBuf {
        export::destination(&self.output_dir, &self.filename)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 12, 5, 7).unwrap()
    }

    fn resolve(cli: Cli) -> Result<Config> {
        Config::resolve(
            cli,
            noon(),
            Some(PathBuf::from("/home/user")),
            Some(PathBuf::from("/home/user/.cache")),
        )
    }

    #[test]
    fn defaults_to_timestamp_in_home() {
        let config = resolve(Cli::default()).unwrap();
        assert_eq!(config.filename, "2024-03-09_12:05:07");
        assert_eq!(
            config.destination(),
            PathBuf::from("/home/user/2024-03-09_12:05:07.png")
        );
        assert!(config.save);
        assert!(!config.clipboard);
        assert_eq!(config.timeout, None);
    }

    #[test]
    fn parses_all_flags() {
        let cli = Cli::try_parse_from([
            "sct", "-n", "shot", "-p", "/tmp/out", "-s", "-c", "-t", "5", "-d", ":1",
        ])
        .unwrap();
        let config = resolve(cli).unwrap();

        assert_eq!(config.destination(), PathBuf::from("/tmp/out/shot.png"));
        assert!(config.save);
        assert!(config.clipboard);
        assert_eq!(config.timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.display.as_deref(), Some(":1"));
    }

    #[test]
    fn clipboard_only_goes_to_cache() {
        let cli = Cli::try_parse_from(["sct", "--clipboard", "--name", "clip"]).unwrap();
        let config = resolve(cli).unwrap();

        assert!(!config.save);
        assert_eq!(
            config.destination(),
            PathBuf::from("/home/user/.cache/sct/clip.png")
        );
    }

    #[test]
    fn png_suffix_is_not_doubled() {
        let cli = Cli::try_parse_from(["sct", "-n", "diagram.png"]).unwrap();
        let config = resolve(cli).unwrap();
        assert_eq!(config.destination(), PathBuf::from("/home/user/diagram.png"));
    }

    #[test]
    fn missing_home_needs_explicit_path() {
        let err = Config::resolve(Cli::default(), noon(), None, None).unwrap_err();
        assert!(err.to_string().contains("--path"));

        let cli = Cli {
            path: Some(PathBuf::from("/srv")),
            ..Cli::default()
        };
        assert!(Config::resolve(cli, noon(), None, None).is_ok());
    }

    #[test]
    fn rejects_bad_names_and_zero_timeout() {
        for args in [
            vec!["sct", "-n", ""],
            vec!["sct", "-n", "a/b"],
            vec!["sct", "-t", "0"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert!(resolve(cli).is_err());
        }
    }

    #[test]
    fn non_numeric_timeout_is_a_parse_error() {
        assert!(Cli::try_parse_from(["sct", "-t", "soon"]).is_err());
    }
}
