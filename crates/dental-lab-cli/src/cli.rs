//! Command-line interface argument parsing.

use clap::{Parser, Subcommand};
use std::fmt;
use std::path::PathBuf;

use dental_lab_core::ExportFormat;

/// Dental Lab - case records, dashboards and data export
///
/// Examples:
///   dental-lab add --patient "Sara Ali" --dentist-name "Dr. Smith" --teeth "11, 21" \
///       --prosthesis Bridge --material "Zirconia, Implant" --shade A2
///   dental-lab stats
///   dental-lab edit 3f2a... --shade B1 --notes "Rush"
///   dental-lab --dentist "Dr. Smith" export --format csv --output smith.csv
///   dental-lab import elegant-smile-data.json
///   dental-lab init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .dental-lab.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file (overrides the config file)
    #[arg(long, value_name = "FILE", env = "DENTAL_LAB_DB", global = true)]
    pub database: Option<PathBuf>,

    /// Only show one dentist's cases (stats, list and export)
    #[arg(long, value_name = "NAME", global = true)]
    pub dentist: Option<String>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Show dashboard statistics
    Stats {
        /// Print the statistics as JSON
        #[arg(long)]
        json: bool,
    },

    /// List cases, newest first
    List {
        /// Case-insensitive search on dentist or patient name
        #[arg(short = 's', long, value_name = "TEXT")]
        search: Option<String>,
    },

    /// Record a new case
    Add(AddArgs),

    /// Change fields of an existing case
    Edit(EditArgs),

    /// Delete a case by ID
    Delete {
        id: String,
    },

    /// Export cases as JSON, CSV or a text report
    Export {
        #[arg(short, long, value_enum, default_value = "json")]
        format: FormatArg,

        /// Write to this file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Replace all cases with the contents of a JSON export
    Import {
        file: PathBuf,
    },

    /// Manage doctor accounts
    Users {
        #[command(subcommand)]
        command: UsersCommand,
    },

    /// Check credentials and show what the session can see
    Login {
        /// Doctor name (omit with --owner)
        #[arg(required_unless_present = "owner")]
        name: Option<String>,

        /// Sign in as the lab owner
        #[arg(long)]
        owner: bool,

        #[arg(short, long, env = "DENTAL_LAB_PASSWORD", hide_env_values = true)]
        password: Password,
    },

    /// Suggest values for an entry form field
    Suggest(SuggestArgs),

    /// Write a default .dental-lab.toml
    InitConfig,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub patient: String,

    #[arg(long = "dentist-name")]
    pub dentist_name: String,

    /// Comma-separated FDI tooth numbers, e.g. "11, 12, 21"
    #[arg(long)]
    pub teeth: String,

    /// Comma-separated prosthesis types
    #[arg(long)]
    pub prosthesis: String,

    /// Comma-separated materials
    #[arg(long)]
    pub material: String,

    #[arg(long)]
    pub shade: String,

    #[arg(long)]
    pub notes: Option<String>,

    /// Photo as a data: URI
    #[arg(long = "photo-uri", value_name = "URI")]
    pub photo_uri: Option<String>,
}

/// Only the fields given are changed. An empty `--notes ""` or
/// `--photo-uri ""` clears that field.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct EditArgs {
    /// ID of the case to change
    pub id: String,

    #[arg(long)]
    pub patient: Option<String>,

    #[arg(long = "dentist-name")]
    pub dentist_name: Option<String>,

    /// Comma-separated FDI tooth numbers
    #[arg(long)]
    pub teeth: Option<String>,

    #[arg(long)]
    pub prosthesis: Option<String>,

    #[arg(long)]
    pub material: Option<String>,

    #[arg(long)]
    pub shade: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    #[arg(long = "photo-uri", value_name = "URI")]
    pub photo_uri: Option<String>,
}

/// A password argument. Never shows its value in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Password {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum UsersCommand {
    /// Register a doctor
    Add {
        name: String,

        #[arg(short, long, env = "DENTAL_LAB_PASSWORD", hide_env_values = true)]
        password: Password,
    },

    /// List doctor accounts
    List,

    /// Delete a doctor account by name
    Delete {
        name: String,
    },
}

#[derive(clap::Args, Debug, Clone)]
pub struct SuggestArgs {
    /// Description of the field, e.g. "Material" or "Shade"
    #[arg(long)]
    pub field: String,

    /// What has been typed so far
    #[arg(long, default_value = "")]
    pub existing: String,

    #[arg(long, default_value = "")]
    pub context: String,

    /// Print the language-model prompt instead of suggesting offline
    #[arg(long, conflicts_with = "reply")]
    pub prompt: bool,

    /// Parse suggestions from a saved model reply
    #[arg(long, value_name = "FILE")]
    pub reply: Option<PathBuf>,
}

/// Export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum FormatArg {
    /// Pretty-printed JSON (default)
    #[default]
    Json,
    Csv,
    /// Plain-text summary report
    Report,
}

impl From<FormatArg> for ExportFormat {
    fn from(format: FormatArg) -> Self {
        match format {
            FormatArg::Json => ExportFormat::Json,
            FormatArg::Csv => ExportFormat::Csv,
            FormatArg::Report => ExportFormat::Report,
        }
    }
}

impl Command {
    /// Commands that only read cases and can be narrowed to one dentist.
    pub fn accepts_dentist_scope(&self) -> bool {
        matches!(
            self,
            Command::Stats { .. } | Command::List { .. } | Command::Export { .. }
        )
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }
        if let Some(ref dentist) = self.dentist {
            if dentist.trim().is_empty() {
                return Err("--dentist cannot be empty".to_string());
            }
            if !self.command.accepts_dentist_scope() {
                return Err(
                    "--dentist only applies to stats, list and export; this command acts on every case"
                        .to_string(),
                );
            }
        }
        Ok(())
    }

    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::WARN
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("dental-lab").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_export_defaults() {
        let args = parse(&["export"]);
        match args.command {
            Command::Export { format, output } => {
                assert_eq!(format, FormatArg::Json);
                assert!(output.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = parse(&["export", "--format", "report", "--dentist", "Dr. Smith", "-v"]);
        assert_eq!(args.dentist.as_deref(), Some("Dr. Smith"));
        assert!(args.verbose);
        assert_eq!(
            ExportFormat::from(match args.command {
                Command::Export { format, .. } => format,
                _ => FormatArg::Json,
            }),
            ExportFormat::Report
        );
    }

    #[test]
    fn test_add_arguments() {
        let args = parse(&[
            "add",
            "--patient",
            "Sara Ali",
            "--dentist-name",
            "Dr. Smith",
            "--teeth",
            "11, 21",
            "--prosthesis",
            "Bridge",
            "--material",
            "Zirconia",
            "--shade",
            "A2",
        ]);
        match args.command {
            Command::Add(add) => {
                assert_eq!(add.teeth, "11, 21");
                assert!(add.notes.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_login_requires_name_unless_owner() {
        assert!(Args::try_parse_from(["dental-lab", "login", "-p", "secret1"]).is_err());
        let args = parse(&["login", "--owner", "-p", "secret1"]);
        assert!(matches!(args.command, Command::Login { owner: true, .. }));
    }

    #[test]
    fn test_edit_arguments() {
        let args = parse(&["edit", "case-1", "--shade", "B1", "--notes", ""]);
        match args.command {
            Command::Edit(edit) => {
                assert_eq!(edit.id, "case-1");
                assert_eq!(edit.shade.as_deref(), Some("B1"));
                assert_eq!(edit.notes.as_deref(), Some(""));
                assert!(edit.patient.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_password_hidden_from_debug() {
        let args = parse(&["-v", "login", "Dr. A", "--password", "hunter22"]);
        let shown = format!("{:?}", args);
        assert!(!shown.contains("hunter22"));
        assert!(shown.contains("<redacted>"));

        let args = parse(&["users", "add", "Dr. B", "-p", "hunter22"]);
        assert!(!format!("{:?}", args).contains("hunter22"));
        match args.command {
            Command::Users {
                command: UsersCommand::Add { password, .. },
            } => assert_eq!(password.expose(), "hunter22"),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_dentist_scope_rejected_for_lab_wide_commands() {
        for argv in [
            &["--dentist", "Dr. A", "import", "a.json"][..],
            &["--dentist", "Dr. A", "delete", "case-1"][..],
            &["--dentist", "Dr. A", "edit", "case-1", "--shade", "B1"][..],
            &["--dentist", "Dr. A", "users", "list"][..],
        ] {
            assert!(parse(argv).validate().is_err(), "accepted {:?}", argv);
        }

        for argv in [
            &["--dentist", "Dr. A", "stats"][..],
            &["--dentist", "Dr. A", "list"][..],
            &["export", "--dentist", "Dr. A", "--format", "csv"][..],
        ] {
            assert!(parse(argv).validate().is_ok(), "rejected {:?}", argv);
        }
    }

    #[test]
    fn test_validation_conflicting_options() {
        let args = parse(&["stats", "-v", "-q"]);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = parse(&["stats"]);
        assert_eq!(args.log_level(), tracing::Level::WARN);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
