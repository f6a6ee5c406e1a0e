use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Args, Subcommand, ValueEnum};
use splitlink_frame::{DemuxConfig, TerminatorMode};
use splitlink_log::{Category, FilterState, Module, DEFAULT_PREFIX};
use splitlink_session::SessionConfig;
use splitlink_transport::LinkConfig;

use crate::exit::{CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod classify;
pub mod monitor;
pub mod replay;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Connect to a device and stream its logs; read commands from stdin.
    Monitor(MonitorArgs),
    /// Print a saved log transcript through the current filters.
    Replay(ReplayArgs),
    /// Send one command and print what comes back.
    Send(SendArgs),
    /// Show the category and module of each line.
    Classify(ClassifyArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, console: &ConsoleArgs, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Monitor(args) => monitor::run(args, console, format),
        Command::Replay(args) => replay::run(args, console, format),
        Command::Send(args) => send::run(args, console, format),
        Command::Classify(args) => classify::run(args, format),
        Command::Version(args) => version::run(args, format),
    }
}

#[derive(Copy, Clone, Debug, Default, ValueEnum)]
pub enum TerminatorArg {
    /// CR arms the line terminator until the next LF.
    #[default]
    Lenient,
    /// LF must directly follow CR.
    Strict,
}

impl From<TerminatorArg> for TerminatorMode {
    fn from(arg: TerminatorArg) -> Self {
        match arg {
            TerminatorArg::Lenient => TerminatorMode::Lenient,
            TerminatorArg::Strict => TerminatorMode::Strict,
        }
    }
}

/// Link, filter and transcript settings shared by every subcommand.
#[derive(Args, Debug)]
pub struct ConsoleArgs {
    /// Hide a log category (repeatable or comma-separated).
    #[arg(long, value_name = "CATEGORY", value_delimiter = ',', global = true)]
    pub hide: Vec<Category>,

    /// Show only these modules; untagged records are always shown.
    #[arg(long, value_name = "MODULE", value_delimiter = ',', global = true)]
    pub modules: Option<Vec<Module>>,

    /// Interactive line terminator matching.
    #[arg(
        long,
        value_name = "MODE",
        default_value = "lenient",
        env = "SPLITLINK_TERMINATOR",
        global = true
    )]
    pub terminator: TerminatorArg,

    /// Serial baud rate.
    #[arg(long, default_value_t = 115_200, env = "SPLITLINK_BAUD", global = true)]
    pub baud: u32,

    /// Disable RTS/CTS and DSR/DTR handshaking.
    #[arg(long, env = "SPLITLINK_NO_FLOW_CONTROL", global = true)]
    pub no_flow_control: bool,

    /// Directory for saved transcripts.
    #[arg(
        long,
        value_name = "DIR",
        default_value = ".",
        env = "SPLITLINK_SAVE_DIR",
        global = true
    )]
    pub save_dir: PathBuf,

    /// File name prefix for saved transcripts.
    #[arg(
        long,
        value_name = "PREFIX",
        default_value = DEFAULT_PREFIX,
        env = "SPLITLINK_SAVE_PREFIX",
        global = true
    )]
    pub save_prefix: String,
}

impl ConsoleArgs {
    pub fn link_config(&self) -> LinkConfig {
        LinkConfig {
            baud_rate: self.baud,
            hardware_flow_control: !self.no_flow_control,
            dsr_dtr: !self.no_flow_control,
            ..LinkConfig::default()
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            demux: DemuxConfig {
                terminator: self.terminator.into(),
                ..DemuxConfig::default()
            },
            transcript_dir: self.save_dir.clone(),
            transcript_prefix: self.save_prefix.clone(),
            ..SessionConfig::default()
        }
    }

    pub fn filter(&self) -> FilterState {
        let mut filter = FilterState::default();
        for category in &self.hide {
            filter.set_category(*category, false);
        }
        if let Some(modules) = &self.modules {
            filter.set_all_modules(false);
            for module in modules {
                filter.set_module(*module, true);
            }
        }
        filter
    }
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial device or Unix socket path.
    pub port: PathBuf,
}

#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Transcript file written by `:save`.
    pub file: PathBuf,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Serial device or Unix socket path.
    pub port: PathBuf,
    /// Command line to send (CR LF is appended).
    pub command: String,
    /// How long to capture output after sending (e.g. 2s, 500ms).
    #[arg(long, default_value = "1s")]
    pub listen: String,
}

#[derive(Args, Debug)]
pub struct ClassifyArgs {
    /// Lines to classify. Reads stdin when none are given.
    pub text: Vec<String>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
