use serde::Serialize;
use splitlink_frame::{EOF_BYTE, SOF};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

const UNKNOWN: &str = "unknown";

/// Build provenance and the wire conventions this binary speaks.
#[derive(Debug, Serialize)]
struct BuildInfo {
    name: &'static str,
    version: &'static str,
    target: &'static str,
    profile: &'static str,
    rustc: &'static str,
    features: Vec<&'static str>,
    links: Vec<&'static str>,
    sof: u8,
    eof: u8,
    terminator: &'static str,
}

impl BuildInfo {
    fn current() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME"),
            version: env!("CARGO_PKG_VERSION"),
            target: option_env!("SPLITLINK_BUILD_TARGET").unwrap_or(UNKNOWN),
            profile: option_env!("SPLITLINK_BUILD_PROFILE").unwrap_or(UNKNOWN),
            rustc: option_env!("SPLITLINK_RUSTC_VERSION").unwrap_or(UNKNOWN),
            features: enabled_features(),
            links: supported_links(),
            sof: SOF,
            eof: EOF_BYTE,
            terminator: "CRLF",
        }
    }

    fn print_lines(&self) {
        println!("{} {}", self.name, self.version);
        println!("target: {} ({})", self.target, self.profile);
        println!("rustc: {}", self.rustc);
        println!("features: {}", list_or_none(&self.features));
        println!("links: {}", list_or_none(&self.links));
        println!(
            "framing: sof=0x{:02x} eof=0x{:02x} terminator={}",
            self.sof, self.eof, self.terminator
        );
    }
}

fn enabled_features() -> Vec<&'static str> {
    let mut features = Vec::new();
    if cfg!(feature = "cli") {
        features.push("cli");
    }
    features
}

fn supported_links() -> Vec<&'static str> {
    if cfg!(unix) {
        vec!["tty", "unix-socket"]
    } else {
        Vec::new()
    }
}

fn list_or_none(items: &[&str]) -> String {
    if items.is_empty() {
        "none".to_string()
    } else {
        items.join(", ")
    }
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    let info = BuildInfo::current();
    if !args.extended {
        println!("{} {}", info.name, info.version);
        return Ok(SUCCESS);
    }

    match format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string(&info).unwrap_or_else(|_| "{}".to_string())
        ),
        _ => info.print_lines(),
    }
    Ok(SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_the_cli_feature() {
        assert_eq!(BuildInfo::current().features, vec!["cli"]);
    }

    #[test]
    fn json_carries_framing_bytes() {
        let value = serde_json::to_value(BuildInfo::current()).unwrap();
        assert_eq!(value["name"], "splitlink");
        assert_eq!(value["sof"], 1);
        assert_eq!(value["eof"], 4);
        assert_eq!(value["terminator"], "CRLF");
    }

    #[test]
    fn empty_lists_print_as_none() {
        assert_eq!(list_or_none(&[]), "none");
        assert_eq!(list_or_none(&["tty", "unix-socket"]), "tty, unix-socket");
    }
}
