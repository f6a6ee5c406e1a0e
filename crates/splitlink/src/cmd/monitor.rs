use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, TryRecvError};
use splitlink_log::{Category, Module};
use splitlink_session::{NullSink, Session, SessionError, Sink};
use splitlink_transport::LinkConfig;
use tracing::{debug, info};

use crate::cmd::{install_ctrlc_handler, ConsoleArgs, MonitorArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{OutputFormat, Printer};

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A console directive typed on stdin. Any other line is sent to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive {
    Save,
    FilterCategory(Category),
    FilterModule(Module),
    Modules(bool),
    Load(PathBuf),
    Close,
    Connect,
    Disconnect,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Input {
    Command(String),
    Directive(Directive),
}

impl Input {
    fn parse(line: &str) -> Result<Self, String> {
        let trimmed = line.trim();
        let Some(directive) = trimmed.strip_prefix(':') else {
            return Ok(Self::Command(trimmed.to_string()));
        };

        let (name, arg) = match directive.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (directive, ""),
        };
        let directive = match (name, arg) {
            ("save", "") => Directive::Save,
            ("filter", target) if !target.is_empty() => parse_filter_target(target)?,
            ("modules", "all") => Directive::Modules(true),
            ("modules", "none") => Directive::Modules(false),
            ("load", path) if !path.is_empty() => Directive::Load(PathBuf::from(path)),
            ("close", "") => Directive::Close,
            ("connect", "") => Directive::Connect,
            ("disconnect", "") => Directive::Disconnect,
            ("quit" | "q", "") => Directive::Quit,
            _ => return Err(format!("unknown directive '{trimmed}'")),
        };
        Ok(Self::Directive(directive))
    }
}

fn parse_filter_target(target: &str) -> Result<Directive, String> {
    if let Ok(category) = target.parse::<Category>() {
        return Ok(Directive::FilterCategory(category));
    }
    target
        .parse::<Module>()
        .map(Directive::FilterModule)
        .map_err(|_| format!("'{target}' is neither a category nor a module"))
}

enum Flow {
    Continue,
    Quit,
}

pub fn run(args: MonitorArgs, console: &ConsoleArgs, format: OutputFormat) -> CliResult<i32> {
    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let link = console.link_config();
    let mut session = Session::new(console.session_config());
    session.set_filter(console.filter(), &mut NullSink);
    session
        .open(&args.port, &link)
        .map_err(|err| session_error("connect failed", err))?;

    let mut printer = Printer::streaming(format);
    printer.status(&format!("Connected to {}", args.port.display()));

    let input = spawn_stdin_reader();
    let mut stdin_open = true;

    while running.load(Ordering::SeqCst) {
        let line = if session.is_connected() {
            if let Err(err) = session.pump(&mut printer, POLL_INTERVAL) {
                printer.error(&err.to_string());
            }
            match input.try_recv() {
                Ok(line) => Some(line),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => {
                    stdin_open = false;
                    None
                }
            }
        } else if stdin_open {
            match input.recv_timeout(POLL_INTERVAL) {
                Ok(line) => Some(line),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => {
                    stdin_open = false;
                    None
                }
            }
        } else {
            debug!("stdin closed with no live link; exiting");
            break;
        };

        let Some(line) = line else {
            continue;
        };
        match handle_line(&mut session, &mut printer, &line, &args.port, &link) {
            Flow::Continue => {}
            Flow::Quit => break,
        }
    }

    if session.is_connected() {
        session
            .disconnect(&mut printer)
            .map_err(|err| session_error("disconnect failed", err))?;
    }
    Ok(SUCCESS)
}

fn handle_line(
    session: &mut Session,
    sink: &mut dyn Sink,
    line: &str,
    port: &Path,
    link: &LinkConfig,
) -> Flow {
    let input = match Input::parse(line) {
        Ok(input) => input,
        Err(message) => {
            sink.error(&message);
            return Flow::Continue;
        }
    };
    let directive = match input {
        Input::Command(command) => {
            let outcome = session.send_command(&command, sink).map(|_| ());
            report(sink, outcome);
            return Flow::Continue;
        }
        Input::Directive(Directive::Quit) => return Flow::Quit,
        Input::Directive(directive) => directive,
    };
    let outcome = apply_directive(session, sink, directive, port, link);
    report(sink, outcome);
    Flow::Continue
}

fn apply_directive(
    session: &mut Session,
    sink: &mut dyn Sink,
    directive: Directive,
    port: &Path,
    link: &LinkConfig,
) -> Result<(), SessionError> {
    match directive {
        Directive::Save => {
            let saved = session.save()?;
            sink.status(&format!(
                "Saved {} and {}",
                saved.log_path.display(),
                saved.interactive_path.display()
            ));
        }
        Directive::FilterCategory(category) => {
            let enabled = session.toggle_category(category, sink);
            info!(%category, enabled, "category filter toggled");
        }
        Directive::FilterModule(module) => {
            let enabled = session.toggle_module(module, sink);
            info!(%module, enabled, "module filter toggled");
        }
        Directive::Modules(enabled) => session.set_all_modules(enabled, sink),
        Directive::Load(path) => {
            session.load_replay(&path, sink)?;
        }
        Directive::Close => session.close_replay(sink)?,
        Directive::Connect => {
            session.open(port, link)?;
            sink.status(&format!("Connected to {}", port.display()));
        }
        Directive::Disconnect => session.disconnect(sink)?,
        Directive::Quit => {}
    }
    Ok(())
}

fn report(sink: &mut dyn Sink, outcome: Result<(), SessionError>) {
    if let Err(err) = outcome {
        sink.error(&err.to_string());
    }
}

/// Forward stdin lines over a channel. The channel disconnects at EOF.
///
/// The thread is never joined: it may be parked in a blocking read when the
/// monitor exits.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let spawned = thread::Builder::new()
        .name("splitlink-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(err) = spawned {
        debug!(error = %err, "stdin reader unavailable; input disabled");
    }
    rx
}

#[cfg(all(test, unix))]
mod tests {
    use std::io::Read;
    use std::os::unix::net::UnixStream;

    use splitlink_log::ClassifiedMessage;
    use splitlink_session::{Mode, SessionConfig};
    use splitlink_transport::LinkStream;

    use super::*;

    #[derive(Default)]
    struct Recorder {
        log: Vec<String>,
        errors: Vec<String>,
        statuses: Vec<String>,
    }

    impl Sink for Recorder {
        fn log(&mut self, message: &ClassifiedMessage) {
            self.log.push(message.text.clone());
        }

        fn interactive(&mut self, _text: &str) {}

        fn error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }

        fn status(&mut self, message: &str) {
            self.statuses.push(message.to_string());
        }

        fn clear_log(&mut self) {
            self.log.clear();
        }
    }

    fn connected() -> (Session, UnixStream) {
        let (host, device) = UnixStream::pair().unwrap();
        host.set_read_timeout(Some(Duration::from_millis(10))).unwrap();
        let mut session = Session::new(SessionConfig::default());
        session
            .connect_link(LinkStream::from_unix(host), "pair")
            .unwrap();
        (session, device)
    }

    fn directive(line: &str) -> Directive {
        match Input::parse(line).unwrap() {
            Input::Directive(directive) => directive,
            Input::Command(command) => panic!("parsed as command: {command}"),
        }
    }

    #[test]
    fn plain_lines_are_commands() {
        assert_eq!(
            Input::parse("  ot state  ").unwrap(),
            Input::Command("ot state".to_string())
        );
    }

    #[test]
    fn parses_directives() {
        assert_eq!(directive(":save"), Directive::Save);
        assert_eq!(
            directive(":filter warn"),
            Directive::FilterCategory(Category::Warn)
        );
        assert_eq!(
            directive(":filter [DL]"),
            Directive::FilterModule(Module::Dl)
        );
        assert_eq!(directive(":modules none"), Directive::Modules(false));
        assert_eq!(
            directive(":load logs/capture.txt"),
            Directive::Load(PathBuf::from("logs/capture.txt"))
        );
        assert_eq!(directive(":q"), Directive::Quit);
    }

    #[test]
    fn rejects_unknown_directives() {
        assert!(Input::parse(":filter loud").is_err());
        assert!(Input::parse(":modules some").is_err());
        assert!(Input::parse(":load").is_err());
        assert!(Input::parse(":reboot").is_err());
    }

    #[test]
    fn directive_errors_are_reported_not_fatal() {
        let mut session = Session::new(SessionConfig::default());
        let mut sink = Recorder::default();
        let flow = handle_line(
            &mut session,
            &mut sink,
            ":close",
            &PathBuf::from("/dev/null"),
            &LinkConfig::default(),
        );
        assert!(matches!(flow, Flow::Continue));
        assert_eq!(sink.errors, vec!["not in replay mode"]);
    }

    #[test]
    fn load_and_filter_directives_drive_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.txt");
        std::fs::write(&path, "[info] [ZCL] a\n[warn] b\n").unwrap();

        let (mut session, _device) = connected();
        let mut sink = Recorder::default();
        let port = PathBuf::from("/dev/null");
        let link = LinkConfig::default();

        let load = format!(":load {}", path.display());
        handle_line(&mut session, &mut sink, &load, &port, &link);
        assert_eq!(session.mode(), Mode::Replay);
        assert_eq!(session.replay_path(), Some(path.as_path()));
        assert_eq!(sink.log.len(), 2);

        handle_line(&mut session, &mut sink, ":filter zcl", &port, &link);
        assert_eq!(sink.log, vec!["[warn] b\n"]);

        handle_line(&mut session, &mut sink, "help", &port, &link);
        assert_eq!(sink.errors.len(), 1);
        assert!(sink.errors[0].contains("replay"));
    }

    #[test]
    fn filter_directives_report_what_is_shown() {
        let mut session = Session::new(SessionConfig::default());
        let mut sink = Recorder::default();
        let port = PathBuf::from("/dev/null");
        let link = LinkConfig::default();

        handle_line(&mut session, &mut sink, ":filter info", &port, &link);
        handle_line(&mut session, &mut sink, ":modules none", &port, &link);
        handle_line(&mut session, &mut sink, ":filter ot", &port, &link);
        handle_line(&mut session, &mut sink, ":modules all", &port, &link);

        assert!(sink.errors.is_empty());
        assert_eq!(
            sink.statuses,
            vec![
                "Active filters: error, warn, detail, silabs",
                "All module filters disabled - untagged logs only",
                "Active module filters: Open Thread",
                "All module filters enabled",
            ]
        );
    }

    #[test]
    fn commands_reach_the_device() {
        let (mut session, mut device) = connected();
        device
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        let mut sink = Recorder::default();

        handle_line(
            &mut session,
            &mut sink,
            "version",
            &PathBuf::from("/dev/null"),
            &LinkConfig::default(),
        );

        let mut wire = [0u8; 9];
        device.read_exact(&mut wire).unwrap();
        assert_eq!(&wire, b"version\r\n");
        assert!(sink.errors.is_empty());
    }
}
