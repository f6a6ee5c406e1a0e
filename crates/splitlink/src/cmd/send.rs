use std::time::{Duration, Instant};

use splitlink_session::{NullSink, Session};

use crate::cmd::{ConsoleArgs, SendArgs};
use crate::exit::{session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{OutputFormat, Printer};

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn run(args: SendArgs, console: &ConsoleArgs, format: OutputFormat) -> CliResult<i32> {
    let listen = parse_duration(&args.listen)?;
    if args.command.trim().is_empty() {
        return Err(CliError::new(USAGE, "command must not be empty"));
    }

    let mut session = Session::new(console.session_config());
    session.set_filter(console.filter(), &mut NullSink);
    session
        .open(&args.port, &console.link_config())
        .map_err(|err| session_error("connect failed", err))?;

    let mut printer = Printer::streaming(format);
    session
        .send_command(&args.command, &mut printer)
        .map_err(|err| session_error("send failed", err))?;

    let deadline = Instant::now() + listen;
    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            break;
        }
        session
            .pump(&mut printer, remaining.min(POLL_INTERVAL))
            .map_err(|err| session_error("receive failed", err))?;
    }

    if session.is_connected() {
        session
            .disconnect(&mut printer)
            .map_err(|err| session_error("disconnect failed", err))?;
    }
    Ok(SUCCESS)
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn zero_listen_window_is_allowed() {
        assert_eq!(parse_duration("0s").unwrap(), Duration::ZERO);
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("bad").is_err());
        assert!(parse_duration("1.5s").is_err());
    }
}
