use std::io::BufRead;

use splitlink_log::MessageStore;
use splitlink_session::Sink;

use crate::cmd::ClassifyArgs;
use crate::exit::{io_error, CliResult, SUCCESS};
use crate::output::{OutputFormat, Printer};

pub fn run(args: ClassifyArgs, format: OutputFormat) -> CliResult<i32> {
    let lines = if args.text.is_empty() {
        read_stdin_lines()?
    } else {
        args.text
    };

    let mut store = MessageStore::new();
    let mut printer = Printer::batch(format);
    for line in lines.iter().filter(|line| !line.trim().is_empty()) {
        printer.log(store.append(line.as_str()));
    }
    printer.finish();

    Ok(SUCCESS)
}

fn read_stdin_lines() -> CliResult<Vec<String>> {
    std::io::stdin()
        .lock()
        .lines()
        .collect::<Result<_, _>>()
        .map_err(|err| io_error("failed reading stdin", err))
}
