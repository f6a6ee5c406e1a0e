use splitlink_session::{NullSink, Session};

use crate::cmd::{ConsoleArgs, ReplayArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{OutputFormat, Printer};

pub fn run(args: ReplayArgs, console: &ConsoleArgs, format: OutputFormat) -> CliResult<i32> {
    let mut session = Session::new(console.session_config());
    session.set_filter(console.filter(), &mut NullSink);

    let mut printer = Printer::batch(format);
    session
        .load_replay(&args.file, &mut printer)
        .map_err(|err| session_error("load failed", err))?;
    printer.finish();

    Ok(SUCCESS)
}
