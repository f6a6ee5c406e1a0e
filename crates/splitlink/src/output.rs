use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use splitlink_log::ClassifiedMessage;
use splitlink_session::Sink;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// One JSON line on stdout. Every line names the pane it belongs to.
#[derive(Serialize)]
#[serde(tag = "stream", rename_all = "lowercase")]
enum Event<'a> {
    Log {
        #[serde(flatten)]
        message: &'a ClassifiedMessage,
    },
    Interactive {
        text: &'a str,
    },
    Status {
        message: &'a str,
    },
    Clear {
        pane: &'a str,
    },
}

/// Terminal [`Sink`].
///
/// A streaming printer writes each record as it arrives. A batch printer
/// holds log records until [`finish`](Printer::finish), so a re-render
/// replaces what was collected and a table comes out as one table.
pub struct Printer {
    format: OutputFormat,
    batch: Option<Vec<ClassifiedMessage>>,
}

impl Printer {
    pub fn streaming(format: OutputFormat) -> Self {
        Self {
            format,
            batch: None,
        }
    }

    pub fn batch(format: OutputFormat) -> Self {
        Self {
            format,
            batch: Some(Vec::new()),
        }
    }

    /// Print everything a batch printer collected.
    pub fn finish(&mut self) {
        let Some(messages) = self.batch.take() else {
            return;
        };
        match self.format {
            OutputFormat::Table => {
                if !messages.is_empty() {
                    println!("{}", log_table(&messages));
                }
            }
            _ => {
                for message in &messages {
                    self.print_log(message);
                }
            }
        }
        self.batch = Some(Vec::new());
    }

    fn print_log(&self, message: &ClassifiedMessage) {
        match self.format {
            OutputFormat::Json => print_json(&Event::Log { message }),
            OutputFormat::Table => println!("{}", log_table(std::slice::from_ref(message))),
            OutputFormat::Pretty => println!("{}", pretty_line(message)),
            OutputFormat::Raw => print_raw(message.text.as_bytes()),
        }
    }
}

impl Sink for Printer {
    fn log(&mut self, message: &ClassifiedMessage) {
        match &mut self.batch {
            Some(pending) => pending.push(message.clone()),
            None => self.print_log(message),
        }
    }

    fn interactive(&mut self, text: &str) {
        match self.format {
            OutputFormat::Json => print_json(&Event::Interactive { text }),
            _ => print_raw(text.as_bytes()),
        }
    }

    fn error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }

    fn status(&mut self, message: &str) {
        match self.format {
            OutputFormat::Json => print_json(&Event::Status { message }),
            _ => eprintln!("{message}"),
        }
    }

    fn clear_log(&mut self) {
        if let Some(pending) = &mut self.batch {
            pending.clear();
            return;
        }
        match self.format {
            OutputFormat::Json => print_json(&Event::Clear { pane: "log" }),
            OutputFormat::Table | OutputFormat::Pretty => println!("{}", "-".repeat(40)),
            OutputFormat::Raw => {}
        }
    }

    fn clear_interactive(&mut self) {
        if self.format == OutputFormat::Json {
            print_json(&Event::Clear {
                pane: "interactive",
            });
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json(event: &Event<'_>) {
    println!(
        "{}",
        serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string())
    );
}

fn log_table(messages: &[ClassifiedMessage]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["SEQ", "CATEGORY", "MODULE", "TEXT"]);
    for message in messages {
        table.add_row(vec![
            message.sequence.to_string(),
            message.category.to_string(),
            module_name(message).to_string(),
            trim_terminator(&message.text).to_string(),
        ]);
    }
    table
}

fn pretty_line(message: &ClassifiedMessage) -> String {
    format!(
        "{:<6} {:<3} {}",
        message.category.as_str(),
        module_name(message),
        trim_terminator(&message.text)
    )
}

fn module_name(message: &ClassifiedMessage) -> &'static str {
    message.module.map_or("-", |module| module.as_str())
}

fn trim_terminator(text: &str) -> &str {
    text.trim_end_matches(['\r', '\n'])
}
