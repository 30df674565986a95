mod table;

use std::io::{IsTerminal, Write};
use termcolor::WriteColor;

pub use table::Table;

pub struct StyledStr {
    messages: Vec<(Option<Style>, String)>,
}

impl StyledStr {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    pub fn push_str(&mut self, style: Option<Style>, msg: String) {
        if !msg.is_empty() {
            self.messages.push((style, msg));
        }
    }

    pub fn print_err(&self) -> std::io::Result<()> {
        // colors only make sense on a terminal; piped output stays plain
        let choice = if std::io::stderr().is_terminal() {
            termcolor::ColorChoice::Auto
        } else {
            termcolor::ColorChoice::Never
        };
        let bufwtr = termcolor::BufferWriter::stderr(choice);
        let mut buffer = bufwtr.buffer();

        for (style, message) in &self.messages {
            let mut color = termcolor::ColorSpec::new();
            match style {
                Some(Style::Success) => {
                    color.set_fg(Some(termcolor::Color::Green));
                }
                Some(Style::Error) => {
                    color.set_fg(Some(termcolor::Color::Red));
                    color.set_bold(true);
                }
                None => {}
            }

            buffer.set_color(&color)?;
            write!(buffer, "{message}")?;
            buffer.reset()?;
        }

        writeln!(buffer)?;
        bufwtr.print(&buffer)?;

        Ok(())
    }
}

pub enum Style {
    Success,
    Error,
}
