//! Styled output with a plain-text log mirror.
//!
//! The renderer only produces [`Span`]s. A [`TerminalSink`] decides how a
//! [`SpanStyle`] looks on screen; [`Output`] forwards every span to the sink
//! and its bare text to the log.

use std::io::{self, Write};

use console::Style;

/// Background colour of a bar, cycled per row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BarColor {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
}

impl BarColor {
    pub const PALETTE: [BarColor; 6] = [
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Blue,
        Self::Magenta,
        Self::Cyan,
    ];

    /// Colour of the `n`-th bar cell in a row (zero based).
    pub fn nth(n: usize) -> Self {
        Self::PALETTE[n % Self::PALETTE.len()]
    }
}

/// Highlight applied to a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpanStyle {
    Bar(BarColor),
    Status,
}

/// A run of text with an optional highlight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Option<SpanStyle>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: None,
        }
    }

    pub fn styled(text: impl Into<String>, style: SpanStyle) -> Self {
        Self {
            text: text.into(),
            style: Some(style),
        }
    }
}

/// Destination for styled text.
pub trait TerminalSink {
    fn write_spans(&mut self, spans: &[Span]) -> io::Result<()>;

    fn flush(&mut self) -> io::Result<()>;
}

/// ANSI terminal backed by any writer.
pub struct AnsiTerminal<W: Write> {
    out: W,
    colors: bool,
}

impl<W: Write> AnsiTerminal<W> {
    pub fn new(out: W, colors: bool) -> Self {
        Self { out, colors }
    }

    fn style_for(&self, style: SpanStyle) -> Style {
        let base = Style::new().force_styling(self.colors);
        match style {
            SpanStyle::Bar(color) => match color {
                BarColor::Red => base.on_red(),
                BarColor::Green => base.on_green(),
                BarColor::Yellow => base.on_yellow(),
                BarColor::Blue => base.on_blue(),
                BarColor::Magenta => base.on_magenta(),
                BarColor::Cyan => base.on_cyan(),
            },
            SpanStyle::Status => base.bold().yellow(),
        }
    }
}

impl AnsiTerminal<io::Stdout> {
    pub fn stdout(colors: bool) -> Self {
        Self::new(io::stdout(), colors)
    }
}

impl<W: Write> TerminalSink for AnsiTerminal<W> {
    fn write_spans(&mut self, spans: &[Span]) -> io::Result<()> {
        for span in spans {
            match span.style {
                // Styling a trailing newline would bleed the colour to the
                // end of the line on some terminals.
                Some(style) if self.colors && !span.text.is_empty() => {
                    let (body, tail) = split_trailing_newlines(&span.text);
                    write!(self.out, "{}", self.style_for(style).apply_to(body))?;
                    self.out.write_all(tail.as_bytes())?;
                }
                _ => self.out.write_all(span.text.as_bytes())?,
            }
        }
        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

fn split_trailing_newlines(text: &str) -> (&str, &str) {
    let body = text.trim_end_matches('\n');
    (body, &text[body.len()..])
}

/// Terminal sink plus plain log mirror.
pub struct Output {
    term: Box<dyn TerminalSink>,
    log: Box<dyn Write>,
}

impl Output {
    pub fn new(term: Box<dyn TerminalSink>, log: Box<dyn Write>) -> Self {
        Self { term, log }
    }

    /// Write spans to the terminal and their text to the log.
    pub fn spans(&mut self, spans: &[Span]) -> io::Result<()> {
        self.term.write_spans(spans)?;
        for span in spans {
            self.log.write_all(span.text.as_bytes())?;
        }
        Ok(())
    }

    pub fn println(&mut self, text: &str) -> io::Result<()> {
        self.spans(&[Span::plain(format!("{text}\n"))])
    }

    /// Write to the log only (query echo, comments).
    pub fn log_line(&mut self, text: &str) -> io::Result<()> {
        writeln!(self.log, "{text}")
    }

    pub fn flush(&mut self) -> io::Result<()> {
        let term = self.term.flush();
        let log = self.log.flush();
        term.and(log)
    }
}
