/// Console messages for the exporter.
///
/// Progress lines carry an `export: ` prefix; warnings and errors carry a
/// coloured label instead. Output from worker threads is serialized.
use lazy_static::lazy_static;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use term::color::{BRIGHT_GREEN, BRIGHT_RED, BRIGHT_YELLOW, Color};

const PREFIX: &str = "export: ";

lazy_static! {
    static ref CONSOLE: Mutex<()> = Mutex::new(());
}

/// Kind of console message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    Progress,
    Done,
    Warning,
    Error,
}

impl Tone {
    fn label(self) -> Option<(&'static str, Color)> {
        match self {
            Tone::Progress => None,
            Tone::Done => Some(("done", BRIGHT_GREEN)),
            Tone::Warning => Some(("warning", BRIGHT_YELLOW)),
            Tone::Error => Some(("error", BRIGHT_RED)),
        }
    }

    fn prefixed(self) -> bool {
        matches!(self, Tone::Progress | Tone::Done)
    }
}

/// One piece of a message and the colour it is printed in, if any
type Segment = (String, Option<Color>);

fn segments(tone: Tone, msg: &str) -> Vec<Segment> {
    let mut out = Vec::with_capacity(4);
    if tone == Tone::Error {
        out.push(("\n".to_string(), None));
    }
    if tone.prefixed() {
        out.push((PREFIX.to_string(), None));
    }
    match tone.label() {
        Some((label, color)) => {
            out.push((label.to_string(), Some(color)));
            out.push((format!(": {}\n", msg), None));
        }
        None => out.push((format!("{}\n", msg), None)),
    }
    if tone == Tone::Error {
        out.push(("\n".to_string(), None));
    }
    out
}

fn emit(tone: Tone, msg: &str) {
    let _guard = CONSOLE.lock().unwrap_or_else(PoisonError::into_inner);
    let mut terminal = term::stdout();
    for (text, color) in segments(tone, msg) {
        let coloured = match (color, terminal.as_mut()) {
            (Some(color), Some(t)) => write_bold(t.as_mut(), &text, color),
            _ => false,
        };
        if !coloured {
            print!("{}", text);
        }
    }
    let _ = std::io::stdout().flush();
}

/// Bold coloured text; false when the terminal rejects colour
fn write_bold(t: &mut term::StdoutTerminal, text: &str, color: Color) -> bool {
    if t.fg(color).is_err() {
        return false;
    }
    let _ = t.attr(term::Attr::Bold);
    let written = write!(t, "{}", text).is_ok();
    let _ = t.reset();
    written
}

pub fn status(msg: &str) {
    emit(Tone::Progress, msg);
}

/// Final success line, with a green "done"
pub fn print_done(msg: &str) {
    emit(Tone::Done, msg);
}

pub fn print_warning(msg: &str) {
    emit(Tone::Warning, msg);
}

/// Error surrounded by blank lines, with a red "error"
pub fn print_error(msg: &str) {
    emit(Tone::Error, msg);
}
