//! Line input that turns Ctrl-C into an ordinary cancellation.
//!
//! On a terminal, input is read as key events in raw mode, so Ctrl-C and
//! Ctrl-D arrive as keys on every platform and become `Input::Cancelled`.
//! The caller then takes the same save-and-leave path as typing `q`. Piped
//! input is read line by line and end of input also cancels.

use std::io::{self, BufRead, IsTerminal, Write};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal;

use portstudy_core::{LoadFailure, RecoveryChoice, RecoveryPrompt};

use crate::display;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Line(String),
    /// Interrupt or end of input.
    Cancelled,
}

pub trait LineSource {
    fn read_line(&mut self, prompt: &str) -> io::Result<Input>;
}

pub struct Terminal {
    interactive: bool,
}

impl Terminal {
    pub fn new() -> Self {
        Self {
            interactive: io::stdin().is_terminal(),
        }
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl LineSource for Terminal {
    fn read_line(&mut self, prompt: &str) -> io::Result<Input> {
        let mut stdout = io::stdout();
        write!(stdout, "{prompt}")?;
        stdout.flush()?;

        if self.interactive {
            read_keys(&mut stdout)
        } else {
            read_piped(&mut io::stdin().lock())
        }
    }
}

/// Read one line from a non-terminal source.
fn read_piped<R: BufRead>(reader: &mut R) -> io::Result<Input> {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        println!();
        return Ok(Input::Cancelled);
    }
    Ok(Input::Line(line.trim_end_matches(['\r', '\n']).to_string()))
}

/// Leaves raw mode when dropped, including on early returns.
struct RawMode;

impl RawMode {
    fn enable() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

fn read_keys(out: &mut impl Write) -> io::Result<Input> {
    let _raw = RawMode::enable()?;
    let mut editor = LineEditor::default();
    loop {
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match editor.feed(key) {
            Step::Echo(text) => {
                write!(out, "{text}")?;
                out.flush()?;
            }
            Step::Done(input) => {
                write!(out, "\r\n")?;
                out.flush()?;
                return Ok(input);
            }
            Step::Ignore => {}
        }
    }
}

/// What a key press does to the line being typed.
#[derive(Debug, PartialEq, Eq)]
enum Step {
    Echo(String),
    Done(Input),
    Ignore,
}

/// Minimal line editing over key events: characters, backspace, enter,
/// Ctrl-C and Ctrl-D.
#[derive(Debug, Default)]
struct LineEditor {
    buffer: String,
}

impl LineEditor {
    fn feed(&mut self, key: KeyEvent) -> Step {
        // Some platforms also report releases.
        if key.kind == KeyEventKind::Release {
            return Step::Ignore;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => Step::Done(Input::Cancelled),
            KeyCode::Char('d') if ctrl && self.buffer.is_empty() => Step::Done(Input::Cancelled),
            KeyCode::Char(_) if ctrl => Step::Ignore,
            KeyCode::Char(c) => {
                self.buffer.push(c);
                Step::Echo(c.to_string())
            }
            KeyCode::Backspace => match self.buffer.pop() {
                Some(_) => Step::Echo("\u{8} \u{8}".to_string()),
                None => Step::Ignore,
            },
            KeyCode::Enter => Step::Done(Input::Line(std::mem::take(&mut self.buffer))),
            _ => Step::Ignore,
        }
    }
}

/// Asks on the terminal whether to discard an unreadable save.
pub struct RecoveryQuestion<'a> {
    input: &'a mut dyn LineSource,
}

impl<'a> RecoveryQuestion<'a> {
    pub fn new(input: &'a mut dyn LineSource) -> Self {
        Self { input }
    }
}

impl RecoveryPrompt for RecoveryQuestion<'_> {
    fn choose(&mut self, failure: &LoadFailure) -> RecoveryChoice {
        display::load_failure(failure);
        loop {
            let answer = match self.input.read_line(&display::fresh_start_question()) {
                Ok(Input::Line(line)) => line,
                // Leaving without an answer must not erase anything.
                Ok(Input::Cancelled) | Err(_) => return RecoveryChoice::Abort,
            };
            match answer.trim().to_lowercase().as_str() {
                "y" => return RecoveryChoice::StartFresh,
                "n" => return RecoveryChoice::Abort,
                _ => display::error("Please enter 'y' or 'n'"),
            }
        }
    }
}

#[cfg(test)]
pub mod tests {
    use std::collections::VecDeque;
    use std::io::Read;

    use super::*;
    use portstudy_core::ErrorKind;

    /// Replays canned input, then reports end of input.
    pub struct Scripted {
        lines: VecDeque<Input>,
    }

    impl Scripted {
        pub fn new(lines: &[&str]) -> Self {
            Self {
                lines: lines.iter().map(|l| Input::Line(l.to_string())).collect(),
            }
        }

        pub fn then_cancel(mut self) -> Self {
            self.lines.push_back(Input::Cancelled);
            self
        }

        pub fn remaining(&self) -> usize {
            self.lines.len()
        }
    }

    impl LineSource for Scripted {
        fn read_line(&mut self, _prompt: &str) -> io::Result<Input> {
            Ok(self.lines.pop_front().unwrap_or(Input::Cancelled))
        }
    }

    fn failure() -> LoadFailure {
        LoadFailure {
            kind: ErrorKind::Integrity,
            message: "checksum mismatch".into(),
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    #[test]
    fn test_editor_builds_line_with_backspace() {
        let mut editor = LineEditor::default();
        assert_eq!(editor.feed(key(KeyCode::Char('2'))), Step::Echo("2".into()));
        assert_eq!(editor.feed(key(KeyCode::Char('x'))), Step::Echo("x".into()));
        assert_eq!(
            editor.feed(key(KeyCode::Backspace)),
            Step::Echo("\u{8} \u{8}".into())
        );
        assert_eq!(editor.feed(key(KeyCode::Char('2'))), Step::Echo("2".into()));
        assert_eq!(
            editor.feed(key(KeyCode::Enter)),
            Step::Done(Input::Line("22".into()))
        );
        // The buffer starts over for the next line.
        assert_eq!(
            editor.feed(key(KeyCode::Enter)),
            Step::Done(Input::Line(String::new()))
        );
        assert_eq!(editor.feed(key(KeyCode::Backspace)), Step::Ignore);
    }

    #[test]
    fn test_editor_ctrl_c_cancels() {
        let mut editor = LineEditor::default();
        editor.feed(key(KeyCode::Char('4')));
        assert_eq!(editor.feed(ctrl('c')), Step::Done(Input::Cancelled));
    }

    #[test]
    fn test_editor_ctrl_d_cancels_only_empty_line() {
        let mut editor = LineEditor::default();
        editor.feed(key(KeyCode::Char('1')));
        assert_eq!(editor.feed(ctrl('d')), Step::Ignore);
        editor.feed(key(KeyCode::Backspace));
        assert_eq!(editor.feed(ctrl('d')), Step::Done(Input::Cancelled));
    }

    #[test]
    fn test_editor_ignores_releases_and_other_keys() {
        let mut editor = LineEditor::default();
        let mut release = key(KeyCode::Char('y'));
        release.kind = KeyEventKind::Release;
        assert_eq!(editor.feed(release), Step::Ignore);
        assert_eq!(editor.feed(key(KeyCode::Up)), Step::Ignore);
        assert_eq!(editor.feed(ctrl('l')), Step::Ignore);
        assert_eq!(
            editor.feed(key(KeyCode::Enter)),
            Step::Done(Input::Line(String::new()))
        );
    }

    #[test]
    fn test_piped_lines_then_end_of_input() {
        let mut reader = io::Cursor::new("1\r\n  q \nlast");
        assert_eq!(read_piped(&mut reader).unwrap(), Input::Line("1".into()));
        assert_eq!(read_piped(&mut reader).unwrap(), Input::Line("  q ".into()));
        assert_eq!(read_piped(&mut reader).unwrap(), Input::Line("last".into()));
        assert_eq!(read_piped(&mut reader).unwrap(), Input::Cancelled);
    }

    /// Fails its first read with `Interrupted`, then serves `data`.
    struct Flaky {
        interrupted: bool,
        data: io::Cursor<&'static [u8]>,
    }

    impl io::Read for Flaky {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::ErrorKind::Interrupted.into());
            }
            self.data.read(buf)
        }
    }

    #[test]
    fn test_piped_read_retries_interrupted_reads() {
        let mut reader = io::BufReader::new(Flaky {
            interrupted: false,
            data: io::Cursor::new(&b"3\n"[..]),
        });
        assert_eq!(read_piped(&mut reader).unwrap(), Input::Line("3".into()));
        assert_eq!(read_piped(&mut reader).unwrap(), Input::Cancelled);
    }

    #[test]
    fn test_piped_read_surfaces_other_errors() {
        struct Broken;
        impl io::Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::ErrorKind::BrokenPipe.into())
            }
        }
        let err = read_piped(&mut io::BufReader::new(Broken)).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[test]
    fn test_recovery_reprompts_until_yes_or_no() {
        let mut input = Scripted::new(&["maybe", "", "Y"]);
        let choice = RecoveryQuestion::new(&mut input).choose(&failure());
        assert_eq!(choice, RecoveryChoice::StartFresh);
        assert_eq!(input.remaining(), 0);

        let mut input = Scripted::new(&["n"]);
        assert_eq!(
            RecoveryQuestion::new(&mut input).choose(&failure()),
            RecoveryChoice::Abort
        );
    }

    #[test]
    fn test_recovery_cancel_aborts() {
        let mut input = Scripted::new(&[]).then_cancel();
        assert_eq!(
            RecoveryQuestion::new(&mut input).choose(&failure()),
            RecoveryChoice::Abort
        );
    }
}
