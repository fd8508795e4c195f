//! Interactive line editor.
//!
//! Reads one byte at a time from a terminal that has already been switched to
//! raw mode (see [`crate::terminal`]) and does its own echoing. Editing happens
//! only at the end of the line: typing appends, Backspace removes the last
//! character, Tab completes the last word and Enter finishes the line.
//!
//! The editor is generic over its input and output so it can be driven from
//! memory in tests.

use crate::completer::{self, Completion};
use std::io::{self, Read, Write};
use std::path::Path;

const BS: u8 = 0x08;
const DEL: u8 = 0x7f;
const ESC: u8 = 0x1b;
const EOT: u8 = 0x04;

/// How a call to [`LineEditor::read_line`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// A finished line, without its terminator.
    Line(String),
    /// Ctrl-C arrived while typing; the partial line was thrown away.
    Interrupted,
    /// No more input. The session should end.
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Enter,
    Backspace,
    Tab,
    EndOfTransmission,
    Escape,
    Control,
    Text(u8),
}

impl From<u8> for Key {
    fn from(byte: u8) -> Self {
        match byte {
            b'\r' | b'\n' => Key::Enter,
            DEL | BS => Key::Backspace,
            b'\t' => Key::Tab,
            EOT => Key::EndOfTransmission,
            ESC => Key::Escape,
            0..=0x1f => Key::Control,
            b => Key::Text(b),
        }
    }
}

/// The line being edited. The cursor is always at the end.
#[derive(Debug, Default)]
struct LineBuffer {
    bytes: Vec<u8>,
}

impl LineBuffer {
    fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn push(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    fn push_str(&mut self, s: &str) {
        self.bytes.extend_from_slice(s.as_bytes());
    }

    /// Remove the last character, which may span several UTF-8 bytes.
    fn pop_char(&mut self) -> bool {
        while let Some(byte) = self.bytes.pop() {
            if byte & 0xc0 != 0x80 {
                return true;
            }
        }
        false
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }

    fn into_string(self) -> String {
        match String::from_utf8(self.bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        }
    }
}

enum State {
    Collecting,
    Done(ReadOutcome),
}

/// Reads single lines with echo, backspace and Tab completion.
pub struct LineEditor<'a> {
    prompt: &'a str,
    cwd: &'a Path,
    completion_limit: usize,
}

impl<'a> LineEditor<'a> {
    /// `prompt` is only used to redraw the line after listing completions;
    /// printing it before reading is up to the caller.
    pub fn new(prompt: &'a str, cwd: &'a Path) -> Self {
        Self {
            prompt,
            cwd,
            completion_limit: completer::DEFAULT_MATCH_LIMIT,
        }
    }

    pub fn completion_limit(mut self, limit: usize) -> Self {
        self.completion_limit = limit;
        self
    }

    /// Read and edit one line.
    pub fn read_line<R: Read, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> io::Result<ReadOutcome> {
        let mut line = LineBuffer::default();
        loop {
            let byte = match read_byte(input) {
                Ok(Some(byte)) => byte,
                Ok(None) if line.is_empty() => return Ok(ReadOutcome::Eof),
                Ok(None) => {
                    output.write_all(b"\n")?;
                    output.flush()?;
                    return Ok(ReadOutcome::Line(line.into_string()));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                    output.write_all(b"\n")?;
                    output.flush()?;
                    return Ok(ReadOutcome::Interrupted);
                }
                Err(e) => return Err(e),
            };

            if let State::Done(outcome) = self.on_key(Key::from(byte), &mut line, input, output)? {
                output.flush()?;
                return Ok(outcome);
            }
            output.flush()?;
        }
    }

    fn on_key<R: Read, W: Write>(
        &self,
        key: Key,
        line: &mut LineBuffer,
        input: &mut R,
        output: &mut W,
    ) -> io::Result<State> {
        match key {
            Key::Enter => {
                output.write_all(b"\n")?;
                return Ok(State::Done(ReadOutcome::Line(std::mem::take(line).into_string())));
            }
            Key::EndOfTransmission if line.is_empty() => {
                output.write_all(b"\n")?;
                return Ok(State::Done(ReadOutcome::Eof));
            }
            Key::Backspace => {
                if line.pop_char() {
                    output.write_all(b"\x08 \x08")?;
                }
            }
            Key::Tab => self.complete(line, output)?,
            Key::Escape => skip_escape_sequence(input)?,
            Key::Text(byte) => {
                line.push(byte);
                output.write_all(&[byte])?;
            }
            Key::EndOfTransmission | Key::Control => {}
        }
        Ok(State::Collecting)
    }

    fn complete<W: Write>(&self, line: &mut LineBuffer, output: &mut W) -> io::Result<()> {
        let text = line.text();
        match completer::complete(self.cwd, &text, self.completion_limit) {
            Completion::NoMatch => {}
            Completion::Unique(rest) => {
                line.push_str(&rest);
                output.write_all(rest.as_bytes())?;
            }
            Completion::Ambiguous(names) => {
                write!(output, "\n{}\n{}{}", names.join("\t"), self.prompt, text)?;
            }
        }
        Ok(())
    }
}

fn read_byte<R: Read>(input: &mut R) -> io::Result<Option<u8>> {
    let mut byte = [0u8; 1];
    match input.read(&mut byte)? {
        0 => Ok(None),
        _ => Ok(Some(byte[0])),
    }
}

/// Drop the rest of a terminal escape sequence such as an arrow key (`ESC [ A`).
fn skip_escape_sequence<R: Read>(input: &mut R) -> io::Result<()> {
    match read_byte(input)? {
        Some(b'[') | Some(b'O') => {}
        _ => return Ok(()),
    }
    while let Some(byte) = read_byte(input)? {
        if (0x40..=0x7e).contains(&byte) {
            break;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Cursor;

    fn run(input: &[u8], cwd: &Path) -> (ReadOutcome, String) {
        let editor = LineEditor::new("utsh$ ", cwd);
        let mut out = Vec::new();
        let outcome = editor
            .read_line(&mut Cursor::new(input.to_vec()), &mut out)
            .unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    fn line(s: &str) -> ReadOutcome {
        ReadOutcome::Line(s.to_string())
    }

    #[test]
    fn test_plain_line_is_echoed() {
        let (outcome, out) = run(b"ls -l\n", Path::new("."));
        assert_eq!(outcome, line("ls -l"));
        assert_eq!(out, "ls -l\n");
    }

    #[test]
    fn test_carriage_return_terminates() {
        let (outcome, _) = run(b"pwd\rignored", Path::new("."));
        assert_eq!(outcome, line("pwd"));
    }

    #[test]
    fn test_backspace_erases_last_char() {
        let (outcome, out) = run(b"lsx\x7f\n", Path::new("."));
        assert_eq!(outcome, line("ls"));
        assert_eq!(out, "lsx\x08 \x08\n");

        let (outcome, out) = run(b"\x08\x08a\n", Path::new("."));
        assert_eq!(outcome, line("a"));
        assert_eq!(out, "a\n");
    }

    #[test]
    fn test_backspace_removes_whole_utf8_char() {
        let (outcome, _) = run("aé\x7f\n".as_bytes(), Path::new("."));
        assert_eq!(outcome, line("a"));
    }

    #[test]
    fn test_tab_completes_unique_match() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("foo.txt")).unwrap();
        File::create(dir.path().join("foobar.txt")).unwrap();

        let (outcome, out) = run(b"cat foo.\t\n", dir.path());
        assert_eq!(outcome, line("cat foo.txt"));
        assert_eq!(out, "cat foo.txt\n");
    }

    #[test]
    fn test_tab_lists_ambiguous_matches_and_redraws() {
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("foo.txt")).unwrap();
        File::create(dir.path().join("foobar.txt")).unwrap();

        let (outcome, out) = run(b"cat fo\t\n", dir.path());
        assert_eq!(outcome, line("cat fo"));
        assert_eq!(out, "cat fo\nfoo.txt\tfoobar.txt\nutsh$ cat fo\n");
    }

    #[test]
    fn test_tab_without_match_changes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (outcome, out) = run(b"cat zz\t\n", dir.path());
        assert_eq!(outcome, line("cat zz"));
        assert_eq!(out, "cat zz\n");
    }

    #[test]
    fn test_end_of_input() {
        assert_eq!(run(b"", Path::new(".")).0, ReadOutcome::Eof);
        assert_eq!(run(b"\x04", Path::new(".")).0, ReadOutcome::Eof);
        // Ctrl-D only ends the session on an empty line
        assert_eq!(run(b"ab\x04c\n", Path::new(".")).0, line("abc"));
        // input ending mid-line still yields what was typed
        assert_eq!(run(b"echo", Path::new(".")).0, line("echo"));
    }

    #[test]
    fn test_escape_sequences_are_swallowed() {
        let (outcome, out) = run(b"l\x1b[As\x1bOB\n", Path::new("."));
        assert_eq!(outcome, line("ls"));
        assert_eq!(out, "ls\n");
    }

    struct InterruptedReader;

    impl Read for InterruptedReader {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::from(io::ErrorKind::Interrupted))
        }
    }

    #[test]
    fn test_interrupt_cancels_line() {
        let editor = LineEditor::new("utsh$ ", Path::new("."));
        let mut out = Vec::new();
        let outcome = editor.read_line(&mut InterruptedReader, &mut out).unwrap();
        assert_eq!(outcome, ReadOutcome::Interrupted);
        assert_eq!(out, b"\n");
    }
}
