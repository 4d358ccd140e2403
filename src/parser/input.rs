//! The character source stack.
//!
//! Input is a stack of reader frames: the document or external subset at
//! the bottom, entity replacement text and transient restore buffers
//! above. A frame owns its reader, a refillable character buffer, its own
//! line/column counters (reset to 1,1 when the frame is created) and the
//! two flags that control how quotes and markup characters read from it
//! are interpreted. Suspension and resumption are strictly nested: a push
//! snapshots nothing because frames are self-contained, and a pop simply
//! resumes the frame underneath.

use super::DtdParser;
use crate::error::Result;

/// Refill granularity for a frame's character buffer.
pub(crate) const BUF_SIZE: usize = 8096;

/// A character reader over decoded text. Byte inputs are decoded before
/// a frame is built, so every frame reads characters.
pub(crate) struct CharReader {
    chars: std::vec::IntoIter<char>,
}

impl CharReader {
    fn new(text: &str) -> Self {
        CharReader {
            chars: text.chars().collect::<Vec<_>>().into_iter(),
        }
    }

    /// Refill `buffer` with up to `max` characters; 0 means drained.
    fn read(&mut self, buffer: &mut Vec<char>, max: usize) -> usize {
        buffer.clear();
        buffer.extend(self.chars.by_ref().take(max));
        buffer.len()
    }
}

pub(crate) struct ReaderFrame {
    reader: CharReader,
    buffer: Vec<char>,
    pos: usize,
    pub(crate) line: u32,
    pub(crate) column: u32,
    pub(crate) system_id: Option<String>,
    pub(crate) public_id: Option<String>,
    /// Quotes read from this frame do not close the surrounding literal.
    pub(crate) ignore_quote: bool,
    /// Markup characters read from this frame are data, not delimiters.
    pub(crate) ignore_markup: bool,
}

impl ReaderFrame {
    pub(crate) fn new(text: &str, system_id: Option<String>, public_id: Option<String>) -> Self {
        ReaderFrame {
            reader: CharReader::new(text),
            buffer: Vec::new(),
            pos: 0,
            line: 1,
            column: 1,
            system_id,
            public_id,
            ignore_quote: false,
            ignore_markup: false,
        }
    }
}

impl DtdParser {
    pub(crate) fn input(&self) -> &ReaderFrame {
        self.input_tab.last().expect("no active input frame")
    }

    pub(crate) fn input_mut(&mut self) -> &mut ReaderFrame {
        self.input_tab.last_mut().expect("no active input frame")
    }

    /// The next buffered character. On buffer exhaustion the frame refills
    /// from its reader; a drained reader pops the frame and reading
    /// continues in the one underneath. Running off the bottom of the
    /// stack is the end-of-input error. A zero-length refill pops
    /// immediately, so entities with empty replacement text expand to
    /// nothing without looping.
    pub(crate) fn get_char(&mut self) -> Result<char> {
        loop {
            let frame = self.input_tab.last_mut().expect("no active input frame");
            let ReaderFrame {
                reader,
                buffer,
                pos,
                ..
            } = frame;
            if *pos < buffer.len() {
                let c = buffer[*pos];
                *pos += 1;
                return Ok(c);
            }
            if reader.read(buffer, BUF_SIZE) > 0 {
                *pos = 0;
                continue;
            }
            self.pop_reader()?;
        }
    }

    /// Un-read the character just returned by [`get_char`](Self::get_char).
    ///
    /// Never called twice in succession; the position could run off the
    /// front of the buffer otherwise.
    pub(crate) fn restore(&mut self) {
        let frame = self.input_mut();
        debug_assert!(frame.pos > 0, "restore called twice in succession");
        frame.pos -= 1;
    }

    /// Un-read a string by replaying it through a transient frame. The
    /// text replays in the context of the current frame, so it inherits
    /// the frame's identifiers and flags.
    pub(crate) fn restore_str(&mut self, s: &str) {
        let (ignore_quote, ignore_markup) = {
            let frame = self.input();
            (frame.ignore_quote, frame.ignore_markup)
        };
        self.push_string_frame(s, ignore_quote, ignore_markup);
    }

    /// Push a frame over in-memory text, carrying the current frame's
    /// identifiers so relative system IDs keep resolving against the
    /// including resource.
    pub(crate) fn push_string_frame(&mut self, text: &str, ignore_quote: bool, ignore_markup: bool) {
        let (system_id, public_id) = {
            let frame = self.input();
            (frame.system_id.clone(), frame.public_id.clone())
        };
        let mut frame = ReaderFrame::new(text, system_id, public_id);
        frame.ignore_quote = ignore_quote;
        frame.ignore_markup = ignore_markup;
        self.input_tab.push(frame);
    }

    pub(crate) fn pop_reader(&mut self) -> Result<()> {
        if self.input_tab.len() <= 1 {
            return Err(self.eof_error());
        }
        if let Some(frame) = self.input_tab.pop() {
            tracing::trace!(system_id = ?frame.system_id, "input frame drained");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::io::InputSource;
    use crate::parser::DtdParser;

    fn parser_over(text: &str) -> DtdParser {
        let mut parser = DtdParser::new();
        parser.init(None);
        parser
            .open_input_source(InputSource::from_str(text))
            .unwrap();
        parser
    }

    #[test]
    fn reads_and_restores_single_characters() {
        let mut parser = parser_over("ab");
        assert_eq!(parser.get_char().unwrap(), 'a');
        parser.restore();
        assert_eq!(parser.get_char().unwrap(), 'a');
        assert_eq!(parser.get_char().unwrap(), 'b');
        assert!(parser.get_char().unwrap_err().is_eof());
    }

    #[test]
    fn string_restore_replays_before_the_current_frame() {
        let mut parser = parser_over("def");
        assert_eq!(parser.get_char().unwrap(), 'd');
        parser.restore_str("abc");
        for expected in ['a', 'b', 'c', 'e', 'f'] {
            assert_eq!(parser.get_char().unwrap(), expected);
        }
    }

    #[test]
    fn empty_frames_pop_without_looping() {
        let mut parser = parser_over("xy");
        assert_eq!(parser.get_char().unwrap(), 'x');
        parser.push_string_frame("", false, false);
        assert_eq!(parser.get_char().unwrap(), 'y');
    }

    #[test]
    fn nested_frames_resume_exactly() {
        let mut parser = parser_over("ad");
        assert_eq!(parser.get_char().unwrap(), 'a');
        parser.push_string_frame("b", false, false);
        parser.push_string_frame("c", true, true);
        assert!(parser.input().ignore_quote);
        assert_eq!(parser.get_char().unwrap(), 'c');
        assert_eq!(parser.get_char().unwrap(), 'b');
        assert!(!parser.input().ignore_quote);
        assert_eq!(parser.get_char().unwrap(), 'd');
    }

    #[test]
    fn line_and_column_track_the_expanded_stream() {
        let mut parser = parser_over("a\nb");
        parser.next_char().unwrap();
        assert_eq!((parser.input().line, parser.input().column), (1, 2));
        parser.next_char().unwrap();
        assert_eq!((parser.input().line, parser.input().column), (2, 1));
        parser.next_char().unwrap();
        assert_eq!((parser.input().line, parser.input().column), (2, 2));
    }
}
