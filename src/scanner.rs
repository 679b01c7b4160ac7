//! Byte-at-a-time lexical scanner.
//!
//! The scanner is an explicit state machine: `step` looks at one byte in the
//! current [`State`] and may emit any number of [`LexEvent`]s into a queue,
//! switch state, or ask for the same byte to be scanned again in the new state
//! (`reconsume`). Begin events are pushed on an open-event stack so every end
//! event is checked against its beginning.
//!
//! Grammar notes:
//! - literals follow JSON, except that `1e5` (exponent without a decimal point)
//!   is rejected;
//! - `#` starts a line comment, `###` opens a block closed by the next `###`;
//! - `//` and `/* */` open annotations whose content is a rule object and/or
//!   free text;
//! - `@Name` and `@A | @B` are type shortcuts in value position, `@Name` is a
//!   key shortcut in key position.
mod annotation;
mod comment;
mod literal;
mod state;

use std::collections::VecDeque;

use crate::error::{ErrorKind, Result, SchemaError};
use crate::lexeme::{LexEvent, LexKind};

pub use state::State;

/// Nesting context deciding what a closing byte or the end of a value means.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Object,
    Array,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnnotationMode {
    #[default]
    None,
    Inline,
    MultiLine,
}

pub struct Scanner<'a> {
    src: &'a [u8],
    pos: usize,
    state: State,
    context: Vec<Context>,
    annotation: AnnotationMode,
    /// A `//` text comment nested in a multi-line annotation is open.
    nested_comment: bool,

    // return points for diversions
    slash_return: State,
    annotation_return: State,
    nested_return: State,
    comment_return: State,

    open: Vec<LexEvent>,
    queue: VecDeque<LexEvent>,
    reconsume: bool,

    name_end: usize,
    text_end: usize,
    hashes: u8,
    root_seen: bool,
    finished: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(src: &'a [u8]) -> Self {
        Self {
            src,
            pos: 0,
            state: State::BeginValue,
            context: Vec::new(),
            annotation: AnnotationMode::None,
            nested_comment: false,
            slash_return: State::BeginValue,
            annotation_return: State::BeginValue,
            nested_return: State::BeginValue,
            comment_return: State::BeginValue,
            open: Vec::new(),
            queue: VecDeque::new(),
            reconsume: false,
            name_end: 0,
            text_end: 0,
            hashes: 0,
            root_seen: false,
            finished: false,
        }
    }

    fn scan_byte(&mut self) -> Result<()> {
        let c = self.src[self.pos];
        loop {
            self.reconsume = false;
            self.step(c)?;
            if !self.reconsume {
                break;
            }
        }
        self.pos += 1;
        Ok(())
    }

    fn step(&mut self, c: u8) -> Result<()> {
        match self.state {
            State::BeginValue => {
                if !self.skip_space(c, false)? {
                    self.begin_value(c)?;
                }
                Ok(())
            }
            State::ObjectKeyOrEnd => self.object_key_or_end(c),
            State::ObjectKey => self.object_key(c),
            State::BareKey => self.bare_key(c),
            State::KeyShortcutName { first } => self.key_shortcut_name(c, first),
            State::AfterKey => self.after_key(c),
            State::ObjectValue => self.object_value(c),
            State::AfterObjectValue => self.after_object_value(c),
            State::ArrayItemOrEnd => self.array_item_or_end(c),
            State::ArrayItem => self.array_item(c),
            State::AfterArrayItem => self.after_array_item(c),
            State::String { key } => self.string(c, key),
            State::StringEscape { key } => self.string_escape(c, key),
            State::StringUnicode { key, left } => self.string_unicode(c, key, left),
            State::NumberMinus => self.number_minus(c),
            State::NumberZero => self.number_zero(c),
            State::NumberInt => self.number_int(c),
            State::NumberDot => self.number_dot(c),
            State::NumberFrac => self.number_frac(c),
            State::NumberExp => self.number_exp(c),
            State::NumberExpSign => self.number_exp_sign(c),
            State::NumberExpDigits => self.number_exp_digits(c),
            State::Keyword { rest } => self.keyword(c, rest),
            State::ShortcutName { first } => self.shortcut_name(c, first),
            State::ShortcutAfterName => self.shortcut_after_name(c),
            State::ShortcutPipe => self.shortcut_pipe(c),
            State::AfterTop => {
                if !self.skip_space(c, true)? {
                    return Err(self.unexpected(c, None));
                }
                Ok(())
            }
            State::CommentHashes => self.comment_hashes(c),
            State::CommentLine => self.comment_line(c),
            State::CommentBlock => self.comment_block(c),
            State::Slash => self.slash(c),
            State::AnnotationStart => self.annotation_start(c),
            State::AnnotationText => self.annotation_text(c),
            State::AnnotationTextStar => self.annotation_text_star(c),
            State::AnnotationAfterRules => self.annotation_after_rules(c),
            State::AnnotationDash => self.annotation_dash(c),
            State::AnnotationCloseStar => self.annotation_close_star(c),
            State::NestedCommentStart => self.nested_comment_start(c),
            State::NestedCommentText => self.nested_comment_text(c),
        }
    }

    /// Flushes whatever the end of input completes, then emits `EndTop`.
    fn finish(&mut self) -> Result<()> {
        let end = self.src.len();
        loop {
            match self.state {
                State::NumberZero | State::NumberInt | State::NumberFrac | State::NumberExpDigits => {
                    self.found(LexKind::LiteralEnd, end)?;
                    self.end_value(end)?;
                }
                State::ShortcutName { first: false } | State::ShortcutAfterName => self.close_shortcut()?,
                State::AnnotationText if self.annotation == AnnotationMode::Inline => {
                    self.found(LexKind::InlineAnnotationTextEnd, end)?;
                    self.close_inline()?;
                }
                State::AnnotationStart | State::AnnotationAfterRules | State::AnnotationDash
                    if self.annotation == AnnotationMode::Inline =>
                {
                    self.close_inline()?
                }
                State::CommentLine | State::CommentHashes => self.state = self.comment_return,
                _ => break,
            }
        }

        self.finished = true;
        if !self.root_seen {
            return Err(SchemaError::new(ErrorKind::EmptySchema).at(0));
        }
        if self.state == State::AfterTop && self.open.is_empty() {
            self.queue.push_back(LexEvent::new(LexKind::EndTop, end, end));
            return Ok(());
        }
        Err(SchemaError::new(ErrorKind::UnexpectedEof { context: self.state.context() }).at(end))
    }

    // ------------------------------- Events --------------------------------- //

    /// Queues an event; begin kinds open, end kinds must close the innermost
    /// open event.
    fn found(&mut self, kind: LexKind, at: usize) -> Result<()> {
        if kind.is_begin() {
            let event = LexEvent::new(kind, at, at);
            self.open.push(event);
            self.queue.push_back(event);
        } else if kind.is_end() {
            let open = self.open.pop();
            match open {
                Some(begin) if begin.kind.closing() == Some(kind) => {
                    self.queue.push_back(LexEvent::new(kind, begin.begin, at));
                }
                _ => {
                    return Err(SchemaError::new(ErrorKind::UnbalancedLexeme {
                        open: open.map(|e| e.kind),
                        close: kind,
                    })
                    .at(at));
                }
            }
        } else {
            self.queue.push_back(LexEvent::new(kind, at, at + 1));
        }
        Ok(())
    }

    /// A value just completed at `at`; the enclosing context decides what
    /// may follow.
    fn end_value(&mut self, at: usize) -> Result<()> {
        match self.context.last() {
            Some(Context::Object) => {
                self.found(LexKind::ObjectValueEnd, at)?;
                self.state = State::AfterObjectValue;
            }
            Some(Context::Array) => {
                self.found(LexKind::ArrayItemEnd, at)?;
                self.state = State::AfterArrayItem;
            }
            Some(Context::Annotation) => self.state = State::AnnotationAfterRules,
            None => self.state = State::AfterTop,
        }
        Ok(())
    }

    fn unexpected(&self, c: u8, expected: Option<&'static str>) -> SchemaError {
        SchemaError::new(ErrorKind::InvalidCharacter {
            found: char::from(c),
            context: self.state.context(),
            expected,
        })
        .at(self.pos)
    }

    // ------------------------------ Whitespace ------------------------------ //

    /// Consumes insignificant bytes. Returns `false` when `c` is significant.
    fn skip_space(&mut self, c: u8, allow_annotation: bool) -> Result<bool> {
        match c {
            b' ' | b'\t' | b'\r' => Ok(true),
            b'\n' => {
                self.new_line()?;
                Ok(true)
            }
            b'#' if self.annotation == AnnotationMode::None => {
                self.comment_return = self.state;
                self.hashes = 1;
                self.state = State::CommentHashes;
                Ok(true)
            }
            b'/' if allow_annotation && self.annotation != AnnotationMode::Inline && !self.nested_comment => {
                self.slash_return = self.state;
                self.state = State::Slash;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn new_line(&mut self) -> Result<()> {
        match self.annotation {
            AnnotationMode::None => self.found(LexKind::NewLine, self.pos),
            AnnotationMode::Inline => Err(SchemaError::new(ErrorKind::NewLineInAnnotation).at(self.pos)),
            AnnotationMode::MultiLine => Ok(()),
        }
    }

    // ------------------------------- Values --------------------------------- //

    fn begin_value(&mut self, c: u8) -> Result<()> {
        let at = self.pos;
        match c {
            b'{' => {
                self.found(LexKind::ObjectBegin, at)?;
                self.context.push(Context::Object);
                self.state = State::ObjectKeyOrEnd;
            }
            b'[' => {
                self.found(LexKind::ArrayBegin, at)?;
                self.context.push(Context::Array);
                self.state = State::ArrayItemOrEnd;
            }
            b'"' => {
                self.found(LexKind::LiteralBegin, at)?;
                self.state = State::String { key: false };
            }
            b'-' => {
                self.found(LexKind::LiteralBegin, at)?;
                self.state = State::NumberMinus;
            }
            b'0' => {
                self.found(LexKind::LiteralBegin, at)?;
                self.state = State::NumberZero;
            }
            b'1'..=b'9' => {
                self.found(LexKind::LiteralBegin, at)?;
                self.state = State::NumberInt;
            }
            b't' | b'f' | b'n' => {
                self.found(LexKind::LiteralBegin, at)?;
                let rest: &'static [u8] = match c {
                    b't' => b"rue",
                    b'f' => b"alse",
                    _ => b"ull",
                };
                self.state = State::Keyword { rest };
            }
            b'@' => {
                self.found(LexKind::TypesShortcutBegin, at)?;
                self.state = State::ShortcutName { first: true };
            }
            _ => return Err(self.unexpected(c, Some("a value"))),
        }
        self.root_seen = true;
        Ok(())
    }

    // ------------------------------- Objects -------------------------------- //

    fn object_key_or_end(&mut self, c: u8) -> Result<()> {
        if self.skip_space(c, true)? {
            return Ok(());
        }
        if c == b'}' {
            return self.close_object();
        }
        self.begin_key(c)
    }

    fn object_key(&mut self, c: u8) -> Result<()> {
        if self.skip_space(c, true)? {
            return Ok(());
        }
        self.begin_key(c)
    }

    fn begin_key(&mut self, c: u8) -> Result<()> {
        let at = self.pos;
        match c {
            b'"' => {
                self.found(LexKind::ObjectKeyBegin, at)?;
                self.state = State::String { key: true };
            }
            b'@' if self.annotation == AnnotationMode::None => {
                self.found(LexKind::ObjectKeyBegin, at)?;
                self.found(LexKind::KeyShortcutBegin, at)?;
                self.state = State::KeyShortcutName { first: true };
            }
            c if self.annotation != AnnotationMode::None && c.is_ascii_alphabetic() => {
                self.found(LexKind::ObjectKeyBegin, at)?;
                self.state = State::BareKey;
            }
            _ => return Err(self.unexpected(c, Some("an object key"))),
        }
        Ok(())
    }

    fn bare_key(&mut self, c: u8) -> Result<()> {
        if c.is_ascii_alphanumeric() || c == b'_' {
            return Ok(());
        }
        self.found(LexKind::ObjectKeyEnd, self.pos)?;
        self.state = State::AfterKey;
        self.reconsume = true;
        Ok(())
    }

    fn key_shortcut_name(&mut self, c: u8, first: bool) -> Result<()> {
        if is_name_byte(c) {
            self.state = State::KeyShortcutName { first: false };
            return Ok(());
        }
        if first {
            return Err(self.unexpected(c, Some("a type name")));
        }
        self.found(LexKind::KeyShortcutEnd, self.pos)?;
        self.found(LexKind::ObjectKeyEnd, self.pos)?;
        self.state = State::AfterKey;
        self.reconsume = true;
        Ok(())
    }

    fn after_key(&mut self, c: u8) -> Result<()> {
        if self.skip_space(c, false)? {
            return Ok(());
        }
        if c != b':' {
            return Err(self.unexpected(c, Some("':'")));
        }
        self.state = State::ObjectValue;
        Ok(())
    }

    fn object_value(&mut self, c: u8) -> Result<()> {
        if self.skip_space(c, false)? {
            return Ok(());
        }
        self.found(LexKind::ObjectValueBegin, self.pos)?;
        self.state = State::BeginValue;
        self.reconsume = true;
        Ok(())
    }

    fn after_object_value(&mut self, c: u8) -> Result<()> {
        if self.skip_space(c, true)? {
            return Ok(());
        }
        match c {
            b',' => {
                self.state = State::ObjectKey;
                Ok(())
            }
            b'}' => self.close_object(),
            _ => Err(self.unexpected(c, Some("',' or '}'"))),
        }
    }

    fn close_object(&mut self) -> Result<()> {
        let end = self.pos + 1;
        self.found(LexKind::ObjectEnd, end)?;
        self.context.pop();
        self.end_value(end)
    }

    // -------------------------------- Arrays -------------------------------- //

    fn array_item_or_end(&mut self, c: u8) -> Result<()> {
        if self.skip_space(c, true)? {
            return Ok(());
        }
        if c == b']' {
            return self.close_array();
        }
        self.begin_item()
    }

    fn array_item(&mut self, c: u8) -> Result<()> {
        if self.skip_space(c, true)? {
            return Ok(());
        }
        if c == b']' {
            return Err(self.unexpected(c, Some("an array item")));
        }
        self.begin_item()
    }

    fn begin_item(&mut self) -> Result<()> {
        self.found(LexKind::ArrayItemBegin, self.pos)?;
        self.state = State::BeginValue;
        self.reconsume = true;
        Ok(())
    }

    fn after_array_item(&mut self, c: u8) -> Result<()> {
        if self.skip_space(c, true)? {
            return Ok(());
        }
        match c {
            b',' => {
                self.state = State::ArrayItem;
                Ok(())
            }
            b']' => self.close_array(),
            _ => Err(self.unexpected(c, Some("',' or ']'"))),
        }
    }

    fn close_array(&mut self) -> Result<()> {
        let end = self.pos + 1;
        self.found(LexKind::ArrayEnd, end)?;
        self.context.pop();
        self.end_value(end)
    }

    // ------------------------------ Shortcuts ------------------------------- //

    fn shortcut_name(&mut self, c: u8, first: bool) -> Result<()> {
        if is_name_byte(c) {
            self.state = State::ShortcutName { first: false };
            self.name_end = self.pos + 1;
            return Ok(());
        }
        if first {
            return Err(self.unexpected(c, Some("a type name")));
        }
        match c {
            b' ' | b'\t' => self.state = State::ShortcutAfterName,
            b'|' => self.state = State::ShortcutPipe,
            _ => {
                self.close_shortcut()?;
                self.reconsume = true;
            }
        }
        Ok(())
    }

    fn shortcut_after_name(&mut self, c: u8) -> Result<()> {
        match c {
            b' ' | b'\t' => {}
            b'|' => self.state = State::ShortcutPipe,
            _ => {
                self.close_shortcut()?;
                self.reconsume = true;
            }
        }
        Ok(())
    }

    fn shortcut_pipe(&mut self, c: u8) -> Result<()> {
        match c {
            b' ' | b'\t' => Ok(()),
            b'@' => {
                self.state = State::ShortcutName { first: true };
                Ok(())
            }
            _ => Err(self.unexpected(c, Some("'@'"))),
        }
    }

    fn close_shortcut(&mut self) -> Result<()> {
        let end = self.name_end;
        self.found(LexKind::TypesShortcutEnd, end)?;
        self.end_value(end)
    }
}

impl Iterator for Scanner<'_> {
    type Item = Result<LexEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Some(Ok(event));
            }
            if self.finished {
                return None;
            }
            let step = if self.pos < self.src.len() { self.scan_byte() } else { self.finish() };
            if let Err(err) = step {
                self.finished = true;
                self.queue.clear();
                return Some(Err(err));
            }
        }
    }
}

/// Bytes allowed in a type name after `@`.
pub fn is_name_byte(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'_' || c == b'-'
}

/// Scans a whole buffer into events; convenience for tests and tools.
pub fn scan_all(src: &[u8]) -> Result<Vec<LexEvent>> {
    Scanner::new(src).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use LexKind::*;
    use proptest::prelude::*;

    fn kinds(src: &str) -> Result<Vec<LexKind>> {
        Ok(scan_all(src.as_bytes())?.into_iter().map(|e| e.kind).collect())
    }

    fn err_kind(src: &str) -> ErrorKind {
        kinds(src).unwrap_err().kind().clone()
    }

    #[test]
    fn scalar_root_flushes_literal_at_eof() {
        assert_eq!(kinds("123").unwrap(), vec![LiteralBegin, LiteralEnd, EndTop]);
        let events = scan_all(b"123").unwrap();
        assert_eq!((events[1].begin, events[1].end), (0, 3));
    }

    #[test]
    fn object_events_are_well_nested() {
        let got = kinds(r#"{"a": 1}"#).unwrap();
        assert_eq!(
            got,
            vec![
                ObjectBegin,
                ObjectKeyBegin,
                ObjectKeyEnd,
                ObjectValueBegin,
                LiteralBegin,
                LiteralEnd,
                ObjectValueEnd,
                ObjectEnd,
                EndTop
            ]
        );
    }

    #[test]
    fn array_items_and_newlines() {
        let got = kinds("[\n  1,\n  \"x\"\n]").unwrap();
        assert_eq!(
            got,
            vec![
                ArrayBegin,
                NewLine,
                ArrayItemBegin,
                LiteralBegin,
                LiteralEnd,
                ArrayItemEnd,
                NewLine,
                ArrayItemBegin,
                LiteralBegin,
                LiteralEnd,
                ArrayItemEnd,
                NewLine,
                ArrayEnd,
                EndTop
            ]
        );
    }

    #[test]
    fn literal_spans_cover_source_text() {
        let src = br#"{"k": "v\"x", "n": -0.5e+3}"#;
        let events = scan_all(src).unwrap();
        let literals: Vec<_> = events
            .iter()
            .filter(|e| e.kind == LiteralEnd)
            .map(|e| e.text(src).into_owned())
            .collect();
        assert_eq!(literals, vec![r#""v\"x""#.to_string(), "-0.5e+3".to_string()]);
    }

    #[test]
    fn exponent_without_decimal_point_is_rejected() {
        assert!(matches!(err_kind("1e5"), ErrorKind::InvalidCharacter { found: 'e', .. }));
        assert!(matches!(err_kind("[0E1]"), ErrorKind::InvalidCharacter { found: 'E', .. }));
        assert!(kinds("1.5e3").is_ok());
        assert!(kinds("1.0E-2").is_ok());
    }

    proptest! {
        #[test]
        fn undotted_integers_reject_exponents(
            int in "-?(0|[1-9][0-9]{0,8})",
            exp in "[eE][+-]?[0-9]{1,3}",
        ) {
            let src = format!("{int}{exp}");
            prop_assert!(kinds(&src).is_err(), "{} should fail", src);
            prop_assert!(kinds(&format!("[{src}]")).is_err(), "[{}] should fail", src);
        }

        #[test]
        fn dotted_numbers_accept_exponents(
            int in "-?(0|[1-9][0-9]{0,8})",
            frac in "[0-9]{1,6}",
            exp in "([eE][+-]?[0-9]{1,3})?",
        ) {
            let src = format!("{int}.{frac}{exp}");
            let events = scan_all(src.as_bytes());
            prop_assert!(events.is_ok(), "{} should scan: {:?}", src, events.as_ref().err());
            let events = events.unwrap_or_default();
            let literal = events.iter().find(|e| e.kind == LiteralEnd).map(|e| e.text(src.as_bytes()).into_owned());
            prop_assert_eq!(literal, Some(src.clone()));
        }
    }

    #[test]
    fn malformed_literals_are_rejected() {
        for src in ["01", "-", "1.", "tru", "nul", "\"abc", "\"\\x\"", "\"\\u12g4\"", "[1,]", "{\"a\" 1}", "{,}"] {
            assert!(kinds(src).is_err(), "{src} should fail");
        }
    }

    #[test]
    fn trailing_garbage_after_root_is_rejected() {
        assert!(matches!(err_kind("1 2"), ErrorKind::InvalidCharacter { found: '2', .. }));
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(err_kind(""), ErrorKind::EmptySchema);
        assert_eq!(err_kind("  \n # nothing"), ErrorKind::EmptySchema);
    }

    #[test]
    fn unterminated_object_reports_eof() {
        assert!(matches!(err_kind("{\"a\": 1"), ErrorKind::UnexpectedEof { .. }));
    }

    #[test]
    fn comments_are_transparent() {
        let got = kinds("# head\n{ ### block\n### \"a\": 1 # tail\n}").unwrap();
        assert_eq!(
            got,
            vec![
                NewLine,
                ObjectBegin,
                NewLine,
                ObjectKeyBegin,
                ObjectKeyEnd,
                ObjectValueBegin,
                LiteralBegin,
                LiteralEnd,
                ObjectValueEnd,
                NewLine,
                ObjectEnd,
                EndTop
            ]
        );
    }

    #[test]
    fn inline_annotation_with_rules_and_text() {
        let src = "1 // {min: 0, max: 9} - a digit";
        let events = scan_all(src.as_bytes()).unwrap();
        let got: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            got,
            vec![
                LiteralBegin,
                LiteralEnd,
                InlineAnnotationBegin,
                ObjectBegin,
                ObjectKeyBegin,
                ObjectKeyEnd,
                ObjectValueBegin,
                LiteralBegin,
                LiteralEnd,
                ObjectValueEnd,
                ObjectKeyBegin,
                ObjectKeyEnd,
                ObjectValueBegin,
                LiteralBegin,
                LiteralEnd,
                ObjectValueEnd,
                ObjectEnd,
                InlineAnnotationTextBegin,
                InlineAnnotationTextEnd,
                InlineAnnotationEnd,
                EndTop
            ]
        );
        let text = events.iter().find(|e| e.kind == InlineAnnotationTextEnd).unwrap();
        assert_eq!(text.text(src.as_bytes()), "a digit");
    }

    #[test]
    fn text_only_annotation() {
        let got = kinds("\"x\" // just a note\n").unwrap();
        assert_eq!(
            got,
            vec![
                LiteralBegin,
                LiteralEnd,
                InlineAnnotationBegin,
                InlineAnnotationTextBegin,
                InlineAnnotationTextEnd,
                InlineAnnotationEnd,
                NewLine,
                EndTop
            ]
        );
    }

    #[test]
    fn inline_rule_object_cannot_span_lines() {
        assert_eq!(err_kind("1 // {min: 0,\n max: 2}"), ErrorKind::NewLineInAnnotation);
    }

    #[test]
    fn multi_line_annotation_spans_lines_and_nests_comments() {
        let src = "\"a\" /* {enum: [\n  \"a\", // first\n  \"b\"\n]} - letters */";
        let events = scan_all(src.as_bytes()).unwrap();
        let got: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert!(got.contains(&MultiLineAnnotationBegin));
        assert!(got.contains(&InlineAnnotationTextEnd));
        assert!(!got.contains(&NewLine));
        let text = events.iter().find(|e| e.kind == MultiLineAnnotationTextEnd).unwrap();
        assert_eq!(text.text(src.as_bytes()).trim(), "letters");
        let nested = events.iter().find(|e| e.kind == InlineAnnotationTextEnd).unwrap();
        assert_eq!(nested.text(src.as_bytes()), "first");
    }

    #[test]
    fn multi_line_text_only_annotation() {
        let src = "1 /* some\n text */";
        let events = scan_all(src.as_bytes()).unwrap();
        let text = events.iter().find(|e| e.kind == MultiLineAnnotationTextEnd).unwrap();
        assert_eq!(text.text(src.as_bytes()), "some\n text ");
    }

    #[test]
    fn annotation_requires_dash_before_text() {
        assert!(matches!(err_kind("1 // {min: 0} text"), ErrorKind::InvalidCharacter { found: 't', .. }));
    }

    #[test]
    fn annotation_after_colon_is_rejected() {
        assert!(kinds("{\"a\": // {min: 1}\n 1}").is_err());
    }

    #[test]
    fn types_shortcut_union() {
        let src = r#"{"pet": @cat | @dog, "owner": @person}"#;
        let events = scan_all(src.as_bytes()).unwrap();
        let shortcuts: Vec<_> = events
            .iter()
            .filter(|e| e.kind == TypesShortcutEnd)
            .map(|e| e.text(src.as_bytes()).into_owned())
            .collect();
        assert_eq!(shortcuts, vec!["@cat | @dog".to_string(), "@person".to_string()]);
    }

    #[test]
    fn shortcut_requires_name_after_pipe() {
        assert!(matches!(err_kind("@cat | dog"), ErrorKind::InvalidCharacter { found: 'd', .. }));
        assert!(matches!(err_kind("@ cat"), ErrorKind::InvalidCharacter { found: ' ', .. }));
    }

    #[test]
    fn key_shortcut_is_wrapped_in_key_events() {
        let got = kinds(r#"{@id: 1}"#).unwrap();
        assert_eq!(&got[..4], &[ObjectBegin, ObjectKeyBegin, KeyShortcutBegin, KeyShortcutEnd]);
        assert_eq!(got[4], ObjectKeyEnd);
    }

    #[test]
    fn bare_keys_only_inside_annotations() {
        assert!(kinds("{a: 1}").is_err());
        assert!(kinds("1 // {optional: true}").is_ok());
    }
}
