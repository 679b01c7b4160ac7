//! Annotation states: `// ...` up to the end of line and `/* ... */`.
//!
//! An annotation holds an optional rule object followed by optional text. The
//! text follows a `-` when rules are present. Inside a multi-line annotation a
//! `//` starts a text-only comment running to the end of that line.

use super::{AnnotationMode, Context, Scanner, State};
use crate::error::Result;
use crate::lexeme::LexKind;

impl Scanner<'_> {
    pub(super) fn slash(&mut self, c: u8) -> Result<()> {
        let begin = self.pos - 1;
        match (c, self.annotation) {
            (b'/', AnnotationMode::None) => {
                self.found(LexKind::InlineAnnotationBegin, begin)?;
                self.open_annotation(AnnotationMode::Inline);
            }
            (b'/', _) => {
                self.found(LexKind::InlineAnnotationBegin, begin)?;
                self.nested_comment = true;
                self.nested_return = self.slash_return;
                self.state = State::NestedCommentStart;
            }
            (b'*', AnnotationMode::None) => {
                self.found(LexKind::MultiLineAnnotationBegin, begin)?;
                self.open_annotation(AnnotationMode::MultiLine);
            }
            _ => return Err(self.unexpected(c, Some("'/' or '*'"))),
        }
        Ok(())
    }

    fn open_annotation(&mut self, mode: AnnotationMode) {
        self.annotation = mode;
        self.annotation_return = self.slash_return;
        self.context.push(Context::Annotation);
        self.state = State::AnnotationStart;
    }

    pub(super) fn annotation_start(&mut self, c: u8) -> Result<()> {
        match (c, self.annotation) {
            (b' ' | b'\t' | b'\r', _) | (b'\n', AnnotationMode::MultiLine) => {}
            (b'\n', _) => {
                self.close_inline()?;
                self.reconsume = true;
            }
            (b'{', _) => {
                self.found(LexKind::ObjectBegin, self.pos)?;
                self.context.push(Context::Object);
                self.state = State::ObjectKeyOrEnd;
            }
            _ => self.begin_text(c)?,
        }
        Ok(())
    }

    fn begin_text(&mut self, c: u8) -> Result<()> {
        if self.annotation == AnnotationMode::MultiLine {
            self.found(LexKind::MultiLineAnnotationTextBegin, self.pos)?;
            if c == b'*' {
                self.text_end = self.pos;
                self.state = State::AnnotationTextStar;
                return Ok(());
            }
        } else {
            self.found(LexKind::InlineAnnotationTextBegin, self.pos)?;
        }
        self.state = State::AnnotationText;
        self.reconsume = true;
        Ok(())
    }

    pub(super) fn annotation_text(&mut self, c: u8) -> Result<()> {
        match (c, self.annotation) {
            (b'\n', AnnotationMode::Inline) => {
                self.found(LexKind::InlineAnnotationTextEnd, self.pos)?;
                self.close_inline()?;
                self.reconsume = true;
            }
            (b'*', AnnotationMode::MultiLine) => {
                self.text_end = self.pos;
                self.state = State::AnnotationTextStar;
            }
            _ => {}
        }
        Ok(())
    }

    pub(super) fn annotation_text_star(&mut self, c: u8) -> Result<()> {
        match c {
            b'/' => {
                self.found(LexKind::MultiLineAnnotationTextEnd, self.text_end)?;
                self.close_multi_line()?;
            }
            b'*' => self.text_end = self.pos,
            _ => self.state = State::AnnotationText,
        }
        Ok(())
    }

    pub(super) fn annotation_after_rules(&mut self, c: u8) -> Result<()> {
        match (c, self.annotation) {
            (b' ' | b'\t' | b'\r', _) | (b'\n', AnnotationMode::MultiLine) => {}
            (b'-', _) => self.state = State::AnnotationDash,
            (b'\n', _) => {
                self.close_inline()?;
                self.reconsume = true;
            }
            (b'*', AnnotationMode::MultiLine) => self.state = State::AnnotationCloseStar,
            _ => return Err(self.unexpected(c, Some("'-' before the annotation text"))),
        }
        Ok(())
    }

    pub(super) fn annotation_dash(&mut self, c: u8) -> Result<()> {
        match c {
            b' ' | b'\t' => Ok(()),
            _ => self.begin_text(c),
        }
    }

    pub(super) fn annotation_close_star(&mut self, c: u8) -> Result<()> {
        if c != b'/' {
            return Err(self.unexpected(c, Some("'/'")));
        }
        self.close_multi_line()
    }

    pub(super) fn nested_comment_start(&mut self, c: u8) -> Result<()> {
        match c {
            b' ' | b'\t' => {}
            _ => {
                self.found(LexKind::InlineAnnotationTextBegin, self.pos)?;
                self.state = State::NestedCommentText;
                self.reconsume = true;
            }
        }
        Ok(())
    }

    pub(super) fn nested_comment_text(&mut self, c: u8) -> Result<()> {
        if c == b'\n' {
            self.found(LexKind::InlineAnnotationTextEnd, self.pos)?;
            self.found(LexKind::InlineAnnotationEnd, self.pos)?;
            self.nested_comment = false;
            self.state = self.nested_return;
            self.reconsume = true;
        }
        Ok(())
    }

    pub(super) fn close_inline(&mut self) -> Result<()> {
        self.found(LexKind::InlineAnnotationEnd, self.pos)?;
        self.leave_annotation();
        Ok(())
    }

    fn close_multi_line(&mut self) -> Result<()> {
        self.found(LexKind::MultiLineAnnotationEnd, self.pos + 1)?;
        self.leave_annotation();
        Ok(())
    }

    fn leave_annotation(&mut self) {
        self.context.pop();
        self.annotation = AnnotationMode::None;
        self.state = self.annotation_return;
    }
}
