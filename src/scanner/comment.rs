use super::{Scanner, State};
use crate::error::Result;

impl Scanner<'_> {
    /// Counts the opening `#`s: one or two start a line comment, three a block.
    pub(super) fn comment_hashes(&mut self, c: u8) -> Result<()> {
        if c == b'#' {
            self.hashes += 1;
            if self.hashes == 3 {
                self.hashes = 0;
                self.state = State::CommentBlock;
            }
        } else {
            self.state = State::CommentLine;
            self.reconsume = true;
        }
        Ok(())
    }

    pub(super) fn comment_line(&mut self, c: u8) -> Result<()> {
        if c == b'\n' {
            self.state = self.comment_return;
            self.reconsume = true;
        }
        Ok(())
    }

    pub(super) fn comment_block(&mut self, c: u8) -> Result<()> {
        if c == b'#' {
            self.hashes += 1;
            if self.hashes == 3 {
                self.hashes = 0;
                self.state = self.comment_return;
            }
            return Ok(());
        }
        self.hashes = 0;
        if c == b'\n' {
            self.new_line()?;
        }
        Ok(())
    }
}
