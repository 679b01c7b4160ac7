//! String, number and keyword literal states.

use super::{Scanner, State};
use crate::error::Result;
use crate::lexeme::LexKind;

impl Scanner<'_> {
    pub(super) fn string(&mut self, c: u8, key: bool) -> Result<()> {
        match c {
            b'"' => {
                let end = self.pos + 1;
                if key {
                    self.found(LexKind::ObjectKeyEnd, end)?;
                    self.state = State::AfterKey;
                    Ok(())
                } else {
                    self.found(LexKind::LiteralEnd, end)?;
                    self.end_value(end)
                }
            }
            b'\\' => {
                self.state = State::StringEscape { key };
                Ok(())
            }
            c if c < 0x20 => Err(self.unexpected(c, None)),
            _ => Ok(()),
        }
    }

    pub(super) fn string_escape(&mut self, c: u8, key: bool) -> Result<()> {
        match c {
            b'"' | b'\\' | b'/' | b'b' | b'f' | b'n' | b'r' | b't' => self.state = State::String { key },
            b'u' => self.state = State::StringUnicode { key, left: 4 },
            _ => return Err(self.unexpected(c, Some("an escape character"))),
        }
        Ok(())
    }

    pub(super) fn string_unicode(&mut self, c: u8, key: bool, left: u8) -> Result<()> {
        if !c.is_ascii_hexdigit() {
            return Err(self.unexpected(c, Some("a hexadecimal digit")));
        }
        self.state = if left == 1 { State::String { key } } else { State::StringUnicode { key, left: left - 1 } };
        Ok(())
    }

    pub(super) fn number_minus(&mut self, c: u8) -> Result<()> {
        match c {
            b'0' => self.state = State::NumberZero,
            b'1'..=b'9' => self.state = State::NumberInt,
            _ => return Err(self.unexpected(c, Some("a digit"))),
        }
        Ok(())
    }

    pub(super) fn number_zero(&mut self, c: u8) -> Result<()> {
        match c {
            b'.' => {
                self.state = State::NumberDot;
                Ok(())
            }
            b'0'..=b'9' | b'e' | b'E' => Err(self.unexpected(c, Some("'.' or the end of the number"))),
            _ => self.end_number(),
        }
    }

    pub(super) fn number_int(&mut self, c: u8) -> Result<()> {
        match c {
            b'0'..=b'9' => Ok(()),
            b'.' => {
                self.state = State::NumberDot;
                Ok(())
            }
            // an exponent needs a fractional part first
            b'e' | b'E' => Err(self.unexpected(c, Some("'.' before the exponent"))),
            _ => self.end_number(),
        }
    }

    pub(super) fn number_dot(&mut self, c: u8) -> Result<()> {
        if !c.is_ascii_digit() {
            return Err(self.unexpected(c, Some("a digit")));
        }
        self.state = State::NumberFrac;
        Ok(())
    }

    pub(super) fn number_frac(&mut self, c: u8) -> Result<()> {
        match c {
            b'0'..=b'9' => Ok(()),
            b'e' | b'E' => {
                self.state = State::NumberExp;
                Ok(())
            }
            _ => self.end_number(),
        }
    }

    pub(super) fn number_exp(&mut self, c: u8) -> Result<()> {
        match c {
            b'+' | b'-' => self.state = State::NumberExpSign,
            b'0'..=b'9' => self.state = State::NumberExpDigits,
            _ => return Err(self.unexpected(c, Some("a sign or a digit"))),
        }
        Ok(())
    }

    pub(super) fn number_exp_sign(&mut self, c: u8) -> Result<()> {
        if !c.is_ascii_digit() {
            return Err(self.unexpected(c, Some("a digit")));
        }
        self.state = State::NumberExpDigits;
        Ok(())
    }

    pub(super) fn number_exp_digits(&mut self, c: u8) -> Result<()> {
        if c.is_ascii_digit() { Ok(()) } else { self.end_number() }
    }

    /// The byte after a number is not part of it: close the literal and let
    /// the enclosing state look at the byte again.
    fn end_number(&mut self) -> Result<()> {
        self.found(LexKind::LiteralEnd, self.pos)?;
        self.end_value(self.pos)?;
        self.reconsume = true;
        Ok(())
    }

    pub(super) fn keyword(&mut self, c: u8, rest: &'static [u8]) -> Result<()> {
        match rest.split_first() {
            Some((&expected, tail)) if expected == c => {
                if tail.is_empty() {
                    let end = self.pos + 1;
                    self.found(LexKind::LiteralEnd, end)?;
                    self.end_value(end)
                } else {
                    self.state = State::Keyword { rest: tail };
                    Ok(())
                }
            }
            _ => Err(self.unexpected(c, Some("a keyword literal"))),
        }
    }
}
