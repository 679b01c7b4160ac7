//! Lexical events produced by the scanner.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LexKind {
    ObjectBegin,
    ObjectEnd,
    ObjectKeyBegin,
    ObjectKeyEnd,
    ObjectValueBegin,
    ObjectValueEnd,
    ArrayBegin,
    ArrayEnd,
    ArrayItemBegin,
    ArrayItemEnd,
    LiteralBegin,
    LiteralEnd,
    InlineAnnotationBegin,
    InlineAnnotationEnd,
    InlineAnnotationTextBegin,
    InlineAnnotationTextEnd,
    MultiLineAnnotationBegin,
    MultiLineAnnotationEnd,
    MultiLineAnnotationTextBegin,
    MultiLineAnnotationTextEnd,
    TypesShortcutBegin,
    TypesShortcutEnd,
    KeyShortcutBegin,
    KeyShortcutEnd,
    NewLine,
    EndTop,
}

impl LexKind {
    pub fn is_begin(self) -> bool {
        self.closing().is_some()
    }

    /// The end kind paired with a begin kind.
    pub fn closing(self) -> Option<LexKind> {
        use LexKind::*;
        Some(match self {
            ObjectBegin => ObjectEnd,
            ObjectKeyBegin => ObjectKeyEnd,
            ObjectValueBegin => ObjectValueEnd,
            ArrayBegin => ArrayEnd,
            ArrayItemBegin => ArrayItemEnd,
            LiteralBegin => LiteralEnd,
            InlineAnnotationBegin => InlineAnnotationEnd,
            InlineAnnotationTextBegin => InlineAnnotationTextEnd,
            MultiLineAnnotationBegin => MultiLineAnnotationEnd,
            MultiLineAnnotationTextBegin => MultiLineAnnotationTextEnd,
            TypesShortcutBegin => TypesShortcutEnd,
            KeyShortcutBegin => KeyShortcutEnd,
            _ => return None,
        })
    }

    pub fn is_end(self) -> bool {
        use LexKind::*;
        matches!(
            self,
            ObjectEnd
                | ObjectKeyEnd
                | ObjectValueEnd
                | ArrayEnd
                | ArrayItemEnd
                | LiteralEnd
                | InlineAnnotationEnd
                | InlineAnnotationTextEnd
                | MultiLineAnnotationEnd
                | MultiLineAnnotationTextEnd
                | TypesShortcutEnd
                | KeyShortcutEnd
        )
    }

    pub fn is_annotation_begin(self) -> bool {
        matches!(self, LexKind::InlineAnnotationBegin | LexKind::MultiLineAnnotationBegin)
    }

    pub fn is_annotation_end(self) -> bool {
        matches!(self, LexKind::InlineAnnotationEnd | LexKind::MultiLineAnnotationEnd)
    }
}

/// One event with its byte span; `end` is exclusive. For end kinds the span
/// starts at the matching begin event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexEvent {
    pub kind: LexKind,
    pub begin: usize,
    pub end: usize,
}

impl LexEvent {
    pub fn new(kind: LexKind, begin: usize, end: usize) -> Self {
        Self { kind, begin, end }
    }

    /// Source bytes covered by this event.
    pub fn bytes<'a>(&self, src: &'a [u8]) -> &'a [u8] {
        &src[self.begin.min(src.len())..self.end.min(src.len())]
    }

    pub fn text<'a>(&self, src: &'a [u8]) -> std::borrow::Cow<'a, str> {
        String::from_utf8_lossy(self.bytes(src))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_kinds_pair_with_their_end() {
        for kind in [LexKind::ObjectBegin, LexKind::TypesShortcutBegin, LexKind::MultiLineAnnotationTextBegin] {
            let end = kind.closing().unwrap();
            assert!(kind.is_begin());
            assert!(end.is_end());
        }
        assert!(!LexKind::NewLine.is_begin());
        assert!(!LexKind::EndTop.is_end());
    }
}
