/// Scanner states. Each names what the scanner expects at the next byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    BeginValue,

    ObjectKeyOrEnd,
    ObjectKey,
    BareKey,
    KeyShortcutName { first: bool },
    AfterKey,
    ObjectValue,
    AfterObjectValue,

    ArrayItemOrEnd,
    ArrayItem,
    AfterArrayItem,

    String { key: bool },
    StringEscape { key: bool },
    StringUnicode { key: bool, left: u8 },
    NumberMinus,
    NumberZero,
    NumberInt,
    NumberDot,
    NumberFrac,
    NumberExp,
    NumberExpSign,
    NumberExpDigits,
    Keyword { rest: &'static [u8] },

    ShortcutName { first: bool },
    ShortcutAfterName,
    ShortcutPipe,

    AfterTop,

    CommentHashes,
    CommentLine,
    CommentBlock,

    Slash,
    AnnotationStart,
    AnnotationText,
    AnnotationTextStar,
    AnnotationAfterRules,
    AnnotationDash,
    AnnotationCloseStar,
    NestedCommentStart,
    NestedCommentText,
}

impl State {
    /// Human readable position used in error messages.
    pub fn context(self) -> &'static str {
        match self {
            State::BeginValue => "at the beginning of a value",
            State::ObjectKeyOrEnd | State::ObjectKey => "inside an object",
            State::BareKey => "in a rule name",
            State::KeyShortcutName { .. } => "in a key shortcut",
            State::AfterKey => "after an object key",
            State::ObjectValue => "before an object value",
            State::AfterObjectValue => "after an object value",
            State::ArrayItemOrEnd | State::ArrayItem => "inside an array",
            State::AfterArrayItem => "after an array item",
            State::String { key: true } | State::StringEscape { key: true } | State::StringUnicode { key: true, .. } => {
                "in an object key"
            }
            State::String { .. } | State::StringEscape { .. } | State::StringUnicode { .. } => "in a string literal",
            State::NumberMinus
            | State::NumberZero
            | State::NumberInt
            | State::NumberDot
            | State::NumberFrac
            | State::NumberExp
            | State::NumberExpSign
            | State::NumberExpDigits => "in a number literal",
            State::Keyword { .. } => "in a literal",
            State::ShortcutName { .. } | State::ShortcutAfterName | State::ShortcutPipe => "in a type shortcut",
            State::AfterTop => "after the top-level value",
            State::CommentHashes | State::CommentLine => "in a comment",
            State::CommentBlock => "in a block comment",
            State::Slash => "at the beginning of an annotation",
            State::AnnotationStart
            | State::AnnotationText
            | State::AnnotationTextStar
            | State::AnnotationAfterRules
            | State::AnnotationDash
            | State::AnnotationCloseStar => "in an annotation",
            State::NestedCommentStart | State::NestedCommentText => "in an annotation comment",
        }
    }
}
