//! Character handlers: the single-responsibility units a [`crate::pipeline::Pipeline`]
//! dispatches to.
//!
//! Each handler decides whether it claims a character and, if so, which
//! [`Action`] the pipeline applies. Dialects are assembled declaratively from
//! the factory functions here plus the scope factories in
//! [`crate::pipeline::scope`]; registration order is correctness-critical
//! (see the pipeline docs).

/// A scoped set of handlers, tried front to back.
pub type HandlerFrame = Vec<Box<dyn CharHandler>>;

/// The side effect a handler applies to a character it claims.
pub enum Action {
    /// Append the character to the piece in progress.
    Accept,
    /// Drop the character.
    Ignore,
    /// Freeze the piece in progress (even if empty) and start a new one.
    EndPiece,
    /// Drop the character and push a scoped frame that shadows the outer
    /// handlers until popped.
    OpenScope(HandlerFrame),
    /// Drop the character and pop the innermost scope.
    CloseScope,
    /// Append the character, then pop the innermost scope.
    AcceptAndClose,
}

/// A single-responsibility character classifier.
pub trait CharHandler: std::fmt::Debug {
    /// Offer `c` to this handler. `piece` is the token assembled so far.
    ///
    /// Returns `None` to decline (the pipeline keeps scanning) or the action
    /// to apply.
    fn offer(&mut self, c: char, piece: &str) -> Option<Action>;
}

#[derive(Debug)]
struct AcceptAll;

impl CharHandler for AcceptAll {
    fn offer(&mut self, _c: char, _piece: &str) -> Option<Action> {
        Some(Action::Accept)
    }
}

/// Claims every character and accepts it into the piece. Register first so it
/// ends up rearmost: it is the fallback for anything more specific handlers
/// decline.
pub fn accept_all() -> Box<dyn CharHandler> {
    Box::new(AcceptAll)
}

#[derive(Debug)]
struct Alphanumeric;

impl CharHandler for Alphanumeric {
    fn offer(&mut self, c: char, _piece: &str) -> Option<Action> {
        c.is_alphanumeric().then_some(Action::Accept)
    }
}

/// Claims alphanumeric characters and accepts them.
pub fn accept_alphanumeric() -> Box<dyn CharHandler> {
    Box::new(Alphanumeric)
}

#[derive(Debug)]
struct LeadingWhitespace;

impl CharHandler for LeadingWhitespace {
    fn offer(&mut self, c: char, piece: &str) -> Option<Action> {
        (c.is_whitespace() && piece.is_empty()).then_some(Action::Ignore)
    }
}

/// Claims whitespace only while the current piece is still empty, dropping
/// it. Interior and trailing whitespace falls through to whatever accepts it,
/// so pieces are left-trimmed without losing embedded spacing.
pub fn ignore_leading_whitespace() -> Box<dyn CharHandler> {
    Box::new(LeadingWhitespace)
}

#[derive(Debug)]
struct Separator {
    separator: char,
}

impl CharHandler for Separator {
    fn offer(&mut self, c: char, _piece: &str) -> Option<Action> {
        (c == self.separator).then_some(Action::EndPiece)
    }
}

/// Claims the separator character and ends the piece in progress. Consecutive
/// separators yield empty pieces: empty fields are significant.
pub fn end_piece_on(separator: char) -> Box<dyn CharHandler> {
    Box::new(Separator { separator })
}

#[derive(Debug)]
struct LiteralNext;

impl CharHandler for LiteralNext {
    fn offer(&mut self, _c: char, _piece: &str) -> Option<Action> {
        Some(Action::AcceptAndClose)
    }
}

/// Claims any character, accepts it literally, and closes its scope. The body
/// of an escape scope: whatever follows the escape character is content.
pub fn literal_next() -> Box<dyn CharHandler> {
    Box::new(LiteralNext)
}
