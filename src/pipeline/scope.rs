//! Scoped sub-grammars.
//!
//! A scope temporarily shadows the enclosing handler chain with its own
//! frame: the quoted-field grammar (separators and whitespace become literal
//! content) and the one-character escape grammar are both scopes. The
//! pipeline holds scopes as an explicit frame stack; a fault raised inside a
//! scope propagates without popping it, so a failed parse leaves the pipeline
//! state inspectable instead of silently recovering.

use super::handlers::{accept_all, literal_next, Action, CharHandler, HandlerFrame};

/// Opens a scoped frame when its trigger character is claimed.
pub struct ScopeHandler {
    trigger: char,
    only_at_piece_start: bool,
    frame: Box<dyn Fn() -> HandlerFrame>,
}

impl ScopeHandler {
    /// A handler claiming `trigger` and pushing the frame built by `frame`.
    ///
    /// With `only_at_piece_start`, the trigger is only claimed while the
    /// current piece is empty; mid-piece occurrences fall through to the rest
    /// of the chain (and usually become literal content).
    pub fn new(
        trigger: char,
        only_at_piece_start: bool,
        frame: impl Fn() -> HandlerFrame + 'static,
    ) -> Self {
        Self {
            trigger,
            only_at_piece_start,
            frame: Box::new(frame),
        }
    }
}

impl std::fmt::Debug for ScopeHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeHandler")
            .field("trigger", &self.trigger)
            .field("only_at_piece_start", &self.only_at_piece_start)
            .finish_non_exhaustive()
    }
}

impl CharHandler for ScopeHandler {
    fn offer(&mut self, c: char, piece: &str) -> Option<Action> {
        if c != self.trigger || (self.only_at_piece_start && !piece.is_empty()) {
            return None;
        }
        Some(Action::OpenScope((self.frame)()))
    }
}

#[derive(Debug)]
struct CloseScopeOn {
    trigger: char,
}

impl CharHandler for CloseScopeOn {
    fn offer(&mut self, c: char, _piece: &str) -> Option<Action> {
        (c == self.trigger).then_some(Action::CloseScope)
    }
}

/// Claims `trigger`, drops it, and pops the innermost scope.
pub fn close_scope_on(trigger: char) -> Box<dyn CharHandler> {
    Box::new(CloseScopeOn { trigger })
}

/// Claims the escape character and scopes the next character as literal
/// content (`\"` inside a quoted field yields `"`).
pub fn escape(escape_char: char) -> Box<dyn CharHandler> {
    Box::new(ScopeHandler::new(escape_char, false, || {
        vec![literal_next()]
    }))
}

/// The quoted-field grammar: an opening quote (only at piece start) scopes a
/// frame where the escape character works, the closing quote pops, and
/// everything else, separators and whitespace included, is literal content.
pub fn quoted_field(quote: char, escape_char: char) -> Box<dyn CharHandler> {
    Box::new(ScopeHandler::new(quote, true, move || {
        vec![escape(escape_char), close_scope_on(quote), accept_all()]
    }))
}
