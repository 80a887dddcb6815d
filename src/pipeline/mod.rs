//! The character-classification pipeline.
//!
//! A [`Pipeline`] owns an ordered chain of [`CharHandler`]s plus the token
//! ("piece") being assembled and the list of completed tokens ("products").
//! Each input character is offered front to back to the chain; the first
//! handler that claims it applies its [`Action`] and the scan stops. A
//! character no handler claims is an illegal-input-character fault carrying
//! the character and its position.
//!
//! Register handlers with [`Pipeline::put_front`]: the most specific handlers
//! (quote detection, escapes) are registered last so they end up frontmost.
//! Order is correctness-critical: a leading-whitespace handler must sit in
//! front of accept-all to trim at all, and quoting works because a scope frame
//! shadows the whole base chain while open.
//!
//! Scopes (quoted fields, escapes) are an explicit stack of handler frames:
//! opening a scope pushes a frame that is consulted before everything below
//! it, and the scope's closer pops it. A fault inside a scope propagates
//! without popping, so callers can inspect [`Pipeline::scope_depth`] when a
//! parse aborts.

pub mod handlers;
pub mod scope;

pub use handlers::{
    accept_all, accept_alphanumeric, end_piece_on, ignore_leading_whitespace, literal_next,
    Action, CharHandler, HandlerFrame,
};
pub use scope::{close_scope_on, escape, quoted_field, ScopeHandler};

use std::mem;

use crate::error::{FixtureError, FixtureResult};

/// The handler chain and its token state.
pub struct Pipeline {
    frames: Vec<HandlerFrame>,
    piece: String,
    products: Vec<String>,
    position: usize,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// An empty pipeline: no handlers, no products.
    pub fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
            piece: String::new(),
            products: Vec::new(),
            position: 0,
        }
    }

    /// Insert `handler` at the head of the active frame. Later registrations
    /// take priority over earlier ones.
    pub fn put_front(&mut self, handler: Box<dyn CharHandler>) {
        self.frames
            .last_mut()
            .expect("pipeline always has a base frame")
            .insert(0, handler);
    }

    /// Pop and return the frontmost handler of the active frame.
    ///
    /// A pipeline-state fault if that frame is empty.
    pub fn remove_front(&mut self) -> FixtureResult<Box<dyn CharHandler>> {
        let frame = self
            .frames
            .last_mut()
            .expect("pipeline always has a base frame");
        if frame.is_empty() {
            return Err(FixtureError::pipeline_state(
                "remove_front on an empty pipeline",
            ));
        }
        Ok(frame.remove(0))
    }

    /// Offer one character to the chain.
    pub fn handle(&mut self, c: char) -> FixtureResult<()> {
        let action = 'claimed: {
            for frame in self.frames.iter_mut().rev() {
                for handler in frame.iter_mut() {
                    if let Some(action) = handler.offer(c, &self.piece) {
                        break 'claimed action;
                    }
                }
            }
            return Err(FixtureError::IllegalCharacter {
                character: c,
                position: self.position,
            });
        };

        match action {
            Action::Accept => self.piece.push(c),
            Action::Ignore => {}
            Action::EndPiece => self.the_piece_is_done(),
            Action::OpenScope(frame) => self.frames.push(frame),
            Action::CloseScope => self.pop_scope()?,
            Action::AcceptAndClose => {
                self.piece.push(c);
                self.pop_scope()?;
            }
        }
        self.position += 1;
        Ok(())
    }

    /// Offer every character of `input` in order.
    pub fn handle_all(&mut self, input: &str) -> FixtureResult<()> {
        for c in input.chars() {
            self.handle(c)?;
        }
        Ok(())
    }

    /// Freeze the piece in progress into the products list (empty pieces
    /// included, since consecutive separators denote empty fields) and start
    /// a new one.
    pub fn the_piece_is_done(&mut self) {
        self.products.push(mem::take(&mut self.piece));
    }

    /// Completed tokens, in completion order.
    pub fn products(&self) -> &[String] {
        &self.products
    }

    /// Number of open scopes (0 = only the base grammar is active).
    pub fn scope_depth(&self) -> usize {
        self.frames.len() - 1
    }

    /// Flush the final piece and take the products, leaving the pipeline
    /// reusable for the next record.
    pub fn finish(&mut self) -> Vec<String> {
        self.the_piece_is_done();
        self.position = 0;
        mem::take(&mut self.products)
    }

    fn pop_scope(&mut self) -> FixtureResult<()> {
        if self.frames.len() == 1 {
            return Err(FixtureError::pipeline_state(
                "close_scope with no scope open",
            ));
        }
        self.frames.pop();
        Ok(())
    }
}
