// WHY: Finds the pages in a token sequence produced by the tokenizer
//
// A normal page is /t+(co+)*c/, although the last clear is not part of the
// page. The corner cases are pinned down by the table in tests/parser_table.rs.
//
// The automaton expects alternate lines to arrive as Title tokens; an
// Alternate token is rejected like any other unexpected token.

use thiserror::Error;

use crate::tokenizer::Token;

pub mod machine;

pub use machine::parse;

/// A header or body as the half-open line range `[low, high)`.
///
/// Empty parts still carry a position, chosen so `head.low..body.high` always
/// slices every line of the page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Part {
    pub low: usize,
    pub high: usize,
}

impl Part {
    pub fn new(low: usize, high: usize) -> Self {
        Self { low, high }
    }

    /// Collapse to the empty range at `index`
    pub fn empty(&mut self, index: usize) {
        self.low = index;
        self.high = index;
    }

    pub fn is_empty(&self) -> bool {
        self.low == self.high
    }

    pub fn len(&self) -> usize {
        self.high - self.low
    }

    pub fn range(&self) -> std::ops::Range<usize> {
        self.low..self.high
    }
}

/// Header and body ranges of one page
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct PageParts {
    pub head: Part,
    pub body: Part,
}

impl PageParts {
    /// Every line belonging to the page
    pub fn lines(&self) -> std::ops::Range<usize> {
        self.head.low..self.body.high
    }
}

/// Fatal parse failures. A parse that fails returns no pages at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing end of file token")]
    MissingEnd,

    /// `index` is zero based; the message reports the one based line number
    #[error("bad token, {token}, for line {line}", line = .index + 1)]
    BadToken { token: Token, index: usize },
}
