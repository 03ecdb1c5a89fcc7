// WHY: Explicit state machine over line tokens, one forward pass, O(1) extra state
//
// The only deferred decision is a run of titles seen after a clear: the index
// where the run began is carried in the tentative states until the next clear
// confirms a new header or the next other line folds the run into the body.

#[cfg(feature = "debug-states")]
use tracing::trace;
use tracing::debug;

use super::{PageParts, ParseError};
use crate::tokenizer::Token;

/// Automaton states. Variants holding `note` are tentative: `note` is the index
/// of the first title in a run that may or may not start a new page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Nothing seen yet
    Start,
    /// One leading clear, no page open
    AfterClear,
    /// Two or more leading clears, no page open; `note` is the second clear
    AfterClearClear { note: usize },
    /// Consuming header titles
    InHeader,
    /// One clear closed the header
    OneClearAfterHeader,
    /// Titles after the header's single closing clear
    TitleAfterOneClear { note: usize },
    /// Two clears closed the header; the body starts at the second
    TwoClearAfterHeader,
    /// Titles after the header's two closing clears
    TitleAfterTwoClear { note: usize },
    /// Consuming body content
    InBody,
    /// One or more clears inside the body
    OneClearInBody,
    /// Titles after a clear inside the body
    TitleAfterClearInBody { note: usize },
}

/// Output under construction. The open page is always the last one.
struct Pages {
    pages: Vec<PageParts>,
}

impl Pages {
    fn open(&mut self) -> &mut PageParts {
        self.pages.push(PageParts::default());
        self.current()
    }

    fn current(&mut self) -> &mut PageParts {
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    /// Close the open page with an empty body right after its header, then open
    /// a page whose header is the titles `note..high`.
    fn split_header(&mut self, note: usize, high: usize) -> &mut PageParts {
        let previous = self.current();
        previous.body.empty(previous.head.high);
        let page = self.open();
        page.head.low = note;
        page.head.high = high;
        page
    }

    /// End the open page's body just before the clear preceding `note`, then
    /// open a page whose header is the titles `note..high`.
    fn split_body(&mut self, note: usize, high: usize) -> &mut PageParts {
        self.current().body.high = note - 1;
        let page = self.open();
        page.head.low = note;
        page.head.high = high;
        page
    }
}

/// Find the pages in `tokens`.
///
/// `tokens` must end with [`Token::End`]; scanning stops at the first `End`.
/// Any token other than clear, title, other or end aborts the parse.
pub fn parse(tokens: &[Token]) -> Result<Vec<PageParts>, ParseError> {
    if tokens.last() != Some(&Token::End) {
        return Err(ParseError::MissingEnd);
    }

    let mut out = Pages { pages: Vec::new() };
    let mut state = State::Start;

    for (i, &token) in tokens.iter().enumerate() {
        #[cfg(feature = "debug-states")]
        trace!(index = i, ?state, %token, "transition");

        let bad = || ParseError::BadToken { token, index: i };

        state = match state {
            State::Start | State::AfterClear => match token {
                Token::Clear if state == State::Start => State::AfterClear,
                Token::Clear => State::AfterClearClear { note: i },
                Token::Title => {
                    out.open().head.low = i;
                    State::InHeader
                }
                Token::Other => {
                    let page = out.open();
                    page.head.empty(i);
                    page.body.low = i;
                    State::InBody
                }
                Token::End => break,
                Token::Alternate => return Err(bad()),
            },

            State::AfterClearClear { note } => match token {
                Token::Clear => state,
                Token::Title => {
                    out.open().head.low = i;
                    State::InHeader
                }
                Token::Other => {
                    // Only the first leading clear is skipped
                    let page = out.open();
                    page.head.empty(note);
                    page.body.low = note;
                    State::InBody
                }
                Token::End => break,
                Token::Alternate => return Err(bad()),
            },

            State::InHeader => match token {
                Token::Clear => {
                    out.current().head.high = i;
                    State::OneClearAfterHeader
                }
                Token::Title => State::InHeader,
                Token::Other => {
                    // Titles directly followed by content are content
                    let page = out.current();
                    page.head.high = page.head.low;
                    page.body.low = page.head.low;
                    State::InBody
                }
                Token::End => {
                    let page = out.current();
                    page.head.high = i;
                    page.body.empty(i);
                    break;
                }
                Token::Alternate => return Err(bad()),
            },

            State::OneClearAfterHeader => match token {
                Token::Clear => {
                    out.current().body.low = i;
                    State::TwoClearAfterHeader
                }
                Token::Title => State::TitleAfterOneClear { note: i },
                Token::Other => {
                    out.current().body.low = i;
                    State::InBody
                }
                Token::End => {
                    let page = out.current();
                    page.body.empty(page.head.high);
                    break;
                }
                Token::Alternate => return Err(bad()),
            },

            State::TitleAfterOneClear { note } => match token {
                Token::Clear => {
                    out.split_header(note, i);
                    State::OneClearAfterHeader
                }
                Token::Title => state,
                Token::Other => {
                    out.current().body.low = note;
                    State::InBody
                }
                Token::End => {
                    out.split_header(note, i).body.empty(i);
                    break;
                }
                Token::Alternate => return Err(bad()),
            },

            State::TwoClearAfterHeader => match token {
                Token::Clear => State::OneClearInBody,
                Token::Title => State::TitleAfterTwoClear { note: i },
                Token::Other => State::InBody,
                Token::End => {
                    let page = out.current();
                    page.body.empty(page.head.high);
                    break;
                }
                Token::Alternate => return Err(bad()),
            },

            State::TitleAfterTwoClear { note } => match token {
                Token::Clear => {
                    out.split_header(note, i);
                    State::OneClearAfterHeader
                }
                Token::Title => state,
                Token::Other => State::InBody,
                Token::End => {
                    out.split_header(note, i).body.empty(i);
                    break;
                }
                Token::Alternate => return Err(bad()),
            },

            State::InBody => match token {
                Token::Clear => State::OneClearInBody,
                Token::Title | Token::Other => State::InBody,
                Token::End => {
                    out.current().body.high = i;
                    break;
                }
                Token::Alternate => return Err(bad()),
            },

            State::OneClearInBody => match token {
                Token::Clear => state,
                Token::Title => State::TitleAfterClearInBody { note: i },
                Token::Other => State::InBody,
                Token::End => {
                    // The trailing clear separates, it is not content
                    out.current().body.high = i - 1;
                    break;
                }
                Token::Alternate => return Err(bad()),
            },

            State::TitleAfterClearInBody { note } => match token {
                Token::Clear => {
                    out.split_body(note, i);
                    State::OneClearAfterHeader
                }
                Token::Title => state,
                Token::Other => State::InBody,
                Token::End => {
                    out.split_body(note, i).body.empty(i);
                    break;
                }
                Token::Alternate => return Err(bad()),
            },
        };
    }

    debug!(tokens = tokens.len(), pages = out.pages.len(), "parsed pages");
    Ok(out.pages)
}
