// WHY: Line classifier feeding the page automaton
// Every line becomes exactly one token; the sequence always closes with a zero-length End

use std::fmt;

/// Width in bytes of both line markers
pub const MARKER_LEN: usize = 4;

/// Classification of a single line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Token {
    /// Blank line (only spaces, tabs and line terminators)
    Clear,
    /// Header line starting with the title marker
    Title,
    /// Ordinary content
    Other,
    /// Line starting with the alternate marker, unless remapped to `Title`
    Alternate,
    /// Virtual zero-length line after the last real line
    End,
}

impl Token {
    /// Single letter form used in error messages and test notation
    pub fn letter(self) -> char {
        match self {
            Token::Clear => 'c',
            Token::Title => 't',
            Token::Other => 'o',
            Token::Alternate => 'a',
            Token::End => 'e',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'c' => Some(Token::Clear),
            't' => Some(Token::Title),
            'o' => Some(Token::Other),
            'a' => Some(Token::Alternate),
            'e' => Some(Token::End),
            _ => None,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Parse a whitespace separated letter sequence such as `"t c o e"`.
/// Returns `None` if any letter is not a token letter.
pub fn tokens_from_letters(letters: &str) -> Option<Vec<Token>> {
    letters
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(Token::from_letter)
        .collect()
}

/// Line classifier configuration
#[derive(Debug, Clone)]
pub struct Tokenizer {
    /// Prefix that marks a title line
    pub title_marker: [u8; MARKER_LEN],
    /// Prefix that marks an alternate line
    pub alternate_marker: [u8; MARKER_LEN],
    /// Classify alternate lines as `Title` instead of `Alternate`
    pub alternate_as_title: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self {
            title_marker: *b"----",
            alternate_marker: *b"++++",
            alternate_as_title: false,
        }
    }
}

impl Tokenizer {
    /// Classifier used for page segmentation: alternate lines count as titles
    pub fn for_pages() -> Self {
        Self {
            alternate_as_title: true,
            ..Self::default()
        }
    }

    /// Classify the first line of `rest`, returning its token and byte length
    /// including the terminating newline. Empty input yields `(End, 0)`.
    pub fn line(&self, rest: &[u8]) -> (Token, usize) {
        if rest.is_empty() {
            return (Token::End, 0);
        }

        let length = match rest.iter().position(|&b| b == b'\n') {
            Some(newline) => newline + 1,
            None => rest.len(),
        };
        let line = &rest[..length];

        let token = if line.starts_with(&self.title_marker) {
            Token::Title
        } else if line.starts_with(&self.alternate_marker) {
            if self.alternate_as_title {
                Token::Title
            } else {
                Token::Alternate
            }
        } else if line.iter().all(|&b| matches!(b, b' ' | b'\t' | b'\r' | b'\n')) {
            Token::Clear
        } else {
            Token::Other
        };

        (token, length)
    }

    /// Classify every line of `buf`.
    ///
    /// Returns the tokens and the start offset of every line. The last token is
    /// always `End`, whose offset equals `buf.len()`.
    pub fn tokenize(&self, buf: &[u8], capacity: usize) -> (Vec<Token>, Vec<usize>) {
        let mut tokens = Vec::with_capacity(capacity);
        let mut offsets = Vec::with_capacity(capacity + 1);
        let mut offset = 0;
        loop {
            let (token, length) = self.line(&buf[offset..]);
            tokens.push(token);
            offsets.push(offset);
            if token == Token::End {
                break;
            }
            offset += length;
        }
        (tokens, offsets)
    }
}

/// Extract the raw title text from a title line: strip the marker and the line
/// terminator. Trailing whitespace is left for the caller to trim once decoded.
pub fn title_text(line: &[u8]) -> &[u8] {
    if line.len() <= MARKER_LEN {
        return &[];
    }
    let text = &line[MARKER_LEN..];
    let text = text.strip_suffix(b"\n").unwrap_or(text);
    text.strip_suffix(b"\r").unwrap_or(text)
}
