// WHY: Page views over one shared file buffer
// Pages borrow the buffer for their whole lifetime and never copy it; the line
// offset table is shared between all pages of one segmentation

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::parser::{self, PageParts, ParseError, Part};
use crate::tokenizer::{title_text, Tokenizer};

/// Anything with an address, the canonical identity and sort key of a page
pub trait Addressed {
    /// One based line number of the page's first header line
    fn address(&self) -> usize;
}

/// One page of the file: a run of titles and the body that follows them
#[derive(Clone)]
pub struct Page<'a> {
    /// Distinct titles in header order. Zero length titles are dropped unless
    /// they are the first line of the header. Never empty.
    titles: Vec<Cow<'a, str>>,
    /// Whole file contents
    file: &'a [u8],
    /// Start offset of every line of the file; the last entry is the file length
    offsets: Arc<[usize]>,
    parts: PageParts,
    /// Line number of the first header line
    line: usize,
    /// Position among all pages of the same segmentation
    index: usize,
}

impl<'a> Page<'a> {
    /// First title, and whether the page is anonymous (zero length name)
    pub fn name(&self) -> (&str, bool) {
        let name = self.titles[0].as_ref();
        (name, name.is_empty())
    }

    /// All titles, including a leading empty placeholder for anonymous pages
    pub fn titles(&self) -> &[Cow<'a, str>] {
        &self.titles
    }

    /// All non-empty titles, first occurrence only
    pub fn tags(&self) -> &[Cow<'a, str>] {
        if self.titles[0].is_empty() {
            &self.titles[1..]
        } else {
            &self.titles
        }
    }

    /// Whether the page carries `tag` at any title position. Never true for "".
    pub fn is_tagged(&self, tag: &str) -> bool {
        if tag.is_empty() {
            return false;
        }
        self.tags().iter().any(|t| t == tag)
    }

    /// Every title after the first. Titles duplicating the first are not
    /// included.
    pub fn secondary_titles(&self) -> &[Cow<'a, str>] {
        &self.titles[1..]
    }

    /// Body bytes in one slice
    pub fn body(&self) -> &'a [u8] {
        self.span(self.parts.body.low, self.parts.body.high)
    }

    /// Body split into lines. Lines keep their newline, except an unterminated
    /// last line of the file, which is never empty.
    pub fn body_lines(&self) -> Vec<&'a [u8]> {
        self.parts
            .body
            .range()
            .map(|line| self.span(line, line + 1))
            .collect()
    }

    /// Every byte from the first header line through the end of the body
    pub fn all_bytes(&self) -> &'a [u8] {
        self.span(self.parts.head.low, self.parts.body.high)
    }

    pub fn head(&self) -> Part {
        self.parts.head
    }

    pub fn body_part(&self) -> Part {
        self.parts.body
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// SHA-256 of the tags followed by the body.
    ///
    /// Each tag is fed length-prefixed so moving the suffix of one tag to the
    /// prefix of the next changes the hash. Title markers are encoding, not
    /// content, and do not take part.
    pub fn hash_raw(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for tag in self.tags() {
            hasher.update((tag.len() as u64).to_le_bytes());
            hasher.update(tag.as_bytes());
        }
        hasher.update(self.body());
        hasher.finalize().into()
    }

    /// [`Page::hash_raw`] as unpadded URL-safe base64
    pub fn hash64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.hash_raw())
    }

    /// SHA-256 of [`Page::all_bytes`], markers and blank lines included
    pub fn all_hash_raw(&self) -> [u8; 32] {
        Sha256::digest(self.all_bytes()).into()
    }

    fn span(&self, low: usize, high: usize) -> &'a [u8] {
        &self.file[self.offsets[low]..self.offsets[high]]
    }
}

impl fmt::Debug for Page<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Page")
            .field("address", &self.line)
            .field("index", &self.index)
            .field("titles", &self.titles)
            .field("parts", &self.parts)
            .finish()
    }
}

impl Addressed for Page<'_> {
    fn address(&self) -> usize {
        self.line
    }
}

impl<T: Addressed + ?Sized> Addressed for &T {
    fn address(&self) -> usize {
        (**self).address()
    }
}

/// Information about the file not recoverable from its pages
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Classified lines, the virtual end line included. Not every line belongs
    /// to a page.
    pub line_count: usize,
}

/// Pages of one file plus statistics
#[derive(Debug, Clone)]
pub struct Segmentation<'a> {
    pub pages: Vec<Page<'a>>,
    pub statistics: Statistics,
}

/// Titles of the header lines `head`, deduplicated in order
fn make_titles<'a>(buf: &'a [u8], offsets: &[usize], head: Part) -> Vec<Cow<'a, str>> {
    // the file can start with body content, creating a page with no header
    if head.is_empty() {
        return vec![Cow::Borrowed("")];
    }

    let mut titles: Vec<Cow<'a, str>> = Vec::with_capacity(head.len());
    for line in head.range() {
        let title = trim_title(String::from_utf8_lossy(title_text(
            &buf[offsets[line]..offsets[line + 1]],
        )));
        if title.is_empty() && line > head.low {
            continue;
        }
        if titles.contains(&title) {
            continue;
        }
        titles.push(title);
    }
    titles
}

/// Drop trailing Unicode whitespace, borrowing when the text was valid UTF-8
fn trim_title(title: Cow<'_, str>) -> Cow<'_, str> {
    match title {
        Cow::Borrowed(text) => Cow::Borrowed(text.trim_end()),
        Cow::Owned(mut text) => {
            text.truncate(text.trim_end().len());
            Cow::Owned(text)
        }
    }
}

/// Size of the window sampled by [`estimate_lines`]
const SAMPLE_LEN: usize = 10_000;
/// Subtracted from the sampled average so the estimate errs high
const FUDGE: usize = 2;

/// Guess the number of lines in `buf` from the average line length of a window
/// in its middle. The middle avoids skew from formatting local to either end.
pub fn estimate_lines(buf: &[u8]) -> usize {
    let (skip, length) = if buf.len() < SAMPLE_LEN {
        (0, buf.len())
    } else {
        ((buf.len() - SAMPLE_LEN) / 2, SAMPLE_LEN)
    };
    let count = buf[skip..skip + length].iter().filter(|&&b| b == b'\n').count();
    let average = length.checked_div(count).unwrap_or(length);
    if average > FUDGE {
        buf.len() / (average - FUDGE)
    } else {
        0
    }
}

/// Split `buf` into pages.
///
/// Alternate lines are classified as titles. Fails only if the automaton does.
pub fn segment(buf: &[u8]) -> Result<Segmentation<'_>, ParseError> {
    let estimate = estimate_lines(buf);
    let (tokens, offsets) = Tokenizer::for_pages().tokenize(buf, estimate);
    debug!(
        estimate,
        lines = tokens.len(),
        reallocated = tokens.len() > estimate,
        "classified lines"
    );

    let parsed = parser::parse(&tokens)?;
    let offsets: Arc<[usize]> = offsets.into();

    let pages: Vec<Page<'_>> = parsed
        .into_iter()
        .enumerate()
        .map(|(index, parts)| Page {
            titles: make_titles(buf, &offsets, parts.head),
            file: buf,
            offsets: Arc::clone(&offsets),
            parts,
            line: parts.head.low + 1,
            index,
        })
        .collect();

    info!(bytes = buf.len(), lines = tokens.len(), pages = pages.len(), "segmented file");
    Ok(Segmentation {
        pages,
        statistics: Statistics {
            line_count: tokens.len(),
        },
    })
}
