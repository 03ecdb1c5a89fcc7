// WHY: Constant time lookups over a fixed page list
// Built once; rebuild it when the page list changes

use std::collections::HashMap;
use tracing::debug;

use crate::page::{Addressed, Page};

/// Outcome of looking up a page by its first title
#[derive(Debug, Clone, Copy)]
pub enum NameLookup<'p, 'a> {
    /// Exactly one page has the name
    Found(&'p Page<'a>),
    /// No page has the name
    NotFound,
    /// More than one page has the name; `first` is the earliest of `pages`
    Ambiguous {
        first: &'p Page<'a>,
        pages: &'p [&'p Page<'a>],
    },
}

impl<'p, 'a> NameLookup<'p, 'a> {
    /// The representative page, if any
    pub fn page(&self) -> Option<&'p Page<'a>> {
        match *self {
            NameLookup::Found(page) => Some(page),
            NameLookup::Ambiguous { first, .. } => Some(first),
            NameLookup::NotFound => None,
        }
    }
}

/// Lookup maps by address, name, tag and secondary title
#[derive(Debug, Clone)]
pub struct Index<'p, 'a> {
    pages: &'p [Page<'a>],
    address: HashMap<usize, &'p Page<'a>>,
    named: HashMap<&'p str, Vec<&'p Page<'a>>>,
    tagged: HashMap<&'p str, Vec<&'p Page<'a>>>,
    secondary: HashMap<&'p str, Vec<&'p Page<'a>>>,
}

impl<'p, 'a> Index<'p, 'a> {
    pub fn new(pages: &'p [Page<'a>]) -> Self {
        let mut address = HashMap::with_capacity(pages.len());
        let mut named: HashMap<&'p str, Vec<&'p Page<'a>>> = HashMap::new();
        let mut tagged: HashMap<&'p str, Vec<&'p Page<'a>>> = HashMap::new();
        let mut secondary: HashMap<&'p str, Vec<&'p Page<'a>>> = HashMap::new();

        for page in pages {
            let (name, anonymous) = page.name();
            if !anonymous {
                named.entry(name).or_default().push(page);
            }

            address.insert(page.address(), page);

            for tag in page.tags() {
                tagged.entry(tag.as_ref()).or_default().push(page);
            }
            for thing in page.secondary_titles() {
                secondary.entry(thing.as_ref()).or_default().push(page);
            }
        }

        debug!(
            pages = pages.len(),
            names = named.len(),
            tags = tagged.len(),
            "built page index"
        );

        Self {
            pages,
            address,
            named,
            tagged,
            secondary,
        }
    }

    /// Pages the index was built from
    pub fn pages(&self) -> &'p [Page<'a>] {
        self.pages
    }

    /// Page whose first header line is at `address`
    pub fn page_at(&self, address: usize) -> Option<&'p Page<'a>> {
        self.address.get(&address).copied()
    }

    /// The page named `name`, distinguishing absent and ambiguous names.
    ///
    /// ```ignore
    /// match index.page_named("example") {
    ///     NameLookup::Found(page) => println!("{}", page.address()),
    ///     NameLookup::Ambiguous { pages, .. } => println!("{} pages", pages.len()),
    ///     NameLookup::NotFound => println!("none"),
    /// }
    /// ```
    pub fn page_named(&self, name: &str) -> NameLookup<'_, 'a> {
        match self.named.get(name).map(Vec::as_slice) {
            None | Some([]) => NameLookup::NotFound,
            Some(&[page]) => NameLookup::Found(page),
            Some(pages) => NameLookup::Ambiguous {
                first: pages[0],
                pages,
            },
        }
    }

    /// Every page whose first title is `name`, in page order
    pub fn pages_named(&self, name: &str) -> &[&'p Page<'a>] {
        self.named.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every page tagged `tag` at any title position, in page order
    pub fn pages_tagged(&self, tag: &str) -> &[&'p Page<'a>] {
        self.tagged.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every page carrying `thing` at a title position after the first
    pub fn pages_with_secondary_title(&self, thing: &str) -> &[&'p Page<'a>] {
        self.secondary.get(thing).map(Vec::as_slice).unwrap_or_default()
    }

    /// Every distinct tag, in no particular order. Allocates on each call.
    pub fn tags(&self) -> Vec<&'p str> {
        self.tagged.keys().copied().collect()
    }
}
