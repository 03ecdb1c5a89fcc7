pub mod tokenizer;
pub mod parser;
pub mod page;
pub mod index;
pub mod ops;
pub mod reader;
pub mod processing;

// Re-export main types for convenient access
pub use tokenizer::{Token, Tokenizer};
pub use parser::{parse, PageParts, ParseError, Part};
pub use page::{segment, Addressed, Page, Segmentation, Statistics};
pub use index::{Index, NameLookup};

// Re-export set operations over address-sorted page lists
pub use ops::{intersect, subtract, union};

// Re-export loading for callers that own the buffer lifetime
pub use reader::{load_file, FileLoader, LoadedFile, LoaderConfig};
