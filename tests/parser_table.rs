// Table of token sequences and the pages they must produce
// WHY: the corner cases of the page grammar are defined by this table

use thefile::parser::{parse, PageParts, ParseError};
use thefile::tokenizer::{tokens_from_letters, Token};

/// `(input letters, expected pages as "(head.low:head.high body.low:body.high)")`
const CASES: &[(&str, &str)] = &[
    // an empty file contains no pages
    ("e", ""),
    // a file with only whitespace contains no pages
    ("c e", ""),
    ("c c e", ""),
    ("c c c e", ""),
    // header lines, possibly missing leading and trailing clears, make one page
    ("t e", "(0:1 1:1)"),
    ("t t e", "(0:2 2:2)"),
    ("c t t e", "(1:3 3:3)"),
    ("c t t c e", "(1:3 3:3)"),
    ("c t t c c e", "(1:3 3:3)"),
    ("c t t c c c e", "(1:3 4:5)"),
    ("c t t c o c e", "(1:3 4:5)"),
    // content with no header makes one page; only one leading clear is skipped
    ("o e", "(0:0 0:1)"),
    ("c o e", "(1:1 1:2)"),
    ("c o c e", "(1:1 1:2)"),
    ("c o o c e", "(1:1 1:3)"),
    ("c c o c e", "(1:1 1:3)"),
    ("t t o e", "(0:0 0:3)"),
    // content before a valid header makes two pages
    ("o c t c e", "(0:0 0:1) (2:3 3:3)"),
    ("c c t e", "(2:3 3:3)"),
    ("c c c t e", "(3:4 4:4)"),
    ("c c c c t e", "(4:5 5:5)"),
    // exactly one clear is left out at the top and bottom of a body
    ("t c c c e", "(0:1 2:3)"),
    ("t c o c e", "(0:1 2:3)"),
    ("t c c c c e", "(0:1 2:4)"),
    ("t c o o e", "(0:1 2:4)"),
    ("t c o c c e", "(0:1 2:4)"),
    ("t c o o c o c e", "(0:1 2:6)"),
    // a clear before the first title is left out
    ("c t c o c e", "(1:2 3:4)"),
    ("c c t c o c e", "(2:3 4:5)"),
    // two headers make two pages
    ("t c t e", "(0:1 1:1) (2:3 3:3)"),
    ("t c c t e", "(0:1 1:1) (3:4 4:4)"),
    ("t c c t c e", "(0:1 1:1) (3:4 4:4)"),
    ("t c t c e", "(0:1 1:1) (2:3 3:3)"),
    // mixes of titles and other lines are bodies
    ("t c t t o e", "(0:1 2:5)"),
    ("t c c o t e", "(0:1 2:5)"),
    ("t c c t t o c o c e", "(0:1 2:8)"),
    // title runs after a body
    ("o c t t o e", "(0:0 0:5)"),
    ("o c t t e", "(0:0 0:1) (2:4 4:4)"),
    ("o c t c e", "(0:0 0:1) (2:3 3:3)"),
    // a realistic mix
    //0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6
    ("t t c o o c o o c t c t c o o c e", "(0:2 3:8) (9:10 10:10) (11:12 13:15)"),
];

fn letters(letters: &str) -> Vec<Token> {
    tokens_from_letters(letters).expect("test input uses only token letters")
}

fn render(pages: &[PageParts]) -> String {
    pages
        .iter()
        .map(|p| format!("({}:{} {}:{})", p.head.low, p.head.high, p.body.low, p.body.high))
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn test_parse_table() {
    let mut failures = Vec::new();
    for (input, expected) in CASES {
        let actual = render(&parse(&letters(input)).expect("table inputs are well formed"));
        if actual != *expected {
            failures.push(format!("\ninput:    {input}\nexpected: {expected}\nactual:   {actual}"));
        }
    }
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

#[test]
fn test_parse_is_repeatable() {
    for (input, _) in CASES {
        let tokens = letters(input);
        assert_eq!(parse(&tokens), parse(&tokens), "input: {input}");
    }
}

#[test]
fn test_no_tokens() {
    assert_eq!(parse(&[]), Err(ParseError::MissingEnd));
}

#[test]
fn test_missing_end() {
    assert_eq!(parse(&letters("c")), Err(ParseError::MissingEnd));
    assert_eq!(parse(&letters("t c o")), Err(ParseError::MissingEnd));
    assert_eq!(ParseError::MissingEnd.to_string(), "missing end of file token");
}

/// Inputs whose second-to-last token is a bad token reached in each state
const BAD_TOKEN_CASES: &[(&str, &str)] = &[
    ("start", "a e"),
    ("after clear", "c a e"),
    ("after two clears", "c c a e"),
    ("in header", "t a e"),
    ("one clear after header", "t c a e"),
    ("title after one clear", "t c t a e"),
    ("two clears after header", "t c c a e"),
    ("title after two clears", "t c c t a e"),
    ("in body", "o a e"),
    ("clear in body", "o c a e"),
    ("title after clear in body", "o c t a e"),
];

#[test]
fn test_bad_token_in_every_state() {
    for (state, input) in BAD_TOKEN_CASES {
        let tokens = letters(input);
        let index = tokens.len() - 2;
        assert_eq!(
            parse(&tokens),
            Err(ParseError::BadToken { token: Token::Alternate, index }),
            "state: {state}"
        );
    }
}

#[test]
fn test_bad_token_message() {
    let err = ParseError::BadToken { token: Token::Alternate, index: 0 };
    assert_eq!(err.to_string(), "bad token, a, for line 1");
}
