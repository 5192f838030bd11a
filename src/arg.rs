use lazy_static::lazy_static;
use regex::Regex;
use std::{iter::Peekable, str::CharIndices};

/// Walks the remaining argument text one token at a time. Tokens are delimited by a single space;
/// consecutive spaces therefore produce empty tokens, mirroring how the text was typed.
pub struct ArgumentTraverser<'a> {
    args: &'a str,
    chars: Peekable<CharIndices<'a>>,
    anchor: usize,
    index: usize,
}

impl<'a> ArgumentTraverser<'a> {
    /// Creates a traverser positioned at the start of `args`.
    pub fn new(args: &'a str) -> Self {
        ArgumentTraverser {
            args,
            chars: args.char_indices().peekable(),
            anchor: 0,
            index: 0,
        }
    }

    /// Returns whether any text remains to be read. An empty token after a trailing separator does
    /// not count as remaining text.
    pub fn has_next(&self) -> bool {
        self.index < self.args.len()
    }

    /// Returns the text which has not been read yet.
    pub fn remaining(&self) -> &'a str {
        &self.args[self.index ..]
    }

    /// Reads the next space-delimited token, consuming the separator that follows it. Returns
    /// `None` once the text is exhausted.
    pub fn next_token(&mut self) -> Option<&'a str> {
        if !self.has_next() {
            return None;
        }

        self.anchor = self.index;
        let end = loop {
            match self.chars.next() {
                Some((index, ' ')) => {
                    self.index = index + 1;
                    break index;
                }
                Some(_) => {}
                None => {
                    self.index = self.args.len();
                    break self.args.len();
                }
            }
        };

        Some(&self.args[self.anchor .. end])
    }

    /// Reads the next token, joining whitespace-separated tokens when it opens with a double quote
    /// until a token closing with a double quote is found. An unterminated quote runs to the end of
    /// the text. Returns the verbatim source slice and the dequoted value.
    pub fn next_quoted(&mut self) -> Option<(&'a str, &'a str)> {
        if !self.has_next() {
            return None;
        }

        if !self.remaining().starts_with('"') {
            return self.next_token().map(|token| (token, token));
        }

        self.anchor = self.index;
        // Skip the opening quote so that a lone `"` does not also count as the closing one
        self.chars.next();
        let body_start = self.anchor + 1;
        let mut token_start = body_start;

        let (value_end, source_end) = loop {
            let end = match self.chars.peek().copied() {
                Some((index, ' ')) => {
                    self.chars.next();
                    index
                }
                Some(_) => {
                    self.chars.next();
                    continue;
                }
                None => self.args.len(),
            };

            let token = &self.args[token_start .. end];
            if token.ends_with('"') {
                self.index = (end + 1).min(self.args.len());
                break (end - 1, end);
            }

            if end == self.args.len() {
                self.index = end;
                break (end, end);
            }

            token_start = end + 1;
        };

        Some((
            &self.args[self.anchor .. source_end],
            &self.args[body_start .. value_end],
        ))
    }
}

/// Returns the leading space-delimited token of `args` without consuming anything.
pub fn peek_token(args: &str) -> &str {
    args.split(' ').next().unwrap_or_default()
}

/// The result of running a parser over the front of some argument text.
///
/// `consumed` is the verbatim source text that was matched, including quotes or sigils, and
/// `remainder` is everything after the separator following it. For any successfully parsed token
/// `consumed`, one space, and `remainder` reconstruct the input (a trailing separator leaves the
/// remainder empty). On failure `value` is `None`; `consumed` and `remainder` still report how far
/// the parser read so suggestions can highlight the offending text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome<'a, T = ArgValue> {
    /// The parsed value, present only when parsing succeeded.
    pub value: Option<T>,
    /// The verbatim text that was read.
    pub consumed: &'a str,
    /// The unconsumed tail.
    pub remainder: &'a str,
}

impl<'a, T> ParseOutcome<'a, T> {
    /// A successful outcome.
    pub fn success(value: T, consumed: &'a str, remainder: &'a str) -> Self {
        ParseOutcome {
            value: Some(value),
            consumed,
            remainder,
        }
    }

    /// A failed outcome which read `consumed` before giving up.
    pub fn failure(consumed: &'a str, remainder: &'a str) -> Self {
        ParseOutcome {
            value: None,
            consumed,
            remainder,
        }
    }

    /// A failed outcome which did not read anything from `args`.
    pub fn untouched(args: &'a str) -> Self {
        Self::failure("", args)
    }

    /// Whether the parse succeeded.
    pub fn is_success(&self) -> bool {
        self.value.is_some()
    }

    /// Maps the parsed value, leaving the text bookkeeping untouched.
    pub fn map<U, F>(self, f: F) -> ParseOutcome<'a, U>
    where F: FnOnce(T) -> U {
        ParseOutcome {
            value: self.value.map(f),
            consumed: self.consumed,
            remainder: self.remainder,
        }
    }

    /// Like [`map`](ParseOutcome::map), but the conversion may reject the value, turning the outcome
    /// into a failure over the same text.
    pub fn and_then<U, F>(self, f: F) -> ParseOutcome<'a, U>
    where F: FnOnce(T) -> Option<U> {
        ParseOutcome {
            value: self.value.and_then(f),
            consumed: self.consumed,
            remainder: self.remainder,
        }
    }
}

/// Completion candidates for the front of some argument text, together with the parse bookkeeping
/// used to decide where the next argument starts. Candidates are produced whether or not the text
/// parsed successfully.
#[derive(Debug, Clone, PartialEq)]
pub struct OptionSet<'a> {
    /// Candidate completions consistent with what has been typed so far.
    pub candidates: Vec<String>,
    /// The verbatim text that was read.
    pub consumed: &'a str,
    /// The unconsumed tail.
    pub remainder: &'a str,
    /// Whether the text parsed successfully.
    pub valid: bool,
}

impl<'a> OptionSet<'a> {
    /// Builds an option set from the outcome of a parse.
    pub fn from_outcome<T>(outcome: ParseOutcome<'a, T>, candidates: Vec<String>) -> Self {
        OptionSet {
            candidates,
            valid: outcome.is_success(),
            consumed: outcome.consumed,
            remainder: outcome.remainder,
        }
    }

    /// The option set for an unregistered type: no candidates, nothing read.
    pub fn empty(args: &'a str) -> Self {
        OptionSet {
            candidates: Vec::new(),
            consumed: "",
            remainder: args,
            valid: false,
        }
    }
}

/// A player as referenced by commands: the platform's raw numeric identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(pub u64);

impl ClientId {
    /// Returns the raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

/// An entry resolved from a keyed lookup catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Position of the entry in the catalog's own order.
    pub index: usize,
    /// The entry's display name.
    pub name: String,
}

/// A parsed argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// A plain token or a dequoted string.
    Str(String),
    /// A `true`/`false` token.
    Bool(bool),
    /// A signed 32-bit integer.
    Int(i32),
    /// A single-precision float.
    Float(f32),
    /// A literal marker such as `default`.
    Literal(&'static str),
    /// An entry of a keyed lookup catalog.
    Entry(CatalogEntry),
    /// A single player.
    Client(ClientId),
    /// The players matched by a selector.
    Clients(Vec<ClientId>),
    /// The id of a registered command.
    Command(String),
}

impl ArgValue {
    /// Converts the value into `T`, returning `None` if it is of a different kind.
    pub fn into_typed<T: FromArgValue>(self) -> Option<T> {
        T::from_value(self)
    }
}

/// Explicit conversion out of an [`ArgValue`]. Implemented for every value kind the built-in parsers
/// produce so callers can ask for the type they expect.
pub trait FromArgValue: Sized {
    /// Converts the value, returning `None` if it is of a different kind.
    fn from_value(value: ArgValue) -> Option<Self>;
}

impl FromArgValue for ArgValue {
    fn from_value(value: ArgValue) -> Option<Self> {
        Some(value)
    }
}

macro_rules! impl_from_arg_value {
    ($ty:ty, $($pattern:pat => $out:expr),+) => {
        impl FromArgValue for $ty {
            fn from_value(value: ArgValue) -> Option<Self> {
                match value {
                    $( $pattern => Some($out), )+
                    _ => None,
                }
            }
        }
    };
}

impl_from_arg_value!(String, ArgValue::Str(s) => s, ArgValue::Command(id) => id);
impl_from_arg_value!(bool, ArgValue::Bool(b) => b);
impl_from_arg_value!(i32, ArgValue::Int(n) => n);
impl_from_arg_value!(f32, ArgValue::Float(f) => f);
impl_from_arg_value!(CatalogEntry, ArgValue::Entry(entry) => entry);
impl_from_arg_value!(ClientId, ArgValue::Client(id) => id);
impl_from_arg_value!(Vec<ClientId>, ArgValue::Clients(ids) => ids, ArgValue::Client(id) => vec![id]);

/// Reads a single token. Fails only on empty input.
pub fn parse_token(args: &str) -> ParseOutcome<'_, &str> {
    let mut traverser = ArgumentTraverser::new(args);
    match traverser.next_token() {
        Some(token) => ParseOutcome::success(token, token, traverser.remaining()),
        None => ParseOutcome::untouched(args),
    }
}

/// Reads a token which may be a double-quoted run of several space-separated words. The value is
/// the dequoted text.
pub fn parse_quoted(args: &str) -> ParseOutcome<'_, &str> {
    let mut traverser = ArgumentTraverser::new(args);
    match traverser.next_quoted() {
        Some((source, value)) => ParseOutcome::success(value, source, traverser.remaining()),
        None => ParseOutcome::untouched(args),
    }
}

/// Reads a boolean. Any non-empty prefix of `true` or `false` is accepted.
pub fn parse_bool(args: &str) -> ParseOutcome<'_, bool> {
    parse_token(args).and_then(|token| {
        if token.is_empty() {
            None
        } else if "true".starts_with(token) {
            Some(true)
        } else if "false".starts_with(token) {
            Some(false)
        } else {
            None
        }
    })
}

lazy_static! {
    static ref INTEGER: Regex = Regex::new(r"^[+-]?[0-9]+$").unwrap();
    static ref FLOAT: Regex = Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)$").unwrap();
    static ref UNSIGNED: Regex = Regex::new(r"^[0-9]+$").unwrap();
}

/// Reads a 32-bit integer with an optional leading sign.
pub fn parse_int(args: &str) -> ParseOutcome<'_, i32> {
    parse_token(args).and_then(|token| {
        if INTEGER.is_match(token) {
            token.parse::<i32>().ok()
        } else {
            None
        }
    })
}

/// Reads a float with an optional leading sign and decimal point. Exponents and suffixes are not
/// accepted.
pub fn parse_float(args: &str) -> ParseOutcome<'_, f32> {
    parse_token(args).and_then(|token| {
        if !FLOAT.is_match(token) {
            return None;
        }

        let (sign, digits) = match token.strip_prefix(|ch: char| ch == '+' || ch == '-') {
            Some(digits) => (&token[.. 1], digits),
            None => ("", token),
        };

        let normalized = if digits.starts_with('.') {
            format!("{}0{}", sign, digits)
        } else if digits.ends_with('.') {
            format!("{}{}0", sign, digits)
        } else {
            token.to_owned()
        };

        normalized.parse::<f32>().ok()
    })
}

/// Parses an unsigned identifier made of digits only, with no sign or separators.
pub fn parse_unsigned(digits: &str) -> Option<u64> {
    if UNSIGNED.is_match(digits) {
        digits.parse::<u64>().ok()
    } else {
        None
    }
}
