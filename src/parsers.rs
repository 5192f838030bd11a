//! The built-in argument parsers.
//!
//! Every parser reads from the front of the remaining argument text and leaves the rest for the
//! next slot. Parsers backed by host collections hold the collaborator behind an `Rc` so that the
//! host can keep mutating its own state while the registry is alive.

use std::rc::Rc;

use crate::{
    arg::{
        parse_bool,
        parse_float,
        parse_int,
        parse_quoted,
        parse_token,
        parse_unsigned,
        peek_token,
        ArgValue,
        CatalogEntry,
        OptionSet,
        ParseOutcome,
    },
    lookup::{Catalog, ClientDataStore, Roster, RosterMember},
    types::{ArgumentParser, ParseContext},
    ClientId,
};

/// A single space-delimited token.
pub struct TokenParser;

impl ArgumentParser for TokenParser {
    fn parse<'a>(&self, args: &'a str, _ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
        parse_token(args).map(|token| ArgValue::Str(token.to_owned()))
    }
}

/// A token, or a double-quoted run of words yielding the dequoted text.
pub struct QuotedStringParser;

impl ArgumentParser for QuotedStringParser {
    fn parse<'a>(&self, args: &'a str, _ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
        parse_quoted(args).map(|value| ArgValue::Str(value.to_owned()))
    }
}

/// `true` or `false`, or any non-empty prefix of either.
pub struct BoolParser;

impl ArgumentParser for BoolParser {
    fn parse<'a>(&self, args: &'a str, _ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
        parse_bool(args).map(ArgValue::Bool)
    }

    fn candidates(&self, _ctx: &ParseContext<'_>) -> Vec<String> {
        vec!["true".to_owned(), "false".to_owned()]
    }
}

/// A signed 32-bit integer.
pub struct IntParser;

impl ArgumentParser for IntParser {
    fn parse<'a>(&self, args: &'a str, _ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
        parse_int(args).map(ArgValue::Int)
    }
}

/// A float, written with or without a fractional part.
pub struct FloatParser;

impl ArgumentParser for FloatParser {
    fn parse<'a>(&self, args: &'a str, _ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
        parse_float(args).map(ArgValue::Float)
    }
}

/// Matches one fixed word exactly.
pub struct LiteralParser {
    literal: &'static str,
}

impl LiteralParser {
    /// A parser matching exactly `literal`.
    pub fn new(literal: &'static str) -> Self {
        LiteralParser { literal }
    }
}

impl ArgumentParser for LiteralParser {
    fn parse<'a>(&self, args: &'a str, _ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
        let literal = self.literal;
        parse_token(args).and_then(|token| (token == literal).then_some(ArgValue::Literal(literal)))
    }

    fn candidates(&self, _ctx: &ParseContext<'_>) -> Vec<String> {
        vec![self.literal.to_owned()]
    }
}

/// The id of a registered command.
pub struct CommandParser;

impl ArgumentParser for CommandParser {
    fn parse<'a>(&self, args: &'a str, ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
        parse_token(args).and_then(|token| {
            ctx.commands()
                .contains(token)
                .then(|| ArgValue::Command(token.to_owned()))
        })
    }

    fn candidates(&self, ctx: &ParseContext<'_>) -> Vec<String> {
        ctx.commands().ids().map(str::to_owned).collect()
    }
}

/// Lower-cases a display name and strips its spaces, giving the form names are typed in.
pub fn normalize_name(name: &str) -> String {
    name.chars()
        .filter(|&ch| ch != ' ')
        .flat_map(char::to_lowercase)
        .collect()
}

/// An entry of a [`Catalog`], addressed either by its index or by a prefix of its normalized name.
///
/// When the text is an integer it must be a valid index; it is never reinterpreted as a name.
/// Otherwise entries are scanned in ascending normalized-name order, the same order
/// [`ArgumentParser::candidates`] lists them in, and the first whose normalized name starts with
/// the lower-cased text wins. Entries with equal normalized names keep catalog order.
pub struct CatalogParser {
    catalog: Rc<dyn Catalog>,
}

impl CatalogParser {
    /// A parser over the live contents of `catalog`.
    pub fn new(catalog: Rc<dyn Catalog>) -> Self {
        CatalogParser { catalog }
    }
}

impl ArgumentParser for CatalogParser {
    fn parse<'a>(&self, args: &'a str, _ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
        if args.is_empty() {
            return ParseOutcome::untouched(args);
        }

        let names = self.catalog.names();

        let index = parse_int(args);
        if let Some(number) = index.value {
            let entry = usize::try_from(number).ok().and_then(|number| {
                names.get(number).map(|name| CatalogEntry {
                    index: number,
                    name: name.clone(),
                })
            });

            return ParseOutcome {
                value: entry.map(ArgValue::Entry),
                consumed: index.consumed,
                remainder: index.remainder,
            };
        }

        parse_token(args).and_then(|token| {
            if token.is_empty() {
                return None;
            }

            let query = token.to_lowercase();
            let mut sorted = names.into_iter().enumerate().collect::<Vec<_>>();
            sorted.sort_by_cached_key(|(_, name)| normalize_name(name));
            sorted
                .into_iter()
                .find(|(_, name)| normalize_name(name).starts_with(&query))
                .map(|(index, name)| ArgValue::Entry(CatalogEntry { index, name }))
        })
    }

    fn candidates(&self, _ctx: &ParseContext<'_>) -> Vec<String> {
        let mut names = self
            .catalog
            .names()
            .iter()
            .map(|name| normalize_name(name))
            .collect::<Vec<_>>();
        names.sort();
        names
    }

    fn options<'a>(&self, args: &'a str, ctx: &ParseContext<'_>) -> OptionSet<'a> {
        let outcome = self.parse(args, ctx);
        let typed = peek_token(args).to_lowercase();
        let candidates = self
            .candidates(ctx)
            .into_iter()
            .filter(|candidate| candidate.starts_with(&typed))
            .collect();
        OptionSet::from_outcome(outcome, candidates)
    }
}

/// Quotes a player name when it could not be typed back as a single bare token.
pub fn quote_name(name: &str) -> String {
    if name.contains(' ') || name.contains('"') || name.starts_with('@') || name.starts_with('#') {
        format!("\"{}\"", name)
    } else {
        name.to_owned()
    }
}

// Exact matches win outright; otherwise the first prefix match in roster order.
fn find_by_name(members: &[RosterMember], query: &str) -> Option<ClientId> {
    if query.is_empty() {
        return None;
    }

    let mut found = None;
    for member in members {
        if member.name == query {
            return Some(member.id);
        }

        if found.is_none() && member.name.starts_with(query) {
            found = Some(member.id);
        }
    }

    found
}

// `@<digits>`: a raw identifier, accepted whether or not anyone by that id is known.
fn parse_raw_id(args: &str) -> ParseOutcome<'_> {
    parse_token(args).and_then(|token| {
        token
            .strip_prefix('@')
            .and_then(parse_unsigned)
            .map(|id| ArgValue::Client(ClientId(id)))
    })
}

/// A connected player: `@<id>` for a raw identifier, `#<n>` for the n-th player in the lobby, or a
/// (possibly quoted) name. Name lookups prefer an exact match anywhere in the roster over the first
/// prefix match.
pub struct OnlinePlayerParser {
    roster: Rc<dyn Roster>,
}

impl OnlinePlayerParser {
    /// A parser over the live contents of `roster`.
    pub fn new(roster: Rc<dyn Roster>) -> Self {
        OnlinePlayerParser { roster }
    }
}

impl ArgumentParser for OnlinePlayerParser {
    fn parse<'a>(&self, args: &'a str, _ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
        if args.is_empty() {
            return ParseOutcome::untouched(args);
        }

        if args.starts_with('@') {
            return parse_raw_id(args);
        }

        if let Some(number) = args.strip_prefix('#') {
            let number = parse_int(number);
            let members = self.roster.members();
            let member = number
                .value
                .and_then(|number| usize::try_from(number).ok())
                .filter(|&number| number >= 1)
                .and_then(|number| members.get(number - 1));

            return ParseOutcome {
                value: member.map(|member| ArgValue::Client(member.id)),
                consumed: &args[.. 1 + number.consumed.len()],
                remainder: number.remainder,
            };
        }

        let members = self.roster.members();
        parse_quoted(args)
            .and_then(|query| find_by_name(&members, query))
            .map(ArgValue::Client)
    }

    fn candidates(&self, _ctx: &ParseContext<'_>) -> Vec<String> {
        let members = self.roster.members();
        let names = members.iter().map(|member| quote_name(&member.name));
        let numbers = (1 ..= members.len()).map(|number| format!("#{}", number));
        let ids = members.iter().map(|member| format!("@{}", member.id.get()));
        names.chain(numbers).chain(ids).collect()
    }
}

/// A selection of connected players: `*` for everyone alive, `*d` for the dead or spectating and
/// `*e` for everyone.
pub struct PlayerSelectorParser {
    roster: Rc<dyn Roster>,
}

impl PlayerSelectorParser {
    /// A selector over the live contents of `roster`.
    pub fn new(roster: Rc<dyn Roster>) -> Self {
        PlayerSelectorParser { roster }
    }
}

impl ArgumentParser for PlayerSelectorParser {
    fn parse<'a>(&self, args: &'a str, _ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
        if !args.starts_with('*') {
            return ParseOutcome::untouched(args);
        }

        parse_token(args).and_then(|selector| {
            let filter: fn(&RosterMember) -> bool = match selector {
                "*" => |member| member.alive,
                "*d" => |member| !member.alive,
                "*e" => |_| true,
                _ => return None,
            };

            let selected = self
                .roster
                .members()
                .iter()
                .filter(|member| filter(member))
                .map(|member| member.id)
                .collect();
            Some(ArgValue::Clients(selected))
        })
    }

    fn candidates(&self, _ctx: &ParseContext<'_>) -> Vec<String> {
        vec!["*".to_owned(), "*d".to_owned(), "*e".to_owned()]
    }
}

/// Any player by raw identifier, `@<id>`, whether or not they are connected. Candidates come from
/// the persisted client data when a store is available.
pub struct OfflinePlayerParser {
    store: Option<Rc<dyn ClientDataStore>>,
}

impl OfflinePlayerParser {
    /// Creates the parser. Without a store it still parses, but offers no candidates.
    pub fn new(store: Option<Rc<dyn ClientDataStore>>) -> Self {
        OfflinePlayerParser { store }
    }
}

impl ArgumentParser for OfflinePlayerParser {
    fn parse<'a>(&self, args: &'a str, _ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
        if !args.starts_with('@') {
            return ParseOutcome::untouched(args);
        }

        parse_raw_id(args)
    }

    fn candidates(&self, _ctx: &ParseContext<'_>) -> Vec<String> {
        match &self.store {
            Some(store) => store
                .client_ids()
                .into_iter()
                .map(|id| format!("@{}", id.get()))
                .collect(),
            None => Vec::new(),
        }
    }
}
