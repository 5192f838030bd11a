use std::{collections::HashMap, fmt, rc::Rc};

use tracing::warn;

use crate::{
    arg::{peek_token, ArgValue, FromArgValue, OptionSet, ParseOutcome},
    lookup::{Catalog, ClientDataStore, Roster},
    parsers::{
        BoolParser,
        CatalogParser,
        CommandParser,
        FloatParser,
        IntParser,
        LiteralParser,
        OfflinePlayerParser,
        OnlinePlayerParser,
        PlayerSelectorParser,
        QuotedStringParser,
        TokenParser,
    },
    registry::CommandRegistry,
};

/// Names a kind of argument a command slot may accept. The value is only an identifier; the
/// behavior behind it is whatever parser was registered for it in a [`TypeRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentType {
    /// A single space-delimited token.
    String,
    /// A token, or a double-quoted run of words.
    QuotedString,
    /// `true` or `false`, ignoring case.
    Bool,
    /// A signed 32-bit integer.
    Int,
    /// A float.
    Float,
    /// A sentinel word which only matches itself.
    Literal(&'static str),
    /// An entry of a named catalog, addressed by index or by name prefix.
    Lookup(&'static str),
    /// A connected player, addressed as `@id`, `#n` or by name.
    OnlinePlayer,
    /// A set of connected players selected with `*`, `*d` or `*e`.
    OnlinePlayers,
    /// Any player with persisted data, addressed as `@id`.
    OfflinePlayer,
    /// The id of a registered command.
    Command,
    /// A host-defined type.
    Custom(&'static str),
}

impl ArgumentType {
    /// The `default` marker.
    pub const DEFAULT: ArgumentType = ArgumentType::Literal("default");
    /// The `reset` marker.
    pub const RESET: ArgumentType = ArgumentType::Literal("reset");
    /// The map catalog.
    pub const MAP: ArgumentType = ArgumentType::Lookup("map");
    /// The item catalog.
    pub const ITEM: ArgumentType = ArgumentType::Lookup("item");
    /// The game mode catalog.
    pub const GAME_MODE: ArgumentType = ArgumentType::Lookup("game-mode");
}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgumentType::String => f.write_str("string"),
            ArgumentType::QuotedString => f.write_str("quoted-string"),
            ArgumentType::Bool => f.write_str("bool"),
            ArgumentType::Int => f.write_str("int"),
            ArgumentType::Float => f.write_str("float"),
            ArgumentType::Literal(literal) => write!(f, "literal:{}", literal),
            ArgumentType::Lookup(name) | ArgumentType::Custom(name) => f.write_str(name),
            ArgumentType::OnlinePlayer => f.write_str("online-player"),
            ArgumentType::OnlinePlayers => f.write_str("multi-player-selector"),
            ArgumentType::OfflinePlayer => f.write_str("offline-player"),
            ArgumentType::Command => f.write_str("command-reference"),
        }
    }
}

/// Parsing and option listing for one [`ArgumentType`].
///
/// Parsers consume a prefix of the remaining argument text and report the rest. Option listing is
/// deliberately independent of parse success: text that fails to parse should still yield the
/// candidates it could be completed to.
pub trait ArgumentParser {
    /// Parses the front of `args`.
    fn parse<'a>(&self, args: &'a str, ctx: &ParseContext<'_>) -> ParseOutcome<'a>;

    /// Every candidate this type could offer, before filtering by what has been typed.
    fn candidates(&self, _ctx: &ParseContext<'_>) -> Vec<String> {
        Vec::new()
    }

    /// Candidates consistent with the front of `args`, plus the parse bookkeeping. The default
    /// keeps the candidates which start with the text the parser read, or with the leading token if
    /// the parser read nothing.
    fn options<'a>(&self, args: &'a str, ctx: &ParseContext<'_>) -> OptionSet<'a> {
        let outcome = self.parse(args, ctx);
        let typed = if outcome.consumed.is_empty() {
            peek_token(args)
        } else {
            outcome.consumed
        };

        let candidates = self
            .candidates(ctx)
            .into_iter()
            .filter(|candidate| candidate.starts_with(typed))
            .collect();
        OptionSet::from_outcome(outcome, candidates)
    }
}

/// Maps argument types to their parsers. Each type may be registered once.
#[derive(Default)]
pub struct TypeRegistry {
    parsers: HashMap<ArgumentType, Box<dyn ArgumentParser>>,
    order: Vec<ArgumentType>,
}

impl TypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every type which needs no host collaborator: strings, booleans,
    /// numbers, the `default`/`reset` markers and command references.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(ArgumentType::String, TokenParser);
        registry.register(ArgumentType::QuotedString, QuotedStringParser);
        registry.register(ArgumentType::Bool, BoolParser);
        registry.register(ArgumentType::Int, IntParser);
        registry.register(ArgumentType::Float, FloatParser);
        registry.register(ArgumentType::DEFAULT, LiteralParser::new("default"));
        registry.register(ArgumentType::RESET, LiteralParser::new("reset"));
        registry.register(ArgumentType::Command, CommandParser);
        registry
    }

    /// Registers a parser for `ty`. Returns `false` and keeps the existing parser if `ty` is
    /// already registered.
    pub fn register<P>(&mut self, ty: ArgumentType, parser: P) -> bool
    where P: ArgumentParser + 'static {
        if self.contains(ty) {
            warn!(argument_type = %ty, "argument type is already registered");
            return false;
        }

        self.parsers.insert(ty, Box::new(parser));
        self.order.push(ty);
        true
    }

    /// Registers a keyed lookup over `catalog` under [`ArgumentType::Lookup`]`(name)`.
    pub fn register_catalog(&mut self, name: &'static str, catalog: Rc<dyn Catalog>) -> bool {
        self.register(ArgumentType::Lookup(name), CatalogParser::new(catalog))
    }

    /// Registers the online player and multi-player selector types over `roster`.
    ///
    /// Registers neither and returns `false` if either type already has a parser.
    pub fn register_roster(&mut self, roster: Rc<dyn Roster>) -> bool {
        let taken = [ArgumentType::OnlinePlayer, ArgumentType::OnlinePlayers]
            .into_iter()
            .filter(|&ty| self.contains(ty))
            .collect::<Vec<_>>();
        if !taken.is_empty() {
            for ty in taken {
                warn!(argument_type = %ty, "argument type is already registered");
            }
            return false;
        }

        self.register(ArgumentType::OnlinePlayer, OnlinePlayerParser::new(roster.clone()))
            && self.register(ArgumentType::OnlinePlayers, PlayerSelectorParser::new(roster))
    }

    /// Registers the offline player type, offering candidates from `store` if there is one.
    pub fn register_offline_players(&mut self, store: Option<Rc<dyn ClientDataStore>>) -> bool {
        self.register(ArgumentType::OfflinePlayer, OfflinePlayerParser::new(store))
    }

    /// Returns whether `ty` has a parser.
    pub fn contains(&self, ty: ArgumentType) -> bool {
        self.parsers.contains_key(&ty)
    }

    /// Returns the parser registered for `ty`.
    pub fn get(&self, ty: ArgumentType) -> Option<&dyn ArgumentParser> {
        self.parsers.get(&ty).map(|parser| parser.as_ref())
    }

    /// Registered types in registration order.
    pub fn types(&self) -> impl Iterator<Item = ArgumentType> + '_ {
        self.order.iter().copied()
    }
}

/// Everything a parser may consult while parsing: the type registry, so parsers can delegate to one
/// another, and the command registry for command references.
#[derive(Clone, Copy)]
pub struct ParseContext<'r> {
    types: &'r TypeRegistry,
    commands: &'r CommandRegistry,
}

impl<'r> ParseContext<'r> {
    /// Creates a context over the given registries.
    pub fn new(types: &'r TypeRegistry, commands: &'r CommandRegistry) -> Self {
        ParseContext { types, commands }
    }

    /// The type registry.
    pub fn types(&self) -> &'r TypeRegistry {
        self.types
    }

    /// The command registry.
    pub fn commands(&self) -> &'r CommandRegistry {
        self.commands
    }

    /// Parses the front of `args` as `ty`. Unregistered types fail without reading anything.
    pub fn parse<'a>(&self, ty: ArgumentType, args: &'a str) -> ParseOutcome<'a> {
        match self.types.get(ty) {
            Some(parser) => parser.parse(args, self),
            None => ParseOutcome::untouched(args),
        }
    }

    /// Parses the front of `args` as `ty` and converts the value to `T`. A value of an unexpected
    /// kind turns the outcome into a failure.
    pub fn parse_as<'a, T>(&self, ty: ArgumentType, args: &'a str) -> ParseOutcome<'a, T>
    where T: FromArgValue {
        self.parse(ty, args).and_then(ArgValue::into_typed)
    }

    /// Lists the options of `ty` for the front of `args`. Unregistered types offer nothing.
    pub fn options<'a>(&self, ty: ArgumentType, args: &'a str) -> OptionSet<'a> {
        match self.types.get(ty) {
            Some(parser) => parser.options(args, self),
            None => OptionSet::empty(args),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Shout;

    impl ArgumentParser for Shout {
        fn parse<'a>(&self, args: &'a str, _ctx: &ParseContext<'_>) -> ParseOutcome<'a> {
            crate::arg::parse_token(args).and_then(|token| {
                if !token.is_empty() && token.chars().all(|ch| ch.is_uppercase()) {
                    Some(ArgValue::Str(token.to_owned()))
                } else {
                    None
                }
            })
        }

        fn candidates(&self, _ctx: &ParseContext<'_>) -> Vec<String> {
            vec!["HEY".to_owned(), "HELLO".to_owned(), "STOP".to_owned()]
        }
    }

    #[test]
    fn duplicate_registration_keeps_first() {
        let mut types = TypeRegistry::with_builtins();
        let commands = CommandRegistry::new();

        assert!(types.register(ArgumentType::Custom("shout"), Shout));
        assert!(!types.register(ArgumentType::Custom("shout"), TokenParser));
        assert!(!types.register(ArgumentType::Bool, TokenParser));

        let ctx = ParseContext::new(&types, &commands);
        assert!(!ctx.parse(ArgumentType::Custom("shout"), "quiet").is_success());
        assert_eq!(ctx.parse_as::<bool>(ArgumentType::Bool, "t").value, Some(true));
    }

    #[test]
    fn unregistered_types_fail_gracefully() {
        let types = TypeRegistry::new();
        let commands = CommandRegistry::new();
        let ctx = ParseContext::new(&types, &commands);

        let outcome = ctx.parse(ArgumentType::MAP, "desert");
        assert!(!outcome.is_success());
        assert_eq!(outcome.remainder, "desert");

        let options = ctx.options(ArgumentType::MAP, "desert");
        assert!(options.candidates.is_empty());
        assert!(!options.valid);
    }

    #[test]
    fn default_options_filter_by_typed_text() {
        let mut types = TypeRegistry::new();
        types.register(ArgumentType::Custom("shout"), Shout);
        let commands = CommandRegistry::new();
        let ctx = ParseContext::new(&types, &commands);

        let options = ctx.options(ArgumentType::Custom("shout"), "HE");
        assert_eq!(options.candidates, vec!["HEY", "HELLO"]);
        assert!(options.valid);

        let options = ctx.options(ArgumentType::Custom("shout"), "he");
        assert!(options.candidates.is_empty());
        assert!(!options.valid);
        assert_eq!(options.consumed, "he");
    }

    #[test]
    fn collaborator_types_register_once() {
        let mut types = TypeRegistry::with_builtins();
        let roster: Rc<dyn Roster> = Rc::new(Vec::<crate::lookup::RosterMember>::new());
        assert!(types.register_roster(roster.clone()));
        assert!(!types.register_roster(roster));
        assert!(types.contains(ArgumentType::OnlinePlayers));

        assert!(types.register_catalog("map", Rc::new(vec!["Desert".to_owned()])));
        assert!(types.contains(ArgumentType::MAP));
        assert!(types.register_offline_players(None));
    }

    #[test]
    fn roster_registration_is_all_or_nothing() {
        let mut types = TypeRegistry::with_builtins();
        assert!(types.register(ArgumentType::OnlinePlayers, TokenParser));

        let roster: Rc<dyn Roster> = Rc::new(Vec::<crate::lookup::RosterMember>::new());
        assert!(!types.register_roster(roster));
        assert!(!types.contains(ArgumentType::OnlinePlayer));
    }

    #[test]
    fn types_enumerate_in_registration_order() {
        let types = TypeRegistry::with_builtins();
        let listed = types.types().collect::<Vec<_>>();
        assert_eq!(listed.first(), Some(&ArgumentType::String));
        assert_eq!(listed.last(), Some(&ArgumentType::Command));
        assert_eq!(listed.len(), 8);
    }

    #[test]
    fn parse_as_rejects_other_kinds() {
        let types = TypeRegistry::with_builtins();
        let commands = CommandRegistry::new();
        let ctx = ParseContext::new(&types, &commands);

        let outcome = ctx.parse_as::<i32>(ArgumentType::Bool, "true");
        assert!(!outcome.is_success());
        assert_eq!(outcome.consumed, "true");
    }
}
