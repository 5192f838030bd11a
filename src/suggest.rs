//! The live suggestion overlay.
//!
//! While the field holds a command invocation, every tick re-parses it, colors the text that does
//! not parse and appends the rest of the selected completion as a "ghost" span. The field itself
//! holds the decorated text, so the engine strips its own markup before reading the input back.

use tracing::trace;

use crate::{
    arg::OptionSet,
    config::{strip_prefix_ignore_case, Config},
    types::{ArgumentType, ParseContext},
};

const CLOSE_COLOR: &str = "</color>";

/// The host's text input widget. Positions are byte offsets into [`text`](TextField::text).
pub trait TextField {
    /// The current, possibly decorated, text.
    fn text(&self) -> &str;

    /// Replaces the text.
    fn set_text(&mut self, text: &str);

    /// The caret position.
    fn cursor(&self) -> usize;

    /// Moves the caret.
    fn set_cursor(&mut self, cursor: usize);
}

/// A plain in-memory [`TextField`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBuffer {
    text: String,
    cursor: usize,
}

impl TextBuffer {
    /// Creates a buffer holding `text` with the caret at the end.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let cursor = text.len();
        TextBuffer { text, cursor }
    }

    /// Types `text` at the caret.
    pub fn insert(&mut self, text: &str) {
        self.text.insert_str(self.cursor, text);
        self.cursor += text.len();
    }

    /// Deletes the character before the caret.
    pub fn backspace(&mut self) {
        if let Some(ch) = self.text[.. self.cursor].chars().next_back() {
            self.cursor -= ch.len_utf8();
            self.text.remove(self.cursor);
        }
    }
}

impl TextField for TextBuffer {
    fn text(&self) -> &str {
        &self.text
    }

    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
        let cursor = self.cursor;
        self.set_cursor(cursor);
    }

    fn cursor(&self) -> usize {
        self.cursor
    }

    fn set_cursor(&mut self, cursor: usize) {
        let mut cursor = cursor.min(self.text.len());
        while !self.text.is_char_boundary(cursor) {
            cursor -= 1;
        }
        self.cursor = cursor;
    }
}

/// Navigation keys the host forwards to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    /// Select the next candidate.
    Next,
    /// Select the previous candidate.
    Previous,
    /// Commit the ghost text.
    Accept,
}

/// What a call to [`SuggestionEngine::update`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The field does not hold a command. If it just stopped holding one, its decorations were
    /// removed.
    Idle,
    /// Nothing changed since the last tick.
    Unchanged,
    /// The field was re-decorated.
    Rendered,
    /// The selected completion was written into the field as plain text.
    Committed,
}

/// What the engine remembers between ticks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SuggestionState {
    rendered: String,
    input: String,
    cursor: usize,
    selected: Option<String>,
}

impl SuggestionState {
    /// The text last seen in or written to the field, decorations included.
    pub fn rendered(&self) -> &str {
        &self.rendered
    }

    /// The last logical input, without decorations.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// The last caret position within the logical input.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The last selected candidate.
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

// Where the input stops being valid and which candidates apply. Offsets are into the text after
// the prefix.
struct Analysis {
    valid_end: usize,
    invalid: bool,
    typed_start: usize,
    candidates: Vec<String>,
}

fn command_ids(ctx: &ParseContext<'_>, typed: &str) -> Vec<String> {
    ctx.commands()
        .ids()
        .filter(|id| id.starts_with(typed))
        .map(str::to_owned)
        .collect()
}

fn merge_candidates(into: &mut Vec<String>, options: &OptionSet<'_>) {
    for candidate in &options.candidates {
        if !into.contains(candidate) {
            into.push(candidate.clone());
        }
    }
}

// Walks the command's slots the way its own argument parsing would, collecting the candidates of
// the slot that is being typed or that failed.
fn analyze(ctx: &ParseContext<'_>, body: &str) -> Analysis {
    let offset = |rest: &str| body.len() - rest.len();

    let outcome = ctx.parse_as::<String>(ArgumentType::Command, body);
    let command = outcome
        .value
        .as_deref()
        .and_then(|id| ctx.commands().get(id));

    let command = match command {
        Some(command) => command,
        None => {
            let candidates = if outcome.remainder.is_empty() {
                command_ids(ctx, outcome.consumed)
            } else {
                Vec::new()
            };

            return Analysis {
                valid_end: 0,
                invalid: !body.is_empty(),
                typed_start: 0,
                candidates,
            };
        }
    };

    // Still typing the command id
    if outcome.consumed.len() == body.len() {
        return Analysis {
            valid_end: body.len(),
            invalid: false,
            typed_start: 0,
            candidates: command_ids(ctx, outcome.consumed),
        };
    }

    let mut rest = outcome.remainder;
    for slot in command.signature().slots() {
        let start = offset(rest);
        let mut candidates = Vec::new();
        let mut chosen = None;
        let mut reached_end = false;

        for &ty in slot.types() {
            let options = ctx.options(ty, rest);
            merge_candidates(&mut candidates, &options);
            reached_end |= options.remainder.is_empty();
            if chosen.is_none() && options.valid {
                chosen = Some(options);
            }
        }

        if rest.is_empty() {
            return Analysis {
                valid_end: start,
                invalid: false,
                typed_start: start,
                candidates,
            };
        }

        match chosen {
            Some(options) if options.consumed.len() == rest.len() =>
                return Analysis {
                    valid_end: body.len(),
                    invalid: false,
                    typed_start: start,
                    candidates,
                },
            Some(options) => rest = options.remainder,
            None =>
                return Analysis {
                    valid_end: start,
                    invalid: true,
                    typed_start: start,
                    candidates: if reached_end { candidates } else { Vec::new() },
                },
        }
    }

    Analysis {
        valid_end: offset(rest),
        invalid: !rest.is_empty(),
        typed_start: body.len(),
        candidates: Vec::new(),
    }
}

// The part of `candidate` not yet typed, or nothing if the candidate does not continue `typed`.
// Characters are compared after Unicode lower-casing, matching how catalog names are normalized.
fn ghost<'c>(candidate: &'c str, typed: &str) -> &'c str {
    let mut rest = candidate;
    for wanted in typed.chars() {
        let mut chars = rest.chars();
        match chars.next() {
            Some(ch) if ch.to_lowercase().eq(wanted.to_lowercase()) => rest = chars.as_str(),
            _ => return "",
        }
    }
    rest
}

/// Drives the suggestion overlay of one text field.
pub struct SuggestionEngine {
    prefix: String,
    invalid_open: String,
    suggestion_open: String,
    state: SuggestionState,
    candidates: Vec<String>,
}

impl SuggestionEngine {
    /// Creates an engine using the configured prefix and colors.
    pub fn new(config: &Config) -> Self {
        SuggestionEngine {
            prefix: config.command_prefix.to_lowercase(),
            invalid_open: format!("<color={}>", config.suggestions.invalid_color),
            suggestion_open: format!("<color={}>", config.suggestions.suggestion_color),
            state: SuggestionState::default(),
            candidates: Vec::new(),
        }
    }

    /// What the engine remembered from the last tick.
    pub fn state(&self) -> &SuggestionState {
        &self.state
    }

    /// The candidates offered on the last rendered tick.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    /// The currently selected candidate.
    pub fn selected(&self) -> Option<&str> {
        self.state.selected()
    }

    /// Forgets everything, as if the field had never been seen.
    pub fn reset(&mut self) {
        self.state = SuggestionState::default();
        self.candidates.clear();
    }

    fn is_command(&self, text: &str) -> bool {
        strip_prefix_ignore_case(text, &self.prefix).is_some()
    }

    fn ghost_start(&self, raw: &str) -> usize {
        raw.find(&self.suggestion_open).unwrap_or(raw.len())
    }

    fn strip(&self, text: &str) -> String {
        text.replace(&self.invalid_open, "").replace(CLOSE_COLOR, "")
    }

    /// The text to actually send for a field holding `raw`: the logical input without decorations
    /// or ghost text.
    pub fn outgoing_text(&self, raw: &str) -> String {
        self.strip(&raw[.. self.ghost_start(raw)])
    }

    /// Runs one tick against `field`, with the navigation key pressed since the last tick, if any.
    pub fn update(
        &mut self,
        ctx: &ParseContext<'_>,
        field: &mut dyn TextField,
        key: Option<NavKey>,
    ) -> TickOutcome {
        let raw = field.text().to_owned();
        let ghost_start = self.ghost_start(&raw);
        if field.cursor() > ghost_start {
            field.set_cursor(ghost_start);
        }

        let input = self.strip(&raw[.. ghost_start]);
        let cursor = raw
            .get(.. field.cursor())
            .map(|before| self.strip(before).len())
            .unwrap_or(input.len())
            .min(input.len());

        let body = match strip_prefix_ignore_case(&input, &self.prefix) {
            Some(body) => body,
            None => {
                let was_command = self.is_command(&self.state.input);
                self.candidates.clear();
                if !was_command {
                    self.state.rendered = raw;
                    self.state.input = input;
                    self.state.cursor = cursor;
                    return TickOutcome::Idle;
                }

                trace!("input is no longer a command");
                field.set_text(&input);
                field.set_cursor(input.len());
                self.state = SuggestionState {
                    rendered: input.clone(),
                    cursor: input.len(),
                    input,
                    selected: None,
                };
                return TickOutcome::Idle;
            }
        };

        if !self.is_command(&self.state.input) {
            trace!("input became a command");
        }

        if key.is_none() && raw == self.state.rendered {
            self.state.cursor = cursor;
            return TickOutcome::Unchanged;
        }

        let analysis = analyze(ctx, body);
        let body_start = input.len() - body.len();
        let typed = &body[analysis.typed_start ..];
        let candidates = analysis.candidates;

        let mut index = self
            .state
            .selected
            .as_ref()
            .and_then(|selected| candidates.iter().position(|candidate| candidate == selected))
            .unwrap_or(0);
        let mut cursor = cursor;

        if !candidates.is_empty() {
            match key {
                Some(NavKey::Next) => {
                    index = (index + 1).min(candidates.len() - 1);
                    cursor = self.state.cursor.min(input.len());
                    trace!(selected = index, "selected next suggestion");
                }
                Some(NavKey::Previous) => {
                    index = index.saturating_sub(1);
                    cursor = self.state.cursor.min(input.len());
                    trace!(selected = index, "selected previous suggestion");
                }
                Some(NavKey::Accept) => {
                    let candidate = &candidates[index];
                    let completion = ghost(candidate, typed);
                    if !completion.is_empty() {
                        let committed = format!("{}{}", input, completion);
                        field.set_text(&committed);
                        field.set_cursor(committed.len());
                        trace!(candidate = %candidate, "accepted suggestion");

                        self.state = SuggestionState {
                            rendered: raw,
                            cursor: committed.len(),
                            input: committed,
                            selected: Some(candidate.clone()),
                        };
                        self.candidates = candidates;
                        return TickOutcome::Committed;
                    }
                }
                None => {}
            }
        }

        let valid_end = body_start + analysis.valid_end;
        let tail = &input[valid_end ..];
        let invalid = analysis.invalid && !tail.is_empty();
        let completion = candidates
            .get(index)
            .map(|candidate| ghost(candidate, typed))
            .unwrap_or("");

        let mut rendered = String::with_capacity(raw.len().max(input.len()) + 32);
        rendered.push_str(&input[.. valid_end]);
        if invalid {
            rendered.push_str(&self.invalid_open);
            rendered.push_str(tail);
            rendered.push_str(CLOSE_COLOR);
        } else {
            rendered.push_str(tail);
        }

        let suggestion_start = rendered.len();
        if !completion.is_empty() {
            rendered.push_str(&self.suggestion_open);
            rendered.push_str(completion);
            rendered.push_str(CLOSE_COLOR);
        }

        let rendered_cursor = if cursor >= input.len() {
            suggestion_start
        } else if invalid && cursor > valid_end {
            cursor + self.invalid_open.len()
        } else {
            cursor
        };

        field.set_text(&rendered);
        field.set_cursor(rendered_cursor);
        trace!(
            candidates = candidates.len(),
            selected = index,
            invalid,
            "rendered suggestions"
        );

        self.state = SuggestionState {
            rendered,
            input,
            cursor,
            selected: candidates.get(index).cloned(),
        };
        self.candidates = candidates;
        TickOutcome::Rendered
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::{
        builtin::HelpCommand,
        command::{ArgumentSlot, Command, CommandResponse, Signature},
        dispatch::{Dispatcher, Invocation},
        lookup::RosterMember,
    };

    struct Greet {
        signature: Signature,
    }

    impl Command for Greet {
        fn id(&self) -> &str {
            "greet"
        }

        fn description(&self) -> &str {
            "Says hello."
        }

        fn signature(&self) -> &Signature {
            &self.signature
        }

        fn execute(&self, _invocation: &Invocation<'_>) -> CommandResponse {
            CommandResponse::public("hello")
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut dispatcher = Dispatcher::default();
        dispatcher.types_mut().register_roster(Rc::new(vec![
            RosterMember::new(1, "Alpha"),
            RosterMember::new(2, "Bert"),
            RosterMember::new(3, "Beta"),
        ]));
        dispatcher.register_command(HelpCommand::new());
        dispatcher.register_command(Greet {
            signature: Signature::new(vec![
                ArgumentSlot::new([ArgumentType::OnlinePlayer], "player").required(),
            ]),
        });
        dispatcher
    }

    fn tick(
        engine: &mut SuggestionEngine,
        dispatcher: &Dispatcher,
        field: &mut TextBuffer,
        key: Option<NavKey>,
    ) -> TickOutcome {
        engine.update(&dispatcher.parse_context(), field, key)
    }

    #[test]
    fn ghost_for_partial_command() {
        let dispatcher = dispatcher();
        let mut engine = SuggestionEngine::new(&Config::default());
        let mut field = TextBuffer::new("!he");

        assert_eq!(tick(&mut engine, &dispatcher, &mut field, None), TickOutcome::Rendered);
        assert_eq!(field.text(), "!<color=#FF0000>he</color><color=#444444>lp</color>");
        assert_eq!(field.text().find("<color=#444444>"), Some(field.cursor()));
        assert_eq!(engine.candidates(), ["help"]);
        assert_eq!(engine.outgoing_text(field.text()), "!he");

        let mut field = TextBuffer::new("!help");
        tick(&mut engine, &dispatcher, &mut field, None);
        assert_eq!(field.text(), "!help");
    }

    #[test]
    fn unchanged_tick_is_idempotent() {
        let dispatcher = dispatcher();
        let mut engine = SuggestionEngine::new(&Config::default());
        let mut field = TextBuffer::new("!greet B");

        tick(&mut engine, &dispatcher, &mut field, None);
        let state = engine.state().clone();
        let text = field.text().to_owned();

        assert_eq!(tick(&mut engine, &dispatcher, &mut field, None), TickOutcome::Unchanged);
        assert_eq!(engine.state(), &state);
        assert_eq!(field.text(), text);
    }

    #[test]
    fn invalid_text_is_colored() {
        let dispatcher = dispatcher();
        let mut engine = SuggestionEngine::new(&Config::default());

        let mut field = TextBuffer::new("!nosuch");
        tick(&mut engine, &dispatcher, &mut field, None);
        assert_eq!(field.text(), "!<color=#FF0000>nosuch</color>");
        assert!(engine.candidates().is_empty());

        let mut field = TextBuffer::new("!help what");
        tick(&mut engine, &dispatcher, &mut field, None);
        assert_eq!(field.text(), "!help <color=#FF0000>what</color>");

        let mut field = TextBuffer::new("!help 2 extra");
        tick(&mut engine, &dispatcher, &mut field, None);
        assert_eq!(field.text(), "!help 2 <color=#FF0000>extra</color>");
        assert_eq!(engine.outgoing_text(field.text()), "!help 2 extra");
    }

    #[test]
    fn selection_survives_retyping() {
        let dispatcher = dispatcher();
        let mut engine = SuggestionEngine::new(&Config::default());
        let mut field = TextBuffer::new("!greet ");

        tick(&mut engine, &dispatcher, &mut field, None);
        assert_eq!(engine.selected(), Some("Alpha"));
        assert_eq!(engine.candidates()[.. 3], ["Alpha", "Bert", "Beta"]);

        tick(&mut engine, &dispatcher, &mut field, Some(NavKey::Next));
        tick(&mut engine, &dispatcher, &mut field, Some(NavKey::Next));
        assert_eq!(engine.selected(), Some("Beta"));
        assert_eq!(field.text(), "!greet <color=#444444>Beta</color>");

        field.insert("B");
        tick(&mut engine, &dispatcher, &mut field, None);
        assert_eq!(engine.candidates(), ["Bert", "Beta"]);
        assert_eq!(engine.selected(), Some("Beta"));
        assert_eq!(field.text(), "!greet B<color=#444444>eta</color>");

        field.backspace();
        field.insert("A");
        tick(&mut engine, &dispatcher, &mut field, None);
        assert_eq!(engine.candidates(), ["Alpha"]);
        assert_eq!(engine.selected(), Some("Alpha"));
    }

    #[test]
    fn navigation_clamps() {
        let dispatcher = dispatcher();
        let mut engine = SuggestionEngine::new(&Config::default());
        let mut field = TextBuffer::new("!greet B");

        tick(&mut engine, &dispatcher, &mut field, None);
        tick(&mut engine, &dispatcher, &mut field, Some(NavKey::Previous));
        assert_eq!(engine.selected(), Some("Bert"));

        for _ in 0 .. 3 {
            tick(&mut engine, &dispatcher, &mut field, Some(NavKey::Next));
        }
        assert_eq!(engine.selected(), Some("Beta"));
    }

    #[test]
    fn accept_commits_plain_text() {
        let dispatcher = dispatcher();
        let mut engine = SuggestionEngine::new(&Config::default());
        let mut field = TextBuffer::new("!gr");

        tick(&mut engine, &dispatcher, &mut field, None);
        assert_eq!(tick(&mut engine, &dispatcher, &mut field, Some(NavKey::Accept)), TickOutcome::Committed);
        assert_eq!(field.text(), "!greet");
        assert_eq!(field.cursor(), 6);

        field.insert(" ");
        assert_eq!(tick(&mut engine, &dispatcher, &mut field, None), TickOutcome::Rendered);
        assert_eq!(field.text(), "!greet <color=#444444>Alpha</color>");
    }

    #[test]
    fn cursor_never_enters_ghost() {
        let dispatcher = dispatcher();
        let mut engine = SuggestionEngine::new(&Config::default());
        let mut field = TextBuffer::new("!he");

        tick(&mut engine, &dispatcher, &mut field, None);
        let ghost_start = field.text().find("<color=#444444>");
        field.set_cursor(field.text().len());
        assert_eq!(tick(&mut engine, &dispatcher, &mut field, None), TickOutcome::Unchanged);
        assert_eq!(Some(field.cursor()), ghost_start);
    }

    #[test]
    fn leaving_command_mode_strips_decorations() {
        let dispatcher = dispatcher();
        let mut engine = SuggestionEngine::new(&Config::default());
        let mut field = TextBuffer::new("!he");

        tick(&mut engine, &dispatcher, &mut field, None);
        field.set_cursor(1);
        field.backspace();
        assert_eq!(field.text(), "<color=#FF0000>he</color><color=#444444>lp</color>");

        assert_eq!(tick(&mut engine, &dispatcher, &mut field, None), TickOutcome::Idle);
        assert_eq!(field.text(), "he");
        assert_eq!(field.cursor(), 2);
        assert_eq!(engine.selected(), None);

        let mut chat = TextBuffer::new("hello there");
        assert_eq!(tick(&mut engine, &dispatcher, &mut chat, None), TickOutcome::Idle);
        assert_eq!(chat.text(), "hello there");
    }

    #[test]
    fn prefix_is_case_insensitive() {
        let dispatcher = dispatcher();
        let config = Config::default().with_prefix("Cmd:").unwrap();
        let mut engine = SuggestionEngine::new(&config);
        let mut field = TextBuffer::new("CMD:he");

        assert_eq!(tick(&mut engine, &dispatcher, &mut field, None), TickOutcome::Rendered);
        assert_eq!(field.text(), "CMD:<color=#FF0000>he</color><color=#444444>lp</color>");
    }

    #[test]
    fn ghost_folds_unicode_case() {
        assert_eq!(ghost("éclair", "É"), "clair");
        assert_eq!(ghost("éclair", "ÉC"), "lair");
        assert_eq!(ghost("éclair", "ex"), "");
        assert_eq!(ghost("help", "helper"), "");

        let mut dispatcher = Dispatcher::default();
        dispatcher
            .types_mut()
            .register_catalog("map", Rc::new(vec!["Éclair".to_owned(), "Harbor".to_owned()]));
        dispatcher.register_command(Greet {
            signature: Signature::new(vec![ArgumentSlot::new([ArgumentType::MAP], "map").required()]),
        });

        let mut engine = SuggestionEngine::new(&Config::default());
        let mut field = TextBuffer::new("!greet É");
        assert_eq!(tick(&mut engine, &dispatcher, &mut field, None), TickOutcome::Rendered);
        assert_eq!(engine.candidates(), ["éclair"]);
        assert_eq!(field.text(), "!greet É<color=#444444>clair</color>");
    }
}
