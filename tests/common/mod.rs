//! Shared fixtures for integration tests.
//!
//! Each integration test file compiles common/ as its own module, so not
//! every helper is used in every file.
#![allow(dead_code)]

use std::{cell::RefCell, rc::Rc};

use chat_commands::{
    register_builtin_commands,
    ArgumentSlot,
    ArgumentType,
    ChatChannel,
    ChatTransport,
    ClientDataStore,
    ClientId,
    Command,
    CommandResponse,
    Config,
    Dispatcher,
    Invocation,
    PermissionSource,
    RosterMember,
    Signature,
};

pub const HOST: ClientId = ClientId(1);

/// One line handed to the chat transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentLine {
    pub target: Option<ClientId>,
    pub line: String,
    pub title: Option<String>,
}

/// Records every line instead of sending it.
#[derive(Default, Clone)]
pub struct Outbox {
    pub sent: Rc<RefCell<Vec<SentLine>>>,
}

impl ChatTransport for Outbox {
    fn send(&self, target: Option<ClientId>, line: &str, title: Option<&str>) {
        self.sent.borrow_mut().push(SentLine {
            target,
            line: line.to_owned(),
            title: title.map(str::to_owned),
        });
    }
}

/// Grants everything except the listed permissions.
pub struct DenyList(pub Vec<String>);

impl PermissionSource for DenyList {
    fn has_permission(&self, _client: ClientId, permission: &str) -> bool {
        !self.0.iter().any(|denied| denied == permission)
    }
}

/// Persisted data kept in memory.
#[derive(Default)]
pub struct MemoryStore {
    pub entries: RefCell<Vec<(ClientId, String, String)>>,
}

impl ClientDataStore for MemoryStore {
    fn client_ids(&self) -> Vec<ClientId> {
        let mut ids = self
            .entries
            .borrow()
            .iter()
            .map(|(id, _, _)| *id)
            .collect::<Vec<_>>();
        ids.dedup();
        ids
    }

    fn set_client_data(&self, client: ClientId, key: &str, value: &str) -> bool {
        self.entries
            .borrow_mut()
            .push((client, key.to_owned(), value.to_owned()));
        true
    }
}

/// `kick <player> [reason]`
pub struct KickCommand {
    signature: Signature,
}

impl KickCommand {
    pub fn new() -> Self {
        KickCommand {
            signature: Signature::new(vec![
                ArgumentSlot::new([ArgumentType::OnlinePlayer], "player").required(),
                ArgumentSlot::new([ArgumentType::QuotedString], "reason"),
            ]),
        }
    }
}

impl Command for KickCommand {
    fn id(&self) -> &str {
        "kick"
    }

    fn description(&self) -> &str {
        "Removes a player from the lobby."
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn execute(&self, invocation: &Invocation<'_>) -> CommandResponse {
        let player = invocation.parse_as::<ClientId>(ArgumentType::OnlinePlayer, invocation.args());
        let client = match player.value {
            Some(client) => client,
            None => return CommandResponse::hidden("A player is required for the first argument."),
        };

        let reason = invocation
            .parse_as::<String>(ArgumentType::QuotedString, player.remainder)
            .value
            .unwrap_or_else(|| "no reason".to_owned());
        CommandResponse::public(format!("Kicked @{} ({}).", client.get(), reason))
    }
}

/// `map <map>`
pub struct MapCommand {
    signature: Signature,
}

impl MapCommand {
    pub fn new() -> Self {
        MapCommand {
            signature: Signature::new(vec![ArgumentSlot::new(
                [ArgumentType::MAP, ArgumentType::DEFAULT],
                "map",
            )
            .required()]),
        }
    }
}

impl Command for MapCommand {
    fn id(&self) -> &str {
        "map"
    }

    fn description(&self) -> &str {
        "Changes the next map."
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn execute(&self, invocation: &Invocation<'_>) -> CommandResponse {
        let map = invocation.parse_as::<chat_commands::CatalogEntry>(ArgumentType::MAP, invocation.args());
        match map.value {
            Some(entry) => CommandResponse::public(format!("Next map: {}", entry.name)),
            None => CommandResponse::hidden("You did not select a valid map."),
        }
    }
}

pub fn roster() -> Rc<RefCell<Vec<RosterMember>>> {
    Rc::new(RefCell::new(vec![
        RosterMember::new(100, "Alpha"),
        RosterMember::new(200, "Bert"),
        RosterMember::new(300, "Beta").dead(),
    ]))
}

pub fn maps() -> Rc<RefCell<Vec<String>>> {
    Rc::new(RefCell::new(vec![
        "Alpha".to_owned(),
        "Beta".to_owned(),
        "Alb".to_owned(),
    ]))
}

/// A dispatcher with the built-in commands, `kick` and `map`, and a chat channel whose outbox is
/// returned alongside it.
pub fn dispatcher(config: &Config, denied: &[&str]) -> (Dispatcher, Outbox, Rc<MemoryStore>) {
    dispatcher_with_limit(config, denied, None)
}

/// Like [`dispatcher`], with chat messages limited to `limit` bytes.
pub fn dispatcher_with_limit(
    config: &Config,
    denied: &[&str],
    limit: Option<usize>,
) -> (Dispatcher, Outbox, Rc<MemoryStore>) {
    let store = Rc::new(MemoryStore::default());
    let mut dispatcher = Dispatcher::new(config);

    let types = dispatcher.types_mut();
    types.register_roster(roster());
    types.register_catalog("map", maps());
    types.register_offline_players(Some(store.clone()));

    register_builtin_commands(&mut dispatcher, Some(store.clone()));
    dispatcher.register_command(KickCommand::new());
    dispatcher.register_command(MapCommand::new());

    let outbox = Outbox::default();
    let denied = denied.iter().map(|id| format!("command.{}", id)).collect();
    let mut chat = ChatChannel::new(outbox.clone(), HOST).with_permissions(DenyList(denied));
    if let Some(limit) = limit {
        chat = chat.with_max_message_length(limit);
    }
    dispatcher.register_channel(chat);

    (dispatcher, outbox, store)
}
