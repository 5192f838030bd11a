//! Commands that ship with the crate.

use std::{mem, rc::Rc};

use crate::{
    command::{ArgumentSlot, Command, CommandResponse, Signature, Visibility},
    dispatch::{Dispatcher, Invocation},
    lookup::ClientDataStore,
    types::ArgumentType,
    ClientId,
};

const LINES_PER_PAGE: usize = 3;

fn invalid_page() -> CommandResponse {
    CommandResponse::private("You didn't specify a valid page number.")
}

/// `help [command/page]`: lists the commands the executor may run, a page at a time, or describes
/// one command.
pub struct HelpCommand {
    signature: Signature,
}

impl HelpCommand {
    /// The `help` command with its `[command/page]` slot.
    pub fn new() -> Self {
        HelpCommand {
            signature: Signature::new(vec![ArgumentSlot::new(
                [ArgumentType::Command, ArgumentType::Int],
                "command/page",
            )]),
        }
    }

    fn page(&self, invocation: &Invocation<'_>, page: i32) -> CommandResponse {
        if page < 1 {
            return invalid_page();
        }

        let dispatcher = invocation.dispatcher();
        let visible = dispatcher
            .commands()
            .ids()
            .filter(|id| invocation.is_authorized(id))
            .collect::<Vec<_>>();
        let max_length = invocation.channel().max_response_length();

        let mut current_page = 1;
        let mut lines = Vec::new();
        let mut line = String::new();
        for (index, id) in visible.iter().enumerate() {
            let mut entry = format!("{}{}", dispatcher.prefix(), id);
            if index + 1 != visible.len() {
                entry.push_str(", ");
            }

            // The trailing space of the separator may hang past the limit
            let overflows = match max_length {
                Some(max) => !line.is_empty() && line.len() + entry.len() > max + 1,
                None => false,
            };

            if overflows {
                lines.push(mem::take(&mut line));
                if lines.len() == LINES_PER_PAGE {
                    if current_page >= page {
                        break;
                    }
                    current_page += 1;
                    lines.clear();
                }
            }

            line.push_str(&entry);
        }

        if !line.is_empty() || lines.is_empty() {
            lines.push(line);
        }

        if current_page != page {
            return invalid_page();
        }

        CommandResponse::styled(Visibility::Private, format!("Help Page #{}", page), lines)
    }
}

impl Default for HelpCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl Command for HelpCommand {
    fn id(&self) -> &str {
        "help"
    }

    fn description(&self) -> &str {
        "View helpful information about available commands."
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn execute(&self, invocation: &Invocation<'_>) -> CommandResponse {
        let args = invocation.args();
        if args.is_empty() {
            return self.page(invocation, 1);
        }

        if let Some(page) = invocation.parse_as::<i32>(ArgumentType::Int, args).value {
            return self.page(invocation, page);
        }

        let dispatcher = invocation.dispatcher();
        let command = invocation
            .parse_as::<String>(ArgumentType::Command, args)
            .value
            .filter(|id| invocation.is_authorized(id))
            .and_then(|id| dispatcher.commands().get(&id));

        match command {
            Some(command) => {
                let usage = format!("{}{} {}", dispatcher.prefix(), command.id(), command.signature());
                CommandResponse::styled(Visibility::Private, "Command Info", [
                    usage.trim_end().to_owned(),
                    command.description().to_owned(),
                ])
            }
            None => CommandResponse::private(format!("'{}' is not a command.", args)),
        }
    }
}

/// `setclientdata <player> <key> <value>`: stores a key/value pair for a player.
pub struct SetClientDataCommand {
    store: Rc<dyn ClientDataStore>,
    signature: Signature,
}

impl SetClientDataCommand {
    /// The `setclientdata` command, saving into `store`.
    pub fn new(store: Rc<dyn ClientDataStore>) -> Self {
        SetClientDataCommand {
            store,
            signature: Signature::new(vec![
                ArgumentSlot::new([ArgumentType::OnlinePlayer, ArgumentType::OfflinePlayer], "player")
                    .required(),
                ArgumentSlot::new([ArgumentType::String], "key").required(),
                ArgumentSlot::new([ArgumentType::QuotedString], "value").required(),
            ]),
        }
    }
}

impl Command for SetClientDataCommand {
    fn id(&self) -> &str {
        "setclientdata"
    }

    fn description(&self) -> &str {
        "Sets the value of a key for a given player."
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn execute(&self, invocation: &Invocation<'_>) -> CommandResponse {
        let args = invocation.args();
        if args.is_empty() {
            return CommandResponse::hidden("A player is required for the first argument.");
        }

        let player = [ArgumentType::OnlinePlayer, ArgumentType::OfflinePlayer]
            .into_iter()
            .find_map(|ty| {
                let outcome = invocation.parse_as::<ClientId>(ty, args);
                outcome.value.map(|client| (client, outcome.remainder))
            });
        let (client, args) = match player {
            Some(player) => player,
            None => return CommandResponse::hidden("You did not select any players."),
        };

        if args.is_empty() {
            return CommandResponse::hidden("A key is required for the second argument.");
        }

        let key = invocation.parse_as::<String>(ArgumentType::String, args);
        let args = key.remainder;
        if args.is_empty() {
            return CommandResponse::hidden("A value is required for the third argument.");
        }

        let value = match invocation.parse_as::<String>(ArgumentType::QuotedString, args).value {
            Some(value) => value,
            None => return CommandResponse::hidden("You did not provide a valid value."),
        };

        let key = key.value.unwrap_or_default();
        if !self.store.set_client_data(client, &key, &value) {
            return CommandResponse::hidden("Unable to save that key/value.");
        }

        CommandResponse::hidden("Saved.")
    }
}

/// Registers `help`, plus `setclientdata` when a client data store is available.
pub fn register_builtin_commands(dispatcher: &mut Dispatcher, store: Option<Rc<dyn ClientDataStore>>) {
    dispatcher.register_command(HelpCommand::new());
    if let Some(store) = store {
        dispatcher.register_command(SetClientDataCommand::new(store));
    }
}
