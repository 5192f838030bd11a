//! A terminal stand-in for the in-game chat box.
//!
//! Each line read from stdin is typed into the field. `:next`, `:prev` and `:tab` drive the
//! suggestion overlay and `:send` sends the field. Run with `RUST_LOG=trace` to watch the engine.

use std::{
    cell::RefCell,
    io::{self, BufRead},
    rc::Rc,
};

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
    NavKey,
    RosterMember,
    Signature,
    SuggestionEngine,
    TextBuffer,
    TextField,
    CHAT_CHANNEL_ID,
};
use tracing_subscriber::EnvFilter;

const HOST: ClientId = ClientId(1);

struct Terminal;

impl ChatTransport for Terminal {
    fn send(&self, target: Option<ClientId>, line: &str, title: Option<&str>) {
        let target = match target {
            Some(client) => format!("@{}", client.get()),
            None => "everyone".to_owned(),
        };
        match title {
            Some(title) => println!("[to {}] {}: {}", target, title, line),
            None => println!("[to {}] {}", target, line),
        }
    }
}

#[derive(Default)]
struct Saves {
    entries: RefCell<Vec<(ClientId, String, String)>>,
}

impl ClientDataStore for Saves {
    fn client_ids(&self) -> Vec<ClientId> {
        self.entries.borrow().iter().map(|(id, _, _)| *id).collect()
    }

    fn set_client_data(&self, client: ClientId, key: &str, value: &str) -> bool {
        self.entries
            .borrow_mut()
            .push((client, key.to_owned(), value.to_owned()));
        true
    }
}

struct MapCommand {
    signature: Signature,
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
        if invocation
            .parse_as::<chat_commands::ArgValue>(ArgumentType::DEFAULT, invocation.args())
            .is_success()
        {
            return CommandResponse::public("Next map: random");
        }

        match invocation
            .parse_as::<chat_commands::CatalogEntry>(ArgumentType::MAP, invocation.args())
            .value
        {
            Some(map) => CommandResponse::public(format!("Next map: {}", map.name)),
            None => CommandResponse::hidden("You did not select a valid map."),
        }
    }
}

fn main() -> io::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let config = match Config::load("chat_commands.toml") {
        Ok(config) => config,
        Err(e) => {
            tracing::debug!(error = %e, "using the default config");
            Config::default()
        }
    };

    let roster = Rc::new(vec![
        RosterMember::new(1, "Host"),
        RosterMember::new(2, "Alice"),
        RosterMember::new(3, "Bob Ross"),
    ]);
    let maps = Rc::new(vec![
        "Desert Outpost".to_owned(),
        "Harbor".to_owned(),
        "Deep Mine".to_owned(),
    ]);
    let saves = Rc::new(Saves::default());

    let mut dispatcher = Dispatcher::new(&config);
    dispatcher.types_mut().register_roster(roster);
    dispatcher.types_mut().register_catalog("map", maps);
    dispatcher
        .types_mut()
        .register_offline_players(Some(saves.clone()));
    register_builtin_commands(&mut dispatcher, Some(saves));
    dispatcher.register_command(MapCommand {
        signature: Signature::new(vec![
            ArgumentSlot::new([ArgumentType::MAP, ArgumentType::DEFAULT], "map").required(),
        ]),
    });
    dispatcher.register_channel(ChatChannel::new(Terminal, HOST).with_max_message_length(40));

    let mut engine = SuggestionEngine::new(&config);
    let mut field = TextBuffer::default();

    for line in io::stdin().lock().lines() {
        let line = line?;
        let key = match line.as_str() {
            ":next" => Some(NavKey::Next),
            ":prev" => Some(NavKey::Previous),
            ":tab" => Some(NavKey::Accept),
            ":send" => {
                let message = engine.outgoing_text(field.text());
                if dispatcher
                    .handle_message(CHAT_CHANNEL_ID, HOST, &message)
                    .is_none()
                {
                    println!("[chat] {}", message);
                }
                field = TextBuffer::default();
                engine.reset();
                continue;
            }
            text => {
                field.insert(text);
                None
            }
        };

        engine.update(&dispatcher.parse_context(), &mut field, key);
        let state = engine.state();
        println!("> {}", state.rendered());
        println!("  input {:?}, caret at {}", state.input(), state.cursor());
        if !engine.candidates().is_empty() {
            println!("  {}", engine.candidates().join(" | "));
        }
    }

    Ok(())
}
