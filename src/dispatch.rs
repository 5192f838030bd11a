//! Turns a raw chat line into a command invocation.

use tracing::{debug, warn};

use crate::{
    arg::{FromArgValue, ParseOutcome},
    channel::ExecutionChannel,
    command::{Command, CommandResponse},
    config::{strip_prefix_ignore_case, Config},
    registry::{ChannelRegistry, CommandRegistry},
    types::{ArgumentParser, ArgumentType, ParseContext, TypeRegistry},
    ClientId,
};

/// The permission a channel is asked about before `id` may run.
pub fn permission_key(id: &str) -> String {
    format!("command.{}", id)
}

/// The reply given for unknown commands, and for commands the executor may not run.
pub fn not_a_command(token: &str) -> CommandResponse {
    CommandResponse::private(format!("'{}' is not a command.", token))
}

/// Owns the registries and routes input to commands.
///
/// Everything is registered up front; once dispatching starts the registries are only read.
pub struct Dispatcher {
    prefix: String,
    types: TypeRegistry,
    commands: CommandRegistry,
    channels: ChannelRegistry,
}

impl Dispatcher {
    /// Creates a dispatcher with the built-in argument types and no commands or channels.
    pub fn new(config: &Config) -> Self {
        Dispatcher {
            prefix: config.command_prefix.to_lowercase(),
            types: TypeRegistry::with_builtins(),
            commands: CommandRegistry::new(),
            channels: ChannelRegistry::new(),
        }
    }

    /// The lower-cased command prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The registered argument types.
    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    /// Mutable access to the type registry, for registering collaborator-backed types.
    pub fn types_mut(&mut self) -> &mut TypeRegistry {
        &mut self.types
    }

    /// The registered commands.
    pub fn commands(&self) -> &CommandRegistry {
        &self.commands
    }

    /// The registered execution channels.
    pub fn channels(&self) -> &ChannelRegistry {
        &self.channels
    }

    /// See [`TypeRegistry::register`].
    pub fn register_type<P>(&mut self, ty: ArgumentType, parser: P) -> bool
    where P: ArgumentParser + 'static {
        self.types.register(ty, parser)
    }

    /// See [`CommandRegistry::register`].
    pub fn register_command<C>(&mut self, command: C) -> bool
    where C: Command + 'static {
        self.commands.register(command)
    }

    /// Removes a command, returning it if it was registered.
    pub fn unregister_command(&mut self, id: &str) -> Option<Box<dyn Command>> {
        self.commands.unregister(id)
    }

    /// See [`ChannelRegistry::register`].
    pub fn register_channel<E>(&mut self, channel: E) -> bool
    where E: ExecutionChannel + 'static {
        self.channels.register(channel)
    }

    /// A parse context over this dispatcher's registries.
    pub fn parse_context(&self) -> ParseContext<'_> {
        ParseContext::new(&self.types, &self.commands)
    }

    /// Runs the command named at the start of `input`, the text after the prefix.
    ///
    /// Unknown commands and commands the executor is not authorized for produce the same private
    /// reply naming the token that was read, so callers cannot tell the two apart.
    pub fn handle_input(
        &self,
        channel: &dyn ExecutionChannel,
        executor: ClientId,
        input: &str,
        bypass_authorization: bool,
    ) -> CommandResponse {
        let outcome = self
            .parse_context()
            .parse_as::<String>(ArgumentType::Command, input);

        let command = outcome
            .value
            .as_deref()
            .and_then(|id| self.commands.get(id))
            .filter(|command| {
                bypass_authorization || channel.authorize(executor, &permission_key(command.id()))
            });

        let command = match command {
            Some(command) => command,
            None => {
                debug!(
                    channel = channel.id(),
                    executor = executor.get(),
                    token = outcome.consumed,
                    "rejected command input"
                );
                return not_a_command(outcome.consumed);
            }
        };

        debug!(
            channel = channel.id(),
            executor = executor.get(),
            command = command.id(),
            bypassed = bypass_authorization,
            "dispatching command"
        );

        command.execute(&Invocation {
            dispatcher: self,
            channel,
            executor,
            args: outcome.remainder,
            bypass_authorization,
        })
    }

    /// Handles a chat message sent through the channel `channel_id`.
    ///
    /// Returns `None` when the message does not start with the prefix, or when no such channel is
    /// registered, and the message should be treated as ordinary chat. Otherwise the response is
    /// delivered through the channel and also returned.
    pub fn handle_message(
        &self,
        channel_id: &str,
        executor: ClientId,
        message: &str,
    ) -> Option<CommandResponse> {
        let input = strip_prefix_ignore_case(message, &self.prefix)?;

        let channel = match self.channels.get(channel_id) {
            Some(channel) => channel,
            None => {
                warn!(channel = channel_id, "no execution channel registered under this id");
                return None;
            }
        };

        let response = self.handle_input(channel, executor, input, false);
        channel.deliver(executor, &response);
        Some(response)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}

/// A single command run: where it came from, who ran it, and the text after the command id.
pub struct Invocation<'d> {
    dispatcher: &'d Dispatcher,
    channel: &'d dyn ExecutionChannel,
    executor: ClientId,
    args: &'d str,
    bypass_authorization: bool,
}

impl<'d> Invocation<'d> {
    /// The dispatcher running this command.
    pub fn dispatcher(&self) -> &'d Dispatcher {
        self.dispatcher
    }

    /// The channel the command was sent through.
    pub fn channel(&self) -> &'d dyn ExecutionChannel {
        self.channel
    }

    /// The client that sent the command.
    pub fn executor(&self) -> ClientId {
        self.executor
    }

    /// The argument text following the command id.
    pub fn args(&self) -> &'d str {
        self.args
    }

    /// Whether authorization checks are skipped for this run.
    pub fn bypass_authorization(&self) -> bool {
        self.bypass_authorization
    }

    /// Whether the executor may run the command `id` through this invocation's channel.
    pub fn is_authorized(&self, id: &str) -> bool {
        self.bypass_authorization || self.channel.authorize(self.executor, &permission_key(id))
    }

    /// Parses the front of `args` as `ty`, converting the value to `T`.
    pub fn parse_as<'a, T>(&self, ty: ArgumentType, args: &'a str) -> ParseOutcome<'a, T>
    where T: FromArgValue {
        self.dispatcher.parse_context().parse_as(ty, args)
    }
}
