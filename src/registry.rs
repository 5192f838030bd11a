//! Append-only maps of commands and execution channels, queried by id and enumerated in
//! registration order.

use std::collections::HashMap;

use tracing::warn;

use crate::{channel::ExecutionChannel, command::Command};

struct Entries<T: ?Sized> {
    items: Vec<(String, Box<T>)>,
    by_id: HashMap<String, usize>,
}

impl<T: ?Sized> Default for Entries<T> {
    fn default() -> Self {
        Entries {
            items: Vec::new(),
            by_id: HashMap::new(),
        }
    }
}

impl<T: ?Sized> Entries<T> {
    fn insert(&mut self, id: String, item: Box<T>) -> bool {
        if self.by_id.contains_key(&id) {
            return false;
        }

        self.by_id.insert(id.clone(), self.items.len());
        self.items.push((id, item));
        true
    }

    fn remove(&mut self, id: &str) -> Option<Box<T>> {
        let index = self.by_id.remove(id)?;
        let (_, item) = self.items.remove(index);
        for position in self.by_id.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        Some(item)
    }

    fn get(&self, id: &str) -> Option<&T> {
        self.by_id
            .get(id)
            .map(|&index| self.items[index].1.as_ref())
    }

    fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(|(id, _)| id.as_str())
    }

    fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.items.iter().map(|(_, item)| item.as_ref())
    }

    fn len(&self) -> usize {
        self.items.len()
    }
}

/// Registered commands keyed by id.
#[derive(Default)]
pub struct CommandRegistry {
    commands: Entries<dyn Command>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `command`. Returns `false` and keeps the existing command if the id is taken.
    pub fn register<C>(&mut self, command: C) -> bool
    where C: Command + 'static {
        let id = command.id().to_owned();
        if self.contains(&id) {
            warn!(command = %id, "command id is already registered");
            return false;
        }
        self.commands.insert(id, Box::new(command))
    }

    /// Removes a command, returning it if it was registered.
    pub fn unregister(&mut self, id: &str) -> Option<Box<dyn Command>> {
        self.commands.remove(id)
    }

    /// Whether a command is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.commands.get(id).is_some()
    }

    /// The command registered under `id`.
    pub fn get(&self, id: &str) -> Option<&dyn Command> {
        self.commands.get(id)
    }

    /// Command ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.ids()
    }

    /// Commands in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &dyn Command> + '_ {
        self.commands.values()
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Registered execution channels keyed by id.
#[derive(Default)]
pub struct ChannelRegistry {
    channels: Entries<dyn ExecutionChannel>,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `channel`. Returns `false` and keeps the existing channel if the id is taken.
    pub fn register<E>(&mut self, channel: E) -> bool
    where E: ExecutionChannel + 'static {
        let id = channel.id().to_owned();
        if self.channels.get(&id).is_some() {
            warn!(channel = %id, "execution channel id is already registered");
            return false;
        }
        self.channels.insert(id, Box::new(channel))
    }

    /// Whether a channel is registered under `id`.
    pub fn contains(&self, id: &str) -> bool {
        self.channels.get(id).is_some()
    }

    /// The channel registered under `id`.
    pub fn get(&self, id: &str) -> Option<&dyn ExecutionChannel> {
        self.channels.get(id)
    }

    /// Channel ids in registration order.
    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.channels.ids()
    }
}
