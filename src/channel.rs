//! Delivery surfaces for command responses.

use crate::{
    command::{CommandResponse, Visibility},
    ClientId,
};

/// A surface commands are executed from and respond through, such as the chat.
pub trait ExecutionChannel {
    /// Unique id of the channel.
    fn id(&self) -> &str;

    /// The longest line the channel can deliver, or `None` if unbounded.
    fn max_response_length(&self) -> Option<usize> {
        None
    }

    /// Whether `executor` holds `permission` (`command.<id>` for commands).
    fn authorize(&self, executor: ClientId, permission: &str) -> bool;

    /// Delivers `response` on behalf of `executor`.
    fn deliver(&self, executor: ClientId, response: &CommandResponse);
}

/// Sends individual chat lines.
pub trait ChatTransport {
    /// Sends one line to `target`, or to everyone when `target` is `None`, under an optional title.
    fn send(&self, target: Option<ClientId>, line: &str, title: Option<&str>);
}

/// Answers permission queries, typically from a permission-group system.
pub trait PermissionSource {
    /// Whether `client` holds `permission`.
    fn has_permission(&self, client: ClientId, permission: &str) -> bool;
}

/// The id the chat channel registers under.
pub const CHAT_CHANNEL_ID: &str = "chat";

/// The chat execution channel.
///
/// Without a [`PermissionSource`] only the host may run commands.
pub struct ChatChannel<T> {
    transport: T,
    permissions: Option<Box<dyn PermissionSource>>,
    host: ClientId,
    max_message_length: Option<usize>,
}

impl<T: ChatTransport> ChatChannel<T> {
    /// Creates a chat channel hosted by `host`.
    pub fn new(transport: T, host: ClientId) -> Self {
        ChatChannel {
            transport,
            permissions: None,
            host,
            max_message_length: None,
        }
    }

    /// Delegates authorization to `permissions`.
    pub fn with_permissions(mut self, permissions: impl PermissionSource + 'static) -> Self {
        self.permissions = Some(Box::new(permissions));
        self
    }

    /// Limits the length of a single chat message.
    pub fn with_max_message_length(mut self, length: usize) -> Self {
        self.max_message_length = Some(length);
        self
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }
}

impl<T: ChatTransport> ExecutionChannel for ChatChannel<T> {
    fn id(&self) -> &str {
        CHAT_CHANNEL_ID
    }

    fn max_response_length(&self) -> Option<usize> {
        self.max_message_length
    }

    fn authorize(&self, executor: ClientId, permission: &str) -> bool {
        match &self.permissions {
            Some(permissions) => permissions.has_permission(executor, permission),
            None => executor == self.host,
        }
    }

    fn deliver(&self, executor: ClientId, response: &CommandResponse) {
        let target = match response.visibility {
            Visibility::Public => None,
            Visibility::Private | Visibility::Hidden => Some(executor),
        };

        let mut title = response.title.as_deref();
        for line in &response.lines {
            self.transport.send(target, line, title);
            if response.title_first_line_only && title.is_some() {
                title = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;

    #[derive(Default)]
    struct Outbox {
        sent: RefCell<Vec<(Option<ClientId>, String, Option<String>)>>,
    }

    impl ChatTransport for Outbox {
        fn send(&self, target: Option<ClientId>, line: &str, title: Option<&str>) {
            self.sent
                .borrow_mut()
                .push((target, line.to_owned(), title.map(str::to_owned)));
        }
    }

    struct Admins;

    impl PermissionSource for Admins {
        fn has_permission(&self, client: ClientId, permission: &str) -> bool {
            client == ClientId(7) || permission == "command.help"
        }
    }

    #[test]
    fn host_only_without_permission_source() {
        let chat = ChatChannel::new(Outbox::default(), ClientId(1));
        assert!(chat.authorize(ClientId(1), "command.help"));
        assert!(!chat.authorize(ClientId(2), "command.help"));

        let chat = chat.with_permissions(Admins);
        assert!(!chat.authorize(ClientId(1), "command.kick"));
        assert!(chat.authorize(ClientId(2), "command.help"));
        assert!(chat.authorize(ClientId(7), "command.kick"));
    }

    #[test]
    fn styled_title_only_on_first_line() {
        let chat = ChatChannel::new(Outbox::default(), ClientId(1));
        let response = CommandResponse::styled(Visibility::Private, "Help Page #1", ["one", "two"]);
        chat.deliver(ClientId(3), &response);

        let sent = chat.transport().sent.borrow();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0], (Some(ClientId(3)), "one".to_owned(), Some("Help Page #1".to_owned())));
        assert_eq!(sent[1], (Some(ClientId(3)), "two".to_owned(), None));
    }

    #[test]
    fn repeated_title_and_broadcast() {
        let chat = ChatChannel::new(Outbox::default(), ClientId(1));
        let response =
            CommandResponse::styled(Visibility::Public, "News", ["a", "b"]).title_on_every_line();
        chat.deliver(ClientId(3), &response);

        let sent = chat.transport().sent.borrow();
        assert!(sent.iter().all(|(target, _, title)| target.is_none() && title.as_deref() == Some("News")));
    }
}
