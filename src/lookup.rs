//! Read-only views onto the host's collections. Parsers query these on every call, so an
//! implementation backed by live game state always reflects the current roster and catalogs.

use std::{cell::RefCell, rc::Rc};

use crate::ClientId;

/// An ordered collection of named entries, such as maps, items or game modes. An entry's index is
/// its position in [`names`](Catalog::names).
pub trait Catalog {
    /// The display names of all entries in catalog order.
    fn names(&self) -> Vec<String>;
}

impl Catalog for Vec<String> {
    fn names(&self) -> Vec<String> {
        self.clone()
    }
}

impl<T: Catalog + ?Sized> Catalog for RefCell<T> {
    fn names(&self) -> Vec<String> {
        self.borrow().names()
    }
}

impl<T: Catalog + ?Sized> Catalog for Rc<T> {
    fn names(&self) -> Vec<String> {
        (**self).names()
    }
}

/// A connected player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMember {
    /// Platform identifier.
    pub id: ClientId,
    /// Display name.
    pub name: String,
    /// Whether the player is in the current round and not dead.
    pub alive: bool,
}

impl RosterMember {
    /// Creates a living member.
    pub fn new(id: u64, name: impl Into<String>) -> Self {
        RosterMember {
            id: ClientId(id),
            name: name.into(),
            alive: true,
        }
    }

    /// Marks the member as dead or spectating.
    pub fn dead(mut self) -> Self {
        self.alive = false;
        self
    }
}

/// The live list of connected players. Position `n` in [`members`](Roster::members) is addressed as
/// `#n+1` by player arguments.
pub trait Roster {
    /// All connected players in lobby order.
    fn members(&self) -> Vec<RosterMember>;
}

impl Roster for Vec<RosterMember> {
    fn members(&self) -> Vec<RosterMember> {
        self.clone()
    }
}

impl<T: Roster + ?Sized> Roster for RefCell<T> {
    fn members(&self) -> Vec<RosterMember> {
        self.borrow().members()
    }
}

impl<T: Roster + ?Sized> Roster for Rc<T> {
    fn members(&self) -> Vec<RosterMember> {
        (**self).members()
    }
}

/// Persisted per-player key/value data, including players who are not currently connected.
pub trait ClientDataStore {
    /// Every player with persisted data.
    fn client_ids(&self) -> Vec<ClientId>;

    /// Stores `value` under `key` for `client`, returning whether the store accepted it.
    fn set_client_data(&self, client: ClientId, key: &str, value: &str) -> bool;
}

impl<T: ClientDataStore + ?Sized> ClientDataStore for Rc<T> {
    fn client_ids(&self) -> Vec<ClientId> {
        (**self).client_ids()
    }

    fn set_client_data(&self, client: ClientId, key: &str, value: &str) -> bool {
        (**self).set_client_data(client, key, value)
    }
}
