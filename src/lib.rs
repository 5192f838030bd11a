#![warn(missing_docs)]

//! Typed chat commands with a live suggestion overlay.
//!
//! A [`Dispatcher`] owns three registries: argument types mapped to their [`ArgumentParser`]s,
//! commands, and the [`ExecutionChannel`]s responses are delivered through. Chat messages starting
//! with the configured prefix are routed to [`Dispatcher::handle_message`]; the text field the
//! player is typing into is fed to a [`SuggestionEngine`] once per frame, which re-parses the input
//! with the same parsers and decorates the field with invalid-text highlighting and a completion.
//!
//! Registration happens once at startup. After that the registries are only read, and everything
//! runs synchronously on the caller's thread.

mod arg;
mod builtin;
mod channel;
mod command;
mod config;
mod dispatch;
mod lookup;
mod parsers;
mod registry;
mod suggest;
mod types;

pub use arg::*;
pub use builtin::*;
pub use channel::*;
pub use command::*;
pub use config::*;
pub use dispatch::*;
pub use lookup::*;
pub use parsers::*;
pub use registry::*;
pub use suggest::*;
pub use types::*;
