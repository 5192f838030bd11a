use std::fmt;

use crate::{dispatch::Invocation, types::ArgumentType};

/// One position in a command's signature. The first accepted type that parses decides how much
/// text the slot consumes; every accepted type contributes completion candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgumentSlot {
    types: Vec<ArgumentType>,
    label: String,
    required: bool,
}

impl ArgumentSlot {
    /// Creates an optional slot accepting `types` in the given order.
    pub fn new(types: impl Into<Vec<ArgumentType>>, label: impl Into<String>) -> Self {
        ArgumentSlot {
            types: types.into(),
            label: label.into(),
            required: false,
        }
    }

    /// Marks the slot as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Accepted types, in the order they are tried.
    pub fn types(&self) -> &[ArgumentType] {
        &self.types
    }

    /// The name shown in usage text.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether the slot must be filled for the command to run.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl fmt::Display for ArgumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.required {
            write!(f, "<{}>", self.label)
        } else {
            write!(f, "[{}]", self.label)
        }
    }
}

/// The ordered argument slots of a command. Fixed once constructed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    slots: Vec<ArgumentSlot>,
}

impl Signature {
    /// A signature over `slots`, in the order they are typed.
    pub fn new(slots: Vec<ArgumentSlot>) -> Self {
        Signature { slots }
    }

    /// The argument slots in order.
    pub fn slots(&self) -> &[ArgumentSlot] {
        &self.slots
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, slot) in self.slots.iter().enumerate() {
            if index > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", slot)?;
        }
        Ok(())
    }
}

/// Who a response is delivered to. The execution channel interprets this.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    /// Delivered to everyone.
    Public,
    /// Delivered to the executor only.
    Private,
    /// Delivered to the executor only, and the message that triggered it is not shown to others.
    Hidden,
}

/// The reply to a command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResponse {
    /// Delivery target.
    pub visibility: Visibility,
    /// Optional title shown alongside the lines.
    pub title: Option<String>,
    /// Response lines in order.
    pub lines: Vec<String>,
    /// Whether the title accompanies only the first line rather than every line.
    pub title_first_line_only: bool,
}

impl CommandResponse {
    /// A plain response.
    pub fn new<I, S>(visibility: Visibility, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandResponse {
            visibility,
            title: None,
            lines: lines.into_iter().map(Into::into).collect(),
            title_first_line_only: true,
        }
    }

    /// A titled response.
    pub fn styled<I, S>(visibility: Visibility, title: impl Into<String>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandResponse {
            title: Some(title.into()),
            ..Self::new(visibility, lines)
        }
    }

    /// A single public line.
    pub fn public(line: impl Into<String>) -> Self {
        Self::new(Visibility::Public, [line.into()])
    }

    /// A single private line.
    pub fn private(line: impl Into<String>) -> Self {
        Self::new(Visibility::Private, [line.into()])
    }

    /// A single hidden line.
    pub fn hidden(line: impl Into<String>) -> Self {
        Self::new(Visibility::Hidden, [line.into()])
    }

    /// Repeats the title on every line instead of only the first.
    pub fn title_on_every_line(mut self) -> Self {
        self.title_first_line_only = false;
        self
    }
}

/// A registered command.
///
/// Commands parse their own arguments from [`Invocation::args`] using the same parsers that drive
/// suggestions, and report every user error as a response rather than failing.
pub trait Command {
    /// Unique id, which is also the word typed after the prefix.
    fn id(&self) -> &str;

    /// One-line description shown by help.
    fn description(&self) -> &str;

    /// The argument slots, used for suggestions and usage text.
    fn signature(&self) -> &Signature;

    /// Runs the command.
    fn execute(&self, invocation: &Invocation<'_>) -> CommandResponse;
}
