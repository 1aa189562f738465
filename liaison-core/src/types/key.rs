//! Type identities, capabilities and service keys.

use std::{
    any::{TypeId, type_name},
    borrow::Cow,
    fmt,
    hash::{Hash, Hasher},
};

/// The identity of a type known to the mediator.
///
/// Two keys are equal when they denote the same type; the display name plays
/// no part in equality.
#[derive(Clone)]
pub struct TypeKey {
    identity: Identity,
    name: Cow<'static, str>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum Identity {
    Type(TypeId),
    Definition(&'static str),
    Wrapper(Box<Identity>),
}

impl TypeKey {
    /// The key of a concrete Rust type (or trait object).
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            identity: Identity::Type(TypeId::of::<T>()),
            name: Cow::Owned(short_name(type_name::<T>())),
        }
    }

    /// The key of the generic definition `T` is an instance of.
    ///
    /// `TypeKey::definition_of::<Wrapped<()>>()` and
    /// `TypeKey::definition_of::<Wrapped<String>>()` are equal.
    pub fn definition_of<T: ?Sized + 'static>() -> Self {
        let path = strip_arguments(type_name::<T>());
        Self {
            identity: Identity::Definition(path),
            name: Cow::Owned(short_name(path)),
        }
    }

    /// The key of a wrapper synthesized around this type.
    pub fn wrapper(&self, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            identity: Identity::Wrapper(Box::new(self.identity.clone())),
            name: name.into(),
        }
    }

    /// Short display name, without module paths.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.identity == other.identity
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Strips generic arguments: `a::Foo<b::Bar>` becomes `a::Foo`.
pub(crate) fn strip_arguments(path: &'static str) -> &'static str {
    match path.find('<') {
        Some(index) => &path[..index],
        None => path,
    }
}

/// The module path of a type path: `a::b::Foo<c::Bar>` becomes `a::b`.
pub fn module_of(path: &'static str) -> &'static str {
    let path = strip_arguments(path);
    match path.rfind("::") {
        Some(index) => &path[..index],
        None => "",
    }
}

/// Removes module paths from every segment of a type name.
///
/// `alloc::vec::Vec<my::Ping>` becomes `Vec<Ping>`.
pub(crate) fn short_name(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut segment = String::new();
    for ch in path.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
        } else {
            out.push_str(last_segment(&segment));
            segment.clear();
            out.push(ch);
        }
    }
    out.push_str(last_segment(&segment));
    out
}

fn last_segment(segment: &str) -> &str {
    segment.rsplit("::").next().unwrap_or(segment)
}

/// The handler and behavior shapes the mediator recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Handles a request that produces no response.
    CommandHandler,
    /// Handles a request and produces its response.
    RequestHandler,
    /// Reacts to a notification.
    NotificationHandler,
    /// Wraps the handling of a request.
    PipelineBehavior,
    /// Wraps the fan-out of a notification.
    NotificationBehavior,
}

impl Capability {
    /// Number of type arguments of the capability.
    pub fn arity(self) -> usize {
        match self {
            Self::RequestHandler | Self::PipelineBehavior => 2,
            Self::CommandHandler | Self::NotificationHandler | Self::NotificationBehavior => 1,
        }
    }

    /// Request handler with or without response.
    pub fn is_request_handler(self) -> bool {
        matches!(self, Self::CommandHandler | Self::RequestHandler)
    }

    /// Any handler capability.
    pub fn is_handler(self) -> bool {
        self.is_request_handler() || self == Self::NotificationHandler
    }

    /// Any behavior capability.
    pub fn is_behavior(self) -> bool {
        matches!(self, Self::PipelineBehavior | Self::NotificationBehavior)
    }

    /// Name of the capability.
    pub fn name(self) -> &'static str {
        match self {
            Self::CommandHandler => "CommandHandler",
            Self::RequestHandler => "RequestHandler",
            Self::NotificationHandler => "NotificationHandler",
            Self::PipelineBehavior => "PipelineBehavior",
            Self::NotificationBehavior => "NotificationBehavior",
        }
    }

    /// The open form, e.g. `RequestHandler<,>`.
    pub fn open_name(self) -> String {
        format!("{}<{}>", self.name(), ",".repeat(self.arity() - 1))
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The abstract identity bindings are registered and resolved under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ServiceKey {
    /// A capability over concrete type arguments.
    Closed {
        /// The capability.
        capability: Capability,
        /// Its type arguments; the message type always comes first.
        args: Vec<TypeKey>,
    },
    /// A capability with every type argument left open.
    Open(Capability),
}

impl ServiceKey {
    /// A closed key.
    pub fn closed(capability: Capability, args: impl IntoIterator<Item = TypeKey>) -> Self {
        Self::Closed {
            capability,
            args: args.into_iter().collect(),
        }
    }

    /// An open key.
    pub fn open(capability: Capability) -> Self {
        Self::Open(capability)
    }

    /// The capability of the key.
    pub fn capability(&self) -> Capability {
        match self {
            Self::Closed { capability, .. } | Self::Open(capability) => *capability,
        }
    }

    /// Whether the key leaves its type arguments open.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    /// The type arguments of a closed key; empty for open keys.
    pub fn args(&self) -> &[TypeKey] {
        match self {
            Self::Closed { args, .. } => args,
            Self::Open(_) => &[],
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed { capability, args } => {
                write!(f, "{capability}<")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
            Self::Open(capability) => f.write_str(&capability.open_name()),
        }
    }
}
