//! # Type classification
//!
//! Decides what a candidate type is to the registration engine, from its
//! [`TypeInfo`] alone:
//!
//! - abstract types and interfaces are skipped,
//! - types without a handler capability are not handlers,
//! - types with generic parameters take the open path, whatever else they implement,
//! - every other handler is registered once per implemented capability.
//!
//! [`open_rule`] then decides how an open handler is registered from its
//! family and generic parameter count.

use liaison_core::{CapabilityImpl, TypeInfo};

/// The handler family of an open handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerFamily {
    /// Request or command handlers.
    Request,
    /// Notification handlers.
    Notification,
}

/// What a candidate type is.
#[derive(Debug)]
pub enum Classification<'a> {
    /// Abstract or an interface; never registered.
    Skipped,
    /// Implements no handler capability.
    NotHandler,
    /// A closed handler, with every handler capability it implements.
    Closed(Vec<&'a CapabilityImpl>),
    /// A generic definition implementing a handler capability.
    Open(HandlerFamily),
}

/// Classify a candidate type.
pub fn classify(info: &TypeInfo) -> Classification<'_> {
    if info.is_abstract() || info.is_interface() {
        return Classification::Skipped;
    }

    let handlers: Vec<&CapabilityImpl> = info
        .capabilities()
        .iter()
        .filter(|declared| declared.capability().is_handler())
        .collect();
    if handlers.is_empty() {
        return Classification::NotHandler;
    }

    if !info.is_generic_definition() {
        return Classification::Closed(handlers);
    }

    let family = if handlers.iter().any(|declared| declared.capability().is_request_handler()) {
        HandlerFamily::Request
    } else {
        HandlerFamily::Notification
    };
    Classification::Open(family)
}

/// How an open handler is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenRule {
    /// A generic type without parameters; an engine bug.
    Unreachable,
    /// A one-parameter request handler; the free slot decides.
    Disambiguate,
    /// Registered directly under the open key.
    Register,
    /// Too many parameters.
    Unsupported,
}

/// The open-handler arity table.
pub fn open_rule(family: HandlerFamily, arity: usize) -> OpenRule {
    match (family, arity) {
        (_, 0) => OpenRule::Unreachable,
        (HandlerFamily::Request, 1) => OpenRule::Disambiguate,
        (HandlerFamily::Request, 2) => OpenRule::Register,
        (HandlerFamily::Notification, 1) => OpenRule::Register,
        _ => OpenRule::Unsupported,
    }
}

/// Request-family capabilities of an open handler.
pub(crate) fn request_capabilities(info: &TypeInfo) -> impl Iterator<Item = &CapabilityImpl> {
    info.capabilities()
        .iter()
        .filter(|declared| declared.capability().is_request_handler())
}

/// Whether the type is a handler by shape, ignoring flags and generics.
pub(crate) fn is_handler_shaped(info: &TypeInfo) -> bool {
    info.capabilities()
        .iter()
        .any(|declared| declared.capability().is_handler())
}
