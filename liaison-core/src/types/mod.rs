//! # Type model
//!
//! The registration engine never inspects Rust types directly. Every
//! candidate is described by a [`TypeInfo`]: its identity, whether it is
//! abstract or generic, the capabilities it implements over which type
//! arguments, and its constructors. Messages are described at call time by
//! their [`Shape`](crate::Shape).

mod info;
mod key;
pub mod matching;
mod wrapper;

pub use info::{
    Bound, CapabilityImpl, Constructor, GenericParam, Generics, TypeArg, TypeFlags, TypeInfo,
    TypeInfoBuilder,
};
pub use key::{Capability, ServiceKey, TypeKey, module_of};
pub use wrapper::synthesize_wrapper;

/// A type that can describe itself to the registration engine.
///
/// # Example
///
/// ```rust,ignore
/// impl Component for PingHandler {
///     fn type_info() -> TypeInfo {
///         TypeInfo::builder::<Self>()
///             .default_constructor()
///             .request_handler::<Ping>()
///             .build()
///     }
/// }
/// ```
#[diagnostic::on_unimplemented(
    message = "`{Self}` does not implement `Component`",
    label = "missing `Component` implementation",
    note = "Describe the type with `TypeInfo::builder::<{Self}>()` in `Component::type_info`."
)]
pub trait Component: 'static {
    /// The descriptor of this type.
    fn type_info() -> TypeInfo;
}
