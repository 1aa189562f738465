//! Type descriptors.

use super::key::{Capability, ServiceKey, TypeKey, module_of};
use crate::{
    behavior::{
        NotificationBehavior, OpenBehavior, OpenNotificationBehavior, OpenPipelineBehavior,
        PipelineBehavior, TypedNotificationBehavior, TypedPipelineBehavior,
    },
    handler::{
        CommandHandler, NotificationHandler, Open, OpenCommand, OpenCommandHandler,
        OpenNotificationHandler, OpenRequestHandler, RequestHandler, TypedCommandHandler,
        TypedNotificationHandler, TypedRequestHandler,
    },
    message::{Command, Notification, Request},
    service::{Instance, Service},
};
use bitflags::bitflags;
use std::{any::type_name, borrow::Cow, fmt, marker::PhantomData, sync::Arc};

bitflags! {
    /// Kind flags of a described type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TypeFlags: u8 {
        /// The type cannot be constructed itself.
        const ABSTRACT = 1;
        /// The type describes an interface rather than an implementation.
        const INTERFACE = 1 << 1;
    }
}

/// A type argument of a declared capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeArg {
    /// A concrete type.
    Type(TypeKey),
    /// The generic parameter at this index of the implementing type.
    Param(usize),
    /// An instance of a generic family over further arguments, e.g. `Wrapped<T>`.
    Generic {
        /// The generic definition.
        definition: TypeKey,
        /// Its arguments.
        args: Vec<TypeArg>,
    },
}

impl TypeArg {
    /// A concrete type argument.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::Type(TypeKey::of::<T>())
    }

    /// The implementing type's generic parameter at `index`.
    pub fn param(index: usize) -> Self {
        Self::Param(index)
    }

    /// An instance of a generic family.
    pub fn generic(definition: TypeKey, args: impl IntoIterator<Item = TypeArg>) -> Self {
        Self::Generic {
            definition,
            args: args.into_iter().collect(),
        }
    }

    /// Whether the argument is a bare generic parameter.
    pub fn is_param(&self) -> bool {
        matches!(self, Self::Param(_))
    }

    /// Whether the argument mentions no generic parameter.
    pub fn is_closed(&self) -> bool {
        match self {
            Self::Type(_) => true,
            Self::Param(_) => false,
            Self::Generic { args, .. } => args.iter().all(Self::is_closed),
        }
    }

    /// Replace every parameter through `map`.
    pub fn substitute(&self, map: &impl Fn(usize) -> TypeArg) -> TypeArg {
        match self {
            Self::Type(key) => Self::Type(key.clone()),
            Self::Param(index) => map(*index),
            Self::Generic { definition, args } => Self::Generic {
                definition: definition.clone(),
                args: args.iter().map(|arg| arg.substitute(map)).collect(),
            },
        }
    }
}

impl fmt::Display for TypeArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type(key) => write!(f, "{key}"),
            Self::Param(index) => write!(f, "T{index}"),
            Self::Generic { definition, args } => {
                write!(f, "{definition}<")?;
                for (index, arg) in args.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(">")
            }
        }
    }
}

/// A requirement on the type a generic parameter closes over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    /// The type's shape exposes this view (a `dyn Trait` key).
    Implements(TypeKey),
    /// The type matches this pattern.
    Matches(TypeArg),
}

/// A generic parameter of an open type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericParam {
    name: Cow<'static, str>,
    bounds: Vec<Bound>,
}

impl GenericParam {
    /// An unbounded parameter.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            bounds: Vec::new(),
        }
    }

    /// Require the closing type to expose the view `V`.
    pub fn implements<V: ?Sized + 'static>(mut self) -> Self {
        self.bounds.push(Bound::Implements(TypeKey::of::<V>()));
        self
    }

    /// Require the closing type to match `pattern`.
    pub fn matches(mut self, pattern: TypeArg) -> Self {
        self.bounds.push(Bound::Matches(pattern));
        self
    }

    /// Add an existing bound.
    pub fn bound(mut self, bound: Bound) -> Self {
        self.bounds.push(bound);
        self
    }

    /// Name of the parameter.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Its bounds.
    pub fn bounds(&self) -> &[Bound] {
        &self.bounds
    }
}

/// Generic shape of a described type.
#[derive(Debug, Clone, Default)]
pub enum Generics {
    /// Not generic.
    #[default]
    None,
    /// A generic definition with unbound parameters.
    Definition(Vec<GenericParam>),
    /// A generic type with every argument bound, e.g. `Cache<String>`.
    Constructed {
        /// The definition it instantiates.
        definition: TypeKey,
        /// The bound arguments.
        args: Vec<TypeKey>,
    },
}

type Binder = Arc<dyn Fn(Instance) -> Option<Service> + Send + Sync>;

/// A constructor of an implementation.
pub type Constructor = Arc<dyn Fn() -> Instance + Send + Sync>;

/// One capability a type implements, with its type arguments.
#[derive(Clone)]
pub struct CapabilityImpl {
    capability: Capability,
    args: Vec<TypeArg>,
    binder: Binder,
}

impl CapabilityImpl {
    /// The capability.
    pub fn capability(&self) -> Capability {
        self.capability
    }

    /// Its type arguments; the message slot comes first.
    pub fn args(&self) -> &[TypeArg] {
        &self.args
    }

    /// The closed service key, when no argument mentions a parameter.
    pub fn closed_key(&self) -> Option<ServiceKey> {
        self.args
            .iter()
            .map(|arg| match arg {
                TypeArg::Type(key) => Some(key.clone()),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(|args| ServiceKey::closed(self.capability, args))
    }

    /// Bind a constructed instance as this capability.
    pub fn bind(&self, instance: Instance) -> Option<Service> {
        (self.binder)(instance)
    }

    pub(crate) fn rebound(&self, capability: Capability, args: Vec<TypeArg>) -> Self {
        Self {
            capability,
            args,
            binder: self.binder.clone(),
        }
    }
}

impl fmt::Debug for CapabilityImpl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}<", self.capability)?;
        for (index, arg) in self.args.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{arg}")?;
        }
        f.write_str(">")
    }
}

/// Describes a candidate type to the registration engine.
///
/// This is the metadata a registration scan inspects: whether the type is
/// abstract, whether it is generic, which capabilities it implements over
/// which type arguments, and how to construct it.
#[derive(Clone)]
pub struct TypeInfo {
    pub(crate) key: TypeKey,
    pub(crate) module: &'static str,
    pub(crate) flags: TypeFlags,
    pub(crate) generics: Generics,
    pub(crate) capabilities: Vec<CapabilityImpl>,
    pub(crate) constructors: Vec<Constructor>,
}

impl TypeInfo {
    /// Start describing `T`.
    pub fn builder<T: Send + Sync + 'static>() -> TypeInfoBuilder<T> {
        TypeInfoBuilder {
            info: TypeInfo {
                key: TypeKey::of::<T>(),
                module: module_of(type_name::<T>()),
                flags: TypeFlags::empty(),
                generics: Generics::None,
                capabilities: Vec::new(),
                constructors: Vec::new(),
            },
            _marker: PhantomData,
        }
    }

    /// Identity of the type.
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// Short name of the type.
    pub fn name(&self) -> &str {
        self.key.name()
    }

    /// Module path the type is declared in.
    pub fn module(&self) -> &'static str {
        self.module
    }

    /// Kind flags.
    pub fn flags(&self) -> TypeFlags {
        self.flags
    }

    /// Whether the type is abstract.
    pub fn is_abstract(&self) -> bool {
        self.flags.contains(TypeFlags::ABSTRACT)
    }

    /// Whether the type describes an interface.
    pub fn is_interface(&self) -> bool {
        self.flags.contains(TypeFlags::INTERFACE)
    }

    /// Whether the type is generic, bound or not.
    pub fn is_generic(&self) -> bool {
        !matches!(self.generics, Generics::None)
    }

    /// Whether the type is a generic definition with unbound parameters.
    pub fn is_generic_definition(&self) -> bool {
        matches!(self.generics, Generics::Definition(_))
    }

    /// The generic shape.
    pub fn generics(&self) -> &Generics {
        &self.generics
    }

    /// Unbound parameters of a generic definition.
    pub fn generic_params(&self) -> &[GenericParam] {
        match &self.generics {
            Generics::Definition(params) => params,
            _ => &[],
        }
    }

    /// Number of generic parameters (or bound arguments).
    pub fn generic_param_count(&self) -> usize {
        match &self.generics {
            Generics::None => 0,
            Generics::Definition(params) => params.len(),
            Generics::Constructed { args, .. } => args.len(),
        }
    }

    /// Every declared capability.
    pub fn capabilities(&self) -> &[CapabilityImpl] {
        &self.capabilities
    }

    /// Declared implementations of one capability.
    pub fn capabilities_of(&self, capability: Capability) -> impl Iterator<Item = &CapabilityImpl> {
        self.capabilities
            .iter()
            .filter(move |declared| declared.capability == capability)
    }

    /// Whether the type implements the capability at all.
    pub fn implements(&self, capability: Capability) -> bool {
        self.capabilities_of(capability).next().is_some()
    }

    /// Declared constructors.
    pub fn constructors(&self) -> &[Constructor] {
        &self.constructors
    }

    /// Construct an instance with the first constructor.
    pub fn construct(&self) -> Option<Instance> {
        self.constructors.first().map(|constructor| constructor())
    }
}

impl fmt::Debug for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeInfo")
            .field("key", &self.key)
            .field("module", &self.module)
            .field("flags", &self.flags)
            .field("generics", &self.generics)
            .field("capabilities", &self.capabilities)
            .field("constructors", &self.constructors.len())
            .finish()
    }
}

/// Builder for [`TypeInfo`].
///
/// Capability methods only compile when `T` actually implements the
/// capability, so a descriptor cannot claim a capability its type lacks.
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
pub struct TypeInfoBuilder<T> {
    info: TypeInfo,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> TypeInfoBuilder<T> {
    /// Override the module path used by module scans.
    pub fn module(mut self, module: &'static str) -> Self {
        self.info.module = module;
        self
    }

    /// Set kind flags.
    pub fn flags(mut self, flags: TypeFlags) -> Self {
        self.info.flags |= flags;
        self
    }

    /// Declare a generic parameter, making the type a generic definition.
    pub fn generic_param(mut self, param: GenericParam) -> Self {
        match &mut self.info.generics {
            Generics::Definition(params) => params.push(param),
            generics => *generics = Generics::Definition(vec![param]),
        }
        self
    }

    /// Declare the type an instance of `definition` over `args`.
    pub fn constructed_from(
        mut self,
        definition: TypeKey,
        args: impl IntoIterator<Item = TypeKey>,
    ) -> Self {
        self.info.generics = Generics::Constructed {
            definition,
            args: args.into_iter().collect(),
        };
        self
    }

    /// Add a constructor.
    pub fn constructor(mut self, constructor: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.info
            .constructors
            .push(Arc::new(move || Arc::new(constructor()) as Instance));
        self
    }

    /// Add [`Default::default`] as constructor.
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    fn capability(mut self, capability: Capability, args: Vec<TypeArg>, binder: Binder) -> Self {
        self.info.capabilities.push(CapabilityImpl {
            capability,
            args,
            binder,
        });
        self
    }

    /// Declare `T: RequestHandler<R>`.
    pub fn request_handler<R: Request>(self) -> Self
    where
        T: RequestHandler<R>,
    {
        self.capability(
            Capability::RequestHandler,
            vec![TypeArg::of::<R>(), TypeArg::of::<R::Response>()],
            Arc::new(|instance: Instance| {
                let handler = instance.downcast::<T>().ok()?;
                Some(Service::Request(Arc::new(TypedRequestHandler::<T, R>::new(handler))))
            }),
        )
    }

    /// Declare `T: CommandHandler<C>`.
    pub fn command_handler<C: Command>(self) -> Self
    where
        T: CommandHandler<C>,
    {
        self.capability(
            Capability::CommandHandler,
            vec![TypeArg::of::<C>()],
            Arc::new(|instance: Instance| {
                let handler = instance.downcast::<T>().ok()?;
                Some(Service::Request(Arc::new(TypedCommandHandler::<T, C>::new(handler))))
            }),
        )
    }

    /// Declare `T: NotificationHandler<N>`.
    pub fn notification_handler<N: Notification>(self) -> Self
    where
        T: NotificationHandler<N>,
    {
        self.capability(
            Capability::NotificationHandler,
            vec![TypeArg::of::<N>()],
            Arc::new(|instance: Instance| {
                let handler = instance.downcast::<T>().ok()?;
                Some(Service::Notification(Arc::new(
                    TypedNotificationHandler::<T, N>::new(handler),
                )))
            }),
        )
    }

    /// Declare `T: PipelineBehavior<R>`.
    pub fn pipeline_behavior<R: Request>(self) -> Self
    where
        T: PipelineBehavior<R>,
    {
        self.capability(
            Capability::PipelineBehavior,
            vec![TypeArg::of::<R>(), TypeArg::of::<R::Response>()],
            Arc::new(|instance: Instance| {
                let behavior = instance.downcast::<T>().ok()?;
                Some(Service::PipelineBehavior(Arc::new(
                    TypedPipelineBehavior::<T, R>::new(behavior),
                )))
            }),
        )
    }

    /// Declare `T: NotificationBehavior<N>`.
    pub fn notification_behavior<N: Notification>(self) -> Self
    where
        T: NotificationBehavior<N>,
    {
        self.capability(
            Capability::NotificationBehavior,
            vec![TypeArg::of::<N>()],
            Arc::new(|instance: Instance| {
                let behavior = instance.downcast::<T>().ok()?;
                Some(Service::NotificationBehavior(Arc::new(
                    TypedNotificationBehavior::<T, N>::new(behavior),
                )))
            }),
        )
    }

    /// Declare an open request handler over `RequestHandler<request, response>`.
    pub fn open_request_handler(self, request: TypeArg, response: TypeArg) -> Self
    where
        T: OpenRequestHandler,
    {
        self.capability(
            Capability::RequestHandler,
            vec![request, response],
            Arc::new(|instance: Instance| {
                let handler = instance.downcast::<T>().ok()?;
                Some(Service::Request(Arc::new(Open(handler))))
            }),
        )
    }

    /// Declare an open command handler over `CommandHandler<command>`.
    pub fn open_command_handler(self, command: TypeArg) -> Self
    where
        T: OpenCommandHandler,
    {
        self.capability(
            Capability::CommandHandler,
            vec![command],
            Arc::new(|instance: Instance| {
                let handler = instance.downcast::<T>().ok()?;
                Some(Service::Request(Arc::new(OpenCommand(handler))))
            }),
        )
    }

    /// Declare an open notification handler over `NotificationHandler<notification>`.
    pub fn open_notification_handler(self, notification: TypeArg) -> Self
    where
        T: OpenNotificationHandler,
    {
        self.capability(
            Capability::NotificationHandler,
            vec![notification],
            Arc::new(|instance: Instance| {
                let handler = instance.downcast::<T>().ok()?;
                Some(Service::Notification(Arc::new(Open(handler))))
            }),
        )
    }

    /// Declare an open request behavior over `PipelineBehavior<request, response>`.
    pub fn open_pipeline_behavior(self, request: TypeArg, response: TypeArg) -> Self
    where
        T: OpenPipelineBehavior,
    {
        self.capability(
            Capability::PipelineBehavior,
            vec![request, response],
            Arc::new(|instance: Instance| {
                let behavior = instance.downcast::<T>().ok()?;
                Some(Service::PipelineBehavior(Arc::new(OpenBehavior(behavior))))
            }),
        )
    }

    /// Declare an open notification behavior over `NotificationBehavior<notification>`.
    pub fn open_notification_behavior(self, notification: TypeArg) -> Self
    where
        T: OpenNotificationBehavior,
    {
        self.capability(
            Capability::NotificationBehavior,
            vec![notification],
            Arc::new(|instance: Instance| {
                let behavior = instance.downcast::<T>().ok()?;
                Some(Service::NotificationBehavior(Arc::new(OpenBehavior(
                    behavior,
                ))))
            }),
        )
    }

    /// Finish the descriptor.
    pub fn build(self) -> TypeInfo {
        self.info
    }
}
