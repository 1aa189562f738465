#![allow(dead_code)]

use liaison::{
    AnyResponse, BoxError, CancellationToken, CommandHandler, Component, ConfigurationError,
    DynNext, Envelope, GenericParam, Mediator, MediatorConfiguration, Message, Notification,
    NotificationHandler, OpenNotificationHandler, OpenPipelineBehavior, OpenRequestHandler,
    Request, RequestHandler, ServiceCollection, ServiceCollectionExt, ServiceProviderExt, Shape,
    TypeArg, TypeInfo, TypeKey, Unit, registrar::DistinctRegistrar,
};
use std::sync::{Arc, Mutex};

// ============================================================================
// Test Message Types
// ============================================================================

#[derive(Clone, Debug, PartialEq)]
pub struct Ping {
    pub message: String,
}

impl Ping {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

impl Message for Ping {}
impl Request for Ping {
    type Response = String;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Save {
    pub id: u64,
}

impl Message for Save {}
impl Request for Save {
    type Response = Unit;
}

#[derive(Clone, Debug, PartialEq)]
pub struct Pinged {
    pub sequence: u32,
}

impl Message for Pinged {}
impl Notification for Pinged {}

#[derive(Clone, Debug, PartialEq)]
pub struct Counter {
    pub value: i32,
}

impl Message for Counter {}
impl Request for Counter {
    type Response = i32;
}

/// Something an open handler can work with without knowing the concrete type.
pub trait Describe: Send + Sync {
    fn describe(&self) -> String;
}

#[derive(Clone, Debug)]
pub struct Greet {
    pub name: String,
}

impl Describe for Greet {
    fn describe(&self) -> String {
        format!("greet {}", self.name)
    }
}

impl Message for Greet {
    fn shape() -> Shape {
        Shape::builder::<Self>().view::<dyn Describe>(|m| m, |m| m).build()
    }
}
impl Request for Greet {
    type Response = String;
}

/// Gives back the wrapped value of a [`Wrapped`] without knowing its type.
pub trait Inner: Send + Sync {
    fn inner(&self) -> AnyResponse;
}

#[derive(Clone, Debug)]
pub struct Wrapped<T>(pub T);

impl<T: Clone + Send + Sync + 'static> Inner for Wrapped<T> {
    fn inner(&self) -> AnyResponse {
        Box::new(self.0.clone())
    }
}

impl<T: Clone + Send + Sync + 'static> Message for Wrapped<T> {
    fn shape() -> Shape {
        Shape::builder::<Self>()
            .generic(TypeKey::definition_of::<Wrapped<()>>(), [TypeKey::of::<T>()])
            .view::<dyn Inner>(|m| m, |m| m)
            .build()
    }
}
impl<T: Clone + Send + Sync + 'static> Request for Wrapped<T> {
    type Response = T;
}

// ============================================================================
// Recorders
// ============================================================================

pub type Log = Arc<Mutex<Vec<String>>>;

pub fn log() -> Log {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn entries(log: &Log) -> Vec<String> {
    log.lock().unwrap().clone()
}

pub fn write(log: &Log, entry: impl Into<String>) {
    log.lock().unwrap().push(entry.into());
}

// ============================================================================
// Request Handlers
// ============================================================================

#[derive(Default)]
pub struct PingHandler;

impl RequestHandler<Ping> for PingHandler {
    async fn handle(&self, request: Ping, _cancel: CancellationToken) -> Result<String, BoxError> {
        Ok(format!("{} pong", request.message))
    }
}

impl Component for PingHandler {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .default_constructor()
            .request_handler::<Ping>()
            .build()
    }
}

/// A second handler for [`Ping`], used to provoke conflicts.
#[derive(Default)]
pub struct LoudPingHandler;

impl RequestHandler<Ping> for LoudPingHandler {
    async fn handle(&self, request: Ping, _cancel: CancellationToken) -> Result<String, BoxError> {
        Ok(request.message.to_uppercase())
    }
}

impl Component for LoudPingHandler {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .default_constructor()
            .request_handler::<Ping>()
            .build()
    }
}

/// Returns the counter value unchanged.
#[derive(Default)]
pub struct CounterHandler;

impl RequestHandler<Counter> for CounterHandler {
    async fn handle(&self, request: Counter, _cancel: CancellationToken) -> Result<i32, BoxError> {
        Ok(request.value)
    }
}

impl Component for CounterHandler {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .default_constructor()
            .request_handler::<Counter>()
            .build()
    }
}

/// Always fails with `"ping failed"`.
#[derive(Default)]
pub struct BrokenPingHandler;

impl RequestHandler<Ping> for BrokenPingHandler {
    async fn handle(&self, _request: Ping, _cancel: CancellationToken) -> Result<String, BoxError> {
        Err("ping failed".into())
    }
}

impl Component for BrokenPingHandler {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .default_constructor()
            .request_handler::<Ping>()
            .build()
    }
}

/// Records every saved command.
#[derive(Clone, Default)]
pub struct SaveHandler {
    pub saved: Arc<Mutex<Vec<u64>>>,
}

impl SaveHandler {
    pub fn info(&self) -> TypeInfo {
        let handler = self.clone();
        TypeInfo::builder::<Self>()
            .constructor(move || handler.clone())
            .command_handler::<Save>()
            .build()
    }

    pub fn saved(&self) -> Vec<u64> {
        self.saved.lock().unwrap().clone()
    }
}

impl CommandHandler<Save> for SaveHandler {
    async fn handle(&self, command: Save, _cancel: CancellationToken) -> Result<(), BoxError> {
        self.saved.lock().unwrap().push(command.id);
        Ok(())
    }
}

/// Handles [`Save`] as a request producing [`Unit`].
#[derive(Clone, Default)]
pub struct SaveRequestHandler {
    pub saved: Arc<Mutex<Vec<u64>>>,
}

impl SaveRequestHandler {
    pub fn info(&self) -> TypeInfo {
        let handler = self.clone();
        TypeInfo::builder::<Self>()
            .constructor(move || handler.clone())
            .request_handler::<Save>()
            .build()
    }

    pub fn saved(&self) -> Vec<u64> {
        self.saved.lock().unwrap().clone()
    }
}

impl RequestHandler<Save> for SaveRequestHandler {
    async fn handle(&self, command: Save, _cancel: CancellationToken) -> Result<Unit, BoxError> {
        self.saved.lock().unwrap().push(command.id);
        Ok(Unit)
    }
}

// ============================================================================
// Notification Handlers
// ============================================================================

/// Writes `listener {ID}` to its log for every [`Pinged`].
#[derive(Clone)]
pub struct Listener<const ID: usize> {
    pub log: Log,
}

impl<const ID: usize> Listener<ID> {
    pub fn info(log: &Log) -> TypeInfo {
        let handler = Listener::<ID> { log: log.clone() };
        TypeInfo::builder::<Self>()
            .constructor(move || handler.clone())
            .notification_handler::<Pinged>()
            .build()
    }
}

impl<const ID: usize> NotificationHandler<Pinged> for Listener<ID> {
    async fn handle(&self, _notification: &Pinged, _cancel: CancellationToken) -> Result<(), BoxError> {
        write(&self.log, format!("listener {ID}"));
        Ok(())
    }
}

/// Logs `faulty {ID}`, then fails with the same text.
#[derive(Clone)]
pub struct Faulty<const ID: usize> {
    pub log: Log,
}

impl<const ID: usize> Faulty<ID> {
    pub fn info(log: &Log) -> TypeInfo {
        let handler = Faulty::<ID> { log: log.clone() };
        TypeInfo::builder::<Self>()
            .constructor(move || handler.clone())
            .notification_handler::<Pinged>()
            .build()
    }
}

impl<const ID: usize> NotificationHandler<Pinged> for Faulty<ID> {
    async fn handle(&self, _notification: &Pinged, _cancel: CancellationToken) -> Result<(), BoxError> {
        write(&self.log, format!("faulty {ID}"));
        Err(format!("faulty {ID}").into())
    }
}

/// Panics on every notification.
#[derive(Clone, Default)]
pub struct Panicky;

impl Component for Panicky {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .default_constructor()
            .notification_handler::<Pinged>()
            .build()
    }
}

impl NotificationHandler<Pinged> for Panicky {
    async fn handle(&self, notification: &Pinged, _cancel: CancellationToken) -> Result<(), BoxError> {
        panic!("boom {}", notification.sequence)
    }
}

// ============================================================================
// Open Handlers
// ============================================================================

/// Answers any describable request with its description.
pub struct DescribeHandler;

impl OpenRequestHandler for DescribeHandler {
    async fn handle(&self, request: Envelope, _cancel: CancellationToken) -> Result<AnyResponse, BoxError> {
        let describe = request.view::<dyn Describe>().ok_or("request is not describable")?;
        Ok(Box::new(describe.describe()))
    }
}

impl Component for DescribeHandler {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .generic_param(GenericParam::new("TRequest").implements::<dyn Describe>())
            .generic_param(GenericParam::new("TResponse"))
            .constructor(|| DescribeHandler)
            .open_request_handler(TypeArg::param(0), TypeArg::param(1))
            .build()
    }
}

/// `Unwrap<T>: RequestHandler<Wrapped<T>, T>`.
pub struct Unwrap;

impl OpenRequestHandler for Unwrap {
    async fn handle(&self, request: Envelope, _cancel: CancellationToken) -> Result<AnyResponse, BoxError> {
        let wrapped = request.view::<dyn Inner>().ok_or("request is not wrapped")?;
        Ok(wrapped.inner())
    }
}

impl Component for Unwrap {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .generic_param(GenericParam::new("T"))
            .constructor(|| Unwrap)
            .open_request_handler(
                TypeArg::generic(TypeKey::definition_of::<Wrapped<()>>(), [TypeArg::param(0)]),
                TypeArg::param(0),
            )
            .build()
    }
}

/// `Shout<T: Describe>: RequestHandler<T, String>`.
pub struct Shout;

impl OpenRequestHandler for Shout {
    async fn handle(&self, request: Envelope, _cancel: CancellationToken) -> Result<AnyResponse, BoxError> {
        let describe = request.view::<dyn Describe>().ok_or("request is not describable")?;
        Ok(Box::new(describe.describe().to_uppercase()))
    }
}

impl Component for Shout {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .generic_param(GenericParam::new("T").implements::<dyn Describe>())
            .constructor(|| Shout)
            .open_request_handler(TypeArg::param(0), TypeArg::of::<String>())
            .build()
    }
}

/// Logs the type of every notification it sees.
#[derive(Clone)]
pub struct Audit {
    pub log: Log,
}

impl Audit {
    pub fn info(log: &Log) -> TypeInfo {
        let handler = Audit { log: log.clone() };
        TypeInfo::builder::<Self>()
            .generic_param(GenericParam::new("TNotification"))
            .constructor(move || handler.clone())
            .open_notification_handler(TypeArg::param(0))
            .build()
    }
}

impl OpenNotificationHandler for Audit {
    async fn handle(&self, notification: &Envelope, _cancel: CancellationToken) -> Result<(), BoxError> {
        write(&self.log, format!("audit {}", notification.shape().key()));
        Ok(())
    }
}

// ============================================================================
// Behaviors
// ============================================================================

/// An open behavior writing `{name}:in` and `{name}:out` around the rest of the chain.
#[derive(Clone)]
pub struct Trace {
    pub name: &'static str,
    pub log: Log,
}

impl Trace {
    pub fn info(name: &'static str, log: &Log) -> TypeInfo {
        let behavior = Trace { name, log: log.clone() };
        TypeInfo::builder::<Self>()
            .generic_param(GenericParam::new("TRequest"))
            .generic_param(GenericParam::new("TResponse"))
            .constructor(move || behavior.clone())
            .open_pipeline_behavior(TypeArg::param(0), TypeArg::param(1))
            .build()
    }
}

impl OpenPipelineBehavior for Trace {
    async fn handle(
        &self,
        request: Envelope,
        next: DynNext<'_>,
        cancel: CancellationToken,
    ) -> Result<AnyResponse, BoxError> {
        write(&self.log, format!("{}:in", self.name));
        let response = next.run(request, cancel).await;
        write(&self.log, format!("{}:out", self.name));
        response
    }
}

// ============================================================================
// Setup
// ============================================================================

/// Configure a fresh collection and build a mediator over it.
pub fn mediator<F>(configure: F) -> Mediator
where
    F: FnOnce(&mut MediatorConfiguration<DistinctRegistrar<'_>>) -> Result<(), ConfigurationError>,
{
    let mut services = ServiceCollection::new();
    services.add_mediator(configure).unwrap();
    services.build_provider().mediator()
}

/// Run `configure` and return its error.
pub fn configuration_error<F>(configure: F) -> ConfigurationError
where
    F: FnOnce(&mut MediatorConfiguration<DistinctRegistrar<'_>>) -> Result<(), ConfigurationError>,
{
    let mut services = ServiceCollection::new();
    match services.add_mediator(configure) {
        Ok(_) => panic!("configuration succeeded"),
        Err(error) => error,
    }
}
