//! The bundled behaviors and testing handlers, wired through a mediator.

#![cfg(feature = "timeout")]

mod common;

use common::*;
use liaison::{
    BoxError, CancellationToken, Component, DispatchError, Lifetime, Message, Publisher, Request,
    RequestHandler, Sender, TimeoutError, TypeInfo,
    behaviors::{LoggingBehavior, NotificationLoggingBehavior, TimeoutBehavior, TracingBehavior},
    testing::{CountingHandler, FailingHandler, RecordingHandler},
};
use std::time::Duration;

struct Nap {
    millis: u64,
}

impl Message for Nap {}
impl Request for Nap {
    type Response = u64;
}

#[derive(Default)]
struct NapHandler;

impl RequestHandler<Nap> for NapHandler {
    async fn handle(&self, request: Nap, _cancel: CancellationToken) -> Result<u64, BoxError> {
        tokio::time::sleep(Duration::from_millis(request.millis)).await;
        Ok(request.millis)
    }
}

impl Component for NapHandler {
    fn type_info() -> TypeInfo {
        TypeInfo::builder::<Self>()
            .default_constructor()
            .request_handler::<Nap>()
            .build()
    }
}

#[tokio::test]
async fn test_logging_and_tracing_behaviors_pass_results_through() {
    let mediator = mediator(|config| {
        config
            .add_open_behavior::<LoggingBehavior>(Lifetime::Singleton)?
            .add_open_behavior::<TracingBehavior>(Lifetime::Singleton)?
            .register_service::<PingHandler>()?;
        Ok(())
    });

    let response = mediator.send(Ping::new("a"), CancellationToken::none()).await.unwrap();
    assert_eq!(response, "a pong");
}

#[tokio::test]
async fn test_logging_behavior_passes_errors_through() {
    let mediator = mediator(|config| {
        config
            .add_open_behavior::<LoggingBehavior>(Lifetime::Transient)?
            .register_service::<BrokenPingHandler>()?;
        Ok(())
    });

    let error = mediator.send(Ping::new("a"), CancellationToken::none()).await.unwrap_err();
    assert_eq!(error.to_string(), "ping failed");
}

#[tokio::test]
async fn test_timeout_behavior_lets_fast_requests_finish() {
    let mediator = mediator(|config| {
        config
            .add_open_behavior_type(TimeoutBehavior::with_duration(Duration::from_secs(5)), Lifetime::Singleton)?
            .register_service::<NapHandler>()?;
        Ok(())
    });

    let response = mediator.send(Nap { millis: 1 }, CancellationToken::none()).await.unwrap();
    assert_eq!(response, 1);
}

#[tokio::test]
async fn test_timeout_behavior_fails_slow_requests() {
    let mediator = mediator(|config| {
        config
            .add_open_behavior_type(TimeoutBehavior::with_duration(Duration::from_millis(10)), Lifetime::Singleton)?
            .register_service::<NapHandler>()?;
        Ok(())
    });

    let error = mediator.send(Nap { millis: 500 }, CancellationToken::none()).await.unwrap_err();
    let DispatchError::Handler(error) = error else {
        panic!("expected a handler error");
    };
    let timeout = error.downcast_ref::<TimeoutError>().expect("timeout error");
    assert_eq!(timeout.0, Duration::from_millis(10));
}

#[tokio::test]
async fn test_recording_handler_sees_published_notifications() {
    let recorder = RecordingHandler::<Pinged>::new();
    let mediator = mediator(|config| {
        config
            .add_open_behavior::<NotificationLoggingBehavior>(Lifetime::Transient)?
            .register_services([recorder.notification_info()])?;
        Ok(())
    });

    mediator.publish(Pinged { sequence: 1 }, CancellationToken::none()).await.unwrap();
    mediator.publish(Pinged { sequence: 2 }, CancellationToken::none()).await.unwrap();

    assert_eq!(recorder.received(), vec![Pinged { sequence: 1 }, Pinged { sequence: 2 }]);
}

#[tokio::test]
async fn test_counting_handler_counts_commands_and_notifications() {
    let notifications = CountingHandler::new();
    let commands = CountingHandler::new();
    let mediator = mediator(|config| {
        config.register_services([notifications.notification_info::<Pinged>()])?;
        Ok(())
    });
    let command_mediator = common::mediator(|config| {
        config.register_services([commands.command_info::<Save>()])?;
        Ok(())
    });

    mediator.publish(Pinged { sequence: 1 }, CancellationToken::none()).await.unwrap();
    command_mediator.send_command(Save { id: 1 }, CancellationToken::none()).await.unwrap();
    command_mediator.send_command(Save { id: 2 }, CancellationToken::none()).await.unwrap();

    assert_eq!(notifications.count(), 1);
    assert_eq!(commands.count(), 2);
}

#[tokio::test]
async fn test_failing_handler_surfaces_its_message() {
    let failing = FailingHandler::new("nope");
    let mediator = mediator(|config| {
        config.register_services([
            failing.request_info::<Counter>(),
            failing.notification_info::<Pinged>(),
        ])?;
        Ok(())
    });

    let send = mediator.send(Counter { value: 1 }, CancellationToken::none()).await.unwrap_err();
    assert_eq!(send.to_string(), "nope");

    let publish = mediator
        .publish(Pinged { sequence: 1 }, CancellationToken::none())
        .await
        .unwrap_err();
    assert!(matches!(publish, DispatchError::Aggregate(ref aggregate) if aggregate.len() == 1));
}
