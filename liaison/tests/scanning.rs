//! Module scanning over types made visible with `declare!`.

mod common;

use common::*;
use lazy_static::lazy_static;
use liaison::{
    CancellationToken, Module, Publisher, ServiceCollection, ServiceCollectionExt,
    ServiceProviderExt,
};

lazy_static! {
    static ref SEEN: Log = log();
}

mod handlers {
    use super::SEEN;
    use crate::common::{Pinged, write};
    use liaison::{BoxError, CancellationToken, Component, NotificationHandler, TypeInfo};

    #[derive(Default)]
    pub struct Alpha;

    impl NotificationHandler<Pinged> for Alpha {
        async fn handle(&self, _notification: &Pinged, _cancel: CancellationToken) -> Result<(), BoxError> {
            write(&SEEN, "alpha");
            Ok(())
        }
    }

    impl Component for Alpha {
        fn type_info() -> TypeInfo {
            TypeInfo::builder::<Self>()
                .default_constructor()
                .notification_handler::<Pinged>()
                .build()
        }
    }

    #[derive(Default)]
    pub struct Zulu;

    impl NotificationHandler<Pinged> for Zulu {
        async fn handle(&self, _notification: &Pinged, _cancel: CancellationToken) -> Result<(), BoxError> {
            write(&SEEN, "zulu");
            Ok(())
        }
    }

    impl Component for Zulu {
        fn type_info() -> TypeInfo {
            TypeInfo::builder::<Self>()
                .default_constructor()
                .notification_handler::<Pinged>()
                .build()
        }
    }

    pub mod nested {
        use super::SEEN;
        use crate::common::{Pinged, write};
        use liaison::{BoxError, CancellationToken, Component, NotificationHandler, TypeInfo};

        #[derive(Default)]
        pub struct Mid;

        impl NotificationHandler<Pinged> for Mid {
            async fn handle(&self, _notification: &Pinged, _cancel: CancellationToken) -> Result<(), BoxError> {
                write(&SEEN, "mid");
                Ok(())
            }
        }

        impl Component for Mid {
            fn type_info() -> TypeInfo {
                TypeInfo::builder::<Self>()
                    .default_constructor()
                    .notification_handler::<Pinged>()
                    .build()
            }
        }
    }
}

liaison::declare!(handlers::Zulu, handlers::nested::Mid, handlers::Alpha);
liaison::declare!(Shout, PingHandler, DescribeHandler);

fn scanned(configure: impl FnOnce(&mut ServiceCollection)) -> Vec<String> {
    let mut services = ServiceCollection::new();
    configure(&mut services);
    services
        .iter()
        .map(|descriptor| descriptor.implementation().name().to_string())
        .collect()
}

#[tokio::test]
async fn test_scan_registers_in_full_path_order() {
    let mut services = ServiceCollection::new();
    services
        .add_mediator(|config| {
            config.register_services_from_module(&Module::of::<handlers::Alpha>())?;
            Ok(())
        })
        .unwrap();

    let names: Vec<&str> = services
        .iter()
        .map(|descriptor| descriptor.implementation().name())
        .collect();
    assert_eq!(names, vec!["Alpha", "Zulu", "Mid"]);

    let mediator = services.build_provider().mediator();
    mediator.publish(Pinged { sequence: 1 }, CancellationToken::none()).await.unwrap();
    assert_eq!(entries(&SEEN), vec!["alpha", "zulu", "mid"]);
}

#[test]
fn test_scan_of_submodule_is_limited_to_it() {
    let names = scanned(|services| {
        services
            .add_mediator(|config| {
                config.register_services_from_module(&Module::of::<handlers::nested::Mid>())?;
                Ok(())
            })
            .unwrap();
    });
    assert_eq!(names, vec!["Mid"]);
}

#[test]
fn test_scan_skips_ignored_definitions() {
    let names = scanned(|services| {
        services
            .add_mediator(|config| {
                config
                    .ignore_service::<Shout>()?
                    .register_services_from_module(&Module::of::<PingHandler>())?;
                Ok(())
            })
            .unwrap();
    });
    assert_eq!(names, vec!["DescribeHandler", "PingHandler"]);
}

#[test]
fn test_scan_skips_types_matching_a_predicate() {
    let names = scanned(|services| {
        services
            .add_mediator(|config| {
                config
                    .ignore_services_where(|info| info.name().starts_with('Z'))?
                    .register_services_from_module(&Module::of::<handlers::Alpha>())?;
                Ok(())
            })
            .unwrap();
    });
    assert_eq!(names, vec!["Alpha", "Mid"]);
}

#[test]
fn test_ignore_rules_only_affect_later_scans() {
    let names = scanned(|services| {
        services
            .add_mediator(|config| {
                config
                    .register_services_from_module(&Module::of::<PingHandler>())?
                    .ignore_service::<Shout>()?;
                Ok(())
            })
            .unwrap();
    });
    assert_eq!(names, vec!["DescribeHandler", "PingHandler", "ShoutWrapper"]);
}

#[test]
fn test_scan_of_containing_crate_covers_every_module() {
    let names = scanned(|services| {
        services
            .add_mediator(|config| {
                config.register_services_from_module_containing::<handlers::Alpha>()?;
                Ok(())
            })
            .unwrap();
    });
    assert_eq!(
        names,
        vec!["DescribeHandler", "PingHandler", "ShoutWrapper", "Alpha", "Zulu", "Mid"]
    );
}

#[test]
fn test_scan_of_several_modules_keeps_module_order() {
    let names = scanned(|services| {
        services
            .add_mediator(|config| {
                config.register_services_from_modules([
                    &Module::of::<handlers::nested::Mid>(),
                    &Module::of::<PingHandler>(),
                ])?;
                Ok(())
            })
            .unwrap();
    });
    assert_eq!(names, vec!["Mid", "DescribeHandler", "PingHandler", "ShoutWrapper"]);
}

#[test]
fn test_scan_of_unknown_module_registers_nothing() {
    let names = scanned(|services| {
        services
            .add_mediator(|config| {
                config.register_services_from_module(&Module::new("nowhere"))?;
                Ok(())
            })
            .unwrap();
    });
    assert!(names.is_empty());
}
