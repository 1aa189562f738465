//! Type-erased messages.

use crate::{error::MessageTypeMismatch, message::Message, shape::Shape};
use std::{any::Any, fmt, sync::Arc};

/// A response on the erased path.
pub type AnyResponse = Box<dyn Any + Send>;

/// An owned message whose concrete type is only known at runtime.
///
/// Open handlers and behaviors receive envelopes. They reach the message
/// through [`view`](Self::view) (trait objects declared in the message's
/// [`Shape`]) or through [`downcast_ref`](Self::downcast_ref) when they know
/// the concrete type.
pub struct Envelope {
    message: Box<dyn Any + Send + Sync>,
    shape: Arc<Shape>,
}

impl Envelope {
    /// Wrap a message using its own shape.
    pub fn new<M: Message>(message: M) -> Self {
        Self::with_shape(message, Arc::new(M::shape()))
    }

    /// Wrap a message whose shape was already computed.
    pub fn with_shape<M: Message>(message: M, shape: Arc<Shape>) -> Self {
        Self {
            message: Box::new(message),
            shape,
        }
    }

    /// The shape of the message.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// A shared handle to the shape of the message.
    pub fn shape_handle(&self) -> Arc<Shape> {
        self.shape.clone()
    }

    /// Short name of the message type.
    pub fn type_name(&self) -> &str {
        self.shape.key().name()
    }

    /// Whether the message is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.message.is::<T>()
    }

    /// Borrow the message as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.message.downcast_ref::<T>()
    }

    /// Mutably borrow the message as a `T`.
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.message.downcast_mut::<T>()
    }

    /// Borrow the message through the view `V` declared in its shape.
    pub fn view<V: ?Sized + 'static>(&self) -> Option<&V> {
        self.shape.view::<V>(self.message.as_ref())
    }

    /// Mutably borrow the message through the view `V` declared in its shape.
    pub fn view_mut<V: ?Sized + 'static>(&mut self) -> Option<&mut V> {
        self.shape.view_mut::<V>(self.message.as_mut())
    }

    /// Take the message out as a `T`, or get the envelope back.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let Self { message, shape } = self;
        match message.downcast::<T>() {
            Ok(message) => Ok(*message),
            Err(message) => Err(Self { message, shape }),
        }
    }

    /// Like [`downcast`](Self::downcast), failing with a typed error.
    pub fn expect_type<T: Any>(self) -> Result<T, MessageTypeMismatch> {
        self.downcast::<T>().map_err(|envelope| MessageTypeMismatch {
            expected: std::any::type_name::<T>(),
            found: envelope.type_name().to_string(),
        })
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("type", &self.type_name())
            .finish_non_exhaustive()
    }
}

/// Take a typed value out of an erased response.
pub fn downcast_response<T: Any>(response: AnyResponse) -> Result<T, MessageTypeMismatch> {
    response
        .downcast::<T>()
        .map(|response| *response)
        .map_err(|_| MessageTypeMismatch {
            expected: std::any::type_name::<T>(),
            found: "an unrelated response type".to_string(),
        })
}
