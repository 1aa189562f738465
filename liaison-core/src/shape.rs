//! Runtime shape of a message type.
//!
//! A [`Shape`] is what open handlers see of a message they were not written
//! against: its type key, the generic family it belongs to (if any), and the
//! trait-object views it exposes. Views are how a message satisfies the
//! `Implements` bound of an open handler's generic parameter.
//!
//! # Example
//!
//! ```rust,ignore
//! trait HasName {
//!     fn name(&self) -> &str;
//! }
//!
//! impl Message for Greet {
//!     fn shape() -> Shape {
//!         Shape::builder::<Self>()
//!             .view::<dyn HasName>(|m| m, |m| m)
//!             .build()
//!     }
//! }
//! ```

use crate::types::TypeKey;
use std::{any::Any, collections::HashMap, fmt, sync::Arc};

/// Runtime metadata of a message type.
#[derive(Clone)]
pub struct Shape {
    key: TypeKey,
    definition: Option<TypeKey>,
    args: Vec<TypeKey>,
    views: HashMap<TypeKey, Arc<dyn Any + Send + Sync>>,
}

struct Caster<V: ?Sized + 'static> {
    as_ref: Box<dyn Fn(&(dyn Any + Send + Sync)) -> Option<&V> + Send + Sync>,
    as_mut: Box<dyn Fn(&mut (dyn Any + Send + Sync)) -> Option<&mut V> + Send + Sync>,
}

fn ref_caster<V, F>(f: F) -> Box<dyn Fn(&(dyn Any + Send + Sync)) -> Option<&V> + Send + Sync>
where
    V: ?Sized + 'static,
    F: Fn(&(dyn Any + Send + Sync)) -> Option<&V> + Send + Sync + 'static,
{
    Box::new(f)
}

fn mut_caster<V, F>(f: F) -> Box<dyn Fn(&mut (dyn Any + Send + Sync)) -> Option<&mut V> + Send + Sync>
where
    V: ?Sized + 'static,
    F: Fn(&mut (dyn Any + Send + Sync)) -> Option<&mut V> + Send + Sync + 'static,
{
    Box::new(f)
}

impl Shape {
    /// The plain shape of `T`: no generic family, no views.
    pub fn of<T: Any + Send + Sync>() -> Self {
        Self::builder::<T>().build()
    }

    /// Start describing the shape of `T`.
    pub fn builder<T: Any + Send + Sync>() -> ShapeBuilder<T> {
        ShapeBuilder {
            shape: Shape {
                key: TypeKey::of::<T>(),
                definition: None,
                args: Vec::new(),
                views: HashMap::new(),
            },
            _marker: std::marker::PhantomData,
        }
    }

    /// Key of the message type.
    pub fn key(&self) -> &TypeKey {
        &self.key
    }

    /// The generic definition the message is an instance of.
    pub fn definition(&self) -> Option<&TypeKey> {
        self.definition.as_ref()
    }

    /// The type arguments of the generic instance; empty when not generic.
    pub fn generic_args(&self) -> &[TypeKey] {
        &self.args
    }

    /// Whether the message exposes the view with the given key.
    pub fn implements(&self, view: &TypeKey) -> bool {
        self.views.contains_key(view)
    }

    /// Borrow `message` through the view `V`.
    pub fn view<'a, V: ?Sized + 'static>(
        &self,
        message: &'a (dyn Any + Send + Sync),
    ) -> Option<&'a V> {
        let caster = self.views.get(&TypeKey::of::<V>())?;
        let caster = caster.downcast_ref::<Caster<V>>()?;
        (caster.as_ref)(message)
    }

    /// Mutably borrow `message` through the view `V`.
    pub fn view_mut<'a, V: ?Sized + 'static>(
        &self,
        message: &'a mut (dyn Any + Send + Sync),
    ) -> Option<&'a mut V> {
        let caster = self.views.get(&TypeKey::of::<V>())?;
        let caster = caster.downcast_ref::<Caster<V>>()?;
        (caster.as_mut)(message)
    }
}

impl fmt::Debug for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Shape")
            .field("key", &self.key)
            .field("definition", &self.definition)
            .field("args", &self.args)
            .field("views", &self.views.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Shape`].
pub struct ShapeBuilder<T> {
    shape: Shape,
    _marker: std::marker::PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ShapeBuilder<T> {
    /// Declare `T` an instance of a generic definition over `args`.
    pub fn generic(mut self, definition: TypeKey, args: impl IntoIterator<Item = TypeKey>) -> Self {
        self.shape.definition = Some(definition);
        self.shape.args = args.into_iter().collect();
        self
    }

    /// Expose `T` through the trait object `V`.
    pub fn view<V: ?Sized + 'static>(
        mut self,
        as_ref: fn(&T) -> &V,
        as_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        let caster = Caster::<V> {
            as_ref: ref_caster(move |message| message.downcast_ref::<T>().map(as_ref)),
            as_mut: mut_caster(move |message| message.downcast_mut::<T>().map(as_mut)),
        };
        self.shape.views.insert(TypeKey::of::<V>(), Arc::new(caster));
        self
    }

    /// Finish the shape.
    pub fn build(self) -> Shape {
        self.shape
    }
}
