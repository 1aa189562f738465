//! Closing open capabilities over concrete type arguments.
//!
//! An open handler declares its capability over [`TypeArg`]s that mention
//! its own generic parameters. At call time the mediator knows the concrete
//! arguments (the message type and, for requests, the response type) and
//! the message's [`Shape`]. [`close`] unifies the two and checks every
//! parameter bound; a handler whose capability cannot be closed over the
//! arguments simply does not apply to the message.

use super::{
    info::{Bound, GenericParam, TypeArg},
    key::TypeKey,
};
use crate::shape::Shape;

/// Types bound to generic parameters by a successful [`close`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    slots: Vec<Option<TypeKey>>,
}

impl Bindings {
    fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    /// The type bound to parameter `index`.
    pub fn get(&self, index: usize) -> Option<&TypeKey> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    fn bind(&mut self, index: usize, key: &TypeKey) -> bool {
        match self.slots.get_mut(index) {
            Some(Some(bound)) => bound == key,
            Some(slot) => {
                *slot = Some(key.clone());
                true
            }
            None => false,
        }
    }
}

/// Close `pattern` over `target`, or `None` if the capability does not apply.
///
/// `message` is the shape of the message type, the only type whose family
/// and views are known at call time. Parameters left unbound by the pattern
/// are unconstrained.
pub fn close(
    params: &[GenericParam],
    pattern: &[TypeArg],
    target: &[TypeKey],
    message: &Shape,
) -> Option<Bindings> {
    if pattern.len() != target.len() {
        return None;
    }

    let mut bindings = Bindings::new(params.len());
    for (arg, key) in pattern.iter().zip(target) {
        if !unify(arg, key, message, &mut bindings) {
            return None;
        }
    }

    for (index, param) in params.iter().enumerate() {
        let Some(bound) = bindings.get(index).cloned() else {
            continue;
        };
        for requirement in param.bounds() {
            if !satisfies(requirement, &bound, message, &mut bindings) {
                return None;
            }
        }
    }

    Some(bindings)
}

fn unify(arg: &TypeArg, key: &TypeKey, message: &Shape, bindings: &mut Bindings) -> bool {
    match arg {
        TypeArg::Type(expected) => expected == key,
        TypeArg::Param(index) => bindings.bind(*index, key),
        TypeArg::Generic { definition, args } => {
            let Some(shape) = shape_of(key, message) else {
                return false;
            };
            shape.definition() == Some(definition)
                && shape.generic_args().len() == args.len()
                && args
                    .iter()
                    .zip(shape.generic_args())
                    .all(|(arg, key)| unify(arg, key, message, bindings))
        }
    }
}

fn satisfies(bound: &Bound, key: &TypeKey, message: &Shape, bindings: &mut Bindings) -> bool {
    match bound {
        Bound::Implements(view) => shape_of(key, message).is_some_and(|shape| shape.implements(view)),
        Bound::Matches(pattern) => unify(pattern, key, message, bindings),
    }
}

fn shape_of<'a>(key: &TypeKey, message: &'a Shape) -> Option<&'a Shape> {
    (message.key() == key).then_some(message)
}

/// The first argument of `pattern` that can never close, if any, for display.
///
/// [`close`] only knows the shape of the message, the first argument. A
/// generic pattern or a view bound is only satisfiable where it applies to
/// the message type itself: the message slot, or a parameter bound to it.
/// Parameters bound to the message's own generic arguments count as
/// unknown shapes too.
pub fn unmatchable_argument(params: &[GenericParam], pattern: &[TypeArg]) -> Option<String> {
    let (message, rest) = pattern.split_first()?;

    let mut anchored = vec![false; params.len()];
    if let TypeArg::Param(index) = message {
        if let Some(slot) = anchored.get_mut(*index) {
            *slot = true;
        }
    }
    // A parameter matching another one closes over the same type.
    loop {
        let mut changed = false;
        for (index, param) in params.iter().enumerate() {
            for bound in param.bounds() {
                let Bound::Matches(TypeArg::Param(other)) = bound else {
                    continue;
                };
                let (Some(&this), Some(&that)) = (anchored.get(index), anchored.get(*other)) else {
                    continue;
                };
                if this != that {
                    anchored[index] = true;
                    anchored[*other] = true;
                    changed = true;
                }
            }
        }
        if !changed {
            break;
        }
    }

    if !is_shallow(message) {
        return Some(message.to_string());
    }
    if let Some(argument) = rest.iter().find(|arg| !is_flat(arg)) {
        return Some(argument.to_string());
    }
    for (index, param) in params.iter().enumerate() {
        let on_message = anchored[index];
        for bound in param.bounds() {
            let matchable = match bound {
                Bound::Implements(_) => on_message,
                Bound::Matches(pattern) if on_message => is_shallow(pattern),
                Bound::Matches(pattern) => is_flat(pattern),
            };
            if !matchable {
                return Some(param.name().to_string());
            }
        }
    }
    None
}

/// No generic pattern anywhere.
fn is_flat(arg: &TypeArg) -> bool {
    !matches!(arg, TypeArg::Generic { .. })
}

/// At most one generic pattern, at the top.
fn is_shallow(arg: &TypeArg) -> bool {
    match arg {
        TypeArg::Generic { args, .. } => args.iter().all(is_flat),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Named {
        fn name(&self) -> &str;
    }

    struct Plain;

    struct Wrapped<T>(T);

    impl Named for Wrapped<i32> {
        fn name(&self) -> &str {
            "wrapped"
        }
    }

    fn wrapped_shape() -> Shape {
        Shape::builder::<Wrapped<i32>>()
            .generic(TypeKey::definition_of::<Wrapped<()>>(), [TypeKey::of::<i32>()])
            .view::<dyn Named>(|m| m, |m| m)
            .build()
    }

    fn two_params() -> Vec<GenericParam> {
        vec![GenericParam::new("TRequest"), GenericParam::new("TResponse")]
    }

    #[test]
    fn free_parameters_bind_to_anything() {
        let shape = Shape::of::<Plain>();
        let bindings = close(
            &two_params(),
            &[TypeArg::param(0), TypeArg::param(1)],
            &[TypeKey::of::<Plain>(), TypeKey::of::<String>()],
            &shape,
        )
        .unwrap();

        assert_eq!(bindings.get(0), Some(&TypeKey::of::<Plain>()));
        assert_eq!(bindings.get(1), Some(&TypeKey::of::<String>()));
    }

    #[test]
    fn concrete_arguments_must_be_equal() {
        let shape = Shape::of::<Plain>();
        let pattern = [TypeArg::param(0), TypeArg::of::<String>()];

        assert!(close(&two_params(), &pattern, &[TypeKey::of::<Plain>(), TypeKey::of::<String>()], &shape).is_some());
        assert!(close(&two_params(), &pattern, &[TypeKey::of::<Plain>(), TypeKey::of::<u8>()], &shape).is_none());
    }

    #[test]
    fn generic_patterns_use_the_message_family() {
        let shape = wrapped_shape();
        let definition = TypeKey::definition_of::<Wrapped<()>>();
        let params = vec![GenericParam::new("TResponse")];
        let pattern = [TypeArg::generic(definition, [TypeArg::param(0)]), TypeArg::param(0)];

        let target = [TypeKey::of::<Wrapped<i32>>(), TypeKey::of::<i32>()];
        let bindings = close(&params, &pattern, &target, &shape).unwrap();
        assert_eq!(bindings.get(0), Some(&TypeKey::of::<i32>()));

        let mismatched = [TypeKey::of::<Wrapped<i32>>(), TypeKey::of::<String>()];
        assert!(close(&params, &pattern, &mismatched, &shape).is_none());
    }

    #[test]
    fn view_bounds_require_the_view() {
        let params = vec![GenericParam::new("TRequest").implements::<dyn Named>()];
        let pattern = [TypeArg::param(0)];

        let shape = wrapped_shape();
        assert!(close(&params, &pattern, &[TypeKey::of::<Wrapped<i32>>()], &shape).is_some());

        let plain = Shape::of::<Plain>();
        assert!(close(&params, &pattern, &[TypeKey::of::<Plain>()], &plain).is_none());
    }

    #[test]
    fn match_bounds_constrain_other_parameters() {
        let definition = TypeKey::definition_of::<Wrapped<()>>();
        let params = vec![
            GenericParam::new("TRequest").matches(TypeArg::generic(definition, [TypeArg::param(1)])),
            GenericParam::new("TResponse"),
        ];
        let pattern = [TypeArg::param(0), TypeArg::param(1)];
        let shape = wrapped_shape();

        let ok = [TypeKey::of::<Wrapped<i32>>(), TypeKey::of::<i32>()];
        assert!(close(&params, &pattern, &ok, &shape).is_some());

        let wrong = [TypeKey::of::<Wrapped<i32>>(), TypeKey::of::<u64>()];
        assert!(close(&params, &pattern, &wrong, &shape).is_none());
    }

    #[test]
    fn arity_mismatch_never_closes() {
        let shape = Shape::of::<Plain>();
        assert!(close(&two_params(), &[TypeArg::param(0)], &[TypeKey::of::<Plain>(), TypeKey::of::<u8>()], &shape).is_none());
        let _ = Wrapped(0).0;
    }

    #[test]
    fn patterns_on_the_message_are_matchable() {
        let definition = TypeKey::definition_of::<Wrapped<()>>();
        let viewed = vec![GenericParam::new("TRequest").implements::<dyn Named>(), GenericParam::new("TResponse")];
        assert_eq!(unmatchable_argument(&viewed, &[TypeArg::param(0), TypeArg::param(1)]), None);

        let family = [TypeArg::generic(definition.clone(), [TypeArg::param(0)]), TypeArg::param(0)];
        assert_eq!(unmatchable_argument(&[GenericParam::new("TValue")], &family), None);

        let matched = vec![
            GenericParam::new("TRequest").matches(TypeArg::generic(definition, [TypeArg::param(1)])),
            GenericParam::new("TResponse"),
        ];
        assert_eq!(unmatchable_argument(&matched, &[TypeArg::param(0), TypeArg::param(1)]), None);
    }

    #[test]
    fn generic_response_patterns_are_unmatchable() {
        let list = TypeKey::definition_of::<Vec<()>>();
        let pattern = [TypeArg::param(0), TypeArg::generic(list.clone(), [TypeArg::param(0)])];
        assert_eq!(
            unmatchable_argument(&[GenericParam::new("T")], &pattern).as_deref(),
            Some("Vec<T0>")
        );

        let bounded = vec![
            GenericParam::new("TRequest"),
            GenericParam::new("TResponse").matches(TypeArg::generic(list, [TypeArg::param(0)])),
        ];
        assert_eq!(
            unmatchable_argument(&bounded, &[TypeArg::param(0), TypeArg::param(1)]).as_deref(),
            Some("TResponse")
        );
    }

    #[test]
    fn view_bounds_off_the_message_are_unmatchable() {
        let params = vec![GenericParam::new("TRequest"), GenericParam::new("TResponse").implements::<dyn Named>()];
        assert_eq!(
            unmatchable_argument(&params, &[TypeArg::param(0), TypeArg::param(1)]).as_deref(),
            Some("TResponse")
        );

        let inner = vec![GenericParam::new("TValue").implements::<dyn Named>()];
        let family = [TypeArg::generic(TypeKey::definition_of::<Wrapped<()>>(), [TypeArg::param(0)])];
        assert_eq!(unmatchable_argument(&inner, &family).as_deref(), Some("TValue"));
    }

    #[test]
    fn parameters_matching_the_message_share_its_shape() {
        let params = vec![
            GenericParam::new("TRequest"),
            GenericParam::new("TAlias").matches(TypeArg::param(0)).implements::<dyn Named>(),
        ];
        assert_eq!(unmatchable_argument(&params, &[TypeArg::param(0), TypeArg::of::<String>()]), None);
    }
}
