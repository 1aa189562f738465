//! # Module scanning
//!
//! Types make themselves visible to scans with [`declare!`](crate::declare),
//! which submits their [`Component`](liaison_core::Component) descriptor to
//! a link-time collected registry. A [`Module`] selects the declarations
//! whose type lives under one module path.

use liaison_core::{TypeInfo, module_of};
use std::{any::type_name, borrow::Cow};

/// A type made visible to module scans.
///
/// Created by [`declare!`](crate::declare); there is no need to build one by hand.
#[derive(Debug, Clone, Copy)]
pub struct Declaration {
    type_info: fn() -> TypeInfo,
}

impl Declaration {
    /// Declare the type described by `type_info`.
    pub const fn new(type_info: fn() -> TypeInfo) -> Self {
        Self { type_info }
    }

    /// The descriptor of the declared type.
    pub fn type_info(&self) -> TypeInfo {
        (self.type_info)()
    }
}

inventory::collect!(Declaration);

/// A module path whose declared types can be scanned.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Module {
    path: Cow<'static, str>,
}

impl Module {
    /// The module at `path`, e.g. `my_app::handlers`.
    pub fn new(path: impl Into<Cow<'static, str>>) -> Self {
        Self { path: path.into() }
    }

    /// The module `T` is declared in.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(module_of(type_name::<T>()))
    }

    /// The crate `T` is declared in.
    pub fn crate_of<T: ?Sized + 'static>() -> Self {
        let path = module_of(type_name::<T>());
        Self::new(path.split("::").next().unwrap_or(path))
    }

    /// The module path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the type lives in this module or one of its submodules.
    pub fn contains(&self, info: &TypeInfo) -> bool {
        let module = info.module();
        module
            .strip_prefix(self.path.as_ref())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    }

    /// Every declared type of the module, sorted by full type path.
    pub fn declared_types(&self) -> Vec<TypeInfo> {
        let mut types: Vec<(String, TypeInfo)> = inventory::iter::<Declaration>
            .into_iter()
            .map(Declaration::type_info)
            .filter(|info| self.contains(info))
            .map(|info| (format!("{}::{}", info.module(), info.name()), info))
            .collect();
        types.sort_by(|(a, _), (b, _)| a.cmp(b));
        types.into_iter().map(|(_, info)| info).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod nested {
        pub struct Inner;
    }

    struct Outer;

    #[test]
    fn modules_contain_their_submodules() {
        let outer = TypeInfo::builder::<Outer>().build();
        let inner = TypeInfo::builder::<nested::Inner>().build();
        let module = Module::of::<Outer>();

        assert!(module.contains(&outer));
        assert!(module.contains(&inner));
        assert!(!Module::of::<nested::Inner>().contains(&outer));
        assert!(!Module::new("liaison::mod").contains(&outer));
    }

    #[test]
    fn crates_are_the_first_path_segment() {
        assert_eq!(Module::crate_of::<Outer>().path(), "liaison");
        assert_eq!(Module::of::<String>().path(), "alloc::string");
    }
}
