//! Registration store: bindings and their construction layers.

use std::any::{type_name, Any};
use std::sync::Arc;

use crate::container::ResolverContext;
use crate::descriptors::{BindingDescriptor, LayerKind};
use crate::error::DiResult;
use crate::internal::Disposer;
use crate::key::{key_of, Key};
use crate::lifetime::Lifetime;
use crate::traits::{downcast, erase, Decorator, Dependencies, DependencyList, Implements, Injectable};

// Type-erased Arc for storage; always wraps an `Arc<C>` for the contract C.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

#[cfg(feature = "ahash")]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;

/// Output of one construction layer.
pub(crate) struct Built {
    pub(crate) instance: AnyArc,
    pub(crate) release: Option<Disposer>,
}

pub(crate) type ConstructFn = Arc<dyn for<'a> Fn(&ResolverContext<'a>) -> DiResult<Built> + Send + Sync>;
pub(crate) type WrapFn = Arc<dyn for<'a> Fn(AnyArc, &ResolverContext<'a>) -> DiResult<Built> + Send + Sync>;

/// Static description of one layer.
#[derive(Debug, Clone)]
pub(crate) struct Layer {
    pub(crate) name: &'static str,
    pub(crate) kind: LayerKind,
    pub(crate) dependencies: DependencyList,
}

pub(crate) struct DecoratorLayer {
    pub(crate) layer: Layer,
    pub(crate) wrap: WrapFn,
}

/// One active binding: base layer plus decorator chain, innermost first.
pub(crate) struct Binding {
    pub(crate) contract: Key,
    pub(crate) lifetime: Lifetime,
    pub(crate) base: Layer,
    pub(crate) construct: ConstructFn,
    pub(crate) decorators: Vec<DecoratorLayer>,
}

impl Binding {
    pub(crate) fn implementation<C, I>(lifetime: Lifetime) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        I: Injectable + Implements<C>,
    {
        let construct = |ctx: &ResolverContext<'_>| -> DiResult<Built> {
            let deps = I::Deps::resolve(ctx)?;
            let instance = Arc::new(I::inject(deps));
            let hook = Arc::clone(&instance);
            Ok(Built {
                instance: erase::<C>(<I as Implements<C>>::upcast(instance)),
                release: Some(Box::new(move || <I as Injectable>::dispose(&hook))),
            })
        };

        Self {
            contract: key_of::<C>(),
            lifetime,
            base: Layer {
                name: type_name::<I>(),
                kind: LayerKind::Implementation,
                dependencies: I::Deps::declared(),
            },
            construct: Arc::new(construct),
            decorators: Vec::new(),
        }
    }

    pub(crate) fn factory<C, D, F>(factory: F, lifetime: Lifetime) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
        D: Dependencies,
        F: Fn(D) -> Arc<C> + Send + Sync + 'static,
    {
        let construct = move |ctx: &ResolverContext<'_>| -> DiResult<Built> {
            let deps = D::resolve(ctx)?;
            Ok(Built {
                instance: erase::<C>(factory(deps)),
                release: None,
            })
        };

        Self {
            contract: key_of::<C>(),
            lifetime,
            base: Layer {
                name: type_name::<C>(),
                kind: LayerKind::Factory,
                dependencies: D::declared(),
            },
            construct: Arc::new(construct),
            decorators: Vec::new(),
        }
    }

    pub(crate) fn instance<C>(value: Arc<C>) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let construct = move |_: &ResolverContext<'_>| -> DiResult<Built> {
            Ok(Built {
                instance: erase::<C>(Arc::clone(&value)),
                release: None,
            })
        };

        Self {
            contract: key_of::<C>(),
            lifetime: Lifetime::Singleton,
            base: Layer {
                name: type_name::<C>(),
                kind: LayerKind::Instance,
                dependencies: DependencyList::new(),
            },
            construct: Arc::new(construct),
            decorators: Vec::new(),
        }
    }

    /// Appends a [`Decorator`] type as the new outermost layer.
    pub(crate) fn push_decorator<C, D>(&mut self)
    where
        C: ?Sized + Send + Sync + 'static,
        D: Decorator<C>,
    {
        let contract = self.contract;
        let wrap = move |inner: AnyArc, ctx: &ResolverContext<'_>| -> DiResult<Built> {
            let inner = downcast::<C>(&inner, &contract)?;
            let deps = D::Deps::resolve(ctx)?;
            let decorator = Arc::new(D::decorate(inner, deps));
            let hook = Arc::clone(&decorator);
            Ok(Built {
                instance: erase::<C>(<D as Implements<C>>::upcast(decorator)),
                release: Some(Box::new(move || <D as Decorator<C>>::dispose(&hook))),
            })
        };

        self.decorators.push(DecoratorLayer {
            layer: Layer {
                name: type_name::<D>(),
                kind: LayerKind::Decorator,
                dependencies: D::Deps::declared(),
            },
            wrap: Arc::new(wrap),
        });
    }

    /// Appends a closure decorator as the new outermost layer.
    pub(crate) fn push_decorator_fn<C, D, F>(&mut self, decorate: F)
    where
        C: ?Sized + Send + Sync + 'static,
        D: Dependencies,
        F: Fn(Arc<C>, D) -> Arc<C> + Send + Sync + 'static,
    {
        let contract = self.contract;
        let wrap = move |inner: AnyArc, ctx: &ResolverContext<'_>| -> DiResult<Built> {
            let inner = downcast::<C>(&inner, &contract)?;
            let deps = D::resolve(ctx)?;
            Ok(Built {
                instance: erase::<C>(decorate(inner, deps)),
                release: None,
            })
        };

        self.decorators.push(DecoratorLayer {
            layer: Layer {
                name: contract.display_name(),
                kind: LayerKind::Decorator,
                dependencies: D::declared(),
            },
            wrap: Arc::new(wrap),
        });
    }

    /// Base layer first, then decorators innermost to outermost.
    pub(crate) fn layers(&self) -> impl Iterator<Item = &Layer> {
        std::iter::once(&self.base).chain(self.decorators.iter().map(|d| &d.layer))
    }

    pub(crate) fn descriptor(&self) -> BindingDescriptor {
        BindingDescriptor {
            contract: self.contract,
            lifetime: self.lifetime,
            implementation: self.base.name,
            kind: self.base.kind,
            dependencies: self.base.dependencies.to_vec(),
            decorators: self.decorators.iter().map(|d| d.layer.name).collect(),
        }
    }
}

/// Registry holding one binding per contract, in registration order.
#[derive(Default)]
pub(crate) struct Registry {
    bindings: Vec<Binding>,
    index: Map<Key, usize>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Stores a binding. A re-registered contract keeps its original
    /// position; the previous binding is returned.
    pub(crate) fn insert(&mut self, binding: Binding) -> Option<Binding> {
        match self.index.get(&binding.contract) {
            Some(&pos) => Some(std::mem::replace(&mut self.bindings[pos], binding)),
            None => {
                self.index.insert(binding.contract, self.bindings.len());
                self.bindings.push(binding);
                None
            }
        }
    }

    #[inline]
    pub(crate) fn get(&self, key: &Key) -> Option<&Binding> {
        self.index.get(key).map(|&pos| &self.bindings[pos])
    }

    pub(crate) fn get_mut(&mut self, key: &Key) -> Option<&mut Binding> {
        match self.index.get(key) {
            Some(&pos) => Some(&mut self.bindings[pos]),
            None => None,
        }
    }

    #[inline]
    pub(crate) fn contains(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    /// Bindings in registration order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    pub(crate) fn len(&self) -> usize {
        self.bindings.len()
    }
}
