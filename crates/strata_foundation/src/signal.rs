//! Multi-subscriber event dispatch.
//!
//! A [`Signal`] owns its handlers. Each subscription carries an identity key
//! made of the handler's concrete type and, for instance-bound handlers, the
//! address of the bound instance. Connecting the same identity twice is a
//! no-op, and disconnecting uses the same key.
//!
//! Every function item and every closure expression has its own type, so a
//! free function is identified by the function itself. Two values of one
//! closure expression share an identity.
//!
//! Bound handlers hold only a [`Weak`] to their instance. Once the instance is
//! dropped the handler is never invoked again and is pruned on the next emit.

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Identity of one subscription.
#[derive(Clone)]
struct HandlerKey {
    handler: TypeId,
    instance: Option<Weak<dyn Any>>,
}

impl HandlerKey {
    fn free<F: 'static>() -> Self {
        Self {
            handler: TypeId::of::<F>(),
            instance: None,
        }
    }

    fn bound<F: 'static, I: 'static>(instance: &Rc<RefCell<I>>) -> Self {
        let weak: Weak<RefCell<I>> = Rc::downgrade(instance);
        let weak: Weak<dyn Any> = weak;
        Self {
            handler: TypeId::of::<F>(),
            instance: Some(weak),
        }
    }

    fn expired(&self) -> bool {
        self.instance
            .as_ref()
            .is_some_and(|weak| weak.strong_count() == 0)
    }

    fn matches(&self, other: &HandlerKey) -> bool {
        if self.handler != other.handler || self.expired() || other.expired() {
            return false;
        }
        match (&self.instance, &other.instance) {
            (None, None) => true,
            (Some(a), Some(b)) => std::ptr::addr_eq(a.as_ptr(), b.as_ptr()),
            _ => false,
        }
    }
}

enum Delivery {
    Delivered,
    Busy,
    Expired,
}

struct Subscription<A> {
    key: HandlerKey,
    name: &'static str,
    callback: Box<dyn FnMut(A) -> Delivery>,
}

/// An ordered list of handlers invoked synchronously by [`emit`](Signal::emit).
pub struct Signal<A> {
    handlers: Vec<Subscription<A>>,
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.handlers.iter().map(|s| s.name))
            .finish()
    }
}

impl<A: Clone + 'static> Signal<A> {
    /// Creates a signal with no handlers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a free handler.
    ///
    /// Returns `false` if a handler with the same identity is already connected.
    pub fn connect<F>(&mut self, mut handler: F) -> bool
    where
        F: FnMut(A) + 'static,
    {
        self.add(
            HandlerKey::free::<F>(),
            type_name::<F>(),
            Box::new(move |args| {
                handler(args);
                Delivery::Delivered
            }),
        )
    }

    /// Registers a handler bound to `instance`.
    ///
    /// The handler receives a mutable borrow of the instance on every emit.
    /// Returns `false` if the same handler is already connected for this instance.
    pub fn connect_bound<I, F>(&mut self, instance: &Rc<RefCell<I>>, mut handler: F) -> bool
    where
        I: 'static,
        F: FnMut(&mut I, A) + 'static,
    {
        let weak = Rc::downgrade(instance);
        self.add(
            HandlerKey::bound::<F, I>(instance),
            type_name::<F>(),
            Box::new(move |args| {
                let Some(strong) = weak.upgrade() else {
                    return Delivery::Expired;
                };
                let Ok(mut target) = strong.try_borrow_mut() else {
                    return Delivery::Busy;
                };
                handler(&mut target, args);
                Delivery::Delivered
            }),
        )
    }

    /// Removes a free handler by identity.
    ///
    /// Returns `false` if no such handler was connected.
    pub fn disconnect<F>(&mut self, _handler: &F) -> bool
    where
        F: FnMut(A) + 'static,
    {
        self.remove(&HandlerKey::free::<F>())
    }

    /// Removes a bound handler by identity.
    ///
    /// Returns `false` if no such handler was connected for this instance.
    pub fn disconnect_bound<I, F>(&mut self, instance: &Rc<RefCell<I>>, _handler: &F) -> bool
    where
        I: 'static,
        F: FnMut(&mut I, A) + 'static,
    {
        self.remove(&HandlerKey::bound::<F, I>(instance))
    }

    /// Invokes every connected handler in registration order.
    pub fn emit(&mut self, args: A) {
        let mut expired = false;
        for subscription in &mut self.handlers {
            match (subscription.callback)(args.clone()) {
                Delivery::Delivered => {}
                Delivery::Busy => {
                    tracing::warn!(
                        handler = subscription.name,
                        "bound signal handler skipped: instance already borrowed"
                    );
                }
                Delivery::Expired => expired = true,
            }
        }
        if expired {
            self.prune();
        }
    }

    /// Number of connected handlers, including bound ones whose instance is gone
    /// but which have not been pruned yet.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Returns true if no handlers are connected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Removes every handler.
    pub fn clear(&mut self) {
        self.handlers.clear();
    }

    fn add(
        &mut self,
        key: HandlerKey,
        name: &'static str,
        callback: Box<dyn FnMut(A) -> Delivery>,
    ) -> bool {
        self.prune();
        if self.handlers.iter().any(|s| s.key.matches(&key)) {
            return false;
        }
        self.handlers.push(Subscription {
            key,
            name,
            callback,
        });
        true
    }

    fn remove(&mut self, key: &HandlerKey) -> bool {
        self.prune();
        match self.handlers.iter().position(|s| s.key.matches(key)) {
            Some(index) => {
                self.handlers.remove(index);
                true
            }
            None => false,
        }
    }

    fn prune(&mut self) {
        self.handlers.retain(|s| !s.key.expired());
    }
}
