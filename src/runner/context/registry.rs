//! Thread-to-context association.
//!
//! A thread holds at most one context; entering again on the same thread reuses it and
//! bumps a counter, and the binding goes away when the counter returns to zero.

use std::collections::HashMap;
use std::thread::{self, ThreadId};

use parking_lot::Mutex;
use tracing::trace;

use crate::runner::context::Context;

lazy_static! {
    static ref GLOBAL_REGISTRY: ContextRegistry = ContextRegistry::new();
}

struct Binding {
    context: Context,
    enter_count: usize,
}

pub struct ContextRegistry {
    bindings: Mutex<HashMap<ThreadId, Binding>>,
}
impl ContextRegistry {
    pub fn new() -> Self {
        ContextRegistry {
            bindings: Mutex::new(HashMap::new()),
        }
    }

    /// The process-wide registry used by `Context::enter` and the free reporting functions.
    pub fn global() -> &'static ContextRegistry {
        &GLOBAL_REGISTRY
    }

    /// Bind a context to the calling thread, or reuse the one already bound.
    ///
    /// `hint` is adopted only when the thread has no context yet and the hint is not
    /// bound to another thread; otherwise a fresh context is created.
    pub fn acquire(&self, hint: Option<Context>) -> Context {
        let thread = thread::current().id();
        let mut bindings = self.bindings.lock();
        if let Some(binding) = bindings.get_mut(&thread) {
            binding.enter_count += 1;
            trace!(enter_count = binding.enter_count, "re-entered context");
            return binding.context.clone();
        }
        let context = match hint {
            Some(cx) if !bindings.values().any(|b| b.context.ptr_eq(&cx)) => cx,
            _ => Context::new(),
        };
        bindings.insert(
            thread,
            Binding {
                context: context.clone(),
                enter_count: 1,
            },
        );
        trace!(context = %context.id(), "bound context to thread");
        context
    }

    /// Undo one `acquire`. Releasing on a thread without a binding does nothing.
    pub fn release(&self) {
        let thread = thread::current().id();
        let mut bindings = self.bindings.lock();
        let remove = match bindings.get_mut(&thread) {
            Some(binding) => {
                binding.enter_count -= 1;
                binding.enter_count == 0
            }
            None => false,
        };
        if remove {
            if let Some(binding) = bindings.remove(&thread) {
                trace!(context = %binding.context.id(), "unbound context from thread");
            }
        }
    }

    pub fn current_context(&self) -> Option<Context> {
        let thread = thread::current().id();
        self.bindings.lock().get(&thread).map(|b| b.context.clone())
    }

    /// Outstanding enters on the calling thread; zero when unbound.
    pub fn enter_count(&self) -> usize {
        let thread = thread::current().id();
        self.bindings
            .lock()
            .get(&thread)
            .map(|b| b.enter_count)
            .unwrap_or(0)
    }

    /// Thread currently holding `cx`, if any.
    pub fn bound_thread(&self, cx: &Context) -> Option<ThreadId> {
        self.bindings
            .lock()
            .iter()
            .find(|(_, b)| b.context.ptr_eq(cx))
            .map(|(t, _)| *t)
    }

    /// Scoped enter; the matching release runs on drop.
    pub fn enter(&self, hint: Option<Context>) -> ContextScope<'_> {
        let context = self.acquire(hint);
        ContextScope {
            registry: self,
            context,
        }
    }
}
impl Default for ContextRegistry {
    fn default() -> Self {
        Self::new()
    }
}

pub struct ContextScope<'a> {
    registry: &'a ContextRegistry,
    context: Context,
}
impl<'a> ContextScope<'a> {
    pub fn context(&self) -> &Context {
        &self.context
    }
}
impl<'a> std::ops::Deref for ContextScope<'a> {
    type Target = Context;

    fn deref(&self) -> &Context {
        &self.context
    }
}
impl<'a> Drop for ContextScope<'a> {
    fn drop(&mut self) {
        self.registry.release();
    }
}
