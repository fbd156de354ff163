use std::any::Any;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use super::ChartInstance;

/// Payload the engine hands to event handlers.
pub type EventParams = serde_json::Value;

/// Event source filter, either a string selector or a key/value object.
pub type EventQuery = serde_json::Value;

/// Reference-counted event callback.
///
/// Identity (not behavior) is what `off` matches on, so clones of one handler
/// unbind each other while two separately built closures never do.
#[derive(Clone)]
pub struct EventHandler(Rc<dyn Fn(&EventParams)>);

impl EventHandler {
    pub fn new(handler: impl Fn(&EventParams) + 'static) -> Self {
        Self(Rc::new(handler))
    }

    pub fn call(&self, params: &EventParams) {
        (self.0)(params);
    }

    #[must_use]
    pub fn ptr_eq(&self, other: &EventHandler) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventHandler({:p})", Rc::as_ptr(&self.0))
    }
}

/// Opaque receiver forwarded alongside a handler.
#[derive(Clone)]
pub struct HandlerContext(Rc<dyn Any>);

impl HandlerContext {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl fmt::Debug for HandlerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HandlerContext(..)")
    }
}

/// One entry of an event table.
#[derive(Debug, Clone)]
pub struct EventBinding {
    pub handler: EventHandler,
    pub query: Option<EventQuery>,
    pub context: Option<HandlerContext>,
}

impl EventBinding {
    #[must_use]
    pub fn new(handler: EventHandler) -> Self {
        Self {
            handler,
            query: None,
            context: None,
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: EventQuery) -> Self {
        self.query = Some(query);
        self
    }

    #[must_use]
    pub fn with_context(mut self, context: HandlerContext) -> Self {
        self.context = Some(context);
        self
    }
}

impl From<EventHandler> for EventBinding {
    fn from(handler: EventHandler) -> Self {
        Self::new(handler)
    }
}

/// Event name to binding map, iterated in insertion order.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    bindings: IndexMap<String, EventBinding>,
}

impl EventTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, event: impl Into<String>, binding: impl Into<EventBinding>) -> Self {
        self.insert(event, binding);
        self
    }

    /// Inserts a binding, returning the one it replaced.
    pub fn insert(
        &mut self,
        event: impl Into<String>,
        binding: impl Into<EventBinding>,
    ) -> Option<EventBinding> {
        self.bindings.insert(event.into(), binding.into())
    }

    #[must_use]
    pub fn get(&self, event: &str) -> Option<&EventBinding> {
        self.bindings.get(event)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EventBinding)> {
        self.bindings
            .iter()
            .map(|(event, binding)| (event.as_str(), binding))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

pub(crate) fn bind_events<I: ChartInstance>(instance: &mut I, table: &EventTable) {
    for (event, binding) in table.iter() {
        trace!(
            event,
            has_query = binding.query.is_some(),
            has_context = binding.context.is_some(),
            "bind event handler"
        );
        instance.on(
            event,
            binding.query.as_ref(),
            &binding.handler,
            binding.context.as_ref(),
        );
    }
}

pub(crate) fn unbind_events<I: ChartInstance>(instance: &mut I, table: &EventTable) {
    for (event, binding) in table.iter() {
        trace!(event, "unbind event handler");
        instance.off(event, &binding.handler);
    }
}
