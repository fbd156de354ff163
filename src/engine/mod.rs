//! Contracts consumed from the charting engine.
//!
//! The binding layer never draws anything itself. It drives an engine through
//! `ChartEngine` (process-wide calls) and `ChartInstance` (per-container calls)
//! so hosts can plug in any backend, and tests can plug in `RecordingEngine`.

mod events;
mod options;
mod recording;

use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::BindingResult;

pub use events::{
    EventBinding, EventHandler, EventParams, EventQuery, EventTable, HandlerContext,
};
pub use options::{InitOptions, LoadingOptions, RendererKind, SetOptionOpts};
pub use recording::{EngineCall, RecordingEngine, RecordingInstance};

pub(crate) use events::{bind_events, unbind_events};

/// Declarative chart option payload handed to `set_option`.
pub type ChartOption = serde_json::Value;

/// Engine instance shared between the cache, the group registry and bindings.
pub type SharedInstance<I> = Rc<RefCell<I>>;

/// Opaque, identity-comparable container handle.
///
/// Hosts that already own a hashable element handle can use it directly as
/// `ChartEngine::Container`; this newtype covers hosts that key elements by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContainerId(pub u64);

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "container#{}", self.0)
    }
}

/// Process-wide engine entry points.
pub trait ChartEngine {
    type Container: Clone + Eq + Hash + fmt::Debug + 'static;
    type Instance: ChartInstance + 'static;

    /// Creates an instance rendering into `container`.
    fn init(
        &self,
        container: &Self::Container,
        theme: Option<&str>,
        renderer: RendererKind,
        options: &InitOptions,
    ) -> BindingResult<Self::Instance>;

    fn register_theme(&self, name: &str, theme: &serde_json::Value);

    /// Links every instance tagged with `group`.
    fn connect(&self, group: &str);

    fn disconnect(&self, group: &str);
}

/// Per-container engine instance.
pub trait ChartInstance {
    fn set_option(&mut self, option: &ChartOption, opts: &SetOptionOpts) -> BindingResult<()>;

    fn show_loading(&mut self, options: Option<&LoadingOptions>);

    fn hide_loading(&mut self);

    /// Registers `handler` for `event`. `query` narrows the event source and
    /// `context` is forwarded to the handler's receiver when present.
    fn on(
        &mut self,
        event: &str,
        query: Option<&EventQuery>,
        handler: &EventHandler,
        context: Option<&HandlerContext>,
    );

    fn off(&mut self, event: &str, handler: &EventHandler);

    fn resize(&mut self);

    /// Tags the instance with the group it is linked through.
    fn set_group(&mut self, group: Option<&str>);

    fn dispose(&mut self);
}
