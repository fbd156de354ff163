//! Host platform primitives: viewport intersection and resize notification.
//!
//! Both primitives are optional. `Platform` implementations report a missing
//! primitive with `BindingError::PlatformUnavailable` and the binding degrades
//! instead of failing.

mod lazy_gate;
mod manual;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{BindingError, BindingResult};

pub use lazy_gate::{GateState, LazyGate};
pub use manual::{ManualPlatform, ObserverStats};

/// Receives `true` when the observed container intersects the viewport.
pub type IntersectionCallback = Rc<dyn Fn(bool)>;

pub type ResizeCallback = Rc<dyn Fn()>;

/// Host hook run once when a lazy gate opens, so the host schedules a pass.
pub type WakeCallback = Rc<dyn Fn()>;

pub trait ViewportObserver<C> {
    fn observe(&mut self, container: &C, config: &IntersectionConfig, callback: IntersectionCallback);

    fn disconnect(&mut self);
}

pub trait ResizeObserver<C> {
    fn observe(&mut self, container: &C, callback: ResizeCallback);

    fn disconnect(&mut self);
}

pub trait Platform<C> {
    fn viewport_observer(&self) -> BindingResult<Box<dyn ViewportObserver<C>>>;

    fn resize_observer(&self) -> BindingResult<Box<dyn ResizeObserver<C>>>;
}

/// Platform without any observation primitive.
///
/// Lazy bindings activate immediately and auto-resize is skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessPlatform;

impl<C> Platform<C> for HeadlessPlatform {
    fn viewport_observer(&self) -> BindingResult<Box<dyn ViewportObserver<C>>> {
        Err(BindingError::PlatformUnavailable(
            "viewport intersection observer".to_owned(),
        ))
    }

    fn resize_observer(&self) -> BindingResult<Box<dyn ResizeObserver<C>>> {
        Err(BindingError::PlatformUnavailable(
            "resize observer".to_owned(),
        ))
    }
}

/// Intersection condition a lazy binding waits for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntersectionConfig {
    #[serde(default = "default_root_margin")]
    pub root_margin: String,
    #[serde(default)]
    pub threshold: f64,
    #[serde(default)]
    pub root: Option<String>,
}

impl Default for IntersectionConfig {
    fn default() -> Self {
        Self {
            root_margin: default_root_margin(),
            threshold: 0.0,
            root: None,
        }
    }
}

fn default_root_margin() -> String {
    "50px".to_owned()
}

/// Lazy activation setting.
///
/// Serialized as `false` (disabled), `true` (default condition) or an
/// `IntersectionConfig` object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "LazyInitRepr", into = "LazyInitRepr")]
pub enum LazyInit {
    #[default]
    Disabled,
    Enabled(IntersectionConfig),
}

impl LazyInit {
    #[must_use]
    pub fn enabled() -> Self {
        Self::Enabled(IntersectionConfig::default())
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum LazyInitRepr {
    Flag(bool),
    Config(IntersectionConfig),
}

impl From<LazyInitRepr> for LazyInit {
    fn from(repr: LazyInitRepr) -> Self {
        match repr {
            LazyInitRepr::Flag(false) => Self::Disabled,
            LazyInitRepr::Flag(true) => Self::enabled(),
            LazyInitRepr::Config(config) => Self::Enabled(config),
        }
    }
}

impl From<LazyInit> for LazyInitRepr {
    fn from(lazy: LazyInit) -> Self {
        match lazy {
            LazyInit::Disabled => Self::Flag(false),
            LazyInit::Enabled(config) => Self::Config(config),
        }
    }
}
