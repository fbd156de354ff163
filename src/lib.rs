//! chart-binding: lifecycle and synchronization layer for charting engines.
//!
//! A `ChartBinding` ties one container to one engine instance. It creates the
//! instance once the container is available (and, for lazy bindings, visible),
//! keeps it in sync with changing props, and releases it through a
//! reference-counted cache so repeated mount/unmount cycles never leak or
//! double-dispose instances.

pub mod binding;
pub mod cache;
pub mod engine;
pub mod error;
pub mod group;
pub mod platform;
pub mod runtime;
pub mod telemetry;
pub mod theme;

pub use binding::{BindingConfig, BindingProps, ChartBinding};
pub use engine::{ChartEngine, ChartInstance};
pub use error::{BindingError, BindingResult};
pub use runtime::ChartRuntime;
