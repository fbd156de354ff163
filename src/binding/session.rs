use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::engine::{
    ChartOption, EventTable, InitOptions, LoadingOptions, RendererKind, SetOptionOpts, SharedInstance,
};
use crate::platform::ResizeObserver;
use crate::theme::ThemeKey;

/// `(option, opts)` pair last pushed through `set_option` by the phases.
#[derive(Debug, Clone)]
pub(crate) struct AppliedOption {
    pub option: Rc<ChartOption>,
    pub opts: Rc<SetOptionOpts>,
}

impl AppliedOption {
    pub fn matches(&self, option: &Rc<ChartOption>, opts: &Rc<SetOptionOpts>) -> bool {
        Rc::ptr_eq(&self.option, option) && Rc::ptr_eq(&self.opts, opts)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct LoadingState {
    pub show: bool,
    pub options: Option<LoadingOptions>,
}

/// State of one container-binding lifetime.
///
/// The instance itself is only referenced weakly: the cache owns it, and
/// another binding on the same container may swap it. `applied`, `loading`
/// and `bound_events` describe what was pushed to `instance`.
#[derive(Debug)]
pub(crate) struct BindingSession<C, I> {
    pub container: C,
    pub instance: Weak<RefCell<I>>,
    pub theme_key: ThemeKey,
    pub renderer: RendererKind,
    pub init_opts: InitOptions,
    pub applied: Option<AppliedOption>,
    pub loading: Option<LoadingState>,
    pub bound_events: Option<Rc<EventTable>>,
    pub resize_unavailable: bool,
}

impl<C, I> BindingSession<C, I> {
    pub fn new(
        container: C,
        instance: &SharedInstance<I>,
        theme_key: ThemeKey,
        renderer: RendererKind,
        init_opts: InitOptions,
    ) -> Self {
        Self {
            container,
            instance: Rc::downgrade(instance),
            theme_key,
            renderer,
            init_opts,
            applied: None,
            loading: None,
            bound_events: None,
            resize_unavailable: false,
        }
    }

    /// Whether the live instance was created for a different identity.
    pub fn needs_recreate(&self, theme_key: &ThemeKey, renderer: RendererKind, init_opts: &InitOptions) -> bool {
        &self.theme_key != theme_key || self.renderer != renderer || &self.init_opts != init_opts
    }

    pub fn is_bound_to(&self, instance: &SharedInstance<I>) -> bool {
        Weak::ptr_eq(&self.instance, &Rc::downgrade(instance))
    }

    /// Points the session at `instance` and forgets everything applied to
    /// the previous one.
    pub fn adopt(&mut self, instance: &SharedInstance<I>) {
        self.instance = Rc::downgrade(instance);
        self.applied = None;
        self.loading = None;
        self.bound_events = None;
    }
}

pub(crate) struct ResizeSubscription<C> {
    pub container: C,
    pub observer: Box<dyn ResizeObserver<C>>,
}

impl<C> ResizeSubscription<C> {
    pub fn disconnect(mut self) {
        self.observer.disconnect();
    }
}
