use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{BindingError, BindingResult};

use super::{
    IntersectionCallback, IntersectionConfig, Platform, ResizeCallback, ResizeObserver,
    ViewportObserver,
};

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ObserverStats {
    pub created: usize,
    pub observe_calls: usize,
    pub disconnect_calls: usize,
}

struct Subscription<C, F> {
    observer: u64,
    container: C,
    callback: F,
}

struct ManualState<C> {
    next_observer: Cell<u64>,
    viewport_available: Cell<bool>,
    resize_available: Cell<bool>,
    viewport_stats: Cell<ObserverStats>,
    resize_stats: Cell<ObserverStats>,
    last_intersection_config: RefCell<Option<IntersectionConfig>>,
    viewport: RefCell<Vec<Subscription<C, IntersectionCallback>>>,
    resize: RefCell<Vec<Subscription<C, ResizeCallback>>>,
}

impl<C> ManualState<C> {
    fn next_id(&self) -> u64 {
        let id = self.next_observer.get() + 1;
        self.next_observer.set(id);
        id
    }
}

fn bump(stats: &Cell<ObserverStats>, update: impl FnOnce(&mut ObserverStats)) {
    let mut value = stats.get();
    update(&mut value);
    stats.set(value);
}

/// Platform whose observers fire only when a test or host tells them to.
///
/// Clones share state, so one handle can drive signals while the runtime
/// owns another.
pub struct ManualPlatform<C> {
    state: Rc<ManualState<C>>,
}

impl<C> Clone for ManualPlatform<C> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<C> Default for ManualPlatform<C> {
    fn default() -> Self {
        Self {
            state: Rc::new(ManualState {
                next_observer: Cell::new(0),
                viewport_available: Cell::new(true),
                resize_available: Cell::new(true),
                viewport_stats: Cell::new(ObserverStats::default()),
                resize_stats: Cell::new(ObserverStats::default()),
                last_intersection_config: RefCell::new(None),
                viewport: RefCell::new(Vec::new()),
                resize: RefCell::new(Vec::new()),
            }),
        }
    }
}

impl<C: Clone + PartialEq + 'static> ManualPlatform<C> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_viewport_available(&self, available: bool) {
        self.state.viewport_available.set(available);
    }

    pub fn set_resize_available(&self, available: bool) {
        self.state.resize_available.set(available);
    }

    #[must_use]
    pub fn viewport_stats(&self) -> ObserverStats {
        self.state.viewport_stats.get()
    }

    #[must_use]
    pub fn resize_stats(&self) -> ObserverStats {
        self.state.resize_stats.get()
    }

    #[must_use]
    pub fn last_intersection_config(&self) -> Option<IntersectionConfig> {
        self.state.last_intersection_config.borrow().clone()
    }

    /// Live viewport subscriptions.
    #[must_use]
    pub fn viewport_subscriptions(&self) -> usize {
        self.state.viewport.borrow().len()
    }

    #[must_use]
    pub fn resize_subscriptions(&self) -> usize {
        self.state.resize.borrow().len()
    }

    /// Delivers an intersection signal to every subscription on `container`.
    pub fn fire_intersection(&self, container: &C, is_intersecting: bool) {
        let callbacks: Vec<IntersectionCallback> = self
            .state
            .viewport
            .borrow()
            .iter()
            .filter(|sub| &sub.container == container)
            .map(|sub| Rc::clone(&sub.callback))
            .collect();
        for callback in callbacks {
            callback(is_intersecting);
        }
    }

    /// Delivers a size-change notification to every subscription on `container`.
    pub fn fire_resize(&self, container: &C) {
        let callbacks: Vec<ResizeCallback> = self
            .state
            .resize
            .borrow()
            .iter()
            .filter(|sub| &sub.container == container)
            .map(|sub| Rc::clone(&sub.callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }
}

impl<C: Clone + PartialEq + 'static> Platform<C> for ManualPlatform<C> {
    fn viewport_observer(&self) -> BindingResult<Box<dyn ViewportObserver<C>>> {
        if !self.state.viewport_available.get() {
            return Err(BindingError::PlatformUnavailable(
                "viewport intersection observer".to_owned(),
            ));
        }
        bump(&self.state.viewport_stats, |stats| stats.created += 1);
        Ok(Box::new(ManualViewportObserver {
            id: self.state.next_id(),
            state: Rc::clone(&self.state),
        }))
    }

    fn resize_observer(&self) -> BindingResult<Box<dyn ResizeObserver<C>>> {
        if !self.state.resize_available.get() {
            return Err(BindingError::PlatformUnavailable(
                "resize observer".to_owned(),
            ));
        }
        bump(&self.state.resize_stats, |stats| stats.created += 1);
        Ok(Box::new(ManualResizeObserver {
            id: self.state.next_id(),
            state: Rc::clone(&self.state),
        }))
    }
}

struct ManualViewportObserver<C> {
    id: u64,
    state: Rc<ManualState<C>>,
}

impl<C: Clone> ViewportObserver<C> for ManualViewportObserver<C> {
    fn observe(&mut self, container: &C, config: &IntersectionConfig, callback: IntersectionCallback) {
        bump(&self.state.viewport_stats, |stats| stats.observe_calls += 1);
        *self.state.last_intersection_config.borrow_mut() = Some(config.clone());
        self.state.viewport.borrow_mut().push(Subscription {
            observer: self.id,
            container: container.clone(),
            callback,
        });
    }

    fn disconnect(&mut self) {
        bump(&self.state.viewport_stats, |stats| stats.disconnect_calls += 1);
        let id = self.id;
        self.state.viewport.borrow_mut().retain(|sub| sub.observer != id);
    }
}

struct ManualResizeObserver<C> {
    id: u64,
    state: Rc<ManualState<C>>,
}

impl<C: Clone> ResizeObserver<C> for ManualResizeObserver<C> {
    fn observe(&mut self, container: &C, callback: ResizeCallback) {
        bump(&self.state.resize_stats, |stats| stats.observe_calls += 1);
        self.state.resize.borrow_mut().push(Subscription {
            observer: self.id,
            container: container.clone(),
            callback,
        });
    }

    fn disconnect(&mut self) {
        bump(&self.state.resize_stats, |stats| stats.disconnect_calls += 1);
        let id = self.id;
        self.state.resize.borrow_mut().retain(|sub| sub.observer != id);
    }
}
