use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use super::{
    IntersectionCallback, IntersectionConfig, LazyInit, Platform, ViewportObserver, WakeCallback,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Pending,
    Active,
}

type ObserverSlot<C> = Rc<RefCell<Option<Box<dyn ViewportObserver<C>>>>>;

/// One-way gate that holds instantiation back until the container is visible.
///
/// The first intersecting signal opens the gate, disconnects the observer and
/// runs the wake hook. The owning binding instantiates on its next pass.
pub struct LazyGate<C> {
    state: Rc<Cell<GateState>>,
    observer: ObserverSlot<C>,
    wake: Rc<RefCell<Option<WakeCallback>>>,
    observed: Option<(C, IntersectionConfig)>,
}

impl<C: Clone + PartialEq + 'static> LazyGate<C> {
    #[must_use]
    pub fn new(lazy: &LazyInit) -> Self {
        let initial = if lazy.is_enabled() {
            GateState::Pending
        } else {
            GateState::Active
        };
        Self {
            state: Rc::new(Cell::new(initial)),
            observer: Rc::new(RefCell::new(None)),
            wake: Rc::new(RefCell::new(None)),
            observed: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> GateState {
        self.state.get()
    }

    #[must_use]
    pub fn should_instantiate(&self) -> bool {
        self.state.get() == GateState::Active
    }

    /// Replaces the hook run when the gate opens. Takes effect for an
    /// observer that is already waiting.
    pub fn set_wake(&mut self, wake: Option<WakeCallback>) {
        *self.wake.borrow_mut() = wake;
    }

    #[must_use]
    pub fn is_observing(&self) -> bool {
        self.observer.borrow().is_some()
    }

    /// Re-evaluates the gate against the current container and setting.
    ///
    /// Returns whether instantiation may proceed.
    pub fn sync(
        &mut self,
        platform: &dyn Platform<C>,
        container: Option<&C>,
        lazy: &LazyInit,
    ) -> bool {
        if self.should_instantiate() {
            self.disconnect();
            return true;
        }

        let config = match lazy {
            LazyInit::Disabled => {
                self.activate();
                return true;
            }
            LazyInit::Enabled(config) => config,
        };

        let Some(container) = container else {
            self.disconnect();
            return false;
        };

        let unchanged = self
            .observed
            .as_ref()
            .is_some_and(|(observed, observed_config)| {
                observed == container && observed_config == config
            });
        if unchanged && self.is_observing() {
            return false;
        }

        self.disconnect();
        match platform.viewport_observer() {
            Ok(mut observer) => {
                observer.observe(container, config, self.intersection_callback());
                if self.should_instantiate() {
                    // Signal delivered during `observe`.
                    observer.disconnect();
                    return true;
                }
                debug!(root_margin = %config.root_margin, threshold = config.threshold, "waiting for viewport intersection");
                *self.observer.borrow_mut() = Some(observer);
                self.observed = Some((container.clone(), config.clone()));
                false
            }
            Err(err) => {
                warn!(error = %err, "lazy init unavailable, instantiating immediately");
                self.activate();
                true
            }
        }
    }

    pub fn disconnect(&mut self) {
        disconnect_slot(&self.observer);
        self.observed = None;
    }

    fn activate(&mut self) {
        self.state.set(GateState::Active);
        self.disconnect();
    }

    fn intersection_callback(&self) -> IntersectionCallback {
        let state = Rc::clone(&self.state);
        let slot: Weak<RefCell<_>> = Rc::downgrade(&self.observer);
        let wake = Rc::downgrade(&self.wake);
        Rc::new(move |is_intersecting| {
            if !is_intersecting || state.get() == GateState::Active {
                return;
            }
            state.set(GateState::Active);
            if let Some(slot) = slot.upgrade() {
                disconnect_slot(&slot);
            }
            debug!("container visible, lazy gate opened");
            let hook = wake.upgrade().and_then(|wake| wake.borrow().clone());
            if let Some(hook) = hook {
                hook();
            }
        })
    }
}

fn disconnect_slot<C>(slot: &ObserverSlot<C>) {
    let taken = slot.borrow_mut().take();
    if let Some(mut observer) = taken {
        observer.disconnect();
    }
}

impl<C> Drop for LazyGate<C> {
    fn drop(&mut self) {
        disconnect_slot(&self.observer);
    }
}
