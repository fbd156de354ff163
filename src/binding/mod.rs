//! Synchronization engine binding one container to one engine instance.
//!
//! A host drives a `ChartBinding` by calling `reconcile` with the current
//! container and props whenever either may have changed. Each pass diffs the
//! props against the live session and runs the phases in order:
//!
//! 1. instance lifecycle (create, or recreate on theme/renderer/init change)
//! 2. option updates
//! 3. loading overlay
//! 4. event rebinding
//! 5. group membership
//! 6. resize observation
//!
//! Phases 2–6 only act once phase 1 has produced an instance.

mod phases;
mod props;
mod session;

use std::collections::VecDeque;
use std::rc::Rc;

use tracing::{debug, error, trace};

use crate::engine::{ChartEngine, ChartInstance, ChartOption, SetOptionOpts, SharedInstance};
use crate::error::{BindingError, BindingResult};
use crate::platform::{GateState, LazyGate};
use crate::runtime::ChartRuntime;

pub use props::{BindingConfig, BindingProps, ErrorCallback};

use session::{AppliedOption, BindingSession, ResizeSubscription};

pub struct ChartBinding<E: ChartEngine> {
    runtime: ChartRuntime<E>,
    props: BindingProps,
    container: Option<E::Container>,
    gate: Option<LazyGate<E::Container>>,
    session: Option<BindingSession<E::Container, E::Instance>>,
    resize: Option<ResizeSubscription<E::Container>>,
    previous: Option<AppliedOption>,
    deferred: VecDeque<(Rc<ChartOption>, SetOptionOpts)>,
}

impl<E: ChartEngine> ChartBinding<E> {
    pub(crate) fn new(runtime: ChartRuntime<E>) -> Self {
        Self {
            runtime,
            props: BindingProps::default(),
            container: None,
            gate: None,
            session: None,
            resize: None,
            previous: None,
            deferred: VecDeque::new(),
        }
    }

    /// Runs one reconciliation pass against `container` and `props`.
    ///
    /// Returns an error only for option updates that fail while no error
    /// callback is configured. Instance creation and the initial option apply
    /// never fail the pass.
    pub fn reconcile(
        &mut self,
        container: Option<E::Container>,
        props: BindingProps,
    ) -> BindingResult<()> {
        self.container = container;
        self.props = props;
        self.run_pass()
    }

    /// Re-runs the last pass, e.g. after the lazy gate reported visibility.
    pub fn refresh(&mut self) -> BindingResult<()> {
        self.run_pass()
    }

    /// Ends the session and stops all observation.
    pub fn unmount(&mut self) {
        self.end_session();
        self.stop_resize();
        if let Some(gate) = self.gate.as_mut() {
            gate.disconnect();
        }
        self.container = None;
        self.deferred.clear();
    }

    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.get_instance().is_some()
    }

    #[must_use]
    pub fn gate_state(&self) -> Option<GateState> {
        self.gate.as_ref().map(LazyGate::state)
    }

    #[must_use]
    pub fn container(&self) -> Option<&E::Container> {
        self.container.as_ref()
    }

    #[must_use]
    pub fn props(&self) -> &BindingProps {
        &self.props
    }

    #[must_use]
    pub fn runtime(&self) -> &ChartRuntime<E> {
        &self.runtime
    }

    /// Instance currently cached for this binding's session.
    #[must_use]
    pub fn get_instance(&self) -> Option<SharedInstance<E::Instance>> {
        let session = self.session.as_ref()?;
        self.runtime.cache().borrow().peek(&session.container)
    }

    /// Applies `option` right away, layering `overrides` over the default
    /// update options. Does nothing before an instance exists.
    pub fn set_option(
        &self,
        option: impl Into<Rc<ChartOption>>,
        overrides: Option<&SetOptionOpts>,
    ) -> BindingResult<()> {
        let option = option.into();
        let Some(instance) = self.get_instance() else {
            trace!("set_option before instance exists, ignored");
            return Ok(());
        };
        let opts = match overrides {
            Some(overrides) => self.props.set_option_opts.merged_with(overrides),
            None => SetOptionOpts::clone(&self.props.set_option_opts),
        };
        let result = instance.borrow_mut().set_option(&option, &opts);
        result.or_else(|err| self.route_error(err))
    }

    /// Defers a `set_option` call until the end of the next pass or an
    /// explicit `flush_deferred`.
    pub fn queue_option(
        &mut self,
        option: impl Into<Rc<ChartOption>>,
        overrides: Option<SetOptionOpts>,
    ) {
        self.deferred
            .push_back((option.into(), overrides.unwrap_or_default()));
    }

    #[must_use]
    pub fn deferred_len(&self) -> usize {
        self.deferred.len()
    }

    /// Applies queued calls in order. Every call is attempted; the first
    /// failure is returned.
    pub fn flush_deferred(&mut self) -> BindingResult<()> {
        let mut outcome = Ok(());
        while let Some((option, overrides)) = self.deferred.pop_front() {
            let result = self.set_option(option, Some(&overrides));
            if outcome.is_ok() {
                outcome = result;
            }
        }
        outcome
    }

    /// Resizes the live instance, if any.
    pub fn resize(&self) {
        if let Some(instance) = self.get_instance() {
            instance.borrow_mut().resize();
        }
    }

    fn run_pass(&mut self) -> BindingResult<()> {
        let container = self.container.clone();
        if self
            .session
            .as_ref()
            .is_some_and(|session| Some(&session.container) != container.as_ref())
        {
            debug!(?container, "container changed, ending binding session");
            self.end_session();
        }

        let lazy_init = &self.props.config.lazy_init;
        let gate = self.gate.get_or_insert_with(|| LazyGate::new(lazy_init));
        gate.set_wake(self.props.on_activate.clone());
        let active = gate.sync(self.runtime.platform(), container.as_ref(), lazy_init);

        self.revalidate_session();

        if active {
            if let Some(container) = container.as_ref() {
                self.phase_instance(container);
            }
        }

        let mut outcome = Ok(());
        if self.session.is_some() {
            outcome = self.phase_option();
            self.phase_loading();
            self.phase_events();
            self.phase_group();
        }
        self.phase_resize(container.as_ref());

        self.previous = Some(AppliedOption {
            option: Rc::clone(&self.props.option),
            opts: Rc::clone(&self.props.set_option_opts),
        });
        let flushed = self.flush_deferred();
        outcome.and(flushed)
    }

    fn end_session(&mut self) {
        self.stop_resize();
        let Some(container) = self
            .session
            .as_ref()
            .map(|session| session.container.clone())
        else {
            return;
        };
        self.unwind_instance(&container);
        self.session = None;
        self.runtime.cache().borrow_mut().release(&container);
        debug!(?container, "binding session ended");
    }

    /// Reconciles the session with what the cache holds now. An instance
    /// disposed behind the session's back (runtime reset) ends it; an instance
    /// swapped by another binding on the same container gets this binding's
    /// option, loading state and events applied again.
    fn revalidate_session(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let cached = self.runtime.cache().borrow().peek(&session.container);
        match cached {
            None => {
                debug!(container = ?session.container, "cached instance gone, session dropped");
                self.session = None;
                self.stop_resize();
            }
            Some(instance) if !session.is_bound_to(&instance) => {
                debug!(container = ?session.container, "instance swapped by another binding, reapplying");
                session.adopt(&instance);
                self.previous = None;
            }
            Some(_) => {}
        }
    }

    /// Sends a failure to the error callback, or logs it.
    fn route_or_log(&self, err: BindingError, stage: &'static str) {
        match &self.props.on_error {
            Some(on_error) => on_error(&err),
            None => error!(stage, error = %err, "chart binding failure"),
        }
    }

    /// Sends a failure to the error callback, or returns it.
    fn route_error(&self, err: BindingError) -> BindingResult<()> {
        match &self.props.on_error {
            Some(on_error) => {
                on_error(&err);
                Ok(())
            }
            None => Err(err),
        }
    }
}

impl<E: ChartEngine> Drop for ChartBinding<E> {
    fn drop(&mut self) {
        self.unmount();
    }
}
