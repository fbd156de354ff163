use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::engine::{ChartEngine, ChartInstance, bind_events, unbind_events};
use crate::error::BindingResult;

use super::session::{AppliedOption, BindingSession, LoadingState, ResizeSubscription};
use super::ChartBinding;

impl<E: ChartEngine> ChartBinding<E> {
    /// Phase 1: creates the instance on first activation, or recreates it when
    /// the theme, renderer or init options changed.
    pub(super) fn phase_instance(&mut self, container: &E::Container) {
        let runtime = self.runtime.clone();
        let theme_key = runtime.themes().borrow().theme_key(&self.props.theme);
        let renderer = self.props.config.renderer;
        let init_opts = self.props.config.init_opts.clone();

        let recreate = match &self.session {
            None => false,
            Some(session) if session.needs_recreate(&theme_key, renderer, &init_opts) => true,
            Some(_) => return,
        };

        let engine = runtime.engine();
        let theme_name = {
            let mut themes = runtime.themes().borrow_mut();
            themes.register_builtins(engine);
            themes.resolve_theme_name(engine, &self.props.theme)
        };
        let create = || engine.init(container, theme_name.as_deref(), renderer, &init_opts);

        let instance = if recreate {
            debug!(
                ?container,
                theme = ?theme_name,
                renderer = renderer.as_str(),
                "instance identity changed, recreating"
            );
            self.unwind_instance(container);
            match create() {
                Ok(created) => runtime.cache().borrow_mut().replace(container, created),
                Err(err) => {
                    self.end_session();
                    self.route_or_log(err, "engine init");
                    return;
                }
            }
        } else {
            let acquired = runtime.cache().borrow_mut().acquire(container, create);
            match acquired {
                Ok(instance) => instance,
                Err(err) => {
                    self.route_or_log(err, "engine init");
                    return;
                }
            }
        };

        let option = Rc::clone(&self.props.option);
        let opts = Rc::clone(&self.props.set_option_opts);
        let applied = instance.borrow_mut().set_option(&option, &opts);
        if let Err(err) = applied {
            self.route_or_log(err, "initial set_option");
        }

        let loading = LoadingState {
            show: self.props.config.show_loading,
            options: self.props.loading_option.clone(),
        };
        apply_loading(&mut *instance.borrow_mut(), &loading);

        let events = Rc::clone(&self.props.on_events);
        bind_events(&mut *instance.borrow_mut(), &events);

        if let Some(group) = &self.props.config.group {
            runtime.groups().borrow_mut().join(engine, &instance, group);
        }

        let session = self.session.get_or_insert_with(|| {
            BindingSession::new(container.clone(), &instance, theme_key.clone(), renderer, init_opts.clone())
        });
        session.instance = Rc::downgrade(&instance);
        session.theme_key = theme_key;
        session.renderer = renderer;
        session.init_opts = init_opts;
        session.applied = Some(AppliedOption { option, opts });
        session.loading = Some(loading);
        session.bound_events = Some(events);
        debug!(?container, "binding session initialized");
    }

    /// Phase 2: pushes a changed option payload or update options.
    pub(super) fn phase_option(&mut self) -> BindingResult<()> {
        let option = Rc::clone(&self.props.option);
        let opts = Rc::clone(&self.props.set_option_opts);
        if self
            .previous
            .as_ref()
            .is_some_and(|previous| previous.matches(&option, &opts))
        {
            return Ok(());
        }

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if session
            .applied
            .as_ref()
            .is_some_and(|applied| applied.matches(&option, &opts))
        {
            trace!("option already applied this session, skipping");
            return Ok(());
        }
        session.applied = Some(AppliedOption {
            option: Rc::clone(&option),
            opts: Rc::clone(&opts),
        });

        let Some(instance) = self.get_instance() else {
            return Ok(());
        };
        let result = instance.borrow_mut().set_option(&option, &opts);
        result.or_else(|err| self.route_error(err))
    }

    /// Phase 3.
    pub(super) fn phase_loading(&mut self) {
        let desired = LoadingState {
            show: self.props.config.show_loading,
            options: self.props.loading_option.clone(),
        };
        let Some(instance) = self.get_instance() else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session.loading.as_ref() == Some(&desired) {
            return;
        }
        apply_loading(&mut *instance.borrow_mut(), &desired);
        session.loading = Some(desired);
    }

    /// Phase 4: swaps the bound event table. The old table is fully unbound
    /// before any handler of the new one is bound.
    pub(super) fn phase_events(&mut self) {
        let events = Rc::clone(&self.props.on_events);
        let Some(instance) = self.get_instance() else {
            return;
        };
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if session
            .bound_events
            .as_ref()
            .is_some_and(|bound| Rc::ptr_eq(bound, &events))
        {
            return;
        }

        let mut target = instance.borrow_mut();
        if let Some(previous) = session.bound_events.take() {
            unbind_events(&mut *target, &previous);
        }
        bind_events(&mut *target, &events);
        trace!(count = events.len(), "event table rebound");
        session.bound_events = Some(events);
    }

    /// Phase 5: compares against the registry's view of the instance, not a
    /// remembered value, so a recreate in phase 1 is picked up.
    pub(super) fn phase_group(&mut self) {
        let Some(instance) = self.get_instance() else {
            return;
        };
        let runtime = self.runtime.clone();
        let actual = runtime.groups().borrow().group_of(&instance);
        let desired = self.props.config.group.as_deref();
        if actual.as_deref() == desired {
            return;
        }
        debug!(from = ?actual, to = ?desired, "moving instance between groups");
        runtime
            .groups()
            .borrow_mut()
            .move_to(runtime.engine(), &instance, actual.as_deref(), desired);
    }

    /// Phase 6.
    pub(super) fn phase_resize(&mut self, container: Option<&E::Container>) {
        let wanted = self.props.config.auto_resize && self.session.is_some();
        let Some(container) = container.filter(|_| wanted) else {
            self.stop_resize();
            return;
        };
        if self
            .resize
            .as_ref()
            .is_some_and(|subscription| &subscription.container == container)
        {
            return;
        }
        self.stop_resize();
        if self
            .session
            .as_ref()
            .is_some_and(|session| session.resize_unavailable)
        {
            return;
        }

        match self.runtime.platform().resize_observer() {
            Ok(mut observer) => {
                let cache = Rc::clone(self.runtime.cache());
                let target = container.clone();
                observer.observe(
                    container,
                    Rc::new(move || {
                        let instance = cache.borrow().peek(&target);
                        if let Some(instance) = instance {
                            instance.borrow_mut().resize();
                        }
                    }),
                );
                self.resize = Some(ResizeSubscription {
                    container: container.clone(),
                    observer,
                });
                trace!(?container, "resize observation installed");
            }
            Err(err) => {
                warn!(error = %err, "auto resize disabled for this session");
                if let Some(session) = self.session.as_mut() {
                    session.resize_unavailable = true;
                }
            }
        }
    }

    pub(super) fn stop_resize(&mut self) {
        if let Some(subscription) = self.resize.take() {
            subscription.disconnect();
        }
    }

    /// Leaves the instance's group and unbinds the session's events.
    pub(super) fn unwind_instance(&mut self, container: &E::Container) {
        let runtime = self.runtime.clone();
        let bound = self
            .session
            .as_mut()
            .and_then(|session| session.bound_events.take());
        let cached = runtime.cache().borrow().peek(container);
        let Some(instance) = cached else {
            return;
        };

        let group = runtime.groups().borrow().group_of(&instance);
        if let Some(group) = group {
            runtime
                .groups()
                .borrow_mut()
                .leave(runtime.engine(), &instance, &group);
        }
        if let Some(table) = bound {
            unbind_events(&mut *instance.borrow_mut(), &table);
        }
    }
}

fn apply_loading<I: ChartInstance>(instance: &mut I, loading: &LoadingState) {
    if loading.show {
        instance.show_loading(loading.options.as_ref());
    } else {
        instance.hide_loading();
    }
}
