use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::error::{BindingError, BindingResult};

use super::{
    ChartEngine, ChartInstance, ChartOption, ContainerId, EventHandler, EventParams, EventQuery,
    HandlerContext, InitOptions, LoadingOptions, RendererKind, SetOptionOpts,
};

/// Every call the binding layer made against a `RecordingEngine`.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Init {
        container: ContainerId,
        instance: u64,
        theme: Option<String>,
        renderer: RendererKind,
        options: InitOptions,
    },
    RegisterTheme {
        name: String,
    },
    Connect {
        group: String,
    },
    Disconnect {
        group: String,
    },
    SetOption {
        instance: u64,
        option: ChartOption,
        opts: SetOptionOpts,
    },
    ShowLoading {
        instance: u64,
        options: Option<LoadingOptions>,
    },
    HideLoading {
        instance: u64,
    },
    On {
        instance: u64,
        event: String,
        query: Option<EventQuery>,
        has_context: bool,
    },
    Off {
        instance: u64,
        event: String,
    },
    Resize {
        instance: u64,
    },
    SetGroup {
        instance: u64,
        group: Option<String>,
    },
    Dispose {
        instance: u64,
    },
}

#[derive(Debug, Default)]
struct RecordingState {
    calls: RefCell<Vec<EngineCall>>,
    next_instance: Cell<u64>,
    init_failure: RefCell<Option<String>>,
    set_option_failure: RefCell<Option<String>>,
}

impl RecordingState {
    fn record(&self, call: EngineCall) {
        self.calls.borrow_mut().push(call);
    }
}

/// Headless engine that records calls instead of rendering.
///
/// Clones share one call log, so a test can keep a handle while the runtime
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    state: Rc<RecordingState>,
}

impl RecordingEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn calls(&self) -> Vec<EngineCall> {
        self.state.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.state.calls.borrow_mut().clear();
    }

    #[must_use]
    pub fn count(&self, predicate: impl Fn(&EngineCall) -> bool) -> usize {
        self.state
            .calls
            .borrow()
            .iter()
            .filter(|call| predicate(call))
            .count()
    }

    #[must_use]
    pub fn init_count(&self) -> usize {
        self.count(|call| matches!(call, EngineCall::Init { .. }))
    }

    #[must_use]
    pub fn dispose_count(&self, instance: u64) -> usize {
        self.count(|call| matches!(call, EngineCall::Dispose { instance: id } if *id == instance))
    }

    #[must_use]
    pub fn set_option_count(&self) -> usize {
        self.count(|call| matches!(call, EngineCall::SetOption { .. }))
    }

    /// Makes every following `init` fail with `message` (`None` restores success).
    pub fn fail_init(&self, message: Option<&str>) {
        *self.state.init_failure.borrow_mut() = message.map(str::to_owned);
    }

    /// Makes every following `set_option` fail with `message` (`None` restores success).
    pub fn fail_set_option(&self, message: Option<&str>) {
        *self.state.set_option_failure.borrow_mut() = message.map(str::to_owned);
    }
}

impl ChartEngine for RecordingEngine {
    type Container = ContainerId;
    type Instance = RecordingInstance;

    fn init(
        &self,
        container: &ContainerId,
        theme: Option<&str>,
        renderer: RendererKind,
        options: &InitOptions,
    ) -> BindingResult<RecordingInstance> {
        if let Some(message) = self.state.init_failure.borrow().clone() {
            return Err(BindingError::EngineInit(message));
        }
        let id = self.state.next_instance.get() + 1;
        self.state.next_instance.set(id);
        self.state.record(EngineCall::Init {
            container: *container,
            instance: id,
            theme: theme.map(str::to_owned),
            renderer,
            options: options.clone(),
        });
        Ok(RecordingInstance {
            id,
            container: *container,
            theme: theme.map(str::to_owned),
            group: None,
            handlers: Vec::new(),
            loading: false,
            disposed: false,
            state: Rc::clone(&self.state),
        })
    }

    fn register_theme(&self, name: &str, _theme: &serde_json::Value) {
        self.state.record(EngineCall::RegisterTheme {
            name: name.to_owned(),
        });
    }

    fn connect(&self, group: &str) {
        self.state.record(EngineCall::Connect {
            group: group.to_owned(),
        });
    }

    fn disconnect(&self, group: &str) {
        self.state.record(EngineCall::Disconnect {
            group: group.to_owned(),
        });
    }
}

/// Instance produced by `RecordingEngine`.
#[derive(Debug)]
pub struct RecordingInstance {
    id: u64,
    container: ContainerId,
    theme: Option<String>,
    group: Option<String>,
    handlers: Vec<(String, EventHandler, Option<HandlerContext>)>,
    loading: bool,
    disposed: bool,
    state: Rc<RecordingState>,
}

impl RecordingInstance {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn container(&self) -> ContainerId {
        self.container
    }

    #[must_use]
    pub fn theme(&self) -> Option<&str> {
        self.theme.as_deref()
    }

    #[must_use]
    pub fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Names of events with a live handler, in binding order.
    #[must_use]
    pub fn bound_events(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|(event, _, _)| event.clone())
            .collect()
    }

    #[must_use]
    pub fn is_bound(&self, event: &str, handler: &EventHandler) -> bool {
        self.handlers
            .iter()
            .any(|(name, bound, _)| name == event && bound.ptr_eq(handler))
    }

    /// Dispatches `params` to every handler bound to `event`.
    pub fn emit(&self, event: &str, params: &EventParams) {
        for (name, handler, _) in &self.handlers {
            if name == event {
                handler.call(params);
            }
        }
    }
}

impl ChartInstance for RecordingInstance {
    fn set_option(&mut self, option: &ChartOption, opts: &SetOptionOpts) -> BindingResult<()> {
        if let Some(message) = self.state.set_option_failure.borrow().clone() {
            return Err(BindingError::SetOption(message));
        }
        self.state.record(EngineCall::SetOption {
            instance: self.id,
            option: option.clone(),
            opts: opts.clone(),
        });
        Ok(())
    }

    fn show_loading(&mut self, options: Option<&LoadingOptions>) {
        self.loading = true;
        self.state.record(EngineCall::ShowLoading {
            instance: self.id,
            options: options.cloned(),
        });
    }

    fn hide_loading(&mut self) {
        self.loading = false;
        self.state.record(EngineCall::HideLoading { instance: self.id });
    }

    fn on(
        &mut self,
        event: &str,
        query: Option<&EventQuery>,
        handler: &EventHandler,
        context: Option<&HandlerContext>,
    ) {
        self.handlers
            .push((event.to_owned(), handler.clone(), context.cloned()));
        self.state.record(EngineCall::On {
            instance: self.id,
            event: event.to_owned(),
            query: query.cloned(),
            has_context: context.is_some(),
        });
    }

    fn off(&mut self, event: &str, handler: &EventHandler) {
        self.handlers
            .retain(|(name, bound, _)| !(name == event && bound.ptr_eq(handler)));
        self.state.record(EngineCall::Off {
            instance: self.id,
            event: event.to_owned(),
        });
    }

    fn resize(&mut self) {
        self.state.record(EngineCall::Resize { instance: self.id });
    }

    fn set_group(&mut self, group: Option<&str>) {
        self.group = group.map(str::to_owned);
        self.state.record(EngineCall::SetGroup {
            instance: self.id,
            group: self.group.clone(),
        });
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.handlers.clear();
        self.state.record(EngineCall::Dispose { instance: self.id });
    }
}
