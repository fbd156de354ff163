use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::engine::{ChartOption, EventTable, InitOptions, LoadingOptions, RendererKind, SetOptionOpts};
use crate::error::{BindingError, BindingResult};
use crate::platform::{LazyInit, WakeCallback};
use crate::theme::ThemeDescriptor;

/// Sink for engine failures. When set, it is the only place errors go.
pub type ErrorCallback = Rc<dyn Fn(&BindingError)>;

/// Serializable part of a binding's configuration.
///
/// Hosts can persist/load this next to their own layout data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    #[serde(default)]
    pub renderer: RendererKind,
    #[serde(default)]
    pub lazy_init: LazyInit,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default = "default_auto_resize")]
    pub auto_resize: bool,
    #[serde(default)]
    pub show_loading: bool,
    #[serde(default)]
    pub init_opts: InitOptions,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            renderer: RendererKind::default(),
            lazy_init: LazyInit::default(),
            group: None,
            auto_resize: default_auto_resize(),
            show_loading: false,
            init_opts: InitOptions::default(),
        }
    }
}

fn default_auto_resize() -> bool {
    true
}

impl BindingConfig {
    pub fn from_json_str(input: &str) -> BindingResult<Self> {
        serde_json::from_str(input)
            .map_err(|e| BindingError::InvalidConfig(format!("failed to parse binding config: {e}")))
    }

    pub fn to_json_pretty(&self) -> BindingResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            BindingError::InvalidConfig(format!("failed to serialize binding config: {e}"))
        })
    }
}

/// Everything a host hands to `ChartBinding::reconcile`.
///
/// `option`, `set_option_opts` and `on_events` are compared by reference
/// between passes: keep the same `Rc` to signal "unchanged".
#[derive(Clone, Default)]
pub struct BindingProps {
    pub option: Rc<ChartOption>,
    pub theme: ThemeDescriptor,
    pub config: BindingConfig,
    pub set_option_opts: Rc<SetOptionOpts>,
    pub loading_option: Option<LoadingOptions>,
    pub on_events: Rc<EventTable>,
    pub on_error: Option<ErrorCallback>,
    /// Run when a lazy binding's container becomes visible. The host should
    /// answer with `ChartBinding::refresh` or a new `reconcile`.
    pub on_activate: Option<WakeCallback>,
}

impl BindingProps {
    #[must_use]
    pub fn new(option: impl Into<Rc<ChartOption>>) -> Self {
        Self {
            option: option.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_option(mut self, option: impl Into<Rc<ChartOption>>) -> Self {
        self.option = option.into();
        self
    }

    #[must_use]
    pub fn with_theme(mut self, theme: impl Into<ThemeDescriptor>) -> Self {
        self.theme = theme.into();
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: BindingConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: RendererKind) -> Self {
        self.config.renderer = renderer;
        self
    }

    #[must_use]
    pub fn with_lazy_init(mut self, lazy_init: LazyInit) -> Self {
        self.config.lazy_init = lazy_init;
        self
    }

    #[must_use]
    pub fn with_group(mut self, group: Option<&str>) -> Self {
        self.config.group = group.map(str::to_owned);
        self
    }

    #[must_use]
    pub fn with_auto_resize(mut self, auto_resize: bool) -> Self {
        self.config.auto_resize = auto_resize;
        self
    }

    #[must_use]
    pub fn with_init_opts(mut self, init_opts: InitOptions) -> Self {
        self.config.init_opts = init_opts;
        self
    }

    #[must_use]
    pub fn with_loading(mut self, show: bool, options: Option<LoadingOptions>) -> Self {
        self.config.show_loading = show;
        self.loading_option = options;
        self
    }

    #[must_use]
    pub fn with_set_option_opts(mut self, opts: impl Into<Rc<SetOptionOpts>>) -> Self {
        self.set_option_opts = opts.into();
        self
    }

    #[must_use]
    pub fn with_events(mut self, events: impl Into<Rc<EventTable>>) -> Self {
        self.on_events = events.into();
        self
    }

    #[must_use]
    pub fn with_on_error(mut self, on_error: impl Fn(&BindingError) + 'static) -> Self {
        self.on_error = Some(Rc::new(on_error));
        self
    }

    #[must_use]
    pub fn with_on_activate(mut self, on_activate: impl Fn() + 'static) -> Self {
        self.on_activate = Some(Rc::new(on_activate));
        self
    }
}

impl fmt::Debug for BindingProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingProps")
            .field("option", &self.option)
            .field("theme", &self.theme)
            .field("config", &self.config)
            .field("set_option_opts", &self.set_option_opts)
            .field("loading_option", &self.loading_option)
            .field("on_events", &self.on_events.len())
            .field("on_error", &self.on_error.is_some())
            .field("on_activate", &self.on_activate.is_some())
            .finish()
    }
}
