//! Theme resolution and registration.
//!
//! Built-in presets are registered once, lazily. Custom theme objects are
//! deduplicated first by reference and then by canonical content, so the
//! engine's global theme table grows with the number of distinct theme
//! contents rather than with the number of reconciliation passes.

mod presets;

use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::engine::ChartEngine;

pub use presets::{BUILTIN_THEME_NAMES, DARK, LIGHT, MACARONS};

const CUSTOM_THEME_PREFIX: &str = "chart-binding-theme";

/// Caller-supplied theme selection.
#[derive(Debug, Clone, Default)]
pub enum ThemeDescriptor {
    #[default]
    None,
    Named(String),
    Custom(Rc<Value>),
}

impl From<&str> for ThemeDescriptor {
    fn from(name: &str) -> Self {
        Self::Named(name.to_owned())
    }
}

impl From<String> for ThemeDescriptor {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<Rc<Value>> for ThemeDescriptor {
    fn from(content: Rc<Value>) -> Self {
        Self::Custom(content)
    }
}

impl From<Value> for ThemeDescriptor {
    fn from(content: Value) -> Self {
        Self::Custom(Rc::new(content))
    }
}

/// Side-effect-free identity of a theme descriptor, used for change detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ThemeKey {
    None,
    Builtin(String),
    Content(String),
}

#[derive(Debug)]
struct RefEntry {
    content: Weak<Value>,
    name: String,
}

#[derive(Debug)]
pub struct ThemeRegistry {
    builtins: IndexMap<&'static str, Value>,
    builtins_registered: bool,
    by_ref: HashMap<*const Value, RefEntry>,
    by_content: HashMap<String, String>,
    next_custom_id: u64,
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        let builtins = BUILTIN_THEME_NAMES
            .iter()
            .filter_map(|name| presets::preset(name).map(|content| (*name, content)))
            .collect();
        Self {
            builtins,
            builtins_registered: false,
            by_ref: HashMap::new(),
            by_content: HashMap::new(),
            next_custom_id: 0,
        }
    }
}

impl ThemeRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_builtin(&self, name: &str) -> bool {
        self.builtins.contains_key(name)
    }

    #[must_use]
    pub fn get_builtin(&self, name: &str) -> Option<&Value> {
        self.builtins.get(name)
    }

    #[must_use]
    pub fn list_builtins(&self) -> Vec<&'static str> {
        self.builtins.keys().copied().collect()
    }

    /// Registers every preset with the engine. Later calls are no-ops.
    pub fn register_builtins<E: ChartEngine>(&mut self, engine: &E) {
        if self.builtins_registered {
            return;
        }
        for (name, content) in &self.builtins {
            engine.register_theme(name, content);
        }
        self.builtins_registered = true;
        debug!(count = self.builtins.len(), "registered builtin themes");
    }

    #[must_use]
    pub fn builtins_registered(&self) -> bool {
        self.builtins_registered
    }

    /// Registers `content` under `name` with no deduplication.
    pub fn register_custom<E: ChartEngine>(&mut self, engine: &E, name: &str, content: &Value) {
        engine.register_theme(name, content);
    }

    /// Returns the engine theme name for `content`, registering it on first sight.
    pub fn resolve_or_register<E: ChartEngine>(&mut self, engine: &E, content: &Rc<Value>) -> String {
        let ptr = Rc::as_ptr(content);
        if let Some(entry) = self.by_ref.get(&ptr) {
            if entry.content.strong_count() > 0 {
                trace!(name = %entry.name, "theme resolved by reference");
                return entry.name.clone();
            }
            self.by_ref.remove(&ptr);
        }

        let key = canonical_json(content);
        let name = match self.by_content.get(&key) {
            Some(name) => {
                trace!(name = %name, "theme resolved by content");
                name.clone()
            }
            None => {
                self.next_custom_id += 1;
                let name = format!("{CUSTOM_THEME_PREFIX}-{}", self.next_custom_id);
                engine.register_theme(&name, content);
                debug!(name = %name, "registered custom theme");
                self.by_content.insert(key, name.clone());
                name
            }
        };

        self.prune_dead_refs();
        self.by_ref.insert(
            ptr,
            RefEntry {
                content: Rc::downgrade(content),
                name: name.clone(),
            },
        );
        name
    }

    /// Resolves a descriptor to the name passed to engine `init`.
    pub fn resolve_theme_name<E: ChartEngine>(
        &mut self,
        engine: &E,
        descriptor: &ThemeDescriptor,
    ) -> Option<String> {
        match descriptor {
            ThemeDescriptor::None => None,
            ThemeDescriptor::Named(name) if self.is_builtin(name) => Some(name.clone()),
            ThemeDescriptor::Named(name) => {
                warn!(theme = %name, "unknown builtin theme, falling back to engine default");
                None
            }
            ThemeDescriptor::Custom(content) => Some(self.resolve_or_register(engine, content)),
        }
    }

    #[must_use]
    pub fn theme_key(&self, descriptor: &ThemeDescriptor) -> ThemeKey {
        match descriptor {
            ThemeDescriptor::None => ThemeKey::None,
            ThemeDescriptor::Named(name) if self.is_builtin(name) => ThemeKey::Builtin(name.clone()),
            ThemeDescriptor::Named(_) => ThemeKey::None,
            ThemeDescriptor::Custom(content) => ThemeKey::Content(canonical_json(content)),
        }
    }

    /// Number of distinct custom theme contents registered so far.
    #[must_use]
    pub fn custom_theme_count(&self) -> usize {
        self.by_content.len()
    }

    /// Forgets custom registrations and the builtin flag.
    ///
    /// Names already registered with the engine are not unregistered.
    pub fn clear(&mut self) {
        self.by_ref.clear();
        self.by_content.clear();
        self.builtins_registered = false;
    }

    fn prune_dead_refs(&mut self) {
        self.by_ref.retain(|_, entry| entry.content.strong_count() > 0);
    }
}

/// Serializes `value` with object keys sorted at every depth.
#[must_use]
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (index, item) in items.iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (index, key) in keys.into_iter().enumerate() {
                if index > 0 {
                    out.push(',');
                }
                let _ = write!(out, "{}:", Value::String(key.clone()));
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        scalar => {
            let _ = write!(out, "{scalar}");
        }
    }
}
