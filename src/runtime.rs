use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::binding::ChartBinding;
use crate::cache::InstanceCache;
use crate::engine::ChartEngine;
use crate::group::GroupRegistry;
use crate::platform::Platform;
use crate::theme::ThemeRegistry;

pub type SharedCache<E> =
    Rc<RefCell<InstanceCache<<E as ChartEngine>::Container, <E as ChartEngine>::Instance>>>;
pub type SharedGroups<E> = Rc<RefCell<GroupRegistry<<E as ChartEngine>::Instance>>>;

/// Services shared by every binding created from one runtime.
///
/// The cache, theme registry and group registry coordinate across bindings
/// (two bindings on one container, several bindings in one group), so they
/// live here instead of in each binding. Cloning the runtime shares them.
pub struct ChartRuntime<E: ChartEngine> {
    engine: Rc<E>,
    platform: Rc<dyn Platform<E::Container>>,
    cache: SharedCache<E>,
    themes: Rc<RefCell<ThemeRegistry>>,
    groups: SharedGroups<E>,
}

impl<E: ChartEngine> Clone for ChartRuntime<E> {
    fn clone(&self) -> Self {
        Self {
            engine: Rc::clone(&self.engine),
            platform: Rc::clone(&self.platform),
            cache: Rc::clone(&self.cache),
            themes: Rc::clone(&self.themes),
            groups: Rc::clone(&self.groups),
        }
    }
}

impl<E: ChartEngine> ChartRuntime<E> {
    pub fn new(engine: E, platform: impl Platform<E::Container> + 'static) -> Self {
        Self {
            engine: Rc::new(engine),
            platform: Rc::new(platform),
            cache: Rc::new(RefCell::new(InstanceCache::new())),
            themes: Rc::new(RefCell::new(ThemeRegistry::new())),
            groups: Rc::new(RefCell::new(GroupRegistry::new())),
        }
    }

    /// Creates an unmounted binding backed by this runtime's services.
    #[must_use]
    pub fn bind(&self) -> ChartBinding<E> {
        ChartBinding::new(self.clone())
    }

    #[must_use]
    pub fn engine(&self) -> &E {
        &self.engine
    }

    #[must_use]
    pub fn platform(&self) -> &dyn Platform<E::Container> {
        self.platform.as_ref()
    }

    #[must_use]
    pub fn cache(&self) -> &SharedCache<E> {
        &self.cache
    }

    #[must_use]
    pub fn themes(&self) -> &Rc<RefCell<ThemeRegistry>> {
        &self.themes
    }

    #[must_use]
    pub fn groups(&self) -> &SharedGroups<E> {
        &self.groups
    }

    /// Disconnects all groups, disposes all cached instances and forgets
    /// theme registrations. Live bindings start a new session on their next
    /// pass; unmount them before calling this if they should stay inert.
    pub fn reset(&self) {
        self.groups.borrow_mut().clear_all(self.engine.as_ref());
        self.cache.borrow_mut().clear_all();
        self.themes.borrow_mut().clear();
        debug!("chart runtime reset");
    }
}
