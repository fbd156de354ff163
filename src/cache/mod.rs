//! Reference-counted container to instance cache.
//!
//! The cache is the only place that disposes instances. Bindings acquire and
//! release; the instance is disposed on the release that drops the count to
//! zero, or when `replace` swaps it out.

use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::engine::{ChartInstance, SharedInstance};

#[derive(Debug)]
struct CacheEntry<I> {
    instance: SharedInstance<I>,
    ref_count: usize,
}

#[derive(Debug)]
pub struct InstanceCache<C, I> {
    entries: HashMap<C, CacheEntry<I>>,
}

impl<C, I> Default for InstanceCache<C, I> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }
}

impl<C, I> InstanceCache<C, I>
where
    C: Clone + Eq + Hash + std::fmt::Debug,
    I: ChartInstance,
{
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached instance for `container`, creating it with `factory`
    /// when absent.
    ///
    /// An existing owner wins: the factory is not invoked when an entry exists.
    /// A failing factory leaves the cache untouched.
    pub fn acquire<E>(
        &mut self,
        container: &C,
        factory: impl FnOnce() -> Result<I, E>,
    ) -> Result<SharedInstance<I>, E> {
        if let Some(entry) = self.entries.get_mut(container) {
            entry.ref_count += 1;
            trace!(?container, ref_count = entry.ref_count, "reuse cached instance");
            return Ok(Rc::clone(&entry.instance));
        }

        let instance = Rc::new(RefCell::new(factory()?));
        self.entries.insert(
            container.clone(),
            CacheEntry {
                instance: Rc::clone(&instance),
                ref_count: 1,
            },
        );
        debug!(?container, "cache new instance");
        Ok(instance)
    }

    #[must_use]
    pub fn peek(&self, container: &C) -> Option<SharedInstance<I>> {
        self.entries
            .get(container)
            .map(|entry| Rc::clone(&entry.instance))
    }

    /// Installs `instance` for `container`, disposing the one it supersedes.
    ///
    /// The reference count is preserved; a fresh entry starts at one.
    pub fn replace(&mut self, container: &C, instance: I) -> SharedInstance<I> {
        let instance = Rc::new(RefCell::new(instance));
        match self.entries.get_mut(container) {
            Some(entry) => {
                let previous = std::mem::replace(&mut entry.instance, Rc::clone(&instance));
                if !Rc::ptr_eq(&previous, &instance) {
                    previous.borrow_mut().dispose();
                }
                debug!(?container, ref_count = entry.ref_count, "replace cached instance");
            }
            None => {
                self.entries.insert(
                    container.clone(),
                    CacheEntry {
                        instance: Rc::clone(&instance),
                        ref_count: 1,
                    },
                );
                debug!(?container, "replace on empty slot, caching new instance");
            }
        }
        instance
    }

    /// Drops one owner; disposes and forgets the instance when none remain.
    pub fn release(&mut self, container: &C) {
        let Some(entry) = self.entries.get_mut(container) else {
            return;
        };
        entry.ref_count = entry.ref_count.saturating_sub(1);
        trace!(?container, ref_count = entry.ref_count, "release cached instance");
        if entry.ref_count == 0 {
            if let Some(entry) = self.entries.remove(container) {
                entry.instance.borrow_mut().dispose();
                debug!(?container, "dispose cached instance");
            }
        }
    }

    #[must_use]
    pub fn reference_count(&self, container: &C) -> usize {
        self.entries
            .get(container)
            .map_or(0, |entry| entry.ref_count)
    }

    #[must_use]
    pub fn contains(&self, container: &C) -> bool {
        self.entries.contains_key(container)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Disposes every tracked instance.
    pub fn clear_all(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.instance.borrow_mut().dispose();
        }
    }
}
