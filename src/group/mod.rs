//! Group linkage registry.
//!
//! Instances in the same group share interactions (tooltip, cursor, zoom)
//! through the engine's `connect`. A group only counts as linked with two or
//! more members, so every membership change re-asserts `connect` or
//! `disconnect` according to the resulting size.

use std::rc::Rc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::engine::{ChartEngine, ChartInstance, SharedInstance};

#[derive(Debug)]
pub struct GroupRegistry<I> {
    groups: IndexMap<String, Vec<SharedInstance<I>>>,
}

impl<I> Default for GroupRegistry<I> {
    fn default() -> Self {
        Self {
            groups: IndexMap::new(),
        }
    }
}

impl<I: ChartInstance> GroupRegistry<I> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join<E>(&mut self, engine: &E, instance: &SharedInstance<I>, group: &str)
    where
        E: ChartEngine<Instance = I>,
    {
        let members = self.groups.entry(group.to_owned()).or_default();
        if !members.iter().any(|member| Rc::ptr_eq(member, instance)) {
            members.push(Rc::clone(instance));
        }
        let size = members.len();
        instance.borrow_mut().set_group(Some(group));
        trace!(group, size, "join group");
        if size > 1 {
            engine.connect(group);
        }
    }

    pub fn leave<E>(&mut self, engine: &E, instance: &SharedInstance<I>, group: &str)
    where
        E: ChartEngine<Instance = I>,
    {
        let Some(members) = self.groups.get_mut(group) else {
            return;
        };
        let before = members.len();
        members.retain(|member| !Rc::ptr_eq(member, instance));
        if members.len() == before {
            return;
        }
        instance.borrow_mut().set_group(None);

        let size = members.len();
        trace!(group, size, "leave group");
        match size {
            0 => {
                self.groups.shift_remove(group);
                engine.disconnect(group);
                debug!(group, "group emptied");
            }
            1 => engine.disconnect(group),
            _ => engine.connect(group),
        }
    }

    /// Leaves `from` (when set) and joins `to` (when set).
    pub fn move_to<E>(
        &mut self,
        engine: &E,
        instance: &SharedInstance<I>,
        from: Option<&str>,
        to: Option<&str>,
    ) where
        E: ChartEngine<Instance = I>,
    {
        if let Some(from) = from {
            self.leave(engine, instance, from);
        }
        if let Some(to) = to {
            self.join(engine, instance, to);
        }
    }

    #[must_use]
    pub fn members_of(&self, group: &str) -> Vec<SharedInstance<I>> {
        self.groups.get(group).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn size_of(&self, group: &str) -> usize {
        self.groups.get(group).map_or(0, Vec::len)
    }

    #[must_use]
    pub fn group_of(&self, instance: &SharedInstance<I>) -> Option<String> {
        self.groups
            .iter()
            .find(|(_, members)| members.iter().any(|member| Rc::ptr_eq(member, instance)))
            .map(|(group, _)| group.clone())
    }

    #[must_use]
    pub fn is_grouped(&self, instance: &SharedInstance<I>) -> bool {
        self.group_of(instance).is_some()
    }

    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Disconnects every known group and forgets all memberships.
    pub fn clear_all<E>(&mut self, engine: &E)
    where
        E: ChartEngine<Instance = I>,
    {
        for (group, members) in self.groups.drain(..) {
            for member in &members {
                member.borrow_mut().set_group(None);
            }
            engine.disconnect(&group);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::engine::{
        ChartEngine, ContainerId, EngineCall, InitOptions, RecordingEngine, RecordingInstance,
        RendererKind,
    };

    fn instance(engine: &RecordingEngine, id: u64) -> SharedInstance<RecordingInstance> {
        let created = engine
            .init(&ContainerId(id), None, RendererKind::Canvas, &InitOptions::default())
            .expect("init");
        Rc::new(RefCell::new(created))
    }

    #[test]
    fn join_twice_does_not_duplicate_member() {
        let engine = RecordingEngine::new();
        let mut groups = GroupRegistry::new();
        let a = instance(&engine, 1);
        groups.join(&engine, &a, "g");
        groups.join(&engine, &a, "g");
        assert_eq!(groups.size_of("g"), 1);
        assert_eq!(
            engine.count(|call| matches!(call, EngineCall::Connect { .. })),
            0
        );
    }

    #[test]
    fn move_with_no_groups_is_noop() {
        let engine = RecordingEngine::new();
        let mut groups = GroupRegistry::new();
        let a = instance(&engine, 1);
        engine.clear_calls();
        groups.move_to(&engine, &a, None, None);
        assert!(engine.calls().is_empty());
        assert!(!groups.is_grouped(&a));
    }

    #[test]
    fn leave_unknown_group_is_noop() {
        let engine = RecordingEngine::new();
        let mut groups = GroupRegistry::new();
        let a = instance(&engine, 1);
        engine.clear_calls();
        groups.leave(&engine, &a, "missing");
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn join_tags_instance_with_group() {
        let engine = RecordingEngine::new();
        let mut groups = GroupRegistry::new();
        let a = instance(&engine, 1);
        groups.join(&engine, &a, "dash");
        assert_eq!(a.borrow().group(), Some("dash"));
        groups.leave(&engine, &a, "dash");
        assert_eq!(a.borrow().group(), None);
        assert_eq!(groups.group_count(), 0);
    }
}
