//! Class descriptors

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;

use super::{ClassError, Instance, Member, MethodFn, Visibility};
use crate::namespace::short_name;

/// Event names mapped to opaque declaration markers
pub type EventTable = BTreeMap<String, Value>;

/// A member together with the class that declared it
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) member: Member,
    pub(crate) origin: String,
}

/// Member storage; once sealed, keys can no longer be added or removed
#[derive(Debug, Default)]
struct MemberTable {
    entries: HashMap<String, Slot>,
    sealed: bool,
}

/// A member replaced while composing a class
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Override {
    /// Member key
    pub key: String,
    /// Class whose member was replaced
    pub replaced: String,
    /// Class whose member won
    pub by: String,
}

/// Serializable view of a member
#[derive(Debug, Clone, Serialize)]
pub struct MemberSummary {
    pub key: String,
    pub kind: &'static str,
    pub visibility: Visibility,
    pub origin: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Serializable view of a class
#[derive(Debug, Clone, Serialize)]
pub struct ClassSummary {
    pub name: String,
    pub sealed: bool,
    pub includes: Vec<String>,
    pub members: Vec<MemberSummary>,
    pub events: Vec<String>,
    pub overrides: Vec<Override>,
}

/// A declared class: constructor, member table, events and includes
pub struct ClassDef {
    name: String,
    ctor: MethodFn,
    members: RwLock<MemberTable>,
    events: EventTable,
    includes: Vec<Arc<ClassDef>>,
    overrides: Vec<Override>,
}

impl ClassDef {
    pub(crate) fn assemble(
        name: &str,
        ctor: MethodFn,
        entries: HashMap<String, Slot>,
        events: EventTable,
        includes: Vec<Arc<ClassDef>>,
        overrides: Vec<Override>,
    ) -> Self {
        Self {
            name: name.to_string(),
            ctor,
            members: RwLock::new(MemberTable {
                entries,
                sealed: false,
            }),
            events,
            includes,
            overrides,
        }
    }

    /// Fully qualified class name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Final segment of the class name
    pub fn short_name(&self) -> &str {
        short_name(&self.name)
    }

    /// Get a member by key
    pub fn member(&self, key: &str) -> Option<Member> {
        self.members.read().entries.get(key).map(|slot| slot.member.clone())
    }

    /// Name of the class that contributed the member at `key`
    pub fn member_origin(&self, key: &str) -> Option<String> {
        self.members.read().entries.get(key).map(|slot| slot.origin.clone())
    }

    pub fn has_member(&self, key: &str) -> bool {
        self.members.read().entries.contains_key(key)
    }

    /// All member keys, sorted
    pub fn member_keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.members.read().entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Snapshot of all members, sorted by key
    pub fn members(&self) -> Vec<(String, Member)> {
        self.slots()
            .into_iter()
            .map(|(key, slot)| (key, slot.member))
            .collect()
    }

    pub(crate) fn slots(&self) -> Vec<(String, Slot)> {
        let mut slots: Vec<_> = self
            .members
            .read()
            .entries
            .iter()
            .map(|(key, slot)| (key.clone(), slot.clone()))
            .collect();
        slots.sort_by(|a, b| a.0.cmp(&b.0));
        slots
    }

    /// Declared events, own and included
    pub fn events(&self) -> &EventTable {
        &self.events
    }

    /// Included classes, flattened transitively
    pub fn includes(&self) -> &[Arc<ClassDef>] {
        &self.includes
    }

    /// Check whether `other` was composed into this class, directly or not
    pub fn includes_class(&self, other: &ClassDef) -> bool {
        self.includes.iter().any(|c| std::ptr::eq(c.as_ref(), other))
    }

    /// Members replaced during composition, in merge order
    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }

    pub fn is_sealed(&self) -> bool {
        self.members.read().sealed
    }

    pub(crate) fn seal(&self) {
        self.members.write().sealed = true;
    }

    /// Add or replace a member.
    ///
    /// Replacing an existing key is always allowed; adding a new key fails
    /// once the class is sealed.
    pub fn define_member(&self, key: &str, mut member: Member) -> Result<(), ClassError> {
        let mut table = self.members.write();
        if table.sealed && !table.entries.contains_key(key) {
            return Err(ClassError::Sealed {
                class: self.name.clone(),
                key: key.to_string(),
                action: "add",
            });
        }

        if member.is_invocable() {
            member.set_label(format!("{}.{}", self.name, key));
        }
        member.settle_visibility(key);
        table.entries.insert(
            key.to_string(),
            Slot {
                member,
                origin: self.name.clone(),
            },
        );
        Ok(())
    }

    /// Remove a member; fails once the class is sealed
    pub fn remove_member(&self, key: &str) -> Result<Option<Member>, ClassError> {
        let mut table = self.members.write();
        if table.sealed {
            return Err(ClassError::Sealed {
                class: self.name.clone(),
                key: key.to_string(),
                action: "remove",
            });
        }
        Ok(table.entries.remove(key).map(|slot| slot.member))
    }

    /// Create an instance and run the constructor on it
    pub fn instantiate(self: &Arc<Self>, args: &[Value]) -> anyhow::Result<Instance> {
        let mut instance = Instance::new(self.clone());
        let ctor = self.ctor.clone();
        ctor(&mut instance, args)?;
        Ok(instance)
    }

    /// Serializable summary for reporting
    pub fn summary(&self) -> ClassSummary {
        let members = self
            .slots()
            .into_iter()
            .map(|(key, slot)| MemberSummary {
                kind: if slot.member.is_invocable() {
                    "method"
                } else {
                    "data"
                },
                visibility: slot.member.visibility_for(&key),
                origin: slot.origin,
                label: slot.member.label().map(str::to_string),
                key,
            })
            .collect();

        ClassSummary {
            name: self.name.clone(),
            sealed: self.is_sealed(),
            includes: self.includes.iter().map(|c| c.name.clone()).collect(),
            members,
            events: self.events.keys().cloned().collect(),
            overrides: self.overrides.clone(),
        }
    }
}

impl fmt::Display for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[class {}]", self.name)
    }
}

impl fmt::Debug for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassDef")
            .field("name", &self.name)
            .field("members", &self.member_keys())
            .field("events", &self.events.keys().collect::<Vec<_>>())
            .field(
                "includes",
                &self.includes.iter().map(|c| c.name()).collect::<Vec<_>>(),
            )
            .field("sealed", &self.is_sealed())
            .finish()
    }
}

/// Copy the members of `classes` onto `target` without any checks.
///
/// Later classes overwrite earlier ones, and any key already in `target` is
/// replaced. Visibility, sealing and conflict rules do not apply.
pub fn mixin_members(classes: &[Arc<ClassDef>], target: &mut HashMap<String, Member>) {
    for class in classes {
        for (key, member) in class.members() {
            target.insert(key, member);
        }
    }
}
