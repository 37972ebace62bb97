//! Mixin composition - turns a [`Declaration`] into a registered [`ClassDef`]
//!
//! Declaration runs validate-then-commit. In strict mode every check below
//! completes before anything is merged or registered, so a failed
//! declaration never leaves a partial class in the registry:
//!
//! 1. Name grammar, include resolution
//! 2. Member and event conflicts across the direct includes
//! 3. Merge: includes in order, then flattened ancestors (vacant keys only),
//!    then local members on top
//! 4. Interface conformance of the assembled class
//! 5. Registration, statics, sealing
//!
//! Lenient mode skips steps 1, 2, 4 and sealing.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use super::def::Slot;
use super::{ClassDef, ClassError, Declaration, EventTable, Include, Instance, Member, MethodFn};
use super::{Override, Visibility};
use crate::interface::Conformance;
use crate::namespace::{is_class_name, Registry};

impl Registry {
    /// Declare a class under `name`, composing its includes.
    pub fn declare_class(
        &mut self,
        name: &str,
        declaration: Declaration,
    ) -> Result<Arc<ClassDef>, ClassError> {
        let strict = self.is_strict();
        let Declaration {
            ctor,
            members,
            events,
            includes,
            implements,
            statics,
        } = declaration;

        if strict && !is_class_name(name) {
            return Err(ClassError::InvalidName(name.to_string()));
        }

        let direct = self.resolve_includes(name, includes, strict)?;

        if strict {
            check_mixin_member_conflicts(name, &direct, &members)?;
            check_mixin_event_conflicts(name, &direct, &events)?;
        }

        let flattened = flatten_includes(&direct);
        let (entries, overrides) = merge_members(name, &flattened, direct.len(), members);
        let events = merge_events(&flattened, events);

        let class = Arc::new(ClassDef::assemble(
            name,
            ctor.unwrap_or_else(noop_ctor),
            entries,
            events,
            flattened,
            overrides,
        ));

        if strict {
            check_interfaces(&class, &implements)?;
        }

        self.assign(name, class.clone());

        if !statics.is_empty() {
            let statics = statics.into_iter().map(|(key, mut member)| {
                if member.is_invocable() {
                    member.set_label(format!("{}.{}", name, key));
                }
                (key, member)
            });
            self.add_statics(name, statics)?;
        }

        if strict {
            class.seal();
        }

        info!(
            class = name,
            members = class.member_keys().len(),
            includes = class.includes().len(),
            sealed = class.is_sealed(),
            "declared class"
        );
        Ok(class)
    }

    /// Turn include references into registered class descriptors
    fn resolve_includes(
        &self,
        name: &str,
        includes: Vec<Include>,
        strict: bool,
    ) -> Result<Vec<Arc<ClassDef>>, ClassError> {
        includes
            .into_iter()
            .map(|include| match include {
                Include::Path(path) => match self.resolve_entry(&path) {
                    Some(entry) => entry.as_class().cloned().ok_or_else(|| {
                        ClassError::InvalidInclude {
                            class: name.to_string(),
                            entry: format!("'{}' {}", path, entry.describe()),
                        }
                    }),
                    None => Err(ClassError::InvalidInclude {
                        class: name.to_string(),
                        entry: format!("'{}'", path),
                    }),
                },
                Include::Class(class) => {
                    let registered = self
                        .class_by_name(class.name())
                        .is_some_and(|found| Arc::ptr_eq(&found, &class));
                    if strict && !registered {
                        return Err(ClassError::InvalidInclude {
                            class: name.to_string(),
                            entry: format!("{} (not registered)", class),
                        });
                    }
                    Ok(class)
                }
            })
            .collect()
    }
}

fn noop_ctor() -> MethodFn {
    Arc::new(|_: &mut Instance, _: &[Value]| Ok(Value::Null))
}

/// Reject unsafe member overlaps between includes and the local members.
///
/// Private members can be neither shadowed locally nor contributed twice.
/// A public member contributed twice needs a local method of the same name
/// to disambiguate.
fn check_mixin_member_conflicts(
    name: &str,
    includes: &[Arc<ClassDef>],
    members: &HashMap<String, Member>,
) -> Result<(), ClassError> {
    let mut contributed: HashMap<String, (&str, Visibility)> = HashMap::new();

    for included in includes {
        for (key, member) in included.members() {
            let local = members.get(&key);
            let visibility = member.visibility_for(&key);
            let private = visibility.is_private()
                || local.is_some_and(|l| l.visibility_for(&key).is_private());

            if local.is_some() && private {
                return Err(ClassError::PrivateOverride {
                    class: name.to_string(),
                    included: included.name().to_string(),
                    key,
                });
            }

            if let Some((previous, previous_visibility)) = contributed.get(&key) {
                if private || previous_visibility.is_private() {
                    return Err(ClassError::PrivateMemberConflict {
                        class: name.to_string(),
                        included: included.name().to_string(),
                        previous: previous.to_string(),
                        key,
                    });
                }

                if !local.is_some_and(Member::is_invocable) {
                    return Err(ClassError::MemberConflict {
                        class: name.to_string(),
                        included: included.name().to_string(),
                        previous: previous.to_string(),
                        key,
                    });
                }

                debug!(class = name, key = key.as_str(), "member conflict resolved by local override");
            }

            contributed.insert(key, (included.name(), visibility));
        }
    }

    Ok(())
}

/// Reject events claimed by more than one include, or redeclared locally
fn check_mixin_event_conflicts(
    name: &str,
    includes: &[Arc<ClassDef>],
    events: &EventTable,
) -> Result<(), ClassError> {
    let mut claimed: HashMap<&str, &str> = HashMap::new();

    for included in includes {
        for event in included.events().keys() {
            if let Some(previous) = claimed.get(event.as_str()) {
                return Err(ClassError::EventConflict {
                    class: name.to_string(),
                    included: included.name().to_string(),
                    previous: previous.to_string(),
                    event: event.clone(),
                });
            }

            if events.contains_key(event) {
                return Err(ClassError::LocalEventConflict {
                    class: name.to_string(),
                    included: included.name().to_string(),
                    event: event.clone(),
                });
            }

            claimed.insert(event, included.name());
        }
    }

    Ok(())
}

/// Append each direct include's own includes after the direct list
fn flatten_includes(direct: &[Arc<ClassDef>]) -> Vec<Arc<ClassDef>> {
    let mut flattened = direct.to_vec();

    for included in direct {
        for ancestor in included.includes() {
            if !flattened.iter().any(|c| Arc::ptr_eq(c, ancestor)) {
                flattened.push(ancestor.clone());
            }
        }
    }

    flattened
}

/// Build the member table: direct includes overwrite in order, appended
/// ancestors only fill vacant keys, local members always win.
fn merge_members(
    name: &str,
    flattened: &[Arc<ClassDef>],
    direct_len: usize,
    members: HashMap<String, Member>,
) -> (HashMap<String, Slot>, Vec<Override>) {
    let mut entries: HashMap<String, Slot> = HashMap::new();
    let mut overrides = Vec::new();

    for (index, included) in flattened.iter().enumerate() {
        let ancestor = index >= direct_len;

        for (key, slot) in included.slots() {
            if let Some(existing) = entries.get(&key) {
                if ancestor {
                    continue;
                }
                if existing.origin != slot.origin {
                    debug!(class = name, key = key.as_str(), replaced = existing.origin.as_str(), by = slot.origin.as_str(), "member overridden by include");
                    overrides.push(Override {
                        key: key.clone(),
                        replaced: existing.origin.clone(),
                        by: slot.origin.clone(),
                    });
                }
            }
            entries.insert(key, slot);
        }
    }

    let mut local: Vec<_> = members.into_iter().collect();
    local.sort_by(|a, b| a.0.cmp(&b.0));

    for (key, mut member) in local {
        if member.is_invocable() {
            member.set_label(format!("{}.{}", name, key));
        }
        member.settle_visibility(&key);

        if let Some(existing) = entries.get(&key) {
            debug!(class = name, key = key.as_str(), replaced = existing.origin.as_str(), "member overridden locally");
            overrides.push(Override {
                key: key.clone(),
                replaced: existing.origin.clone(),
                by: name.to_string(),
            });
        }

        entries.insert(
            key,
            Slot {
                member,
                origin: name.to_string(),
            },
        );
    }

    (entries, overrides)
}

/// Union of included events and the local ones
fn merge_events(flattened: &[Arc<ClassDef>], local: EventTable) -> EventTable {
    let mut events = EventTable::new();
    for included in flattened {
        for (event, marker) in included.events() {
            events
                .entry(event.clone())
                .or_insert_with(|| marker.clone());
        }
    }
    events.extend(local);
    events
}

/// Check the assembled class against each declared interface
fn check_interfaces(
    class: &ClassDef,
    implements: &[Option<Arc<dyn Conformance>>],
) -> Result<(), ClassError> {
    for (position, iface) in implements.iter().enumerate() {
        let Some(iface) = iface else {
            return Err(ClassError::InvalidInterface {
                class: class.name().to_string(),
                position,
            });
        };

        iface
            .check(class)
            .map_err(|source| ClassError::InterfaceMismatch {
                class: class.name().to_string(),
                interface: iface.name().to_string(),
                source,
            })?;
    }

    Ok(())
}
