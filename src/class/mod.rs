//! Class system - declarations composed from members, mixins and interfaces

mod declaration;
mod def;
mod error;
mod instance;
mod member;
mod resolver;

pub use declaration::{Declaration, Include};
pub use def::{mixin_members, ClassDef, ClassSummary, EventTable, MemberSummary, Override};
pub use error::{ClassError, ErrorKind};
pub use instance::{Instance, Properties};
pub use member::{Member, MemberKind, MethodFn, Visibility, PRIVATE_PREFIX};
