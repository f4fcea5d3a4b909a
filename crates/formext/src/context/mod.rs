//! # Coordinators
//!
//! The operations form scripts call, grouped by what they coordinate. Each
//! coordinator is a small cloneable value that resolves names through a shared
//! [`NameResolver`](crate::resolver::NameResolver); clones share any state the
//! coordinator keeps.
//!
//! - [`attributes::AttributeOps`]: values, required level, submit mode and
//!   change subscriptions, keyed by attribute name.
//! - [`controls::ControlOps`]: fans every call out to all controls bound to a
//!   name and reconciles their answers; owns the hide/show required memory.
//! - [`display::Formatter`]: display text and template-composed values.
//! - [`sections::SectionSync`]: section visibility driven by a selected value.
//!
//! None of them hold a `RefCell` borrow while calling into the page, so change
//! handlers are free to call back in.

pub mod attributes;
pub mod controls;
pub mod display;
pub mod sections;

pub use attributes::AttributeOps;
pub use controls::{ControlOps, SetVisibleOptions};
pub use display::Formatter;
pub use sections::SectionSync;
