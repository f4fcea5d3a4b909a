//! # Page Capability Surface
//!
//! This module defines the object graph the coordinators work against. The
//! graph is owned by the host forms runtime; formext only ever sees it through
//! these traits.
//!
//! ```text
//! Page
//!  ├── attributes ── Attribute ──(0..n)──> Control
//!  ├── controls  ─── Control ──parent──> Section ──parent──> Tab
//!  └── tabs ──────── Tab ──> Section ──> Control
//! ```
//!
//! ## Handles
//!
//! Every node is handed out as an `Rc<dyn Trait>` handle ([`AttributeRef`],
//! [`ControlRef`], ...). All methods take `&self`: implementations are expected
//! to use interior mutability, since the whole graph lives on the single UI
//! thread.
//!
//! ## Change Handlers
//!
//! [`ChangeHandler`]s are plain `Rc<dyn Fn>` listeners. An attribute invokes
//! them synchronously, in registration order, from `fire_on_change`. Writing a
//! value through `Attribute::set_value` must *not* invoke them; deciding
//! whether a write is a change is the coordinator's job.
//!
//! Removal is by identity (`Rc::ptr_eq`), so keep the `Rc` you registered.
//!
//! ## Implementations
//!
//! - [`memory::MemoryPage`]: in-memory host for tests and headless callers.

use crate::model::{AttributeType, AttributeValue, OptionSetValue, RequiredLevel, SubmitMode};
use std::rc::Rc;

pub mod memory;

pub type AttributeRef = Rc<dyn Attribute>;
pub type ControlRef = Rc<dyn Control>;
pub type SectionRef = Rc<dyn Section>;
pub type TabRef = Rc<dyn Tab>;

/// Payload passed to change handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub attribute: String,
}

pub type ChangeHandler = Rc<dyn Fn(&ChangeEvent)>;

/// Wraps a closure into a [`ChangeHandler`].
pub fn handler(f: impl Fn(&ChangeEvent) + 'static) -> ChangeHandler {
    Rc::new(f)
}

/// Root of the form object graph.
pub trait Page {
    fn attribute(&self, name: &str) -> Option<AttributeRef>;

    fn control(&self, name: &str) -> Option<ControlRef>;

    /// All attributes, in form order.
    fn attributes(&self) -> Vec<AttributeRef>;

    /// All controls, in form order.
    fn controls(&self) -> Vec<ControlRef>;

    fn tabs(&self) -> Vec<TabRef>;

    /// Attributes accepted by `predicate` (item, index).
    fn filter_attributes(
        &self,
        predicate: &dyn Fn(&dyn Attribute, usize) -> bool,
    ) -> Vec<AttributeRef> {
        self.attributes()
            .into_iter()
            .enumerate()
            .filter(|(i, a)| predicate(&**a, *i))
            .map(|(_, a)| a)
            .collect()
    }

    /// Controls accepted by `predicate` (item, index).
    fn filter_controls(&self, predicate: &dyn Fn(&dyn Control, usize) -> bool) -> Vec<ControlRef> {
        self.controls()
            .into_iter()
            .enumerate()
            .filter(|(i, c)| predicate(&**c, *i))
            .map(|(_, c)| c)
            .collect()
    }
}

/// A named data field, independent of how it is displayed.
pub trait Attribute {
    fn name(&self) -> String;

    fn attribute_type(&self) -> AttributeType;

    fn value(&self) -> AttributeValue;

    /// Writes the value without notifying change handlers.
    fn set_value(&self, value: AttributeValue);

    fn required_level(&self) -> RequiredLevel;

    fn set_required_level(&self, level: RequiredLevel);

    fn submit_mode(&self) -> SubmitMode;

    fn set_submit_mode(&self, mode: SubmitMode);

    fn add_on_change(&self, handler: ChangeHandler);

    fn remove_on_change(&self, handler: &ChangeHandler);

    /// Invokes every registered handler, in registration order.
    fn fire_on_change(&self);

    /// Bound controls, in form order.
    fn controls(&self) -> Vec<ControlRef>;

    /// Options of an option-set attribute; empty for other types.
    fn options(&self) -> Vec<OptionSetValue>;

    /// Label of the selected option, if any.
    fn text(&self) -> Option<String>;
}

/// A widget on the form, bound to zero or one attribute.
pub trait Control {
    fn name(&self) -> String;

    fn visible(&self) -> bool;

    fn set_visible(&self, visible: bool);

    fn disabled(&self) -> bool;

    fn set_disabled(&self, disabled: bool);

    fn label(&self) -> String;

    fn set_label(&self, label: &str);

    fn parent(&self) -> Option<SectionRef>;

    /// The bound attribute. Custom components may have none.
    fn attribute(&self) -> Option<AttributeRef>;

    fn set_focus(&self);

    fn set_notification(&self, message: &str, unique_id: &str) -> bool;

    fn clear_notification(&self, unique_id: &str) -> bool;
}

pub trait Section {
    fn name(&self) -> String;

    fn visible(&self) -> bool;

    fn set_visible(&self, visible: bool);

    fn label(&self) -> String;

    fn controls(&self) -> Vec<ControlRef>;

    fn parent(&self) -> Option<TabRef>;
}

pub trait Tab {
    fn name(&self) -> String;

    fn visible(&self) -> bool;

    fn set_visible(&self, visible: bool);

    fn sections(&self) -> Vec<SectionRef>;
}
