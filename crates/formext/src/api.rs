//! # API Facade
//!
//! [`FormApi`] is a **thin facade** over the coordinators in [`crate::context`].
//! It is the one object a form script holds on to.
//!
//! ## Role and Responsibilities
//!
//! The facade:
//! - **Wires** the coordinators to one page, one config and one resolver
//! - **Dispatches** every call to the coordinator that owns it
//! - **Returns structured types** (`Result<T>`)
//!
//! ## What the Facade Does NOT Do
//!
//! - **Coordination logic**: That belongs in `context/*.rs`
//! - **Own the page**: It holds the page weakly; the host runtime owns it
//! - **Raise dialogs**: Errors are returned, misses are logged
//!
//! ## Cloning
//!
//! `FormApi` is cheap to clone. Clones share the section-sync memory and the
//! hide/show required memory, so a clone captured in a change handler sees
//! the same state as the facade it was cloned from.
//!
//! ## Testing Strategy
//!
//! Facade tests check wiring and shared state only. Behaviour is tested next
//! to each coordinator.

use std::rc::Rc;

use crate::config::FormConfig;
use crate::context::{AttributeOps, ControlOps, Formatter, SectionSync, SetVisibleOptions};
use crate::error::Result;
use crate::model::{AttributeValue, SubmitMode, SubmitModeArg, ValueInput};
use crate::page::{Attribute, AttributeRef, ChangeHandler, Control, ControlRef, Page, SectionRef};
use crate::resolver::{NameResolver, Names};

#[derive(Clone)]
pub struct FormApi {
    resolver: NameResolver,
    config: Rc<FormConfig>,
    attributes: AttributeOps,
    controls: ControlOps,
    display: Formatter,
    sections: SectionSync,
}

impl FormApi {
    pub fn new<P: Page + 'static>(page: &Rc<P>) -> Self {
        Self::with_config(page, FormConfig::default())
    }

    pub fn with_config<P: Page + 'static>(page: &Rc<P>, config: FormConfig) -> Self {
        let page: Rc<dyn Page> = page.clone();
        let resolver = NameResolver::new(Rc::downgrade(&page));
        let config = Rc::new(config);
        let attributes = AttributeOps::new(resolver.clone());
        let controls = ControlOps::new(resolver.clone(), attributes.clone(), config.clone());
        let display = Formatter::new(resolver.clone(), attributes.clone(), config.clone());
        let sections = SectionSync::new(resolver.clone(), attributes.clone(), display.clone());
        Self {
            resolver,
            config,
            attributes,
            controls,
            display,
            sections,
        }
    }

    /// The page, if the host still holds it.
    pub fn page(&self) -> Option<Rc<dyn Page>> {
        self.resolver.page()
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    // --- Components ---

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    pub fn attributes(&self) -> &AttributeOps {
        &self.attributes
    }

    pub fn controls(&self) -> &ControlOps {
        &self.controls
    }

    pub fn display(&self) -> &Formatter {
        &self.display
    }

    pub fn section_sync(&self) -> &SectionSync {
        &self.sections
    }

    // --- Resolution ---

    pub fn get_attribute(&self, name: &str) -> Result<Option<AttributeRef>> {
        self.resolver.attribute(name)
    }

    pub fn get_control(&self, name: &str) -> Result<Option<ControlRef>> {
        self.resolver.control(name)
    }

    pub fn attributes_where(
        &self,
        predicate: impl Fn(&dyn Attribute, usize) -> bool,
    ) -> Vec<AttributeRef> {
        self.resolver.attributes_where(predicate)
    }

    pub fn controls_where(
        &self,
        predicate: impl Fn(&dyn Control, usize) -> bool,
    ) -> Vec<ControlRef> {
        self.resolver.controls_where(predicate)
    }

    // --- Attributes ---

    pub fn get_value(&self, name: &str) -> Result<AttributeValue> {
        self.attributes.get_value(name)
    }

    pub fn set_value(&self, name: &str, value: impl Into<ValueInput>) -> Result<()> {
        self.attributes.set_value(name, value)
    }

    pub fn set_value_with(
        &self,
        name: &str,
        value: impl Into<ValueInput>,
        fire_on_change: bool,
    ) -> Result<()> {
        self.attributes.set_value_with(name, value, fire_on_change)
    }

    pub fn add_on_change(&self, names: impl Names, handler: ChangeHandler) -> Result<()> {
        self.attributes.add_on_change(names, handler)
    }

    pub fn remove_on_change(&self, names: impl Names, handler: &ChangeHandler) -> Result<()> {
        self.attributes.remove_on_change(names, handler)
    }

    pub fn fire_on_change(&self, name: &str) -> Result<()> {
        self.attributes.fire_on_change(name)
    }

    pub fn get_required(&self, name: &str) -> Result<bool> {
        self.attributes.get_required(name)
    }

    pub fn set_required(&self, names: impl Names, required: bool) -> Result<()> {
        self.attributes.set_required(names, required)
    }

    pub fn get_submit_mode(&self, name: &str) -> Result<SubmitMode> {
        self.attributes.get_submit_mode(name)
    }

    pub fn set_submit_mode(&self, names: impl Names, mode: impl Into<SubmitModeArg>) -> Result<()> {
        self.attributes.set_submit_mode(names, mode)
    }

    // --- Controls ---

    pub fn get_visible(&self, name: &str) -> Result<bool> {
        self.controls.get_visible(name)
    }

    pub fn get_visible_with(&self, name: &str, include_hierarchy: bool) -> Result<bool> {
        self.controls.get_visible_with(name, include_hierarchy)
    }

    pub fn set_visible(&self, name: &str, visible: bool) -> Result<()> {
        self.controls.set_visible(name, visible)
    }

    pub fn set_visible_with(
        &self,
        name: &str,
        visible: bool,
        options: SetVisibleOptions,
    ) -> Result<()> {
        self.controls.set_visible_with(name, visible, options)
    }

    pub fn get_disabled(&self, name: &str) -> Result<bool> {
        self.controls.get_disabled(name)
    }

    pub fn set_disabled(&self, name: &str, disabled: bool) -> Result<()> {
        self.controls.set_disabled(name, disabled)
    }

    pub fn get_label(&self, name: &str) -> Result<String> {
        self.controls.get_label(name)
    }

    pub fn set_label(&self, name: &str, label: &str) -> Result<()> {
        self.controls.set_label(name, label)
    }

    pub fn set_focus(&self, name: &str) -> Result<()> {
        self.controls.set_focus(name)
    }

    pub fn set_notification(
        &self,
        name: &str,
        message: &str,
        unique_id: Option<&str>,
    ) -> Result<bool> {
        self.controls.set_notification(name, message, unique_id)
    }

    pub fn clear_notification(&self, name: &str, unique_id: Option<&str>) -> Result<bool> {
        self.controls.clear_notification(name, unique_id)
    }

    // --- Display ---

    pub fn get_display_value(&self, name: &str) -> Result<String> {
        self.display.get_display_value(name)
    }

    pub fn initialize_formatted_value(
        &self,
        name: &str,
        format: &str,
        fields: impl Names,
    ) -> Result<()> {
        self.display.initialize_formatted_value(name, format, fields)
    }

    pub fn update_formatted_value(
        &self,
        name: &str,
        format: &str,
        fields: impl Names,
    ) -> Result<()> {
        self.display.update_formatted_value(name, format, fields)
    }

    // --- Sections ---

    pub fn sections(&self) -> Vec<SectionRef> {
        self.sections.sections()
    }

    pub fn sync_section_visibility_to_selected_value(&self, name: &str) -> Result<()> {
        self.sections.sync_section_visibility_to_selected_value(name)
    }

    pub fn set_sections_visible(&self, label: &str, visible: bool) {
        self.sections.set_sections_visible(label, visible)
    }

    pub fn set_all_visible(&self, visible: bool) {
        self.sections.set_all_visible(visible)
    }
}
