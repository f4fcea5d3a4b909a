use super::{
    Attribute, AttributeRef, ChangeEvent, ChangeHandler, Control, ControlRef, Page, Section,
    SectionRef, Tab, TabRef,
};
use crate::model::{AttributeType, AttributeValue, OptionSetValue, RequiredLevel, SubmitMode};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// In-memory form page.
///
/// Uses `RefCell`/`Cell` for interior mutability since the form runtime is
/// single-threaded. Parent links are `Weak`; the page owns every node.
#[derive(Default)]
pub struct MemoryPage {
    attributes: RefCell<Vec<Rc<MemoryAttribute>>>,
    controls: RefCell<Vec<Rc<MemoryControl>>>,
    tabs: RefCell<Vec<Rc<MemoryTab>>>,
}

impl MemoryPage {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn add_tab(&self, name: &str, visible: bool) -> Rc<MemoryTab> {
        let tab = Rc::new(MemoryTab {
            name: name.to_string(),
            visible: Cell::new(visible),
            sections: RefCell::new(Vec::new()),
        });
        self.tabs.borrow_mut().push(tab.clone());
        tab
    }

    pub fn add_attribute(&self, name: &str, attribute_type: AttributeType) -> Rc<MemoryAttribute> {
        let attribute = Rc::new(MemoryAttribute {
            name: name.to_string(),
            attribute_type,
            value: RefCell::new(AttributeValue::Null),
            required_level: Cell::new(RequiredLevel::None),
            submit_mode: Cell::new(SubmitMode::Dirty),
            handlers: RefCell::new(Vec::new()),
            controls: RefCell::new(Vec::new()),
            options: RefCell::new(Vec::new()),
        });
        self.attributes.borrow_mut().push(attribute.clone());
        attribute
    }

    /// Adds an option-set attribute with its options and initial selection.
    pub fn add_option_set(
        &self,
        name: &str,
        selected: Option<i32>,
        options: Vec<OptionSetValue>,
    ) -> Rc<MemoryAttribute> {
        let attribute = self.add_attribute(name, AttributeType::OptionSet);
        *attribute.options.borrow_mut() = options;
        if let Some(value) = selected {
            attribute.set_value(AttributeValue::OptionSet(value));
        }
        attribute
    }

    /// Adds a control, binding it to `attribute` and placing it in `section`
    /// when given.
    pub fn add_control(
        &self,
        name: &str,
        attribute: Option<&Rc<MemoryAttribute>>,
        section: Option<&Rc<MemorySection>>,
    ) -> Rc<MemoryControl> {
        let control = Rc::new(MemoryControl {
            name: name.to_string(),
            visible: Cell::new(true),
            disabled: Cell::new(false),
            label: RefCell::new(name.to_string()),
            attribute: RefCell::new(attribute.map(Rc::downgrade)),
            parent: RefCell::new(section.map(Rc::downgrade)),
            notifications: RefCell::new(HashMap::new()),
            notifications_succeed: Cell::new(true),
            focus_count: Cell::new(0),
        });
        if let Some(attribute) = attribute {
            attribute.controls.borrow_mut().push(control.clone());
        }
        if let Some(section) = section {
            section.controls.borrow_mut().push(control.clone());
        }
        self.controls.borrow_mut().push(control.clone());
        control
    }

    /// Adds an attribute together with one control of the same name.
    pub fn add_field(
        &self,
        name: &str,
        attribute_type: AttributeType,
        section: Option<&Rc<MemorySection>>,
    ) -> Rc<MemoryAttribute> {
        let attribute = self.add_attribute(name, attribute_type);
        self.add_control(name, Some(&attribute), section);
        attribute
    }

    pub fn memory_attribute(&self, name: &str) -> Option<Rc<MemoryAttribute>> {
        self.attributes
            .borrow()
            .iter()
            .find(|a| a.name == name)
            .cloned()
    }

    pub fn memory_control(&self, name: &str) -> Option<Rc<MemoryControl>> {
        self.controls
            .borrow()
            .iter()
            .find(|c| c.name == name)
            .cloned()
    }

    pub fn memory_tab(&self, name: &str) -> Option<Rc<MemoryTab>> {
        self.tabs.borrow().iter().find(|t| t.name == name).cloned()
    }
}

impl Page for MemoryPage {
    fn attribute(&self, name: &str) -> Option<AttributeRef> {
        self.memory_attribute(name).map(|a| a as AttributeRef)
    }

    fn control(&self, name: &str) -> Option<ControlRef> {
        self.memory_control(name).map(|c| c as ControlRef)
    }

    fn attributes(&self) -> Vec<AttributeRef> {
        self.attributes
            .borrow()
            .iter()
            .map(|a| a.clone() as AttributeRef)
            .collect()
    }

    fn controls(&self) -> Vec<ControlRef> {
        self.controls
            .borrow()
            .iter()
            .map(|c| c.clone() as ControlRef)
            .collect()
    }

    fn tabs(&self) -> Vec<TabRef> {
        self.tabs
            .borrow()
            .iter()
            .map(|t| t.clone() as TabRef)
            .collect()
    }
}

pub struct MemoryAttribute {
    name: String,
    attribute_type: AttributeType,
    value: RefCell<AttributeValue>,
    required_level: Cell<RequiredLevel>,
    submit_mode: Cell<SubmitMode>,
    handlers: RefCell<Vec<ChangeHandler>>,
    controls: RefCell<Vec<Rc<MemoryControl>>>,
    options: RefCell<Vec<OptionSetValue>>,
}

impl MemoryAttribute {
    pub fn handler_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl Attribute for MemoryAttribute {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn attribute_type(&self) -> AttributeType {
        self.attribute_type
    }

    fn value(&self) -> AttributeValue {
        self.value.borrow().clone()
    }

    fn set_value(&self, value: AttributeValue) {
        *self.value.borrow_mut() = value;
    }

    fn required_level(&self) -> RequiredLevel {
        self.required_level.get()
    }

    fn set_required_level(&self, level: RequiredLevel) {
        self.required_level.set(level);
    }

    fn submit_mode(&self) -> SubmitMode {
        self.submit_mode.get()
    }

    fn set_submit_mode(&self, mode: SubmitMode) {
        self.submit_mode.set(mode);
    }

    fn add_on_change(&self, handler: ChangeHandler) {
        self.handlers.borrow_mut().push(handler);
    }

    fn remove_on_change(&self, handler: &ChangeHandler) {
        self.handlers.borrow_mut().retain(|h| !Rc::ptr_eq(h, handler));
    }

    fn fire_on_change(&self) {
        // Handlers may write back into this attribute or register more
        // handlers, so release the borrow before calling them.
        let handlers: Vec<ChangeHandler> = self.handlers.borrow().clone();
        let event = ChangeEvent {
            attribute: self.name.clone(),
        };
        for handler in handlers {
            handler(&event);
        }
    }

    fn controls(&self) -> Vec<ControlRef> {
        self.controls
            .borrow()
            .iter()
            .map(|c| c.clone() as ControlRef)
            .collect()
    }

    fn options(&self) -> Vec<OptionSetValue> {
        self.options.borrow().clone()
    }

    fn text(&self) -> Option<String> {
        let selected = self.value.borrow().as_option()?;
        self.options
            .borrow()
            .iter()
            .find(|o| o.value == selected)
            .map(|o| o.text.clone())
    }
}

pub struct MemoryControl {
    name: String,
    visible: Cell<bool>,
    disabled: Cell<bool>,
    label: RefCell<String>,
    attribute: RefCell<Option<Weak<MemoryAttribute>>>,
    parent: RefCell<Option<Weak<MemorySection>>>,
    notifications: RefCell<HashMap<String, String>>,
    notifications_succeed: Cell<bool>,
    focus_count: Cell<usize>,
}

impl MemoryControl {
    /// Message currently shown under `unique_id`.
    pub fn notification(&self, unique_id: &str) -> Option<String> {
        self.notifications.borrow().get(unique_id).cloned()
    }

    /// Makes every later notification call report failure (or success again).
    pub fn set_notifications_succeed(&self, succeed: bool) {
        self.notifications_succeed.set(succeed);
    }

    pub fn focus_count(&self) -> usize {
        self.focus_count.get()
    }
}

impl Control for MemoryControl {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn visible(&self) -> bool {
        self.visible.get()
    }

    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn disabled(&self) -> bool {
        self.disabled.get()
    }

    fn set_disabled(&self, disabled: bool) {
        self.disabled.set(disabled);
    }

    fn label(&self) -> String {
        self.label.borrow().clone()
    }

    fn set_label(&self, label: &str) {
        *self.label.borrow_mut() = label.to_string();
    }

    fn parent(&self) -> Option<SectionRef> {
        self.parent
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|s| s as SectionRef)
    }

    fn attribute(&self) -> Option<AttributeRef> {
        self.attribute
            .borrow()
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|a| a as AttributeRef)
    }

    fn set_focus(&self) {
        self.focus_count.set(self.focus_count.get() + 1);
    }

    fn set_notification(&self, message: &str, unique_id: &str) -> bool {
        if !self.notifications_succeed.get() {
            return false;
        }
        self.notifications
            .borrow_mut()
            .insert(unique_id.to_string(), message.to_string());
        true
    }

    fn clear_notification(&self, unique_id: &str) -> bool {
        if !self.notifications_succeed.get() {
            return false;
        }
        self.notifications.borrow_mut().remove(unique_id);
        true
    }
}

pub struct MemorySection {
    name: String,
    label: String,
    visible: Cell<bool>,
    controls: RefCell<Vec<Rc<MemoryControl>>>,
    parent: Weak<MemoryTab>,
}

impl Section for MemorySection {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn visible(&self) -> bool {
        self.visible.get()
    }

    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn controls(&self) -> Vec<ControlRef> {
        self.controls
            .borrow()
            .iter()
            .map(|c| c.clone() as ControlRef)
            .collect()
    }

    fn parent(&self) -> Option<TabRef> {
        self.parent.upgrade().map(|t| t as TabRef)
    }
}

pub struct MemoryTab {
    name: String,
    visible: Cell<bool>,
    sections: RefCell<Vec<Rc<MemorySection>>>,
}

impl MemoryTab {
    pub fn add_section(
        self: &Rc<Self>,
        name: &str,
        label: &str,
        visible: bool,
    ) -> Rc<MemorySection> {
        let section = Rc::new(MemorySection {
            name: name.to_string(),
            label: label.to_string(),
            visible: Cell::new(visible),
            controls: RefCell::new(Vec::new()),
            parent: Rc::downgrade(self),
        });
        self.sections.borrow_mut().push(section.clone());
        section
    }

    pub fn memory_section(&self, name: &str) -> Option<Rc<MemorySection>> {
        self.sections
            .borrow()
            .iter()
            .find(|s| s.name == name)
            .cloned()
    }
}

impl Tab for MemoryTab {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn visible(&self) -> bool {
        self.visible.get()
    }

    fn set_visible(&self, visible: bool) {
        self.visible.set(visible);
    }

    fn sections(&self) -> Vec<SectionRef> {
        self.sections
            .borrow()
            .iter()
            .map(|s| s.clone() as SectionRef)
            .collect()
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    pub const FREIGHT_FOB: i32 = 0;
    pub const FREIGHT_NO_CHARGE: i32 = 1;

    /// A contact form with the shapes the coordinators care about:
    ///
    /// - `parentaccountid`: empty lookup, one control, no section
    /// - `address1_freighttermscode`: option set (FOB / No Charge), FOB selected
    /// - `lastname`: string with a body control and a `header_lastname` duplicate,
    ///   both in `bodySection` of `BodyTab`
    /// - `theattribute`: string whose only control is `thecontrol`, placed in
    ///   `lastNameSection` (labelled "No Charge") of `MainTab`
    pub struct ContactForm {
        pub page: Rc<MemoryPage>,
        pub main_tab: Rc<MemoryTab>,
        pub body_tab: Rc<MemoryTab>,
        pub no_charge_section: Rc<MemorySection>,
        pub body_section: Rc<MemorySection>,
    }

    impl Default for ContactForm {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ContactForm {
        pub fn new() -> Self {
            let page = MemoryPage::new();
            let main_tab = page.add_tab("MainTab", true);
            let no_charge_section = main_tab.add_section("lastNameSection", "No Charge", true);
            let body_tab = page.add_tab("BodyTab", true);
            let body_section = body_tab.add_section("bodySection", "Body", true);

            page.add_field("parentaccountid", AttributeType::Lookup, None);

            let freight = page.add_option_set(
                "address1_freighttermscode",
                Some(FREIGHT_FOB),
                vec![
                    OptionSetValue::new("FOB", FREIGHT_FOB),
                    OptionSetValue::new("No Charge", FREIGHT_NO_CHARGE),
                ],
            );
            page.add_control("address1_freighttermscode", Some(&freight), None);

            let lastname = page.add_attribute("lastname", AttributeType::String);
            page.add_control("lastname", Some(&lastname), Some(&body_section));
            page.add_control("header_lastname", Some(&lastname), Some(&body_section));

            let the_attribute = page.add_attribute("theattribute", AttributeType::String);
            page.add_control("thecontrol", Some(&the_attribute), Some(&no_charge_section));

            Self {
                page,
                main_tab,
                body_tab,
                no_charge_section,
                body_section,
            }
        }

        pub fn attribute(&self, name: &str) -> Rc<MemoryAttribute> {
            self.page
                .memory_attribute(name)
                .unwrap_or_else(|| panic!("fixture has no attribute {name}"))
        }

        pub fn control(&self, name: &str) -> Rc<MemoryControl> {
            self.page
                .memory_control(name)
                .unwrap_or_else(|| panic!("fixture has no control {name}"))
        }
    }
}
