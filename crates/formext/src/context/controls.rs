use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;
use tracing::{debug, warn};

use super::attributes::AttributeOps;
use crate::config::FormConfig;
use crate::error::Result;
use crate::page::ControlRef;
use crate::resolver::{check_name, NameResolver};

/// Options for [`ControlOps::set_visible_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetVisibleOptions {
    /// `Some(true)`: required follows visible.
    /// `Some(false)`: required is left alone.
    /// `None`: hiding clears required and remembers it, showing restores it.
    pub set_required: Option<bool>,
    /// `Some(true)`: parent section and tab get the same visibility.
    /// `Some(false)`: ancestors are left alone.
    /// `None`: ancestors are shown along with the control, never hidden.
    pub set_hierarchy_visibility: Option<bool>,
}

/// Control operations keyed by attribute or control name.
///
/// A name addresses every control bound to the attribute of that name, or
/// the single control of that name when there is no such attribute.
#[derive(Clone)]
pub struct ControlOps {
    resolver: NameResolver,
    attributes: AttributeOps,
    config: Rc<FormConfig>,
    /// Attributes whose required flag was cleared because they were hidden.
    unrequired_on_hide: Rc<RefCell<HashSet<String>>>,
}

impl ControlOps {
    pub fn new(resolver: NameResolver, attributes: AttributeOps, config: Rc<FormConfig>) -> Self {
        Self {
            resolver,
            attributes,
            config,
            unrequired_on_hide: Rc::new(RefCell::new(HashSet::new())),
        }
    }

    /// Every control `name` addresses, in form order.
    pub fn matching_controls(&self, name: &str) -> Result<Vec<ControlRef>> {
        check_name(name, "control")?;
        if let Some(attribute) = self.resolver.find_attribute(name) {
            return Ok(attribute.controls());
        }
        Ok(self.resolver.control(name)?.into_iter().collect())
    }

    /// Whether any addressed control is visible, counting its section and tab.
    pub fn get_visible(&self, name: &str) -> Result<bool> {
        self.get_visible_with(name, true)
    }

    pub fn get_visible_with(&self, name: &str, include_hierarchy: bool) -> Result<bool> {
        Ok(self.matching_controls(name)?.iter().any(|control| {
            control.visible() && (!include_hierarchy || ancestors_visible(control))
        }))
    }

    /// Shows or hides with the default options.
    pub fn set_visible(&self, name: &str, visible: bool) -> Result<()> {
        self.set_visible_with(name, visible, SetVisibleOptions::default())
    }

    pub fn set_visible_with(
        &self,
        name: &str,
        visible: bool,
        options: SetVisibleOptions,
    ) -> Result<()> {
        let controls = self.matching_controls(name)?;
        let propagate = options.set_hierarchy_visibility.unwrap_or(visible);

        // Controls sharing an attribute must not each run the required
        // transition, or the second hide would forget what the first saw.
        let mut attribute_names: Vec<String> = Vec::new();
        for control in &controls {
            control.set_visible(visible);
            if propagate {
                if let Some(section) = control.parent() {
                    section.set_visible(visible);
                    if let Some(tab) = section.parent() {
                        tab.set_visible(visible);
                    }
                }
            }
            let attribute_name = control
                .attribute()
                .map(|a| a.name())
                .unwrap_or_else(|| name.to_string());
            if !attribute_names.contains(&attribute_name) {
                attribute_names.push(attribute_name);
            }
        }

        if options.set_required == Some(false) {
            return Ok(());
        }
        for attribute_name in attribute_names {
            self.update_required_on_visible(&attribute_name, visible, options.set_required)?;
        }
        Ok(())
    }

    fn update_required_on_visible(
        &self,
        attribute: &str,
        visible: bool,
        set_required: Option<bool>,
    ) -> Result<()> {
        if set_required == Some(true) {
            return self.attributes.set_required(attribute, visible);
        }

        if visible {
            let remembered = self.unrequired_on_hide.borrow_mut().remove(attribute);
            if remembered {
                debug!(attribute, "restoring required on show");
                self.attributes.set_required(attribute, true)?;
            }
        } else if self.attributes.get_required(attribute)? {
            debug!(attribute, "clearing required on hide");
            self.unrequired_on_hide
                .borrow_mut()
                .insert(attribute.to_string());
            self.attributes.set_required(attribute, false)?;
        }
        Ok(())
    }

    /// Whether `attribute` is waiting to have required restored when shown.
    pub fn is_unrequired_on_hide(&self, attribute: &str) -> bool {
        self.unrequired_on_hide.borrow().contains(attribute)
    }

    /// True only when at least one control is addressed and all are disabled.
    pub fn get_disabled(&self, name: &str) -> Result<bool> {
        let controls = self.matching_controls(name)?;
        Ok(!controls.is_empty() && controls.iter().all(|c| c.disabled()))
    }

    pub fn set_disabled(&self, name: &str, disabled: bool) -> Result<()> {
        for control in self.matching_controls(name)? {
            control.set_disabled(disabled);
        }
        Ok(())
    }

    /// Label of the control named exactly `name`, else of the last addressed
    /// control, else empty.
    pub fn get_label(&self, name: &str) -> Result<String> {
        let mut own = None;
        let mut last = None;
        for control in self.matching_controls(name)? {
            let label = control.label();
            if control.name() == name {
                own = Some(label.clone());
            }
            last = Some(label);
        }
        Ok(own.or(last).unwrap_or_default())
    }

    pub fn set_label(&self, name: &str, label: &str) -> Result<()> {
        for control in self.matching_controls(name)? {
            control.set_label(label);
        }
        Ok(())
    }

    /// Focuses the control named `name`, else the first control of the
    /// attribute named `name`.
    pub fn set_focus(&self, name: &str) -> Result<()> {
        check_name(name, "control")?;
        if let Some(control) = self.resolver.find_control(name) {
            control.set_focus();
            return Ok(());
        }
        if let Some(attribute) = self.resolver.find_attribute(name) {
            if let Some(control) = attribute.controls().first() {
                control.set_focus();
            }
            return Ok(());
        }
        warn!(control = name, "no attribute or control to focus");
        Ok(())
    }

    /// Shows `message` on every addressed control. `unique_id` defaults to the
    /// configured prefix plus `name`.
    ///
    /// Returns true only if a control was addressed and every call succeeded.
    pub fn set_notification(
        &self,
        name: &str,
        message: &str,
        unique_id: Option<&str>,
    ) -> Result<bool> {
        let id = self.notification_id(name, unique_id);
        self.all_succeed(name, |control| control.set_notification(message, &id))
    }

    pub fn clear_notification(&self, name: &str, unique_id: Option<&str>) -> Result<bool> {
        let id = self.notification_id(name, unique_id);
        self.all_succeed(name, |control| control.clear_notification(&id))
    }

    fn notification_id(&self, name: &str, unique_id: Option<&str>) -> String {
        match unique_id {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => self.config.notification_id(name),
        }
    }

    // Every control is called, even after a failure.
    fn all_succeed(&self, name: &str, call: impl Fn(&ControlRef) -> bool) -> Result<bool> {
        let controls = self.matching_controls(name)?;
        let mut success = true;
        for control in &controls {
            success = call(control) && success;
        }
        Ok(!controls.is_empty() && success)
    }
}

fn ancestors_visible(control: &ControlRef) -> bool {
    match control.parent() {
        None => true,
        Some(section) => {
            section.visible() && section.parent().map_or(true, |tab| tab.visible())
        }
    }
}
