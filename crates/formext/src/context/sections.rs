use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::{debug, error};

use super::attributes::AttributeOps;
use super::display::Formatter;
use crate::error::{FormError, Result};
use crate::model::AttributeType;
use crate::page::{handler, SectionRef};
use crate::resolver::NameResolver;

/// Shows the sections whose label matches an attribute's selected value.
///
/// For lookups the last shown label is remembered per attribute so that it
/// can be hidden again when the selection moves on. Option sets need no
/// memory: every option's section is hidden before the selected one is shown.
#[derive(Clone)]
pub struct SectionSync {
    resolver: NameResolver,
    attributes: AttributeOps,
    display: Formatter,
    shown_labels: Rc<RefCell<HashMap<String, String>>>,
}

impl SectionSync {
    pub fn new(resolver: NameResolver, attributes: AttributeOps, display: Formatter) -> Self {
        Self {
            resolver,
            attributes,
            display,
            shown_labels: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Every section of every tab, in form order.
    pub fn sections(&self) -> Vec<SectionRef> {
        self.resolver
            .tabs()
            .iter()
            .flat_map(|tab| tab.sections())
            .collect()
    }

    /// Keeps section visibility in step with the selected value of `name`,
    /// starting now.
    ///
    /// Only lookup and option-set attributes are supported.
    pub fn sync_section_visibility_to_selected_value(&self, name: &str) -> Result<()> {
        let Some(attribute) = self.resolver.attribute(name)? else {
            return Ok(());
        };
        let sync = self.clone();
        let owned = name.to_string();
        match attribute.attribute_type() {
            AttributeType::Lookup => {
                let current = self.display.get_display_value(name)?;
                self.shown_labels
                    .borrow_mut()
                    .insert(name.to_string(), current);
                self.attributes.add_on_change(
                    name,
                    handler(move |_| {
                        if let Err(err) = sync.show_selected_lookup_sections(&owned) {
                            error!(attribute = %owned, error = %err, "section sync failed");
                        }
                    }),
                )?;
                self.show_selected_lookup_sections(name)
            }
            AttributeType::OptionSet => {
                self.attributes.add_on_change(
                    name,
                    handler(move |_| {
                        if let Err(err) = sync.show_selected_option_sections(&owned) {
                            error!(attribute = %owned, error = %err, "section sync failed");
                        }
                    }),
                )?;
                self.show_selected_option_sections(name)
            }
            other => {
                error!(attribute = name, attribute_type = %other, "section sync not supported");
                Err(FormError::UnsupportedSyncType {
                    attribute: name.to_string(),
                    attribute_type: other,
                })
            }
        }
    }

    fn show_selected_lookup_sections(&self, name: &str) -> Result<()> {
        let previous = self.shown_labels.borrow().get(name).cloned();
        if let Some(previous) = previous.filter(|label| !label.is_empty()) {
            self.set_sections_visible(&previous, false);
        }
        let text = self.display.get_display_value(name)?;
        if !text.is_empty() {
            self.set_sections_visible(&text, true);
        }
        self.shown_labels.borrow_mut().insert(name.to_string(), text);
        Ok(())
    }

    fn show_selected_option_sections(&self, name: &str) -> Result<()> {
        let Some(attribute) = self.resolver.find_attribute(name) else {
            return Ok(());
        };
        for option in attribute.options() {
            self.set_sections_visible(&option.text, false);
        }
        let text = self.display.get_display_value(name)?;
        if !text.is_empty() {
            self.set_sections_visible(&text, true);
        }
        Ok(())
    }

    /// Sets every section labelled exactly `label`.
    pub fn set_sections_visible(&self, label: &str, visible: bool) {
        let matching: Vec<SectionRef> = self
            .sections()
            .into_iter()
            .filter(|s| s.label() == label)
            .collect();
        debug!(label, visible, count = matching.len(), "setting section visibility");
        for section in matching {
            section.set_visible(visible);
        }
    }

    /// Sets every tab, section and section control.
    pub fn set_all_visible(&self, visible: bool) {
        for tab in self.resolver.tabs() {
            tab.set_visible(visible);
            for section in tab.sections() {
                section.set_visible(visible);
                for control in section.controls() {
                    control.set_visible(visible);
                }
            }
        }
    }
}
