use tracing::{debug, error};

use crate::equality::value_changed;
use crate::error::Result;
use crate::model::{
    AttributeType, AttributeValue, RequiredLevel, SubmitMode, SubmitModeArg, ValueInput,
};
use crate::page::ChangeHandler;
use crate::resolver::{NameResolver, Names};

/// Attribute operations keyed by name.
///
/// Misses are logged by the resolver and degrade to a default (`Null`,
/// `false`, `never`) or a no-op.
#[derive(Clone)]
pub struct AttributeOps {
    resolver: NameResolver,
}

impl AttributeOps {
    pub fn new(resolver: NameResolver) -> Self {
        Self { resolver }
    }

    /// Current value. Lookups come back as a single `Reference` (the first
    /// one held) or `Null`.
    pub fn get_value(&self, name: &str) -> Result<AttributeValue> {
        let Some(attribute) = self.resolver.attribute(name)? else {
            return Ok(AttributeValue::Null);
        };
        let value = attribute.value();
        if attribute.attribute_type() != AttributeType::Lookup {
            return Ok(value);
        }
        Ok(value
            .as_reference()
            .cloned()
            .map(AttributeValue::Reference)
            .unwrap_or_default())
    }

    /// Writes the value and fires change handlers if it changed.
    pub fn set_value(&self, name: &str, value: impl Into<ValueInput>) -> Result<()> {
        self.set_value_with(name, value, true)
    }

    /// Writes the value; handlers fire only when `fire_on_change` is set and
    /// the value changed.
    pub fn set_value_with(
        &self,
        name: &str,
        value: impl Into<ValueInput>,
        fire_on_change: bool,
    ) -> Result<()> {
        let Some(attribute) = self.resolver.attribute(name)? else {
            return Ok(());
        };
        let input: ValueInput = value.into();
        let attribute_type = attribute.attribute_type();
        let value = match attribute_type {
            AttributeType::Lookup => input.into_lookup_value(),
            _ => input.into_value(),
        };
        let previous = attribute.value();
        let changed = value_changed(attribute_type, &previous, &value);
        attribute.set_value(value);

        if changed && fire_on_change {
            debug!(attribute = name, "value changed, firing change handlers");
            attribute.fire_on_change();
        }
        Ok(())
    }

    pub fn add_on_change(&self, names: impl Names, handler: ChangeHandler) -> Result<()> {
        for name in names.into_names() {
            if let Some(attribute) = self.resolver.attribute(&name)? {
                attribute.add_on_change(handler.clone());
            }
        }
        Ok(())
    }

    /// Removes `handler` (matched by identity) from every named attribute.
    pub fn remove_on_change(&self, names: impl Names, handler: &ChangeHandler) -> Result<()> {
        for name in names.into_names() {
            if let Some(attribute) = self.resolver.attribute(&name)? {
                attribute.remove_on_change(handler);
            }
        }
        Ok(())
    }

    pub fn fire_on_change(&self, name: &str) -> Result<()> {
        if let Some(attribute) = self.resolver.attribute(name)? {
            attribute.fire_on_change();
        }
        Ok(())
    }

    pub fn get_required(&self, name: &str) -> Result<bool> {
        Ok(self
            .resolver
            .attribute(name)?
            .is_some_and(|a| a.required_level() == RequiredLevel::Required))
    }

    pub fn set_required(&self, names: impl Names, required: bool) -> Result<()> {
        let level = if required {
            RequiredLevel::Required
        } else {
            RequiredLevel::None
        };
        for name in names.into_names() {
            if let Some(attribute) = self.resolver.attribute(&name)? {
                attribute.set_required_level(level);
            }
        }
        Ok(())
    }

    pub fn get_submit_mode(&self, name: &str) -> Result<SubmitMode> {
        Ok(self
            .resolver
            .attribute(name)?
            .map(|a| a.submit_mode())
            .unwrap_or(SubmitMode::Never))
    }

    /// Sets the submit mode. `true`/`false` mean always/never; unrecognized
    /// text is logged and leaves every attribute untouched.
    pub fn set_submit_mode(&self, names: impl Names, mode: impl Into<SubmitModeArg>) -> Result<()> {
        let mode: SubmitModeArg = mode.into();
        let mode = match mode.resolve() {
            Ok(mode) => mode,
            Err(err) => {
                error!(error = %err, "rejected submit mode");
                return Ok(());
            }
        };
        for name in names.into_names() {
            if let Some(attribute) = self.resolver.attribute(&name)? {
                attribute.set_submit_mode(mode);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FormError;
    use crate::model::EntityReference;
    use crate::page::memory::fixtures::ContactForm;
    use crate::page::{handler, Attribute, Page};
    use std::cell::Cell;
    use std::rc::Rc;

    fn ops(form: &ContactForm) -> AttributeOps {
        let page: Rc<dyn Page> = form.page.clone();
        AttributeOps::new(NameResolver::new(Rc::downgrade(&page)))
    }

    fn counter(ops: &AttributeOps, name: &str) -> Rc<Cell<usize>> {
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        ops.add_on_change(name, handler(move |_| seen.set(seen.get() + 1)))
            .unwrap();
        calls
    }

    #[test]
    fn set_value_fires_only_on_change() {
        let form = ContactForm::new();
        let ops = ops(&form);
        let calls = counter(&ops, "lastname");

        ops.set_value("lastname", "123").unwrap();
        assert_eq!(calls.get(), 1);
        ops.set_value("lastname", "123").unwrap();
        assert_eq!(calls.get(), 1);
        ops.set_value("lastname", "abc").unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn set_value_with_can_write_silently() {
        let form = ContactForm::new();
        let ops = ops(&form);
        let calls = counter(&ops, "lastname");

        ops.set_value_with("lastname", "quiet", false).unwrap();
        assert_eq!(calls.get(), 0);
        assert_eq!(ops.get_value("lastname").unwrap(), AttributeValue::from("quiet"));
    }

    #[test]
    fn lookup_writes_compare_element_wise() {
        let form = ContactForm::new();
        let ops = ops(&form);
        let calls = counter(&ops, "parentaccountid");

        ops.set_value("parentaccountid", ValueInput::lookup("1", "account", "Acme"))
            .unwrap();
        assert_eq!(calls.get(), 1);
        ops.set_value(
            "parentaccountid",
            EntityReference::new("1", "account").with_name("Acme"),
        )
        .unwrap();
        assert_eq!(calls.get(), 1);
        ops.set_value("parentaccountid", ValueInput::lookup("2", "account", "Acme"))
            .unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn lookup_get_value_projects_first_reference() {
        let form = ContactForm::new();
        let ops = ops(&form);
        assert_eq!(ops.get_value("parentaccountid").unwrap(), AttributeValue::Null);

        ops.set_value("parentaccountid", Vec::<EntityReference>::new())
            .unwrap();
        assert_eq!(ops.get_value("parentaccountid").unwrap(), AttributeValue::Null);

        let first = EntityReference::new("1", "account").with_name("First");
        let second = EntityReference::new("2", "account").with_name("Second");
        ops.set_value("parentaccountid", vec![first.clone(), second])
            .unwrap();
        assert_eq!(
            ops.get_value("parentaccountid").unwrap(),
            AttributeValue::Reference(first)
        );
    }

    #[test]
    fn clearing_a_lookup_stores_an_empty_array() {
        let form = ContactForm::new();
        let ops = ops(&form);
        form.attribute("parentaccountid")
            .set_value(AttributeValue::Lookup(vec![]));
        let calls = counter(&ops, "parentaccountid");

        ops.set_value("parentaccountid", AttributeValue::Null)
            .unwrap();
        assert_eq!(calls.get(), 0);
        assert_eq!(
            form.attribute("parentaccountid").value(),
            AttributeValue::Lookup(vec![])
        );

        ops.set_value("parentaccountid", ValueInput::lookup("1", "account", "Acme"))
            .unwrap();
        ops.set_value("parentaccountid", AttributeValue::Null)
            .unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(
            form.attribute("parentaccountid").value(),
            AttributeValue::Lookup(vec![])
        );
    }

    #[test]
    fn non_reference_written_to_lookup_still_fires() {
        let form = ContactForm::new();
        let ops = ops(&form);
        form.attribute("parentaccountid")
            .set_value(AttributeValue::Lookup(vec![]));
        let calls = counter(&ops, "parentaccountid");

        ops.set_value("parentaccountid", "not-a-ref").unwrap();
        assert_eq!(calls.get(), 1);
        assert_eq!(
            form.attribute("parentaccountid").value(),
            AttributeValue::from("not-a-ref")
        );
        ops.set_value("parentaccountid", "not-a-ref").unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn lookup_ids_lose_braces_when_stored() {
        let form = ContactForm::new();
        let ops = ops(&form);
        ops.set_value("parentaccountid", ValueInput::lookup("{A-1}", "account", "Acme"))
            .unwrap();
        let stored = form.attribute("parentaccountid").value();
        assert_eq!(stored.as_reference().unwrap().id, "A-1");
    }

    #[test]
    fn misses_degrade_to_defaults() {
        let form = ContactForm::new();
        let ops = ops(&form);
        assert_eq!(ops.get_value("missing").unwrap(), AttributeValue::Null);
        assert!(!ops.get_required("missing").unwrap());
        assert_eq!(ops.get_submit_mode("missing").unwrap(), SubmitMode::Never);
        ops.set_value("missing", "x").unwrap();
        assert!(matches!(
            ops.get_value(""),
            Err(FormError::MissingName("attribute"))
        ));
    }

    #[test]
    fn change_handlers_fan_out_and_remove_by_identity() {
        let form = ContactForm::new();
        let ops = ops(&form);
        let calls = Rc::new(Cell::new(0));
        let seen = calls.clone();
        let h = handler(move |_| seen.set(seen.get() + 1));

        ops.add_on_change(["lastname", "theattribute"], h.clone())
            .unwrap();
        ops.fire_on_change("lastname").unwrap();
        ops.fire_on_change("theattribute").unwrap();
        assert_eq!(calls.get(), 2);

        ops.remove_on_change(["lastname", "theattribute"], &h)
            .unwrap();
        ops.fire_on_change("lastname").unwrap();
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn required_round_trip() {
        let form = ContactForm::new();
        let ops = ops(&form);
        ops.set_required(["lastname", "theattribute"], true).unwrap();
        assert!(ops.get_required("lastname").unwrap());
        assert!(ops.get_required("theattribute").unwrap());
        ops.set_required("lastname", false).unwrap();
        assert!(!ops.get_required("lastname").unwrap());
    }

    #[test]
    fn submit_mode_accepts_flags_and_text() {
        let form = ContactForm::new();
        let ops = ops(&form);
        ops.set_submit_mode("lastname", true).unwrap();
        assert_eq!(ops.get_submit_mode("lastname").unwrap(), SubmitMode::Always);
        ops.set_submit_mode("lastname", false).unwrap();
        assert_eq!(ops.get_submit_mode("lastname").unwrap(), SubmitMode::Never);
        ops.set_submit_mode("lastname", "dirty").unwrap();
        assert_eq!(ops.get_submit_mode("lastname").unwrap(), SubmitMode::Dirty);

        ops.set_submit_mode("lastname", "sometimes").unwrap();
        assert_eq!(ops.get_submit_mode("lastname").unwrap(), SubmitMode::Dirty);
    }
}
