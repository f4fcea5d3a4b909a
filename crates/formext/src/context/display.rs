//! Display text and template-composed values.
//!
//! A composed value is written into one attribute from a template such as
//! `"{0} - {1}"`, where `{i}` stands for the display text of the i-th field.
//! Placeholders of unset fields are removed together with the literal text
//! that joins them to their neighbours, so `"{0} - {1} - {2}"` with only the
//! first field set becomes `"Foo"` instead of `"Foo -  - "`.

use std::rc::Rc;
use tracing::error;

use super::attributes::AttributeOps;
use crate::config::FormConfig;
use crate::error::{FormError, Result};
use crate::model::{lookup_names, AttributeType, AttributeValue};
use crate::page::handler;
use crate::resolver::{NameResolver, Names};

#[derive(Clone)]
pub struct Formatter {
    resolver: NameResolver,
    attributes: AttributeOps,
    config: Rc<FormConfig>,
}

impl Formatter {
    pub fn new(resolver: NameResolver, attributes: AttributeOps, config: Rc<FormConfig>) -> Self {
        Self {
            resolver,
            attributes,
            config,
        }
    }

    /// Human readable value: the selected option's label, the referenced
    /// names, or the value's own text. Empty when unset or unresolved.
    pub fn get_display_value(&self, name: &str) -> Result<String> {
        let Some(attribute) = self.resolver.attribute(name)? else {
            return Ok(String::new());
        };
        let text = match attribute.attribute_type() {
            AttributeType::OptionSet => attribute.text().unwrap_or_default(),
            AttributeType::Lookup => attribute
                .value()
                .as_references()
                .map(|refs| lookup_names(refs, &self.config.lookup_name_separator))
                .unwrap_or_default(),
            _ => attribute.value().to_string(),
        };
        Ok(text)
    }

    /// Keeps `name` composed from `format` and `fields`.
    ///
    /// With no fields the literal format is written once. Otherwise the value
    /// is recomputed whenever a field changes, and computed now if any field
    /// already has a value.
    pub fn initialize_formatted_value(
        &self,
        name: &str,
        format: &str,
        fields: impl Names,
    ) -> Result<()> {
        if self.resolver.attribute(name)?.is_none() {
            return Ok(());
        }
        let fields = fields.into_names();
        if fields.is_empty() {
            return self.attributes.set_value(name, format);
        }

        let formatter = self.clone();
        let target = name.to_string();
        let template = format.to_string();
        let watched = fields.clone();
        self.attributes.add_on_change(
            fields.as_slice(),
            handler(move |_| {
                if let Err(err) =
                    formatter.update_formatted_value(&target, &template, watched.as_slice())
                {
                    error!(attribute = %target, error = %err, "failed to update formatted value");
                }
            }),
        )?;

        if fields.iter().any(|field| self.is_field_set(field)) {
            self.update_formatted_value(name, format, fields)?;
        }
        Ok(())
    }

    /// Writes `format`, filled from `fields`, into `name`.
    pub fn update_formatted_value(
        &self,
        name: &str,
        format: &str,
        fields: impl Names,
    ) -> Result<()> {
        let fields = fields.into_names();
        let present: Vec<bool> = fields.iter().map(|f| self.is_field_set(f)).collect();
        let template = compact_template(format, &present);
        let values = fields
            .iter()
            .map(|f| self.get_display_value(f))
            .collect::<Result<Vec<_>>>()?;
        let text = format_template(&template, &values)?;
        self.attributes.set_value(name, text)
    }

    fn is_field_set(&self, name: &str) -> bool {
        self.resolver
            .find_attribute(name)
            .map(|a| a.value())
            .as_ref()
            .is_some_and(AttributeValue::is_set)
    }
}

/// Removes the placeholder of every field whose `present` flag is false,
/// along with its separator.
///
/// A placeholder that opens the template takes the text after it, up to the
/// next placeholder. Any other placeholder takes the text before it, back to
/// the previous placeholder. A lone leading placeholder is kept as is.
pub fn compact_template(format: &str, present: &[bool]) -> String {
    let mut format = format.to_string();
    for (i, _) in present.iter().enumerate().filter(|(_, set)| !**set) {
        let token = format!("{{{i}}}");
        let first_start = format.find('{');
        let first_end = first_start.and_then(|s| format[s..].find('}').map(|e| s + e));

        if let (Some(start), Some(end)) = (first_start, first_end) {
            if format[start + 1..end] == i.to_string() {
                if let Some(next) = format[end..].find('{') {
                    format.replace_range(start..end + next, "");
                }
                continue;
            }
        }

        let Some(start) = format.find(&token) else {
            continue;
        };
        let end = start + token.len();
        if let Some(previous) = format[..start].rfind('}') {
            format.replace_range(previous + 1..end, "");
        }
    }
    format
}

/// Replaces each `{i}` with `values[i]` in one left-to-right pass.
///
/// Placeholders without a value are kept verbatim. Substituted text is never
/// rescanned.
pub fn format_template(text: &str, values: &[String]) -> Result<String> {
    if text.is_empty() {
        return Err(FormError::EmptyTemplate);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let index: usize = after[..close].parse().ok()?;
            values.get(index).map(|v| (v, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{EntityReference, OptionSetValue, ValueInput};
    use crate::page::memory::fixtures::{ContactForm, FREIGHT_NO_CHARGE};
    use crate::page::memory::MemoryPage;
    use crate::page::{Attribute, Page};

    fn formatter(page: &Rc<MemoryPage>) -> Formatter {
        let page: Rc<dyn Page> = page.clone();
        let resolver = NameResolver::new(Rc::downgrade(&page));
        let attributes = AttributeOps::new(resolver.clone());
        Formatter::new(resolver, attributes, Rc::new(FormConfig::default()))
    }

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn compact_drops_trailing_unset_fields() {
        assert_eq!(
            compact_template("{0} - {1} - {2}", &[true, false, false]),
            "{0}"
        );
    }

    #[test]
    fn compact_drops_leading_unset_field() {
        assert_eq!(compact_template("{0}: {1}", &[false, true]), "{1}");
    }

    #[test]
    fn compact_drops_middle_field_with_its_separator() {
        assert_eq!(
            compact_template("{0} - {1} - {2}", &[true, false, true]),
            "{0} - {2}"
        );
    }

    #[test]
    fn compact_keeps_lone_placeholder() {
        assert_eq!(compact_template("Name: {0}", &[false]), "Name: {0}");
        assert_eq!(compact_template("{0}", &[false]), "{0}");
    }

    #[test]
    fn format_substitutes_in_one_pass() {
        let values = strings(&["{1}", "B"]);
        assert_eq!(format_template("{0}/{1}", &values).unwrap(), "{1}/B");
    }

    #[test]
    fn format_keeps_unmatched_tokens() {
        let values = strings(&["A"]);
        assert_eq!(format_template("{0} {1} {x} {", &values).unwrap(), "A {1} {x} {");
    }

    #[test]
    fn format_rejects_empty_text() {
        assert!(matches!(
            format_template("", &[]),
            Err(FormError::EmptyTemplate)
        ));
    }

    #[test]
    fn display_value_by_type() {
        let form = ContactForm::new();
        let formatter = formatter(&form.page);

        assert_eq!(
            formatter.get_display_value("address1_freighttermscode").unwrap(),
            "FOB"
        );
        form.attribute("address1_freighttermscode")
            .set_value(AttributeValue::OptionSet(FREIGHT_NO_CHARGE));
        assert_eq!(
            formatter.get_display_value("address1_freighttermscode").unwrap(),
            "No Charge"
        );

        form.attribute("lastname").set_value(AttributeValue::from("Jones"));
        assert_eq!(formatter.get_display_value("lastname").unwrap(), "Jones");

        assert_eq!(formatter.get_display_value("parentaccountid").unwrap(), "");
        form.attribute("parentaccountid").set_value(AttributeValue::Lookup(vec![
            EntityReference::new("1", "account").with_name("Acme"),
            EntityReference::new("2", "account").with_name("Globex"),
        ]));
        assert_eq!(
            formatter.get_display_value("parentaccountid").unwrap(),
            "Acme, Globex"
        );
        assert_eq!(formatter.get_display_value("missing").unwrap(), "");
    }

    #[test]
    fn numbers_and_flags_display_their_value() {
        let page = MemoryPage::new();
        let count = page.add_attribute("count", AttributeType::Number);
        count.set_value(AttributeValue::Number(0.0));
        let flag = page.add_attribute("flag", AttributeType::Boolean);
        flag.set_value(AttributeValue::Boolean(false));
        let formatter = formatter(&page);
        assert_eq!(formatter.get_display_value("count").unwrap(), "0");
        assert_eq!(formatter.get_display_value("flag").unwrap(), "false");
    }

    fn name_page() -> Rc<MemoryPage> {
        let page = MemoryPage::new();
        for name in ["fullname", "first", "middle", "last"] {
            page.add_field(name, AttributeType::String, None);
        }
        page
    }

    #[test]
    fn formatted_value_trims_unset_fields() {
        let page = name_page();
        let formatter = formatter(&page);
        formatter
            .initialize_formatted_value("fullname", "{0} - {1} - {2}", ["first", "middle", "last"])
            .unwrap();
        assert!(page.memory_attribute("fullname").unwrap().value().is_null());

        formatter.attributes.set_value("first", "Foo").unwrap();
        assert_eq!(
            formatter.attributes.get_value("fullname").unwrap(),
            AttributeValue::from("Foo")
        );

        formatter.attributes.set_value("last", "Baz").unwrap();
        assert_eq!(
            formatter.attributes.get_value("fullname").unwrap(),
            AttributeValue::from("Foo - Baz")
        );
    }

    #[test]
    fn formatted_value_drops_leading_separator() {
        let page = name_page();
        let formatter = formatter(&page);
        page.memory_attribute("last")
            .unwrap()
            .set_value(AttributeValue::from("Bar"));

        formatter
            .initialize_formatted_value("fullname", "{0}: {1}", ["first", "last"])
            .unwrap();
        assert_eq!(
            formatter.attributes.get_value("fullname").unwrap(),
            AttributeValue::from("Bar")
        );
    }

    #[test]
    fn formatted_value_without_fields_writes_literal() {
        let page = name_page();
        let formatter = formatter(&page);
        formatter
            .initialize_formatted_value("fullname", "Fixed", Vec::<String>::new())
            .unwrap();
        assert_eq!(
            formatter.attributes.get_value("fullname").unwrap(),
            AttributeValue::from("Fixed")
        );
    }

    #[test]
    fn formatted_value_for_missing_target_is_noop() {
        let page = name_page();
        let formatter = formatter(&page);
        formatter
            .initialize_formatted_value("nope", "{0}", ["first"])
            .unwrap();
        assert_eq!(page.memory_attribute("first").unwrap().handler_count(), 0);
    }

    #[test]
    fn formatted_value_uses_display_text() {
        let page = name_page();
        let kind = page.add_option_set(
            "kind",
            Some(1),
            vec![OptionSetValue::new("Person", 1), OptionSetValue::new("Company", 2)],
        );
        page.add_control("kind", Some(&kind), None);
        let formatter = formatter(&page);

        formatter
            .initialize_formatted_value("fullname", "{0} - {1}", ["first", "kind"])
            .unwrap();
        assert_eq!(
            formatter.attributes.get_value("fullname").unwrap(),
            AttributeValue::from("Person")
        );

        formatter
            .attributes
            .set_value("first", ValueInput::from("Ann"))
            .unwrap();
        assert_eq!(
            formatter.attributes.get_value("fullname").unwrap(),
            AttributeValue::from("Ann - Person")
        );
    }
}
