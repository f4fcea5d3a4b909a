//! Name resolution against the page.
//!
//! Every coordinator goes through a [`NameResolver`] to turn a logical name
//! into a handle. A miss is not an error: it is logged and reported as `None`
//! so the caller can fall back to a safe default. Only an empty name is an
//! error, since it can only come from a bug in the calling script.

use std::rc::{Rc, Weak};
use tracing::{error, warn};

use crate::error::{FormError, Result};
use crate::page::{Attribute, AttributeRef, Control, ControlRef, Page, TabRef};

/// Rejects an empty name.
pub(crate) fn check_name(name: &str, kind: &'static str) -> Result<()> {
    if name.is_empty() {
        error!(kind, "called without a name");
        return Err(FormError::MissingName(kind));
    }
    Ok(())
}

/// Holds the page weakly; a dropped page resolves nothing.
#[derive(Clone)]
pub struct NameResolver {
    page: Weak<dyn Page>,
}

impl NameResolver {
    pub fn new(page: Weak<dyn Page>) -> Self {
        Self { page }
    }

    pub fn page(&self) -> Option<Rc<dyn Page>> {
        let page = self.page.upgrade();
        if page.is_none() {
            warn!("form page is no longer available");
        }
        page
    }

    /// Resolves an attribute by name, warning on a miss.
    pub fn attribute(&self, name: &str) -> Result<Option<AttributeRef>> {
        check_name(name, "attribute")?;
        let Some(page) = self.page() else {
            return Ok(None);
        };
        let attribute = page.attribute(name);
        if attribute.is_none() {
            warn!(attribute = name, "attribute not found on form");
        }
        Ok(attribute)
    }

    /// Resolves a control by name. Falls back to the first control bound to
    /// an attribute of the same name.
    pub fn control(&self, name: &str) -> Result<Option<ControlRef>> {
        check_name(name, "control")?;
        let Some(page) = self.page() else {
            return Ok(None);
        };
        let control = page.control(name).or_else(|| {
            page.attribute(name)
                .and_then(|a| a.controls().into_iter().next())
        });
        if control.is_none() {
            warn!(control = name, "control not found on form");
        }
        Ok(control)
    }

    /// Lookup without validation or diagnostics.
    pub fn find_attribute(&self, name: &str) -> Option<AttributeRef> {
        self.page.upgrade()?.attribute(name)
    }

    /// Lookup without validation, fallback or diagnostics.
    pub fn find_control(&self, name: &str) -> Option<ControlRef> {
        self.page.upgrade()?.control(name)
    }

    /// Attributes accepted by `predicate`, which receives each item and its index.
    pub fn attributes_where(
        &self,
        predicate: impl Fn(&dyn Attribute, usize) -> bool,
    ) -> Vec<AttributeRef> {
        self.page()
            .map(|page| page.filter_attributes(&predicate))
            .unwrap_or_default()
    }

    /// Controls accepted by `predicate`, which receives each item and its index.
    pub fn controls_where(
        &self,
        predicate: impl Fn(&dyn Control, usize) -> bool,
    ) -> Vec<ControlRef> {
        self.page()
            .map(|page| page.filter_controls(&predicate))
            .unwrap_or_default()
    }

    pub fn tabs(&self) -> Vec<TabRef> {
        self.page().map(|page| page.tabs()).unwrap_or_default()
    }
}

/// One name or a list of names.
pub trait Names {
    fn into_names(self) -> Vec<String>;
}

impl Names for &str {
    fn into_names(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl Names for String {
    fn into_names(self) -> Vec<String> {
        vec![self]
    }
}

impl Names for &String {
    fn into_names(self) -> Vec<String> {
        vec![self.clone()]
    }
}

impl Names for &[&str] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl Names for &[String] {
    fn into_names(self) -> Vec<String> {
        self.to_vec()
    }
}

impl Names for Vec<&str> {
    fn into_names(self) -> Vec<String> {
        self.into_iter().map(str::to_string).collect()
    }
}

impl Names for Vec<String> {
    fn into_names(self) -> Vec<String> {
        self
    }
}

impl<const N: usize> Names for [&str; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> Names for &[&str; N] {
    fn into_names(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::memory::fixtures::ContactForm;
    use crate::page::memory::MemoryPage;

    fn resolver(page: &Rc<MemoryPage>) -> NameResolver {
        let page: Rc<dyn Page> = page.clone();
        NameResolver::new(Rc::downgrade(&page))
    }

    #[test]
    fn empty_names_are_errors() {
        let form = ContactForm::new();
        let resolver = resolver(&form.page);
        assert!(matches!(
            resolver.attribute(""),
            Err(FormError::MissingName("attribute"))
        ));
        assert!(matches!(
            resolver.control(""),
            Err(FormError::MissingName("control"))
        ));
    }

    #[test]
    fn misses_resolve_to_none() {
        let form = ContactForm::new();
        let resolver = resolver(&form.page);
        assert!(resolver.attribute("nope").unwrap().is_none());
        assert!(resolver.control("nope").unwrap().is_none());
    }

    #[test]
    fn control_falls_back_to_attribute_controls() {
        let form = ContactForm::new();
        let resolver = resolver(&form.page);
        let control = resolver.control("theattribute").unwrap().unwrap();
        assert_eq!(control.name(), "thecontrol");
        assert!(resolver.find_control("theattribute").is_none());
    }

    #[test]
    fn dropped_page_resolves_nothing() {
        let page = MemoryPage::new();
        page.add_attribute("name", crate::model::AttributeType::String);
        let resolver = resolver(&page);
        drop(page);
        assert!(resolver.attribute("name").unwrap().is_none());
        assert!(resolver.tabs().is_empty());
    }

    #[test]
    fn predicate_queries_receive_index() {
        let form = ContactForm::new();
        let resolver = resolver(&form.page);
        let first = resolver.attributes_where(|_, i| i == 0);
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].name(), "parentaccountid");

        let headers = resolver.controls_where(|c, _| c.name().starts_with("header_"));
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn names_accept_single_and_many() {
        assert_eq!("a".into_names(), vec!["a"]);
        assert_eq!(["a", "b"].into_names(), vec!["a", "b"]);
        assert_eq!(vec!["a".to_string()].into_names(), vec!["a"]);
    }
}
