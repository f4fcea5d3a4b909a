//! # Form Registry
//!
//! Form scripts are loaded by the host once per form open. A script keeps its
//! own state between loads, so the host needs somewhere to park one instance
//! per form. [`FormRegistry`] is that place, owned by the host instead of a
//! global, so each test or each session gets a clean slate.
//!
//! ## Load Cycle
//!
//! 1. The first `load` for a key calls `create` and stores the script.
//! 2. Later loads reuse the stored script with a facade over the new page.
//! 3. A non-empty `form_name` replaces the stored one.
//! 4. `on_initial_load` runs. A failure is logged, handed to the error
//!    reporter (typically the host's error dialog) and returned.

use std::collections::HashMap;
use std::hash::Hash;
use std::rc::Rc;
use tracing::error;

use crate::api::FormApi;
use crate::config::FormConfig;
use crate::error::{FormError, Result};
use crate::page::Page;

pub const DEFAULT_FORM_NAME: &str = "unnamed form";

/// A form customization script.
pub trait FormScript {
    /// Runs every time the form is loaded.
    fn on_initial_load(&mut self, api: &FormApi) -> Result<()>;
}

/// Receives a display message and the error behind it.
pub type ErrorReporter = Box<dyn Fn(&str, &FormError)>;

struct LoadedForm {
    script: Box<dyn FormScript>,
    api: FormApi,
    form_name: String,
}

pub struct FormRegistry<K> {
    forms: HashMap<K, LoadedForm>,
    config: FormConfig,
    reporter: Option<ErrorReporter>,
}

impl<K: Eq + Hash> Default for FormRegistry<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash> FormRegistry<K> {
    pub fn new() -> Self {
        Self::with_config(FormConfig::default())
    }

    /// Facades built by this registry use `config`.
    pub fn with_config(config: FormConfig) -> Self {
        Self {
            forms: HashMap::new(),
            config,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: impl Fn(&str, &FormError) + 'static) -> Self {
        self.reporter = Some(Box::new(reporter));
        self
    }

    /// Loads the form stored under `key`, creating it on first use.
    pub fn load<P: Page + 'static>(
        &mut self,
        key: K,
        page: &Rc<P>,
        form_name: Option<&str>,
        create: impl FnOnce(&FormApi) -> Box<dyn FormScript>,
    ) -> Result<()> {
        let api = FormApi::with_config(page, self.config.clone());
        let form = self.forms.entry(key).or_insert_with(|| LoadedForm {
            script: create(&api),
            api: api.clone(),
            form_name: DEFAULT_FORM_NAME.to_string(),
        });
        form.api = api;
        if let Some(name) = form_name.filter(|name| !name.is_empty()) {
            form.form_name = name.to_string();
        }

        if let Err(err) = form.script.on_initial_load(&form.api) {
            error!(form = %form.form_name, error = %err, "on_initial_load failed");
            if let Some(report) = &self.reporter {
                report(
                    &format!("Error in on_initial_load of {}", form.form_name),
                    &err,
                );
            }
            return Err(err);
        }
        Ok(())
    }

    pub fn get(&self, key: &K) -> Option<&dyn FormScript> {
        self.forms.get(key).map(|form| form.script.as_ref())
    }

    /// Facade over the page of the most recent load.
    pub fn api(&self, key: &K) -> Option<&FormApi> {
        self.forms.get(key).map(|form| &form.api)
    }

    pub fn form_name(&self, key: &K) -> Option<&str> {
        self.forms.get(key).map(|form| form.form_name.as_str())
    }

    /// Drops the stored form. Returns whether there was one.
    pub fn unload(&mut self, key: &K) -> bool {
        self.forms.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.forms.clear();
    }

    pub fn len(&self) -> usize {
        self.forms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::memory::fixtures::ContactForm;
    use std::cell::{Cell, RefCell};

    struct CountingScript {
        loads: Rc<Cell<usize>>,
        fail: bool,
    }

    impl FormScript for CountingScript {
        fn on_initial_load(&mut self, api: &FormApi) -> Result<()> {
            self.loads.set(self.loads.get() + 1);
            api.set_value("lastname", "loaded")?;
            if self.fail {
                return Err(FormError::Script("boom".to_string()));
            }
            Ok(())
        }
    }

    fn script(loads: &Rc<Cell<usize>>, fail: bool) -> impl FnOnce(&FormApi) -> Box<dyn FormScript> {
        let loads = loads.clone();
        move |_: &FormApi| -> Box<dyn FormScript> { Box::new(CountingScript { loads, fail }) }
    }

    #[test]
    fn first_load_creates_later_loads_reuse() {
        let loads = Rc::new(Cell::new(0));
        let created = Rc::new(Cell::new(0));
        let mut registry = FormRegistry::new();

        for _ in 0..2 {
            let form = ContactForm::new();
            let counter = created.clone();
            let make = script(&loads, false);
            registry
                .load("contact", &form.page, None, move |api| {
                    counter.set(counter.get() + 1);
                    make(api)
                })
                .unwrap();
            assert_eq!(
                registry.api(&"contact").unwrap().get_value("lastname").unwrap(),
                crate::model::AttributeValue::from("loaded")
            );
        }
        assert_eq!(created.get(), 1);
        assert_eq!(loads.get(), 2);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn form_name_defaults_and_updates() {
        let loads = Rc::new(Cell::new(0));
        let form = ContactForm::new();
        let mut registry = FormRegistry::new();

        registry
            .load(1, &form.page, None, script(&loads, false))
            .unwrap();
        assert_eq!(registry.form_name(&1), Some(DEFAULT_FORM_NAME));

        registry
            .load(1, &form.page, Some("Contact Main"), script(&loads, false))
            .unwrap();
        assert_eq!(registry.form_name(&1), Some("Contact Main"));

        registry
            .load(1, &form.page, Some(""), script(&loads, false))
            .unwrap();
        assert_eq!(registry.form_name(&1), Some("Contact Main"));
    }

    #[test]
    fn failures_reach_the_reporter() {
        let loads = Rc::new(Cell::new(0));
        let reported = Rc::new(RefCell::new(Vec::new()));
        let sink = reported.clone();
        let form = ContactForm::new();
        let mut registry = FormRegistry::new()
            .with_reporter(move |message, err| sink.borrow_mut().push(format!("{message}: {err}")));

        let result = registry.load("contact", &form.page, Some("Contact"), script(&loads, true));
        assert!(matches!(result, Err(FormError::Script(_))));
        assert_eq!(
            reported.borrow().as_slice(),
            ["Error in on_initial_load of Contact: Form script error: boom"]
        );
        assert!(registry.get(&"contact").is_some());
    }

    #[test]
    fn unload_and_clear() {
        let loads = Rc::new(Cell::new(0));
        let form = ContactForm::new();
        let mut registry = FormRegistry::new();
        registry
            .load("a", &form.page, None, script(&loads, false))
            .unwrap();
        registry
            .load("b", &form.page, None, script(&loads, false))
            .unwrap();

        assert!(registry.unload(&"a"));
        assert!(!registry.unload(&"a"));
        assert_eq!(registry.len(), 1);
        registry.clear();
        assert!(registry.is_empty());
    }
}
