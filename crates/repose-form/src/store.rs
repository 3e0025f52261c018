use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use crate::value::{FieldErrors, FieldValue, FormValues};

pub type Validator = Rc<dyn Fn(&FormValues) -> FieldErrors>;

/// The value bag and validation engine a form adapts.
///
/// Implementations hold the current values and run validation; they emit
/// nothing themselves. Writes may be applied immediately or buffered until
/// [`ValueStore::commit`]: the adapter never relies on a store keeping every
/// intermediate write of a batch, and reconciles through
/// [`ValueStore::set_values`] when it did not.
pub trait ValueStore {
    fn values(&self) -> FormValues;

    fn set_value(&mut self, name: &str, value: FieldValue);

    /// Replaces the whole value bag.
    fn set_values(&mut self, values: FormValues);

    fn validate(&self, values: &FormValues) -> FieldErrors;

    /// Runs the store's own update pass for writes buffered since the last
    /// commit. Called once per batch, before change notifications go out.
    fn commit(&mut self) {}

    fn errors(&self) -> FieldErrors {
        self.validate(&self.values())
    }

    fn is_valid_form(&self) -> bool {
        self.errors().is_empty()
    }

    fn is_touched(&self, _name: &str) -> bool {
        false
    }

    fn touch(&mut self, _name: &str) {}

    fn touch_all(&mut self) {
        for name in self.values().names() {
            self.touch(name);
        }
    }
}

/// In-memory store: writes land immediately, validation is a plain closure.
pub struct MemoryStore {
    values: FormValues,
    touched: BTreeSet<String>,
    validator: Validator,
}

impl MemoryStore {
    pub fn new(values: FormValues, validator: impl Fn(&FormValues) -> FieldErrors + 'static) -> Self {
        Self::with_validator(values, Rc::new(validator))
    }

    pub fn with_validator(values: FormValues, validator: Validator) -> Self {
        Self {
            values,
            touched: BTreeSet::new(),
            validator,
        }
    }

    pub fn always_valid(values: FormValues) -> Self {
        Self::new(values, |_| FieldErrors::new())
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("values", &self.values)
            .field("touched", &self.touched)
            .finish_non_exhaustive()
    }
}

impl ValueStore for MemoryStore {
    fn values(&self) -> FormValues {
        self.values.clone()
    }

    fn set_value(&mut self, name: &str, value: FieldValue) {
        self.values.set(name, value);
    }

    fn set_values(&mut self, values: FormValues) {
        self.values = values;
    }

    fn validate(&self, values: &FormValues) -> FieldErrors {
        (self.validator)(values)
    }

    fn is_touched(&self, name: &str) -> bool {
        self.touched.contains(name)
    }

    fn touch(&mut self, name: &str) {
        self.touched.insert(name.to_owned());
    }
}
