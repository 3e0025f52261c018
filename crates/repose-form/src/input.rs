use std::fmt;

use crate::form::FormHandle;
use crate::value::FieldValue;

/// Props for binding one field to an input control.
#[derive(Clone)]
pub struct InputProps {
    pub name: String,
    pub value: FieldValue,
    /// Set for boolean fields (checkboxes, toggles).
    pub checked: Option<bool>,
    /// The field's validation message, once the field has been touched.
    pub help: Option<String>,
    handle: FormHandle,
}

impl InputProps {
    pub(crate) fn new(name: &str, value: FieldValue, help: Option<String>, handle: FormHandle) -> Self {
        Self {
            name: name.to_owned(),
            checked: value.as_bool(),
            value,
            help,
            handle,
        }
    }

    pub fn on_change(&self, value: impl Into<FieldValue>) {
        self.handle.set_value(&self.name, value);
    }

    /// Checkbox click: writes the negation of the rendered value.
    pub fn toggle(&self) {
        self.on_change(!self.checked.unwrap_or(false));
    }

    pub fn on_blur(&self) {
        self.handle.touch(&self.name);
    }
}

impl fmt::Debug for InputProps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputProps")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("checked", &self.checked)
            .field("help", &self.help)
            .finish_non_exhaustive()
    }
}
