use std::collections::BTreeMap;

/// Key used for errors which do not belong to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Validation messages for a submitted form, grouped by field name.
#[derive(Clone, Debug, Default)]
pub struct FormErrors(BTreeMap<&'static str, Vec<String>>);

impl FormErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    pub fn non_field(&self) -> &[String] {
        self.get(NON_FIELD_ERRORS)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Trims a text input and rejects it if nothing is left.
pub fn required_text(
    errors: &mut FormErrors,
    field: &'static str,
    value: &str,
    max_len: Option<usize>,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "This field is required.");
    } else if let Some(max_len) = max_len {
        let len = value.chars().count();
        if len > max_len {
            errors.add(
                field,
                format!(
                    "Ensure this value has at most {} characters (it has {}).",
                    max_len, len
                ),
            );
        }
    }
    value.to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_messages_per_field() {
        let mut errors = FormErrors::default();
        assert!(errors.is_empty());
        assert!(errors.get("text").is_empty());

        errors.add("text", "first");
        errors.add("text", "second");
        errors.add(NON_FIELD_ERRORS, "whole form");

        assert_eq!(errors.get("text"), ["first", "second"]);
        assert!(errors.has("text"));
        assert!(!errors.has("group"));
        assert_eq!(errors.non_field(), ["whole form"]);
    }

    #[test]
    fn required_text_trims_and_checks_length() {
        let mut errors = FormErrors::default();
        assert_eq!(required_text(&mut errors, "text", "  hi  ", None), "hi");
        assert!(errors.is_empty());

        required_text(&mut errors, "text", "   ", None);
        assert_eq!(errors.get("text"), ["This field is required."]);

        required_text(&mut errors, "title", "abcdef", Some(5));
        assert!(errors.has("title"));
    }
}
