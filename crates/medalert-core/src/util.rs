//! Shared utility functions used across multiple modules.

/// Normalize optional text by trimming whitespace and removing empties.
///
/// Returns `None` when the input is `None` or the trimmed value is empty.
pub fn normalize_text_option(value: Option<String>) -> Option<String> {
    let value = value?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// Text of `value` when it has any non-whitespace content, otherwise `fallback`
pub fn non_blank_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.trim().is_empty() {
        fallback
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_option_rejects_empty() {
        assert_eq!(normalize_text_option(None), None);
        assert_eq!(normalize_text_option(Some("   ".to_string())), None);
    }

    #[test]
    fn normalize_text_option_trims_value() {
        assert_eq!(
            normalize_text_option(Some(" alerts ".to_string())),
            Some("alerts".to_string())
        );
    }

    #[test]
    fn non_blank_or_falls_back_on_whitespace() {
        assert_eq!(non_blank_or("", "default"), "default");
        assert_eq!(non_blank_or(" \n", "default"), "default");
        assert_eq!(non_blank_or("Take pills", "default"), "Take pills");
    }
}
