//! Case-conversion helpers for node type names and socket labels

/// Convert a tool or property name to PascalCase
pub fn to_pascal_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = true;

    for c in s.chars() {
        if c == '_' || c == '-' || c == ' ' || c == '.' {
            capitalize_next = true;
        } else if capitalize_next {
            result.push(c.to_ascii_uppercase());
            capitalize_next = false;
        } else {
            result.push(c);
        }
    }

    result
}

/// Convert a camelCase or snake_case name to a spaced Title Case label
pub fn to_title_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut start_of_word = true;

    for c in s.chars() {
        if c == '_' || c == '-' {
            result.push(' ');
            start_of_word = true;
        } else if c.is_ascii_uppercase() && !start_of_word {
            result.push(' ');
            result.push(c);
            start_of_word = false;
        } else if start_of_word {
            result.push(c.to_ascii_uppercase());
            start_of_word = false;
        } else {
            result.push(c);
        }
    }

    result
}
