//! Terminal output for the command line front-end.
//!
//! Resolved values go to stdout undecorated so they can be captured by build
//! scripts; decorated messages are for humans.

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("\x1b[31mERROR:\x1b[0m {}", message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("\x1b[32m✓\x1b[0m {}", message);
}

/// Print a resolved value on its own line.
pub fn display_value(value: &str) {
    println!("{}", value);
}

/// Print placeholder substitutions as `KEY=value` lines, sorted by key.
pub fn display_placeholders(placeholders: &BTreeMap<String, String>) {
    for (key, value) in placeholders {
        println!("{}={}", key, value);
    }
}

/// Symbol used to report a version comparison.
pub fn ordering_symbol(ordering: Ordering) -> &'static str {
    match ordering {
        Ordering::Less => "<",
        Ordering::Equal => "=",
        Ordering::Greater => ">",
    }
}
