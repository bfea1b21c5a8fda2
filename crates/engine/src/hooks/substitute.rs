//! Placeholder substitution for declarative hook commands

use super::context::HookContext;
use indexmap::IndexMap;
use std::borrow::Cow;

/// Source of values for `${name}` and `$name` placeholders
pub trait Variables {
    fn lookup(&self, name: &str) -> Option<&str>;
}

impl Variables for HookContext {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name)
    }
}

impl Variables for IndexMap<String, String> {
    fn lookup(&self, name: &str) -> Option<&str> {
        self.get(name).map(String::as_str)
    }
}

fn is_ident_start(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphabetic()
}

fn is_ident_char(b: u8) -> bool {
    b == b'_' || b.is_ascii_alphanumeric()
}

/// Replace `${name}` and `$name` with values from `vars`
///
/// Runs in a single left-to-right pass: substituted values are never scanned
/// again, and placeholders whose name has no value are kept verbatim.
///
/// # Examples
///
/// ```ignore
/// // filepath = "a.txt"
/// assert_eq!(substitute("echo ${filepath} $filepath $nope", &ctx), "echo a.txt a.txt $nope");
/// ```
pub fn substitute<'a, V>(input: &'a str, vars: &V) -> Cow<'a, str>
where
    V: Variables + ?Sized,
{
    if !input.contains('$') {
        return Cow::Borrowed(input);
    }

    let bytes = input.as_bytes();
    let mut result = String::with_capacity(input.len());
    let mut last_end = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'$' {
            i += 1;
            continue;
        }

        // (name, index just past the placeholder)
        let placeholder = if bytes.get(i + 1) == Some(&b'{') {
            input[i + 2..]
                .find('}')
                .map(|close| (&input[i + 2..i + 2 + close], i + 3 + close))
        } else if bytes.get(i + 1).copied().is_some_and(is_ident_start) {
            let start = i + 1;
            let end = bytes[start..]
                .iter()
                .position(|&b| !is_ident_char(b))
                .map_or(bytes.len(), |offset| start + offset);
            Some((&input[start..end], end))
        } else {
            None
        };

        let Some((name, end)) = placeholder else {
            i += 1;
            continue;
        };

        if let Some(value) = vars.lookup(name) {
            result.push_str(&input[last_end..i]);
            result.push_str(value);
            last_end = end;
        }
        i = end;
    }

    if last_end == 0 {
        Cow::Borrowed(input)
    } else {
        result.push_str(&input[last_end..]);
        Cow::Owned(result)
    }
}
