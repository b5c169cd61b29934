//! Post-evaluation templating. A result template may contain `{index}` or
//! `{index:width}` placeholders that are replaced by the evaluation layer's
//! computed values once rolling is done.

use super::lexing::{find_closing_character_index_of, read_number};

/// Descriptor of one placeholder occurrence inside a template string.
/// Built while scanning, consumed immediately by the substitution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstituteInfo {
    /// Offset of the placeholder in the template.
    pub position: usize,
    /// Characters consumed by the placeholder syntax.
    pub length: usize,
    /// Which computed result to substitute. `None` marks an invalid
    /// placeholder.
    pub result_index: Option<usize>,
    /// Zero-padding width, 0 for no padding.
    pub digit_number: usize,
}

impl Default for SubstituteInfo {
    fn default() -> Self {
        Self {
            position: 0,
            length: 2,
            result_index: None,
            digit_number: 0,
        }
    }
}

impl SubstituteInfo {
    pub fn is_valid(&self) -> bool {
        self.result_index.is_some()
    }
}

/// Scans the placeholder starting at `start` (which must point at a `{`).
/// Returns an invalid descriptor when the marker is not well formed.
pub fn read_variable_from_string(source: &str, start: usize) -> SubstituteInfo {
    let mut info = SubstituteInfo {
        position: start,
        ..SubstituteInfo::default()
    };
    if !source[start..].starts_with('{') {
        return info;
    }
    let Some(close) = find_closing_character_index_of('{', '}', source, start) else {
        return info;
    };
    let inner = &source[start + 1..close];
    let (index_text, parameters) = match inner.split_once(':') {
        Some((index_text, parameters)) => (index_text, Some(parameters)),
        None => (inner, None),
    };

    let mut cursor = index_text;
    let Ok(index) = read_number(&mut cursor) else {
        return info;
    };
    if !cursor.is_empty() || index < 0 {
        return info;
    }

    info.length = close - start + 1;
    if let Some(parameters) = parameters {
        read_substitution_parameters(&mut info, parameters);
    }
    info.result_index = Some(index as usize);
    info
}

/// Parses the formatting suffix following the placeholder index. Currently
/// only a zero-padding width, e.g. the `03` of `{0:03}`.
pub fn read_substitution_parameters(info: &mut SubstituteInfo, rest: &str) {
    let mut cursor = rest;
    if let Ok(width) = read_number(&mut cursor) {
        if cursor.is_empty() && width >= 0 {
            info.digit_number = width as usize;
        }
    }
}

/// Produces the final display string. Placeholders are processed in
/// ascending position order and substituted values are never rescanned, so a
/// value that itself looks like a placeholder cannot trigger another pass.
/// Values are left-padded with `'0'` to the requested width, never truncated.
pub fn replace_variable_to_value(source: &str, values: &[String]) -> String {
    let mut output = String::with_capacity(source.len());
    let mut position = 0;
    while position < source.len() {
        let Some(open) = source[position..].find('{').map(|found| found + position) else {
            output.push_str(&source[position..]);
            break;
        };
        output.push_str(&source[position..open]);

        let info = read_variable_from_string(source, open);
        match info.result_index {
            Some(index) if index < values.len() => {
                let value = &values[index];
                let padding = info.digit_number.saturating_sub(value.chars().count());
                for _ in 0..padding {
                    output.push('0');
                }
                output.push_str(value);
                position = open + info.length;
            }
            _ => {
                // not a substitutable placeholder, keep the brace literally
                output.push('{');
                position = open + 1;
            }
        }
    }
    output
}
