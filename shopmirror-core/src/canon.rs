//! Canonical JSON rendering.
//!
//! A recursive-descent renderer over [`serde_json::Value`] that produces a
//! deterministic text form: mapping keys sorted, line width bounded, runs of
//! short scalar children packed onto shared lines. The same rendering backs
//! two very different consumers:
//!
//! 1. persisted `.json` files, which stay diff-friendly across sync passes
//!    because the byte layout never depends on remote key order;
//! 2. structural equality ([`is_same`]) — two documents are "the same" iff
//!    their canonical renderings are byte-identical after a shared
//!    field-ignore transform.

use std::cmp::Ordering;

use serde_json::Value;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Mapping-key ordering policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyOrder {
    /// Keep keys in document order. The only mode that permits the compact
    /// single-line fast path.
    Insertion,
    /// Sort keys lexicographically (the canonical default).
    Lexicographic,
    /// Sort the listed keys first, in the listed order, then the rest
    /// lexicographically.
    Priority(Vec<String>),
}

impl KeyOrder {
    /// Priority order used for config-style documents: `name`, `value`,
    /// `errors` first.
    pub fn config_priority() -> Self {
        KeyOrder::Priority(vec![
            "name".to_owned(),
            "value".to_owned(),
            "errors".to_owned(),
        ])
    }

    fn is_sorted(&self) -> bool {
        !matches!(self, KeyOrder::Insertion)
    }

    fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            KeyOrder::Insertion => Ordering::Equal,
            KeyOrder::Lexicographic => a.cmp(b),
            KeyOrder::Priority(first) => {
                let rank = |key: &str| first.iter().position(|p| p == key).unwrap_or(first.len());
                rank(a).cmp(&rank(b)).then_with(|| a.cmp(b))
            }
        }
    }
}

/// Rendering options for [`to_canonical_string`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOptions {
    /// Pad single-line brackets with a space: `{ "a": 1 }`.
    pub margins: bool,
    /// Spaces per nesting level.
    pub indent: usize,
    /// Target maximum line length; a node that does not fit is exploded onto
    /// one line per child.
    pub max_length: usize,
    /// Pack consecutive scalar children of all-scalar sequences/mappings onto
    /// shared lines while under `max_length`.
    pub wrap_scalars: bool,
    pub key_order: KeyOrder,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            margins: false,
            indent: 2,
            max_length: 80,
            wrap_scalars: true,
            key_order: KeyOrder::Lexicographic,
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render `doc` in canonical form.
///
/// The output always parses back to a document structurally equal to `doc`
/// (mapping key order aside).
pub fn to_canonical_string(doc: &Value, options: &FormatOptions) -> String {
    render(doc, options, 0, 0)
}

fn render(node: &Value, options: &FormatOptions, current_indent: usize, reserved: usize) -> String {
    let budget = options
        .max_length
        .saturating_sub(current_indent + reserved);

    // Fast path: compact render in document order. Only valid when no key
    // ordering is imposed — a sorted rendering must sort even short nodes.
    if !options.key_order.is_sorted() {
        let compact = node.to_string();
        if compact.len() <= budget {
            let padded = pad_margins(&compact, options.margins);
            if padded.len() <= budget {
                return padded;
            }
        }
    }

    let next_indent = current_indent + options.indent;
    let trailing = |index: usize, len: usize| usize::from(index + 1 != len);

    let (mut items, all_scalars, open, close) = match node {
        Value::Array(seq) => {
            let mut items = Vec::with_capacity(seq.len());
            let mut all_scalars = true;
            for (index, child) in seq.iter().enumerate() {
                items.push(render(child, options, next_indent, trailing(index, seq.len())));
                all_scalars &= is_scalar(child);
            }
            (items, all_scalars, '[', ']')
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            if options.key_order.is_sorted() {
                keys.sort_by(|a, b| options.key_order.compare(a, b));
            }
            let mut items = Vec::with_capacity(keys.len());
            let mut all_scalars = true;
            for (index, key) in keys.iter().enumerate() {
                let child = &map[key.as_str()];
                let key_part = format!("{}: ", Value::String((*key).clone()));
                let reserved = key_part.len() + trailing(index, keys.len());
                let value = render(child, options, next_indent, reserved);
                items.push(format!("{key_part}{value}"));
                all_scalars &= is_scalar(child);
            }
            (items, all_scalars, '{', '}')
        }
        scalar => return scalar.to_string(),
    };

    if options.wrap_scalars && all_scalars {
        items = wrap_scalar_runs(items, next_indent, options.max_length);
    }

    let single_line = items.join(", ");
    if single_line.len() + current_indent + 2 < options.max_length {
        return format!("{open}{single_line}{close}");
    }
    if items.is_empty() {
        // Empty containers never explode.
        return node.to_string();
    }

    let pad = " ".repeat(next_indent);
    let closing_pad = " ".repeat(current_indent);
    let body = items.join(&format!(",\n{pad}"));
    format!("{open}\n{pad}{body}\n{closing_pad}{close}")
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_))
}

/// Merge consecutive rendered scalar items onto shared lines while each
/// shared line stays under the length ceiling.
fn wrap_scalar_runs(items: Vec<String>, next_indent: usize, max_length: usize) -> Vec<String> {
    let mut wrapped: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        match wrapped.last_mut() {
            Some(last) if next_indent + last.len() + item.len() < max_length => {
                last.push_str(", ");
                last.push_str(&item);
            }
            _ => wrapped.push(item),
        }
    }
    wrapped
}

/// Re-space a compact one-line rendering: `, ` and `: ` separators always,
/// bracket margins only when requested. String literals pass through
/// untouched.
fn pad_margins(compact: &str, margins: bool) -> String {
    let margin = if margins { " " } else { "" };
    let mut out = String::with_capacity(compact.len() + 16);
    let mut in_string = false;
    let mut escaped = false;
    for c in compact.chars() {
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '{' | '[' => {
                out.push(c);
                out.push_str(margin);
            }
            '}' | ']' => {
                out.push_str(margin);
                out.push(c);
            }
            ',' => out.push_str(", "),
            ':' => out.push_str(": "),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Equality
// ---------------------------------------------------------------------------

/// Shallow copy of `doc` with the named top-level fields removed.
///
/// Non-mapping documents are returned unchanged.
pub fn strip_fields(doc: &Value, fields: &[&str]) -> Value {
    match doc {
        Value::Object(map) => {
            let mut copy = map.clone();
            for field in fields {
                copy.remove(*field);
            }
            Value::Object(copy)
        }
        other => other.clone(),
    }
}

/// Structural equality, blind to mapping key order and to the fields listed
/// in `ignore_fields`.
pub fn is_same(a: &Value, b: &Value, ignore_fields: &[&str]) -> bool {
    let options = FormatOptions::default();
    to_canonical_string(&strip_fields(a, ignore_fields), &options)
        == to_canonical_string(&strip_fields(b, ignore_fields), &options)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
