//! Descriptor/value search keys and subset matching.
//!
//! Search keys arrive as raw text. They are resolved once, against the
//! encoding of their descriptor, into typed [`FilterValues`]; matching a
//! subset never looks at the tables again.

use bufr_model::{DataSubset, Descriptor, Value};
use bufr_tables::{SchemaTable, ValueClass};
use tracing::{debug, warn};

/// A user supplied `descriptor = value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchKey {
    pub descriptor: Descriptor,
    pub value: String,
}

impl SearchKey {
    pub fn new(descriptor: Descriptor, value: impl Into<String>) -> Self {
        Self {
            descriptor,
            value: value.into(),
        }
    }
}

/// Accepted values of one filter, typed by the descriptor's encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValues {
    /// Literal compared with trailing blanks ignored.
    String(String),
    /// Any of these integers.
    Integers(Vec<i64>),
    /// Any of these floats, compared at single precision.
    Floats(Vec<f64>),
    /// Descriptor absent from the interpreting table. Never matches.
    Unresolved(String),
}

impl FilterValues {
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Missing) => false,
            (FilterValues::String(wanted), Value::String(actual)) => {
                wanted.trim_end() == actual.trim_end()
            }
            (FilterValues::Integers(set), Value::Integer(actual)) => set.contains(actual),
            (FilterValues::Floats(set), Value::Float(actual)) => {
                let actual = *actual as f32;
                set.iter().any(|&wanted| wanted as f32 == actual)
            }
            _ => false,
        }
    }
}

/// A resolved search key.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorValueFilter {
    pub descriptor: Descriptor,
    pub values: FilterValues,
}

impl DescriptorValueFilter {
    pub fn accepts(&self, descriptor: Descriptor, value: &Value) -> bool {
        descriptor == self.descriptor && self.values.accepts(value)
    }
}

/// Resolve raw search keys against `table`, preserving order.
pub fn resolve_search_keys(
    keys: &[SearchKey],
    table: &SchemaTable,
) -> Vec<DescriptorValueFilter> {
    keys.iter()
        .map(|key| DescriptorValueFilter {
            descriptor: key.descriptor,
            values: resolve_values(key, table),
        })
        .collect()
}

fn resolve_values(key: &SearchKey, table: &SchemaTable) -> FilterValues {
    let Some(encoding) = table.fetch_encoding(key.descriptor) else {
        warn!(
            descriptor = %key.descriptor,
            table_version = table.master_version(),
            "search key descriptor not in table; it will never match"
        );
        return FilterValues::Unresolved(key.value.clone());
    };
    match encoding.value_type().class() {
        ValueClass::String => FilterValues::String(key.value.clone()),
        ValueClass::Integer => {
            FilterValues::Integers(parse_tokens(key, |token| token.parse::<i64>().ok(), 0))
        }
        ValueClass::Float => {
            FilterValues::Floats(parse_tokens(key, |token| token.parse::<f64>().ok(), 0.0))
        }
    }
}

/// Split on `,`, tab and newline; unparsable tokens become `fallback`.
fn parse_tokens<T: Copy>(
    key: &SearchKey,
    parse: impl Fn(&str) -> Option<T>,
    fallback: T,
) -> Vec<T> {
    key.value
        .split([',', '\t', '\n'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            parse(token).unwrap_or_else(|| {
                debug!(
                    descriptor = %key.descriptor,
                    token,
                    "search value does not parse, using fallback"
                );
                fallback
            })
        })
        .collect()
}

/// First position `p >= start` where the filters match as an ordered
/// sequence.
///
/// The field at `p` satisfies the first filter. Each following filter is
/// satisfied by the next occurrence of its descriptor after the previous
/// match.
pub fn find_first_matching_position(
    subset: &DataSubset,
    filters: &[DescriptorValueFilter],
    start: usize,
) -> Option<usize> {
    let (first, rest) = filters.split_first()?;
    let mut anchor = start;
    while let Some(position) = subset.find(first.descriptor, anchor) {
        let field = subset.get(position)?;
        if first.accepts(field.descriptor, &field.value) && rest_matches(subset, rest, position) {
            return Some(position);
        }
        anchor = position + 1;
    }
    None
}

fn rest_matches(subset: &DataSubset, filters: &[DescriptorValueFilter], after: usize) -> bool {
    let mut previous = after;
    for filter in filters {
        let Some(position) = subset.find(filter.descriptor, previous + 1) else {
            return false;
        };
        match subset.get(position) {
            Some(field) if filter.accepts(field.descriptor, &field.value) => previous = position,
            _ => return false,
        }
    }
    true
}

/// Whether a subset passes the value filters. An empty list accepts all.
pub fn subset_matches(subset: &DataSubset, filters: &[DescriptorValueFilter]) -> bool {
    filters.is_empty() || find_first_matching_position(subset, filters, 0).is_some()
}
