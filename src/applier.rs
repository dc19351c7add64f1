//! Attribute application.
//!
//! Maps attribute names onto backend calls through an explicit strategy
//! table. Three names get composite handling, everything else passes
//! through as a scalar property:
//!
//! - `class` - aggregate class string
//! - `style` - inline style declarations, names kebab-cased
//! - `custom_attributes` - generic attribute bag, names kebab-cased
//!
//! A value whose shape does not match its name's strategy is dropped with
//! a warning; the rest of the node is unaffected.

use crate::backend::BackendNode;
use crate::types::AttrValue;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Strategy {
    Class,
    Style,
    Bag,
    Passthrough,
}

fn strategy_for(name: &str) -> Strategy {
    match name {
        "class" => Strategy::Class,
        "style" => Strategy::Style,
        "custom_attributes" => Strategy::Bag,
        _ => Strategy::Passthrough,
    }
}

/// Apply one attribute value to a backend node.
pub fn apply(backend: &dyn BackendNode, name: &str, value: &AttrValue) {
    match (strategy_for(name), value) {
        (Strategy::Class, AttrValue::Text(class)) => backend.set_class(class),
        (Strategy::Style, AttrValue::Style(entries)) => {
            for (style_name, style_value) in entries {
                backend.set_style_property(&kebab_case(style_name), style_value);
            }
        }
        (Strategy::Bag, AttrValue::Bag(entries)) => {
            for (attr_name, attr_value) in entries {
                backend.set_attribute(&kebab_case(attr_name), attr_value);
            }
        }
        (Strategy::Passthrough, value) => backend.set_property(name, value),
        (strategy, value) => {
            tracing::warn!(
                attribute = name,
                shape = value.shape(),
                ?strategy,
                "attribute value shape does not match its strategy, skipping"
            );
        }
    }
}

/// Normalize camelCase and snake_case names to kebab-case.
pub(crate) fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else if ch == '_' {
            out.push('-');
        } else {
            out.push(ch);
        }
    }
    out
}
