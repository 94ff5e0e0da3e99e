//! Projection of a [`Group`] tree into nested JSON objects.
//!
//! JSON has no multimap, so the projection synthesizes composite keys:
//! repeated attribute names become a `"comp_attribute,<name>"` array,
//! `cell` children are collected under one `"cells"` object keyed by cell
//! name, and other argument-bearing children use `"<group_name>,<arg>"`
//! keys. The result is lossy (arguments past the first collapse) and is
//! meant for downstream tooling, not for round-tripping.

use indexmap::IndexMap;
use serde_json::{map::Entry, Map, Number, Value as JsonValue};

use crate::ast::{Group, Value};
use crate::error::Error;

fn number_to_json(x: f64) -> Result<JsonValue, Error> {
    Number::from_f64(x)
        .map(JsonValue::Number)
        .ok_or_else(|| Error::Type {
            kind: "non-finite number".to_string(),
        })
}

/// Encode a single attribute value. Non-primitive variants use their
/// textual form.
pub fn value_to_json(value: &Value) -> Result<JsonValue, Error> {
    match value {
        Value::Number(x) => number_to_json(*x),
        Value::Vector(values) => values
            .iter()
            .map(|x| number_to_json(*x))
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array),
        Value::List(values) => values
            .iter()
            .map(value_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array),
        Value::EscapedString(s) | Value::Name(s) | Value::ArithExpression(s) => {
            Ok(JsonValue::String(s.clone()))
        }
        Value::WithUnit { .. } | Value::NameBitSelection { .. } => {
            Ok(JsonValue::String(value.to_string()))
        }
    }
}

/// Project a group and its descendants into a JSON object.
pub fn group_to_json(group: &Group) -> Result<JsonValue, Error> {
    let mut object = Map::new();

    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for attribute in &group.attributes {
        *counts.entry(attribute.name.as_str()).or_insert(0) += 1;
    }
    for attribute in &group.attributes {
        let encoded = value_to_json(&attribute.value)?;
        if counts.get(attribute.name.as_str()) == Some(&1) {
            object.insert(attribute.name.clone(), encoded);
        } else {
            let slot = object
                .entry(format!("comp_attribute,{}", attribute.name))
                .or_insert_with(|| JsonValue::Array(Vec::new()));
            if let JsonValue::Array(values) = slot {
                values.push(encoded);
            }
        }
    }

    if !group.defines.is_empty() {
        let defines: Vec<JsonValue> = group
            .defines
            .iter()
            .map(|define| {
                let mut encoded = Map::new();
                encoded.insert(
                    "attribute_name".to_string(),
                    JsonValue::String(define.attribute_name.clone()),
                );
                encoded.insert(
                    "group_name".to_string(),
                    JsonValue::String(define.group_name.clone()),
                );
                encoded.insert(
                    "attribute_type".to_string(),
                    JsonValue::String(define.attribute_type.clone()),
                );
                JsonValue::Object(encoded)
            })
            .collect();
        object.insert("define".to_string(), JsonValue::Array(defines));
    }

    let mut cells = Map::new();
    for child in &group.groups {
        let encoded = group_to_json(child)?;
        match child.args.first() {
            Some(arg) if child.group_name == "cell" => {
                cells.insert(arg.text(), encoded);
            }
            Some(arg) => {
                object.insert(format!("{},{}", child.group_name, arg.text()), encoded);
            }
            // Argument-less children live under their bare group name;
            // repeated siblings turn the entry into an array.
            None => match object.entry(child.group_name.clone()) {
                Entry::Vacant(slot) => {
                    slot.insert(encoded);
                }
                Entry::Occupied(mut slot) => {
                    let current = slot.get_mut();
                    if let JsonValue::Array(siblings) = current {
                        siblings.push(encoded);
                    } else {
                        let first = current.take();
                        *current = JsonValue::Array(vec![first, encoded]);
                    }
                }
            },
        }
    }
    if !cells.is_empty() {
        object.insert("cells".to_string(), JsonValue::Object(cells));
    }

    Ok(JsonValue::Object(object))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse;
    use serde_json::json;

    #[test]
    fn test_value_encoding() {
        assert_eq!(value_to_json(&Value::Number(1.5)).unwrap(), json!(1.5));
        assert_eq!(
            value_to_json(&Value::WithUnit {
                value: 1.0,
                unit: "ns".to_string()
            })
            .unwrap(),
            json!("1ns")
        );
        assert_eq!(
            value_to_json(&Value::EscapedString("A & B".to_string())).unwrap(),
            json!("A & B")
        );
        assert_eq!(
            value_to_json(&Value::Vector(vec![1.0, 2.0])).unwrap(),
            json!([1.0, 2.0])
        );
        assert_eq!(
            value_to_json(&Value::NameBitSelection {
                name: "B".to_string(),
                hi: 32,
                lo: Some(0)
            })
            .unwrap(),
            json!("B[32:0]")
        );
        assert!(value_to_json(&Value::Number(f64::NAN)).is_err());
    }

    #[test]
    fn test_attribute_multiplicity_keys() {
        let library = parse(
            r#"
            wire_load("W") {
                slope : 5;
                fanout_length(1, 1.32);
                fanout_length(2, 2.98);
            }
            "#,
        )
        .unwrap();
        let projected = group_to_json(&library).unwrap();
        assert_eq!(
            projected,
            json!({
                "slope": 5.0,
                "comp_attribute,fanout_length": [[1.0, 1.32], [2.0, 2.98]],
            })
        );
    }

    #[test]
    fn test_cells_and_composite_keys() {
        let library = parse(
            r#"
            library(demo) {
                define(a, b, c);
                operating_conditions(typical) {
                    process : 1;
                }
                cell(INV) {
                    area : 1;
                    pin(Y) {
                        function : "A'";
                        timing() {
                            related_pin : "A";
                        }
                        timing() {
                            related_pin : "B";
                        }
                    }
                }
            }
            "#,
        )
        .unwrap();
        let projected = library.to_json_value().unwrap();
        assert_eq!(
            projected,
            json!({
                "define": [
                    {"attribute_name": "a", "group_name": "b", "attribute_type": "c"}
                ],
                "operating_conditions,typical": {"process": 1.0},
                "cells": {
                    "INV": {
                        "area": 1.0,
                        "pin,Y": {
                            "function": "A'",
                            "timing": [
                                {"related_pin": "A"},
                                {"related_pin": "B"}
                            ]
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_single_argless_child_is_object() {
        let library = parse("pin(Y) { timing() { related_pin : \"A\"; } }").unwrap();
        let projected = group_to_json(&library).unwrap();
        assert_eq!(projected, json!({"timing": {"related_pin": "A"}}));
    }
}
