//! The in-memory model of a Liberty file: groups, attributes, defines, and
//! the tagged value type, together with the formatter that turns the tree
//! back into Liberty text.
//!
//! Attributes are kept in an order-preserving, duplicate-permitting vector.
//! Liberty relies on repetition (`fanout_length(1, 1.32); fanout_length(2,
//! 2.98);`), so a map keyed by attribute name would silently drop data.

use std::fmt;

use itertools::Itertools;

use crate::error::Error;

/// An attribute value.
///
/// The parser always returns the most specific variant; `ArithExpression`
/// is intentionally opaque and kept as its source text.
#[derive(Debug, PartialEq, Clone)]
pub enum Value {
    /// Any numeric literal; Liberty's integers are not distinguished from
    /// its floats.
    Number(f64),
    /// A number with a unit suffix, e.g. `1ns` or `2.5e-1EV`.
    WithUnit { value: f64, unit: String },
    /// Inner text of a double-quoted literal, unescaped.
    EscapedString(String),
    /// Bareword identifier.
    Name(String),
    /// Unevaluated arithmetic over names and numbers, e.g. `VDD * 1.1 + 0.5`.
    ArithExpression(String),
    /// Bit-sliced identifier, e.g. `A[25]` or `B[32:0]`.
    NameBitSelection {
        name: String,
        hi: i64,
        lo: Option<i64>,
    },
    /// Quoted comma-separated numbers, e.g. `"0.1, 0.2, 0.3"`.
    Vector(Vec<f64>),
    /// Positional argument list of a complex attribute.
    List(Vec<Value>),
}

impl Value {
    /// Numeric view of `Number` and `WithUnit` values.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(x) => Some(*x),
            Value::WithUnit { value, .. } => Some(*value),
            _ => None,
        }
    }

    /// Text of the value as used for lookups and JSON keys: the inner text
    /// for names, strings, and expressions, the formatted form otherwise.
    pub fn text(&self) -> String {
        match self {
            Value::Name(s) | Value::EscapedString(s) | Value::ArithExpression(s) => s.clone(),
            other => other.to_string(),
        }
    }

    /// Short kind label used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::WithUnit { .. } => "number with unit",
            Value::EscapedString(_) => "string",
            Value::Name(_) => "name",
            Value::ArithExpression(_) => "arithmetic expression",
            Value::NameBitSelection { .. } => "bit selection",
            Value::Vector(_) => "vector",
            Value::List(_) => "list",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Number(x) => write!(f, "{}", x),
            Value::WithUnit { value, unit } => write!(f, "{}{}", value, unit),
            Value::EscapedString(s) => write!(f, "\"{}\"", s.replace('"', "\\\"")),
            Value::Name(s) => f.write_str(s),
            Value::ArithExpression(s) => f.write_str(s),
            Value::NameBitSelection {
                name,
                hi,
                lo: Some(lo),
            } => write!(f, "{}[{}:{}]", name, hi, lo),
            Value::NameBitSelection { name, hi, lo: None } => write!(f, "{}[{}]", name, hi),
            Value::Vector(values) => write!(f, "\"{}\"", values.iter().format(", ")),
            Value::List(values) => write!(f, "({})", values.iter().format(", ")),
        }
    }
}

/// A name/value pair. Complex attributes carry a [`Value::List`].
#[derive(Debug, PartialEq, Clone)]
pub struct Attribute {
    pub name: String,
    pub value: Value,
}

impl Attribute {
    pub fn new(name: &str, value: Value) -> Self {
        Self {
            name: name.to_string(),
            value,
        }
    }
}

/// A user-declared attribute extension:
/// `define (attribute_name, group_name, attribute_type);`
#[derive(Debug, PartialEq, Clone)]
pub struct Define {
    pub attribute_name: String,
    pub group_name: String,
    pub attribute_type: String,
}

impl fmt::Display for Define {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "define (\"{}\", \"{}\", \"{}\")",
            self.attribute_name, self.group_name, self.attribute_type
        )
    }
}

/// A named, argument-bearing block containing attributes, defines, and
/// nested groups. All containers preserve declaration order so the tree can
/// be written back out as Liberty text.
#[derive(Debug, PartialEq, Clone)]
pub struct Group {
    pub group_name: String,
    pub args: Vec<Value>,
    pub attributes: Vec<Attribute>,
    pub defines: Vec<Define>,
    pub groups: Vec<Group>,
}

impl Group {
    pub fn new(group_name: &str) -> Self {
        Self {
            group_name: group_name.to_string(),
            args: vec![],
            attributes: vec![],
            defines: vec![],
            groups: vec![],
        }
    }

    /// All child groups of type `type_name`, optionally filtered by their
    /// first argument.
    pub fn get_groups(&self, type_name: &str, argument: Option<&str>) -> Vec<&Group> {
        self.groups
            .iter()
            .filter(|g| {
                g.group_name == type_name
                    && argument.map_or(true, |wanted| {
                        g.args.first().map_or(false, |arg| arg.text() == wanted)
                    })
            })
            .collect()
    }

    /// Exactly one child group of type `type_name`.
    pub fn get_group(&self, type_name: &str, argument: Option<&str>) -> Result<&Group, Error> {
        let groups = self.get_groups(type_name, argument);
        match groups.as_slice() {
            [only] => Ok(only),
            _ => Err(Error::NotUnique {
                key: type_name.to_string(),
                count: groups.len(),
            }),
        }
    }

    /// All values declared under `key`, in declaration order.
    pub fn get_attributes(&self, key: &str) -> Vec<&Value> {
        self.attributes
            .iter()
            .filter(|a| a.name == key)
            .map(|a| &a.value)
            .collect()
    }

    /// The single value declared under `key`, `None` when absent, and
    /// `NotUnique` when the name is repeated.
    pub fn get_attribute(&self, key: &str) -> Result<Option<&Value>, Error> {
        let values = self.get_attributes(key);
        match values.as_slice() {
            [] => Ok(None),
            [only] => Ok(Some(only)),
            _ => Err(Error::NotUnique {
                key: key.to_string(),
                count: values.len(),
            }),
        }
    }

    /// Replace the first attribute named `key` in place (removing later
    /// duplicates), or append a new one.
    pub fn set_attribute(&mut self, key: &str, value: Value) {
        match self.attributes.iter().position(|a| a.name == key) {
            Some(position) => {
                self.attributes[position].value = value;
                let mut index = position + 1;
                while index < self.attributes.len() {
                    if self.attributes[index].name == key {
                        self.attributes.remove(index);
                    } else {
                        index += 1;
                    }
                }
            }
            None => self.attributes.push(Attribute::new(key, value)),
        }
    }

    /// Sorted, deduplicated attribute names, for error messages.
    pub(crate) fn attribute_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.attributes.iter().map(|a| a.name.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    fn write_indented(&self, f: &mut fmt::Formatter, level: usize) -> fmt::Result {
        let pad = level * 2;
        let inner = (level + 1) * 2;
        writeln!(
            f,
            "{:pad$}{} ({}) {{",
            "",
            self.group_name,
            self.args.iter().format(", "),
            pad = pad
        )?;
        for define in &self.defines {
            writeln!(f, "{:inner$}{};", "", define, inner = inner)?;
        }
        for attribute in &self.attributes {
            match &attribute.value {
                Value::List(values)
                    if values
                        .iter()
                        .any(|v| matches!(v, Value::EscapedString(_) | Value::Vector(_))) =>
                {
                    // Table form: one quoted row per line, continued with
                    // backslashes.
                    writeln!(f, "{:inner$}{} (", "", attribute.name, inner = inner)?;
                    let row_pad = (level + 2) * 2;
                    for (index, value) in values.iter().enumerate() {
                        if index + 1 < values.len() {
                            writeln!(f, "{:row_pad$}{}, \\", "", value, row_pad = row_pad)?;
                        } else {
                            writeln!(f, "{:row_pad$}{}", "", value, row_pad = row_pad)?;
                        }
                    }
                    writeln!(f, "{:inner$});", "", inner = inner)?;
                }
                Value::List(values) => {
                    writeln!(
                        f,
                        "{:inner$}{} ({});",
                        "",
                        attribute.name,
                        values.iter().format(", "),
                        inner = inner
                    )?;
                }
                value => {
                    writeln!(f, "{:inner$}{}: {};", "", attribute.name, value, inner = inner)?;
                }
            }
        }
        for sub in &self.groups {
            sub.write_indented(f, level + 1)?;
        }
        writeln!(f, "{:pad$}}}", "", pad = pad)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.write_indented(f, 0)
    }
}
