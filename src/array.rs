//! Rectangular numeric tables, as used by `index_1`/`values` attributes.
//!
//! A Liberty table like `values("0.1, 0.2", "0.3, 0.4")` is a list of
//! quoted rows; this module converts between that encoding and a flat
//! row-major matrix.

use crate::ast::{Group, Value};
use crate::error::Error;

/// A 1-D or 2-D array of `f64` values.
///
/// `shape` is `[len]` for a single row and `[rows, columns]` otherwise;
/// `data` is row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Array {
    shape: Vec<usize>,
    data: Vec<f64>,
}

impl Array {
    /// Build a 1-D array.
    pub fn from_vec(data: Vec<f64>) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    /// Build a 2-D array from rows, which must all share one length.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, Error> {
        let expected = rows.first().map_or(0, |row| row.len());
        let mut data = Vec::with_capacity(rows.len() * expected);
        for row in rows {
            if row.len() != expected {
                return Err(Error::ShapeMismatch {
                    expected,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            shape: vec![rows.len(), expected],
            data,
        })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Iterate over the rows (a 1-D array yields itself once).
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        let width = self.shape.last().copied().unwrap_or(0);
        self.data.chunks(width.max(1))
    }

    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        let width = self.shape.last().copied().unwrap_or(0);
        if column < width {
            self.data.get(row * width + column).copied()
        } else {
            None
        }
    }
}

/// One table row out of an attribute element.
fn row_values(value: &Value) -> Result<Vec<f64>, Error> {
    match value {
        Value::Vector(row) => Ok(row.clone()),
        Value::Number(x) => Ok(vec![*x]),
        Value::EscapedString(text) => text
            .split(',')
            .map(|field| {
                field.trim().parse::<f64>().map_err(|_| Error::Type {
                    kind: "string".to_string(),
                })
            })
            .collect(),
        other => Err(Error::Type {
            kind: other.kind().to_string(),
        }),
    }
}

impl Group {
    /// Decode the complex attribute `key` into an [`Array`]. A single
    /// quoted row yields a 1-D array, several rows a 2-D array; ragged rows
    /// are a [`Error::ShapeMismatch`].
    pub fn get_array(&self, key: &str) -> Result<Array, Error> {
        let value = self.get_attribute(key)?.ok_or_else(|| Error::NotFound {
            key: key.to_string(),
            available: self.attribute_names(),
        })?;
        let rows: Vec<Vec<f64>> = match value {
            Value::List(values) => values.iter().map(row_values).collect::<Result<_, _>>()?,
            single => vec![row_values(single)?],
        };
        if rows.len() == 1 {
            Ok(Array::from_vec(rows.into_iter().next().unwrap_or_default()))
        } else {
            Array::from_rows(&rows)
        }
    }

    /// Encode `array` as a complex attribute of quoted rows under `key`,
    /// replacing any existing attribute with that name.
    pub fn set_array(&mut self, key: &str, array: &Array) {
        let rows: Vec<Value> = array.rows().map(|row| Value::Vector(row.to_vec())).collect();
        self.set_attribute(key, Value::List(rows));
    }
}
