//! This crate reads Liberty format files, commonly used by
//! [EDA](https://en.wikipedia.org/wiki/Electronic_design_automation) tools to describe library
//! cells (standard cells, hard IP, etc.), keeps them in a typed group tree
//! that can be queried and written back out, and projects them to JSON.
//!
//! # Example
//!
//! ```
//! let lib_str = r#"
//! library(sample) {
//!     cell(AND2) {
//!         area: 1;
//!         pin(Z) {
//!             direction : output;
//!             function : "A & B";
//!         }
//!     }
//! }
//! "#;
//!
//! let library = liberty_tojson::parse(lib_str).unwrap();
//! let cell = liberty_tojson::select_cell(&library, "AND2").unwrap();
//! let area = cell.get_attribute("area").unwrap().and_then(|v| v.as_f64());
//! assert_eq!(area, Some(1.0));
//!
//! let pin = liberty_tojson::select_pin(cell, "Z").unwrap();
//! let function = pin.get_boolean_function("function").unwrap().unwrap();
//! assert_eq!(function.variables().len(), 2);
//!
//! // The tree formats back into Liberty text...
//! let round_trip = liberty_tojson::parse(&library.to_liberty_string()).unwrap();
//! assert_eq!(round_trip, library);
//!
//! // ...or into JSON for downstream tooling.
//! let mut json = Vec::new();
//! library.to_json(&mut json).unwrap();
//! ```

pub mod array;
pub mod ast;
pub mod boolean;
mod error;
pub mod json;
pub mod liberty;
mod parser;

pub use array::Array;
pub use ast::{Attribute, Define, Group, Value};
pub use boolean::{format_boolean_function, parse_boolean_function, BooleanExpr};
pub use error::Error;
pub use liberty::{
    select_cell, select_pin, select_timing_group, select_timing_table, Library,
};

/// Parse a Liberty file containing exactly one top-level group.
///
/// Use [`parse_multi`] for files that may carry several libraries.
pub fn parse(input: &str) -> Result<Library, Error> {
    let mut libraries = parse_multi(input)?;
    if libraries.len() == 1 {
        Ok(libraries.remove(0))
    } else {
        Err(Error::NotUnique {
            key: "top-level group".to_string(),
            count: libraries.len(),
        })
    }
}

/// Parse a Liberty file with any number of top-level groups.
pub fn parse_multi(input: &str) -> Result<Vec<Library>, Error> {
    match parser::parse_groups::<nom::error::VerboseError<&str>>(input) {
        Ok((_, groups)) => Ok(groups.into_iter().map(Library).collect()),
        Err(err) => Err(Error::from_nom(input, err)),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    macro_rules! parse_file {
        ($fname:ident) => {{
            let data = include_str!(concat!("../data/", stringify!($fname), ".lib"));
            parse_multi(data).unwrap()
        }};
    }

    #[test]
    fn test_files() {
        assert_eq!(parse_file!(small).len(), 1);
        assert_eq!(parse_file!(cells).len(), 1);
    }

    #[test]
    fn test_files_round_trip() {
        for library in parse_file!(small).into_iter().chain(parse_file!(cells)) {
            let formatted = library.to_liberty_string();
            let reparsed = parse(&formatted).unwrap();
            assert_eq!(reparsed, library);
            assert_eq!(reparsed.to_liberty_string(), formatted);
        }
    }

    #[test]
    fn test_parse_single_library() {
        let library = parse("library(test){ time_unit: 1ns; }").unwrap();
        assert_eq!(library.group_name, "library");
        assert_eq!(library.args, vec![Value::Name("test".to_string())]);
        assert_eq!(
            library.get_attribute("time_unit").unwrap(),
            Some(&Value::WithUnit {
                value: 1.0,
                unit: "ns".to_string()
            })
        );
    }

    #[test]
    fn test_parse_requires_one_top_group() {
        match parse("library(a){}\nlibrary(b){}") {
            Err(Error::NotUnique { count: 2, .. }) => {}
            other => panic!("expected NotUnique, got {:?}", other),
        }
        match parse("") {
            Err(Error::NotUnique { count: 0, .. }) => {}
            other => panic!("expected NotUnique, got {:?}", other),
        }
        assert_eq!(parse_multi("").unwrap().len(), 0);
    }

    #[test]
    fn test_parse_error_reports_position() {
        match parse("library(test){\n  broken : ;\n}") {
            Err(Error::Parse { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected Parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_operating_conditions_name_with_dots() {
        let library =
            parse("operating_conditions(ff28_1.05V_0.00V_0.00V_0.00V_125C_7y50kR){}").unwrap();
        assert_eq!(
            library.args,
            vec![Value::Name(
                "ff28_1.05V_0.00V_0.00V_0.00V_125C_7y50kR".to_string()
            )]
        );
    }

    #[test]
    fn test_arithmetic_expression_attribute() {
        let library = parse("input_voltage(cmos){ vimax : VDD * 1.1 + 0.5 ; }").unwrap();
        assert_eq!(
            library.get_attribute("vimax").unwrap(),
            Some(&Value::ArithExpression("VDD * 1.1 + 0.5".to_string()))
        );
    }

    #[test]
    fn test_defines_parse_and_format() {
        let library = parse(
            r#"
            library(){
                define ("a", "b", "c");
                define (d, "e", f);
                define (g, h, i)
            }
            "#,
        )
        .unwrap();
        assert_eq!(library.defines.len(), 3);
        assert_eq!(library.defines[1].attribute_name, "d");
        assert_eq!(library.defines[1].group_name, "e");
        assert_eq!(library.defines[2].attribute_type, "i");
        let reparsed = parse(&library.to_liberty_string()).unwrap();
        assert_eq!(reparsed.defines, library.defines);
    }
}
