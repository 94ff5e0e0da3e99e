//! Boolean functions of pins (`function : "A & B";`).
//!
//! The sub-grammar has its own precedence, tightest first: negation
//! (prefix `!` or postfix `'`), XOR (`^`), AND (`&`, `*`, or plain
//! juxtaposition), OR (`+`, `|`). The constants `0` and `1` are signals
//! tied to a rail.

use std::collections::BTreeSet;
use std::fmt;

use itertools::Itertools;
use nom::{
    branch::alt,
    bytes::complete::{take_while, take_while_m_n},
    character::complete::{char, one_of},
    combinator::{all_consuming, map, recognize},
    error::ParseError,
    multi::many0,
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::ast::{Group, Value};
use crate::error::Error;

/// Symbolic boolean expression tree.
///
/// `And`/`Or`/`Xor` are variadic; the parser builds one node per operator
/// chain (`a + b + c` is a single three-way `Or`).
#[derive(Debug, Clone, PartialEq)]
pub enum BooleanExpr {
    Var(String),
    Const(bool),
    Not(Box<BooleanExpr>),
    And(Vec<BooleanExpr>),
    Or(Vec<BooleanExpr>),
    Xor(Vec<BooleanExpr>),
}

impl BooleanExpr {
    pub fn var(name: &str) -> Self {
        BooleanExpr::Var(name.to_string())
    }

    pub fn not(expr: BooleanExpr) -> Self {
        BooleanExpr::Not(Box::new(expr))
    }

    /// Evaluate under an assignment of the variables.
    pub fn evaluate<F: Fn(&str) -> bool>(&self, lookup: &F) -> bool {
        match self {
            BooleanExpr::Var(name) => lookup(name),
            BooleanExpr::Const(value) => *value,
            BooleanExpr::Not(inner) => !inner.evaluate(lookup),
            BooleanExpr::And(items) => items.iter().all(|e| e.evaluate(lookup)),
            BooleanExpr::Or(items) => items.iter().any(|e| e.evaluate(lookup)),
            BooleanExpr::Xor(items) => items.iter().fold(false, |acc, e| acc ^ e.evaluate(lookup)),
        }
    }

    /// All variable names, sorted.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut variables = BTreeSet::new();
        self.collect_variables(&mut variables);
        variables
    }

    fn collect_variables(&self, variables: &mut BTreeSet<String>) {
        match self {
            BooleanExpr::Var(name) => {
                variables.insert(name.clone());
            }
            BooleanExpr::Const(_) => {}
            BooleanExpr::Not(inner) => inner.collect_variables(variables),
            BooleanExpr::And(items) | BooleanExpr::Or(items) | BooleanExpr::Xor(items) => {
                for item in items {
                    item.collect_variables(variables);
                }
            }
        }
    }
}

impl fmt::Display for BooleanExpr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BooleanExpr::Var(name) => f.write_str(name),
            BooleanExpr::Const(true) => f.write_str("1"),
            BooleanExpr::Const(false) => f.write_str("0"),
            // `And` prints without its own parentheses, so a negated `And`
            // needs them to survive a re-parse.
            BooleanExpr::Not(inner) => match inner.as_ref() {
                BooleanExpr::And(_) => write!(f, "!({})", inner),
                _ => write!(f, "!{}", inner),
            },
            BooleanExpr::Or(items) => write!(f, "({})", items.iter().format(" + ")),
            BooleanExpr::Xor(items) => write!(f, "({})", items.iter().format(" ^ ")),
            BooleanExpr::And(items) => write!(f, "{}", items.iter().format(" & ")),
        }
    }
}

fn space<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    take_while(|c| c == ' ' || c == '\t')(input)
}

fn variable<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        take_while_m_n(1, 1, |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| c.is_ascii_alphanumeric() || c == '_'),
    ))(input)
}

/// Atom with postfix `'` inversions applied.
fn atom<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, BooleanExpr, E> {
    let (input, expr) = alt((
        map(one_of("01"), |c| BooleanExpr::Const(c == '1')),
        map(preceded(pair(char('!'), space), atom), BooleanExpr::not),
        delimited(
            char('('),
            delimited(space, or_expr, space),
            char(')'),
        ),
        map(variable, BooleanExpr::var),
    ))(input)?;
    let (input, quotes) = many0(preceded(space, char('\'')))(input)?;
    let expr = quotes
        .iter()
        .fold(expr, |inner, _| BooleanExpr::not(inner));
    Ok((input, expr))
}

fn xor_expr<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, BooleanExpr, E> {
    let (input, first) = atom(input)?;
    let (input, rest) = many0(preceded(
        preceded(space, char('^')),
        preceded(space, atom),
    ))(input)?;
    Ok((input, chain(BooleanExpr::Xor, first, rest)))
}

fn and_expr<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, BooleanExpr, E> {
    let (input, first) = xor_expr(input)?;
    let (input, rest) = many0(alt((
        preceded(preceded(space, one_of("&*")), preceded(space, xor_expr)),
        // Juxtaposition is AND: `C D` and `A(B + C)`.
        preceded(space, xor_expr),
    )))(input)?;
    Ok((input, chain(BooleanExpr::And, first, rest)))
}

fn or_expr<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, BooleanExpr, E> {
    let (input, first) = and_expr(input)?;
    let (input, rest) = many0(preceded(
        preceded(space, one_of("+|")),
        preceded(space, and_expr),
    ))(input)?;
    Ok((input, chain(BooleanExpr::Or, first, rest)))
}

fn chain(
    wrap: fn(Vec<BooleanExpr>) -> BooleanExpr,
    first: BooleanExpr,
    rest: Vec<BooleanExpr>,
) -> BooleanExpr {
    if rest.is_empty() {
        first
    } else {
        let mut items = Vec::with_capacity(1 + rest.len());
        items.push(first);
        items.extend(rest);
        wrap(items)
    }
}

/// Parse a Liberty pin-function expression.
pub fn parse_boolean_function(input: &str) -> Result<BooleanExpr, Error> {
    match all_consuming::<_, _, (&str, nom::error::ErrorKind), _>(delimited(
        space, or_expr, space,
    ))(input)
    {
        Ok((_, expr)) => Ok(expr),
        Err(_) => Err(Error::BooleanFunction {
            message: format!("invalid expression '{}'", input.trim()),
        }),
    }
}

/// Format an expression in Liberty syntax; the whole expression is wrapped
/// in parentheses.
pub fn format_boolean_function(function: &BooleanExpr) -> String {
    format!("({})", function)
}

impl Group {
    /// Parse the attribute `key` (typically `function`) as a boolean
    /// expression. Returns `None` when the attribute is absent.
    pub fn get_boolean_function(&self, key: &str) -> Result<Option<BooleanExpr>, Error> {
        let value = match self.get_attribute(key)? {
            Some(value) => value,
            None => return Ok(None),
        };
        let text = match value {
            Value::EscapedString(s) | Value::Name(s) | Value::ArithExpression(s) => s,
            other => {
                return Err(Error::Type {
                    kind: other.kind().to_string(),
                });
            }
        };
        parse_boolean_function(text).map(Some)
    }

    /// Store `function` under `key` as a quoted string, replacing any
    /// existing attribute with that name.
    pub fn set_boolean_function(&mut self, key: &str, function: &BooleanExpr) {
        self.set_attribute(
            key,
            Value::EscapedString(format_boolean_function(function)),
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::parse;

    fn var(name: &str) -> BooleanExpr {
        BooleanExpr::var(name)
    }

    #[test]
    fn test_precedence() {
        // XOR binds tighter than AND, AND tighter than OR.
        assert_eq!(
            parse_boolean_function("A + B & C").unwrap(),
            BooleanExpr::Or(vec![
                var("A"),
                BooleanExpr::And(vec![var("B"), var("C")])
            ])
        );
        assert_eq!(
            parse_boolean_function("A ^ B & C").unwrap(),
            BooleanExpr::And(vec![
                BooleanExpr::Xor(vec![var("A"), var("B")]),
                var("C")
            ])
        );
        assert_eq!(
            parse_boolean_function("A B C").unwrap(),
            BooleanExpr::And(vec![var("A"), var("B"), var("C")])
        );
    }

    #[test]
    fn test_negation_forms() {
        assert_eq!(
            parse_boolean_function("!A").unwrap(),
            BooleanExpr::not(var("A"))
        );
        assert_eq!(
            parse_boolean_function("A'").unwrap(),
            BooleanExpr::not(var("A"))
        );
        assert_eq!(
            parse_boolean_function("!A'").unwrap(),
            BooleanExpr::not(BooleanExpr::not(var("A")))
        );
        assert_eq!(
            parse_boolean_function("(A + B)'").unwrap(),
            BooleanExpr::not(BooleanExpr::Or(vec![var("A"), var("B")]))
        );
    }

    #[test]
    fn test_constants() {
        assert_eq!(
            parse_boolean_function("A & 1 + 0").unwrap(),
            BooleanExpr::Or(vec![
                BooleanExpr::And(vec![var("A"), BooleanExpr::Const(true)]),
                BooleanExpr::Const(false),
            ])
        );
    }

    #[test]
    fn test_reference_expression() {
        // A' + B + C & D + E ^ F * G | (H + I)
        let parsed =
            parse_boolean_function("A' + B + C & D + E ^ F * G | (H + I)").unwrap();
        let expected = BooleanExpr::Or(vec![
            BooleanExpr::not(var("A")),
            var("B"),
            BooleanExpr::And(vec![var("C"), var("D")]),
            BooleanExpr::And(vec![
                BooleanExpr::Xor(vec![var("E"), var("F")]),
                var("G"),
            ]),
            BooleanExpr::Or(vec![var("H"), var("I")]),
        ]);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(parse_boolean_function("A &").is_err());
        assert!(parse_boolean_function("(A + B").is_err());
        assert!(parse_boolean_function("").is_err());
    }

    #[test]
    fn test_format() {
        let expr = BooleanExpr::Or(vec![
            BooleanExpr::not(var("A")),
            BooleanExpr::And(vec![var("B"), var("C")]),
        ]);
        assert_eq!(format_boolean_function(&expr), "((!A + B & C))");

        let negated_and = BooleanExpr::not(BooleanExpr::And(vec![var("A"), var("B")]));
        assert_eq!(format_boolean_function(&negated_and), "(!(A & B))");
    }

    fn assert_equivalent(expr: &BooleanExpr) {
        let formatted = format_boolean_function(expr);
        let reparsed = parse_boolean_function(&formatted).unwrap();
        let variables: Vec<String> = expr.variables().into_iter().collect();
        for assignment in 0u32..(1 << variables.len()) {
            let lookup = |name: &str| {
                variables
                    .iter()
                    .position(|v| v == name)
                    .map_or(false, |i| assignment & (1 << i) != 0)
            };
            assert_eq!(
                expr.evaluate(&lookup),
                reparsed.evaluate(&lookup),
                "diverges on {} under assignment {:b}",
                formatted,
                assignment
            );
        }
    }

    #[test]
    fn test_format_parse_equivalence() {
        let a = || var("A");
        let b = || var("B");
        let c = || var("C");
        let samples = vec![
            BooleanExpr::not(a()),
            BooleanExpr::And(vec![a(), b(), c()]),
            BooleanExpr::Or(vec![a(), BooleanExpr::And(vec![b(), c()])]),
            BooleanExpr::Xor(vec![a(), b()]),
            BooleanExpr::not(BooleanExpr::And(vec![a(), b()])),
            BooleanExpr::not(BooleanExpr::Or(vec![a(), b()])),
            BooleanExpr::And(vec![
                BooleanExpr::Or(vec![a(), b()]),
                BooleanExpr::Xor(vec![b(), c()]),
            ]),
            BooleanExpr::Or(vec![
                BooleanExpr::not(a()),
                BooleanExpr::And(vec![BooleanExpr::Xor(vec![a(), b()]), c()]),
                BooleanExpr::Const(true),
            ]),
        ];
        for expr in &samples {
            assert_equivalent(expr);
        }
    }

    #[test]
    fn test_group_accessors() {
        let mut library = parse(
            r#"
            library(l) {
                cell(AOI21) {
                    pin(Y) {
                        function : "(A B + C)'";
                    }
                }
            }
            "#,
        )
        .unwrap();
        let function = library
            .get_group("cell", Some("AOI21"))
            .unwrap()
            .get_group("pin", Some("Y"))
            .unwrap()
            .get_boolean_function("function")
            .unwrap()
            .unwrap();
        assert_eq!(
            function,
            BooleanExpr::not(BooleanExpr::Or(vec![
                BooleanExpr::And(vec![BooleanExpr::var("A"), BooleanExpr::var("B")]),
                BooleanExpr::var("C"),
            ]))
        );

        assert_eq!(library.get_boolean_function("missing").unwrap(), None);

        library.set_boolean_function("default_function", &function);
        let round_trip = library
            .get_boolean_function("default_function")
            .unwrap()
            .unwrap();
        assert_eq!(round_trip, function);
    }
}
