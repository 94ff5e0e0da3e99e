//! nom combinators for the Liberty grammar.
//!
//! The lexical quirks of the format are handled here rather than in the
//! model: backslash-newline continuations and `/* ... */` comments are
//! skipped wherever whitespace is legal, and the number-vs-unit decision
//! (`1e3` is a number, `1eV` is a number with a unit) is made while lexing
//! the token.

use crate::ast::{Attribute, Define, Group, Value};

use nom::{
    branch::alt,
    bytes::complete::{tag, take_until, take_while, take_while1, take_while_m_n},
    character::complete::{char, digit0, digit1, line_ending, multispace0, multispace1, one_of},
    combinator::{all_consuming, cut, map, map_res, opt, recognize, verify},
    error::{context, ErrorKind, ParseError},
    multi::{many0, many1, separated_list},
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};

/// A single statement inside a group body.
enum Statement {
    Attribute(Attribute),
    Define(Define),
    SubGroup(Group),
}

/// Skip whitespace, `/* ... */` comments, and backslash-newline continuations.
fn sp<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, (), E> {
    map(
        many0(alt((
            map(multispace1, |_| ()),
            map(comment, |_| ()),
            map(pair(char('\\'), line_ending), |_| ()),
        ))),
        |_| (),
    )(input)
}

fn comment<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    context(
        "comment",
        recognize(delimited(tag("/*"), take_until("*/"), tag("*/"))),
    )(input)
}

fn name<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    context(
        "name",
        recognize(pair(
            take_while_m_n(1, 1, |c: char| c.is_ascii_alphabetic() || c == '_'),
            take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '!')),
        )),
    )(input)
}

/// Bare string as allowed inside `define(...)` arguments.
fn define_string<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    recognize(pair(
        take_while_m_n(1, 1, |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(|c: char| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-' | ':' | '!')
        }),
    ))(input)
}

/// Decimal/scientific literal. The exponent is consumed only when digits
/// follow it, so `1eV` lexes as the number `1` with the unit `eV`.
fn signed_number<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    context(
        "number",
        recognize(tuple((
            opt(one_of("+-")),
            alt((
                recognize(pair(digit1, opt(pair(char('.'), digit0)))),
                recognize(pair(char('.'), digit1)),
            )),
            opt(recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))),
        ))),
    )(input)
}

fn number<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, f64, E> {
    map_res(signed_number, |s: &str| s.parse::<f64>())(input)
}

/// Unit suffix: one alphabetic char other than `e`/`E`, or two-plus chars.
fn unit<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    verify(take_while1(|c: char| c.is_ascii_alphabetic()), |u: &str| {
        u.len() >= 2 || !matches!(u, "e" | "E")
    })(input)
}

fn number_with_unit<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Value, E> {
    context(
        "number with unit",
        map(pair(number, unit), |(value, unit)| Value::WithUnit {
            value,
            unit: unit.to_string(),
        }),
    )(input)
}

/// Inner text of a double-quoted literal. `\"` unescapes to `"` and
/// backslash-newline continuations are stripped; any other backslash pair
/// is kept verbatim. Fails hard on an unterminated literal.
fn escaped_string<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    let (mut rest, _) = char('"')(input)?;
    let mut value = String::new();
    loop {
        let mut chars = rest.chars();
        match chars.next() {
            None => {
                return Err(nom::Err::Failure(E::add_context(
                    input,
                    "closing quote",
                    E::from_error_kind(rest, ErrorKind::Char),
                )));
            }
            Some('"') => return Ok((&rest[1..], value)),
            Some('\\') => match chars.next() {
                Some('"') => {
                    value.push('"');
                    rest = &rest[2..];
                }
                Some('\n') => rest = &rest[2..],
                Some('\r') if rest[2..].starts_with('\n') => rest = &rest[3..],
                Some(other) => {
                    value.push('\\');
                    value.push(other);
                    rest = &rest[1 + other.len_utf8()..];
                }
                None => {
                    return Err(nom::Err::Failure(E::add_context(
                        input,
                        "closing quote",
                        E::from_error_kind(rest, ErrorKind::Char),
                    )));
                }
            },
            Some(other) => {
                value.push(other);
                rest = &rest[other.len_utf8()..];
            }
        }
    }
}

/// A quoted token: a `Vector` when the unescaped contents are one or more
/// comma-separated numbers, an `EscapedString` otherwise.
fn quoted_value<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Value, E> {
    let (rest, inner) = context("quoted value", escaped_string)(input)?;
    let numbers = all_consuming::<_, _, (&str, ErrorKind), _>(delimited(
        multispace0,
        separated_list(preceded(multispace0, char(',')), preceded(multispace0, number)),
        multispace0,
    ))(inner.as_str());
    match numbers {
        Ok((_, floats)) if !floats.is_empty() => Ok((rest, Value::Vector(floats))),
        _ => Ok((rest, Value::EscapedString(inner))),
    }
}

fn arith_operand<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, &'a str, E> {
    alt((name, signed_number))(input)
}

/// Unevaluated arithmetic over names and numbers. Requires at least one
/// infix operator (or the unary `!name` form) so that plain names and
/// numbers are not swallowed here.
fn arith_expression<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Value, E> {
    context(
        "arithmetic expression",
        alt((
            map(preceded(pair(char('!'), sp), name), |n| {
                Value::ArithExpression(format!("!{}", n))
            }),
            map(
                pair(
                    alt((recognize(pair(char('-'), name)), arith_operand)),
                    many1(pair(
                        preceded(sp, one_of("+-*/")),
                        preceded(sp, arith_operand),
                    )),
                ),
                |(first, rest)| {
                    let mut expr = first.to_string();
                    for (op, operand) in rest {
                        expr.push(' ');
                        expr.push(op);
                        expr.push(' ');
                        expr.push_str(operand);
                    }
                    Value::ArithExpression(expr)
                },
            ),
        )),
    )(input)
}

fn name_bit_selection<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Value, E> {
    context(
        "bit selection",
        map(
            tuple((
                name,
                preceded(sp, char('[')),
                preceded(sp, number),
                opt(preceded(preceded(sp, char(':')), opt(preceded(sp, number)))),
                preceded(sp, char(']')),
            )),
            |(name, _, hi, lo, _)| Value::NameBitSelection {
                name: name.to_string(),
                hi: hi as i64,
                lo: lo.and_then(|inner| inner).map(|x| x as i64),
            },
        ),
    )(input)
}

fn value<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Value, E> {
    context(
        "value",
        alt((
            quoted_value,
            arith_expression,
            number_with_unit,
            map(number, Value::Number),
            name_bit_selection,
            map(name, |n| Value::Name(n.to_string())),
        )),
    )(input)
}

/// RHS of a simple attribute. Two adjacent numbers (`version : 1.1 2`) are
/// accepted as a two-value list.
fn simple_value<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Value, E> {
    alt((
        map(
            tuple((
                number,
                take_while1(|c| c == ' ' || c == '\t'),
                number,
            )),
            |(first, _, second)| Value::List(vec![Value::Number(first), Value::Number(second)]),
        ),
        value,
    ))(input)
}

/// `name : value ;` with an optional trailing semicolon.
fn simple_attribute<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Attribute, E> {
    context(
        "simple attribute",
        map(
            tuple((
                name,
                preceded(sp, char(':')),
                cut(preceded(sp, simple_value)),
                opt(preceded(sp, char(';'))),
            )),
            |(name, _, value, _)| Attribute::new(name, value),
        ),
    )(input)
}

fn argument_list<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Vec<Value>, E> {
    context(
        "argument list",
        delimited(
            char('('),
            separated_list(preceded(sp, char(',')), preceded(sp, value)),
            preceded(sp, char(')')),
        ),
    )(input)
}

/// `name ( value, ... ) ;` with an optional trailing semicolon.
fn complex_attribute<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Attribute, E> {
    context(
        "complex attribute",
        map(
            tuple((
                name,
                preceded(sp, argument_list),
                opt(preceded(sp, char(';'))),
            )),
            |(name, values, _)| Attribute::new(name, Value::List(values)),
        ),
    )(input)
}

fn define_argument<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, String, E> {
    alt((escaped_string, map(define_string, String::from)))(input)
}

fn define<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Define, E> {
    context(
        "define",
        map(
            tuple((
                verify(name, |n: &str| n == "define"),
                preceded(sp, char('(')),
                preceded(sp, define_argument),
                preceded(preceded(sp, char(',')), preceded(sp, define_argument)),
                preceded(preceded(sp, char(',')), preceded(sp, define_argument)),
                preceded(sp, char(')')),
                opt(preceded(sp, char(';'))),
            )),
            |(_, _, attribute_name, group_name, attribute_type, _, _)| Define {
                attribute_name,
                group_name,
                attribute_type,
            },
        ),
    )(input)
}

fn statement<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Statement, E> {
    alt((
        map(group, Statement::SubGroup),
        map(define, Statement::Define),
        map(simple_attribute, Statement::Attribute),
        map(complex_attribute, Statement::Attribute),
    ))(input)
}

fn group<'a, E: ParseError<&'a str>>(input: &'a str) -> IResult<&'a str, Group, E> {
    context(
        "group",
        map(
            tuple((
                name,
                preceded(sp, argument_list),
                preceded(
                    preceded(sp, char('{')),
                    cut(terminated(
                        many0(preceded(sp, statement)),
                        preceded(sp, char('}')),
                    )),
                ),
            )),
            |(group_name, args, statements)| {
                let mut group = Group::new(group_name);
                group.args = args;
                for statement in statements {
                    match statement {
                        Statement::Attribute(attribute) => group.attributes.push(attribute),
                        Statement::Define(define) => group.defines.push(define),
                        Statement::SubGroup(sub) => group.groups.push(sub),
                    }
                }
                group
            },
        ),
    )(input)
}

/// Parse a whole file: any number of top-level groups.
pub(crate) fn parse_groups<'a, E: ParseError<&'a str>>(
    input: &'a str,
) -> IResult<&'a str, Vec<Group>, E> {
    context(
        "liberty file",
        all_consuming(terminated(many0(preceded(sp, group)), sp)),
    )(input)
}
