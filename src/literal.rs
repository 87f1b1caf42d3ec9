// Parser for payloads serialized as host-language literals rather than strict JSON,
// e.g. [{'month': '2024-01', 'total': Decimal('10.50'), 'shipped': None}]

use chrono::{NaiveDate, NaiveDateTime};
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit1, multispace0, one_of, satisfy},
    combinator::{all_consuming, map, map_opt, not, opt, recognize, value},
    error::{Error, ErrorKind},
    multi::separated_list0,
    number::complete::recognize_float,
    sequence::{delimited, pair, preceded, terminated, tuple},
    IResult,
};
use std::fmt;

/// Value tree produced by the literal parser.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Timestamp(NaiveDateTime),
    /// Lists and tuples.
    List(Vec<Literal>),
    Dict(Vec<(Literal, Literal)>),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::None => f.write_str("None"),
            Literal::Bool(true) => f.write_str("True"),
            Literal::Bool(false) => f.write_str("False"),
            Literal::Int(i) => write!(f, "{}", i),
            Literal::Float(v) => write!(f, "{}", v),
            Literal::Str(s) => f.write_str(s),
            Literal::Timestamp(ts) => write!(f, "{}", ts),
            Literal::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Literal::Dict(entries) => {
                f.write_str("{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", k, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Parse a complete literal expression. Returns `None` if any input is left unconsumed.
pub fn parse_literal(input: &str) -> Option<Literal> {
    all_consuming(ws(literal))(input).ok().map(|(_, lit)| lit)
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

/// Deepest container nesting accepted. Result payloads nest two or three levels;
/// the bound keeps recursion well inside a default thread stack.
pub const MAX_DEPTH: usize = 64;

fn literal(input: &str) -> IResult<&str, Literal> {
    nested(input, 0)
}

/// A literal found inside `depth` enclosing containers.
fn nested(input: &str, depth: usize) -> IResult<&str, Literal> {
    alt((
        keyword,
        decimal_call,
        timestamp_call,
        datetime_call,
        map(quoted, Literal::Str),
        number,
        |i| list(i, depth),
        |i| tuple_literal(i, depth),
        |i| dict(i, depth),
    ))(input)
}

/// Step one container deeper, failing hard once past `MAX_DEPTH`.
fn descend(input: &str, depth: usize) -> IResult<&str, usize> {
    if depth >= MAX_DEPTH {
        return Err(nom::Err::Failure(Error::new(input, ErrorKind::TooLarge)));
    }
    Ok((input, depth + 1))
}

/// Match `word` only when it is not the prefix of a longer identifier.
fn word<'a>(w: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(w), not(satisfy(|c| c.is_alphanumeric() || c == '_')))
}

fn keyword(input: &str) -> IResult<&str, Literal> {
    alt((
        value(Literal::None, word("None")),
        value(Literal::Bool(true), word("True")),
        value(Literal::Bool(false), word("False")),
    ))(input)
}

fn number(input: &str) -> IResult<&str, Literal> {
    map_opt(recognize_float, |s: &str| {
        if s.contains(['.', 'e', 'E']) {
            s.parse::<f64>().ok().map(Literal::Float)
        } else {
            s.parse::<i64>()
                .map(Literal::Int)
                .or_else(|_| s.parse::<f64>().map(Literal::Float))
                .ok()
        }
    })(input)
}

fn integer(input: &str) -> IResult<&str, i64> {
    map_opt(recognize(pair(opt(char('-')), digit1)), |s: &str| {
        s.parse::<i64>().ok()
    })(input)
}

/// Single- or double-quoted string with backslash escapes and an optional `u`/`b` prefix.
fn quoted(input: &str) -> IResult<&str, String> {
    let (input, _) = opt(one_of("uUbB"))(input)?;
    let mut chars = input.char_indices();
    let quote = match chars.next() {
        Some((_, q @ ('\'' | '"'))) => q,
        _ => return Err(nom::Err::Error(Error::new(input, ErrorKind::Char))),
    };

    let mut out = String::new();
    let mut escaped = false;
    for (idx, c) in chars {
        if escaped {
            out.push(match c {
                'n' => '\n',
                't' => '\t',
                'r' => '\r',
                '0' => '\0',
                other => other,
            });
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            c if c == quote => return Ok((&input[idx + c.len_utf8()..], out)),
            c => out.push(c),
        }
    }

    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

fn open_call<'a>(name: &'static str) -> impl FnMut(&'a str) -> IResult<&'a str, &'a str> {
    terminated(tag(name), ws(char('(')))
}

/// `Decimal('10.50')` or `decimal.Decimal(10)` -> float
fn decimal_call(input: &str) -> IResult<&str, Literal> {
    let (input, _) = opt(tag("decimal."))(input)?;
    let (input, _) = open_call("Decimal")(input)?;
    let (input, parsed) = ws(alt((
        map_opt(quoted, |s| s.trim().parse::<f64>().ok()),
        map_opt(recognize_float, |s: &str| s.parse::<f64>().ok()),
    )))(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, Literal::Float(parsed)))
}

/// `Timestamp('2024-01-31 00:00:00')` or `pd.Timestamp('2024-01-31')`
fn timestamp_call(input: &str) -> IResult<&str, Literal> {
    let (input, _) = opt(alt((tag("pd."), tag("pandas."))))(input)?;
    let (input, _) = open_call("Timestamp")(input)?;
    let (input, ts) = ws(map_opt(quoted, |s| parse_timestamp_text(&s)))(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, Literal::Timestamp(ts)))
}

/// `datetime.date(2024, 1, 31)` or `datetime.datetime(2024, 1, 31, 12, 30, 0[, micro])`
fn datetime_call(input: &str) -> IResult<&str, Literal> {
    let (input, _) = opt(tag("datetime."))(input)?;
    let (input, with_time) = alt((
        value(true, open_call("datetime")),
        value(false, open_call("date")),
    ))(input)?;
    let (input, parts) = separated_list0(ws(char(',')), ws(integer))(input)?;
    let (input, _) = tuple((opt(ws(char(','))), char(')')))(input)?;

    let ts = build_datetime(with_time, &parts)
        .ok_or_else(|| nom::Err::Error(Error::new(input, ErrorKind::Verify)))?;
    Ok((input, Literal::Timestamp(ts)))
}

fn build_datetime(with_time: bool, parts: &[i64]) -> Option<NaiveDateTime> {
    let expected = if with_time { 3..=7 } else { 3..=3 };
    if !expected.contains(&parts.len()) {
        return None;
    }
    let part = |i: usize| parts.get(i).copied().unwrap_or(0);
    let date = NaiveDate::from_ymd_opt(
        i32::try_from(part(0)).ok()?,
        u32::try_from(part(1)).ok()?,
        u32::try_from(part(2)).ok()?,
    )?;
    date.and_hms_micro_opt(
        u32::try_from(part(3)).ok()?,
        u32::try_from(part(4)).ok()?,
        u32::try_from(part(5)).ok()?,
        u32::try_from(part(6)).ok()?,
    )
}

fn parse_timestamp_text(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(text, fmt) {
            return Some(ts);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn items(input: &str, depth: usize) -> IResult<&str, Vec<Literal>> {
    terminated(
        separated_list0(ws(char(',')), ws(|i| nested(i, depth))),
        opt(ws(char(','))),
    )(input)
}

fn list(input: &str, depth: usize) -> IResult<&str, Literal> {
    let (input, _) = char('[')(input)?;
    let (input, depth) = descend(input, depth)?;
    let (input, items) = ws(|i| items(i, depth))(input)?;
    let (input, _) = char(']')(input)?;
    Ok((input, Literal::List(items)))
}

fn tuple_literal(input: &str, depth: usize) -> IResult<&str, Literal> {
    let (input, _) = char('(')(input)?;
    let (input, depth) = descend(input, depth)?;
    let (input, items) = ws(|i| items(i, depth))(input)?;
    let (input, _) = char(')')(input)?;
    Ok((input, Literal::List(items)))
}

fn dict_entry(input: &str, depth: usize) -> IResult<&str, (Literal, Literal)> {
    pair(
        ws(|i| nested(i, depth)),
        preceded(char(':'), ws(|i| nested(i, depth))),
    )(input)
}

fn dict(input: &str, depth: usize) -> IResult<&str, Literal> {
    let (input, _) = char('{')(input)?;
    let (input, depth) = descend(input, depth)?;
    let (input, entries) = ws(terminated(
        separated_list0(ws(char(',')), |i| dict_entry(i, depth)),
        opt(ws(char(','))),
    ))(input)?;
    let (input, _) = char('}')(input)?;
    Ok((input, Literal::Dict(entries)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scalars() {
        assert_eq!(parse_literal("None"), Some(Literal::None));
        assert_eq!(parse_literal("True"), Some(Literal::Bool(true)));
        assert_eq!(parse_literal("42"), Some(Literal::Int(42)));
        assert_eq!(parse_literal("-1.5e2"), Some(Literal::Float(-150.0)));
        assert_eq!(parse_literal("'it\\'s'"), Some(Literal::Str("it's".to_string())));
        assert_eq!(parse_literal("\"A\""), Some(Literal::Str("A".to_string())));
    }

    #[test]
    fn test_keyword_requires_word_boundary() {
        assert_eq!(parse_literal("Nonesuch"), None);
    }

    #[test]
    fn test_parse_list_of_dicts() {
        let parsed = parse_literal("[{'category': 'A', 'revenue': 100}, {'category': 'B', 'revenue': 50},]");
        let expected = Literal::List(vec![
            Literal::Dict(vec![
                (Literal::Str("category".into()), Literal::Str("A".into())),
                (Literal::Str("revenue".into()), Literal::Int(100)),
            ]),
            Literal::Dict(vec![
                (Literal::Str("category".into()), Literal::Str("B".into())),
                (Literal::Str("revenue".into()), Literal::Int(50)),
            ]),
        ]);
        assert_eq!(parsed, Some(expected));
    }

    #[test]
    fn test_parse_decimal_and_dates() {
        assert_eq!(parse_literal("Decimal('10.50')"), Some(Literal::Float(10.5)));
        assert_eq!(parse_literal("decimal.Decimal(3)"), Some(Literal::Float(3.0)));

        let date = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        assert_eq!(
            parse_literal("datetime.date(2024, 1, 31)"),
            Some(Literal::Timestamp(date.and_hms_opt(0, 0, 0).unwrap()))
        );
        assert_eq!(
            parse_literal("datetime.datetime(2024, 1, 31, 12, 30)"),
            Some(Literal::Timestamp(date.and_hms_opt(12, 30, 0).unwrap()))
        );
        assert_eq!(
            parse_literal("Timestamp('2024-01-31 00:00:00')"),
            Some(Literal::Timestamp(date.and_hms_opt(0, 0, 0).unwrap()))
        );
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert_eq!(parse_literal("datetime.date(2024, 13, 1)"), None);
    }

    #[test]
    fn test_tuple_becomes_list() {
        assert_eq!(
            parse_literal("(1, 'x')"),
            Some(Literal::List(vec![Literal::Int(1), Literal::Str("x".into())]))
        );
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let ok = format!("{}1{}", "[".repeat(MAX_DEPTH), "]".repeat(MAX_DEPTH));
        assert!(parse_literal(&ok).is_some());

        let deep = format!("{}1{}", "[".repeat(MAX_DEPTH + 1), "]".repeat(MAX_DEPTH + 1));
        assert_eq!(parse_literal(&deep), None);
        assert_eq!(parse_literal(&"[".repeat(100_000)), None);
        assert_eq!(parse_literal(&"{'a': ".repeat(100_000)), None);
    }

    #[test]
    fn test_unbalanced_input_rejected() {
        assert_eq!(parse_literal("[{'a': 1}"), None);
        assert_eq!(parse_literal("not a literal"), None);
        assert_eq!(parse_literal("[1, 2] trailing"), None);
    }
}
