//! Decoding an ASCII body.

use std::{convert::TryFrom, str};

use tracing::debug;

use crate::io::parse::Input;
use super::{
    Error, ReadOptions,
    line::LineCursor,
    record::{Decoded, RawRecord},
    schema::{ElementBlock, IndexList, NumericKind, PropertyDescriptor, PropertyRole, Schema},
};


/// Parses one token. Returns `None` if the token does not belong to the
/// lexical class of the target type. Integers are only range checked against
/// `i64`/`u64`, so `300` passes for a `uchar` property.
type Lexer = fn(&str) -> Option<f64>;

fn count_digits(b: &[u8]) -> usize {
    b.iter().take_while(|b| b.is_ascii_digit()).count()
}

/// `[-+]?[0-9]+`
fn is_signed(s: &str) -> bool {
    let b = s.as_bytes();
    let sign = if b.first().map_or(false, |&c| c == b'+' || c == b'-') { 1 } else { 0 };
    b.len() > sign && count_digits(&b[sign..]) == b.len() - sign
}

/// `[0-9]+`
fn is_unsigned(s: &str) -> bool {
    !s.is_empty() && count_digits(s.as_bytes()) == s.len()
}

/// `[-+]?[0-9]*\.?[0-9]+([eE][-+]?[0-9]+)?`
fn is_real(s: &str) -> bool {
    let b = s.as_bytes();
    let mut i = 0;

    if b.first().map_or(false, |&c| c == b'+' || c == b'-') {
        i += 1;
    }

    let int_digits = count_digits(&b[i..]);
    i += int_digits;

    if b.get(i) == Some(&b'.') {
        i += 1;
        let frac_digits = count_digits(&b[i..]);
        if frac_digits == 0 {
            return false;
        }
        i += frac_digits;
    } else if int_digits == 0 {
        return false;
    }

    if b.get(i).map_or(false, |&c| c == b'e' || c == b'E') {
        i += 1;
        if b.get(i).map_or(false, |&c| c == b'+' || c == b'-') {
            i += 1;
        }
        let exp_digits = count_digits(&b[i..]);
        if exp_digits == 0 {
            return false;
        }
        i += exp_digits;
    }

    i == b.len()
}

fn lex_signed(s: &str) -> Option<f64> {
    if is_signed(s) { s.parse::<i64>().ok().map(|v| v as f64) } else { None }
}

fn lex_unsigned(s: &str) -> Option<f64> {
    if is_unsigned(s) { s.parse::<u64>().ok().map(|v| v as f64) } else { None }
}

fn lex_real(s: &str) -> Option<f64> {
    if is_real(s) { s.parse::<f64>().ok() } else { None }
}

fn lexer_for(kind: NumericKind) -> Lexer {
    if kind.is_floating_point() {
        lex_real
    } else if kind.is_unsigned_integer() {
        lex_unsigned
    } else {
        lex_signed
    }
}

/// How to read one property of a record.
#[derive(Clone, Copy)]
enum Field {
    Scalar {
        role: PropertyRole,
        lex: Lexer,
    },
    List {
        len: Lexer,
        item: Lexer,
    },
}

fn plan(props: &[PropertyDescriptor]) -> Vec<Field> {
    props.iter()
        .map(|p| match p.list_len {
            None => Field::Scalar { role: p.role, lex: lexer_for(p.kind) },
            Some(len_kind) => Field::List { len: lexer_for(len_kind), item: lexer_for(p.kind) },
        })
        .collect()
}

/// Reads the fields `plan` describes from the cursor. Scalar values are
/// stored in `raw`, list items are validated and discarded.
fn read_fields(
    cursor: &mut LineCursor<'_>,
    plan: &[Field],
    props: &[PropertyDescriptor],
    raw: &mut RawRecord,
) -> Result<(), String> {
    fn token<'a>(cursor: &mut LineCursor<'a>, name: &str) -> Result<&'a str, String> {
        let out = cursor.word()
            .ok_or_else(|| format!("missing value for property '{}'", name));
        cursor.skip_whitespace();
        out
    }

    for (field, prop) in plan.iter().zip(props) {
        match *field {
            Field::Scalar { role, lex } => {
                let t = token(cursor, &prop.name)?;
                raw[role] = lex(t).ok_or_else(|| {
                    format!("invalid {} value {:?} for property '{}'", prop.kind, t, prop.name)
                })?;
            }
            Field::List { len, item } => {
                let t = token(cursor, &prop.name)?;
                let count = len(t)
                    .filter(|&v| v >= 0.0)
                    .ok_or_else(|| {
                        format!("invalid list length {:?} for property '{}'", t, prop.name)
                    })?;

                for _ in 0..count as u64 {
                    let t = token(cursor, &prop.name)?;
                    if item(t).is_none() {
                        return Err(format!(
                            "invalid {} list item {:?} for property '{}'",
                            prop.kind,
                            t,
                            prop.name,
                        ));
                    }
                }
            }
        }
    }

    Ok(())
}

/// Matches a face line against `3 <a> <b> <c>` (after the tokens of the
/// properties declared before the index list). Trailing content is
/// ignored.
fn match_face(
    line: &str,
    plan: &[Field],
    props: &[PropertyDescriptor],
    index_list: IndexList,
) -> Option<[i64; 3]> {
    let mut cursor = LineCursor::new(line);
    cursor.skip_whitespace();

    let mut scratch = RawRecord::default();
    let before = index_list.position;
    read_fields(&mut cursor, &plan[..before], &props[..before], &mut scratch).ok()?;

    if cursor.word()? != "3" || !cursor.separator() {
        return None;
    }

    // Indices too large for `i64` are out of range anyway.
    let parse = |t: &str| {
        t.parse::<u64>().ok().and_then(|v| i64::try_from(v).ok()).unwrap_or(i64::MAX)
    };

    let mut index = || {
        let t = cursor.word()?;
        if !is_unsigned(t) || !cursor.separator() {
            return None;
        }
        Some(parse(t))
    };
    let a = index()?;
    let b = index()?;

    // The last index is the leading digit run, whatever follows it.
    let rest = cursor.rest();
    let len = count_digits(rest.as_bytes());
    if len == 0 {
        return None;
    }

    Some([a, b, parse(&rest[..len])])
}

fn record_error(element: &str, index: u64, msg: impl Into<String>) -> Error {
    Error::RecordDecode {
        element: element.to_string(),
        index,
        msg: msg.into(),
    }
}

/// Decodes all element blocks of an ASCII body into `out`.
#[tracing::instrument(skip_all)]
pub(crate) fn decode<I: Input>(
    input: &mut I,
    schema: &Schema,
    options: &ReadOptions,
    out: &mut Decoded,
) -> Result<(), Error> {
    for block in schema.blocks() {
        match block {
            ElementBlock::Vertex => decode_vertices(input, schema, out)?,
            ElementBlock::Face => decode_faces(input, schema, options, out)?,
            ElementBlock::Foreign { name, count, .. } => {
                debug!("skipping {} '{}' records", count, name);
                for i in 0..*count {
                    if input.take_line(|_| Ok::<_, Error>(()))?.is_none() {
                        return Err(record_error(name, i, "unexpected end of input"));
                    }
                }
            }
        }
    }

    Ok(())
}

fn decode_vertices<I: Input>(
    input: &mut I,
    schema: &Schema,
    out: &mut Decoded,
) -> Result<(), Error> {
    let props = schema.vertex_properties();
    let plan = plan(props);

    for i in 0..schema.vertex_count() {
        let line = input.take_line(|sd| {
            let line = str::from_utf8(sd.data)
                .map_err(|_| sd.error(format!("vertex line #{} is not valid UTF-8", i)))?;

            let mut cursor = LineCursor::new(line);
            cursor.skip_whitespace();

            let mut raw = RawRecord::default();
            read_fields(&mut cursor, &plan, props, &mut raw)
                .map_err(|msg| record_error("vertex", i, msg))?;
            out.push_vertex(&raw);

            Ok::<_, Error>(())
        })?;

        if line.is_none() {
            return Err(record_error("vertex", i, "unexpected end of input"));
        }
    }

    Ok(())
}

fn decode_faces<I: Input>(
    input: &mut I,
    schema: &Schema,
    options: &ReadOptions,
    out: &mut Decoded,
) -> Result<(), Error> {
    let props = schema.face_properties();
    let plan = plan(props);

    // Validation guarantees the index list if there is a face.
    let index_list = match schema.index_list() {
        Some(list) => list,
        None => return Ok(()),
    };

    for i in 0..schema.face_count() {
        let line = input.take_line(|sd| {
            let line = String::from_utf8_lossy(sd.data);
            match match_face(&line, &plan, props, index_list) {
                Some(indices) => out.push_face(indices, i),
                None if options.strict_ascii_faces => {
                    return Err(record_error(
                        "face",
                        i,
                        format!("expected a triangle \"3 <a> <b> <c>\", found {:?}", line),
                    ));
                }
                None => out.skip_face_line(i, &line),
            }

            Ok(())
        })?;

        if line.is_none() {
            debug!(
                "input ended after {} of {} declared faces",
                i,
                schema.face_count(),
            );
            break;
        }
    }

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexical_classes() {
        for s in &["0", "17", "+3", "-42"] {
            assert!(is_signed(s), "{}", s);
        }
        for s in &["", "+", "-", "1.0", "1e3", "0x1", "1-"] {
            assert!(!is_signed(s), "{}", s);
        }

        assert!(is_unsigned("0"));
        assert!(is_unsigned("0042"));
        for s in &["", "+1", "-1", "1.5"] {
            assert!(!is_unsigned(s), "{}", s);
        }

        for s in &["1", "-1", "+.5", ".5", "0.25", "3.", "1e5", "-2.5E-3", "7e+2"] {
            let expected = *s != "3.";
            assert_eq!(is_real(s), expected, "{}", s);
        }
        for s in &["", ".", "-", "e5", "1e", "1e+", "1.2.3", "nan", "inf", "1,5"] {
            assert!(!is_real(s), "{}", s);
        }
    }

    #[test]
    fn lexers_dispatch_by_kind() {
        assert_eq!(lexer_for(NumericKind::Float32)("-2.5e1"), Some(-25.0));
        assert_eq!(lexer_for(NumericKind::Float64)("4"), Some(4.0));
        assert_eq!(lexer_for(NumericKind::Uint8)("200"), Some(200.0));
        assert_eq!(lexer_for(NumericKind::Uint8)("-1"), None);
        assert_eq!(lexer_for(NumericKind::Uint8)("300"), Some(300.0));
        assert_eq!(lexer_for(NumericKind::Int16)("-1"), Some(-1.0));
        assert_eq!(lexer_for(NumericKind::Int32)("1.0"), None);
    }

    #[test]
    fn face_lines() {
        let list = IndexList::default();
        let m = |line| match_face(line, &[], &[], list);

        assert_eq!(m("3 0 1 2"), Some([0, 1, 2]));
        assert_eq!(m("  3\t4  5 6   "), Some([4, 5, 6]));
        assert_eq!(m("3 0 1 2 0.5 0.5 extra"), Some([0, 1, 2]));
        assert_eq!(m("3 0 1 99999999999999999999"), Some([0, 1, i64::max_value()]));
        assert_eq!(m("4 0 1 2 3"), None);
        assert_eq!(m("3 0 1"), None);
        assert_eq!(m("3 0 -1 2"), None);
        assert_eq!(m("3 0 1 2x"), Some([0, 1, 2]));
        assert_eq!(m("3 0 1 2.5"), Some([0, 1, 2]));
        assert_eq!(m("3 0 1 2,"), Some([0, 1, 2]));
        assert_eq!(m("3 0 1x 2"), None);
        assert_eq!(m("3 0 1 x2"), None);
        assert_eq!(m("30 1 2"), None);
        assert_eq!(m(""), None);
    }

    #[test]
    fn face_line_with_leading_property() {
        let props = [PropertyDescriptor::scalar("flags", NumericKind::Uint8)];
        let plan = plan(&props);
        let list = IndexList { position: 1, ..IndexList::default() };

        assert_eq!(match_face("7 3 2 1 0", &plan, &props, list), Some([2, 1, 0]));
        assert_eq!(match_face("3 2 1 0", &plan, &props, list), None);
    }

    #[test]
    fn vertex_fields() {
        let props = [
            PropertyDescriptor::scalar("x", NumericKind::Float32),
            PropertyDescriptor::list("uv", NumericKind::Uint8, NumericKind::Float32),
            PropertyDescriptor::scalar("y", NumericKind::Float32),
            PropertyDescriptor::scalar("z", NumericKind::Int32),
        ];
        let plan = plan(&props);

        let mut raw = RawRecord::default();
        let mut cursor = LineCursor::new("1.5 2 0.1 0.2 -3 7 ignored");
        read_fields(&mut cursor, &plan, &props, &mut raw).unwrap();
        assert_eq!(raw[PropertyRole::X], 1.5);
        assert_eq!(raw[PropertyRole::Y], -3.0);
        assert_eq!(raw[PropertyRole::Z], 7.0);

        let mut cursor = LineCursor::new("1.5 2 0.1 0.2 -3 7.5");
        assert!(read_fields(&mut cursor, &plan, &props, &mut raw).is_err());

        let mut cursor = LineCursor::new("1.5 2 0.1");
        assert!(read_fields(&mut cursor, &plan, &props, &mut raw).is_err());
    }
}
