//! Decoding a binary body in either byte order.

use byteorder::ByteOrder;
use tracing::debug;

use crate::io::parse::{self, Input};
use super::{
    Error, NonTrianglePolicy, ReadOptions,
    record::{Decoded, RawRecord},
    schema::{ElementBlock, IndexList, NumericKind, PropertyDescriptor, PropertyRole, Schema},
};


/// Reads one value and widens it to `f64`.
type ValueReader<I> = fn(&mut I) -> Result<f64, parse::Error>;

/// Reads one integer value (a list length or a vertex index).
type IntReader<I> = fn(&mut I) -> Result<i64, parse::Error>;

fn value_reader<B: ByteOrder, I: Input>(kind: NumericKind) -> ValueReader<I> {
    match kind {
        NumericKind::Int8 => |i: &mut I| parse::i8_word(i).map(f64::from),
        NumericKind::Uint8 => |i: &mut I| parse::u8_word(i).map(f64::from),
        NumericKind::Int16 => |i: &mut I| parse::i16_word::<B>(i).map(f64::from),
        NumericKind::Uint16 => |i: &mut I| parse::u16_word::<B>(i).map(f64::from),
        NumericKind::Int32 => |i: &mut I| parse::i32_word::<B>(i).map(f64::from),
        NumericKind::Uint32 => |i: &mut I| parse::u32_word::<B>(i).map(f64::from),
        NumericKind::Float32 => |i: &mut I| parse::f32_word::<B>(i).map(f64::from),
        NumericKind::Float64 => |i: &mut I| parse::f64_word::<B>(i),
    }
}

fn int_reader<B: ByteOrder, I: Input>(kind: NumericKind) -> IntReader<I> {
    match kind {
        NumericKind::Int8 => |i: &mut I| parse::i8_word(i).map(i64::from),
        NumericKind::Uint8 => |i: &mut I| parse::u8_word(i).map(i64::from),
        NumericKind::Int16 => |i: &mut I| parse::i16_word::<B>(i).map(i64::from),
        NumericKind::Uint16 => |i: &mut I| parse::u16_word::<B>(i).map(i64::from),
        NumericKind::Int32 => |i: &mut I| parse::i32_word::<B>(i).map(i64::from),
        NumericKind::Uint32 => |i: &mut I| parse::u32_word::<B>(i).map(i64::from),

        // The header parser only accepts integer kinds for list lengths and
        // indices. Truncating is still well defined.
        NumericKind::Float32 => |i: &mut I| parse::f32_word::<B>(i).map(|v| v as i64),
        NumericKind::Float64 => |i: &mut I| parse::f64_word::<B>(i).map(|v| v as i64),
    }
}

/// How to read one property of a record. Chosen once per schema.
enum Field<I> {
    Scalar {
        role: PropertyRole,
        read: ValueReader<I>,
        width: usize,
    },
    List {
        read_len: IntReader<I>,
        item_width: usize,
    },
}

impl<I: Input> Field<I> {
    fn plan<B: ByteOrder>(props: &[PropertyDescriptor]) -> Vec<Self> {
        props.iter()
            .map(|p| match p.list_len {
                None => Field::Scalar {
                    role: p.role,
                    read: value_reader::<B, I>(p.kind),
                    width: p.kind.width(),
                },
                Some(len_kind) => Field::List {
                    read_len: int_reader::<B, I>(len_kind),
                    item_width: p.kind.width(),
                },
            })
            .collect()
    }

    /// Consumes the field without interpreting it.
    fn skip(&self, input: &mut I) -> Result<(), ListLenError> {
        match *self {
            Field::Scalar { width, .. } => input.skip(width)?,
            Field::List { read_len, item_width } => {
                let len = list_len(read_len(input)?)?;
                input.skip(len * item_width)?;
            }
        }

        Ok(())
    }

    /// Reads scalar values into their role slot and skips lists.
    fn read(&self, input: &mut I, raw: &mut RawRecord) -> Result<(), ListLenError> {
        match *self {
            Field::Scalar { role, read, .. } => raw[role] = read(input)?,
            Field::List { .. } => self.skip(input)?,
        }

        Ok(())
    }
}

/// Either a parse error or a list length that is negative.
enum ListLenError {
    Parse(parse::Error),
    Negative(i64),
}

impl From<parse::Error> for ListLenError {
    fn from(src: parse::Error) -> Self {
        ListLenError::Parse(src)
    }
}

fn list_len(len: i64) -> Result<usize, ListLenError> {
    if len < 0 {
        Err(ListLenError::Negative(len))
    } else {
        Ok(len as usize)
    }
}

/// Attaches the record to a `ListLenError`.
fn record_error(element: &str, index: u64) -> impl FnOnce(ListLenError) -> Error + '_ {
    move |e| match e {
        ListLenError::Parse(e) => Error::Parse(e),
        ListLenError::Negative(len) => Error::RecordDecode {
            element: element.to_string(),
            index,
            msg: format!("negative list length {}", len),
        },
    }
}

/// Decodes all element blocks of a binary body with byte order `B` into
/// `out`.
#[tracing::instrument(skip_all)]
pub(crate) fn decode<B: ByteOrder, I: Input>(
    input: &mut I,
    schema: &Schema,
    options: &ReadOptions,
    out: &mut Decoded,
) -> Result<(), Error> {
    for block in schema.blocks() {
        match block {
            ElementBlock::Vertex => decode_vertices::<B, I>(input, schema, out)?,
            ElementBlock::Face => decode_faces::<B, I>(input, schema, options, out)?,
            ElementBlock::Foreign { name, count, properties } => {
                debug!("skipping {} '{}' records", count, name);
                let plan = Field::<I>::plan::<B>(properties);
                for i in 0..*count {
                    for field in &plan {
                        field.skip(input).map_err(record_error(name, i))?;
                    }
                }
            }
        }
    }

    Ok(())
}

fn decode_vertices<B: ByteOrder, I: Input>(
    input: &mut I,
    schema: &Schema,
    out: &mut Decoded,
) -> Result<(), Error> {
    let plan = Field::<I>::plan::<B>(schema.vertex_properties());

    let mut raw = RawRecord::default();
    for i in 0..schema.vertex_count() {
        for field in &plan {
            field.read(input, &mut raw).map_err(record_error("vertex", i))?;
        }
        out.push_vertex(&raw);
    }

    Ok(())
}

fn decode_faces<B: ByteOrder, I: Input>(
    input: &mut I,
    schema: &Schema,
    options: &ReadOptions,
    out: &mut Decoded,
) -> Result<(), Error> {
    // Validation guarantees the index list if there is a face.
    let IndexList { len_kind, index_kind, position } = match schema.index_list() {
        Some(list) => list,
        None => return Ok(()),
    };

    let plan = Field::<I>::plan::<B>(schema.face_properties());
    let read_len = int_reader::<B, I>(len_kind);
    let read_index = int_reader::<B, I>(index_kind);
    let index_width = index_kind.width();

    for i in 0..schema.face_count() {
        for field in &plan[..position] {
            field.skip(input).map_err(record_error("face", i))?;
        }

        let len = read_len(input)?;
        if len == 3 {
            let indices = [read_index(input)?, read_index(input)?, read_index(input)?];
            out.push_face(indices, i);
        } else {
            let len = list_len(len).map_err(record_error("face", i))?;
            if options.non_triangle_faces == NonTrianglePolicy::Reject {
                return Err(Error::RecordDecode {
                    element: "face".into(),
                    index: i,
                    msg: format!("face has {} vertices, only triangles are supported", len),
                });
            }

            input.skip(len * index_width)?;
            out.drop_face();
        }

        for field in &plan[position..] {
            field.skip(input).map_err(record_error("face", i))?;
        }
    }

    Ok(())
}
