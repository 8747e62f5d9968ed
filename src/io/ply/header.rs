//! Parsing the PLY header into a [`Schema`].

use tracing::trace;

use crate::io::parse::Input;
use super::{
    Encoding, Error,
    line::LineCursor,
    schema::{ElementBlock, IndexList, NumericKind, PropertyDescriptor, Schema},
};


/// The element whose properties are currently being declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    /// No `element` line yet.
    Nothing,
    Vertex,
    Face,

    /// Index into `blocks`.
    Foreign(usize),
}

/// Collects everything the header declares until `end_header` is reached.
#[derive(Debug)]
struct HeaderBuilder {
    encoding: Option<Encoding>,
    vertex_count: Option<u64>,
    face_count: Option<u64>,
    vertex_props: Vec<PropertyDescriptor>,
    face_props: Vec<PropertyDescriptor>,
    index_list: Option<IndexList>,
    blocks: Vec<ElementBlock>,
    comments: Vec<String>,
    obj_info: Vec<String>,
    context: Context,

    /// 1-based number of the current line. The magic number is line 1.
    line: usize,
}

/// Parses the header lines following the magic number, up to and including
/// the `end_header` line. Afterwards, `input` is positioned at the first
/// byte of the body.
pub(crate) fn parse_header(input: &mut impl Input) -> Result<Schema, Error> {
    let mut builder = HeaderBuilder {
        encoding: None,
        vertex_count: None,
        face_count: None,
        vertex_props: vec![],
        face_props: vec![],
        index_list: None,
        blocks: vec![],
        comments: vec![],
        obj_info: vec![],
        context: Context::Nothing,
        line: 1,
    };

    loop {
        builder.line += 1;
        let line = input.take_line(|sd| {
            Ok::<_, Error>(String::from_utf8_lossy(sd.data).into_owned())
        })?;

        let line = match line {
            Some(line) => line,
            None => return Err(builder.grammar_error("unexpected end of input before 'end_header'")),
        };

        if builder.line_done(&line)? {
            return builder.finish();
        }
    }
}

impl HeaderBuilder {
    fn grammar_error(&self, msg: impl Into<String>) -> Error {
        Error::HeaderGrammar {
            line: self.line,
            msg: msg.into(),
        }
    }

    /// Handles one header line. Returns `true` if it was `end_header`.
    fn line_done(&mut self, line: &str) -> Result<bool, Error> {
        let mut cursor = LineCursor::new(line);
        let keyword = match cursor.next_word() {
            Some(w) => w,
            None => return Ok(false),
        };

        match keyword {
            "end_header" => return Ok(true),
            "format" => self.format(&mut cursor)?,
            "element" => self.element(&mut cursor)?,
            "property" => self.property(&mut cursor)?,
            "comment" => {
                let text = cursor.take_rest().to_string();
                self.comments.push(text);
            }
            "obj_info" => {
                let text = cursor.take_rest().to_string();
                self.obj_info.push(text);
            }
            other => trace!("ignoring unknown header keyword '{}' in line {}", other, self.line),
        }

        Ok(false)
    }

    fn format(&mut self, cursor: &mut LineCursor<'_>) -> Result<(), Error> {
        if self.encoding.is_some() {
            return Err(Error::Format(format!("duplicate 'format' line (line {})", self.line)));
        }

        if !cursor.separator() {
            return Err(Error::Format("expected whitespace after 'format'".into()));
        }

        let encoding = match cursor.word() {
            Some("ascii") => Encoding::Ascii,
            Some("binary_little_endian") => Encoding::BinaryLittleEndian,
            Some("binary_big_endian") => Encoding::BinaryBigEndian,
            Some(other) => {
                return Err(Error::Format(format!(
                    "expected \"ascii\", \"binary_little_endian\" or \"binary_big_endian\", \
                        found {:?}",
                    other,
                )));
            }
            None => return Err(Error::Format("missing encoding in 'format' line".into())),
        };

        if !cursor.separator() {
            return Err(Error::Format("expected whitespace after the encoding".into()));
        }

        match cursor.word() {
            Some("1.0") => {}
            Some(other) => {
                return Err(Error::Format(format!("unsupported PLY version {:?}", other)));
            }
            None => return Err(Error::Format("missing version in 'format' line".into())),
        }

        self.encoding = Some(encoding);
        Ok(())
    }

    fn element(&mut self, cursor: &mut LineCursor<'_>) -> Result<(), Error> {
        if !cursor.separator() {
            return Err(self.grammar_error("expected whitespace after 'element'"));
        }
        let name = cursor.word()
            .ok_or_else(|| self.grammar_error("missing element name"))?;

        if !cursor.separator() {
            return Err(self.grammar_error(format!("expected whitespace after '{}'", name)));
        }
        let count = cursor.word()
            .ok_or_else(|| self.grammar_error("missing element count"))?;
        let count = count.parse::<u64>().map_err(|e| {
            self.grammar_error(format!("invalid element count {:?} ({})", count, e))
        })?;

        match name {
            "vertex" => {
                if self.vertex_count.is_some() {
                    return Err(self.grammar_error("element 'vertex' declared twice"));
                }
                self.vertex_count = Some(count);
                self.blocks.push(ElementBlock::Vertex);
                self.context = Context::Vertex;
            }
            "face" => {
                if self.face_count.is_some() {
                    return Err(self.grammar_error("element 'face' declared twice"));
                }
                self.face_count = Some(count);
                self.blocks.push(ElementBlock::Face);
                self.context = Context::Face;
            }
            other => {
                self.blocks.push(ElementBlock::Foreign {
                    name: other.to_string(),
                    count,
                    properties: vec![],
                });
                self.context = Context::Foreign(self.blocks.len() - 1);
            }
        }

        Ok(())
    }

    fn kind(&self, cursor: &mut LineCursor<'_>) -> Result<NumericKind, Error> {
        let word = cursor.word().ok_or_else(|| self.grammar_error("missing property type"))?;
        word.parse::<NumericKind>().map_err(|e| self.grammar_error(e.to_string()))
    }

    fn property(&mut self, cursor: &mut LineCursor<'_>) -> Result<(), Error> {
        let sep_error = |this: &Self| this.grammar_error("expected whitespace in 'property' line");

        if !cursor.separator() {
            return Err(sep_error(self));
        }

        let is_list = cursor.rest().starts_with("list")
            && cursor.rest()[4..].starts_with(|c: char| c == ' ' || c == '\t');

        let prop = if is_list {
            cursor.word();
            cursor.separator();

            let len_kind = self.kind(cursor)?;
            if !cursor.separator() {
                return Err(sep_error(self));
            }
            let kind = self.kind(cursor)?;
            if !cursor.separator() {
                return Err(sep_error(self));
            }
            let name = cursor.word().ok_or_else(|| self.grammar_error("missing property name"))?;

            if !len_kind.is_integer() {
                return Err(self.grammar_error(format!(
                    "list length of property '{}' has non-integer type '{}'",
                    name,
                    len_kind,
                )));
            }

            PropertyDescriptor::list(name, len_kind, kind)
        } else {
            let kind = self.kind(cursor)?;
            if !cursor.separator() {
                return Err(sep_error(self));
            }
            let name = cursor.word().ok_or_else(|| self.grammar_error("missing property name"))?;

            PropertyDescriptor::scalar(name, kind)
        };

        match self.context {
            Context::Nothing => {
                trace!("discarding property '{}' declared before any element", prop.name);
            }
            Context::Vertex => self.vertex_props.push(prop),
            Context::Face if prop.name == "vertex_indices" || prop.name == "vertex_index" => {
                self.index_list(prop)?;
            }
            Context::Face => self.face_props.push(prop),
            Context::Foreign(idx) => {
                if let ElementBlock::Foreign { properties, .. } = &mut self.blocks[idx] {
                    properties.push(prop);
                }
            }
        }

        Ok(())
    }

    fn index_list(&mut self, prop: PropertyDescriptor) -> Result<(), Error> {
        if self.index_list.is_some() {
            return Err(self.grammar_error("face vertex index list declared twice"));
        }

        let len_kind = match prop.list_len {
            Some(len_kind) => len_kind,
            None => {
                return Err(self.grammar_error(format!("'{}' must be a list property", prop.name)));
            }
        };

        if !prop.kind.is_integer() {
            return Err(self.grammar_error(format!(
                "'{}' has non-integer index type '{}'",
                prop.name,
                prop.kind,
            )));
        }

        self.index_list = Some(IndexList {
            len_kind,
            index_kind: prop.kind,
            position: self.face_props.len(),
        });

        Ok(())
    }

    fn finish(self) -> Result<Schema, Error> {
        let encoding = self.encoding
            .ok_or_else(|| Error::Format("header has no 'format' line".into()))?;

        Ok(Schema {
            encoding,
            vertex_count: self.vertex_count.unwrap_or(0),
            face_count: self.face_count.unwrap_or(0),
            vertex_props: self.vertex_props,
            face_props: self.face_props,
            index_list: self.index_list,
            blocks: self.blocks,
            comments: self.comments,
            obj_info: self.obj_info,
        })
    }
}
