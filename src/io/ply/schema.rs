//! The schema of a PLY file: which elements exist, in which order their
//! records are stored and how each record is laid out.

use std::{
    fmt,
    ops,
    str::FromStr,
};

use derive_more::Display;
use failure::Fail;

use super::Encoding;


// ===========================================================================
// ===== Numeric kinds
// ===========================================================================

/// One of the 8 primitive PLY types. There are 2 floating point types, 3
/// signed and 3 unsigned integers.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
pub enum NumericKind {
    #[display(fmt = "char")]
    Int8,
    #[display(fmt = "uchar")]
    Uint8,
    #[display(fmt = "short")]
    Int16,
    #[display(fmt = "ushort")]
    Uint16,
    #[display(fmt = "int")]
    Int32,
    #[display(fmt = "uint")]
    Uint32,
    #[display(fmt = "float")]
    Float32,
    #[display(fmt = "double")]
    Float64,
}

impl NumericKind {
    /// Returns `true` if and only if the type is either `float` or `double`.
    pub fn is_floating_point(&self) -> bool {
        *self == NumericKind::Float32 || *self == NumericKind::Float64
    }

    /// Returns `true` if and only if the type is one of `uchar`, `ushort` or
    /// `uint`.
    pub fn is_unsigned_integer(&self) -> bool {
        match self {
            NumericKind::Uint8 | NumericKind::Uint16 | NumericKind::Uint32 => true,
            _ => false,
        }
    }

    /// Returns `true` if and only if the type is one of `char`, `short` or
    /// `int`.
    pub fn is_signed_integer(&self) -> bool {
        match self {
            NumericKind::Int8 | NumericKind::Int16 | NumericKind::Int32 => true,
            _ => false,
        }
    }

    pub fn is_integer(&self) -> bool {
        !self.is_floating_point()
    }

    /// Returns the number of bytes a value of this type occupies in a binary
    /// body.
    pub fn width(&self) -> usize {
        match self {
            NumericKind::Int8 => 1,
            NumericKind::Uint8 => 1,
            NumericKind::Int16 => 2,
            NumericKind::Uint16 => 2,
            NumericKind::Int32 => 4,
            NumericKind::Uint32 => 4,
            NumericKind::Float32 => 4,
            NumericKind::Float64 => 8,
        }
    }
}

/// The error emitted when the `FromStr` implementation for `NumericKind`
/// cannot parse the given string.
pub struct UnknownTypeError(String);

impl fmt::Display for UnknownTypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{}\" is not a valid PLY scalar type", self.0)
    }
}

impl fmt::Debug for UnknownTypeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl FromStr for NumericKind {
    type Err = UnknownTypeError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "char" | "int8" => Ok(NumericKind::Int8),
            "uchar" | "uint8" => Ok(NumericKind::Uint8),
            "short" | "int16" => Ok(NumericKind::Int16),
            "ushort" | "uint16" => Ok(NumericKind::Uint16),
            "int" | "int32" => Ok(NumericKind::Int32),
            "uint" | "uint32" => Ok(NumericKind::Uint32),
            "float" | "float32" => Ok(NumericKind::Float32),
            "double" | "float64" => Ok(NumericKind::Float64),
            other => Err(UnknownTypeError(other.to_string())),
        }
    }
}


// ===========================================================================
// ===== Roles and descriptors
// ===========================================================================

/// The meaning of a vertex property, derived from its name.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyRole {
    #[display(fmt = "x")]
    X,
    #[display(fmt = "y")]
    Y,
    #[display(fmt = "z")]
    Z,
    #[display(fmt = "red")]
    Red,
    #[display(fmt = "green")]
    Green,
    #[display(fmt = "blue")]
    Blue,
    #[display(fmt = "generic")]
    Generic,
}

impl PropertyRole {
    /// Number of distinct roles, i.e. the number of slots in a
    /// [`RawRecord`](super::record::RawRecord).
    pub const COUNT: usize = 7;

    pub fn from_name(name: &str) -> Self {
        match name {
            "x" => PropertyRole::X,
            "y" => PropertyRole::Y,
            "z" => PropertyRole::Z,
            "red" | "diffuse_red" => PropertyRole::Red,
            "green" | "diffuse_green" => PropertyRole::Green,
            "blue" | "diffuse_blue" => PropertyRole::Blue,
            _ => PropertyRole::Generic,
        }
    }

    pub fn slot(&self) -> usize {
        *self as usize
    }

    pub fn is_color(&self) -> bool {
        match self {
            PropertyRole::Red | PropertyRole::Green | PropertyRole::Blue => true,
            _ => false,
        }
    }
}

/// The header definition of one property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub name: String,
    pub role: PropertyRole,

    /// The type of the value (or of each list item for list properties).
    pub kind: NumericKind,

    /// For list properties: the type of the length prefix. `None` for scalar
    /// properties.
    pub list_len: Option<NumericKind>,
}

impl PropertyDescriptor {
    /// Creates a scalar property whose role is derived from `name`.
    pub fn scalar(name: impl Into<String>, kind: NumericKind) -> Self {
        let name = name.into();
        Self {
            role: PropertyRole::from_name(&name),
            name,
            kind,
            list_len: None,
        }
    }

    /// Creates a list property. Lists never carry a coordinate or color, so
    /// their role is always `Generic`.
    pub fn list(name: impl Into<String>, len_kind: NumericKind, kind: NumericKind) -> Self {
        Self {
            name: name.into(),
            role: PropertyRole::Generic,
            kind,
            list_len: Some(len_kind),
        }
    }

    pub fn is_list(&self) -> bool {
        self.list_len.is_some()
    }
}

/// Layout of the `vertex_indices` (or `vertex_index`) list of the face
/// element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexList {
    /// Type of the length prefix, `uchar` in virtually all files.
    pub len_kind: NumericKind,

    /// Type of each index, usually `int` or `uint`.
    pub index_kind: NumericKind,

    /// Number of non-index face properties declared before the list.
    pub position: usize,
}

impl Default for IndexList {
    fn default() -> Self {
        Self {
            len_kind: NumericKind::Uint8,
            index_kind: NumericKind::Int32,
            position: 0,
        }
    }
}

/// One element block of the body, in the order the header declares them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementBlock {
    Vertex,
    Face,

    /// An element that is neither `vertex` nor `face`. Its records are
    /// skipped.
    Foreign {
        name: String,
        count: u64,
        properties: Vec<PropertyDescriptor>,
    },
}


// ===========================================================================
// ===== Schema
// ===========================================================================

/// The parsed header of a PLY file.
///
/// A `Schema` is created once by [`Reader::new`](super::Reader::new) and not
/// changed afterwards. Both body decoders only borrow it.
#[derive(Debug, Clone)]
pub struct Schema {
    pub(crate) encoding: Encoding,
    pub(crate) vertex_count: u64,
    pub(crate) face_count: u64,
    pub(crate) vertex_props: Vec<PropertyDescriptor>,
    pub(crate) face_props: Vec<PropertyDescriptor>,
    pub(crate) index_list: Option<IndexList>,
    pub(crate) blocks: Vec<ElementBlock>,
    pub(crate) comments: Vec<String>,
    pub(crate) obj_info: Vec<String>,
}

impl Schema {
    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    /// Number of vertices as declared in the header (0 if there is no
    /// vertex element).
    pub fn vertex_count(&self) -> u64 {
        self.vertex_count
    }

    /// Number of faces as declared in the header (0 if there is no face
    /// element).
    pub fn face_count(&self) -> u64 {
        self.face_count
    }

    /// The vertex properties in the order they are stored in each record.
    pub fn vertex_properties(&self) -> &[PropertyDescriptor] {
        &self.vertex_props
    }

    /// The face properties in the order they are stored in each record,
    /// without the vertex index list.
    pub fn face_properties(&self) -> &[PropertyDescriptor] {
        &self.face_props
    }

    pub fn index_list(&self) -> Option<IndexList> {
        self.index_list
    }

    /// All element blocks in body order.
    pub fn blocks(&self) -> &[ElementBlock] {
        &self.blocks
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn obj_info(&self) -> &[String] {
        &self.obj_info
    }

    fn count_role(&self, role: PropertyRole) -> usize {
        self.vertex_props.iter().filter(|p| p.role == role).count()
    }

    /// Returns `true` if the vertices carry a red, green and blue channel.
    pub fn has_vertex_colors(&self) -> bool {
        self.vertex_props.iter().filter(|p| p.role.is_color()).count() == 3
    }

    /// Checks that the schema describes something we can turn into a mesh:
    /// exactly one `x`, `y` and `z` property, zero or three color channels
    /// and a vertex index list if there are faces.
    pub fn validate(&self) -> Result<(), SchemaError> {
        for &role in &[PropertyRole::X, PropertyRole::Y, PropertyRole::Z] {
            let count = self.count_role(role);
            if count != 1 {
                return Err(SchemaError::CoordinateCount { role, count });
            }
        }

        let colors = self.vertex_props.iter().filter(|p| p.role.is_color()).count();
        if colors != 0 && colors != 3 {
            return Err(SchemaError::ColorCount(colors));
        }

        if self.face_count > 0 && self.index_list.is_none() {
            return Err(SchemaError::MissingIndexList);
        }

        Ok(())
    }
}

/// A header that parsed fine but does not describe a usable mesh.
#[derive(Debug, Fail, Clone, PartialEq, Eq)]
pub enum SchemaError {
    #[fail(display = "expected exactly one '{}' vertex property, found {}", role, count)]
    CoordinateCount {
        role: PropertyRole,
        count: usize,
    },

    #[fail(display = "expected zero or three vertex color properties, found {}", _0)]
    ColorCount(usize),

    #[fail(display = "face element has no 'vertex_indices' list")]
    MissingIndexList,
}

/// A fixed-width set of `T`s, one per [`PropertyRole`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RoleArray<T>(pub [T; PropertyRole::COUNT]);

impl<T> ops::Index<PropertyRole> for RoleArray<T> {
    type Output = T;
    fn index(&self, role: PropertyRole) -> &Self::Output {
        &self.0[role.slot()]
    }
}

impl<T> ops::IndexMut<PropertyRole> for RoleArray<T> {
    fn index_mut(&mut self, role: PropertyRole) -> &mut Self::Output {
        &mut self.0[role.slot()]
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn schema_with(names: &[&str]) -> Schema {
        Schema {
            encoding: Encoding::Ascii,
            vertex_count: 1,
            face_count: 0,
            vertex_props: names.iter()
                .map(|name| PropertyDescriptor::scalar(*name, NumericKind::Float32))
                .collect(),
            face_props: vec![],
            index_list: None,
            blocks: vec![ElementBlock::Vertex],
            comments: vec![],
            obj_info: vec![],
        }
    }

    #[test]
    fn kind_tokens() {
        let pairs = [
            ("char", "int8", NumericKind::Int8, 1),
            ("uchar", "uint8", NumericKind::Uint8, 1),
            ("short", "int16", NumericKind::Int16, 2),
            ("ushort", "uint16", NumericKind::Uint16, 2),
            ("int", "int32", NumericKind::Int32, 4),
            ("uint", "uint32", NumericKind::Uint32, 4),
            ("float", "float32", NumericKind::Float32, 4),
            ("double", "float64", NumericKind::Float64, 8),
        ];

        for &(old, new, kind, width) in &pairs {
            assert_eq!(old.parse::<NumericKind>().ok(), Some(kind));
            assert_eq!(new.parse::<NumericKind>().ok(), Some(kind));
            assert_eq!(kind.width(), width);
            assert_eq!(kind.to_string(), old);
        }

        assert!("int64".parse::<NumericKind>().is_err());
        assert!("Float".parse::<NumericKind>().is_err());
    }

    #[test]
    fn roles_from_names() {
        assert_eq!(PropertyRole::from_name("x"), PropertyRole::X);
        assert_eq!(PropertyRole::from_name("diffuse_red"), PropertyRole::Red);
        assert_eq!(PropertyRole::from_name("green"), PropertyRole::Green);
        assert_eq!(PropertyRole::from_name("diffuse_blue"), PropertyRole::Blue);
        assert_eq!(PropertyRole::from_name("nx"), PropertyRole::Generic);
        assert_eq!(PropertyRole::from_name("X"), PropertyRole::Generic);

        let list = PropertyDescriptor::list("x", NumericKind::Uint8, NumericKind::Float32);
        assert_eq!(list.role, PropertyRole::Generic);
    }

    #[test]
    fn validate_coordinates() {
        assert_eq!(schema_with(&["x", "y", "z"]).validate(), Ok(()));
        assert_eq!(
            schema_with(&["x", "x", "y", "z"]).validate(),
            Err(SchemaError::CoordinateCount { role: PropertyRole::X, count: 2 }),
        );
        assert_eq!(
            schema_with(&["x", "y"]).validate(),
            Err(SchemaError::CoordinateCount { role: PropertyRole::Z, count: 0 }),
        );
    }

    #[test]
    fn validate_colors() {
        assert_eq!(schema_with(&["x", "y", "z", "red", "green", "blue"]).validate(), Ok(()));
        assert_eq!(
            schema_with(&["x", "y", "z", "red"]).validate(),
            Err(SchemaError::ColorCount(1)),
        );
        assert_eq!(
            schema_with(&["diffuse_red", "x", "y", "z", "diffuse_blue"]).validate(),
            Err(SchemaError::ColorCount(2)),
        );
    }

    #[test]
    fn validate_faces_need_indices() {
        let mut schema = schema_with(&["x", "y", "z"]);
        schema.face_count = 2;
        assert_eq!(schema.validate(), Err(SchemaError::MissingIndexList));

        schema.index_list = Some(IndexList::default());
        assert_eq!(schema.validate(), Ok(()));
    }

    #[test]
    fn role_array() {
        let mut arr = RoleArray::<f64>::default();
        arr[PropertyRole::Blue] = 3.0;
        arr[PropertyRole::Generic] = 1.0;
        assert_eq!(arr.0, [0.0, 0.0, 0.0, 0.0, 0.0, 3.0, 1.0]);
    }
}
