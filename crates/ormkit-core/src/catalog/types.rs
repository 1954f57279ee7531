//! Dialect-neutral column type descriptors.

use super::options::{OptionKey, TypeOptions};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Maximum fractional-second precision for temporal types.
pub const MAX_TIME_PRECISION: u32 = 6;

/// Logical column type names known to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeName {
    /// Variable-length string.
    String,
    /// Fixed-length string.
    Char,
    /// Unbounded text.
    Text,
    /// 8-bit integer.
    TinyInt,
    /// 16-bit integer.
    SmallInt,
    /// 24-bit integer.
    MediumInt,
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// Floating point number.
    Float,
    /// Single precision floating point.
    Real,
    /// Double precision floating point.
    Double,
    /// Exact decimal.
    Decimal,
    /// Boolean.
    Boolean,
    /// Time of day.
    Time,
    /// Date with time (timestamp).
    Date,
    /// Date without time.
    DateOnly,
    /// Binary large object.
    Blob,
    /// UUID.
    Uuid,
    /// JSON document.
    Json,
    /// Binary JSON document.
    Jsonb,
    /// Case-insensitive text.
    Citext,
    /// IP address.
    Inet,
    /// Network address.
    Cidr,
    /// MAC address.
    Macaddr,
    /// Enumeration of string values.
    Enum,
    /// Range over a numeric or temporal subtype.
    Range,
    /// Array of another type.
    Array,
    /// Planar spatial type.
    Geometry,
    /// Geodetic spatial type.
    Geography,
    /// Computed column that is never stored.
    Virtual,
}

impl TypeName {
    /// Every type name, in catalog order.
    pub const ALL: [TypeName; 30] = [
        TypeName::String,
        TypeName::Char,
        TypeName::Text,
        TypeName::TinyInt,
        TypeName::SmallInt,
        TypeName::MediumInt,
        TypeName::Integer,
        TypeName::BigInt,
        TypeName::Float,
        TypeName::Real,
        TypeName::Double,
        TypeName::Decimal,
        TypeName::Boolean,
        TypeName::Time,
        TypeName::Date,
        TypeName::DateOnly,
        TypeName::Blob,
        TypeName::Uuid,
        TypeName::Json,
        TypeName::Jsonb,
        TypeName::Citext,
        TypeName::Inet,
        TypeName::Cidr,
        TypeName::Macaddr,
        TypeName::Enum,
        TypeName::Range,
        TypeName::Array,
        TypeName::Geometry,
        TypeName::Geography,
        TypeName::Virtual,
    ];

    /// Canonical upper-case name used in the type notation.
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeName::String => "STRING",
            TypeName::Char => "CHAR",
            TypeName::Text => "TEXT",
            TypeName::TinyInt => "TINYINT",
            TypeName::SmallInt => "SMALLINT",
            TypeName::MediumInt => "MEDIUMINT",
            TypeName::Integer => "INTEGER",
            TypeName::BigInt => "BIGINT",
            TypeName::Float => "FLOAT",
            TypeName::Real => "REAL",
            TypeName::Double => "DOUBLE",
            TypeName::Decimal => "DECIMAL",
            TypeName::Boolean => "BOOLEAN",
            TypeName::Time => "TIME",
            TypeName::Date => "DATE",
            TypeName::DateOnly => "DATEONLY",
            TypeName::Blob => "BLOB",
            TypeName::Uuid => "UUID",
            TypeName::Json => "JSON",
            TypeName::Jsonb => "JSONB",
            TypeName::Citext => "CITEXT",
            TypeName::Inet => "INET",
            TypeName::Cidr => "CIDR",
            TypeName::Macaddr => "MACADDR",
            TypeName::Enum => "ENUM",
            TypeName::Range => "RANGE",
            TypeName::Array => "ARRAY",
            TypeName::Geometry => "GEOMETRY",
            TypeName::Geography => "GEOGRAPHY",
            TypeName::Virtual => "VIRTUAL",
        }
    }

    /// Look up a type name, case-insensitively. `INT` and `BOOL` are accepted as aliases.
    pub fn parse(name: &str) -> Option<TypeName> {
        let upper = name.trim().to_ascii_uppercase();
        match upper.as_str() {
            "INT" => Some(TypeName::Integer),
            "BOOL" => Some(TypeName::Boolean),
            other => TypeName::ALL.iter().copied().find(|t| t.as_str() == other),
        }
    }

    /// Integer family: TINYINT, SMALLINT, MEDIUMINT, INTEGER, BIGINT.
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            TypeName::TinyInt
                | TypeName::SmallInt
                | TypeName::MediumInt
                | TypeName::Integer
                | TypeName::BigInt
        )
    }

    /// Float family: FLOAT, REAL, DOUBLE.
    pub fn is_float(&self) -> bool {
        matches!(self, TypeName::Float | TypeName::Real | TypeName::Double)
    }

    /// Number family: integers, floats and DECIMAL.
    pub fn is_number(&self) -> bool {
        self.is_integer() || self.is_float() || *self == TypeName::Decimal
    }

    /// Whether `key` is a recognized option for this type.
    pub fn accepts(&self, key: OptionKey) -> bool {
        use OptionKey::*;
        match self {
            TypeName::String | TypeName::Char => matches!(key, Length | Binary),
            TypeName::Text | TypeName::Blob => matches!(key, Size),
            t if t.is_integer() => matches!(key, Length | Unsigned | Zerofill),
            t if t.is_float() => matches!(key, Length | Scale | Unsigned | Zerofill),
            TypeName::Decimal => matches!(key, Precision | Scale | Unsigned | Zerofill),
            TypeName::Date | TypeName::Time => matches!(key, Precision),
            TypeName::Enum => matches!(key, Values),
            TypeName::Range => matches!(key, Subtype),
            TypeName::Array => matches!(key, Element),
            TypeName::Geometry | TypeName::Geography => matches!(key, Shape | Srid),
            TypeName::Virtual => matches!(key, Returns | Fields),
            _ => false,
        }
    }
}

impl std::fmt::Display for TypeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TypeName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TypeName::parse(s).ok_or_else(|| Error::validation(format!("unknown type `{}`", s)))
    }
}

/// Subtypes a RANGE may be built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeSubtype {
    /// Range of 32-bit integers.
    Integer,
    /// Range of 64-bit integers.
    BigInt,
    /// Range of decimals.
    Decimal,
    /// Range of timestamps.
    Date,
    /// Range of dates.
    DateOnly,
}

impl RangeSubtype {
    /// The catalog type this subtype corresponds to.
    pub fn type_name(&self) -> TypeName {
        match self {
            RangeSubtype::Integer => TypeName::Integer,
            RangeSubtype::BigInt => TypeName::BigInt,
            RangeSubtype::Decimal => TypeName::Decimal,
            RangeSubtype::Date => TypeName::Date,
            RangeSubtype::DateOnly => TypeName::DateOnly,
        }
    }

    /// Parse a subtype from a type name; any other type is rejected.
    pub fn parse(name: &str) -> Result<RangeSubtype> {
        match TypeName::parse(name) {
            Some(TypeName::Integer) => Ok(RangeSubtype::Integer),
            Some(TypeName::BigInt) => Ok(RangeSubtype::BigInt),
            Some(TypeName::Decimal) => Ok(RangeSubtype::Decimal),
            Some(TypeName::Date) => Ok(RangeSubtype::Date),
            Some(TypeName::DateOnly) => Ok(RangeSubtype::DateOnly),
            _ => Err(Error::InvalidOption {
                type_name: TypeName::Range.to_string(),
                option: OptionKey::Subtype.to_string(),
                reason: format!(
                    "`{}` is not one of INTEGER, BIGINT, DECIMAL, DATE, DATEONLY",
                    name
                ),
            }),
        }
    }
}

/// Shape constraint of a spatial column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometryShape {
    Point,
    LineString,
    Polygon,
    MultiPoint,
    MultiLineString,
    MultiPolygon,
    GeometryCollection,
}

impl GeometryShape {
    const ALL: [GeometryShape; 7] = [
        GeometryShape::Point,
        GeometryShape::LineString,
        GeometryShape::Polygon,
        GeometryShape::MultiPoint,
        GeometryShape::MultiLineString,
        GeometryShape::MultiPolygon,
        GeometryShape::GeometryCollection,
    ];

    /// Upper-case SQL name of the shape.
    pub fn as_str(&self) -> &'static str {
        match self {
            GeometryShape::Point => "POINT",
            GeometryShape::LineString => "LINESTRING",
            GeometryShape::Polygon => "POLYGON",
            GeometryShape::MultiPoint => "MULTIPOINT",
            GeometryShape::MultiLineString => "MULTILINESTRING",
            GeometryShape::MultiPolygon => "MULTIPOLYGON",
            GeometryShape::GeometryCollection => "GEOMETRYCOLLECTION",
        }
    }

    /// Parse a shape name, case-insensitively.
    pub fn parse(name: &str) -> Option<GeometryShape> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL.iter().copied().find(|s| s.as_str() == upper)
    }
}

/// Storage size class of TEXT and BLOB columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SizeClass {
    Tiny,
    Medium,
    Long,
}

impl SizeClass {
    /// Lower-case name used in options and notation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SizeClass::Tiny => "tiny",
            SizeClass::Medium => "medium",
            SizeClass::Long => "long",
        }
    }

    /// Parse a size class, case-insensitively.
    pub fn parse(name: &str) -> Option<SizeClass> {
        match name.trim().to_ascii_lowercase().as_str() {
            "tiny" => Some(SizeClass::Tiny),
            "medium" => Some(SizeClass::Medium),
            "long" => Some(SizeClass::Long),
            _ => None,
        }
    }
}

/// Flag modifiers that can be layered onto an existing descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    Unsigned,
    Zerofill,
    Binary,
}

impl Modifier {
    /// The option key this modifier sets.
    pub fn key(&self) -> OptionKey {
        match self {
            Modifier::Unsigned => OptionKey::Unsigned,
            Modifier::Zerofill => OptionKey::Zerofill,
            Modifier::Binary => OptionKey::Binary,
        }
    }
}

/// Canonical modifier set of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    /// Length (strings) or display width (numbers).
    pub length: Option<u32>,
    /// Decimal precision or fractional-second precision.
    pub precision: Option<u32>,
    /// Digits after the decimal point.
    pub scale: Option<u32>,
    /// TEXT/BLOB size class.
    pub size: Option<SizeClass>,
    pub unsigned: bool,
    pub zerofill: bool,
    pub binary: bool,
}

/// Structural part of a descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// A type without structural payload.
    Scalar(TypeName),
    /// Enumeration with its allowed values, in declaration order.
    Enum(Vec<String>),
    /// Range over a subtype.
    Range(RangeSubtype),
    /// Array of an element type.
    Array(Box<TypeDescriptor>),
    /// Planar spatial type.
    Geometry {
        shape: Option<GeometryShape>,
        srid: Option<u32>,
    },
    /// Geodetic spatial type.
    Geography {
        shape: Option<GeometryShape>,
        srid: Option<u32>,
    },
    /// Computed, never stored.
    Virtual {
        /// Type of the computed value.
        returns: Option<Box<TypeDescriptor>>,
        /// Fields the computation depends on.
        fields: Vec<String>,
    },
}

/// An immutable, validated column type.
///
/// Every construction path (positional arguments, named options, the textual
/// notation) goes through [`TypeDescriptor::build`], so equal inputs produce
/// equal descriptors regardless of call style.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "super::notation::TypeSpec", into = "String")]
pub struct TypeDescriptor {
    kind: TypeKind,
    modifiers: Modifiers,
}

impl TypeDescriptor {
    /// Build a descriptor from a type name and its options.
    pub fn build(name: TypeName, options: TypeOptions) -> Result<Self> {
        for key in options.present_keys() {
            if !name.accepts(key) {
                return Err(invalid(name, key, "not applicable to this type"));
            }
        }

        if options.length == Some(0) {
            return Err(invalid(name, OptionKey::Length, "must be greater than zero"));
        }
        if options.scale.is_some() {
            if name == TypeName::Decimal && options.precision.is_none() {
                return Err(invalid(name, OptionKey::Scale, "requires precision"));
            }
            if name.is_float() && options.length.is_none() {
                return Err(invalid(name, OptionKey::Scale, "requires length"));
            }
        }
        if name == TypeName::Decimal {
            if options.precision == Some(0) {
                return Err(invalid(name, OptionKey::Precision, "must be greater than zero"));
            }
            if let (Some(precision), Some(scale)) = (options.precision, options.scale) {
                if scale > precision {
                    return Err(invalid(name, OptionKey::Scale, "must not exceed precision"));
                }
            }
        }
        if let Some(length) = options.length {
            if let Some(scale) = options.scale {
                if name.is_float() && scale > length {
                    return Err(invalid(name, OptionKey::Scale, "must not exceed length"));
                }
            }
        }
        if matches!(name, TypeName::Date | TypeName::Time) {
            if let Some(precision) = options.precision {
                if precision > MAX_TIME_PRECISION {
                    return Err(invalid(name, OptionKey::Precision, "must be at most 6"));
                }
            }
        }

        let kind = match name {
            TypeName::Enum => {
                let values = options
                    .values
                    .ok_or_else(|| invalid(name, OptionKey::Values, "is required"))?;
                if values.is_empty() {
                    return Err(invalid(name, OptionKey::Values, "must not be empty"));
                }
                for (i, value) in values.iter().enumerate() {
                    if values[..i].contains(value) {
                        return Err(invalid(
                            name,
                            OptionKey::Values,
                            &format!("duplicate value `{}`", value),
                        ));
                    }
                }
                TypeKind::Enum(values)
            }
            TypeName::Range => TypeKind::Range(
                options
                    .subtype
                    .ok_or_else(|| invalid(name, OptionKey::Subtype, "is required"))?,
            ),
            TypeName::Array => {
                let element = options
                    .element
                    .ok_or_else(|| invalid(name, OptionKey::Element, "is required"))?;
                if element.is_virtual() {
                    return Err(invalid(name, OptionKey::Element, "must be a stored type"));
                }
                TypeKind::Array(Box::new(element))
            }
            TypeName::Geometry | TypeName::Geography => {
                if options.srid.is_some() && options.shape.is_none() {
                    return Err(invalid(name, OptionKey::Srid, "requires shape"));
                }
                if name == TypeName::Geometry {
                    TypeKind::Geometry {
                        shape: options.shape,
                        srid: options.srid,
                    }
                } else {
                    TypeKind::Geography {
                        shape: options.shape,
                        srid: options.srid,
                    }
                }
            }
            TypeName::Virtual => {
                let fields = options.fields.unwrap_or_default();
                if !fields.is_empty() && options.returns.is_none() {
                    return Err(invalid(name, OptionKey::Fields, "requires returns"));
                }
                if options.returns.as_ref().is_some_and(|r| r.is_virtual()) {
                    return Err(invalid(name, OptionKey::Returns, "must be a stored type"));
                }
                TypeKind::Virtual {
                    returns: options.returns.map(Box::new),
                    fields,
                }
            }
            other => TypeKind::Scalar(other),
        };

        Ok(Self {
            kind,
            modifiers: Modifiers {
                length: options.length,
                precision: options.precision,
                scale: options.scale,
                size: options.size,
                unsigned: options.unsigned,
                zerofill: options.zerofill,
                binary: options.binary,
            },
        })
    }

    /// Build a descriptor without options.
    pub fn of(name: TypeName) -> Result<Self> {
        Self::build(name, TypeOptions::default())
    }

    /// Build a descriptor from positional shorthand arguments.
    pub fn positional(name: TypeName, args: &[u32]) -> Result<Self> {
        Self::build(name, TypeOptions::positional(name, args)?)
    }

    fn scalar(name: TypeName) -> Self {
        Self {
            kind: TypeKind::Scalar(name),
            modifiers: Modifiers::default(),
        }
    }

    /// `STRING(length)`.
    pub fn string(length: u32) -> Result<Self> {
        Self::positional(TypeName::String, &[length])
    }

    /// `TEXT`.
    pub fn text() -> Self {
        Self::scalar(TypeName::Text)
    }

    /// `INTEGER`.
    pub fn integer() -> Self {
        Self::scalar(TypeName::Integer)
    }

    /// `BIGINT`.
    pub fn big_int() -> Self {
        Self::scalar(TypeName::BigInt)
    }

    /// `BOOLEAN`.
    pub fn boolean() -> Self {
        Self::scalar(TypeName::Boolean)
    }

    /// `DATE` (timestamp).
    pub fn date() -> Self {
        Self::scalar(TypeName::Date)
    }

    /// `DATEONLY`.
    pub fn date_only() -> Self {
        Self::scalar(TypeName::DateOnly)
    }

    /// `UUID`.
    pub fn uuid() -> Self {
        Self::scalar(TypeName::Uuid)
    }

    /// `JSON`.
    pub fn json() -> Self {
        Self::scalar(TypeName::Json)
    }

    /// `DECIMAL(precision, scale)`.
    pub fn decimal(precision: u32, scale: u32) -> Result<Self> {
        Self::positional(TypeName::Decimal, &[precision, scale])
    }

    /// `ENUM(values...)`.
    pub fn enumeration<I, S>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::build(TypeName::Enum, TypeOptions::default().values(values))
    }

    /// `RANGE(subtype)`.
    pub fn range(subtype: RangeSubtype) -> Self {
        Self {
            kind: TypeKind::Range(subtype),
            modifiers: Modifiers::default(),
        }
    }

    /// `ARRAY(element)`.
    pub fn array(element: TypeDescriptor) -> Result<Self> {
        Self::build(TypeName::Array, TypeOptions::default().element(element))
    }

    /// Return a copy with `modifier` applied.
    ///
    /// Applying a modifier that is already set returns an equal descriptor, and
    /// the order in which modifiers are applied does not affect the result.
    pub fn with_modifier(&self, modifier: Modifier) -> Result<Self> {
        let name = self.name();
        if !name.accepts(modifier.key()) {
            return Err(invalid(name, modifier.key(), "not applicable to this type"));
        }
        let mut next = self.clone();
        match modifier {
            Modifier::Unsigned => next.modifiers.unsigned = true,
            Modifier::Zerofill => next.modifiers.zerofill = true,
            Modifier::Binary => next.modifiers.binary = true,
        }
        Ok(next)
    }

    /// Shorthand for `with_modifier(Modifier::Unsigned)`.
    pub fn unsigned(&self) -> Result<Self> {
        self.with_modifier(Modifier::Unsigned)
    }

    /// Shorthand for `with_modifier(Modifier::Zerofill)`.
    pub fn zerofill(&self) -> Result<Self> {
        self.with_modifier(Modifier::Zerofill)
    }

    /// The type name of this descriptor.
    pub fn name(&self) -> TypeName {
        match &self.kind {
            TypeKind::Scalar(name) => *name,
            TypeKind::Enum(_) => TypeName::Enum,
            TypeKind::Range(_) => TypeName::Range,
            TypeKind::Array(_) => TypeName::Array,
            TypeKind::Geometry { .. } => TypeName::Geometry,
            TypeKind::Geography { .. } => TypeName::Geography,
            TypeKind::Virtual { .. } => TypeName::Virtual,
        }
    }

    /// The structural kind.
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// The modifier set.
    pub fn modifiers(&self) -> &Modifiers {
        &self.modifiers
    }

    /// Whether this is a VIRTUAL (never stored) type.
    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, TypeKind::Virtual { .. })
    }

    /// Enum values, if this is an ENUM.
    pub fn enum_values(&self) -> Option<&[String]> {
        match &self.kind {
            TypeKind::Enum(values) => Some(values),
            _ => None,
        }
    }

    /// Options that rebuild this descriptor through [`TypeDescriptor::build`].
    pub fn to_options(&self) -> TypeOptions {
        let m = &self.modifiers;
        let mut options = TypeOptions {
            length: m.length,
            precision: m.precision,
            scale: m.scale,
            size: m.size,
            unsigned: m.unsigned,
            zerofill: m.zerofill,
            binary: m.binary,
            ..TypeOptions::default()
        };
        match &self.kind {
            TypeKind::Scalar(_) => {}
            TypeKind::Enum(values) => options.values = Some(values.clone()),
            TypeKind::Range(subtype) => options.subtype = Some(*subtype),
            TypeKind::Array(element) => options.element = Some((**element).clone()),
            TypeKind::Geometry { shape, srid } | TypeKind::Geography { shape, srid } => {
                options.shape = *shape;
                options.srid = *srid;
            }
            TypeKind::Virtual { returns, fields } => {
                options.returns = returns.as_deref().cloned();
                if !fields.is_empty() {
                    options.fields = Some(fields.clone());
                }
            }
        }
        options
    }
}

fn invalid(name: TypeName, key: OptionKey, reason: &str) -> Error {
    Error::InvalidOption {
        type_name: name.to_string(),
        option: key.to_string(),
        reason: reason.to_string(),
    }
}
