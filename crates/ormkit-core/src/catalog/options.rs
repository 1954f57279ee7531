//! Recognized type options and the call styles that produce them.

use super::types::{GeometryShape, RangeSubtype, SizeClass, TypeDescriptor, TypeName};
use crate::error::{Error, Result};
use serde_json::{Map, Value};

/// Keys of the options a type may be configured with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Length,
    Precision,
    Scale,
    Size,
    Unsigned,
    Zerofill,
    Binary,
    Values,
    Subtype,
    Element,
    Shape,
    Srid,
    Returns,
    Fields,
}

impl OptionKey {
    /// Name of the key in named-options maps.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::Length => "length",
            OptionKey::Precision => "precision",
            OptionKey::Scale => "scale",
            OptionKey::Size => "size",
            OptionKey::Unsigned => "unsigned",
            OptionKey::Zerofill => "zerofill",
            OptionKey::Binary => "binary",
            OptionKey::Values => "values",
            OptionKey::Subtype => "subtype",
            OptionKey::Element => "element",
            OptionKey::Shape => "shape",
            OptionKey::Srid => "srid",
            OptionKey::Returns => "returns",
            OptionKey::Fields => "fields",
        }
    }

    /// Look up a key by name. `decimals` is accepted for `scale`.
    pub fn parse(name: &str) -> Option<OptionKey> {
        let key = match name {
            "length" => OptionKey::Length,
            "precision" => OptionKey::Precision,
            "scale" | "decimals" => OptionKey::Scale,
            "size" => OptionKey::Size,
            "unsigned" => OptionKey::Unsigned,
            "zerofill" => OptionKey::Zerofill,
            "binary" => OptionKey::Binary,
            "values" => OptionKey::Values,
            "subtype" => OptionKey::Subtype,
            "element" => OptionKey::Element,
            "shape" => OptionKey::Shape,
            "srid" => OptionKey::Srid,
            "returns" => OptionKey::Returns,
            "fields" => OptionKey::Fields,
            _ => return None,
        };
        Some(key)
    }
}

impl std::fmt::Display for OptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named options for [`TypeDescriptor::build`].
///
/// Flags left `false` and fields left `None` count as absent.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeOptions {
    pub length: Option<u32>,
    pub precision: Option<u32>,
    pub scale: Option<u32>,
    pub size: Option<SizeClass>,
    pub unsigned: bool,
    pub zerofill: bool,
    pub binary: bool,
    pub values: Option<Vec<String>>,
    pub subtype: Option<RangeSubtype>,
    pub element: Option<TypeDescriptor>,
    pub shape: Option<GeometryShape>,
    pub srid: Option<u32>,
    pub returns: Option<TypeDescriptor>,
    pub fields: Option<Vec<String>>,
}

impl TypeOptions {
    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn precision(mut self, precision: u32) -> Self {
        self.precision = Some(precision);
        self
    }

    pub fn scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn size(mut self, size: SizeClass) -> Self {
        self.size = Some(size);
        self
    }

    pub fn unsigned(mut self) -> Self {
        self.unsigned = true;
        self
    }

    pub fn zerofill(mut self) -> Self {
        self.zerofill = true;
        self
    }

    pub fn binary(mut self) -> Self {
        self.binary = true;
        self
    }

    pub fn values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn subtype(mut self, subtype: RangeSubtype) -> Self {
        self.subtype = Some(subtype);
        self
    }

    pub fn element(mut self, element: TypeDescriptor) -> Self {
        self.element = Some(element);
        self
    }

    pub fn shape(mut self, shape: GeometryShape) -> Self {
        self.shape = Some(shape);
        self
    }

    pub fn srid(mut self, srid: u32) -> Self {
        self.srid = Some(srid);
        self
    }

    pub fn returns(mut self, returns: TypeDescriptor) -> Self {
        self.returns = Some(returns);
        self
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Keys of every option that is set.
    pub fn present_keys(&self) -> Vec<OptionKey> {
        let mut keys = Vec::new();
        let mut push = |set: bool, key: OptionKey| {
            if set {
                keys.push(key);
            }
        };
        push(self.length.is_some(), OptionKey::Length);
        push(self.precision.is_some(), OptionKey::Precision);
        push(self.scale.is_some(), OptionKey::Scale);
        push(self.size.is_some(), OptionKey::Size);
        push(self.unsigned, OptionKey::Unsigned);
        push(self.zerofill, OptionKey::Zerofill);
        push(self.binary, OptionKey::Binary);
        push(self.values.is_some(), OptionKey::Values);
        push(self.subtype.is_some(), OptionKey::Subtype);
        push(self.element.is_some(), OptionKey::Element);
        push(self.shape.is_some(), OptionKey::Shape);
        push(self.srid.is_some(), OptionKey::Srid);
        push(self.returns.is_some(), OptionKey::Returns);
        push(self.fields.is_some(), OptionKey::Fields);
        keys
    }

    /// Map positional shorthand arguments onto named options.
    ///
    /// | Type | Arguments |
    /// |------|-----------|
    /// | STRING, CHAR, integers | `[length]` |
    /// | FLOAT, REAL, DOUBLE | `[length, scale]` |
    /// | DECIMAL | `[precision, scale]` |
    /// | DATE, TIME | `[precision]` |
    pub fn positional(name: TypeName, args: &[u32]) -> Result<Self> {
        type Slot = fn(&mut TypeOptions, u32);
        const LENGTH: Slot = |o, v| o.length = Some(v);
        const PRECISION: Slot = |o, v| o.precision = Some(v);
        const SCALE: Slot = |o, v| o.scale = Some(v);

        let slots: &[Slot] = match name {
            TypeName::String | TypeName::Char => &[LENGTH],
            t if t.is_integer() => &[LENGTH],
            t if t.is_float() => &[LENGTH, SCALE],
            TypeName::Decimal => &[PRECISION, SCALE],
            TypeName::Date | TypeName::Time => &[PRECISION],
            _ => &[],
        };
        if args.len() > slots.len() {
            return Err(Error::validation(format!(
                "{} takes at most {} positional argument(s), got {}",
                name,
                slots.len(),
                args.len()
            )));
        }

        let mut options = TypeOptions::default();
        for (set, value) in slots.iter().zip(args) {
            set(&mut options, *value);
        }
        Ok(options)
    }

    /// Read named options from a JSON object, rejecting unknown or ill-typed keys.
    pub fn from_map(name: TypeName, map: &Map<String, Value>) -> Result<Self> {
        let mut options = TypeOptions::default();
        for (raw_key, value) in map {
            let key = OptionKey::parse(raw_key).ok_or_else(|| Error::InvalidOption {
                type_name: name.to_string(),
                option: raw_key.clone(),
                reason: "unknown option".to_string(),
            })?;
            if !name.accepts(key) {
                return Err(bad(name, raw_key, "not applicable to this type"));
            }
            match key {
                OptionKey::Length => options.length = Some(as_u32(name, raw_key, value)?),
                OptionKey::Precision => options.precision = Some(as_u32(name, raw_key, value)?),
                OptionKey::Scale => options.scale = Some(as_u32(name, raw_key, value)?),
                OptionKey::Srid => options.srid = Some(as_u32(name, raw_key, value)?),
                OptionKey::Unsigned => options.unsigned = as_bool(name, raw_key, value)?,
                OptionKey::Zerofill => options.zerofill = as_bool(name, raw_key, value)?,
                OptionKey::Binary => options.binary = as_bool(name, raw_key, value)?,
                OptionKey::Size => {
                    let size = as_str(name, raw_key, value)?;
                    options.size = Some(
                        SizeClass::parse(size)
                            .ok_or_else(|| bad(name, raw_key, "expected tiny, medium or long"))?,
                    );
                }
                OptionKey::Shape => {
                    let shape = as_str(name, raw_key, value)?;
                    options.shape = Some(
                        GeometryShape::parse(shape)
                            .ok_or_else(|| bad(name, raw_key, "unknown geometry shape"))?,
                    );
                }
                OptionKey::Subtype => {
                    options.subtype = Some(RangeSubtype::parse(as_str(name, raw_key, value)?)?)
                }
                OptionKey::Values => options.values = Some(as_strings(name, raw_key, value)?),
                OptionKey::Fields => options.fields = Some(as_strings(name, raw_key, value)?),
                OptionKey::Element => options.element = Some(as_type(name, raw_key, value)?),
                OptionKey::Returns => options.returns = Some(as_type(name, raw_key, value)?),
            }
        }
        Ok(options)
    }
}

fn bad(name: TypeName, key: &str, reason: &str) -> Error {
    Error::InvalidOption {
        type_name: name.to_string(),
        option: key.to_string(),
        reason: reason.to_string(),
    }
}

fn as_u32(name: TypeName, key: &str, value: &Value) -> Result<u32> {
    value
        .as_u64()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| bad(name, key, "expected a non-negative integer"))
}

fn as_bool(name: TypeName, key: &str, value: &Value) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| bad(name, key, "expected a boolean"))
}

fn as_str<'a>(name: TypeName, key: &str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| bad(name, key, "expected a string"))
}

fn as_strings(name: TypeName, key: &str, value: &Value) -> Result<Vec<String>> {
    let items = value
        .as_array()
        .ok_or_else(|| bad(name, key, "expected an array of strings"))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(str::to_string)
                .ok_or_else(|| bad(name, key, "expected an array of strings"))
        })
        .collect()
}

fn as_type(name: TypeName, key: &str, value: &Value) -> Result<TypeDescriptor> {
    serde_json::from_value(value.clone()).map_err(|e| bad(name, key, &e.to_string()))
}
