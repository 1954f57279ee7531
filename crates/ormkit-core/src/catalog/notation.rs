//! Textual type notation, e.g. `DECIMAL(10,2) UNSIGNED` or `ENUM('a','b')`.
//!
//! The notation is the positional call style written out as text. It is what
//! descriptors serialize to and what schema files usually contain.

use super::options::TypeOptions;
use super::types::{GeometryShape, RangeSubtype, SizeClass, TypeDescriptor, TypeKind, TypeName};
use crate::error::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};

impl std::fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let m = self.modifiers();
        let name = self.name();
        write!(f, "{}", name)?;

        match self.kind() {
            TypeKind::Enum(values) => {
                let quoted: Vec<String> = values.iter().map(|v| quote(v)).collect();
                write!(f, "({})", quoted.join(","))?;
            }
            TypeKind::Range(subtype) => write!(f, "({})", subtype.type_name())?,
            TypeKind::Array(element) => write!(f, "({})", element)?,
            TypeKind::Geometry { shape, srid } | TypeKind::Geography { shape, srid } => {
                match (shape, srid) {
                    (Some(shape), Some(srid)) => write!(f, "({},{})", shape.as_str(), srid)?,
                    (Some(shape), None) => write!(f, "({})", shape.as_str())?,
                    _ => {}
                }
            }
            TypeKind::Virtual { returns, fields } => {
                if let Some(returns) = returns {
                    write!(f, "({}", returns)?;
                    for field in fields {
                        write!(f, ",{}", field)?;
                    }
                    write!(f, ")")?;
                }
            }
            TypeKind::Scalar(_) => {
                if let Some(size) = m.size {
                    write!(f, "({})", size.as_str())?;
                }
                let numbers: Vec<u32> = match name {
                    TypeName::Decimal => [m.precision, m.scale].into_iter().flatten().collect(),
                    TypeName::Date | TypeName::Time => m.precision.into_iter().collect(),
                    _ => [m.length, m.scale].into_iter().flatten().collect(),
                };
                if !numbers.is_empty() {
                    let args: Vec<String> = numbers.iter().map(u32::to_string).collect();
                    write!(f, "({})", args.join(","))?;
                }
            }
        }

        if m.unsigned {
            write!(f, " UNSIGNED")?;
        }
        if m.zerofill {
            write!(f, " ZEROFILL")?;
        }
        if m.binary {
            write!(f, " BINARY")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for TypeDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let input = s.trim();
        let name_end = input
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(input.len());
        let name: TypeName = input[..name_end].parse()?;
        let mut rest = input[name_end..].trim_start();

        let mut args = Vec::new();
        if rest.starts_with('(') {
            let close = matching_paren(rest)
                .ok_or_else(|| Error::validation(format!("unbalanced parentheses in `{}`", s)))?;
            args = split_args(&rest[1..close]);
            rest = rest[close + 1..].trim_start();
        }

        let mut options = options_from_args(name, &args)?;
        for word in rest.split_whitespace() {
            match word.to_ascii_uppercase().as_str() {
                "UNSIGNED" => options.unsigned = true,
                "ZEROFILL" => options.zerofill = true,
                "BINARY" => options.binary = true,
                other => {
                    return Err(Error::validation(format!(
                        "unexpected `{}` in type `{}`",
                        other, s
                    )))
                }
            }
        }

        TypeDescriptor::build(name, options)
    }
}

fn options_from_args(name: TypeName, args: &[String]) -> Result<TypeOptions> {
    let mut options = TypeOptions::default();
    if args.is_empty() {
        return Ok(options);
    }

    match name {
        TypeName::Enum => {
            let values = args.iter().map(|a| unquote(a)).collect::<Result<Vec<_>>>()?;
            options.values = Some(values);
        }
        TypeName::Range => {
            let [subtype] = single(name, args)?;
            options.subtype = Some(RangeSubtype::parse(subtype)?);
        }
        TypeName::Array => {
            let [element] = single(name, args)?;
            options.element = Some(element.parse()?);
        }
        TypeName::Geometry | TypeName::Geography => {
            if args.len() > 2 {
                return Err(Error::validation(format!(
                    "{} takes a shape and an optional srid",
                    name
                )));
            }
            options.shape = Some(GeometryShape::parse(&args[0]).ok_or_else(|| {
                Error::validation(format!("unknown geometry shape `{}`", args[0]))
            })?);
            if let Some(srid) = args.get(1) {
                options.srid = Some(parse_number(name, srid)?);
            }
        }
        TypeName::Virtual => {
            options.returns = Some(args[0].parse()?);
            if args.len() > 1 {
                options.fields = Some(args[1..].to_vec());
            }
        }
        TypeName::Text | TypeName::Blob => {
            let [size] = single(name, args)?;
            options.size = Some(
                SizeClass::parse(size.trim_matches('\''))
                    .ok_or_else(|| Error::validation(format!("unknown {} size `{}`", name, size)))?,
            );
        }
        _ => {
            let numbers = args
                .iter()
                .map(|a| parse_number(name, a))
                .collect::<Result<Vec<_>>>()?;
            options = TypeOptions::positional(name, &numbers)?;
        }
    }
    Ok(options)
}

fn single<'a>(name: TypeName, args: &'a [String]) -> Result<[&'a str; 1]> {
    match args {
        [only] => Ok([only.as_str()]),
        _ => Err(Error::validation(format!("{} takes exactly one argument", name))),
    }
}

fn parse_number(name: TypeName, arg: &str) -> Result<u32> {
    arg.parse()
        .map_err(|_| Error::validation(format!("expected a number in {} arguments, got `{}`", name, arg)))
}

/// Index of the parenthesis closing the one at the start of `s`.
fn matching_paren(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote = false;
    for (i, c) in s.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on top-level commas, keeping quoted strings and nested parentheses intact.
fn split_args(s: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    for c in s.chars() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = depth.saturating_sub(1),
            ',' if !in_quote && depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
                continue;
            }
            _ => {}
        }
        current.push(c);
    }
    if !current.trim().is_empty() || !args.is_empty() {
        args.push(current.trim().to_string());
    }
    args
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn unquote(arg: &str) -> Result<String> {
    let inner = arg
        .strip_prefix('\'')
        .and_then(|a| a.strip_suffix('\''))
        .ok_or_else(|| Error::validation(format!("expected a quoted value, got `{}`", arg)))?;
    Ok(inner.replace("''", "'"))
}

/// Serialized forms a descriptor is accepted in.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum TypeSpec {
    /// `"DECIMAL(10,2)"`
    Notation(String),
    /// `{"type": "DECIMAL", "precision": 10, "scale": 2}`
    Named {
        #[serde(rename = "type")]
        name: String,
        #[serde(flatten)]
        options: Map<String, Value>,
    },
}

impl TryFrom<TypeSpec> for TypeDescriptor {
    type Error = Error;

    fn try_from(spec: TypeSpec) -> Result<Self> {
        match spec {
            TypeSpec::Notation(text) => text.parse(),
            TypeSpec::Named { name, options } => {
                let name: TypeName = name.parse()?;
                TypeDescriptor::build(name, TypeOptions::from_map(name, &options)?)
            }
        }
    }
}

impl From<TypeDescriptor> for String {
    fn from(descriptor: TypeDescriptor) -> String {
        descriptor.to_string()
    }
}
