//! Type rendering per dialect.

use super::Dialect;
use crate::catalog::{
    GeometryShape, Modifiers, RangeSubtype, SizeClass, TypeDescriptor, TypeKind, TypeName,
};
use crate::error::{Error, Result};

/// Length used for STRING and CHAR when none is given.
const DEFAULT_STRING_LENGTH: u32 = 255;

/// Render the SQL column type for `descriptor` on `dialect`.
///
/// Enum columns on dialects without native enums render their storage type
/// here; the CHECK constraint restricting the domain is added by the column
/// renderer.
pub fn render_type(dialect: Dialect, descriptor: &TypeDescriptor) -> Result<String> {
    let m = descriptor.modifiers();
    let name = descriptor.name();

    if (m.unsigned || m.zerofill) && dialect != Dialect::MySql {
        return Err(unsupported(dialect, descriptor));
    }

    let sql = match descriptor.kind() {
        TypeKind::Scalar(name) => render_scalar(dialect, *name, m),
        TypeKind::Enum(values) => match dialect {
            Dialect::MySql => {
                let values: Vec<String> = values.iter().map(|v| dialect.quote_literal(v)).collect();
                Some(format!("ENUM({})", values.join(", ")))
            }
            Dialect::Postgres => Some(format!("VARCHAR({})", DEFAULT_STRING_LENGTH)),
            Dialect::Sqlite => Some("TEXT".to_string()),
            Dialect::Mssql => Some(format!("NVARCHAR({})", DEFAULT_STRING_LENGTH)),
        },
        TypeKind::Range(subtype) => match dialect {
            Dialect::Postgres => Some(
                match subtype {
                    RangeSubtype::Integer => "INT4RANGE",
                    RangeSubtype::BigInt => "INT8RANGE",
                    RangeSubtype::Decimal => "NUMRANGE",
                    RangeSubtype::Date => "TSTZRANGE",
                    RangeSubtype::DateOnly => "DATERANGE",
                }
                .to_string(),
            ),
            _ => None,
        },
        TypeKind::Array(element) => match dialect {
            Dialect::Postgres => Some(format!("{}[]", render_type(dialect, element)?)),
            _ => None,
        },
        TypeKind::Geometry { shape, srid } => match dialect {
            Dialect::Postgres => Some(spatial("GEOMETRY", *shape, *srid)),
            Dialect::MySql => {
                let base = shape.map_or("GEOMETRY", |s| s.as_str());
                Some(match srid {
                    Some(srid) => format!("{} SRID {}", base, srid),
                    None => base.to_string(),
                })
            }
            _ => None,
        },
        TypeKind::Geography { shape, srid } => match dialect {
            Dialect::Postgres => Some(spatial("GEOGRAPHY", *shape, *srid)),
            _ => None,
        },
        TypeKind::Virtual { .. } => None,
    };

    let mut sql = sql.ok_or_else(|| unsupported(dialect, descriptor))?;
    if dialect == Dialect::MySql && name.is_number() {
        if m.unsigned {
            sql.push_str(" UNSIGNED");
        }
        if m.zerofill {
            sql.push_str(" ZEROFILL");
        }
    }
    Ok(sql)
}

fn render_scalar(dialect: Dialect, name: TypeName, m: &Modifiers) -> Option<String> {
    use Dialect::*;

    let length = m.length.unwrap_or(DEFAULT_STRING_LENGTH);
    let sql = match name {
        TypeName::String => match (dialect, m.binary) {
            (Postgres, true) => "BYTEA".to_string(),
            (Postgres, false) => format!("VARCHAR({})", length),
            (MySql | Sqlite, binary) => with_binary(format!("VARCHAR({})", length), binary),
            (Mssql, true) => format!("VARBINARY({})", length),
            (Mssql, false) => format!("NVARCHAR({})", length),
        },
        TypeName::Char => match (dialect, m.binary) {
            (Postgres, true) => "BYTEA".to_string(),
            (Postgres, false) => format!("CHAR({})", length),
            (MySql | Sqlite, binary) => with_binary(format!("CHAR({})", length), binary),
            (Mssql, true) => format!("BINARY({})", length),
            (Mssql, false) => format!("NCHAR({})", length),
        },
        TypeName::Text => match dialect {
            MySql => format!("{}TEXT", size_prefix(m.size)),
            Mssql => "NVARCHAR(MAX)".to_string(),
            Postgres | Sqlite => "TEXT".to_string(),
        },
        TypeName::Blob => match dialect {
            MySql => format!("{}BLOB", size_prefix(m.size)),
            Postgres => "BYTEA".to_string(),
            Sqlite => "BLOB".to_string(),
            Mssql => "VARBINARY(MAX)".to_string(),
        },
        TypeName::TinyInt => match dialect {
            MySql | Sqlite => with_width("TINYINT", dialect, m),
            Postgres | Mssql => "SMALLINT".to_string(),
        },
        TypeName::SmallInt => with_width("SMALLINT", dialect, m),
        TypeName::MediumInt => match dialect {
            MySql | Sqlite => with_width("MEDIUMINT", dialect, m),
            Postgres => "INTEGER".to_string(),
            Mssql => "INT".to_string(),
        },
        TypeName::Integer => match dialect {
            Mssql => "INT".to_string(),
            _ => with_width("INTEGER", dialect, m),
        },
        TypeName::BigInt => with_width("BIGINT", dialect, m),
        TypeName::Float => match (dialect, m.length, m.scale) {
            (MySql, Some(length), Some(scale)) => format!("FLOAT({},{})", length, scale),
            (Sqlite, _, _) => "FLOAT".to_string(),
            (_, Some(length), _) => format!("FLOAT({})", length),
            _ => "FLOAT".to_string(),
        },
        TypeName::Real => match (dialect, m.length, m.scale) {
            (MySql, Some(length), Some(scale)) => format!("REAL({},{})", length, scale),
            _ => "REAL".to_string(),
        },
        TypeName::Double => match (dialect, m.length, m.scale) {
            (Mssql, _, _) => "FLOAT(53)".to_string(),
            (MySql, Some(length), Some(scale)) => format!("DOUBLE PRECISION({},{})", length, scale),
            _ => "DOUBLE PRECISION".to_string(),
        },
        TypeName::Decimal => match (m.precision, m.scale) {
            (Some(precision), Some(scale)) => format!("DECIMAL({},{})", precision, scale),
            (Some(precision), None) => format!("DECIMAL({})", precision),
            _ => "DECIMAL".to_string(),
        },
        TypeName::Boolean => match dialect {
            Postgres => "BOOLEAN".to_string(),
            MySql | Sqlite => "TINYINT(1)".to_string(),
            Mssql => "BIT".to_string(),
        },
        TypeName::Time => match dialect {
            Sqlite => "TIME".to_string(),
            _ => with_precision("TIME", m.precision),
        },
        TypeName::Date => match dialect {
            Postgres => format!("{} WITH TIME ZONE", with_precision("TIMESTAMP", m.precision)),
            MySql => with_precision("DATETIME", m.precision),
            Sqlite => "DATETIME".to_string(),
            Mssql => with_precision("DATETIMEOFFSET", m.precision),
        },
        TypeName::DateOnly => "DATE".to_string(),
        TypeName::Uuid => match dialect {
            Postgres | Sqlite => "UUID".to_string(),
            MySql => "CHAR(36) BINARY".to_string(),
            Mssql => "UNIQUEIDENTIFIER".to_string(),
        },
        TypeName::Json => match dialect {
            Mssql => return None,
            _ => "JSON".to_string(),
        },
        TypeName::Jsonb | TypeName::Citext | TypeName::Inet | TypeName::Cidr | TypeName::Macaddr => {
            match dialect {
                Postgres => name.as_str().to_string(),
                _ => return None,
            }
        }
        // Structured kinds never reach the scalar path.
        TypeName::Enum
        | TypeName::Range
        | TypeName::Array
        | TypeName::Geometry
        | TypeName::Geography
        | TypeName::Virtual => return None,
    };
    Some(sql)
}

/// Integer display width only exists on mysql.
fn with_width(base: &str, dialect: Dialect, m: &Modifiers) -> String {
    match (dialect, m.length) {
        (Dialect::MySql, Some(width)) => format!("{}({})", base, width),
        _ => base.to_string(),
    }
}

fn with_binary(sql: String, binary: bool) -> String {
    if binary {
        format!("{} BINARY", sql)
    } else {
        sql
    }
}

fn with_precision(base: &str, precision: Option<u32>) -> String {
    match precision {
        Some(p) => format!("{}({})", base, p),
        None => base.to_string(),
    }
}

fn size_prefix(size: Option<SizeClass>) -> &'static str {
    match size {
        Some(SizeClass::Tiny) => "TINY",
        Some(SizeClass::Medium) => "MEDIUM",
        Some(SizeClass::Long) => "LONG",
        None => "",
    }
}

fn spatial(base: &str, shape: Option<GeometryShape>, srid: Option<u32>) -> String {
    match (shape, srid) {
        (Some(shape), Some(srid)) => format!("{}({}, {})", base, shape.as_str(), srid),
        (Some(shape), None) => format!("{}({})", base, shape.as_str()),
        _ => base.to_string(),
    }
}

fn unsupported(dialect: Dialect, descriptor: &TypeDescriptor) -> Error {
    Error::UnsupportedType {
        type_name: descriptor.to_string(),
        dialect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::TypeOptions;

    fn t(notation: &str) -> TypeDescriptor {
        notation.parse().unwrap()
    }

    fn render(dialect: Dialect, notation: &str) -> String {
        render_type(dialect, &t(notation)).unwrap()
    }

    #[test]
    fn test_string_types() {
        assert_eq!(render(Dialect::Postgres, "STRING"), "VARCHAR(255)");
        assert_eq!(render(Dialect::Postgres, "STRING(64) BINARY"), "BYTEA");
        assert_eq!(render(Dialect::MySql, "STRING(64) BINARY"), "VARCHAR(64) BINARY");
        assert_eq!(render(Dialect::Mssql, "STRING(64)"), "NVARCHAR(64)");
        assert_eq!(render(Dialect::Mssql, "CHAR(2) BINARY"), "BINARY(2)");
        assert_eq!(render(Dialect::MySql, "TEXT(medium)"), "MEDIUMTEXT");
        assert_eq!(render(Dialect::Postgres, "TEXT(long)"), "TEXT");
    }

    #[test]
    fn test_numeric_types() {
        assert_eq!(
            render(Dialect::MySql, "INTEGER(11) UNSIGNED ZEROFILL"),
            "INTEGER(11) UNSIGNED ZEROFILL"
        );
        assert_eq!(render(Dialect::Postgres, "INTEGER(11)"), "INTEGER");
        assert_eq!(render(Dialect::Mssql, "TINYINT"), "SMALLINT");
        assert_eq!(render(Dialect::MySql, "FLOAT(10,2)"), "FLOAT(10,2)");
        assert_eq!(render(Dialect::Postgres, "FLOAT(10,2)"), "FLOAT(10)");
        assert_eq!(render(Dialect::Mssql, "DOUBLE"), "FLOAT(53)");
        assert_eq!(render(Dialect::Sqlite, "DECIMAL(10,2)"), "DECIMAL(10,2)");
    }

    #[test]
    fn test_unsigned_only_on_mysql() {
        let unsigned = t("BIGINT UNSIGNED");
        for dialect in [Dialect::Postgres, Dialect::Sqlite, Dialect::Mssql] {
            assert!(matches!(
                render_type(dialect, &unsigned),
                Err(Error::UnsupportedType { .. })
            ));
        }
    }

    #[test]
    fn test_boolean_and_temporal() {
        assert_eq!(render(Dialect::Postgres, "BOOLEAN"), "BOOLEAN");
        assert_eq!(render(Dialect::MySql, "BOOLEAN"), "TINYINT(1)");
        assert_eq!(render(Dialect::Mssql, "BOOLEAN"), "BIT");
        assert_eq!(render(Dialect::Postgres, "DATE(3)"), "TIMESTAMP(3) WITH TIME ZONE");
        assert_eq!(render(Dialect::MySql, "DATE(6)"), "DATETIME(6)");
        assert_eq!(render(Dialect::Mssql, "DATE"), "DATETIMEOFFSET");
        assert_eq!(render(Dialect::Sqlite, "DATEONLY"), "DATE");
    }

    #[test]
    fn test_structured_types() {
        assert_eq!(render(Dialect::MySql, "ENUM('a','b')"), "ENUM('a', 'b')");
        assert_eq!(render(Dialect::Postgres, "ENUM('a','b')"), "VARCHAR(255)");
        assert_eq!(render(Dialect::Postgres, "RANGE(DATE)"), "TSTZRANGE");
        assert_eq!(render(Dialect::Postgres, "ARRAY(STRING(10))"), "VARCHAR(10)[]");
        assert_eq!(
            render(Dialect::Postgres, "GEOMETRY(POINT,4326)"),
            "GEOMETRY(POINT, 4326)"
        );
        assert_eq!(render(Dialect::MySql, "GEOMETRY(POINT,4326)"), "POINT SRID 4326");
        assert_eq!(render(Dialect::Postgres, "GEOGRAPHY"), "GEOGRAPHY");
    }

    #[test]
    fn test_unsupported_pairings() {
        let cases = [
            (Dialect::Sqlite, "GEOMETRY"),
            (Dialect::Mssql, "GEOMETRY"),
            (Dialect::MySql, "GEOGRAPHY"),
            (Dialect::MySql, "RANGE(INTEGER)"),
            (Dialect::Sqlite, "ARRAY(INTEGER)"),
            (Dialect::Mssql, "JSON"),
            (Dialect::MySql, "JSONB"),
            (Dialect::Postgres, "VIRTUAL"),
        ];
        for (dialect, notation) in cases {
            match render_type(dialect, &t(notation)) {
                Err(Error::UnsupportedType { dialect: d, .. }) => assert_eq!(d, dialect),
                other => panic!("{notation} on {dialect}: {other:?}"),
            }
        }
    }

    #[test]
    fn test_rendering_is_deterministic() {
        for name in TypeName::ALL {
            let Ok(descriptor) = TypeDescriptor::build(name, TypeOptions::default()) else {
                continue;
            };
            for dialect in Dialect::ALL {
                let first = render_type(dialect, &descriptor).ok();
                let second = render_type(dialect, &descriptor).ok();
                assert_eq!(first, second);
            }
        }
    }
}
