//! Type mapping from Firebird native field descriptors to SQL type names.

/// Native `RDB$FIELD_TYPE` codes.
pub mod field_type {
    pub const SHORT: i32 = 7;
    pub const LONG: i32 = 8;
    pub const FLOAT: i32 = 10;
    pub const DATE: i32 = 12;
    pub const TIME: i32 = 13;
    pub const TEXT: i32 = 14;
    pub const INT64: i32 = 16;
    pub const DOUBLE: i32 = 27;
    pub const TIMESTAMP: i32 = 35;
    pub const VARYING: i32 = 37;
    pub const CSTRING: i32 = 40;
    pub const BLOB: i32 = 261;
}

/// Subtype marking an exact numeric stored as `NUMERIC`.
const SUBTYPE_NUMERIC: i32 = 1;

/// Subtype marking an exact numeric stored as `DECIMAL`.
const SUBTYPE_DECIMAL: i32 = 2;

/// Map a native field descriptor to its canonical SQL type name.
///
/// Absent subtype, precision, and scale count as zero. A character length of
/// zero counts as absent. Unknown type codes never fail; they map to an
/// annotated `VARCHAR(255)`.
pub fn map_type(
    type_code: i32,
    subtype: Option<i32>,
    length: i32,
    precision: Option<i32>,
    scale: Option<i32>,
    char_length: Option<i32>,
) -> String {
    use field_type::*;

    let subtype = subtype.unwrap_or(0);
    let precision = precision.unwrap_or(0);
    let scale = scale.unwrap_or(0);

    // Scaled integers carry the exact numeric kind in their subtype.
    if matches!(type_code, SHORT | LONG | INT64)
        && matches!(subtype, SUBTYPE_NUMERIC | SUBTYPE_DECIMAL)
    {
        let kind = if subtype == SUBTYPE_NUMERIC {
            "NUMERIC"
        } else {
            "DECIMAL"
        };
        return format!("{}({},{})", kind, precision, -scale);
    }

    match type_code {
        SHORT => "SMALLINT".to_string(),
        LONG => "INTEGER".to_string(),
        INT64 => "BIGINT".to_string(),
        FLOAT => "FLOAT".to_string(),
        DOUBLE => "DOUBLE PRECISION".to_string(),
        DATE => "DATE".to_string(),
        TIME => "TIME".to_string(),
        TIMESTAMP => "TIMESTAMP".to_string(),
        TEXT => format!("CHAR({})", char_count(length, char_length)),
        VARYING | CSTRING => format!("VARCHAR({})", char_count(length, char_length)),
        BLOB => match subtype {
            0 => "BLOB SUB_TYPE BINARY".to_string(),
            1 => "BLOB SUB_TYPE TEXT".to_string(),
            other => format!("BLOB SUB_TYPE {}", other),
        },
        _ => format!("VARCHAR(255) /* unknown fb type {} */", type_code),
    }
}

/// Whether a type code has a dedicated mapping.
pub fn is_known_type(type_code: i32) -> bool {
    use field_type::*;

    matches!(
        type_code,
        SHORT | LONG | INT64 | FLOAT | DOUBLE | DATE | TIME | TIMESTAMP | TEXT | VARYING
            | CSTRING | BLOB
    )
}

fn char_count(length: i32, char_length: Option<i32>) -> i32 {
    match char_length {
        Some(n) if n != 0 => n,
        _ => length,
    }
}
