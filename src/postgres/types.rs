// ABOUTME: Owned destination parameter values with type-aware SQL encoding
// ABOUTME: Bridges converted SQLite values to whatever column types the target declares

use bytes::BytesMut;
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use tokio_postgres::types::{to_sql_checked, IsNull, ToSql, Type};

/// A value ready to be bound to a destination insert parameter.
///
/// The source is dynamically typed, and the destination schema is owned by
/// Strapi rather than this tool, so encoding is resolved against the actual
/// parameter type of the prepared statement: a `BigInt` binds to int2/int4/int8
/// columns alike, a `Timestamp` binds to both timestamp and timestamptz, and
/// so on. Mismatches that cannot be encoded losslessly fail the row rather
/// than writing garbage.
#[derive(Debug, Clone, PartialEq)]
pub enum PgValue {
    Null,
    BigInt(i64),
    Double(f64),
    Bool(bool),
    Text(String),
    Json(JsonValue),
    Timestamp(DateTime<Utc>),
    Bytea(Vec<u8>),
}

impl PgValue {
    /// Short type label for error messages and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            PgValue::Null => "null",
            PgValue::BigInt(_) => "bigint",
            PgValue::Double(_) => "double",
            PgValue::Bool(_) => "bool",
            PgValue::Text(_) => "text",
            PgValue::Json(_) => "json",
            PgValue::Timestamp(_) => "timestamp",
            PgValue::Bytea(_) => "bytea",
        }
    }

}

fn encode_mismatch(value: &PgValue, ty: &Type) -> Box<dyn std::error::Error + Sync + Send> {
    format!(
        "cannot encode {} value as destination type '{}'",
        value.kind(),
        ty
    )
    .into()
}

fn is_textual(ty: &Type) -> bool {
    *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME
}

impl ToSql for PgValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            PgValue::Null => Ok(IsNull::Yes),

            PgValue::BigInt(v) => {
                if *ty == Type::INT8 {
                    v.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    i32::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::INT2 {
                    i16::try_from(*v)?.to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (*v as f64).to_sql(ty, out)
                } else if *ty == Type::BOOL {
                    (*v != 0).to_sql(ty, out)
                } else if is_textual(ty) {
                    v.to_string().to_sql(ty, out)
                } else {
                    Err(encode_mismatch(self, ty))
                }
            }

            PgValue::Double(v) => {
                if *ty == Type::FLOAT8 {
                    v.to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (*v as f32).to_sql(ty, out)
                } else if is_textual(ty) {
                    v.to_string().to_sql(ty, out)
                } else {
                    Err(encode_mismatch(self, ty))
                }
            }

            PgValue::Bool(v) => {
                if *ty == Type::BOOL {
                    v.to_sql(ty, out)
                } else if *ty == Type::INT2 {
                    (*v as i16).to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    (*v as i32).to_sql(ty, out)
                } else if *ty == Type::INT8 {
                    (*v as i64).to_sql(ty, out)
                } else if is_textual(ty) {
                    v.to_string().to_sql(ty, out)
                } else {
                    Err(encode_mismatch(self, ty))
                }
            }

            PgValue::Text(v) => {
                if is_textual(ty) || *ty == Type::UNKNOWN {
                    v.as_str().to_sql(ty, out)
                } else if *ty == Type::JSON || *ty == Type::JSONB {
                    JsonValue::String(v.clone()).to_sql(ty, out)
                } else {
                    Err(encode_mismatch(self, ty))
                }
            }

            PgValue::Json(v) => {
                if *ty == Type::JSON || *ty == Type::JSONB {
                    v.to_sql(ty, out)
                } else if is_textual(ty) {
                    v.to_string().to_sql(ty, out)
                } else {
                    Err(encode_mismatch(self, ty))
                }
            }

            PgValue::Timestamp(v) => {
                if *ty == Type::TIMESTAMPTZ {
                    v.to_sql(ty, out)
                } else if *ty == Type::TIMESTAMP {
                    v.naive_utc().to_sql(ty, out)
                } else if *ty == Type::DATE {
                    v.date_naive().to_sql(ty, out)
                } else if is_textual(ty) {
                    v.to_rfc3339().to_sql(ty, out)
                } else {
                    Err(encode_mismatch(self, ty))
                }
            }

            PgValue::Bytea(v) => {
                if *ty == Type::BYTEA {
                    v.as_slice().to_sql(ty, out)
                } else {
                    Err(encode_mismatch(self, ty))
                }
            }
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // The variant/type pairing is checked inside to_sql because the
        // accepted set depends on the value, not just the declared type.
        true
    }

    to_sql_checked!();
}
