use crate::{Result, Row, Value};
use chrono::{DateTime, NaiveDateTime, Utc};
use std::error::Error;
use tokio_postgres::types::private::BytesMut;
use tokio_postgres::types::{FromSql, IsNull, ToSql, Type, to_sql_checked};

impl<'a> FromSql<'a> for Value {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> std::result::Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(match ty.clone() {
            Type::BOOL => Value::Int(<bool as FromSql>::from_sql(ty, raw)? as i64),
            Type::CHAR => Value::Int(<i8 as FromSql>::from_sql(ty, raw)? as i64),
            Type::INT2 => Value::Int(<i16 as FromSql>::from_sql(ty, raw)? as i64),
            Type::INT4 => Value::Int(<i32 as FromSql>::from_sql(ty, raw)? as i64),
            Type::INT8 => Value::Int(<i64 as FromSql>::from_sql(ty, raw)?),
            Type::OID => Value::Int(<u32 as FromSql>::from_sql(ty, raw)? as i64),
            Type::FLOAT4 => Value::Float(<f32 as FromSql>::from_sql(ty, raw)? as f64),
            Type::FLOAT8 => Value::Float(<f64 as FromSql>::from_sql(ty, raw)?),
            Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME | Type::UNKNOWN => {
                Value::String(<String as FromSql>::from_sql(ty, raw)?)
            }
            Type::TIMESTAMPTZ => Value::DateTime(<DateTime<Utc> as FromSql>::from_sql(ty, raw)?),
            Type::TIMESTAMP => {
                Value::DateTime(<NaiveDateTime as FromSql>::from_sql(ty, raw)?.and_utc())
            }
            _ => Value::Bytes(raw.to_vec()),
        })
    }

    fn from_sql_null(_: &Type) -> std::result::Result<Self, Box<dyn Error + Sync + Send>> {
        Ok(Value::NULL)
    }

    fn accepts(_: &Type) -> bool {
        true
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> std::result::Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::NULL => Ok(IsNull::Yes),
            Value::Int(value) => match ty.clone() {
                Type::INT2 => i16::try_from(*value)?.to_sql(ty, out),
                Type::INT4 => i32::try_from(*value)?.to_sql(ty, out),
                _ => value.to_sql(ty, out),
            },
            Value::Float(value) => match ty.clone() {
                Type::FLOAT4 => (*value as f32).to_sql(ty, out),
                _ => value.to_sql(ty, out),
            },
            Value::String(value) => value.as_str().to_sql(ty, out),
            Value::Bytes(value) => value.as_slice().to_sql(ty, out),
            Value::DateTime(value) => match ty.clone() {
                Type::TIMESTAMP => value.naive_utc().to_sql(ty, out),
                _ => value.to_sql(ty, out),
            },
        }
    }

    fn accepts(_: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

pub(super) fn convert_rows(rows: Vec<tokio_postgres::Row>) -> Result<Vec<Row>> {
    let mut result = Vec::with_capacity(rows.len());
    let mut columns: Option<Vec<String>> = None;

    for row in rows {
        let columns = columns.get_or_insert_with(|| {
            row.columns()
                .iter()
                .map(|column| column.name().to_string())
                .collect()
        });

        let mut values = Vec::with_capacity(row.len());
        for i in 0..row.len() {
            values.push(row.try_get::<_, Value>(i)?);
        }

        result.push(Row::new(columns.clone(), values));
    }

    Ok(result)
}
