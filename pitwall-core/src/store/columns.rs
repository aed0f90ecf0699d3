//! Conversions between domain values and SQLite column values.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{
    Row,
    types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, Type, ValueRef},
};

use super::StoreError;
use crate::{DriverNumber, MeetingId, SessionId};

macro_rules! integer_column {
    ($($name:ident),+) => {
        $(
            impl ToSql for $name {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(i64::from(self.get())))
                }
            }

            impl FromSql for $name {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    let raw = i64::column_result(value)?;
                    u32::try_from(raw)
                        .map(Self::new)
                        .map_err(|_| FromSqlError::OutOfRange(raw))
                }
            }
        )+
    };
}

integer_column!(MeetingId, SessionId, DriverNumber);

/// Render a timestamp the way every table stores it.
pub(crate) fn timestamp_text(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parse stored RFC 3339 text outside a row mapper.
pub(crate) fn parse_timestamp(field: &'static str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| StoreError::InvalidTimestamp {
            field,
            value: value.to_owned(),
            source,
        })
}

/// Read a timestamp column inside a row mapper.
pub(crate) fn timestamp_column(
    row: &Row<'_>,
    index: usize,
    field: &'static str,
) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(index)?;
    parse_timestamp(field, &text).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
    })
}

/// Convert an aggregate count into `u64`.
pub(crate) fn count_value(field: &'static str, raw: i64) -> Result<u64, StoreError> {
    u64::try_from(raw).map_err(|_| StoreError::ValueOutOfRange { field, value: raw })
}
