use std::fmt::Display;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use datafusion::arrow::datatypes::DataType;
use datafusion_common::ScalarValue;

use crate::error::{PartitionError, PartitionResult};

/// The number of days from 0001-01-01 (CE) to 1970-01-01.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// Parses the string representation of a partition value as a scalar of the given type.
pub fn parse_scalar(data_type: &DataType, value: &str) -> PartitionResult<ScalarValue> {
    let scalar = match data_type {
        DataType::Utf8 => ScalarValue::Utf8(Some(value.to_string())),
        DataType::LargeUtf8 => ScalarValue::LargeUtf8(Some(value.to_string())),
        DataType::Utf8View => ScalarValue::Utf8View(Some(value.to_string())),
        DataType::Boolean => ScalarValue::Boolean(Some(parse_boolean(value)?)),
        DataType::Int8 => ScalarValue::Int8(Some(parse_number(data_type, value)?)),
        DataType::Int16 => ScalarValue::Int16(Some(parse_number(data_type, value)?)),
        DataType::Int32 => ScalarValue::Int32(Some(parse_number(data_type, value)?)),
        DataType::Int64 => ScalarValue::Int64(Some(parse_number(data_type, value)?)),
        DataType::UInt8 => ScalarValue::UInt8(Some(parse_number(data_type, value)?)),
        DataType::UInt16 => ScalarValue::UInt16(Some(parse_number(data_type, value)?)),
        DataType::UInt32 => ScalarValue::UInt32(Some(parse_number(data_type, value)?)),
        DataType::UInt64 => ScalarValue::UInt64(Some(parse_number(data_type, value)?)),
        DataType::Float32 => ScalarValue::Float32(Some(parse_number(data_type, value)?)),
        DataType::Float64 => ScalarValue::Float64(Some(parse_number(data_type, value)?)),
        DataType::Date32 => ScalarValue::Date32(Some(parse_date32(value)?)),
        _ => {
            return Err(PartitionError::not_implemented(format!(
                "parsing partition value '{value}' as {data_type}"
            )))
        }
    };
    Ok(scalar)
}

fn conversion_error(data_type: &DataType, value: &str, reason: impl Display) -> PartitionError {
    PartitionError::type_error(format!(
        "cannot convert partition value '{value}' to {data_type}: {reason}"
    ))
}

fn parse_number<T>(data_type: &DataType, value: &str) -> PartitionResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse::<T>()
        .map_err(|e| conversion_error(data_type, value, e))
}

fn parse_boolean(value: &str) -> PartitionResult<bool> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(conversion_error(
            &DataType::Boolean,
            value,
            "expected 'true' or 'false'",
        ))
    }
}

fn parse_date32(value: &str) -> PartitionResult<i32> {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| conversion_error(&DataType::Date32, value, e))?;
    Ok(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}
