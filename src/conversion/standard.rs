//! Conversions for the standard Avro logical types.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use uuid::Uuid;

use crate::error::ConversionError;
use crate::generic::{Decimal, GenericFixed, GenericValue, ValueKind};
use crate::schema::{LogicalType, Schema, SchemaType};

use super::Conversion;

/// Resolution of a time or timestamp logical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Millis,
    Micros,
}

impl TimeUnit {
    fn per_second(self) -> i64 {
        match self {
            TimeUnit::Millis => 1_000,
            TimeUnit::Micros => 1_000_000,
        }
    }

    fn nanos_per_unit(self) -> i64 {
        1_000_000_000 / self.per_second()
    }
}

fn unexpected(logical: &LogicalType, value: &GenericValue) -> ConversionError {
    ConversionError::UnsupportedValue {
        logical_type: logical.name().to_string(),
        found: value.describe(),
    }
}

fn epoch_day() -> NaiveDate {
    NaiveDate::default()
}

/// Split a count of `unit` since the epoch into seconds and nanoseconds.
fn split_epoch(value: i64, unit: TimeUnit) -> (i64, u32) {
    let per_second = unit.per_second();
    let secs = value.div_euclid(per_second);
    let nanos = value.rem_euclid(per_second) * unit.nanos_per_unit();
    (secs, nanos as u32)
}

fn instant_from_epoch(value: i64, unit: TimeUnit) -> Result<DateTime<Utc>, ConversionError> {
    let (secs, nanos) = split_epoch(value, unit);
    DateTime::from_timestamp(secs, nanos).ok_or_else(|| {
        ConversionError::OutOfRange(format!("timestamp {} is out of range", value))
    })
}

fn instant_to_epoch(instant: &DateTime<Utc>, unit: TimeUnit) -> Result<i64, ConversionError> {
    match unit {
        TimeUnit::Millis => Ok(instant.timestamp_millis()),
        TimeUnit::Micros => Ok(instant.timestamp_micros()),
    }
}

/// `date`: days since 1970-01-01 as an int, represented as `NaiveDate`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateConversion;

impl Conversion for DateConversion {
    fn logical_type_name(&self) -> &str {
        "date"
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Date
    }

    fn physical_types(&self) -> &[SchemaType] {
        &[SchemaType::Int]
    }

    fn to_physical(
        &self,
        value: &GenericValue,
        _schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let GenericValue::Date(date) = value else {
            return Err(unexpected(logical, value));
        };
        let days = date.signed_duration_since(epoch_day()).num_days();
        i32::try_from(days)
            .map(GenericValue::Int)
            .map_err(|_| ConversionError::OutOfRange(format!("date {} is out of range", date)))
    }

    fn from_physical(
        &self,
        value: &GenericValue,
        _schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let GenericValue::Int(days) = value else {
            return Err(unexpected(logical, value));
        };
        epoch_day()
            .checked_add_signed(chrono::Duration::days(i64::from(*days)))
            .map(GenericValue::Date)
            .ok_or_else(|| ConversionError::OutOfRange(format!("{} days is out of range", days)))
    }
}

/// `time-millis` (int) and `time-micros` (long), represented as `NaiveTime`.
#[derive(Debug, Clone, Copy)]
pub struct TimeConversion {
    unit: TimeUnit,
}

impl TimeConversion {
    pub fn new(unit: TimeUnit) -> Self {
        Self { unit }
    }
}

impl Conversion for TimeConversion {
    fn logical_type_name(&self) -> &str {
        match self.unit {
            TimeUnit::Millis => "time-millis",
            TimeUnit::Micros => "time-micros",
        }
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Time
    }

    fn physical_types(&self) -> &[SchemaType] {
        match self.unit {
            TimeUnit::Millis => &[SchemaType::Int],
            TimeUnit::Micros => &[SchemaType::Long],
        }
    }

    fn to_physical(
        &self,
        value: &GenericValue,
        _schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let GenericValue::Time(time) = value else {
            return Err(unexpected(logical, value));
        };
        let secs = i64::from(time.num_seconds_from_midnight());
        let sub = i64::from(time.nanosecond()) / self.unit.nanos_per_unit();
        let count = secs * self.unit.per_second() + sub;
        match self.unit {
            // a day in millis fits an int
            TimeUnit::Millis => Ok(GenericValue::Int(count as i32)),
            TimeUnit::Micros => Ok(GenericValue::Long(count)),
        }
    }

    fn from_physical(
        &self,
        value: &GenericValue,
        _schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let count = match (self.unit, value) {
            (TimeUnit::Millis, GenericValue::Int(v)) => i64::from(*v),
            (TimeUnit::Micros, GenericValue::Long(v)) => *v,
            _ => return Err(unexpected(logical, value)),
        };
        let (secs, nanos) = split_epoch(count, self.unit);
        u32::try_from(secs)
            .ok()
            .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos))
            .map(GenericValue::Time)
            .ok_or_else(|| {
                ConversionError::OutOfRange(format!("{} is not a time of day", count))
            })
    }
}

/// `timestamp-millis` and `timestamp-micros` on long, represented as `DateTime<Utc>`.
#[derive(Debug, Clone, Copy)]
pub struct TimestampConversion {
    unit: TimeUnit,
}

impl TimestampConversion {
    pub fn new(unit: TimeUnit) -> Self {
        Self { unit }
    }
}

impl Conversion for TimestampConversion {
    fn logical_type_name(&self) -> &str {
        match self.unit {
            TimeUnit::Millis => "timestamp-millis",
            TimeUnit::Micros => "timestamp-micros",
        }
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Timestamp
    }

    fn physical_types(&self) -> &[SchemaType] {
        &[SchemaType::Long]
    }

    fn to_physical(
        &self,
        value: &GenericValue,
        _schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let GenericValue::Timestamp(instant) = value else {
            return Err(unexpected(logical, value));
        };
        instant_to_epoch(instant, self.unit).map(GenericValue::Long)
    }

    fn from_physical(
        &self,
        value: &GenericValue,
        _schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let GenericValue::Long(count) = value else {
            return Err(unexpected(logical, value));
        };
        instant_from_epoch(*count, self.unit).map(GenericValue::Timestamp)
    }
}

/// `local-timestamp-millis` and `local-timestamp-micros` on long,
/// represented as `NaiveDateTime`.
#[derive(Debug, Clone, Copy)]
pub struct LocalTimestampConversion {
    unit: TimeUnit,
}

impl LocalTimestampConversion {
    pub fn new(unit: TimeUnit) -> Self {
        Self { unit }
    }
}

impl Conversion for LocalTimestampConversion {
    fn logical_type_name(&self) -> &str {
        match self.unit {
            TimeUnit::Millis => "local-timestamp-millis",
            TimeUnit::Micros => "local-timestamp-micros",
        }
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::LocalTimestamp
    }

    fn physical_types(&self) -> &[SchemaType] {
        &[SchemaType::Long]
    }

    fn to_physical(
        &self,
        value: &GenericValue,
        _schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let GenericValue::LocalTimestamp(local) = value else {
            return Err(unexpected(logical, value));
        };
        instant_to_epoch(&local.and_utc(), self.unit).map(GenericValue::Long)
    }

    fn from_physical(
        &self,
        value: &GenericValue,
        _schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let GenericValue::Long(count) = value else {
            return Err(unexpected(logical, value));
        };
        instant_from_epoch(*count, self.unit)
            .map(|instant| GenericValue::LocalTimestamp(instant.naive_utc()))
    }
}

/// `uuid` on string (hyphenated text) or fixed(16) (raw bytes).
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidConversion;

impl Conversion for UuidConversion {
    fn logical_type_name(&self) -> &str {
        "uuid"
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Uuid
    }

    fn physical_types(&self) -> &[SchemaType] {
        &[SchemaType::String, SchemaType::Fixed]
    }

    fn to_physical(
        &self,
        value: &GenericValue,
        schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let GenericValue::Uuid(uuid) = value else {
            return Err(unexpected(logical, value));
        };
        match schema.schema_type() {
            SchemaType::Fixed => Ok(GenericValue::Fixed(GenericFixed::new(
                schema,
                uuid.as_bytes().to_vec(),
            ))),
            _ => Ok(GenericValue::String(uuid.hyphenated().to_string())),
        }
    }

    fn from_physical(
        &self,
        value: &GenericValue,
        _schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let uuid = match value {
            GenericValue::String(s) => Uuid::parse_str(s)
                .map_err(|e| ConversionError::IllegalArgument(format!("invalid uuid {:?}: {}", s, e)))?,
            GenericValue::Fixed(f) => Uuid::from_slice(f.bytes())
                .map_err(|e| ConversionError::IllegalArgument(format!("invalid uuid bytes: {}", e)))?,
            other => return Err(unexpected(logical, other)),
        };
        Ok(GenericValue::Uuid(uuid))
    }
}

/// `decimal` on bytes (minimal two's complement) or fixed (sign-extended).
#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalConversion;

fn decimal_params(logical: &LogicalType) -> Result<(u32, u32), ConversionError> {
    match logical {
        LogicalType::Decimal { precision, scale } => Ok((*precision, *scale)),
        other => Err(ConversionError::IllegalArgument(format!(
            "decimal conversion applied to logical type '{}'",
            other.name()
        ))),
    }
}

impl Conversion for DecimalConversion {
    fn logical_type_name(&self) -> &str {
        "decimal"
    }

    fn value_kind(&self) -> ValueKind {
        ValueKind::Decimal
    }

    fn physical_types(&self) -> &[SchemaType] {
        &[SchemaType::Bytes, SchemaType::Fixed]
    }

    fn to_physical(
        &self,
        value: &GenericValue,
        schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let GenericValue::Decimal(decimal) = value else {
            return Err(unexpected(logical, value));
        };
        let (precision, scale) = decimal_params(logical)?;
        let decimal = decimal.rescale(scale)?;
        if decimal.precision() > precision {
            return Err(ConversionError::OutOfRange(format!(
                "{} has more than {} digits",
                decimal, precision
            )));
        }
        match schema.fixed_size() {
            Some(size) => Ok(GenericValue::Fixed(GenericFixed::new(
                schema,
                decimal.to_fixed_bytes(size)?,
            ))),
            None => Ok(GenericValue::Bytes(decimal.to_be_bytes())),
        }
    }

    fn from_physical(
        &self,
        value: &GenericValue,
        _schema: &Schema,
        logical: &LogicalType,
    ) -> Result<GenericValue, ConversionError> {
        let (_, scale) = decimal_params(logical)?;
        let bytes = match value {
            GenericValue::Bytes(b) => b.as_slice(),
            GenericValue::Fixed(f) => f.bytes(),
            other => return Err(unexpected(logical, other)),
        };
        Decimal::from_be_bytes(bytes, scale).map(GenericValue::Decimal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Name;

    fn annotated(schema: Schema, logical: LogicalType) -> Schema {
        logical.add_to_schema(&schema).unwrap();
        schema
    }

    #[test]
    fn test_time_millis() {
        let schema = annotated(Schema::int(), LogicalType::TimeMillis);
        let conversion = TimeConversion::new(TimeUnit::Millis);
        let time = NaiveTime::from_hms_milli_opt(1, 2, 3, 4).unwrap();
        let physical = conversion
            .to_physical(&GenericValue::Time(time), &schema, &LogicalType::TimeMillis)
            .unwrap();
        assert_eq!(physical, GenericValue::Int(3_723_004));
        let back = conversion
            .from_physical(&physical, &schema, &LogicalType::TimeMillis)
            .unwrap();
        assert_eq!(back, GenericValue::Time(time));
    }

    #[test]
    fn test_timestamp_before_epoch() {
        let schema = annotated(Schema::long(), LogicalType::TimestampMicros);
        let conversion = TimestampConversion::new(TimeUnit::Micros);
        let physical = GenericValue::Long(-1);
        let instant = conversion
            .from_physical(&physical, &schema, &LogicalType::TimestampMicros)
            .unwrap();
        let GenericValue::Timestamp(ts) = &instant else {
            panic!("expected a timestamp");
        };
        assert_eq!(ts.timestamp_micros(), -1);
        assert_eq!(
            conversion
                .to_physical(&instant, &schema, &LogicalType::TimestampMicros)
                .unwrap(),
            physical
        );
    }

    #[test]
    fn test_uuid_on_fixed() {
        let schema = annotated(
            Schema::fixed(Name::new("Id", None).unwrap(), 16),
            LogicalType::Uuid,
        );
        let uuid = Uuid::from_u128(0x0123_4567_89ab_cdef_0123_4567_89ab_cdef);
        let physical = UuidConversion
            .to_physical(&GenericValue::Uuid(uuid), &schema, &LogicalType::Uuid)
            .unwrap();
        let GenericValue::Fixed(fixed) = &physical else {
            panic!("expected fixed bytes");
        };
        assert_eq!(fixed.bytes(), uuid.as_bytes());
    }

    #[test]
    fn test_decimal_rescales_and_checks_precision() {
        let logical = LogicalType::Decimal {
            precision: 4,
            scale: 2,
        };
        let schema = annotated(Schema::bytes(), logical.clone());
        let physical = DecimalConversion
            .to_physical(&GenericValue::Decimal(Decimal::new(15, 1)), &schema, &logical)
            .unwrap();
        assert_eq!(physical, GenericValue::Bytes(vec![0x00, 0x96]));
        let back = DecimalConversion
            .from_physical(&physical, &schema, &logical)
            .unwrap();
        assert_eq!(back, GenericValue::Decimal(Decimal::new(150, 2)));

        let too_long = GenericValue::Decimal(Decimal::new(12345, 2));
        assert!(DecimalConversion
            .to_physical(&too_long, &schema, &logical)
            .is_err());
    }
}
