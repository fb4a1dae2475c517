//! The driver value model.
//!
//! [`Value`] is a closed sum over everything a query can send or receive:
//! scalars, collections, graph entities, spatial points and the temporal
//! types. Values are immutable once constructed. Accessors are partial:
//! they succeed for their own variant (plus the few documented widenings)
//! and fail with a typed mismatch error otherwise - never with a silent
//! default.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

use super::error::{DriverError, DriverResult};
use super::graph::{Node, Path, Relationship};

/// Shared sentinel so map lookups can hand out a reference on a miss.
static NULL_VALUE: Value = Value::Null;

// ============================================================================
// Value
// ============================================================================

/// A value in the driver's type system.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absence of a value
    Null,
    /// Boolean
    Boolean(bool),
    /// 64-bit signed integer
    Integer(i64),
    /// 64-bit float
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Byte array
    Bytes(Vec<u8>),
    /// Ordered list of values
    List(Vec<Value>),
    /// String-keyed map of values
    Map(HashMap<String, Value>),
    /// Graph node
    Node(Node),
    /// Graph relationship
    Relationship(Relationship),
    /// Graph path
    Path(Path),
    /// Spatial point
    Point(Point),
    /// Calendar date
    Date(NaiveDate),
    /// Time of day with a fixed UTC offset
    Time(NaiveTime, FixedOffset),
    /// Time of day without a timezone
    LocalTime(NaiveTime),
    /// Instant with a fixed UTC offset
    DateTime(DateTime<FixedOffset>),
    /// Date and time without a timezone
    LocalDateTime(NaiveDateTime),
    /// Instant in a named timezone
    ZonedDateTime(DateTime<Tz>),
    /// Temporal amount
    Duration(Duration),
    /// A date-time the host cannot represent; carries the original
    /// conversion failure and the raw wire fields
    UnsupportedDateTime(UnsupportedDateTime),
}

impl Value {
    /// Construct a Bytes value. (A `From<Vec<u8>>` impl would collide with
    /// the generic list conversion.)
    pub fn bytes(bytes: Vec<u8>) -> Self {
        Value::Bytes(bytes)
    }

    /// Whether this value is Null. Total.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Whether this value is empty: Null, or a zero-length string, byte
    /// array, list or map. Total.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::Bytes(b) => b.is_empty(),
            Value::List(l) => l.is_empty(),
            Value::Map(m) => m.is_empty(),
            _ => false,
        }
    }

    /// Boolean content. Null widens to `false`.
    pub fn as_bool(&self) -> DriverResult<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::Null => Ok(false),
            other => Err(DriverError::type_mismatch("Boolean", other.type_name())),
        }
    }

    /// Integer content. Null widens to `0`.
    pub fn as_int(&self) -> DriverResult<i64> {
        match self {
            Value::Integer(i) => Ok(*i),
            Value::Null => Ok(0),
            other => Err(DriverError::type_mismatch("Integer", other.type_name())),
        }
    }

    /// Float content. Integers widen; Null widens to `0.0`.
    pub fn as_float(&self) -> DriverResult<f64> {
        match self {
            Value::Float(f) => Ok(*f),
            Value::Integer(i) => Ok(*i as f64),
            Value::Null => Ok(0.0),
            other => Err(DriverError::type_mismatch("Float", other.type_name())),
        }
    }

    /// String content.
    pub fn as_string(&self) -> DriverResult<&str> {
        match self {
            Value::String(s) => Ok(s),
            other => Err(DriverError::type_mismatch("String", other.type_name())),
        }
    }

    /// Byte array content.
    pub fn as_bytes(&self) -> DriverResult<&[u8]> {
        match self {
            Value::Bytes(b) => Ok(b),
            other => Err(DriverError::type_mismatch("Bytes", other.type_name())),
        }
    }

    /// List content.
    pub fn as_list(&self) -> DriverResult<&[Value]> {
        match self {
            Value::List(l) => Ok(l),
            other => Err(DriverError::type_mismatch("List", other.type_name())),
        }
    }

    /// Map content.
    pub fn as_map(&self) -> DriverResult<&HashMap<String, Value>> {
        match self {
            Value::Map(m) => Ok(m),
            other => Err(DriverError::type_mismatch("Map", other.type_name())),
        }
    }

    /// Node content.
    pub fn as_node(&self) -> DriverResult<&Node> {
        match self {
            Value::Node(n) => Ok(n),
            other => Err(DriverError::type_mismatch("Node", other.type_name())),
        }
    }

    /// Relationship content.
    pub fn as_relationship(&self) -> DriverResult<&Relationship> {
        match self {
            Value::Relationship(r) => Ok(r),
            other => Err(DriverError::type_mismatch("Relationship", other.type_name())),
        }
    }

    /// Path content.
    pub fn as_path(&self) -> DriverResult<&Path> {
        match self {
            Value::Path(p) => Ok(p),
            other => Err(DriverError::type_mismatch("Path", other.type_name())),
        }
    }

    /// Point content.
    pub fn as_point(&self) -> DriverResult<Point> {
        match self {
            Value::Point(p) => Ok(*p),
            other => Err(DriverError::type_mismatch("Point", other.type_name())),
        }
    }

    /// Date content.
    pub fn as_date(&self) -> DriverResult<NaiveDate> {
        match self {
            Value::Date(d) => Ok(*d),
            other => Err(DriverError::type_mismatch("Date", other.type_name())),
        }
    }

    /// Offset time content.
    pub fn as_time(&self) -> DriverResult<(NaiveTime, FixedOffset)> {
        match self {
            Value::Time(t, offset) => Ok((*t, *offset)),
            other => Err(DriverError::type_mismatch("Time", other.type_name())),
        }
    }

    /// Local time content.
    pub fn as_local_time(&self) -> DriverResult<NaiveTime> {
        match self {
            Value::LocalTime(t) => Ok(*t),
            other => Err(DriverError::type_mismatch("LocalTime", other.type_name())),
        }
    }

    /// Offset date-time content. Zoned date-times widen to their fixed
    /// offset at the same instant. An unsupported date-time re-raises its
    /// captured conversion failure.
    pub fn as_date_time(&self) -> DriverResult<DateTime<FixedOffset>> {
        match self {
            Value::DateTime(dt) => Ok(*dt),
            Value::ZonedDateTime(dt) => Ok(dt.fixed_offset()),
            Value::UnsupportedDateTime(u) => Err(u.to_error()),
            other => Err(DriverError::type_mismatch("DateTime", other.type_name())),
        }
    }

    /// Local date-time content.
    pub fn as_local_date_time(&self) -> DriverResult<NaiveDateTime> {
        match self {
            Value::LocalDateTime(dt) => Ok(*dt),
            other => Err(DriverError::type_mismatch("LocalDateTime", other.type_name())),
        }
    }

    /// Zoned date-time content. An unsupported date-time re-raises its
    /// captured conversion failure.
    pub fn as_zoned_date_time(&self) -> DriverResult<DateTime<Tz>> {
        match self {
            Value::ZonedDateTime(dt) => Ok(*dt),
            Value::UnsupportedDateTime(u) => Err(u.to_error()),
            other => Err(DriverError::type_mismatch("ZonedDateTime", other.type_name())),
        }
    }

    /// Duration content.
    pub fn as_duration(&self) -> DriverResult<Duration> {
        match self {
            Value::Duration(d) => Ok(*d),
            other => Err(DriverError::type_mismatch("Duration", other.type_name())),
        }
    }

    /// Look up a key on a Map value. Returns the Null sentinel when the
    /// key is absent or the value is not a map, so accessor calls chain
    /// without an intermediate `Option`.
    pub fn get(&self, key: &str) -> &Value {
        match self {
            Value::Map(m) => m.get(key).unwrap_or(&NULL_VALUE),
            _ => &NULL_VALUE,
        }
    }

    /// Number of entries of a List or Map value; 0 for everything else.
    pub fn len(&self) -> usize {
        match self {
            Value::List(l) => l.len(),
            Value::Map(m) => m.len(),
            _ => 0,
        }
    }

    /// Variant name for error reporting.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "Null",
            Value::Boolean(_) => "Boolean",
            Value::Integer(_) => "Integer",
            Value::Float(_) => "Float",
            Value::String(_) => "String",
            Value::Bytes(_) => "Bytes",
            Value::List(_) => "List",
            Value::Map(_) => "Map",
            Value::Node(_) => "Node",
            Value::Relationship(_) => "Relationship",
            Value::Path(_) => "Path",
            Value::Point(_) => "Point",
            Value::Date(_) => "Date",
            Value::Time(_, _) => "Time",
            Value::LocalTime(_) => "LocalTime",
            Value::DateTime(_) => "DateTime",
            Value::LocalDateTime(_) => "LocalDateTime",
            Value::ZonedDateTime(_) => "ZonedDateTime",
            Value::Duration(_) => "Duration",
            Value::UnsupportedDateTime(_) => "UnsupportedDateTime",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::List(l) => write!(f, "[{} items]", l.len()),
            Value::Map(m) => write!(f, "{{{} entries}}", m.len()),
            Value::Node(n) => write!(f, "{}", n),
            Value::Relationship(r) => write!(f, "{}", r),
            Value::Path(p) => write!(f, "{}", p),
            Value::Point(p) => write!(f, "{}", p),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t, offset) => write!(f, "{}{}", t, offset),
            Value::LocalTime(t) => write!(f, "{}", t),
            Value::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            Value::LocalDateTime(dt) => write!(f, "{}", dt),
            Value::ZonedDateTime(dt) => write!(f, "{}[{}]", dt.to_rfc3339(), dt.timezone().name()),
            Value::Duration(d) => write!(f, "{}", d),
            Value::UnsupportedDateTime(u) => write!(f, "{}", u),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Bytes(b) => serializer.serialize_bytes(b),
            Value::List(l) => l.serialize(serializer),
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Node(n) => n.serialize(serializer),
            Value::Relationship(r) => r.serialize(serializer),
            Value::Path(p) => p.serialize(serializer),
            Value::Point(p) => p.serialize(serializer),
            // Temporal values export in their display form.
            other => serializer.serialize_str(&other.to_string()),
        }
    }
}

// ============================================================================
// Native conversions
// ============================================================================

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<HashMap<String, T>> for Value {
    fn from(v: HashMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Value::Null,
        }
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<NaiveTime> for Value {
    fn from(v: NaiveTime) -> Self {
        Value::LocalTime(v)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(v: NaiveDateTime) -> Self {
        Value::LocalDateTime(v)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Value::DateTime(v)
    }
}

impl From<DateTime<Tz>> for Value {
    fn from(v: DateTime<Tz>) -> Self {
        Value::ZonedDateTime(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<Point> for Value {
    fn from(v: Point) -> Self {
        Value::Point(v)
    }
}

impl From<Node> for Value {
    fn from(v: Node) -> Self {
        Value::Node(v)
    }
}

impl From<Relationship> for Value {
    fn from(v: Relationship) -> Self {
        Value::Relationship(v)
    }
}

impl From<Path> for Value {
    fn from(v: Path) -> Self {
        Value::Path(v)
    }
}

// ============================================================================
// Point
// ============================================================================

/// A 2D or 3D point in a spatial reference system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    /// Spatial reference system identifier
    pub srid: i32,
    /// X coordinate (longitude for geographic SRIDs)
    pub x: f64,
    /// Y coordinate (latitude for geographic SRIDs)
    pub y: f64,
    /// Z coordinate, for 3D points
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z: Option<f64>,
}

impl Point {
    /// 2D point in an arbitrary SRID.
    pub fn new_2d(srid: i32, x: f64, y: f64) -> Self {
        Self { srid, x, y, z: None }
    }

    /// 3D point in an arbitrary SRID.
    pub fn new_3d(srid: i32, x: f64, y: f64, z: f64) -> Self {
        Self {
            srid,
            x,
            y,
            z: Some(z),
        }
    }

    /// WGS84 2D point (longitude, latitude).
    pub fn wgs84_2d(longitude: f64, latitude: f64) -> Self {
        Self::new_2d(4326, longitude, latitude)
    }

    /// WGS84 3D point (longitude, latitude, height).
    pub fn wgs84_3d(longitude: f64, latitude: f64, height: f64) -> Self {
        Self::new_3d(4979, longitude, latitude, height)
    }

    /// Cartesian 2D point.
    pub fn cartesian_2d(x: f64, y: f64) -> Self {
        Self::new_2d(7203, x, y)
    }

    /// Cartesian 3D point.
    pub fn cartesian_3d(x: f64, y: f64, z: f64) -> Self {
        Self::new_3d(9157, x, y, z)
    }

    /// Whether the point has a Z coordinate.
    pub fn is_3d(&self) -> bool {
        self.z.is_some()
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.z {
            Some(z) => write!(
                f,
                "Point(srid={}, x={}, y={}, z={})",
                self.srid, self.x, self.y, z
            ),
            None => write!(f, "Point(srid={}, x={}, y={})", self.srid, self.x, self.y),
        }
    }
}

// ============================================================================
// Duration
// ============================================================================

/// A temporal amount, kept in the wire's four components. Months and days
/// have no fixed length in seconds, so the components never normalize
/// into each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Duration {
    /// Months
    pub months: i64,
    /// Days
    pub days: i64,
    /// Seconds
    pub seconds: i64,
    /// Nanoseconds
    pub nanoseconds: i64,
}

impl Duration {
    /// Create a duration from its components.
    pub fn new(months: i64, days: i64, seconds: i64, nanoseconds: i64) -> Self {
        Self {
            months,
            days,
            seconds,
            nanoseconds,
        }
    }

    /// Seconds only.
    pub fn from_seconds(seconds: i64) -> Self {
        Self::new(0, 0, seconds, 0)
    }

    /// Days only.
    pub fn from_days(days: i64) -> Self {
        Self::new(0, days, 0, 0)
    }

    /// Months only.
    pub fn from_months(months: i64) -> Self {
        Self::new(months, 0, 0, 0)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "P{}M{}DT{}S",
            self.months,
            self.days,
            self.seconds as f64 + self.nanoseconds as f64 / 1_000_000_000.0
        )
    }
}

// ============================================================================
// UnsupportedDateTime
// ============================================================================

/// A date-time value received from the server that the host cannot
/// represent, typically because the zone id is unknown to the local tz
/// database. The raw wire fields are preserved so the value re-encodes
/// losslessly; the accessors re-raise the captured conversion failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnsupportedDateTime {
    /// Seconds since the Unix epoch, UTC, as received
    pub seconds: i64,
    /// Nanosecond adjustment, as received
    pub nanoseconds: i64,
    /// Zone id the host could not resolve
    pub zone_id: String,
    /// The original conversion failure
    pub reason: String,
}

impl UnsupportedDateTime {
    /// Rebuild the conversion failure for accessor call sites.
    pub fn to_error(&self) -> DriverError {
        DriverError::UnsupportedDateTime(self.reason.clone())
    }
}

impl fmt::Display for UnsupportedDateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<unsupported date-time: {}>", self.reason)
    }
}
