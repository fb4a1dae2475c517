//! PackStream structure types for graph, temporal and spatial data.
//!
//! These are the Bolt 5 wire shapes: graph entities always carry element
//! ids, and the date-time forms use UTC epoch seconds.

use std::collections::HashMap;

use super::marker::*;
use super::types::{PackStreamStructure, PackStreamValue};
use super::PackStreamError;

fn expect_structure<'a>(
    value: &'a PackStreamValue,
    tag: u8,
    what: &'static str,
    min_fields: usize,
) -> Result<&'a PackStreamStructure, PackStreamError> {
    let s = value.as_structure().ok_or_else(|| {
        PackStreamError::InvalidStructure(format!("expected {} structure", what))
    })?;
    if s.tag != tag {
        return Err(PackStreamError::InvalidStructure(format!(
            "expected {} tag 0x{:02X}, got 0x{:02X}",
            what, tag, s.tag
        )));
    }
    if s.fields.len() < min_fields {
        return Err(PackStreamError::InvalidStructure(format!(
            "{} requires {} fields, got {}",
            what,
            min_fields,
            s.fields.len()
        )));
    }
    Ok(s)
}

fn field_int(s: &PackStreamStructure, i: usize, what: &'static str) -> Result<i64, PackStreamError> {
    s.fields[i]
        .as_int()
        .ok_or_else(|| PackStreamError::InvalidStructure(format!("{} field {} must be integer", what, i)))
}

fn field_float(
    s: &PackStreamStructure,
    i: usize,
    what: &'static str,
) -> Result<f64, PackStreamError> {
    s.fields[i]
        .as_float()
        .ok_or_else(|| PackStreamError::InvalidStructure(format!("{} field {} must be float", what, i)))
}

fn field_string(
    s: &PackStreamStructure,
    i: usize,
    what: &'static str,
) -> Result<String, PackStreamError> {
    s.fields[i]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| PackStreamError::InvalidStructure(format!("{} field {} must be string", what, i)))
}

fn field_map(
    s: &PackStreamStructure,
    i: usize,
    what: &'static str,
) -> Result<HashMap<String, PackStreamValue>, PackStreamError> {
    s.fields[i]
        .as_map()
        .cloned()
        .ok_or_else(|| PackStreamError::InvalidStructure(format!("{} field {} must be map", what, i)))
}

// ============================================================================
// Graph structures
// ============================================================================

/// A Node structure on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStreamNode {
    /// Legacy numeric node id
    pub id: i64,
    /// Node labels
    pub labels: Vec<String>,
    /// Node properties
    pub properties: HashMap<String, PackStreamValue>,
    /// Durable element id
    pub element_id: String,
}

impl PackStreamNode {
    /// Create a new node.
    pub fn new(
        id: i64,
        labels: Vec<String>,
        properties: HashMap<String, PackStreamValue>,
        element_id: String,
    ) -> Self {
        Self {
            id,
            labels,
            properties,
            element_id,
        }
    }

    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            NODE_TAG,
            vec![
                PackStreamValue::Integer(self.id),
                PackStreamValue::List(
                    self.labels
                        .iter()
                        .map(|l| PackStreamValue::String(l.clone()))
                        .collect(),
                ),
                PackStreamValue::Map(self.properties.clone()),
                PackStreamValue::String(self.element_id.clone()),
            ],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, NODE_TAG, "Node", 4)?;

        let id = field_int(s, 0, "Node")?;
        let labels = s.fields[1]
            .as_string_list()
            .ok_or_else(|| PackStreamError::InvalidStructure("Node labels must be a string list".into()))?;
        let properties = field_map(s, 2, "Node")?;
        let element_id = field_string(s, 3, "Node")?;

        Ok(Self {
            id,
            labels,
            properties,
            element_id,
        })
    }
}

/// A Relationship structure on the wire, with both endpoints known.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStreamRelationship {
    /// Legacy numeric relationship id
    pub id: i64,
    /// Numeric start node id
    pub start_node_id: i64,
    /// Numeric end node id
    pub end_node_id: i64,
    /// Relationship type name
    pub rel_type: String,
    /// Relationship properties
    pub properties: HashMap<String, PackStreamValue>,
    /// Durable element id
    pub element_id: String,
    /// Start node element id
    pub start_node_element_id: String,
    /// End node element id
    pub end_node_element_id: String,
}

impl PackStreamRelationship {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            RELATIONSHIP_TAG,
            vec![
                PackStreamValue::Integer(self.id),
                PackStreamValue::Integer(self.start_node_id),
                PackStreamValue::Integer(self.end_node_id),
                PackStreamValue::String(self.rel_type.clone()),
                PackStreamValue::Map(self.properties.clone()),
                PackStreamValue::String(self.element_id.clone()),
                PackStreamValue::String(self.start_node_element_id.clone()),
                PackStreamValue::String(self.end_node_element_id.clone()),
            ],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, RELATIONSHIP_TAG, "Relationship", 8)?;

        Ok(Self {
            id: field_int(s, 0, "Relationship")?,
            start_node_id: field_int(s, 1, "Relationship")?,
            end_node_id: field_int(s, 2, "Relationship")?,
            rel_type: field_string(s, 3, "Relationship")?,
            properties: field_map(s, 4, "Relationship")?,
            element_id: field_string(s, 5, "Relationship")?,
            start_node_element_id: field_string(s, 6, "Relationship")?,
            end_node_element_id: field_string(s, 7, "Relationship")?,
        })
    }
}

/// A relationship inside a Path, transmitted without its endpoints.
/// Endpoints are recovered from the path's traversal indices.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStreamUnboundRelationship {
    /// Legacy numeric relationship id
    pub id: i64,
    /// Relationship type name
    pub rel_type: String,
    /// Relationship properties
    pub properties: HashMap<String, PackStreamValue>,
    /// Durable element id
    pub element_id: String,
}

impl PackStreamUnboundRelationship {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            UNBOUND_RELATIONSHIP_TAG,
            vec![
                PackStreamValue::Integer(self.id),
                PackStreamValue::String(self.rel_type.clone()),
                PackStreamValue::Map(self.properties.clone()),
                PackStreamValue::String(self.element_id.clone()),
            ],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, UNBOUND_RELATIONSHIP_TAG, "UnboundRelationship", 4)?;

        Ok(Self {
            id: field_int(s, 0, "UnboundRelationship")?,
            rel_type: field_string(s, 1, "UnboundRelationship")?,
            properties: field_map(s, 2, "UnboundRelationship")?,
            element_id: field_string(s, 3, "UnboundRelationship")?,
        })
    }
}

/// A Path structure on the wire.
///
/// `indices` alternates (relationship index, node index) pairs describing
/// the traversal: relationship indices are 1-based, negative when the
/// relationship is traversed against its direction; node indices are
/// 0-based into `nodes`.
#[derive(Debug, Clone, PartialEq)]
pub struct PackStreamPath {
    /// Distinct nodes appearing in the path
    pub nodes: Vec<PackStreamNode>,
    /// Distinct relationships appearing in the path
    pub relationships: Vec<PackStreamUnboundRelationship>,
    /// Traversal indices
    pub indices: Vec<i64>,
}

impl PackStreamPath {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            PATH_TAG,
            vec![
                PackStreamValue::List(self.nodes.iter().map(|n| n.to_value()).collect()),
                PackStreamValue::List(self.relationships.iter().map(|r| r.to_value()).collect()),
                PackStreamValue::List(
                    self.indices
                        .iter()
                        .map(|i| PackStreamValue::Integer(*i))
                        .collect(),
                ),
            ],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, PATH_TAG, "Path", 3)?;

        let nodes = s.fields[0]
            .as_list()
            .ok_or_else(|| PackStreamError::InvalidStructure("Path nodes must be a list".into()))?
            .iter()
            .map(PackStreamNode::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        let relationships = s.fields[1]
            .as_list()
            .ok_or_else(|| {
                PackStreamError::InvalidStructure("Path relationships must be a list".into())
            })?
            .iter()
            .map(PackStreamUnboundRelationship::from_value)
            .collect::<Result<Vec<_>, _>>()?;

        let indices = s.fields[2]
            .as_list()
            .ok_or_else(|| PackStreamError::InvalidStructure("Path indices must be a list".into()))?
            .iter()
            .map(|v| {
                v.as_int().ok_or_else(|| {
                    PackStreamError::InvalidStructure("Path index must be integer".into())
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if indices.len() % 2 != 0 {
            return Err(PackStreamError::InvalidStructure(
                "Path indices must come in (relationship, node) pairs".into(),
            ));
        }

        Ok(Self {
            nodes,
            relationships,
            indices,
        })
    }
}

// ============================================================================
// Temporal structures
// ============================================================================

/// Date: days since the Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamDate {
    /// Days since 1970-01-01
    pub days: i64,
}

impl PackStreamDate {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            DATE_TAG,
            vec![PackStreamValue::Integer(self.days)],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, DATE_TAG, "Date", 1)?;
        Ok(Self {
            days: field_int(s, 0, "Date")?,
        })
    }
}

/// Time of day with a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamTime {
    /// Nanoseconds since midnight
    pub nanoseconds: i64,
    /// Offset from UTC in seconds
    pub tz_offset_seconds: i32,
}

impl PackStreamTime {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            TIME_TAG,
            vec![
                PackStreamValue::Integer(self.nanoseconds),
                PackStreamValue::Integer(self.tz_offset_seconds as i64),
            ],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, TIME_TAG, "Time", 2)?;
        Ok(Self {
            nanoseconds: field_int(s, 0, "Time")?,
            tz_offset_seconds: field_int(s, 1, "Time")? as i32,
        })
    }
}

/// Time of day without a timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamLocalTime {
    /// Nanoseconds since midnight
    pub nanoseconds: i64,
}

impl PackStreamLocalTime {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            LOCAL_TIME_TAG,
            vec![PackStreamValue::Integer(self.nanoseconds)],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, LOCAL_TIME_TAG, "LocalTime", 1)?;
        Ok(Self {
            nanoseconds: field_int(s, 0, "LocalTime")?,
        })
    }
}

/// Date-time pinned to a fixed UTC offset (UTC epoch seconds).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamDateTime {
    /// Seconds since the Unix epoch, UTC
    pub seconds: i64,
    /// Nanosecond adjustment
    pub nanoseconds: i64,
    /// Offset from UTC in seconds
    pub tz_offset_seconds: i32,
}

impl PackStreamDateTime {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            DATE_TIME_TAG,
            vec![
                PackStreamValue::Integer(self.seconds),
                PackStreamValue::Integer(self.nanoseconds),
                PackStreamValue::Integer(self.tz_offset_seconds as i64),
            ],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, DATE_TIME_TAG, "DateTime", 3)?;
        Ok(Self {
            seconds: field_int(s, 0, "DateTime")?,
            nanoseconds: field_int(s, 1, "DateTime")?,
            tz_offset_seconds: field_int(s, 2, "DateTime")? as i32,
        })
    }
}

/// Date-time pinned to a named timezone (UTC epoch seconds).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackStreamDateTimeZoneId {
    /// Seconds since the Unix epoch, UTC
    pub seconds: i64,
    /// Nanosecond adjustment
    pub nanoseconds: i64,
    /// IANA zone id, e.g. "Europe/Stockholm"
    pub zone_id: String,
}

impl PackStreamDateTimeZoneId {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            DATE_TIME_ZONE_ID_TAG,
            vec![
                PackStreamValue::Integer(self.seconds),
                PackStreamValue::Integer(self.nanoseconds),
                PackStreamValue::String(self.zone_id.clone()),
            ],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, DATE_TIME_ZONE_ID_TAG, "DateTimeZoneId", 3)?;
        Ok(Self {
            seconds: field_int(s, 0, "DateTimeZoneId")?,
            nanoseconds: field_int(s, 1, "DateTimeZoneId")?,
            zone_id: field_string(s, 2, "DateTimeZoneId")?,
        })
    }
}

/// Date-time without a timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamLocalDateTime {
    /// Seconds since the Unix epoch
    pub seconds: i64,
    /// Nanosecond adjustment
    pub nanoseconds: i64,
}

impl PackStreamLocalDateTime {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            LOCAL_DATE_TIME_TAG,
            vec![
                PackStreamValue::Integer(self.seconds),
                PackStreamValue::Integer(self.nanoseconds),
            ],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, LOCAL_DATE_TIME_TAG, "LocalDateTime", 2)?;
        Ok(Self {
            seconds: field_int(s, 0, "LocalDateTime")?,
            nanoseconds: field_int(s, 1, "LocalDateTime")?,
        })
    }
}

/// A temporal amount in months, days, seconds and nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackStreamDuration {
    /// Months
    pub months: i64,
    /// Days
    pub days: i64,
    /// Seconds
    pub seconds: i64,
    /// Nanoseconds
    pub nanoseconds: i64,
}

impl PackStreamDuration {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            DURATION_TAG,
            vec![
                PackStreamValue::Integer(self.months),
                PackStreamValue::Integer(self.days),
                PackStreamValue::Integer(self.seconds),
                PackStreamValue::Integer(self.nanoseconds),
            ],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, DURATION_TAG, "Duration", 4)?;
        Ok(Self {
            months: field_int(s, 0, "Duration")?,
            days: field_int(s, 1, "Duration")?,
            seconds: field_int(s, 2, "Duration")?,
            nanoseconds: field_int(s, 3, "Duration")?,
        })
    }
}

// ============================================================================
// Spatial structures
// ============================================================================

/// 2D point with a spatial reference id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackStreamPoint2D {
    /// Spatial reference system identifier
    pub srid: i32,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
}

impl PackStreamPoint2D {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            POINT_2D_TAG,
            vec![
                PackStreamValue::Integer(self.srid as i64),
                PackStreamValue::Float(self.x),
                PackStreamValue::Float(self.y),
            ],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, POINT_2D_TAG, "Point2D", 3)?;
        Ok(Self {
            srid: field_int(s, 0, "Point2D")? as i32,
            x: field_float(s, 1, "Point2D")?,
            y: field_float(s, 2, "Point2D")?,
        })
    }
}

/// 3D point with a spatial reference id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PackStreamPoint3D {
    /// Spatial reference system identifier
    pub srid: i32,
    /// X coordinate
    pub x: f64,
    /// Y coordinate
    pub y: f64,
    /// Z coordinate
    pub z: f64,
}

impl PackStreamPoint3D {
    /// Convert to a wire value.
    pub fn to_value(&self) -> PackStreamValue {
        PackStreamValue::Structure(PackStreamStructure::new(
            POINT_3D_TAG,
            vec![
                PackStreamValue::Integer(self.srid as i64),
                PackStreamValue::Float(self.x),
                PackStreamValue::Float(self.y),
                PackStreamValue::Float(self.z),
            ],
        ))
    }

    /// Parse from a wire value.
    pub fn from_value(value: &PackStreamValue) -> Result<Self, PackStreamError> {
        let s = expect_structure(value, POINT_3D_TAG, "Point3D", 4)?;
        Ok(Self {
            srid: field_int(s, 0, "Point3D")? as i32,
            x: field_float(s, 1, "Point3D")?,
            y: field_float(s, 2, "Point3D")?,
            z: field_float(s, 3, "Point3D")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(key: &str, value: PackStreamValue) -> HashMap<String, PackStreamValue> {
        let mut m = HashMap::new();
        m.insert(key.to_string(), value);
        m
    }

    #[test]
    fn node_roundtrip() {
        let node = PackStreamNode::new(
            7,
            vec!["Person".to_string(), "Admin".to_string()],
            props("age", PackStreamValue::Integer(30)),
            "4:abc:7".to_string(),
        );
        let value = node.to_value();

        let s = value.as_structure().unwrap();
        assert_eq!(s.tag, NODE_TAG);
        assert_eq!(s.len(), 4);

        let parsed = PackStreamNode::from_value(&value).unwrap();
        assert_eq!(parsed, node);
    }

    #[test]
    fn relationship_roundtrip() {
        let rel = PackStreamRelationship {
            id: 1,
            start_node_id: 10,
            end_node_id: 20,
            rel_type: "KNOWS".to_string(),
            properties: props("since", PackStreamValue::Integer(2020)),
            element_id: "5:abc:1".to_string(),
            start_node_element_id: "4:abc:10".to_string(),
            end_node_element_id: "4:abc:20".to_string(),
        };
        let value = rel.to_value();
        assert_eq!(value.as_structure().unwrap().len(), 8);

        let parsed = PackStreamRelationship::from_value(&value).unwrap();
        assert_eq!(parsed, rel);
    }

    #[test]
    fn relationship_rejects_short_form() {
        // 5-field legacy form has no element ids
        let legacy = PackStreamValue::Structure(PackStreamStructure::new(
            RELATIONSHIP_TAG,
            vec![
                PackStreamValue::Integer(1),
                PackStreamValue::Integer(10),
                PackStreamValue::Integer(20),
                PackStreamValue::String("KNOWS".into()),
                PackStreamValue::Map(HashMap::new()),
            ],
        ));
        assert!(PackStreamRelationship::from_value(&legacy).is_err());
    }

    #[test]
    fn path_roundtrip() {
        let n1 = PackStreamNode::new(1, vec![], HashMap::new(), "4:abc:1".into());
        let n2 = PackStreamNode::new(2, vec![], HashMap::new(), "4:abc:2".into());
        let r1 = PackStreamUnboundRelationship {
            id: 9,
            rel_type: "KNOWS".to_string(),
            properties: HashMap::new(),
            element_id: "5:abc:9".to_string(),
        };

        let path = PackStreamPath {
            nodes: vec![n1, n2],
            relationships: vec![r1],
            indices: vec![1, 1],
        };
        let value = path.to_value();
        let parsed = PackStreamPath::from_value(&value).unwrap();
        assert_eq!(parsed, path);
    }

    #[test]
    fn path_rejects_odd_index_list() {
        let path = PackStreamValue::Structure(PackStreamStructure::new(
            PATH_TAG,
            vec![
                PackStreamValue::List(vec![]),
                PackStreamValue::List(vec![]),
                PackStreamValue::List(vec![PackStreamValue::Integer(1)]),
            ],
        ));
        assert!(PackStreamPath::from_value(&path).is_err());
    }

    #[test]
    fn temporal_roundtrips() {
        let date = PackStreamDate { days: 18628 };
        assert_eq!(PackStreamDate::from_value(&date.to_value()).unwrap(), date);

        let time = PackStreamTime {
            nanoseconds: 3_600_000_000_000,
            tz_offset_seconds: 7200,
        };
        assert_eq!(PackStreamTime::from_value(&time.to_value()).unwrap(), time);

        let local_time = PackStreamLocalTime {
            nanoseconds: 1_000_000_000,
        };
        assert_eq!(
            PackStreamLocalTime::from_value(&local_time.to_value()).unwrap(),
            local_time
        );

        let dt = PackStreamDateTime {
            seconds: 1_700_000_000,
            nanoseconds: 123,
            tz_offset_seconds: -18000,
        };
        assert_eq!(PackStreamDateTime::from_value(&dt.to_value()).unwrap(), dt);

        let zdt = PackStreamDateTimeZoneId {
            seconds: 1_700_000_000,
            nanoseconds: 0,
            zone_id: "Europe/Stockholm".to_string(),
        };
        assert_eq!(
            PackStreamDateTimeZoneId::from_value(&zdt.to_value()).unwrap(),
            zdt
        );

        let ldt = PackStreamLocalDateTime {
            seconds: 1_000,
            nanoseconds: 42,
        };
        assert_eq!(
            PackStreamLocalDateTime::from_value(&ldt.to_value()).unwrap(),
            ldt
        );

        let dur = PackStreamDuration {
            months: 12,
            days: 30,
            seconds: 3600,
            nanoseconds: 500,
        };
        assert_eq!(PackStreamDuration::from_value(&dur.to_value()).unwrap(), dur);
    }

    #[test]
    fn point_roundtrips() {
        let p2 = PackStreamPoint2D {
            srid: 4326,
            x: 1.5,
            y: 2.5,
        };
        assert_eq!(PackStreamPoint2D::from_value(&p2.to_value()).unwrap(), p2);

        let p3 = PackStreamPoint3D {
            srid: 4979,
            x: 1.0,
            y: 2.0,
            z: 3.0,
        };
        assert_eq!(PackStreamPoint3D::from_value(&p3.to_value()).unwrap(), p3);
    }

    #[test]
    fn wrong_tag_is_rejected() {
        let date = PackStreamDate { days: 1 }.to_value();
        assert!(PackStreamNode::from_value(&date).is_err());
        assert!(PackStreamDuration::from_value(&date).is_err());
    }
}
