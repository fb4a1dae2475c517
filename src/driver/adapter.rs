//! Translation between driver values and wire values.
//!
//! Both directions are exhaustive over their input: every supported
//! variant maps losslessly, and anything else fails with a typed error
//! rather than degrading to Null. Structure dispatch goes through a
//! static tag table built once per process.

use std::collections::HashMap;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;
use once_cell::sync::Lazy;

use super::error::{DriverError, DriverResult};
use super::graph::{Node, Path, PathElement, Relationship};
use super::value::{Duration, Point, UnsupportedDateTime, Value};
use crate::bolt::packstream::{
    marker, PackStreamDate, PackStreamDateTime, PackStreamDateTimeZoneId, PackStreamDuration,
    PackStreamLocalDateTime, PackStreamLocalTime, PackStreamNode, PackStreamPath,
    PackStreamPoint2D, PackStreamPoint3D, PackStreamRelationship, PackStreamTime,
    PackStreamUnboundRelationship, PackStreamValue,
};

/// Days between 0001-01-01 (chrono's day 1) and the Unix epoch.
const EPOCH_DAYS_FROM_CE: i64 = 719_163;

/// The kinds of structured values that cross the adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructureKind {
    /// Graph node
    Node,
    /// Graph relationship with endpoints
    Relationship,
    /// Relationship without endpoints, inside a path
    UnboundRelationship,
    /// Graph path
    Path,
    /// Calendar date
    Date,
    /// Time of day with offset
    Time,
    /// Time of day without timezone
    LocalTime,
    /// Instant with fixed offset
    DateTime,
    /// Instant with named timezone
    DateTimeZoneId,
    /// Date and time without timezone
    LocalDateTime,
    /// Temporal amount
    Duration,
    /// 2D spatial point
    Point2D,
    /// 3D spatial point
    Point3D,
}

/// Structure kind to protocol tag, built once and never mutated; safe for
/// unsynchronized concurrent reads.
pub static TYPE_TAGS: Lazy<HashMap<StructureKind, u8>> = Lazy::new(|| {
    HashMap::from([
        (StructureKind::Node, marker::NODE_TAG),
        (StructureKind::Relationship, marker::RELATIONSHIP_TAG),
        (
            StructureKind::UnboundRelationship,
            marker::UNBOUND_RELATIONSHIP_TAG,
        ),
        (StructureKind::Path, marker::PATH_TAG),
        (StructureKind::Date, marker::DATE_TAG),
        (StructureKind::Time, marker::TIME_TAG),
        (StructureKind::LocalTime, marker::LOCAL_TIME_TAG),
        (StructureKind::DateTime, marker::DATE_TIME_TAG),
        (StructureKind::DateTimeZoneId, marker::DATE_TIME_ZONE_ID_TAG),
        (StructureKind::LocalDateTime, marker::LOCAL_DATE_TIME_TAG),
        (StructureKind::Duration, marker::DURATION_TAG),
        (StructureKind::Point2D, marker::POINT_2D_TAG),
        (StructureKind::Point3D, marker::POINT_3D_TAG),
    ])
});

/// Protocol tag to structure kind; the inbound dispatch table.
static TAG_KINDS: Lazy<HashMap<u8, StructureKind>> =
    Lazy::new(|| TYPE_TAGS.iter().map(|(kind, tag)| (*tag, *kind)).collect());

/// Protocol tag for a structure kind.
pub fn tag_of(kind: StructureKind) -> u8 {
    TYPE_TAGS[&kind]
}

// ============================================================================
// Driver -> wire
// ============================================================================

/// Convert a driver value to its wire representation.
pub fn to_wire(value: &Value) -> DriverResult<PackStreamValue> {
    match value {
        Value::Null => Ok(PackStreamValue::Null),
        Value::Boolean(b) => Ok(PackStreamValue::Boolean(*b)),
        Value::Integer(i) => Ok(PackStreamValue::Integer(*i)),
        Value::Float(f) => Ok(PackStreamValue::Float(*f)),
        Value::String(s) => Ok(PackStreamValue::String(s.clone())),
        Value::Bytes(b) => Ok(PackStreamValue::Bytes(b.clone())),
        Value::List(l) => Ok(PackStreamValue::List(
            l.iter().map(to_wire).collect::<DriverResult<_>>()?,
        )),
        Value::Map(m) => Ok(PackStreamValue::Map(map_to_wire(m)?)),
        Value::Node(n) => Ok(node_to_wire(n)?.to_value()),
        Value::Relationship(r) => Ok(relationship_to_wire(r)?.to_value()),
        Value::Path(p) => path_to_wire(p),
        Value::Point(p) => Ok(match p.z {
            Some(z) => PackStreamPoint3D {
                srid: p.srid,
                x: p.x,
                y: p.y,
                z,
            }
            .to_value(),
            None => PackStreamPoint2D {
                srid: p.srid,
                x: p.x,
                y: p.y,
            }
            .to_value(),
        }),
        Value::Date(d) => Ok(PackStreamDate {
            days: d.num_days_from_ce() as i64 - EPOCH_DAYS_FROM_CE,
        }
        .to_value()),
        Value::Time(t, offset) => Ok(PackStreamTime {
            nanoseconds: nanos_since_midnight(t),
            tz_offset_seconds: offset.local_minus_utc(),
        }
        .to_value()),
        Value::LocalTime(t) => Ok(PackStreamLocalTime {
            nanoseconds: nanos_since_midnight(t),
        }
        .to_value()),
        Value::DateTime(dt) => Ok(PackStreamDateTime {
            seconds: dt.timestamp(),
            nanoseconds: dt.timestamp_subsec_nanos() as i64,
            tz_offset_seconds: dt.offset().local_minus_utc(),
        }
        .to_value()),
        Value::ZonedDateTime(dt) => Ok(PackStreamDateTimeZoneId {
            seconds: dt.timestamp(),
            nanoseconds: dt.timestamp_subsec_nanos() as i64,
            zone_id: dt.timezone().name().to_string(),
        }
        .to_value()),
        Value::LocalDateTime(dt) => Ok(PackStreamLocalDateTime {
            seconds: dt.and_utc().timestamp(),
            nanoseconds: dt.and_utc().timestamp_subsec_nanos() as i64,
        }
        .to_value()),
        Value::Duration(d) => Ok(PackStreamDuration {
            months: d.months,
            days: d.days,
            seconds: d.seconds,
            nanoseconds: d.nanoseconds,
        }
        .to_value()),
        // Re-encodes to the exact wire form it was received as.
        Value::UnsupportedDateTime(u) => Ok(PackStreamDateTimeZoneId {
            seconds: u.seconds,
            nanoseconds: u.nanoseconds,
            zone_id: u.zone_id.clone(),
        }
        .to_value()),
    }
}

/// Convert a driver property/parameter map to its wire representation.
pub fn map_to_wire(
    map: &HashMap<String, Value>,
) -> DriverResult<HashMap<String, PackStreamValue>> {
    map.iter()
        .map(|(k, v)| Ok((k.clone(), to_wire(v)?)))
        .collect()
}

fn node_to_wire(node: &Node) -> DriverResult<PackStreamNode> {
    Ok(PackStreamNode::new(
        node.id,
        node.labels.clone(),
        map_to_wire(&node.properties)?,
        node.element_id.clone(),
    ))
}

fn relationship_to_wire(rel: &Relationship) -> DriverResult<PackStreamRelationship> {
    Ok(PackStreamRelationship {
        id: rel.id,
        start_node_id: rel.start_node_id,
        end_node_id: rel.end_node_id,
        rel_type: rel.rel_type.clone(),
        properties: map_to_wire(&rel.properties)?,
        element_id: rel.element_id.clone(),
        start_node_element_id: rel.start_node_element_id.clone(),
        end_node_element_id: rel.end_node_element_id.clone(),
    })
}

fn path_to_wire(path: &Path) -> DriverResult<PackStreamValue> {
    let mut nodes: Vec<&Node> = Vec::new();
    for node in path.nodes() {
        if !nodes.iter().any(|n| n.element_id == node.element_id) {
            nodes.push(node);
        }
    }
    let mut relationships: Vec<&Relationship> = Vec::new();
    for rel in path.relationships() {
        if !relationships.iter().any(|r| r.element_id == rel.element_id) {
            relationships.push(rel);
        }
    }

    let mut indices = Vec::with_capacity(path.len() * 2);
    for segment in path.segments() {
        let rel_pos = relationships
            .iter()
            .position(|r| r.element_id == segment.relationship.element_id)
            .unwrap() as i64;
        let forward = segment.relationship.start_node_element_id == segment.start.element_id;
        indices.push(if forward { rel_pos + 1 } else { -(rel_pos + 1) });

        let node_pos = nodes
            .iter()
            .position(|n| n.element_id == segment.end.element_id)
            .unwrap() as i64;
        indices.push(node_pos);
    }

    let wire = PackStreamPath {
        nodes: nodes
            .into_iter()
            .map(node_to_wire)
            .collect::<DriverResult<_>>()?,
        relationships: relationships
            .into_iter()
            .map(|r| {
                Ok(PackStreamUnboundRelationship {
                    id: r.id,
                    rel_type: r.rel_type.clone(),
                    properties: map_to_wire(&r.properties)?,
                    element_id: r.element_id.clone(),
                })
            })
            .collect::<DriverResult<Vec<_>>>()?,
        indices,
    };
    Ok(wire.to_value())
}

fn nanos_since_midnight(t: &NaiveTime) -> i64 {
    t.num_seconds_from_midnight() as i64 * 1_000_000_000 + t.nanosecond() as i64
}

// ============================================================================
// Wire -> driver
// ============================================================================

/// Convert a wire value to its driver representation.
pub fn from_wire(value: PackStreamValue) -> DriverResult<Value> {
    match value {
        PackStreamValue::Null => Ok(Value::Null),
        PackStreamValue::Boolean(b) => Ok(Value::Boolean(b)),
        PackStreamValue::Integer(i) => Ok(Value::Integer(i)),
        PackStreamValue::Float(f) => Ok(Value::Float(f)),
        PackStreamValue::String(s) => Ok(Value::String(s)),
        PackStreamValue::Bytes(b) => Ok(Value::Bytes(b)),
        PackStreamValue::List(l) => Ok(Value::List(
            l.into_iter().map(from_wire).collect::<DriverResult<_>>()?,
        )),
        PackStreamValue::Map(m) => Ok(Value::Map(map_from_wire(m)?)),
        PackStreamValue::Structure(s) => {
            let kind = TAG_KINDS.get(&s.tag).copied().ok_or_else(|| {
                DriverError::unrepresentable(format!(
                    "no value registered for structure tag 0x{:02X}",
                    s.tag
                ))
            })?;
            structure_from_wire(kind, PackStreamValue::Structure(s))
        }
    }
}

/// Convert a wire map to a driver property map.
pub fn map_from_wire(
    map: HashMap<String, PackStreamValue>,
) -> DriverResult<HashMap<String, Value>> {
    map.into_iter()
        .map(|(k, v)| Ok((k, from_wire(v)?)))
        .collect()
}

fn structure_from_wire(kind: StructureKind, value: PackStreamValue) -> DriverResult<Value> {
    let protocol = |e: crate::bolt::packstream::PackStreamError| DriverError::protocol(e.to_string());

    match kind {
        StructureKind::Node => {
            let n = PackStreamNode::from_value(&value).map_err(protocol)?;
            Ok(Value::Node(node_from_wire(n)?))
        }
        StructureKind::Relationship => {
            let r = PackStreamRelationship::from_value(&value).map_err(protocol)?;
            Ok(Value::Relationship(Relationship::new(
                r.id,
                r.element_id,
                r.start_node_id,
                r.start_node_element_id,
                r.end_node_id,
                r.end_node_element_id,
                r.rel_type,
                map_from_wire(r.properties)?,
            )))
        }
        StructureKind::UnboundRelationship => {
            let r = PackStreamUnboundRelationship::from_value(&value).map_err(protocol)?;
            Ok(Value::Relationship(unbound_from_wire(r)?))
        }
        StructureKind::Path => {
            let p = PackStreamPath::from_value(&value).map_err(protocol)?;
            Ok(Value::Path(path_from_wire(p)?))
        }
        StructureKind::Date => {
            let d = PackStreamDate::from_value(&value).map_err(protocol)?;
            let days_from_ce = d.days + EPOCH_DAYS_FROM_CE;
            let date = i32::try_from(days_from_ce)
                .ok()
                .and_then(NaiveDate::from_num_days_from_ce_opt)
                .ok_or_else(|| {
                    DriverError::unrepresentable(format!("date out of range: {} days", d.days))
                })?;
            Ok(Value::Date(date))
        }
        StructureKind::Time => {
            let t = PackStreamTime::from_value(&value).map_err(protocol)?;
            let time = time_from_nanos(t.nanoseconds)?;
            let offset = FixedOffset::east_opt(t.tz_offset_seconds).ok_or_else(|| {
                DriverError::unrepresentable(format!(
                    "time offset out of range: {}s",
                    t.tz_offset_seconds
                ))
            })?;
            Ok(Value::Time(time, offset))
        }
        StructureKind::LocalTime => {
            let t = PackStreamLocalTime::from_value(&value).map_err(protocol)?;
            Ok(Value::LocalTime(time_from_nanos(t.nanoseconds)?))
        }
        StructureKind::DateTime => {
            let dt = PackStreamDateTime::from_value(&value).map_err(protocol)?;
            let offset = FixedOffset::east_opt(dt.tz_offset_seconds).ok_or_else(|| {
                DriverError::unrepresentable(format!(
                    "date-time offset out of range: {}s",
                    dt.tz_offset_seconds
                ))
            })?;
            let instant = instant_from_parts(dt.seconds, dt.nanoseconds)?;
            Ok(Value::DateTime(instant.with_timezone(&offset)))
        }
        StructureKind::DateTimeZoneId => {
            let dt = PackStreamDateTimeZoneId::from_value(&value).map_err(protocol)?;
            Ok(zoned_date_time_from_wire(dt))
        }
        StructureKind::LocalDateTime => {
            let dt = PackStreamLocalDateTime::from_value(&value).map_err(protocol)?;
            let instant = instant_from_parts(dt.seconds, dt.nanoseconds)?;
            Ok(Value::LocalDateTime(instant.naive_utc()))
        }
        StructureKind::Duration => {
            let d = PackStreamDuration::from_value(&value).map_err(protocol)?;
            Ok(Value::Duration(Duration::new(
                d.months,
                d.days,
                d.seconds,
                d.nanoseconds,
            )))
        }
        StructureKind::Point2D => {
            let p = PackStreamPoint2D::from_value(&value).map_err(protocol)?;
            Ok(Value::Point(Point::new_2d(p.srid, p.x, p.y)))
        }
        StructureKind::Point3D => {
            let p = PackStreamPoint3D::from_value(&value).map_err(protocol)?;
            Ok(Value::Point(Point::new_3d(p.srid, p.x, p.y, p.z)))
        }
    }
}

fn node_from_wire(n: PackStreamNode) -> DriverResult<Node> {
    Ok(Node::new(
        n.id,
        n.element_id,
        n.labels,
        map_from_wire(n.properties)?,
    ))
}

fn unbound_from_wire(r: PackStreamUnboundRelationship) -> DriverResult<Relationship> {
    Ok(Relationship::unbound(
        r.id,
        r.element_id,
        r.rel_type,
        map_from_wire(r.properties)?,
    ))
}

/// Rebuild the alternating entity sequence from a wire path's traversal
/// indices and validate it through the Path constructor.
///
/// Indices come in (relationship, node) pairs. Relationship indices are
/// 1-based; a negative index means the relationship is traversed against
/// its stored direction. Node indices are 0-based.
fn path_from_wire(p: PackStreamPath) -> DriverResult<Path> {
    let nodes: Vec<Node> = p
        .nodes
        .into_iter()
        .map(node_from_wire)
        .collect::<DriverResult<_>>()?;
    let relationships: Vec<Relationship> = p
        .relationships
        .into_iter()
        .map(unbound_from_wire)
        .collect::<DriverResult<_>>()?;

    let first = nodes
        .first()
        .ok_or_else(|| DriverError::invalid_path("a path requires at least one node"))?;
    let mut entities = vec![PathElement::Node(first.clone())];
    let mut previous = first;

    for pair in p.indices.chunks(2) {
        let rel_index = pair[0];
        let node_index = pair[1];

        let next = nodes.get(node_index as usize).ok_or_else(|| {
            DriverError::invalid_path(format!("node index {} out of range", node_index))
        })?;

        let position = rel_index.unsigned_abs() as usize;
        if position == 0 || position > relationships.len() {
            return Err(DriverError::invalid_path(format!(
                "relationship index {} out of range",
                rel_index
            )));
        }
        let unbound = relationships[position - 1].clone();
        let bound = if rel_index > 0 {
            unbound.bind_endpoints(previous, next)
        } else {
            unbound.bind_endpoints(next, previous)
        };

        entities.push(PathElement::Relationship(bound));
        entities.push(PathElement::Node(next.clone()));
        previous = next;
    }

    Path::new(entities)
}

/// A zone id missing from the host tz database yields the non-fatal
/// sentinel instead of failing the whole record.
fn zoned_date_time_from_wire(dt: PackStreamDateTimeZoneId) -> Value {
    let unsupported = |reason: String| {
        Value::UnsupportedDateTime(UnsupportedDateTime {
            seconds: dt.seconds,
            nanoseconds: dt.nanoseconds,
            zone_id: dt.zone_id.clone(),
            reason,
        })
    };

    let tz: Tz = match dt.zone_id.parse() {
        Ok(tz) => tz,
        Err(_) => return unsupported(format!("unknown zone id {}", dt.zone_id)),
    };
    match instant_from_parts(dt.seconds, dt.nanoseconds) {
        Ok(instant) => Value::ZonedDateTime(instant.with_timezone(&tz)),
        Err(_) => unsupported(format!(
            "timestamp out of range: {}s {}ns",
            dt.seconds, dt.nanoseconds
        )),
    }
}

fn instant_from_parts(seconds: i64, nanoseconds: i64) -> DriverResult<DateTime<chrono::Utc>> {
    u32::try_from(nanoseconds)
        .ok()
        .filter(|n| *n < 1_000_000_000)
        .and_then(|n| DateTime::from_timestamp(seconds, n))
        .ok_or_else(|| {
            DriverError::unrepresentable(format!(
                "timestamp out of range: {}s {}ns",
                seconds, nanoseconds
            ))
        })
}

fn time_from_nanos(nanoseconds: i64) -> DriverResult<NaiveTime> {
    let out_of_range = || {
        DriverError::unrepresentable(format!(
            "time of day out of range: {}ns",
            nanoseconds
        ))
    };
    if nanoseconds < 0 {
        return Err(out_of_range());
    }
    let secs = (nanoseconds / 1_000_000_000) as u32;
    let nanos = (nanoseconds % 1_000_000_000) as u32;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos).ok_or_else(out_of_range)
}
