//! Graph entities: nodes, relationships, paths.
//!
//! Entities are decoded once from wire data and immutable afterwards.
//! They carry both the legacy numeric id and the durable string element
//! id. Equality between two entities compares the numeric ids only; see
//! the notes on [`Node`] for the consequences.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::value::Value;

// ============================================================================
// Node
// ============================================================================

/// A graph node.
///
/// Two nodes are equal iff their legacy numeric ids are equal. This is
/// deliberately narrower than element-id equality: numeric ids can be
/// reused by the graph engine after deletion, in which case two logically
/// distinct nodes compare equal. Compare `element_id` directly where that
/// distinction matters.
#[derive(Debug, Clone, Serialize)]
pub struct Node {
    /// Legacy numeric id
    pub id: i64,
    /// Durable element id
    pub element_id: String,
    /// Labels, unordered and unique
    pub labels: Vec<String>,
    /// Properties
    pub properties: HashMap<String, Value>,
}

impl Node {
    /// Create a node.
    pub fn new(
        id: i64,
        element_id: String,
        labels: Vec<String>,
        properties: HashMap<String, Value>,
    ) -> Self {
        Self {
            id,
            element_id,
            labels,
            properties,
        }
    }

    /// Whether the node carries the given label (exact match).
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Property value for `key`; the Null sentinel when absent.
    pub fn get(&self, key: &str) -> &Value {
        self.properties.get(key).unwrap_or(&NULL)
    }

    /// Property keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Apply a projection to every property value and collect the results
    /// into a fresh map.
    pub fn as_map<T>(&self, f: impl Fn(&Value) -> T) -> HashMap<String, T> {
        project(&self.properties, f)
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.labels.is_empty() {
            write!(f, "({})", self.id)
        } else {
            write!(f, "({}:{})", self.id, self.labels.join(":"))
        }
    }
}

static NULL: Value = Value::Null;

fn project<T>(properties: &HashMap<String, Value>, f: impl Fn(&Value) -> T) -> HashMap<String, T> {
    properties.iter().map(|(k, v)| (k.clone(), f(v))).collect()
}

// ============================================================================
// Relationship
// ============================================================================

/// A graph relationship.
///
/// Equality follows the same numeric-id contract as [`Node`].
///
/// Endpoints are bound in two phases: path decoding yields relationships
/// whose endpoints are not known yet ([`Relationship::unbound`]), and the
/// consuming [`Relationship::bind_endpoints`] freezes them once the
/// flanking nodes are resolved. A relationship is never mutated after it
/// becomes observable.
#[derive(Debug, Clone, Serialize)]
pub struct Relationship {
    /// Legacy numeric id
    pub id: i64,
    /// Durable element id
    pub element_id: String,
    /// Numeric id of the start node
    pub start_node_id: i64,
    /// Numeric id of the end node
    pub end_node_id: i64,
    /// Element id of the start node
    pub start_node_element_id: String,
    /// Element id of the end node
    pub end_node_element_id: String,
    /// Type name
    #[serde(rename = "type")]
    pub rel_type: String,
    /// Properties
    pub properties: HashMap<String, Value>,
}

impl Relationship {
    /// Create a relationship with both endpoints known.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: i64,
        element_id: String,
        start_node_id: i64,
        start_node_element_id: String,
        end_node_id: i64,
        end_node_element_id: String,
        rel_type: String,
        properties: HashMap<String, Value>,
    ) -> Self {
        Self {
            id,
            element_id,
            start_node_id,
            end_node_id,
            start_node_element_id,
            end_node_element_id,
            rel_type,
            properties,
        }
    }

    /// Create a relationship whose endpoints are not known yet. Used while
    /// decoding paths, where endpoints arrive separately from the
    /// relationship itself.
    pub fn unbound(
        id: i64,
        element_id: String,
        rel_type: String,
        properties: HashMap<String, Value>,
    ) -> Self {
        Self {
            id,
            element_id,
            start_node_id: -1,
            end_node_id: -1,
            start_node_element_id: String::new(),
            end_node_element_id: String::new(),
            rel_type,
            properties,
        }
    }

    /// Bind the endpoints, consuming the unbound value.
    pub fn bind_endpoints(mut self, start: &Node, end: &Node) -> Self {
        self.start_node_id = start.id;
        self.start_node_element_id = start.element_id.clone();
        self.end_node_id = end.id;
        self.end_node_element_id = end.element_id.clone();
        self
    }

    /// Whether the relationship has the given type (exact string match).
    pub fn has_type(&self, rel_type: &str) -> bool {
        self.rel_type == rel_type
    }

    /// Property value for `key`; the Null sentinel when absent.
    pub fn get(&self, key: &str) -> &Value {
        self.properties.get(key).unwrap_or(&NULL)
    }

    /// Property keys.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    /// Apply a projection to every property value and collect the results
    /// into a fresh map.
    pub fn as_map<T>(&self, f: impl Fn(&Value) -> T) -> HashMap<String, T> {
        project(&self.properties, f)
    }
}

impl PartialEq for Relationship {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Relationship {}

impl fmt::Display for Relationship {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({})-[:{}]->({}) [id: {}]",
            self.start_node_id, self.rel_type, self.end_node_id, self.id
        )
    }
}

// ============================================================================
// Path
// ============================================================================

/// One entity of the alternating sequence a path is built from.
#[derive(Debug, Clone)]
pub enum PathElement {
    /// A node
    Node(Node),
    /// A relationship
    Relationship(Relationship),
}

/// One step of a path: a relationship with its flanking nodes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    /// Node the step starts at
    pub start: Node,
    /// The traversed relationship
    pub relationship: Relationship,
    /// Node the step ends at
    pub end: Node,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.relationship.start_node_element_id == self.start.element_id {
            write!(
                f,
                "({})-[{}:{}]->({})",
                self.start.id, self.relationship.id, self.relationship.rel_type, self.end.id
            )
        } else {
            write!(
                f,
                "({})<-[{}:{}]-({})",
                self.start.id, self.relationship.id, self.relationship.rel_type, self.end.id
            )
        }
    }
}

/// A path: an alternating Node, Relationship, ..., Node sequence.
///
/// Construction validates the sequence in a single pass and derives one
/// [`Segment`] per relationship; both the validation and the segment list
/// are fixed at construction time.
#[derive(Debug, Clone, Serialize)]
pub struct Path {
    nodes: Vec<Node>,
    relationships: Vec<Relationship>,
    segments: Vec<Segment>,
}

fn is_endpoint(node: &Node, relationship: &Relationship) -> bool {
    node.element_id == relationship.start_node_element_id
        || node.element_id == relationship.end_node_element_id
}

impl Path {
    /// Build a path from an alternating entity sequence.
    ///
    /// The sequence must have odd length, start and end with a node, and
    /// every relationship's endpoints must include the node accepted just
    /// before it (compared by element id). Violations fail with an error
    /// naming the offending index; no partially-validated path is ever
    /// produced.
    pub fn new(entities: Vec<PathElement>) -> crate::driver::DriverResult<Self> {
        use crate::driver::DriverError;

        if entities.len() % 2 == 0 {
            return Err(DriverError::invalid_path(format!(
                "a path requires an odd number of alternating entities, got {}",
                entities.len()
            )));
        }

        let mut nodes = Vec::with_capacity(entities.len() / 2 + 1);
        let mut relationships: Vec<Relationship> = Vec::with_capacity(entities.len() / 2);

        for (index, entity) in entities.into_iter().enumerate() {
            if index % 2 == 0 {
                let node = match entity {
                    PathElement::Node(node) => node,
                    PathElement::Relationship(_) => {
                        return Err(DriverError::invalid_path(format!(
                            "expected entity {} to be a node, found a relationship",
                            index
                        )))
                    }
                };
                match relationships.last() {
                    None => nodes.push(node),
                    Some(last_rel) if is_endpoint(&node, last_rel) => nodes.push(node),
                    Some(_) => {
                        return Err(DriverError::invalid_path(format!(
                            "node {} is not an endpoint of relationship {}",
                            index,
                            index - 1
                        )))
                    }
                }
            } else {
                let relationship = match entity {
                    PathElement::Relationship(relationship) => relationship,
                    PathElement::Node(_) => {
                        return Err(DriverError::invalid_path(format!(
                            "expected entity {} to be a relationship, found a node",
                            index
                        )))
                    }
                };
                // nodes is non-empty here: index 0 was a node
                let last_node = nodes.last().unwrap();
                if !is_endpoint(last_node, &relationship) {
                    return Err(DriverError::invalid_path(format!(
                        "node {} is not an endpoint of relationship {}",
                        index - 1,
                        index
                    )));
                }
                relationships.push(relationship);
            }
        }

        let segments = (0..relationships.len())
            .map(|i| Segment {
                start: nodes[i].clone(),
                relationship: relationships[i].clone(),
                end: nodes[i + 1].clone(),
            })
            .collect();

        Ok(Self {
            nodes,
            relationships,
            segments,
        })
    }

    /// Reassemble a path from already-validated parts.
    pub(crate) fn from_parts(
        nodes: Vec<Node>,
        relationships: Vec<Relationship>,
        segments: Vec<Segment>,
    ) -> Self {
        Self {
            nodes,
            relationships,
            segments,
        }
    }

    /// Path length: the number of relationships.
    pub fn len(&self) -> usize {
        self.relationships.len()
    }

    /// Whether the path has no relationships (a single node).
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty()
    }

    /// First node.
    pub fn start(&self) -> Option<&Node> {
        self.nodes.first()
    }

    /// Last node.
    pub fn end(&self) -> Option<&Node> {
        self.nodes.last()
    }

    /// Nodes in traversal order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Relationships in traversal order.
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    /// Segments, one per relationship.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Whether the path traverses the given node.
    pub fn contains_node(&self, node: &Node) -> bool {
        self.nodes.contains(node)
    }

    /// Whether the path traverses the given relationship.
    pub fn contains_relationship(&self, relationship: &Relationship) -> bool {
        self.relationships.contains(relationship)
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        self.segments == other.segments
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "path[")?;
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", segment)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64) -> Node {
        Node::new(id, format!("4:g:{}", id), vec!["Person".to_string()], HashMap::new())
    }

    fn rel(id: i64, start: i64, end: i64) -> Relationship {
        Relationship::new(
            id,
            format!("5:g:{}", id),
            start,
            format!("4:g:{}", start),
            end,
            format!("4:g:{}", end),
            "KNOWS".to_string(),
            HashMap::new(),
        )
    }

    #[test]
    fn node_basics() {
        let mut props = HashMap::new();
        props.insert("name".to_string(), Value::from("Alice"));
        props.insert("age".to_string(), Value::from(30i64));
        let n = Node::new(1, "4:g:1".into(), vec!["Person".into()], props);

        assert!(n.has_label("Person"));
        assert!(!n.has_label("Company"));
        assert_eq!(n.get("name").as_string().unwrap(), "Alice");
        assert!(n.get("missing").is_null());
        assert_eq!(n.keys().count(), 2);
        assert_eq!(n.to_string(), "(1:Person)");
    }

    #[test]
    fn node_as_map_projects_every_property() {
        let mut props = HashMap::new();
        props.insert("a".to_string(), Value::from(1i64));
        props.insert("b".to_string(), Value::from(2i64));
        let n = Node::new(1, "4:g:1".into(), vec![], props);

        let projected = n.as_map(|v| v.as_int().unwrap() * 10);
        assert_eq!(projected.len(), 2);
        assert_eq!(projected["a"], 10);
        assert_eq!(projected["b"], 20);
    }

    #[test]
    fn entity_equality_is_numeric_id_not_element_id() {
        // same numeric id, different element ids: equal under the contract
        let a = Node::new(1, "4:g:1".into(), vec![], HashMap::new());
        let b = Node::new(1, "4:h:999".into(), vec!["Other".into()], HashMap::new());
        assert_eq!(a, b);

        // different numeric ids, same element id: not equal
        let c = Node::new(2, "4:g:1".into(), vec![], HashMap::new());
        assert_ne!(a, c);

        let r1 = rel(7, 1, 2);
        let mut r2 = rel(7, 1, 2);
        r2.element_id = "5:other:7".to_string();
        assert_eq!(r1, r2);
    }

    #[test]
    fn relationship_basics() {
        let mut props = HashMap::new();
        props.insert("since".to_string(), Value::from(2020i64));
        let r = Relationship::new(
            9,
            "5:g:9".into(),
            1,
            "4:g:1".into(),
            2,
            "4:g:2".into(),
            "KNOWS".into(),
            props,
        );

        assert!(r.has_type("KNOWS"));
        assert!(!r.has_type("KNOW"));
        assert!(!r.has_type("knows"));
        assert_eq!(r.get("since").as_int().unwrap(), 2020);
        assert_eq!(r.to_string(), "(1)-[:KNOWS]->(2) [id: 9]");
    }

    #[test]
    fn unbound_relationship_binds_once() {
        let r = Relationship::unbound(9, "5:g:9".into(), "KNOWS".into(), HashMap::new());
        assert_eq!(r.start_node_id, -1);
        assert!(r.start_node_element_id.is_empty());

        let bound = r.bind_endpoints(&node(1), &node(2));
        assert_eq!(bound.start_node_id, 1);
        assert_eq!(bound.end_node_id, 2);
        assert_eq!(bound.start_node_element_id, "4:g:1");
        assert_eq!(bound.end_node_element_id, "4:g:2");
    }

    #[test]
    fn path_single_node() {
        let p = Path::new(vec![PathElement::Node(node(1))]).unwrap();
        assert_eq!(p.len(), 0);
        assert!(p.is_empty());
        assert_eq!(p.start().unwrap().id, 1);
        assert_eq!(p.end().unwrap().id, 1);
        assert!(p.segments().is_empty());
    }

    #[test]
    fn path_valid_two_hops() {
        let p = Path::new(vec![
            PathElement::Node(node(1)),
            PathElement::Relationship(rel(10, 1, 2)),
            PathElement::Node(node(2)),
            PathElement::Relationship(rel(11, 2, 3)),
            PathElement::Node(node(3)),
        ])
        .unwrap();

        assert_eq!(p.len(), 2);
        assert_eq!(p.nodes().len(), 3);
        assert_eq!(p.segments().len(), p.relationships().len());

        let s = &p.segments()[0];
        assert_eq!(s.start.id, 1);
        assert_eq!(s.relationship.id, 10);
        assert_eq!(s.end.id, 2);

        assert!(p.contains_node(&node(2)));
        assert!(!p.contains_node(&node(9)));
        assert!(p.contains_relationship(&rel(11, 2, 3)));
    }

    #[test]
    fn path_accepts_reversed_relationship() {
        // relationship goes 2 -> 1 but the path walks 1 -> 2
        let p = Path::new(vec![
            PathElement::Node(node(1)),
            PathElement::Relationship(rel(10, 2, 1)),
            PathElement::Node(node(2)),
        ])
        .unwrap();
        assert_eq!(p.len(), 1);
    }

    #[test]
    fn path_rejects_even_length() {
        let err = Path::new(vec![
            PathElement::Node(node(1)),
            PathElement::Relationship(rel(10, 1, 2)),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("odd number"));
    }

    #[test]
    fn path_rejects_wrong_kind_at_index() {
        let err = Path::new(vec![
            PathElement::Node(node(1)),
            PathElement::Node(node(2)),
            PathElement::Node(node(3)),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("entity 1"));

        let err = Path::new(vec![PathElement::Relationship(rel(10, 1, 2))]).unwrap_err();
        assert!(err.to_string().contains("entity 0"));
    }

    #[test]
    fn path_rejects_non_adjacent_relationship() {
        // relationship 5 -> 6 does not touch node 1
        let err = Path::new(vec![
            PathElement::Node(node(1)),
            PathElement::Relationship(rel(10, 5, 6)),
            PathElement::Node(node(5)),
        ])
        .unwrap_err();
        match &err {
            crate::driver::DriverError::InvalidPath(msg) => {
                assert!(msg.contains("relationship 1"), "got: {msg}");
            }
            other => panic!("expected InvalidPath, got {other:?}"),
        }
    }

    #[test]
    fn path_rejects_non_endpoint_follow_node() {
        // relationship 1 -> 2 but the following node is 3
        let err = Path::new(vec![
            PathElement::Node(node(1)),
            PathElement::Relationship(rel(10, 1, 2)),
            PathElement::Node(node(3)),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("node 2"));
    }

    #[test]
    fn path_equality_is_segment_equality() {
        let build = || {
            Path::new(vec![
                PathElement::Node(node(1)),
                PathElement::Relationship(rel(10, 1, 2)),
                PathElement::Node(node(2)),
            ])
            .unwrap()
        };
        assert_eq!(build(), build());

        let other = Path::new(vec![
            PathElement::Node(node(1)),
            PathElement::Relationship(rel(11, 1, 2)),
            PathElement::Node(node(2)),
        ])
        .unwrap();
        assert_ne!(build(), other);
    }

    #[test]
    fn segment_display_follows_direction() {
        let forward = Segment {
            start: node(1),
            relationship: rel(10, 1, 2),
            end: node(2),
        };
        assert_eq!(forward.to_string(), "(1)-[10:KNOWS]->(2)");

        let backward = Segment {
            start: node(2),
            relationship: rel(10, 1, 2),
            end: node(1),
        };
        assert_eq!(backward.to_string(), "(2)<-[10:KNOWS]-(1)");
    }
}
