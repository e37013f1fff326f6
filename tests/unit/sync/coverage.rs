use super::*;
use crate::document::memory::InMemoryStore;
use crate::document::shape::Shape;

fn store() -> InMemoryStore {
    InMemoryStore::with_shapes([
        Shape::group("outer"),
        Shape::group("mid").with_parent("outer"),
        Shape::leaf("leaf", 0.0, 0.0, 1.0, 1.0).with_parent("mid"),
        Shape::leaf("free", 0.0, 0.0, 1.0, 1.0),
    ])
}

fn set(ids: &[&str]) -> BTreeSet<ShapeId> {
    ids.iter().map(|s| ShapeId::from(*s)).collect()
}

#[test]
fn top_level_sources_are_uncovered() {
    let c = Coverage::compute(&store(), &set(&["leaf", "free"]));
    assert!(!c.is_covered(&"leaf".into()));
    assert!(!c.is_covered(&"free".into()));
    assert!(c.covered().is_empty());
}

#[test]
fn nearest_active_ancestor_covers() {
    let c = Coverage::compute(&store(), &set(&["outer", "leaf"]));
    assert_eq!(c.cover_of(&"leaf".into()), Some(&ShapeId::from("outer")));
    assert!(!c.is_covered(&"outer".into()));
    assert!(c.ambiguous().is_empty());
}

#[test]
fn several_active_ancestors_are_flagged() {
    let c = Coverage::compute(&store(), &set(&["outer", "mid", "leaf"]));
    assert_eq!(c.cover_of(&"leaf".into()), Some(&ShapeId::from("mid")));
    assert_eq!(c.cover_of(&"mid".into()), Some(&ShapeId::from("outer")));
    assert_eq!(c.ambiguous(), &set(&["leaf"]));
}
