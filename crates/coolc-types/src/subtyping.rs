//! Subtyping over the class tree
//!
//! Single inheritance makes the subtype relation a walk up the parent
//! chain, and the least upper bound the first class both chains share.

use crate::class::ClassId;
use crate::table::ClassTable;
use rustc_hash::FxHashSet;

/// Iterator over a class and its ancestors, ending at the root
///
/// Bounded by the number of classes, so a parent cycle that slipped past
/// the checker cannot make it spin forever.
pub struct Ancestors<'a> {
    table: &'a ClassTable,
    next: Option<ClassId>,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = ClassId;

    fn next(&mut self) -> Option<ClassId> {
        let current = self.next?;
        if self.remaining == 0 {
            self.next = None;
            return None;
        }
        self.remaining -= 1;
        let parent = self.table.parent(current);
        self.next = if parent == current { None } else { Some(parent) };
        Some(current)
    }
}

impl ClassTable {
    /// `class`, its parent, and so on up to the root
    pub fn ancestors(&self, class: ClassId) -> Ancestors<'_> {
        Ancestors {
            table: self,
            next: Some(class),
            remaining: self.len(),
        }
    }

    /// Number of parent links between `class` and the root
    pub fn depth(&self, class: ClassId) -> usize {
        self.ancestors(class).count() - 1
    }

    /// Whether a value of type `specific` may be used where `general` is expected
    pub fn is_subtype_or_equal(&self, general: ClassId, specific: ClassId) -> bool {
        self.ancestors(specific).any(|c| c == general)
    }

    /// Least common ancestor of two classes.
    ///
    /// Both chains are walked one step at a time; the first class one walker
    /// reaches that the other has already visited is the answer. Depths are
    /// never computed.
    pub fn join(&self, a: ClassId, b: ClassId) -> ClassId {
        let mut seen = FxHashSet::default();
        let (mut left, mut right) = (a, b);

        for _ in 0..=self.len() {
            if left != ClassId::OBJECT && !seen.insert(left) {
                return left;
            }
            seen.insert(left);
            left = self.parent(left);

            if right != ClassId::OBJECT && !seen.insert(right) {
                return right;
            }
            seen.insert(right);
            right = self.parent(right);

            if left == right {
                return left;
            }
        }
        ClassId::OBJECT
    }

    /// Fold [`Self::join`] over a non-empty sequence, left to right
    pub fn join_all(&self, classes: impl IntoIterator<Item = ClassId>) -> Option<ClassId> {
        classes.into_iter().reduce(|acc, c| self.join(acc, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Object <- A <- B <- C, A <- D
    fn lattice() -> (ClassTable, [ClassId; 4]) {
        let mut table = ClassTable::new();
        let a = table.add_class("A", Some(0)).unwrap();
        let b = table.add_class("B", Some(1)).unwrap();
        let c = table.add_class("C", Some(2)).unwrap();
        let d = table.add_class("D", Some(3)).unwrap();
        table.set_parent(b, a);
        table.set_parent(c, b);
        table.set_parent(d, a);
        (table, [a, b, c, d])
    }

    #[test]
    fn test_subtype_is_reflexive() {
        let (table, classes) = lattice();
        for id in table.class_ids().chain(classes) {
            assert!(table.is_subtype_or_equal(id, id));
        }
    }

    #[test]
    fn test_object_is_universal_supertype() {
        let (table, _) = lattice();
        for id in table.class_ids() {
            assert!(table.is_subtype_or_equal(ClassId::OBJECT, id));
        }
    }

    #[test]
    fn test_subtype_is_directional() {
        let (table, [a, b, c, d]) = lattice();
        assert!(table.is_subtype_or_equal(a, c));
        assert!(!table.is_subtype_or_equal(c, a));
        assert!(!table.is_subtype_or_equal(b, d));
        assert!(!table.is_subtype_or_equal(ClassId::INT, ClassId::OBJECT));
    }

    #[test]
    fn test_join_examples() {
        let (table, [a, b, c, d]) = lattice();
        assert_eq!(table.join(c, d), a);
        assert_eq!(table.join(b, c), b);
        assert_eq!(table.join(c, c), c);
        assert_eq!(table.join(ClassId::INT, ClassId::STRING), ClassId::OBJECT);
        assert_eq!(table.join(a, ClassId::OBJECT), ClassId::OBJECT);
        assert_eq!(table.join(ClassId::OBJECT, ClassId::OBJECT), ClassId::OBJECT);
    }

    #[test]
    fn test_join_is_symmetric() {
        let (table, _) = lattice();
        let ids: Vec<_> = table.class_ids().collect();
        for &x in &ids {
            for &y in &ids {
                assert_eq!(
                    table.join(x, y),
                    table.join(y, x),
                    "join({}, {}) is not symmetric",
                    table.name(x),
                    table.name(y)
                );
            }
        }
    }

    #[test]
    fn test_join_is_an_upper_bound() {
        let (table, _) = lattice();
        let ids: Vec<_> = table.class_ids().collect();
        for &x in &ids {
            for &y in &ids {
                let j = table.join(x, y);
                assert!(table.is_subtype_or_equal(j, x));
                assert!(table.is_subtype_or_equal(j, y));
            }
        }
    }

    #[test]
    fn test_depth_and_ancestors() {
        let (table, [a, b, c, _]) = lattice();
        assert_eq!(table.depth(ClassId::OBJECT), 0);
        assert_eq!(table.depth(c), 3);
        let chain: Vec<_> = table.ancestors(c).collect();
        assert_eq!(chain, vec![c, b, a, ClassId::OBJECT]);
    }

    #[test]
    fn test_ancestors_terminate_on_cycle() {
        let (mut table, [a, b, ..]) = lattice();
        table.set_parent(a, b);
        assert!(table.ancestors(b).count() <= table.len());
        assert!(!table.is_subtype_or_equal(ClassId::OBJECT, a));
    }
}
