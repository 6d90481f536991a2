use std::{collections::HashSet, hash::Hash};

/// Insertion-ordered set: a sequence plus a membership index. The first occurrence of a
/// value wins and keeps its position.
#[derive(Debug, Clone)]
pub struct OrderedSet<T: Hash + Eq + Clone> {
    items: Vec<T>,
    members: HashSet<T>,
}

impl<T: Hash + Eq + Clone> Default for OrderedSet<T> {
    fn default() -> Self {
        OrderedSet {
            items: Vec::new(),
            members: HashSet::new(),
        }
    }
}

impl<T: Hash + Eq + Clone> OrderedSet<T> {
    pub fn new() -> Self {
        OrderedSet::default()
    }

    /// Returns `true` if the value was not present yet.
    pub fn insert(&mut self, value: T) -> bool {
        if self.members.contains(&value) {
            return false;
        }
        self.members.insert(value.clone());
        self.items.push(value);
        true
    }

    pub fn contains(&self, value: &T) -> bool {
        self.members.contains(value)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T: Hash + Eq + Clone> Extend<T> for OrderedSet<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T: Hash + Eq + Clone> FromIterator<T> for OrderedSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = OrderedSet::new();
        set.extend(iter);
        set
    }
}

impl<T: Hash + Eq + Clone> IntoIterator for OrderedSet<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn test_first_occurrence_wins() {
        let mut set = OrderedSet::new();
        assert!(set.insert("b"));
        assert!(set.insert("a"));
        assert!(!set.insert("b"));
        assert!(set.insert("c"));
        assert_eq!(set.as_slice(), &["b", "a", "c"]);
        assert!(set.contains(&"a"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_collect_is_stable() {
        let set: OrderedSet<u32> = [3, 1, 3, 2, 1].into_iter().collect();
        assert_eq!(set.into_vec(), vec![3, 1, 2]);
    }
}
