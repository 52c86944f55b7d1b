//! Collection wrappers.

use std::{
    hash::{DefaultHasher, Hash, Hasher},
    ops::Deref,
};

use super::{Account, AddOn, Invoice, Plan, Subscription, Transaction};

/// An ordered page of entities returned by a list operation.
///
/// Server order is preserved and equality is ordered.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceList<E> {
    items: Vec<E>,
}

/// Accounts list.
pub type Accounts = ResourceList<Account>;
/// Plans list.
pub type Plans = ResourceList<Plan>;
/// Add-ons list.
pub type AddOns = ResourceList<AddOn>;
/// Subscriptions list.
pub type Subscriptions = ResourceList<Subscription>;
/// Invoices list.
pub type Invoices = ResourceList<Invoice>;
/// Transactions list.
pub type Transactions = ResourceList<Transaction>;

impl<E> ResourceList<E> {
    /// An empty list.
    #[must_use]
    pub const fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Consumes the list, returning its items.
    #[must_use]
    pub fn into_vec(self) -> Vec<E> {
        self.items
    }
}

impl<E> Default for ResourceList<E> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<E> Deref for ResourceList<E> {
    type Target = [E];

    fn deref(&self) -> &[E] {
        &self.items
    }
}

impl<E> From<Vec<E>> for ResourceList<E> {
    fn from(items: Vec<E>) -> Self {
        Self { items }
    }
}

impl<E> IntoIterator for ResourceList<E> {
    type Item = E;
    type IntoIter = std::vec::IntoIter<E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, E> IntoIterator for &'a ResourceList<E> {
    type Item = &'a E;
    type IntoIter = std::slice::Iter<'a, E>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// A collection field whose equality and hash ignore element order.
///
/// Two lists are equal when they hold the same elements with the same
/// multiplicities.
///
/// # Examples
///
/// ```
/// use tenant_billing::model::UnorderedList;
///
/// let a: UnorderedList<u32> = vec![1, 2, 2].into();
/// let b: UnorderedList<u32> = vec![2, 1, 2].into();
/// let c: UnorderedList<u32> = vec![1, 1, 2].into();
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
#[derive(Debug, Clone)]
pub struct UnorderedList<T>(Vec<T>);

impl<T> UnorderedList<T> {
    /// Appends an element.
    pub fn push(&mut self, item: T) {
        self.0.push(item);
    }

    /// Consumes the list, returning its elements in insertion order.
    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.0
    }
}

impl<T> Default for UnorderedList<T> {
    fn default() -> Self {
        Self(Vec::new())
    }
}

impl<T> Deref for UnorderedList<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T> From<Vec<T>> for UnorderedList<T> {
    fn from(items: Vec<T>) -> Self {
        Self(items)
    }
}

impl<T> FromIterator<T> for UnorderedList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a, T> IntoIterator for &'a UnorderedList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<T: PartialEq> PartialEq for UnorderedList<T> {
    fn eq(&self, other: &Self) -> bool {
        if self.0.len() != other.0.len() {
            return false;
        }
        let mut matched = vec![false; other.0.len()];
        self.0.iter().all(|item| {
            let found = other
                .0
                .iter()
                .enumerate()
                .position(|(index, candidate)| !matched[index] && candidate == item);
            match found {
                Some(index) => {
                    matched[index] = true;
                    true
                }
                None => false,
            }
        })
    }
}

impl<T: Eq> Eq for UnorderedList<T> {}

impl<T: Hash> Hash for UnorderedList<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let combined = self.0.iter().fold(0u64, |acc, item| {
            let mut hasher = DefaultHasher::new();
            item.hash(&mut hasher);
            acc.wrapping_add(hasher.finish())
        });
        self.0.len().hash(state);
        combined.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn hash_of<T: Hash>(value: &T) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    #[test]
    fn test_unordered_equality_respects_multiplicity() {
        let a: UnorderedList<&str> = vec!["x", "y", "y"].into();
        assert_eq!(a, vec!["y", "x", "y"].into());
        assert_ne!(a, vec!["x", "x", "y"].into());
        assert_ne!(a, vec!["x", "y"].into());
    }

    #[test]
    fn test_unordered_hash_ignores_order() {
        let a: UnorderedList<&str> = vec!["x", "y", "z"].into();
        let b: UnorderedList<&str> = vec!["z", "x", "y"].into();
        assert_eq!(hash_of(&a), hash_of(&b));

        let set: HashSet<UnorderedList<&str>> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_resource_list_is_ordered() {
        let a: ResourceList<u8> = vec![1, 2].into();
        let b: ResourceList<u8> = vec![2, 1].into();
        assert_ne!(a, b);
        assert_eq!(a.len(), 2);
        assert_eq!(a[0], 1);
        assert_eq!(a.into_iter().collect::<Vec<_>>(), [1, 2]);
    }

    #[test]
    fn test_empty_lists() {
        assert!(ResourceList::<u8>::default().is_empty());
        assert!(UnorderedList::<u8>::default().is_empty());
    }
}
