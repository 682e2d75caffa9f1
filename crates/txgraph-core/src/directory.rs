//! Deduplicated account directory: a fixed-size hash table with chaining.
//!
//! Users live in an arena and are addressed by [`UserIdx`]. Each bucket holds
//! the head of an intrusive chain through [`UserNode::next`]; new users are
//! linked in at the head, so chains are in reverse insertion order. Lookup is
//! a chain scan by equality, which makes chain order unobservable except for
//! the iteration order used by rankings.

use std::fmt;

use crate::constants::{DEFAULT_USER_BUCKETS, HASH_MULTIPLIER, HASH_SEED};
use crate::error::GraphError;
use crate::graph::EdgeList;
use crate::types::AccountId;

/// Arena index of a user node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserIdx(pub(crate) usize);

impl UserIdx {
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for UserIdx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "u{}", self.0)
    }
}

/// A registered account together with its adjacency lists.
#[derive(Debug, Clone)]
pub struct UserNode {
    /// Account identifier; first-seen spelling is canonical.
    pub id: AccountId,
    /// Transfers sent by this account.
    pub out_edges: EdgeList,
    /// Transfers received by this account.
    pub in_edges: EdgeList,
    /// Next user in the same bucket chain.
    next: Option<UserIdx>,
}

impl UserNode {
    fn new(id: AccountId, next: Option<UserIdx>) -> Self {
        Self {
            id,
            out_edges: EdgeList::default(),
            in_edges: EdgeList::default(),
            next,
        }
    }

    pub fn in_degree(&self) -> usize {
        self.in_edges.count()
    }

    pub fn out_degree(&self) -> usize {
        self.out_edges.count()
    }

    /// Total received minus total sent.
    pub fn net_wealth(&self) -> f64 {
        self.in_edges.total() - self.out_edges.total()
    }
}

/// Rolling string hash (`h = h * 33 + byte`, seeded with 5381) reduced to a bucket.
///
/// Arithmetic wraps at 32 bits so bucket placement is identical across runs
/// and platforms.
pub fn bucket_of(id: &str, bucket_count: usize) -> usize {
    let hash = id.bytes().fold(HASH_SEED, |h, b| {
        h.wrapping_mul(HASH_MULTIPLIER).wrapping_add(u32::from(b))
    });
    hash as usize % bucket_count.max(1)
}

/// Hash table of users keyed by account id.
#[derive(Debug, Clone)]
pub struct UserDirectory {
    /// Head of each bucket chain.
    heads: Vec<Option<UserIdx>>,
    /// User arena in insertion order.
    users: Vec<UserNode>,
}

impl UserDirectory {
    /// Create a directory with `bucket_count` buckets (at least one).
    pub fn with_buckets(bucket_count: usize) -> Self {
        Self {
            heads: vec![None; bucket_count.max(1)],
            users: Vec::new(),
        }
    }

    /// Register `id`, returning its index and whether a new node was created.
    ///
    /// Inserting an id that is already present changes nothing.
    pub fn insert(&mut self, id: &str) -> (UserIdx, bool) {
        let bucket = bucket_of(id, self.heads.len());
        if let Some(existing) = self.scan_chain(bucket, id) {
            return (existing, false);
        }
        let idx = UserIdx(self.users.len());
        self.users.push(UserNode::new(id.to_owned(), self.heads[bucket]));
        self.heads[bucket] = Some(idx);
        (idx, true)
    }

    /// Index of `id`, if registered.
    pub fn find(&self, id: &str) -> Option<UserIdx> {
        self.scan_chain(bucket_of(id, self.heads.len()), id)
    }

    /// The node registered under `id`.
    ///
    /// # Errors
    ///
    /// [`GraphError::UserNotFound`] if `id` was never inserted.
    pub fn lookup(&self, id: &str) -> Result<&UserNode, GraphError> {
        self.find(id)
            .map(|idx| &self.users[idx.0])
            .ok_or_else(|| GraphError::UserNotFound(id.to_owned()))
    }

    fn scan_chain(&self, bucket: usize, id: &str) -> Option<UserIdx> {
        let mut current = self.heads[bucket];
        while let Some(idx) = current {
            let node = &self.users[idx.0];
            if node.id == id {
                return Some(idx);
            }
            current = node.next;
        }
        None
    }

    /// Node at `idx`. Indices are only handed out by this directory.
    pub fn node(&self, idx: UserIdx) -> &UserNode {
        &self.users[idx.0]
    }

    pub(crate) fn node_mut(&mut self, idx: UserIdx) -> &mut UserNode {
        &mut self.users[idx.0]
    }

    /// Iterate users bucket by bucket, each chain from its head.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            directory: self,
            bucket: 0,
            current: None,
        }
    }

    /// Number of registered users.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.heads.len()
    }
}

impl Default for UserDirectory {
    fn default() -> Self {
        Self::with_buckets(DEFAULT_USER_BUCKETS)
    }
}

/// Bucket-order iterator over a [`UserDirectory`].
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    directory: &'a UserDirectory,
    bucket: usize,
    current: Option<UserIdx>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (UserIdx, &'a UserNode);

    fn next(&mut self) -> Option<Self::Item> {
        let directory = self.directory;
        while self.current.is_none() {
            if self.bucket >= directory.heads.len() {
                return None;
            }
            self.current = directory.heads[self.bucket];
            self.bucket += 1;
        }
        let idx = self.current?;
        let node = &directory.users[idx.0];
        self.current = node.next;
        Some((idx, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- bucket_of ---

    #[test]
    fn hash_of_empty_string_is_seed() {
        assert_eq!(bucket_of("", usize::MAX), HASH_SEED as usize);
    }

    #[test]
    fn hash_matches_reference_values() {
        // 5381 * 33 + 'a'(97) = 177670
        assert_eq!(bucket_of("a", usize::MAX), 177_670);
        // 177670 * 33 + 'b'(98) = 5863208
        assert_eq!(bucket_of("ab", usize::MAX), 5_863_208);
        assert_eq!(bucket_of("ab", 100_000), 63_208);
    }

    #[test]
    fn hash_wraps_at_32_bits() {
        let long = "1HNzxjHeAjDJ47KvQdYcsrsPUWhYWrAF4p";
        let bucket = bucket_of(long, usize::MAX);
        assert!(bucket <= u32::MAX as usize);
        assert_eq!(bucket, bucket_of(long, usize::MAX));
    }

    #[test]
    fn zero_buckets_is_clamped() {
        assert_eq!(bucket_of("abc", 0), 0);
        assert_eq!(UserDirectory::with_buckets(0).bucket_count(), 1);
    }

    // --- insert / lookup ---

    #[test]
    fn insert_is_idempotent() {
        let mut dir = UserDirectory::with_buckets(16);
        let (a, created) = dir.insert("alice");
        assert!(created);
        let (again, created) = dir.insert("alice");
        assert!(!created);
        assert_eq!(a, again);
        assert_eq!(dir.len(), 1);
    }

    #[test]
    fn lookup_unknown_user_fails() {
        let dir = UserDirectory::with_buckets(16);
        let err = dir.lookup("ghost").unwrap_err();
        assert_eq!(err, GraphError::UserNotFound("ghost".into()));
    }

    #[test]
    fn colliding_ids_share_a_bucket() {
        // A single bucket forces every id into one chain.
        let mut dir = UserDirectory::with_buckets(1);
        for id in ["a", "b", "c"] {
            dir.insert(id);
        }
        for id in ["a", "b", "c"] {
            assert_eq!(dir.lookup(id).unwrap().id, id);
        }
        assert_eq!(dir.len(), 3);
    }

    #[test]
    fn chain_is_reverse_insertion_order() {
        let mut dir = UserDirectory::with_buckets(1);
        for id in ["a", "b", "c"] {
            dir.insert(id);
        }
        let order: Vec<&str> = dir.iter().map(|(_, n)| n.id.as_str()).collect();
        assert_eq!(order, vec!["c", "b", "a"]);
    }

    #[test]
    fn iteration_visits_every_user_once() {
        let mut dir = UserDirectory::with_buckets(7);
        for i in 0..50 {
            dir.insert(&format!("user-{i}"));
        }
        let mut seen: Vec<usize> = dir.iter().map(|(idx, _)| idx.index()).collect();
        seen.sort();
        assert_eq!(seen, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn empty_directory_iterates_nothing() {
        let dir = UserDirectory::with_buckets(8);
        assert!(dir.is_empty());
        assert_eq!(dir.iter().count(), 0);
    }

    #[test]
    fn new_node_has_no_edges() {
        let mut dir = UserDirectory::default();
        let (idx, _) = dir.insert("alice");
        let node = dir.node(idx);
        assert_eq!(node.in_degree(), 0);
        assert_eq!(node.out_degree(), 0);
        assert_eq!(node.net_wealth(), 0.0);
    }
}
