//! Key comparators

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::{extract_sequence, extract_suffix, extract_user_key};

/// Total order over user keys
pub trait Comparator: fmt::Debug + Send + Sync {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering;

    /// Identifies the ordering in log output
    ///
    /// Nothing on disk records it: reopening a store with a different
    /// ordering is not detected.
    fn name(&self) -> &'static str;
}

/// Lexicographic byte order
#[derive(Debug, Default, Clone, Copy)]
pub struct BytewiseComparator;

impl Comparator for BytewiseComparator {
    fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        a.cmp(b)
    }

    fn name(&self) -> &'static str {
        "memwal.BytewiseComparator"
    }
}

/// Orders internal keys: user key ascending (per the user comparator), then
/// sequence number descending, then tag descending.
#[derive(Debug, Clone)]
pub struct InternalKeyComparator {
    user_comparator: Arc<dyn Comparator>,
}

impl InternalKeyComparator {
    pub fn new(user_comparator: Arc<dyn Comparator>) -> Self {
        Self { user_comparator }
    }

    pub fn user_comparator(&self) -> &dyn Comparator {
        self.user_comparator.as_ref()
    }

    /// Compare two internal keys
    pub fn compare(&self, a: &[u8], b: &[u8]) -> Ordering {
        self.user_comparator
            .compare(extract_user_key(a), extract_user_key(b))
            .then_with(|| extract_suffix(b).cmp(&extract_suffix(a)))
    }

    /// Same user key and same sequence number, whatever the tags
    pub fn same_version(&self, a: &[u8], b: &[u8]) -> bool {
        self.user_comparator
            .compare(extract_user_key(a), extract_user_key(b))
            == Ordering::Equal
            && extract_sequence(a) == extract_sequence(b)
    }
}

impl Default for InternalKeyComparator {
    fn default() -> Self {
        Self::new(Arc::new(BytewiseComparator))
    }
}
