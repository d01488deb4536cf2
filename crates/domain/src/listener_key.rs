//! Identity-keyed wrapper around a listener reference.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Wraps a listener so the [`Registry`](crate::registry::Registry) can key on
/// reference identity rather than on whatever `PartialEq`/`Hash` the listener
/// type itself happens to implement.
///
/// Two `ListenerKey`s are equal if and only if they wrap the same `Arc`
/// allocation — never because the wrapped values happen to compare equal.
/// This matters because listener types are supplied by callers and cannot be
/// trusted to implement value equality correctly.
pub struct ListenerKey<L> {
    listener: Arc<L>,
}

impl<L> ListenerKey<L> {
    /// Wrap a listener reference.
    #[must_use]
    pub fn new(listener: Arc<L>) -> Self {
        Self { listener }
    }

    /// Borrow the wrapped listener.
    #[must_use]
    pub fn listener(&self) -> &Arc<L> {
        &self.listener
    }

    fn identity(&self) -> usize {
        Arc::as_ptr(&self.listener).cast::<()>() as usize
    }

    /// Expose the identity tag to sibling modules that report on listeners
    /// without depending on their `PartialEq`/`Hash`. Not a dereferenceable
    /// pointer — only useful for equality and ordering.
    pub(crate) fn identity_tag(&self) -> usize {
        self.identity()
    }
}

impl<L> Clone for ListenerKey<L> {
    fn clone(&self) -> Self {
        Self {
            listener: Arc::clone(&self.listener),
        }
    }
}

impl<L> PartialEq for ListenerKey<L> {
    fn eq(&self, other: &Self) -> bool {
        self.identity() == other.identity()
    }
}

impl<L> Eq for ListenerKey<L> {}

impl<L> Hash for ListenerKey<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.identity().hash(state);
    }
}

impl<L> fmt::Debug for ListenerKey<L> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ListenerKey")
            .field("identity", &self.identity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct BuggyEquals(&'static str);

    impl PartialEq for BuggyEquals {
        fn eq(&self, _other: &Self) -> bool {
            // Always reports equal, regardless of identity. Listener keys
            // must not be fooled by this.
            true
        }
    }

    #[test]
    fn same_arc_is_equal() {
        let listener = Arc::new(BuggyEquals("a"));
        let key_a = ListenerKey::new(Arc::clone(&listener));
        let key_b = ListenerKey::new(listener);
        assert_eq!(key_a, key_b);
    }

    #[test]
    fn distinct_instances_with_buggy_equals_are_distinct() {
        let key_a = ListenerKey::new(Arc::new(BuggyEquals("same")));
        let key_b = ListenerKey::new(Arc::new(BuggyEquals("same")));
        assert_ne!(key_a, key_b);
    }

    #[test]
    fn clone_preserves_identity() {
        let key = ListenerKey::new(Arc::new(BuggyEquals("x")));
        let cloned = key.clone();
        assert_eq!(key, cloned);
    }
}
