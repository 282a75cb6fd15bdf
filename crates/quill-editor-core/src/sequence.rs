//! Request fencing.
//!
//! Every dispatched check gets a monotonically increasing id. Only a response
//! for the most recently issued id may touch the document; anything older
//! lost the race and is dropped.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct RequestSequencer {
    counter: u64,
    latest: Option<RequestId>,
}

impl RequestSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self) -> RequestId {
        self.counter += 1;
        let id = RequestId(self.counter);
        self.latest = Some(id);
        id
    }

    pub fn latest(&self) -> Option<RequestId> {
        self.latest
    }

    pub fn is_latest(&self, id: RequestId) -> bool {
        self.latest == Some(id)
    }

    /// Make every id issued so far stale without issuing a new one.
    pub fn invalidate(&mut self) {
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_wins() {
        let mut seq = RequestSequencer::new();
        let a = seq.issue();
        let b = seq.issue();
        assert!(a < b);
        assert!(!seq.is_latest(a));
        assert!(seq.is_latest(b));
    }

    #[test]
    fn test_invalidate() {
        let mut seq = RequestSequencer::new();
        let a = seq.issue();
        seq.invalidate();
        assert!(!seq.is_latest(a));
        // Ids keep increasing after invalidation.
        assert!(seq.issue() > a);
    }
}
