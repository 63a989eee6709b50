//! Sender authorization.

use std::collections::HashSet;

use super::Authorizer;

/// Fixed set of allowed sender ids
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    senders: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(senders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            senders: senders
                .into_iter()
                .map(Into::into)
                .map(|s: String| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.senders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }
}

impl Authorizer for AllowList {
    fn is_authorized(&self, sender: &str) -> bool {
        self.senders.contains(sender.trim())
    }
}

/// Authorizer used when the authorization capability is off
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
    fn is_authorized(&self, _sender: &str) -> bool {
        true
    }
}
