//! Mapping from one logical queue to its fixed set of store keys.

/// Default prefix placed in front of every queue name.
pub const DEFAULT_NAMESPACE: &str = "queuify:queue";

/// Store keys owned by a single queue.
///
/// A queue named `Q` under namespace `N` lives at `N:Q` (the item list) with
/// `N:Q:sem` for capacity tokens, `N:Q:unfinished` for the unfinished-task
/// counter and `N:Q:join` as the join notification channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeySpace {
    name: String,
    queue: String,
    semaphore: String,
    unfinished: String,
    join_channel: String,
}

impl KeySpace {
    /// Build the key set for `name` under the default namespace.
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_namespace(DEFAULT_NAMESPACE, name)
    }

    /// Build the key set for `name` under `namespace`. An empty namespace
    /// uses the bare name as the queue key.
    pub fn with_namespace(namespace: &str, name: impl Into<String>) -> Self {
        let name = name.into();
        let queue = if namespace.is_empty() {
            name.clone()
        } else {
            format!("{namespace}:{name}")
        };
        Self {
            semaphore: format!("{queue}:sem"),
            unfinished: format!("{queue}:unfinished"),
            join_channel: format!("{queue}:join"),
            queue,
            name,
        }
    }

    /// Logical queue name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Item list key.
    pub fn queue(&self) -> &str {
        &self.queue
    }

    /// Semaphore token list key.
    pub fn semaphore(&self) -> &str {
        &self.semaphore
    }

    /// Unfinished-task counter key.
    pub fn unfinished(&self) -> &str {
        &self.unfinished
    }

    /// Join notification channel.
    pub fn join_channel(&self) -> &str {
        &self.join_channel
    }

    /// Every persisted key, for deletion. The join channel holds no state.
    pub fn persisted(&self) -> [&str; 3] {
        [&self.queue, &self.semaphore, &self.unfinished]
    }
}
