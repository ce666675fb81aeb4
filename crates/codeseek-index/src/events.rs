//! Observe-only listeners for indexing and retrieval activity.

use std::sync::Arc;

/// Something the orchestrators just did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndexEvent<'a> {
    /// Existing chunks of a file were removed ahead of reindexing.
    FileCleared { file_path: &'a str, removed: usize },
    /// A file's chunks were embedded and stored.
    FileIndexed { file_path: &'a str, chunks: usize },
    SearchCompleted { query: &'a str, results: usize },
    ContextBuilt {
        query: &'a str,
        blocks: usize,
        chars: usize,
    },
}

/// Receives [`IndexEvent`]s synchronously, in registration order.
///
/// A returned error is logged and dropped; it never fails the operation being observed.
pub trait IndexListener: Send + Sync {
    /// # Errors
    ///
    /// Any error is reported at `warn` level and otherwise ignored.
    fn on_event(&self, event: &IndexEvent<'_>) -> anyhow::Result<()>;
}

/// Ordered listener list shared by the orchestrators.
#[derive(Clone, Default)]
pub(crate) struct Listeners(Vec<Arc<dyn IndexListener>>);

impl Listeners {
    pub(crate) fn push(&mut self, listener: Arc<dyn IndexListener>) {
        self.0.push(listener);
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn notify(&self, event: &IndexEvent<'_>) {
        for listener in &self.0 {
            if let Err(e) = listener.on_event(event) {
                tracing::warn!(?event, "index listener failed: {e:#}");
            }
        }
    }
}

impl std::fmt::Debug for Listeners {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Listeners")
            .field("count", &self.0.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    struct Recorder {
        tag: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl IndexListener for Recorder {
        fn on_event(&self, event: &IndexEvent<'_>) -> anyhow::Result<()> {
            self.log.lock().unwrap().push(format!("{}:{event:?}", self.tag));
            if self.fail {
                anyhow::bail!("{} refused", self.tag);
            }
            Ok(())
        }
    }

    #[test]
    fn notifies_in_registration_order_despite_failures() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut listeners = Listeners::default();
        for (tag, fail) in [("first", true), ("second", false)] {
            listeners.push(Arc::new(Recorder {
                tag,
                log: Arc::clone(&log),
                fail,
            }));
        }

        listeners.notify(&IndexEvent::FileIndexed {
            file_path: "a.rs",
            chunks: 2,
        });

        let log = log.lock().unwrap();
        assert_eq!(log.len(), 2);
        assert!(log[0].starts_with("first:FileIndexed"));
        assert!(log[1].starts_with("second:FileIndexed"));
    }

    #[test]
    fn empty_list_is_noop() {
        let listeners = Listeners::default();
        assert_eq!(listeners.len(), 0);
        listeners.notify(&IndexEvent::SearchCompleted {
            query: "q",
            results: 0,
        });
        assert!(format!("{listeners:?}").contains("count: 0"));
    }
}
