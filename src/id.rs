//! Pluggable outbound request id generation.

use std::sync::Arc;

use crate::message::RequestId;

/// Produces unique ids for outbound requests. The default renders a random
/// UUID-v4 as a string; tests inject a deterministic generator. The endpoint
/// never interprets id contents beyond equality.
pub type IdGenerator = Arc<dyn Fn() -> RequestId + Send + Sync>;

pub fn default_id_generator() -> IdGenerator {
    Arc::new(|| RequestId::String(uuid::Uuid::new_v4().to_string()))
}

/// Builds a generator that always returns the ids of `ids`, in order, looping
/// once exhausted. Handy for deterministic tests (see `Endpoint` tests).
pub fn sequence_id_generator(ids: Vec<&'static str>) -> IdGenerator {
    use std::sync::atomic::{AtomicUsize, Ordering};
    let counter = AtomicUsize::new(0);
    Arc::new(move || {
        let i = counter.fetch_add(1, Ordering::SeqCst) % ids.len();
        RequestId::String(ids[i].to_string())
    })
}
