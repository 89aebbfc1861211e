//! Route parameters captured by `{name}` and `{name:*}` segments.

use smallvec::SmallVec;

/// Most routes capture one or two segments.
const INLINE: usize = 4;

/// Captured path parameters, in the order their segments appear.
///
/// Controllers reading parameters positionally rely on that order, so a
/// name captured twice keeps both entries and [`get`](Self::get) returns the
/// first.
///
/// # Example
///
/// ```rust
/// use tessera_router::Params;
///
/// let params: Params = [("shop", "acme"), ("sku", "A-1")].into_iter().collect();
///
/// assert_eq!(params.get("sku"), Some("A-1"));
/// assert_eq!(params.values().collect::<Vec<_>>(), vec!["acme", "A-1"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Params {
    captured: SmallVec<[(String, String); INLINE]>,
}

impl Params {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a capture.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.captured.push((name.into(), value.into()));
    }

    /// Returns the first value captured under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter()
            .find_map(|(captured, value)| (captured == name).then_some(value))
    }

    /// Returns `true` if `name` was captured.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the captured values without their names.
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.captured.iter().map(|(_, value)| value.as_str())
    }

    /// Returns `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.captured
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.captured.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.captured.is_empty()
    }

    /// Backtracks to a previous [`len`](Self::len).
    pub(crate) fn truncate(&mut self, len: usize) {
        self.captured.truncate(len);
    }
}

impl<N, V> FromIterator<(N, V)> for Params
where
    N: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.push(name, value);
        }
        params
    }
}
