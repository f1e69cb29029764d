/// Namespaced address of a short-lived cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CacheKey<'a> {
    pub(crate) namespace: &'static str,
    pub(crate) id: &'a str,
}

impl<'a> CacheKey<'a> {
    pub(crate) fn new(namespace: &'static str, id: &'a str) -> Self {
        Self { namespace, id }
    }

    /// Flat key used by the backends
    pub(crate) fn render(&self) -> String {
        format!("wishlist:{}:{}", self.namespace, self.id)
    }
}
