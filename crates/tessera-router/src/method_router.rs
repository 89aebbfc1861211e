//! Per-path method table.
//!
//! A [`MethodRouter`] lives on every radix tree node that terminates a route
//! and maps HTTP methods to indices into the router's route list.

use http::Method;
use smallvec::SmallVec;

/// Maps HTTP methods to route indices for a single path.
///
/// Lookup order is: exact method, then `GET` for `HEAD` requests, then the
/// route registered for any method.
///
/// # Example
///
/// ```rust
/// use tessera_router::MethodRouter;
/// use http::Method;
///
/// let mut methods = MethodRouter::new();
/// methods.insert(Method::GET, 0);
/// methods.insert_any(1);
///
/// assert_eq!(methods.route_for(&Method::GET), Some(0));
/// assert_eq!(methods.route_for(&Method::HEAD), Some(0));
/// assert_eq!(methods.route_for(&Method::DELETE), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MethodRouter {
    routes: SmallVec<[(Method, usize); 4]>,
    any: Option<usize>,
}

impl MethodRouter {
    /// Creates a new empty method router.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `route` for `method`.
    ///
    /// The first registration for a method wins; later ones are ignored.
    pub fn insert(&mut self, method: Method, route: usize) {
        if !self.routes.iter().any(|(m, _)| *m == method) {
            self.routes.push((method, route));
        }
    }

    /// Registers `route` as the fallback for every method.
    pub fn insert_any(&mut self, route: usize) {
        if self.any.is_none() {
            self.any = Some(route);
        }
    }

    /// Returns the route index registered for `method`.
    #[must_use]
    pub fn route_for(&self, method: &Method) -> Option<usize> {
        self.exact(method)
            .or_else(|| {
                if *method == Method::HEAD {
                    self.exact(&Method::GET)
                } else {
                    None
                }
            })
            .or(self.any)
    }

    /// Returns the explicitly registered methods, in registration order.
    #[must_use]
    pub fn allowed_methods(&self) -> Vec<Method> {
        self.routes.iter().map(|(m, _)| m.clone()).collect()
    }

    /// Returns `true` if a fallback route accepts every method.
    #[must_use]
    pub fn accepts_any(&self) -> bool {
        self.any.is_some()
    }

    fn exact(&self, method: &Method) -> Option<usize> {
        self.routes
            .iter()
            .find(|(m, _)| m == method)
            .map(|(_, idx)| *idx)
    }
}
