//! Route descriptors and reverse URL generation.

use http::Method;

/// The handler a route dispatches to, addressed through the plugin namespace.
///
/// `plugin` is empty for routes owned by the host application.
///
/// # Example
///
/// ```rust
/// use tessera_router::RouteTarget;
///
/// let target = RouteTarget::new("admin", "index", "index");
/// assert_eq!(target.plugin, "");
///
/// let shop = RouteTarget::new("api", "cart", "show").in_plugin("shop");
/// assert_eq!(shop.plugin, "shop");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteTarget {
    /// Owning plugin, empty for the host.
    pub plugin: String,
    /// Application inside the plugin, empty for app-less controllers.
    pub app: String,
    /// Controller name.
    pub controller: String,
    /// Action name.
    pub action: String,
}

impl RouteTarget {
    /// Creates a host-owned target.
    #[must_use]
    pub fn new(
        app: impl Into<String>,
        controller: impl Into<String>,
        action: impl Into<String>,
    ) -> Self {
        Self {
            plugin: String::new(),
            app: app.into(),
            controller: controller.into(),
            action: action.into(),
        }
    }

    /// Moves the target into `plugin`.
    #[must_use]
    pub fn in_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = plugin.into();
        self
    }
}

impl std::fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.plugin.is_empty() {
            write!(f, "{}/{}@{}", self.app, self.controller, self.action)
        } else {
            write!(
                f,
                "plugin.{}/{}/{}@{}",
                self.plugin, self.app, self.controller, self.action
            )
        }
    }
}

/// Parameters for reverse URL generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlParams {
    /// Values consumed in placeholder order.
    Positional(Vec<String>),
    /// Values looked up by placeholder name.
    Named(Vec<(String, String)>),
}

impl UrlParams {
    /// No parameters.
    #[must_use]
    pub fn none() -> Self {
        Self::Positional(Vec::new())
    }

    /// Builds positional parameters.
    pub fn positional<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Positional(values.into_iter().map(Into::into).collect())
    }

    /// Builds named parameters.
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Named(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl Default for UrlParams {
    fn default() -> Self {
        Self::none()
    }
}

/// A registered route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub(crate) name: Option<String>,
    pub(crate) path: String,
    pub(crate) methods: Vec<Method>,
    pub(crate) target: RouteTarget,
}

impl Route {
    /// Returns the route name, if one was assigned.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns the full path pattern, including group prefixes.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the methods this route answers. Empty means any method.
    #[must_use]
    pub fn methods(&self) -> &[Method] {
        &self.methods
    }

    /// Returns the dispatch target.
    #[must_use]
    pub fn target(&self) -> &RouteTarget {
        &self.target
    }

    /// Generates a URL by filling `{param}` and `*wildcard` placeholders.
    ///
    /// Placeholders without a matching value are left untouched.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tessera_router::{Router, RouteTarget, UrlParams};
    ///
    /// let router = Router::builder()
    ///     .get("/blog/{year}/{slug}", RouteTarget::new("blog", "post", "show"))
    ///     .name("blog.post")
    ///     .build()
    ///     .unwrap();
    ///
    /// let route = router.by_name("blog.post").unwrap();
    /// assert_eq!(route.url(&UrlParams::positional(["2024", "hello"])), "/blog/2024/hello");
    /// assert_eq!(route.url(&UrlParams::named([("slug", "x")])), "/blog/{year}/x");
    /// ```
    #[must_use]
    pub fn url(&self, params: &UrlParams) -> String {
        let no_values: &[String] = &[];
        let mut positional = match params {
            UrlParams::Positional(values) => values.iter(),
            UrlParams::Named(_) => no_values.iter(),
        };

        let segments: Vec<String> = self
            .path
            .split('/')
            .map(|segment| {
                let name = segment
                    .strip_prefix('{')
                    .and_then(|s| s.strip_suffix('}'))
                    .or_else(|| segment.strip_prefix('*'));
                let Some(name) = name else {
                    return segment.to_string();
                };
                let value = match params {
                    UrlParams::Positional(_) => positional.next().cloned(),
                    UrlParams::Named(pairs) => pairs
                        .iter()
                        .find(|(k, _)| k == name)
                        .map(|(_, v)| v.clone()),
                };
                value.unwrap_or_else(|| segment.to_string())
            })
            .collect();

        segments.join("/")
    }
}
