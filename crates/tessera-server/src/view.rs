//! Template rendering.
//!
//! [`RawView`] reads plain template files and substitutes `{{ name }}`
//! placeholders. Values are inserted verbatim, without escaping.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};
use tessera_core::{RequestContext, TesseraError, TesseraResult};
use tessera_http::{response, Response};

/// Renders a named template with variables.
pub trait ViewRenderer: Send + Sync {
    /// Renders `template` for `app` inside `plugin`.
    ///
    /// # Errors
    ///
    /// Returns a file error when the template is missing or unreadable.
    fn render(
        &self,
        template: &str,
        vars: &Map<String, Value>,
        app: Option<&str>,
        plugin: Option<&str>,
    ) -> TesseraResult<String>;
}

/// File-based renderer with `{{ name }}` placeholders.
///
/// Templates resolve to `{root}/view/{template}.{suffix}` without an app
/// and `{root}/{app}/view/{template}.{suffix}` with one. Plugins use their
/// own root.
#[derive(Debug, Clone)]
pub struct RawView {
    root: PathBuf,
    plugin_roots: HashMap<String, PathBuf>,
    suffix: String,
}

impl RawView {
    /// Creates a renderer for the host view root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            plugin_roots: HashMap::new(),
            suffix: "html".to_string(),
        }
    }

    /// Sets the template file extension.
    #[must_use]
    pub fn suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    /// Adds the view root of a plugin.
    #[must_use]
    pub fn plugin_root(mut self, plugin: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        self.plugin_roots.insert(plugin.into(), root.into());
        self
    }

    /// Returns the file a template resolves to.
    ///
    /// # Errors
    ///
    /// Fails for an unknown plugin.
    pub fn template_path(
        &self,
        template: &str,
        app: Option<&str>,
        plugin: Option<&str>,
    ) -> TesseraResult<PathBuf> {
        let root: &Path = match plugin.filter(|p| !p.is_empty()) {
            Some(plugin) => self
                .plugin_roots
                .get(plugin)
                .ok_or_else(|| TesseraError::not_found(format!("plugin {plugin} has no view root")))?,
            None => &self.root,
        };
        let file = format!("{template}.{}", self.suffix);
        Ok(match app.filter(|a| !a.is_empty()) {
            Some(app) => root.join(app).join("view").join(file),
            None => root.join("view").join(file),
        })
    }
}

impl ViewRenderer for RawView {
    fn render(
        &self,
        template: &str,
        vars: &Map<String, Value>,
        app: Option<&str>,
        plugin: Option<&str>,
    ) -> TesseraResult<String> {
        let path = self.template_path(template, app, plugin)?;
        let source = std::fs::read_to_string(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                TesseraError::file_not_found(path.display())
            } else {
                TesseraError::file(path.display(), e)
            }
        })?;
        Ok(substitute(&source, vars))
    }
}

/// Replaces `{{ name }}` placeholders. Unknown names are left intact.
pub fn substitute(source: &str, vars: &Map<String, Value>) -> String {
    let mut out = String::with_capacity(source.len());
    let mut rest = source;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            rest = &rest[start..];
            break;
        };
        let placeholder = &rest[start..start + 2 + end + 2];
        match vars.get(after[..end].trim()) {
            Some(Value::String(s)) => out.push_str(s),
            Some(value) => out.push_str(&value.to_string()),
            None => out.push_str(placeholder),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// A renderer bound to the variables assigned during the request.
#[derive(Clone)]
pub struct ViewHandle {
    renderer: Arc<dyn ViewRenderer>,
}

impl ViewHandle {
    /// Wraps `renderer`.
    pub fn new(renderer: Arc<dyn ViewRenderer>) -> Self {
        Self { renderer }
    }

    /// Renders `template` in the context's namespace as an HTML response.
    /// `vars` override what was assigned on the context.
    ///
    /// # Errors
    ///
    /// Propagates renderer failures.
    pub fn view(
        &self,
        ctx: &RequestContext,
        template: &str,
        vars: Map<String, Value>,
    ) -> TesseraResult<Response> {
        let mut merged = ctx.view_vars().clone();
        merged.extend(vars);
        let body = self
            .renderer
            .render(template, &merged, Some(ctx.app()), Some(ctx.plugin()))?;
        Ok(response::html(body))
    }
}

impl std::fmt::Debug for ViewHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ViewHandle")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_substitute() {
        let out = substitute(
            "Hi {{ name }}, you have {{count}} items. {{ missing }} {{",
            &vars(json!({"name": "Ada", "count": 3})),
        );
        assert_eq!(out, "Hi Ada, you have 3 items. {{ missing }} {{");
    }

    #[test]
    fn test_template_paths() {
        let view = RawView::new("/srv/app").suffix("tpl").plugin_root("shop", "/srv/plugin/shop/app");

        assert_eq!(
            view.template_path("index", None, None).unwrap(),
            PathBuf::from("/srv/app/view/index.tpl")
        );
        assert_eq!(
            view.template_path("index", Some("admin"), Some("")).unwrap(),
            PathBuf::from("/srv/app/admin/view/index.tpl")
        );
        assert_eq!(
            view.template_path("cart", Some("api"), Some("shop")).unwrap(),
            PathBuf::from("/srv/plugin/shop/app/api/view/cart.tpl")
        );
        assert!(view.template_path("x", None, Some("blog")).is_err());
    }

    #[test]
    fn test_render_missing_template() {
        let dir = tempfile::tempdir().unwrap();
        let err = RawView::new(dir.path())
            .render("nope", &Map::new(), None, None)
            .unwrap_err();
        assert_eq!(err.code(), 404);
    }

    #[tokio::test]
    async fn test_view_merges_context_vars() {
        use http_body_util::BodyExt;

        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("admin/view")).unwrap();
        std::fs::write(dir.path().join("admin/view/index.html"), "{{ title }}: {{ user }}").unwrap();

        let handle = ViewHandle::new(Arc::new(RawView::new(dir.path())));
        let mut ctx = RequestContext::new().with_namespace("", "admin");
        ctx.assign("title", "Dashboard");
        ctx.assign("user", "guest");

        let response = handle
            .view(&ctx, "index", vars(json!({"user": "ada"})))
            .unwrap();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"Dashboard: ada");
    }
}
