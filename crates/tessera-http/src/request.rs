//! The augmented HTTP request.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use bytes::Bytes;
use http::{header, HeaderMap, Method, Uri, Version};
use indexmap::IndexMap;
use serde_json::Value;
use tessera_core::TesseraResult;

use crate::body::{self, BodyLimits};
use crate::field::InputMap;
use crate::ip::{is_intranet_addr, resolve_real_ip};
use crate::upload::FileInput;

/// An HTTP request with buffered body, peer addresses and parsed inputs.
///
/// The query string is parsed on construction. The body is parsed once by
/// [`parse_body`](Self::parse_body); until then only query fields are
/// visible.
///
/// # Example
///
/// ```
/// use tessera_http::Request;
///
/// let request = Request::new(
///     http::Request::get("/search?q=rust&page=2")
///         .header("host", "example.com")
///         .body(bytes::Bytes::new())
///         .unwrap(),
/// );
///
/// assert_eq!(request.path(), "/search");
/// assert_eq!(request.input("q", ""), "rust");
/// assert_eq!(request.full_url(), "//example.com/search?q=rust&page=2");
/// ```
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,
    uri: Uri,
    version: Version,
    headers: HeaderMap,
    body: Bytes,
    remote_addr: SocketAddr,
    local_addr: SocketAddr,
    query: InputMap,
    post: InputMap,
    files: IndexMap<String, FileInput>,
    body_parsed: bool,
}

const DEFAULT_ADDR: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0);

impl Request {
    /// Wraps a buffered request. Peer and local addresses default to
    /// `127.0.0.1:0`.
    #[must_use]
    pub fn new(request: http::Request<Bytes>) -> Self {
        let (parts, body) = request.into_parts();
        let query = parts
            .uri
            .query()
            .map(|query| body::parse_urlencoded(query.as_bytes()))
            .unwrap_or_default();

        Self {
            method: parts.method,
            uri: parts.uri,
            version: parts.version,
            headers: parts.headers,
            body,
            remote_addr: DEFAULT_ADDR,
            local_addr: DEFAULT_ADDR,
            query,
            post: InputMap::new(),
            files: IndexMap::new(),
            body_parsed: false,
        }
    }

    /// Sets the peer address.
    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = addr;
        self
    }

    /// Sets the local address the connection was accepted on.
    #[must_use]
    pub fn with_local_addr(mut self, addr: SocketAddr) -> Self {
        self.local_addr = addr;
        self
    }

    /// Parses the body into POST fields and files.
    ///
    /// Subsequent calls are no-ops.
    pub async fn parse_body(&mut self, limits: &BodyLimits) -> TesseraResult<()> {
        if self.body_parsed {
            return Ok(());
        }
        let parsed = body::parse_body(&self.headers, self.body.clone(), limits).await?;
        self.post = parsed.fields;
        self.files = parsed.files;
        self.body_parsed = true;
        Ok(())
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Returns the path component.
    #[must_use]
    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Returns the raw query string, empty if none.
    #[must_use]
    pub fn query_string(&self) -> &str {
        self.uri.query().unwrap_or("")
    }

    /// Returns the HTTP version.
    #[must_use]
    pub fn version(&self) -> Version {
        self.version
    }

    /// Returns all headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value as a string, `None` if absent or not UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }

    /// Returns the raw body.
    #[must_use]
    pub fn raw_body(&self) -> &Bytes {
        &self.body
    }

    /// Returns the host, from the `Host` header or the URI authority.
    #[must_use]
    pub fn host(&self) -> &str {
        self.header(header::HOST.as_str())
            .or_else(|| self.uri.authority().map(http::uri::Authority::as_str))
            .unwrap_or("")
    }

    /// Returns the host without its port.
    #[must_use]
    pub fn host_without_port(&self) -> &str {
        let host = self.host();
        if let Some(stripped) = host.strip_prefix('[') {
            // [v6]:port
            return stripped.split(']').next().unwrap_or(stripped);
        }
        host.split(':').next().unwrap_or(host)
    }

    /// Returns a cookie value.
    #[must_use]
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }

    /// Returns the peer address.
    #[must_use]
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Returns the peer IP.
    #[must_use]
    pub fn remote_ip(&self) -> IpAddr {
        self.remote_addr.ip()
    }

    /// Returns the peer port.
    #[must_use]
    pub fn remote_port(&self) -> u16 {
        self.remote_addr.port()
    }

    /// Returns the local address.
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the local IP.
    #[must_use]
    pub fn local_ip(&self) -> IpAddr {
        self.local_addr.ip()
    }

    /// Returns the local port.
    #[must_use]
    pub fn local_port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the client address, honouring forwarded headers from
    /// intranet proxies.
    ///
    /// With `safe_mode` on, headers sent by a public peer are ignored.
    #[must_use]
    pub fn real_ip(&self, safe_mode: bool) -> String {
        resolve_real_ip(self.remote_ip(), &self.headers, safe_mode)
    }

    /// Returns `true` if the peer is an intranet address.
    #[must_use]
    pub fn is_intranet(&self) -> bool {
        is_intranet_addr(self.remote_ip())
    }

    /// Returns `true` for XMLHttpRequest calls.
    #[must_use]
    pub fn is_ajax(&self) -> bool {
        self.header("x-requested-with") == Some("XMLHttpRequest")
    }

    /// Returns `true` for pjax calls.
    #[must_use]
    pub fn is_pjax(&self) -> bool {
        self.headers().contains_key("x-pjax")
    }

    /// Returns `true` if the client accepts a JSON response.
    #[must_use]
    pub fn accepts_json(&self) -> bool {
        self.header(header::ACCEPT.as_str())
            .is_some_and(|accept| accept.contains("json"))
    }

    /// Returns `true` if errors should be rendered as JSON for this client.
    #[must_use]
    pub fn expects_json(&self) -> bool {
        (self.is_ajax() && !self.is_pjax()) || self.accepts_json()
    }

    /// Returns `//host/path?query`.
    #[must_use]
    pub fn full_url(&self) -> String {
        let target = self
            .uri
            .path_and_query()
            .map_or_else(|| self.path(), http::uri::PathAndQuery::as_str);
        format!("//{}{}", self.host(), target)
    }

    /// Returns `//host/path`.
    #[must_use]
    pub fn url(&self) -> String {
        format!("//{}{}", self.host(), self.path())
    }

    /// Returns the query fields.
    #[must_use]
    pub fn query(&self) -> &InputMap {
        &self.query
    }

    /// Returns one query field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.query.get(name)
    }

    /// Returns the body fields.
    #[must_use]
    pub fn post_fields(&self) -> &InputMap {
        &self.post
    }

    /// Returns one body field.
    #[must_use]
    pub fn post(&self, name: &str) -> Option<&Value> {
        self.post.get(name)
    }

    /// Looks up a field, body first, then query.
    #[must_use]
    pub fn input_ref(&self, name: &str) -> Option<&Value> {
        self.post.get(name).or_else(|| self.query.get(name))
    }

    /// Looks up a field, body first, then query, then `default`.
    #[must_use]
    pub fn input(&self, name: &str, default: impl Into<Value>) -> Value {
        self.input_ref(name)
            .cloned()
            .unwrap_or_else(|| default.into())
    }

    /// Returns body fields followed by the query fields the body lacks.
    #[must_use]
    pub fn all(&self) -> InputMap {
        let mut all = self.post.clone();
        for (name, value) in &self.query {
            if !all.contains_key(name) {
                all.insert(name.clone(), value.clone());
            }
        }
        all
    }

    /// Returns the requested fields that are present, in `names` order.
    #[must_use]
    pub fn only(&self, names: &[&str]) -> InputMap {
        let all = self.all();
        names
            .iter()
            .filter_map(|name| {
                all.get(*name)
                    .map(|value| ((*name).to_string(), value.clone()))
            })
            .collect()
    }

    /// Returns every field except `names`.
    #[must_use]
    pub fn except(&self, names: &[&str]) -> InputMap {
        let mut all = self.all();
        all.retain(|name, _| !names.contains(&name.as_str()));
        all
    }

    /// Returns the uploads under one root field name.
    #[must_use]
    pub fn file(&self, name: &str) -> Option<&FileInput> {
        self.files.get(name)
    }

    /// Returns every upload group.
    #[must_use]
    pub fn files(&self) -> &IndexMap<String, FileInput> {
        &self.files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(uri: &str) -> http::Request<Bytes> {
        http::Request::get(uri)
            .header("host", "example.com:8080")
            .body(Bytes::new())
            .unwrap()
    }

    async fn form(uri: &str, body: &'static str) -> Request {
        let mut req = Request::new(
            http::Request::post(uri)
                .header("content-type", "application/x-www-form-urlencoded")
                .body(Bytes::from_static(body.as_bytes()))
                .unwrap(),
        );
        req.parse_body(&BodyLimits::default()).await.unwrap();
        req
    }

    #[tokio::test]
    async fn test_input_prefers_body_over_query() {
        let req = form("/save?id=1&page=3", "id=2&name=ann").await;
        assert_eq!(req.input("id", Value::Null), "2");
        assert_eq!(req.input("page", Value::Null), "3");
        assert_eq!(req.input("missing", "dflt"), "dflt");
    }

    #[tokio::test]
    async fn test_all_merges_body_first() {
        let req = form("/save?a=q&b=q", "b=p&c=p").await;
        let all = req.all();
        let keys: Vec<_> = all.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["b", "c", "a"]);
        assert_eq!(all["b"], "p");
        assert_eq!(all["a"], "q");
    }

    #[tokio::test]
    async fn test_only_and_except() {
        let req = form("/save?a=1", "b=2&c=3").await;
        let only = req.only(&["c", "a", "zzz"]);
        assert_eq!(only.keys().collect::<Vec<_>>(), vec!["c", "a"]);
        let except = req.except(&["b"]);
        assert!(!except.contains_key("b"));
        assert_eq!(except.len(), 2);
    }

    #[tokio::test]
    async fn test_parse_body_is_idempotent() {
        let mut req = form("/", "x=1").await;
        req.parse_body(&BodyLimits::default()).await.unwrap();
        assert_eq!(req.post("x"), Some(&json!("1")));
    }

    #[test]
    fn test_query_is_parsed_eagerly() {
        let req = Request::new(request("/list?tags[]=a&tags[]=b"));
        assert_eq!(req.get("tags"), Some(&json!(["a", "b"])));
        assert!(req.post_fields().is_empty());
    }

    #[test]
    fn test_urls() {
        let req = Request::new(request("/a/b?x=1"));
        assert_eq!(req.full_url(), "//example.com:8080/a/b?x=1");
        assert_eq!(req.url(), "//example.com:8080/a/b");
        assert_eq!(req.host_without_port(), "example.com");
    }

    #[test]
    fn test_ipv6_host_without_port() {
        let req = Request::new(
            http::Request::get("/")
                .header("host", "[::1]:8080")
                .body(Bytes::new())
                .unwrap(),
        );
        assert_eq!(req.host_without_port(), "::1");
    }

    #[test]
    fn test_expects_json() {
        let ajax = Request::new(
            http::Request::get("/")
                .header("x-requested-with", "XMLHttpRequest")
                .body(Bytes::new())
                .unwrap(),
        );
        assert!(ajax.expects_json());

        let pjax = Request::new(
            http::Request::get("/")
                .header("x-requested-with", "XMLHttpRequest")
                .header("x-pjax", "true")
                .body(Bytes::new())
                .unwrap(),
        );
        assert!(!pjax.expects_json());

        let accept = Request::new(
            http::Request::get("/")
                .header("accept", "application/json, text/plain")
                .body(Bytes::new())
                .unwrap(),
        );
        assert!(accept.expects_json());

        assert!(!Request::new(request("/")).expects_json());
    }

    #[test]
    fn test_empty_pjax_header_still_counts() {
        let pjax = Request::new(
            http::Request::get("/")
                .header("x-requested-with", "XMLHttpRequest")
                .header("x-pjax", "")
                .body(Bytes::new())
                .unwrap(),
        );
        assert!(pjax.is_pjax());
        assert!(!pjax.expects_json());
    }

    #[test]
    fn test_cookie() {
        let req = Request::new(
            http::Request::get("/")
                .header("cookie", "a=1; session=abc")
                .body(Bytes::new())
                .unwrap(),
        );
        assert_eq!(req.cookie("session"), Some("abc"));
        assert_eq!(req.cookie("nope"), None);
    }

    #[test]
    fn test_real_ip_uses_peer() {
        let req = Request::new(
            http::Request::get("/")
                .header("x-real-ip", "9.9.9.9")
                .body(Bytes::new())
                .unwrap(),
        )
        .with_remote_addr("10.1.1.1:5000".parse().unwrap());
        assert!(req.is_intranet());
        assert_eq!(req.real_ip(true), "9.9.9.9");

        let public = req.clone().with_remote_addr("8.8.4.4:5000".parse().unwrap());
        assert_eq!(public.real_ip(true), "8.8.4.4");
    }
}
