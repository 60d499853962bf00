/**
 * HTTP request snapshots.
 *
 * A report can carry the request that was being served when the error
 * occurred. The request object itself belongs to the host application;
 * we only read it through `RequestSource` and flatten it into the wire
 * `RequestData` at assembly time.
 *
 * Two sources ship with the crate:
 * - `http::Request<B>` for anything built on the `http` types.
 * - `RequestInfo`, a plain struct for everything else.
 */
use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

use http::header::{CONTENT_TYPE, HOST};
use http::Method;

use crate::protocol::types::RequestData;

/// Keys mapped to every value they were given, e.g. `?a=1&a=2`.
pub type MultiValueMap = BTreeMap<String, Vec<String>>;

// ---------------------------------------------------------------------------
// RequestSource
// ---------------------------------------------------------------------------

/**
 * Read-only view of an HTTP request.
 *
 * Implementations must be `Send + Sync` because a client (and the
 * request it refers to) may be cloned into other threads.
 */
pub trait RequestSource: Send + Sync {
    fn host(&self) -> String;

    fn url(&self) -> String;

    fn method(&self) -> String;

    /// Address of the remote peer, empty if unknown.
    fn remote_addr(&self) -> String;

    /// Parameters from the URL query.
    fn query(&self) -> MultiValueMap;

    /// Fields of a posted form. Empty for requests without a form body.
    fn form(&self) -> MultiValueMap {
        MultiValueMap::new()
    }

    fn headers(&self) -> MultiValueMap;
}

impl RequestData {
    /**
     * Flattens `request` into its wire representation. Returns an empty
     * snapshot when no request is associated with the report.
     */
    pub fn capture(request: Option<&dyn RequestSource>) -> Self {
        let Some(request) = request else {
            return RequestData::default();
        };

        RequestData {
            host_name: request.host(),
            url: request.url(),
            http_method: request.method(),
            ip_address: request.remote_addr(),
            query_string: flatten(request.query()),
            form: flatten(request.form()),
            headers: flatten(request.headers()),
        }
    }
}

/**
 * Collapses every multi-valued entry into one display string.
 *
 * A single value is used as-is; several values are joined with `"; "`
 * and wrapped in brackets, so `a=[1, 2]` becomes `"a": "[1; 2]"`.
 */
pub fn flatten(map: MultiValueMap) -> BTreeMap<String, String> {
    map.into_iter()
        .map(|(key, values)| {
            let value = match values.as_slice() {
                [] => String::new(),
                [single] => single.clone(),
                many => format!("[{}]", many.join("; ")),
            };
            (key, value)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// RequestInfo: plain data
// ---------------------------------------------------------------------------

/**
 * A request described by plain values, for frameworks that do not use
 * the `http` types.
 *
 * # Example
 * ```ignore
 * let request = RequestInfo {
 *     host: "www.example.com".into(),
 *     url: "http://www.example.com/cart".into(),
 *     method: "POST".into(),
 *     ..Default::default()
 * };
 * client.request(Arc::new(request));
 * ```
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestInfo {
    pub host: String,
    pub url: String,
    pub method: String,
    pub remote_addr: String,
    pub query: MultiValueMap,
    pub form: MultiValueMap,
    pub headers: MultiValueMap,
}

impl RequestSource for RequestInfo {
    fn host(&self) -> String {
        self.host.clone()
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn method(&self) -> String {
        self.method.clone()
    }

    fn remote_addr(&self) -> String {
        self.remote_addr.clone()
    }

    fn query(&self) -> MultiValueMap {
        self.query.clone()
    }

    fn form(&self) -> MultiValueMap {
        self.form.clone()
    }

    fn headers(&self) -> MultiValueMap {
        self.headers.clone()
    }
}

// ---------------------------------------------------------------------------
// http::Request
// ---------------------------------------------------------------------------

/**
 * Reads host, URL, method and headers straight from the request.
 *
 * - The remote address comes from a `SocketAddr` or `IpAddr` request
 *   extension, as inserted by most servers.
 * - The form is parsed from the body only for POST, PUT and PATCH
 *   requests with an `application/x-www-form-urlencoded` content type.
 */
impl<B> RequestSource for http::Request<B>
where
    B: AsRef<[u8]> + Send + Sync,
{
    fn host(&self) -> String {
        self.headers()
            .get(HOST)
            .and_then(|host| host.to_str().ok())
            .map(str::to_string)
            .or_else(|| self.uri().authority().map(|authority| authority.to_string()))
            .unwrap_or_default()
    }

    fn url(&self) -> String {
        self.uri().to_string()
    }

    fn method(&self) -> String {
        http::Request::method(self).as_str().to_string()
    }

    fn remote_addr(&self) -> String {
        let extensions = self.extensions();

        if let Some(addr) = extensions.get::<SocketAddr>() {
            addr.to_string()
        } else if let Some(ip) = extensions.get::<IpAddr>() {
            ip.to_string()
        } else {
            String::new()
        }
    }

    fn query(&self) -> MultiValueMap {
        self.uri()
            .query()
            .map(|query| parse_urlencoded(query.as_bytes()))
            .unwrap_or_default()
    }

    fn form(&self) -> MultiValueMap {
        let method = http::Request::method(self);
        let has_form_method =
            *method == Method::POST || *method == Method::PUT || *method == Method::PATCH;
        let is_form = self
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"));

        if has_form_method && is_form {
            parse_urlencoded(self.body().as_ref())
        } else {
            MultiValueMap::new()
        }
    }

    fn headers(&self) -> MultiValueMap {
        let mut headers = MultiValueMap::new();
        for (name, value) in http::Request::headers(self) {
            headers
                .entry(name.as_str().to_string())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).into_owned());
        }
        headers
    }
}

fn parse_urlencoded(input: &[u8]) -> MultiValueMap {
    let mut map = MultiValueMap::new();
    for (key, value) in url::form_urlencoded::parse(input) {
        map.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    map
}
