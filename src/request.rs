//! Incoming HTTP request type.

use url::form_urlencoded;

use crate::method::Method;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// An incoming HTTP request, as the dispatcher sees it.
///
/// Arguments are the query string pairs followed by the pairs of a
/// form-urlencoded body, both percent-decoded with `+` read as a space.
#[derive(Clone, Debug)]
pub struct Request {
    method: Method,
    path: String,
    query: Option<String>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
    arguments: Vec<(String, String)>,
}

impl Request {
    /// Builds a request from its parts. `target` is the request target,
    /// path plus optional query string (`/customer/42?verbose=true`).
    pub fn new(
        method: Method,
        target: &str,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
    ) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((p, q)) => (p.to_owned(), Some(q.to_owned())),
            None => (target.to_owned(), None),
        };

        let mut arguments: Vec<(String, String)> = query
            .as_deref()
            .map(|q| form_urlencoded::parse(q.as_bytes()).into_owned().collect())
            .unwrap_or_default();

        let is_form = headers.iter().any(|(k, v)| {
            k.eq_ignore_ascii_case("content-type")
                && v.split(';').next().is_some_and(|t| t.trim().eq_ignore_ascii_case(FORM_URLENCODED))
        });
        if is_form {
            arguments.extend(form_urlencoded::parse(&body).into_owned());
        }

        Self { method, path, query, headers, body, arguments }
    }

    pub fn method(&self) -> Method { self.method }
    pub fn path(&self) -> &str { &self.path }
    pub fn query(&self) -> Option<&str> { self.query.as_deref() }
    pub fn headers(&self) -> &[(String, String)] { &self.headers }
    pub fn body(&self) -> &[u8] { &self.body }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// All query and form arguments, in arrival order.
    pub fn arguments(&self) -> &[(String, String)] {
        &self.arguments
    }

    /// Returns the last value given for `name`.
    pub fn argument(&self, name: &str) -> Option<&str> {
        self.arguments.iter()
            .rev()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> Vec<(String, String)> {
        vec![("Content-Type".into(), "application/x-www-form-urlencoded".into())]
    }

    #[test]
    fn splits_path_and_query() {
        let req = Request::new(Method::Get, "/customer/42?verbose=true", vec![], vec![]);
        assert_eq!(req.path(), "/customer/42");
        assert_eq!(req.query(), Some("verbose=true"));
        assert_eq!(req.argument("verbose"), Some("true"));
    }

    #[test]
    fn decodes_form_body() {
        let req = Request::new(
            Method::Put,
            "/customer/42",
            form(),
            b"name_customer=Bob&address_customer=Main+St".to_vec(),
        );
        assert_eq!(req.argument("name_customer"), Some("Bob"));
        assert_eq!(req.argument("address_customer"), Some("Main St"));
        assert_eq!(req.header("content-type"), Some("application/x-www-form-urlencoded"));
    }

    #[test]
    fn ignores_non_form_body() {
        let req = Request::new(Method::Post, "/customer", vec![], b"name=Bob".to_vec());
        assert!(req.arguments().is_empty());
    }

    #[test]
    fn last_value_wins() {
        let req = Request::new(Method::Post, "/c?name=a", form(), b"name=b".to_vec());
        assert_eq!(req.argument("name"), Some("b"));
        assert_eq!(req.arguments().len(), 2);
    }
}
