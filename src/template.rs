//! Path template compiler.
//!
//! A template such as `/api/{instance_id}/task/{task_id}?<verbose>&<limit>`
//! declares three things:
//!
//! - literal segments (`api`, `task`), the *service name* of the operation
//! - `{name}` placeholders, bound to path segments in order
//! - `<name>` placeholders, bound to query arguments by name
//!
//! Compilation happens once at registration. Any template that cannot be
//! served is a [`ConfigError`], never a request-time surprise.

use std::collections::HashSet;

use crate::error::ConfigError;

/// A compiled path template.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PathTemplate {
    raw: String,
    service_name: Vec<String>,
    path_params: Vec<String>,
    query_params: Vec<String>,
    pattern: String,
}

impl PathTemplate {
    pub fn compile(raw: &str) -> Result<Self, ConfigError> {
        let mut path = String::with_capacity(raw.len());
        let mut query_params = Vec::new();
        let mut chars = raw.chars();

        // Fold `<name>` annotations and their `?` / `&` glue out of the path.
        while let Some(c) = chars.next() {
            match c {
                '<' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('>') => break,
                            Some(c @ ('<' | '{' | '}' | '/')) => {
                                return Err(ConfigError::template(
                                    raw,
                                    format!("unexpected `{c}` inside `<...>`"),
                                ));
                            }
                            Some(c) => name.push(c),
                            None => return Err(ConfigError::template(raw, "unclosed `<`")),
                        }
                    }
                    query_params.push(checked_name(raw, name)?);
                }
                '>' => return Err(ConfigError::template(raw, "unbalanced `>`")),
                '?' | '&' => {}
                c => path.push(c),
            }
        }

        let mut service_name = Vec::new();
        let mut path_params = Vec::new();
        let mut pattern_segments = Vec::new();

        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if let Some(inner) = segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                if inner.contains(['{', '}']) {
                    return Err(ConfigError::template(raw, format!("nested braces in `{segment}`")));
                }
                pattern_segments.push(format!("{{p{}}}", path_params.len()));
                path_params.push(checked_name(raw, inner.to_owned())?);
            } else if segment.contains(['{', '}']) {
                return Err(ConfigError::template(
                    raw,
                    format!("segment `{segment}` must be a literal or a whole `{{name}}`"),
                ));
            } else {
                pattern_segments.push(segment.to_owned());
                service_name.push(segment.to_owned());
            }
        }

        let mut seen = HashSet::new();
        if let Some(dup) = path_params.iter().chain(&query_params).find(|n| !seen.insert(*n)) {
            return Err(ConfigError::template(raw, format!("parameter `{dup}` declared twice")));
        }

        Ok(Self {
            raw: raw.to_owned(),
            service_name,
            path_params,
            query_params,
            pattern: format!("/{}", pattern_segments.join("/")),
        })
    }

    /// The template exactly as declared.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn service_name(&self) -> &[String] {
        &self.service_name
    }

    pub fn path_params(&self) -> &[String] {
        &self.path_params
    }

    pub fn query_params(&self) -> &[String] {
        &self.query_params
    }

    /// Router pattern: `{name}` becomes a positional wildcard, `<name>` is gone.
    ///
    /// `/customer/{id}?<verbose>` normalizes to `/customer/{p0}`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// True when every literal of the service name appears among `segments`
    /// and the segment count is exactly literals plus path parameters.
    pub fn matches(&self, segments: &[&str]) -> bool {
        self.service_name.len() + self.path_params.len() == segments.len()
            && self.service_name.iter().all(|lit| segments.contains(&lit.as_str()))
    }

    /// Raw path-parameter values: the segments that are not a literal of the
    /// service name, left to right.
    pub fn path_values<'a>(&self, segments: &[&'a str]) -> Vec<&'a str> {
        segments
            .iter()
            .copied()
            .filter(|s| !s.is_empty() && !self.service_name.iter().any(|lit| lit == s))
            .collect()
    }
}

/// Non-empty path segments of a request path, query string removed.
pub fn segments(path: &str) -> Vec<&str> {
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    path.split('/').filter(|s| !s.is_empty()).collect()
}

fn checked_name(raw: &str, name: String) -> Result<String, ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::template(raw, "empty placeholder"));
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(ConfigError::template(raw, format!("invalid parameter name `{name}`")));
    }
    Ok(name)
}
