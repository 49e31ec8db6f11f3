//! Path template normalization and compilation.
//!
//! A template is a path whose segments are literal text or a `{name}`
//! variable token. Compiling a template produces an anchored regular
//! expression in which every token is replaced by a capture over one path
//! segment (`[^/]+`), plus the ordered list of variable names so capture
//! group *i* can be bound to variable *i*. Request paths are percent-decoded
//! before they are matched.

use std::borrow::Cow;
use std::fmt;

use percent_encoding::percent_decode_str;
use regex::Regex;

use crate::params::Params;

/// Capture group substituted for every `{name}` token.
const SEGMENT_CAPTURE: &str = "([^/]+)";

/// Errors produced while compiling a path template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TemplateError {
    /// A `{}` token without a name.
    #[error("path template '{template}' contains an empty variable token")]
    EmptyVariable {
        /// The offending template.
        template: String,
    },

    /// A `{` without a matching `}` or the reverse.
    #[error("path template '{template}' has unbalanced braces")]
    Unbalanced {
        /// The offending template.
        template: String,
    },

    /// More than one variable token inside a single segment.
    #[error("path template '{template}' has more than one variable in segment '{segment}'")]
    MultipleVariablesInSegment {
        /// The offending template.
        template: String,
        /// The segment holding several tokens.
        segment: String,
    },

    /// The same variable name appears twice.
    #[error("path template '{template}' repeats variable '{{{name}}}'")]
    RepeatedVariable {
        /// The offending template.
        template: String,
        /// The repeated name.
        name: String,
    },

    /// The generated matcher was rejected by the regex engine.
    #[error("path template '{template}' cannot be compiled: {reason}")]
    Pattern {
        /// The offending template.
        template: String,
        /// Regex engine diagnostic.
        reason: String,
    },
}

/// Normalizes one mapping path.
///
/// Blank input becomes the empty string. Anything else is trimmed, gets a
/// single leading `/`, and loses one trailing `/` unless it is the root.
///
/// ```rust
/// use heron_router::template::normalize;
///
/// assert_eq!(normalize(""), "");
/// assert_eq!(normalize("items/"), "/items");
/// assert_eq!(normalize(" /items/{id} "), "/items/{id}");
/// assert_eq!(normalize("/"), "/");
/// ```
#[must_use]
pub fn normalize(path: &str) -> String {
    let trimmed = path.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    let mut result = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };

    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }
    result
}

/// Joins a base path and a method path into a full route template.
///
/// Both halves are normalized first. A template that ends up empty, or that
/// is a base followed by the root, collapses to the bare root or base.
///
/// ```rust
/// use heron_router::template::join;
///
/// assert_eq!(join("/items", "/{id}"), "/items/{id}");
/// assert_eq!(join("items/", ""), "/items");
/// assert_eq!(join("", ""), "/");
/// assert_eq!(join("/items", "/"), "/items");
/// ```
#[must_use]
pub fn join(base: &str, path: &str) -> String {
    let base = normalize(base);
    let path = normalize(path);

    match (base.as_str(), path.as_str()) {
        ("" | "/", "") | ("", "/") => "/".to_string(),
        (_, "" | "/") => base,
        ("" | "/", _) => path,
        _ => format!("{base}{path}"),
    }
}

/// A compiled path template.
///
/// # Example
///
/// ```rust
/// use heron_router::PathTemplate;
///
/// let template = PathTemplate::parse("/orgs/{org}/users/{id}").unwrap();
/// assert_eq!(template.variables(), ["org", "id"]);
///
/// let params = template.captures("/orgs/acme/users/42").unwrap();
/// assert_eq!(params.get("org"), Some("acme"));
/// assert_eq!(params.get("id"), Some("42"));
///
/// assert!(template.captures("/orgs/acme/users").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct PathTemplate {
    raw: String,
    variables: Vec<String>,
    matcher: Regex,
}

impl PathTemplate {
    /// Compiles a template.
    pub fn parse(raw: impl Into<String>) -> Result<Self, TemplateError> {
        let raw = raw.into();
        let mut variables = Vec::new();
        let mut pattern = String::with_capacity(raw.len() + 8);
        pattern.push('^');

        for (i, segment) in raw.split('/').enumerate() {
            if i > 0 {
                pattern.push('/');
            }
            pattern.push_str(&segment_pattern(&raw, segment, &mut variables)?);
        }
        pattern.push('$');

        let matcher = Regex::new(&pattern).map_err(|e| TemplateError::Pattern {
            template: raw.clone(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            raw,
            variables,
            matcher,
        })
    }

    /// Returns the template text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Returns variable names in left-to-right order.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Returns `true` if the template has no variable tokens.
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.variables.is_empty()
    }

    /// Matches a concrete request path against the whole template.
    ///
    /// The path is percent-decoded before matching, so an encoded `/` splits
    /// segments like a literal one and never lands inside a capture.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Params> {
        self.captures_decoded(&decode_path(path))
    }

    /// Matches a path that has already gone through [`decode_path`].
    pub(crate) fn captures_decoded(&self, path: &str) -> Option<Params> {
        let captures = self.matcher.captures(path)?;
        let mut params = Params::with_capacity(self.variables.len());

        for (i, name) in self.variables.iter().enumerate() {
            let value = captures.get(i + 1).map_or("", |m| m.as_str());
            params.push(name.clone(), value.to_string());
        }

        Some(params)
    }
}

/// Percent-decodes a request path.
///
/// A path that does not decode to UTF-8 is returned unchanged.
///
/// ```rust
/// use heron_router::template::decode_path;
///
/// assert_eq!(decode_path("/users/jane%20doe"), "/users/jane doe");
/// assert_eq!(decode_path("/items/a%2Fb"), "/items/a/b");
/// assert_eq!(decode_path("/raw/%FF"), "/raw/%FF");
/// ```
#[must_use]
pub fn decode_path(path: &str) -> Cow<'_, str> {
    percent_decode_str(path)
        .decode_utf8()
        .unwrap_or(Cow::Borrowed(path))
}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl PartialEq for PathTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for PathTemplate {}

/// Builds the regex fragment for one segment, recording its variable.
fn segment_pattern(
    template: &str,
    segment: &str,
    variables: &mut Vec<String>,
) -> Result<String, TemplateError> {
    let unbalanced = || TemplateError::Unbalanced {
        template: template.to_string(),
    };

    let mut out = String::new();
    let mut rest = segment;
    let mut has_variable = false;

    loop {
        let Some(open) = rest.find('{') else {
            if rest.contains('}') {
                return Err(unbalanced());
            }
            out.push_str(&regex::escape(rest));
            return Ok(out);
        };

        let (literal, token) = rest.split_at(open);
        if literal.contains('}') {
            return Err(unbalanced());
        }
        out.push_str(&regex::escape(literal));

        let close = token.find('}').ok_or_else(unbalanced)?;
        let name = &token[1..close];
        if name.contains('{') {
            return Err(unbalanced());
        }
        if name.is_empty() {
            return Err(TemplateError::EmptyVariable {
                template: template.to_string(),
            });
        }
        if has_variable {
            return Err(TemplateError::MultipleVariablesInSegment {
                template: template.to_string(),
                segment: segment.to_string(),
            });
        }
        if variables.iter().any(|v| v == name) {
            return Err(TemplateError::RepeatedVariable {
                template: template.to_string(),
                name: name.to_string(),
            });
        }

        variables.push(name.to_string());
        out.push_str(SEGMENT_CAPTURE);
        has_variable = true;
        rest = &token[close + 1..];
    }
}
