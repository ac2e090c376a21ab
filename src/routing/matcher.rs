//! Route template matching.
//!
//! # Responsibilities
//! - Compile a URI template into a `PathPattern`
//! - Test a request path and bind named parameters
//!
//! # Design Decisions
//! - Templates are split on `/`; `:name` binds exactly one non-empty segment
//! - A final `*` (or `:*`) binds the remainder of the path, slashes included,
//!   under the name `*`
//! - Literal segments compare case-sensitively
//! - Templates without parameters compile to `Constant` and match by string
//!   equality
//! - No regex: matching is a single pass over the segments

use std::fmt;

use crate::error::RouterError;

/// Binding name of a trailing wildcard.
pub const WILDCARD: &str = "*";

/// One `/`-separated piece of a template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Literal(String),
    Param(String),
    Wildcard,
}

/// A compiled route template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// No parameters; matched by exact equality.
    Constant(String),
    /// Named parameters and/or a trailing wildcard.
    Parameterized {
        template: String,
        segments: Vec<Segment>,
        param_names: Vec<String>,
    },
}

impl PathPattern {
    /// Compile `template`.
    pub fn compile(template: &str) -> Result<Self, RouterError> {
        let invalid = |reason| RouterError::InvalidTemplate {
            template: template.to_string(),
            reason,
        };

        let Some(rest) = template.strip_prefix('/') else {
            return Err(invalid("template must start with '/'"));
        };

        let raw: Vec<&str> = rest.split('/').collect();
        let mut segments = Vec::with_capacity(raw.len());
        let mut param_names: Vec<String> = Vec::new();

        for (i, part) in raw.iter().enumerate() {
            let segment = if *part == WILDCARD || *part == ":*" {
                if i + 1 != raw.len() {
                    return Err(invalid("wildcard must be the final segment"));
                }
                param_names.push(WILDCARD.to_string());
                Segment::Wildcard
            } else if let Some(name) = part.strip_prefix(':') {
                if name.is_empty() {
                    return Err(invalid("parameter name is empty"));
                }
                if param_names.iter().any(|n| n == name) {
                    return Err(invalid("parameter name is repeated"));
                }
                param_names.push(name.to_string());
                Segment::Param(name.to_string())
            } else {
                Segment::Literal(part.to_string())
            };
            segments.push(segment);
        }

        if param_names.is_empty() {
            return Ok(PathPattern::Constant(template.to_string()));
        }

        Ok(PathPattern::Parameterized {
            template: template.to_string(),
            segments,
            param_names,
        })
    }

    pub fn template(&self) -> &str {
        match self {
            PathPattern::Constant(template) => template,
            PathPattern::Parameterized { template, .. } => template,
        }
    }

    /// Parameter names in template order.
    pub fn param_names(&self) -> &[String] {
        match self {
            PathPattern::Constant(_) => &[],
            PathPattern::Parameterized { param_names, .. } => param_names,
        }
    }

    pub fn is_constant(&self) -> bool {
        matches!(self, PathPattern::Constant(_))
    }

    /// Match `path` (without query string), returning its bindings.
    pub fn matches(&self, path: &str) -> Option<PathParams> {
        let (segments, capacity) = match self {
            PathPattern::Constant(template) => {
                return (template == path).then(PathParams::default);
            }
            PathPattern::Parameterized {
                segments,
                param_names,
                ..
            } => (segments, param_names.len()),
        };

        let parts: Vec<&str> = path.strip_prefix('/')?.split('/').collect();
        let mut params = PathParams::with_capacity(capacity);

        for (i, segment) in segments.iter().enumerate() {
            match segment {
                Segment::Wildcard => {
                    if i >= parts.len() {
                        return None;
                    }
                    params.push(WILDCARD, parts[i..].join("/"));
                    return Some(params);
                }
                Segment::Literal(literal) => {
                    if parts.get(i) != Some(&literal.as_str()) {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    let value = parts.get(i).filter(|v| !v.is_empty())?;
                    params.push(name, *value);
                }
            }
        }

        (parts.len() == segments.len()).then_some(params)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.template())
    }
}

/// Parameters bound by a matched template, in template order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams {
    entries: Vec<(String, String)>,
}

impl PathParams {
    fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: &str, value: impl Into<String>) {
        self.entries.push((name.to_string(), value.into()));
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// The trailing wildcard binding, if the template declared one.
    pub fn wildcard(&self) -> Option<&str> {
        self.get(WILDCARD)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
