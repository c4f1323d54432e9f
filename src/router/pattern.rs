//! Path patterns: parsing, segment matching and reversal.

use smallvec::SmallVec;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::error::RouterError;

/// Marks a variable segment: `/users/:id`.
pub const PARAM_SIGIL: char = ':';

/// Maximum number of path/query parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage.
///
/// Param names are `Arc<str>` shared with the route table; values are
/// per-request `String`s.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Split a path into segments with one trailing slash removed.
///
/// `/` → `[]`, `/a/b` and `/a/b/` → `["a", "b"]`, `/a/b//` → `["a", "b", ""]`.
/// Returns `None` for paths that do not start with `/`.
pub(crate) fn split_path(path: &str) -> Option<SmallVec<[&str; MAX_INLINE_PARAMS]>> {
    let rest = path.strip_prefix('/')?;
    let mut segments: SmallVec<[&str; MAX_INLINE_PARAMS]> = rest.split('/').collect();
    if segments.last() == Some(&"") {
        segments.pop();
    }
    Some(segments)
}

/// One component of a parsed pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the request segment exactly
    Literal(String),
    /// Binds any non-empty request segment; name stored without the sigil
    Param(Arc<str>),
}

impl Segment {
    #[must_use]
    pub fn is_param(&self) -> bool {
        matches!(self, Segment::Param(_))
    }
}

/// A route pattern, parsed once at registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    raw: Arc<str>,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Parse `/literal/:param/...`.
    pub fn parse(pattern: &str) -> Result<Self, RouterError> {
        let invalid = |reason| RouterError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let parts = split_path(pattern).ok_or_else(|| invalid("must start with '/'"))?;
        let mut segments = Vec::with_capacity(parts.len());
        for part in parts {
            match part.strip_prefix(PARAM_SIGIL) {
                Some("") => return Err(invalid("variable segment has no name")),
                Some(name) => segments.push(Segment::Param(Arc::from(name))),
                None => segments.push(Segment::Literal(part.to_string())),
            }
        }

        Ok(Self {
            raw: Arc::from(pattern),
            segments,
        })
    }

    /// The pattern as registered.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn raw(&self) -> Arc<str> {
        Arc::clone(&self.raw)
    }

    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Variable names in order of appearance.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param(name) => Some(name.as_ref()),
            Segment::Literal(_) => None,
        })
    }

    /// Match already split request segments.
    ///
    /// Segment counts must be equal; literals compare exactly; variables
    /// bind non-empty segments (percent-decoded).
    #[must_use]
    pub fn match_segments(&self, path: &[&str]) -> Option<ParamVec> {
        if path.len() != self.segments.len() {
            return None;
        }

        let mut params = ParamVec::new();
        for (pattern, value) in self.segments.iter().zip(path) {
            match pattern {
                Segment::Param(name) if !value.is_empty() => {
                    params.push((Arc::clone(name), decode_segment(value)));
                }
                Segment::Literal(literal) if literal == value => {}
                _ => return None,
            }
        }
        Some(params)
    }

    /// Match a raw request path.
    #[must_use]
    pub fn match_path(&self, path: &str) -> Option<ParamVec> {
        let segments = split_path(path)?;
        self.match_segments(&segments)
    }

    /// Build a concrete path from `[key, value, key, value, ...]`.
    ///
    /// Every occurrence of a variable is replaced. When a key is given more
    /// than once the first pair wins. `None` on an odd argument count, an
    /// empty value, or any variable left unsubstituted.
    #[must_use]
    pub fn reverse(&self, args: &[&str]) -> Option<String> {
        if args.len() % 2 != 0 {
            return None;
        }

        let mut out = String::with_capacity(self.raw.len() + 16);
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Literal(literal) => out.push_str(literal),
                Segment::Param(name) => {
                    let value = args
                        .chunks_exact(2)
                        .find(|pair| pair[0] == name.as_ref())
                        .map(|pair| pair[1])
                        .filter(|value| !value.is_empty())?;
                    out.push_str(&urlencoding::encode(value));
                }
            }
        }

        if out.is_empty() {
            out.push('/');
        }
        Some(out)
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

fn decode_segment(value: &str) -> String {
    match urlencoding::decode(value) {
        Ok(Cow::Borrowed(s)) => s.to_string(),
        Ok(Cow::Owned(s)) => s,
        Err(_) => value.to_string(),
    }
}

/// Path bindings of a matched route, as stored in scoped state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathParams(ParamVec);

impl PathParams {
    /// Look up a binding. If a name occurs twice in a pattern the last
    /// occurrence wins.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    /// Convert to a HashMap. Allocates.
    #[must_use]
    pub fn to_map(&self) -> std::collections::HashMap<String, String> {
        self.0
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }
}

impl From<ParamVec> for PathParams {
    fn from(params: ParamVec) -> Self {
        Self(params)
    }
}
