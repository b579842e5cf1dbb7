// Cache expiry resolution.
// Maps an outgoing request URL to the lifetime its cached response is allowed.

use std::time::Duration;

use chrono::{DateTime, Utc};

/// How long a cached response stays fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Expiry {
    /// Once cached, never considered stale.
    #[default]
    Never,
    /// Stale after the given duration. Zero disables caching.
    After(Duration),
}

impl Expiry {
    /// Do not read from or write to the cache.
    pub const DO_NOT_CACHE: Expiry = Expiry::After(Duration::ZERO);

    pub fn is_cacheable(&self) -> bool {
        !matches!(self, Expiry::After(d) if d.is_zero())
    }

    /// Absolute expiry time for an entry stored at `from`, `None` if it never expires.
    pub fn expires_at(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Expiry::Never => None,
            Expiry::After(d) => {
                let d = chrono::Duration::from_std(*d).unwrap_or(chrono::Duration::MAX);
                Some(from.checked_add_signed(d).unwrap_or(DateTime::<Utc>::MAX_UTC))
            }
        }
    }
}

impl From<Duration> for Expiry {
    fn from(d: Duration) -> Self {
        Expiry::After(d)
    }
}

/// Default expiry plus ordered per-URL overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpiryPolicy {
    pub default: Expiry,
    pub url_patterns: Vec<(String, Expiry)>,
}

impl ExpiryPolicy {
    pub fn new(default: Expiry, url_patterns: Vec<(String, Expiry)>) -> Self {
        Self {
            default,
            url_patterns,
        }
    }

    pub fn resolve(&self, url: &str) -> Expiry {
        resolve_expiry(url, &self.url_patterns, self.default)
    }
}

/// Expiry of the first pattern matching `url`, or `default` when none match.
pub fn resolve_expiry(url: &str, patterns: &[(String, Expiry)], default: Expiry) -> Expiry {
    patterns
        .iter()
        .find(|(pattern, _)| url_matches(url, pattern))
        .map(|(_, expiry)| *expiry)
        .unwrap_or(default)
}

/// Glob prefix match of a URL against a pattern, ignoring the scheme on both.
///
/// `*/pulls` matches `https://api.github.com/repos/o/r/pulls?state=open`:
/// trailing wildcards are collapsed and one `*` is appended, so a pattern
/// only needs to cover the start of the URL. Wildcards are `*`, `?`,
/// `[seq]` and `[!seq]`.
pub fn url_matches(url: &str, pattern: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    let url = strip_scheme(url);
    let pattern = format!("{}*", strip_scheme(pattern).trim_end_matches('*'));
    glob_match(pattern.as_bytes(), url.as_bytes())
}

fn strip_scheme(s: &str) -> &str {
    s.split_once("://").map(|(_, rest)| rest).unwrap_or(s)
}

/// `*` matches any run of bytes (including `/`), `?` exactly one, `[seq]` one
/// byte in `seq` and `[!seq]` one byte not in it. Ranges such as `a-z` are
/// allowed inside brackets; an unclosed `[` is a literal.
fn glob_match(pattern: &[u8], text: &[u8]) -> bool {
    let (mut p, mut t) = (0, 0);
    // Position of the last `*` seen and the text index it is currently covering up to.
    let mut star: Option<(usize, usize)> = None;

    while t < text.len() {
        let step = match pattern.get(p) {
            Some(&b'*') => {
                star = Some((p, t));
                p += 1;
                continue;
            }
            Some(&b'?') => Some(p + 1),
            Some(&b'[') => match match_class(pattern, p, text[t]) {
                Some((true, next)) => Some(next),
                Some((false, _)) => None,
                None if text[t] == b'[' => Some(p + 1),
                None => None,
            },
            Some(&c) if c == text[t] => Some(p + 1),
            _ => None,
        };

        match (step, star) {
            (Some(next), _) => {
                p = next;
                t += 1;
            }
            (None, Some((sp, st))) => {
                p = sp + 1;
                t = st + 1;
                star = Some((sp, st + 1));
            }
            (None, None) => return false,
        }
    }

    pattern[p..].iter().all(|&c| c == b'*')
}

/// Match `c` against the bracket expression opening at `pattern[open]`.
///
/// Returns whether it matched and the index just past the closing `]`, or
/// `None` when the bracket is never closed.
fn match_class(pattern: &[u8], open: usize, c: u8) -> Option<(bool, usize)> {
    let mut i = open + 1;
    let negated = pattern.get(i) == Some(&b'!');
    if negated {
        i += 1;
    }
    let start = i;
    let mut found = false;

    loop {
        let lo = *pattern.get(i)?;
        // `]` right after the opening bracket is a member, not the close
        if lo == b']' && i > start {
            return Some((found != negated, i + 1));
        }
        match (pattern.get(i + 1), pattern.get(i + 2)) {
            (Some(&b'-'), Some(&hi)) if hi != b']' => {
                found |= lo <= c && c <= hi;
                i += 3;
            }
            _ => {
                found |= lo == c;
                i += 1;
            }
        }
    }
}
