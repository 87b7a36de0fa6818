//! URL match patterns.
//!
//! # Responsibilities
//! - Parse `<scheme>://<host>/<path>` patterns (`http://*/*`, `*://*.example.com/*`)
//! - Match request URLs against a set of patterns
//!
//! # Design Decisions
//! - Scheme `*` means http or https only
//! - Host `*` matches any host, `*.name` matches name and its subdomains
//! - Path is a glob where `*` matches any run of characters (query included)
//! - Host matching is case-insensitive, path matching is case-sensitive

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::error::HostError;

/// One parsed match pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPattern {
    scheme: SchemePattern,
    host: HostPattern,
    path: String,
    source: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum SchemePattern {
    AnyHttp,
    Exact(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum HostPattern {
    Any,
    Subdomains(String),
    Exact(String),
}

impl MatchPattern {
    /// Returns true if the URL matches this pattern.
    pub fn matches(&self, url: &Url) -> bool {
        let scheme_ok = match &self.scheme {
            SchemePattern::AnyHttp => matches!(url.scheme(), "http" | "https"),
            SchemePattern::Exact(s) => url.scheme() == s,
        };
        if !scheme_ok {
            return false;
        }

        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        let host_ok = match &self.host {
            HostPattern::Any => true,
            HostPattern::Exact(h) => &host == h,
            HostPattern::Subdomains(base) => {
                host == *base
                    || (host.len() > base.len()
                        && host.ends_with(base.as_str())
                        && host.as_bytes()[host.len() - base.len() - 1] == b'.')
            }
        };
        if !host_ok {
            return false;
        }

        let mut target = url.path().to_string();
        if let Some(query) = url.query() {
            target.push('?');
            target.push_str(query);
        }
        glob_match(&self.path, &target)
    }

    /// Pattern matching exactly the scheme, host and path of `url`.
    pub fn for_url(url: &Url) -> Result<Self, HostError> {
        let host = url.host_str().unwrap_or("");
        let source = match url.port() {
            Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, url.path()),
            None => format!("{}://{}{}", url.scheme(), host, url.path()),
        };
        source.parse()
    }
}

impl FromStr for MatchPattern {
    type Err = HostError;

    fn from_str(pattern: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| HostError::InvalidPattern {
            pattern: pattern.to_string(),
            reason,
        };

        let (scheme, rest) = pattern.split_once("://").ok_or_else(|| invalid("missing '://'"))?;
        let scheme = match scheme {
            "*" => SchemePattern::AnyHttp,
            "http" | "https" => SchemePattern::Exact(scheme.to_string()),
            _ => return Err(invalid("unsupported scheme")),
        };

        let (host, path) = match rest.find('/') {
            Some(idx) => (&rest[..idx], &rest[idx..]),
            None => return Err(invalid("missing path")),
        };
        let host = host.to_ascii_lowercase();
        let host = if host == "*" {
            HostPattern::Any
        } else if let Some(base) = host.strip_prefix("*.") {
            if base.is_empty() || base.contains('*') {
                return Err(invalid("bad wildcard host"));
            }
            HostPattern::Subdomains(base.to_string())
        } else if host.is_empty() || host.contains('*') {
            return Err(invalid("bad host"));
        } else {
            // Ports are accepted in patterns but not matched against.
            let bare = host.split(':').next().unwrap_or_default().to_string();
            HostPattern::Exact(bare)
        };

        Ok(Self {
            scheme,
            host,
            path: path.to_string(),
            source: pattern.to_string(),
        })
    }
}

impl fmt::Display for MatchPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// A set of patterns; a URL passes if any pattern matches.
#[derive(Debug, Clone)]
pub struct RequestFilter {
    patterns: Vec<MatchPattern>,
}

impl RequestFilter {
    pub fn new(patterns: Vec<MatchPattern>) -> Self {
        Self { patterns }
    }

    /// `http://*/*` and `https://*/*`.
    pub fn all_web() -> Self {
        Self::new(vec![
            "http://*/*".parse().expect("static pattern"),
            "https://*/*".parse().expect("static pattern"),
        ])
    }

    pub fn matches(&self, url: &Url) -> bool {
        self.patterns.iter().any(|p| p.matches(url))
    }
}

fn glob_match(pattern: &str, text: &str) -> bool {
    let p = pattern.as_bytes();
    let t = text.as_bytes();
    let (mut pi, mut ti) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && p[pi] == b'*' {
            backtrack = Some((pi, ti));
            pi += 1;
        } else if pi < p.len() && p[pi] == t[ti] {
            pi += 1;
            ti += 1;
        } else if let Some((star, matched)) = backtrack {
            pi = star + 1;
            ti = matched + 1;
            backtrack = Some((star, matched + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == b'*')
}
