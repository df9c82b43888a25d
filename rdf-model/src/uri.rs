//! RFC 3986 URI parsing, resolution, and relativization.
//!
//! A [`Uri`] is a view over five components (scheme, authority, path, query,
//! fragment); parsing a string borrows from it, while resolution and
//! relativization may need to build a new path and so fall back to owned
//! storage for that one field. [`std::borrow::Cow`] lets both cases share
//! one type instead of a separate "owned" and "borrowed" URI.

use std::borrow::Cow;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Uri<'a> {
    scheme: Option<Cow<'a, str>>,
    authority: Option<Cow<'a, str>>,
    path: Cow<'a, str>,
    query: Option<Cow<'a, str>>,
    fragment: Option<Cow<'a, str>>,
}

fn is_scheme_char(c: char, first: bool) -> bool {
    if first {
        c.is_ascii_alphabetic()
    } else {
        c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
    }
}

impl<'a> Uri<'a> {
    /// `true` iff `s` starts with an ASCII letter followed by
    /// letters/digits/`+`/`-`/`.` and then `:`.
    pub fn has_scheme(s: &str) -> bool {
        let mut chars = s.char_indices();
        match chars.next() {
            Some((_, c)) if is_scheme_char(c, true) => {}
            _ => return false,
        }
        for (i, c) in chars {
            if c == ':' {
                return i > 0;
            }
            if !is_scheme_char(c, false) {
                return false;
            }
        }
        false
    }

    /// Scan `s` once into its five components, RFC 3986 §5.3 in reverse.
    pub fn parse(s: &'a str) -> Result<Uri<'a>> {
        let mut rest = s;

        let scheme = if Uri::has_scheme(s) {
            let colon = s.find(':').expect("has_scheme guarantees a colon");
            let (scheme, after) = s.split_at(colon);
            rest = &after[1..];
            Some(Cow::Borrowed(scheme))
        } else {
            None
        };

        let authority = if let Some(after_slashes) = rest.strip_prefix("//") {
            let end = after_slashes
                .find(|c| c == '/' || c == '?' || c == '#')
                .unwrap_or(after_slashes.len());
            let (authority, after) = after_slashes.split_at(end);
            rest = after;
            Some(Cow::Borrowed(authority))
        } else {
            None
        };

        let path_end = rest.find(|c| c == '?' || c == '#').unwrap_or(rest.len());
        let (path, after) = rest.split_at(path_end);
        rest = after;

        let query = if let Some(after_q) = rest.strip_prefix('?') {
            let end = after_q.find('#').unwrap_or(after_q.len());
            let (query, after) = after_q.split_at(end);
            rest = after;
            Some(Cow::Borrowed(query))
        } else {
            None
        };

        let fragment = rest.strip_prefix('#').map(Cow::Borrowed);

        Ok(Uri { scheme, authority, path: Cow::Borrowed(path), query, fragment })
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn authority(&self) -> Option<&str> {
        self.authority.as_deref()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn fragment(&self) -> Option<&str> {
        self.fragment.as_deref()
    }

    pub fn is_absolute(&self) -> bool {
        self.scheme.is_some()
    }

    fn into_owned(self) -> Uri<'static> {
        Uri {
            scheme: self.scheme.map(|s| Cow::Owned(s.into_owned())),
            authority: self.authority.map(|s| Cow::Owned(s.into_owned())),
            path: Cow::Owned(self.path.into_owned()),
            query: self.query.map(|s| Cow::Owned(s.into_owned())),
            fragment: self.fragment.map(|s| Cow::Owned(s.into_owned())),
        }
    }

    /// RFC 3986 §5.3 `remove_dot_segments`.
    fn remove_dot_segments(path: &str) -> String {
        let mut input: Vec<&str> = Vec::new();
        // Split while keeping track of a leading slash, which None of the
        // segment-based processing below should lose.
        let absolute = path.starts_with('/');
        for seg in path.split('/') {
            input.push(seg);
        }
        if absolute {
            input.remove(0);
        }

        let mut output: Vec<&str> = Vec::new();
        let mut trailing_slash = false;
        let mut i = 0;
        while i < input.len() {
            match input[i] {
                "." => {
                    trailing_slash = true;
                }
                ".." => {
                    output.pop();
                    trailing_slash = true;
                }
                seg => {
                    output.push(seg);
                    trailing_slash = false;
                }
            }
            i += 1;
        }

        let mut result = String::new();
        if absolute {
            result.push('/');
        }
        result.push_str(&output.join("/"));
        if trailing_slash && !result.ends_with('/') {
            result.push('/');
        }
        result
    }

    /// RFC 3986 §5.3 `merge`.
    fn merge(base: &Uri<'_>, reference_path: &str) -> String {
        if base.authority.is_some() && base.path.is_empty() {
            format!("/{}", reference_path)
        } else {
            match base.path.rfind('/') {
                Some(idx) => format!("{}{}", &base.path[..=idx], reference_path),
                None => reference_path.to_string(),
            }
        }
    }

    /// RFC 3986 §5.2.2 `transform-references`.
    pub fn resolve(reference: &Uri<'_>, base: &Uri<'_>) -> Uri<'static> {
        let (scheme, authority, path, query);

        if reference.scheme.is_some() {
            scheme = reference.scheme.clone();
            authority = reference.authority.clone();
            path = Cow::Owned(Uri::remove_dot_segments(&reference.path));
            query = reference.query.clone();
        } else if reference.authority.is_some() {
            scheme = base.scheme.clone();
            authority = reference.authority.clone();
            path = Cow::Owned(Uri::remove_dot_segments(&reference.path));
            query = reference.query.clone();
        } else if reference.path.is_empty() {
            scheme = base.scheme.clone();
            authority = base.authority.clone();
            path = base.path.clone();
            query = reference.query.clone().or_else(|| base.query.clone());
        } else if reference.path.starts_with('/') {
            scheme = base.scheme.clone();
            authority = base.authority.clone();
            path = Cow::Owned(Uri::remove_dot_segments(&reference.path));
            query = reference.query.clone();
        } else {
            scheme = base.scheme.clone();
            authority = base.authority.clone();
            path = Cow::Owned(Uri::remove_dot_segments(&Uri::merge(base, &reference.path)));
            query = reference.query.clone();
        }

        Uri {
            scheme: scheme.map(|c| Cow::Owned(c.into_owned())),
            authority: authority.map(|c| Cow::Owned(c.into_owned())),
            path: Cow::Owned(path.into_owned()),
            query: query.map(|c| Cow::Owned(c.into_owned())),
            fragment: reference.fragment.clone().map(|c| Cow::Owned(c.into_owned())),
        }
    }

    /// Serialize the absolute form to `out`.
    pub fn serialize(&self, out: &mut String) {
        if let Some(scheme) = &self.scheme {
            out.push_str(scheme);
            out.push(':');
        }
        if let Some(authority) = &self.authority {
            out.push_str("//");
            out.push_str(authority);
        }
        out.push_str(&self.path);
        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
    }

    fn path_segments(path: &str) -> Vec<&str> {
        let trimmed = path.trim_start_matches('/');
        if trimmed.is_empty() {
            Vec::new()
        } else {
            trimmed.split('/').collect()
        }
    }

    /// Absolute unless `self`'s (scheme, authority) match `base`'s and, when
    /// `root` is given, `self`'s path is under `root`'s path; then emits the
    /// minimal `(../)*` tail.
    pub fn serialize_relative(&self, base: &Uri<'_>, root: Option<&Uri<'_>>, out: &mut String) {
        let same_origin = self.scheme == base.scheme && self.authority == base.authority;
        let under_root = match root {
            Some(root) => self.path.starts_with(root.path.as_ref()) && base.path.starts_with(root.path.as_ref()),
            None => true,
        };

        if !same_origin || !under_root {
            self.serialize(out);
            return;
        }

        let self_segments = Uri::path_segments(&self.path);
        let base_segments = Uri::path_segments(&base.path);

        // Directory segments of base (excluding its final, non-directory
        // segment, if any).
        let base_dirs = if base.path.ends_with('/') {
            &base_segments[..]
        } else {
            &base_segments[..base_segments.len().saturating_sub(1)]
        };

        let mut common = 0;
        while common < base_dirs.len() && common < self_segments.len() && base_dirs[common] == self_segments[common] {
            common += 1;
        }

        let climbs = base_dirs.len() - common;
        let tail = &self_segments[common..];

        if climbs == 0 && tail.is_empty() {
            out.push_str("./");
        } else {
            for _ in 0..climbs {
                out.push_str("../");
            }
            out.push_str(&tail.join("/"));
        }

        if let Some(query) = &self.query {
            out.push('?');
            out.push_str(query);
        }
        if let Some(fragment) = &self.fragment {
            out.push('#');
            out.push_str(fragment);
        }
    }
}

/// Percent-encode every byte outside `A-Za-z0-9-._~` plus the path-safe set
/// `:/@!$&'()*+,;=`. Windows backslashes are converted to `/` first; a
/// drive-letter path yields `file:///C:/...`.
pub fn file_uri_encode(path: &str, host: Option<&str>) -> String {
    fn is_unreserved(b: u8) -> bool {
        b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~')
    }
    fn is_path_safe(b: u8) -> bool {
        matches!(b, b':' | b'/' | b'@' | b'!' | b'$' | b'&' | b'\'' | b'(' | b')' | b'*' | b'+' | b',' | b';' | b'=')
    }

    let is_windows_drive = path.len() >= 2
        && path.as_bytes()[0].is_ascii_alphabetic()
        && path.as_bytes()[1] == b':';
    let normalized: String = path.chars().map(|c| if c == '\\' { '/' } else { c }).collect();

    let mut out = String::new();
    out.push_str("file://");
    if let Some(host) = host {
        out.push_str(host);
    }
    if is_windows_drive || normalized.starts_with('/') {
        if is_windows_drive {
            out.push('/');
        }
    } else if host.is_none() {
        // relative path: emit without the authority slashes' leading '/'
        out.clear();
    }

    for b in normalized.bytes() {
        if is_unreserved(b) || is_path_safe(b) {
            out.push(b as char);
        } else {
            out.push('%');
            out.push_str(&format!("{:02X}", b));
        }
    }

    out
}

/// Unescape `%HH` sequences and split off a host, if present, from a
/// `file:` IRI.
pub fn file_uri_parse(uri: &str) -> Result<(String, Option<String>)> {
    let rest = uri
        .strip_prefix("file://")
        .ok_or_else(|| Error::BadArgument("not a file: URI".into()))?;

    let (host, path_part) = if let Some(after_slash) = rest.strip_prefix('/') {
        (None, format!("/{}", after_slash))
    } else {
        let end = rest.find('/').unwrap_or(rest.len());
        let (host, path) = rest.split_at(end);
        (if host.is_empty() { None } else { Some(host.to_string()) }, path.to_string())
    };

    let mut path = String::with_capacity(path_part.len());
    let bytes = path_part.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let Ok(byte) = u8::from_str_radix(&path_part[i + 1..i + 3], 16) {
                path.push(byte as char);
                i += 3;
                continue;
            }
        }
        path.push(bytes[i] as char);
        i += 1;
    }

    Ok((path, host))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_simple_segment() {
        let base = Uri::parse("http://a/b/c/d;p?q").unwrap();
        let reference = Uri::parse("g").unwrap();
        let resolved = Uri::resolve(&reference, &base);
        let mut out = String::new();
        resolved.serialize(&mut out);
        assert_eq!(out, "http://a/b/c/g");
    }

    #[test]
    fn resolve_dot_dot_segment() {
        let base = Uri::parse("http://a/b/c/d;p?q").unwrap();
        let reference = Uri::parse("../g").unwrap();
        let resolved = Uri::resolve(&reference, &base);
        let mut out = String::new();
        resolved.serialize(&mut out);
        assert_eq!(out, "http://a/b/g");
    }

    #[test]
    fn resolve_is_idempotent() {
        let base = Uri::parse("http://a/b/c/d;p?q").unwrap();
        let reference = Uri::parse("g").unwrap();
        let once = Uri::resolve(&reference, &base);
        let twice = Uri::resolve(&once, &base);
        let (mut a, mut b) = (String::new(), String::new());
        once.serialize(&mut a);
        twice.serialize(&mut b);
        assert_eq!(a, b);
    }

    #[test]
    fn has_scheme_rejects_missing_colon() {
        assert!(!Uri::has_scheme("not-a-scheme"));
        assert!(Uri::has_scheme("http://example.org/"));
    }

    #[test]
    fn remove_dot_segments_examples() {
        assert_eq!(Uri::remove_dot_segments("/a/b/c/./../../g"), "/a/g");
        assert_eq!(Uri::remove_dot_segments("mid/content=5/../6"), "mid/6");
    }

    #[test]
    fn file_uri_round_trip() {
        let uri = file_uri_encode("/tmp/a b", None);
        assert_eq!(uri, "file:///tmp/a%20b");
        let (path, host) = file_uri_parse(&uri).unwrap();
        assert_eq!(path, "/tmp/a b");
        assert_eq!(host, None);
    }

    #[test]
    fn file_uri_windows_drive() {
        let uri = file_uri_encode("C:\\Users\\x", None);
        assert_eq!(uri, "file:///C:/Users/x");
    }
}
