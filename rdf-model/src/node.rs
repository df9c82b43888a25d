//! Immutable RDF term values: IRIs, blank nodes, CURIEs, and literals.

use std::cmp::Ordering;
use std::fmt;

use crate::uri::Uri;
use crate::{Error, Result};

/// Minimal hand-rolled bitflags: the workspace carries no `bitflags`
/// dependency and this is the only bitset type in the crate.
macro_rules! bitflags_like {
    (
        $(#[$meta:meta])*
        pub struct $name:ident: $ty:ty {
            $(const $variant:ident = $value:expr;)*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
        pub struct $name($ty);

        impl $name {
            $(pub const $variant: $name = $name($value);)*

            pub const fn empty() -> Self {
                $name(0)
            }

            pub const fn bits(self) -> $ty {
                self.0
            }

            pub const fn contains(self, other: $name) -> bool {
                (self.0 & other.0) == other.0
            }
        }

        impl std::ops::BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl std::ops::BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }
    };
}

/// The four term kinds a [`Node`] can take.
///
/// Variant order is the node's kind ordering used by [`Node::cmp`]; it is
/// arbitrary but fixed so store indices are stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKind {
    Iri,
    Blank,
    Curie,
    Literal,
}

bitflags_like! {
    /// Precomputed textual properties of a node's `text`, always a pure
    /// function of the text (and meta presence) it was built from.
    pub struct NodeFlags: u8 {
        const HAS_NEWLINE = 1 << 0;
        const HAS_QUOTE = 1 << 1;
        const HAS_DATATYPE = 1 << 2;
        const HAS_LANGUAGE = 1 << 3;
    }
}

/// Optional metadata attached only to [`NodeKind::Literal`] nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Meta {
    /// Datatype IRI or CURIE node.
    Datatype(Box<Node>),
    /// BCP-47 language tag.
    Language(Box<str>),
}

impl PartialOrd for Meta {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Meta {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Meta::Datatype(a), Meta::Datatype(b)) => a.cmp(b),
            (Meta::Language(a), Meta::Language(b)) => a.cmp(b),
            (Meta::Datatype(_), Meta::Language(_)) => Ordering::Less,
            (Meta::Language(_), Meta::Datatype(_)) => Ordering::Greater,
        }
    }
}

/// An immutable RDF term.
///
/// Two nodes are equal iff kind, text, and meta are recursively equal, and
/// total order compares kind, then text lexicographically, then meta.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Node {
    kind: NodeKind,
    text: Box<str>,
    flags: NodeFlags,
    meta: Option<Meta>,
}

impl PartialOrd for Node {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Node {
    fn cmp(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.text.cmp(&other.text))
            .then_with(|| self.meta.cmp(&other.meta))
    }
}

fn scan_flags(text: &str) -> NodeFlags {
    let mut flags = NodeFlags::empty();
    if text.contains('\n') {
        flags |= NodeFlags::HAS_NEWLINE;
    }
    if text.contains('"') {
        flags |= NodeFlags::HAS_QUOTE;
    }
    flags
}

impl Node {
    /// Construct an IRI node. `text` is the lexical IRI string, absolute or
    /// relative; resolution is the caller's/environment's job.
    pub fn make_iri(text: impl Into<Box<str>>) -> Node {
        let text = text.into();
        let flags = scan_flags(&text);
        Node { kind: NodeKind::Iri, text, flags, meta: None }
    }

    /// Construct a CURIE node (`prefix:suffix`, unexpanded).
    pub fn make_curie(text: impl Into<Box<str>>) -> Node {
        let text = text.into();
        let flags = scan_flags(&text);
        Node { kind: NodeKind::Curie, text, flags, meta: None }
    }

    /// Construct a blank node with the given label (without the `_:` sigil).
    pub fn make_blank(label: impl Into<Box<str>>) -> Node {
        let text = label.into();
        let flags = scan_flags(&text);
        Node { kind: NodeKind::Blank, text, flags, meta: None }
    }

    /// Construct a literal. Rejects a simultaneous datatype and language tag
    /// unless the datatype is `rdf:langString`, per §3.1.
    pub fn make_literal(
        body: impl Into<Box<str>>,
        datatype: Option<Node>,
        lang: Option<&str>,
    ) -> Result<Node> {
        let text = body.into();
        let mut flags = scan_flags(&text);

        let meta = match (datatype, lang) {
            (Some(dt), Some(_)) if !is_rdf_lang_string(&dt) => {
                return Err(Error::BadArgument(
                    "literal cannot carry both a datatype and a language tag".into(),
                ));
            }
            (Some(_), Some(lang)) => {
                flags |= NodeFlags::HAS_LANGUAGE;
                Some(Meta::Language(lang.into()))
            }
            (Some(dt), None) => {
                if !matches!(dt.kind, NodeKind::Iri | NodeKind::Curie) {
                    return Err(Error::BadArgument("literal datatype must be an IRI or CURIE".into()));
                }
                flags |= NodeFlags::HAS_DATATYPE;
                Some(Meta::Datatype(Box::new(dt)))
            }
            (None, Some(lang)) => {
                flags |= NodeFlags::HAS_LANGUAGE;
                Some(Meta::Language(lang.into()))
            }
            (None, None) => None,
        };

        Ok(Node { kind: NodeKind::Literal, text, flags, meta })
    }

    /// A plain string literal with no datatype or language.
    pub fn make_string(body: impl Into<Box<str>>) -> Node {
        Node::make_literal(body, None, None).expect("plain literal never fails")
    }

    /// Shortest decimal within `max_sig_digits`/`max_frac_digits` that
    /// round-trips: never scientific notation, always a `.` with at least
    /// one digit on either side, trailing zeros removed except one.
    pub fn make_decimal(
        d: f64,
        max_sig_digits: u32,
        max_frac_digits: u32,
        datatype: Option<Node>,
    ) -> Option<Node> {
        if !d.is_finite() {
            return None;
        }
        let text = crate::numeric::format_decimal(d, max_sig_digits, max_frac_digits)?;
        Node::make_literal(text, Some(datatype.unwrap_or_else(Node::xsd_decimal)), None).ok()
    }

    /// Normalized scientific form `d.ddde±E`, shortest round-trip; `NaN`,
    /// `INF`, `-INF` for non-finite values.
    pub fn make_double(d: f64) -> Node {
        let text = crate::numeric::format_scientific_f64(d);
        Node::make_literal(text, Some(Node::xsd_double()), None).expect("double literal never fails")
    }

    /// As [`Node::make_double`] but for `f32`, tagged `xsd:float`.
    pub fn make_float(f: f32) -> Node {
        let text = crate::numeric::format_scientific_f32(f);
        Node::make_literal(text, Some(Node::xsd_float()), None).expect("float literal never fails")
    }

    /// Canonical decimal integer literal.
    pub fn make_integer(i: i64, datatype: Option<Node>) -> Node {
        Node::make_literal(
            i.to_string(),
            Some(datatype.unwrap_or_else(Node::xsd_integer)),
            None,
        )
        .expect("integer literal never fails")
    }

    /// `"true"` / `"false"` literal tagged `xsd:boolean`.
    pub fn make_boolean(b: bool) -> Node {
        let text = if b { "true" } else { "false" };
        Node::make_literal(text, Some(Node::xsd_boolean()), None).expect("boolean literal never fails")
    }

    /// Base64 (RFC 4648 standard alphabet) literal tagged `xsd:base64Binary`.
    /// When `wrap_lines` is set, a line break is inserted every 76 output
    /// characters (RFC 2045) and the newline flag is set on the result.
    pub fn make_blob(bytes: &[u8], wrap_lines: bool, datatype: Option<Node>) -> Node {
        let text = crate::base64::encode(bytes, wrap_lines);
        let mut node =
            Node::make_literal(text, Some(datatype.unwrap_or_else(Node::xsd_base64_binary)), None)
                .expect("blob literal never fails");
        if wrap_lines {
            node.flags |= NodeFlags::HAS_NEWLINE;
        }
        node
    }

    /// Percent-encodes a filesystem path into a `file:` IRI. Windows
    /// backslashes are converted to `/` before encoding; a drive-letter path
    /// yields `file:///C:/...`; relative paths ignore `host`.
    pub fn make_file_uri(path: &str, host: Option<&str>) -> Node {
        Node::make_iri(crate::uri::file_uri_encode(path, host))
    }

    /// Parse `text` as a URI reference and resolve it against `base`
    /// (RFC 3986 §5.2.2), requiring an absolute result.
    pub fn make_resolved_iri(text: &str, base: &Node) -> Option<Node> {
        let base_uri = Uri::parse(base.text()).ok()?;
        let target = Uri::parse(text).ok()?;
        let resolved = Uri::resolve(&target, &base_uri);
        let mut out = String::new();
        resolved.serialize(&mut out);
        if !Uri::has_scheme(&out) {
            return None;
        }
        Some(Node::make_iri(out))
    }

    /// Relativize `text` (an absolute IRI) against `base`, bounded by
    /// `root`; if not a descendant of both, returns `text` unchanged.
    pub fn make_relative_iri(text: &str, base: &Node, root: Option<&Node>) -> Node {
        let Ok(target) = Uri::parse(text) else {
            return Node::make_iri(text);
        };
        let Ok(base_uri) = Uri::parse(base.text()) else {
            return Node::make_iri(text);
        };
        let root_uri = root.and_then(|r| Uri::parse(r.text()).ok());
        let mut out = String::new();
        target.serialize_relative(&base_uri, root_uri.as_ref(), &mut out);
        Node::make_iri(out)
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn meta(&self) -> Option<&Meta> {
        self.meta.as_ref()
    }

    pub fn is_iri(&self) -> bool {
        self.kind == NodeKind::Iri
    }

    pub fn is_blank(&self) -> bool {
        self.kind == NodeKind::Blank
    }

    pub fn is_curie(&self) -> bool {
        self.kind == NodeKind::Curie
    }

    pub fn is_literal(&self) -> bool {
        self.kind == NodeKind::Literal
    }

    pub fn datatype(&self) -> Option<&Node> {
        match &self.meta {
            Some(Meta::Datatype(dt)) => Some(dt),
            _ => None,
        }
    }

    pub fn language(&self) -> Option<&str> {
        match &self.meta {
            Some(Meta::Language(lang)) => Some(lang),
            _ => None,
        }
    }

    fn xsd(local: &str) -> Node {
        Node::make_iri(format!("{}{}", crate::vocab::XSD_NS, local))
    }

    pub fn xsd_string() -> Node {
        Node::xsd("string")
    }
    pub fn xsd_integer() -> Node {
        Node::xsd("integer")
    }
    pub fn xsd_decimal() -> Node {
        Node::xsd("decimal")
    }
    pub fn xsd_double() -> Node {
        Node::xsd("double")
    }
    pub fn xsd_float() -> Node {
        Node::xsd("float")
    }
    pub fn xsd_boolean() -> Node {
        Node::xsd("boolean")
    }
    pub fn xsd_base64_binary() -> Node {
        Node::xsd("base64Binary")
    }
    pub fn rdf_lang_string() -> Node {
        Node::make_iri(crate::vocab::RDF_LANG_STRING)
    }
}

fn is_rdf_lang_string(node: &Node) -> bool {
    node.is_iri() && node.text() == crate::vocab::RDF_LANG_STRING
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NodeKind::Iri => write!(f, "<{}>", self.text),
            NodeKind::Blank => write!(f, "_:{}", self.text),
            NodeKind::Curie => write!(f, "{}", self.text),
            NodeKind::Literal => {
                write!(f, "\"{}\"", self.text.replace('\\', "\\\\").replace('"', "\\\""))?;
                match &self.meta {
                    Some(Meta::Datatype(dt)) => write!(f, "^^{}", dt),
                    Some(Meta::Language(lang)) => write!(f, "@{}", lang),
                    None => Ok(()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_equals_copy() {
        let n = Node::make_iri("http://example.org/s");
        let c = n.clone();
        assert_eq!(n, c);
        assert_eq!(n.cmp(&c), Ordering::Equal);
    }

    #[test]
    fn flags_agree_with_naive_scan() {
        let n = Node::make_string("line one\nline \"two\"");
        assert!(n.flags().contains(NodeFlags::HAS_NEWLINE));
        assert!(n.flags().contains(NodeFlags::HAS_QUOTE));
    }

    #[test]
    fn literal_rejects_datatype_and_language() {
        let dt = Node::make_iri("http://example.org/dt");
        let err = Node::make_literal("x", Some(dt), Some("en"));
        assert!(err.is_err());
    }

    #[test]
    fn lang_string_datatype_with_language_is_allowed() {
        let dt = Node::rdf_lang_string();
        let lit = Node::make_literal("hello", Some(dt), Some("en")).unwrap();
        assert_eq!(lit.language(), Some("en"));
    }

    #[test]
    fn decimal_preserves_point_both_sides() {
        let n = Node::make_decimal(5.0, 17, 17, None).unwrap();
        assert_eq!(n.text(), "5.0");
    }

    #[test]
    fn decimal_rejects_non_finite() {
        assert!(Node::make_decimal(f64::NAN, 17, 17, None).is_none());
        assert!(Node::make_decimal(f64::INFINITY, 17, 17, None).is_none());
    }

    #[test]
    fn boolean_literal_text() {
        assert_eq!(Node::make_boolean(true).text(), "true");
        assert_eq!(Node::make_boolean(false).text(), "false");
    }

    #[test]
    fn ordering_compares_kind_then_text() {
        let a = Node::make_iri("a");
        let b = Node::make_blank("a");
        assert!(a < b, "Iri sorts before Blank by kind order");
    }
}
