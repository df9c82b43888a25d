//! Base IRI plus ordered prefix table: CURIE↔IRI expansion and qualification.

use crate::node::{Meta, Node, NodeKind};
use crate::uri::Uri;
use crate::{Error, Result};

/// Base IRI plus an ordered list of (prefix-name, IRI) bindings. Order is
/// observable: `qualify` returns the *first* matching prefix, matching the
/// linear-scan contract in §4.C.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    base: Option<Node>,
    prefixes: Vec<(Box<str>, Node)>,
}

impl Environment {
    pub fn new() -> Environment {
        Environment::default()
    }

    pub fn base(&self) -> Option<&Node> {
        self.base.as_ref()
    }

    /// `iri` must be absolute. Resolved relative to the previous base if
    /// necessary, then replaces it.
    pub fn set_base(&mut self, iri: Node) -> Result<()> {
        if !iri.is_iri() {
            return Err(Error::BadArgument("base must be an IRI node".into()));
        }
        let resolved = match &self.base {
            Some(prev) if !Uri::has_scheme(iri.text()) => {
                Node::make_resolved_iri(iri.text(), prev)
                    .ok_or_else(|| Error::BadArgument("base is not absolute".into()))?
            }
            _ => {
                if !Uri::has_scheme(iri.text()) {
                    return Err(Error::BadArgument("base must be an absolute IRI".into()));
                }
                iri
            }
        };
        self.base = Some(resolved);
        Ok(())
    }

    /// `iri` must be IRI kind; if relative, resolved against the current
    /// base (failing if there is none). Duplicate names replace the
    /// existing binding.
    pub fn set_prefix(&mut self, name: &str, iri: Node) -> Result<()> {
        if !iri.is_iri() {
            return Err(Error::BadArgument("prefix binding must be an IRI node".into()));
        }
        let resolved = if Uri::has_scheme(iri.text()) {
            iri
        } else {
            let base = self.base.as_ref().ok_or_else(|| Error::BadArgument("no base to resolve prefix against".into()))?;
            Node::make_resolved_iri(iri.text(), base)
                .ok_or_else(|| Error::BadArgument("prefix IRI did not resolve to an absolute IRI".into()))?
        };

        if let Some(entry) = self.prefixes.iter_mut().find(|(n, _)| n.as_ref() == name) {
            entry.1 = resolved;
        } else {
            self.prefixes.push((name.into(), resolved));
        }
        Ok(())
    }

    pub fn prefixes(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.prefixes.iter().map(|(name, iri)| (name.as_ref(), iri))
    }

    /// Best-effort: first bound prefix whose IRI is a byte-prefix of `iri`
    /// with a valid local-name residual.
    pub fn qualify(&self, iri: &str) -> Option<Node> {
        for (name, prefix_iri) in &self.prefixes {
            if let Some(suffix) = iri.strip_prefix(prefix_iri.text()) {
                if is_valid_local_name(suffix) {
                    return Some(Node::make_curie(format!("{}:{}", name, suffix)));
                }
            }
        }
        None
    }

    /// Expand a node against this environment: resolve IRIs, expand CURIEs,
    /// recursively expand a literal's CURIE/relative-IRI datatype, and pass
    /// blank nodes through unchanged.
    pub fn expand(&self, node: &Node) -> Result<Node> {
        match node.kind() {
            NodeKind::Iri => {
                let base = self.base.as_ref();
                if Uri::has_scheme(node.text()) {
                    Ok(node.clone())
                } else {
                    let base = base.ok_or_else(|| Error::BadArgument("relative IRI with no base".into()))?;
                    Node::make_resolved_iri(node.text(), base)
                        .ok_or_else(|| Error::BadArgument("IRI did not resolve to an absolute IRI".into()))
                }
            }
            NodeKind::Curie => {
                let (prefix, suffix) = node
                    .text()
                    .split_once(':')
                    .ok_or_else(|| Error::BadCurie("CURIE missing ':'".into()))?;
                let iri = self
                    .prefixes
                    .iter()
                    .find(|(name, _)| name.as_ref() == prefix)
                    .map(|(_, iri)| iri)
                    .ok_or_else(|| Error::BadCurie(format!("undefined prefix '{prefix}'")))?;
                Ok(Node::make_iri(format!("{}{}", iri.text(), suffix)))
            }
            NodeKind::Blank => Ok(node.clone()),
            NodeKind::Literal => match node.meta() {
                Some(Meta::Datatype(dt)) if matches!(dt.kind(), NodeKind::Curie) || !Uri::has_scheme(dt.text()) => {
                    let expanded_dt = self.expand(dt)?;
                    Node::make_literal(node.text().to_string(), Some(expanded_dt), None)
                }
                _ => Ok(node.clone()),
            },
        }
    }
}

fn is_valid_local_name(suffix: &str) -> bool {
    !suffix.is_empty()
        && !suffix.contains(|c: char| matches!(c, '/' | '#' | '?' | ':'))
}
