//! Canonicalizes a statement's object literal on the way through a sink
//! chain: `"5.10"^^xsd:decimal` becomes `"5.1"^^xsd:decimal`,
//! `"007"^^xsd:int` loses its leading zeros, `"TRUE"^^xsd:boolean` becomes
//! `"true"^^xsd:boolean`. Grounded in
//! `examples/original_source/src/normalise.c` (`serd_node_normalise`,
//! `serd_normalise_decimal`, `serd_normalise_integer`).
//!
//! An optional convenience sink, not required by any operation spec.md §4
//! names — it lives behind its own module and is exercised by its own
//! tests only.

use rdf_model::{vocab, Environment, Node};

use crate::sink::{Event, Sink};

/// `xsd:` integer subtypes `serd_node_normalise` also canonicalizes
/// (besides `xsd:integer` itself): leading zeros are stripped the same way
/// as for a plain integer.
const INTEGER_SUBTYPES: &[&str] = &[
    "byte",
    "int",
    "integer",
    "long",
    "negativeInteger",
    "nonNegativeInteger",
    "nonPositiveInteger",
    "positiveInteger",
    "short",
    "unsignedByte",
    "unsignedInt",
    "unsignedLong",
    "unsignedShort",
];

/// Wraps `target`, rewriting each `Statement` event's object to its
/// canonical lexical form when the object is a literal whose
/// (environment-expanded) datatype is `xsd:boolean`, `xsd:float`,
/// `xsd:double`, `xsd:decimal`, or an `xsd:` integer subtype. Objects with
/// any other datatype, no datatype, or a lexical form that fails to parse
/// as the recognized datatype pass through unchanged.
pub struct NormalisingSink<'e, T> {
    target: T,
    env: &'e Environment,
}

impl<'e, T: Sink> NormalisingSink<'e, T> {
    pub fn new(target: T, env: &'e Environment) -> NormalisingSink<'e, T> {
        NormalisingSink { target, env }
    }

    /// Unwraps the normalizer, returning the wrapped sink.
    pub fn into_inner(self) -> T {
        self.target
    }
}

impl<'e, T: Sink> Sink for NormalisingSink<'e, T> {
    type Error = T::Error;

    fn event(&mut self, event: Event<'_>) -> Result<(), T::Error> {
        match event {
            Event::Statement(flags, stmt) => match normalise(self.env, &stmt.object) {
                Some(object) => {
                    let mut rebuilt = stmt.clone();
                    rebuilt.object = object;
                    self.target.event(Event::Statement(flags, &rebuilt))
                }
                None => self.target.event(Event::Statement(flags, stmt)),
            },
            other => self.target.event(other),
        }
    }
}

/// Canonical form of `node`, or `None` if it should pass through unchanged
/// (wrong kind, no datatype, an unrecognized datatype, or a lexical form
/// that doesn't parse as that datatype).
fn normalise(env: &Environment, node: &Node) -> Option<Node> {
    if !node.is_literal() {
        return None;
    }
    let datatype = env.expand(node.datatype()?).ok()?;
    let datatype_uri = datatype.text();

    if datatype_uri == vocab::XSD_BOOLEAN {
        normalise_boolean(node.text())
    } else if datatype_uri == vocab::XSD_FLOAT {
        node.text().trim().parse::<f32>().ok().map(Node::make_float)
    } else if datatype_uri == vocab::XSD_DOUBLE {
        node.text().trim().parse::<f64>().ok().map(Node::make_double)
    } else if datatype_uri == vocab::XSD_DECIMAL {
        normalise_decimal(node.text())
    } else {
        let local = datatype_uri.strip_prefix(vocab::XSD_NS)?;
        if INTEGER_SUBTYPES.contains(&local) {
            normalise_integer(node.text(), datatype.clone())
        } else {
            None
        }
    }
}

fn normalise_boolean(text: &str) -> Option<Node> {
    match text.trim() {
        "false" | "0" => Some(Node::make_boolean(false)),
        "true" | "1" => Some(Node::make_boolean(true)),
        _ => None,
    }
}

/// Splits off a leading sign, returning `("-", rest)`, `("", rest)` for an
/// explicit `+`, or `("", s)` for no sign at all — `serd_normalise_decimal`
/// and `serd_normalise_integer` share this first step.
fn split_sign(s: &str) -> (&'static str, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        ("-", rest)
    } else if let Some(rest) = s.strip_prefix('+') {
        ("", rest)
    } else {
        ("", s)
    }
}

fn all_digits(s: &str) -> bool {
    s.bytes().all(|b| b.is_ascii_digit())
}

/// Mirrors `serd_normalise_decimal`'s digit walk: strip the sign, strip
/// leading zeros from the integer part, strip trailing zeros from the
/// fraction, and backfill a missing leading/trailing zero so the result
/// always has a digit on both sides of `.` (the `.5` -> `0.5`, `5.` -> `5.0`
/// cases §8.2 calls out, here applied to canonicalization rather than
/// preservation).
fn normalise_decimal(text: &str) -> Option<Node> {
    let (sign, rest) = split_sign(text.trim());
    let (int_part, frac_part) = match rest.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (rest, None),
    };
    if !all_digits(int_part) || !frac_part.is_none_or(all_digits) {
        return None;
    }

    let int_trimmed = int_part.trim_start_matches('0');
    let frac_trimmed = frac_part.unwrap_or("").trim_end_matches('0');

    let mut out = String::new();
    out.push_str(sign);
    out.push_str(if int_trimmed.is_empty() { "0" } else { int_trimmed });
    out.push('.');
    out.push_str(if frac_trimmed.is_empty() { "0" } else { frac_trimmed });

    Node::make_literal(out, Some(Node::xsd_decimal()), None).ok()
}

/// Mirrors `serd_normalise_integer`: strip the sign, strip leading zeros,
/// and re-attach the sign unconditionally — including for a value that
/// normalizes to zero (`"-0"` stays `"-0"`, matching the source library).
fn normalise_integer(text: &str, datatype: Node) -> Option<Node> {
    let (sign, rest) = split_sign(text.trim());
    if !all_digits(rest) {
        return None;
    }
    let digits = rest.trim_start_matches('0');
    let digits = if digits.is_empty() { "0" } else { digits };

    let mut out = String::with_capacity(sign.len() + digits.len());
    out.push_str(sign);
    out.push_str(digits);

    Node::make_literal(out, Some(datatype), None).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::StatementFlags;
    use rdf_model::Statement;

    #[derive(Default)]
    struct CollectSink {
        statements: Vec<Statement>,
    }

    impl Sink for CollectSink {
        type Error = std::convert::Infallible;
        fn event(&mut self, event: Event<'_>) -> Result<(), Self::Error> {
            if let Event::Statement(_, stmt) = event {
                self.statements.push(stmt.clone());
            }
            Ok(())
        }
    }

    fn iri(s: &str) -> Node {
        Node::make_iri(s)
    }

    fn literal_stmt(text: &str, datatype: Node) -> Statement {
        Statement::new(
            iri("http://example.org/s"),
            iri("http://example.org/p"),
            Node::make_literal(text, Some(datatype), None).unwrap(),
            None,
        )
        .unwrap()
    }

    fn run(stmt: &Statement, env: &Environment) -> Node {
        let mut sink = NormalisingSink::new(CollectSink::default(), env);
        sink.event(Event::Statement(StatementFlags::empty(), stmt)).unwrap();
        sink.into_inner().statements.into_iter().next().unwrap().object
    }

    #[test]
    fn decimal_drops_trailing_and_leading_zeros() {
        let stmt = literal_stmt("007.100", Node::xsd_decimal());
        let env = Environment::new();
        assert_eq!(run(&stmt, &env).text(), "7.1");
    }

    #[test]
    fn decimal_backfills_missing_leading_zero() {
        let stmt = literal_stmt(".5", Node::xsd_decimal());
        let env = Environment::new();
        assert_eq!(run(&stmt, &env).text(), "0.5");
    }

    #[test]
    fn decimal_backfills_missing_trailing_zero() {
        let stmt = literal_stmt("5.", Node::xsd_decimal());
        let env = Environment::new();
        assert_eq!(run(&stmt, &env).text(), "5.0");
    }

    #[test]
    fn integer_subtype_drops_leading_zeros() {
        let stmt = literal_stmt("007", Node::xsd_integer());
        let env = Environment::new();
        assert_eq!(run(&stmt, &env).text(), "7");
    }

    #[test]
    fn negative_zero_integer_keeps_its_sign() {
        let stmt = literal_stmt("-0", Node::xsd_integer());
        let env = Environment::new();
        assert_eq!(run(&stmt, &env).text(), "-0");
    }

    #[test]
    fn boolean_tokens_and_digits_both_normalise() {
        let env = Environment::new();
        assert_eq!(run(&literal_stmt("1", Node::xsd_boolean()), &env).text(), "true");
        assert_eq!(run(&literal_stmt("0", Node::xsd_boolean()), &env).text(), "false");
    }

    #[test]
    fn unrecognized_datatype_passes_through_unchanged() {
        let stmt = literal_stmt("hello", iri("http://example.org/custom"));
        let env = Environment::new();
        assert_eq!(run(&stmt, &env).text(), "hello");
    }

    #[test]
    fn expands_curie_datatype_before_matching() {
        let mut env = Environment::new();
        env.set_prefix("xsd", iri(vocab::XSD_NS)).unwrap();
        let stmt = literal_stmt("007", Node::make_curie("xsd:integer"));
        assert_eq!(run(&stmt, &env).text(), "7");
    }
}
