//! Abbreviating serializer: a [`Sink`] that renders the event stream back
//! into bytes for one of the four syntaxes. Grounded in the teacher's
//! push-based `ByteSink`/`BufferedSink` pairing; the abbreviation state
//! machine follows the advisory [`StatementFlags`] a [`Reader`](crate::reader::Reader)
//! (or any other producer) attaches to a statement, rather than
//! re-deriving grouping opportunities from scratch.

use rdf_model::{vocab, Environment, Node, NodeKind, Statement};
use smallvec::SmallVec;

use crate::byte_sink::{BufferedSink, ByteSink};
use crate::sink::{Event, Sink, StatementFlags};
use crate::{Syntax, WriteError, WriteResult};

/// Writer configuration.
#[derive(Debug, Clone)]
pub struct WriterConfig {
    /// Which of the four syntaxes to emit.
    pub syntax: Syntax,
    /// Byte-sink block size.
    pub block_size: usize,
    /// Escape every codepoint outside `U+0020..U+007E` as `\uXXXX`/`\UXXXXXXXX`
    /// rather than emitting raw UTF-8 (§4.G.2).
    pub ascii_only: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig { syntax: Syntax::NTriples, block_size: 4096, ascii_only: false }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupKind {
    Anon,
    List,
}

#[derive(Debug, Clone)]
struct GroupFrame {
    /// The blank node identifying this group; for a list this is the
    /// original head (used to match the producer's `End` event), while
    /// `cursor` tracks the current `rdf:first`/`rdf:rest` position.
    node: Node,
    cursor: Node,
    kind: GroupKind,
    last_predicate: Option<Node>,
}

/// Streaming writer. Consumes [`Event`]s and serializes them immediately;
/// call [`Writer::finish`] to flush the final terminator and byte sink.
pub struct Writer<S> {
    sink: BufferedSink<S>,
    config: WriterConfig,
    env: Environment,
    top_subject: Option<Node>,
    top_predicate: Option<Node>,
    pending_terminator: bool,
    current_graph: Option<Node>,
    /// Nesting depth of open `[ ]`/`( )` groups. `SmallVec` avoids a heap
    /// allocation for the common case of shallow or no nesting.
    stack: SmallVec<[GroupFrame; 4]>,
    poisoned: bool,
}

impl<S: ByteSink> Writer<S> {
    /// Construct a writer over `sink` with the given configuration.
    pub fn new(sink: S, config: WriterConfig) -> Writer<S> {
        let block_size = config.block_size;
        Writer {
            sink: BufferedSink::new(sink, block_size),
            config,
            env: Environment::new(),
            top_subject: None,
            top_predicate: None,
            pending_terminator: false,
            current_graph: None,
            stack: SmallVec::new(),
            poisoned: false,
        }
    }

    /// Flush any pending terminator, close an open graph block, and return
    /// the underlying byte sink.
    pub fn finish(mut self) -> WriteResult<S> {
        self.close_pending()?;
        self.sink.finish().map_err(WriteError::Io)
    }

    fn close_pending(&mut self) -> WriteResult<()> {
        if self.pending_terminator {
            self.write_raw(" .\n")?;
            self.pending_terminator = false;
        }
        if self.current_graph.is_some() {
            self.write_raw("}\n")?;
            self.current_graph = None;
        }
        Ok(())
    }

    fn write_raw(&mut self, s: &str) -> WriteResult<()> {
        self.sink.write(s.as_bytes()).map_err(WriteError::Io)
    }

    // ---- term serialization ---------------------------------------------

    fn write_iri_text(&mut self, text: &str) -> WriteResult<()> {
        if let Some(curie) = self.env.qualify(text) {
            self.write_raw(curie.text())
        } else {
            self.write_raw("<")?;
            self.write_raw(text)?;
            self.write_raw(">")
        }
    }

    fn write_term(&mut self, node: &Node) -> WriteResult<()> {
        match node.kind() {
            NodeKind::Iri => self.write_iri_text(node.text()),
            NodeKind::Curie => self.write_raw(node.text()),
            NodeKind::Blank => {
                self.write_raw("_:")?;
                self.write_raw(node.text())
            }
            NodeKind::Literal => self.write_literal(node),
        }
    }

    fn write_predicate_term(&mut self, node: &Node) -> WriteResult<()> {
        if self.config.syntax.is_terse() && node.is_iri() && node.text() == vocab::RDF_TYPE {
            self.write_raw("a")
        } else {
            self.write_term(node)
        }
    }

    fn write_literal(&mut self, node: &Node) -> WriteResult<()> {
        if self.config.syntax.is_terse() {
            if let Some(bare) = bare_numeric_form(node) {
                return self.write_raw(bare);
            }
        }
        let text = node.text();
        if self.config.syntax.is_terse() && (text.contains('\n') || text.contains('"')) {
            self.write_raw("\"\"\"")?;
            self.write_long_escaped(text)?;
            self.write_raw("\"\"\"")?;
        } else {
            self.write_raw("\"")?;
            self.write_escaped(text)?;
            self.write_raw("\"")?;
        }
        if let Some(lang) = node.language() {
            self.write_raw("@")?;
            self.write_raw(lang)?;
        } else if let Some(dt) = node.datatype() {
            if !(self.config.syntax.is_terse() && dt.is_iri() && dt.text() == vocab::XSD_STRING) {
                self.write_raw("^^")?;
                self.write_term(dt)?;
            }
        }
        Ok(())
    }

    fn write_escaped(&mut self, text: &str) -> WriteResult<()> {
        let mut start = 0;
        for (i, c) in text.char_indices() {
            let esc: Option<String> = match c {
                '\\' => Some("\\\\".to_string()),
                '"' => Some("\\\"".to_string()),
                '\n' => Some("\\n".to_string()),
                '\r' => Some("\\r".to_string()),
                '\t' => Some("\\t".to_string()),
                c if self.config.ascii_only && !(' '..='~').contains(&c) => Some(unicode_escape(c)),
                _ => None,
            };
            if let Some(esc) = esc {
                self.write_raw(&text[start..i])?;
                self.write_raw(&esc)?;
                start = i + c.len_utf8();
            }
        }
        self.write_raw(&text[start..])
    }

    /// Escapes `text` for the body of a triple-quoted literal (§4.G.2,
    /// §8.2). Bare newlines and lone `"` are left as-is, since only a run
    /// of three quotes would close the literal early; the one case that
    /// is ambiguous is `"` as the very last character, which would merge
    /// with the closing `"""`, so that occurrence alone is escaped.
    fn write_long_escaped(&mut self, text: &str) -> WriteResult<()> {
        let mut start = 0;
        let char_count = text.chars().count();
        for (idx, (i, c)) in text.char_indices().enumerate() {
            let esc: Option<String> = match c {
                '\\' => Some("\\\\".to_string()),
                '"' if idx + 1 == char_count => Some("\\\"".to_string()),
                c if self.config.ascii_only && !(' '..='~').contains(&c) && c != '\n' && c != '\r' && c != '\t' => {
                    Some(unicode_escape(c))
                }
                _ => None,
            };
            if let Some(esc) = esc {
                self.write_raw(&text[start..i])?;
                self.write_raw(&esc)?;
                start = i + c.len_utf8();
            }
        }
        self.write_raw(&text[start..])
    }

    // ---- flat (N-Triples / N-Quads) ----------------------------------

    fn write_flat_statement(&mut self, stmt: &Statement) -> WriteResult<()> {
        self.write_term(&stmt.subject)?;
        self.write_raw(" ")?;
        self.write_term(&stmt.predicate)?;
        self.write_raw(" ")?;
        self.write_term(&stmt.object)?;
        if self.config.syntax.has_graphs() {
            if let Some(g) = &stmt.graph {
                self.write_raw(" ")?;
                self.write_term(g)?;
            }
        }
        self.write_raw(" .\n")
    }

    // ---- terse (Turtle / TriG) -----------------------------------------

    fn switch_graph(&mut self, graph: Option<&Node>) -> WriteResult<()> {
        if self.current_graph.as_ref() == graph {
            return Ok(());
        }
        self.close_pending()?;
        self.top_subject = None;
        self.top_predicate = None;
        if let Some(g) = graph {
            self.write_term(g)?;
            self.write_raw(" {\n")?;
            self.current_graph = Some(g.clone());
        }
        Ok(())
    }

    fn write_predicate_object_separator(&mut self, frame_last: &Option<Node>, predicate: &Node) -> WriteResult<bool> {
        let same_pred = frame_last.as_ref() == Some(predicate);
        if same_pred {
            self.write_raw(" , ")?;
        } else if frame_last.is_some() {
            self.write_raw(" ;\n  ")?;
            self.write_predicate_term(predicate)?;
            self.write_raw(" ")?;
        } else {
            self.write_raw(" ")?;
            self.write_predicate_term(predicate)?;
            self.write_raw(" ")?;
        }
        Ok(same_pred)
    }

    fn open_group(&mut self, node: &Node, flags: StatementFlags, anon_flag: StatementFlags, list_flag: StatementFlags) -> WriteResult<bool> {
        if flags.contains(anon_flag) {
            self.write_raw("[")?;
            self.stack.push(GroupFrame {
                node: node.clone(),
                cursor: node.clone(),
                kind: GroupKind::Anon,
                last_predicate: None,
            });
            Ok(true)
        } else if flags.contains(list_flag) {
            self.write_raw("(")?;
            self.stack.push(GroupFrame {
                node: node.clone(),
                cursor: node.clone(),
                kind: GroupKind::List,
                last_predicate: None,
            });
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn close_group_if_matching(&mut self, node: &Node) -> WriteResult<()> {
        if self.stack.last().map(|f| &f.node) == Some(node) {
            let frame = self.stack.pop().unwrap();
            match frame.kind {
                GroupKind::Anon => self.write_raw(" ]")?,
                GroupKind::List => self.write_raw(" )")?,
            }
            if self.stack.is_empty() {
                self.top_subject = Some(frame.node);
                self.top_predicate = None;
                self.pending_terminator = true;
            }
        }
        Ok(())
    }

    fn write_object_value(&mut self, object: &Node, flags: StatementFlags) -> WriteResult<()> {
        let opened = self.open_group(object, flags, StatementFlags::ANON_O_BEGIN, StatementFlags::LIST_O_BEGIN)?;
        if !opened {
            self.write_term(object)?;
        }
        Ok(())
    }

    fn handle_in_group_statement(&mut self, flags: StatementFlags, stmt: &Statement) -> WriteResult<()> {
        let idx = self.stack.len() - 1;
        match self.stack[idx].kind {
            GroupKind::Anon => {
                let last = self.stack[idx].last_predicate.clone();
                self.write_predicate_object_separator(&last, &stmt.predicate)?;
                self.write_object_value(&stmt.object, flags)?;
                self.stack[idx].last_predicate = Some(stmt.predicate.clone());
            }
            GroupKind::List => {
                if stmt.predicate.is_iri() && stmt.predicate.text() == vocab::RDF_FIRST {
                    self.write_raw(" ")?;
                    self.write_object_value(&stmt.object, flags)?;
                } else if stmt.predicate.is_iri() && stmt.predicate.text() == vocab::RDF_REST {
                    if !(stmt.object.is_iri() && stmt.object.text() == vocab::RDF_NIL) {
                        self.stack[idx].cursor = stmt.object.clone();
                    }
                }
            }
        }
        Ok(())
    }

    fn handle_top_level_statement(&mut self, flags: StatementFlags, stmt: &Statement) -> WriteResult<()> {
        self.switch_graph(stmt.graph.as_ref())?;

        let same_subject = self.top_subject.as_ref() == Some(&stmt.subject) && self.pending_terminator;
        if !same_subject {
            self.close_pending_for_new_subject()?;
            let opened =
                self.open_group(&stmt.subject, flags, StatementFlags::ANON_S_BEGIN, StatementFlags::LIST_S_BEGIN)?;
            if !opened {
                self.write_term(&stmt.subject)?;
                self.top_subject = Some(stmt.subject.clone());
                self.top_predicate = None;
                self.pending_terminator = true;
            } else {
                // The first predicate/object pair of a fresh bracketed
                // subject arrives as this very statement.
                self.handle_in_group_statement(flags, stmt)?;
                return Ok(());
            }
        }

        if self.stack.is_empty() {
            let same_pred = self.write_predicate_object_separator(&self.top_predicate.clone(), &stmt.predicate)?;
            self.write_object_value(&stmt.object, flags)?;
            if !same_pred {
                self.top_predicate = Some(stmt.predicate.clone());
            }
        } else {
            self.handle_in_group_statement(flags, stmt)?;
        }
        Ok(())
    }

    fn close_pending_for_new_subject(&mut self) -> WriteResult<()> {
        if self.pending_terminator {
            self.write_raw(" .\n")?;
            self.pending_terminator = false;
        }
        Ok(())
    }

    fn handle_statement(&mut self, flags: StatementFlags, stmt: &Statement) -> WriteResult<()> {
        if !self.config.syntax.is_terse() {
            return self.write_flat_statement(stmt);
        }
        if self.stack.is_empty() {
            self.handle_top_level_statement(flags, stmt)
        } else {
            let subject_matches_cursor = self.stack.last().map(|f| &f.cursor) == Some(&stmt.subject);
            if subject_matches_cursor {
                self.handle_in_group_statement(flags, stmt)
            } else {
                // A statement whose subject returned to the (possibly
                // nested) enclosing frame after a fully-closed group.
                self.handle_top_level_statement(flags, stmt)
            }
        }
    }

    fn handle_end(&mut self, node: &Node) -> WriteResult<()> {
        self.close_group_if_matching(node)
    }
}

impl<S: ByteSink> Sink for Writer<S> {
    type Error = WriteError;

    fn event(&mut self, event: Event<'_>) -> Result<(), WriteError> {
        if self.poisoned {
            return Err(WriteError::BadCall("writer is poisoned after a previous error".into()));
        }
        let result = match event {
            Event::Base(iri) => {
                self.close_pending().and_then(|_| {
                    self.env.set_base(iri.clone())?;
                    if self.config.syntax.is_terse() {
                        self.write_raw("@base <")?;
                        self.write_raw(iri.text())?;
                        self.write_raw("> .\n")?;
                    }
                    Ok(())
                })
            }
            Event::Prefix(name, iri) => self.close_pending().and_then(|_| {
                self.env.set_prefix(name, iri.clone())?;
                if self.config.syntax.is_terse() {
                    self.write_raw("@prefix ")?;
                    self.write_raw(name)?;
                    self.write_raw(": <")?;
                    self.write_raw(iri.text())?;
                    self.write_raw("> .\n")?;
                }
                Ok(())
            }),
            Event::Statement(flags, stmt) => self.handle_statement(flags, stmt),
            Event::End(node) => self.handle_end(node),
        };
        if result.is_err() {
            self.poisoned = true;
        }
        result
    }
}

fn unicode_escape(c: char) -> String {
    let cp = c as u32;
    if cp <= 0xFFFF {
        format!("\\u{cp:04X}")
    } else {
        format!("\\U{cp:08X}")
    }
}

fn bare_numeric_form(node: &Node) -> Option<&str> {
    let dt = node.datatype()?;
    if !dt.is_iri() {
        return None;
    }
    let text = node.text();
    match dt.text() {
        vocab::XSD_INTEGER if is_bare_integer(text) => Some(text),
        vocab::XSD_DECIMAL if is_bare_decimal(text) => Some(text),
        vocab::XSD_DOUBLE if is_bare_double(text) => Some(text),
        vocab::XSD_BOOLEAN if matches!(text, "true" | "false") => Some(text),
        _ => None,
    }
}

fn is_bare_integer(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

fn is_bare_decimal(s: &str) -> bool {
    let s = s.strip_prefix(['+', '-']).unwrap_or(s);
    let Some((int_part, frac_part)) = s.split_once('.') else { return false };
    !int_part.is_empty()
        && !frac_part.is_empty()
        && int_part.bytes().all(|b| b.is_ascii_digit())
        && frac_part.bytes().all(|b| b.is_ascii_digit())
}

fn is_bare_double(s: &str) -> bool {
    let Some(e_pos) = s.find(['e', 'E']) else { return false };
    let (mantissa, exp) = s.split_at(e_pos);
    let exp = &exp[1..];
    let exp_digits = exp.strip_prefix(['+', '-']).unwrap_or(exp);
    (is_bare_decimal(mantissa) || is_bare_integer(mantissa))
        && !exp_digits.is_empty()
        && exp_digits.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rdf_model::Statement;

    fn write_to_string(config: WriterConfig, events: impl FnOnce(&mut Writer<Vec<u8>>) -> WriteResult<()>) -> String {
        let mut writer = Writer::new(Vec::new(), config);
        events(&mut writer).unwrap();
        let bytes = writer.finish().unwrap();
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn flat_statement_round_trip_text() {
        let out = write_to_string(WriterConfig { syntax: Syntax::NTriples, ..WriterConfig::default() }, |w| {
            let stmt = Statement::new(
                Node::make_iri("http://example.org/s"),
                Node::make_iri("http://example.org/p"),
                Node::make_string("o"),
                None,
            )
            .unwrap();
            w.event(Event::Statement(StatementFlags::empty(), &stmt))
        });
        assert_eq!(out, "<http://example.org/s> <http://example.org/p> \"o\" .\n");
    }

    #[test]
    fn prefix_directive_then_qualified_statement() {
        let out = write_to_string(WriterConfig { syntax: Syntax::Turtle, ..WriterConfig::default() }, |w| {
            let prefix_iri = Node::make_iri("http://example.org/");
            w.event(Event::Prefix("eg", &prefix_iri))?;
            let stmt = Statement::new(
                Node::make_iri("http://example.org/s"),
                Node::make_iri("http://example.org/p"),
                Node::make_string("o"),
                None,
            )
            .unwrap();
            w.event(Event::Statement(StatementFlags::empty(), &stmt))
        });
        assert!(out.starts_with("@prefix eg: <http://example.org/> .\n"));
        assert!(out.contains("eg:s eg:p \"o\""));
    }

    #[test]
    fn predicate_object_continuation_uses_semicolon() {
        let out = write_to_string(WriterConfig { syntax: Syntax::Turtle, ..WriterConfig::default() }, |w| {
            let s = Node::make_iri("http://example.org/s");
            let p1 = Node::make_iri("http://example.org/p1");
            let p2 = Node::make_iri("http://example.org/p2");
            let stmt1 = Statement::new(s.clone(), p1, Node::make_string("a"), None).unwrap();
            let stmt2 = Statement::new(s, p2, Node::make_string("b"), None).unwrap();
            w.event(Event::Statement(StatementFlags::empty(), &stmt1))?;
            w.event(Event::Statement(StatementFlags::empty(), &stmt2))
        });
        assert!(out.contains(" ;\n"));
    }

    #[test]
    fn object_list_uses_comma() {
        let out = write_to_string(WriterConfig { syntax: Syntax::Turtle, ..WriterConfig::default() }, |w| {
            let s = Node::make_iri("http://example.org/s");
            let p = Node::make_iri("http://example.org/p");
            let stmt1 = Statement::new(s.clone(), p.clone(), Node::make_string("a"), None).unwrap();
            let stmt2 = Statement::new(s, p, Node::make_string("b"), None).unwrap();
            w.event(Event::Statement(StatementFlags::empty(), &stmt1))?;
            w.event(Event::Statement(StatementFlags::empty(), &stmt2))
        });
        assert!(out.contains(" , "));
    }

    #[test]
    fn anonymous_blank_writes_brackets() {
        let out = write_to_string(WriterConfig { syntax: Syntax::Turtle, ..WriterConfig::default() }, |w| {
            let blank = Node::make_blank("b0");
            let outer_s = Node::make_iri("http://example.org/s");
            let outer_p = Node::make_iri("http://example.org/p");
            let inner_p = Node::make_iri("http://example.org/ip");

            let opening = Statement::new(blank.clone(), inner_p, Node::make_string("v"), None).unwrap();
            w.event(Event::Statement(StatementFlags::ANON_S_BEGIN, &opening))?;
            w.event(Event::End(&blank))?;

            let outer = Statement::new(blank, outer_p, Node::make_string("tail"), None).unwrap();
            w.event(Event::Statement(StatementFlags::empty(), &outer))
        });
        assert!(out.starts_with("[ "));
        assert!(out.contains("] "));
    }

    #[test]
    fn rdf_type_abbreviates_to_a() {
        let out = write_to_string(WriterConfig { syntax: Syntax::Turtle, ..WriterConfig::default() }, |w| {
            let stmt = Statement::new(
                Node::make_iri("http://example.org/s"),
                Node::make_iri(vocab::RDF_TYPE),
                Node::make_iri("http://example.org/Thing"),
                None,
            )
            .unwrap();
            w.event(Event::Statement(StatementFlags::empty(), &stmt))
        });
        assert!(out.contains(" a <http://example.org/Thing>"));
    }

    #[test]
    fn bare_integer_literal_is_unquoted() {
        let out = write_to_string(WriterConfig { syntax: Syntax::Turtle, ..WriterConfig::default() }, |w| {
            let stmt = Statement::new(
                Node::make_iri("http://example.org/s"),
                Node::make_iri("http://example.org/p"),
                Node::make_integer(5, None),
                None,
            )
            .unwrap();
            w.event(Event::Statement(StatementFlags::empty(), &stmt))
        });
        assert!(out.contains(" 5 ."));
    }

    #[test]
    fn nquads_writes_graph_term() {
        let out = write_to_string(WriterConfig { syntax: Syntax::NQuads, ..WriterConfig::default() }, |w| {
            let stmt = Statement::new(
                Node::make_iri("http://example.org/s"),
                Node::make_iri("http://example.org/p"),
                Node::make_string("o"),
                Some(Node::make_iri("http://example.org/g")),
            )
            .unwrap();
            w.event(Event::Statement(StatementFlags::empty(), &stmt))
        });
        assert_eq!(
            out,
            "<http://example.org/s> <http://example.org/p> \"o\" <http://example.org/g> .\n"
        );
    }

    #[test]
    fn literal_with_newline_and_quote_uses_triple_quoted_form() {
        let out = write_to_string(WriterConfig { syntax: Syntax::Turtle, ..WriterConfig::default() }, |w| {
            let stmt = Statement::new(
                Node::make_iri("http://example.org/s"),
                Node::make_iri("http://example.org/p"),
                Node::make_string("line one\nsays \"hi\""),
                None,
            )
            .unwrap();
            w.event(Event::Statement(StatementFlags::empty(), &stmt))
        });
        assert!(out.contains("\"\"\"line one\nsays \"hi\\\"\"\"\""));
    }

    #[test]
    fn literal_ending_in_quote_escapes_only_the_final_one() {
        let out = write_to_string(WriterConfig { syntax: Syntax::Turtle, ..WriterConfig::default() }, |w| {
            let stmt = Statement::new(
                Node::make_iri("http://example.org/s"),
                Node::make_iri("http://example.org/p"),
                Node::make_string("ends with a quote\""),
                None,
            )
            .unwrap();
            w.event(Event::Statement(StatementFlags::empty(), &stmt))
        });
        assert!(out.contains("\"\"\"ends with a quote\\\"\"\"\""));
    }

    #[test]
    fn single_line_literal_without_newline_or_quote_stays_single_quoted() {
        let out = write_to_string(WriterConfig { syntax: Syntax::Turtle, ..WriterConfig::default() }, |w| {
            let stmt = Statement::new(
                Node::make_iri("http://example.org/s"),
                Node::make_iri("http://example.org/p"),
                Node::make_string("plain"),
                None,
            )
            .unwrap();
            w.event(Event::Statement(StatementFlags::empty(), &stmt))
        });
        assert!(out.contains(" \"plain\""));
        assert!(!out.contains("\"\"\""));
    }
}
