//! Builds the example tree from scanner events.
//!
//! Containers are addressed by their child-index path from the root while
//! they are open. Annotations are handed to the rule loader (`rule`) and
//! attach to the value that precedes them on their source line.
mod all_of;
mod enums;
mod or;
mod rule;
mod shortcut;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::constraint::{Constraint, ConstraintKind};
use crate::error::{ErrorKind, Result, SchemaError, fail};
use crate::lexeme::{LexEvent, LexKind};
use crate::literal::Literal;
use crate::node::{Key, Node, NodeKind, Span};
use crate::scanner::Scanner;
use crate::schema::{RuleRegistry, Schema, anonymous_name};

pub(crate) struct Loader<'a> {
    src: &'a [u8],
    events: Scanner<'a>,
    rules: &'a RuleRegistry,
    root: Option<Node>,
    /// Paths of the containers that are still open, innermost last.
    open: Vec<Vec<usize>>,
    key: Option<Key>,
    key_shortcut: bool,
    /// Annotation target on the current line.
    line_target: LineTarget,
    /// Containers opened on the current line.
    line_opened: Vec<Vec<usize>>,
    anonymous: IndexMap<String, Node>,
}

/// What an annotation on the current line would apply to.
enum LineTarget {
    None,
    Node(Vec<usize>),
    /// A container that opened and closed on this line around its children.
    Several,
}

/// Loads one schema body. Rules are attached as written; reconciling them is
/// the compiler's job.
pub(crate) fn load(src: &[u8], rules: &RuleRegistry) -> Result<Schema> {
    Loader::new(src, rules).run()
}

impl<'a> Loader<'a> {
    fn new(src: &'a [u8], rules: &'a RuleRegistry) -> Self {
        Self {
            src,
            events: Scanner::new(src),
            rules,
            root: None,
            open: Vec::new(),
            key: None,
            key_shortcut: false,
            line_target: LineTarget::None,
            line_opened: Vec::new(),
            anonymous: IndexMap::new(),
        }
    }

    fn run(mut self) -> Result<Schema> {
        trace!(bytes = self.src.len(), "loading schema");
        while let Some(event) = self.next_event()? {
            match event.kind {
                LexKind::ObjectBegin => self.attach(Node::object(event.begin), true)?,
                LexKind::ArrayBegin => self.attach(Node::array(event.begin), true)?,
                LexKind::ObjectEnd | LexKind::ArrayEnd => self.close(event)?,
                LexKind::LiteralEnd => {
                    let literal = self.literal(event)?;
                    self.attach(Node::literal(literal, span(event)), false)?;
                }
                LexKind::KeyShortcutBegin => self.key_shortcut = true,
                LexKind::ObjectKeyEnd => self.read_key(event)?,
                LexKind::TypesShortcutEnd => {
                    let node = self.shortcut_node(event)?;
                    self.attach(node, false)?;
                }
                LexKind::InlineAnnotationBegin | LexKind::MultiLineAnnotationBegin => self.annotate(event)?,
                LexKind::NewLine => {
                    self.line_target = LineTarget::None;
                    self.line_opened.clear();
                }
                LexKind::EndTop => break,
                _ => {}
            }
        }
        let root = self.root.ok_or_else(|| SchemaError::new(ErrorKind::EmptySchema))?;
        debug!(nodes = root.count(), anonymous = self.anonymous.len(), "schema loaded");
        Ok(Schema::with_anonymous(root, self.anonymous))
    }

    fn next_event(&mut self) -> Result<Option<LexEvent>> {
        self.events.next().transpose()
    }

    /// Next event inside a construct that must still be closed.
    fn expect_event(&mut self, context: &'static str) -> Result<LexEvent> {
        match self.next_event()? {
            Some(event) => Ok(event),
            None => fail(ErrorKind::UnexpectedEof { context }, self.src.len()),
        }
    }

    fn literal(&self, event: LexEvent) -> Result<Literal> {
        Literal::from_token(event.bytes(self.src)).map_err(|kind| SchemaError::new(kind).at(event.begin))
    }

    // ------------------------------- Tree ----------------------------------- //

    fn node_mut(&mut self, path: &[usize]) -> Result<&mut Node> {
        let at = self.src.len();
        self.root
            .as_mut()
            .and_then(|root| root.descendant_mut(path))
            .ok_or_else(|| SchemaError::new(ErrorKind::UnexpectedEof { context: "while building the tree" }).at(at))
    }

    /// Inserts a new node into the innermost open container, or makes it the
    /// root. Containers stay open until their end event.
    fn attach(&mut self, node: Node, is_container: bool) -> Result<()> {
        let begin = node.span.begin;
        let path = match self.open.last().cloned() {
            None => {
                if self.root.is_some() {
                    return fail(
                        ErrorKind::UnexpectedLexeme { kind: LexKind::LiteralBegin, context: "after the root value" },
                        begin,
                    );
                }
                self.root = Some(node);
                Vec::new()
            }
            Some(mut path) => {
                let key = self.key.take();
                let parent = self.node_mut(&path)?;
                let index = match &mut parent.kind {
                    NodeKind::Object(props) => {
                        let Some(key) = key else {
                            return fail(
                                ErrorKind::UnexpectedLexeme { kind: LexKind::ObjectValueBegin, context: "without a key" },
                                begin,
                            );
                        };
                        if props.contains_key(&key) {
                            return fail(ErrorKind::DuplicateKey(key.name), begin);
                        }
                        props.insert(key, node);
                        props.len() - 1
                    }
                    NodeKind::Array(items) => {
                        items.push(node);
                        items.len() - 1
                    }
                    NodeKind::Literal(_) | NodeKind::Mixed => {
                        return fail(
                            ErrorKind::UnexpectedLexeme { kind: LexKind::ObjectBegin, context: "inside a scalar" },
                            begin,
                        );
                    }
                };
                path.push(index);
                path
            }
        };
        self.line_target = LineTarget::Node(path.clone());
        if is_container {
            self.line_opened.push(path.clone());
            self.open.push(path);
        }
        Ok(())
    }

    fn close(&mut self, event: LexEvent) -> Result<()> {
        let Some(path) = self.open.pop() else {
            return fail(ErrorKind::UnbalancedLexeme { open: None, close: event.kind }, event.begin);
        };
        let node = self.node_mut(&path)?;
        node.span.end = event.end;
        let has_children = node.count() > 1;
        self.line_target = match self.line_opened.contains(&path) {
            true if has_children => LineTarget::Several,
            true => LineTarget::Node(path),
            false => LineTarget::None,
        };
        Ok(())
    }

    fn read_key(&mut self, event: LexEvent) -> Result<()> {
        let raw = event.bytes(self.src);
        let key = if std::mem::take(&mut self.key_shortcut) {
            Key::shortcut(String::from_utf8_lossy(raw))
        } else {
            match Literal::from_token(raw) {
                Ok(Literal::String(name)) => Key::plain(name),
                Ok(_) => return fail(ErrorKind::InvalidString(String::from_utf8_lossy(raw).into_owned()), event.begin),
                Err(kind) => return fail(kind, event.begin),
            }
        };
        self.key = Some(key);
        Ok(())
    }

    fn register_anonymous(&mut self, node: Node) -> String {
        let name = anonymous_name(self.anonymous.len());
        trace!(%name, "anonymous type registered");
        self.anonymous.insert(name.clone(), node);
        name
    }

    // ---------------------------- Annotations ------------------------------- //

    fn annotate(&mut self, begin: LexEvent) -> Result<()> {
        let target = match &self.line_target {
            LineTarget::None => return fail(ErrorKind::AnnotationWithoutExample, begin.begin),
            LineTarget::Node(path) => path.clone(),
            LineTarget::Several => return fail(ErrorKind::AnnotationOnSeveralValues, begin.begin),
        };
        let annotation = self.read_annotation(begin)?;
        let constraints = match annotation.rules {
            Some(entries) => self.rule_constraints(entries)?,
            None => Vec::new(),
        };
        let node = self.node_mut(&target)?;
        apply_rules(node, constraints)?;
        if let Some(text) = annotation.text {
            node.comment = Some(match node.comment.take() {
                Some(previous) => format!("{previous}\n{text}"),
                None => text,
            });
        }
        Ok(())
    }
}

/// Adds loaded rules to a node, then checks each against the node's type.
pub(crate) fn apply_rules(node: &mut Node, constraints: Vec<(Constraint, usize)>) -> Result<()> {
    let mut added: Vec<(ConstraintKind, usize)> = Vec::with_capacity(constraints.len());
    for (constraint, at) in constraints {
        let kind = constraint.kind();
        node.constraints.add(constraint).map_err(|e| SchemaError::new(e).at(at))?;
        added.push((kind, at));
    }
    let json_type = node.effective_type();
    for (kind, at) in added {
        if !kind.is_compatible(json_type) {
            return fail(ErrorKind::IncompatibleRule { rule: kind.name(), json_type }, at);
        }
    }
    Ok(())
}

fn span(event: LexEvent) -> Span {
    Span { begin: event.begin, end: event.end }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constraint::{AdditionalProperties, RuleSource};
    use crate::json_type::JsonType;

    fn load_str(src: &str) -> Result<Schema> {
        load(src.as_bytes(), &RuleRegistry::new())
    }

    fn err(src: &str) -> ErrorKind {
        load_str(src).unwrap_err().kind().clone()
    }

    #[test]
    fn builds_object_tree_in_key_order() {
        let schema = load_str(r#"{"b": 1, "a": [true, null], "c": {"d": "x"}}"#).unwrap();
        let props = schema.root.properties().unwrap();
        let keys: Vec<_> = props.keys().map(|k| k.name.as_str()).collect();
        assert_eq!(keys, vec!["b", "a", "c"]);
        assert_eq!(props[&Key::plain("a")].items().unwrap().len(), 2);
        assert_eq!(schema.root.count(), 6);
    }

    #[test]
    fn container_span_covers_brackets() {
        let src = r#"  {"a": [1, 2]}"#;
        let schema = load_str(src).unwrap();
        assert_eq!(schema.root.span, Span { begin: 2, end: src.len() });
    }

    #[test]
    fn duplicate_keys_are_rejected() {
        assert_eq!(err(r#"{"a": 1, "a": 2}"#), ErrorKind::DuplicateKey("a".into()));
    }

    #[test]
    fn annotation_attaches_to_the_value_on_its_line() {
        let schema = load_str("{\n  \"a\": 1,\n  \"b\": \"x\" // {minLength: 1} - the b\n}").unwrap();
        let b = &schema.root.properties().unwrap()[&Key::plain("b")];
        assert_eq!(b.constraints.get(ConstraintKind::MinLength), Some(&Constraint::MinLength(1)));
        assert_eq!(b.comment.as_deref(), Some("the b"));
    }

    #[test]
    fn annotation_after_opening_bracket_targets_the_container() {
        let schema = load_str("{ // {additionalProperties: true}\n  \"a\": 1\n}").unwrap();
        assert_eq!(
            schema.root.constraints.additional_properties(),
            Some(&AdditionalProperties::Allowed(true))
        );
    }

    #[test]
    fn annotation_needs_a_value_before_it_on_the_line() {
        assert_eq!(err("{\n  \"a\": 1\n  // {optional: true}\n}"), ErrorKind::AnnotationWithoutExample);
        assert_eq!(err("{\n  \"a\": [\n    1\n  ] // {minItems: 1}\n}"), ErrorKind::AnnotationWithoutExample);
        assert_eq!(err(r#"{"a": 1, "b": 2} // {additionalProperties: true}"#), ErrorKind::AnnotationOnSeveralValues);
        assert_eq!(err("{\n  \"a\": [1, 2] // {maxItems: 3}\n}"), ErrorKind::AnnotationOnSeveralValues);
    }

    #[test]
    fn annotation_targets_the_last_value_on_a_shared_line() {
        let schema = load_str("{\"a\": 1, \"b\": \"x\" //{type:\"string\", minLength:1}\n}").unwrap();
        let props = schema.root.properties().unwrap();
        assert!(props[&Key::plain("a")].constraints.is_empty());
        let b = &props[&Key::plain("b")];
        assert_eq!(b.constraints.get(ConstraintKind::MinLength), Some(&Constraint::MinLength(1)));
        assert!(schema.root.constraints.is_empty());

        let schema = load_str("{\n  \"tags\": [], // {maxItems: 0}\n  \"n\": [1, // {min: 0}\n    2\n  ]\n}").unwrap();
        let props = schema.root.properties().unwrap();
        assert_eq!(props[&Key::plain("tags")].constraints.get(ConstraintKind::MaxItems), Some(&Constraint::MaxItems(0)));
        let first = &props[&Key::plain("n")].items().unwrap()[0];
        assert!(first.constraints.has(ConstraintKind::Min));
    }

    #[test]
    fn rules_must_fit_the_example_type() {
        assert_eq!(
            err(r#""x" // {min: 1}"#),
            ErrorKind::IncompatibleRule { rule: "min", json_type: JsonType::String }
        );
        assert_eq!(err(r#""x" // {minLength: 1, minLength: 2}"#), ErrorKind::DuplicateRule("minLength".into()));
        assert_eq!(err(r#"1 // {minimum: 1}"#), ErrorKind::UnknownRule("minimum".into()));
    }

    #[test]
    fn single_shortcut_is_a_type_reference() {
        let schema = load_str(r#"{"pet": @cat}"#).unwrap();
        let pet = &schema.root.properties().unwrap()[&Key::plain("pet")];
        assert_eq!(pet.json_type(), JsonType::Mixed);
        assert_eq!(pet.user_type(), Some("@cat"));
    }

    #[test]
    fn shortcut_union_becomes_generated_or() {
        let schema = load_str("@foo | @bar").unwrap();
        let list = schema.root.constraints.types_list().unwrap();
        assert_eq!(list.source, RuleSource::Generated);
        assert_eq!(list.items.len(), 2);
        assert!(list.items.iter().all(|i| i.anonymous));
        let first = schema.anonymous_type(&list.items[0].name).unwrap();
        assert_eq!(first.user_type(), Some("@foo"));
        assert_eq!(schema.root.constraints.get(ConstraintKind::Or), Some(&Constraint::Or(RuleSource::Generated)));
    }

    #[test]
    fn key_shortcuts_are_marked() {
        let schema = load_str(r#"{@id: "x"}"#).unwrap();
        let key = schema.root.properties().unwrap().keys().next().unwrap();
        assert_eq!(key, &Key::shortcut("@id"));
        assert_eq!(schema.direct_user_types(), vec!["@id".to_string()]);
    }

    #[test]
    fn multi_line_annotation_on_container() {
        let src = "{ /* {\n  additionalProperties: \"string\"\n} - extra values are strings */\n  \"a\": 1\n}";
        let schema = load_str(src).unwrap();
        assert_eq!(
            schema.root.constraints.additional_properties(),
            Some(&AdditionalProperties::Type("string".into()))
        );
        assert_eq!(schema.root.comment.as_deref(), Some("extra values are strings"));
    }
}
