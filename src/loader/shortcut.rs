use tracing::trace;

use super::rule::shortcut_names;
use super::{Loader, apply_rules};
use crate::constraint::{Constraint, RuleSource, TypeItem, TypesList};
use crate::error::{ErrorKind, Result, fail};
use crate::lexeme::LexEvent;
use crate::node::{Node, Span};

impl Loader<'_> {
    /// `@cat` is a type reference; `@cat | @dog` is a generated `or` whose
    /// alternatives each wrap one reference in an anonymous type.
    pub(super) fn shortcut_node(&mut self, event: LexEvent) -> Result<Node> {
        let span = Span { begin: event.begin, end: event.end };
        let names = shortcut_names(&event.text(self.src));
        let mut node = Node::mixed(span);
        match names.as_slice() {
            [] => return fail(ErrorKind::EmptyList("type"), event.begin),
            [name] => apply_rules(&mut node, vec![(Constraint::Type(name.clone()), event.begin)])?,
            _ => {
                trace!(alternatives = names.len(), "shortcut union");
                let mut items = Vec::with_capacity(names.len());
                for name in &names {
                    let mut alternative = node.clone();
                    apply_rules(&mut alternative, vec![(Constraint::Type(name.clone()), event.begin)])?;
                    items.push(TypeItem { name: self.register_anonymous(alternative), anonymous: true });
                }
                let list = TypesList { items, source: RuleSource::Generated };
                apply_rules(
                    &mut node,
                    vec![
                        (Constraint::TypesList(list), event.begin),
                        (Constraint::Or(RuleSource::Generated), event.begin),
                    ],
                )?;
            }
        }
        Ok(node)
    }
}
