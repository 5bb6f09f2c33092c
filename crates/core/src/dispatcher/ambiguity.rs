use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use cmdgraph_diagnostics::{Diagnostic, codes};
use serde::Serialize;

use super::Dispatcher;
use crate::tree::{CommandSource, CommandTree, NodeId};

/// Two siblings that both accept some of the same inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ambiguity {
    /// Parent of both siblings.
    pub parent: NodeId,
    /// The node whose examples were tried.
    pub child: NodeId,
    /// The sibling that also accepts them.
    pub sibling: NodeId,
    /// Examples of `child` that `sibling` accepts.
    pub inputs: BTreeSet<String>,
}

impl Ambiguity {
    /// Warning diagnostic naming both paths and the shared inputs.
    pub fn to_diagnostic<S: CommandSource>(&self, tree: &CommandTree<S>) -> Diagnostic {
        let child = display_path(tree, self.child);
        let sibling = display_path(tree, self.sibling);
        let inputs = self.inputs.iter().cloned().collect::<Vec<_>>().join(", ");
        Diagnostic::warn(
            codes::AMBIGUOUS_INPUT,
            format!("'{child}' and '{sibling}' both accept: {inputs}"),
            None,
        )
        .with_context(BTreeMap::from([
            ("child".into(), child),
            ("sibling".into(), sibling),
            ("inputs".into(), inputs),
        ]))
    }
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inputs: Vec<&str> = self.inputs.iter().map(String::as_str).collect();
        write!(
            f,
            "{} and {} under {} both accept {}",
            self.child,
            self.sibling,
            self.parent,
            inputs.join(", ")
        )
    }
}

fn display_path<S: CommandSource>(tree: &CommandTree<S>, id: NodeId) -> String {
    tree.path(id).join(" ")
}

impl<S: CommandSource> Dispatcher<S> {
    /// Report every pair of siblings where an example of one is valid input
    /// for the other.
    ///
    /// Intended for linting a finished tree; parsing does not consult it.
    pub fn find_ambiguities(&self, mut consumer: impl FnMut(Ambiguity)) {
        self.visit_ambiguities(NodeId::ROOT, &mut consumer);
    }

    /// [`find_ambiguities`](Self::find_ambiguities) collected into a list.
    pub fn ambiguities(&self) -> Vec<Ambiguity> {
        let mut found = Vec::new();
        self.find_ambiguities(|ambiguity| found.push(ambiguity));
        found
    }

    fn visit_ambiguities(&self, parent: NodeId, consumer: &mut impl FnMut(Ambiguity)) {
        let separator = self.config.argument_separator;
        let children = self.tree.node(parent).children();
        for &child in children {
            let examples = self.tree.examples(child);
            for &sibling in children {
                if sibling == child {
                    continue;
                }
                let inputs: BTreeSet<String> = examples
                    .iter()
                    .filter(|input| self.tree.is_valid_input(sibling, input, separator))
                    .cloned()
                    .collect();
                if !inputs.is_empty() {
                    consumer(Ambiguity {
                        parent,
                        child,
                        sibling,
                        inputs,
                    });
                }
            }
            self.visit_ambiguities(child, consumer);
        }
    }
}
