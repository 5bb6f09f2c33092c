use std::collections::BTreeSet;

use super::Dispatcher;
use crate::tree::{CommandSource, NodeId};

const OPTIONAL_OPEN: &str = "[";
const OPTIONAL_CLOSE: &str = "]";
const REQUIRED_OPEN: &str = "(";
const REQUIRED_CLOSE: &str = ")";
const OR: &str = "|";

impl<S: CommandSource> Dispatcher<S> {
    /// Every executable path below `node`, one usage string each.
    ///
    /// With `restricted`, paths through nodes `source` cannot use are left
    /// out. Redirects end their path with the redirect target.
    pub fn all_usage(&self, node: NodeId, source: &S, restricted: bool) -> Vec<String> {
        let mut result = Vec::new();
        if self.tree.get(node).is_some() {
            self.collect_all_usage(node, source, &mut result, String::new(), restricted);
        }
        result
    }

    fn collect_all_usage(
        &self,
        id: NodeId,
        source: &S,
        result: &mut Vec<String>,
        prefix: String,
        restricted: bool,
    ) {
        if restricted && !self.tree.can_use(id, source) {
            return;
        }
        let node = self.tree.node(id);
        if node.is_executable() {
            result.push(prefix.clone());
        }
        if let Some(target) = node.redirect() {
            let redirect = self.redirect_usage(target);
            let head = if prefix.is_empty() {
                node.usage_text()
            } else {
                prefix
            };
            result.push(self.join(&head, &redirect));
            return;
        }
        for &child in node.children() {
            let text = self.tree.node(child).usage_text();
            let child_prefix = if prefix.is_empty() {
                text
            } else {
                self.join(&prefix, &text)
            };
            self.collect_all_usage(child, source, result, child_prefix, restricted);
        }
    }

    /// One condensed usage string per usable child of `node`.
    ///
    /// Single-child chains are collapsed into one line, optional tails are
    /// wrapped in `[]`, and alternatives are listed as `(a|b)`.
    pub fn smart_usage(&self, node: NodeId, source: &S) -> Vec<(NodeId, String)> {
        let Some(parent) = self.tree.get(node) else {
            return Vec::new();
        };
        let optional = parent.is_executable();
        parent
            .children()
            .iter()
            .filter_map(|&child| {
                self.smart_usage_of(child, source, optional, false)
                    .map(|usage| (child, usage))
            })
            .collect()
    }

    fn smart_usage_of(&self, id: NodeId, source: &S, optional: bool, deep: bool) -> Option<String> {
        if !self.tree.can_use(id, source) {
            return None;
        }
        let node = self.tree.node(id);
        let this = if optional {
            format!("{OPTIONAL_OPEN}{}{OPTIONAL_CLOSE}", node.usage_text())
        } else {
            node.usage_text()
        };
        if deep {
            return Some(this);
        }

        let child_optional = node.is_executable();
        if let Some(target) = node.redirect() {
            return Some(self.join(&this, &self.redirect_usage(target)));
        }

        let children: Vec<NodeId> = node
            .children()
            .iter()
            .copied()
            .filter(|&child| self.tree.can_use(child, source))
            .collect();
        match children.as_slice() {
            [] => {}
            [only] => {
                let usage = self.smart_usage_of(*only, source, child_optional, child_optional);
                if let Some(usage) = usage {
                    return Some(self.join(&this, &usage));
                }
            }
            _ => {
                let mut seen = BTreeSet::new();
                let mut distinct = Vec::new();
                for &child in &children {
                    if let Some(usage) = self.smart_usage_of(child, source, child_optional, true) {
                        if seen.insert(usage.clone()) {
                            distinct.push(usage);
                        }
                    }
                }
                if let [usage] = distinct.as_slice() {
                    let usage = if child_optional {
                        format!("{OPTIONAL_OPEN}{usage}{OPTIONAL_CLOSE}")
                    } else {
                        usage.clone()
                    };
                    return Some(self.join(&this, &usage));
                }
                if distinct.len() > 1 {
                    let (open, close) = if child_optional {
                        (OPTIONAL_OPEN, OPTIONAL_CLOSE)
                    } else {
                        (REQUIRED_OPEN, REQUIRED_CLOSE)
                    };
                    let alternatives: Vec<String> = children
                        .iter()
                        .map(|&child| self.tree.node(child).usage_text())
                        .collect();
                    let group = format!("{open}{}{close}", alternatives.join(OR));
                    return Some(self.join(&this, &group));
                }
            }
        }
        Some(this)
    }

    fn redirect_usage(&self, target: NodeId) -> String {
        if target == NodeId::ROOT {
            self.config.root_redirect_usage.clone()
        } else {
            format!("-> {}", self.tree.node(target).usage_text())
        }
    }

    fn join(&self, head: &str, tail: &str) -> String {
        format!("{head}{}{tail}", self.config.argument_separator)
    }
}
