//! ASCII tree rendering for feature models with selection state.

use std::collections::BTreeSet;

use crate::models::GroupType;
use crate::selection::Selection;
use crate::tree::{FeatureNode, FeatureTree};

const CHECKED: char = '☑';
const UNCHECKED: char = '☐';
const COLLAPSED: char = '▸';

/// Render a feature tree with checkboxes, mandatory markers and group tags.
///
/// Children are only drawn under expanded nodes, unless `expand_all` is set.
///
/// Example output:
/// ```text
/// ☑ Application *
/// ├── ☑ Catalog *
/// ├── ☑ Payment [xor]
/// │   ├── ☑ Card
/// │   └── ☐ Cash
/// └── ☐ Filters [or] ▸
/// ```
pub fn render_tree(
    tree: &FeatureTree,
    selection: &Selection,
    expanded: &BTreeSet<String>,
    expand_all: bool,
) -> String {
    let renderer = Renderer {
        tree,
        selection,
        expanded,
        expand_all,
    };
    let mut output = String::new();
    renderer.render_node(&mut output, tree.root(), "", true, true);
    output
}

struct Renderer<'a> {
    tree: &'a FeatureTree,
    selection: &'a Selection,
    expanded: &'a BTreeSet<String>,
    expand_all: bool,
}

impl Renderer<'_> {
    fn render_node(
        &self,
        output: &mut String,
        node: &FeatureNode,
        prefix: &str,
        is_last: bool,
        is_root: bool,
    ) {
        let open = self.expand_all || self.expanded.contains(&node.id);

        if !is_root {
            let branch = if is_last { "└── " } else { "├── " };
            output.push_str(prefix);
            output.push_str(branch);
        }
        output.push(if self.selection.contains(&node.id) {
            CHECKED
        } else {
            UNCHECKED
        });
        output.push(' ');
        output.push_str(display_label(node));
        if node.mandatory {
            output.push_str(" *");
        }
        if node.group_type.is_group() {
            output.push_str(" [");
            output.push_str(node.group_type.as_str());
            output.push(']');
        }
        if node.has_children() && !open {
            output.push(' ');
            output.push(COLLAPSED);
        }
        output.push('\n');

        if !open {
            return;
        }

        let child_prefix = if is_root {
            String::new()
        } else {
            let continuation = if is_last { "    " } else { "│   " };
            format!("{}{}", prefix, continuation)
        };

        let children: Vec<_> = self.tree.children_of(node).collect();
        for (i, child) in children.iter().enumerate() {
            let child_is_last = i == children.len() - 1;
            self.render_node(output, child, &child_prefix, child_is_last, false);
        }
    }
}

/// Label without the group token, which is shown as a tag instead.
fn display_label(node: &FeatureNode) -> &str {
    let token = match node.group_type {
        GroupType::None => return &node.label,
        GroupType::And => "-and",
        GroupType::Or => "-or",
        GroupType::Xor => "-xor",
    };
    node.label.strip_suffix(token).unwrap_or(&node.label)
}
