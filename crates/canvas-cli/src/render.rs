use colored::Colorize;

use canvas_core::{
    Canvas, ChatMessage, GraphStore, Node, NodeKind, Role, SourceHandle, INPUT_PLACEHOLDER,
};

const PREVIEW_CHARS: usize = 60;

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= PREVIEW_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}…", cut)
    }
}

fn describe(node: &Node) -> String {
    let mut flags = String::new();
    if node.is_anchor() {
        flags.push_str(" [anchor]");
    }
    if node.is_pinned() {
        flags.push_str(" [pinned]");
    }
    let at = format!("({:.0},{:.0})", node.position.x, node.position.y).dimmed();

    match &node.kind {
        NodeKind::Message(data) => {
            let body = if data.is_loading {
                "thinking…".dimmed().to_string()
            } else if data.content.starts_with("Error: ") {
                preview(&data.content).red().to_string()
            } else {
                preview(&data.content)
            };
            let role = match data.role {
                Role::User => "user".cyan(),
                Role::Assistant => "assistant".green(),
            };
            format!("{} {}{} {} {}", node.id.bold(), role, flags, at, body)
        }
        NodeKind::Input(data) => {
            let body = if data.draft.is_empty() {
                INPUT_PLACEHOLDER.dimmed().to_string()
            } else {
                preview(&data.draft)
            };
            format!("{} {}{} {} {}", node.id.bold(), "input".yellow(), flags, at, body)
        }
    }
}

fn render_subtree(graph: &GraphStore, id: &str, prefix: &str, last: bool, out: &mut Vec<String>) {
    let Some(node) = graph.node(id) else {
        return;
    };
    let branch = if prefix.is_empty() {
        ""
    } else if last {
        "└─ "
    } else {
        "├─ "
    };
    let handle = graph
        .parent_edge(id)
        .filter(|edge| edge.source_handle != SourceHandle::Bottom)
        .map(|edge| format!(" via {}", edge.source_handle.id()).dimmed().to_string())
        .unwrap_or_default();
    out.push(format!("{}{}{}{}", prefix, branch, describe(node), handle));

    let children = graph.children_ids(id);
    let child_prefix = if prefix.is_empty() {
        "   ".to_string()
    } else if last {
        format!("{}   ", prefix)
    } else {
        format!("{}│  ", prefix)
    };
    for (i, child) in children.iter().enumerate() {
        render_subtree(graph, child, &child_prefix, i + 1 == children.len(), out);
    }
}

/// Indented view of the whole canvas, one line per node.
pub fn render_tree(canvas: &Canvas) -> String {
    let graph = canvas.graph();
    let mut out = Vec::new();
    for root in graph.roots() {
        render_subtree(graph, &root.id, "", true, &mut out);
    }
    out.join("\n")
}

pub fn render_history(history: &[ChatMessage]) -> String {
    history
        .iter()
        .map(|m| match m.role {
            Role::User => format!("{} {}", "user:".cyan(), m.content),
            Role::Assistant => format!("{} {}", "assistant:".green(), m.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvas_core::{Position, WELCOME_NODE_ID};

    #[test]
    fn tree_lists_branches_under_their_source() {
        colored::control::set_override(false);

        let mut canvas = Canvas::new();
        canvas
            .spawn_branch_at(WELCOME_NODE_ID, SourceHandle::Right, Position::new(600.0, 100.0))
            .unwrap();

        let tree = render_tree(&canvas);
        let lines: Vec<&str> = tree.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("welcome assistant"));
        assert!(lines[1].contains("├─ input-1 input"));
        assert!(lines[2].contains("└─ input-2 input [anchor] [pinned]"));
        assert!(lines[2].ends_with("via right-source"));
    }

    #[test]
    fn previews_are_flattened_and_cut() {
        assert_eq!(preview("a\n  b"), "a b");
        let long = preview(&"x".repeat(100));
        assert_eq!(long.chars().count(), PREVIEW_CHARS + 1);
    }
}
