use crate::cmd_log::short_id;
use crate::session::Target;
use skein_log::TreeNode;

/// `skein tree [--json]`
pub fn execute(target: &Target, json: bool) -> anyhow::Result<()> {
    let log = target.open()?;
    let forest = log.get_tree_structure();
    if json {
        println!("{}", serde_json::to_string_pretty(&forest)?);
    } else if forest.is_empty() {
        println!("(empty log)");
    } else {
        print!("{}", render_forest(&forest));
    }
    Ok(())
}

/// One line per node, children indented under their parent.
pub fn render_forest(forest: &[TreeNode]) -> String {
    let mut out = String::new();
    let mut stack: Vec<(&TreeNode, usize)> = forest.iter().rev().map(|n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{} {}", short_id(&node.id), node.kind));
        if !node.labels.is_empty() {
            out.push_str(&format!(" [{}]", node.labels.join(", ")));
        }
        out.push('\n');
        stack.extend(node.children.iter().rev().map(|c| (c, depth + 1)));
    }
    out
}
