use crate::log::SessionLog;
use serde::Serialize;
use skein_core::EntryId;
use std::collections::HashMap;

/// One node of the exported forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeNode {
    pub id: EntryId,
    pub kind: String,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
    pub children: Vec<TreeNode>,
}

impl TreeNode {
    /// Number of nodes in this subtree, itself included.
    pub fn size(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }
}

impl SessionLog {
    /// Read-only view of the whole forest: one tree per root entry,
    /// children in file order. Entries whose parent is missing belong to no
    /// root and do not appear.
    pub fn get_tree_structure(&self) -> Vec<TreeNode> {
        let mut claimed = vec![false; self.entries.len()];
        self.roots
            .iter()
            .filter_map(|&root| self.build_subtree(root, &mut claimed))
            .collect()
    }

    /// Post-order build with an explicit stack. `claimed` guards against an
    /// entry being reached twice through corrupted parent links.
    fn build_subtree(&self, root: usize, claimed: &mut [bool]) -> Option<TreeNode> {
        if claimed[root] {
            return None;
        }
        claimed[root] = true;

        let mut stack = vec![(root, false)];
        let mut kids_of: HashMap<usize, Vec<usize>> = HashMap::new();
        let mut built: HashMap<usize, TreeNode> = HashMap::new();

        while let Some((pos, expanded)) = stack.pop() {
            if expanded {
                let children = kids_of
                    .remove(&pos)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|c| built.remove(&c))
                    .collect();
                built.insert(pos, self.tree_node(pos, children));
                continue;
            }

            let kids: Vec<usize> = self
                .child_positions(&self.entries[pos].id)
                .iter()
                .copied()
                .filter(|&c| !claimed[c])
                .collect();
            for &c in &kids {
                claimed[c] = true;
            }
            stack.push((pos, true));
            stack.extend(kids.iter().rev().map(|&c| (c, false)));
            kids_of.insert(pos, kids);
        }
        built.remove(&root)
    }

    fn tree_node(&self, pos: usize, children: Vec<TreeNode>) -> TreeNode {
        let entry = &self.entries[pos];
        TreeNode {
            id: entry.id.clone(),
            kind: entry.type_name().to_string(),
            timestamp: entry.timestamp.clone(),
            labels: self
                .labels_for(&entry.id)
                .into_iter()
                .map(|s| s.to_string())
                .collect(),
            children,
        }
    }
}
