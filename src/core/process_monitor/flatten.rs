//! Flattening of the expand/collapse-annotated forest into renderable rows.

use super::metrics::MetricKey;
use super::process_tree::{Forest, NodeId};

const BRANCH_GUIDE: &str = "│  ";
const BLANK_GUIDE: &str = "   ";

/// One renderable line of the process view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleRow {
    pub node: NodeId,
    pub pid: u32,
    pub depth: usize,
    /// Guides for ancestor branches, without the row's own connector
    pub prefix: String,
    pub is_last: bool,
}

impl VisibleRow {
    /// Connector glyph drawn before the name (empty for roots)
    pub fn connector(&self) -> &'static str {
        match (self.depth, self.is_last) {
            (0, _) => "",
            (_, true) => "└─ ",
            (_, false) => "├─ ",
        }
    }
}

/// Flatten the forest in display order.
///
/// Only expanded nodes have their children visited, so the cost follows the
/// number of visible rows. Siblings are re-sorted on every call by `sort_key`;
/// roots keep the forest order. `filter` keeps rows whose name or command
/// contains it as typed (case-insensitive) and does not pull in ancestors.
pub fn flatten(forest: &Forest, sort_key: MetricKey, filter: Option<&str>) -> Vec<VisibleRow> {
    let mut rows = Vec::new();
    let roots = forest.roots();

    for (i, &root) in roots.iter().enumerate() {
        let is_last = i + 1 == roots.len();
        flatten_node(forest, root, 0, String::new(), is_last, sort_key, &mut rows);
    }

    match filter.filter(|f| !f.is_empty()) {
        Some(query) => apply_filter(forest, rows, query),
        None => rows,
    }
}

fn flatten_node(
    forest: &Forest,
    id: NodeId,
    depth: usize,
    prefix: String,
    is_last: bool,
    sort_key: MetricKey,
    rows: &mut Vec<VisibleRow>,
) {
    let node = forest.node(id);
    let child_prefix = if depth == 0 {
        String::new()
    } else if is_last {
        format!("{}{}", prefix, BLANK_GUIDE)
    } else {
        format!("{}{}", prefix, BRANCH_GUIDE)
    };

    rows.push(VisibleRow {
        node: id,
        pid: node.pid,
        depth,
        prefix,
        is_last,
    });

    if !node.expanded || node.is_leaf() {
        return;
    }

    let children = forest.sorted_children(id, sort_key);
    let count = children.len();
    for (i, child) in children.into_iter().enumerate() {
        flatten_node(
            forest,
            child,
            depth + 1,
            child_prefix.clone(),
            i + 1 == count,
            sort_key,
            rows,
        );
    }
}

fn apply_filter(forest: &Forest, rows: Vec<VisibleRow>, query: &str) -> Vec<VisibleRow> {
    let query = query.to_lowercase();
    rows.into_iter()
        .filter(|row| {
            let node = forest.node(row.node);
            node.name.to_lowercase().contains(&query)
                || node.command.to_lowercase().contains(&query)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process_monitor::metrics::ProcessRecord;
    use crate::core::process_monitor::process_tree::tests::record;

    fn sample_forest() -> Forest {
        Forest::build(vec![
            record(1, 0, 500),
            record(10, 1, 300),
            record(20, 1, 200),
            record(30, 10, 100),
        ])
    }

    fn expand(forest: &mut Forest, pids: &[u32]) {
        for pid in pids {
            forest.find_node_mut(*pid).unwrap().expanded = true;
        }
    }

    #[test]
    fn test_collapsed_root_hides_children() {
        let forest = sample_forest();
        let rows = flatten(&forest, MetricKey::Rss, None);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pid, 1);
        assert_eq!(rows[0].depth, 0);
    }

    #[test]
    fn test_expanded_depths_and_order() {
        let mut forest = sample_forest();
        expand(&mut forest, &[1, 10]);

        let rows = flatten(&forest, MetricKey::Rss, None);
        let pids: Vec<u32> = rows.iter().map(|r| r.pid).collect();
        let depths: Vec<usize> = rows.iter().map(|r| r.depth).collect();
        assert_eq!(pids, vec![1, 10, 30, 20]);
        assert_eq!(depths, vec![0, 1, 2, 1]);

        for row in &rows {
            assert_eq!(row.depth, forest.depth(row.node));
        }
    }

    #[test]
    fn test_deep_chain_depths() {
        let mut forest = Forest::build(vec![
            record(1, 0, 400),
            record(2, 1, 300),
            record(3, 2, 200),
            record(4, 3, 100),
        ]);
        expand(&mut forest, &[1, 2, 3]);

        let depths: Vec<usize> = flatten(&forest, MetricKey::Rss, None)
            .iter()
            .map(|r| r.depth)
            .collect();
        assert_eq!(depths, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_prefixes_and_connectors() {
        let mut forest = Forest::build(vec![
            record(1, 0, 900),
            record(2, 1, 300),
            record(3, 1, 200),
            record(4, 2, 100),
            record(5, 3, 50),
        ]);
        expand(&mut forest, &[1, 2, 3]);

        let rows = flatten(&forest, MetricKey::Rss, None);
        let layout: Vec<(u32, &str, &str)> = rows
            .iter()
            .map(|r| (r.pid, r.prefix.as_str(), r.connector()))
            .collect();

        assert_eq!(
            layout,
            vec![
                (1, "", ""),
                (2, "", "├─ "),
                (4, "│  ", "└─ "),
                (3, "", "└─ "),
                (5, "   ", "└─ "),
            ]
        );
    }

    #[test]
    fn test_sort_key_changes_sibling_order_without_rebuild() {
        let mut forest = sample_forest();
        expand(&mut forest, &[1]);
        forest.find_node_mut(20).unwrap().detail.dirty_bytes = 1 << 20;

        let by_rss: Vec<u32> = flatten(&forest, MetricKey::Rss, None)
            .iter()
            .map(|r| r.pid)
            .collect();
        let by_dirty: Vec<u32> = flatten(&forest, MetricKey::Dirty, None)
            .iter()
            .map(|r| r.pid)
            .collect();
        assert_eq!(by_rss, vec![1, 10, 20]);
        assert_eq!(by_dirty, vec![1, 20, 10]);
    }

    #[test]
    fn test_flatten_is_idempotent() {
        let mut forest = sample_forest();
        expand(&mut forest, &[1, 10]);
        let first = flatten(&forest, MetricKey::Virtual, Some("proc"));
        let second = flatten(&forest, MetricKey::Virtual, Some("proc"));
        assert_eq!(first, second);
    }

    #[test]
    fn test_filter_matches_name_or_command_case_insensitive() {
        let records = vec![
            ProcessRecord {
                command: "/usr/sbin/syslogd".to_string(),
                ..record(1, 0, 500)
            },
            ProcessRecord {
                command: "/usr/bin/python3 /opt/LogShipper/run.py".to_string(),
                ..record(2, 1, 300)
            },
            ProcessRecord {
                command: "/usr/bin/bash".to_string(),
                ..record(3, 1, 200)
            },
        ];
        let mut forest = Forest::build(records);
        expand(&mut forest, &[1]);

        let pids: Vec<u32> = flatten(&forest, MetricKey::Rss, Some("LOG"))
            .iter()
            .map(|r| r.pid)
            .collect();
        assert_eq!(pids, vec![1, 2]);
    }

    #[test]
    fn test_filter_does_not_reveal_collapsed_subtrees() {
        let forest = sample_forest();
        // proc30 lives under collapsed nodes
        let rows = flatten(&forest, MetricKey::Rss, Some("proc30"));
        assert!(rows.is_empty());
    }

    #[test]
    fn test_filter_keeps_descendant_without_ancestor() {
        let mut forest = sample_forest();
        expand(&mut forest, &[1, 10]);
        let rows = flatten(&forest, MetricKey::Rss, Some("proc30"));
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].pid, 30);
        assert_eq!(rows[0].depth, 2);
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let mut forest = sample_forest();
        expand(&mut forest, &[1]);
        assert_eq!(flatten(&forest, MetricKey::Rss, Some("")).len(), 3);
    }

    #[test]
    fn test_filter_whitespace_is_significant() {
        let forest = Forest::build(vec![
            ProcessRecord {
                command: "node server.js".to_string(),
                ..record(1, 0, 500)
            },
            ProcessRecord {
                command: "/usr/bin/nodemon".to_string(),
                ..record(2, 0, 300)
            },
        ]);
        let pids = |query: &str| -> Vec<u32> {
            flatten(&forest, MetricKey::Rss, Some(query))
                .iter()
                .map(|r| r.pid)
                .collect()
        };

        assert_eq!(pids("node "), vec![1]);
        assert_eq!(pids(" "), vec![1]);
        assert_eq!(pids("node"), vec![1, 2]);
    }
}
