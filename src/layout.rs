use crate::types::Schema;
use std::collections::HashMap;

/// Group table indices into rows so referenced tables sit above the tables
/// that reference them. Input order is kept inside each row.
pub fn layer_tables(schema: &Schema) -> Vec<Vec<usize>> {
    let n = schema.tables.len();
    if n == 0 {
        return Vec::new();
    }

    let index: HashMap<&str, usize> = schema
        .tables
        .iter()
        .enumerate()
        .map(|(i, t)| (t.id.as_str(), i))
        .collect();
    let edges: Vec<(usize, usize)> = schema
        .relationships
        .iter()
        .filter_map(|r| Some((*index.get(r.source.as_str())?, *index.get(r.target.as_str())?)))
        .filter(|(s, t)| s != t)
        .collect();

    // Longest path from a referenced root; cycles stop growing after n rounds
    let mut rank = vec![0usize; n];
    for _ in 0..n {
        let mut changed = false;
        for &(source, target) in &edges {
            let wanted = (rank[target] + 1).min(n - 1);
            if rank[source] < wanted {
                rank[source] = wanted;
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }

    let depth = rank.iter().copied().max().unwrap_or(0) + 1;
    let mut layers = vec![Vec::new(); depth];
    for (table, r) in rank.into_iter().enumerate() {
        layers[r].push(table);
    }
    layers.retain(|layer| !layer.is_empty());
    layers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Relationship, TableNode};

    fn schema(labels: &[&str], edges: &[(&str, &str)]) -> Schema {
        Schema {
            description: None,
            tables: labels
                .iter()
                .map(|l| TableNode::new(*l, *l))
                .collect(),
            relationships: edges
                .iter()
                .map(|(s, t)| Relationship {
                    id: format!("e{}-{}", s, t),
                    source: s.to_string(),
                    target: t.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn referenced_tables_come_first() {
        let s = schema(&["comments", "posts", "users"], &[("comments", "posts"), ("posts", "users")]);
        assert_eq!(layer_tables(&s), vec![vec![2], vec![1], vec![0]]);
    }

    #[test]
    fn independent_tables_share_a_row() {
        let s = schema(&["a", "b", "c"], &[("c", "a")]);
        assert_eq!(layer_tables(&s), vec![vec![0, 1], vec![2]]);
    }

    #[test]
    fn cycles_and_dangling_edges_terminate() {
        let s = schema(&["a", "b"], &[("a", "b"), ("b", "a"), ("a", "ghost"), ("a", "a")]);
        let layers = layer_tables(&s);
        let mut all: Vec<_> = layers.into_iter().flatten().collect();
        all.sort();
        assert_eq!(all, vec![0, 1]);
    }

    #[test]
    fn empty_schema_has_no_layers() {
        assert!(layer_tables(&Schema::default()).is_empty());
    }
}
