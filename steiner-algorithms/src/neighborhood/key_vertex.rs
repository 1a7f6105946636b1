use super::reconnect::{Passage, Reconnector};
use super::{Move, MoveKind};
use crate::tree::TreeState;

/// Removes the non-terminal key vertex `v` together with its incident key
/// paths and reconnects the pieces more cheaply, if possible.
pub fn eliminate_key_vertex(
    tree: &TreeState,
    v: usize,
    reconnector: &mut Reconnector,
) -> Option<Move> {
    if tree.graph().is_terminal(v) || !tree.is_key(v) || tree.degree(v) < 3 {
        return None;
    }

    let mut removed_vertices = vec![v];
    let mut removed_edges = Vec::new();
    let mut budget = 0;
    for &id in tree.paths_at(v) {
        let path = tree.key_path(id)?;
        removed_vertices.extend_from_slice(path.interior());
        removed_edges.extend_from_slice(&path.edges);
        budget += path.weight;
    }

    let added = reconnector.reconnect(
        tree,
        &removed_vertices,
        &removed_edges,
        Passage::Free,
        budget,
    )?;
    let change = tree.settle(&removed_edges, &added)?;
    change.is_improving().then_some(Move {
        kind: MoveKind::KeyVertexElimination,
        anchor: v,
        change,
    })
}

/// Replaces the key path `id` by a cheaper connection between the two
/// halves of the tree it separates.
pub fn exchange_key_path(
    tree: &TreeState,
    id: usize,
    reconnector: &mut Reconnector,
) -> Option<Move> {
    let path = tree.key_path(id)?;
    if path.weight == 0 {
        return None;
    }
    let added = reconnector.reconnect(
        tree,
        path.interior(),
        &path.edges,
        Passage::Free,
        path.weight,
    )?;
    let change = tree.settle(&path.edges, &added)?;
    change.is_improving().then_some(Move {
        kind: MoveKind::KeyPathExchange,
        anchor: path.ends().0,
        change,
    })
}
