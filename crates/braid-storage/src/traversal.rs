//! Whole-DAG and neighborhood traversals. All of them are iterative
//! (explicit stacks and queues): history depth routinely exceeds what the
//! call stack tolerates.

use braid_core::error::BraidError;
use braid_core::types::{Height, VertexId};
use braid_dag::Vertex;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::store::VertexStore;

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    InProgress,
    Done,
}

/// Order every persisted vertex so that each one's parents and spent
/// inputs appear before it. Post-order depth-first search with an explicit
/// stack.
pub fn topological_sort<S: VertexStore + ?Sized>(store: &S) -> Result<Vec<Vertex>, BraidError> {
    let mut marks: HashMap<VertexId, Mark> = HashMap::new();
    let mut order = Vec::new();

    for root in store.all_vertices()? {
        let root_id = root.id()?;
        if marks.contains_key(&root_id) {
            continue;
        }
        let mut stack = vec![root_id];
        while let Some(id) = stack.last().copied() {
            match marks.get(&id) {
                Some(Mark::Done) => {
                    stack.pop();
                }
                Some(Mark::InProgress) => {
                    marks.insert(id, Mark::Done);
                    stack.pop();
                    order.push(store.get(&id)?);
                }
                None => {
                    marks.insert(id, Mark::InProgress);
                    let vertex = store.get(&id)?;
                    for dep in
                        vertex.inputs.iter().map(|i| i.tx_id).chain(vertex.parents.iter().copied())
                    {
                        if !marks.contains_key(&dep) {
                            stack.push(dep);
                        }
                    }
                }
            }
        }
    }
    Ok(order)
}

fn bfs<S, F>(store: &S, seed: Vec<VertexId>, expand: F) -> Result<Vec<VertexId>, BraidError>
where
    S: VertexStore + ?Sized,
    F: Fn(&S, &VertexId) -> Vec<VertexId>,
{
    let mut visited: HashSet<VertexId> = seed.iter().copied().collect();
    let mut queue: VecDeque<VertexId> = seed.into();
    let mut reached = Vec::new();

    while let Some(id) = queue.pop_front() {
        reached.push(id);
        for next in expand(store, &id) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }
    }
    Ok(reached)
}

/// Every descendant reachable from `root` through the recorded `children`
/// relation, each exactly once, root excluded. BFS order.
pub fn bfs_children<S: VertexStore + ?Sized>(
    store: &S,
    root: &VertexId,
) -> Result<Vec<VertexId>, BraidError> {
    let seed: Vec<VertexId> = store.metadata_or_new(root).children.iter().copied().collect();
    bfs(store, seed, |store, id| store.metadata_or_new(id).children.iter().copied().collect())
}

/// Every vertex reachable from `root` through the spent-output relation,
/// root excluded.
pub fn bfs_spent_by<S: VertexStore + ?Sized>(
    store: &S,
    root: &VertexId,
) -> Result<Vec<VertexId>, BraidError> {
    let seed: Vec<VertexId> = store.metadata_or_new(root).spent_by().copied().collect();
    bfs(store, seed, |store, id| store.metadata_or_new(id).spent_by().copied().collect())
}

/// Ancestor blocks of `id`, walking only through block vertices, at most
/// `max_depth` hops up.
pub fn bfs_ascendant_blocks<S: VertexStore + ?Sized>(
    store: &S,
    id: &VertexId,
    max_depth: Height,
) -> Result<Vec<VertexId>, BraidError> {
    let start = store.get(id)?;
    let mut visited: HashSet<VertexId> = HashSet::new();
    let mut queue: VecDeque<(VertexId, Height)> = VecDeque::new();
    let mut blocks = Vec::new();

    for parent in &start.parents {
        if visited.insert(*parent) {
            queue.push_back((*parent, 1));
        }
    }
    while let Some((current, depth)) = queue.pop_front() {
        let vertex = store.get(&current)?;
        if !vertex.is_block() {
            continue;
        }
        blocks.push(current);
        if depth >= max_depth {
            continue;
        }
        for parent in &vertex.parents {
            if visited.insert(*parent) {
                queue.push_back((*parent, depth + 1));
            }
        }
    }
    Ok(blocks)
}

fn ancestors_of_kind<S: VertexStore + ?Sized>(
    store: &S,
    id: &VertexId,
    want_block: bool,
    count: usize,
) -> Result<Vec<VertexId>, BraidError> {
    let start = store.get(id)?;
    let mut visited: HashSet<VertexId> = start.parents.iter().copied().collect();
    let mut queue: VecDeque<VertexId> = start.parents.iter().copied().collect();
    let mut found = Vec::new();

    while let Some(current) = queue.pop_front() {
        if found.len() >= count {
            break;
        }
        let vertex = store.get(&current)?;
        if vertex.is_block() == want_block {
            found.push(current);
        }
        for parent in &vertex.parents {
            if visited.insert(*parent) {
                queue.push_back(*parent);
            }
        }
    }
    Ok(found)
}

/// Up to `count` ancestor blocks of `id`, breadth-first through parents.
pub fn blocks_before<S: VertexStore + ?Sized>(
    store: &S,
    id: &VertexId,
    count: usize,
) -> Result<Vec<VertexId>, BraidError> {
    ancestors_of_kind(store, id, true, count)
}

/// Up to `count` ancestor transactions of `id`, breadth-first through
/// parents.
pub fn transactions_before<S: VertexStore + ?Sized>(
    store: &S,
    id: &VertexId,
    count: usize,
) -> Result<Vec<VertexId>, BraidError> {
    ancestors_of_kind(store, id, false, count)
}
