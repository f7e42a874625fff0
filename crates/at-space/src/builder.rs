//! Search-space enumeration.

use at_types::{Bindings, Group, TunerError, TunerResult, Value};
use tracing::{debug, info};

use crate::space::SearchSpace;
use crate::tree::Tree;

/// Enumerate the constrained search space for the given parameter groups.
///
/// Each group becomes one tree: its parameters' ranges are walked depth-first
/// in declaration order, and a value is kept only when the parameter's
/// predicate holds under the already-bound prefix.  Groups are independent,
/// so trees are built on scoped worker threads when there is more than one.
pub fn generate(groups: &[Group]) -> TunerResult<SearchSpace> {
    if groups.iter().all(Group::is_empty) {
        return Err(TunerError::Internal(
            "cannot generate a search space without tuning parameters".into(),
        ));
    }

    let names: Vec<String> = groups
        .iter()
        .flat_map(|g| g.params.iter().map(|p| p.name.clone()))
        .collect();

    let trees = if groups.len() > 1 {
        std::thread::scope(|scope| {
            let handles: Vec<_> = groups
                .iter()
                .map(|group| scope.spawn(move || build_tree(group)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().expect("tree construction does not panic"))
                .collect::<TunerResult<Vec<Tree>>>()
        })?
    } else {
        groups.iter().map(build_tree).collect::<TunerResult<_>>()?
    };

    let space = SearchSpace::from_parts(trees, names);
    info!(
        configurations = %space.num_configs(),
        parameters = space.num_params(),
        trees = space.num_trees(),
        "search space generated"
    );
    Ok(space)
}

fn build_tree(group: &Group) -> TunerResult<Tree> {
    let mut tree = Tree::new();
    let mut prefix: Vec<(String, Value)> = Vec::with_capacity(group.len());
    enumerate(group, 0, &mut prefix, &mut tree);

    if tree.num_configs() == 0 {
        let names: Vec<&str> = group.params.iter().map(|p| p.name.as_str()).collect();
        return Err(TunerError::Internal(format!(
            "no admissible configuration for parameter group [{}]",
            names.join(", ")
        )));
    }
    debug!(
        leaves = tree.num_configs(),
        depth = tree.num_params(),
        "parameter group enumerated"
    );
    Ok(tree)
}

fn enumerate(group: &Group, depth: usize, prefix: &mut Vec<(String, Value)>, tree: &mut Tree) {
    if depth == group.len() {
        let path: Vec<Value> = prefix.iter().map(|(_, v)| v.clone()).collect();
        tree.insert(&path);
        return;
    }

    let param = &group.params[depth];
    for value in param.range.iter() {
        if !param.admits(&value, &Bindings::new(prefix)) {
            continue;
        }
        prefix.push((param.name.clone(), value));
        enumerate(group, depth + 1, prefix, tree);
        prefix.pop();
    }
}
