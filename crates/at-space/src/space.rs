//! The product-of-trees search space and its addressing schemes.

use at_types::{BigInt, Configuration, TunerError, TunerResult, Value};

use crate::tree::Tree;

/// The enumerated, constraint-filtered search space: one [`Tree`] per group,
/// total size the product of tree sizes.
///
/// Configurations are addressed three ways: by a 1-D [`BigInt`] index in
/// `[0, |S|)`, by a D-dimensional coordinate in `(0,1]^D`, or by explicit
/// per-layer child indices.
#[derive(Debug, Clone)]
pub struct SearchSpace {
    trees: Vec<Tree>,
    names: Vec<String>,
}

impl SearchSpace {
    pub(crate) fn from_parts(trees: Vec<Tree>, names: Vec<String>) -> Self {
        Self { trees, names }
    }

    /// Total number of parameters across all trees; the coordinate-space
    /// dimensionality D.
    pub fn num_params(&self) -> usize {
        self.trees.iter().map(Tree::num_params).sum()
    }

    /// Total number of configurations `|S|`.
    pub fn num_configs(&self) -> BigInt {
        let mut total = BigInt::one();
        for tree in &self.trees {
            total = &total * &BigInt::from(tree.num_configs());
        }
        total
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    /// Parameter names in declaration order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Maximum fan-out of the given layer, counted across the whole space
    /// (layers of later trees continue the numbering of earlier ones).
    pub fn max_childs(&self, mut layer: usize) -> TunerResult<usize> {
        for tree in &self.trees {
            if layer < tree.num_params() {
                return Ok(tree.max_childs(layer));
            }
            layer -= tree.num_params();
        }
        Err(TunerError::OutOfRange(format!(
            "layer {layer} exceeds parameter count {}",
            self.num_params()
        )))
    }

    /// Configuration at the 1-D index `i ∈ [0, |S|)`.
    ///
    /// The index decomposes per tree, high-order tree first:
    /// `i_k = (i / Π_{j>k} |T_j|) mod |T_k|`.
    pub fn get_by_index(&self, index: &BigInt) -> TunerResult<Configuration> {
        if *index >= self.num_configs() {
            return Err(TunerError::OutOfRange(format!(
                "search space index {index} is out of bounds (size {})",
                self.num_configs()
            )));
        }

        let num_params = self.num_params();
        let mut slots: Vec<Option<Value>> = vec![None; num_params];
        let mut pos = num_params;

        for tree_id in (0..self.trees.len()).rev() {
            let tree = &self.trees[tree_id];

            let mut lower_configs = BigInt::one();
            for lower in &self.trees[tree_id + 1..] {
                lower_configs = &lower_configs * &BigInt::from(lower.num_configs());
            }

            let leaf_id = (&(index / &lower_configs) % &BigInt::from(tree.num_configs()))
                .to_usize()
                .expect("per-tree leaf index fits usize");

            let mut node = tree.leaf(leaf_id);
            for _ in 0..tree.num_params() {
                pos -= 1;
                slots[pos] = tree.value(node).cloned();
                node = tree.parent(node);
            }
        }

        Ok(self.collect(slots))
    }

    /// Configuration selected by a coordinate in `(0,1]^D`: at each layer the
    /// child with 1-based index `⌈c · num_children⌉` is entered.
    pub fn get_by_coordinates(&self, coordinates: &[f64]) -> TunerResult<Configuration> {
        if coordinates.len() != self.num_params() {
            return Err(TunerError::OutOfRange(format!(
                "coordinate has {} components, expected {}",
                coordinates.len(),
                self.num_params()
            )));
        }
        if !coordinates.iter().all(|&c| c > 0.0 && c <= 1.0) {
            return Err(TunerError::OutOfRange(
                "search space coordinate is out of bounds (0.0, 1.0]".into(),
            ));
        }

        let mut slots = Vec::with_capacity(self.num_params());
        let mut i_global = 0;
        for tree in &self.trees {
            let mut node = tree.root();
            for _ in 0..tree.num_params() {
                let fan_out = tree.num_children(node);
                let child = (coordinates[i_global] * fan_out as f64).ceil() as usize - 1;
                node = tree
                    .child(node, child)
                    .expect("in-range coordinate selects an existing child");
                slots.push(tree.value(node).cloned());
                i_global += 1;
            }
        }

        Ok(self.collect(slots))
    }

    /// Configuration selected by explicit per-layer child indices.
    pub fn get_by_child_indices(&self, indices: &[usize]) -> TunerResult<Configuration> {
        if indices.len() != self.num_params() {
            return Err(TunerError::OutOfRange(format!(
                "child-index path has {} components, expected {}",
                indices.len(),
                self.num_params()
            )));
        }

        let mut slots = Vec::with_capacity(self.num_params());
        let mut i_global = 0;
        for tree in &self.trees {
            let mut node = tree.root();
            for _ in 0..tree.num_params() {
                node = tree.child(node, indices[i_global]).ok_or_else(|| {
                    TunerError::OutOfRange(format!(
                        "child index {} at layer {i_global} exceeds fan-out {}",
                        indices[i_global],
                        tree.num_children(node)
                    ))
                })?;
                slots.push(tree.value(node).cloned());
                i_global += 1;
            }
        }

        Ok(self.collect(slots))
    }

    fn collect<I>(&self, slots: I) -> Configuration
    where
        I: IntoIterator<Item = Option<Value>>,
    {
        self.names
            .iter()
            .zip(slots)
            .map(|(name, value)| {
                (
                    name.clone(),
                    value.expect("every slot is filled by construction"),
                )
            })
            .collect()
    }
}
