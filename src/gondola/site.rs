use super::expression::Expression;
use crate::types::Type;

/// Location of one node inside a tree: the child slot taken at each level
/// starting from the root, together with the node's result type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub path: Vec<usize>,
    pub ty: Type,
}

impl Site {
    pub fn root(ty: Type) -> Self {
        Self { path: Vec::new(), ty }
    }

    pub fn is_root(&self) -> bool {
        self.path.is_empty()
    }

    /// Tree level of the node, with the root at level 1.
    pub fn level(&self) -> usize {
        self.path.len() + 1
    }
}

impl Expression {
    pub fn get(&self, path: &[usize]) -> Option<&Expression> {
        path.iter()
            .try_fold(self, |node, &slot| node.children().get(slot))
    }

    pub fn get_mut(&mut self, path: &[usize]) -> Option<&mut Expression> {
        let mut node = self;
        for &slot in path {
            node = node.children_mut().get_mut(slot)?;
        }
        Some(node)
    }

    /// Swaps the subtree at `path` for `replacement` and hands back the
    /// detached subtree. Returns `None`, leaving the tree untouched, when the
    /// path does not exist.
    fn replace_at(&mut self, path: &[usize], replacement: Expression) -> Option<Expression> {
        let slot = self.get_mut(path)?;
        Some(std::mem::replace(slot, replacement))
    }
}

/// Splices `replacement` into `root` at `path`.
///
/// This is the only operation that changes the shape of a tree. A site with a
/// parent is replaced inside the parent's slot and the same root is returned;
/// the root site (empty path) is replaced wholesale, so `replacement` becomes
/// the new root. The old subtree is moved out of its slot before the new one
/// takes its place and is dropped on return.
pub fn insert(mut root: Expression, path: &[usize], replacement: Expression) -> Expression {
    if path.is_empty() {
        return replacement;
    }
    if root.replace_at(path, replacement).is_none() {
        log::error!("splice site {:?} does not exist in '{}'", path, root);
    }
    root
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gondola::expression::BinaryOp;

    fn sample() -> Expression {
        Expression::binary(
            BinaryOp::Add,
            Expression::Integer(1),
            Expression::binary(BinaryOp::Multiply, Expression::Integer(2), Expression::Integer(3)),
        )
    }

    #[test]
    fn test_get_follows_path() {
        let tree = sample();
        assert_eq!(tree.get(&[1, 0]), Some(&Expression::Integer(2)));
        assert_eq!(tree.get(&[]), Some(&tree));
        assert!(tree.get(&[0, 0]).is_none());
    }

    #[test]
    fn test_insert_into_parent_slot() {
        let tree = insert(sample(), &[1, 1], Expression::Integer(9));
        assert_eq!(tree.to_string(), "1+2*9");
    }

    #[test]
    fn test_insert_at_root_returns_replacement() {
        let tree = insert(sample(), &[], Expression::Integer(9));
        assert_eq!(tree, Expression::Integer(9));
    }

    #[test]
    fn test_insert_invalid_path_keeps_tree() {
        let tree = insert(sample(), &[0, 3], Expression::Integer(9));
        assert_eq!(tree, sample());
    }
}
