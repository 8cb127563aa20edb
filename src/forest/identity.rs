//! Display identities
//!
//! Tree widgets key rows by `value`, and the resolver copies shared subtrees,
//! so every node needs its own token once all copies exist. Tokens are random
//! alphanumeric strings; the build context remembers what it issued and draws
//! again on a repeat.

use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::HashSet;
use tracing::debug;

use super::node::TreeNode;
use super::{BuildContext, Forest};

/// Overwrite `value` on every node of the forest
pub fn assign_identities(mut forest: Forest, ctx: &mut BuildContext, token_length: usize) -> Forest {
    let mut assigner = IdentityAssigner::new(&mut ctx.issued, token_length);
    for root in &mut forest.roots {
        assigner.assign(root);
    }
    debug!(issued = ctx.issued.len(), "display identities assigned");
    forest
}

pub struct IdentityAssigner<'a> {
    issued: &'a mut HashSet<String>,
    token_length: usize,
}

impl<'a> IdentityAssigner<'a> {
    pub fn new(issued: &'a mut HashSet<String>, token_length: usize) -> Self {
        Self {
            issued,
            token_length,
        }
    }

    /// A token not handed out before by this assigner's context
    pub fn issue(&mut self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let token: String = (&mut rng)
                .sample_iter(&Alphanumeric)
                .take(self.token_length)
                .map(char::from)
                .collect();
            if self.issued.insert(token.clone()) {
                return token;
            }
        }
    }

    pub fn assign(&mut self, node: &mut TreeNode) {
        node.value = self.issue();
        for child in &mut node.children {
            self.assign(child);
        }
    }
}
