#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
use crate::sat::clause::ClauseRef;
use crate::sat::literal::Literal;
use smallvec::SmallVec;
use std::ops::{Index, IndexMut};

pub type WatchList = SmallVec<[ClauseRef; 6]>;

/// Per-literal lists of the clauses watching that literal, addressed by
/// [`Literal::index`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Watches(Vec<WatchList>);

impl Watches {
    #[must_use]
    pub fn new(num_vars: usize) -> Self {
        Self(vec![WatchList::new(); 2 * (num_vars + 1)])
    }

    pub fn watch<L: Literal>(&mut self, lit: L, c_ref: ClauseRef) {
        self[lit].push(c_ref);
    }

    /// Detaches the list of `lit` so it can be walked while other lists are
    /// modified. Must be handed back with [`Watches::restore`].
    pub fn take<L: Literal>(&mut self, lit: L) -> WatchList {
        std::mem::take(&mut self[lit])
    }

    pub fn restore<L: Literal>(&mut self, lit: L, list: WatchList) {
        debug_assert!(self[lit].is_empty(), "watch list modified while detached");
        self[lit] = list;
    }
}

impl<L: Literal> Index<L> for Watches {
    type Output = WatchList;

    fn index(&self, index: L) -> &Self::Output {
        &self.0[index.index()]
    }
}

impl<L: Literal> IndexMut<L> for Watches {
    fn index_mut(&mut self, index: L) -> &mut Self::Output {
        &mut self.0[index.index()]
    }
}
