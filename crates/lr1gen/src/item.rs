//! LR(1) items and item sets.

use crate::{
    grammar::{Grammar, NonterminalID, Production, ProductionID, SymbolID, TerminalID},
    util::display_fn,
};
use std::{collections::BTreeSet, fmt, rc::Rc};

/// The LR(1) item `[lhs -> γ • δ, lookahead]`.
///
/// Equality, ordering and hashing take every field into account, comparing
/// the right-hand side by content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Item {
    lhs: NonterminalID,
    rhs: Rc<[SymbolID]>,
    dot: usize,
    lookahead: TerminalID,
}

impl Item {
    pub fn new(production: &Production, dot: usize, lookahead: TerminalID) -> Self {
        debug_assert!(dot <= production.right().len());
        Self {
            lhs: production.left(),
            rhs: production.right().clone(),
            dot,
            lookahead,
        }
    }

    /// `[S' -> • start, $]`
    pub fn start(g: &Grammar) -> Self {
        Self::new(g.production(ProductionID::ACCEPT), 0, TerminalID::EOI)
    }

    pub fn lhs(&self) -> NonterminalID {
        self.lhs
    }

    pub fn rhs(&self) -> &[SymbolID] {
        &self.rhs
    }

    pub fn dot(&self) -> usize {
        self.dot
    }

    pub fn lookahead(&self) -> TerminalID {
        self.lookahead
    }

    /// The symbol right after the dot, if any.
    pub fn next_symbol(&self) -> Option<SymbolID> {
        self.rhs.get(self.dot).copied()
    }

    /// Whether the dot has reached the end, including every epsilon item.
    pub fn is_reducible(&self) -> bool {
        self.dot >= self.rhs.len()
    }

    /// Move the dot over the next symbol.
    pub fn advance(&self) -> Option<Self> {
        if self.is_reducible() {
            return None;
        }
        Some(Self {
            dot: self.dot + 1,
            ..self.clone()
        })
    }

    /// Whether this is `[S' -> start •, $]`.
    pub fn is_accepting(&self, g: &Grammar) -> bool {
        self.lhs == NonterminalID::START
            && self.rhs[..] == [SymbolID::N(g.start_symbol())]
            && self.dot == 1
            && self.lookahead == TerminalID::EOI
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} ->", g.nonterminal(self.lhs))?;
            for (i, symbol) in self.rhs.iter().enumerate() {
                if i == self.dot {
                    f.write_str(" •")?;
                }
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            if self.is_reducible() {
                f.write_str(" •")?;
            }
            write!(f, ", {}", g.terminal(self.lookahead))
        })
    }
}

/// A deduplicated set of LR(1) items, compared by membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemSet {
    items: BTreeSet<Item>,
}

impl ItemSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an item, returning `false` if it was already present.
    pub fn insert(&mut self, item: Item) -> bool {
        self.items.insert(item)
    }

    pub fn contains(&self, item: &Item) -> bool {
        self.items.contains(item)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Iterate over the items in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> + '_ {
        self.items.iter()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            f.write_str("{\n")?;
            for item in &self.items {
                writeln!(f, "  {}", item.display(g))?;
            }
            f.write_str("}")
        })
    }
}

impl FromIterator<Item> for ItemSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Item>,
    {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ItemSet {
    type Item = &'a Item;
    type IntoIter = std::collections::btree_set::Iter<'a, Item>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
