//! Calculation of FIRST and FOLLOW sets.
//!
//! Both sets are computed by memoized recursion over the productions. A
//! symbol whose computation is still in progress contributes the partial
//! result gathered so far, and whole passes are repeated until nothing
//! changes, so mutually recursive nonterminals reach the least fixed point.

use crate::{
    grammar::{Grammar, GrammarError, NonterminalID, SymbolID, TerminalID},
    syntax,
    types::{Map, TerminalSet},
    util::{display_fn, write_joined},
};
use std::fmt;

/// The FIRST set of a symbol or a sequence of symbols.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FirstSet {
    terminals: TerminalSet,
    /// Whether the empty string is derivable, i.e. `EPSILON` belongs to the set.
    nullable: bool,
}

impl FirstSet {
    pub fn terminals(&self) -> &TerminalSet {
        &self.terminals
    }

    pub fn into_terminals(self) -> TerminalSet {
        self.terminals
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    fn union_with(&mut self, other: &FirstSet) -> bool {
        let mut changed = self.terminals.union_with(&other.terminals);
        if other.nullable && !self.nullable {
            self.nullable = true;
            changed = true;
        }
        changed
    }

    pub fn display<'a>(&'a self, g: &'a Grammar) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            f.write_str("{ ")?;
            let names = self.terminals.iter().map(|t| g.terminal(t).name());
            write_joined(f, ", ", names.chain(self.nullable.then_some(syntax::EPSILON)))?;
            f.write_str(" }")
        })
    }
}

/// FIRST and FOLLOW sets of every nonterminal in a grammar.
#[derive(Debug, Clone, PartialEq)]
pub struct FirstFollow {
    first: Map<NonterminalID, FirstSet>,
    follow: Map<NonterminalID, TerminalSet>,
}

impl FirstFollow {
    pub fn compute(g: &Grammar) -> Self {
        let span = tracing::trace_span!("FirstFollow::compute");
        let _entered = span.enter();

        let mut solver = Solver::new(g);
        solver.compute_all_firsts();
        solver.compute_all_follows();

        Self {
            first: solver.first,
            follow: solver.follow,
        }
    }

    /// `First(n)`
    pub fn first(&self, n: NonterminalID) -> &FirstSet {
        &self.first[&n]
    }

    /// `Follow(n)`
    pub fn follow(&self, n: NonterminalID) -> &TerminalSet {
        &self.follow[&n]
    }

    /// `First(Y1 Y2 ... Yk)`
    pub fn first_of_sequence(&self, symbols: &[SymbolID]) -> FirstSet {
        first_of_sequence(&self.first, symbols)
    }

    /// FIRST set of the symbol named `name`; a terminal yields itself.
    pub fn first_by_name(&self, g: &Grammar, name: &str) -> Result<FirstSet, GrammarError> {
        let symbol = g.symbol(name)?;
        Ok(self.first_of_sequence(&[symbol]))
    }

    pub fn follow_by_name(&self, g: &Grammar, name: &str) -> Result<&TerminalSet, GrammarError> {
        match g.symbol(name)? {
            SymbolID::N(n) => Ok(self.follow(n)),
            SymbolID::T(..) => Err(GrammarError::NotNonterminal { name: name.into() }),
        }
    }

    /// Render `FIRST(X)` and `FOLLOW(X)` of every user-defined nonterminal.
    pub fn display<'a>(&'a self, g: &'a Grammar) -> impl fmt::Display + 'a {
        display_fn(move |f| {
            let nonterminals = || g.nonterminals().filter(|n| n.id() != NonterminalID::START);
            for n in nonterminals() {
                writeln!(f, "FIRST({}) = {}", n, self.first(n.id()).display(g))?;
            }
            for n in nonterminals() {
                write!(f, "FOLLOW({}) = {{ ", n)?;
                let names = self.follow(n.id()).iter().map(|t| g.terminal(t).name());
                write_joined(f, ", ", names)?;
                writeln!(f, " }}")?;
            }
            Ok(())
        })
    }
}

fn first_of_sequence(first: &Map<NonterminalID, FirstSet>, symbols: &[SymbolID]) -> FirstSet {
    let mut res = FirstSet::default();
    for symbol in symbols {
        match symbol {
            SymbolID::T(t) => {
                res.terminals.insert(*t);
                return res;
            }
            SymbolID::N(n) => {
                let added = &first[n];
                res.terminals.union_with(&added.terminals);
                if !added.nullable {
                    return res;
                }
            }
        }
    }
    // すべての記号が nullable
    res.nullable = true;
    res
}

#[derive(Debug, Copy, Clone, PartialEq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

#[derive(Debug)]
struct Solver<'g> {
    grammar: &'g Grammar,
    first: Map<NonterminalID, FirstSet>,
    first_marks: Map<NonterminalID, Mark>,
    follow: Map<NonterminalID, TerminalSet>,
    follow_marks: Map<NonterminalID, Mark>,
}

impl<'g> Solver<'g> {
    fn new(grammar: &'g Grammar) -> Self {
        let ids = || grammar.nonterminals().map(|n| n.id());
        let mut follow: Map<_, _> = ids().map(|n| (n, TerminalSet::new())).collect();
        // Follow(S') = { $ }
        follow[&NonterminalID::START].insert(TerminalID::EOI);

        Self {
            grammar,
            first: ids().map(|n| (n, FirstSet::default())).collect(),
            first_marks: ids().map(|n| (n, Mark::Unvisited)).collect(),
            follow,
            follow_marks: ids().map(|n| (n, Mark::Unvisited)).collect(),
        }
    }

    fn compute_first(&mut self, n: NonterminalID) -> FirstSet {
        if self.first_marks[&n] != Mark::Unvisited {
            return self.first[&n].clone();
        }
        self.first_marks[&n] = Mark::InProgress;

        let g = self.grammar;
        for production in g.productions_of(n) {
            let mut added = FirstSet {
                terminals: TerminalSet::new(),
                nullable: true,
            };
            for symbol in production.right().iter() {
                match *symbol {
                    SymbolID::T(t) => {
                        added.terminals.insert(t);
                        added.nullable = false;
                        break;
                    }
                    SymbolID::N(m) => {
                        let sub = self.compute_first(m);
                        added.terminals.union_with(&sub.terminals);
                        if !sub.nullable {
                            added.nullable = false;
                            break;
                        }
                    }
                }
            }
            self.first[&n].union_with(&added);
        }

        self.first_marks[&n] = Mark::Done;
        self.first[&n].clone()
    }

    fn compute_follow(&mut self, n: NonterminalID) -> TerminalSet {
        if self.follow_marks[&n] != Mark::Unvisited {
            return self.follow[&n].clone();
        }
        self.follow_marks[&n] = Mark::InProgress;

        let g = self.grammar;
        for production in g.productions() {
            let right = production.right();
            for (i, symbol) in right.iter().enumerate() {
                if *symbol != SymbolID::N(n) {
                    continue;
                }
                // A -> alpha n beta
                let beta = first_of_sequence(&self.first, &right[i + 1..]);
                self.follow[&n].union_with(&beta.terminals);
                if beta.nullable && production.left() != n {
                    let sub = self.compute_follow(production.left());
                    self.follow[&n].union_with(&sub);
                }
            }
        }

        self.follow_marks[&n] = Mark::Done;
        self.follow[&n].clone()
    }

    fn compute_all_firsts(&mut self) {
        let mut round = 0;
        loop {
            round += 1;
            let before = self.first.clone();
            self.first_marks.values_mut().for_each(|m| *m = Mark::Unvisited);
            for n in self.grammar.nonterminals().map(|n| n.id()) {
                self.compute_first(n);
            }
            if self.first == before {
                break;
            }
        }
        tracing::trace!("FIRST sets settled after {} round(s)", round);
    }

    fn compute_all_follows(&mut self) {
        let mut round = 0;
        loop {
            round += 1;
            let before = self.follow.clone();
            self.follow_marks.values_mut().for_each(|m| *m = Mark::Unvisited);
            for n in self.grammar.nonterminals().map(|n| n.id()) {
                self.compute_follow(n);
            }
            if self.follow == before {
                break;
            }
        }
        tracing::trace!("FOLLOW sets settled after {} round(s)", round);
    }
}
