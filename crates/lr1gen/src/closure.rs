//! Closure and GOTO over LR(1) item sets.

use crate::{
    first_follow::FirstFollow,
    grammar::{Grammar, SymbolID, TerminalID},
    item::{Item, ItemSet},
    types::TerminalSet,
};
use std::collections::VecDeque;

/// Expand `items` with every item implied by a nonterminal right after a dot.
///
/// For `[A -> α • B β, a]` and each production `B -> γ`, the items
/// `[B -> • γ, b]` are added for every `b` in `First(β a)`.
pub fn closure(items: &ItemSet, g: &Grammar, sets: &FirstFollow) -> ItemSet {
    let mut result = items.clone();
    let mut pending: VecDeque<Item> = items.iter().cloned().collect();

    while let Some(item) = pending.pop_front() {
        // [A -> ... @ B beta]
        //  B: one nonterminal symbol
        let (b, beta) = match &item.rhs()[item.dot()..] {
            [SymbolID::N(b), beta @ ..] => (*b, beta),
            _ => continue,
        };

        let lookaheads = lookaheads(beta, item.lookahead(), sets);
        for production in g.productions_of(b) {
            for lookahead in lookaheads.iter() {
                let new_item = Item::new(production, 0, lookahead);
                if result.insert(new_item.clone()) {
                    pending.push_back(new_item);
                }
            }
        }
    }

    result
}

/// `First(beta lookahead)`, defaulting to `$` when nothing can be derived.
fn lookaheads(beta: &[SymbolID], lookahead: TerminalID, sets: &FirstFollow) -> TerminalSet {
    let first = sets.first_of_sequence(beta);
    let nullable = first.is_nullable();
    let mut res = first.into_terminals();
    if nullable {
        res.insert(lookahead);
    }
    if res.is_empty() {
        // beta starts with a nonterminal that has no production.
        tracing::trace!("empty lookahead set, falling back to the end of input");
        res.insert(TerminalID::EOI);
    }
    res
}

/// Advance every item whose dot sits before `symbol`, then take the closure.
///
/// Returns `None` when no item can move over `symbol`.
pub fn goto(
    items: &ItemSet,
    symbol: SymbolID,
    g: &Grammar,
    sets: &FirstFollow,
) -> Option<ItemSet> {
    let kernel: ItemSet = items
        .iter()
        .filter(|item| item.next_symbol() == Some(symbol))
        .filter_map(Item::advance)
        .collect();
    if kernel.is_empty() {
        return None;
    }
    Some(closure(&kernel, g, sets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(set: &ItemSet, g: &Grammar) -> Vec<String> {
        set.iter().map(|item| item.display(g).to_string()).collect()
    }

    fn start_set(g: &Grammar, sets: &FirstFollow) -> ItemSet {
        let kernel: ItemSet = Some(Item::start(g)).into_iter().collect();
        closure(&kernel, g, sets)
    }

    #[test]
    fn closure_of_start_item() {
        let g = Grammar::from_str("program : stmt\nstmt : IDENTIFIER").unwrap();
        let sets = FirstFollow::compute(&g);
        let start = start_set(&g, &sets);
        assert_eq!(
            render(&start, &g),
            [
                "S' -> • program, $",
                "program -> • stmt, $",
                "stmt -> • IDENTIFIER, $",
            ]
        );
    }

    #[test]
    fn closure_propagates_lookaheads() {
        let g = Grammar::from_str(
            "
            s : c c
            c : C c
            c : D
            ",
        )
        .unwrap();
        let sets = FirstFollow::compute(&g);
        let start = start_set(&g, &sets);
        assert_eq!(
            render(&start, &g),
            [
                "S' -> • s, $",
                "s -> • c c, $",
                "c -> • C c, C",
                "c -> • C c, D",
                "c -> • D, C",
                "c -> • D, D",
            ]
        );
    }

    #[test]
    fn closure_through_nullable_suffix() {
        let g = Grammar::from_str(
            "
            s : a b
            a : A
            b : B
            b : EPSILON
            ",
        )
        .unwrap();
        let sets = FirstFollow::compute(&g);
        let start = start_set(&g, &sets);
        assert_eq!(
            render(&start, &g),
            [
                "S' -> • s, $",
                "s -> • a b, $",
                "a -> • A, $",
                "a -> • A, B",
            ]
        );
    }

    #[test]
    fn closure_is_idempotent() {
        let g = Grammar::from_str(
            "
            e : e PLUS t
            e : t
            t : LPAREN e RPAREN
            t : ID
            ",
        )
        .unwrap();
        let sets = FirstFollow::compute(&g);
        let start = start_set(&g, &sets);
        assert_eq!(closure(&start, &g, &sets), start);
    }

    #[test]
    fn goto_returns_closed_sets() {
        let g = Grammar::from_str(
            "
            s : c c
            c : C c
            c : D
            ",
        )
        .unwrap();
        let sets = FirstFollow::compute(&g);
        let start = start_set(&g, &sets);

        let c = g.symbol("c").unwrap();
        let next = goto(&start, c, &g, &sets).unwrap();
        assert_eq!(closure(&next, &g, &sets), next);
        assert_eq!(
            render(&next, &g),
            ["s -> c • c, $", "c -> • C c, $", "c -> • D, $"]
        );

        let big_c = g.symbol("C").unwrap();
        let next = goto(&start, big_c, &g, &sets).unwrap();
        assert_eq!(closure(&next, &g, &sets), next);
        assert_eq!(
            render(&next, &g),
            [
                "c -> • C c, C",
                "c -> • C c, D",
                "c -> C • c, C",
                "c -> C • c, D",
                "c -> • D, C",
                "c -> • D, D",
            ]
        );
    }

    #[test]
    fn goto_without_transition() {
        let g = Grammar::from_str("program : stmt\nstmt : IDENTIFIER").unwrap();
        let sets = FirstFollow::compute(&g);
        let start = start_set(&g, &sets);
        assert_eq!(goto(&start, SymbolID::T(TerminalID::EOI), &g, &sets), None);
    }

    #[test]
    fn epsilon_items_are_never_expanded() {
        let g = Grammar::from_str("s : a X\na : EPSILON").unwrap();
        let sets = FirstFollow::compute(&g);
        let start = start_set(&g, &sets);
        assert_eq!(
            render(&start, &g),
            ["S' -> • s, $", "s -> • a X, $", "a -> •, X"]
        );
        let epsilon = start.iter().last().unwrap();
        assert!(epsilon.is_reducible());
    }
}
