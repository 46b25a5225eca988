//! Canonical LR(1) automaton generation.

use crate::{
    closure::{closure, goto},
    first_follow::FirstFollow,
    grammar::{Grammar, SymbolID},
    item::{Item, ItemSet},
    types::Map,
    util::display_fn,
};
use std::{
    collections::{BTreeSet, VecDeque},
    fmt,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct StateID {
    raw: usize,
}

impl StateID {
    /// The state built from `[S' -> • start, $]`.
    pub const START: Self = Self::new(0);

    const fn new(raw: usize) -> Self {
        Self { raw }
    }

    pub const fn index(self) -> usize {
        self.raw
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

#[derive(Debug)]
pub struct State {
    id: StateID,
    items: ItemSet,
    transitions: Map<SymbolID, StateID>,
    accepting: bool,
}

impl State {
    fn new(id: StateID, items: ItemSet, g: &Grammar) -> Self {
        let accepting = items.iter().any(|item| item.is_accepting(g));
        Self {
            id,
            items,
            transitions: Map::default(),
            accepting,
        }
    }

    pub fn id(&self) -> StateID {
        self.id
    }

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    /// Outgoing edges, ordered by symbol.
    pub fn transitions(&self) -> &Map<SymbolID, StateID> {
        &self.transitions
    }

    pub fn transition(&self, symbol: SymbolID) -> Option<StateID> {
        self.transitions.get(&symbol).copied()
    }

    /// Whether this state contains `[S' -> start •, $]`.
    pub fn is_accepting(&self) -> bool {
        self.accepting
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            writeln!(f, "State {}:", self.id)?;
            if self.accepting {
                writeln!(f, "[ACCEPTING]")?;
            }
            for item in &self.items {
                writeln!(f, "  {}", item.display(g))?;
            }
            if !self.transitions.is_empty() {
                writeln!(f, "  Transitions:")?;
                for (symbol, target) in &self.transitions {
                    writeln!(f, "    {} -> State {}", g.symbol_name(*symbol), target)?;
                }
            }
            Ok(())
        })
    }
}

/// The canonical collection of LR(1) item sets and its transitions.
#[derive(Debug)]
pub struct DFA {
    states: Vec<State>,
}

impl DFA {
    pub fn generate(g: &Grammar) -> Self {
        let sets = FirstFollow::compute(g);
        Self::generate_with(g, &sets)
    }

    pub fn generate_with(g: &Grammar, sets: &FirstFollow) -> Self {
        let span = tracing::trace_span!("DFA::generate");
        let _entered = span.enter();

        let mut gen = DFAGenerator {
            grammar: g,
            sets,
            states: vec![],
            state_ids: Map::default(),
            pending_states: VecDeque::new(),
        };

        // 初期ノードの構築
        // [S' -> @ start] {$}
        let start: ItemSet = Some(Item::start(g)).into_iter().collect();
        let start = closure(&start, g, sets);
        let id = gen.enqueue_state(start);
        debug_assert_eq!(id, StateID::START);

        // 新規にノードが生成されなくなるまで繰り返す
        gen.populate_states();

        tracing::debug!("generated {} states", gen.states.len());

        Self { states: gen.states }
    }

    /// All states in discovery order, the index of each being its id.
    pub fn states(&self) -> &[State] {
        &self.states
    }

    pub fn state(&self, id: StateID) -> &State {
        &self.states[id.raw]
    }

    pub fn start_state(&self) -> &State {
        self.state(StateID::START)
    }

    pub fn accepting_states(&self) -> impl Iterator<Item = &State> + '_ {
        self.states.iter().filter(|state| state.accepting)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for state in &self.states {
                write!(f, "{}", state.display(g))?;
                writeln!(f, "-----------------------------")?;
            }
            Ok(())
        })
    }
}

// === DFAGenerator ===

#[derive(Debug)]
struct DFAGenerator<'g> {
    grammar: &'g Grammar,
    sets: &'g FirstFollow,
    states: Vec<State>,
    state_ids: Map<ItemSet, StateID>,
    pending_states: VecDeque<StateID>,
}

impl DFAGenerator<'_> {
    fn enqueue_state(&mut self, items: ItemSet) -> StateID {
        let id = StateID::new(self.states.len());
        self.state_ids.insert(items.clone(), id);
        self.states.push(State::new(id, items, self.grammar));
        self.pending_states.push_back(id);
        id
    }

    fn populate_states(&mut self) {
        while let Some(current) = self.pending_states.pop_front() {
            // ドットの直後に現れる記号 (終端記号が先、宣言順)
            let symbols: BTreeSet<SymbolID> = self.states[current.raw]
                .items
                .iter()
                .filter_map(Item::next_symbol)
                .collect();

            let mut transitions = Map::default();
            for symbol in symbols {
                let items = &self.states[current.raw].items;
                let Some(target) = goto(items, symbol, self.grammar, self.sets) else {
                    continue;
                };
                // 内容が同じ item set は同一の状態とみなす
                let next = match self.state_ids.get(&target) {
                    Some(id) => *id,
                    None => {
                        let id = self.enqueue_state(target);
                        tracing::trace!(
                            "{} --({})--> {} (new)",
                            current,
                            self.grammar.symbol_name(symbol),
                            id
                        );
                        id
                    }
                };
                transitions.insert(symbol, next);
            }

            self.states[current.raw].transitions = transitions;
        }
    }
}
