//! Grammar types.

use crate::{
    syntax::{self, RawProduction},
    types::Map,
    util::display_fn,
};
use std::{fmt, fs, io, path::Path, rc::Rc};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}
impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub(crate) const fn into_raw(self) -> u16 {
        self.raw
    }

    #[inline]
    pub(crate) const fn from_raw(raw: u16) -> Self {
        Self::new(raw)
    }
}

#[derive(Debug)]
pub struct Terminal {
    id: TerminalID,
    name: String,
}
impl Terminal {
    pub fn id(&self) -> TerminalID {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}
impl NonterminalID {
    /// The augmented start symbol `S'`.
    pub const START: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }
}

#[derive(Debug)]
pub struct Nonterminal {
    id: NonterminalID,
    name: String,
}
impl Nonterminal {
    pub fn id(&self) -> NonterminalID {
        self.id
    }
    pub fn name(&self) -> &str {
        &self.name
    }
}
impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// A grammar symbol, classified once when the grammar is loaded.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ProductionID {
    raw: u16,
}
impl ProductionID {
    /// The augmented production `S' -> start`.
    pub const ACCEPT: Self = Self::new(0);

    const OFFSET: u16 = 1;

    #[inline]
    const fn new(raw: u16) -> Self {
        Self { raw }
    }
}
impl fmt::Display for ProductionID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.raw, f)
    }
}

/// The type that represents a production rule in grammar.
#[derive(Debug)]
pub struct Production {
    id: ProductionID,
    left: NonterminalID,
    right: Rc<[SymbolID]>,
}
impl Production {
    pub fn id(&self) -> ProductionID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> NonterminalID {
        self.left
    }

    /// Return the right-hand side of this production, empty for an epsilon production.
    pub fn right(&self) -> &Rc<[SymbolID]> {
        &self.right
    }

    pub fn is_epsilon(&self) -> bool {
        self.right.is_empty()
    }

    // `"LHS -> R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(f, "{} ->", g.nonterminals[&self.left])?;
            if self.is_epsilon() {
                write!(f, " {}", syntax::EPSILON)?;
            }
            for symbol in self.right.iter() {
                write!(f, " {}", g.symbol_name(*symbol))?;
            }
            Ok(())
        })
    }
}

/// The grammar definition, augmented with `S' -> start`.
#[derive(Debug)]
pub struct Grammar {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    start_symbol: NonterminalID,
    symbols: Map<String, SymbolID>,
    productions_by_left: Map<NonterminalID, Vec<ProductionID>>,
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in self.terminals.values() {
            writeln!(f, "{}", terminal)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for nonterminal in self.nonterminals.values() {
            write!(f, "{}", nonterminal)?;
            if nonterminal.id() == self.start_symbol {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## productions:")?;
        for production in self.productions.values() {
            writeln!(f, "[{:02}] {}", production.id, production.display(self))?;
        }

        Ok(())
    }
}

impl Grammar {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Grammar, GrammarError> {
        let source = fs::read_to_string(path).map_err(GrammarError::IO)?;
        Self::from_str(&source)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(source: &str) -> Result<Grammar, GrammarError> {
        let raw = syntax::parse(source)?;
        let mut def = GrammarDef::new();
        for production in &raw {
            def.production(production)?;
        }
        def.end()
    }

    pub fn terminals(&self) -> impl Iterator<Item = &Terminal> + '_ {
        self.terminals.values()
    }

    pub fn nonterminals(&self) -> impl Iterator<Item = &Nonterminal> + '_ {
        self.nonterminals.values()
    }

    pub fn terminal(&self, id: TerminalID) -> &Terminal {
        &self.terminals[&id]
    }

    pub fn nonterminal(&self, id: NonterminalID) -> &Nonterminal {
        &self.nonterminals[&id]
    }

    /// Iterate over all productions, the augmented one first.
    pub fn productions(&self) -> impl Iterator<Item = &Production> + '_ {
        self.productions.values()
    }

    pub fn production(&self, id: ProductionID) -> &Production {
        &self.productions[&id]
    }

    /// Iterate over the productions whose left-hand side is `left`, in source order.
    pub fn productions_of(&self, left: NonterminalID) -> impl Iterator<Item = &Production> + '_ {
        self.productions_by_left
            .get(&left)
            .into_iter()
            .flatten()
            .map(move |id| &self.productions[id])
    }

    /// The original start symbol, i.e. the left-hand side of the first production.
    pub fn start_symbol(&self) -> NonterminalID {
        self.start_symbol
    }

    pub fn is_terminal(&self, name: &str) -> bool {
        matches!(self.symbols.get(name), Some(SymbolID::T(..)))
    }

    pub fn is_nonterminal(&self, name: &str) -> bool {
        matches!(self.symbols.get(name), Some(SymbolID::N(..)))
    }

    /// Look up a symbol by name.
    pub fn symbol(&self, name: &str) -> Result<SymbolID, GrammarError> {
        self.symbols
            .get(name)
            .copied()
            .ok_or_else(|| GrammarError::UnknownSymbol { name: name.into() })
    }

    pub fn symbol_name(&self, symbol: SymbolID) -> &str {
        match symbol {
            SymbolID::T(t) => self.terminals[&t].name(),
            SymbolID::N(n) => self.nonterminals[&n].name(),
        }
    }

    /// Nonterminals that appear in the grammar but have no production.
    pub fn unproductive_nonterminals(&self) -> impl Iterator<Item = &Nonterminal> + '_ {
        self.nonterminals
            .values()
            .filter(|n| !self.productions_by_left.contains_key(&n.id()))
    }
}

/// The contextural values for building a `Grammar`.
#[derive(Debug)]
struct GrammarDef {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    productions: Map<ProductionID, Production>,
    start: Option<NonterminalID>,
    symbols: Map<String, SymbolID>,
    next_terminal_id: u16,
    next_nonterminal_id: u16,
    next_production_id: u16,
}

impl GrammarDef {
    fn new() -> Self {
        let mut def = Self {
            terminals: Map::default(),
            nonterminals: Map::default(),
            productions: Map::default(),
            start: None,
            symbols: Map::default(),
            next_terminal_id: TerminalID::OFFSET,
            next_nonterminal_id: NonterminalID::OFFSET,
            next_production_id: ProductionID::OFFSET,
        };

        def.terminals.insert(
            TerminalID::EOI,
            Terminal {
                id: TerminalID::EOI,
                name: syntax::EOI.into(),
            },
        );
        def.nonterminals.insert(
            NonterminalID::START,
            Nonterminal {
                id: NonterminalID::START,
                name: syntax::START.into(),
            },
        );

        def
    }

    /// Resolve a symbol name, declaring it on first use.
    fn symbol(&mut self, name: &str, line: usize) -> Result<SymbolID, GrammarError> {
        if let Some(symbol) = self.symbols.get(name) {
            return Ok(*symbol);
        }

        let symbol = if syntax::is_terminal_name(name) {
            let id = TerminalID::new(next_id(&mut self.next_terminal_id, line)?);
            self.terminals.insert(
                id,
                Terminal {
                    id,
                    name: name.into(),
                },
            );
            SymbolID::T(id)
        } else {
            let id = NonterminalID::new(next_id(&mut self.next_nonterminal_id, line)?);
            self.nonterminals.insert(
                id,
                Nonterminal {
                    id,
                    name: name.into(),
                },
            );
            SymbolID::N(id)
        };
        self.symbols.insert(name.into(), symbol);

        Ok(symbol)
    }

    fn production(&mut self, raw: &RawProduction<'_>) -> Result<(), GrammarError> {
        let left = match self.symbol(raw.left, raw.line)? {
            SymbolID::N(n) => n,
            SymbolID::T(..) => {
                return Err(GrammarError::Malformed {
                    line: raw.line,
                    msg: format!("the left-hand side `{}' is a terminal symbol", raw.left),
                })
            }
        };
        // 最初に登場した左辺を開始記号とする
        self.start.get_or_insert(left);

        let right = raw
            .right
            .iter()
            .map(|name| self.symbol(name, raw.line))
            .collect::<Result<Rc<[_]>, _>>()?;

        if self
            .productions
            .values()
            .any(|p| p.left == left && p.right == right)
        {
            tracing::warn!("line {}: skipping duplicate production", raw.line);
            return Ok(());
        }

        let id = ProductionID::new(next_id(&mut self.next_production_id, raw.line)?);
        self.productions.insert(id, Production { id, left, right });

        Ok(())
    }

    fn end(mut self) -> Result<Grammar, GrammarError> {
        let start = self.start.ok_or(GrammarError::Empty)?;

        // S' -> start
        self.productions.insert(
            ProductionID::ACCEPT,
            Production {
                id: ProductionID::ACCEPT,
                left: NonterminalID::START,
                right: Rc::new([SymbolID::N(start)]),
            },
        );
        self.productions.sort_keys();

        let mut productions_by_left = Map::<NonterminalID, Vec<ProductionID>>::default();
        for production in self.productions.values() {
            productions_by_left
                .entry(production.left)
                .or_default()
                .push(production.id);
        }

        Ok(Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            productions: self.productions,
            start_symbol: start,
            symbols: self.symbols,
            productions_by_left,
        })
    }
}

fn next_id(next: &mut u16, line: usize) -> Result<u16, GrammarError> {
    let id = *next;
    *next = next.checked_add(1).ok_or_else(|| GrammarError::Malformed {
        line,
        msg: "too many symbols or productions".into(),
    })?;
    Ok(id)
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarError {
    #[error("IO error: {}", _0)]
    IO(#[source] io::Error),

    #[error("malformed grammar at line {}: {}", line, msg)]
    Malformed { line: usize, msg: String },

    #[error("malformed grammar: no production found")]
    Empty,

    #[error("unknown symbol: `{}'", name)]
    UnknownSymbol { name: String },

    #[error("`{}' is not a nonterminal symbol", name)]
    NotNonterminal { name: String },
}

impl GrammarError {
    /// Whether this error means the grammar source could not be turned into a grammar.
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. } | Self::Empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn augmented_grammar() {
        let g = Grammar::from_str(
            "
            program : stmt
            stmt : IDENTIFIER
            ",
        )
        .unwrap();

        let program = g.symbol("program").unwrap();
        assert_eq!(program, SymbolID::N(g.start_symbol()));

        let accept = g.production(ProductionID::ACCEPT);
        assert_eq!(accept.left(), NonterminalID::START);
        assert_eq!(&accept.right()[..], &[program]);
        assert_eq!(g.productions_of(NonterminalID::START).count(), 1);
        assert_eq!(g.productions().next().map(|p| p.id()), Some(ProductionID::ACCEPT));

        assert!(g.is_terminal("IDENTIFIER"));
        assert!(!g.is_nonterminal("IDENTIFIER"));
        assert!(g.is_nonterminal("stmt"));
        assert!(!g.is_terminal("stmt"));
        assert!(!g.is_terminal("missing"));
        assert!(!g.is_nonterminal("missing"));
    }

    #[test]
    fn epsilon_production() {
        let g = Grammar::from_str("a : b c\nb : EPSILON\nc : X").unwrap();
        let b = match g.symbol("b").unwrap() {
            SymbolID::N(b) => b,
            SymbolID::T(..) => panic!("b must be a nonterminal"),
        };
        let productions: Vec<_> = g.productions_of(b).collect();
        assert_eq!(productions.len(), 1);
        assert!(productions[0].is_epsilon());
        assert_eq!(productions[0].display(&g).to_string(), "b -> EPSILON");
        assert!(!g.is_terminal("EPSILON") && !g.is_nonterminal("EPSILON"));
    }

    #[test]
    fn duplicate_productions_are_stored_once() {
        let g = Grammar::from_str("a : X\na : X\na : Y").unwrap();
        // `S' -> a`, `a -> X`, `a -> Y`
        assert_eq!(g.productions().count(), 3);
    }

    #[test]
    fn malformed_grammar() {
        let err = Grammar::from_str("program : stmt\nstmt IDENTIFIER").unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(err, GrammarError::Malformed { line: 2, .. }));
    }

    #[test]
    fn empty_grammar() {
        let err = Grammar::from_str("\n  \n# nothing here\n").unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(err, GrammarError::Empty));
    }

    #[test]
    fn unknown_symbol() {
        let g = Grammar::from_str("program : stmt\nstmt : IDENTIFIER").unwrap();
        let err = g.symbol("expr").unwrap_err();
        assert!(matches!(err, GrammarError::UnknownSymbol { ref name } if name == "expr"));
    }

    #[test]
    fn unproductive_nonterminals() {
        let g = Grammar::from_str("program : stmt tail\nstmt : IDENTIFIER").unwrap();
        let names: Vec<_> = g.unproductive_nonterminals().map(|n| n.name()).collect();
        assert_eq!(names, vec!["tail"]);
    }

    #[test]
    fn display_grammar() {
        let g = Grammar::from_str("program : stmt\nstmt : IDENTIFIER").unwrap();
        assert_eq!(
            g.to_string(),
            "## terminals:\n$\nIDENTIFIER\n\n\
             ## nonterminals:\nS'\nprogram (start)\nstmt\n\n\
             ## productions:\n[00] S' -> program\n[01] program -> stmt\n[02] stmt -> IDENTIFIER\n"
        );
    }
}
