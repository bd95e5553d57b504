/// Knobs shared by [`LexerBuilder`](crate::lexgen::LexerBuilder) and
/// [`LalrBuilder`](crate::lalr::LalrBuilder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Attach a human-readable dump of the automaton to the produced tables.
    pub debug: bool,
    /// Largest count accepted in a `{m,n}` repetition.
    pub max_repeat: u32,
    /// Compute per-state default reductions for the parser tables.
    pub default_reductions: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            debug: false,
            max_repeat: 1000,
            default_reductions: true,
        }
    }
}

impl BuildOptions {
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}
