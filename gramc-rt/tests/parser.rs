use anyhow::Result;
use gramc::diag::Diagnostics;
use gramc::grammar::{Assoc, Grammar, GrammarBuilder, LexemKind, StateId, SymbolId};
use gramc::{LalrBuilder, LexerBuilder, LexerTables, ParserTables};
use gramc_rt::{Node, Parser, Scanner};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct Lang {
    b: GrammarBuilder,
    sink: Diagnostics,
    initial: StateId,
}

struct Compiled {
    grammar: Grammar,
    lexer: LexerTables,
    parser: ParserTables,
}

impl Lang {
    fn new() -> Self {
        let mut b = GrammarBuilder::new();
        let initial = b.add_state("initial", None).unwrap();
        Self {
            b,
            sink: Diagnostics::new(),
            initial,
        }
    }

    fn token(&mut self, name: &str, regex: &str) -> SymbolId {
        let sym = self.b.add_terminal(name, None, None).unwrap();
        self.lexem(sym, regex);
        sym
    }

    fn layout(&mut self, regex: &str) -> SymbolId {
        let sym = self.b.add_layout("ws", None, None).unwrap();
        self.lexem(sym, regex);
        sym
    }

    fn lexem(&mut self, sym: SymbolId, regex: &str) {
        let re = self.b.parse_regex(regex, None, &mut self.sink);
        self.b
            .add_lexem(LexemKind::Normal, sym, re, &[self.initial], 0, None, None)
            .unwrap();
    }

    fn nonterminal(&mut self, name: &str) -> SymbolId {
        self.b.add_nonterminal(name, None, None).unwrap()
    }

    fn build(self) -> Compiled {
        let mut sink = self.sink;
        let grammar = self.b.create();
        let lexer = LexerBuilder::new(&grammar).build(&mut sink).unwrap();
        let parser = LalrBuilder::new(&grammar).build(&mut sink).unwrap();
        assert!(!sink.has_errors(), "{:?}", sink);
        Compiled {
            grammar,
            lexer,
            parser,
        }
    }
}

impl Compiled {
    fn parse(&self, input: &str) -> Result<Node> {
        let mut scanner = Scanner::new(&self.lexer, input);
        Parser::new(&self.parser).parse(&mut scanner, 0)
    }

    fn bracketed(&self, input: &str) -> String {
        self.parse(input).unwrap().bracketed()
    }
}

/// expr ::= expr op expr | NUM, with precedence levels given as
/// space-separated operators.
fn calc(levels: &[(Assoc, &str)]) -> Compiled {
    let mut l = Lang::new();
    l.layout("[ ]+");
    let num = l.token("NUM", "[0-9]+");
    let ops: Vec<SymbolId> = ["+", "*", "^"]
        .iter()
        .map(|op| l.token(op, &format!("\\{}", op)))
        .collect();
    let expr = l.nonterminal("expr");
    for (assoc, names) in levels {
        let syms: Vec<SymbolId> = names
            .split(' ')
            .map(|n| l.b.symbol(n).unwrap())
            .collect();
        l.b.add_prio(*assoc, &syms, None).unwrap();
    }
    for op in ops {
        l.b.add_rule(expr, &[expr, op, expr]).unwrap();
    }
    l.b.add_rule(expr, &[num]).unwrap();
    l.b.add_input(expr, true, None).unwrap();
    l.build()
}

#[test]
fn left_associative_sum() {
    init_logger();
    let c = calc(&[(Assoc::Left, "+"), (Assoc::Left, "*"), (Assoc::Right, "^")]);
    assert!(c.parser.conflicts.is_empty());
    assert_eq!(c.bracketed("1+2+3"), "((1+2)+3)");
    assert_eq!(c.bracketed("1+2*3"), "(1+(2*3))");
    assert_eq!(c.bracketed("1*2+3"), "((1*2)+3)");
    assert_eq!(c.bracketed("2^3^4"), "(2^(3^4))");
    assert_eq!(c.bracketed(" 7 "), "7");
}

#[test]
fn missing_precedence_shifts() {
    init_logger();
    let c = calc(&[]);
    assert!(!c.parser.conflicts.is_empty());
    assert_eq!(c.bracketed("1+2+3"), "(1+(2+3))");
}

#[test]
fn tree_carries_rules_and_spans() {
    init_logger();
    let c = calc(&[(Assoc::Left, "+ * ^")]);
    let tree = c.parse("10 + 2").unwrap();
    let Node::Branch { rule, symbol, span, children } = &tree else {
        panic!("expected a branch: {:?}", tree);
    };
    assert_eq!(*rule, 0);
    assert_eq!(c.grammar.symbol(*symbol).name, "expr");
    assert_eq!(span.to_string(), "1:1-7");
    assert_eq!(children.len(), 3);
    assert_eq!(children[1].span().start.column, 4);
}

#[test]
fn syntax_errors() {
    init_logger();
    let c = calc(&[(Assoc::Left, "+"), (Assoc::Left, "*"), (Assoc::Left, "^")]);
    let err = c.parse("1++2").unwrap_err().to_string();
    assert_eq!(err, "unexpected `+' at 1:3-4");
    let err = c.parse("1+").unwrap_err().to_string();
    assert_eq!(err, "unexpected end of input at 1:3");
    let err = c.parse("1+x").unwrap_err().to_string();
    assert_eq!(err, "invalid token `x' at 1:3-4");
}

#[test]
fn layout_and_default_reductions() {
    init_logger();
    let mut l = Lang::new();
    l.layout("[ \\n]+");
    let num = l.token("NUM", "[0-9]+");
    let list = l.nonterminal("list");
    l.b.add_rule(list, &[]).unwrap();
    l.b.add_rule(list, &[list, num]).unwrap();
    l.b.add_input(list, true, None).unwrap();
    let c = l.build();

    let mut scanner = Scanner::new(&c.lexer, " 1\n 2 ");
    let mut parser = Parser::new(&c.parser);
    let tree = parser.parse(&mut scanner, 0).unwrap();
    assert_eq!(tree.bracketed(), "((()1)2)");
    assert_eq!(parser.stats.layout, 3);
    assert_eq!(parser.stats.shifts, 2);
    assert_eq!(parser.stats.reductions, 3);
    assert!(parser.stats.default_reductions > 0);
}

#[test]
fn soft_keywords_in_rules() {
    init_logger();
    let mut l = Lang::new();
    l.layout(" +");
    let id = l.b.add_terminal("ID", None, None).unwrap();
    let kw_if = l.b.add_soft_terminal("IF", id, None).unwrap();
    let re = l.b.parse_regex("[a-z]+", None, &mut l.sink);
    let class = l
        .b
        .add_lexem(LexemKind::Class, id, re, &[l.initial], 0, None, None)
        .unwrap();
    let re = l.b.parse_regex("if", None, &mut l.sink);
    l.b.add_lexem(LexemKind::Soft, kw_if, re, &[l.initial], 0, Some(class), None)
        .unwrap();
    let stmt = l.nonterminal("stmt");
    l.b.add_rule(stmt, &[kw_if, id]).unwrap();
    l.b.add_rule(stmt, &[id]).unwrap();
    l.b.add_input(stmt, true, None).unwrap();
    let c = l.build();

    assert_eq!(c.bracketed("if x"), "(ifx)");
    assert_eq!(c.bracketed("iff"), "iff");
    assert!(c.parse("if").is_err());
}

#[test]
fn inputs_without_eoi_parse_repeatedly() {
    init_logger();
    let mut l = Lang::new();
    let num = l.token("NUM", "[0-9]+");
    let semi = l.token(";", ";");
    let item = l.nonterminal("item");
    let items = l.nonterminal("items");
    l.b.add_rule(item, &[num, semi]).unwrap();
    l.b.add_rule(items, &[item]).unwrap();
    l.b.add_rule(items, &[items, item]).unwrap();
    l.b.add_input(items, true, None).unwrap();
    l.b.add_input(item, false, None).unwrap();
    let c = l.build();
    assert_eq!(c.parser.start_states.len(), 2);

    let mut scanner = Scanner::new(&c.lexer, "1;2;");
    let mut parser = Parser::new(&c.parser);
    assert_eq!(parser.parse(&mut scanner, 1).unwrap().bracketed(), "(1;)");
    assert_eq!(parser.parse(&mut scanner, 1).unwrap().bracketed(), "(2;)");
    assert!(parser.parse(&mut scanner, 1).is_err());

    assert_eq!(c.bracketed("1;2;"), "((1;)(2;))");
    assert!(
        Parser::new(&c.parser)
            .parse(&mut Scanner::new(&c.lexer, ""), 7)
            .is_err()
    );
}
