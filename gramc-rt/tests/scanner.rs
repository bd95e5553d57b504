use gramc::diag::{DiagnosticKind, Diagnostics};
use gramc::grammar::{Grammar, GrammarBuilder, LexemKind};
use gramc::lexgen::{LexerBuilder, LexerTables};
use gramc_rt::{Position, ScanError, Scanner};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn lexer(rules: &[(&str, &str, i32)]) -> (Grammar, LexerTables, Diagnostics) {
    let mut sink = Diagnostics::new();
    let mut b = GrammarBuilder::new();
    let initial = b.add_state("initial", None).unwrap();
    for &(name, regex, priority) in rules {
        let sym = match b.symbol(name) {
            Some(sym) => sym,
            None => b.add_terminal(name, None, None).unwrap(),
        };
        let re = b.parse_regex(regex, None, &mut sink);
        b.add_lexem(LexemKind::Normal, sym, re, &[initial], priority, None, None)
            .unwrap();
    }
    let g = b.create();
    let t = LexerBuilder::new(&g).build(&mut sink).unwrap();
    (g, t, sink)
}

/// `name:text` for tokens, `!text` for skipped input.
fn tokens(g: &Grammar, t: &LexerTables, input: &str) -> Vec<String> {
    Scanner::new(t, input)
        .map(|r| match r {
            Ok(tok) => format!("{}:{}", g.symbol(tok.symbol).name, tok.text),
            Err(ScanError::InvalidToken { text, .. }) => format!("!{}", text),
            Err(e) => panic!("{}", e),
        })
        .collect()
}

#[test]
fn longest_match_falls_back_to_shorter_rule() {
    init_logger();
    let (g, t, sink) = lexer(&[("a", "a", 0), ("ab", "ab", 0)]);
    assert!(sink.is_empty(), "{:?}", sink);
    assert_eq!(tokens(&g, &t, "ac"), ["a:a", "!c", "eoi:"]);
    assert_eq!(tokens(&g, &t, "aba"), ["ab:ab", "a:a", "eoi:"]);
}

#[test]
fn backtracking_replays_the_rest() {
    init_logger();
    let (g, t, _) = lexer(&[("a", "a", 0), ("abc", "abc", 0)]);
    let mut scanner = Scanner::new(&t, "abd");
    let first = scanner.try_next().unwrap().unwrap();
    assert_eq!(g.symbol(first.symbol).name, "a");
    assert_eq!(first.text, "a");
    assert_eq!(scanner.stats.backtracks, 1);
    assert_eq!(scanner.rest(), "bd");
    let rest: Vec<_> = scanner.map(|r| r.is_ok()).collect();
    assert_eq!(rest, [false, false, true]);
}

#[test]
fn priority_selects_keyword() {
    init_logger();
    let (g, t, sink) = lexer(&[("id", "[a-z]+", 0), ("ret", "return", 1), ("ws", " +", 0)]);
    assert!(!sink.has_errors());
    assert_eq!(
        tokens(&g, &t, "return returns"),
        ["ret:return", "ws: ", "id:returns", "eoi:"]
    );
}

#[test]
fn eoi_is_produced_once() {
    init_logger();
    let (_, t, _) = lexer(&[("x", "x", 0)]);
    let mut scanner = Scanner::new(&t, "");
    assert!(scanner.try_next().unwrap().unwrap().is_eoi());
    assert_eq!(scanner.try_next().unwrap(), None);
    assert_eq!(scanner.try_next().unwrap(), None);
    assert_eq!(scanner.stats.tokens, 1);
}

#[test]
fn eoi_anchored_rule() {
    init_logger();
    let (g, t, _) = lexer(&[("last", "x{eoi}", 0), ("x", "x", 0)]);
    assert_eq!(tokens(&g, &t, "xx"), ["x:x", "last:x", "eoi:"]);
}

#[test]
fn rule_ending_in_eoi_is_followed_by_eoi() {
    init_logger();
    let (g, t, sink) = lexer(&[("x", "x", 0), ("tail", "x*{eoi}", 0)]);
    assert!(!sink.has_errors(), "{:?}", sink);
    assert_eq!(tokens(&g, &t, ""), ["tail:", "eoi:"]);
    assert_eq!(tokens(&g, &t, "xx"), ["tail:xx", "eoi:"]);

    let mut scanner = Scanner::new(&t, "");
    let tail = scanner.try_next().unwrap().unwrap();
    assert!(!tail.is_eoi());
    assert!(scanner.try_next().unwrap().unwrap().is_eoi());
    assert_eq!(scanner.try_next().unwrap(), None);
    assert_eq!(scanner.stats.tokens, 2);
}

#[test]
fn bare_eoi_rule_terminates() {
    init_logger();
    let (g, t, _) = lexer(&[("x", "x", 0), ("end", "{eoi}", 0)]);
    assert_eq!(tokens(&g, &t, "x"), ["x:x", "end:", "eoi:"]);
}

#[test]
fn case_insensitive_negated_class() {
    init_logger();
    let (g, t, _) = lexer(&[("n", "(?i:[^a])", 0)]);
    assert_eq!(tokens(&g, &t, "a"), ["!a", "eoi:"]);
    assert_eq!(tokens(&g, &t, "bA"), ["n:b", "!A", "eoi:"]);
    let (g, t, _) = lexer(&[("sep", "(?i:\\W)", 0)]);
    assert_eq!(tokens(&g, &t, "k!"), ["!k", "sep:!", "eoi:"]);
}

#[test]
fn spans_track_lines_and_columns() {
    init_logger();
    let (_, t, _) = lexer(&[("id", "[a-zλ]+", 0), ("nl", "\n", 0)]);
    let toks: Vec<_> = Scanner::new(&t, "ab\nλx").map(Result::unwrap).collect();
    assert_eq!(toks.len(), 4);
    assert_eq!(toks[0].span.to_string(), "1:1-3");
    assert_eq!(toks[2].text, "λx");
    assert_eq!(
        toks[2].span.start,
        Position {
            offset: 3,
            line: 2,
            column: 1
        }
    );
    assert_eq!(toks[2].span.end.offset, 6);
    assert_eq!(toks[3].span.start, toks[2].span.end);
}

#[test]
fn invalid_input_skips_one_char() {
    init_logger();
    let (_, t, _) = lexer(&[("num", "[0-9]+", 0)]);
    let mut scanner = Scanner::new(&t, "1λ2");
    scanner.try_next().unwrap();
    let err = scanner.try_next().unwrap_err();
    assert_eq!(err.to_string(), "invalid token `λ' at 1:2-3");
    assert_eq!(scanner.stats.skipped, 1);
    assert_eq!(scanner.try_next().unwrap().unwrap().text, "2");
}

#[test]
fn lexer_states_switch_rule_sets() {
    init_logger();
    let mut sink = Diagnostics::new();
    let mut b = GrammarBuilder::new();
    let initial = b.add_state("initial", None).unwrap();
    let string = b.add_state("string", None).unwrap();
    let quote = b.add_terminal("quote", None, None).unwrap();
    let chars = b.add_terminal("chars", None, None).unwrap();
    let id = b.add_terminal("id", None, None).unwrap();
    let re = b.parse_regex("\"", None, &mut sink);
    b.add_lexem(LexemKind::Normal, quote, re, &[initial, string], 0, None, None)
        .unwrap();
    let re = b.parse_regex("[^\"]+", None, &mut sink);
    b.add_lexem(LexemKind::Normal, chars, re, &[string], 0, None, None)
        .unwrap();
    let re = b.parse_regex("[a-z]+", None, &mut sink);
    b.add_lexem(LexemKind::Normal, id, re, &[initial], 0, None, None)
        .unwrap();
    let g = b.create();
    let t = LexerBuilder::new(&g).build(&mut sink).unwrap();
    assert!(!sink.has_errors());

    let mut scanner = Scanner::new(&t, "a\"b c\"d");
    let mut seen = Vec::new();
    while let Some(tok) = scanner.try_next().unwrap() {
        let name = g.symbol(tok.symbol).name.clone();
        if name == "quote" {
            scanner.set_state(1 - scanner.state()).unwrap();
        }
        seen.push(format!("{}:{}", name, tok.text));
    }
    assert_eq!(
        seen,
        ["id:a", "quote:\"", "chars:b c", "quote:\"", "id:d", "eoi:"]
    );
    assert!(matches!(
        scanner.set_state(2),
        Err(ScanError::UnknownState { state: 2, states: 2 })
    ));
}

#[test]
fn soft_keywords_refine_class_rule() {
    init_logger();
    let mut sink = Diagnostics::new();
    let mut b = GrammarBuilder::new();
    let initial = b.add_state("initial", None).unwrap();
    let id = b.add_terminal("id", None, None).unwrap();
    let kw_if = b.add_soft_terminal("kw_if", id, None).unwrap();
    let ws = b.add_layout("ws", None, None).unwrap();
    let re = b.parse_regex("[a-z]+", None, &mut sink);
    let class = b
        .add_lexem(LexemKind::Class, id, re, &[initial], 0, None, None)
        .unwrap();
    let re = b.parse_regex("if", None, &mut sink);
    b.add_lexem(LexemKind::Soft, kw_if, re, &[initial], 0, Some(class), None)
        .unwrap();
    let re = b.parse_regex(" +", None, &mut sink);
    b.add_lexem(LexemKind::Normal, ws, re, &[initial], 0, None, None)
        .unwrap();
    let g = b.create();
    let t = LexerBuilder::new(&g).build(&mut sink).unwrap();
    assert!(!sink.has_errors(), "{:?}", sink);
    assert_eq!(
        tokens(&g, &t, "if iff"),
        ["kw_if:if", "ws: ", "id:iff", "eoi:"]
    );
}

#[test]
fn cyclic_patterns_do_not_stop_the_build() {
    init_logger();
    let mut sink = Diagnostics::new();
    let mut b = GrammarBuilder::new();
    let initial = b.add_state("initial", None).unwrap();
    let re = b.parse_regex("a{b}?", None, &mut sink);
    b.add_pattern("a", re, None).unwrap();
    let re = b.parse_regex("b{a}?", None, &mut sink);
    b.add_pattern("b", re, None).unwrap();
    let looping = b.add_terminal("looping", None, None).unwrap();
    let word = b.add_terminal("word", None, None).unwrap();
    let re = b.parse_regex("{a}", None, &mut sink);
    b.add_lexem(LexemKind::Normal, looping, re, &[initial], 0, None, None)
        .unwrap();
    let re = b.parse_regex("[a-z]+", None, &mut sink);
    b.add_lexem(LexemKind::Normal, word, re, &[initial], 0, None, None)
        .unwrap();
    let g = b.create();
    let t = LexerBuilder::new(&g).build(&mut sink).unwrap();
    assert!(sink.has_errors());
    assert!(
        sink.of_kind(DiagnosticKind::Structural)
            .any(|d| d.message.contains("references itself"))
    );
    assert_eq!(tokens(&g, &t, "ab"), ["word:ab", "eoi:"]);
}

#[test]
fn token_streams_are_reproducible() {
    init_logger();
    let rules = [
        ("id", "[a-zA-Z_][a-zA-Z_0-9]*", 0),
        ("num", "[0-9]+(\\.[0-9]+)?", 0),
        ("op", "[-+*/=<>]=?", 0),
        ("ws", "[ \\t\\n]+", 0),
    ];
    let input = "x1 = 3.14 * y <= 2\n";
    let (g1, t1, _) = lexer(&rules);
    let (g2, t2, _) = lexer(&rules);
    assert_eq!(t1, t2);
    assert_eq!(tokens(&g1, &t1, input), tokens(&g2, &t2, input));
}
