use lox::prelude::{Scanner, TokenType};

#[test]
fn scanner_works() {
    let input = "2 and 3";
    let mut scanner = Scanner::new(input);
    let tokens = scanner.scan_tokens();
    assert_eq!(tokens.len(), 4);
}

#[test]
fn always_ends_with_eof() {
    let mut scanner = Scanner::new("");
    let tokens = scanner.scan_tokens();
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].token_type, TokenType::EOF);
}

#[test]
fn unterminated_string_produces_no_token() {
    let mut scanner = Scanner::new("\"abc");
    let tokens = scanner.scan_tokens();
    // Just the EOF sentinel; the bad literal is reported, not emitted
    assert_eq!(tokens.len(), 1);
}

#[test]
fn unexpected_characters_are_skipped() {
    let mut scanner = Scanner::new("1 @ 2");
    let tokens = scanner.scan_tokens();
    let types: Vec<_> = tokens.iter().map(|t| t.token_type.clone()).collect();
    assert_eq!(types, vec![TokenType::Number, TokenType::Number, TokenType::EOF]);
}
