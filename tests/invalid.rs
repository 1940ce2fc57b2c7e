use datum_query as dq;
use dq::ParseError;
use pretty_assertions::assert_eq;

fn unexpected(token: char, position: usize) -> ParseError {
    ParseError::UnexpectedToken { token, position }
}

fn conflicting(command: char, other: char, position: usize) -> ParseError {
    ParseError::Conflicting {
        command,
        other,
        position,
    }
}

#[test]
fn test_empty_input() {
    assert_eq!(dq::parse(""), Err(ParseError::Empty));
    assert_eq!(dq::parse("."), Err(unexpected('.', 0)));
}

#[test]
fn test_trailing_separator_is_tolerated_once() {
    assert_eq!(dq::parse("a.").unwrap().len(), 1);
    assert_eq!(dq::parse("a..b"), Err(unexpected('.', 2)));
}

#[test]
fn test_commands_must_prefix_the_token() {
    assert_eq!(dq::parse("a.b!"), Err(unexpected('!', 3)));
    assert_eq!(dq::parse("ab$"), Err(unexpected('$', 2)));
    // escaped command characters are plain text
    assert_eq!(dq::parse("a\\$").unwrap().text(), "a$");
}

#[test]
fn test_duplicated_commands() {
    assert_eq!(
        dq::parse("$$a"),
        Err(ParseError::Duplicated {
            command: '$',
            position: 1
        })
    );
    assert_eq!(
        dq::parse("a.??b"),
        Err(ParseError::Duplicated {
            command: '?',
            position: 3
        })
    );
}

#[test]
fn test_conflicting_commands() {
    assert_eq!(dq::parse("?$a"), Err(conflicting('$', '?', 1)));
    assert_eq!(dq::parse("=a.?b"), Err(conflicting('?', '=', 3)));
    assert_eq!(dq::parse("$a.?b"), Err(conflicting('?', '$', 3)));
    assert_eq!(dq::parse("a.+.=b"), Err(conflicting('=', '+', 4)));
    assert_eq!(dq::parse("!a.+"), Err(conflicting('+', '!', 3)));
    assert_eq!(dq::parse("!a.$b"), Err(conflicting('$', '!', 3)));
    assert_eq!(dq::parse("$#"), Err(conflicting('#', '$', 1)));
    assert_eq!(dq::parse("+[a]"), Err(conflicting('[', '+', 1)));
}

#[test]
fn test_append_takes_no_text() {
    assert_eq!(dq::parse("+a"), Err(unexpected('a', 1)));
    let q = dq::parse("a.+").unwrap();
    assert!(q.leaf().is_append());
    assert_eq!(q.leaf().index(), None);
}

#[test]
fn test_self_finalizes_the_token() {
    assert_eq!(dq::parse("#a"), Err(unexpected('a', 1)));
    assert_eq!(dq::parse("#\\a"), Err(unexpected('\\', 1)));
}

#[test]
fn test_output_only_markers_are_rejected() {
    assert_eq!(dq::parse("a.@b"), Err(unexpected('@', 2)));
    assert_eq!(dq::parse("~x.a"), Err(unexpected('~', 0)));
    assert_eq!(dq::parse("a]"), Err(unexpected(']', 1)));
    assert_eq!(dq::parse("a\\"), Err(unexpected('\\', 1)));
}

#[test]
fn test_move_segments() {
    assert_eq!(dq::parse("a>b>c"), Err(ParseError::UnexpectedSegments(3)));
    assert_eq!(dq::parse("!a>b"), Err(conflicting('>', '!', 2)));
    assert_eq!(dq::parse("a>"), Err(unexpected('>', 1)));
}

#[test]
fn test_subquery_rules() {
    assert_eq!(dq::parse("a.[b.[c]]"), Err(ParseError::TooDeep { max: 1 }));
    assert_eq!(
        dq::parse("a.[$b]"),
        Err(ParseError::NotWritable("$b".to_string()))
    );
    assert_eq!(dq::parse("a.[b"), Err(unexpected('[', 2)));
    let q = dq::parse("a.[b.0]").unwrap();
    assert!(q.leaf().is_dynamic());
    assert_eq!(q.leaf().text(), "b.0");
    assert_eq!(q.leaf().subquery().map(|s| s.len()), Some(2));
}

#[test]
fn test_index_overflow() {
    assert_eq!(
        dq::parse("a.4294967296"),
        Err(ParseError::IndexOverflow("4294967296".to_string()))
    );
    assert_eq!(dq::parse("a.4294967295").unwrap().leaf().index(), Some(4294967295));
}

#[test]
fn test_path_length_limit() {
    let spec = |n: usize| vec!["k"; n].join(".");
    assert_eq!(dq::parse(&spec(254)).unwrap().len(), 254);
    assert_eq!(
        dq::parse(&spec(255)),
        Err(ParseError::TooDeep { max: 255 })
    );
}

#[test]
fn test_plus_beyond_the_limit_fails() {
    let q = dq::parse(&vec!["k"; 254].join(".")).unwrap();
    assert_eq!(q.plus_text("x"), Err(ParseError::TooDeep { max: 255 }));
}
