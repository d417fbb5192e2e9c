//! Unit tests for visibility expressions and authorizations

use authgraph::{Authorizations, GraphError, Visibility};

#[test]
fn test_empty_visibility_is_readable_by_everyone() {
    assert!(Authorizations::empty().can_read(&Visibility::empty()));
    assert!(Authorizations::new(["a"]).can_read(&Visibility::empty()));
}

#[test]
fn test_single_token() {
    let vis = Visibility::new("secret");
    assert!(Authorizations::new(["secret"]).can_read(&vis));
    assert!(!Authorizations::new(["public"]).can_read(&vis));
    assert!(!Authorizations::empty().can_read(&vis));
}

#[test]
fn test_and_or_and_grouping() {
    let both = Visibility::new("a&b");
    assert!(Authorizations::new(["a", "b"]).can_read(&both));
    assert!(!Authorizations::new(["a"]).can_read(&both));

    let either = Visibility::new("a|b");
    assert!(Authorizations::new(["b"]).can_read(&either));
    assert!(!Authorizations::new(["c"]).can_read(&either));

    let grouped = Visibility::new("(a|b)&c");
    assert!(Authorizations::new(["b", "c"]).can_read(&grouped));
    assert!(!Authorizations::new(["a", "b"]).can_read(&grouped));
}

#[test]
fn test_malformed_expression_is_never_readable() {
    let broken = Visibility::new("a&(b");
    assert!(!Authorizations::new(["a", "b"]).can_read(&broken));

    let err = Visibility::parse("a&(b").unwrap_err();
    assert!(matches!(err, GraphError::InvalidVisibility { .. }));
    assert!(Visibility::parse("a&(b|c)").is_ok());
}

#[test]
fn test_tokens() {
    let tokens = Visibility::new("(a|b)&c").tokens();
    assert_eq!(tokens.len(), 3);
    assert!(tokens.contains("a") && tokens.contains("b") && tokens.contains("c"));
}
