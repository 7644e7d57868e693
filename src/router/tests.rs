use super::{ParamValue, PatternError, RoutePattern, RouteTable};

fn multi(parts: &[&str]) -> ParamValue {
    ParamValue::Multi(parts.iter().map(|s| s.to_string()).collect())
}

#[test]
fn test_root_path() {
    let p = RoutePattern::compile("/").unwrap();
    assert!(p.matches("/").is_some());
    assert!(p.matches("/a").is_none());
    assert!(!p.is_dynamic());
}

#[test]
fn test_literal_path_must_be_fully_consumed() {
    let p = RoutePattern::compile("/about/team").unwrap();
    assert!(p.matches("/about/team").is_some());
    assert!(p.matches("/about").is_none());
    assert!(p.matches("/about/team/extra").is_none());
    assert!(p.matches("/about/team/").is_none());
}

#[test]
fn test_bracket_dynamic_segment() {
    let p = RoutePattern::compile("/html/[page]").unwrap();
    let params = p.matches("/html/bar").unwrap();
    assert_eq!(params.get_str("page"), Some("bar"));
    assert!(p.matches("/html/bar/baz").is_none());
    assert!(p.matches("/html").is_none());
}

#[test]
fn test_nested_dynamic_segments_keep_order() {
    let p = RoutePattern::compile("/users/[user]/posts/[post]").unwrap();
    let params = p.matches("/users/7/posts/abc").unwrap();
    let names: Vec<&str> = params.iter().map(|(k, _)| k).collect();
    assert_eq!(names, vec!["user", "post"]);
    assert_eq!(params.get_str("post"), Some("abc"));
}

#[test]
fn test_constrained_segment_requires_full_match() {
    let p = RoutePattern::compile("/items/[id(\\d+)]").unwrap();
    assert_eq!(p.matches("/items/42").unwrap().get_str("id"), Some("42"));
    assert!(p.matches("/items/42a").is_none());
    assert!(p.matches("/items/abc").is_none());
}

#[test]
fn test_catch_all_requires_one_segment() {
    let p = RoutePattern::compile("/docs/[...slug]").unwrap();
    assert_eq!(
        p.matches("/docs/a/b/c").unwrap().get("slug"),
        Some(&multi(&["a", "b", "c"]))
    );
    assert!(p.matches("/docs").is_none());
}

#[test]
fn test_optional_catch_all_matches_bare_prefix() {
    let p = RoutePattern::compile("/shop/[[...slug]]").unwrap();
    assert!(p.matches("/shop").unwrap().is_empty());
    assert_eq!(p.matches("/shop/x").unwrap().get("slug"), Some(&multi(&["x"])));

    let root = RoutePattern::compile("/[[...slug]]").unwrap();
    assert!(root.matches("/").is_some());
    assert_eq!(root.matches("/a/b").unwrap().get("slug"), Some(&multi(&["a", "b"])));
}

#[test]
fn test_colon_grammar() {
    let p = RoutePattern::compile("/old-users/:id(\\d{1,})").unwrap();
    assert_eq!(p.matches("/old-users/1234").unwrap().get_str("id"), Some("1234"));
    assert!(p.matches("/old-users/abc").is_none());

    let star = RoutePattern::compile("/multi/:path*").unwrap();
    assert_eq!(star.matches("/multi/foo/bar").unwrap().get("path"), Some(&multi(&["foo", "bar"])));
    assert!(star.matches("/multi").unwrap().is_empty());

    let plus = RoutePattern::compile("/multi/:path+").unwrap();
    assert!(plus.matches("/multi").is_none());

    let opt = RoutePattern::compile("/lang/:code?").unwrap();
    assert!(opt.matches("/lang").is_some());
    assert_eq!(opt.matches("/lang/nl").unwrap().get_str("code"), Some("nl"));
}

#[test]
fn test_locale_alternation_capture() {
    let p = RoutePattern::compile("/:nextInternalLocale(en|nl|fr)/a").unwrap();
    assert_eq!(
        p.matches("/fr/a").unwrap().get_str("nextInternalLocale"),
        Some("fr")
    );
    assert!(p.matches("/de/a").is_none());
}

#[test]
fn test_unnamed_constraint_is_not_captured() {
    let p = RoutePattern::compile("/(en|nl)/docs").unwrap();
    assert!(p.is_dynamic());
    assert!(p.matches("/nl/docs").unwrap().is_empty());
    assert!(p.matches("/de/docs").is_none());
}

#[test]
fn test_invalid_patterns() {
    assert!(matches!(
        RoutePattern::compile("/a/[b"),
        Err(PatternError::Unbalanced { .. })
    ));
    assert!(matches!(
        RoutePattern::compile("/a/[...rest]/b"),
        Err(PatternError::CatchAllNotLast { .. })
    ));
    assert!(matches!(
        RoutePattern::compile("/a/[]"),
        Err(PatternError::InvalidParamName { .. })
    ));
    assert!(matches!(
        RoutePattern::compile("/a/:id([)"),
        Err(PatternError::Unbalanced { .. }) | Err(PatternError::InvalidRegex { .. })
    ));
}

#[test]
fn test_route_table_prefers_specific_routes() {
    let table = RouteTable::new(vec![
        ("/[...all]".to_string(), "catch_all"),
        ("/[root]".to_string(), "root"),
        ("/html/[page]".to_string(), "html_page"),
        ("/about".to_string(), "about"),
    ])
    .unwrap();

    assert_eq!(table.route("/about").map(|(t, _)| *t), Some("about"));
    assert_eq!(table.route("/foo").map(|(t, _)| *t), Some("root"));
    assert_eq!(table.route("/html/bar").map(|(t, _)| *t), Some("html_page"));
    assert_eq!(table.route("/a/b/c").map(|(t, _)| *t), Some("catch_all"));
    assert_eq!(table.len(), 4);
}

#[test]
fn test_route_table_unknown_path_does_not_hit_literal_sibling() {
    let table = RouteTable::new(vec![
        ("/blog".to_string(), "blog_index"),
        ("/blog/[slug]".to_string(), "blog_post"),
    ])
    .unwrap();

    assert!(table.route("/blog/a/b").is_none());
    assert!(table.route("/blogx").is_none());
    assert_eq!(table.route("/blog/a").map(|(t, _)| *t), Some("blog_post"));
}
