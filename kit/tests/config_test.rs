//! Watched-tag configuration loading and validation.

use hoap::{Error, InstructionTree, NodeKind, Parser, WatchedTagNode, WatchedTags};
use test_case::test_case;

const RECOMMENDATION: &str = r#"{
    "version": "2.1",
    "nodes": [
        {
            "name": "soap:Envelope",
            "type": "xml-node",
            "children": [
                {
                    "name": "recommendation",
                    "type": "xml-node",
                    "children": [
                        { "name": "amount", "type": "xml-data" },
                        { "name": "currency", "type": "xml-data", "children": [] }
                    ]
                }
            ]
        }
    ]
}"#;

#[cfg(feature = "serde")]
#[test]
fn test_json_document_builds_tree() {
    let tags = WatchedTags::from_json(RECOMMENDATION).unwrap();
    assert_eq!(tags.version, "2.1");

    let tree = InstructionTree::build(&tags).unwrap();
    assert_eq!(tree.len(), 4);

    let recommendation = &tree.root().children()[0];
    assert_eq!(recommendation.open_pattern(), b"<recommendation");
    assert_eq!(recommendation.close_pattern(), b"</recommendation>");

    let kinds: Vec<_> = recommendation.children().iter().map(|c| c.kind()).collect();
    assert_eq!(kinds, [NodeKind::Leaf, NodeKind::Leaf]);
}

#[cfg(feature = "serde")]
#[test]
fn test_from_slice_and_parse() {
    let parser = Parser::new(&WatchedTags::from_slice(RECOMMENDATION.as_bytes()).unwrap()).unwrap();
    let doc = parser
        .parse_slice(
            b"<soap:Envelope><recommendation><amount>12</amount>\
              <currency>EUR</currency></recommendation></soap:Envelope>",
        )
        .unwrap();

    let rec = doc
        .first("soap:Envelope")
        .and_then(|e| e.first("recommendation"))
        .unwrap();
    assert_eq!(rec.first("amount").and_then(|t| t.value()), Some("12"));
    assert_eq!(rec.first("currency").and_then(|t| t.value()), Some("EUR"));
}

#[cfg(feature = "serde")]
#[test_case("{"; "truncated json")]
#[test_case(r#"{"version":"1"}"#; "missing nodes")]
#[test_case(r#"{"nodes":[{"name":"a"}]}"#; "missing type")]
#[test_case(r#"{"nodes":[{"name":"a","type":"xml-attr"}]}"#; "unknown type")]
fn test_malformed_json(json: &str) {
    assert!(matches!(WatchedTags::from_json(json), Err(Error::ConfigFormat(_))));
}

#[cfg(feature = "serde")]
#[test]
fn test_missing_version_defaults_to_empty() {
    let tags = WatchedTags::from_json(r#"{"nodes":[{"name":"a","type":"xml-data"}]}"#).unwrap();
    assert_eq!(tags.version, "");
    assert_eq!(tags.nodes, [WatchedTagNode::leaf("a")]);
}

#[cfg(feature = "serde")]
#[test_case(r#"{"nodes":[]}"#; "no root")]
#[test_case(r#"{"nodes":[{"name":"a","type":"xml-data"},{"name":"b","type":"xml-data"}]}"#; "two roots")]
#[test_case(r#"{"nodes":[{"name":"a b","type":"xml-data"}]}"#; "space in name")]
#[test_case(r#"{"nodes":[{"name":"a","type":"xml-data","children":[{"name":"b","type":"xml-data"}]}]}"#; "leaf with children")]
#[test_case(r#"{"nodes":[{"name":"a","type":"xml-node","children":[{"name":"b","type":"xml-data"},{"name":"b","type":"xml-node"}]}]}"#; "duplicate siblings")]
fn test_invalid_tree(json: &str) {
    assert!(matches!(Parser::from_json(json), Err(Error::InvalidConfig { .. })));
}

#[test]
fn test_same_name_at_different_depths_is_allowed() {
    let tags = WatchedTags::new(
        "1",
        WatchedTagNode::element("a", [WatchedTagNode::element("b", [WatchedTagNode::leaf("a")])]),
    );
    let parser = Parser::new(&tags).unwrap();
    assert_eq!(parser.tree().len(), 3);
}

#[test]
fn test_error_messages() {
    let err = Parser::new(&WatchedTags {
        version: "1".into(),
        nodes: vec![],
    })
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "invalid configuration: configuration has no root node"
    );
}
