#[cfg(feature = "serde")]
mod serde_tests {
    use serde_json::json;
    use tagweave::{Diagnostic, Engine, Node, PartialSource, Span, Syntax, TagweaveError};

    #[test]
    #[ntest::timeout(100)]
    fn test_node_serialization() {
        let node = Node::text("Hi");
        let serialized = serde_json::to_string(&node).unwrap();
        assert_eq!(serialized, r#"{"type":"text","text":"Hi"}"#);

        let deserialized: Node = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, node);
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_ast_round_trip_renders_the_same() {
        let mut engine = Engine::new();
        let ast = engine
            .parse("{{#each items as item}}<{{item}}>{{else}}none{{/each}}")
            .unwrap();

        let serialized = serde_json::to_string(&ast).unwrap();
        let deserialized: Vec<Node> = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, ast);

        engine.register_partial("list", PartialSource::from(deserialized));
        let data = json!({"items": ["a", "b"]});
        assert_eq!(engine.render_partial("list", &data).unwrap(), "<a><b>");
        assert_eq!(engine.render_partial("list", &json!({})).unwrap(), "none");
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_syntax_deserializes_with_defaults() {
        let syntax: Syntax =
            serde_json::from_value(json!({"delimiters": ["<%", "%>"], "strict": true})).unwrap();
        assert_eq!(syntax.delimiters.0, "<%");
        assert_eq!(syntax.helper, Syntax::default().helper);
        assert!(syntax.strict);

        let engine = Engine::with_syntax(syntax);
        assert_eq!(
            engine.render("<%#if ok%>yes<%/if%>", &json!({"ok": true})).unwrap(),
            "yes"
        );
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_diagnostic_serialization() {
        let diagnostic = Diagnostic::PartialNotFound {
            name: "nav".into(),
            span: Span::new(3, 12),
        };
        let serialized = serde_json::to_value(&diagnostic).unwrap();
        assert_eq!(
            serialized,
            json!({"PartialNotFound": {"name": "nav", "span": {"start": 3, "end": 12}}})
        );

        let deserialized: Diagnostic = serde_json::from_value(serialized).unwrap();
        assert_eq!(deserialized, diagnostic);
    }

    #[test]
    #[ntest::timeout(100)]
    fn test_error_serialization() {
        let engine = Engine::new();
        let err = engine.render("{{/if}}", &json!({})).unwrap_err();

        let serialized = serde_json::to_string(&err).unwrap();
        let deserialized: TagweaveError = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, err);
        assert_eq!(
            deserialized.to_string(),
            "Parse error at line 1, column 1: Unexpected close tag: {{/if}}"
        );
    }
}
