//! Unit tests for the scanner and the data-source classifier.

use daprvis::classifier::{Classification, ProducerMap, classify, condition_sources, keyed_entries};
use daprvis::error::ScanError;
use daprvis::graph::{DataSource, SourceKind};
use daprvis::scanner::*;

#[cfg(test)]
mod scanner_tests {
    use super::*;

    #[test]
    fn test_matching_close_ignores_brackets_in_strings() {
        let text = r#"call(a, ")", {b: [1]}, '(')"#;
        assert_eq!(find_matching_close(text, 4), Ok(text.len() - 1));
    }

    #[test]
    fn test_matching_close_treats_triple_quotes_as_one_string() {
        let text = r#"f("""a ) " b""", x)"#;
        assert_eq!(find_matching_close(text, 1), Ok(text.len() - 1));
    }

    #[test]
    fn test_matching_close_handles_escapes() {
        let text = r#"f("a \") b")"#;
        assert_eq!(find_matching_close(text, 1), Ok(text.len() - 1));
    }

    #[test]
    fn test_matching_close_errors() {
        assert_eq!(
            find_matching_close("f(a, b", 1),
            Err(ScanError::Unclosed {
                delimiter: '(',
                offset: 1
            })
        );
        assert_eq!(
            find_matching_close("abc", 0),
            Err(ScanError::NotAnOpener {
                found: 'a',
                offset: 0
            })
        );
        assert_eq!(
            find_matching_close("ab", 5),
            Err(ScanError::OutOfRange { offset: 5, len: 2 })
        );
    }

    #[test]
    fn test_split_top_level() {
        let parts = split_top_level("a, f(b, c), [d, e], 'x,y', ", b',');
        assert_eq!(parts, vec!["a", "f(b, c)", "[d, e]", "'x,y'"]);
        assert!(split_top_level("   ", b',').is_empty());
    }

    #[test]
    fn test_find_top_level_skips_nested_and_quoted() {
        let text = "not x[1:2] and d[':']: body";
        assert_eq!(find_top_level(text, 0, b':'), Some(text.find(": body").unwrap()));
        assert_eq!(find_top_level("a) : b", 0, b':'), None);
    }

    #[test]
    fn test_expression_after_marker() {
        let text = "validate, input={'a': 1, 'b': (2, 3)}, retry=3";
        let marker_end = text.find("input=").unwrap() + "input=".len();
        assert_eq!(
            expression_after_marker(text, marker_end),
            Ok("{'a': 1, 'b': (2, 3)}")
        );

        let text = "fn, input=  order.items, retry=3";
        let marker_end = text.find("input=").unwrap() + "input=".len();
        assert_eq!(expression_after_marker(text, marker_end), Ok("order.items"));

        let text = "fn, input=order)";
        assert_eq!(expression_after_marker(text, 10), Ok("order"));

        assert!(matches!(
            expression_after_marker("fn, input=   ", 10),
            Err(ScanError::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_statement_end() {
        let text = "x = f(a,\n b)\ny = 2";
        assert_eq!(statement_end(text, 0, StatementEnd::Newline), 12);
        assert_eq!(statement_end("a = 1; b = 2", 0, StatementEnd::Semicolon), 5);
        assert_eq!(
            statement_end("return { a: 1; }; next", 0, StatementEnd::Semicolon),
            16
        );
        assert_eq!(statement_end("a + b) rest", 0, StatementEnd::Newline), 5);
    }

    #[test]
    fn test_mask_comments_preserves_offsets() {
        let text = "x = 1 # note\ny = '#not a comment'";
        let masked = mask_comments(text, CommentSyntax::HASH);
        assert_eq!(masked.len(), text.len());
        assert_eq!(masked, "x = 1       \ny = '#not a comment'");

        let text = "a /* b\nc */ d // e\nf = \"//kept\"";
        let masked = mask_comments(text, CommentSyntax::C_LIKE);
        assert_eq!(masked.len(), text.len());
        assert_eq!(masked.lines().count(), text.lines().count());
        assert_eq!(masked, "a     \n     d     \nf = \"//kept\"");
    }

    #[test]
    fn test_mask_comments_with_multibyte_text() {
        let text = "s = 'héllo' # über\nt = 1";
        let masked = mask_comments(text, CommentSyntax::HASH);
        assert_eq!(masked.len(), text.len());
        assert!(masked.starts_with("s = 'héllo'"));
        assert!(masked.ends_with("\nt = 1"));
        assert!(!masked.contains("über"));
    }

    #[test]
    fn test_line_math() {
        let text = "one\ntwo\nthree";
        assert_eq!(line_at(text, 0), 1);
        assert_eq!(line_at(text, 4), 2);
        assert_eq!(line_at(text, text.len()), 3);
        assert_eq!(line_start(text, 6), 4);
        assert_eq!(line_end(text, 4), 7);
        assert_eq!(indentation("    x", 0), 4);
    }

    #[test]
    fn test_unquote_and_whitespace() {
        assert_eq!(unquote("\"approval\""), "approval");
        assert_eq!(unquote("'''doc'''"), "doc");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(normalize_whitespace(" a \n\t b  "), "a b");
    }
}

#[cfg(test)]
mod classifier_tests {
    use super::*;

    fn producers(pairs: &[(&str, &str)]) -> ProducerMap {
        let mut map = ProducerMap::new();
        for (variable, node) in pairs {
            map.register(variable, node);
        }
        map
    }

    fn single(expr: &str, producers: &ProducerMap) -> DataSource {
        match classify(expr, "input", producers) {
            Classification::Single(source) => source,
            other => panic!("expected a single source for {}, got {:?}", expr, other),
        }
    }

    #[test]
    fn test_producer_map_is_write_once() {
        let mut map = ProducerMap::new();
        assert!(map.is_empty());
        assert!(map.register("result", "activity_1"));
        assert!(!map.register("result", "activity_2"));
        assert_eq!(map.producer_of("result"), Some("activity_1"));
        assert_eq!(map.len(), 1);
        assert!(!map.is_empty());
    }

    #[test]
    fn test_workflow_input_references() {
        let none = ProducerMap::new();
        for expr in ["input", "input.items", "input['payment']", "input?.order"] {
            let source = single(expr, &none);
            assert_eq!(source.kind, SourceKind::WorkflowInput, "{}", expr);
            assert!(!source.heuristic);
        }
        // A longer identifier that merely starts with the input name is not the input.
        assert!(single("input_copy", &none).heuristic);
    }

    #[test]
    fn test_step_output_references() {
        let map = producers(&[("payment_result", "activity_5")]);
        let source = single("payment_result[\"transaction_id\"]", &map);
        assert_eq!(source.kind, SourceKind::StepOutput);
        assert_eq!(source.producer_id.as_deref(), Some("activity_5"));
        assert_eq!(source.path, "payment_result[\"transaction_id\"]");
    }

    #[test]
    fn test_input_check_precedes_producers() {
        let map = producers(&[("input", "activity_1")]);
        assert_eq!(single("input.items", &map).kind, SourceKind::WorkflowInput);
    }

    #[test]
    fn test_literals_and_heuristic_default() {
        let none = ProducerMap::new();
        assert_eq!(single("\"express\"", &none).kind, SourceKind::Literal);
        assert_eq!(single("f\"{x}\"", &none).kind, SourceKind::Literal);
        assert_eq!(single("None", &none).kind, SourceKind::Literal);
        assert_eq!(single("undefined", &none).kind, SourceKind::Literal);
        assert_eq!(single("42", &none).kind, SourceKind::Literal);
        assert_eq!(single("a + b", &none).kind, SourceKind::Literal);

        let guessed = single("customer.id", &none);
        assert_eq!(guessed.kind, SourceKind::WorkflowInput);
        assert!(guessed.heuristic);
    }

    #[test]
    fn test_keyed_literal_entries() {
        let map = producers(&[("shipping_result", "child_workflow_1")]);
        let sources = classify(
            r#"{"order_id": input.order_id, "tracking": shipping_result["tracking_number"], "mode": "fast"}"#,
            "input",
            &map,
        )
        .into_sources();

        assert_eq!(sources.len(), 3);
        assert_eq!(sources[0].kind, SourceKind::WorkflowInput);
        assert_eq!(sources[0].target_field.as_deref(), Some("order_id"));
        assert_eq!(sources[1].kind, SourceKind::StepOutput);
        assert_eq!(sources[1].producer_id.as_deref(), Some("child_workflow_1"));
        assert_eq!(sources[1].target_field.as_deref(), Some("tracking"));
        assert_eq!(sources[2].kind, SourceKind::Literal);
    }

    #[test]
    fn test_keyed_entry_shapes() {
        assert_eq!(
            keyed_entries("new ShipmentRequest { OrderId = order.Id, Express = true }"),
            Some(vec![
                ("OrderId".to_string(), "order.Id".to_string()),
                ("Express".to_string(), "true".to_string()),
            ])
        );
        assert_eq!(
            keyed_entries("OrderResult(status=\"ok\", success=True)"),
            Some(vec![
                ("status".to_string(), "\"ok\"".to_string()),
                ("success".to_string(), "True".to_string()),
            ])
        );
        assert_eq!(
            keyed_entries("{ ...order, amount }"),
            Some(vec![
                ("order".to_string(), "order".to_string()),
                ("amount".to_string(), "amount".to_string()),
            ])
        );
        assert_eq!(keyed_entries("compute(a, b)"), None);
        assert_eq!(keyed_entries("{ a: 1 }.a"), None);
        assert_eq!(keyed_entries("x == y"), None);
    }

    #[test]
    fn test_condition_sources() {
        let map = producers(&[("payment", "activity_1")]);
        let sources = condition_sources(
            "payment['amount'] > input.limit and 'input' != other and input.limit",
            "input",
            &map,
        );
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].kind, SourceKind::StepOutput);
        assert_eq!(sources[0].path, "payment['amount']");
        assert_eq!(sources[1].kind, SourceKind::WorkflowInput);
        assert_eq!(sources[1].path, "input.limit");
    }
}
