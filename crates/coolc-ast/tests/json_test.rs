//! Tests for the JSON interchange form of the AST

use coolc_ast::{AstError, BinaryOp, Class, Expr, ExprId, ExprKind, Feature, Program};

const HELLO: &str = r#"{
  "classes": [
    {
      "name": "Main",
      "parent": "IO",
      "features": [
        { "feature": "attribute", "name": "count", "type": "Int",
          "init": { "kind": "int", "value": "0" } },
        { "feature": "method", "name": "main", "formals": [], "return_type": "Object",
          "body": {
            "kind": "dispatch",
            "method": "out_string",
            "args": [ { "kind": "str", "value": "hello\n" } ]
          } }
      ]
    }
  ]
}"#;

/// Body of the first method declared in `class`
fn first_method_body(class: &Class) -> &Expr {
    class
        .features
        .iter()
        .find_map(|feature| match feature {
            Feature::Method { body, .. } => Some(body),
            Feature::Attribute { .. } => None,
        })
        .expect("class declares a method")
}

#[test]
fn test_load_program_from_json() {
    let program = Program::from_json(HELLO).expect("valid program");
    assert_eq!(program.classes.len(), 1);

    let main = &program.classes[0];
    assert_eq!(main.name, "Main");
    assert_eq!(main.parent.as_deref(), Some("IO"));
    assert!(matches!(
        &main.features[0],
        Feature::Attribute { name, ty, init: Some(_) } if name == "count" && ty == "Int"
    ));

    let Feature::Method { name, formals, body, .. } = &main.features[1] else {
        panic!("expected main method");
    };
    assert_eq!(name, "main");
    assert!(formals.is_empty());
    match &body.kind {
        ExprKind::Dispatch {
            receiver,
            static_type,
            method,
            args,
        } => {
            assert!(receiver.is_none(), "implicit self receiver");
            assert!(static_type.is_none());
            assert_eq!(method, "out_string");
            assert_eq!(args.len(), 1);
        }
        other => panic!("expected dispatch, got {:?}", other),
    }
}

#[test]
fn test_loader_assigns_preorder_ids() {
    let program = Program::from_json(HELLO).expect("valid program");
    let main = &program.classes[0];

    let Feature::Attribute { init: Some(init), .. } = &main.features[0] else {
        panic!("expected attribute with initializer");
    };
    assert_eq!(init.id, ExprId(0));

    let body = first_method_body(main);
    assert_eq!(body.id, ExprId(1));
    let ExprKind::Dispatch { args, .. } = &body.kind else {
        panic!("expected dispatch");
    };
    assert_eq!(args[0].id, ExprId(2));
}

#[test]
fn test_binary_operator_names() {
    let json = r#"{ "classes": [ { "name": "Main", "features": [
        { "feature": "method", "name": "main", "return_type": "Int",
          "body": { "kind": "binary", "op": "le",
                    "lhs": { "kind": "int", "value": "1" },
                    "rhs": { "kind": "neg", "expr": { "kind": "int", "value": "2" } } } } ] } ] }"#;
    let program = Program::from_json(json).unwrap();
    let body = first_method_body(&program.classes[0]);
    let ExprKind::Binary { op, rhs, .. } = &body.kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::Le);
    assert!(matches!(rhs.kind, ExprKind::Neg { .. }));
}

#[test]
fn test_empty_program_is_rejected() {
    let err = Program::from_json(r#"{ "classes": [] }"#).unwrap_err();
    assert!(matches!(err, AstError::EmptyProgram));
}

#[test]
fn test_unknown_node_kind_is_a_json_error() {
    let json = r#"{ "classes": [ { "name": "Main", "features": [
        { "feature": "method", "name": "main", "return_type": "Int",
          "body": { "kind": "lambda" } } ] } ] }"#;
    let err = Program::from_json(json).unwrap_err();
    assert!(matches!(err, AstError::Json(_)), "got {:?}", err);
}

#[test]
fn test_json_survives_reserialization() {
    let program = Program::from_json(HELLO).unwrap();
    let text = program.to_json().unwrap();
    let reloaded = Program::from_json(&text).unwrap();
    assert_eq!(program, reloaded);
}
