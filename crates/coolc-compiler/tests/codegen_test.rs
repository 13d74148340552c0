//! Code generation tests: lower small programs and inspect the IR text

use coolc_ast::{AstBuilder, BinaryOp, Class, Expr, Feature, Program};
use coolc_compiler::ir::Constant;
use coolc_compiler::{
    compile, compile_module, CodegenError, CodegenOptions, CompileError, Compiler, IrModule,
};

/// `class Main { <features> main(): Object { body } }` plus `extra`
fn program(b: &AstBuilder, mut features: Vec<Feature>, extra: Vec<Class>, body: Expr) -> Program {
    features.push(b.method("main", vec![], "Object", body));
    let mut classes = vec![b.class("Main", None, features)];
    classes.extend(extra);
    Program::new(classes)
}

fn lower(program: &Program) -> IrModule {
    compile_module(program, CodegenOptions::default()).expect("program compiles")
}

/// IR text of one function
fn function_text(module: &IrModule, name: &str) -> String {
    module
        .get_function(name)
        .unwrap_or_else(|| panic!("function {} was emitted", name))
        .to_string()
}

/// Object <- A <- B, with `f(): Int` overridden in B
fn hierarchy(b: &AstBuilder) -> Vec<Class> {
    vec![
        b.class("A", None, vec![b.method("f", vec![], "Int", b.int(1))]),
        b.class("B", Some("A"), vec![b.method("f", vec![], "Int", b.int(2))]),
    ]
}

#[test]
fn test_arithmetic_unboxes_and_boxes() {
    let b = AstBuilder::new();
    let body = b.binary(BinaryOp::Add, b.int(1), b.int(2));
    let module = lower(&program(&b, vec![], vec![], body));
    let main = function_text(&module, "__method_Main_main");

    assert!(main.contains("call %__instance_Int* @__new_Int()"), "{}", main);
    assert!(main.contains("store i32 1, i32* %i"), "{}", main);
    assert!(main.contains("store i32 2, i32* %i"), "{}", main);
    assert!(main.contains(" = add i32 %i"), "{}", main);
    assert!(
        main.contains("bitcast %__instance_Int* %i"),
        "result is returned as Object: {}",
        main
    );
}

#[test]
fn test_if_joins_branches_with_phi() {
    let b = AstBuilder::new();
    let body = b.if_(b.bool(true), b.int(1), b.string("one"));
    let module = lower(&program(&b, vec![], vec![], body));
    let main = function_text(&module, "__method_Main_main");

    assert!(main.contains("if.then."), "{}", main);
    assert!(main.contains("if.else."), "{}", main);
    assert!(main.contains("br label %if.end."), "{}", main);
    assert!(main.contains("= phi %__instance_Object* [ %i"), "{}", main);
    assert!(main.contains("to %__instance_Object*"), "{}", main);
}

#[test]
fn test_while_loop_blocks() {
    let b = AstBuilder::new();
    let body = b.while_(b.bool(false), b.int(1));
    let module = lower(&program(&b, vec![], vec![], body));
    let main = function_text(&module, "__method_Main_main");

    for label in ["while.cond.", "while.body.", "while.end."] {
        assert!(main.contains(label), "missing {}: {}", label, main);
    }
    assert!(main.contains("ret %__instance_Object* null"), "{}", main);
}

#[test]
fn test_override_reuses_parent_slot() {
    let b = AstBuilder::new();
    let module = lower(&program(&b, vec![], hierarchy(&b), b.int(0)));

    // Object's three methods come first; f is slot 3, field 6.
    let vtable_entries = |name: &str| match &module.get_global(name).expect("vtable").init {
        Constant::Struct(fields) => fields.iter().map(|v| v.repr.clone()).collect::<Vec<_>>(),
        other => panic!("vtable {} is not a struct: {}", name, other),
    };
    let a = vtable_entries("_A");
    let b_entries = vtable_entries("_B");
    assert_eq!(a.len(), 7);
    assert_eq!(b_entries.len(), 7);
    assert_eq!(a[6], "@__method_A_f");
    assert_eq!(b_entries[6], "@__method_B_f");
    assert_eq!(b_entries[3], "@__method_Object_abort");
    assert_eq!(b_entries[0], "bitcast (%__class_A* @_A to i8*)");
}

#[test]
fn test_object_vtable_points_at_itself() {
    let b = AstBuilder::new();
    let module = lower(&program(&b, vec![], vec![], b.int(0)));
    let object = module.get_global("_Object").expect("Object vtable").to_string();
    assert!(
        object.starts_with("@_Object = global %__class_Object { i8* bitcast (%__class_Object* @_Object to i8*)"),
        "{}",
        object
    );
}

#[test]
fn test_static_dispatch_reads_named_vtable() {
    let b = AstBuilder::new();
    let body = b.static_call(b.new_("B"), "A", "f", vec![]);
    let module = lower(&program(&b, vec![], hierarchy(&b), body));
    let main = function_text(&module, "__method_Main_main");

    assert!(
        main.contains("getelementptr inbounds %__class_A, %__class_A* @_A, i32 0, i32 6"),
        "{}",
        main
    );
    assert!(!main.contains("load %__class_B*"), "{}", main);
}

#[test]
fn test_dynamic_dispatch_loads_receiver_vtable() {
    let b = AstBuilder::new();
    let body = b.call(b.new_("B"), "f", vec![]);
    let module = lower(&program(&b, vec![], hierarchy(&b), body));
    let main = function_text(&module, "__method_Main_main");

    assert!(main.contains("call %__instance_B* @__new_B()"), "{}", main);
    assert!(main.contains("load %__class_B*, %__class_B** %i"), "{}", main);
    assert!(
        main.contains("getelementptr inbounds %__class_B, %__class_B* %i"),
        "{}",
        main
    );
    assert!(
        main.contains("call %__instance_Int* %i"),
        "call goes through the loaded pointer: {}",
        main
    );
}

#[test]
fn test_method_receives_root_receiver() {
    let b = AstBuilder::new();
    let module = lower(&program(&b, vec![], hierarchy(&b), b.int(0)));
    let f = function_text(&module, "__method_B_f");
    assert!(
        f.starts_with("define %__instance_Int* @__method_B_f(%__instance_Object* %self)"),
        "{}",
        f
    );
    assert!(
        f.contains("bitcast %__instance_Object* %self to %__instance_B*"),
        "{}",
        f
    );
}

#[test]
fn test_attribute_initializers_run_in_constructor() {
    let b = AstBuilder::new();
    let features = vec![b.attribute("x", "Int", Some(b.int(3))), b.attribute("s", "String", None)];
    let module = lower(&program(&b, features, vec![], b.ident("x")));

    let ctor = function_text(&module, "__new_Main");
    assert!(ctor.contains("call i8* @GC_malloc(i64 %i"), "{}", ctor);
    assert!(
        ctor.contains("store %__class_Main* @_Main, %__class_Main** %i"),
        "{}",
        ctor
    );
    assert!(ctor.contains("store i32 3, i32* %i"), "{}", ctor);
    assert!(
        ctor.contains("getelementptr inbounds %__instance_Main, %__instance_Main* %i"),
        "{}",
        ctor
    );

    let main_type = module.get_type("__instance_Main").expect("instance type").to_string();
    assert_eq!(
        main_type,
        "%__instance_Main = type { %__class_Main*, %__instance_Int*, %__instance_String* }"
    );
}

#[test]
fn test_primitive_payload_layouts() {
    let b = AstBuilder::new();
    let module = lower(&program(&b, vec![], vec![], b.int(0)));
    let layout = |name: &str| module.get_type(name).expect("type").to_string();

    assert_eq!(
        layout("__instance_Int"),
        "%__instance_Int = type { %__class_Int*, i32 }"
    );
    assert_eq!(
        layout("__instance_String"),
        "%__instance_String = type { %__class_String*, i32, i8* }"
    );
    assert_eq!(
        layout("__instance_Bool"),
        "%__instance_Bool = type { %__class_Bool*, i1 }"
    );
}

#[test]
fn test_let_binds_stack_slot() {
    let b = AstBuilder::new();
    let body = b.let_(
        vec![b.binding("x", "Int", Some(b.int(5)))],
        b.binary(BinaryOp::Add, b.ident("x"), b.int(1)),
    );
    let module = lower(&program(&b, vec![], vec![], body));
    let main = function_text(&module, "__method_Main_main");

    assert!(main.contains("= alloca %__instance_Int*"), "{}", main);
    assert!(
        main.contains("load %__instance_Int*, %__instance_Int** %i"),
        "{}",
        main
    );
}

#[test]
fn test_let_without_initializer_uses_default() {
    let b = AstBuilder::new();
    let body = b.let_(
        vec![b.binding("a", "A", None), b.binding("n", "Int", None)],
        b.is_void(b.ident("a")),
    );
    let module = lower(&program(&b, vec![], hierarchy(&b), body));
    let main = function_text(&module, "__method_Main_main");

    assert!(
        main.contains("store %__instance_A* null, %__instance_A** %i"),
        "{}",
        main
    );
    assert!(main.contains("call %__instance_Int* @__new_Int()"), "{}", main);
    assert!(
        main.contains("icmp eq %__instance_Object* %i"),
        "isvoid compares against null: {}",
        main
    );
}

#[test]
fn test_case_walks_vtable_chain() {
    let b = AstBuilder::new();
    let body = b.case(
        b.new_("B"),
        vec![
            b.branch("a", "A", b.int(1)),
            b.branch("o", "Object", b.int(2)),
        ],
    );
    let module = lower(&program(&b, vec![], hierarchy(&b), body));
    let main = function_text(&module, "__method_Main_main");

    for label in ["case.void.", "case.loop.", "case.up.", "case.nomatch.", "case.end."] {
        assert!(main.contains(label), "missing {}: {}", label, main);
    }
    assert!(
        main.contains("icmp eq i8* %i"),
        "branches compare vtables: {}",
        main
    );
    assert!(main.contains("bitcast (%__class_A* @_A to i8*)"), "{}", main);
    assert!(main.contains("call void @exit(i32 1)"), "{}", main);
    assert!(main.contains("= phi %__instance_Int* "), "{}", main);
}

#[test]
fn test_string_literals_are_interned() {
    let b = AstBuilder::new();
    let body = b.block(vec![b.string("hi"), b.string("hi"), b.string("there")]);
    let ir = compile(&program(&b, vec![], vec![], body), CodegenOptions::default()).unwrap();

    let hi = "private unnamed_addr constant [3 x i8] c\"hi\\00\"";
    assert_eq!(ir.matches(hi).count(), 1, "{}", ir);
    assert!(ir.contains("@.str.1 = private unnamed_addr constant [6 x i8] c\"there\\00\""));
}

#[test]
fn test_string_equality_uses_strcmp() {
    let b = AstBuilder::new();
    let body = b.binary(BinaryOp::Eq, b.string("a"), b.string("b"));
    let module = lower(&program(&b, vec![], vec![], body));
    let main = function_text(&module, "__method_Main_main");
    assert!(main.contains("call i32 @strcmp(i8* %i"), "{}", main);
    assert!(main.contains("icmp eq i32 %i"), "{}", main);
}

#[test]
fn test_object_equality_compares_pointers() {
    let b = AstBuilder::new();
    let body = b.binary(BinaryOp::Eq, b.new_("A"), b.new_("A"));
    let module = lower(&program(&b, vec![], hierarchy(&b), body));
    let main = function_text(&module, "__method_Main_main");
    assert!(main.contains("icmp eq %__instance_Object* %i"), "{}", main);
    assert!(!main.contains("@strcmp"), "{}", main);
}

#[test]
fn test_builtins_are_emitted() {
    let b = AstBuilder::new();
    let module = lower(&program(&b, vec![], vec![], b.int(0)));

    let out_string = function_text(&module, "__method_IO_out_string");
    assert!(out_string.starts_with(
        "define %__instance_Object* @__method_IO_out_string(%__instance_Object* %self, %__instance_String* %arg.x)"
    ));
    assert!(out_string.contains("call i32 (i8*, ...) @printf("), "{}", out_string);

    let substr = function_text(&module, "__method_String_substr");
    assert!(substr.contains("substr.error."), "{}", substr);
    assert!(substr.contains("@memcpy"), "{}", substr);

    let abort = function_text(&module, "__method_Object_abort");
    assert!(abort.contains("@str.abort"), "{}", abort);
    assert!(abort.contains("unreachable"), "{}", abort);

    for name in [
        "__method_Object_type_name",
        "__method_Object_copy",
        "__method_IO_out_int",
        "__method_IO_in_string",
        "__method_IO_in_int",
        "__method_String_length",
        "__method_String_concat",
    ] {
        assert!(module.get_function(name).is_some(), "missing {}", name);
    }
}

#[test]
fn test_line_input_consumes_newline_even_on_empty_line() {
    let b = AstBuilder::new();
    let ir = compile(&program(&b, vec![], vec![], b.int(0)), CodegenOptions::default()).unwrap();
    assert!(
        ir.contains("@str.readline = private unnamed_addr constant [10 x i8] c\"%1023[^\\0A]\\00\""),
        "{}",
        ir
    );
    assert!(ir.contains("@str.skipline = private unnamed_addr constant [7 x i8] c\"%*[^\\0A]\\00\""));
    assert!(ir.contains("@str.skipchar = private unnamed_addr constant [4 x i8] c\"%*c\\00\""));

    // The newline read must be its own scanf call: a failed `%[` conversion
    // on an empty line stops the rest of its format string.
    let module = lower(&program(&b, vec![], vec![], b.int(0)));
    for (name, first) in [
        ("__method_IO_in_string", "@str.readline"),
        ("__method_IO_in_int", "@str.format2"),
    ] {
        let body = function_text(&module, name);
        assert_eq!(body.matches("@scanf(").count(), 3, "{}", body);
        let read = body.find(first).expect("value read");
        let rest = body.find("@str.skipline").expect("rest of line skipped");
        let newline = body.find("@str.skipchar").expect("newline consumed");
        assert!(read < rest && rest < newline, "{}", body);
    }
}

#[test]
fn test_dispatch_on_void_receiver_exits() {
    let b = AstBuilder::new();
    let body = b.let_(
        vec![b.binding("a", "A", None)],
        b.call(b.ident("a"), "f", vec![]),
    );
    let module = lower(&program(&b, vec![], hierarchy(&b), body));
    let main = function_text(&module, "__method_Main_main");

    assert!(main.contains("dispatch.void."), "{}", main);
    assert!(main.contains("dispatch.ok."), "{}", main);
    assert!(main.contains("icmp eq %__instance_Object* %i"), "{}", main);
    assert!(main.contains("call void @exit(i32 1)"), "{}", main);
    let guard = main.find("dispatch.ok.").unwrap();
    let vtable = main.find("load %__class_A*").unwrap();
    assert!(guard < vtable, "void check precedes the vtable load: {}", main);
    assert!(module.functions.iter().all(|f| f.validate().is_ok()));
}

#[test]
fn test_implicit_self_dispatch_has_no_void_check() {
    let b = AstBuilder::new();
    let features = vec![b.method("g", vec![], "Int", b.int(1))];
    let module = lower(&program(&b, features, vec![], b.call_self("g", vec![])));
    let main = function_text(&module, "__method_Main_main");
    assert!(!main.contains("dispatch.void."), "{}", main);
}

#[test]
fn test_division_by_zero_exits() {
    let b = AstBuilder::new();
    let body = b.binary(BinaryOp::Div, b.int(7), b.int(0));
    let module = lower(&program(&b, vec![], vec![], body));
    let main = function_text(&module, "__method_Main_main");

    assert!(main.contains("div.zero."), "{}", main);
    assert!(main.contains("icmp eq i32 %i"), "{}", main);
    assert!(main.contains("call void @exit(i32 1)"), "{}", main);
    let guard = main.find("div.ok.").unwrap();
    let divide = main.find(" = sdiv i32 ").unwrap();
    assert!(guard < divide, "{}", main);

    let b = AstBuilder::new();
    let body = b.binary(BinaryOp::Mul, b.int(7), b.int(3));
    let module = lower(&program(&b, vec![], vec![], body));
    assert!(!function_text(&module, "__method_Main_main").contains("div.zero."));
}

#[test]
fn test_module_layout_and_declarations() {
    let b = AstBuilder::new();
    let ir = compile(&program(&b, vec![], vec![], b.int(0)), CodegenOptions::default()).unwrap();

    assert!(ir.starts_with("; ModuleID = 'cool'"));
    assert!(ir.contains("@emptychar = global i8 0"));
    assert!(ir.contains("@__name_Main = private unnamed_addr constant [5 x i8] c\"Main\\00\""));
    assert!(ir.contains("define i32 @main()"));
    for decl in [
        "declare i32 @printf(i8*, ...)",
        "declare i32 @scanf(i8*, ...)",
        "declare i8* @GC_malloc(i64)",
        "declare i32 @strcmp(i8*, i8*)",
        "declare i64 @strlen(i8*)",
        "declare i8* @memcpy(i8*, i8*, i64)",
        "declare void @exit(i32)",
    ] {
        assert!(ir.contains(decl), "missing {}", decl);
    }

    let constants = ir.find("@str.format").unwrap();
    let types = ir.find("%__class_Object = type").unwrap();
    let functions = ir.find("define ").unwrap();
    let declarations = ir.find("declare ").unwrap();
    assert!(constants < types && types < functions && functions < declarations);
}

#[test]
fn test_entry_point_dispatches_main() {
    let b = AstBuilder::new();
    let module = lower(&program(&b, vec![], vec![], b.int(0)));
    let main = function_text(&module, "main");

    assert!(main.contains("call %__instance_Main* @__new_Main()"), "{}", main);
    assert!(main.contains("load %__class_Main*, %__class_Main** %i"), "{}", main);
    assert!(main.contains("ret i32 0"), "{}", main);
}

#[test]
fn test_every_function_is_well_formed() {
    let b = AstBuilder::new();
    let body = b.block(vec![
        b.if_(b.bool(true), b.new_("A"), b.new_("B")),
        b.while_(b.bool(false), b.neg(b.int(1))),
        b.case(b.int(3), vec![b.branch("i", "Int", b.not(b.bool(true)))]),
        b.call(b.self_(), "out_int", vec![b.int(4)]),
    ]);
    let module = lower(&Program::new(vec![
        b.class(
            "Main",
            Some("IO"),
            vec![b.method("main", vec![], "Object", body)],
        ),
        b.class("A", None, vec![]),
        b.class("B", Some("A"), vec![]),
    ]));

    for func in &module.functions {
        assert!(func.validate().is_ok(), "{:?}", func.validate());
    }
}

#[test]
fn test_check_failure_emits_nothing() {
    let b = AstBuilder::new();
    let body = b.binary(BinaryOp::Add, b.int(1), b.string("x"));
    let result = compile(&program(&b, vec![], vec![], body), CodegenOptions::default());
    assert!(matches!(result, Err(CompileError::Check(_))), "{:?}", result);
}

#[test]
fn test_missing_main_class() {
    let b = AstBuilder::new();
    let program = Program::new(vec![b.class("A", None, vec![])]);

    let strict = compile(&program, CodegenOptions::strict());
    assert_eq!(
        strict,
        Err(CompileError::Codegen(CodegenError::MissingMainClass))
    );

    let ir = compile(&program, CodegenOptions::lenient()).expect("lenient mode still emits");
    assert!(ir.contains("define i32 @main() {\nentry:\n  ret i32 0\n}"), "{}", ir);
}

#[test]
fn test_missing_main_method() {
    let b = AstBuilder::new();
    let program = Program::new(vec![b.class(
        "Main",
        None,
        vec![b.method("run", vec![], "Int", b.int(0))],
    )]);
    assert_eq!(
        compile(&program, CodegenOptions::strict()),
        Err(CompileError::Codegen(CodegenError::MissingMainMethod))
    );
}

#[test]
fn test_main_with_arguments() {
    let b = AstBuilder::new();
    let program = Program::new(vec![b.class(
        "Main",
        None,
        vec![b.method("main", vec![b.formal("x", "Int")], "Int", b.ident("x"))],
    )]);
    assert_eq!(
        compile(&program, CodegenOptions::strict()),
        Err(CompileError::Codegen(CodegenError::MainTakesArguments { arity: 1 }))
    );
}

#[test]
fn test_unsupported_construct_strict_and_lenient() {
    // Type the program with a literal body, then lower an identically shaped
    // program whose body the generator does not understand.
    let b = AstBuilder::new();
    let checked = program(&b, vec![], vec![], b.int(0));
    let (table, result) = coolc_checker::check(&checked).unwrap();

    let u = AstBuilder::new();
    let unsupported = program(&u, vec![], vec![], u.unsupported("loop_with_break"));

    let strict = Compiler::new(&table, &result, CodegenOptions::strict()).generate_module(&unsupported);
    assert_eq!(
        strict.unwrap_err(),
        CodegenError::UnsupportedConstruct {
            construct: "loop_with_break".to_string()
        }
    );

    let lenient = Compiler::new(&table, &result, CodegenOptions::lenient())
        .generate_module(&unsupported)
        .expect("lenient mode lowers to null");
    let main = function_text(&lenient, "__method_Main_main");
    assert!(main.contains("ret %__instance_Object* null"), "{}", main);
}
