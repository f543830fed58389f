use std::collections::BTreeMap;

use layer_tl_parser::{Schema, SchemaConfig};
use layer_tl_plan::{
    Capabilities, Config, DispatchEntry, PatternRule, PlanError, ResolvedType, Role, SizeFormula,
    compile,
};
use layer_tl_types::ids::{BOOL_TRUE_ID, VECTOR_ID};

fn api(src: &str) -> Schema {
    Schema::from_tl_str(src, SchemaConfig::default()).unwrap()
}

#[test]
fn int_and_long_is_sixteen_bytes() {
    let plans = compile(&[api("pair#1 a:int b:long = Pair;")], &Config::default()).unwrap();
    assert_eq!(plans.declarations[0].wire.size, SizeFormula::Constant { size: 16 });
    assert_eq!(plans.dispatch.size_groups[&16], [1]);
}

#[test]
fn namespaced_zero_param_siblings_become_an_enum() {
    let src = "\
typeX.foo#a1 = typeX.Kind;
typeX.bar#a2 = typeX.Kind;
typeX.baz#a3 = typeX.Kind;
";
    let plans = compile(&[api(src)], &Config::default()).unwrap();
    let ResolvedType::Enum { members } = &plans.types[0].resolved else {
        panic!("expected enum, got {:?}", plans.types[0].resolved);
    };
    let labels: Vec<_> = members.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(labels, ["foo", "bar", "baz"]);
    assert_eq!(
        plans.declarations[1].role,
        Role::EnumMember { label: "bar".into(), constant: "BAR".into() }
    );
    // Identifier only: the members share a single size group.
    assert_eq!(plans.dispatch.size_groups[&4], [0xa1, 0xa2, 0xa3]);
}

#[test]
fn interface_keeps_only_fields_every_sibling_has() {
    let src = "\
first#1 a:int b:string = Shape;
second#2 a:int b:string c:long = Shape;
";
    let plans = compile(&[api(src)], &Config::default()).unwrap();
    let ResolvedType::Interface { common_fields, members } = &plans.types[0].resolved else {
        panic!("expected interface");
    };
    let names: Vec<_> = common_fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(members.len(), 2);
    assert!(plans.declarations.iter().all(|d| d.role == Role::InterfaceMember));
}

#[test]
fn member_named_like_its_type_gets_base_prefix() {
    let src = "\
message#1 id:int text:string = Message;
messageService#2 id:int = Message;
config#3 date:int = Config;
";
    let plans = compile(&[api(src)], &Config::default()).unwrap();
    let names: Vec<_> = plans.declarations.iter().map(|d| d.display_name.as_str()).collect();
    assert_eq!(names, ["BaseMessage", "MessageService", "Config"]);
}

#[test]
fn duplicate_ids_across_schemas_fail() {
    let first = api("pong#347773c5 msg_id:long = Pong;");
    let second = Schema::from_tl_str(
        "pong#347773c5 msg_id:long ping_id:long = Pong;",
        SchemaConfig::mtproto(),
    )
    .unwrap();
    let err = compile(&[first, second], &Config::default()).unwrap_err();
    assert!(matches!(
        err,
        PlanError::DuplicateIdentifier { id: 0x347773c5, ref first, ref second }
            if first == "pong" && second == "pong"
    ));
}

#[test]
fn declaration_may_not_take_a_reserved_id() {
    let err = compile(&[api("odd#997275b5 = Odd;")], &Config::default()).unwrap_err();
    assert!(matches!(err, PlanError::DuplicateIdentifier { ref first, .. } if first == "boolTrue"));
}

#[test]
fn builtins_go_to_the_primitive_table() {
    let src = "\
boolFalse#bc799737 = Bool;
boolTrue#997275b5 = Bool;
vector#1cb5c415 {t:Type} # [ t ] = Vector t;
user#4 id:long = User;
";
    let plans = compile(&[api(src)], &Config::default()).unwrap();
    assert_eq!(plans.dispatch.primitives["boolTrue"], BOOL_TRUE_ID);
    assert_eq!(plans.dispatch.primitives["vector"], VECTOR_ID);
    assert_eq!(plans.dispatch.get(BOOL_TRUE_ID), Some(&DispatchEntry::BoolTrue));
    assert_eq!(plans.dispatch.get(VECTOR_ID), Some(&DispatchEntry::UnknownVector));
    assert!(matches!(
        plans.dispatch.get(4),
        Some(DispatchEntry::Declaration { name, index: 3, .. }) if name == "user"
    ));
    assert_eq!(plans.declarations[0].role, Role::Builtin);
}

#[test]
fn supertypes_and_capabilities() {
    let config = Config {
        capabilities: Capabilities {
            exact: BTreeMap::from([("InputPeer".to_owned(), vec!["Peer".to_owned()])]),
            patterns: vec![PatternRule { pattern: "^Input".into(), tags: vec!["Input".into()] }],
        },
    };
    let api = api("inputPeerEmpty#7f3b18ea = InputPeer;\ninputPeerSelf#7da07ec9 = InputPeer;");
    let mtproto = Schema::from_tl_str("pong#347773c5 msg_id:long = Pong;", SchemaConfig::mtproto()).unwrap();
    let plans = compile(&[api, mtproto], &config).unwrap();

    assert_eq!(plans.types[0].supertypes, ["TlObject", "Peer", "Input"]);
    assert_eq!(plans.types[1].key.to_string(), "mtproto:Pong");
    assert_eq!(plans.types[1].supertypes, ["MTProtoObject"]);
    assert_eq!(plans.declarations[0].capabilities, ["Input"]);
}

#[test]
fn methods_keep_their_own_names() {
    let src = "\
user#4 id:long = User;
---functions---
users.getUsers#d91a548 id:Vector<long> = Vector<User>;
";
    let plans = compile(&[api(src)], &Config::default()).unwrap();
    let method = plans.declaration(0xd91a548).unwrap();
    assert_eq!(method.role, Role::Method);
    assert_eq!(method.display_name, "GetUsers");
    assert_eq!(method.namespace_path, ["users"]);
    assert!(method.type_key.is_none());
}

#[test]
fn recursive_constructors_are_marked() {
    let src = "\
textBold#1 text:RichText = RichText;
textPlain#2 text:string = RichText;
";
    let plans = compile(&[api(src)], &Config::default()).unwrap();
    assert!(plans.declarations[0].recursive);
    assert!(!plans.declarations[1].recursive);
}

#[test]
fn layer_is_carried_into_the_summary() {
    let plans = compile(&[api("// LAYER 181\nuser#4 id:long = User;")], &Config::default()).unwrap();
    assert_eq!(plans.schemas[0].layer, Some(181));
    assert_eq!(plans.schemas[0].constructors, 1);
}

#[test]
fn plan_set_serializes_to_json() {
    let plans = compile(&[api("x#1 flags:# a:flags.0?string = Thing;")], &Config::default()).unwrap();
    let json = serde_json::to_value(&plans).unwrap();
    let size = &json["declarations"][0]["wire"]["size"];
    assert_eq!(size["kind"], "dynamic");
    assert_eq!(size["base"], 8);
    assert_eq!(json["declarations"][0]["wire"]["presence"]["flags"][0]["field"], "a");
}
