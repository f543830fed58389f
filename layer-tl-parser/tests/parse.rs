use std::io::Write;

use layer_tl_parser::errors::{ParseError, TypeGrammarError};
use layer_tl_parser::tl::{Category, Primitive, TypeExpr};
use layer_tl_parser::{IdFormat, Schema, SchemaConfig, parse_tl_file};

#[test]
fn constructor_with_builtin_result() {
    let defs: Vec<_> = parse_tl_file("boolFalse#bc799737 = Bool;")
        .collect::<Result<_, _>>()
        .unwrap();
    let [decl] = defs.as_slice() else {
        panic!("expected one declaration, got {defs:?}");
    };
    assert_eq!((decl.name.name.as_str(), decl.id), ("boolFalse", 0xbc799737));
    assert_eq!(decl.category, Category::Constructor);
    assert_eq!(decl.result, TypeExpr::Primitive(Primitive::Bool));
}

#[test]
fn section_marker_switches_to_methods() {
    let src = "\
config#1 date:int = Config;
---functions---
help.getConfig#c4f9186b = Config;
---types---
nearestDc#2 country:string = NearestDc;
";
    let categories: Vec<_> = parse_tl_file(src).map(|d| d.unwrap().category).collect();
    assert_eq!(categories, [Category::Constructor, Category::Method, Category::Constructor]);

    let method = parse_tl_file(src).nth(1).unwrap().unwrap();
    assert_eq!(method.name.namespace, ["help"]);
    assert_eq!(method.name.display_name(), "GetConfig");
}

#[test]
fn flag_gated_fields_keep_their_word_and_bit() {
    let src = "user#3ff6ecb0 flags:# id:long username:flags.0?string photo:flags.5?UserProfilePhoto = User;";
    let decl = parse_tl_file(src).next().unwrap().unwrap();
    let flags: Vec<_> = decl
        .params
        .iter()
        .map(|p| p.flag().map(|f| (f.word.as_str(), f.bit)))
        .collect();
    assert_eq!(flags, [None, None, Some(("flags", 0)), Some(("flags", 5))]);
    assert!(decl.params[0].is_flags_word());
    assert_eq!(decl.params[3].ty.erased().to_string(), "UserProfilePhoto");
}

#[test]
fn comments_and_blank_lines_between_declarations() {
    let src = "
// Bool

boolTrue#997275b5 = Bool; // inline
// boolFalse#00000000 = Bool; commented out
boolFalse#bc799737 = Bool;
";
    let ids: Vec<_> = parse_tl_file(src).map(|d| d.unwrap().id).collect();
    assert_eq!(ids, [0x997275b5, 0xbc799737]);
}

#[test]
fn builtin_prelude_is_understood() {
    let src = "\
int ? = Int;
long ? = Long;
string ? = String;
bytes = Bytes;
vector#1cb5c415 {t:Type} # [ t ] = Vector t;
true#3fedd339 = True;
";
    let defs: Vec<_> = parse_tl_file(src).collect::<Result<_, _>>().unwrap();
    let names: Vec<_> = defs.iter().map(|d| d.full_name()).collect();
    assert_eq!(names, ["vector", "true"]);
    assert!(matches!(defs[0].result, TypeExpr::Vector { boxed: true, .. }));
}

#[test]
fn idless_transport_message_is_kept() {
    let src = "message msg_id:long seqno:int bytes:int body:Object = Message;";
    let decl = parse_tl_file(src).next().unwrap().unwrap();
    assert_eq!(decl.id, 0x5bb8e511);
    assert_eq!(decl.params.len(), 4);
    assert_eq!(decl.params[3].ty, TypeExpr::Primitive(Primitive::Object));
}

#[test]
fn single_letter_types_are_not_variables_in_constructors() {
    let decl = parse_tl_file("holder#1 v:A = Holder;").next().unwrap().unwrap();
    assert_eq!(decl.params[0].ty.to_string(), "A");
    assert!(matches!(decl.params[0].ty, TypeExpr::Named { bare: false, .. }));
}

#[test]
fn method_variables_come_from_generic_blocks() {
    let src = "---functions---\n\
        invokeAfterMsg#cb9f372d {T:Type} msg_id:long query:!T = T;\n\
        wrap#2 {X:Type} a:A query:!X = X;";
    let defs: Vec<_> = parse_tl_file(src).collect::<Result<_, _>>().unwrap();
    assert_eq!(defs[0].result, TypeExpr::Var("T".into()));
    assert_eq!(defs[0].type_variables(), ["T"]);
    assert!(matches!(defs[1].params[0].ty, TypeExpr::Named { .. }));
    assert_eq!(defs[1].result, TypeExpr::Var("X".into()));
}

#[test]
fn out_of_range_bit_names_the_parameter() {
    let src = "bits#1 flags:# x:flags.40?int = Bits;";
    let err = parse_tl_file(src).next().unwrap().unwrap_err();
    match err {
        ParseError::Type { declaration, parameter, source } => {
            assert_eq!(declaration, "bits");
            assert_eq!(parameter.as_deref(), Some("x"));
            assert_eq!(source, TypeGrammarError::FlagBitOutOfRange { bit: 40 });
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn iteration_stops_after_first_error() {
    let src = "first#1 = First;\nsecond#zz = Second;\nthird#3 = Third;";
    let results: Vec<_> = parse_tl_file(src).collect();
    assert_eq!(results.len(), 2);
    assert!(results[0].is_ok());
    assert!(results[1].is_err());
}

#[test]
fn schema_loads_from_files() {
    let mut tl = tempfile::Builder::new().suffix(".tl").tempfile().unwrap();
    writeln!(tl, "// LAYER 3\nping#7abe77ec ping_id:long = Pong;").unwrap();
    let schema = Schema::load(tl.path(), SchemaConfig::default()).unwrap();
    assert_eq!(schema.layer, Some(3));
    assert_eq!(schema.constructors.len(), 1);

    let mut json = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        json,
        r#"{{"constructors": [{{"id": "7abe77ec", "predicate": "ping",
            "params": [{{"name": "ping_id", "type": "long"}}], "type": "Pong"}}]}}"#
    )
    .unwrap();
    let config = SchemaConfig { id_format: IdFormat::Hex, ..SchemaConfig::default() };
    let from_json = Schema::load(json.path(), config).unwrap();
    assert_eq!(from_json.constructors, schema.constructors);
}
