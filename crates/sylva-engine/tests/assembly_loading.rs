use serde_json::{json, Value};
use sylva_engine::vm::assembly::AssemblyDocument;
use sylva_engine::vm::constant::ConstantError;
use sylva_engine::vm::literal::LiteralError;
use sylva_engine::vm::string::StringSlot;
use sylva_engine::{
    AssemblyLoader, ConstantRequest, DeferredInitializer, Initializer, LayoutKind, LoadError,
    LoadedProgram, Namespace, PendingConstant, Trap, TrapKind, TypeId,
};

fn load(doc: Value) -> LoadedProgram {
    AssemblyLoader::new().load_value(doc).unwrap()
}

fn load_err(doc: Value) -> LoadError {
    AssemblyLoader::new().load_value(doc).unwrap_err()
}

fn register(tkey: &str) -> Value {
    json!({
        "tkind": "Register", "tkey": tkey,
        "sizeinfo": {
            "heapsize": 0, "inlinedatasize": 8, "assigndatasize": 8,
            "heapmask": null, "inlinedmask": "1"
        }
    })
}

fn reference(tkind: &str, tkey: &str, extra: Value) -> Value {
    let mut decl = json!({
        "tkind": tkind, "tkey": tkey,
        "sizeinfo": {
            "heapsize": 72, "inlinedatasize": 8, "assigndatasize": 8,
            "heapmask": "22", "inlinedmask": "2"
        }
    });
    if let (Some(obj), Value::Object(more)) = (decl.as_object_mut(), extra) {
        obj.extend(more);
    }
    decl
}

fn list_types() -> Vec<Value> {
    vec![
        reference("PartialVector", "PV4<Int>", json!({"entrytype": "Int", "capacity": 4})),
        reference("PartialVector", "PV8<Int>", json!({"entrytype": "Int", "capacity": 8})),
        reference("ListTree", "ListTree<Int>", json!({"entrytype": "Int"})),
    ]
}

fn list_doc(entry: &str) -> Value {
    json!({
        "typenames": ["List<Int>", "ListRepr<Int>", "PV4<Int>", "PV8<Int>", "ListTree<Int>", "Main::Orphan"],
        "typedecls": list_types(),
        "listflavors": [{
            "ltype": "List<Int>", "reprtype": "ListRepr<Int>", "entrytype": entry,
            "pv4type": "PV4<Int>", "pv8type": "PV8<Int>", "treetype": "ListTree<Int>"
        }]
    })
}

// ============================================================================
// Minimal documents
// ============================================================================

#[test]
fn test_minimal_document_has_only_well_known_types() {
    let program = load(json!({
        "src": [], "cmask": "", "cbuffsize": 0,
        "typenames": [], "propertynames": [], "fieldnames": [],
        "invokenames": [], "vinvokenames": [], "fielddecls": [],
        "typedecls": [], "boxeddecls": [], "listflavors": [], "mapflavors": [],
        "invdecls": [], "litdecls": [], "validators": [], "regexes": [],
        "constdecls": []
    }));

    assert_eq!(program.types().len(), 26);
    assert_eq!(program.types().populated(), 26);
    for (index, desc) in program.types().iter().enumerate() {
        assert_eq!(desc.tid.index(), index);
    }
    assert_eq!(program.display_type(TypeId::STRING), "String");
    assert_eq!(
        program.types().get(TypeId::BOOL).unwrap().size.assigndatasize,
        1
    );
    assert!(program.global_roots().is_empty());
}

#[test]
fn test_null_and_absent_arrays() {
    let program = load(json!({ "typedecls": null, "litdecls": null }));
    assert_eq!(program.types().populated(), 26);
    assert_eq!(program.heap().allocation_count(), 0);
}

#[test]
fn test_document_round_trips_through_serde() {
    let doc: AssemblyDocument = serde_json::from_value(list_doc("Int")).unwrap();
    let text = serde_json::to_string(&doc).unwrap();
    let program = AssemblyLoader::new().load_str(&text).unwrap();
    assert_eq!(program.flavors().list_count(), 1);
}

// ============================================================================
// Name interning
// ============================================================================

#[test]
fn test_type_names_are_deduplicated() {
    let program = load(json!({
        "typenames": ["Main::A", "Main::B", "Main::A", "Int", "None"]
    }));
    let names = program.names();
    assert_eq!(names.type_id("Main::A"), Some(TypeId::new(26)));
    assert_eq!(names.type_id("Main::B"), Some(TypeId::new(27)));
    assert_eq!(names.type_id("Int"), Some(TypeId::INT));
    assert_eq!(names.type_id("None"), Some(TypeId::NONE));
    assert_eq!(names.count(Namespace::Type), 28);
}

#[test]
fn test_append_only_namespaces_keep_duplicates() {
    let program = load(json!({
        "propertynames": ["a", "b", "a"],
        "fieldnames": ["x", "x"],
        "invokenames": ["f", "g", "f"],
        "vinvokenames": ["v"]
    }));
    let names = program.names();
    assert_eq!(names.count(Namespace::Property), 3);
    assert_eq!(names.resolve(Namespace::Property, 2), Some("a"));
    assert_eq!(names.count(Namespace::Field), 2);
    assert_eq!(names.count(Namespace::Invoke), 3);
    assert_eq!(names.resolve(Namespace::Invoke, 1), Some("g"));
    assert_eq!(names.count(Namespace::VirtualInvoke), 1);
    assert_eq!(program.invokes().len(), 3);
}

#[test]
fn test_typedecl_for_unknown_name_fails() {
    let err = load_err(json!({ "typedecls": [register("Main::Missing")] }));
    assert!(matches!(
        err,
        LoadError::UnknownName { namespace: Namespace::Type, .. }
    ));
}

#[test]
fn test_redeclaring_well_known_type_fails() {
    let err = load_err(json!({ "typedecls": [register("Int")] }));
    assert!(matches!(err, LoadError::Table(_)));
}

#[test]
fn test_undeclared_type_is_left_empty() {
    let program = load(json!({ "typenames": ["Main::Declared", "Main::Ghost"],
                               "typedecls": [register("Main::Declared")] }));
    assert_eq!(program.types().len(), 28);
    assert_eq!(program.types().populated(), 27);
    let ghost = program.names().type_id("Main::Ghost").unwrap();
    assert!(program.types().get(ghost).is_none());
    assert_eq!(program.display_type(ghost), "Main::Ghost");
}

// ============================================================================
// Type table and flavors
// ============================================================================

#[test]
fn test_union_and_entity_declarations() {
    let program = load(json!({
        "typenames": ["Main::Person", "Main::Person|None"],
        "fieldnames": ["name", "age"],
        "fielddecls": [
            {"fkey": "name", "fname": "name", "declaredType": "String", "isOptional": false},
            {"fkey": "age", "fname": "age", "declaredType": "Nat", "isOptional": false}
        ],
        "typedecls": [
            {
                "tkind": "Ref", "tkey": "Main::Person", "name": "Person",
                "sizeinfo": {
                    "heapsize": 24, "inlinedatasize": 8, "assigndatasize": 8,
                    "heapmask": "31", "inlinedmask": "2"
                },
                "fields": ["name", "age"], "fieldoffsets": [0, 16]
            },
            {
                "tkind": "UnionRef", "tkey": "Main::Person|None",
                "sizeinfo": {
                    "heapsize": 0, "inlinedatasize": 8, "assigndatasize": 8,
                    "heapmask": null, "inlinedmask": "2"
                },
                "subtypes": ["Main::Person", "None"]
            }
        ]
    }));

    let person = program.type_by_name("Main::Person").unwrap();
    assert_eq!(person.layout(), LayoutKind::Ref);
    assert_eq!(person.name, "Person");
    assert!(person.size.heap_has_pointers());

    let union = program.type_by_name("Main::Person|None").unwrap();
    assert_eq!(union.layout(), LayoutKind::UnionRef);
    assert_eq!(
        union.union_members().unwrap(),
        &[person.tid, TypeId::NONE][..]
    );
}

#[test]
fn test_list_flavor_registered() {
    let program = load(list_doc("Int"));
    let flavor = program.list_flavor(TypeId::INT).unwrap();
    assert_eq!(program.display_type(flavor.pv4type), "PV4<Int>");
    assert_eq!(program.display_type(flavor.treetype), "ListTree<Int>");
    assert_eq!(program.display_type(flavor.ltype), "List<Int>");
    assert!(program.list_flavor(TypeId::NAT).is_none());
}

#[test]
fn test_list_flavor_requires_loaded_entry_type() {
    let err = load_err(list_doc("Main::Orphan"));
    match err {
        LoadError::MissingDescriptor { name, .. } => assert_eq!(name, "Main::Orphan"),
        other => panic!("unexpected error: {other}"),
    }

    let err = load_err(list_doc("Main::NeverInterned"));
    assert!(matches!(err, LoadError::UnknownName { .. }));
}

#[test]
fn test_list_flavor_checks_partial_vector_capacity() {
    let mut doc = list_doc("Int");
    doc["listflavors"][0]["pv4type"] = json!("PV8<Int>");
    assert!(matches!(load_err(doc), LoadError::InvalidDeclaration { .. }));

    let mut doc = list_doc("Int");
    doc["listflavors"][0]["treetype"] = json!("PV4<Int>");
    assert!(matches!(
        load_err(doc),
        LoadError::WrongKind { expected: "ListTree", .. }
    ));
}

#[test]
fn test_duplicate_list_flavor_fails() {
    let mut doc = list_doc("Int");
    let entry = doc["listflavors"][0].clone();
    doc["listflavors"].as_array_mut().unwrap().push(entry);
    assert!(matches!(load_err(doc), LoadError::Flavor(_)));
}

#[test]
fn test_map_flavor_registered() {
    let mut types = vec![
        json!({
            "tkind": "Struct", "tkey": "[Int, String]",
            "sizeinfo": {
                "heapsize": 24, "inlinedatasize": 24, "assigndatasize": 24,
                "heapmask": null, "inlinedmask": "13"
            },
            "fields": [], "fieldoffsets": []
        }),
        reference("MapTree", "MapTree<Int, String>", json!({"keytype": "Int", "valuetype": "String"})),
    ];
    types.extend(list_types());
    let program = load(json!({
        "typenames": ["Map<Int, String>", "MapRepr<Int, String>", "[Int, String]",
                      "MapTree<Int, String>", "PV4<Int>", "PV8<Int>", "ListTree<Int>"],
        "typedecls": types,
        "mapflavors": [{
            "ltype": "Map<Int, String>", "reprtype": "MapRepr<Int, String>",
            "keytype": "Int", "valuetype": "String", "tupletype": "[Int, String]",
            "treetype": "MapTree<Int, String>"
        }]
    }));
    let flavor = program.map_flavor(TypeId::INT, TypeId::STRING).unwrap();
    assert_eq!(program.display_type(flavor.tupletype), "[Int, String]");
    assert!(program.map_flavor(TypeId::STRING, TypeId::INT).is_none());
}

// ============================================================================
// Literals, regexes, validators
// ============================================================================

fn literal_doc() -> Value {
    json!({
        "cbuffsize": 64,
        "cmask": "111331",
        "typenames": ["Main::Zip"],
        "typedecls": [register("Main::Zip")],
        "regexes": [{"restr": "/a+b/", "pattern": "a+b"}],
        "litdecls": [
            {"offset": 0, "type": "Nat", "value": "42n"},
            {"offset": 8, "type": "Int", "value": "-7i"},
            {"offset": 16, "type": "Bool", "value": "true"},
            {"offset": 24, "type": "String", "value": "\"hello\""},
            {"offset": 40, "type": "String", "value": "\"twenty bytes long...\""},
            {"offset": 56, "type": "Regex", "value": "/a+b/"}
        ],
        "validators": [
            {"vtype": "Main::Zip", "regex": {"restr": "/[0-9]{5}/", "pattern": "[0-9]{5}"}}
        ]
    })
}

#[test]
fn test_literals_written_to_global_buffer() {
    let program = load(literal_doc());
    let globals = program.globals();
    assert_eq!(globals.read_u64(0).unwrap(), 42);
    assert_eq!(globals.read_i64(8).unwrap(), -7);
    assert!(globals.read_bool(16).unwrap());

    let short = StringSlot::decode(&globals.read_array(24).unwrap()).unwrap();
    assert!(matches!(short, StringSlot::Inline { len: 5, .. }));

    let long = StringSlot::decode(&globals.read_array(40).unwrap()).unwrap();
    let StringSlot::Heap { obj, len } = long else {
        panic!("expected a heap string, got {long:?}");
    };
    assert_eq!(len, 20);
    let header = program.heap().header(obj).unwrap();
    assert_eq!(header.type_id(), TypeId::STRING_K32);
    assert!(header.is_young());
    let data = program.heap().data(obj).unwrap();
    assert_eq!(data.len(), 32);
    assert_eq!(&data[..20], b"twenty bytes long...");

    let regex = program.regexes().lookup("/a+b/").unwrap();
    assert_eq!(globals.read_u64(56).unwrap(), u64::from(regex.as_u32()));

    assert_eq!(program.global_roots(), vec![obj]);
}

#[test]
fn test_validators_attached_to_types() {
    let program = load(literal_doc());
    let zip = program.names().type_id("Main::Zip").unwrap();
    assert_eq!(program.regexes().validate(zip, "12345"), Some(true));
    assert_eq!(program.regexes().validate(zip, "1234x"), Some(false));
    assert_eq!(program.regexes().validate(TypeId::INT, "1"), None);
    assert!(program.validator_for(zip).is_some());
}

#[test]
fn test_string_size_tiers_through_loader() {
    let quoted = |n: usize| format!("\"{}\"", "x".repeat(n));
    let program = load(json!({
        "cbuffsize": 48, "cmask": "333",
        "litdecls": [
            {"offset": 0, "type": "String", "value": "\"\""},
            {"offset": 16, "type": "String", "value": quoted(16)},
            {"offset": 32, "type": "String", "value": quoted(128)}
        ]
    }));
    let globals = program.globals();
    assert_eq!(globals.read(0, 16).unwrap(), &[0u8; 16]);
    let headers: Vec<_> = program
        .heap()
        .iter()
        .map(|(_, obj)| obj.header.type_id())
        .collect();
    assert_eq!(headers, vec![TypeId::STRING_K16, TypeId::STRING_K128]);

    let err = load_err(json!({
        "cbuffsize": 16, "cmask": "3",
        "litdecls": [{"offset": 0, "type": "String", "value": quoted(129)}]
    }));
    assert!(matches!(
        err,
        LoadError::Literal { source: LiteralError::StringTooLong { len: 129, .. }, .. }
    ));
}

#[test]
fn test_unsupported_literals_fail() {
    let err = load_err(json!({
        "cbuffsize": 24, "cmask": "111",
        "litdecls": [{"offset": 0, "type": "Rational", "value": "1/2R"}]
    }));
    assert!(matches!(
        err,
        LoadError::Literal { source: LiteralError::RationalUnsupported { .. }, .. }
    ));

    let err = load_err(json!({
        "cbuffsize": 8, "cmask": "1",
        "litdecls": [{"offset": 0, "type": "Regex", "value": "/nope/"}]
    }));
    assert!(matches!(
        err,
        LoadError::Literal { source: LiteralError::UnknownRegex { .. }, .. }
    ));

    let err = load_err(json!({
        "cbuffsize": 8, "cmask": "1",
        "litdecls": [{"offset": 4, "type": "Int", "value": "1i"}]
    }));
    assert!(matches!(
        err,
        LoadError::Literal { source: LiteralError::Global(_), .. }
    ));
}

#[test]
fn test_invalid_regex_pattern_fails() {
    let err = load_err(json!({ "regexes": [{"restr": "/(/", "pattern": "("}] }));
    assert!(matches!(err, LoadError::Regex(_)));
}

// ============================================================================
// Invokes and constants
// ============================================================================

fn constant_doc() -> Value {
    json!({
        "cbuffsize": 16, "cmask": "11",
        "typenames": [],
        "invokenames": ["Main::k$init", "Main::add", "Main::lambda"],
        "invdecls": [
            {
                "ikind": "Body", "ikey": "Main::k$init", "name": "k$init",
                "srcFile": "main.bsq",
                "sinfoStart": {"line": 3, "column": 1, "pos": 20, "span": 12},
                "sinfoEnd": {"line": 3, "column": 13, "pos": 32, "span": 0},
                "recursive": false, "params": [], "resultType": "Int",
                "isUserCode": true, "scalarstackBytes": 16, "mixedstackBytes": 0,
                "mixedMask": "", "maskSlots": 0, "argmaskSize": 0,
                "paraminfo": [], "resultArg": {"kind": "scalar", "offset": 0},
                "body": [{"tag": "ReturnAssign"}]
            },
            {
                "ikind": "Primitive", "ikey": "Main::add", "name": "add",
                "params": [{"name": "a", "ptype": "Int"}, {"name": "b", "ptype": "Int"}],
                "resultType": "Int",
                "enclosingtype": null, "implkeyname": "int_add",
                "binds": {"T": "Int"},
                "pcodes": {"f": {"code": "Main::lambda", "cargpos": [0]}}
            }
        ],
        "constdecls": [{"offset": 8, "invoke": "Main::k$init", "type": "Int"}]
    })
}

struct Answer;

impl Initializer for Answer {
    fn run_initializer(&mut self, request: ConstantRequest<'_>) -> Result<(), Trap> {
        request
            .globals
            .write(request.offset, &42i64.to_ne_bytes())
            .map_err(|e| Trap::fault(e.to_string()))
    }
}

fn load_with(init: &mut dyn Initializer) -> Result<LoadedProgram, LoadError> {
    let doc: AssemblyDocument = serde_json::from_value(constant_doc()).unwrap();
    AssemblyLoader::new().load_document(doc, init)
}

#[test]
fn test_invoke_table_loaded() {
    let program = load_with(&mut DeferredInitializer::default()).unwrap();
    let names = program.names();
    let init = program
        .invokes()
        .get(names.invoke_id("Main::k$init").unwrap())
        .unwrap();
    assert_eq!(init.start.line, 3);
    assert!(init.is_user_code());
    assert_eq!(init.body().unwrap().ops.len(), 1);

    let add = program
        .invokes()
        .get(names.invoke_id("Main::add").unwrap())
        .unwrap();
    assert!(add.is_primitive());
    assert_eq!(add.params.len(), 2);

    let lambda = names.invoke_id("Main::lambda").unwrap();
    assert!(program.invokes().get(lambda).is_none());
}

#[test]
fn test_constant_initializer_runs() {
    let program = load_with(&mut Answer).unwrap();
    assert_eq!(program.globals().read_i64(8).unwrap(), 42);
}

#[test]
fn test_deferred_constants_are_recorded() {
    let mut deferred = DeferredInitializer::default();
    let program = load_with(&mut deferred).unwrap();
    let ikey = program.names().invoke_id("Main::k$init").unwrap();
    assert_eq!(
        deferred.pending,
        vec![PendingConstant { offset: 8, ikey, tid: TypeId::INT }]
    );
    assert_eq!(program.globals().read_i64(8).unwrap(), 0);
}

#[test]
fn test_constant_without_interpreter_faults() {
    let err = AssemblyLoader::new().load_value(constant_doc()).unwrap_err();
    match err {
        LoadError::Constant { offset: 8, source: ConstantError::Trapped { trap, .. } } => {
            assert_eq!(trap.kind, TrapKind::Fault);
            assert_eq!(trap.code(), 5);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_constant_with_primitive_initializer_fails() {
    let mut doc = constant_doc();
    doc["constdecls"][0]["invoke"] = json!("Main::add");
    let doc: AssemblyDocument = serde_json::from_value(doc).unwrap();
    let err = AssemblyLoader::new()
        .load_document(doc, &mut DeferredInitializer::default())
        .unwrap_err();
    assert!(matches!(
        err,
        LoadError::Constant { source: ConstantError::NotABody { .. }, .. }
    ));
}
