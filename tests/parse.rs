use std::{env, fmt::Write, fs, path::PathBuf};

use insta::assert_snapshot;
use proptest::prelude::*;
use proto_idl::{
    ast::{Int, MessageKind, OptionValue, Rule},
    parse, parse_named, ErrorKind,
};
use similar_asserts::assert_eq;

fn test_data_dir() -> PathBuf {
    PathBuf::from(env::var_os("CARGO_MANIFEST_DIR").unwrap()).join("tests/data")
}

fn read_test_file(name: &str) -> String {
    fs::read_to_string(test_data_dir().join(name)).unwrap()
}

fn ident(value: &str) -> OptionValue {
    OptionValue::Ident(value.to_owned())
}

#[test]
fn addressbook() {
    let schema = parse_named("addressbook.proto", &read_test_file("addressbook.proto")).unwrap();

    assert_eq!(schema.package.as_deref(), Some("tutorial"));
    assert_eq!(schema.imports.len(), 2);
    assert_eq!(schema.imports[0].path, "google/protobuf/timestamp.proto");
    assert!(!schema.imports[0].public);
    assert_eq!(schema.imports[1].path, "common/shared.proto");
    assert!(schema.imports[1].public);
    assert_eq!(
        schema.options.iter().collect::<Vec<_>>(),
        vec![
            (
                "java_package",
                &OptionValue::String("com.example.tutorial".to_owned())
            ),
            ("optimize_for", &ident("SPEED")),
        ]
    );

    let names: Vec<_> = schema
        .messages
        .iter()
        .map(|message| (message.name.as_str(), message.kind))
        .collect();
    assert_eq!(
        names,
        vec![
            ("Person", MessageKind::Message),
            ("AddressBook", MessageKind::Message),
            ("Person", MessageKind::Extend),
        ]
    );

    let person = &schema.messages[0];
    let fields: Vec<_> = person
        .fields
        .iter()
        .map(|field| (field.rule, field.ty.as_str(), field.name.as_str(), field.id))
        .collect();
    assert_eq!(
        fields,
        vec![
            (Rule::Required, "string", "name", 1),
            (Rule::Required, "int32", "id", 2),
            (Rule::Optional, "string", "email", 3),
            (Rule::Repeated, "PhoneNumber", "phones", 4),
            (Rule::Optional, ".google.protobuf.Timestamp", "last_updated", 5),
            (Rule::Repeated, "Address", "address", 6),
        ]
    );
    assert_eq!(
        person.fields[1].options.get("deprecated"),
        Some(&OptionValue::Bool(false))
    );
    assert!(person.fields[5].group);
    assert_eq!(person.extensions, Some((100, 536_870_911)));

    let phone_type = &person.enums[0];
    assert_eq!(phone_type.name, "PhoneType");
    assert_eq!(phone_type.values.len(), 4);
    assert_eq!(phone_type.values[3].name, "PERSONAL");
    assert_eq!(phone_type.values[3].id, 2);
    assert_eq!(
        phone_type.options.get("allow_alias"),
        Some(&OptionValue::Bool(true))
    );

    assert_eq!(person.messages.len(), 2);
    let phone_number = &person.messages[0];
    assert_eq!(phone_number.name, "PhoneNumber");
    assert_eq!(
        phone_number.fields[1].options.get("default"),
        Some(&ident("HOME"))
    );
    let address = &person.messages[1];
    assert!(address.is_group());
    assert_eq!(address.name, "Address");
    assert_eq!(
        address.fields[1].options.get("default"),
        Some(&OptionValue::String("Springfield".to_owned()))
    );

    let address_book = &schema.messages[1];
    assert_eq!(
        address_book.options.get("(shared.book_options).max_size"),
        Some(&OptionValue::Int(Int {
            negative: false,
            value: 1024
        }))
    );

    let extend = &schema.messages[2];
    assert_eq!(extend.target_reference(), Some("Person"));
    assert!(extend.fields.iter().all(|field| field.is_extension()));
    assert_eq!(
        extend.fields[0].options.get("default"),
        Some(&OptionValue::Float("3.14".parse().unwrap()))
    );
    assert_eq!(
        extend.fields[1].options.get("default"),
        Some(&OptionValue::Int(Int {
            negative: true,
            value: 0x7fff_ffff
        }))
    );

    let status = &schema.enums[0];
    let values: Vec<_> = status
        .values
        .iter()
        .map(|value| (value.name.as_str(), value.id))
        .collect();
    assert_eq!(values, vec![("UNKNOWN", 0), ("ACTIVE", 1), ("BANNED", -1)]);

    let service = &schema.services[0];
    assert_eq!(service.name, "AddressBookService");
    assert_eq!(
        service.options.get("deprecated"),
        Some(&OptionValue::Bool(false))
    );
    assert_eq!(service.methods_of_kind("rpc").count(), 2);
    let get_person = service.method("rpc", "GetPerson").unwrap();
    assert_eq!(get_person.request, "PersonRequest");
    assert_eq!(get_person.response, "Person");
    let list_people = service.method("rpc", "ListPeople").unwrap();
    assert_eq!(list_people.request, ".tutorial.Query");
    assert_eq!(list_people.response, "AddressBook");
    assert_eq!(
        list_people.options.get("(shared.cacheable)"),
        Some(&OptionValue::Bool(true))
    );
}

#[test]
fn many_options_and_methods() {
    const COUNT: usize = 20_000;

    let mut source = String::from("message M {\n");
    for i in 0..COUNT {
        writeln!(source, "  option o{} = {};", i, i).unwrap();
    }
    source.push_str("  option o0 = -1;\n}\nservice S {\n");
    for i in 0..COUNT {
        writeln!(source, "  rpc M{} (A) returns (B);", i).unwrap();
    }
    source.push_str("  rpc M0 (C) returns (B);\n}\n");

    let schema = parse(&source).unwrap();

    let options = &schema.messages[0].options;
    assert_eq!(options.len(), COUNT);
    assert_eq!(
        options.iter().next(),
        Some((
            "o0",
            &OptionValue::Int(Int {
                negative: true,
                value: 1
            })
        ))
    );
    assert_eq!(
        options.get("o19999"),
        Some(&OptionValue::Int(Int {
            negative: false,
            value: 19_999
        }))
    );

    let service = &schema.services[0];
    assert_eq!(service.methods_of_kind("rpc").count(), COUNT);
    let first = service.methods_of_kind("rpc").next().unwrap();
    assert_eq!((first.name.as_str(), first.request.as_str()), ("M0", "C"));
}

#[test]
fn header_ordering() {
    let header = "package p; import \"x.proto\"; option foo = 1;";
    assert!(parse(&format!("{} message M {{}}", header)).is_ok());

    for statement in ["package p;", "import \"x.proto\";", "option foo = 1;"] {
        let err = parse(&format!("message M {{}} {}", statement)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IllegalOrder, "{}", statement);
    }
}

#[test]
fn error_kinds() {
    let kind = |source: &str| parse(source).unwrap_err().kind();

    assert_eq!(kind("message A {"), ErrorKind::Eof);
    assert_eq!(kind("option a = 'abc"), ErrorKind::Eof);
    assert_eq!(kind("message A {} /*"), ErrorKind::Eof);
    assert_eq!(kind("message A { optional int32 a = 1 }"), ErrorKind::UnexpectedToken);
    assert_eq!(kind("package a; package b;"), ErrorKind::IllegalOrder);
    assert_eq!(kind("message A { optional int32 a = -1; }"), ErrorKind::IllegalNumber);
    assert_eq!(kind("option a = 0x;"), ErrorKind::UnexpectedToken);
    assert_eq!(
        kind("message A { optional group a = 1 {} }"),
        ErrorKind::InvalidGroupName
    );
    assert_eq!(
        kind(&"message A {".repeat(200_000)),
        ErrorKind::NestingTooDeep
    );
    assert_eq!(
        kind(&format!(
            "message A {{ {}",
            "optional group G = 1 { ".repeat(200_000)
        )),
        ErrorKind::NestingTooDeep
    );
    assert_eq!(
        kind(&"message A { extend B { optional group G = 1 { ".repeat(50_000)),
        ErrorKind::NestingTooDeep
    );
}

#[test]
fn error_messages() {
    let message = |source: &str| parse(source).unwrap_err().to_string();

    assert_snapshot!(
        message("message A {\n  optional int32 a = 1\n}"),
        @"line 3: unexpected '}' in field a in message A, expected ';'"
    );
    assert_snapshot!(
        message("enum E {\n  A = 0;\n"),
        @"line 3: expected an enum value, 'option' or '}' in enum E, but reached end of input"
    );
    assert_snapshot!(
        message("option a = \"abc\n\n"),
        @"line 3: unterminated string"
    );
    assert_snapshot!(
        message("package a;\n\npackage b;"),
        @"line 3: multiple package names specified"
    );
    assert_snapshot!(
        message("service S {\n  rpc M (A) returns (B) [x = 1];\n}"),
        @"line 2: unexpected '[' in rpc M in service S, expected ';' or '{'"
    );
}

#[test]
fn error_span() {
    let err = parse("message A { optional group lower = 1 {} }").unwrap_err();
    assert_eq!(err.span(), Some(27..32));

    let err = parse("message A {").unwrap_err();
    assert_eq!(err.span(), None);
}

#[test]
fn comments_between_tokens() {
    let schema = parse(
        "message /* name */ A // trailing\n{ optional /* multi\nline */ int32 a = /**/ 1; }",
    )
    .unwrap();

    assert_eq!(schema.messages[0].name, "A");
    assert_eq!(schema.messages[0].fields[0].id, 1);
}

proptest! {
    #[test]
    fn prop_parse_never_panics(source in ".{0,512}") {
        let _ = parse(&source);
    }

    #[test]
    fn prop_parse_field(
        message in "[A-Z][A-Za-z0-9_]{0,12}",
        name in "[a-z][a-z0-9_]{0,12}",
        id in 1..=536_870_911i32,
    ) {
        let source = format!("message {} {{ optional string {} = {}; }}", message, name, id);
        let schema = parse(&source).unwrap();

        prop_assert_eq!(&schema.messages[0].name, &message);
        prop_assert_eq!(&schema.messages[0].fields[0].name, &name);
        prop_assert_eq!(schema.messages[0].fields[0].id, id);
    }

    #[test]
    fn prop_error_line(blank_lines in 0usize..32) {
        let source = format!("message A {{{}}} }}", "\n".repeat(blank_lines));
        let err = parse(&source).unwrap_err();

        prop_assert_eq!(err.line(), blank_lines + 1);
    }
}
