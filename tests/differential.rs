use judo::decode;
use judo::dialect::Dialect;
use judo::value::{self, Allocator, Document, NodeId, ValueType};
use serde_json::Value;

fn to_serde<A: Allocator>(doc: &Document<'_, A>, id: NodeId<'_>) -> Value {
    match doc.get_type(id) {
        ValueType::Null => Value::Null,
        ValueType::Bool => Value::Bool(doc.as_bool(id)),
        ValueType::Number => {
            let n = decode::numberify_f64(doc.source(), doc.value_span(id)).unwrap();
            serde_json::Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
        }
        ValueType::String => {
            let span = doc.value_span(id);
            let len = decode::stringify(doc.source(), span, &mut []).unwrap();
            let mut buf = vec![0u8; len];
            decode::stringify(doc.source(), span, &mut buf).unwrap();
            Value::String(String::from_utf8(buf).unwrap())
        }
        ValueType::Array => {
            let mut elems = Vec::new();
            let mut cur = doc.first_child(id);
            while let Some(c) = cur {
                elems.push(to_serde(doc, c));
                cur = doc.next_sibling(c);
            }
            Value::Array(elems)
        }
        ValueType::Object => {
            let mut map = serde_json::Map::new();
            let mut cur = doc.first_member(id);
            while let Some(m) = cur {
                let name_span = doc.member_name_span(m).unwrap();
                let len = decode::stringify(doc.source(), name_span, &mut []).unwrap();
                let mut buf = vec![0u8; len];
                decode::stringify(doc.source(), name_span, &mut buf).unwrap();
                let key = String::from_utf8(buf).unwrap();
                map.insert(key, to_serde(doc, doc.member_value(m)));
                cur = doc.next_member(m);
            }
            Value::Object(map)
        }
    }
}

fn assert_matches_serde(json: &str) {
    let expected: Value = serde_json::from_str(json).unwrap();
    let doc = value::parse(json.as_bytes(), Dialect::default()).unwrap();
    let actual = to_serde(&doc, doc.root());
    assert_eq!(actual, expected, "mismatch for input: {json}");
}

// Numeric literals in these fixtures always carry a decimal point or
// exponent: `judo::decode::numberify_f64` always yields an `f64`, while
// `serde_json::Number` keeps bare integers in an arbitrary-precision integer
// representation that doesn't compare equal to a `Number::from_f64` of the
// same magnitude even though both denote the same number. Restricting every
// fixture to float-shaped literals keeps both sides on the same
// representation so the comparison is actually exercising tree/string/bool
// equivalence rather than tripping over that unrelated `Number` quirk.
#[test]
fn matches_serde_json_on_a_variety_of_documents() {
    assert_matches_serde(r#"{"a": 1.0, "b": [1.0, 2.0, 3.0], "c": {"d": null}, "e": "hi\nthere"}"#);
    assert_matches_serde(r#"[]"#);
    assert_matches_serde(r#"{}"#);
    assert_matches_serde(r#"[1.0, -2.0, 3.5, -0.25, 1e10, -1.5e-3]"#);
    assert_matches_serde(r#"["unicode: éè", "slash\/and\\backslash"]"#);
    assert_matches_serde(r#"[true, false, null]"#);
    assert_matches_serde(r#"{"nested": {"deeply": {"nested": [1.0, [2.0, [3.0, [4.0]]]]}}}"#);
}
