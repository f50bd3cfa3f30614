// Enables feature flag documentation on things in docs.rs https://github.com/rust-lang/rust/issues/43781 http://doc.rust-lang.org/rustdoc/unstable-features.html#doccfg-and-docauto_cfg
#![cfg_attr(docsrs, feature(doc_cfg))]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use recjson::{Codec, CodecOptions, DecodeOptions, DynRecord, Layout, SchemaRegistry};
use serde_json::Value;

const LAYOUT_FILE: &str = "layout.json";

/// Check if a JSON file name has the --fails-strict marker
fn has_fails_strict_marker(file_name: &str) -> bool {
    file_name.contains("--fails-strict")
}

/// Extract the type name from a JSON file name, handling _N suffixes and --fails-strict markers
fn extract_type_name(file_name: &str) -> String {
    let clean_name = file_name.replace("--fails-strict", "");

    if let Some(pos) = clean_name.rfind('_') {
        let suffix = &clean_name[pos + 1..];
        if !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()) {
            return clean_name[..pos].to_string();
        }
    }
    clean_name
}

/// Runs every data file of `tests/resources/<test_name>` through the codec,
/// using the `layout.json` of the same directory as schema.
///
/// Plain files must decode in strict mode and re-encode to the same JSON.
/// `--fails-strict` files must be rejected in strict mode, decode in lenient
/// mode, and survive a second round trip unchanged.
pub fn run(test_name: &str) {
    let test_dir = format!("./tests/resources/{}", test_name);
    let test_path = Path::new(&test_dir);

    if !test_path.exists() {
        panic!("Test directory {} does not exist", test_dir);
    }

    let layout = Layout::from_file(test_path.join(LAYOUT_FILE))
        .unwrap_or_else(|e| panic!("Failed to load layout for {}: {}", test_name, e));
    let registry = layout
        .to_registry()
        .unwrap_or_else(|e| panic!("Invalid layout for {}: {}", test_name, e));

    let mut type_tests: BTreeMap<String, Vec<(PathBuf, bool)>> = BTreeMap::new();

    for entry in fs::read_dir(test_path).expect("Failed to read test directory") {
        let entry = entry.expect("Failed to read entry");
        let path = entry.path();

        if path.extension().and_then(|s| s.to_str()) != Some("json")
            || path.file_name().and_then(|s| s.to_str()) == Some(LAYOUT_FILE)
        {
            continue;
        }
        let file_name = path.file_stem().unwrap().to_str().unwrap();
        let fails_strict = has_fails_strict_marker(file_name);
        let type_name = extract_type_name(file_name);

        type_tests
            .entry(type_name)
            .or_default()
            .push((path, fails_strict));
    }

    if type_tests.is_empty() {
        panic!("No JSON test files found in {}", test_dir);
    }

    for (type_name, mut json_files) in type_tests {
        json_files.sort();
        for (json_path, fails_strict) in json_files {
            if fails_strict {
                run_fails_strict_test(&registry, &type_name, &json_path);
            } else {
                run_single_test(&registry, &type_name, &json_path);
            }
        }
    }
}

fn codec(registry: &SchemaRegistry, strict: bool) -> Codec<'_> {
    Codec::new(registry).with_options(CodecOptions {
        decode: DecodeOptions { strict },
        ..CodecOptions::default()
    })
}

fn read_json(json_path: &Path) -> Value {
    let json_data = fs::read_to_string(json_path)
        .unwrap_or_else(|_| panic!("Failed to read JSON file: {:?}", json_path));
    serde_json::from_str(&json_data)
        .unwrap_or_else(|e| panic!("Failed to parse JSON file {:?}: {}", json_path, e))
}

fn decode(codec: &Codec<'_>, type_name: &str, json: &Value, json_file_name: &str) -> DynRecord {
    codec
        .deserialize_dyn(type_name, json)
        .unwrap_or_else(|e| panic!("Decoding {} as {} failed: {}", json_file_name, type_name, e))
}

fn encode(codec: &Codec<'_>, record: &DynRecord) -> Value {
    codec
        .to_value(record)
        .unwrap_or_else(|e| panic!("Encoding {} failed: {}", record_name(record), e))
}

fn record_name(record: &DynRecord) -> &str {
    recjson::Record::type_name(record)
}

fn run_fails_strict_test(registry: &SchemaRegistry, type_name: &str, json_path: &Path) {
    let json_file_name = json_path.file_name().unwrap().to_str().unwrap();
    println!(
        "Testing (fails-strict): {} with {}",
        type_name, json_file_name
    );

    let original = read_json(json_path);

    match codec(registry, true).deserialize_dyn(type_name, &original) {
        Ok(_) => panic!(
            "Strict decoding unexpectedly succeeded for type {} (marked as --fails-strict)",
            type_name
        ),
        Err(e) => println!("✓ Correctly failed in strict mode: {}", e),
    }

    let lenient = codec(registry, false);
    let first = decode(&lenient, type_name, &original, json_file_name);
    let output = encode(&lenient, &first);
    let second = decode(&lenient, type_name, &output, json_file_name);

    if !lenient.equals(&first, &second) || !values_equal(&output, &encode(&lenient, &second)) {
        panic!(
            "Lenient round trip is not stable for type {} with test file {}\nOriginal: {}\nOutput: {}",
            type_name,
            json_file_name,
            serde_json::to_string_pretty(&original).unwrap(),
            serde_json::to_string_pretty(&output).unwrap()
        );
    }

    println!(
        "✓ {} with {} passed round-trip test (lenient)",
        type_name, json_file_name
    );
}

fn run_single_test(registry: &SchemaRegistry, type_name: &str, json_path: &Path) {
    let json_file_name = json_path.file_name().unwrap().to_str().unwrap();
    println!("Testing: {} with {}", type_name, json_file_name);

    let original = read_json(json_path);

    let strict = codec(registry, true);
    let decoded = decode(&strict, type_name, &original, json_file_name);
    let output = encode(&strict, &decoded);

    if !values_equal(&original, &output) {
        panic!(
            "Round-trip JSON mismatch for type {} with test file {}\nOriginal: {}\nOutput: {}",
            type_name,
            json_file_name,
            serde_json::to_string_pretty(&original).unwrap(),
            serde_json::to_string_pretty(&output).unwrap()
        );
    }

    let again = decode(&strict, type_name, &output, json_file_name);
    if !strict.equals(&decoded, &again) {
        panic!(
            "Decoded records differ for type {} with test file {}",
            type_name, json_file_name
        );
    }

    println!(
        "✓ {} with {} passed round-trip test",
        type_name, json_file_name
    );
}

/// Compare two JSON values, treating integer and float numbers as equal if they represent the same value
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(n1), Value::Number(n2)) => n1.as_f64() == n2.as_f64(),
        (Value::String(s1), Value::String(s2)) => s1 == s2,
        (Value::Bool(b1), Value::Bool(b2)) => b1 == b2,
        (Value::Null, Value::Null) => true,
        (Value::Array(arr1), Value::Array(arr2)) => {
            arr1.len() == arr2.len()
                && arr1
                    .iter()
                    .zip(arr2.iter())
                    .all(|(v1, v2)| values_equal(v1, v2))
        }
        (Value::Object(obj1), Value::Object(obj2)) => {
            obj1.len() == obj2.len()
                && obj1
                    .iter()
                    .all(|(k, v1)| obj2.get(k).is_some_and(|v2| values_equal(v1, v2)))
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn type_names_drop_suffixes_and_markers() {
        assert_eq!(extract_type_name("Point"), "Point");
        assert_eq!(extract_type_name("Point_2"), "Point");
        assert_eq!(extract_type_name("SomeTT_1--fails-strict"), "SomeTT");
        assert_eq!(extract_type_name("some_tt"), "some_tt");
        assert_eq!(extract_type_name("myTestStruct_"), "myTestStruct_");
        assert!(has_fails_strict_marker("SomeTT--fails-strict"));
        assert!(!has_fails_strict_marker("SomeTT_3"));
    }

    #[test]
    fn numbers_compare_by_value() {
        assert!(values_equal(&json!({ "a": 1, "b": [true] }), &json!({ "b": [true], "a": 1.0 })));
        assert!(!values_equal(&json!({ "a": 1 }), &json!({ "a": 1, "b": 2 })));
        assert!(!values_equal(&json!([1, 2]), &json!([1])));
    }
}
