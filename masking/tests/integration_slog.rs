//! Integration tests for the slog module.
//!
//! These tests verify that:
//! - `into_masked_json()` serializes the masked form of a payload
//! - the `slog::Value` implementation emits it through slog's nested values
//! - masking and serialization failures are logged as placeholders

#![cfg(all(feature = "slog", feature = "algorithms"))]

use std::{cell::RefCell, collections::HashMap, fmt::Arguments, sync::Arc};

use masking::{
    slog::{IntoMaskedJson, MASK_FAILED, SERIALIZE_FAILED},
    Algorithm, ConstructError, EmailCover, Mask, MaskingEngine, NameCover, PhoneCover,
};
use pretty_assertions::assert_eq;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

// A test serializer that captures serialized key-value pairs
struct CapturingSerializer {
    captured: RefCell<HashMap<String, CapturedValue>>,
}

#[derive(Debug, Clone, PartialEq)]
enum CapturedValue {
    Str(String),
    Scalar(String),
    // Nested serde values are captured as their JSON representation
    Serde(JsonValue),
}

impl CapturingSerializer {
    fn new() -> Self {
        Self {
            captured: RefCell::new(HashMap::new()),
        }
    }

    fn get(&self, key: &str) -> Option<CapturedValue> {
        self.captured.borrow().get(key).cloned()
    }

    fn json(&self, key: &str) -> JsonValue {
        match self.get(key) {
            Some(CapturedValue::Serde(json)) => json,
            other => panic!("expected a serde value for {key:?}, got {other:?}"),
        }
    }

    fn insert(&self, key: slog::Key, value: CapturedValue) -> slog::Result {
        self.captured.borrow_mut().insert(key.into(), value);
        Ok(())
    }
}

impl slog::Serializer for CapturingSerializer {
    fn emit_arguments(&mut self, key: slog::Key, val: &Arguments<'_>) -> slog::Result {
        self.insert(key, CapturedValue::Scalar(val.to_string()))
    }

    fn emit_str(&mut self, key: slog::Key, val: &str) -> slog::Result {
        self.insert(key, CapturedValue::Str(val.into()))
    }

    fn emit_serde(&mut self, key: slog::Key, val: &dyn slog::SerdeValue) -> slog::Result {
        let json = serde_json::to_value(val.as_serde()).unwrap_or(JsonValue::Null);
        self.insert(key, CapturedValue::Serde(json))
    }
}

/// Serializes a `slog::Value` the way a drain would.
fn serialize_to_capture<V: slog::Value>(value: &V, key: &'static str) -> CapturingSerializer {
    static RS: slog::RecordStatic<'static> = slog::record_static!(slog::Level::Info, "");
    let mut serializer = CapturingSerializer::new();
    let args = format_args!("");
    let record = slog::Record::new(&RS, &args, slog::b!());
    value.serialize(&record, key, &mut serializer).unwrap();
    serializer
}

#[derive(Clone, Mask, Serialize)]
struct Customer {
    #[mask(NameCover)]
    name: String,
    #[mask(PhoneCover)]
    phone: String,
    #[mask(EmailCover)]
    email: String,
    tier: u8,
}

fn customer() -> Customer {
    Customer {
        name: "张三丰".into(),
        phone: "13812345678".into(),
        email: "example@gmail.com".into(),
        tier: 2,
    }
}

// ============================================================================
// Masked payloads
// ============================================================================

#[test]
fn test_into_masked_json_simple_struct() {
    let masked = customer().into_masked_json();

    let serializer = serialize_to_capture(&masked, "customer");
    assert_eq!(
        serializer.json("customer"),
        json!({
            "name": "张*丰",
            "phone": "138****5678",
            "email": "e*****e@gmail.com",
            "tier": 2,
        })
    );
}

#[test]
fn test_as_json_matches_logged_value() {
    let masked = customer().into_masked_json();
    let serializer = serialize_to_capture(&masked, "customer");

    assert_eq!(&serializer.json("customer"), masked.as_json());
}

#[test]
fn test_masked_json_is_emitted_as_nested_value() {
    let masked = customer().into_masked_json();
    let serializer = serialize_to_capture(&masked, "customer");
    assert!(matches!(
        serializer.get("customer"),
        Some(CapturedValue::Serde(_))
    ));

    let serializer = serialize_to_capture(&"13812345678", "raw");
    assert_eq!(
        serializer.get("raw"),
        Some(CapturedValue::Str("13812345678".into()))
    );

    let serializer = serialize_to_capture(&format_args!("{}", 7), "count");
    assert_eq!(
        serializer.get("count"),
        Some(CapturedValue::Scalar("7".into()))
    );
}

#[test]
fn test_into_masked_json_nested_and_collections() {
    #[derive(Mask, Serialize)]
    struct Account {
        owner: Customer,
        contacts: Vec<Customer>,
        #[mask(PhoneCover)]
        backup_phone: Option<String>,
    }

    let account = Account {
        owner: customer(),
        contacts: vec![customer()],
        backup_phone: None,
    };

    let serializer = serialize_to_capture(&account.into_masked_json(), "account");
    let json = serializer.json("account");

    assert_eq!(json["owner"]["phone"], "138****5678");
    assert_eq!(json["contacts"][0]["email"], "e*****e@gmail.com");
    assert_eq!(json["backup_phone"], JsonValue::Null);
}

#[test]
fn test_into_masked_json_with_engine() {
    struct Stars;

    impl Algorithm for Stars {
        fn mask(&self, content: &str) -> String {
            "*".repeat(content.chars().count())
        }

        fn construct() -> Result<Self, ConstructError> {
            Ok(Self)
        }
    }

    let engine = MaskingEngine::builder()
        .register_as::<PhoneCover>(Arc::new(Stars))
        .build();

    let masked = customer().into_masked_json_with(&engine);
    assert_eq!(masked.as_json()["phone"], "***********");
    assert_eq!(masked.as_json()["name"], "张*丰");
}

// ============================================================================
// Failure placeholders
// ============================================================================

#[test]
fn test_masking_failure_logs_placeholder() {
    struct Unavailable;

    impl Algorithm for Unavailable {
        fn mask(&self, content: &str) -> String {
            content.to_owned()
        }

        fn construct() -> Result<Self, ConstructError> {
            Err(ConstructError::new("no key"))
        }
    }

    #[derive(Mask, Serialize)]
    struct Vault {
        #[mask(Unavailable)]
        secret: String,
    }

    let engine = MaskingEngine::builder()
        .default_algorithm::<Unavailable>()
        .build();
    let vault = Vault {
        secret: "plain".into(),
    };

    let serializer = serialize_to_capture(&vault.into_masked_json_with(&engine), "vault");
    assert_eq!(serializer.json("vault"), JsonValue::String(MASK_FAILED.into()));
}

#[test]
fn test_serialization_failure_logs_placeholder() {
    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not today"))
        }
    }

    #[derive(Mask, Serialize)]
    struct Report {
        #[mask(PhoneCover)]
        phone: String,
        #[mask(skip)]
        attachment: Unserializable,
    }

    let report = Report {
        phone: "13812345678".into(),
        attachment: Unserializable,
    };

    let masked = report.into_masked_json();
    assert_eq!(masked.as_json(), &JsonValue::String(SERIALIZE_FAILED.into()));
}
