//! End-to-end tests for the public masking API.
//!
//! These tests exercise the integration of:
//! - `Mask` derive field tables,
//! - directive and preset resolution, and
//! - container traversal for common standard library types.

#![cfg(feature = "algorithms")]

use std::collections::{BTreeMap, BTreeSet, HashMap};

use masking::{
    Algorithm, ConstructError, EmailCover, IdCardCover, Mask, MaskEmail, MaskPhone,
    MaskingEngine, NameCover, PhoneCover, Record, Redact, ScalarValue, DEFAULT_MASK,
};
use pretty_assertions::assert_eq;

#[derive(Clone, Debug, PartialEq, Mask)]
struct Contact {
    #[mask(PhoneCover)]
    phone: String,
    #[mask(EmailCover)]
    email: String,
    nickname: String,
}

fn contact() -> Contact {
    Contact {
        phone: "13812345678".into(),
        email: "example@gmail.com".into(),
        nickname: "neo".into(),
    }
}

#[test]
fn test_redact_masks_directive_fields_only() {
    let masked = contact().redact().unwrap();

    assert_eq!(masked.phone, "138****5678");
    assert_eq!(masked.email, "e*****e@gmail.com");
    assert_eq!(masked.nickname, "neo");
}

#[test]
fn test_redact_in_place_returns_same_value() {
    let mut value = contact();
    let returned: *const Contact = value.redact_in_place().unwrap();
    assert!(std::ptr::eq(returned, &value));
    assert_eq!(value.phone, "138****5678");
}

#[test]
fn test_bare_mask_uses_default_algorithm() {
    #[derive(Mask)]
    struct Credentials {
        #[mask]
        token: String,
        user: String,
    }

    let mut creds = Credentials {
        token: "tok_abcdef".into(),
        user: "alice".into(),
    };
    MaskingEngine::new().redact(&mut creds).unwrap();

    assert_eq!(creds.token, DEFAULT_MASK);
    assert_eq!(creds.user, "alice");
}

#[test]
fn test_presets_supply_directives() {
    #[derive(Mask)]
    struct Subscriber {
        #[mask_preset(MaskPhone)]
        phone: String,
        #[mask_preset(MaskEmail)]
        email: String,
    }

    let mut subscriber = Subscriber {
        phone: "13912345678".into(),
        email: "test@qq.com".into(),
    };
    MaskingEngine::new().redact(&mut subscriber).unwrap();

    assert_eq!(subscriber.phone, "139****5678");
    assert_eq!(subscriber.email, "t**t@qq.com");
}

#[test]
fn test_own_directive_beats_preset() {
    #[derive(Mask)]
    struct Holder {
        #[mask(IdCardCover)]
        #[mask_preset(MaskPhone)]
        id: String,
    }

    let mut holder = Holder {
        id: "110101199001011234".into(),
    };
    MaskingEngine::new().redact(&mut holder).unwrap();

    assert_eq!(holder.id, "110101********1234");
}

#[test]
fn test_nested_records_are_descended() {
    #[derive(Mask)]
    struct Address {
        #[mask(NameCover)]
        recipient: String,
        city: String,
    }

    #[derive(Mask)]
    struct Order {
        id: u64,
        shipping: Address,
        billing: Option<Address>,
        gift: Option<Box<Address>>,
    }

    let address = |name: &str| Address {
        recipient: name.into(),
        city: "Shanghai".into(),
    };
    let mut order = Order {
        id: 7,
        shipping: address("张三丰"),
        billing: Some(address("Smith")),
        gift: Some(Box::new(address("张三"))),
    };
    MaskingEngine::new().redact(&mut order).unwrap();

    assert_eq!(order.id, 7);
    assert_eq!(order.shipping.recipient, "张*丰");
    assert_eq!(order.shipping.city, "Shanghai");
    assert_eq!(order.billing.unwrap().recipient, "S***h");
    assert_eq!(order.gift.unwrap().recipient, "张*");
}

#[test]
fn test_sequences_and_map_values_are_masked() {
    let mut contacts = vec![contact(), contact()];
    MaskingEngine::new().redact(&mut contacts).unwrap();
    assert!(contacts.iter().all(|c| c.phone == "138****5678"));

    let mut by_name: HashMap<String, Contact> = HashMap::new();
    by_name.insert("13812345678".into(), contact());
    MaskingEngine::new().redact(&mut by_name).unwrap();
    let (key, value) = by_name.iter().next().unwrap();
    assert_eq!(key, "13812345678");
    assert_eq!(value.phone, "138****5678");

    let mut ordered: BTreeMap<u32, Vec<Contact>> = BTreeMap::new();
    ordered.insert(1, vec![contact()]);
    MaskingEngine::new().redact(&mut ordered).unwrap();
    assert_eq!(ordered[&1][0].email, "e*****e@gmail.com");
}

#[test]
fn test_nullable_fields() {
    #[derive(Mask)]
    struct Profile {
        #[mask(PhoneCover)]
        mobile: Option<String>,
        #[mask(PhoneCover)]
        backup: Option<String>,
    }

    let mut profile = Profile {
        mobile: Some("13812345678".into()),
        backup: None,
    };
    MaskingEngine::new().redact(&mut profile).unwrap();

    assert_eq!(profile.mobile.as_deref(), Some("138****5678"));
    assert_eq!(profile.backup, None);
}

#[test]
fn test_non_text_leaves_are_left_alone() {
    #[derive(Mask)]
    struct Metrics {
        #[mask]
        visits: u32,
        #[mask]
        active: bool,
        #[mask]
        label: String,
    }

    let mut metrics = Metrics {
        visits: 42,
        active: true,
        label: "daily".into(),
    };
    MaskingEngine::new().redact(&mut metrics).unwrap();

    assert_eq!(metrics.visits, 42);
    assert!(metrics.active);
    assert_eq!(metrics.label, DEFAULT_MASK);
}

#[test]
fn test_tuple_structs_and_enums() {
    #[derive(Mask)]
    struct Phone(#[mask(PhoneCover)] String, u8);

    #[derive(Mask)]
    enum Channel {
        Sms(#[mask(PhoneCover)] String),
        Mail {
            #[mask(EmailCover)]
            address: String,
        },
        Nested(Phone),
        Disabled,
    }

    let mut phone = Phone("13812345678".into(), 1);
    MaskingEngine::new().redact(&mut phone).unwrap();
    assert_eq!(phone.0, "138****5678");

    let mut channels = vec![
        Channel::Sms("13812345678".into()),
        Channel::Mail {
            address: "ab@test.com".into(),
        },
        Channel::Nested(Phone("15912345678".into(), 2)),
        Channel::Disabled,
    ];
    MaskingEngine::new().redact(&mut channels).unwrap();

    let rendered: Vec<String> = channels
        .iter()
        .map(|channel| match channel {
            Channel::Sms(number) => number.clone(),
            Channel::Mail { address } => address.clone(),
            Channel::Nested(phone) => phone.0.clone(),
            Channel::Disabled => String::new(),
        })
        .collect();
    assert_eq!(
        rendered,
        ["138****5678", "a*@test.com", "159****5678", ""]
    );
}

#[test]
fn test_unit_only_enums_are_leaves() {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Mask)]
    enum Status {
        Active,
        Disabled,
    }

    #[derive(Mask)]
    struct Account {
        status: Status,
        history: BTreeSet<Status>,
        #[mask]
        secret: String,
    }

    let mut account = Account {
        status: Status::Disabled,
        history: BTreeSet::from([Status::Active, Status::Disabled]),
        secret: "hunter2".into(),
    };
    MaskingEngine::new().redact(&mut account).unwrap();

    assert_eq!(account.status, Status::Disabled);
    assert_eq!(account.history.len(), 2);
    assert_eq!(account.secret, DEFAULT_MASK);
}

#[test]
fn test_generic_records() {
    #[derive(Mask)]
    struct Envelope<T> {
        #[mask(PhoneCover)]
        sender: String,
        body: T,
        #[mask(skip)]
        cache: std::cell::Cell<u8>,
        _marker: std::marker::PhantomData<std::time::SystemTime>,
    }

    let mut envelope = Envelope {
        sender: "13812345678".into(),
        body: contact(),
        cache: std::cell::Cell::new(3),
        _marker: std::marker::PhantomData,
    };
    MaskingEngine::new().redact(&mut envelope).unwrap();

    assert_eq!(envelope.sender, "138****5678");
    assert_eq!(envelope.body.phone, "138****5678");
    assert_eq!(envelope.cache.get(), 3);
}

#[test]
fn test_custom_algorithm() {
    struct Reverse;

    impl Algorithm for Reverse {
        fn mask(&self, content: &str) -> String {
            content.chars().rev().collect()
        }

        fn construct() -> Result<Self, ConstructError> {
            Ok(Self)
        }
    }

    #[derive(Mask)]
    struct Note {
        #[mask(Reverse)]
        text: String,
    }

    let mut note = Note {
        text: "abc".into(),
    };
    MaskingEngine::new().redact(&mut note).unwrap();
    assert_eq!(note.text, "cba");
}

#[test]
fn test_field_specs_by_name() {
    let engine = MaskingEngine::new();
    let accessor = engine.accessors().get_for::<Contact>("phone").unwrap();
    let mut value = contact();

    assert_eq!(
        accessor.get(&value).unwrap(),
        Some(ScalarValue::Text("13812345678".into()))
    );
    accessor.set_text(&mut value, "replaced").unwrap();
    assert_eq!(value.phone, "replaced");

    let spec = Contact::field_spec("email").unwrap();
    assert_eq!(spec.name(), "email");
    assert!(spec.metadata().directive().is_some());
    assert!(Contact::field_spec("missing").is_none());
}
