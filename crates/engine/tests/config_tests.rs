mod common;

use std::sync::Arc;
use std::thread;

use common::MockTrust;
use trustpin_engine as tp;

#[test]
fn engine_defaults_values() {
    use tp::EngineDefaults as D;
    assert_eq!(D::PINNING_MODE, tp::PinningMode::None);
    assert!(!D::ALLOW_INVALID_CERTIFICATES);
    assert!(D::VALIDATES_DOMAIN_NAME);
    assert_eq!(D::CERTIFICATE_EXTENSION, "cer");
}

#[test]
fn default_policy_is_secure() {
    let cfg = tp::default_policy().config();
    assert_eq!(cfg.pinning_mode(), tp::PinningMode::None);
    assert!(cfg.pinned_certificates().is_empty());
    assert!(!cfg.allow_invalid_certificates);
    assert!(cfg.validates_domain_name);
    assert_eq!(*cfg, tp::PolicyConfig::default());
}

#[test]
fn pinning_mode_parses_and_displays() {
    for (input, mode) in [
        ("none", tp::PinningMode::None),
        ("public-key", tp::PinningMode::PublicKey),
        ("PublicKey", tp::PinningMode::PublicKey),
        ("certificate", tp::PinningMode::Certificate),
    ] {
        let parsed: tp::PinningMode = input.parse().expect("parse");
        assert_eq!(parsed, mode);
        assert_eq!(parsed.to_string().parse::<tp::PinningMode>().unwrap(), mode);
    }
    let err = "fingerprint".parse::<tp::PinningMode>().unwrap_err();
    assert!(err.to_string().contains("fingerprint"));
}

#[test]
fn pinned_public_keys_follow_pinned_certificates() {
    let a = common::self_signed(common::leaf_params("a", &["a.test"]));
    let b = common::self_signed(common::leaf_params("b", &["b.test"]));

    let mut cfg = tp::PolicyConfig::with_pinned_certificates(
        tp::PinningMode::PublicKey,
        vec![a.der.clone(), b"junk".to_vec()],
    );
    assert_eq!(cfg.pinned_certificates().len(), 2);
    assert_eq!(cfg.pinned_public_keys().len(), 1);
    assert!(cfg.pinned_public_keys().contains(&a.cert.get_key_pair().public_key_der()));

    cfg.set_pinned_certificates(vec![b.der.clone()]);
    assert_eq!(cfg.pinned_public_keys().len(), 1);
    assert!(cfg.pinned_public_keys().contains(&b.cert.get_key_pair().public_key_der()));
    assert_eq!(cfg.pinning_mode(), tp::PinningMode::PublicKey);
}

#[test]
fn duplicate_pins_collapse() {
    let cfg = tp::PolicyConfig::with_pinned_certificates(
        tp::PinningMode::Certificate,
        vec![b"x".to_vec(), b"x".to_vec()],
    );
    assert_eq!(cfg.pinned_certificates().len(), 1);
}

#[test]
fn json_round_trip_preserves_fields() {
    let a = common::self_signed(common::leaf_params("a", &["a.test"]));
    let mut cfg = tp::PolicyConfig::with_pinned_certificates(tp::PinningMode::PublicKey, vec![a.der.clone()]);
    cfg.allow_invalid_certificates = true;
    cfg.validates_domain_name = false;
    let _ = cfg.pinned_public_keys();

    let json = cfg.to_json().expect("to json");
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["pinning_mode"], "public-key");
    assert!(value.get("pinned_public_keys").is_none());

    let restored = tp::PolicyConfig::from_json(&json).expect("from json");
    assert_eq!(restored, cfg);
    assert_eq!(restored.pinned_public_keys(), cfg.pinned_public_keys());
}

#[test]
fn missing_json_fields_take_defaults() {
    let cfg = tp::PolicyConfig::from_json("{}").expect("from json");
    assert_eq!(cfg, tp::PolicyConfig::secure_default());

    let cfg = tp::PolicyConfig::from_json(r#"{"pinning_mode":"certificate"}"#).expect("from json");
    assert_eq!(cfg.pinning_mode(), tp::PinningMode::Certificate);
    assert!(cfg.validates_domain_name);

    assert!(matches!(
        tp::PolicyConfig::from_json("{\"pinning_mode\":\"sometimes\"}"),
        Err(tp::EngineError::Json(_))
    ));
}

#[test]
fn security_policy_serializes_its_snapshot() {
    let policy = tp::policy_with_pinned_certificates(tp::PinningMode::Certificate, vec![b"pin".to_vec()]);
    policy.set_validates_domain_name(false);
    let json = serde_json::to_string(&policy).unwrap();
    let restored: tp::SecurityPolicy = serde_json::from_str(&json).unwrap();
    assert_eq!(*restored.config(), *policy.config());
    assert_eq!(tp::SecurityPolicy::from_json(&policy.to_json().unwrap()).unwrap().config(), policy.config());
}

#[test]
fn clone_is_an_independent_copy() {
    let original = tp::policy_with_pinned_certificates(tp::PinningMode::Certificate, vec![b"pin".to_vec()]);
    let copy = original.clone();
    copy.set_allow_invalid_certificates(true);
    copy.set_pinned_certificates(Vec::new());

    let cfg = original.config();
    assert!(!cfg.allow_invalid_certificates);
    assert_eq!(cfg.pinned_certificates().len(), 1);
    assert_eq!(copy.pinning_mode(), tp::PinningMode::Certificate);
}

#[test]
fn snapshots_are_unaffected_by_later_updates() {
    let policy = tp::default_policy();
    let before = policy.config();
    policy.update(|c| {
        c.allow_invalid_certificates = true;
        c.validates_domain_name = false;
    });
    assert!(!before.allow_invalid_certificates);
    assert!(policy.config().allow_invalid_certificates);

    policy.replace(tp::PolicyConfig::with_pinning_mode(tp::PinningMode::PublicKey));
    assert_eq!(policy.pinning_mode(), tp::PinningMode::PublicKey);
}

#[test]
fn concurrent_evaluations_see_whole_configurations() {
    let pin = b"leaf".to_vec();
    let policy = Arc::new(tp::policy_with_pinned_certificates(tp::PinningMode::Certificate, vec![pin.clone()]));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let policy = Arc::clone(&policy);
            let pin = pin.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    // valid chain holding the pin: trusted under every published config
                    let trust = MockTrust::new(vec![pin.clone()]).pinned_valid();
                    assert!(policy.evaluate(&trust, None));
                }
            })
        })
        .collect();

    for i in 0..200 {
        policy.update(|c| {
            c.allow_invalid_certificates = i % 2 == 0;
            c.set_pinned_certificates(vec![pin.clone(), vec![i as u8]]);
        });
    }

    for r in readers {
        r.join().expect("reader thread");
    }
    assert_eq!(policy.config().pinned_certificates().len(), 2);
}
