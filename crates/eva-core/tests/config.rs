use std::collections::HashMap;
use std::io::Write;

use eva_core::config::{ApiKey, EvaConfig, ProviderKind};
use eva_core::models::media::MediaKind;
use rust_decimal::Decimal;

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_match_published_pricing_and_polling() {
    let config = EvaConfig::default();
    assert_eq!(config.pricing.price_for(MediaKind::Image), Decimal::ONE);
    assert_eq!(config.pricing.price_for(MediaKind::Video), Decimal::TEN);
    assert_eq!(config.pricing.initial_balance, Decimal::ONE_HUNDRED);
    assert!(!config.pricing.refund_on_failure);

    assert_eq!(config.polling.interval(MediaKind::Image).as_secs(), 3);
    assert_eq!(config.polling.max_attempts(MediaKind::Image), 20);
    assert_eq!(config.polling.interval(MediaKind::Video).as_secs(), 10);
    assert_eq!(config.polling.max_attempts(MediaKind::Video), 30);

    assert_eq!(config.providers.image_create, ProviderKind::Kie);
    assert_eq!(config.providers.image_edit, ProviderKind::RunPod);
}

#[test]
fn placeholder_keys_are_unset() {
    assert!(!ApiKey::new("your_kie_api_key_here").is_set());
    assert!(!ApiKey::new("").is_set());
    assert!(!ApiKey::new("   ").is_set());
    assert!(ApiKey::new("sk-live-123").is_set());
    assert_eq!(ApiKey::new("sk-live-123").get(), Some("sk-live-123"));
}

#[test]
fn debug_output_redacts_secrets() {
    let key = ApiKey::new("sk-abcdefghijkl");
    let printed = format!("{key:?}");
    assert!(!printed.contains("abcdefgh"));
    assert!(printed.contains("sk-a...ijkl"));
}

#[test]
fn env_overrides_apply() {
    let config = EvaConfig::from_lookup(lookup(&[
        ("KIE_API_KEY", "kie-secret-value"),
        ("RUNPOD_API_KEY", "your_runpod_api_key_here"),
        ("EVA_IMAGE_PRICE", "2.5"),
        ("EVA_REFUND_ON_FAILURE", "true"),
        ("EVA_IMAGE_CREATE_PROVIDER", "fal"),
        ("EVA_PUBLIC_BASE_URL", "https://eva.example.com"),
        ("EVA_MEDIA_ROOT", "/var/lib/eva/media"),
        ("EVA_LEDGER_PATH", "/var/lib/eva/ledger.json"),
    ]))
    .expect("config");

    assert!(config.credentials.kie.is_set());
    assert!(!config.credentials.runpod.is_set());
    assert_eq!(config.pricing.image_generation, Decimal::new(25, 1));
    assert!(config.pricing.refund_on_failure);
    assert_eq!(config.providers.image_create, ProviderKind::Fal);
    assert_eq!(
        config.media.public_base_url.as_deref(),
        Some("https://eva.example.com")
    );
    assert_eq!(config.media.root.to_str(), Some("/var/lib/eva/media"));
    assert_eq!(config.server.ledger_path.to_str(), Some("/var/lib/eva/ledger.json"));
}

#[test]
fn invalid_override_is_reported() {
    let err = EvaConfig::from_lookup(lookup(&[("EVA_VIDEO_PRICE", "ten")])).unwrap_err();
    assert!(err.to_string().contains("EVA_VIDEO_PRICE"));

    let err = EvaConfig::from_lookup(lookup(&[("EVA_VIDEO_PROVIDER", "midjourney")])).unwrap_err();
    assert!(err.to_string().contains("midjourney"));
}

#[test]
fn json_file_is_loaded_before_env() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    write!(
        file,
        r#"{{
            "pricing": {{ "video_generation": "7" }},
            "credentials": {{ "deepseek": "ds-secret-value" }},
            "polling": {{ "video_max_attempts": 5 }}
        }}"#
    )
    .expect("write");

    let path = file.path().to_string_lossy().to_string();
    let config = EvaConfig::from_lookup(lookup(&[
        ("EVA_CONFIG", path.as_str()),
        ("EVA_IMAGE_PRICE", "3"),
    ]))
    .expect("config");

    assert_eq!(config.pricing.video_generation, Decimal::from(7));
    assert_eq!(config.pricing.image_generation, Decimal::from(3));
    assert!(config.credentials.deepseek.is_set());
    assert_eq!(config.polling.video_max_attempts, 5);
    assert_eq!(config.polling.image_max_attempts, 20);
}
