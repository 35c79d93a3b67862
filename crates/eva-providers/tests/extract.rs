use eva_core::models::companion::{FALLBACK_FIRST_MESSAGE, FALLBACK_PERSONALITY};
use eva_providers::error::ProviderError;
use eva_providers::extract::{extract_json_block, parse_persona};

#[test]
fn fenced_block_is_preferred() {
    let text = "Sure! {not this}\n```json\n{\"a\": 1}\n```\nEnjoy {or this}";
    assert_eq!(extract_json_block(text), Some("{\"a\": 1}"));
}

#[test]
fn bare_object_is_found_between_outer_braces() {
    let text = "Here you go: {\"a\": {\"b\": 2}} hope it helps";
    assert_eq!(extract_json_block(text), Some("{\"a\": {\"b\": 2}}"));
}

#[test]
fn no_object_yields_none() {
    assert_eq!(extract_json_block("no json here"), None);
    assert_eq!(extract_json_block("} backwards {"), None);
}

#[test]
fn persona_with_trait_list_is_joined() {
    let text = r#"```json
{
  "appearance": "Tall with short red hair",
  "personality": ["witty", "bold", "kind"],
  "firstMessage": "Hey you!"
}
```"#;

    let persona = parse_persona(text).expect("persona");
    assert_eq!(persona.appearance, "Tall with short red hair");
    assert_eq!(persona.personality, "witty, bold, kind");
    assert_eq!(persona.first_message, "Hey you!");
}

#[test]
fn persona_with_trait_string_is_kept() {
    let text = r#"{"appearance": "Curly blonde hair", "personality": "Calm, curious", "firstMessage": "Hi"}"#;
    let persona = parse_persona(text).expect("persona");
    assert_eq!(persona.personality, "Calm, curious");
}

#[test]
fn persona_missing_optional_fields_takes_fallbacks() {
    let persona = parse_persona(r#"{"appearance": "Green eyes"}"#).expect("persona");
    assert_eq!(persona.personality, FALLBACK_PERSONALITY);
    assert_eq!(persona.first_message, FALLBACK_FIRST_MESSAGE);
}

#[test]
fn malformed_persona_is_a_parse_error() {
    for text in ["not json at all", "{\"appearance\": }", r#"{"personality": "shy"}"#] {
        let err = parse_persona(text).unwrap_err();
        assert!(matches!(err, ProviderError::ResponseParse(_)), "{text}");
    }
}
