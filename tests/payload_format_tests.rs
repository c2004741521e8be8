//! Tests for form-to-payload string formatting.
//!
//! The formats themselves (`tel:`, `SMSTO:`, `mailto:`, `WIFI:`) are the
//! standard conventions; these tests pin the exact strings the generator
//! hands to the encoder.

use proptest::prelude::*;
use qrdesk::services::generator::{
    GenerateError, GeneratorService, QrPayload, RenderOptions, WifiSecurity,
};

#[test]
fn test_full_wifi_payload() {
    let generator = GeneratorService::new();
    let payload = QrPayload::Wifi {
        ssid: "HomeNet".to_string(),
        password: "hunter2".to_string(),
        security: WifiSecurity::Wpa,
        hidden: false,
    };
    assert_eq!(
        generator.payload_string(&payload).unwrap(),
        "WIFI:T:WPA;S:HomeNet;P:hunter2;;"
    );
}

#[test]
fn test_wep_token() {
    let generator = GeneratorService::new();
    let payload = QrPayload::Wifi {
        ssid: "Legacy".to_string(),
        password: "abc".to_string(),
        security: WifiSecurity::Wep,
        hidden: false,
    };
    assert!(generator
        .payload_string(&payload)
        .unwrap()
        .starts_with("WIFI:T:WEP;"));
}

#[test]
fn test_email_full_form() {
    let generator = GeneratorService::new();
    let payload = QrPayload::Email {
        address: "dev@example.com".to_string(),
        subject: "Bug report".to_string(),
        body: "Steps: 1 & 2".to_string(),
    };
    assert_eq!(
        generator.payload_string(&payload).unwrap(),
        "mailto:dev@example.com?subject=Bug%20report&body=Steps%3A%201%20%26%202"
    );
}

#[test]
fn test_empty_variants_all_rejected() {
    let generator = GeneratorService::new();
    let empties = [
        QrPayload::Text("  ".to_string()),
        QrPayload::Url("".to_string()),
        QrPayload::Phone("---".to_string()),
        QrPayload::Sms {
            number: "abc".to_string(),
            message: "hi".to_string(),
        },
        QrPayload::Email {
            address: "".to_string(),
            subject: "s".to_string(),
            body: "b".to_string(),
        },
        QrPayload::Wifi {
            ssid: "".to_string(),
            password: "p".to_string(),
            security: WifiSecurity::Wpa,
            hidden: false,
        },
    ];

    for payload in empties {
        assert!(
            matches!(
                generator.payload_string(&payload),
                Err(GenerateError::EmptyInput)
            ),
            "expected EmptyInput for {payload:?}"
        );
    }
}

#[test]
fn test_generated_symbol_survives_decode() {
    // The rendered symbol must round-trip through the decoder used by the
    // scan paths.
    let generator = GeneratorService::new();
    let decoder = qrdesk::services::decoder::RqrrDecoder::new();
    use qrdesk::services::decoder::FrameDecoder;

    let image = generator
        .render(
            &QrPayload::Sms {
                number: "+15550100".to_string(),
                message: "ping".to_string(),
            },
            &RenderOptions::default(),
        )
        .unwrap();
    let gray = image.to_luma8();

    let decoded = decoder
        .decode(gray.as_raw(), gray.width(), gray.height())
        .expect("generated symbol did not decode");
    assert_eq!(decoded, "SMSTO:+15550100:ping");
}

proptest! {
    /// Any phone input either produces a `tel:` payload containing only
    /// dialable characters, or is rejected as empty.
    #[test]
    fn prop_phone_payload_is_dialable(input in ".{0,40}") {
        let generator = GeneratorService::new();
        match generator.payload_string(&QrPayload::Phone(input)) {
            Ok(payload) => {
                let number = payload.strip_prefix("tel:").expect("missing tel: prefix");
                prop_assert!(!number.is_empty());
                prop_assert!(number
                    .chars()
                    .all(|c| c.is_ascii_digit() || matches!(c, '+' | '#' | '*')));
            }
            Err(GenerateError::EmptyInput) => {}
            Err(e) => prop_assert!(false, "unexpected error: {e}"),
        }
    }

    /// Wi-Fi payloads never leak an unescaped structural character from the
    /// SSID: every `; , :` inside the SSID arrives backslash-escaped.
    #[test]
    fn prop_wifi_ssid_always_escaped(ssid in "[a-zA-Z0-9;:,\\\\]{1,20}") {
        let generator = GeneratorService::new();
        let payload = generator
            .payload_string(&QrPayload::Wifi {
                ssid: ssid.clone(),
                password: String::new(),
                security: WifiSecurity::None,
                hidden: false,
            })
            .unwrap();

        let inner = payload
            .strip_prefix("WIFI:T:nopass;S:")
            .and_then(|s| s.strip_suffix(";;"))
            .expect("unexpected WIFI payload shape");

        // Undo the escaping; the original SSID must come back exactly.
        let mut unescaped = String::new();
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                if let Some(next) = chars.next() {
                    unescaped.push(next);
                }
            } else {
                unescaped.push(c);
            }
        }
        prop_assert_eq!(unescaped, ssid);
    }

    /// Sanitizing is idempotent.
    #[test]
    fn prop_sanitize_number_idempotent(input in ".{0,40}") {
        let generator = GeneratorService::new();
        let once = generator.sanitize_number(&input);
        let twice = generator.sanitize_number(&once);
        prop_assert_eq!(once, twice);
    }
}
