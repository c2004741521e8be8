//! Payload formatting and QR symbol rendering.
//!
//! Form input is mapped to the conventional payload strings (`tel:`,
//! `SMSTO:`, `mailto:`, `WIFI:`) and handed to the `qrcode` crate; this
//! module owns no symbol math.

use image::{DynamicImage, Luma};
use qrcode::{EcLevel, QrCode};
use regex::Regex;
use std::io::Cursor;
use thiserror::Error;

/// Errors from the generation path.
#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("nothing to encode")]
    EmptyInput,

    #[error("QR encoding failed: {0}")]
    Encode(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Wi-Fi network security mode for `WIFI:` payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WifiSecurity {
    #[default]
    Wpa,
    Wep,
    None,
}

impl WifiSecurity {
    fn token(self) -> &'static str {
        match self {
            WifiSecurity::Wpa => "WPA",
            WifiSecurity::Wep => "WEP",
            WifiSecurity::None => "nopass",
        }
    }
}

/// Structured form input for the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPayload {
    Text(String),
    Url(String),
    Phone(String),
    Sms {
        number: String,
        message: String,
    },
    Email {
        address: String,
        subject: String,
        body: String,
    },
    Wifi {
        ssid: String,
        password: String,
        security: WifiSecurity,
        hidden: bool,
    },
}

/// Rendering options for the generated symbol.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Error correction level. The highest survives the most print damage.
    pub ec_level: EcLevel,
    /// Module size in pixels.
    pub module_size: u32,
    /// Render the standard 4-module quiet zone.
    pub quiet_zone: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            ec_level: EcLevel::H,
            module_size: 8,
            quiet_zone: true,
        }
    }
}

/// Escape a value for embedding in a `WIFI:` payload. The characters
/// `\ ; , : "` carry structure and must be backslash-escaped.
fn escape_wifi(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | ';' | ',' | ':' | '"') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Percent-encode a value for a `mailto:` query component.
fn encode_mailto_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

/// Service turning structured form input into rendered QR symbols.
pub struct GeneratorService {
    /// Strips everything but digits, `+`, `#` and `*` from dial strings.
    non_dial_chars: Regex,
}

impl GeneratorService {
    pub fn new() -> Self {
        Self {
            non_dial_chars: Regex::new(r"[^0-9+#*]").expect("Invalid dial-string regex"),
        }
    }

    /// Reduce a user-entered phone number to dialable characters.
    pub fn sanitize_number(&self, number: &str) -> String {
        self.non_dial_chars.replace_all(number, "").into_owned()
    }

    /// Build the payload string for a form input.
    ///
    /// Returns [`GenerateError::EmptyInput`] when the primary field is blank;
    /// empty input is rejected before the encoder is ever invoked.
    pub fn payload_string(&self, payload: &QrPayload) -> Result<String, GenerateError> {
        let text = match payload {
            QrPayload::Text(text) => text.trim().to_string(),
            QrPayload::Url(url) => {
                let url = url.trim();
                if url.is_empty() {
                    String::new()
                } else if url.contains("://") {
                    url.to_string()
                } else {
                    format!("https://{url}")
                }
            }
            QrPayload::Phone(number) => {
                let number = self.sanitize_number(number);
                if number.is_empty() {
                    String::new()
                } else {
                    format!("tel:{number}")
                }
            }
            QrPayload::Sms { number, message } => {
                let number = self.sanitize_number(number);
                if number.is_empty() {
                    String::new()
                } else {
                    format!("SMSTO:{number}:{message}")
                }
            }
            QrPayload::Email {
                address,
                subject,
                body,
            } => {
                let address = address.trim();
                if address.is_empty() {
                    String::new()
                } else {
                    let mut query = Vec::new();
                    if !subject.is_empty() {
                        query.push(format!("subject={}", encode_mailto_component(subject)));
                    }
                    if !body.is_empty() {
                        query.push(format!("body={}", encode_mailto_component(body)));
                    }
                    if query.is_empty() {
                        format!("mailto:{address}")
                    } else {
                        format!("mailto:{address}?{}", query.join("&"))
                    }
                }
            }
            QrPayload::Wifi {
                ssid,
                password,
                security,
                hidden,
            } => {
                if ssid.is_empty() {
                    String::new()
                } else {
                    let mut out =
                        format!("WIFI:T:{};S:{};", security.token(), escape_wifi(ssid));
                    if *security != WifiSecurity::None && !password.is_empty() {
                        out.push_str(&format!("P:{};", escape_wifi(password)));
                    }
                    if *hidden {
                        out.push_str("H:true;");
                    }
                    out.push(';');
                    out
                }
            }
        };

        if text.is_empty() {
            return Err(GenerateError::EmptyInput);
        }
        Ok(text)
    }

    /// Encode and render a symbol for the given form input.
    pub fn render(
        &self,
        payload: &QrPayload,
        options: &RenderOptions,
    ) -> Result<DynamicImage, GenerateError> {
        let text = self.payload_string(payload)?;

        let code = QrCode::with_error_correction_level(&text, options.ec_level)
            .map_err(|e| GenerateError::Encode(e.to_string()))?;

        let image = code
            .render::<Luma<u8>>()
            .quiet_zone(options.quiet_zone)
            .module_dimensions(options.module_size, options.module_size)
            .build();

        tracing::debug!(
            "Rendered {}x{} symbol for {} chars of payload",
            image.width(),
            image.height(),
            text.len()
        );

        Ok(DynamicImage::ImageLuma8(image))
    }

    /// Render a symbol and encode it as PNG bytes for saving to disk.
    pub fn render_png(
        &self,
        payload: &QrPayload,
        options: &RenderOptions,
    ) -> Result<Vec<u8>, GenerateError> {
        let image = self.render(payload, options)?;
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)?;
        Ok(bytes)
    }
}

impl Default for GeneratorService {
    fn default() -> Self {
        Self::new()
    }
}
