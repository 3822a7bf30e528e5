use crate::models::PaymentArtifact;
use qrcode::QrCode;
use qrcode::render::{svg, unicode};

const IMAGE_EXTENSIONS: [&str; 6] = [".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg"];

/// How the payment step presents the means to pay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentDisplay {
    /// Ready-made picture: a data URI or an image URL.
    Image { source: String },
    /// Text to encode as a QR code on our side.
    Code { payload: String },
    /// Nothing usable; payment cannot be confirmed.
    Unavailable,
}

impl PaymentDisplay {
    /// Picks the first usable candidate: embedded image, payment string,
    /// then payment URL.
    pub fn resolve(artifact: &PaymentArtifact) -> Self {
        if let Some(image) = non_empty(&artifact.qr_image) {
            return PaymentDisplay::Image {
                source: image.to_string(),
            };
        }

        if let Some(payload) = non_empty(&artifact.qr_string) {
            if encodable(payload) {
                return PaymentDisplay::Code {
                    payload: payload.to_string(),
                };
            }
            log::warn!("Payment string cannot be encoded as a QR code, trying the URL");
        }

        if let Some(url) = non_empty(&artifact.qr_url) {
            if is_image_like(url) {
                return PaymentDisplay::Image {
                    source: url.to_string(),
                };
            }
            if is_http_url(url) && encodable(url) {
                return PaymentDisplay::Code {
                    payload: url.to_string(),
                };
            }
            log::warn!("Ignoring unusable payment URL {url}");
        }

        PaymentDisplay::Unavailable
    }

    pub fn is_usable(&self) -> bool {
        !matches!(self, PaymentDisplay::Unavailable)
    }

    /// QR code drawn with half-block characters, for the terminal.
    pub fn render_terminal(&self) -> Option<String> {
        match self {
            PaymentDisplay::Code { payload } => {
                let code = QrCode::new(payload.as_bytes()).ok()?;
                Some(
                    code.render::<unicode::Dense1x2>()
                        .dark_color(unicode::Dense1x2::Light)
                        .light_color(unicode::Dense1x2::Dark)
                        .build(),
                )
            }
            _ => None,
        }
    }

    pub fn render_svg(&self) -> Option<String> {
        match self {
            PaymentDisplay::Code { payload } => {
                let code = QrCode::new(payload.as_bytes()).ok()?;
                Some(
                    code.render::<svg::Color>()
                        .min_dimensions(256, 256)
                        .dark_color(svg::Color("#000000"))
                        .light_color(svg::Color("#ffffff"))
                        .build(),
                )
            }
            _ => None,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn encodable(payload: &str) -> bool {
    QrCode::new(payload.as_bytes()).is_ok()
}

fn is_http_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    (lower.starts_with("http://") || lower.starts_with("https://")) && lower.len() > "https://".len()
}

fn is_image_like(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("data:image/") {
        return true;
    }
    if !is_http_url(&lower) {
        return false;
    }
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
