//! Terminal rendering of transcript entries.

use std::fmt::{self, Write};

use storefront_core::{DisplayMessage, MessageKind, ProductRef};

pub const PENDING_INDICATOR: &str = "🤖 ...";

/// Render one message as terminal text.
///
/// Bullet lines are indented one level deeper than plain lines; product
/// cards follow the narrative. `base_url` prefixes the product detail path.
pub fn render_message(
    message: &DisplayMessage,
    base_url: Option<&str>,
) -> Result<String, fmt::Error> {
    let mut out = String::from(match message.kind {
        MessageKind::User => "🧑 Bạn:",
        MessageKind::Assistant => "🤖 Trợ lý:",
        MessageKind::Error => "⚠️  Lỗi:",
    });

    for line in &message.text {
        let indent = if line.bullet { "    " } else { "  " };
        write!(out, "\n{indent}{}", line.content)?;
    }

    for product in &message.products {
        write!(out, "\n{}", render_product(product, base_url))?;
    }

    Ok(out)
}

fn render_product(product: &ProductRef, base_url: Option<&str>) -> String {
    let link = format!(
        "{}{}",
        base_url.unwrap_or("").trim_end_matches('/'),
        product.detail_path()
    );
    format!(
        "  🛍  {}\n      Ảnh: {}\n      Xem: {link}",
        product.display_name, product.image_url
    )
}
