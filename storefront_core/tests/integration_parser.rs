//! Integration tests for reply parsing.
//!
//! These tests verify that:
//! - A realistic backend reply yields every product card in order
//! - Narrative text survives with bullet hints and no leftover markup
//! - Re-parsing the narrative finds nothing new

use storefront_core::{ContentParser, DisplayMessage, MessageKind};

const REPLY: &str = "Chào bạn! Dưới đây là một số mẫu áo phù hợp:

1. ![Áo sơ mi trắng](http://localhost:3000/uploads/somi.jpg)
**Áo sơ mi trắng**
[Xem chi tiết](http://localhost:3000/product/42)

2. ![Áo polo xanh](http://localhost:3000/uploads/polo.jpg)
**Áo polo xanh**
[Xem chi tiết](http://localhost:3000/product/108)

Ưu điểm:
- Chất liệu cotton thoáng mát
- Dễ phối đồ

![Ảnh lỗi]()
Áo khoác gió
[Xem chi tiết](http://localhost:3000/product/77)

Bạn có thể tham khảo thêm";

#[test]
fn test_numbered_blocks() {
    let parser = ContentParser::with_base_url("http://localhost:3000").unwrap_or_default();
    let parsed = parser.parse(REPLY);

    let ids: Vec<&str> = parsed
        .products
        .iter()
        .map(|p| p.target_id.as_str())
        .collect();
    assert_eq!(ids, vec!["42", "108"]);
    assert!(parsed.text.iter().all(|l| !l.content.contains("/product/42")));

    let message = DisplayMessage::assistant(parsed);
    assert_eq!(message.kind, MessageKind::Assistant);
    assert_eq!(message.products[1].display_name, "Áo polo xanh");
    assert!(message.plain_text().ends_with("Bạn có thể tham khảo thêm"));
}

#[test]
fn test_realistic_reply_without_numbering() {
    let reply = REPLY.replace("1. ", "").replace("2. ", "");
    let parser = ContentParser::with_base_url("http://localhost:3000").unwrap_or_default();
    let parsed = parser.parse(&reply);

    let cards: Vec<(&str, &str, &str)> = parsed
        .products
        .iter()
        .map(|p| {
            (
                p.display_name.as_str(),
                p.image_url.as_str(),
                p.target_id.as_str(),
            )
        })
        .collect();
    assert_eq!(
        cards,
        vec![
            (
                "Áo sơ mi trắng",
                "http://localhost:3000/uploads/somi.jpg",
                "42"
            ),
            (
                "Áo polo xanh",
                "http://localhost:3000/uploads/polo.jpg",
                "108"
            ),
        ]
    );

    let lines: Vec<(&str, bool)> = parsed
        .text
        .iter()
        .map(|l| (l.content.as_str(), l.bullet))
        .collect();
    assert_eq!(
        lines,
        vec![
            ("Chào bạn! Dưới đây là một số mẫu áo phù hợp:", false),
            ("Ưu điểm:", false),
            ("- Chất liệu cotton thoáng mát", true),
            ("- Dễ phối đồ", true),
            ("![Ảnh lỗi]()", false),
            ("Áo khoác gió", false),
            ("[Xem chi tiết](http://localhost:3000/product/77)", false),
            ("Bạn có thể tham khảo thêm", false),
        ]
    );

    let again = parser.parse(&parsed.plain_text());
    assert!(again.products.is_empty());
    assert_eq!(again.text, parsed.text);
}
