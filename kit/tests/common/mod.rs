//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use hoap::{Parser, WatchedTagNode, WatchedTags};

pub const CATALOG: &str = "<root><items><item><name>Pen</name><price>1.50</price></item>\
<item><name>Cup</name><price>3.00</price></item></items></root>";

pub const SOAP: &str = r#"<?xml version="1.0"?>
<soap:Envelope xmlns:soap="http://www.w3.org/2003/05/soap-envelope">
  <soap:Header><m:Trace>abc</m:Trace></soap:Header>
  <soap:Body>
    <m:GetPriceResponse xmlns:m="https://www.example.org/stock">
      <m:Price>34.5</m:Price>
      <m:Currency>EUR</m:Currency>
      <m:PriceHistory><m:Price>33.1</m:Price></m:PriceHistory>
    </m:GetPriceResponse>
  </soap:Body>
</soap:Envelope>
"#;

pub fn catalog_parser() -> Parser {
    Parser::new(&WatchedTags::new(
        "1",
        WatchedTagNode::element(
            "root",
            [WatchedTagNode::element(
                "items",
                [WatchedTagNode::element(
                    "item",
                    [WatchedTagNode::leaf("name"), WatchedTagNode::leaf("price")],
                )],
            )],
        ),
    ))
    .unwrap()
}

pub fn soap_parser() -> Parser {
    Parser::new(&WatchedTags::new(
        "1",
        WatchedTagNode::element(
            "soap:Envelope",
            [WatchedTagNode::element(
                "soap:Body",
                [WatchedTagNode::element(
                    "m:GetPriceResponse",
                    [WatchedTagNode::leaf("m:Price"), WatchedTagNode::leaf("m:Currency")],
                )],
            )],
        ),
    ))
    .unwrap()
}

pub fn envelope_parser() -> Parser {
    Parser::new(&WatchedTags::new(
        "1",
        WatchedTagNode::element(
            "Envelope",
            [
                WatchedTagNode::element(
                    "items",
                    [WatchedTagNode::element(
                        "item",
                        [
                            WatchedTagNode::leaf("name"),
                            WatchedTagNode::leaf("price"),
                            WatchedTagNode::element("tag", []),
                        ],
                    )],
                ),
                WatchedTagNode::leaf("total"),
            ],
        ),
    ))
    .unwrap()
}

/// Every way of cutting `input` into two chunks.
pub fn two_way_splits(input: &[u8]) -> impl Iterator<Item = [&[u8]; 2]> {
    (0..=input.len()).map(move |i| [&input[..i], &input[i..]])
}
