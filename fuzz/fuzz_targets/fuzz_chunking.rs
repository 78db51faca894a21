#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use hoap::{ParseConfig, Parser, WatchedTagNode, WatchedTags};

const TEXT: &[&str] = &["", " ", "text", "\u{e9}t\u{e9}", "a &amp; b", "\n  "];
const NOISE: &[&str] = &[
    "<itemGroup>x</itemGroup>",
    r#"<other a="1"/>"#,
    "<items2>q</items2>",
    "<named>z</named>",
    "<!-- c -->",
];

#[derive(Debug, Arbitrary)]
enum Piece {
    Text(u8),
    Noise(u8),
    Item {
        id: Option<u8>,
        name: Option<u8>,
        price: Option<(u8, u8)>,
        tag: Option<bool>,
    },
}

#[derive(Debug, Arbitrary)]
struct Document {
    groups: Vec<(bool, Vec<Piece>)>,
    total: Option<u16>,
    cuts: Vec<u16>,
}

impl Document {
    fn render(&self) -> String {
        let mut out = String::from(r#"<Envelope xmlns="urn:x">"#);
        for (quoted, pieces) in &self.groups {
            out.push_str(if *quoted { r#"<items kind="a>b">"# } else { "<items>" });
            for piece in pieces {
                match piece {
                    Piece::Text(i) => out.push_str(TEXT[*i as usize % TEXT.len()]),
                    Piece::Noise(i) => out.push_str(NOISE[*i as usize % NOISE.len()]),
                    Piece::Item {
                        id,
                        name,
                        price,
                        tag,
                    } => {
                        match id {
                            Some(id) => out.push_str(&format!(r#"<item id="{}">"#, id)),
                            None => out.push_str("<item>"),
                        }
                        if let Some(name) = name {
                            out.push_str(&format!("<name>{}</name>", TEXT[*name as usize % TEXT.len()]));
                        }
                        if let Some((units, cents)) = price {
                            out.push_str(&format!(r#"<price cur="EUR">{}.{:02}</price>"#, units, cents % 100));
                        }
                        match tag {
                            Some(true) => out.push_str(r#"<tag v="1"/>"#),
                            Some(false) => out.push_str("<tag>t</tag>"),
                            None => {}
                        }
                        out.push_str("</item>");
                    }
                }
            }
            out.push_str("</items>");
        }
        if let Some(total) = self.total {
            out.push_str(&format!("<total>{}</total>", total));
        }
        out.push_str("</Envelope>");
        out
    }

    fn chunks<'a>(&self, input: &'a [u8]) -> Vec<&'a [u8]> {
        let mut cuts: Vec<usize> = self
            .cuts
            .iter()
            .map(|c| *c as usize % (input.len() + 1))
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut chunks = Vec::with_capacity(cuts.len() + 1);
        let mut from = 0;
        for at in cuts {
            chunks.push(&input[from..at]);
            from = at;
        }
        chunks.push(&input[from..]);
        chunks
    }
}

fn parser() -> Parser {
    let tags = WatchedTags::new(
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
    );
    Parser::new(&tags).unwrap()
}

fuzz_target!(|doc: Document| {
    let input = doc.render();
    let input = input.as_bytes();
    let parser = parser();

    let whole = parser.parse_slice(input).unwrap();
    let chunked = parser.parse_chunks(doc.chunks(input)).unwrap();
    assert_eq!(whole, chunked);

    let strict = parser
        .with_config(ParseConfig::new().strict())
        .parse_slice(input)
        .unwrap();
    assert_eq!(whole, strict);
    assert_eq!(whole.position.close, input.len() as i64);
});
