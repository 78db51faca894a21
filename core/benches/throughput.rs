use divan::{Bencher, black_box};
use hoap_core::{Parser, WatchedTagNode, WatchedTags};

fn main() {
    divan::main();
}

const SAMPLE_ITEMS: &[&str] = &[
    r#"<item id="1"><name>Pen</name><price cur="EUR">1.50</price><note>blue ink</note></item>"#,
    r#"<item id="2"><name>Cup</name><price cur="EUR">3.00</price></item>"#,
    r#"<item id="3"><sku>A-7</sku><name>Notebook, A5</name><price cur="USD">4.25</price></item>"#,
];

fn parser() -> Parser {
    let tags = WatchedTags::new(
        "1",
        WatchedTagNode::element(
            "soap:Envelope",
            [WatchedTagNode::element(
                "items",
                [WatchedTagNode::element(
                    "item",
                    [WatchedTagNode::leaf("name"), WatchedTagNode::leaf("price")],
                )],
            )],
        ),
    );
    match Parser::new(&tags) {
        Ok(parser) => parser,
        Err(err) => panic!("benchmark configuration rejected: {}", err),
    }
}

/// Generate a response body with N items
fn generate_body(count: usize) -> Vec<u8> {
    let mut body = String::with_capacity(count * 90 + 64);
    body.push_str(r#"<soap:Envelope xmlns:soap="urn:x"><items>"#);
    for i in 0..count {
        body.push_str(SAMPLE_ITEMS[i % SAMPLE_ITEMS.len()]);
        body.push('\n');
    }
    body.push_str("</items></soap:Envelope>");
    body.into_bytes()
}

#[divan::bench(
    name = "parse_slice",
    args = [100, 1000, 10_000, 100_000],
)]
fn bench_parse_slice(bencher: Bencher, n: usize) {
    let parser = parser();
    let body = generate_body(n);

    bencher
        .counter(divan::counter::BytesCount::new(body.len()))
        .bench(|| black_box(parser.parse_slice(black_box(&body)).unwrap()));
}

#[divan::bench(
    name = "parse_chunks",
    args = [512, 4096, 65_536],
)]
fn bench_parse_chunks(bencher: Bencher, chunk_size: usize) {
    let parser = parser();
    let body = generate_body(10_000);

    bencher
        .counter(divan::counter::BytesCount::new(body.len()))
        .bench(|| black_box(parser.parse_chunks(black_box(&body).chunks(chunk_size)).unwrap()));
}

#[divan::bench(name = "build_tree")]
fn bench_build_tree() -> Parser {
    parser()
}
