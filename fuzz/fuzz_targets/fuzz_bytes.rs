#![no_main]

use libfuzzer_sys::fuzz_target;
use hoap::{ParseConfig, Parser, WatchedTagNode, WatchedTags};

fuzz_target!(|data: &[u8]| {
    let tags = WatchedTags::new(
        "1",
        WatchedTagNode::element(
            "a",
            [
                WatchedTagNode::element("b", [WatchedTagNode::leaf("c")]),
                WatchedTagNode::leaf("d"),
            ],
        ),
    );
    let Ok(parser) = Parser::new(&tags) else {
        return;
    };

    // Arbitrary bytes may fail, but must never panic.
    let _ = parser.parse_slice(data);
    let _ = parser
        .clone()
        .with_config(ParseConfig::new().strict())
        .parse_chunks(data.chunks(3));
});
