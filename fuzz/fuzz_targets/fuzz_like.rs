#![no_main]
use arbitrary::Arbitrary;
use cblite_mango::query::LikePattern;
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Input {
    pattern: String,
    text: String,
}

fuzz_target!(|input: Input| {
    if input.pattern.len() > 256 || input.text.len() > 1024 { return; }
    let p = LikePattern::new(&input.pattern);
    let _ = p.is_match(&input.text);
    // A pattern with no wildcards or escapes matches only itself.
    if !input.pattern.contains(['%', '_', '\\']) {
        assert_eq!(p.is_match(&input.text), input.pattern == input.text);
    }
});
