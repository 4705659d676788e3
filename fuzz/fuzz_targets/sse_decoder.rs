#![no_main]

use libfuzzer_sys::fuzz_target;
use mediamill_client::SseDecoder;
use mediamill_types::JobUpdate;

// The decoder must be panic-free on arbitrary bytes, and its output must
// always be safe to hand to the frame parser. Feeding the input in two
// halves exercises the chunk-boundary buffering as well.
fuzz_target!(|data: &[u8]| {
    let mut decoder = SseDecoder::new();
    let mid = data.len() / 2;
    let mut frames = decoder.push(&data[..mid]);
    frames.extend(decoder.push(&data[mid..]));
    for frame in frames {
        let _ = serde_json::from_str::<JobUpdate>(&frame.data);
    }
});
