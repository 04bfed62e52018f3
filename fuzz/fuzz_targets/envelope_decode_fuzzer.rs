//! Fuzz target for envelope frame decoding
//!
//! The session feeds raw network text straight into `Envelope::from_frame`,
//! so the decoder is the first thing a hostile relay or peer can reach.
//!
//! # Invariants
//!
//! - Decoding arbitrary text never panics; failures are structured errors
//! - Successfully decoded envelopes re-encode and decode to the same value

#![no_main]

use libfuzzer_sys::fuzz_target;
use maskroom_proto::Envelope;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(envelope) = Envelope::from_frame(text) else {
        return;
    };

    // Round-trip: anything we accept must survive re-encoding.
    let reencoded = envelope.to_frame();
    let redecoded = Envelope::from_frame(&reencoded).expect("re-encoded frame must decode");
    assert_eq!(redecoded, envelope);
});
