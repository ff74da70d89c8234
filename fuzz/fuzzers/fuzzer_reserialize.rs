#![no_main]
use libfuzzer_sys::fuzz_target;

use dnswire::{DnsPacket, DnsProtocol};

// Every record extracted from arbitrary bytes must survive reserialization.
fuzz_target!(|data: &[u8]| {
    let mut packet = match DnsPacket::from_wire(DnsProtocol::Dns, data.to_vec()) {
        Ok(packet) => packet,
        Err(_) => return,
    };
    if packet.extract().is_err() {
        return;
    }
    let mut rebuilt = DnsPacket::new(DnsProtocol::Dns, 0);
    for key in packet.question() {
        let _ = rebuilt.append_key(key);
    }
    for item in packet.answer() {
        let _ = rebuilt.append_rr(&item.rr);
    }
});
