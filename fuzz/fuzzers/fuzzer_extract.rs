#![no_main]
use libfuzzer_sys::fuzz_target;

use dnswire::{DnsPacket, DnsProtocol};

fuzz_target!(|data: &[u8]| {
    for &protocol in &[DnsProtocol::Dns, DnsProtocol::Mdns, DnsProtocol::Llmnr] {
        let mut packet = match DnsPacket::from_wire(protocol, data.to_vec()) {
            Ok(packet) => packet,
            Err(_) => return,
        };
        let _ = packet.validate_reply();
        let _ = packet.validate_query();
        let _ = packet.extract();
    }
});
