#![no_main]
use libfuzzer_sys::fuzz_target;

use dnswire::{DnsPacket, DnsProtocol, DNS_PACKET_HEADER_SIZE};

fuzz_target!(|data: &[u8]| {
    let mut packet = match DnsPacket::from_wire(DnsProtocol::Dns, data.to_vec()) {
        Ok(packet) => packet,
        Err(_) => return,
    };
    let rindex = packet.rindex();
    if packet.read_name(true).is_err() {
        assert_eq!(packet.rindex(), rindex);
    }
    packet.rewind(DNS_PACKET_HEADER_SIZE);
    let _ = packet.read_name(false);
});
