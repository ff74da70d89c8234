use std::sync::Arc;

use dnswire::*;

/// Builds a received-looking packet from header counts and a payload.
fn wire_packet(
    protocol: DnsProtocol,
    flags: u16,
    qdcount: u16,
    ancount: u16,
    nscount: u16,
    arcount: u16,
    payload: &[u8],
) -> DnsPacket {
    let mut data = Vec::with_capacity(12 + payload.len());
    data.extend_from_slice(&0x2222u16.to_be_bytes());
    data.extend_from_slice(&flags.to_be_bytes());
    data.extend_from_slice(&qdcount.to_be_bytes());
    data.extend_from_slice(&ancount.to_be_bytes());
    data.extend_from_slice(&nscount.to_be_bytes());
    data.extend_from_slice(&arcount.to_be_bytes());
    data.extend_from_slice(payload);
    DnsPacket::from_wire(protocol, data).unwrap()
}

fn rr_round_trip(rr: DnsResourceRecord) {
    let mut p = DnsPacket::new(DnsProtocol::Dns, 4096);
    p.append_rr(&rr).unwrap();

    let (decoded, cache_flush) = p.read_rr().unwrap();
    assert!(!cache_flush);
    assert_eq!(decoded, rr);
    assert_eq!(p.rindex(), p.size());
}

#[test]
fn test_a_query_wire_format() {
    let mut p = DnsPacket::new(DnsProtocol::Dns, 512);
    p.set_id(0x1234);
    p.set_flags(false, false);
    p.append_key(&DnsResourceKey::new("example.com", DNS_TYPE_A, DNS_CLASS_IN))
        .unwrap();
    p.set_qdcount(1);

    let expected = hex::decode(concat!(
        "123401000001000000000000",
        "076578616d706c6503636f6d0000010001"
    ))
    .unwrap();
    assert_eq!(p.data(), expected.as_slice());

    let mut received = DnsPacket::from_wire(DnsProtocol::Dns, p.data().to_vec()).unwrap();
    assert_eq!(received.validate_query().unwrap(), true);
    received.extract().unwrap();

    assert_eq!(received.question().len(), 1);
    let q = &received.question()[0];
    assert_eq!(q.name, "example.com");
    assert_eq!(q.rr_type, DNS_TYPE_A);
    assert_eq!(q.rr_class, DNS_CLASS_IN);
    assert!(received.answer().is_empty());
    assert!(received.opt().is_none());
}

#[test]
fn test_second_name_compresses_to_four_bytes() {
    let mut p = DnsPacket::new(DnsProtocol::Dns, 512);
    p.append_name("a.example.com.", true, false).unwrap();
    let second = p.append_name("b.example.com.", true, false).unwrap();

    assert_eq!(p.size() - second, 4);
    assert_eq!(&p.data()[second..], &[1, b'b', 0xc0, 14]);
}

#[test]
fn test_compression_never_grows_the_packet() {
    let names = ["mail.example.org", "smtp.example.org", "example.org"];

    let mut compressed = DnsPacket::new(DnsProtocol::Dns, 512);
    let mut flat = DnsPacket::new(DnsProtocol::Dns, 512);
    flat.refuse_compression = true;

    for name in &names {
        compressed.append_name(name, true, false).unwrap();
        flat.append_name(name, true, false).unwrap();
    }
    assert!(compressed.size() < flat.size());

    for name in &names {
        assert_eq!(&compressed.read_name(true).unwrap(), name);
        assert_eq!(&flat.read_name(true).unwrap(), name);
    }
}

#[test]
fn test_opt_in_answer_section_is_rejected() {
    // A single answer RR of type OPT with a root owner.
    let mut p = wire_packet(
        DnsProtocol::Dns,
        DNS_FLAG_QR,
        0,
        1,
        0,
        0,
        &[0, 0, 41, 0x04, 0xd0, 0, 0, 0, 0, 0, 0],
    );
    assert_eq!(
        p.extract(),
        Err(WireError::InvalidPacket(
            "OPT record outside the additional section"
        ))
    );
    assert!(!p.is_extracted());
}

#[test]
fn test_compression_loop_is_rejected() {
    // The question name is a pointer to itself at offset 12.
    let mut p = wire_packet(DnsProtocol::Dns, 0, 1, 0, 0, 0, &[0xc0, 0x0c, 0, 1, 0, 1]);
    let rindex = p.rindex();
    assert!(matches!(
        p.extract(),
        Err(WireError::InvalidName(_))
    ));
    assert_eq!(p.rindex(), rindex);
}

#[test]
fn test_mdns_cache_flush_is_stripped() {
    let payload = [
        3, b'f', b'o', b'o', 0, // owner
        0, 1, // type A
        0x80, 0x01, // class IN with the cache-flush bit
        0, 0, 0, 60, // ttl
        0, 4, 192, 0, 2, 1, // rdata
    ];

    let mut p = wire_packet(DnsProtocol::Mdns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    p.extract().unwrap();
    let item = &p.answer()[0];
    assert_eq!(item.rr.key.rr_class, DNS_CLASS_IN);
    // Cache-flush means the owner is *not* shared.
    assert!(!item.shared_owner);

    // The same bytes over conventional DNS keep the raw class.
    let mut p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    p.extract().unwrap();
    assert_eq!(p.answer()[0].rr.key.rr_class, 0x8001);
    assert!(!p.answer()[0].shared_owner);
}

#[test]
fn test_mdns_shared_owner_without_cache_flush() {
    let payload = [
        3, b'f', b'o', b'o', 0, 0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 192, 0, 2, 1,
    ];
    let mut p = wire_packet(DnsProtocol::Mdns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    p.extract().unwrap();
    assert!(p.answer()[0].shared_owner);
    assert!(p.answer()[0].cacheable);
}

#[test]
fn test_llmnr_reply_needs_one_question() {
    let p = wire_packet(DnsProtocol::Llmnr, DNS_FLAG_QR, 0, 0, 0, 0, &[]);
    assert_eq!(
        p.validate_reply(),
        Err(WireError::InvalidPacket("LLMNR reply with QDCOUNT != 1"))
    );

    // The same packet is an acceptable conventional-DNS reply,
    let p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 0, 0, 0, 0, &[]);
    assert_eq!(p.validate_reply().unwrap(), true);

    // and "not a reply at all" is reported as such, not as an error.
    let p = wire_packet(DnsProtocol::Llmnr, 0, 0, 0, 0, 0, &[]);
    assert_eq!(p.validate_reply().unwrap(), false);
}

#[test]
fn test_validate_query_rules() {
    let q = wire_packet(DnsProtocol::Llmnr, 0, 1, 0, 0, 0, &[0, 0, 1, 0, 1]);
    assert_eq!(q.validate_query().unwrap(), true);

    let q = wire_packet(DnsProtocol::Llmnr, 0, 1, 1, 0, 0, &[0, 0, 1, 0, 1]);
    assert_eq!(
        q.validate_query(),
        Err(WireError::InvalidPacket("LLMNR query with answers"))
    );

    let q = wire_packet(DnsProtocol::Dns, DNS_FLAG_TC, 1, 0, 0, 0, &[0, 0, 1, 0, 1]);
    assert_eq!(
        q.validate_query(),
        Err(WireError::InvalidPacket("Truncated query"))
    );

    let q = wire_packet(DnsProtocol::Mdns, DNS_FLAG_RD, 1, 0, 0, 0, &[0, 0, 1, 0, 1]);
    assert_eq!(
        q.validate_query(),
        Err(WireError::InvalidPacket("Invalid flags in an mDNS query"))
    );

    let reply = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 1, 0, 0, 0, &[0, 0, 1, 0, 1]);
    assert_eq!(reply.validate_query().unwrap(), false);
}

#[test]
fn test_extract_is_idempotent() {
    let payload = [
        3, b'f', b'o', b'o', 0, 0, 1, 0, 1, // question
        3, b'f', b'o', b'o', 0, 0, 1, 0, 1, 0, 0, 0, 60, 0, 4, 192, 0, 2, 1, // answer
    ];
    let mut p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 1, 1, 0, 0, &payload);

    p.extract().unwrap();
    let rindex = p.rindex();
    let first_q = Arc::clone(&p.question()[0]);
    let first_rr = Arc::clone(&p.answer()[0].rr);

    p.extract().unwrap();
    assert_eq!(p.rindex(), rindex);
    assert!(Arc::ptr_eq(&first_q, &p.question()[0]));
    assert!(Arc::ptr_eq(&first_rr, &p.answer()[0].rr));
}

#[test]
fn test_question_rejects_cache_flush_and_bad_types() {
    // mDNS question with the cache-flush bit set.
    let mut p = wire_packet(
        DnsProtocol::Mdns,
        0,
        1,
        0,
        0,
        0,
        &[3, b'f', b'o', b'o', 0, 0, 1, 0x80, 1],
    );
    assert_eq!(
        p.extract(),
        Err(WireError::InvalidPacket("Cache-flush bit on a question"))
    );

    // OPT is not a question type.
    let mut p = wire_packet(DnsProtocol::Dns, 0, 1, 0, 0, 0, &[0, 0, 41, 0, 1]);
    assert_eq!(
        p.extract(),
        Err(WireError::InvalidPacket("Invalid type for a question"))
    );
}

#[test]
fn test_opt_round_trip() {
    let mut p = DnsPacket::new(DnsProtocol::Dns, 512);
    p.set_flags(false, false);
    p.append_opt(1232, true).unwrap();
    p.set_arcount(1);

    p.extract().unwrap();
    let opt = p.opt().expect("no OPT extracted");
    assert_eq!(opt.key.name, "");
    assert_eq!(opt.key.rr_type, DNS_TYPE_OPT);
    assert_eq!(opt.key.rr_class, 1232);
    assert_eq!(opt.ttl, EDNS0_OPT_DO as u32);
    assert_eq!(opt.rdata, DnsRData::Generic(Vec::new()));
    assert!(p.answer().is_empty());
}

#[test]
fn test_duplicate_opt_is_rejected() {
    let mut p = DnsPacket::new(DnsProtocol::Dns, 512);
    p.append_opt(512, false).unwrap();
    p.append_opt(512, false).unwrap();
    p.set_arcount(2);

    assert_eq!(
        p.extract(),
        Err(WireError::InvalidPacket("Duplicate OPT record"))
    );
}

#[test]
fn test_opt_owner_must_be_root() {
    let mut p = wire_packet(
        DnsProtocol::Dns,
        DNS_FLAG_QR,
        0,
        0,
        0,
        1,
        &[1, b'a', 0, 0, 41, 0x04, 0xd0, 0, 0, 0, 0, 0, 0],
    );
    assert_eq!(
        p.extract(),
        Err(WireError::InvalidPacket("OPT owner is not the root"))
    );
}

#[test]
fn test_is_reply_for() {
    let key = DnsResourceKey::new("foo", DNS_TYPE_A, DNS_CLASS_IN);
    let payload = [3, b'f', b'o', b'o', 0, 0, 1, 0, 1];

    let mut reply = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 1, 0, 0, 0, &payload);
    assert_eq!(reply.is_reply_for(&key).unwrap(), true);

    let other = DnsResourceKey::new("bar", DNS_TYPE_A, DNS_CLASS_IN);
    assert_eq!(reply.is_reply_for(&other).unwrap(), false);

    let mut query = wire_packet(DnsProtocol::Dns, 0, 1, 0, 0, 0, &payload);
    assert_eq!(query.is_reply_for(&key).unwrap(), false);
}

// Round trips over every supported rdata type.

#[test]
fn test_round_trip_addresses() {
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("host.example.com", DNS_TYPE_A, DNS_CLASS_IN),
        3600,
        DnsRData::A("192.0.2.1".parse().unwrap()),
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("host.example.com", DNS_TYPE_AAAA, DNS_CLASS_IN),
        3600,
        DnsRData::Aaaa("2001:db8::1".parse().unwrap()),
    ));
}

#[test]
fn test_round_trip_name_targets() {
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", DNS_TYPE_NS, DNS_CLASS_IN),
        86400,
        DnsRData::Ns("ns1.example.com".to_owned()),
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("www.example.com", DNS_TYPE_CNAME, DNS_CLASS_IN),
        300,
        DnsRData::Cname("example.com".to_owned()),
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("old.example.com", DNS_TYPE_DNAME, DNS_CLASS_IN),
        300,
        DnsRData::Dname("new.example.com".to_owned()),
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("1.2.0.192.in-addr.arpa", DNS_TYPE_PTR, DNS_CLASS_IN),
        3600,
        DnsRData::Ptr("host.example.com".to_owned()),
    ));
}

#[test]
fn test_round_trip_soa_mx_srv() {
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", DNS_TYPE_SOA, DNS_CLASS_IN),
        3600,
        DnsRData::Soa {
            mname: "ns1.example.com".to_owned(),
            rname: "hostmaster.example.com".to_owned(),
            serial: 2024010101,
            refresh: 7200,
            retry: 3600,
            expire: 1209600,
            minimum: 300,
        },
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", DNS_TYPE_MX, DNS_CLASS_IN),
        3600,
        DnsRData::Mx {
            priority: 10,
            exchange: "mail.example.com".to_owned(),
        },
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("_sip._tcp.example.com", DNS_TYPE_SRV, DNS_CLASS_IN),
        600,
        DnsRData::Srv {
            priority: 0,
            weight: 5,
            port: 5060,
            name: "sip.example.com".to_owned(),
        },
    ));
}

#[test]
fn test_round_trip_strings() {
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("host.example.com", DNS_TYPE_HINFO, DNS_CLASS_IN),
        3600,
        DnsRData::Hinfo {
            cpu: "ARM64".to_owned(),
            os: "Linux".to_owned(),
        },
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", DNS_TYPE_TXT, DNS_CLASS_IN),
        3600,
        DnsRData::Txt(vec![
            DnsTxtItem(b"v=spf1 -all".to_vec()),
            DnsTxtItem(b"\x00binary\xff".to_vec()),
        ]),
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", DNS_TYPE_SPF, DNS_CLASS_IN),
        3600,
        DnsRData::Spf(vec![DnsTxtItem(b"v=spf1 mx -all".to_vec())]),
    ));
}

#[test]
fn test_round_trip_dnssec() {
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", DNS_TYPE_DS, DNS_CLASS_IN),
        3600,
        DnsRData::Ds {
            key_tag: 12345,
            algorithm: 8,
            digest_type: 2,
            digest: vec![0xab; 32],
        },
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("host.example.com", DNS_TYPE_SSHFP, DNS_CLASS_IN),
        3600,
        DnsRData::Sshfp {
            algorithm: 4,
            fptype: 2,
            fingerprint: vec![0x5a; 32],
        },
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", DNS_TYPE_DNSKEY, DNS_CLASS_IN),
        3600,
        DnsRData::Dnskey {
            flags: 257,
            protocol: 3,
            algorithm: 8,
            key: vec![0x11; 64],
        },
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", DNS_TYPE_RRSIG, DNS_CLASS_IN),
        3600,
        DnsRData::Rrsig {
            type_covered: DNS_TYPE_A,
            algorithm: 8,
            labels: 2,
            original_ttl: 3600,
            expiration: 1700000000,
            inception: 1690000000,
            key_tag: 12345,
            signer: "example.com".to_owned(),
            signature: vec![0x42; 128],
        },
    ));
}

#[test]
fn test_round_trip_nsec() {
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("alfa.example.com", DNS_TYPE_NSEC, DNS_CLASS_IN),
        3600,
        DnsRData::Nsec {
            next_domain_name: "host.example.com".to_owned(),
            types: [DNS_TYPE_A, DNS_TYPE_MX, DNS_TYPE_RRSIG, DNS_TYPE_NSEC]
                .iter()
                .copied()
                .collect(),
        },
    ));
    // An empty bitmap survives the trip too.
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("alfa.example.com", DNS_TYPE_NSEC, DNS_CLASS_IN),
        3600,
        DnsRData::Nsec {
            next_domain_name: "host.example.com".to_owned(),
            types: TypeBitmap::new(),
        },
    ));
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", DNS_TYPE_NSEC3, DNS_CLASS_IN),
        3600,
        DnsRData::Nsec3 {
            algorithm: 1,
            flags: 0,
            iterations: 10,
            salt: vec![0xaa, 0xbb],
            next_hashed_name: vec![0x0c; 20],
            types: [DNS_TYPE_A, DNS_TYPE_SOA].iter().copied().collect(),
        },
    ));
    // A zero-length salt stays legal.
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", DNS_TYPE_NSEC3, DNS_CLASS_IN),
        3600,
        DnsRData::Nsec3 {
            algorithm: 1,
            flags: 1,
            iterations: 0,
            salt: Vec::new(),
            next_hashed_name: vec![0x0c; 20],
            types: TypeBitmap::new(),
        },
    ));
}

#[test]
fn test_round_trip_loc_and_unknown() {
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", DNS_TYPE_LOC, DNS_CLASS_IN),
        3600,
        DnsRData::Loc {
            version: 0,
            size: 0x12,
            horiz_pre: 0x16,
            vert_pre: 0x13,
            latitude: 0x8945_2800,
            longitude: 0x7f3c_9d00,
            altitude: 0x0098_9680,
        },
    ));
    // Unknown type: rdata is carried verbatim.
    rr_round_trip(DnsResourceRecord::new(
        DnsResourceKey::new("example.com", 4242, DNS_CLASS_IN),
        60,
        DnsRData::Generic(vec![1, 2, 3, 4, 5]),
    ));
}

#[test]
fn test_unparseable_loc_reserializes_losslessly() {
    let rdata = [9u8, 1, 2, 3, 4, 5, 6, 7];
    let mut payload = vec![3, b'l', b'o', b'c', 0, 0, 29, 0, 1, 0, 0, 0, 60, 0, 8];
    payload.extend_from_slice(&rdata);

    let mut p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    p.extract().unwrap();
    let rr = Arc::clone(&p.answer()[0].rr);
    assert!(rr.unparseable);
    assert_eq!(rr.rdata, DnsRData::Generic(rdata.to_vec()));

    let mut rebuilt = DnsPacket::new(DnsProtocol::Dns, 512);
    rebuilt.append_rr(&rr).unwrap();
    let (again, _) = rebuilt.read_rr().unwrap();
    assert_eq!(again.rdata, rr.rdata);
}

#[test]
fn test_invalid_loc_precision_is_rejected() {
    // Version 0 but a size octet with a 15 mantissa.
    let payload = [
        3, b'l', b'o', b'c', 0, 0, 29, 0, 1, 0, 0, 0, 60, 0, 16, 0, 0xf0, 0, 0, 0, 0, 0, 0, 0, 0,
        0, 0, 0, 0, 0, 0,
    ];
    let mut p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    assert_eq!(
        p.extract(),
        Err(WireError::InvalidPacket("Invalid LOC size"))
    );
}

#[test]
fn test_empty_txt_decodes_to_single_empty_item() {
    let payload = [3, b't', b'x', b't', 0, 0, 16, 0, 1, 0, 0, 0, 60, 0, 0];
    let mut p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    p.extract().unwrap();
    assert_eq!(
        p.answer()[0].rr.rdata,
        DnsRData::Txt(vec![DnsTxtItem(Vec::new())])
    );

    // And an empty item list encodes as one zero-length string.
    let mut p = DnsPacket::new(DnsProtocol::Dns, 512);
    let (_, rdata_start) = p
        .append_rr(&DnsResourceRecord::new(
            DnsResourceKey::new("txt", DNS_TYPE_TXT, DNS_CLASS_IN),
            60,
            DnsRData::Txt(Vec::new()),
        ))
        .unwrap();
    assert_eq!(&p.data()[rdata_start..], &[0]);
}

#[test]
fn test_mdns_nsec_may_compress_next_name() {
    // Owner "foo", NSEC next name is a pointer back to the owner.
    let payload = [
        3, b'f', b'o', b'o', 0, // owner at offset 12
        0, 47, 0, 1, 0, 0, 0, 60, // type NSEC, class IN, ttl
        0, 5, // rdlength
        0xc0, 0x0c, // next name: pointer to "foo"
        0, 1, 0x40, // window for type A
    ];

    let mut p = wire_packet(DnsProtocol::Mdns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    p.extract().unwrap();
    match &p.answer()[0].rr.rdata {
        DnsRData::Nsec {
            next_domain_name,
            types,
        } => {
            assert_eq!(next_domain_name, "foo");
            assert!(types.contains(DNS_TYPE_A));
        }
        other => panic!("not an NSEC rdata: {:?}", other),
    }

    // Conventional DNS forbids compression there.
    let mut p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    assert!(p.extract().is_err());
}

#[test]
fn test_rdlength_shorter_than_required_prefix() {
    // A DS record claiming 3 rdata bytes; the digest would start past them.
    let payload = [
        0, 0, 43, 0, 1, 0, 0, 0, 60, 0, 3, 0x30, 0x39, 8, 2, 0xab, 0xcd,
    ];
    let mut p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    assert_eq!(
        p.extract(),
        Err(WireError::InvalidPacket("DS rdata too short"))
    );
}

#[test]
fn test_rdlength_mismatch_is_rejected() {
    // An A record claiming five rdata bytes.
    let payload = [0, 0, 1, 0, 1, 0, 0, 0, 60, 0, 5, 192, 0, 2, 1, 0];
    let mut p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    assert_eq!(
        p.extract(),
        Err(WireError::InvalidPacket("Unexpected rdata size"))
    );

    // An A record whose rdata runs past the end of the packet.
    let payload = [0, 0, 1, 0, 1, 0, 0, 0, 60, 0, 20, 192, 0, 2, 1];
    let mut p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    assert_eq!(
        p.extract(),
        Err(WireError::InvalidPacket("Rdata extends past the packet"))
    );
}

#[test]
fn test_invalid_rr_class_and_type() {
    // Class ANY in a record.
    let payload = [0, 0, 1, 0, 255, 0, 0, 0, 60, 0, 4, 192, 0, 2, 1];
    let mut p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    assert_eq!(
        p.extract(),
        Err(WireError::InvalidPacket("Invalid class or type for a record"))
    );

    // Type AXFR in a record.
    let payload = [0, 0, 252, 0, 1, 0, 0, 0, 60, 0, 0];
    let mut p = wire_packet(DnsProtocol::Dns, DNS_FLAG_QR, 0, 1, 0, 0, &payload);
    assert_eq!(
        p.extract(),
        Err(WireError::InvalidPacket("Invalid class or type for a record"))
    );
}

#[test]
fn test_failed_append_leaves_packet_unchanged() {
    let mut p = DnsPacket::new(DnsProtocol::Dns, 512);
    let big = DnsResourceRecord::new(
        DnsResourceKey::new("big.example.com", 4242, DNS_CLASS_IN),
        60,
        DnsRData::Generic(vec![0; 60_000]),
    );
    p.append_rr(&big).unwrap();
    let size = p.size();

    // A second copy cannot fit under the hard packet cap.
    assert_eq!(p.append_rr(&big), Err(WireError::PacketTooLarge));
    assert_eq!(p.size(), size);

    // The rolled-back append also dropped its compression-table entries:
    // the next append still works and points at the surviving name.
    let (start, _) = p
        .append_rr(&DnsResourceRecord::new(
            DnsResourceKey::new("big.example.com", DNS_TYPE_A, DNS_CLASS_IN),
            60,
            DnsRData::A("192.0.2.1".parse().unwrap()),
        ))
        .unwrap();
    assert_eq!(&p.data()[start..start + 2], &[0xc0, 12]);
}

#[test]
fn test_oversized_rdata_is_rejected() {
    let mut p = DnsPacket::new(DnsProtocol::Dns, 512);
    let rr = DnsResourceRecord::new(
        DnsResourceKey::new("x", 4242, DNS_CLASS_IN),
        60,
        DnsRData::Generic(vec![0; 0x1_0000]),
    );
    assert_eq!(p.append_rr(&rr), Err(WireError::PacketTooLarge));
    assert_eq!(p.size(), DNS_PACKET_HEADER_SIZE);
}

#[test]
fn test_canonical_form_rrsig_signer() {
    let mut p = DnsPacket::new(DnsProtocol::Dns, 4096);
    p.canonical_form = true;
    p.refuse_compression = true;
    p.append_rr(&DnsResourceRecord::new(
        DnsResourceKey::new("Example.COM", DNS_TYPE_RRSIG, DNS_CLASS_IN),
        3600,
        DnsRData::Rrsig {
            type_covered: DNS_TYPE_A,
            algorithm: 8,
            labels: 2,
            original_ttl: 3600,
            expiration: 1700000000,
            inception: 1690000000,
            key_tag: 1,
            signer: "Example.COM".to_owned(),
            signature: vec![1],
        },
    ))
    .unwrap();

    // Owner and signer are canonical-form candidates and come out lowercase.
    let wire = p.data();
    let needle = b"\x07example\x03com\x00";
    assert_eq!(
        wire.windows(needle.len()).filter(|w| w == needle).count(),
        2
    );
}

#[test]
fn test_more_chain() {
    let mut first = DnsPacket::new(DnsProtocol::Mdns, 512);
    let mut second = DnsPacket::new(DnsProtocol::Mdns, 512);
    second.set_flags(false, false);
    first.set_flags(false, true);
    first.more = Some(Box::new(second));

    assert!(first.tc());
    let second = first.more.as_ref().unwrap();
    assert!(!second.tc());
    assert!(second.more.is_none());
}

#[test]
fn test_new_query_flags() {
    let q = DnsPacket::new_query(DnsProtocol::Dns, 1500, true);
    assert!(!q.qr());
    assert!(q.rd());
    assert!(q.cd());
    assert!(!q.tc());

    let m = DnsPacket::new_query(DnsProtocol::Mdns, 1500, false);
    assert_eq!(m.flags(), 0);
}
