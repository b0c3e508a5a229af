//! Encode/decode round-trip properties for the object codec.

#![allow(clippy::unwrap_used)]

use bytes::{Bytes, BytesMut};
use drda_protocol::dss::{DssFlags, DssKind, chain_complete, encode_frame};
use drda_protocol::object::{Param, encode_object, parse_objects};
use proptest::prelude::*;

fn scalar_param() -> impl Strategy<Value = Param> {
    let code_point = 0x0001u16..=0xFFFF;
    prop_oneof![
        (code_point.clone(), "[a-zA-Z0-9 ]{0,40}").prop_map(|(cp, s)| Param::Str(cp, s)),
        (code_point.clone(), any::<u8>()).prop_map(|(cp, v)| Param::U8(cp, v)),
        (code_point.clone(), any::<u16>()).prop_map(|(cp, v)| Param::U16(cp, v)),
        (code_point.clone(), any::<u32>()).prop_map(|(cp, v)| Param::U32(cp, v)),
        (code_point, proptest::collection::vec(any::<u8>(), 0..64))
            .prop_map(|(cp, v)| Param::Bytes(cp, Bytes::from(v))),
    ]
}

fn param() -> impl Strategy<Value = Param> {
    scalar_param().prop_recursive(3, 24, 4, |inner| {
        (0x0001u16..=0xFFFF, proptest::collection::vec(inner, 0..4))
            .prop_map(|(cp, params)| Param::Composite(cp, params))
    })
}

/// The exact parameter byte sequence, independent of tree interpretation.
fn raw_bytes(params: &[Param]) -> Bytes {
    let mut buf = BytesMut::new();
    for param in params {
        param.encode(&mut buf).unwrap();
    }
    buf.freeze()
}

proptest! {
    #[test]
    fn decode_reproduces_code_point_and_parameter_bytes(
        code_point in 0x0001u16..=0xFFFF,
        params in proptest::collection::vec(param(), 0..4),
    ) {
        let object = encode_object(code_point, params.clone()).unwrap();
        let frame = encode_frame(DssKind::Reply, DssFlags::empty(), 1, &object).unwrap();

        prop_assert!(chain_complete(&frame).unwrap());

        let objects = parse_objects(&frame).unwrap();
        prop_assert_eq!(objects.len(), 1);
        prop_assert_eq!(objects[0].code_point, code_point);
        prop_assert_eq!(&objects[0].payload[..], &raw_bytes(&params)[..]);
    }

    #[test]
    fn chain_complete_false_for_all_proper_prefixes(
        payloads in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..32), 1..4),
    ) {
        let mut buf = BytesMut::new();
        let last = payloads.len() - 1;
        for (i, payload) in payloads.iter().enumerate() {
            let flags = if i < last { DssFlags::CHAINED } else { DssFlags::empty() };
            buf.extend_from_slice(&encode_frame(DssKind::Reply, flags, 1, payload).unwrap());
        }

        for cut in 0..buf.len() {
            prop_assert!(!chain_complete(&buf[..cut]).unwrap());
        }
        prop_assert!(chain_complete(&buf).unwrap());
    }
}
