//! Property-based tests for packet sizing and buffer strategies
//!
//! These tests use proptest to generate random packets and keys and check
//! that output sizes and contents do not depend on how the output buffer
//! was provided.

use bytes::BytesMut;
use proptest::prelude::*;
use voice_crypto::prelude::*;
use xsalsa20poly1305::{
    aead::{AeadInPlace, KeyInit},
    Nonce, Tag, XSalsa20Poly1305,
};

// Property test strategies

fn scheme_strategy() -> impl Strategy<Value = Scheme> {
    prop_oneof![
        Just(Scheme::Standard),
        Just(Scheme::Suffix),
        Just(Scheme::Lite),
    ]
}

fn deterministic_scheme_strategy() -> impl Strategy<Value = Scheme> {
    prop_oneof![Just(Scheme::Standard), Just(Scheme::Lite)]
}

fn packet_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), RTP_HEADER_SIZE..1500)
}

fn started(key: [u8; KEY_SIZE], scheme: Scheme) -> PacketEncryptor {
    let mut enc = PacketEncryptor::with_scheme(SecretKey::from_bytes(key), scheme);
    enc.start().unwrap();
    enc
}

/// Open a suffix-mode packet with the nonce carried in its trailer.
fn open_suffix(key: &[u8; KEY_SIZE], sealed: &[u8]) -> Option<Vec<u8>> {
    let (body, trailer) = sealed.split_at(sealed.len() - NONCE_SIZE);
    let tag = Tag::clone_from_slice(&body[RTP_HEADER_SIZE..RTP_HEADER_SIZE + TAG_SIZE]);
    let mut plaintext = body[RTP_HEADER_SIZE + TAG_SIZE..].to_vec();

    XSalsa20Poly1305::new(key.into())
        .decrypt_in_place_detached(Nonce::from_slice(trailer), b"", &mut plaintext, &tag)
        .ok()?;
    Some(plaintext)
}

proptest! {
    #[test]
    fn prop_output_length_formula(
        key in any::<[u8; KEY_SIZE]>(),
        scheme in scheme_strategy(),
        input in packet_strategy(),
    ) {
        let mut enc = started(key, scheme);
        let expected = input.len() + overhead_bytes(scheme);
        prop_assert_eq!(enc.required_output_length(input.len()), expected);

        let sealed = enc.encrypt_to_vec(&input).unwrap();
        prop_assert_eq!(sealed.len(), expected);
        prop_assert_eq!(&sealed[..RTP_HEADER_SIZE], &input[..RTP_HEADER_SIZE]);
    }

    #[test]
    fn prop_in_place_matches_copy(
        key in any::<[u8; KEY_SIZE]>(),
        scheme in deterministic_scheme_strategy(),
        input in packet_strategy(),
        warmup in 0usize..4,
    ) {
        let mut copy_enc = started(key, scheme);
        let mut grow_enc = started(key, scheme);
        let mut presized_enc = started(key, scheme);

        // Same number of earlier packets, so the same lite counter.
        for enc in [&mut copy_enc, &mut grow_enc, &mut presized_enc] {
            for _ in 0..warmup {
                enc.encrypt_to_vec(&input).unwrap();
            }
        }

        let mut copied = vec![0u8; copy_enc.required_output_length(input.len())];
        copy_enc.encrypt_into(&input, &mut copied).unwrap();

        let mut grown = BytesMut::from(&input[..]);
        grow_enc.encrypt_packet(&mut grown).unwrap();

        let mut presized = input.clone();
        presized.resize(presized_enc.required_output_length(input.len()), 0);
        presized_enc.encrypt_in_place(&mut presized, input.len()).unwrap();

        prop_assert_eq!(&grown[..], &copied[..]);
        prop_assert_eq!(&presized[..], &copied[..]);
    }

    #[test]
    fn prop_suffix_strategies_open_with_own_trailer(
        key in any::<[u8; KEY_SIZE]>(),
        input in packet_strategy(),
    ) {
        let mut enc = started(key, Scheme::Suffix);
        let output_len = enc.required_output_length(input.len());

        let mut copied = vec![0u8; output_len];
        enc.encrypt_into(&input, &mut copied).unwrap();

        let mut grown = BytesMut::from(&input[..]);
        enc.encrypt_packet(&mut grown).unwrap();

        let mut presized = input.clone();
        presized.resize(output_len, 0);
        enc.encrypt_in_place(&mut presized, input.len()).unwrap();

        for sealed in [&copied[..], &grown[..], &presized[..]] {
            prop_assert_eq!(sealed.len(), input.len() + TAG_SIZE + NONCE_SIZE);
            prop_assert_eq!(&sealed[..RTP_HEADER_SIZE], &input[..RTP_HEADER_SIZE]);
            prop_assert_eq!(open_suffix(&key, sealed), Some(input[RTP_HEADER_SIZE..].to_vec()));
        }
    }

    #[test]
    fn prop_short_packets_rejected(
        scheme in scheme_strategy(),
        input in prop::collection::vec(any::<u8>(), 0..RTP_HEADER_SIZE),
    ) {
        let mut enc = started([0u8; KEY_SIZE], scheme);
        let result = enc.encrypt_to_vec(&input);
        let is_short = matches!(result, Err(EncryptError::ShortPacket { .. }));
        prop_assert!(is_short);
        prop_assert_eq!(enc.lite_counter(), 0);
    }

    #[test]
    fn prop_lite_counter_counts_packets(
        packets in prop::collection::vec(packet_strategy(), 1..20),
    ) {
        let mut enc = started([0x42; KEY_SIZE], Scheme::Lite);
        for (k, input) in packets.iter().enumerate() {
            let sealed = enc.encrypt_to_vec(input).unwrap();
            let tail: [u8; 4] = sealed[sealed.len() - 4..].try_into().unwrap();
            prop_assert_eq!(u32::from_be_bytes(tail), k as u32);
        }
        prop_assert_eq!(enc.lite_counter(), packets.len() as u32);
    }
}
