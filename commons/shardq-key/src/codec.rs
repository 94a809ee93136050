//! Canonical order-preserving byte encoding for shard key values.
//!
//! Signed integers and time ticks are emitted big-endian with the sign
//! bit flipped, so unsigned lexicographic comparison of the encoded
//! bytes matches the native signed ordering. Plain two's-complement
//! big-endian would sort every negative value after the non-negative
//! ones; the flip remaps the boundary.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, FixedOffset, TimeDelta};
use uuid::Uuid;

use crate::{
    error::{KeyError, KeyResult},
    key_type::ShardKeyType,
    value::ShardKeyValue,
};

const SIGN_FLIP_32: u32 = 1 << 31;
const SIGN_FLIP_64: u64 = 1 << 63;

pub(crate) const fn order_encode_i32(v: i32) -> [u8; 4] {
    ((v as u32) ^ SIGN_FLIP_32).to_be_bytes()
}

pub(crate) const fn order_decode_i32(raw: [u8; 4]) -> i32 {
    (u32::from_be_bytes(raw) ^ SIGN_FLIP_32) as i32
}

pub(crate) const fn order_encode_i64(v: i64) -> [u8; 8] {
    ((v as u64) ^ SIGN_FLIP_64).to_be_bytes()
}

pub(crate) const fn order_decode_i64(raw: [u8; 8]) -> i64 {
    (u64::from_be_bytes(raw) ^ SIGN_FLIP_64) as i64
}

/// Encode a native value into its canonical byte form.
///
/// Fails with [`KeyError::TypeMismatch`] when the value's variant does
/// not correspond to the declared type, and with
/// [`KeyError::LengthViolation`] when a binary payload exceeds the
/// declared maximum.
pub fn encode(key_type: ShardKeyType, value: &ShardKeyValue) -> KeyResult<Bytes> {
    match (key_type, value) {
        (ShardKeyType::None, ShardKeyValue::None) => Ok(Bytes::new()),
        (ShardKeyType::Int32, ShardKeyValue::Int32(v)) => {
            Ok(Bytes::copy_from_slice(&order_encode_i32(*v)))
        }
        (ShardKeyType::Int64, ShardKeyValue::Int64(v)) => {
            Ok(Bytes::copy_from_slice(&order_encode_i64(*v)))
        }
        (ShardKeyType::Guid, ShardKeyValue::Guid(g)) => {
            Ok(Bytes::copy_from_slice(g.as_bytes()))
        }
        (ShardKeyType::Binary, ShardKeyValue::Binary(b)) => {
            if b.len() > ShardKeyType::MAX_BINARY_LEN {
                return Err(KeyError::LengthViolation {
                    len: b.len(),
                    max: ShardKeyType::MAX_BINARY_LEN,
                });
            }
            Ok(b.clone())
        }
        (ShardKeyType::DateTime, ShardKeyValue::DateTime(dt)) => {
            let ticks = dt
                .timestamp_nanos_opt()
                .ok_or(KeyError::ValueOutOfRange(ShardKeyType::DateTime))?;
            Ok(Bytes::copy_from_slice(&order_encode_i64(ticks)))
        }
        (ShardKeyType::TimeSpan, ShardKeyValue::TimeSpan(td)) => {
            let ticks = td
                .num_nanoseconds()
                .ok_or(KeyError::ValueOutOfRange(ShardKeyType::TimeSpan))?;
            Ok(Bytes::copy_from_slice(&order_encode_i64(ticks)))
        }
        (ShardKeyType::DateTimeOffset, ShardKeyValue::DateTimeOffset(dto)) => {
            let ticks = dto
                .timestamp_nanos_opt()
                .ok_or(KeyError::ValueOutOfRange(ShardKeyType::DateTimeOffset))?;
            // UTC instant first; the offset only breaks ties, so byte
            // order still sorts by absolute time.
            let offset = i64::from(dto.offset().local_minus_utc());
            let mut buf = BytesMut::with_capacity(16);
            buf.put_slice(&order_encode_i64(ticks));
            buf.put_slice(&order_encode_i64(offset));
            Ok(buf.freeze())
        }
        (expected, v) => Err(KeyError::TypeMismatch {
            expected,
            actual: v.variant_name(),
        }),
    }
}

/// Decode a canonical byte payload back into the native value.
///
/// Fails with [`KeyError::MalformedKey`] when the payload length does
/// not match the type's contract or an embedded field cannot be
/// reconstructed.
pub fn decode(key_type: ShardKeyType, raw: &[u8]) -> KeyResult<ShardKeyValue> {
    match key_type {
        ShardKeyType::None => {
            if raw.is_empty() {
                Ok(ShardKeyValue::None)
            } else {
                Err(KeyError::bad_len(key_type, 0, raw.len()))
            }
        }
        ShardKeyType::Int32 => {
            Ok(ShardKeyValue::Int32(order_decode_i32(fixed(key_type, raw)?)))
        }
        ShardKeyType::Int64 => {
            Ok(ShardKeyValue::Int64(order_decode_i64(fixed(key_type, raw)?)))
        }
        ShardKeyType::Guid => {
            Ok(ShardKeyValue::Guid(Uuid::from_bytes(fixed(key_type, raw)?)))
        }
        ShardKeyType::Binary => {
            if raw.len() > ShardKeyType::MAX_BINARY_LEN {
                return Err(KeyError::malformed(
                    key_type,
                    format!(
                        "{} bytes exceeds the {}-byte maximum",
                        raw.len(),
                        ShardKeyType::MAX_BINARY_LEN
                    ),
                ));
            }
            Ok(ShardKeyValue::Binary(Bytes::copy_from_slice(raw)))
        }
        ShardKeyType::DateTime => {
            let ticks = order_decode_i64(fixed(key_type, raw)?);
            Ok(ShardKeyValue::DateTime(DateTime::from_timestamp_nanos(
                ticks,
            )))
        }
        ShardKeyType::TimeSpan => {
            let ticks = order_decode_i64(fixed(key_type, raw)?);
            Ok(ShardKeyValue::TimeSpan(TimeDelta::nanoseconds(ticks)))
        }
        ShardKeyType::DateTimeOffset => {
            if raw.len() != 16 {
                return Err(KeyError::bad_len(key_type, 16, raw.len()));
            }
            let ticks = order_decode_i64(fixed(key_type, &raw[..8])?);
            let offset_secs = order_decode_i64(fixed(key_type, &raw[8..])?);
            let offset = i32::try_from(offset_secs)
                .ok()
                .and_then(FixedOffset::east_opt)
                .ok_or_else(|| {
                    KeyError::malformed(
                        key_type,
                        format!("unrepresentable utc offset of {offset_secs} seconds"),
                    )
                })?;
            Ok(ShardKeyValue::DateTimeOffset(
                DateTime::from_timestamp_nanos(ticks).with_timezone(&offset),
            ))
        }
    }
}

fn fixed<const N: usize>(key_type: ShardKeyType, raw: &[u8]) -> KeyResult<[u8; N]> {
    raw.try_into()
        .map_err(|_| KeyError::bad_len(key_type, N, raw.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn enc(value: &ShardKeyValue) -> Bytes {
        encode(value.key_type(), value).unwrap()
    }

    #[test]
    fn int32_order_survives_the_sign_boundary() {
        let ordered = [
            i32::MIN,
            i32::MIN + 1,
            -1_000_000,
            -1,
            0,
            1,
            1_000_000,
            i32::MAX - 1,
            i32::MAX,
        ];
        let encoded: Vec<Bytes> =
            ordered.iter().map(|v| enc(&(*v).into())).collect();
        for pair in encoded.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn int64_order_survives_the_sign_boundary() {
        let ordered = [i64::MIN, -2, -1, 0, 1, 2, i64::MAX];
        let encoded: Vec<Bytes> =
            ordered.iter().map(|v| enc(&(*v).into())).collect();
        for pair in encoded.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn int64_fuzz_order_matches_native_order() {
        for _ in 0..1_000 {
            let a: i64 = rand::random();
            let b: i64 = rand::random();
            let (ea, eb) = (enc(&a.into()), enc(&b.into()));
            assert_eq!(a.cmp(&b), ea.cmp(&eb), "{a} vs {b}");
        }
    }

    #[test]
    fn round_trip_all_types() {
        let dto = FixedOffset::east_opt(5 * 3600 + 1800)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 1, 12, 30, 45)
            .unwrap();
        let values = [
            ShardKeyValue::None,
            ShardKeyValue::Int32(-42),
            ShardKeyValue::Int64(i64::MIN),
            ShardKeyValue::Guid(Uuid::new_v4()),
            ShardKeyValue::Binary(Bytes::from_static(b"\x00\x01\xff")),
            ShardKeyValue::DateTime(
                Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap(),
            ),
            ShardKeyValue::TimeSpan(TimeDelta::nanoseconds(-1)),
            ShardKeyValue::DateTimeOffset(dto),
        ];
        for value in values {
            let kt = value.key_type();
            let raw = encode(kt, &value).unwrap();
            assert_eq!(decode(kt, &raw).unwrap(), value);
        }
    }

    #[test]
    fn date_time_offset_round_trip_preserves_the_offset() {
        let offset = FixedOffset::west_opt(7 * 3600).unwrap();
        let dto = offset.with_ymd_and_hms(1955, 11, 5, 6, 15, 0).unwrap();
        let raw = encode(ShardKeyType::DateTimeOffset, &dto.into()).unwrap();
        match decode(ShardKeyType::DateTimeOffset, &raw).unwrap() {
            ShardKeyValue::DateTimeOffset(back) => {
                assert_eq!(back, dto);
                assert_eq!(back.offset(), dto.offset());
            }
            other => panic!("unexpected value {other:?}"),
        }
    }

    #[test]
    fn date_time_order_across_day_and_epoch_boundaries() {
        let ordered = [
            Utc.with_ymd_and_hms(1969, 12, 31, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap(),
        ];
        let encoded: Vec<Bytes> = ordered
            .iter()
            .map(|v| enc(&ShardKeyValue::DateTime(*v)))
            .collect();
        for pair in encoded.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn time_span_order_across_zero() {
        let ordered = [
            TimeDelta::days(-2),
            TimeDelta::nanoseconds(-1),
            TimeDelta::zero(),
            TimeDelta::nanoseconds(1),
            TimeDelta::days(2),
        ];
        let encoded: Vec<Bytes> = ordered
            .iter()
            .map(|v| enc(&ShardKeyValue::TimeSpan(*v)))
            .collect();
        for pair in encoded.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn date_time_offset_orders_by_utc_instant_not_local_time() {
        // 09:00+05:00 is 04:00 UTC; 01:00-05:00 is 06:00 UTC. Local
        // clock order and absolute order disagree here.
        let east = FixedOffset::east_opt(5 * 3600).unwrap();
        let west = FixedOffset::west_opt(5 * 3600).unwrap();
        let earlier = east.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();
        let later = west.with_ymd_and_hms(2024, 6, 1, 1, 0, 0).unwrap();
        assert!(earlier < later);

        let (a, b) = (
            enc(&ShardKeyValue::DateTimeOffset(earlier)),
            enc(&ShardKeyValue::DateTimeOffset(later)),
        );
        assert!(a < b);
    }

    #[test]
    fn guid_is_sixteen_canonical_bytes() {
        let guid = Uuid::new_v4();
        let raw = enc(&guid.into());
        assert_eq!(raw.len(), 16);
        assert_eq!(raw.as_ref(), guid.as_bytes());
    }

    #[test]
    fn mismatched_value_is_rejected() {
        let err = encode(ShardKeyType::Int64, &ShardKeyValue::Int32(1)).unwrap_err();
        assert_eq!(
            err,
            KeyError::TypeMismatch {
                expected: ShardKeyType::Int64,
                actual: "Int32",
            }
        );

        for kt in ShardKeyType::ALL {
            if kt == ShardKeyType::Guid {
                continue;
            }
            assert!(matches!(
                encode(kt, &ShardKeyValue::Guid(Uuid::nil())),
                Err(KeyError::TypeMismatch { .. })
            ));
        }
    }

    #[test]
    fn oversized_binary_is_rejected() {
        let payload = Bytes::from(vec![0u8; ShardKeyType::MAX_BINARY_LEN + 1]);
        let err = encode(ShardKeyType::Binary, &payload.into()).unwrap_err();
        assert_eq!(
            err,
            KeyError::LengthViolation {
                len: ShardKeyType::MAX_BINARY_LEN + 1,
                max: ShardKeyType::MAX_BINARY_LEN,
            }
        );

        let max = Bytes::from(vec![0u8; ShardKeyType::MAX_BINARY_LEN]);
        assert!(encode(ShardKeyType::Binary, &max.into()).is_ok());
    }

    #[test]
    fn short_payload_is_malformed() {
        assert!(matches!(
            decode(ShardKeyType::Int64, &[0u8; 7]),
            Err(KeyError::MalformedKey { .. })
        ));
        assert!(matches!(
            decode(ShardKeyType::Guid, &[0u8; 15]),
            Err(KeyError::MalformedKey { .. })
        ));
        assert!(matches!(
            decode(ShardKeyType::None, &[0u8; 1]),
            Err(KeyError::MalformedKey { .. })
        ));
    }

    #[test]
    fn bogus_offset_is_malformed() {
        let mut raw = Vec::with_capacity(16);
        raw.extend_from_slice(&order_encode_i64(0));
        raw.extend_from_slice(&order_encode_i64(100_000));
        assert!(matches!(
            decode(ShardKeyType::DateTimeOffset, &raw),
            Err(KeyError::MalformedKey { .. })
        ));
    }
}
