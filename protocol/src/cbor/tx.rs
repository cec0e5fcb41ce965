//! Whole transactions: `[body, witness_set, is_valid, auxiliary_data]`.
//!
//! Pre-Alonzo transactions have three elements (no validity flag); both
//! shapes are accepted and written back with the same element count. The
//! body and everything after the witness set are raw spans.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};

use super::raw::{write_header, CborError, Reader, MAJOR_ARRAY, MAJOR_MAP};
use super::witness::{WitnessError, WitnessSet};

type Blake2b256 = Blake2b<U32>;

/// A transaction with a mutable witness set and an untouchable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    body: Vec<u8>,
    witness_set: WitnessSet,
    /// Validity flag and auxiliary data, as encoded.
    trailing: Vec<Vec<u8>>,
}

impl Transaction {
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, WitnessError> {
        let mut reader = Reader::new(bytes);
        let offset = reader.position();
        let header = reader.header()?;
        if header.major != MAJOR_ARRAY {
            return Err(CborError::Unexpected {
                offset,
                expected: "transaction array",
            }
            .into());
        }

        let body_offset = reader.position();
        if reader.peek_major()? != MAJOR_MAP {
            return Err(CborError::Unexpected {
                offset: body_offset,
                expected: "transaction body map",
            }
            .into());
        }
        let body = reader.item_span()?.to_vec();
        let witness_set = WitnessSet::read(&mut reader)?;

        let element_count = |n: u64| -> Result<(), WitnessError> {
            if (3..=4).contains(&n) {
                Ok(())
            } else {
                Err(CborError::Unexpected {
                    offset,
                    expected: "transaction with 3 or 4 elements",
                }
                .into())
            }
        };

        let mut trailing = Vec::new();
        match header.arg {
            Some(n) => {
                element_count(n)?;
                for _ in 2..n {
                    trailing.push(reader.item_span()?.to_vec());
                }
            }
            None => {
                while !reader.at_break() {
                    trailing.push(reader.item_span()?.to_vec());
                }
                reader.expect_break()?;
                element_count(2 + trailing.len() as u64)?;
            }
        }
        reader.finish()?;

        Ok(Self {
            body,
            witness_set,
            trailing,
        })
    }

    pub fn from_hex(hex_str: &str) -> Result<Self, TxHexError> {
        let bytes = hex::decode(hex_str)?;
        Ok(Self::from_cbor(&bytes)?)
    }

    /// Re-encodes as a definite-length array. The body bytes are unchanged.
    pub fn to_cbor(&self) -> Result<Vec<u8>, CborError> {
        let witness_set = self.witness_set.to_cbor()?;
        let mut out = Vec::with_capacity(self.body.len() + witness_set.len() + 16);
        write_header(&mut out, MAJOR_ARRAY, 2 + self.trailing.len() as u64);
        out.extend_from_slice(&self.body);
        out.extend_from_slice(&witness_set);
        for item in &self.trailing {
            out.extend_from_slice(item);
        }
        Ok(out)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn witness_set(&self) -> &WitnessSet {
        &self.witness_set
    }

    /// Blake2b-256 of the body bytes. This is what every key signs.
    pub fn hash(&self) -> [u8; 32] {
        Blake2b256::digest(&self.body).into()
    }

    /// The transaction id as the network reports it.
    pub fn id(&self) -> String {
        hex::encode(self.hash())
    }

    /// Verifies and attaches `witnesses`; see [`WitnessSet::add_signatures`].
    pub fn add_signatures(&mut self, witnesses: &WitnessSet) -> Result<usize, WitnessError> {
        let hash = self.hash();
        self.witness_set.add_signatures(witnesses, &hash)
    }
}

/// Either half of decoding a hex-encoded transaction.
#[derive(Debug, thiserror::Error)]
pub enum TxHexError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Witness(#[from] WitnessError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use ed25519_dalek::{Signer, SigningKey};
    use rand::rngs::OsRng;

    // [{0: [], 2: 1_000_000}, {}, true, null]
    const UNSIGNED: [u8; 13] = [
        0x84, 0xa2, 0x00, 0x80, 0x02, 0x1a, 0x00, 0x0f, 0x42, 0x40, 0xa0, 0xf5, 0xf6,
    ];

    fn witness_set_for(tx: &Transaction, key: &SigningKey) -> WitnessSet {
        let hash = tx.hash();
        let mut bytes = vec![0xa1, 0x00, 0x81, 0x82, 0x58, 0x20];
        bytes.extend_from_slice(key.verifying_key().as_bytes());
        bytes.extend_from_slice(&[0x58, 0x40]);
        bytes.extend_from_slice(&key.sign(&hash).to_bytes());
        WitnessSet::from_cbor(&bytes).unwrap()
    }

    #[test]
    fn unsigned_round_trip_is_byte_exact() {
        let tx = Transaction::from_cbor(&UNSIGNED).unwrap();
        assert_eq!(tx.to_cbor().unwrap(), UNSIGNED);
        assert_eq!(tx.body(), &UNSIGNED[1..10]);
    }

    #[test]
    fn id_is_blake2b_of_body() {
        let tx = Transaction::from_cbor(&UNSIGNED).unwrap();
        let expected: [u8; 32] = Blake2b256::digest(&UNSIGNED[1..10]).into();
        assert_eq!(tx.id(), hex::encode(expected));
        assert_eq!(tx.id().len(), 64);
    }

    #[test]
    fn signing_keeps_body_and_id() {
        let key = SigningKey::generate(&mut OsRng);
        let mut tx = Transaction::from_cbor(&UNSIGNED).unwrap();
        let id = tx.id();
        let witnesses = witness_set_for(&tx, &key);

        assert_eq!(tx.add_signatures(&witnesses).unwrap(), 1);
        let signed = tx.to_cbor().unwrap();
        let reparsed = Transaction::from_cbor(&signed).unwrap();

        assert_eq!(reparsed.id(), id);
        assert_eq!(reparsed.body(), &UNSIGNED[1..10]);
        assert_eq!(reparsed.witness_set().vkeys().len(), 1);
        assert_eq!(&signed[signed.len() - 2..], &[0xf5, 0xf6]);
    }

    #[test]
    fn three_element_transactions_are_supported() {
        // [{}, {}, null]
        let bytes = [0x83, 0xa0, 0xa0, 0xf6];
        let tx = Transaction::from_cbor(&bytes).unwrap();
        assert_eq!(tx.to_cbor().unwrap(), bytes);
    }

    #[test]
    fn indefinite_outer_array_is_normalized() {
        let bytes = [0x9f, 0xa0, 0xa0, 0xf5, 0xf6, 0xff];
        let tx = Transaction::from_cbor(&bytes).unwrap();
        assert_eq!(tx.to_cbor().unwrap(), [0x84, 0xa0, 0xa0, 0xf5, 0xf6]);
    }

    #[test]
    fn indefinite_outer_array_needs_3_or_4_elements() {
        let too_short = [0x9f, 0xa0, 0xa0, 0xff];
        let too_long = [0x9f, 0xa0, 0xa0, 0xf5, 0xf6, 0x00, 0x00, 0xff];
        for bytes in [&too_short[..], &too_long[..]] {
            assert!(matches!(
                Transaction::from_cbor(bytes),
                Err(WitnessError::Cbor(CborError::Unexpected { offset: 0, .. }))
            ));
        }

        let pre_alonzo = [0x9f, 0xa0, 0xa0, 0xf6, 0xff];
        let tx = Transaction::from_cbor(&pre_alonzo).unwrap();
        assert_eq!(tx.to_cbor().unwrap(), [0x83, 0xa0, 0xa0, 0xf6]);
    }

    #[test]
    fn rejects_non_transactions() {
        assert!(Transaction::from_cbor(&[0xa0]).is_err());
        assert!(Transaction::from_cbor(&[0x82, 0x01, 0xa0]).is_err());
        assert!(Transaction::from_cbor(&[0x85, 0xa0, 0xa0, 0xf5, 0xf6, 0xf6]).is_err());
        assert!(matches!(
            Transaction::from_cbor(&[0x84, 0xa0, 0xa0, 0xf5, 0xf6, 0x00]),
            Err(WitnessError::Cbor(CborError::TrailingBytes { count: 1 }))
        ));
        assert!(matches!(Transaction::from_hex("zz"), Err(TxHexError::Hex(_))));
    }
}
