//! Transaction witness sets.
//!
//! A witness set is a CBOR map keyed by small integers. Only key 0 (the
//! verification-key witnesses) is touched by the merge; every other entry
//! (native scripts, bootstrap witnesses, Plutus scripts, datums, redeemers)
//! is carried as the exact bytes it arrived with.
//!
//! Key 0 is decoded with `ciborium` into [`VkeyWitness`] values. Newer eras
//! wrap the array in tag 258 (a CBOR set); the tag is kept if it was there.

use ciborium::value::Value;
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use thiserror::Error;

use super::raw::{write_header, CborError, Reader, MAJOR_MAP, MAJOR_UNSIGNED};

/// Witness map key holding verification-key witnesses.
pub const VKEY_WITNESS_KEY: u64 = 0;

/// CBOR tag for a set.
pub const SET_TAG: u64 = 258;

/// Errors while reading or merging witnesses.
#[derive(Debug, Error)]
pub enum WitnessError {
    #[error(transparent)]
    Cbor(#[from] CborError),

    #[error("malformed vkey witness: {0}")]
    Malformed(&'static str),

    #[error("verification key must be 32 bytes, got {0}")]
    KeyLength(usize),

    #[error("signature must be 64 bytes, got {0}")]
    SignatureLength(usize),

    #[error("invalid verification key {vkey}")]
    InvalidKey { vkey: String },

    #[error("signature by {vkey} does not verify against the transaction body")]
    InvalidSignature { vkey: String },
}

/// One `[vkey, signature]` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VkeyWitness {
    pub vkey: [u8; 32],
    pub signature: [u8; 64],
}

impl VkeyWitness {
    /// Checks the signature over `tx_hash` (the body hash, not the body).
    pub fn verify(&self, tx_hash: &[u8; 32]) -> Result<(), WitnessError> {
        let key = VerifyingKey::from_bytes(&self.vkey).map_err(|_| WitnessError::InvalidKey {
            vkey: hex::encode(self.vkey),
        })?;
        let signature = Signature::from_bytes(&self.signature);
        key.verify(tx_hash, &signature)
            .map_err(|_| WitnessError::InvalidSignature {
                vkey: hex::encode(self.vkey),
            })
    }

    fn from_value(value: &Value) -> Result<Self, WitnessError> {
        let pair = value
            .as_array()
            .ok_or(WitnessError::Malformed("witness is not an array"))?;
        let [vkey, signature] = pair.as_slice() else {
            return Err(WitnessError::Malformed("witness must have two elements"));
        };
        let vkey = vkey
            .as_bytes()
            .ok_or(WitnessError::Malformed("vkey is not a byte string"))?;
        let signature = signature
            .as_bytes()
            .ok_or(WitnessError::Malformed("signature is not a byte string"))?;

        Ok(Self {
            vkey: vkey
                .as_slice()
                .try_into()
                .map_err(|_| WitnessError::KeyLength(vkey.len()))?,
            signature: signature
                .as_slice()
                .try_into()
                .map_err(|_| WitnessError::SignatureLength(signature.len()))?,
        })
    }

    fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::Bytes(self.vkey.to_vec()),
            Value::Bytes(self.signature.to_vec()),
        ])
    }
}

/// A parsed witness set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WitnessSet {
    vkeys: Vec<VkeyWitness>,
    /// Key 0 was present in the input, possibly empty.
    has_vkey_entry: bool,
    /// Key 0 was encoded as a tag-258 set.
    tagged: bool,
    /// Every other entry, in input order, as raw value bytes.
    others: Vec<(u64, Vec<u8>)>,
}

impl WitnessSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a standalone witness set, as returned by a wallet's `signTx`.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self, WitnessError> {
        let mut reader = Reader::new(bytes);
        let set = Self::read(&mut reader)?;
        reader.finish()?;
        Ok(set)
    }

    /// Parses a witness set at the reader's position.
    pub fn read(reader: &mut Reader<'_>) -> Result<Self, WitnessError> {
        let offset = reader.position();
        let header = reader.header()?;
        if header.major != MAJOR_MAP {
            return Err(CborError::Unexpected {
                offset,
                expected: "witness set map",
            }
            .into());
        }

        let mut set = Self::default();
        match header.arg {
            Some(n) => {
                for _ in 0..n {
                    set.read_entry(reader)?;
                }
            }
            None => {
                while !reader.at_break() {
                    set.read_entry(reader)?;
                }
                reader.expect_break()?;
            }
        }
        Ok(set)
    }

    fn read_entry(&mut self, reader: &mut Reader<'_>) -> Result<(), WitnessError> {
        let key = reader.unsigned()?;
        let value = reader.item_span()?;
        if key == VKEY_WITNESS_KEY {
            self.read_vkeys(value)?;
        } else {
            self.others.push((key, value.to_vec()));
        }
        Ok(())
    }

    fn read_vkeys(&mut self, raw: &[u8]) -> Result<(), WitnessError> {
        let value: Value =
            ciborium::de::from_reader(raw).map_err(|e| CborError::Decode(e.to_string()))?;
        let (tagged, items) = match value {
            Value::Tag(SET_TAG, inner) => (true, *inner),
            other => (false, other),
        };
        let Value::Array(items) = items else {
            return Err(WitnessError::Malformed("vkey witnesses are not an array"));
        };

        self.has_vkey_entry = true;
        self.tagged = tagged;
        for item in &items {
            let witness = VkeyWitness::from_value(item)?;
            if !self.contains(&witness.vkey) {
                self.vkeys.push(witness);
            }
        }
        Ok(())
    }

    pub fn vkeys(&self) -> &[VkeyWitness] {
        &self.vkeys
    }

    pub fn contains(&self, vkey: &[u8; 32]) -> bool {
        self.vkeys.iter().any(|w| &w.vkey == vkey)
    }

    /// Keys of the entries carried through verbatim.
    pub fn other_keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.others.iter().map(|(k, _)| *k)
    }

    /// Attaches the vkey witnesses of `incoming` that are not already here.
    ///
    /// Every offered signature is verified against `tx_hash` first; one bad
    /// signature rejects the whole merge and leaves `self` unchanged. Returns
    /// how many witnesses were added, so merging the same set twice adds
    /// zero the second time.
    pub fn add_signatures(
        &mut self,
        incoming: &WitnessSet,
        tx_hash: &[u8; 32],
    ) -> Result<usize, WitnessError> {
        for witness in &incoming.vkeys {
            witness.verify(tx_hash)?;
        }

        let before = self.vkeys.len();
        for witness in &incoming.vkeys {
            if !self.contains(&witness.vkey) {
                self.vkeys.push(witness.clone());
            }
        }
        let added = self.vkeys.len() - before;
        if added > 0 {
            self.has_vkey_entry = true;
        }
        Ok(added)
    }

    /// Encodes the set as a definite-length map with key 0 first.
    pub fn to_cbor(&self) -> Result<Vec<u8>, CborError> {
        let emit_vkeys = self.has_vkey_entry || !self.vkeys.is_empty();
        let entries = self.others.len() + usize::from(emit_vkeys);

        let mut out = Vec::new();
        write_header(&mut out, MAJOR_MAP, entries as u64);

        if emit_vkeys {
            let array = Value::Array(self.vkeys.iter().map(VkeyWitness::to_value).collect());
            let value = if self.tagged {
                Value::Tag(SET_TAG, Box::new(array))
            } else {
                array
            };
            write_header(&mut out, MAJOR_UNSIGNED, VKEY_WITNESS_KEY);
            ciborium::ser::into_writer(&value, &mut out)
                .map_err(|e| CborError::Encode(e.to_string()))?;
        }
        for (key, raw) in &self.others {
            write_header(&mut out, MAJOR_UNSIGNED, *key);
            out.extend_from_slice(raw);
        }
        Ok(out)
    }
}
