//! Manual Solana transaction wire format.
//!
//! We build Solana transactions entirely by hand, without `solana-sdk`.
//! The wire format is a compact binary layout documented here:
//!
//! ```text
//! Transaction:
//!   num_signatures          compact-u16
//!   signatures              64 bytes * num_signatures
//!   message:
//!     num_required_sigs     u8
//!     num_readonly_signed   u8
//!     num_readonly_unsigned u8
//!     num_accounts          compact-u16
//!     account_keys          32 bytes * num_accounts
//!     recent_blockhash      32 bytes
//!     num_instructions      compact-u16
//!     instructions[]        (see below)
//!
//! Instruction:
//!   program_id_index        u8
//!   num_accounts            compact-u16
//!   account_indices         u8 * num_accounts
//!   data_len                compact-u16
//!   data                    u8 * data_len
//! ```
//!
//! A transaction may need several signatures (the fee payer plus any freshly
//! created account). Signatures are collected separately and slotted in by
//! public key when the wire bytes are assembled.

use ed25519_dalek::{Signature, VerifyingKey};

use crate::address::bytes_to_address;
use crate::error::SolError;

// ---------------------------------------------------------------------------
// Well-known accounts
// ---------------------------------------------------------------------------

/// The Solana System Program public key: 32 zero bytes.
/// Base58: `11111111111111111111111111111111`
pub const SYSTEM_PROGRAM_ID: [u8; 32] = [0u8; 32];

/// Rent sysvar: `SysvarRent111111111111111111111111111111111`
pub const SYSVAR_RENT_ID: [u8; 32] = [
    0x06, 0xa7, 0xd5, 0x17, 0x19, 0x2c, 0x5c, 0x51, 0x21, 0x8c, 0xc9, 0x4c, 0x3d, 0x4a, 0xf1,
    0x7f, 0x58, 0xda, 0xee, 0x08, 0x9b, 0xa1, 0xfd, 0x44, 0xe3, 0xdb, 0xd9, 0x8a, 0x00, 0x00,
    0x00, 0x00,
];

/// System Program `CreateAccount` instruction index (little-endian u32).
const SYSTEM_CREATE_ACCOUNT_IX_INDEX: u32 = 0;

/// Account indices are single bytes on the wire.
const MAX_ACCOUNT_KEYS: usize = 256;

// ---------------------------------------------------------------------------
// Compact-u16 encoding
// ---------------------------------------------------------------------------

/// Encode a `u16` value in Solana's compact-u16 format.
///
/// - Values 0..0x7f       -> 1 byte
/// - Values 0x80..0x3fff  -> 2 bytes
/// - Values 0x4000..      -> 3 bytes
pub fn encode_compact_u16(value: u16) -> Vec<u8> {
    let mut val = value as u32;
    let mut out = Vec::with_capacity(3);

    loop {
        let mut byte = (val & 0x7f) as u8;
        val >>= 7;
        if val > 0 {
            byte |= 0x80;
        }
        out.push(byte);
        if val == 0 {
            break;
        }
    }

    out
}

/// Decode a compact-u16 value from a byte slice.
///
/// Returns `(value, bytes_consumed)` or an error if the data is truncated.
pub fn decode_compact_u16(data: &[u8]) -> Result<(u16, usize), SolError> {
    let mut value: u32 = 0;
    let mut shift = 0u32;
    let mut consumed = 0usize;

    loop {
        let byte = *data.get(consumed).ok_or_else(|| {
            SolError::SerializationError(
                "unexpected end of data while decoding compact-u16".into(),
            )
        })?;
        consumed += 1;

        value |= ((byte & 0x7f) as u32) << shift;
        shift += 7;

        if byte & 0x80 == 0 || consumed >= 3 {
            break;
        }
    }

    if value > u16::MAX as u32 {
        return Err(SolError::SerializationError(
            "compact-u16 value overflow".into(),
        ));
    }

    Ok((value as u16, consumed))
}

// ---------------------------------------------------------------------------
// Data structures
// ---------------------------------------------------------------------------

/// A single account reference in a Solana instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolAccountMeta {
    pub pubkey: [u8; 32],
    pub is_signer: bool,
    pub is_writable: bool,
}

impl SolAccountMeta {
    pub fn writable(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: true,
        }
    }

    pub fn readonly(pubkey: [u8; 32], is_signer: bool) -> Self {
        Self {
            pubkey,
            is_signer,
            is_writable: false,
        }
    }
}

/// A Solana instruction (before it is compiled into a transaction).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolInstruction {
    pub program_id: [u8; 32],
    pub accounts: Vec<SolAccountMeta>,
    pub data: Vec<u8>,
}

/// A compiled, unsigned Solana transaction message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolTransaction {
    /// All account keys referenced by this transaction, in canonical order:
    ///   1. writable signers
    ///   2. read-only signers
    ///   3. writable non-signers
    ///   4. read-only non-signers
    pub account_keys: Vec<[u8; 32]>,

    /// Number of required signatures (first N accounts are signers).
    pub num_required_signatures: u8,
    /// How many of the signing accounts are read-only.
    pub num_readonly_signed: u8,
    /// How many of the non-signing accounts are read-only.
    pub num_readonly_unsigned: u8,

    /// Recent blockhash (32 bytes).
    pub recent_blockhash: [u8; 32],

    /// Compiled instructions (account references replaced with indices).
    pub compiled_instructions: Vec<CompiledInstruction>,
}

impl SolTransaction {
    /// The fee payer is always the first account key.
    pub fn fee_payer(&self) -> Option<&[u8; 32]> {
        self.account_keys.first()
    }

    /// Public keys whose signatures the transaction requires, in slot order.
    pub fn signer_keys(&self) -> &[[u8; 32]] {
        let n = (self.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..n]
    }

    pub fn is_writable(&self, index: usize) -> bool {
        let signers = self.num_required_signatures as usize;
        if index < signers {
            index < signers.saturating_sub(self.num_readonly_signed as usize)
        } else {
            index < self
                .account_keys
                .len()
                .saturating_sub(self.num_readonly_unsigned as usize)
        }
    }

    /// Resolve a compiled instruction's program id.
    pub fn program_of(&self, ix: &CompiledInstruction) -> Option<&[u8; 32]> {
        self.account_keys.get(ix.program_id_index as usize)
    }

    /// Resolve the `position`-th account of a compiled instruction.
    pub fn account_of(&self, ix: &CompiledInstruction, position: usize) -> Option<&[u8; 32]> {
        ix.account_indices
            .get(position)
            .and_then(|idx| self.account_keys.get(*idx as usize))
    }
}

/// A compiled instruction where account references are replaced by u8 indices
/// into the transaction's `account_keys` array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    /// Index into `account_keys` for the program to invoke.
    pub program_id_index: u8,
    /// Indices into `account_keys` for each account the instruction reads/writes.
    pub account_indices: Vec<u8>,
    /// Opaque instruction data.
    pub data: Vec<u8>,
}

/// A wire transaction split back into its parts.
#[derive(Debug, Clone)]
pub struct ParsedTransaction {
    pub signatures: Vec<[u8; 64]>,
    pub message: Vec<u8>,
    pub transaction: SolTransaction,
}

impl ParsedTransaction {
    /// Verify every signature slot against its signer key.
    pub fn verify_signatures(&self) -> Result<(), SolError> {
        let signers = self.transaction.signer_keys();
        if signers.len() != self.signatures.len() {
            return Err(SolError::SerializationError(format!(
                "{} signatures for {} signers",
                self.signatures.len(),
                signers.len()
            )));
        }

        for (key, sig) in signers.iter().zip(&self.signatures) {
            let vk = VerifyingKey::from_bytes(key).map_err(|e| {
                SolError::InvalidAddress(format!("signer is not an ed25519 key: {e}"))
            })?;
            vk.verify_strict(&self.message, &Signature::from_bytes(sig))
                .map_err(|_| SolError::InvalidSignature(bytes_to_address(key)))?;
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// System Program
// ---------------------------------------------------------------------------

/// Build a System Program `CreateAccount` instruction.
///
/// Both the payer and the new account must sign. Data layout:
/// u32 LE index (0) + u64 LE lamports + u64 LE space + 32-byte owner = 52 bytes.
pub fn build_create_account(
    payer: &[u8; 32],
    new_account: &[u8; 32],
    lamports: u64,
    space: u64,
    owner: &[u8; 32],
) -> SolInstruction {
    let mut data = Vec::with_capacity(52);
    data.extend_from_slice(&SYSTEM_CREATE_ACCOUNT_IX_INDEX.to_le_bytes());
    data.extend_from_slice(&lamports.to_le_bytes());
    data.extend_from_slice(&space.to_le_bytes());
    data.extend_from_slice(owner);

    SolInstruction {
        program_id: SYSTEM_PROGRAM_ID,
        accounts: vec![
            SolAccountMeta::writable(*payer, true),
            SolAccountMeta::writable(*new_account, true),
        ],
        data,
    }
}

// ---------------------------------------------------------------------------
// Transaction building
// ---------------------------------------------------------------------------

/// Build a transaction from a set of instructions with a single fee payer.
///
/// The fee payer is always the first signer and is placed at index 0 in the
/// account keys. Instruction order is preserved.
pub fn compile_transaction(
    instructions: &[SolInstruction],
    fee_payer: &[u8; 32],
    recent_blockhash: &[u8; 32],
) -> Result<SolTransaction, SolError> {
    if instructions.is_empty() {
        return Err(SolError::TransactionBuildError(
            "transaction has no instructions".into(),
        ));
    }

    // Instruction account lists are tiny, so a Vec beats a HashMap here.
    struct AccountEntry {
        pubkey: [u8; 32],
        is_signer: bool,
        is_writable: bool,
    }

    let mut entries: Vec<AccountEntry> = Vec::new();

    let mut upsert = |pubkey: [u8; 32], signer: bool, writable: bool| {
        if let Some(entry) = entries.iter_mut().find(|e| e.pubkey == pubkey) {
            entry.is_signer |= signer;
            entry.is_writable |= writable;
        } else {
            entries.push(AccountEntry {
                pubkey,
                is_signer: signer,
                is_writable: writable,
            });
        }
    };

    // Fee payer is always signer + writable.
    upsert(*fee_payer, true, true);

    for ix in instructions {
        for meta in &ix.accounts {
            upsert(meta.pubkey, meta.is_signer, meta.is_writable);
        }
        // Program IDs are non-signer, read-only accounts.
        upsert(ix.program_id, false, false);
    }

    if entries.len() > MAX_ACCOUNT_KEYS {
        return Err(SolError::TransactionBuildError(format!(
            "{} accounts exceed the {MAX_ACCOUNT_KEYS} addressable keys",
            entries.len()
        )));
    }

    // Stable sort keeps insertion order within a category, so the fee
    // payer stays first among writable signers.
    entries.sort_by_key(|e| match (e.is_signer, e.is_writable) {
        (true, true) => 0u8,
        (true, false) => 1,
        (false, true) => 2,
        (false, false) => 3,
    });

    let num_signers = entries.iter().filter(|e| e.is_signer).count() as u8;
    let num_readonly_signed = entries
        .iter()
        .filter(|e| e.is_signer && !e.is_writable)
        .count() as u8;
    let num_readonly_unsigned = entries
        .iter()
        .filter(|e| !e.is_signer && !e.is_writable)
        .count() as u8;

    let account_keys: Vec<[u8; 32]> = entries.iter().map(|e| e.pubkey).collect();

    let index_of = |key: &[u8; 32], what: &str| {
        account_keys
            .iter()
            .position(|k| k == key)
            .map(|i| i as u8)
            .ok_or_else(|| SolError::TransactionBuildError(format!("{what} not in account keys")))
    };

    let mut compiled = Vec::with_capacity(instructions.len());
    for ix in instructions {
        let program_id_index = index_of(&ix.program_id, "program_id")?;
        let account_indices = ix
            .accounts
            .iter()
            .map(|meta| index_of(&meta.pubkey, "account"))
            .collect::<Result<Vec<_>, _>>()?;

        compiled.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data: ix.data.clone(),
        });
    }

    Ok(SolTransaction {
        account_keys,
        num_required_signatures: num_signers,
        num_readonly_signed,
        num_readonly_unsigned,
        recent_blockhash: *recent_blockhash,
        compiled_instructions: compiled,
    })
}

/// Serialize the transaction message (the bytes that get signed).
pub fn serialize_message(tx: &SolTransaction) -> Result<Vec<u8>, SolError> {
    let mut buf = Vec::with_capacity(512);

    buf.push(tx.num_required_signatures);
    buf.push(tx.num_readonly_signed);
    buf.push(tx.num_readonly_unsigned);

    buf.extend_from_slice(&encode_compact_u16(compact_len(tx.account_keys.len())?));
    for key in &tx.account_keys {
        buf.extend_from_slice(key);
    }

    buf.extend_from_slice(&tx.recent_blockhash);

    buf.extend_from_slice(&encode_compact_u16(compact_len(
        tx.compiled_instructions.len(),
    )?));
    for ix in &tx.compiled_instructions {
        buf.push(ix.program_id_index);

        buf.extend_from_slice(&encode_compact_u16(compact_len(ix.account_indices.len())?));
        buf.extend_from_slice(&ix.account_indices);

        buf.extend_from_slice(&encode_compact_u16(compact_len(ix.data.len())?));
        buf.extend_from_slice(&ix.data);
    }

    Ok(buf)
}

/// Assemble the signed wire transaction.
///
/// `signatures` pairs each signer's public key with its signature over
/// [`serialize_message`]. Every required signer must be present; extra
/// entries are ignored.
pub fn serialize_transaction(
    tx: &SolTransaction,
    signatures: &[([u8; 32], [u8; 64])],
) -> Result<Vec<u8>, SolError> {
    let message = serialize_message(tx)?;
    let signers = tx.signer_keys();

    let mut wire = Vec::with_capacity(3 + 64 * signers.len() + message.len());
    wire.extend_from_slice(&encode_compact_u16(compact_len(signers.len())?));

    for signer in signers {
        let (_, sig) = signatures
            .iter()
            .find(|(key, _)| key == signer)
            .ok_or_else(|| SolError::MissingSignature(bytes_to_address(signer)))?;
        wire.extend_from_slice(sig);
    }

    wire.extend_from_slice(&message);
    Ok(wire)
}

/// Parse a wire-format transaction.
pub fn parse_transaction(wire: &[u8]) -> Result<ParsedTransaction, SolError> {
    let mut cursor = Cursor::new(wire);

    let num_sigs = cursor.compact()?;
    if num_sigs == 0 {
        return Err(SolError::SerializationError(
            "transaction has zero signatures".into(),
        ));
    }
    let mut signatures = Vec::with_capacity(num_sigs as usize);
    for _ in 0..num_sigs {
        let sig: [u8; 64] = cursor
            .take(64)?
            .try_into()
            .map_err(|_| SolError::SerializationError("signature slot".into()))?;
        signatures.push(sig);
    }

    let message = wire[cursor.pos..].to_vec();

    let num_required_signatures = cursor.byte()?;
    let num_readonly_signed = cursor.byte()?;
    let num_readonly_unsigned = cursor.byte()?;

    let num_accounts = cursor.compact()?;
    let mut account_keys = Vec::with_capacity(num_accounts as usize);
    for _ in 0..num_accounts {
        account_keys.push(cursor.key()?);
    }

    let recent_blockhash = cursor.key()?;

    let num_ixs = cursor.compact()?;
    let mut compiled_instructions = Vec::with_capacity(num_ixs as usize);
    for _ in 0..num_ixs {
        let program_id_index = cursor.byte()?;
        let n = cursor.compact()? as usize;
        let account_indices = cursor.take(n)?.to_vec();
        let len = cursor.compact()? as usize;
        let data = cursor.take(len)?.to_vec();
        compiled_instructions.push(CompiledInstruction {
            program_id_index,
            account_indices,
            data,
        });
    }

    if cursor.pos != wire.len() {
        return Err(SolError::SerializationError(format!(
            "{} trailing bytes after message",
            wire.len() - cursor.pos
        )));
    }

    if num_required_signatures as u16 != num_sigs {
        return Err(SolError::SerializationError(format!(
            "header requires {num_required_signatures} signatures, found {num_sigs}"
        )));
    }

    Ok(ParsedTransaction {
        signatures,
        message,
        transaction: SolTransaction {
            account_keys,
            num_required_signatures,
            num_readonly_signed,
            num_readonly_unsigned,
            recent_blockhash,
            compiled_instructions,
        },
    })
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn compact_len(len: usize) -> Result<u16, SolError> {
    u16::try_from(len)
        .map_err(|_| SolError::SerializationError(format!("length {len} exceeds u16")))
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], SolError> {
        let end = self
            .pos
            .checked_add(n)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| SolError::SerializationError("transaction too short".into()))?;
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn byte(&mut self) -> Result<u8, SolError> {
        Ok(self.take(1)?[0])
    }

    fn key(&mut self) -> Result<[u8; 32], SolError> {
        self.take(32)?
            .try_into()
            .map_err(|_| SolError::SerializationError("account key".into()))
    }

    fn compact(&mut self) -> Result<u16, SolError> {
        let (value, used) = decode_compact_u16(&self.data[self.pos..])?;
        self.pos += used;
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address;
    use crate::keypair::Keypair;

    fn memo_ix(signer: [u8; 32], data: &[u8]) -> SolInstruction {
        SolInstruction {
            program_id: [0x99; 32],
            accounts: vec![SolAccountMeta::readonly(signer, true)],
            data: data.to_vec(),
        }
    }

    // -- compact-u16 --------------------------------------------------------

    #[test]
    fn compact_u16_boundaries() {
        assert_eq!(encode_compact_u16(0), vec![0x00]);
        assert_eq!(encode_compact_u16(0x7f), vec![0x7f]);
        assert_eq!(encode_compact_u16(128), vec![0x80, 0x01]);
        assert_eq!(encode_compact_u16(16383), vec![0xff, 0x7f]);
        assert_eq!(encode_compact_u16(16384), vec![0x80, 0x80, 0x01]);
        assert_eq!(encode_compact_u16(u16::MAX), vec![0xff, 0xff, 0x03]);
    }

    #[test]
    fn decode_compact_u16_reports_consumed_bytes() {
        assert_eq!(decode_compact_u16(&[0x7f]).unwrap(), (127, 1));
        assert_eq!(decode_compact_u16(&[0x80, 0x01]).unwrap(), (128, 2));
        assert_eq!(decode_compact_u16(&[0x80, 0x80, 0x01, 0xAA]).unwrap(), (16384, 3));
    }

    #[test]
    fn decode_compact_u16_empty_or_truncated_fails() {
        assert!(decode_compact_u16(&[]).is_err());
        assert!(decode_compact_u16(&[0x80]).is_err());
    }

    // -- well-known ids -----------------------------------------------------

    #[test]
    fn rent_sysvar_roundtrip() {
        assert_eq!(
            address::bytes_to_address(&SYSVAR_RENT_ID),
            "SysvarRent111111111111111111111111111111111"
        );
    }

    // -- System CreateAccount -----------------------------------------------

    #[test]
    fn create_account_layout() {
        let payer = [1u8; 32];
        let new = [2u8; 32];
        let owner = [3u8; 32];
        let ix = build_create_account(&payer, &new, 1_461_600, 82, &owner);

        assert_eq!(ix.program_id, SYSTEM_PROGRAM_ID);
        assert_eq!(ix.data.len(), 52);
        assert_eq!(&ix.data[..4], &[0, 0, 0, 0]);
        assert_eq!(&ix.data[4..12], &1_461_600u64.to_le_bytes());
        assert_eq!(&ix.data[12..20], &82u64.to_le_bytes());
        assert_eq!(&ix.data[20..], &owner);

        assert!(ix.accounts.iter().all(|m| m.is_signer && m.is_writable));
        assert_eq!(ix.accounts[1].pubkey, new);
    }

    // -- compilation --------------------------------------------------------

    #[test]
    fn compile_orders_accounts_canonically() {
        let payer = [1u8; 32];
        let mint = [2u8; 32];
        let ix1 = build_create_account(&payer, &mint, 10, 82, &[7u8; 32]);
        let ix2 = SolInstruction {
            program_id: [7u8; 32],
            accounts: vec![
                SolAccountMeta::writable(mint, false),
                SolAccountMeta::readonly(SYSVAR_RENT_ID, false),
            ],
            data: vec![0],
        };

        let tx = compile_transaction(&[ix1, ix2], &payer, &[0xAA; 32]).unwrap();

        assert_eq!(tx.fee_payer(), Some(&payer));
        assert_eq!(tx.signer_keys(), &[payer, mint]);
        assert_eq!(tx.num_required_signatures, 2);
        assert_eq!(tx.num_readonly_signed, 0);
        // system program, rent sysvar, invoked program
        assert_eq!(tx.num_readonly_unsigned, 3);
        assert!(tx.is_writable(1));
        assert!(!tx.is_writable(tx.account_keys.len() - 1));
    }

    #[test]
    fn compile_preserves_instruction_order() {
        let payer = [1u8; 32];
        let tx = compile_transaction(
            &[memo_ix(payer, b"first"), memo_ix(payer, b"second")],
            &payer,
            &[0u8; 32],
        )
        .unwrap();

        assert_eq!(tx.compiled_instructions[0].data, b"first");
        assert_eq!(tx.compiled_instructions[1].data, b"second");
        let program = tx.program_of(&tx.compiled_instructions[0]).unwrap();
        assert_eq!(program, &[0x99; 32]);
        assert_eq!(tx.account_of(&tx.compiled_instructions[0], 0), Some(&payer));
    }

    #[test]
    fn compile_deduplicates_and_promotes_permissions() {
        let payer = [1u8; 32];
        let shared = [5u8; 32];
        let a = SolInstruction {
            program_id: [9u8; 32],
            accounts: vec![SolAccountMeta::readonly(shared, false)],
            data: vec![],
        };
        let b = SolInstruction {
            program_id: [9u8; 32],
            accounts: vec![SolAccountMeta::writable(shared, false)],
            data: vec![],
        };

        let tx = compile_transaction(&[a, b], &payer, &[0u8; 32]).unwrap();
        assert_eq!(tx.account_keys.len(), 3);
        let idx = tx.account_keys.iter().position(|k| *k == shared).unwrap();
        assert!(tx.is_writable(idx));
    }

    #[test]
    fn compile_empty_fails() {
        assert!(compile_transaction(&[], &[1u8; 32], &[0u8; 32]).is_err());
    }

    #[test]
    fn serialize_message_contains_blockhash() {
        let payer = [1u8; 32];
        let blockhash = [0xCCu8; 32];
        let tx = compile_transaction(&[memo_ix(payer, b"x")], &payer, &blockhash).unwrap();
        let msg = serialize_message(&tx).unwrap();

        assert_eq!(msg[0], tx.num_required_signatures);
        let offset = 3 + 1 + 32 * tx.account_keys.len();
        assert_eq!(&msg[offset..offset + 32], &blockhash);
    }

    // -- signing + parsing --------------------------------------------------

    #[test]
    fn two_signer_wire_parses_and_verifies() {
        let payer = Keypair::from_bytes(&[0x42; 32]).unwrap();
        let mint = Keypair::generate();
        let ix = build_create_account(&payer.pubkey(), &mint.pubkey(), 1, 82, &[7u8; 32]);
        let tx = compile_transaction(&[ix], &payer.pubkey(), &[0xDD; 32]).unwrap();
        let msg = serialize_message(&tx).unwrap();

        // Order of the supplied signatures does not matter.
        let wire = serialize_transaction(
            &tx,
            &[
                (mint.pubkey(), mint.sign(&msg)),
                (payer.pubkey(), payer.sign(&msg)),
            ],
        )
        .unwrap();

        assert_eq!(wire[0], 2);
        let parsed = parse_transaction(&wire).unwrap();
        assert_eq!(parsed.transaction, tx);
        assert_eq!(parsed.message, msg);
        assert!(parsed.verify_signatures().is_ok());
    }

    #[test]
    fn missing_signer_is_reported() {
        let payer = Keypair::from_bytes(&[0x42; 32]).unwrap();
        let mint = Keypair::generate();
        let ix = build_create_account(&payer.pubkey(), &mint.pubkey(), 1, 82, &[7u8; 32]);
        let tx = compile_transaction(&[ix], &payer.pubkey(), &[0u8; 32]).unwrap();
        let msg = serialize_message(&tx).unwrap();

        let err = serialize_transaction(&tx, &[(payer.pubkey(), payer.sign(&msg))]).unwrap_err();
        assert!(matches!(err, SolError::MissingSignature(addr) if addr == mint.address()));
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let payer = Keypair::from_bytes(&[0x42; 32]).unwrap();
        let tx = compile_transaction(&[memo_ix(payer.pubkey(), b"m")], &payer.pubkey(), &[0u8; 32])
            .unwrap();
        let msg = serialize_message(&tx).unwrap();
        let mut wire = serialize_transaction(&tx, &[(payer.pubkey(), payer.sign(&msg))]).unwrap();
        wire[10] ^= 0xFF;

        let parsed = parse_transaction(&wire).unwrap();
        assert!(parsed.verify_signatures().is_err());
    }

    #[test]
    fn parse_rejects_truncated_and_trailing_input() {
        assert!(parse_transaction(&[]).is_err());
        assert!(parse_transaction(&[0x01]).is_err());
        assert!(parse_transaction(&[0x00, 0x01, 0x00, 0x00]).is_err());

        let payer = Keypair::from_bytes(&[0x42; 32]).unwrap();
        let tx = compile_transaction(&[memo_ix(payer.pubkey(), b"m")], &payer.pubkey(), &[0u8; 32])
            .unwrap();
        let msg = serialize_message(&tx).unwrap();
        let mut wire = serialize_transaction(&tx, &[(payer.pubkey(), payer.sign(&msg))]).unwrap();
        wire.push(0);
        assert!(parse_transaction(&wire).is_err());
    }
}
