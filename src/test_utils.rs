//! Shared fixtures: deterministic keys, signed transaction chains, and
//! envelope assembly for end-to-end tests.

use secp256k1::{PublicKey, Secp256k1, SecretKey};
use sv::messages::{OutPoint, Tx as SvTx, TxIn as SvTxIn, TxOut as SvTxOut};
use sv::script::op_codes::{OP_CHECKSIG, OP_DUP, OP_EQUALVERIFY, OP_HASH160};
use sv::script::Script as SvScript;
use sv::transaction::generate_signature;
use sv::transaction::sighash::{sighash, SigHashCache, SIGHASH_ALL, SIGHASH_FORKID};
use sv::util::{hash160, Hash256, Serializable};

use crate::beef::{Beef, TxEntry, BEEF_VERSION};
use crate::bump::{Bump, Leaf, LeafKind};
use crate::tx::Transaction;
use crate::utils::double_sha256;

/// BRC-62 sample envelope: one BUMP at height 814435 with a tree of height 7,
/// a mined parent and an unmined subject spending it.
pub const REFERENCE_BEEF_HEX: &str = "0100beef01fe636d0c0007021400fe507c0c7aa754cef1f7889d5fd395cf1f785dd7de98eed895dbedfe4e5bc70d1502ac4e164f5bc16746bb0868404292ac8318bbac3800e4aad13a014da427adce3e010b00bc4ff395efd11719b277694cface5aa50d085a0bb81f613f70313acd28cf4557010400574b2d9142b8d28b61d88e3b2c3f44d858411356b49a28a4643b6d1a6a092a5201030051a05fc84d531b5d250c23f4f886f6812f9fe3f402d61607f977b4ecd2701c19010000fd781529d58fc2523cf396a7f25440b409857e7e221766c57214b1d38c7b481f01010062f542f45ea3660f86c013ced80534cb5fd4c19d66c56e7e8c5d4bf2d40acc5e010100b121e91836fd7cd5102b654e9f72f3cf6fdbfd0b161c53a9c54b12c841126331020100000001cd4e4cac3c7b56920d1e7655e7e260d31f29d9a388d04910f1bbd72304a79029010000006b483045022100e75279a205a547c445719420aa3138bf14743e3f42618e5f86a19bde14bb95f7022064777d34776b05d816daf1699493fcdf2ef5a5ab1ad710d9c97bfb5b8f7cef3641210263e2dee22b1ddc5e11f6fab8bcd2378bdd19580d640501ea956ec0e786f93e76ffffffff013e660000000000001976a9146bfd5c7fbe21529d45803dbcf0c87dd3c71efbc288ac0000000001000100000001ac4e164f5bc16746bb0868404292ac8318bbac3800e4aad13a014da427adce3e000000006a47304402203a61a2e931612b4bda08d541cfb980885173b8dcf64a3471238ae7abcd368d6402204cbf24f04b9aa2256d8901f0ed97866603d2be8324c2bfb7a37bf8fc90edd5b441210263e2dee22b1ddc5e11f6fab8bcd2378bdd19580d640501ea956ec0e786f93e76ffffffff013c660000000000001976a9146bfd5c7fbe21529d45803dbcf0c87dd3c71efbc288ac0000000000";

pub fn reference_beef() -> Beef {
    Beef::from_hex(REFERENCE_BEEF_HEX).unwrap()
}

/// Deterministic keypair derived from a one-byte seed. Seed 0 is invalid.
pub fn test_key(seed: u8) -> (SecretKey, PublicKey) {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_byte_array([seed; 32]).unwrap();
    let public = PublicKey::from_secret_key(&secp, &secret);
    (secret, public)
}

pub fn p2pkh_lock(public: &PublicKey) -> SvScript {
    let mut lock = SvScript::new();
    lock.append(OP_DUP);
    lock.append(OP_HASH160);
    lock.append_data(&hash160(&public.serialize()).0);
    lock.append(OP_EQUALVERIFY);
    lock.append(OP_CHECKSIG);
    lock
}

/// Serializes an `sv` transaction and reparses it as ours.
pub fn to_parsed(tx: &SvTx) -> Transaction {
    let mut raw = Vec::new();
    tx.write(&mut raw).unwrap();
    Transaction::from_raw(&raw).unwrap()
}

/// Parseable funding transaction paying `value` to `lock`. Meant to sit on
/// the mined side of an envelope, so its own input is fabricated.
pub fn funding_tx(value: u64, lock: &SvScript) -> Transaction {
    to_parsed(&SvTx {
        version: 1,
        inputs: vec![SvTxIn {
            prev_output: OutPoint {
                hash: Hash256([0x11; 32]),
                index: 0,
            },
            unlock_script: SvScript(vec![]),
            sequence: 0xffffffff,
        }],
        outputs: vec![SvTxOut {
            satoshis: value as i64,
            lock_script: lock.clone(),
        }],
        lock_time: 0,
    })
}

/// Unsigned single-input spend of `prev`'s output `vout`; scripts stay empty
/// so structural and fee checks can be exercised in isolation.
pub fn unsigned_spend(
    prev: &Transaction,
    vout: u32,
    value: u64,
    sequence: u32,
    lock_time: u32,
) -> Transaction {
    to_parsed(&SvTx {
        version: 1,
        inputs: vec![SvTxIn {
            prev_output: OutPoint {
                hash: Hash256(double_sha256(&prev.raw)),
                index: vout,
            },
            unlock_script: SvScript(vec![]),
            sequence,
        }],
        outputs: vec![SvTxOut {
            satoshis: value as i64,
            lock_script: SvScript(vec![]),
        }],
        lock_time,
    })
}

/// Signed P2PKH spend of `prev`'s output `vout`, paying `value` to `lock`.
/// The signature commits with `SIGHASH_ALL | SIGHASH_FORKID`, so it only
/// verifies when `signing_key` matches the spent output's pubkey hash.
pub fn signed_spend(
    prev: &Transaction,
    vout: u32,
    signing_key: &SecretKey,
    value: u64,
    lock: &SvScript,
) -> Transaction {
    let secp = Secp256k1::new();
    let public = PublicKey::from_secret_key(&secp, signing_key);
    let prev_out = &prev.outputs[vout as usize];
    let mut tx = SvTx {
        version: 1,
        inputs: vec![SvTxIn {
            prev_output: OutPoint {
                hash: Hash256(double_sha256(&prev.raw)),
                index: vout,
            },
            unlock_script: SvScript(vec![]),
            sequence: 0xffffffff,
        }],
        outputs: vec![SvTxOut {
            satoshis: value as i64,
            lock_script: lock.clone(),
        }],
        lock_time: 0,
    };
    let mut cache = SigHashCache::new();
    let sighash_type = SIGHASH_ALL | SIGHASH_FORKID;
    let sig_hash = sighash(
        &tx,
        0,
        &prev_out.script_pubkey,
        prev_out.value as i64,
        sighash_type,
        &mut cache,
    )
    .unwrap();
    let signature =
        generate_signature(&signing_key.secret_bytes(), &sig_hash, sighash_type).unwrap();
    let mut unlock = SvScript::new();
    unlock.append_data(&signature);
    unlock.append_data(&public.serialize());
    tx.inputs[0].unlock_script = unlock;
    to_parsed(&tx)
}

/// Signed P2PKH spend joining several previous outputs into one output.
/// Every spent output must be encumbered by `lock`.
pub fn signed_join(
    prevs: &[(&Transaction, u32)],
    signing_key: &SecretKey,
    value: u64,
    lock: &SvScript,
) -> Transaction {
    let secp = Secp256k1::new();
    let public = PublicKey::from_secret_key(&secp, signing_key);
    let mut tx = SvTx {
        version: 1,
        inputs: prevs
            .iter()
            .map(|(prev, vout)| SvTxIn {
                prev_output: OutPoint {
                    hash: Hash256(double_sha256(&prev.raw)),
                    index: *vout,
                },
                unlock_script: SvScript(vec![]),
                sequence: 0xffffffff,
            })
            .collect(),
        outputs: vec![SvTxOut {
            satoshis: value as i64,
            lock_script: lock.clone(),
        }],
        lock_time: 0,
    };
    let sighash_type = SIGHASH_ALL | SIGHASH_FORKID;
    for (i, (prev, vout)) in prevs.iter().enumerate() {
        let prev_out = &prev.outputs[*vout as usize];
        let mut cache = SigHashCache::new();
        let sig_hash = sighash(
            &tx,
            i,
            &prev_out.script_pubkey,
            prev_out.value as i64,
            sighash_type,
            &mut cache,
        )
        .unwrap();
        let signature =
            generate_signature(&signing_key.secret_bytes(), &sig_hash, sighash_type).unwrap();
        let mut unlock = SvScript::new();
        unlock.append_data(&signature);
        unlock.append_data(&public.serialize());
        tx.inputs[i].unlock_script = unlock;
    }
    to_parsed(&tx)
}

/// Single-txid path: `txid` at offset 0 with a duplicate sibling.
pub fn bump_for(txid: [u8; 32], block_height: u64) -> Bump {
    Bump {
        block_height,
        tree_height: 1,
        levels: vec![vec![
            Leaf {
                offset: 0,
                kind: LeafKind::Txid(txid),
            },
            Leaf {
                offset: 1,
                kind: LeafKind::Duplicate,
            },
        ]],
    }
}

/// Subject with two inputs, each spending its own unmined parent, each
/// parent spending its own mined grandparent; one BUMP per grandparent
/// block. Every hop pays a positive fee and signs with the same key.
pub fn forked_envelope() -> Beef {
    let (secret, public) = test_key(0xcd);
    let lock = p2pkh_lock(&public);
    let grandparent_a = funding_tx(10_000, &lock);
    let grandparent_b = funding_tx(20_000, &lock);
    let parent_a = signed_spend(&grandparent_a, 0, &secret, 9_000, &lock);
    let parent_b = signed_spend(&grandparent_b, 0, &secret, 19_000, &lock);
    let subject = signed_join(&[(&parent_a, 0), (&parent_b, 0)], &secret, 25_000, &lock);
    Beef {
        version: BEEF_VERSION,
        bumps: vec![
            bump_for(grandparent_a.txid(), 818_000),
            bump_for(grandparent_b.txid(), 818_001),
        ],
        txs: vec![
            TxEntry {
                tx: grandparent_a,
                bump_index: Some(0),
            },
            TxEntry {
                tx: grandparent_b,
                bump_index: Some(1),
            },
            TxEntry {
                tx: parent_a,
                bump_index: None,
            },
            TxEntry {
                tx: parent_b,
                bump_index: None,
            },
            TxEntry {
                tx: subject,
                bump_index: None,
            },
        ],
    }
}

/// Mined grandparent, unmined parent, unmined subject, one BUMP covering the
/// grandparent. Every hop pays a positive fee and signs with the same key.
pub fn signed_envelope() -> Beef {
    let (secret, public) = test_key(0xcd);
    let lock = p2pkh_lock(&public);
    let grandparent = funding_tx(10_000, &lock);
    let parent = signed_spend(&grandparent, 0, &secret, 9_000, &lock);
    let subject = signed_spend(&parent, 0, &secret, 8_000, &lock);
    let bump = bump_for(grandparent.txid(), 818_000);
    Beef {
        version: BEEF_VERSION,
        bumps: vec![bump],
        txs: vec![
            TxEntry {
                tx: grandparent,
                bump_index: Some(0),
            },
            TxEntry {
                tx: parent,
                bump_index: None,
            },
            TxEntry {
                tx: subject,
                bump_index: None,
            },
        ],
    }
}
