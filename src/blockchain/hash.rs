//! Canonical block encoding and hashing.
//!
//! The encoding is JSON with keys sorted lexicographically, `", "` and `": "`
//! separators and every non-ASCII character escaped as `\uXXXX`. Integers keep
//! their exact text; every other number is written in shortest round-trip
//! form with a signed, two-digit exponent (`1e-07`, `1.5e+16`). That is the
//! exact byte form other nodes on the network hash, so digests agree across
//! implementations.

use std::fmt::Write as _;

use serde_json::Number;
use sha2::{Digest, Sha256};

use super::block::{Block, PreviousHash};
use crate::transaction::Transaction;

/// SHA-256 of `data`, lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Hash of a block over its canonical encoding.
pub fn hash_block(block: &Block) -> String {
    sha256_hex(canonical_json(block).as_bytes())
}

/// Canonical encoding of a block, keys in sorted order:
/// `index`, `previous_hash`, `proof`, `timestamp`, `transactions`.
pub fn canonical_json(block: &Block) -> String {
    let mut out = String::with_capacity(128 + block.transactions.len() * 96);
    out.push_str("{\"index\": ");
    let _ = write!(out, "{}", block.index);
    out.push_str(", \"previous_hash\": ");
    match &block.previous_hash {
        PreviousHash::Genesis => {
            let _ = write!(out, "{}", PreviousHash::GENESIS_SENTINEL);
        }
        PreviousHash::Digest(d) => write_str(&mut out, d),
    }
    out.push_str(", \"proof\": ");
    let _ = write!(out, "{}", block.proof);
    out.push_str(", \"timestamp\": ");
    write_f64(&mut out, block.timestamp);
    out.push_str(", \"transactions\": [");
    for (i, tx) in block.transactions.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_transaction(&mut out, tx);
    }
    out.push_str("]}");
    out
}

fn write_transaction(out: &mut String, tx: &Transaction) {
    out.push_str("{\"amount\": ");
    write_number(out, &tx.amount);
    out.push_str(", \"recipient\": ");
    write_str(out, &tx.recipient);
    out.push_str(", \"sender\": ");
    write_str(out, &tx.sender);
    out.push('}');
}

fn write_number(out: &mut String, n: &Number) {
    let text = n.to_string();
    if text.bytes().all(|b| b.is_ascii_digit() || b == b'-') {
        out.push_str(if text == "-0" { "0" } else { &text });
        return;
    }
    match n.as_f64() {
        Some(v) => write_f64(out, v),
        // only out-of-range literals fail to parse
        None if text.starts_with('-') => out.push_str("-Infinity"),
        None => out.push_str("Infinity"),
    }
}

// Floats always carry a fraction or exponent (`5.0`, not `5`). Plain notation
// is used while the decimal point sits within 16 digits of the first digit
// and no more than 4 places before it.
fn write_f64(out: &mut String, v: f64) {
    if v.is_nan() {
        out.push_str("NaN");
        return;
    }
    if v.is_sign_negative() {
        out.push('-');
    }
    if v.is_infinite() {
        out.push_str("Infinity");
        return;
    }

    // `{:e}` yields the shortest digits that round-trip, e.g. `1.5e-7`
    let sci = format!("{:e}", v.abs());
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();
    let ndigits = digits.len() as i32;
    let point = exp + 1;

    if (-3..=16).contains(&point) {
        if point <= 0 {
            out.push_str("0.");
            push_zeros(out, -point);
            out.push_str(&digits);
        } else if point >= ndigits {
            out.push_str(&digits);
            push_zeros(out, point - ndigits);
            out.push_str(".0");
        } else {
            let (int, frac) = digits.split_at(point as usize);
            out.push_str(int);
            out.push('.');
            out.push_str(frac);
        }
    } else {
        let (first, rest) = digits.split_at(1);
        out.push_str(first);
        if !rest.is_empty() {
            out.push('.');
            out.push_str(rest);
        }
        let sign = if exp < 0 { '-' } else { '+' };
        let _ = write!(out, "e{sign}{:02}", exp.abs());
    }
}

fn push_zeros(out: &mut String, n: i32) {
    out.extend(std::iter::repeat_n('0', n.max(0) as usize));
}

fn write_str(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            ' '..='\u{7f}' => out.push(c),
            c => {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    let _ = write!(out, "\\u{:04x}", unit);
                }
            }
        }
    }
    out.push('"');
}
