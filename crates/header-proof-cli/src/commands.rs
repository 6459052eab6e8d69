//! Subcommand implementations.

use std::fs;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use header_proof::{
    compute_verification_id, ClaimedProof, HeaderReport, ProofReport, RemoteBlock, RemoteHeader,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, info};

/// One block for the `header` subcommand.
#[derive(Debug, Deserialize)]
pub struct HeaderInput {
    /// Optional height label, echoed back in batch output.
    #[serde(default)]
    pub height: Option<u64>,
    /// `getblockheader` response.
    pub header: RemoteHeader,
    /// `getblock` with verbosity 0: the raw block as hex.
    pub raw_block: String,
}

/// A single block, or a list of blocks audited one after another.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum HeaderBatch {
    One(HeaderInput),
    Many(Vec<HeaderInput>),
}

/// What a subcommand produced.
#[derive(Debug)]
pub struct Outcome {
    pub json: Value,
    /// Whether the process should exit non-zero after printing.
    pub failed: bool,
}

/// Read and parse a JSON input file; `-` reads stdin.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("reading stdin")?;
        buf
    } else {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    };

    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn check_header(input: &HeaderInput) -> Result<HeaderReport> {
    let report = HeaderReport::from_remote(&input.header, &input.raw_block)
        .with_context(|| format!("verifying block {}", input.header.hash))?;

    info!(
        height = ?input.height,
        block = %report.block_hash.display,
        valid = report.verification.valid,
        solution_len = report.solution_len,
        pow = %report.pow,
        "header checked"
    );
    Ok(report)
}

/// Under `--strict`, a mismatch fails the run.
fn rejected(report: &HeaderReport, strict: bool) -> bool {
    if !strict {
        return false;
    }
    match report.verification.clone().ensure_valid() {
        Ok(_) => false,
        Err(err) => {
            error!("{}", err);
            true
        }
    }
}

/// Verify one header, or each header of a batch.
///
/// A batch keeps going past blocks that cannot be checked and reports them
/// as `error` entries. With `strict`, any error or mismatch fails the run.
pub fn header(input: &Path, strict: bool) -> Result<Outcome> {
    match read_json::<HeaderBatch>(input)? {
        HeaderBatch::One(input) => {
            let report = check_header(&input)?;
            Ok(Outcome {
                failed: rejected(&report, strict),
                json: serde_json::to_value(&report)?,
            })
        }
        HeaderBatch::Many(inputs) => {
            let mut entries = Vec::with_capacity(inputs.len());
            let mut failures = 0usize;

            for input in &inputs {
                match check_header(input) {
                    Ok(report) => {
                        if rejected(&report, strict) || !report.verification.valid {
                            failures += 1;
                        }
                        entries.push(json!({ "height": input.height, "header": report }));
                    }
                    Err(err) => {
                        error!(height = ?input.height, "{:#}", err);
                        failures += 1;
                        entries.push(json!({
                            "height": input.height,
                            "hash": input.header.hash,
                            "error": format!("{:#}", err),
                        }));
                    }
                }
            }

            info!(blocks = inputs.len(), failures, "batch checked");
            Ok(Outcome {
                json: Value::Array(entries),
                failed: strict && failures > 0,
            })
        }
    }
}

pub fn proof(input: &Path, txid: &str) -> Result<Outcome> {
    let block: RemoteBlock = read_json(input)?;
    let report = ProofReport::from_remote(&block, txid)
        .with_context(|| format!("proving {} in block {}", txid, block.hash))?;

    info!(
        index = report.merkle_index,
        tx_count = report.tx_count,
        depth = report.merkle_branch.len(),
        "proof generated"
    );

    Ok(Outcome {
        json: serde_json::to_value(&report)?,
        failed: false,
    })
}

/// Check a published proof; `root` overrides or supplies the claimed root.
pub fn check_proof(input: &Path, root: Option<&str>) -> Result<Outcome> {
    let mut claim: ClaimedProof = read_json(input)?;
    if let Some(root) = root {
        claim = claim.with_root(root);
    }
    let valid = claim.verify().context("checking proof")?;

    Ok(Outcome {
        json: json!({
            "tx_id": claim.tx_id,
            "block_hash": claim.block_hash,
            "merkle_root": claim.merkle_root,
            "merkle_index": claim.merkle_index,
            "valid": valid,
        }),
        failed: !valid,
    })
}

pub fn verification_id(hash: &str) -> Result<Outcome> {
    let vid = compute_verification_id(hash).context("computing verification id")?;

    Ok(Outcome {
        json: json!({
            "block_hash": hash,
            "verification_id": vid,
        }),
        failed: false,
    })
}

/// Print the report on stdout and optionally save it.
pub fn emit(outcome: &Outcome, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(&outcome.json)?;
    println!("{}", text);

    if let Some(path) = output {
        fs::write(path, &text).with_context(|| format!("writing {}", path.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use header_proof::{BlockHeader, Hash256, MerkleTree, u256};
    use std::path::PathBuf;

    fn write_temp(name: &str, value: &Value) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "header-proof-{}-{}.json",
            std::process::id(),
            name
        ));
        fs::write(&path, value.to_string()).unwrap();
        path
    }

    #[test]
    fn test_header_command() {
        let block_header = BlockHeader {
            version: 4,
            prev_block_hash: Hash256([1; 32]),
            merkle_root: Hash256([2; 32]),
            block_commitments: Hash256([3; 32]),
            time: 1_600_000_000,
            bits: 0x1d00ffff,
            nonce: u256::from(5u32),
            solution: vec![9; 4],
        };
        let raw = block_header.encode_canonical();
        let hash = Hash256::double_hash(&raw);

        let input = json!({
            "header": {
                "hash": hash.to_display_hex(),
                "version": 4,
                "previousblockhash": block_header.prev_block_hash.to_display_hex(),
                "merkleroot": block_header.merkle_root.to_display_hex(),
                "blockcommitments": block_header.block_commitments.to_display_hex(),
                "time": 1_600_000_000u32,
                "bits": 0x1d00ffffu32,
                "nonce": "05",
            },
            "raw_block": raw.iter().map(|b| format!("{:02x}", b)).collect::<String>(),
        });
        let path = write_temp("header", &input);

        let outcome = header(&path, true).unwrap();
        assert!(!outcome.failed);
        assert_eq!(outcome.json["verification"]["valid"], json!(true));
        assert_eq!(outcome.json["pow"], json!("4295032833"));
        fs::remove_file(path).ok();
    }

    fn sample_input(nonce: u32, height: u64) -> Value {
        let block_header = BlockHeader {
            version: 4,
            prev_block_hash: Hash256([1; 32]),
            merkle_root: Hash256([2; 32]),
            block_commitments: Hash256([3; 32]),
            time: 1_600_000_000,
            bits: 0x1f07ffff,
            nonce: u256::from(nonce),
            solution: vec![nonce as u8; 6],
        };
        let raw = block_header.encode_canonical();

        json!({
            "height": height,
            "header": {
                "hash": Hash256::double_hash(&raw).to_display_hex(),
                "version": 4,
                "previousblockhash": block_header.prev_block_hash.to_display_hex(),
                "merkleroot": block_header.merkle_root.to_display_hex(),
                "blockcommitments": block_header.block_commitments.to_display_hex(),
                "time": 1_600_000_000u32,
                "bits": "1f07ffff",
                "nonce": format!("{:x}", nonce),
            },
            "raw_block": hex_string(&raw),
        })
    }

    fn hex_string(bytes: &[u8]) -> String {
        bytes.iter().map(|b| format!("{:02x}", b)).collect()
    }

    #[test]
    fn test_header_batch_continues_past_failures() {
        let good = sample_input(1, 100);

        let mut mismatched = sample_input(2, 101);
        mismatched["header"]["hash"] = json!(Hash256([0xee; 32]).to_display_hex());

        let mut truncated = sample_input(3, 102);
        truncated["raw_block"] = json!(hex_string(&[0u8; 100]));

        let path = write_temp("batch", &json!([good, mismatched, truncated]));

        let outcome = header(&path, false).unwrap();
        assert!(!outcome.failed);
        let entries = outcome.json.as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["height"], json!(100));
        assert_eq!(entries[0]["header"]["verification"]["valid"], json!(true));
        assert_eq!(entries[0]["header"]["pow"], json!("8192"));
        assert_eq!(entries[1]["header"]["verification"]["valid"], json!(false));
        assert_eq!(entries[2]["height"], json!(102));
        assert!(entries[2]["error"].is_string());
        assert!(entries[2].get("header").is_none());

        let strict = header(&path, true).unwrap();
        assert!(strict.failed);
        assert_eq!(strict.json.as_array().unwrap().len(), 3);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_header_batch_all_valid_under_strict() {
        let path = write_temp(
            "batch-valid",
            &json!([sample_input(4, 1), sample_input(5, 2)]),
        );
        let outcome = header(&path, true).unwrap();
        assert!(!outcome.failed);
        assert_eq!(outcome.json.as_array().unwrap().len(), 2);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_proof_and_check_commands() {
        let leaves: Vec<Hash256> = (0u8..5).map(|n| Hash256::double_hash(&[n])).collect();
        let root = MerkleTree::build(&leaves).root();
        let txids: Vec<String> = leaves.iter().map(Hash256::to_display_hex).collect();

        let block = json!({
            "hash": Hash256([7; 32]).to_display_hex(),
            "merkleroot": root.to_display_hex(),
            "tx": txids,
        });
        let path = write_temp("block", &block);

        let outcome = proof(&path, &txids[2]).unwrap();
        assert!(!outcome.failed);
        assert_eq!(outcome.json["merkle_index"], json!(2));
        assert_eq!(outcome.json["root_matches"], json!(true));

        let branch: Vec<Value> = outcome.json["merkle_branch"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["display"].clone())
            .collect();
        let claim = json!({
            "tx_id": txids[2],
            "merkle_root": root.to_display_hex(),
            "merkle_branch": branch,
            "merkle_index": 2,
            "tx_count": 5,
        });
        let claim_path = write_temp("claim", &claim);

        let checked = check_proof(&claim_path, None).unwrap();
        assert_eq!(checked.json["valid"], json!(true));
        assert!(!checked.failed);

        fs::remove_file(path).ok();
        fs::remove_file(claim_path).ok();
    }

    #[test]
    fn test_check_proof_with_block_hash_and_root_flag() {
        let leaves: Vec<Hash256> = (0u8..4).map(|n| Hash256::double_hash(&[n])).collect();
        let tree = MerkleTree::build(&leaves);
        let branch: Vec<String> = tree
            .proof(3)
            .unwrap()
            .branch
            .iter()
            .map(Hash256::to_display_hex)
            .collect();

        let claim = json!({
            "tx_id": leaves[3].to_display_hex(),
            "block_hash": Hash256([7; 32]).to_display_hex(),
            "merkle_branch": branch,
            "merkle_index": 3,
            "tx_count": 4,
        });
        let path = write_temp("claim-block-hash", &claim);

        let err = check_proof(&path, None).unwrap_err();
        assert!(format!("{:#}", err).contains("merkle_root"));

        let root = tree.root().to_display_hex();
        let checked = check_proof(&path, Some(&root)).unwrap();
        assert_eq!(checked.json["valid"], json!(true));
        assert_eq!(checked.json["block_hash"], json!(Hash256([7; 32]).to_display_hex()));

        let wrong = Hash256([8; 32]).to_display_hex();
        let checked = check_proof(&path, Some(&wrong)).unwrap();
        assert_eq!(checked.json["valid"], json!(false));
        assert!(checked.failed);

        fs::remove_file(path).ok();
    }

    #[test]
    fn test_verification_id_command() {
        let outcome = verification_id(
            "00040fe8ec8471911baa1db1266ea15dd06b4a8a5c453883c000b031973dce08",
        )
        .unwrap();
        assert_eq!(
            outcome.json["verification_id"],
            json!("0x08ce3d9731b000c08338455c8a4a6bd05da16e26b11daa1b917184ec")
        );
        assert!(verification_id("zz-not-hex").is_err());
    }

    #[test]
    fn test_missing_input_file() {
        let missing = Path::new("/nonexistent/header-proof-input.json");
        assert!(header(missing, false).is_err());
    }
}
