//! Reads a registration key from stdin and prints its argon2 hash for the
//! registration keys file.

use std::io::{self, BufRead};

use anyhow::{Context, Result, anyhow};
use geo_attend::keys::hash_key;

fn main() -> Result<()> {
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read key from stdin")?;

    let key = line.trim_end_matches(['\r', '\n']);
    if key.is_empty() {
        return Err(anyhow!("no key given on stdin"));
    }

    let hashed = hash_key(key).map_err(|e| anyhow!("failed to hash key: {e}"))?;
    println!("{hashed}");
    Ok(())
}
