//! Example data loading (MovieLens 100K).
//!
//! Source files are downloaded on first use, cached under
//! `~/.recomendar/`, and verified against pinned SHA-256 digests before
//! anything is parsed.

use crate::data::Dataset;
use crate::error::{RecomendarError, Result};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

const ITEM_URL: &str = "https://files.grouplens.org/datasets/movielens/ml-100k/u.item";
const ITEM_SHA256: &str = "553841ebc7de3a0fd0d6b62a204ea30c1e651aacfb2814c7a6584ac52f2c5701";

const DATA_URL: &str = "https://files.grouplens.org/datasets/movielens/ml-100k/u.data";
const DATA_SHA256: &str = "06416e597f82b7342361e41163890c81036900f418ad91315590814211dca490";

/// Loads the MovieLens 100K dataset, keyed by user id and movie title.
///
/// The two source files (about 5 MB) are downloaded on first use and
/// cached under `~/.recomendar/ml-100k/`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined, a
/// download fails, a file does not match its pinned digest, or a row
/// cannot be parsed.
pub fn load_movielens() -> Result<Dataset<u32, String>> {
    let item_path = fetch_cached("ml-100k/u.item", ITEM_URL, ITEM_SHA256)?;
    let data_path = fetch_cached("ml-100k/u.data", DATA_URL, DATA_SHA256)?;

    // u.item is ISO-8859-1 encoded; titles must be converted before use
    let item_bytes = fs::read(&item_path)?;
    let mut movies: HashMap<String, String> = HashMap::with_capacity(1682);
    for (line_no, line) in item_bytes.split(|&b| b == b'\n').enumerate() {
        if line.is_empty() {
            continue;
        }
        let mut fields = line.split(|&b| b == b'|');
        let id = fields.next().unwrap_or(&[]);
        let title = fields.next().ok_or_else(|| RecomendarError::Parse {
            line: line_no + 1,
            message: "expected movie id and title".to_string(),
        })?;
        movies.insert(latin1_to_utf8(id), latin1_to_utf8(title));
    }

    let mut data = Dataset::with_capacity(100_000);

    let contents = fs::read_to_string(&data_path)?;
    for (line_no, line) in contents.lines().enumerate() {
        let mut fields = line.split('\t');
        let (user, movie_id, value) = match (fields.next(), fields.next(), fields.next()) {
            (Some(user), Some(movie_id), Some(value)) => (user, movie_id, value),
            _ => {
                return Err(RecomendarError::Parse {
                    line: line_no + 1,
                    message: "expected user, item and rating".to_string(),
                })
            }
        };

        let user: u32 = user.parse().map_err(|_| RecomendarError::Parse {
            line: line_no + 1,
            message: format!("invalid user id {user:?}"),
        })?;
        let value: f32 = value.parse().map_err(|_| RecomendarError::Parse {
            line: line_no + 1,
            message: format!("invalid rating {value:?}"),
        })?;
        let title = movies.get(movie_id).ok_or_else(|| RecomendarError::Parse {
            line: line_no + 1,
            message: format!("unknown movie id {movie_id:?}"),
        })?;

        data.push(user, title.clone(), value);
    }

    Ok(data)
}

fn fetch_cached(relative: &str, url: &str, expected_sha256: &str) -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        RecomendarError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            "home directory not found",
        ))
    })?;
    let dest = home.join(".recomendar").join(relative);
    if dest.exists() {
        return Ok(dest);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }

    let response = ureq::get(url)
        .call()
        .map_err(|e| RecomendarError::Download {
            url: url.to_string(),
            message: e.to_string(),
        })?;
    let mut bytes = Vec::new();
    response.into_reader().read_to_end(&mut bytes)?;

    let digest = hex_digest(&bytes);
    if digest != expected_sha256 {
        return Err(RecomendarError::ChecksumMismatch {
            path: dest.display().to_string(),
            expected: expected_sha256.to_string(),
            got: digest,
        });
    }

    fs::write(&dest, &bytes)?;
    Ok(dest)
}

fn hex_digest(bytes: &[u8]) -> String {
    Sha256::digest(bytes)
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

fn latin1_to_utf8(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}
