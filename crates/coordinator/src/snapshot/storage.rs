// Copyright 2025 itscheems
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! State file persistence.
//!
//! Files are named `swapState-<ms>.bin` so the newest can be selected by
//! scanning the data directory. The format is a 4-byte magic, a big-endian
//! u16 version, and a bincode body; a version mismatch is a load error,
//! never an in-place upgrade.

use std::{
	fs::{self, File},
	io::{Read, Write},
	path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};
use tracing::debug;

use super::{STATE_VERSION, SnapshotError, State};
use crate::unix_ms_now;

const STATE_MAGIC: [u8; 4] = *b"BSWP";
const STATE_PREFIX: &str = "swapState-";
const STATE_SUFFIX: &str = ".bin";

/// A state file located in the data directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateFile {
	pub name: PathBuf,
	/// Creation time encoded in the filename, ms UTC.
	pub stamp: u64,
}

/// Write the state to a new file in `dir`, returning its path. The file is
/// assembled under a temporary name and renamed into place so a crash can
/// not leave a half-written current file.
pub fn save_state_file(dir: &Path, state: &State) -> Result<PathBuf, SnapshotError> {
	let stamp = unix_ms_now();
	let path = dir.join(format!("{STATE_PREFIX}{stamp}{STATE_SUFFIX}"));
	let tmp_path = dir.join(format!("{STATE_PREFIX}{stamp}{STATE_SUFFIX}.tmp"));

	let body = bincode::serialize(state).map_err(|e| SnapshotError::Encode(e.to_string()))?;

	let mut f = File::create(&tmp_path)?;
	f.write_all(&STATE_MAGIC)?;
	f.write_all(&STATE_VERSION.to_be_bytes())?;
	f.write_all(&body)?;
	f.sync_all()?;
	drop(f);

	fs::rename(&tmp_path, &path)?;
	debug!(path = %path.display(), bytes = body.len(), "Wrote swap state file");
	Ok(path)
}

/// Load and decode a state file.
pub fn load_state_file(path: &Path) -> Result<State, SnapshotError> {
	let mut f = File::open(path)?;
	let mut header = [0u8; 6];
	f.read_exact(&mut header)
		.map_err(|_| SnapshotError::BadMagic)?;
	if header[..4] != STATE_MAGIC {
		return Err(SnapshotError::BadMagic);
	}
	let version = u16::from_be_bytes([header[4], header[5]]);
	if version != STATE_VERSION {
		return Err(SnapshotError::VersionMismatch(version));
	}

	let mut body = Vec::new();
	f.read_to_end(&mut body)?;
	bincode::deserialize(&body).map_err(|e| SnapshotError::Decode(e.to_string()))
}

/// Find the newest state file in `dir`, or None when there is none.
pub fn latest_state_file(dir: &Path) -> Result<Option<StateFile>, SnapshotError> {
	let mut newest: Option<StateFile> = None;
	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let name = entry.file_name();
		let Some(name) = name.to_str() else {
			continue;
		};
		let Some(stamp) = name
			.strip_prefix(STATE_PREFIX)
			.and_then(|rest| rest.strip_suffix(STATE_SUFFIX))
			.and_then(|stamp| stamp.parse::<u64>().ok())
		else {
			continue;
		};
		if newest.as_ref().is_none_or(|cur| stamp > cur.stamp) {
			newest = Some(StateFile {
				name: entry.path(),
				stamp,
			});
		}
	}
	Ok(newest)
}

/// SHA-256 of a file's full contents, for the database consistency check.
pub fn file_hash(path: &Path) -> Result<Vec<u8>, SnapshotError> {
	let mut f = File::open(path)?;
	let mut hasher = Sha256::new();
	let mut buf = [0u8; 8192];
	loop {
		let n = f.read(&mut buf)?;
		if n == 0 {
			break;
		}
		hasher.update(&buf[..n]);
	}
	Ok(hasher.finalize().to_vec())
}
