//! Adapter over the `pass` password manager.
//!
//! Entries live at `<folder>/<base64url(server URL)>/<username>` inside the
//! password store. The server URL is encoded because pass maps names to
//! files and folders, and a URL carries slashes. The secret is the entry's
//! content; the username is the entry's file name.
//!
//! Reads that only need names walk the store directory directly instead of
//! parsing `pass ls` output. Anything touching secrets goes through the
//! `pass` program so GPG handles encryption.
//!
//! Keys are exact: the full server URL names the folder, so no wildcard
//! matching applies.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use parking_lot::Mutex;
use tracing::{debug, warn};

use keybridge_core::bridge::validate_add;
use keybridge_core::{
    server_url, BridgeError, Credential, KeychainBridge, Protocol, Result, ServerIdentity,
    StoredEntry,
};

const ENTRY_SUFFIX: &str = ".gpg";

/// A `KeychainBridge` over a `pass` password store.
pub struct PassStore {
    folder: String,
    store_dir: PathBuf,
    command: Vec<String>,
    initialized: Mutex<bool>,
}

impl PassStore {
    /// Open the store rooted at `store_dir`, keeping entries under `folder`.
    pub fn new(folder: impl Into<String>, store_dir: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            store_dir: store_dir.into(),
            command: vec!["pass".to_string()],
            initialized: Mutex::new(false),
        }
    }

    /// Run a different program (plus leading arguments) in place of `pass`.
    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = command.into_iter().map(Into::into).collect();
        self
    }

    fn server_dir(&self, encoded: &str) -> PathBuf {
        self.store_dir.join(&self.folder).join(encoded)
    }

    fn entry_name(&self, encoded: &str, username: &str) -> String {
        format!("{}/{}/{}", self.folder, encoded, username)
    }

    /// Check once per store that `pass` works at all.
    fn ensure_initialized(&self) -> Result<()> {
        let mut initialized = self.initialized.lock();
        if *initialized {
            return Ok(());
        }
        self.run_raw(&[], &["ls"])
            .map_err(|e| BridgeError::Unavailable(format!("pass not initialized: {e}")))?;
        *initialized = true;
        Ok(())
    }

    fn run(&self, stdin: &[u8], args: &[&str]) -> Result<Vec<u8>> {
        self.ensure_initialized()?;
        self.run_raw(stdin, args)
    }

    fn run_raw(&self, stdin: &[u8], args: &[&str]) -> Result<Vec<u8>> {
        let Some((program, leading)) = self.command.split_first() else {
            return Err(BridgeError::Unavailable("no pass command configured".to_string()));
        };

        let mut child = Command::new(program)
            .args(leading)
            .args(args)
            .env("PASSWORD_STORE_DIR", &self.store_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    BridgeError::Unavailable(format!("{program} is not installed"))
                }
                _ => BridgeError::Io(e),
            })?;

        if let Some(mut input) = child.stdin.take() {
            input.write_all(stdin)?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(BridgeError::Store(format!(
                "{program} {}: {}: {}",
                args.first().copied().unwrap_or_default(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // pass 1.7.1+ terminates `show` output with a newline.
        let mut stdout = output.stdout;
        while matches!(stdout.last(), Some(b'\n' | b'\r')) {
            stdout.pop();
        }
        Ok(stdout)
    }
}

fn encode_server_url(server_url: &str) -> String {
    URL_SAFE.encode(server_url)
}

fn decode_server_url(encoded: &str) -> Option<String> {
    let bytes = URL_SAFE.decode(encoded).ok()?;
    String::from_utf8(bytes).ok()
}

/// Rebuild an identity from a decoded folder name. Names without a scheme
/// were written for `Generic` identities.
fn identity_from_url(url: &str) -> Result<ServerIdentity> {
    let mut identity = server_url::parse(url)?;
    if !url.contains("://") {
        identity.protocol = Protocol::Generic;
    }
    Ok(identity)
}

/// Usernames stored under a server folder, sorted so the first is stable.
fn usernames(dir: &Path) -> Result<Vec<String>> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(user) = name.strip_suffix(ENTRY_SUFFIX) {
            names.push(user.to_string());
        }
    }
    names.sort();
    Ok(names)
}

impl KeychainBridge for PassStore {
    fn name(&self) -> &'static str {
        "pass"
    }

    fn add(&self, identity: &ServerIdentity, credential: &Credential) -> Result<()> {
        validate_add(identity, credential)?;
        let username = credential.username_lossy();
        if username.is_empty() {
            return Err(BridgeError::MissingUsername);
        }
        if username.contains('/') || username == "." || username == ".." {
            return Err(BridgeError::Store(format!(
                "username {username:?} cannot be used as a pass entry name"
            )));
        }

        let encoded = encode_server_url(&identity.to_server_url());
        // One entry per key: drop any entry stored under another username.
        if self.server_dir(&encoded).exists() {
            self.run(&[], &["rm", "-rf", &format!("{}/{}", self.folder, encoded)])?;
        }
        self.run(
            credential.password().expose_secret(),
            &["insert", "-f", "-m", &self.entry_name(&encoded, &username)],
        )?;
        debug!(server = %identity, "stored credential in pass");
        Ok(())
    }

    fn get(&self, identity: &ServerIdentity) -> Result<Credential> {
        identity.validate()?;
        let encoded = encode_server_url(&identity.to_server_url());
        let username = usernames(&self.server_dir(&encoded))?
            .into_iter()
            .next()
            .ok_or(BridgeError::NotFound)?;

        let secret = self.run(&[], &["show", &self.entry_name(&encoded, &username)])?;
        Ok(Credential::new(username, secret))
    }

    fn delete(&self, identity: &ServerIdentity) -> Result<()> {
        identity.validate()?;
        let encoded = encode_server_url(&identity.to_server_url());
        if !self.server_dir(&encoded).exists() {
            return Err(BridgeError::NotFound);
        }
        self.run(&[], &["rm", "-rf", &format!("{}/{}", self.folder, encoded)])?;
        debug!(server = %identity, "deleted credential from pass");
        Ok(())
    }

    fn list(&self) -> Result<Vec<StoredEntry>> {
        let root = self.store_dir.join(&self.folder);
        let dirs = match fs::read_dir(&root) {
            Ok(dirs) => dirs,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut entries = Vec::new();
        for dir in dirs {
            let dir = dir?;
            if !dir.file_type()?.is_dir() {
                continue;
            }
            let name = dir.file_name().to_string_lossy().into_owned();
            let Some(url) = decode_server_url(&name) else {
                warn!(folder = %name, "skipping pass folder that is not an encoded server URL");
                continue;
            };
            let identity = match identity_from_url(&url) {
                Ok(identity) => identity,
                Err(e) => {
                    warn!(url = %url, error = %e, "skipping pass entry with an unusable server URL");
                    continue;
                }
            };
            if let Some(username) = usernames(&dir.path())?.into_iter().next() {
                entries.push(StoredEntry { identity, username });
            }
        }
        entries.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(entries)
    }
}
