//! Client side of the helper protocol.
//!
//! Runs a credential helper program (`keybridge` itself or any helper
//! speaking the same protocol) and turns its stdout back into typed
//! results. A failing helper prints its error message on stdout; the
//! well-known messages map back to their [`BridgeError`] variants.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::{Command, Stdio};

use tracing::debug;

use keybridge_core::{BridgeError, Result};

use crate::protocol::CredentialsPayload;

/// What a helper run produced.
#[derive(Debug, Clone, Default)]
pub struct ProgramOutput {
    pub success: bool,
    pub stdout: Vec<u8>,
}

/// A helper program that can be run with a verb and a stdin payload.
pub trait Program {
    fn run(&self, verb: &str, input: &[u8]) -> io::Result<ProgramOutput>;
}

impl<F> Program for F
where
    F: Fn(&str, &[u8]) -> io::Result<ProgramOutput>,
{
    fn run(&self, verb: &str, input: &[u8]) -> io::Result<ProgramOutput> {
        self(verb, input)
    }
}

/// A helper executable on disk. The verb is appended after any fixed
/// arguments.
#[derive(Debug, Clone)]
pub struct ShellProgram {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ShellProgram {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Add a fixed argument passed before the verb.
    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }
}

impl Program for ShellProgram {
    fn run(&self, verb: &str, input: &[u8]) -> io::Result<ProgramOutput> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(verb)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            // The helper may exit before reading, e.g. on a usage error.
            if let Err(e) = stdin.write_all(input) {
                if e.kind() != io::ErrorKind::BrokenPipe {
                    return Err(e);
                }
            }
        }
        let output = child.wait_with_output()?;
        Ok(ProgramOutput {
            success: output.status.success(),
            stdout: output.stdout,
        })
    }
}

/// Run `verb` and return stdout, or the helper's error.
fn call(program: &dyn Program, verb: &str, input: &[u8]) -> Result<Vec<u8>> {
    let output = program.run(verb, input)?;
    if output.success {
        return Ok(output.stdout);
    }

    let text = String::from_utf8_lossy(&output.stdout);
    let text = text.trim();
    debug!(verb, output = %text, "helper failed");
    Err(BridgeError::from_message(text)
        .unwrap_or_else(|| BridgeError::Store(format!("error in helper {verb}: `{text}`"))))
}

/// Ask the helper to store `credentials`.
pub fn store(program: &dyn Program, credentials: &CredentialsPayload) -> Result<()> {
    let input = serde_json::to_vec(credentials)?;
    call(program, "store", &input)?;
    Ok(())
}

/// Fetch the credentials the helper holds for `server_url`.
pub fn get(program: &dyn Program, server_url: &str) -> Result<CredentialsPayload> {
    let out = call(program, "get", server_url.as_bytes())?;
    let mut credentials: CredentialsPayload = serde_json::from_slice(&out)?;
    if credentials.server_url.is_empty() {
        credentials.server_url = server_url.to_string();
    }
    Ok(credentials)
}

/// Ask the helper to remove the credentials for `server_url`.
pub fn erase(program: &dyn Program, server_url: &str) -> Result<()> {
    call(program, "erase", server_url.as_bytes())?;
    Ok(())
}

/// List `{server URL: username}` pairs known to the helper.
pub fn list(program: &dyn Program) -> Result<BTreeMap<String, String>> {
    let out = call(program, "list", b"unused")?;
    Ok(serde_json::from_slice(&out)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol;
    use keybridge_store::MemoryStore;

    /// Serve helper verbs from `bridge` in-process, printing errors the
    /// way the binary does.
    fn serve(bridge: &MemoryStore) -> impl Fn(&str, &[u8]) -> io::Result<ProgramOutput> + '_ {
        move |verb: &str, input: &[u8]| {
            let mut stdout = Vec::new();
            let result = match verb {
                "store" => protocol::store(bridge, input),
                "get" => protocol::get(bridge, input, &mut stdout),
                "erase" => protocol::erase(bridge, input),
                "list" => protocol::list(bridge, &mut stdout),
                other => Err(BridgeError::Store(format!("unknown verb {other}"))),
            };
            match result {
                Ok(()) => Ok(ProgramOutput {
                    success: true,
                    stdout,
                }),
                Err(e) => Ok(ProgramOutput {
                    success: false,
                    stdout: format!("{e}\n").into_bytes(),
                }),
            }
        }
    }

    fn payload(server: &str, user: &str, secret: &str) -> CredentialsPayload {
        CredentialsPayload {
            server_url: server.to_string(),
            username: user.to_string(),
            secret: secret.to_string(),
        }
    }

    #[test]
    fn test_store_get_erase() {
        let bridge = MemoryStore::new();
        let helper = serve(&bridge);

        store(&helper, &payload("https://registry.example", "alice", "pw")).unwrap();

        let creds = get(&helper, "https://registry.example").unwrap();
        assert_eq!(creds.server_url, "https://registry.example");
        assert_eq!(creds.username, "alice");
        assert_eq!(creds.secret, "pw");

        erase(&helper, "https://registry.example").unwrap();
        assert!(get(&helper, "https://registry.example")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_list() {
        let bridge = MemoryStore::new();
        let helper = serve(&bridge);
        store(&helper, &payload("https://a.example", "alice", "pw")).unwrap();
        store(&helper, &payload("http://b.example:5000", "bob", "pw")).unwrap();

        let listed = list(&helper).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed["https://a.example"], "alice");
        assert_eq!(listed["http://b.example:5000"], "bob");
    }

    #[test]
    fn test_well_known_messages_map_to_variants() {
        let bridge = MemoryStore::new();
        let helper = serve(&bridge);

        assert!(matches!(
            store(&helper, &payload("", "alice", "pw")),
            Err(BridgeError::MissingServerUrl)
        ));
        assert!(matches!(
            store(&helper, &payload("https://registry.example", "", "pw")),
            Err(BridgeError::MissingUsername)
        ));
        assert!(matches!(
            erase(&helper, "https://registry.example"),
            Err(BridgeError::NotFound)
        ));
    }

    #[test]
    fn test_other_failures_carry_helper_output() {
        let helper = |_: &str, _: &[u8]| {
            Ok::<_, io::Error>(ProgramOutput {
                success: false,
                stdout: b"keychain exploded\n".to_vec(),
            })
        };
        let err = get(&helper, "https://registry.example").unwrap_err();
        assert!(matches!(err, BridgeError::Store(_)));
        assert!(err.to_string().contains("keychain exploded"));
    }

    #[test]
    fn test_spawn_failure_is_io_error() {
        let helper = ShellProgram::new("keybridge-no-such-helper-binary");
        assert!(matches!(
            list(&helper),
            Err(BridgeError::Io(_))
        ));
    }
}
