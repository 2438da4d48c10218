//! Remote invocation command construction

use crate::{AddressSpec, TransportError};
use stowaway_proto::Stub;
use tracing::debug;

/// Transport used when no override is configured
pub const DEFAULT_TRANSPORT: &str = "ssh";
/// Generic agent program name
pub const AGENT_PROGRAM: &str = "stowaway-agent";
/// Versioned agent program tried first on the remote host
pub const PREFERRED_AGENT: &str = "stowaway-agent-0.1";

/// How the interpreter process gets started
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Transport command line, split on shell-word boundaries (default `ssh`)
    pub transport: Option<String>,
    /// Interpreter binary on the remote host; probed when unset
    pub interpreter: Option<String>,
    /// Agent binary used for local execution
    pub local_agent: String,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            transport: None,
            interpreter: None,
            local_agent: AGENT_PROGRAM.to_string(),
        }
    }
}

/// Build the full argument vector for the interpreter process
///
/// Local: `<agent> -c <stub>`. Remote: `<transport...> [-p port] <dest> -- <command>`.
pub fn build_argv(
    config: &CommandConfig,
    address: &AddressSpec,
    stub: &Stub,
) -> Result<Vec<String>, TransportError> {
    let script = stub.to_string();

    let Some(destination) = address.destination() else {
        // The interpreter override only applies to remote hosts
        let argv = vec![config.local_agent.clone(), "-c".to_string(), script];
        debug!("Local invocation: {:?}", argv);
        return Ok(argv);
    };

    let mut argv = transport_argv(config.transport.as_deref())?;
    if let Some(port) = address.port {
        argv.push("-p".to_string());
        argv.push(port.to_string());
    }
    argv.push(destination);
    argv.push("--".to_string());
    argv.push(remote_command(config.interpreter.as_deref(), &script)?);

    debug!("Remote invocation: {:?}", argv);
    Ok(argv)
}

/// Split the transport override, or fall back to plain `ssh`
pub fn transport_argv(transport: Option<&str>) -> Result<Vec<String>, TransportError> {
    let Some(transport) = transport else {
        return Ok(vec![DEFAULT_TRANSPORT.to_string()]);
    };
    let argv = shlex::split(transport).ok_or_else(|| {
        TransportError::Configuration(format!("cannot split transport command {:?}", transport))
    })?;
    if argv.is_empty() {
        return Err(TransportError::Configuration("empty transport command".to_string()));
    }
    Ok(argv)
}

/// Shell command run on the remote host
pub fn remote_command(interpreter: Option<&str>, script: &str) -> Result<String, TransportError> {
    let script = quote(script)?;
    match interpreter {
        Some(interpreter) => Ok(format!("{} -c {}", quote(interpreter)?, script)),
        None => {
            let probe = format!(
                "P={}; $P -V >/dev/null 2>&1 || P={}; exec \"$P\" -c {}",
                PREFERRED_AGENT, AGENT_PROGRAM, script
            );
            Ok(format!("exec /bin/sh -c {}", quote(&probe)?))
        }
    }
}

fn quote(word: &str) -> Result<String, TransportError> {
    shlex::try_quote(word)
        .map(|quoted| quoted.into_owned())
        .map_err(|e| TransportError::Configuration(format!("cannot quote {:?}: {}", word, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub() -> Stub {
        Stub { verbosity: 1, length: 42 }
    }

    #[test]
    fn test_local_invocation() {
        let config = CommandConfig {
            interpreter: Some("ignored".to_string()),
            local_agent: "/opt/bin/stowaway-agent".to_string(),
            ..Default::default()
        };
        let argv = build_argv(&config, &AddressSpec::local(), &stub()).unwrap();
        assert_eq!(
            argv,
            vec!["/opt/bin/stowaway-agent", "-c", "verbosity=1; stdin=binary; exec=42"]
        );
    }

    #[test]
    fn test_remote_invocation_with_port() {
        let config = CommandConfig {
            interpreter: Some("/usr/local/bin/stowaway-agent".to_string()),
            ..Default::default()
        };
        let address = AddressSpec::parse("user@example.com:2222").unwrap();
        let argv = build_argv(&config, &address, &stub()).unwrap();

        assert_eq!(&argv[..5], &["ssh", "-p", "2222", "user@example.com", "--"]);
        assert_eq!(
            argv[5],
            "/usr/local/bin/stowaway-agent -c 'verbosity=1; stdin=binary; exec=42'"
        );
    }

    #[test]
    fn test_remote_invocation_without_port() {
        let address = AddressSpec::parse("example.com").unwrap();
        let argv = build_argv(&CommandConfig::default(), &address, &stub()).unwrap();
        assert_eq!(&argv[..3], &["ssh", "example.com", "--"]);
        assert!(argv[3].starts_with("exec /bin/sh -c "));
        assert!(!argv.contains(&"-p".to_string()));
    }

    #[test]
    fn test_interpreter_probe() {
        let command = remote_command(None, "verbosity=0; stdin=binary; exec=7").unwrap();
        let words = shlex::split(&command).unwrap();
        assert_eq!(&words[..3], &["exec", "/bin/sh", "-c"]);

        let probe = &words[3];
        assert!(probe.starts_with("P=stowaway-agent-0.1; $P -V"));
        assert!(probe.contains("|| P=stowaway-agent;"));
        assert!(probe.ends_with("exec \"$P\" -c 'verbosity=0; stdin=binary; exec=7'"));
    }

    #[test]
    fn test_transport_override() {
        let argv = transport_argv(Some("ssh -o 'ProxyCommand nc %h %p' -i key")).unwrap();
        assert_eq!(argv, vec!["ssh", "-o", "ProxyCommand nc %h %p", "-i", "key"]);

        assert!(matches!(
            transport_argv(Some("ssh -o 'unterminated")),
            Err(TransportError::Configuration(_))
        ));
        assert!(matches!(transport_argv(Some("   ")), Err(TransportError::Configuration(_))));
    }
}
