//! Interpreter stub and boot script
//!
//! The remote interpreter receives the stub on its command line. The stub tells
//! it how many bytes of stdin hold the boot script; the boot script then drives
//! frame assembly, resolver installation and the final entry-point call.

use crate::ProtocolError;
use std::fmt;
use std::str::FromStr;

/// Logical name of the boot script unit
pub const ASSEMBLER_UNIT: &str = "stowaway.assembler";
/// Greeting the server driver writes once it is running
pub const READY_BANNER: &[u8] = b"\0\0STOWAWAY0001";

/// One-line script handed to the remote interpreter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stub {
    /// Diagnostic verbosity for the remote side
    pub verbosity: u8,
    /// Exact byte length of the boot script that follows on stdin
    pub length: usize,
}

impl fmt::Display for Stub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "verbosity={}; stdin=binary; exec={}", self.verbosity, self.length)
    }
}

impl FromStr for Stub {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut verbosity = None;
        let mut length = None;
        let mut binary = false;

        for statement in s.split(';').map(str::trim).filter(|s| !s.is_empty()) {
            let (key, value) = statement.split_once('=').ok_or_else(|| {
                ProtocolError::InvalidStub(format!("bad statement {:?}", statement))
            })?;
            let value = value.trim();
            let invalid = || {
                ProtocolError::InvalidStub(format!("bad value for {}: {:?}", key.trim(), value))
            };
            match key.trim() {
                "verbosity" => verbosity = Some(value.parse().map_err(|_| invalid())?),
                "exec" => length = Some(value.parse().map_err(|_| invalid())?),
                "stdin" if value == "binary" => binary = true,
                "stdin" => return Err(invalid()),
                other => {
                    return Err(ProtocolError::InvalidStub(format!("unknown key {:?}", other)));
                }
            }
        }

        if !binary {
            return Err(ProtocolError::InvalidStub("stdin must be reopened as binary".to_string()));
        }
        Ok(Self {
            verbosity: verbosity.unwrap_or(0),
            length: length
                .ok_or_else(|| ProtocolError::InvalidStub("missing exec length".to_string()))?,
        })
    }
}

/// One boot script instruction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Read frames from stdin until the sentinel
    Assemble,
    /// Put the stream resolver at the front of the resolver chain
    Install,
    /// Load a unit through the resolver chain
    Import(String),
    /// Call a native entry point with options parsed from a unit
    Call {
        /// Unit exporting the entry point
        unit: String,
        /// Entry point name
        function: String,
        /// Unit holding the serialized options
        options: String,
    },
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Directive::Assemble => write!(f, "assemble"),
            Directive::Install => write!(f, "install"),
            Directive::Import(unit) => write!(f, "import {}", unit),
            Directive::Call { unit, function, options } => {
                write!(f, "call {} {} {}", unit, function, options)
            }
        }
    }
}

/// The program executed by the remote interpreter
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BootScript {
    directives: Vec<Directive>,
}

impl BootScript {
    /// Assemble, install, import `imports` in order, then call `unit::function`
    pub fn standard<I, S>(imports: I, unit: &str, function: &str, options: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut directives = vec![Directive::Assemble, Directive::Install];
        directives.extend(imports.into_iter().map(|name| Directive::Import(name.into())));
        directives.push(Directive::Call {
            unit: unit.to_string(),
            function: function.to_string(),
            options: options.to_string(),
        });
        Self { directives }
    }

    /// Script from an explicit directive list
    pub fn from_directives(directives: Vec<Directive>) -> Self {
        Self { directives }
    }

    /// Directives in execution order
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Every unit the script loads or reads, in order
    pub fn referenced_units(&self) -> Vec<&str> {
        let mut units = Vec::new();
        for directive in &self.directives {
            match directive {
                Directive::Import(unit) => units.push(unit.as_str()),
                Directive::Call { unit, options, .. } => {
                    units.push(options.as_str());
                    units.push(unit.as_str());
                }
                Directive::Assemble | Directive::Install => {}
            }
        }
        units
    }
}

impl fmt::Display for BootScript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for directive in &self.directives {
            writeln!(f, "{}", directive)?;
        }
        Ok(())
    }
}

impl FromStr for BootScript {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut directives = Vec::new();
        for (index, raw) in s.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let invalid = |reason: &str| ProtocolError::InvalidBootScript {
                line: index + 1,
                reason: reason.to_string(),
            };

            let words: Vec<&str> = line.split_whitespace().collect();
            let directive = match words.as_slice() {
                ["assemble"] => Directive::Assemble,
                ["install"] => Directive::Install,
                ["import", unit] => Directive::Import(unit.to_string()),
                ["call", unit, function, options] => Directive::Call {
                    unit: unit.to_string(),
                    function: function.to_string(),
                    options: options.to_string(),
                },
                [keyword, ..] => {
                    return Err(invalid(&format!("cannot parse {:?} directive", keyword)));
                }
                [] => unreachable!("blank lines are skipped"),
            };
            directives.push(directive);
        }
        Ok(Self { directives })
    }
}
