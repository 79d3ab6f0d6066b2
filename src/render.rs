//! Renderer Invoker - LaTeX to SVG via an External Toolchain
//!
//! The composed document goes to the tool's stdin, the font family is passed
//! as a flag, and a complete SVG document is expected on stdout. There is no
//! timeout: a hung tool blocks the build.

use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

use crate::hashing::Normalized;
use crate::templates::{PreambleRegistry, PreambleTemplate, PreambleVariant};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Unknown preamble variant: {0}")]
    UnknownPreamble(PreambleVariant),

    #[error("Renderer `{program}` not found: {reason}")]
    NotFound { program: String, reason: String },

    #[error("Failed to run renderer `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Renderer `{program}` exited with {status}:\n{diagnostics}")]
    Failed {
        program: String,
        status: ExitStatus,
        diagnostics: String,
    },
}

/// Options fixed for the duration of one render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderOptions {
    pub font: String,
    pub preamble: PreambleVariant,
}

/// Narrow boundary around the external toolchain.
pub trait RenderInvoker {
    /// Turn a complete LaTeX document into SVG bytes.
    fn invoke(&self, document: &str, font: &str) -> Result<Vec<u8>, RenderError>;
}

/// Build the full document: prologue, body, epilogue.
///
/// Each line is trimmed again and given its own `\n`, so indentation inside
/// templates never reaches the toolchain.
pub fn compose_document(template: &PreambleTemplate, body: &Normalized) -> String {
    let mut document = String::new();
    let lines = template
        .prologue
        .lines()
        .chain(body.lines())
        .chain(template.epilogue.lines());
    for line in lines.map(str::trim).filter(|l| !l.is_empty()) {
        document.push_str(line);
        document.push('\n');
    }
    document
}

/// Render a normalized formula body with the selected preamble.
///
/// An unknown variant is a configuration error, never a fallback to variant 0.
pub fn render(
    preambles: &PreambleRegistry,
    invoker: &dyn RenderInvoker,
    body: &Normalized,
    options: &RenderOptions,
) -> Result<Vec<u8>, RenderError> {
    let template = preambles
        .get(options.preamble)
        .ok_or(RenderError::UnknownPreamble(options.preamble))?;
    let document = compose_document(template, body);
    invoker.invoke(&document, &options.font)
}

/// Runs the configured command as a subprocess.
#[derive(Debug, Clone)]
pub struct CommandInvoker {
    program: PathBuf,
    args: Vec<String>,
    font_flag: String,
}

impl CommandInvoker {
    /// Resolve `program` on `PATH` up front so a missing toolchain fails the
    /// build before any page is processed.
    pub fn new(program: &str, args: Vec<String>, font_flag: impl Into<String>) -> Result<Self, RenderError> {
        let program = which::which(program).map_err(|e| RenderError::NotFound {
            program: program.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            program,
            args,
            font_flag: font_flag.into(),
        })
    }

    fn program_name(&self) -> String {
        self.program.display().to_string()
    }
}

impl RenderInvoker for CommandInvoker {
    fn invoke(&self, document: &str, font: &str) -> Result<Vec<u8>, RenderError> {
        let name = self.program_name();
        debug!("running {} {:?} {} {}", name, self.args, self.font_flag, font);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(&self.font_flag)
            .arg(font)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|source| RenderError::Spawn {
            program: name.clone(),
            source,
        })?;

        // Feed stdin from another thread so a chatty child cannot deadlock
        // on a full stdout pipe while we are still writing.
        let stdin = child.stdin.take();
        let (output, written) = std::thread::scope(|scope| {
            let writer = scope.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(document.as_bytes()),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            (output, writer.join().unwrap_or(Ok(())))
        });
        let spawn_error = |source| RenderError::Spawn {
            program: name.clone(),
            source,
        };
        let output = output.map_err(spawn_error)?;

        // A tool that bails out early closes stdin; its exit status and
        // stderr say more than the broken pipe does.
        if !output.status.success() {
            let diagnostics = String::from_utf8_lossy(&output.stderr).trim_end().to_string();
            error!("{} failed ({}):\n{}", name, output.status, diagnostics);
            return Err(RenderError::Failed {
                program: name.clone(),
                status: output.status,
                diagnostics,
            });
        }
        written.map_err(spawn_error)?;

        Ok(output.stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::normalize;
    use std::cell::RefCell;

    struct Recorder {
        seen: RefCell<Vec<(String, String)>>,
    }

    impl RenderInvoker for Recorder {
        fn invoke(&self, document: &str, font: &str) -> Result<Vec<u8>, RenderError> {
            self.seen.borrow_mut().push((document.to_string(), font.to_string()));
            Ok(b"<svg/>".to_vec())
        }
    }

    #[test]
    fn test_compose_trims_template_lines() {
        let template = PreambleTemplate {
            variant: 0,
            prologue: "\n    \\documentclass{standalone}\n      \\begin{document}\n".to_string(),
            epilogue: "   \\end{document}   ".to_string(),
        };
        let doc = compose_document(&template, &normalize("  x^2\n"));
        assert_eq!(doc, "\\documentclass{standalone}\n\\begin{document}\nx^2\n\\end{document}\n");
    }

    #[test]
    fn test_render_passes_font_and_document() {
        let recorder = Recorder { seen: RefCell::new(vec![]) };
        let options = RenderOptions { font: "libertine".to_string(), preamble: 1 };
        let svg = render(&PreambleRegistry::builtin(), &recorder, &normalize("a+b"), &options).unwrap();
        assert_eq!(svg, b"<svg/>");

        let seen = recorder.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert!(seen[0].0.contains("\\usepackage{physics}\n"));
        assert!(seen[0].0.contains("\na+b\n\\end{document}\n"));
        assert_eq!(seen[0].1, "libertine");
    }

    #[test]
    fn test_unknown_preamble_is_error() {
        let recorder = Recorder { seen: RefCell::new(vec![]) };
        let options = RenderOptions { font: "newcm".to_string(), preamble: 7 };
        let err = render(&PreambleRegistry::builtin(), &recorder, &normalize("a"), &options).unwrap_err();
        assert!(matches!(err, RenderError::UnknownPreamble(7)));
        assert!(recorder.seen.borrow().is_empty());
    }

    #[test]
    fn test_missing_program() {
        let err = CommandInvoker::new("texfig-no-such-renderer", vec![], "--font").unwrap_err();
        assert!(matches!(err, RenderError::NotFound { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_command_pipes_stdin_to_stdout() {
        let invoker = CommandInvoker::new("sh", vec!["-c".into(), "cat".into(), "sh".into()], "--font").unwrap();
        let out = invoker.invoke("<svg>x</svg>\n", "newcm").unwrap();
        assert_eq!(out, b"<svg>x</svg>\n");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_receives_font_flag() {
        let invoker = CommandInvoker::new("sh", vec!["-c".into(), "printf '%s %s' \"$1\" \"$2\"".into(), "sh".into()], "--font").unwrap();
        let out = invoker.invoke("", "libertine").unwrap();
        assert_eq!(out, b"--font libertine");
    }

    #[cfg(unix)]
    #[test]
    fn test_command_failure_surfaces_stderr() {
        let script = "cat >/dev/null; echo 'Undefined control sequence' >&2; exit 3";
        let invoker = CommandInvoker::new("sh", vec!["-c".into(), script.into(), "sh".into()], "--font").unwrap();
        match invoker.invoke("\\bogus\n", "newcm").unwrap_err() {
            RenderError::Failed { diagnostics, status, .. } => {
                assert_eq!(diagnostics, "Undefined control sequence");
                assert_eq!(status.code(), Some(3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
