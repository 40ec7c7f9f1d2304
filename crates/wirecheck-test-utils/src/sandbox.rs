//! sandbox.rs
//!
//! Throwaway directory for CLI tests.
//! - Write tester configurations and bench files next to each other
//! - Run the `wirecheck` binary (or any cargo binary) with colors and logging off
//! - Format and sanitize the output for `insta` snapshots
//!
//! Everything lives under an `assert_fs::TempDir` and is cleaned up on drop.
//!
//! ## Quick example
//! ```no_run
//! use wirecheck_test_utils::sandbox::Sandbox;
//!
//! let mut sb = Sandbox::new();
//! sb.write("bench.toml", "[[wire]]\nchannels = [12, 7]\n");
//!
//! let output = sb.snapshot_run("wirecheck", ["test", "--bench", "bench.toml"]);
//! insta::assert_snapshot!("open_pin", output);
//! ```

use assert_fs::TempDir;
use duct::Expression;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

/// Captured result of one command run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

pub struct Sandbox {
    root: TempDir,
    default_cwd: PathBuf,
}

impl Default for Sandbox {
    fn default() -> Self {
        Self::new()
    }
}

impl Sandbox {
    /// Create a new sandbox; all state is under an auto-cleaned TempDir.
    pub fn new() -> Self {
        let root = TempDir::new().expect("create sandbox TempDir");
        let default_cwd = root.path().to_path_buf();
        Self { root, default_cwd }
    }

    /// Absolute path to the sandbox root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Write/overwrite a file relative to the sandbox root.
    pub fn write<P: AsRef<Path>, S: AsRef<[u8]>>(&mut self, rel: P, contents: S) -> &mut Self {
        let p = self.default_cwd.join(rel.as_ref());
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent).expect("create parent dir");
        }
        fs::write(p, contents).expect("write file");
        self
    }

    /// Build a `duct::Expression` for a cargo binary, run from the sandbox
    /// root with a deterministic environment.
    pub fn cmd<I>(&self, program: &str, args: I) -> Expression
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let cargo_bin_path = assert_cmd::cargo::cargo_bin(program);
        let args: Vec<_> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_os_string())
            .collect();

        duct::cmd(cargo_bin_path, args)
            .dir(&self.default_cwd)
            .env("NO_COLOR", "1")
            .env("CLICOLOR", "0")
            .env_remove("RUST_LOG")
            .env_remove("RUST_BACKTRACE")
            .env_remove("RUST_LIB_BACKTRACE")
    }

    /// Run a cargo binary and capture its exit code and output.
    pub fn run<I>(&self, program: &str, args: I) -> RunOutput
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let output = self
            .cmd(program, args)
            .stdin_null()
            .stderr_capture()
            .stdout_capture()
            .unchecked()
            .run()
            .expect("run command");

        RunOutput {
            code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }

    /// Run a cargo binary and return the formatted output for snapshotting.
    pub fn snapshot_run<I>(&self, program: &str, args: I) -> String
    where
        I: IntoIterator,
        I::Item: AsRef<OsStr>,
    {
        let args: Vec<String> = args
            .into_iter()
            .map(|arg| arg.as_ref().to_string_lossy().to_string())
            .collect();
        let output = self.run(program, &args);

        let manifest = format!(
            "Command: {} {}\nExit Code: {}\n\n--- STDOUT ---\n{}\n--- STDERR ---\n{}",
            program,
            args.join(" "),
            output.code,
            output.stdout.trim_end(),
            output.stderr.trim_end()
        );
        self.sanitize_output(&manifest)
    }

    /// Replace the sandbox location with a placeholder so snapshots are stable.
    pub fn sanitize_output(&self, content: &str) -> String {
        use regex::Regex;

        let root = self.root_path().to_string_lossy();
        let mut result = content.replace(root.as_ref(), "<TEMP_DIR>");

        // macOS reports the canonical /private prefix
        let macos_pattern =
            Regex::new(r"(?:/private)?/var/folders/[^/]+/[^/]+/T/\.tmp[a-zA-Z0-9]+").unwrap();
        result = macos_pattern.replace_all(&result, "<TEMP_DIR>").to_string();

        result
    }
}
