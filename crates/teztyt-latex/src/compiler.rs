//! Running pdflatex and reading its log.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use regex::Regex;
use tokio::process::Command;

use teztyt_core::ExamError;

/// Locate an executable the way a shell would.
///
/// A name containing a path separator is checked as given; a bare name is
/// searched for on `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    let candidate = Path::new(name);
    if candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_path_buf());
    }
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path)
        .flat_map(|dir| {
            let plain = dir.join(name);
            let exe = dir.join(format!("{name}.exe"));
            [plain, exe]
        })
        .find(|p| p.is_file())
}

/// Outcome of one compiler run.
#[derive(Debug, Clone)]
pub struct CompileOutput {
    pub success: bool,
    pub exit_code: Option<i32>,
}

/// Compile `tex` into `out_dir`.
///
/// A non-zero exit is reported, not raised; the page count read afterwards
/// decides whether the run produced anything usable.
pub async fn compile(
    pdflatex: &str,
    parameters: &[String],
    out_dir: &Path,
    tex: &Path,
) -> Result<CompileOutput, ExamError> {
    let executable =
        find_executable(pdflatex).ok_or_else(|| ExamError::ToolchainUnavailable(pdflatex.to_string()))?;

    let mut cmd = Command::new(&executable);
    cmd.args(parameters.iter().filter(|p| !p.is_empty()))
        .arg("-output-directory")
        .arg(out_dir)
        .arg(tex)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped());

    let output = cmd.output().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExamError::ToolchainUnavailable(pdflatex.to_string())
        } else {
            ExamError::Io(e)
        }
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(
            tex = %tex.display(),
            code = ?output.status.code(),
            "pdflatex exited unsuccessfully: {}",
            stderr.trim()
        );
    }

    Ok(CompileOutput {
        success: output.status.success(),
        exit_code: output.status.code(),
    })
}

/// Read the page count pdflatex reports for `<stem>.pdf` in its log.
pub fn page_count_from_log(log: &str, stem: &str) -> Option<u32> {
    let pattern = format!(r"{}\.pdf \((\d+) page", regex::escape(stem));
    let re = Regex::new(&pattern).ok()?;
    re.captures(log)?.get(1)?.as_str().parse().ok()
}
