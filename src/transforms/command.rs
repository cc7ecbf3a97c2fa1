// src/transforms/command.rs

//! Delegates an asset class to an external program, one invocation per
//! matched file.

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::CommandConfig;
use crate::dag::graph::options;
use crate::exec::transform::{OutputSet, Transform, TransformFuture, TransformRequest};
use crate::fs::FileSystem;
use crate::transforms::copy::destination_for;
use crate::watch::patterns::{GlobPattern, collect_matching_files};

/// Env var carrying the template payload (TOML) to the command.
pub const DATA_ENV: &str = "SITEPIPE_DATA";

#[derive(Debug, Clone)]
pub struct CommandTransform {
    fs: Arc<dyn FileSystem>,
    command: CommandConfig,
}

impl CommandTransform {
    pub fn new(fs: Arc<dyn FileSystem>, command: CommandConfig) -> Self {
        Self { fs, command }
    }

    async fn run_all(&self, request: &TransformRequest) -> Result<OutputSet> {
        let fs = Arc::clone(&self.fs);
        let pattern = GlobPattern::new(&request.base_dir, &request.input_glob)?;
        let inputs = tokio::task::spawn_blocking(move || collect_matching_files(fs.as_ref(), &pattern))
            .await
            .context("glob worker did not complete")??;

        let data = match request.table_option(options::DATA) {
            Some(table) => Some(toml::to_string(table).context("serialising template data")?),
            None => None,
        };

        let mut outputs = Vec::with_capacity(inputs.len());
        for input in inputs {
            let mut output = destination_for(request, &input)?;
            if let Some(ext) = &self.command.ext {
                output.set_extension(ext);
            }
            if let Some(parent) = output.parent() {
                self.fs.create_dir_all(parent)?;
            }
            self.run_one(&input, &output, data.as_deref()).await?;
            outputs.push(output);
        }

        Ok(OutputSet::new(outputs))
    }

    async fn run_one(&self, input: &Path, output: &Path, data: Option<&str>) -> Result<()> {
        let line = expand(&self.command.cmd, input, output);
        debug!(cmd = %line, "running transform command");

        let mut cmd = if cfg!(windows) {
            let mut c = Command::new("cmd");
            c.arg("/C").arg(&line);
            c
        } else {
            let mut c = Command::new("sh");
            c.arg("-c").arg(&line);
            c
        };
        cmd.stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(data) = data {
            cmd.env(DATA_ENV, data);
        }

        let out = cmd
            .output()
            .await
            .with_context(|| format!("spawning `{line}`"))?;

        for stdout_line in String::from_utf8_lossy(&out.stdout).lines() {
            debug!(input = ?input, "stdout: {}", stdout_line);
        }

        if !out.status.success() {
            let code = out.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&out.stderr);
            bail!("`{line}` exited with code {code}: {}", stderr.trim());
        }

        info!(input = ?input, output = ?output, "transformed");
        Ok(())
    }
}

impl Transform for CommandTransform {
    fn run<'a>(&'a self, request: &'a TransformRequest) -> TransformFuture<'a> {
        Box::pin(self.run_all(request))
    }
}

/// Substitute `{input}` / `{output}` with shell-quoted paths.
fn expand(template: &str, input: &Path, output: &Path) -> String {
    template
        .replace("{input}", &shell_quote(input))
        .replace("{output}", &shell_quote(output))
}

fn shell_quote(path: &Path) -> String {
    let s = path.to_string_lossy();
    if cfg!(windows) {
        format!("\"{s}\"")
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::fs::RealFileSystem;

    #[test]
    fn expand_quotes_paths() {
        let line = expand("cat {input} > {output}", Path::new("/a b/x.scss"), Path::new("/o/x.css"));
        assert_eq!(line, "cat '/a b/x.scss' > '/o/x.css'");
    }

    #[tokio::test]
    async fn runs_command_per_file_with_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(src.join("assets/style")).unwrap();
        std::fs::write(src.join("assets/style/main.scss"), "body{}").unwrap();

        let transform = CommandTransform::new(
            Arc::new(RealFileSystem),
            CommandConfig {
                cmd: "cp {input} {output}".to_string(),
                ext: Some("css".to_string()),
            },
        );
        let request = TransformRequest::new("assets/style/*.scss", &src, tmp.path().join("temp"));
        let outputs = transform.run(&request).await.unwrap();

        let expected = tmp.path().join("temp/assets/style/main.css");
        assert_eq!(outputs.files, vec![expected.clone()]);
        assert_eq!(std::fs::read_to_string(expected).unwrap(), "body{}");
    }

    #[tokio::test]
    async fn failing_command_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("index.html"), "<p>").unwrap();

        let transform = CommandTransform::new(
            Arc::new(RealFileSystem),
            CommandConfig {
                cmd: "exit 3".to_string(),
                ext: None,
            },
        );
        let request = TransformRequest::new("*.html", &src, tmp.path().join("temp"));
        let err = transform.run(&request).await.unwrap_err();
        assert!(format!("{err:#}").contains("code 3"));
    }

    #[tokio::test]
    async fn exports_template_data() {
        let tmp = tempfile::tempdir().unwrap();
        let src = tmp.path().join("src");
        std::fs::create_dir_all(&src).unwrap();
        std::fs::write(src.join("index.html"), "").unwrap();

        let mut data = toml::Table::new();
        data.insert("title".into(), toml::Value::String("Home".into()));
        let transform = CommandTransform::new(
            Arc::new(RealFileSystem),
            CommandConfig {
                cmd: format!("printf '%s' \"${DATA_ENV}\" > {{output}}"),
                ext: None,
            },
        );
        let request = TransformRequest::new("*.html", &src, tmp.path().join("temp"))
            .with_option(options::DATA, toml::Value::Table(data));
        transform.run(&request).await.unwrap();

        let written = std::fs::read_to_string(tmp.path().join("temp/index.html")).unwrap();
        assert!(written.contains("title = \"Home\""));
    }
}
