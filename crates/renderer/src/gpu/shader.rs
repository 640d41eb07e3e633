use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};

use wgpu::naga::front::glsl;
use wgpu::naga::valid::{Capabilities, ValidationFlags, Validator};
use wgpu::naga::{self, ShaderStage};

/// Upper bound on the diagnostic text kept from a failed compile or link.
pub const SHADER_LOG_CAPACITY: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum ShaderError {
    #[error("failed to read shader {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to compile shader {path}:\n{log}")]
    Compile { path: PathBuf, log: String },
    #[error("failed to link {program}:\n{log}")]
    Link { program: &'static str, log: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShaderKind {
    Compute,
    Vertex,
    Fragment,
}

impl ShaderKind {
    fn naga_stage(self) -> ShaderStage {
        match self {
            ShaderKind::Compute => ShaderStage::Compute,
            ShaderKind::Vertex => ShaderStage::Vertex,
            ShaderKind::Fragment => ShaderStage::Fragment,
        }
    }
}

/// Loads GLSL sources from a directory and turns them into shader modules.
#[derive(Debug, Clone)]
pub struct ShaderLoader {
    dir: PathBuf,
    defines: Vec<(String, String)>,
}

impl ShaderLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            defines: Vec::new(),
        }
    }

    /// Adds a preprocessor define visible to every shader this loader parses.
    pub fn with_define(mut self, name: &str, value: impl ToString) -> Self {
        self.defines.push((name.to_string(), value.to_string()));
        self
    }

    pub fn read_source(&self, file: &str) -> Result<(PathBuf, String), ShaderError> {
        let path = self.dir.join(file);
        let source = fs::read_to_string(&path).map_err(|source| {
            tracing::error!(path = %path.display(), error = %source, "could not open shader");
            ShaderError::Read {
                path: path.clone(),
                source,
            }
        })?;
        Ok((path, source))
    }

    /// Parses and validates GLSL into a naga module without touching the GPU.
    pub fn parse(
        &self,
        path: &Path,
        source: &str,
        kind: ShaderKind,
    ) -> Result<naga::Module, ShaderError> {
        let mut options = glsl::Options::from(kind.naga_stage());
        for (name, value) in &self.defines {
            options.defines.insert(name.clone(), value.clone());
        }

        let mut frontend = glsl::Frontend::default();
        let module = frontend
            .parse(&options, source)
            .map_err(|errors| compile_error(path, &errors.emit_to_string(source)))?;

        Validator::new(ValidationFlags::all(), Capabilities::all())
            .validate(&module)
            .map_err(|error| compile_error(path, &error.emit_to_string(source)))?;

        Ok(module)
    }

    pub fn load(
        &self,
        device: &wgpu::Device,
        file: &str,
        kind: ShaderKind,
    ) -> Result<wgpu::ShaderModule, ShaderError> {
        let (path, source) = self.read_source(file)?;
        let module = self.parse(&path, &source, kind)?;
        tracing::debug!(path = %path.display(), ?kind, "compiled shader");

        let label = path.display().to_string();
        with_validation_scope(device, &label, || {
            device.create_shader_module(wgpu::ShaderModuleDescriptor {
                label: Some(&label),
                source: wgpu::ShaderSource::Naga(Cow::Owned(module)),
            })
        })
        .map_err(|log| compile_error(&path, &log))
    }
}

fn compile_error(path: &Path, log: &str) -> ShaderError {
    let log = truncate_log(log, SHADER_LOG_CAPACITY);
    tracing::error!(path = %path.display(), %log, "shader compilation failed");
    ShaderError::Compile {
        path: path.to_path_buf(),
        log,
    }
}

/// Builds a pipeline ("links" a program) and converts validation failures
/// into [`ShaderError::Link`].
pub(crate) fn link<T>(
    device: &wgpu::Device,
    program: &'static str,
    build: impl FnOnce() -> T,
) -> Result<T, ShaderError> {
    with_validation_scope(device, program, build).map_err(|log| {
        let log = truncate_log(&log, SHADER_LOG_CAPACITY);
        tracing::error!(program, %log, "program link failed");
        ShaderError::Link { program, log }
    })
}

fn with_validation_scope<T>(
    device: &wgpu::Device,
    what: &str,
    build: impl FnOnce() -> T,
) -> Result<T, String> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let value = build();
    match pollster::block_on(device.pop_error_scope()) {
        None => Ok(value),
        Some(error) => {
            tracing::debug!(what, "validation scope captured an error");
            Err(error.to_string())
        }
    }
}

/// Cuts `log` to at most `capacity` bytes without splitting a character.
pub fn truncate_log(log: &str, capacity: usize) -> String {
    if log.len() <= capacity {
        return log.to_string();
    }
    let mut end = capacity;
    while !log.is_char_boundary(end) {
        end -= 1;
    }
    log[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gpu::dispatch::WORK_GROUP_SIZE;
    use tempfile::TempDir;

    fn shipped_loader() -> ShaderLoader {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../shaders");
        ShaderLoader::new(dir).with_define("WORK_GROUP_SIZE", WORK_GROUP_SIZE)
    }

    #[test]
    fn shipped_shaders_parse_and_validate() {
        let loader = shipped_loader();
        for (file, kind) in [
            ("noise2d.comp", ShaderKind::Compute),
            ("noise3d.comp", ShaderKind::Compute),
            ("quad.vert", ShaderKind::Vertex),
            ("quad.frag", ShaderKind::Fragment),
        ] {
            let (path, source) = loader.read_source(file).expect("read shipped shader");
            if let Err(err) = loader.parse(&path, &source, kind) {
                panic!("{file} failed to compile: {err}");
            }
        }
    }

    #[test]
    fn compute_shaders_use_injected_work_group_size() {
        let loader = shipped_loader();
        let (path, source) = loader.read_source("noise3d.comp").unwrap();
        let module = loader.parse(&path, &source, ShaderKind::Compute).unwrap();
        let entry = module
            .entry_points
            .iter()
            .find(|entry| entry.stage == ShaderStage::Compute)
            .expect("compute entry point");
        assert_eq!(entry.workgroup_size, [WORK_GROUP_SIZE; 3]);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = TempDir::new().unwrap();
        let err = ShaderLoader::new(dir.path())
            .read_source("missing.comp")
            .unwrap_err();
        assert!(matches!(err, ShaderError::Read { .. }));
    }

    #[test]
    fn broken_source_reports_truncated_log() {
        let dir = TempDir::new().unwrap();
        let mut source = String::from("#version 450\nvoid main() {\n");
        for index in 0..200 {
            source.push_str(&format!("    undefined_symbol_{index} = broken;\n"));
        }
        std::fs::write(dir.path().join("broken.frag"), &source).unwrap();

        let loader = ShaderLoader::new(dir.path());
        let (path, source) = loader.read_source("broken.frag").unwrap();
        match loader.parse(&path, &source, ShaderKind::Fragment) {
            Err(ShaderError::Compile { log, .. }) => {
                assert!(!log.is_empty());
                assert!(log.len() <= SHADER_LOG_CAPACITY);
            }
            other => panic!("expected compile error, got {other:?}"),
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let log = "é".repeat(10);
        let cut = truncate_log(&log, 5);
        assert_eq!(cut, "éé");
        assert_eq!(truncate_log("short", 1024), "short");
    }
}
