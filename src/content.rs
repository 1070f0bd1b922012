//! Locating and loading the compiled content that ships next to the samples.
//!
//! `build.rs` compiles everything under `shaders/` to SPIR-V and lays it out as
//! `Content/Shaders/Compiled/<name>.spv`, both in `OUT_DIR` and next to the
//! executables.
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};

pub const SHADER_DIR: &str = "Content/Shaders/Compiled";

const SPIRV_MAGIC: u32 = 0x0723_0203;

/// Directory containing the running executable.
pub fn base_path() -> Result<PathBuf> {
    let exe = std::env::current_exe().context("Unable to locate the running executable")?;
    exe.parent()
        .map(Path::to_path_buf)
        .with_context(|| format!("{} has no parent directory", exe.display()))
}

fn build_output_path() -> &'static Path {
    Path::new(env!("OUT_DIR"))
}

pub fn shader_path(shader_name: &str) -> Result<PathBuf> {
    let candidates = [
        base_path()?.join(SHADER_DIR).join(shader_name),
        build_output_path().join(SHADER_DIR).join(shader_name),
    ];
    Ok(first_existing(&candidates)
        .unwrap_or(&candidates[0])
        .to_path_buf())
}

fn first_existing(candidates: &[PathBuf]) -> Option<&PathBuf> {
    candidates.iter().find(|path| path.is_file())
}

pub fn shader_flags(adapter: &wgpu::Adapter) -> wgpu::ShaderFlags {
    let mut flags = wgpu::ShaderFlags::VALIDATION;
    match adapter.get_info().backend {
        wgpu::Backend::Metal | wgpu::Backend::Vulkan => {
            flags |= wgpu::ShaderFlags::EXPERIMENTAL_TRANSLATION
        }
        _ => (),
    }
    flags
}

pub fn read_spirv(path: &Path) -> Result<Vec<u8>> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Unable to read shader {}", path.display()))?;
    check_spirv(&bytes).with_context(|| format!("Invalid shader {}", path.display()))?;
    Ok(bytes)
}

fn check_spirv(bytes: &[u8]) -> Result<()> {
    if bytes.len() < 4 || bytes.len() % 4 != 0 {
        bail!("SPIR-V length {} is not a whole number of words", bytes.len());
    }
    let magic = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    if magic != SPIRV_MAGIC {
        bail!("missing SPIR-V magic number (found {:#010x})", magic);
    }
    Ok(())
}

pub fn load_shader(
    device: &wgpu::Device,
    shader_name: &str,
    flags: wgpu::ShaderFlags,
) -> Result<wgpu::ShaderModule> {
    let path = shader_path(shader_name)?;
    let bytes = read_spirv(&path)?;
    log::debug!("loaded shader {}", path.display());
    Ok(device.create_shader_module(&wgpu::ShaderModuleDescriptor {
        label: Some(shader_name),
        source: wgpu::util::make_spirv(&bytes),
        flags,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const COMPILED: &[&str] = &[
        "FillTextureCompute.spv",
        "TexturedQuadVert.spv",
        "TexturedQuadFrag.spv",
        "RawTriangleVertices.spv",
        "SolidColor.spv",
    ];

    #[test]
    fn compiled_shaders_are_spirv() {
        for name in COMPILED {
            let path = shader_path(name).unwrap();
            assert!(path.is_file(), "{} missing", path.display());
            read_spirv(&path).unwrap();
        }
    }

    #[test]
    fn shader_path_layout() {
        let path = shader_path("Nope.spv").unwrap();
        assert!(path.ends_with("Content/Shaders/Compiled/Nope.spv"));
        assert!(path.starts_with(base_path().unwrap()));
    }

    #[test]
    fn rejects_non_spirv() {
        assert!(check_spirv(&[]).is_err());
        assert!(check_spirv(&[0x03, 0x02, 0x23]).is_err());
        assert!(check_spirv(&[0u8; 8]).is_err());
        assert!(check_spirv(&[0x03, 0x02, 0x23, 0x07, 0, 0, 0, 0]).is_ok());
    }

    #[test]
    fn prefers_first_existing() {
        let missing = PathBuf::from("definitely/not/here.spv");
        let present = Path::new(env!("CARGO_MANIFEST_DIR")).join("src/content.rs");
        let candidates = [missing, present.clone()];
        assert_eq!(first_existing(&candidates), Some(&present));
        assert_eq!(first_existing(&candidates[..1]), None);
    }
}
