use anyhow::{anyhow, Context, Result};
use fs_extra::dir::CopyOptions;
use glob::glob;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const SHADER_DIR: &str = "Content/Shaders/Compiled";

struct ShaderData {
    src: String,
    src_path: PathBuf,
    spv_name: String,
    kind: shaderc::ShaderKind,
}

impl ShaderData {
    fn load(src_path: PathBuf) -> Result<Self> {
        let extension = src_path
            .extension()
            .and_then(|ext| ext.to_str())
            .ok_or_else(|| anyhow!("File has no extension: {}", src_path.display()))?;
        let kind = match extension {
            "vert" => shaderc::ShaderKind::Vertex,
            "frag" => shaderc::ShaderKind::Fragment,
            "comp" => shaderc::ShaderKind::Compute,
            _ => return Err(anyhow!("Unsupported shader: {}", src_path.display())),
        };
        let stem = src_path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| anyhow!("Bad shader file name: {}", src_path.display()))?;
        let src = fs::read_to_string(&src_path)
            .with_context(|| format!("reading {}", src_path.display()))?;
        Ok(ShaderData {
            src,
            spv_name: format!("{}.spv", stem),
            src_path,
            kind,
        })
    }
}

fn main() -> Result<()> {
    println!("cargo:rerun-if-changed=shaders");

    let mut shader_paths = Vec::new();
    for pattern in &["./shaders/**/*.vert", "./shaders/**/*.frag", "./shaders/**/*.comp"] {
        for entry in glob(pattern)? {
            shader_paths.push(entry?);
        }
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR")?);
    let compiled_dir = out_dir.join(SHADER_DIR);
    fs::create_dir_all(&compiled_dir)?;

    let mut compiler = shaderc::Compiler::new().context("Unable to create shader compiler")?;
    for path in shader_paths {
        println!("cargo:rerun-if-changed={}", path.display());
        let shader = ShaderData::load(path)?;
        let artifact = compiler
            .compile_into_spirv(
                &shader.src,
                shader.kind,
                &shader.src_path.to_string_lossy(),
                "main",
                None,
            )
            .with_context(|| format!("compiling {}", shader.src_path.display()))?;
        fs::write(compiled_dir.join(&shader.spv_name), artifact.as_binary_u8())?;
    }

    // OUT_DIR is target/<profile>/build/<pkg>-<hash>/out
    if let Some(target_dir) = out_dir.ancestors().nth(3) {
        copy_content(&out_dir.join("Content"), target_dir)?;
    }
    Ok(())
}

fn copy_content(content: &Path, target_dir: &Path) -> Result<()> {
    let mut copy_options = CopyOptions::new();
    copy_options.overwrite = true;
    fs_extra::copy_items(&[content], target_dir, &copy_options)
        .map_err(|err| anyhow!("copying {}: {}", content.display(), err))?;
    Ok(())
}
